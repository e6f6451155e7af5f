use metrics::{counter, histogram};
use std::time::Duration;

/// Count one analysis by outcome (`success`, `missing_credential`, ...).
pub fn record_analysis(outcome: &'static str, elapsed: Duration) {
    counter!("diagnosis_analyses_total", "outcome" => outcome).increment(1);
    histogram!("diagnosis_analysis_duration_seconds", "outcome" => outcome)
        .record(elapsed.as_secs_f64());
}
