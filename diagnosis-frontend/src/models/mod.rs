pub mod language;
pub mod ui_state;

pub use language::{Language, UnknownLanguage};
pub use ui_state::{UiState, Upload};
