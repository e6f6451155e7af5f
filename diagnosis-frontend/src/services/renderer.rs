//! Markdown report to HTML.
//!
//! Output is not sanitized: the model's text is trusted and raw HTML in it is
//! passed through. The page CSP (see `service_core::middleware::security_headers`)
//! keeps injected markup from running inline script.

use pulldown_cmark::{html, Options, Parser};

pub const REPORT_CONTAINER_CLASS: &str = "custom-report";

pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Rendered report inside the styled container the page expects.
pub fn render_report(markdown: &str) -> String {
    format!(
        "<div class=\"{}\">\n{}</div>",
        REPORT_CONTAINER_CLASS,
        render_markdown(markdown)
    )
}
