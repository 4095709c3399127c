use std::fmt;

use scraper::Html;

use crate::config::{Config, Selectors};

/// Dispatch key for the two extraction paths.
pub fn is_pdf_link(url: &str) -> bool {
    url.to_lowercase().ends_with(".pdf")
}

/// Linear text extraction, page order, layout discarded. Extraction failures
/// are logged and collapse to empty text so one bad PDF never aborts a batch.
pub fn pdf_text(bytes: &[u8], link: &str) -> String {
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(link, error = %e, "pdf text extraction failed");
            String::new()
        }
    }
}

/// Prose extraction for HTML comment pages: every paragraph inside the main
/// content landmark, joined by newlines in document order. No landmark means
/// there is nothing we trust as comment prose, so empty text.
pub fn html_prose(html: &str, sel: &Selectors) -> String {
    let doc = Html::parse_document(html);
    let Some(main) = doc.select(&sel.main_content).next() else {
        return String::new();
    };
    main.select(&sel.paragraph)
        .map(|p| {
            p.text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Empty,
    TooShort,
    Boilerplate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Empty => write!(f, "no content"),
            SkipReason::TooShort => write!(f, "below minimum length"),
            SkipReason::Boilerplate => write!(f, "boilerplate prefix"),
        }
    }
}

/// Content-quality filter. Some linked pages are generic disclaimers rather
/// than comment bodies; recording them would bias the sentiment and summary
/// statistics, so they are skipped outright, never error rows.
pub fn reject_reason(text: &str, cfg: &Config) -> Option<SkipReason> {
    if text.trim().is_empty() {
        return Some(SkipReason::Empty);
    }
    if text.len() < cfg.min_comment_len {
        return Some(SkipReason::TooShort);
    }
    if cfg
        .boilerplate_prefixes
        .iter()
        .any(|p| text.starts_with(p.as_str()))
    {
        return Some(SkipReason::Boilerplate);
    }
    None
}
