use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::EvalError;

static PAGE_MARKER_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*={3,}[ \t]*PAGE[ \t]+\d+[ \t]*={3,}[ \t]*$").unwrap()
});

const FORM_FEED: char = '\u{000C}';

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    pub full_text: String,
    pub pages: Vec<String>,
}

impl ExtractedText {
    /// Split `text` into pages on `=== PAGE n ===` lines, else on form feeds.
    pub fn new(text: &str) -> Self {
        let full_text = text.trim().to_string();
        let pages = split_pages(&full_text);
        Self { full_text, pages }
    }

    pub fn from_pages(pages: Vec<String>) -> Self {
        let full_text = pages
            .iter()
            .map(|p| p.trim())
            .collect::<Vec<_>>()
            .join("\n\n");
        Self { full_text, pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len().max(1)
    }

    fn content_chars(&self) -> usize {
        self.full_text.trim().chars().count()
    }
}

fn split_pages(text: &str) -> Vec<String> {
    let pieces: Vec<&str> = if PAGE_MARKER_LINE_RE.is_match(text) {
        PAGE_MARKER_LINE_RE.split(text).collect()
    } else if text.contains(FORM_FEED) {
        text.split(FORM_FEED).collect()
    } else {
        vec![text]
    };
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

pub trait SourceTextProvider {
    fn name(&self) -> &str;
    fn extract(&self) -> Result<ExtractedText, EvalError>;
}

/// Reads text that an external tool already extracted to a file.
#[derive(Debug, Clone)]
pub struct TextFileProvider {
    path: PathBuf,
    name: String,
}

impl TextFileProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = format!("text file {}", path.display());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SourceTextProvider for TextFileProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self) -> Result<ExtractedText, EvalError> {
        let raw = fs::read_to_string(&self.path)
            .map_err(|err| EvalError::io(format!("reading {}", self.path.display()), err))?;
        if raw.trim().is_empty() {
            return Err(EvalError::input_missing(format!(
                "{} contains no text",
                self.path.display()
            )));
        }
        Ok(ExtractedText::new(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSelection {
    pub provider: String,
    pub text: ExtractedText,
}

/// Try `providers` in order and take the first result whose trimmed text is
/// longer than `min_chars`.
///
/// Failures are logged and skipped. When nothing is long enough, the last
/// short but non-empty result is used instead.
pub fn select_source(
    providers: &[Box<dyn SourceTextProvider>],
    min_chars: usize,
) -> Result<SourceSelection, EvalError> {
    let mut fallback: Option<SourceSelection> = None;

    for provider in providers {
        match provider.extract() {
            Ok(text) => {
                let chars = text.content_chars();
                if chars > min_chars {
                    info!(
                        provider = provider.name(),
                        chars,
                        pages = text.page_count(),
                        "source text selected"
                    );
                    return Ok(SourceSelection {
                        provider: provider.name().to_string(),
                        text,
                    });
                }
                debug!(provider = provider.name(), chars, min_chars, "source text too short");
                if chars > 0 {
                    fallback = Some(SourceSelection {
                        provider: provider.name().to_string(),
                        text,
                    });
                }
            }
            Err(err) => {
                warn!(provider = provider.name(), error = %err, "source provider failed");
            }
        }
    }

    match fallback {
        Some(selection) => {
            warn!(
                provider = %selection.provider,
                "no provider produced enough text; using short result"
            );
            Ok(selection)
        }
        None => Err(EvalError::unavailable(
            "source text",
            format!("none of {} provider(s) produced any text", providers.len()),
        )),
    }
}
