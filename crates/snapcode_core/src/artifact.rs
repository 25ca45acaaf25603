/// Informational note returned alongside every artifact; styling lives in the
/// markup's utility classes.
pub const STYLE_NOTE: &str = "/* All styling is handled by Tailwind CSS classes in the HTML above */";

/// The generated markup fragment for one successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub markup: String,
    pub style_note: String,
}

impl GeneratedArtifact {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            style_note: STYLE_NOTE.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.markup.trim().is_empty()
    }
}
