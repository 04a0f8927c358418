//! Markup format tags stored alongside comment bodies.
//!
//! Rendering is out of scope; the store only guarantees a stored markup value
//! is never empty.

// ---------------------------------------------------------------------------
// Markup constants
// ---------------------------------------------------------------------------

pub const MARKUP_PLAIN_TEXT: &str = "PlainText";
pub const MARKUP_MARKDOWN: &str = "Markdown";

/// Markup substituted whenever a caller leaves the value empty.
pub const SYSTEM_MARKUP_DEFAULT: &str = MARKUP_PLAIN_TEXT;

/// All markup values the system knows how to render.
pub const KNOWN_MARKUPS: &[&str] = &[MARKUP_PLAIN_TEXT, MARKUP_MARKDOWN];

/// Whether `markup` is one of the [`KNOWN_MARKUPS`].
pub fn is_known_markup(markup: &str) -> bool {
    KNOWN_MARKUPS.contains(&markup)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Return `markup`, or [`SYSTEM_MARKUP_DEFAULT`] when it is empty.
///
/// Unknown non-empty values pass through unchanged.
pub fn markup_or_default(markup: &str) -> &str {
    if markup.is_empty() {
        SYSTEM_MARKUP_DEFAULT
    } else {
        markup
    }
}

/// Normalize an optional patch value: `None` stays `None` (keep the stored
/// markup), an empty string becomes the system default.
pub fn normalize_patch_markup(markup: Option<&str>) -> Option<&str> {
    markup.map(markup_or_default)
}
