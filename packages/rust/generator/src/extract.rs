//! Pull the display text for an element out of a free-text prompt.

use std::sync::LazyLock;

use regex::Regex;

use flowsmith_shared::ElementKind;

/// Label used when the prompt names no text of its own.
pub fn default_text(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Button => "Click Me",
        ElementKind::Header => "Your Header Here",
        ElementKind::Card => "Card Title",
        ElementKind::Form => "Contact Us",
        ElementKind::Generic => "Your Content Here",
    }
}

/// Extract the text an element should display.
///
/// Tries, in order: the first quoted substring (`"…"` or `'…'`), then the
/// phrase after "say"/"says" up to the next comma, period, or quote. Falls
/// back to [`default_text`] for the kind. Pure and infallible.
pub fn extract_text(kind: ElementKind, prompt: &str) -> String {
    quoted(prompt)
        .or_else(|| says_phrase(prompt))
        .unwrap_or_else(|| default_text(kind).to_string())
}

/// A single quote only opens after a non-word character, so contractions
/// like "it's" never pair up.
fn quoted(prompt: &str) -> Option<String> {
    static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#""([^"]+)"|(?:^|\W)'([^']+)'"#).expect("valid regex")
    });

    let caps = QUOTED_RE.captures(prompt)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

fn says_phrase(prompt: &str) -> Option<String> {
    static SAYS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"(?i)\bsays?\s+([^,."'\n]+)"#).expect("valid regex"));

    let caps = SAYS_RE.captures(prompt)?;
    let phrase = caps.get(1)?.as_str().trim();
    (!phrase.is_empty()).then(|| phrase.to_string())
}
