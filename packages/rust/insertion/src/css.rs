//! Permissive CSS rule extraction.
//!
//! Not a CSS parser: rules are split with regexes, which is enough for the
//! flat, class-scoped stylesheets the generator produces.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// One `selector { property: value; ... }` rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CssRule {
    pub selector: String,
    pub properties: BTreeMap<String, String>,
}

/// Extract every rule from `css`.
///
/// Comments and bodiless at-rule statements (`@import`, `@charset`) are
/// stripped first. Rules nested in at-rule blocks are returned
/// with their inner selector; the at-rule itself is not represented.
pub fn parse_css_rules(css: &str) -> Vec<CssRule> {
    static COMMENT_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"));
    static STATEMENT_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"@[^{};]*;").expect("valid regex"));
    static RULE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"([^{}]+)\{([^{}]*)\}").expect("valid regex"));

    let stripped = COMMENT_RE.replace_all(css, "");
    let stripped = STATEMENT_RE.replace_all(&stripped, "");

    RULE_RE
        .captures_iter(&stripped)
        .filter_map(|caps| {
            let selector = caps[1].trim();
            if selector.is_empty() || selector.starts_with('@') {
                return None;
            }
            let properties = parse_declarations(&caps[2]);
            if properties.is_empty() {
                return None;
            }
            Some(CssRule {
                selector: normalize_selector(selector),
                properties,
            })
        })
        .collect()
}

fn parse_declarations(body: &str) -> BTreeMap<String, String> {
    body.split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            let value = value.trim();
            (!name.is_empty() && !value.is_empty()).then(|| (name.to_string(), value.to_string()))
        })
        .collect()
}

/// Collapse internal whitespace (e.g. multi-line selector lists).
fn normalize_selector(selector: &str) -> String {
    selector.split_whitespace().collect::<Vec<_>>().join(" ")
}
