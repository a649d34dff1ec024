//! Canned HTML + CSS templates used when the completion endpoint is unavailable.

use flowsmith_shared::{ElementKind, GeneratedElement};

use crate::extract::extract_text;

const BUTTON_CSS: &str = r#".fs-button {
  display: inline-flex;
  align-items: center;
  justify-content: center;
  padding: 12px 24px;
  border: none;
  border-radius: 8px;
  background-color: #4353ff;
  color: #ffffff;
  font-size: 16px;
  font-weight: 600;
  cursor: pointer;
  transition: background-color 0.2s ease, transform 0.2s ease;
}
.fs-button:hover {
  background-color: #2f3ce0;
  transform: translateY(-1px);
}
.fs-button:focus-visible {
  outline: 3px solid #a5adff;
  outline-offset: 2px;
}"#;

const HEADER_CSS: &str = r#".fs-header {
  padding: 64px 24px;
  text-align: center;
  background: linear-gradient(135deg, #1a1b4b 0%, #4353ff 100%);
  color: #ffffff;
}
.fs-header__title {
  margin: 0;
  font-size: clamp(2rem, 5vw, 3.5rem);
  font-weight: 700;
  line-height: 1.1;
}"#;

const CARD_CSS: &str = r#".fs-card {
  max-width: 360px;
  padding: 24px;
  border-radius: 12px;
  background-color: #ffffff;
  box-shadow: 0 4px 16px rgba(0, 0, 0, 0.08);
}
.fs-card__title {
  margin: 0 0 12px;
  font-size: 1.25rem;
  font-weight: 600;
  color: #1a1b1f;
}
.fs-card__body {
  margin: 0;
  color: #5a5d66;
  line-height: 1.5;
}"#;

const FORM_CSS: &str = r#".fs-form {
  display: grid;
  gap: 16px;
  max-width: 480px;
  padding: 24px;
  border-radius: 12px;
  background-color: #f7f8fc;
}
.fs-form__intro {
  margin: 0;
  color: #5a5d66;
}
.fs-form__field {
  display: grid;
  gap: 6px;
  font-size: 14px;
  color: #1a1b1f;
}
.fs-form__field input,
.fs-form__field textarea {
  padding: 10px 12px;
  border: 1px solid #d0d3dc;
  border-radius: 6px;
  font: inherit;
}
.fs-form__submit {
  padding: 12px 24px;
  border: none;
  border-radius: 8px;
  background-color: #4353ff;
  color: #ffffff;
  font-weight: 600;
  cursor: pointer;
}"#;

const BLOCK_CSS: &str = r#".fs-block {
  padding: 20px;
  border: 1px solid #d0d3dc;
  border-radius: 8px;
  color: #1a1b1f;
  line-height: 1.5;
}"#;

/// Build the template element for `kind`. Total over every kind.
pub fn fallback(prompt: &str, kind: ElementKind) -> GeneratedElement {
    let (html, css) = match kind {
        ElementKind::Button => {
            let label = escape_html(&extract_text(kind, prompt));
            (
                format!(r#"<button class="fs-button" type="button">{label}</button>"#),
                BUTTON_CSS,
            )
        }
        ElementKind::Header => {
            let title = escape_html(&extract_text(kind, prompt));
            (
                format!(
                    r#"<header class="fs-header"><h1 class="fs-header__title">{title}</h1></header>"#
                ),
                HEADER_CSS,
            )
        }
        ElementKind::Card => {
            let title = escape_html(&extract_text(kind, prompt));
            let body = escape_html(prompt);
            (
                format!(
                    r#"<article class="fs-card"><h3 class="fs-card__title">{title}</h3><p class="fs-card__body">{body}</p></article>"#
                ),
                CARD_CSS,
            )
        }
        ElementKind::Form => {
            let intro = escape_html(prompt);
            (
                format!(
                    concat!(
                        r#"<form class="fs-form">"#,
                        r#"<p class="fs-form__intro">{intro}</p>"#,
                        r#"<label class="fs-form__field">Name<input type="text" name="name" required></label>"#,
                        r#"<label class="fs-form__field">Email<input type="email" name="email" required></label>"#,
                        r#"<label class="fs-form__field">Message<textarea name="message" rows="4"></textarea></label>"#,
                        r#"<button class="fs-form__submit" type="submit">Submit</button>"#,
                        r#"</form>"#
                    ),
                    intro = intro
                ),
                FORM_CSS,
            )
        }
        ElementKind::Generic => {
            let body = escape_html(prompt);
            (format!(r#"<div class="fs-block"><p>{body}</p></div>"#), BLOCK_CSS)
        }
    };

    GeneratedElement {
        html,
        css: css.to_string(),
        kind,
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_produces_html_and_css() {
        for kind in ElementKind::ALL {
            let el = fallback("something", kind);
            assert!(!el.html.is_empty(), "{kind} html empty");
            assert!(!el.css.is_empty(), "{kind} css empty");
            assert_eq!(el.kind, kind);
        }
    }

    #[test]
    fn button_embeds_quoted_label() {
        let el = fallback(r#"Create a button that says "Go""#, ElementKind::Button);
        assert!(el.html.contains(">Go</button>"));
    }

    #[test]
    fn header_uses_default_title() {
        let el = fallback("a dark hero header", ElementKind::Header);
        assert!(el.html.contains("Your Header Here"));
    }

    #[test]
    fn card_and_form_embed_raw_prompt() {
        let card = fallback("pricing card for the pro plan", ElementKind::Card);
        assert!(card.html.contains("pricing card for the pro plan"));

        let form = fallback("newsletter signup", ElementKind::Form);
        assert!(form.html.contains("newsletter signup"));
        assert!(form.html.contains(r#"type="email""#));
    }

    #[test]
    fn generic_block_is_bordered() {
        let el = fallback("some notice", ElementKind::Generic);
        assert!(el.html.contains("fs-block"));
        assert!(el.css.contains("border"));
    }

    #[test]
    fn prompt_text_is_escaped() {
        let el = fallback("<script>alert(1)</script>", ElementKind::Generic);
        assert!(!el.html.contains("<script>"));
        assert!(el.html.contains("&lt;script&gt;"));
    }
}
