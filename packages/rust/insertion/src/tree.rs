//! HTML string → minimal attributed element tree.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Node};
use serde::Serialize;

/// An element with its tag, attributes, and ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementNode {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<NodeChild>,
}

/// A child of an element: a nested element or literal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeChild {
    Element(ElementNode),
    Text(String),
}

impl ElementNode {
    /// Concatenated text of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                NodeChild::Element(el) => out.push_str(&el.text()),
                NodeChild::Text(t) => out.push_str(t),
            }
        }
        out
    }
}

/// Parse `html` as a fragment and convert it depth-first.
///
/// Whitespace-only text nodes and comments are dropped.
pub fn html_to_tree(html: &str) -> Vec<NodeChild> {
    let fragment = Html::parse_fragment(html);
    convert_children(fragment.root_element())
}

fn convert_element(el: ElementRef<'_>) -> ElementNode {
    let value = el.value();
    ElementNode {
        tag: value.name().to_string(),
        attributes: value
            .attrs()
            .map(|(name, val)| (name.to_string(), val.to_string()))
            .collect(),
        children: convert_children(el),
    }
}

fn convert_children(el: ElementRef<'_>) -> Vec<NodeChild> {
    let mut out = Vec::new();
    for child in el.children() {
        match child.value() {
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    out.push(NodeChild::Element(convert_element(child_el)));
                }
            }
            Node::Text(text) => {
                let text: &str = text;
                if !text.trim().is_empty() {
                    out.push(NodeChild::Text(text.to_string()));
                }
            }
            _ => {}
        }
    }
    out
}
