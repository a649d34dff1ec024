//! Native surface: hands a structured tree and style rules to the host's designer API.

use tracing::debug;

use flowsmith_shared::{FlowsmithError, GeneratedElement, Result};

use super::{HostCapabilities, InsertionOutcome, InsertionSurface};
use crate::css::parse_css_rules;
use crate::tree::html_to_tree;

/// Inserts through [`super::DesignerApi`]. Matches only when the host exposes one.
pub struct NativeSurface;

impl InsertionSurface for NativeSurface {
    fn detect(&self, caps: &HostCapabilities) -> bool {
        caps.designer.is_some()
    }

    fn insert(
        &self,
        element: &GeneratedElement,
        caps: &HostCapabilities,
    ) -> Result<InsertionOutcome> {
        let designer = caps
            .designer
            .as_ref()
            .ok_or_else(|| FlowsmithError::insertion("host exposes no designer API"))?;

        let nodes = html_to_tree(&element.html);
        let rules = parse_css_rules(&element.css);
        debug!(nodes = nodes.len(), rules = rules.len(), "converted element for designer");

        designer.insert_element(&nodes, &rules)?;
        Ok(InsertionOutcome::Inserted { nodes, rules })
    }

    fn name(&self) -> &str {
        "native"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::surfaces::test_support::RecordingDesigner;
    use crate::tree::NodeChild;
    use flowsmith_shared::ElementKind;

    #[test]
    fn designer_receives_tree_and_rules() {
        let designer = Arc::new(RecordingDesigner::default());
        let caps = HostCapabilities::default().with_designer(designer.clone());
        let element = GeneratedElement {
            html: r#"<header class="fs-header"><h1>Hi</h1></header>"#.into(),
            css: ".fs-header { padding: 64px; } .fs-header h1 { margin: 0; }".into(),
            kind: ElementKind::Header,
        };

        let outcome = NativeSurface.insert(&element, &caps).unwrap();
        let InsertionOutcome::Inserted { nodes, rules } = outcome else {
            panic!("expected native insertion");
        };

        assert_eq!(nodes.len(), 1);
        assert!(matches!(&nodes[0], NodeChild::Element(el) if el.tag == "header"));
        assert_eq!(rules.len(), 2);

        let calls = designer.calls.lock().unwrap();
        assert_eq!(calls[0].0, nodes);
        assert_eq!(calls[0].1, rules);
    }

    #[test]
    fn designer_errors_propagate() {
        struct Refusing;
        impl crate::surfaces::DesignerApi for Refusing {
            fn insert_element(
                &self,
                _nodes: &[NodeChild],
                _rules: &[crate::css::CssRule],
            ) -> Result<()> {
                Err(FlowsmithError::insertion("no element selected"))
            }
        }

        let caps = HostCapabilities::default().with_designer(Arc::new(Refusing));
        let element = GeneratedElement {
            html: "<p>x</p>".into(),
            css: String::new(),
            kind: ElementKind::Generic,
        };
        let err = NativeSurface.insert(&element, &caps).unwrap_err();
        assert!(err.to_string().contains("no element selected"));
    }
}
