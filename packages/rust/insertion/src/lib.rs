//! Insertion of generated elements into a host page.
//!
//! Two surfaces are available, chosen by probing the host at call time:
//! a native designer API that accepts a structured element tree plus parsed
//! CSS rules, and a preview modal showing the raw HTML and CSS for manual
//! copying. When the host offers neither, insertion fails.

mod css;
mod surfaces;
mod tree;

pub use css::{CssRule, parse_css_rules};
pub use surfaces::{
    Clipboard, CopyTarget, DesignerApi, HostCapabilities, InsertionOutcome, InsertionSurface,
    ModalHost, NativeSurface, PreviewHandle, PreviewModal, PreviewSurface, SurfaceRegistry,
    insert,
};
pub use tree::{ElementNode, NodeChild, html_to_tree};
pub use uuid::Uuid;
