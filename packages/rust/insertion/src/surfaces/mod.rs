//! Insertion surfaces and capability-based selection.
//!
//! Surfaces are tried in priority order; the first one whose capabilities
//! the host provides handles the insertion.

mod native;
mod preview;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};
use uuid::Uuid;

use flowsmith_shared::{FlowsmithError, GeneratedElement, Result};

use crate::css::CssRule;
use crate::tree::NodeChild;

pub use native::NativeSurface;
pub use preview::{CopyTarget, PreviewHandle, PreviewModal, PreviewSurface};

/// Message shown when the host offers no way to insert.
const NO_SURFACE_MESSAGE: &str = "No insertion surface available; copy the HTML and CSS manually";

// ---------------------------------------------------------------------------
// Host capabilities
// ---------------------------------------------------------------------------

/// A host's structured insertion API.
pub trait DesignerApi: Send + Sync {
    /// Insert an element tree and register its style rules.
    fn insert_element(&self, nodes: &[NodeChild], rules: &[CssRule]) -> Result<()>;
}

/// A host able to show and remove transient preview modals.
pub trait ModalHost: Send + Sync {
    fn mount(&self, modal: &PreviewModal) -> Result<()>;
    fn dismiss(&self, id: Uuid);
}

/// Destination for copy-to-clipboard actions.
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<()>;
}

/// What the host page exposes, probed at call time.
#[derive(Clone, Default)]
pub struct HostCapabilities {
    pub designer: Option<Arc<dyn DesignerApi>>,
    pub modal_host: Option<Arc<dyn ModalHost>>,
}

impl HostCapabilities {
    pub fn with_designer(mut self, designer: Arc<dyn DesignerApi>) -> Self {
        self.designer = Some(designer);
        self
    }

    pub fn with_modal_host(mut self, host: Arc<dyn ModalHost>) -> Self {
        self.modal_host = Some(host);
        self
    }
}

impl std::fmt::Debug for HostCapabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCapabilities")
            .field("designer", &self.designer.is_some())
            .field("modal_host", &self.modal_host.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Result of a successful insertion.
#[derive(Debug)]
pub enum InsertionOutcome {
    /// Handed to the native API.
    Inserted {
        nodes: Vec<NodeChild>,
        rules: Vec<CssRule>,
    },
    /// Shown in a preview modal for manual copying.
    Previewed(PreviewHandle),
}

/// One way of getting a generated element onto the page.
pub trait InsertionSurface: Send + Sync {
    /// Whether the host provides what this surface needs.
    fn detect(&self, caps: &HostCapabilities) -> bool;

    fn insert(
        &self,
        element: &GeneratedElement,
        caps: &HostCapabilities,
    ) -> Result<InsertionOutcome>;

    /// Human-readable surface name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds surfaces in priority order (native first, preview last).
pub struct SurfaceRegistry {
    surfaces: Vec<Box<dyn InsertionSurface>>,
}

impl SurfaceRegistry {
    /// Registry with both built-in surfaces and the default preview timeout.
    pub fn new() -> Self {
        Self {
            surfaces: vec![Box::new(NativeSurface), Box::new(PreviewSurface::default())],
        }
    }

    /// Registry whose preview modals dismiss after `timeout`.
    pub fn with_preview_timeout(timeout: Duration) -> Self {
        Self {
            surfaces: vec![
                Box::new(NativeSurface),
                Box::new(PreviewSurface::new(timeout)),
            ],
        }
    }

    /// The first surface the host supports, if any.
    pub fn detect(&self, caps: &HostCapabilities) -> Option<&dyn InsertionSurface> {
        self.surfaces
            .iter()
            .find(|s| s.detect(caps))
            .map(|s| s.as_ref())
    }

    /// Insert through the first supported surface.
    #[instrument(skip_all, fields(kind = %element.kind, caps = ?caps))]
    pub fn insert(
        &self,
        element: &GeneratedElement,
        caps: &HostCapabilities,
    ) -> Result<InsertionOutcome> {
        let surface = self
            .detect(caps)
            .ok_or_else(|| FlowsmithError::insertion(NO_SURFACE_MESSAGE))?;
        info!(surface = surface.name(), "inserting generated element");
        surface.insert(element, caps)
    }
}

impl Default for SurfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Insert `element` using the default registry.
pub fn insert(element: &GeneratedElement, caps: &HostCapabilities) -> Result<InsertionOutcome> {
    SurfaceRegistry::new().insert(element, caps)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct RecordingDesigner {
        pub calls: Mutex<Vec<(Vec<NodeChild>, Vec<CssRule>)>>,
    }

    impl DesignerApi for RecordingDesigner {
        fn insert_element(&self, nodes: &[NodeChild], rules: &[CssRule]) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((nodes.to_vec(), rules.to_vec()));
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingHost {
        pub mounted: Mutex<Vec<Uuid>>,
        pub dismissed: Mutex<Vec<Uuid>>,
    }

    impl ModalHost for RecordingHost {
        fn mount(&self, modal: &PreviewModal) -> Result<()> {
            self.mounted.lock().unwrap().push(modal.id);
            Ok(())
        }

        fn dismiss(&self, id: Uuid) {
            self.dismissed.lock().unwrap().push(id);
        }
    }
}
