//! Preview surface: a transient modal with the raw HTML and CSS for manual copying.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Notify;
use tracing::{debug, warn};
use uuid::Uuid;

use flowsmith_shared::{ElementKind, FlowsmithError, GeneratedElement, Result};

use super::{Clipboard, HostCapabilities, InsertionOutcome, InsertionSurface, ModalHost};

/// How long a modal stays up without an explicit close.
const DEFAULT_PREVIEW_TIMEOUT: Duration = Duration::from_secs(10);

/// Which part of the element a copy action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTarget {
    Html,
    Css,
}

/// Contents of one preview modal.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewModal {
    pub id: Uuid,
    pub html: String,
    pub css: String,
    pub kind: ElementKind,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PreviewModal {
    fn new(element: &GeneratedElement, timeout: Duration) -> Self {
        let created_at = Utc::now();
        let expires_at = chrono::Duration::from_std(timeout)
            .ok()
            .and_then(|d| created_at.checked_add_signed(d))
            .unwrap_or(created_at);
        Self {
            id: Uuid::now_v7(),
            html: element.html.clone(),
            css: element.css.clone(),
            kind: element.kind,
            created_at,
            expires_at,
        }
    }

    /// Copy the HTML or CSS text to `clipboard`.
    pub fn copy(&self, target: CopyTarget, clipboard: &dyn Clipboard) -> Result<()> {
        let text = match target {
            CopyTarget::Html => &self.html,
            CopyTarget::Css => &self.css,
        };
        clipboard.write_text(text)
    }
}

// ---------------------------------------------------------------------------
// PreviewHandle
// ---------------------------------------------------------------------------

/// Owner of a mounted modal. The modal is dismissed exactly once: by the
/// timer, or by [`PreviewHandle::close`], whichever comes first. Dropping the
/// handle leaves the timer running.
pub struct PreviewHandle {
    modal: PreviewModal,
    host: Arc<dyn ModalHost>,
    dismissed: Arc<AtomicBool>,
    closed: Arc<Notify>,
}

impl PreviewHandle {
    fn arm(modal: PreviewModal, host: Arc<dyn ModalHost>, timeout: Duration) -> Self {
        let dismissed = Arc::new(AtomicBool::new(false));
        let closed = Arc::new(Notify::new());

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let host = host.clone();
                let dismissed = dismissed.clone();
                let closed = closed.clone();
                let id = modal.id;
                runtime.spawn(async move {
                    tokio::select! {
                        _ = tokio::time::sleep(timeout) => {
                            if dismiss_once(host.as_ref(), id, &dismissed) {
                                debug!(%id, "preview auto-dismissed");
                            }
                        }
                        _ = closed.notified() => {}
                    }
                });
            }
            Err(_) => {
                warn!(id = %modal.id, "no async runtime; preview stays until closed");
            }
        }

        Self {
            modal,
            host,
            dismissed,
            closed,
        }
    }

    pub fn modal(&self) -> &PreviewModal {
        &self.modal
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed.load(Ordering::SeqCst)
    }

    /// Dismiss the modal now and cancel its timer.
    pub fn close(&self) {
        if dismiss_once(self.host.as_ref(), self.modal.id, &self.dismissed) {
            debug!(id = %self.modal.id, "preview closed");
        }
        self.closed.notify_one();
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("modal", &self.modal.id)
            .field("dismissed", &self.is_dismissed())
            .finish()
    }
}

/// Returns `true` if this call performed the dismissal.
fn dismiss_once(host: &dyn ModalHost, id: Uuid, dismissed: &AtomicBool) -> bool {
    if dismissed.swap(true, Ordering::SeqCst) {
        return false;
    }
    host.dismiss(id);
    true
}

// ---------------------------------------------------------------------------
// PreviewSurface
// ---------------------------------------------------------------------------

/// Shows the element in a modal. Matches whenever the host can mount one.
pub struct PreviewSurface {
    timeout: Duration,
}

impl PreviewSurface {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for PreviewSurface {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_TIMEOUT)
    }
}

impl InsertionSurface for PreviewSurface {
    fn detect(&self, caps: &HostCapabilities) -> bool {
        caps.modal_host.is_some()
    }

    fn insert(
        &self,
        element: &GeneratedElement,
        caps: &HostCapabilities,
    ) -> Result<InsertionOutcome> {
        let host = caps
            .modal_host
            .clone()
            .ok_or_else(|| FlowsmithError::insertion("host cannot show a preview"))?;

        let modal = PreviewModal::new(element, self.timeout);
        host.mount(&modal)?;
        debug!(id = %modal.id, timeout_secs = self.timeout.as_secs(), "preview mounted");

        Ok(InsertionOutcome::Previewed(PreviewHandle::arm(
            modal, host, self.timeout,
        )))
    }

    fn name(&self) -> &str {
        "preview"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::surfaces::test_support::RecordingHost;

    #[derive(Default)]
    struct MemoryClipboard {
        text: Mutex<Option<String>>,
    }

    impl Clipboard for MemoryClipboard {
        fn write_text(&self, text: &str) -> Result<()> {
            *self.text.lock().unwrap() = Some(text.to_string());
            Ok(())
        }
    }

    fn element() -> GeneratedElement {
        GeneratedElement {
            html: "<div class=\"fs-block\"><p>Hi</p></div>".into(),
            css: ".fs-block { padding: 20px; }".into(),
            kind: ElementKind::Generic,
        }
    }

    fn preview(host: &Arc<RecordingHost>, timeout: Duration) -> PreviewHandle {
        let caps = HostCapabilities::default().with_modal_host(host.clone());
        match PreviewSurface::new(timeout).insert(&element(), &caps).unwrap() {
            InsertionOutcome::Previewed(handle) => handle,
            other => panic!("expected preview, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn modal_auto_dismisses_after_timeout() {
        let host = Arc::new(RecordingHost::default());
        let handle = preview(&host, Duration::from_secs(10));
        assert_eq!(host.mounted.lock().unwrap().len(), 1);

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert!(!handle.is_dismissed());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(handle.is_dismissed());
        assert_eq!(*host.dismissed.lock().unwrap(), vec![handle.modal().id]);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_close_dismisses_exactly_once() {
        let host = Arc::new(RecordingHost::default());
        let handle = preview(&host, Duration::from_secs(10));

        handle.close();
        handle.close();
        tokio::time::sleep(Duration::from_secs(15)).await;

        assert!(handle.is_dismissed());
        assert_eq!(host.dismissed.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_still_times_out() {
        let host = Arc::new(RecordingHost::default());
        drop(preview(&host, Duration::from_secs(10)));

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(host.dismissed.lock().unwrap().len(), 1);
    }

    #[test]
    fn copy_actions_write_each_part() {
        let modal = PreviewModal::new(&element(), DEFAULT_PREVIEW_TIMEOUT);
        let clipboard = MemoryClipboard::default();

        modal.copy(CopyTarget::Html, &clipboard).unwrap();
        assert_eq!(clipboard.text.lock().unwrap().as_deref(), Some(modal.html.as_str()));

        modal.copy(CopyTarget::Css, &clipboard).unwrap();
        assert_eq!(
            clipboard.text.lock().unwrap().as_deref(),
            Some(".fs-block { padding: 20px; }")
        );
        assert_eq!((modal.expires_at - modal.created_at).num_seconds(), 10);
    }

    #[test]
    fn works_without_runtime() {
        let host = Arc::new(RecordingHost::default());
        let handle = preview(&host, Duration::from_secs(10));
        assert!(!handle.is_dismissed());
        handle.close();
        assert_eq!(host.dismissed.lock().unwrap().len(), 1);
    }
}
