//! Terminal-backed insertion hosts.

use std::io::Write;
use std::sync::Mutex;

use base64::Engine;
use flowsmith_insertion::{Clipboard, CssRule, DesignerApi, ModalHost, NodeChild, PreviewModal};
use flowsmith_shared::{FlowsmithError, Result};

/// Designer that prints the element tree and style rules as JSON.
pub(crate) struct StdoutDesigner;

impl DesignerApi for StdoutDesigner {
    fn insert_element(&self, nodes: &[NodeChild], rules: &[CssRule]) -> Result<()> {
        let payload = serde_json::json!({ "nodes": nodes, "rules": rules });
        let text = serde_json::to_string_pretty(&payload)
            .map_err(|e| FlowsmithError::insertion(format!("failed to encode tree: {e}")))?;
        println!("{text}");
        Ok(())
    }
}

/// Modal host that draws the preview in the terminal.
pub(crate) struct TerminalModalHost;

impl ModalHost for TerminalModalHost {
    fn mount(&self, modal: &PreviewModal) -> Result<()> {
        let mut out = std::io::stdout().lock();
        let rule = "─".repeat(60);
        writeln!(out, "{rule}")
            .and_then(|_| writeln!(out, "  Preview ({}): copy the snippets manually", modal.kind))
            .and_then(|_| writeln!(out, "{rule}"))
            .and_then(|_| writeln!(out, "HTML:\n{}\n", modal.html))
            .and_then(|_| writeln!(out, "CSS:\n{}", modal.css))
            .and_then(|_| writeln!(out, "{rule}"))
            .map_err(|e| FlowsmithError::insertion(format!("failed to draw preview: {e}")))
    }

    fn dismiss(&self, _id: flowsmith_insertion::Uuid) {
        println!("  (preview closed)");
    }
}

/// Clipboard reached through the terminal's OSC 52 escape sequence.
pub(crate) struct TerminalClipboard<W> {
    out: Mutex<W>,
}

impl TerminalClipboard<std::io::Stdout> {
    pub(crate) fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W> TerminalClipboard<W> {
    pub(crate) fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> Clipboard for TerminalClipboard<W> {
    fn write_text(&self, text: &str) -> Result<()> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(text);
        let mut out = self
            .out
            .lock()
            .map_err(|_| FlowsmithError::insertion("clipboard writer poisoned"))?;
        write!(out, "\x1b]52;c;{encoded}\x07")
            .and_then(|_| out.flush())
            .map_err(|e| FlowsmithError::insertion(format!("failed to write clipboard: {e}")))
    }
}
