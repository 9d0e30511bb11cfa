//! The connection-request surface state.
//!
//! The three pieces of UI state the stream bridge mutates across its
//! lifecycle — the status text, the visibility of the connection-request
//! region, and whether the submission control accepts another attempt — are
//! owned by a single [`ConnectPanel`] instance and mutated only through the
//! [`UiSurface`] port.  Nothing is looked up from ambient shared scope, so
//! one session can never clobber another's surface.
//!
//! In the terminal client the "panel" is the pre-session console: status
//! changes are logged, and the final status text is printed by the binary
//! once the session ends.

use tracing::info;

use crate::application::bridge::UiSurface;

/// Owner of the connection-request surface state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectPanel {
    status: String,
    form_visible: bool,
    submit_enabled: bool,
}

impl ConnectPanel {
    /// Creates a panel in the idle configuration: empty status, request
    /// form visible, submission enabled.
    pub fn new() -> Self {
        Self {
            status: String::new(),
            form_visible: true,
            submit_enabled: true,
        }
    }

    /// The current status text.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Whether the connection-request region is visible.
    pub fn form_visible(&self) -> bool {
        self.form_visible
    }

    /// Whether the submission control accepts another attempt.
    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }
}

impl Default for ConnectPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl UiSurface for ConnectPanel {
    fn set_status(&mut self, text: &str) {
        if !text.is_empty() {
            info!(status = text, "status updated");
        }
        self.status = text.to_string();
    }

    fn set_form_visible(&mut self, visible: bool) {
        self.form_visible = visible;
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
