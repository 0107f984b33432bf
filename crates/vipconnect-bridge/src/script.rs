// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-side bridge forwarder script.
//
// Pure transport plumbing: the script relays every window `message` event's
// data verbatim into the native channel. Its exact text is part of the wire
// contract with the deployed cashier web content — change it only in
// lockstep with the web side.

/// Raw source of the forwarder script.
///
/// The optional-chaining guards keep the script inert when it runs outside a
/// native webview (e.g. the page opened in a desktop browser).
const BRIDGE_SCRIPT_SOURCE: &str = r#"window.addEventListener("message", function(e) {
    window?.webkit?.messageHandlers?.NativeBridge?.postMessage(e.data);
});"#;

/// When a user script runs relative to document load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionTime {
    /// Before the document begins parsing.
    DocumentStart,
    /// After the document finishes loading.
    DocumentEnd,
}

/// A script to install into the host web surface, with its placement rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserScript {
    /// JavaScript source text.
    pub source: String,
    /// When the surface should run the script.
    pub injection_time: InjectionTime,
    /// If false, the script also runs in every subframe (the cashier flow
    /// lives in an iframe on some operator deployments).
    pub main_frame_only: bool,
}

/// The bridge forwarder script, configured for installation.
///
/// Installed once per page load, at end of document load, in all frames.
/// The host surface is responsible for not installing it twice.
pub fn bridge_user_script() -> UserScript {
    UserScript {
        source: BRIDGE_SCRIPT_SOURCE.to_owned(),
        injection_time: InjectionTime::DocumentEnd,
        main_frame_only: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_posts_to_reserved_channel() {
        let script = bridge_user_script();
        assert!(script.source.contains(BRIDGE_CHANNEL));
        // Forwards the event data verbatim, nothing else.
        assert!(script.source.contains("postMessage(e.data)"));
    }

    #[test]
    fn script_runs_at_document_end_in_all_frames() {
        let script = bridge_user_script();
        assert_eq!(script.injection_time, InjectionTime::DocumentEnd);
        assert!(!script.main_frame_only);
    }

    #[test]
    fn script_registers_a_single_listener() {
        // One addEventListener call — idempotence across page loads is the
        // surface's job, but the script itself must not stack listeners.
        let source = bridge_user_script().source;
        assert_eq!(source.matches("addEventListener").count(), 1);
    }
}
