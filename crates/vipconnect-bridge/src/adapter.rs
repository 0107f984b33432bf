// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host web surface lifecycle and inbound message plumbing.
//
// `WebviewHostAdapter` owns one session's web surface: on start it installs
// the forwarder script, registers the reserved channel, and loads the
// operator session URL; on stop (or drop) it tears both down so the surface
// can be reused. Inbound messages are classified and handed straight to the
// orchestrator on the caller's thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::link::LinkConnector;
use crate::message::{self, BRIDGE_CHANNEL, BridgeMessage};
use crate::orchestrator::{LinkSessionOrchestrator, SessionState};
use crate::reply::ReplySink;
use crate::script::{UserScript, bridge_user_script};
use crate::session::SessionConfig;

/// The minimal webview contract the SDK needs from a platform.
///
/// Implementations wrap WKWebView-style surfaces; [`crate::stub`] provides
/// an in-memory one for tests and the desktop demo.
pub trait WebviewSurface: Send + Sync {
    /// Expose a named native message channel to page content.
    fn register_channel(&self, name: &str);
    /// Remove a previously registered channel.
    fn unregister_channel(&self, name: &str);
    /// Install a user script for subsequent page loads.
    fn install_script(&self, script: &UserScript);
    /// Remove all installed user scripts.
    fn remove_scripts(&self);
    /// Navigate the surface to `url`.
    fn load_url(&self, url: &str);
}

/// Binds one cashier session to a web surface.
pub struct WebviewHostAdapter {
    surface: Arc<dyn WebviewSurface>,
    orchestrator: LinkSessionOrchestrator,
    config: Arc<SessionConfig>,
    started: AtomicBool,
}

impl WebviewHostAdapter {
    pub fn new(
        surface: Arc<dyn WebviewSurface>,
        config: Arc<SessionConfig>,
        connector: Arc<dyn LinkConnector>,
    ) -> Self {
        Self {
            surface,
            orchestrator: LinkSessionOrchestrator::new(Arc::clone(&config), connector),
            config,
            started: AtomicBool::new(false),
        }
    }

    /// Install the bridge script, register the channel, and load the
    /// session URL. Calling `start` twice is a no-op.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("adapter already started");
            return;
        }
        info!(url = %self.config.session_url, "starting cashier session");
        self.surface.install_script(&bridge_user_script());
        self.surface.register_channel(BRIDGE_CHANNEL);
        self.surface.load_url(&self.config.session_url);
    }

    /// Unregister the channel and remove installed scripts. Idempotent;
    /// also run on drop.
    pub fn stop(&self) {
        if !self.started.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("stopping cashier session");
        self.surface.unregister_channel(BRIDGE_CHANNEL);
        self.surface.remove_scripts();
    }

    /// Feed one raw page message into the bridge.
    ///
    /// `channel` is the channel the surface received the message on; anything
    /// other than the reserved bridge channel is treated as unrecognized (the
    /// page promise, if any, still gets an empty acknowledgment). `reply` is
    /// the surface's reply continuation for this message, when it has one.
    pub fn handle_inbound_message(
        &self,
        channel: &str,
        body: &Value,
        reply: Option<Box<dyn ReplySink>>,
    ) {
        if channel != BRIDGE_CHANNEL {
            warn!(channel, "message on unexpected channel");
        }
        let message = message::classify(channel, body);
        if let BridgeMessage::LinkTokenRequested { .. } = &message {
            debug!("link token received from cashier page");
        }
        self.orchestrator.handle_message(message, reply);
    }

    /// Current orchestrator state.
    pub fn session_state(&self) -> SessionState {
        self.orchestrator.state()
    }

    /// Whether a page reply is still pending.
    pub fn has_pending_reply(&self) -> bool {
        self.orchestrator.has_pending_reply()
    }
}

impl Drop for WebviewHostAdapter {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for WebviewHostAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebviewHostAdapter")
            .field("started", &self.started.load(Ordering::SeqCst))
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::{StubLinkConnector, StubWebviewSurface, SurfaceCall};
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn noop() -> Arc<dyn Fn() + Send + Sync> {
        Arc::new(|| {})
    }

    fn adapter_with(
        connector: StubLinkConnector,
    ) -> (Arc<StubWebviewSurface>, WebviewHostAdapter) {
        let surface = Arc::new(StubWebviewSurface::new());
        let config = Arc::new(SessionConfig::new(
            "https://cert.example.io/sdk?mode=deposit&native=true#abc",
            noop(),
            noop(),
        ));
        let adapter = WebviewHostAdapter::new(
            Arc::clone(&surface) as Arc<dyn WebviewSurface>,
            config,
            Arc::new(connector),
        );
        (surface, adapter)
    }

    #[test]
    fn start_installs_script_registers_channel_then_loads() {
        let (surface, adapter) = adapter_with(StubLinkConnector::holding());
        adapter.start();

        assert_eq!(
            surface.calls(),
            vec![
                SurfaceCall::InstallScript,
                SurfaceCall::RegisterChannel(BRIDGE_CHANNEL.into()),
                SurfaceCall::LoadUrl("https://cert.example.io/sdk?mode=deposit&native=true#abc".into()),
            ]
        );
        assert_eq!(surface.installed_scripts().len(), 1);
    }

    #[test]
    fn start_is_idempotent() {
        let (surface, adapter) = adapter_with(StubLinkConnector::holding());
        adapter.start();
        adapter.start();

        assert_eq!(surface.calls().len(), 3);
    }

    #[test]
    fn stop_unregisters_channel_and_removes_scripts() {
        let (surface, adapter) = adapter_with(StubLinkConnector::holding());
        adapter.start();
        adapter.stop();
        adapter.stop();

        let calls = surface.calls();
        assert_eq!(
            &calls[3..],
            &[
                SurfaceCall::UnregisterChannel(BRIDGE_CHANNEL.into()),
                SurfaceCall::RemoveScripts,
            ]
        );
        assert!(surface.installed_scripts().is_empty());
    }

    #[test]
    fn drop_tears_down_the_surface() {
        let (surface, adapter) = adapter_with(StubLinkConnector::holding());
        adapter.start();
        drop(adapter);

        assert!(
            surface
                .calls()
                .contains(&SurfaceCall::UnregisterChannel(BRIDGE_CHANNEL.into()))
        );
        assert!(surface.calls().contains(&SurfaceCall::RemoveScripts));
    }

    #[test]
    fn link_token_round_trip_through_adapter() {
        let metadata = json!({ "accounts": [] });
        let (_surface, adapter) =
            adapter_with(StubLinkConnector::succeeding_with(metadata.clone()));
        adapter.start();

        let received = Arc::new(Mutex::new(None));
        let received_in = Arc::clone(&received);
        adapter.handle_inbound_message(
            BRIDGE_CHANNEL,
            &json!({ "linkToken": "link-sandbox-1" }),
            Some(Box::new(move |m: Option<Value>, e: Option<Value>| {
                *received_in.lock().unwrap() = Some((m, e));
            })),
        );

        let (m, e) = received.lock().unwrap().take().expect("reply delivered");
        assert_eq!(m, Some(metadata));
        assert!(e.is_none());
        assert_eq!(adapter.session_state(), SessionState::Idle);
    }

    #[test]
    fn foreign_channel_message_gets_empty_acknowledgment() {
        let (_surface, adapter) = adapter_with(StubLinkConnector::holding());
        adapter.start();

        let acks = Arc::new(AtomicUsize::new(0));
        let acks_in = Arc::clone(&acks);
        adapter.handle_inbound_message(
            "SomeOtherChannel",
            &json!({ "linkToken": "t" }),
            Some(Box::new(move |m: Option<Value>, e: Option<Value>| {
                assert!(m.is_none() && e.is_none());
                acks_in.fetch_add(1, Ordering::SeqCst);
            })),
        );

        // Never treated as a link-token request.
        assert_eq!(acks.load(Ordering::SeqCst), 1);
        assert_eq!(adapter.session_state(), SessionState::Idle);
        assert!(!adapter.has_pending_reply());
    }
}
