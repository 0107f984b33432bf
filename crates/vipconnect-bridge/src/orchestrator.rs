// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Link session orchestration — the stateful core of the bridge.
//
// At most one native Link flow is in flight per session. A link-token
// message arms a fresh reply slot, creates a Link handle bound to the
// token, and opens it; the flow's terminal callback (success or exit)
// resolves the slot exactly once and returns the orchestrator to `Idle`.
// A new token arriving mid-flight supersedes the previous request: the old
// slot is abandoned unresolved and the old handle is dropped on the floor.
//
// All transitions are serialized behind one mutex (single logical actor per
// session). Link callbacks re-enter through a `Weak` reference and carry the
// generation they were created under, so callbacks from a superseded flow
// can never disturb the current one.

use std::sync::{Arc, Mutex, Weak};

use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use crate::link::{
    LinkConnector, LinkEvent, LinkExit, LinkHandle, LinkSuccess, LinkTokenConfiguration,
};
use crate::message::BridgeMessage;
use crate::reply::{ReplySink, ReplySlot};
use crate::session::SessionConfig;

/// Observable orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No Link flow in flight.
    Idle,
    /// A Link handle is open; waiting for its terminal callback.
    AwaitingLink,
}

/// Mutable state guarded by the orchestrator's mutex.
struct Inner {
    state: SessionState,
    /// The single pending reply for the outstanding link-token request.
    reply: Option<ReplySlot>,
    /// The current Link flow handle. Replaced wholesale on supersede.
    handle: Option<Arc<dyn LinkHandle>>,
    /// Bumped on every launch; stale callbacks compare against it.
    generation: u64,
}

/// Serialized state machine driving the native Link flow.
pub struct LinkSessionOrchestrator {
    config: Arc<SessionConfig>,
    connector: Arc<dyn LinkConnector>,
    inner: Arc<Mutex<Inner>>,
}

impl LinkSessionOrchestrator {
    pub fn new(config: Arc<SessionConfig>, connector: Arc<dyn LinkConnector>) -> Self {
        Self {
            config,
            connector,
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::Idle,
                reply: None,
                handle: None,
                generation: 0,
            })),
        }
    }

    /// Current state (primarily for tests and diagnostics).
    pub fn state(&self) -> SessionState {
        self.inner.lock().expect("orchestrator lock poisoned").state
    }

    /// Whether a page reply is still pending.
    pub fn has_pending_reply(&self) -> bool {
        self.inner
            .lock()
            .expect("orchestrator lock poisoned")
            .reply
            .as_ref()
            .is_some_and(ReplySlot::is_pending)
    }

    /// Process one classified bridge message.
    ///
    /// `reply` is the page's reply channel for this message, when it
    /// attached one. Messages are expected in page emission order; callers
    /// must not invoke this concurrently from multiple threads for the same
    /// logical event (the internal mutex serializes regardless).
    pub fn handle_message(&self, message: BridgeMessage, reply: Option<Box<dyn ReplySink>>) {
        match message {
            BridgeMessage::LinkTokenRequested { token } => self.launch_link(token, reply),
            BridgeMessage::CloseRequested => {
                info!("close requested by web content");
                self.inner.lock().expect("orchestrator lock poisoned").state = SessionState::Idle;
                (self.config.on_complete)();
            }
            BridgeMessage::FullscreenRequested => {
                info!("fullscreen presentation requested by web content");
                self.inner.lock().expect("orchestrator lock poisoned").state = SessionState::Idle;
                // Completion first, then the relaunch hook — in that order.
                (self.config.on_complete)();
                (self.config.on_fullscreen_requested)();
            }
            BridgeMessage::Unrecognized(raw) => {
                debug!(body = %raw, "unrecognized bridge message");
                // The page promise must still settle: empty acknowledgment.
                if let Some(sink) = reply {
                    sink.send(None, None);
                }
            }
        }
    }

    /// Arm a reply slot for `token` and start the Link flow.
    #[instrument(skip_all)]
    fn launch_link(&self, token: String, reply: Option<Box<dyn ReplySink>>) {
        let slot = match reply {
            Some(sink) => ReplySlot::new(sink),
            None => ReplySlot::unarmed(),
        };

        let generation = {
            let mut inner = self.inner.lock().expect("orchestrator lock poisoned");

            // Supersede: the old slot is abandoned, never resolved, and the
            // old handle is simply dropped (no explicit cancel exists).
            if let Some(old) = inner.reply.take()
                && old.abandon()
            {
                warn!("new link token supersedes an unresolved request");
            }
            inner.handle = None;
            inner.generation += 1;
            inner.reply = Some(slot.clone());
            inner.generation
        };

        let configuration = self.link_configuration(token, slot.clone(), generation);

        // Create and open outside the lock: stub/test connectors may fire
        // terminal callbacks synchronously from `open`.
        let handle: Arc<dyn LinkHandle> = match self.connector.create(configuration) {
            Ok(handle) => Arc::from(handle),
            Err(e) => {
                error!(error = %e, "unable to create Link handler");
                // The original SDK left the page promise hanging here; we
                // settle it with an error payload instead.
                slot.resolve(None, Some(json!({ "error": e.to_string() })));
                self.settle(generation);
                return;
            }
        };

        {
            let mut inner = self.inner.lock().expect("orchestrator lock poisoned");
            if inner.generation != generation {
                // Superseded between create and open; discard quietly.
                return;
            }
            inner.state = SessionState::AwaitingLink;
            inner.handle = Some(Arc::clone(&handle));
        }

        if let Err(e) = handle.open(&self.config.presentation) {
            error!(error = %e, "unable to open Link flow");
            slot.resolve(None, Some(json!({ "error": e.to_string() })));
            self.settle(generation);
        }
    }

    /// Build the per-flow Link configuration with its result wiring.
    fn link_configuration(
        &self,
        token: String,
        slot: ReplySlot,
        generation: u64,
    ) -> LinkTokenConfiguration {
        let success_observer = self.config.on_link_success.clone();
        let exit_observer = self.config.on_link_exit.clone();
        let event_observer = self.config.on_link_event.clone();

        let success_slot = slot.clone();
        let success_inner = Arc::downgrade(&self.inner);
        let on_success = Box::new(move |success: LinkSuccess| {
            info!("Link flow succeeded");
            if let Some(observer) = &success_observer {
                observer(&success);
            }
            success_slot.resolve(Some(success.metadata), None);
            settle_generation(&success_inner, generation);
        });

        let exit_slot = slot;
        let exit_inner = Arc::downgrade(&self.inner);
        let on_exit = Box::new(move |exit: LinkExit| {
            // Exit is the normal cancel path; the error field alone decides
            // whether the page sees a failure.
            info!(with_error = exit.error.is_some(), "Link flow exited");
            if let Some(observer) = &exit_observer {
                observer(&exit);
            }
            exit_slot.resolve(Some(exit.metadata), exit.error);
            settle_generation(&exit_inner, generation);
        });

        let on_event = Box::new(move |event: LinkEvent| {
            debug!(name = %event.name, "Link event");
            if let Some(observer) = &event_observer {
                observer(&event);
            }
        });

        LinkTokenConfiguration {
            token,
            on_success,
            on_exit,
            on_event,
        }
    }

    /// Return to `Idle` and release flow resources, if `generation` is
    /// still the current launch.
    fn settle(&self, generation: u64) {
        settle_generation(&Arc::downgrade(&self.inner), generation);
    }
}

impl std::fmt::Debug for LinkSessionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSessionOrchestrator")
            .field("state", &self.state())
            .field("pending_reply", &self.has_pending_reply())
            .finish_non_exhaustive()
    }
}

/// Shared settle path for flow callbacks.
///
/// Callbacks hold only a `Weak` reference: a flow outliving its orchestrator
/// must not resurrect it, and a superseded flow (stale generation) must not
/// touch the replacement's state.
fn settle_generation(inner: &Weak<Mutex<Inner>>, generation: u64) {
    if let Some(inner) = inner.upgrade() {
        let mut guard = inner.lock().expect("orchestrator lock poisoned");
        if guard.generation == generation {
            guard.state = SessionState::Idle;
            guard.handle = None;
            guard.reply = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubLinkConnector;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Collects every `(metadata, error)` pair a reply sink receives.
    #[derive(Clone, Default)]
    struct ReplyRecorder {
        replies: Arc<Mutex<Vec<(Option<Value>, Option<Value>)>>>,
    }

    impl ReplyRecorder {
        fn sink(&self) -> Box<dyn ReplySink> {
            let replies = Arc::clone(&self.replies);
            Box::new(move |metadata: Option<Value>, error: Option<Value>| {
                replies.lock().unwrap().push((metadata, error));
            })
        }

        fn replies(&self) -> Vec<(Option<Value>, Option<Value>)> {
            self.replies.lock().unwrap().clone()
        }
    }

    /// Counts invocations of a lifecycle callback.
    fn counter() -> (Arc<AtomicUsize>, Arc<dyn Fn() + Send + Sync>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&count);
        let callback: Arc<dyn Fn() + Send + Sync> = Arc::new(move || {
            counted.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    fn config() -> (Arc<SessionConfig>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let (completions, on_complete) = counter();
        let (fullscreens, on_fullscreen) = counter();
        let config = Arc::new(SessionConfig::new(
            "https://cert.example.io/sdk?mode=deposit&native=true#abc",
            on_complete,
            on_fullscreen,
        ));
        (config, completions, fullscreens)
    }

    fn token_message(token: &str) -> BridgeMessage {
        BridgeMessage::LinkTokenRequested {
            token: token.into(),
        }
    }

    #[test]
    fn success_round_trip_resolves_reply_once() {
        let (config, _, _) = config();
        let metadata = json!({ "institution": { "name": "Demo Bank" } });
        let connector = Arc::new(StubLinkConnector::succeeding_with(metadata.clone()));
        let orchestrator = LinkSessionOrchestrator::new(config, connector);

        let recorder = ReplyRecorder::default();
        orchestrator.handle_message(token_message("link-sandbox-1"), Some(recorder.sink()));

        assert_eq!(recorder.replies(), vec![(Some(metadata), None)]);
        assert_eq!(orchestrator.state(), SessionState::Idle);
        assert!(!orchestrator.has_pending_reply());
    }

    #[test]
    fn exit_resolves_reply_with_metadata_and_error() {
        let (config, _, _) = config();
        let metadata = json!({ "status": "requires_credentials" });
        let error = json!({ "errorCode": "INVALID_CREDENTIALS" });
        let connector = Arc::new(StubLinkConnector::exiting_with(
            metadata.clone(),
            Some(error.clone()),
        ));
        let orchestrator = LinkSessionOrchestrator::new(config, connector);

        let recorder = ReplyRecorder::default();
        orchestrator.handle_message(token_message("link-sandbox-2"), Some(recorder.sink()));

        assert_eq!(recorder.replies(), vec![(Some(metadata), Some(error))]);
        assert_eq!(orchestrator.state(), SessionState::Idle);
    }

    #[test]
    fn exit_without_error_is_not_a_failure() {
        let (config, _, _) = config();
        let connector = Arc::new(StubLinkConnector::exiting_with(json!({}), None));
        let orchestrator = LinkSessionOrchestrator::new(config, connector);

        let recorder = ReplyRecorder::default();
        orchestrator.handle_message(token_message("t"), Some(recorder.sink()));

        assert_eq!(recorder.replies(), vec![(Some(json!({})), None)]);
    }

    #[test]
    fn events_are_forwarded_without_resolving_reply() {
        let (config, ..) = config();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in = Arc::clone(&seen);
        let config = Arc::new(
            (*config)
                .clone()
                .with_event_observer(Arc::new(move |event: &LinkEvent| {
                    seen_in.lock().unwrap().push(event.name.clone());
                })),
        );

        // Holding connector: events fire, but no terminal callback.
        let connector = Arc::new(StubLinkConnector::holding_after_events(vec![
            LinkEvent {
                name: "OPEN".into(),
                metadata: json!({}),
            },
            LinkEvent {
                name: "TRANSITION_VIEW".into(),
                metadata: json!({}),
            },
        ]));
        let orchestrator = LinkSessionOrchestrator::new(config, connector);

        let recorder = ReplyRecorder::default();
        orchestrator.handle_message(token_message("t"), Some(recorder.sink()));

        assert_eq!(*seen.lock().unwrap(), vec!["OPEN", "TRANSITION_VIEW"]);
        assert!(recorder.replies().is_empty());
        assert_eq!(orchestrator.state(), SessionState::AwaitingLink);
        assert!(orchestrator.has_pending_reply());
    }

    #[test]
    fn success_observer_runs_before_reply_resolution() {
        let (config, ..) = config();
        let order = Arc::new(Mutex::new(Vec::new()));

        let order_observer = Arc::clone(&order);
        let config = Arc::new((*config).clone().with_success_observer(Arc::new(
            move |_: &LinkSuccess| {
                order_observer.lock().unwrap().push("observer");
            },
        )));

        let connector = Arc::new(StubLinkConnector::succeeding_with(json!({})));
        let orchestrator = LinkSessionOrchestrator::new(config, connector);

        let order_sink = Arc::clone(&order);
        orchestrator.handle_message(
            token_message("t"),
            Some(Box::new(move |_m: Option<Value>, _e: Option<Value>| {
                order_sink.lock().unwrap().push("reply");
            })),
        );

        assert_eq!(*order.lock().unwrap(), vec!["observer", "reply"]);
    }

    #[test]
    fn new_token_supersedes_unresolved_request() {
        let (config, ..) = config();
        let connector = Arc::new(StubLinkConnector::holding());
        let orchestrator = LinkSessionOrchestrator::new(config, Arc::clone(&connector) as _);

        let first = ReplyRecorder::default();
        let second = ReplyRecorder::default();
        orchestrator.handle_message(token_message("first"), Some(first.sink()));
        assert_eq!(orchestrator.state(), SessionState::AwaitingLink);

        orchestrator.handle_message(token_message("second"), Some(second.sink()));

        // The first slot was abandoned, never resolved.
        assert!(first.replies().is_empty());
        assert!(second.replies().is_empty());
        assert!(orchestrator.has_pending_reply());
        assert_eq!(connector.created_tokens(), vec!["first", "second"]);
    }

    #[test]
    fn creation_failure_resolves_reply_with_error() {
        let (config, ..) = config();
        let connector = Arc::new(StubLinkConnector::failing("token expired"));
        let orchestrator = LinkSessionOrchestrator::new(config, connector);

        let recorder = ReplyRecorder::default();
        orchestrator.handle_message(token_message("stale"), Some(recorder.sink()));

        let replies = recorder.replies();
        assert_eq!(replies.len(), 1);
        let (metadata, error) = &replies[0];
        assert!(metadata.is_none());
        let error = error.as_ref().expect("error payload");
        assert!(error["error"].as_str().unwrap().contains("token expired"));
        assert_eq!(orchestrator.state(), SessionState::Idle);
        assert!(!orchestrator.has_pending_reply());
    }

    #[test]
    fn close_fires_completion_once_and_leaves_reply_alone() {
        let (config, completions, fullscreens) = config();
        let connector = Arc::new(StubLinkConnector::holding());
        let orchestrator = LinkSessionOrchestrator::new(config, connector);

        let recorder = ReplyRecorder::default();
        orchestrator.handle_message(token_message("t"), Some(recorder.sink()));
        orchestrator.handle_message(BridgeMessage::CloseRequested, None);

        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert_eq!(fullscreens.load(Ordering::SeqCst), 0);
        assert!(recorder.replies().is_empty());
        assert_eq!(orchestrator.state(), SessionState::Idle);
        // The in-flight flow may still deliver its terminal callback later.
        assert!(orchestrator.has_pending_reply());
    }

    #[test]
    fn fullscreen_fires_completion_then_switch_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));

        let complete_order = Arc::clone(&order);
        let fullscreen_order = Arc::clone(&order);
        let config = Arc::new(SessionConfig::new(
            "https://cert.example.io/sdk#abc",
            Arc::new(move || complete_order.lock().unwrap().push("complete")),
            Arc::new(move || fullscreen_order.lock().unwrap().push("fullscreen")),
        ));

        let connector = Arc::new(StubLinkConnector::holding());
        let orchestrator = LinkSessionOrchestrator::new(config, connector);

        orchestrator.handle_message(BridgeMessage::FullscreenRequested, None);

        assert_eq!(*order.lock().unwrap(), vec!["complete", "fullscreen"]);
    }

    #[test]
    fn unrecognized_message_gets_empty_acknowledgment() {
        let (config, ..) = config();
        let connector = Arc::new(StubLinkConnector::holding());
        let orchestrator = LinkSessionOrchestrator::new(config, connector);

        let recorder = ReplyRecorder::default();
        orchestrator.handle_message(
            BridgeMessage::Unrecognized(json!({ "unexpected": true })),
            Some(recorder.sink()),
        );

        assert_eq!(recorder.replies(), vec![(None, None)]);
        assert_eq!(orchestrator.state(), SessionState::Idle);
    }

    #[test]
    fn repeated_token_requests_each_resolve_their_own_reply() {
        let (config, ..) = config();
        let metadata = json!({ "ok": true });
        let connector = Arc::new(StubLinkConnector::succeeding_with(metadata.clone()));
        let orchestrator = LinkSessionOrchestrator::new(config, connector);

        let recorder = ReplyRecorder::default();
        for _ in 0..3 {
            orchestrator.handle_message(token_message("t"), Some(recorder.sink()));
        }

        // One resolution per request, none crossed.
        assert_eq!(recorder.replies().len(), 3);
        for (m, e) in recorder.replies() {
            assert_eq!(m, Some(metadata.clone()));
            assert!(e.is_none());
        }
    }
}
