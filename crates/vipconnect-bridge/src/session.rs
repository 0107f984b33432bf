// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-session configuration handed to the host adapter by the invoking
// screen. Immutable after construction and shared read-only (`Arc`) with
// the orchestrator.

use std::fmt;
use std::sync::Arc;

use crate::link::{LinkEvent, LinkExit, LinkSuccess};
use crate::presentation::PresentationMethod;

/// Callback invoked when the web flow signals completion.
pub type OnComplete = Arc<dyn Fn() + Send + Sync>;

/// Observer for Link outcomes, invoked before the page reply is resolved.
pub type SuccessObserver = Arc<dyn Fn(&LinkSuccess) + Send + Sync>;
pub type EventObserver = Arc<dyn Fn(&LinkEvent) + Send + Sync>;
pub type ExitObserver = Arc<dyn Fn(&LinkExit) + Send + Sync>;

/// Configuration for one embedded cashier session.
///
/// * `session_url` — the operator-issued URL to load (session id in the
///   fragment).
/// * `presentation` — how the Link UI is shown; defaults to modal.
/// * `on_complete` — dismiss the host surface's screen. Fired on the page's
///   close request, and first on a fullscreen request.
/// * `on_fullscreen_requested` — relaunch the whole flow in fullscreen
///   presentation; always fired after `on_complete`.
/// * optional Link observers, mirroring the SDK's onSuccess/onEvent/onExit.
#[derive(Clone)]
pub struct SessionConfig {
    pub session_url: String,
    pub presentation: PresentationMethod,
    pub on_complete: OnComplete,
    pub on_fullscreen_requested: OnComplete,
    pub on_link_success: Option<SuccessObserver>,
    pub on_link_event: Option<EventObserver>,
    pub on_link_exit: Option<ExitObserver>,
}

impl SessionConfig {
    /// Minimal configuration: a URL, default modal presentation, and the two
    /// required lifecycle callbacks.
    pub fn new(
        session_url: impl Into<String>,
        on_complete: OnComplete,
        on_fullscreen_requested: OnComplete,
    ) -> Self {
        Self {
            session_url: session_url.into(),
            presentation: PresentationMethod::default(),
            on_complete,
            on_fullscreen_requested,
            on_link_success: None,
            on_link_event: None,
            on_link_exit: None,
        }
    }

    pub fn with_presentation(mut self, method: PresentationMethod) -> Self {
        self.presentation = method;
        self
    }

    pub fn with_success_observer(mut self, observer: SuccessObserver) -> Self {
        self.on_link_success = Some(observer);
        self
    }

    pub fn with_event_observer(mut self, observer: EventObserver) -> Self {
        self.on_link_event = Some(observer);
        self
    }

    pub fn with_exit_observer(mut self, observer: ExitObserver) -> Self {
        self.on_link_exit = Some(observer);
        self
    }
}

// Closures make a derived Debug impossible; show the data fields only.
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("session_url", &self.session_url)
            .field("presentation", &self.presentation)
            .field("has_success_observer", &self.on_link_success.is_some())
            .field("has_event_observer", &self.on_link_event.is_some())
            .field("has_exit_observer", &self.on_link_exit.is_some())
            .finish_non_exhaustive()
    }
}
