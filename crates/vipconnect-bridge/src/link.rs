// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Consumed contract of the native identity-verification SDK (Plaid Link).
//
// VIP Connect does not reach into Link's internals; it only needs to create
// a handler from a token, open it with a presentation method, and receive
// one terminal callback (success or exit) plus any number of intermediate
// events. Real platform adapters and the desktop stub both implement
// `LinkConnector`/`LinkHandle`.

use serde_json::Value;

use vipconnect_core::error::Result;

use crate::presentation::PresentationMethod;

/// Payload of Link's terminal success callback.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSuccess {
    /// The public token to exchange server-side.
    pub public_token: String,
    /// Link session metadata (institution, accounts, ...), as JSON.
    pub metadata: Value,
}

/// Payload of Link's terminal exit callback.
///
/// Exit is the normal cancel/abort path; `error` is only present when Link
/// itself failed, not when the user simply backed out.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkExit {
    /// Exit metadata (last status, request id, ...), as JSON.
    pub metadata: Value,
    /// Error detail, if the flow ended in an SDK error.
    pub error: Option<Value>,
}

/// An intermediate Link event (OPEN, TRANSITION_VIEW, HANDOFF, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct LinkEvent {
    /// Event name as reported by the SDK.
    pub name: String,
    /// Event metadata, as JSON.
    pub metadata: Value,
}

/// Terminal success callback. Fires at most once per flow instance.
pub type OnLinkSuccess = Box<dyn FnOnce(LinkSuccess) + Send>;

/// Terminal exit callback. Mutually exclusive with success.
pub type OnLinkExit = Box<dyn FnOnce(LinkExit) + Send>;

/// Intermediate event callback. May fire zero or more times.
pub type OnLinkEvent = Box<dyn Fn(LinkEvent) + Send + Sync>;

/// Everything needed to create one Link flow instance.
///
/// Built fresh by the orchestrator for every inbound link token; the
/// callbacks wire the flow's outcome back to the pending page reply.
pub struct LinkTokenConfiguration {
    /// The link token received from the cashier page.
    pub token: String,
    pub on_success: OnLinkSuccess,
    pub on_exit: OnLinkExit,
    pub on_event: OnLinkEvent,
}

impl std::fmt::Debug for LinkTokenConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkTokenConfiguration")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Factory for Link flow handles.
pub trait LinkConnector: Send + Sync {
    /// Create a handle for the given configuration.
    ///
    /// Returns `VipConnectError::LinkCreation` when the SDK rejects the
    /// configuration (malformed or expired token, missing entitlements).
    fn create(&self, configuration: LinkTokenConfiguration) -> Result<Box<dyn LinkHandle>>;
}

/// A created-but-possibly-not-yet-opened Link flow.
///
/// Exclusively owned by the orchestrator; dropping the handle is the only
/// cancellation mechanism (the underlying SDK ignores callbacks from
/// replaced handlers).
pub trait LinkHandle: Send + Sync {
    /// Present the Link UI using the given presentation method.
    ///
    /// Callbacks from the configuration may fire at any point after this,
    /// including synchronously for test/stub implementations.
    fn open(&self, method: &PresentationMethod) -> Result<()>;
}
