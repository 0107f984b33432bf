// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// VIP Connect — web-to-native bridge.
//
// The embedded cashier page and native code talk over a single reserved
// message channel ("NativeBridge"). This crate owns that protocol end to
// end: classifying inbound page messages, injecting the page-side forwarder
// script, orchestrating the native Link flow with exactly-once reply
// semantics, and managing the host web surface lifecycle.
//
// Platform webviews and the real Link SDK sit behind the `WebviewSurface`,
// `LinkConnector`, and `NativePresenter` traits; `stub` provides the
// desktop/CI implementations used by the demo app and tests.

pub mod adapter;
pub mod link;
pub mod message;
pub mod orchestrator;
pub mod presentation;
pub mod reply;
pub mod script;
pub mod session;
pub mod stub;

pub use adapter::{WebviewHostAdapter, WebviewSurface};
pub use link::{LinkConnector, LinkEvent, LinkExit, LinkHandle, LinkSuccess, LinkTokenConfiguration};
pub use message::{BRIDGE_CHANNEL, BridgeMessage, classify};
pub use orchestrator::{LinkSessionOrchestrator, SessionState};
pub use presentation::{NativePresenter, PresentationController, PresentationMethod};
pub use reply::{ReplySink, ReplySlot};
pub use script::{InjectionTime, UserScript, bridge_user_script};
pub use session::SessionConfig;
pub use stub::{StubLinkConnector, StubLinkOutcome, StubWebviewSurface};
