// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inbound bridge message classification.
//
// The cashier page posts three payload shapes over the reserved channel:
//
//   { "linkToken": "<token>" }   launch the native Link flow (expects a reply)
//   "close"                      dismiss the host surface
//   "opensdk"                    switch to fullscreen presentation
//
// Everything else is `Unrecognized` and must still be acknowledged with an
// empty reply when the page attached a reply channel, so no page-side
// promise is left dangling.

use serde_json::Value;

/// The reserved message channel between the cashier page and native code.
///
/// The page-side forwarder script posts to this name; changing it breaks the
/// deployed web content.
pub const BRIDGE_CHANNEL: &str = "NativeBridge";

/// Sentinel body requesting dismissal of the host surface.
const CLOSE_SENTINEL: &str = "close";

/// Sentinel body requesting a switch to fullscreen Link presentation.
const FULLSCREEN_SENTINEL: &str = "opensdk";

/// A classified inbound bridge message.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeMessage {
    /// The page wants the native Link flow opened with this token.
    LinkTokenRequested { token: String },
    /// The page wants the host surface dismissed.
    CloseRequested,
    /// The page wants the flow relaunched in fullscreen presentation.
    FullscreenRequested,
    /// Anything that matched none of the known shapes (kept for logging).
    Unrecognized(Value),
}

/// Classify a raw channel payload into a [`BridgeMessage`].
///
/// Total over all inputs: never panics, never errors. Messages on any
/// channel other than [`BRIDGE_CHANNEL`] classify as `Unrecognized` — the
/// adapter filters those out earlier, this is a second line of defence.
pub fn classify(channel_name: &str, raw_body: &Value) -> BridgeMessage {
    if channel_name != BRIDGE_CHANNEL {
        return BridgeMessage::Unrecognized(raw_body.clone());
    }

    if let Some(token) = raw_body.get("linkToken").and_then(Value::as_str) {
        return BridgeMessage::LinkTokenRequested {
            token: token.to_owned(),
        };
    }

    match raw_body.as_str() {
        Some(CLOSE_SENTINEL) => BridgeMessage::CloseRequested,
        Some(FULLSCREEN_SENTINEL) => BridgeMessage::FullscreenRequested,
        _ => BridgeMessage::Unrecognized(raw_body.clone()),
    }
}
