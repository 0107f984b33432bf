// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// VIP Connect — operator session bootstrap.
//
// Everything that happens before the webview loads: minting the HS256
// session JWT, calling the operator's patron-session endpoint, composing the
// session URL the web surface navigates to, and the embedded mock backend
// the demo app and integration tests run against.
//
// Production apps fetch their bearer token from their own backend instead of
// minting it on-device; `OperatorClient` accepts an externally supplied
// token for exactly that deployment shape.

pub mod client;
pub mod server;
pub mod session_url;
pub mod token;

pub use client::OperatorClient;
pub use server::MockOperatorServer;
pub use session_url::build_session_url;
pub use token::{SessionClaims, TokenGenerator};
