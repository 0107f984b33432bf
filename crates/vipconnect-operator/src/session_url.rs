// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session URL composition.
//
// The webview navigates to the operator's web component with the transaction
// mode in the query, a flag selecting the native or cashier rendering, and
// the session id in the URL fragment. The fragment placement is deliberate:
// fragments never leave the client, so the session id stays out of proxy and
// server access logs.

use vipconnect_core::config::OperatorConfig;
use vipconnect_core::types::TransactionType;

/// Compose the URL the web surface loads for a bootstrapped session.
///
/// `cashier_mode` selects the full cashier experience (`view=cashier`);
/// otherwise the page renders the trimmed native flow (`native=true`). A
/// non-empty `redirect_uri` in the configuration is passed through as
/// `redirectUrl` for the web side's post-transaction return.
pub fn build_session_url(
    config: &OperatorConfig,
    transaction: TransactionType,
    cashier_mode: bool,
    session_id: &str,
) -> String {
    let mut url = format!("{}?mode={}", config.base_uri, transaction.mode_param());

    if cashier_mode {
        url.push_str("&view=cashier");
    } else {
        url.push_str("&native=true");
    }

    if !config.redirect_uri.is_empty() {
        url.push_str("&redirectUrl=");
        url.push_str(&encode_query_value(&config.redirect_uri));
    }

    url.push('#');
    url.push_str(session_id);
    url
}

/// Percent-encode a query parameter value (RFC 3986 unreserved set).
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            }
            other => {
                out.push_str(&format!("%{other:02X}"));
            }
        }
    }
    out
}
