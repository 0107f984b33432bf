// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Global application state — reactive signals for the Dioxus UI.

use vipconnect_core::types::{PatronType, ProductType, ServerStatus, TransactionType};

use crate::services::app_services::SessionView;

/// Shared state accessible to all pages via `use_context`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Which patron shape to send to the session endpoint.
    pub patron_type: PatronType,
    /// Deposit or withdraw. New patrons are forced to deposit.
    pub transaction_type: TransactionType,
    /// Transaction amount as typed in the form.
    pub amount: String,
    /// Operator product tier for the session.
    pub product_type: ProductType,
    /// Load the full cashier experience instead of the native flow.
    pub cashier_mode: bool,
    /// Externally issued bearer token; empty means mint one locally.
    pub external_token: String,
    /// Status of the embedded mock operator backend.
    pub server_status: ServerStatus,
    /// The session currently bound to the web surface, if any.
    pub session: Option<SessionView>,
    /// Snapshot of the bridge console log.
    pub bridge_log: Vec<String>,
    /// Status message for user feedback.
    pub status_message: Option<String>,
}

impl AppState {
    /// Set the patron type, keeping the transaction direction legal.
    ///
    /// The operator only supports deposits during enrollment, so switching
    /// to a new patron snaps the transaction back to deposit.
    pub fn set_patron_type(&mut self, patron_type: PatronType) {
        self.patron_type = patron_type;
        if patron_type == PatronType::New {
            self.transaction_type = TransactionType::Deposit;
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            patron_type: PatronType::Existing,
            transaction_type: TransactionType::Deposit,
            amount: "13.50".into(),
            product_type: ProductType::Preferred,
            cashier_mode: false,
            external_token: String::new(),
            server_status: ServerStatus::Stopped,
            session: None,
            bridge_log: Vec::new(),
            status_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_patron_forces_deposit() {
        let mut state = AppState {
            transaction_type: TransactionType::Withdraw,
            ..AppState::default()
        };
        state.set_patron_type(PatronType::New);
        assert_eq!(state.transaction_type, TransactionType::Deposit);

        // Switching back does not disturb the direction.
        state.set_patron_type(PatronType::Existing);
        assert_eq!(state.transaction_type, TransactionType::Deposit);
    }
}
