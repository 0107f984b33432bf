// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for VIP Connect.
//
// The request/response structs mirror the operator session API wire format
// exactly, including its inconsistent key casing (`patronID` on existing
// patrons, `patronId` on new ones). Do not "fix" the serde renames — the
// backend is the source of truth.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Patron classification, selects the session endpoint path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatronType {
    New,
    Existing,
}

impl PatronType {
    /// Path segment for `POST /api/patronsession/{segment}`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Existing => "existing",
        }
    }
}

/// Direction of the cashier transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Deposit,
    Withdraw,
}

impl TransactionType {
    /// Value of the `mode` query parameter in the session URL.
    pub fn mode_param(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
        }
    }

    /// Numeric `transactionType` field in existing-patron requests
    /// (the API models this as a JSON number: 0 = deposit, 1 = withdraw).
    pub fn code(&self) -> f64 {
        match self {
            Self::Deposit => 0.0,
            Self::Withdraw => 1.0,
        }
    }
}

/// Operator product tier for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    Preferred,
    Online,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preferred => "preferred",
            Self::Online => "online",
        }
    }
}

/// Session request body for a patron already known to the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingPatronSessionRequest {
    #[serde(rename = "patronID")]
    pub patron_id: String,
    #[serde(rename = "vipCardNumber")]
    pub vip_card_number: String,
    #[serde(rename = "dateOfBirth")]
    pub date_of_birth: String,
    #[serde(rename = "remainingDailyDeposit")]
    pub remaining_daily_deposit: f64,
    #[serde(rename = "walletBalance")]
    pub wallet_balance: f64,
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
    #[serde(rename = "transactionAmount")]
    pub transaction_amount: f64,
    /// 0 = deposit, 1 = withdraw — see [`TransactionType::code`].
    #[serde(rename = "transactionType")]
    pub transaction_type: f64,
    #[serde(rename = "returnURL")]
    pub return_url: String,
    #[serde(rename = "productType")]
    pub product_type: String,
}

/// Session request body for a patron enrolling during the transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatronSessionRequest {
    pub patron_id: String,
    pub first_name: String,
    pub middle_initial: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub email: String,
    pub mobile_phone: String,
    pub street_name: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub id_type: String,
    pub id_number: String,
    pub id_state: String,
    pub routing_number: String,
    pub account_number: String,
    /// Sent as a string by the API, unlike the existing-patron shape.
    pub wallet_balance: String,
    pub remaining_daily_deposit: String,
    pub transaction_id: String,
    pub transaction_amount: f64,
    #[serde(rename = "returnURL")]
    pub return_url: String,
    pub product_type: String,
}

/// Either session request shape, serialized as its bare body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatronSessionRequest {
    New(NewPatronSessionRequest),
    Existing(ExistingPatronSessionRequest),
}

impl PatronSessionRequest {
    /// The endpoint path segment this request must be posted to.
    pub fn patron_type(&self) -> PatronType {
        match self {
            Self::New(_) => PatronType::New,
            Self::Existing(_) => PatronType::Existing,
        }
    }
}

/// Feature toggles returned with a patron session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionToggles {
    pub plaid_enabled: bool,
    pub limit_enabled: bool,
    pub show_dashboard_button_after_success: bool,
    pub manage_funding_sources_in_dropdown: bool,
    pub show_transaction_confirmation: bool,
    pub identification_info_enabled: bool,
    pub plaid_default: bool,
    pub mitek_enabled: bool,
}

/// Operator-side error detail attached to a failed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionErrorModel {
    pub error_code: String,
    pub transaction_stage: String,
    pub operator_error_message: String,
    pub operator_decline_description: String,
    pub patron_error_message: String,
}

/// Response from `POST /api/patronsession/{new|existing}`.
///
/// Only `sessionId` is contractual; everything else is optional detail that
/// some operator environments omit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatronSessionResponse {
    pub session_id: String,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default)]
    pub enrollment_status: Option<String>,
    #[serde(default)]
    pub enrollment_status_code: Option<i32>,
    #[serde(default)]
    pub vip_card_number: Option<String>,
    #[serde(default)]
    pub operator_name: Option<String>,
    #[serde(default)]
    pub toggles: SessionToggles,
    #[serde(default)]
    pub transaction_succeeded: bool,
    #[serde(default)]
    pub deposit_limit: Option<f64>,
    #[serde(default)]
    pub min_deposit: Option<f64>,
    #[serde(default)]
    pub withdraw_limit: Option<f64>,
    #[serde(default)]
    pub min_withdraw: Option<f64>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub transaction_amount: Option<f64>,
    #[serde(rename = "returnURL", default)]
    pub return_url: Option<String>,
    #[serde(default)]
    pub culture_code: Option<String>,
    #[serde(default)]
    pub error_model: Option<SessionErrorModel>,
}

impl PatronSessionResponse {
    /// Minimal response carrying only the session identifier.
    pub fn with_session_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            expires: None,
            enrollment_status: None,
            enrollment_status_code: None,
            vip_card_number: None,
            operator_name: None,
            toggles: SessionToggles::default(),
            transaction_succeeded: false,
            deposit_limit: None,
            min_deposit: None,
            withdraw_limit: None,
            min_withdraw: None,
            transaction_id: None,
            transaction_amount: None,
            return_url: None,
            culture_code: None,
            error_model: None,
        }
    }
}

/// Generate a transaction ID in the operator's expected format:
/// a UUID with hyphens stripped, truncated to 24 characters.
pub fn new_transaction_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(24);
    id
}

/// Status of the embedded mock operator server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    Stopped,
    Starting,
    Running,
    Error,
}
