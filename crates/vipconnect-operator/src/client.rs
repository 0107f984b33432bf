// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operator session API client.
//
// One call matters: `POST /api/patronsession/{new|existing}` with a bearer
// JWT and the patron request body, returning the session id the web surface
// is keyed on. The client either mints tokens itself from the provisioning
// secret (demo, mock backend) or presents an externally issued token
// (production, where the secret never ships in the app).

use reqwest::StatusCode;
use tracing::{debug, info, instrument, warn};

use vipconnect_core::config::OperatorConfig;
use vipconnect_core::error::{Result, VipConnectError};
use vipconnect_core::types::{PatronSessionRequest, PatronSessionResponse, TransactionType};

use crate::session_url::build_session_url;
use crate::token::TokenGenerator;

/// A bootstrapped session, ready to hand to the web surface.
#[derive(Debug, Clone)]
pub struct InitializedSession {
    /// Full response from the session endpoint.
    pub response: PatronSessionResponse,
    /// Composed URL for the webview to load.
    pub session_url: String,
}

/// HTTP client for the operator's patron-session endpoint.
pub struct OperatorClient {
    config: OperatorConfig,
    api_origin: String,
    http: reqwest::Client,
    tokens: Option<TokenGenerator>,
    external_token: Option<String>,
}

impl OperatorClient {
    /// Client that mints its own bearer tokens from the configured secret.
    pub fn new(config: OperatorConfig, api_origin: impl Into<String>) -> Result<Self> {
        let tokens = TokenGenerator::new(&config)?;
        Ok(Self {
            config,
            api_origin: api_origin.into(),
            http: reqwest::Client::new(),
            tokens: Some(tokens),
            external_token: None,
        })
    }

    /// Client that presents an externally issued bearer token. The
    /// configured secret is ignored and may be empty.
    pub fn with_external_token(
        config: OperatorConfig,
        api_origin: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            config,
            api_origin: api_origin.into(),
            http: reqwest::Client::new(),
            tokens: None,
            external_token: Some(token.into()),
        }
    }

    /// The operator configuration this client was built with.
    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    fn bearer_token(&self) -> Result<String> {
        if let Some(token) = &self.external_token {
            return Ok(token.clone());
        }
        match &self.tokens {
            Some(generator) => generator.generate(),
            None => Err(VipConnectError::TokenGeneration(
                "no token source configured".into(),
            )),
        }
    }

    /// Create a patron session and return the endpoint's response.
    #[instrument(skip_all, fields(patron = request.patron_type().path_segment()))]
    pub async fn create_patron_session(
        &self,
        request: &PatronSessionRequest,
    ) -> Result<PatronSessionResponse> {
        let segment = request.patron_type().path_segment();
        let url = format!("{}/api/patronsession/{segment}", self.api_origin);
        let token = self.bearer_token()?;

        debug!(%url, "creating patron session");
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| VipConnectError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VipConnectError::Http(e.to_string()))?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(%status, "session endpoint rejected the bearer token");
            return Err(VipConnectError::CredentialInvalid(body));
        }
        if !status.is_success() {
            warn!(%status, "session creation failed");
            return Err(VipConnectError::SessionCreation(format!("{status}: {body}")));
        }

        let parsed: PatronSessionResponse = serde_json::from_str(&body)?;
        info!(session_id = %parsed.session_id, "patron session created");
        Ok(parsed)
    }

    /// Create a patron session and compose the URL the web surface loads.
    pub async fn initialize_patron_session(
        &self,
        request: &PatronSessionRequest,
        transaction: TransactionType,
        cashier_mode: bool,
    ) -> Result<InitializedSession> {
        let response = self.create_patron_session(request).await?;
        let session_url =
            build_session_url(&self.config, transaction, cashier_mode, &response.session_id);
        Ok(InitializedSession {
            response,
            session_url,
        })
    }
}

impl std::fmt::Debug for OperatorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorClient")
            .field("api_origin", &self.api_origin)
            .field("external_token", &self.external_token.is_some())
            .finish_non_exhaustive()
    }
}
