// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for VIP Connect.

use thiserror::Error;

/// Top-level error type for all VIP Connect operations.
#[derive(Debug, Error)]
pub enum VipConnectError {
    // -- Session bootstrap errors --
    #[error("session creation failed: {0}")]
    SessionCreation(String),

    #[error("operator credential rejected: {0}")]
    CredentialInvalid(String),

    #[error("token generation failed: {0}")]
    TokenGeneration(String),

    #[error("token verification failed: {0}")]
    TokenVerification(String),

    #[error("HTTP transport error: {0}")]
    Http(String),

    // -- Link flow errors --
    #[error("Link handler creation failed: {0}")]
    LinkCreation(String),

    // -- Bridge / host surface --
    #[error("web surface error: {0}")]
    Surface(String),

    // -- Mock operator server --
    #[error("operator server error: {0}")]
    OperatorServer(String),

    // -- Storage / serialization --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, VipConnectError>;
