// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operator configuration.
//
// Everything needed to talk to an operator's session endpoint lives in this
// one immutable struct. It is constructed explicitly and passed into the
// client and token generator — never held as process-wide state. The JSON
// field names match the provisioning file handed out by the operator
// ("Secret", "Issuer", ...), so a provisioning file deserializes directly.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Credentials and endpoints for one operator environment.
///
/// The `secret` is the base64-encoded shared HMAC secret used to sign
/// session JWTs. Do not generate tokens on-device in production builds —
/// this exists for the demo app and the mock backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OperatorConfig {
    /// Base64-encoded shared secret for JWT signing.
    pub secret: String,
    /// JWT `iss` claim value assigned by the operator.
    pub issuer: String,
    /// JWT `aud` claim value (e.g. "vip-api-cert").
    pub audience: String,
    /// Base URI of the SDK web component and session API.
    pub base_uri: String,
    /// Return URL embedded in patron transaction data.
    pub redirect_uri: String,
}

impl OperatorConfig {
    /// Load a provisioning file (JSON) from disk.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Persist this configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Whether the required fields have been filled in.
    ///
    /// A freshly checked-out demo ships with empty values; the UI uses this
    /// to prompt for provisioning instead of firing doomed requests.
    pub fn is_provisioned(&self) -> bool {
        !self.secret.is_empty() && !self.issuer.is_empty() && !self.base_uri.is_empty()
    }
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: String::new(),
            audience: String::new(),
            base_uri: String::new(),
            redirect_uri: "closevip://done".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OperatorConfig {
        OperatorConfig {
            secret: "c2VjcmV0LWJ5dGVz".into(),
            issuer: "demo-operator".into(),
            audience: "vip-api-cert".into(),
            base_uri: "https://cert.example.io/sdk".into(),
            redirect_uri: "closevip://done".into(),
        }
    }

    #[test]
    fn provisioning_file_field_names() {
        let json = serde_json::to_value(sample()).expect("serialize");
        // Field names must match the operator-issued provisioning file.
        assert!(json.get("Secret").is_some());
        assert!(json.get("Issuer").is_some());
        assert!(json.get("Audience").is_some());
        assert!(json.get("BaseUri").is_some());
        assert!(json.get("RedirectUri").is_some());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("operator.json");

        let config = sample();
        config.save(&path).expect("save");
        let loaded = OperatorConfig::load(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn default_is_not_provisioned() {
        assert!(!OperatorConfig::default().is_provisioned());
        assert!(sample().is_provisioned());
    }
}
