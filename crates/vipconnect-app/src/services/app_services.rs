// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — initialises the backend subsystems and provides
// async-friendly methods for the Dioxus UI to call.
//
// The demo wires the SDK against its desktop stand-ins: the stub webview
// surface instead of a platform webview, the stub Link connector instead of
// the Plaid SDK, and the embedded mock backend instead of a real operator.
// Everything above those seams (session bootstrap, bridge protocol,
// orchestration) is the production code path.

use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use tracing::{info, warn};

use vipconnect_bridge::{
    LinkEvent, SessionConfig, StubLinkConnector, StubLinkOutcome, StubWebviewSurface,
    WebviewHostAdapter, WebviewSurface,
};
use vipconnect_bridge::message::BRIDGE_CHANNEL;
use vipconnect_core::config::OperatorConfig;
use vipconnect_core::error::Result;
use vipconnect_core::types::{
    ExistingPatronSessionRequest, NewPatronSessionRequest, PatronSessionRequest, PatronType,
    ProductType, ServerStatus, TransactionType, new_transaction_id,
};
use vipconnect_operator::{MockOperatorServer, OperatorClient};

/// Provisioning file looked for next to the binary.
const CONFIG_FILE: &str = "operator.json";

/// Link token the demo cashier "page" hands to the bridge.
const DEMO_LINK_TOKEN: &str = "link-sandbox-demo-token";

/// A launched session, as the UI displays it.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub session_id: String,
    pub session_url: String,
}

/// The adapter currently bound to the demo's web surface.
struct ActiveSession {
    adapter: Arc<WebviewHostAdapter>,
}

/// Shared application services accessible from all Dioxus components via
/// `use_context::<AppServices>()`.
///
/// All fields are cheaply cloneable (Arc-wrapped) so that the struct can be
/// passed into closures and async blocks without lifetime issues.
#[derive(Clone)]
pub struct AppServices {
    config: OperatorConfig,
    server: Arc<tokio::sync::Mutex<MockOperatorServer>>,
    active: Arc<Mutex<Option<ActiveSession>>>,
    bridge_log: Arc<Mutex<Vec<String>>>,
}

impl AppServices {
    /// Initialise all services. Call once at app startup.
    ///
    /// Loads `operator.json` from the working directory when present;
    /// otherwise falls back to the self-contained demo environment whose
    /// secret both the client and the mock backend share.
    pub fn init() -> Result<Self> {
        let config = match OperatorConfig::load(CONFIG_FILE) {
            Ok(config) => {
                info!(file = CONFIG_FILE, "loaded operator provisioning file");
                config
            }
            Err(e) => {
                warn!(error = %e, "no provisioning file — using demo environment");
                demo_config()
            }
        };

        let server = MockOperatorServer::new(&config)?;

        info!("app services initialised");
        Ok(Self {
            config,
            server: Arc::new(tokio::sync::Mutex::new(server)),
            active: Arc::new(Mutex::new(None)),
            bridge_log: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// The operator environment in use.
    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    // -- Mock operator server ------------------------------------------------

    /// Get the current server status without blocking.
    pub fn server_status(&self) -> ServerStatus {
        match self.server.try_lock() {
            Ok(server) => server.status(),
            Err(_) => ServerStatus::Starting, // Lock held = transitioning
        }
    }

    /// Start the mock backend if needed and return its HTTP origin.
    async fn ensure_server_running(&self) -> Result<String> {
        let mut server = self.server.lock().await;
        if server.status() != ServerStatus::Running {
            server.start(0).await?;
        }
        server.origin().ok_or_else(|| {
            vipconnect_core::error::VipConnectError::OperatorServer(
                "server running but unbound".into(),
            )
        })
    }

    /// Stop the mock backend.
    pub async fn stop_server(&self) -> Result<ServerStatus> {
        let mut server = self.server.lock().await;
        server.stop().await?;
        Ok(server.status())
    }

    // -- Session lifecycle ---------------------------------------------------

    /// Bootstrap a patron session and bind the bridge to the demo surface.
    ///
    /// Any previously launched session is torn down first. `external_token`
    /// (when non-empty) is presented as the bearer token instead of minting
    /// one from the configured secret.
    pub async fn launch_session(
        &self,
        patron_type: PatronType,
        transaction: TransactionType,
        amount: f64,
        product: ProductType,
        cashier_mode: bool,
        external_token: Option<String>,
    ) -> Result<SessionView> {
        let origin = self.ensure_server_running().await?;

        let request = sample_request(
            patron_type,
            transaction,
            amount,
            product,
            &self.config.redirect_uri,
        );

        let client = match external_token {
            Some(token) => {
                OperatorClient::with_external_token(self.config.clone(), origin, token)
            }
            None => OperatorClient::new(self.config.clone(), origin)?,
        };

        let session = client
            .initialize_patron_session(&request, transaction, cashier_mode)
            .await?;

        self.end_session();

        let session_config = Arc::new(self.session_config(&session.session_url));
        let surface = Arc::new(StubWebviewSurface::new());
        let connector = Arc::new(demo_connector());

        let adapter = Arc::new(WebviewHostAdapter::new(
            surface as Arc<dyn WebviewSurface>,
            session_config,
            connector,
        ));
        adapter.start();

        self.log(format!("session started: {}", session.session_url));
        *self.active.lock().expect("active session lock poisoned") =
            Some(ActiveSession {
                adapter: Arc::clone(&adapter),
            });

        Ok(SessionView {
            session_id: session.response.session_id,
            session_url: session.session_url,
        })
    }

    /// Tear down the active session, if any.
    pub fn end_session(&self) {
        let previous = self.active.lock().expect("active session lock poisoned").take();
        if let Some(session) = previous {
            session.adapter.stop();
            self.log("session ended".into());
        }
    }

    /// Whether a session is currently bound.
    pub fn has_active_session(&self) -> bool {
        self.active
            .lock()
            .expect("active session lock poisoned")
            .is_some()
    }

    // -- Bridge console ------------------------------------------------------

    /// Inject the page's link-token message, with a reply sink that echoes
    /// the `(metadata, error)` resolution into the console.
    pub fn send_link_token(&self) {
        self.log(format!("page -> {{\"linkToken\": \"{DEMO_LINK_TOKEN}\"}}"));
        let log = Arc::clone(&self.bridge_log);
        self.with_adapter(|adapter| {
            adapter.handle_inbound_message(
                BRIDGE_CHANNEL,
                &json!({ "linkToken": DEMO_LINK_TOKEN }),
                Some(Box::new(
                    move |metadata: Option<serde_json::Value>,
                          error: Option<serde_json::Value>| {
                        let line = match (&metadata, &error) {
                            (Some(m), None) => format!("page reply <- metadata {m}"),
                            (m, Some(e)) => {
                                format!("page reply <- metadata {m:?}, error {e}")
                            }
                            (None, None) => "page reply <- empty acknowledgment".into(),
                        };
                        log.lock().expect("bridge log lock poisoned").push(line);
                    },
                )),
            );
        });
    }

    /// Inject the page's close sentinel.
    pub fn send_close(&self) {
        self.log("page -> \"close\"".into());
        self.with_adapter(|adapter| {
            adapter.handle_inbound_message(BRIDGE_CHANNEL, &json!("close"), None);
        });
    }

    /// Inject the page's fullscreen sentinel.
    pub fn send_fullscreen(&self) {
        self.log("page -> \"opensdk\"".into());
        self.with_adapter(|adapter| {
            adapter.handle_inbound_message(BRIDGE_CHANNEL, &json!("opensdk"), None);
        });
    }

    /// Snapshot of the bridge console log.
    pub fn bridge_log(&self) -> Vec<String> {
        self.bridge_log
            .lock()
            .expect("bridge log lock poisoned")
            .clone()
    }

    // -- Internals -----------------------------------------------------------

    fn with_adapter(&self, f: impl FnOnce(&WebviewHostAdapter)) {
        let adapter = self
            .active
            .lock()
            .expect("active session lock poisoned")
            .as_ref()
            .map(|session| Arc::clone(&session.adapter));
        match adapter {
            Some(adapter) => f(&adapter),
            None => self.log("no active session".into()),
        }
    }

    fn log(&self, line: String) {
        self.bridge_log
            .lock()
            .expect("bridge log lock poisoned")
            .push(line);
    }

    /// Session configuration with every lifecycle hook wired to the console.
    fn session_config(&self, session_url: &str) -> SessionConfig {
        let complete_log = Arc::clone(&self.bridge_log);
        let fullscreen_log = Arc::clone(&self.bridge_log);
        let success_log = Arc::clone(&self.bridge_log);
        let event_log = Arc::clone(&self.bridge_log);
        let exit_log = Arc::clone(&self.bridge_log);

        SessionConfig::new(
            session_url,
            Arc::new(move || {
                complete_log
                    .lock()
                    .expect("bridge log lock poisoned")
                    .push("host <- completion (dismiss screen)".into());
            }),
            Arc::new(move || {
                fullscreen_log
                    .lock()
                    .expect("bridge log lock poisoned")
                    .push("host <- fullscreen relaunch requested".into());
            }),
        )
        .with_success_observer(Arc::new(move |success| {
            success_log
                .lock()
                .expect("bridge log lock poisoned")
                .push(format!("link success: public_token {}", success.public_token));
        }))
        .with_event_observer(Arc::new(move |event| {
            event_log
                .lock()
                .expect("bridge log lock poisoned")
                .push(format!("link event: {}", event.name));
        }))
        .with_exit_observer(Arc::new(move |exit| {
            exit_log
                .lock()
                .expect("bridge log lock poisoned")
                .push(format!("link exit (error: {})", exit.error.is_some()));
        }))
    }
}

/// Self-contained demo environment. The same secret backs the client's
/// token minting and the mock backend's verification.
fn demo_config() -> OperatorConfig {
    OperatorConfig {
        secret: STANDARD.encode(b"vip-connect-demo-secret"),
        issuer: "demo-operator".into(),
        audience: "vip-api-cert".into(),
        base_uri: "https://cert.vipconnect.example/sdk".into(),
        redirect_uri: "closevip://done".into(),
    }
}

/// Scripted Link connector: two intermediate events, then success.
fn demo_connector() -> StubLinkConnector {
    StubLinkConnector::new(StubLinkOutcome::Success {
        events: vec![
            LinkEvent {
                name: "OPEN".into(),
                metadata: json!({}),
            },
            LinkEvent {
                name: "HANDOFF".into(),
                metadata: json!({}),
            },
        ],
        public_token: "public-sandbox-demo".into(),
        metadata: json!({
            "institution": { "name": "Demo Bank", "institution_id": "ins_demo" },
            "accounts": [{ "id": "acct_demo", "mask": "0000", "subtype": "checking" }],
        }),
    })
}

/// Fixture patron data in the shapes the operator API expects.
fn sample_request(
    patron_type: PatronType,
    transaction: TransactionType,
    amount: f64,
    product: ProductType,
    return_url: &str,
) -> PatronSessionRequest {
    match patron_type {
        PatronType::Existing => PatronSessionRequest::Existing(ExistingPatronSessionRequest {
            patron_id: "cb7c887d".into(),
            vip_card_number: "7210645917".into(),
            date_of_birth: "5/28/1974".into(),
            remaining_daily_deposit: 999.99,
            wallet_balance: 1000.0,
            transaction_id: new_transaction_id(),
            transaction_amount: amount,
            transaction_type: transaction.code(),
            return_url: return_url.into(),
            product_type: product.as_str().into(),
        }),
        PatronType::New => PatronSessionRequest::New(NewPatronSessionRequest {
            patron_id: "cb7c887d".into(),
            first_name: "Jane".into(),
            middle_initial: String::new(),
            last_name: "Public".into(),
            date_of_birth: "01/22/1981".into(),
            email: "jane@example.com".into(),
            mobile_phone: "3023492104".into(),
            street_name: "1301 E Main ST".into(),
            city: "Carbondale".into(),
            state: "IL".into(),
            zip: "62901".into(),
            country: "USA".into(),
            id_type: "DL".into(),
            id_number: "7774213035".into(),
            id_state: "IL".into(),
            routing_number: String::new(),
            account_number: String::new(),
            wallet_balance: "1000".into(),
            remaining_daily_deposit: "1000".into(),
            transaction_id: new_transaction_id(),
            transaction_amount: amount,
            return_url: return_url.into(),
            product_type: product.as_str().into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_environment_is_provisioned() {
        assert!(demo_config().is_provisioned());
    }

    #[test]
    fn sample_requests_take_the_right_endpoint() {
        let existing = sample_request(
            PatronType::Existing,
            TransactionType::Withdraw,
            50.0,
            ProductType::Online,
            "closevip://done",
        );
        assert_eq!(existing.patron_type(), PatronType::Existing);

        let new = sample_request(
            PatronType::New,
            TransactionType::Deposit,
            25.0,
            ProductType::Preferred,
            "closevip://done",
        );
        assert_eq!(new.patron_type(), PatronType::New);
    }

    #[tokio::test]
    async fn launch_and_drive_a_full_demo_session() {
        let services = AppServices::init().expect("init");

        let view = services
            .launch_session(
                PatronType::Existing,
                TransactionType::Deposit,
                13.5,
                ProductType::Preferred,
                false,
                None,
            )
            .await
            .expect("launch");

        assert!(view.session_url.contains("mode=deposit"));
        assert!(view.session_url.ends_with(&format!("#{}", view.session_id)));
        assert!(services.has_active_session());

        services.send_link_token();
        let log = services.bridge_log();
        assert!(log.iter().any(|line| line.contains("link event: OPEN")));
        assert!(log.iter().any(|line| line.contains("public-sandbox-demo")));
        assert!(log.iter().any(|line| line.starts_with("page reply <- metadata")));

        services.send_close();
        assert!(
            services
                .bridge_log()
                .iter()
                .any(|line| line.contains("completion"))
        );

        services.end_session();
        assert!(!services.has_active_session());
        services.stop_server().await.expect("stop server");
    }
}
