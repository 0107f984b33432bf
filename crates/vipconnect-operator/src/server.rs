// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Embedded mock operator backend.
//
// Stands in for the operator's session API so the demo app and integration
// tests run without network access or real credentials. Speaks just enough
// HTTP/1.1 over raw TCP to serve `POST /api/patronsession/{new|existing}`:
// verify the bearer JWT against the shared secret, validate the patron
// request body, and mint a fresh session id. Anything else is a 404.
//
// Connections are short-lived (`Connection: close`); each one is handled in
// its own spawned task so a slow client cannot stall the accept loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use vipconnect_core::config::OperatorConfig;
use vipconnect_core::error::{Result, VipConnectError};
use vipconnect_core::types::{PatronSessionRequest, PatronSessionResponse, ServerStatus};

use crate::token::TokenGenerator;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum bytes to accept per request. Session bodies are a few KiB.
const MAX_REQUEST_BYTES: usize = 1024 * 1024; // 1 MiB

/// Route prefix for the session endpoint.
const SESSION_PATH_PREFIX: &str = "/api/patronsession/";

// ---------------------------------------------------------------------------
// Minimal HTTP request parsing
// ---------------------------------------------------------------------------

/// A parsed inbound HTTP request, reduced to what the routes need.
struct HttpRequest {
    method: String,
    path: String,
    /// Raw value of the `Authorization` header, if present.
    authorization: Option<String>,
    body: Vec<u8>,
}

/// Read one HTTP/1.1 request from the stream.
///
/// Clients keep the connection open after writing (keep-alive), so reading
/// to EOF would hang; instead the headers are framed by the blank line and
/// the body by `Content-Length`.
async fn read_request(stream: &mut tokio::net::TcpStream) -> Result<HttpRequest> {
    let mut buf: Vec<u8> = Vec::with_capacity(4096);

    let header_end = loop {
        if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
            break pos;
        }
        if buf.len() > MAX_REQUEST_BYTES {
            return Err(VipConnectError::OperatorServer(
                "request headers too large".into(),
            ));
        }
        let n = stream
            .read_buf(&mut buf)
            .await
            .map_err(|e| VipConnectError::OperatorServer(format!("read: {e}")))?;
        if n == 0 {
            return Err(VipConnectError::OperatorServer(
                "connection closed mid-headers".into(),
            ));
        }
    };
    let body_offset = header_end + 4;

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = headers.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_owned();
    let path = parts.next().unwrap_or_default().to_owned();

    let mut content_length = 0usize;
    let mut authorization = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => {
                    content_length = value.trim().parse().map_err(|_| {
                        VipConnectError::OperatorServer("bad Content-Length".into())
                    })?;
                }
                "authorization" => authorization = Some(value.trim().to_owned()),
                _ => {}
            }
        }
    }

    if content_length > MAX_REQUEST_BYTES {
        return Err(VipConnectError::OperatorServer("request body too large".into()));
    }

    while buf.len() < body_offset + content_length {
        let n = stream
            .read_buf(&mut buf)
            .await
            .map_err(|e| VipConnectError::OperatorServer(format!("read body: {e}")))?;
        if n == 0 {
            return Err(VipConnectError::OperatorServer(
                "connection closed mid-body".into(),
            ));
        }
    }
    let body = buf[body_offset..body_offset + content_length].to_vec();

    Ok(HttpRequest {
        method,
        path,
        authorization,
        body,
    })
}

/// Find the first occurrence of `needle` in `haystack`.
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Render a full HTTP/1.1 response with a JSON body.
fn http_response(status: u16, reason: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n{body}",
        body.len()
    )
}

/// JSON error body in the operator's shape.
fn error_body(code: &str, message: &str) -> String {
    format!(r#"{{"errorCode":"{code}","message":"{message}"}}"#)
}

// ---------------------------------------------------------------------------
// Shared state and dispatch
// ---------------------------------------------------------------------------

/// State shared across connection-handling tasks.
struct SharedState {
    verifier: TokenGenerator,
    active_connections: AtomicU32,
}

/// Route the request and produce `(status, reason, body)`.
fn dispatch(request: &HttpRequest, state: &SharedState) -> (u16, &'static str, String) {
    if request.method != "POST" {
        return (
            405,
            "Method Not Allowed",
            error_body("methodNotAllowed", "only POST is supported"),
        );
    }

    let Some(segment) = request.path.strip_prefix(SESSION_PATH_PREFIX) else {
        return (404, "Not Found", error_body("notFound", "unknown route"));
    };
    if segment != "new" && segment != "existing" {
        return (404, "Not Found", error_body("notFound", "unknown patron type"));
    }

    // Bearer auth against the shared secret.
    let token = request
        .authorization
        .as_deref()
        .and_then(|value| value.strip_prefix("Bearer "));
    let Some(token) = token else {
        return (
            401,
            "Unauthorized",
            error_body("badToken", "missing bearer token"),
        );
    };
    if let Err(e) = state.verifier.verify(token) {
        warn!(error = %e, "bearer token rejected");
        return (401, "Unauthorized", error_body("badToken", "invalid bearer token"));
    }

    // The body must parse as one of the two patron request shapes, and the
    // shape must match the path segment it was posted to.
    let parsed: PatronSessionRequest = match serde_json::from_slice(&request.body) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "malformed patron session request");
            return (
                400,
                "Bad Request",
                error_body("badRequest", "unparseable patron request"),
            );
        }
    };
    if parsed.patron_type().path_segment() != segment {
        return (
            400,
            "Bad Request",
            error_body("badRequest", "patron shape does not match endpoint"),
        );
    }

    let session_id = Uuid::new_v4().to_string();
    info!(%session_id, patron = segment, "mock session minted");

    let mut response = PatronSessionResponse::with_session_id(session_id);
    response.toggles.plaid_enabled = true;
    match &parsed {
        PatronSessionRequest::New(new) => {
            response.transaction_id = Some(new.transaction_id.clone());
            response.transaction_amount = Some(new.transaction_amount);
            response.return_url = Some(new.return_url.clone());
        }
        PatronSessionRequest::Existing(existing) => {
            response.transaction_id = Some(existing.transaction_id.clone());
            response.transaction_amount = Some(existing.transaction_amount);
            response.return_url = Some(existing.return_url.clone());
            response.vip_card_number = Some(existing.vip_card_number.clone());
        }
    }

    match serde_json::to_string(&response) {
        Ok(body) => (200, "OK", body),
        Err(e) => {
            error!(error = %e, "response serialization failed");
            (
                500,
                "Internal Server Error",
                error_body("internal", "response serialization failed"),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// MockOperatorServer
// ---------------------------------------------------------------------------

/// Loopback mock of the operator's session backend.
///
/// Binds `127.0.0.1` (port 0 for an ephemeral port in tests), verifies
/// bearer JWTs with the same shared secret the client signs with, and mints
/// UUID session ids.
pub struct MockOperatorServer {
    status: ServerStatus,
    shared: Arc<SharedState>,
    shutdown_signal: Arc<Notify>,
    task_handle: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl MockOperatorServer {
    /// Create a server for the given operator environment.
    ///
    /// Fails if the configured secret cannot back a token verifier.
    pub fn new(config: &OperatorConfig) -> Result<Self> {
        Ok(Self {
            status: ServerStatus::Stopped,
            shared: Arc::new(SharedState {
                verifier: TokenGenerator::new(config)?,
                active_connections: AtomicU32::new(0),
            }),
            shutdown_signal: Arc::new(Notify::new()),
            task_handle: None,
            local_addr: None,
        })
    }

    /// Current lifecycle state.
    pub fn status(&self) -> ServerStatus {
        self.status
    }

    /// The bound address, once running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// The HTTP origin clients should target, once running.
    pub fn origin(&self) -> Option<String> {
        self.local_addr.map(|addr| format!("http://{addr}"))
    }

    /// Number of connections currently being served.
    pub fn active_connections(&self) -> u32 {
        self.shared.active_connections.load(Ordering::Relaxed)
    }

    /// Bind the listener and spawn the accept loop.
    ///
    /// Pass port 0 to let the OS choose; read the result back with
    /// [`local_addr`](Self::local_addr).
    pub async fn start(&mut self, port: u16) -> Result<()> {
        if self.status == ServerStatus::Running {
            debug!("mock operator server already running");
            return Ok(());
        }
        self.status = ServerStatus::Starting;

        let bind_addr: SocketAddr = ([127, 0, 0, 1], port).into();
        let listener = TcpListener::bind(bind_addr).await.map_err(|e| {
            self.status = ServerStatus::Error;
            VipConnectError::OperatorServer(format!("bind {bind_addr}: {e}"))
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| VipConnectError::OperatorServer(format!("local addr: {e}")))?;

        info!(addr = %local_addr, "mock operator server listening");

        let shutdown = Arc::clone(&self.shutdown_signal);
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            Self::accept_loop(listener, shutdown, shared).await;
        });

        self.local_addr = Some(local_addr);
        self.task_handle = Some(handle);
        self.status = ServerStatus::Running;
        Ok(())
    }

    /// Signal the accept loop to exit and await it. In-flight connections
    /// are allowed to finish.
    pub async fn stop(&mut self) -> Result<()> {
        if self.status != ServerStatus::Running {
            return Ok(());
        }
        info!("stopping mock operator server");
        self.shutdown_signal.notify_one();
        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| VipConnectError::OperatorServer(format!("task join: {e}")))?;
        }
        self.local_addr = None;
        self.status = ServerStatus::Stopped;
        Ok(())
    }

    async fn accept_loop(listener: TcpListener, shutdown: Arc<Notify>, shared: Arc<SharedState>) {
        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    debug!("accept loop received shutdown signal");
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            debug!(peer = %peer_addr, "incoming connection");
                            let state = Arc::clone(&shared);
                            tokio::spawn(async move {
                                state.active_connections.fetch_add(1, Ordering::Relaxed);
                                if let Err(e) = Self::handle_connection(stream, state.clone()).await {
                                    warn!(peer = %peer_addr, error = %e, "connection handler error");
                                }
                                state.active_connections.fetch_sub(1, Ordering::Relaxed);
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }
            }
        }
    }

    async fn handle_connection(
        mut stream: tokio::net::TcpStream,
        state: Arc<SharedState>,
    ) -> Result<()> {
        let request = read_request(&mut stream).await?;
        debug!(method = %request.method, path = %request.path, "request received");

        let (status, reason, body) = dispatch(&request, &state);
        let response = http_response(status, reason, &body);

        stream
            .write_all(response.as_bytes())
            .await
            .map_err(|e| VipConnectError::OperatorServer(format!("write response: {e}")))?;
        stream
            .flush()
            .await
            .map_err(|e| VipConnectError::OperatorServer(format!("flush: {e}")))?;

        info!(method = %request.method, path = %request.path, status, "response sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
