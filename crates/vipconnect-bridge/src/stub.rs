// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop/CI stand-ins for the platform webview and the Link SDK.
//
// The stub connector plays back a scripted outcome synchronously from
// `open`, which is exactly the re-entrancy the orchestrator must tolerate.
// The stub surface records every lifecycle call so tests (and the demo app's
// bridge console) can assert on ordering.

use std::sync::Mutex;

use serde_json::Value;
use tracing::debug;

use vipconnect_core::error::{Result, VipConnectError};

use crate::link::{LinkConnector, LinkEvent, LinkHandle, LinkSuccess, LinkTokenConfiguration};
use crate::presentation::PresentationMethod;
use crate::script::UserScript;
use crate::adapter::WebviewSurface;

/// What a stubbed Link flow does when opened.
#[derive(Debug, Clone)]
pub enum StubLinkOutcome {
    /// Fire the events, then the terminal success callback.
    Success {
        events: Vec<LinkEvent>,
        public_token: String,
        metadata: Value,
    },
    /// Fire the terminal exit callback.
    Exit {
        metadata: Value,
        error: Option<Value>,
    },
    /// Fire the events, then nothing — the flow stays open forever.
    Hold { events: Vec<LinkEvent> },
    /// Reject handle creation outright.
    FailCreation(String),
}

/// Scripted [`LinkConnector`] for tests and the desktop demo.
pub struct StubLinkConnector {
    outcome: StubLinkOutcome,
    created: Mutex<Vec<String>>,
}

impl StubLinkConnector {
    pub fn new(outcome: StubLinkOutcome) -> Self {
        Self {
            outcome,
            created: Mutex::new(Vec::new()),
        }
    }

    /// A connector whose flows succeed immediately with `metadata`.
    pub fn succeeding_with(metadata: Value) -> Self {
        Self::new(StubLinkOutcome::Success {
            events: Vec::new(),
            public_token: "public-sandbox-stub".into(),
            metadata,
        })
    }

    /// A connector whose flows exit immediately.
    pub fn exiting_with(metadata: Value, error: Option<Value>) -> Self {
        Self::new(StubLinkOutcome::Exit { metadata, error })
    }

    /// A connector whose flows open and never complete.
    pub fn holding() -> Self {
        Self::new(StubLinkOutcome::Hold { events: Vec::new() })
    }

    /// Like [`holding`](Self::holding), but fires the given events first.
    pub fn holding_after_events(events: Vec<LinkEvent>) -> Self {
        Self::new(StubLinkOutcome::Hold { events })
    }

    /// A connector that refuses to create handles.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(StubLinkOutcome::FailCreation(message.into()))
    }

    /// Every link token a handle was created for, in order.
    pub fn created_tokens(&self) -> Vec<String> {
        self.created.lock().expect("stub lock poisoned").clone()
    }
}

impl LinkConnector for StubLinkConnector {
    fn create(&self, configuration: LinkTokenConfiguration) -> Result<Box<dyn LinkHandle>> {
        self.created
            .lock()
            .expect("stub lock poisoned")
            .push(configuration.token.clone());

        match &self.outcome {
            StubLinkOutcome::FailCreation(message) => {
                Err(VipConnectError::LinkCreation(message.clone()))
            }
            outcome => Ok(Box::new(StubLinkHandle {
                outcome: outcome.clone(),
                configuration: Mutex::new(Some(configuration)),
            })),
        }
    }
}

/// Handle produced by [`StubLinkConnector`]; plays the outcome on `open`.
struct StubLinkHandle {
    outcome: StubLinkOutcome,
    configuration: Mutex<Option<LinkTokenConfiguration>>,
}

impl LinkHandle for StubLinkHandle {
    fn open(&self, method: &PresentationMethod) -> Result<()> {
        debug!(?method, "stub Link flow opened");
        let Some(configuration) = self
            .configuration
            .lock()
            .expect("stub lock poisoned")
            .take()
        else {
            // A second open is a host bug, but harmless here.
            return Ok(());
        };

        match &self.outcome {
            StubLinkOutcome::Success {
                events,
                public_token,
                metadata,
            } => {
                for event in events {
                    (configuration.on_event)(event.clone());
                }
                (configuration.on_success)(LinkSuccess {
                    public_token: public_token.clone(),
                    metadata: metadata.clone(),
                });
            }
            StubLinkOutcome::Exit { metadata, error } => {
                (configuration.on_exit)(crate::link::LinkExit {
                    metadata: metadata.clone(),
                    error: error.clone(),
                });
            }
            StubLinkOutcome::Hold { events } => {
                for event in events {
                    (configuration.on_event)(event.clone());
                }
                // Dropping the callbacks here models a flow the user never
                // finishes; the pending reply stays pending.
            }
            StubLinkOutcome::FailCreation(_) => unreachable!("creation already failed"),
        }
        Ok(())
    }
}

/// A recorded call against the stub surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    RegisterChannel(String),
    UnregisterChannel(String),
    InstallScript,
    RemoveScripts,
    LoadUrl(String),
}

/// In-memory [`WebviewSurface`] that records its lifecycle calls.
#[derive(Default)]
pub struct StubWebviewSurface {
    calls: Mutex<Vec<SurfaceCall>>,
    scripts: Mutex<Vec<UserScript>>,
}

impl StubWebviewSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every surface call, in order.
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().expect("stub lock poisoned").clone()
    }

    /// Scripts currently installed.
    pub fn installed_scripts(&self) -> Vec<UserScript> {
        self.scripts.lock().expect("stub lock poisoned").clone()
    }

    fn record(&self, call: SurfaceCall) {
        self.calls.lock().expect("stub lock poisoned").push(call);
    }
}

impl WebviewSurface for StubWebviewSurface {
    fn register_channel(&self, name: &str) {
        self.record(SurfaceCall::RegisterChannel(name.to_owned()));
    }

    fn unregister_channel(&self, name: &str) {
        self.record(SurfaceCall::UnregisterChannel(name.to_owned()));
    }

    fn install_script(&self, script: &UserScript) {
        self.scripts
            .lock()
            .expect("stub lock poisoned")
            .push(script.clone());
        self.record(SurfaceCall::InstallScript);
    }

    fn remove_scripts(&self) {
        self.scripts.lock().expect("stub lock poisoned").clear();
        self.record(SurfaceCall::RemoveScripts);
    }

    fn load_url(&self, url: &str) {
        self.record(SurfaceCall::LoadUrl(url.to_owned()));
    }
}
