// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Exactly-once reply delivery for page-side requests.
//
// Each `{"linkToken": ...}` message leaves a promise pending in the page
// until native code sends back a `(metadata, error)` pair. `ReplySlot` is
// the single in-flight continuation for that promise: resolving consumes the
// sink, so a second resolution is structurally impossible, and superseding
// abandons the sink without ever invoking it.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::debug;

/// A one-shot channel back into the page's waiting promise.
///
/// Implemented for any `FnOnce(Option<Value>, Option<Value>)`, so hosts and
/// tests can pass closures directly.
pub trait ReplySink: Send {
    /// Deliver the `(metadata, error)` pair. Consumes the sink.
    fn send(self: Box<Self>, metadata: Option<Value>, error: Option<Value>);
}

impl<F> ReplySink for F
where
    F: FnOnce(Option<Value>, Option<Value>) + Send,
{
    fn send(self: Box<Self>, metadata: Option<Value>, error: Option<Value>) {
        self(metadata, error)
    }
}

/// The pending reply slot for at most one outstanding link-token request.
///
/// Cloning shares the same underlying slot — the orchestrator keeps one
/// clone and hands others to the Link success/exit callbacks. Whichever
/// party resolves first wins; everyone else observes an already-spent slot.
#[derive(Clone)]
pub struct ReplySlot {
    inner: Arc<Mutex<Option<Box<dyn ReplySink>>>>,
}

impl ReplySlot {
    /// Arm a slot with the given sink.
    pub fn new(sink: Box<dyn ReplySink>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(sink))),
        }
    }

    /// A slot with no sink — used when the page posted a link-token message
    /// without attaching a reply channel. Resolutions become no-ops.
    pub fn unarmed() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }

    /// Resolve the slot with a `(metadata, error)` pair.
    ///
    /// Returns `true` if the sink was invoked, `false` if the slot was
    /// already resolved, abandoned, or never armed.
    pub fn resolve(&self, metadata: Option<Value>, error: Option<Value>) -> bool {
        let sink = self.inner.lock().expect("reply slot lock poisoned").take();
        match sink {
            Some(sink) => {
                sink.send(metadata, error);
                true
            }
            None => {
                debug!("reply slot already spent — resolution dropped");
                false
            }
        }
    }

    /// Drop the sink without invoking it (the supersede path).
    ///
    /// Returns `true` if a sink was actually discarded.
    pub fn abandon(&self) -> bool {
        let discarded = self
            .inner
            .lock()
            .expect("reply slot lock poisoned")
            .take()
            .is_some();
        if discarded {
            debug!("pending reply abandoned without resolution");
        }
        discarded
    }

    /// Whether a sink is still waiting to be resolved.
    pub fn is_pending(&self) -> bool {
        self.inner
            .lock()
            .expect("reply slot lock poisoned")
            .is_some()
    }
}

impl std::fmt::Debug for ReplySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplySlot")
            .field("pending", &self.is_pending())
            .finish()
    }
}
