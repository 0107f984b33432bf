// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Presentation strategy for the Link UI and the host surface's own screen.
//
// The SDK never touches view hierarchies directly. Hosts implement
// `NativePresenter` with their platform's navigation primitives, and the
// controller maps the chosen `PresentationMethod` onto it. `Custom` carries
// a caller-supplied present/dismiss pair for apps embedding the flow in
// their own container.

use std::fmt;
use std::sync::Arc;

/// Caller-supplied presentation hook.
pub type PresentFn = Arc<dyn Fn() + Send + Sync>;

/// How the Link UI (and by extension the host screen) is shown.
#[derive(Clone)]
pub enum PresentationMethod {
    /// Generic modal present/dismiss pair. The default.
    Modal,
    /// Push onto the host's navigation stack, pop when done.
    NavigationPush,
    /// Caller-supplied present and dismiss functions.
    Custom { present: PresentFn, dismiss: PresentFn },
}

impl Default for PresentationMethod {
    fn default() -> Self {
        Self::Modal
    }
}

impl fmt::Debug for PresentationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modal => f.write_str("Modal"),
            Self::NavigationPush => f.write_str("NavigationPush"),
            Self::Custom { .. } => f.write_str("Custom"),
        }
    }
}

/// Platform navigation primitives the host must provide.
pub trait NativePresenter: Send + Sync {
    /// Push a screen onto the navigation stack.
    fn push(&self);
    /// Pop the screen pushed by [`push`](Self::push).
    fn pop(&self);
    /// Present a screen modally.
    fn present_modal(&self);
    /// Dismiss the modally presented screen.
    fn dismiss_modal(&self);
}

/// Applies a [`PresentationMethod`] to a host's [`NativePresenter`].
#[derive(Debug, Clone)]
pub struct PresentationController {
    method: PresentationMethod,
}

impl PresentationController {
    pub fn new(method: PresentationMethod) -> Self {
        Self { method }
    }

    /// The method this controller applies.
    pub fn method(&self) -> &PresentationMethod {
        &self.method
    }

    /// Show the screen according to the configured method.
    pub fn present(&self, presenter: &dyn NativePresenter) {
        match &self.method {
            PresentationMethod::Modal => presenter.present_modal(),
            PresentationMethod::NavigationPush => presenter.push(),
            PresentationMethod::Custom { present, .. } => present(),
        }
    }

    /// Dismiss the screen shown by [`present`](Self::present).
    pub fn dismiss(&self, presenter: &dyn NativePresenter) {
        match &self.method {
            PresentationMethod::Modal => presenter.dismiss_modal(),
            PresentationMethod::NavigationPush => presenter.pop(),
            PresentationMethod::Custom { dismiss, .. } => dismiss(),
        }
    }
}

impl Default for PresentationController {
    fn default() -> Self {
        Self::new(PresentationMethod::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records every presenter call in order.
    #[derive(Default)]
    struct RecordingPresenter {
        calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingPresenter {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl NativePresenter for RecordingPresenter {
        fn push(&self) {
            self.calls.lock().unwrap().push("push");
        }
        fn pop(&self) {
            self.calls.lock().unwrap().push("pop");
        }
        fn present_modal(&self) {
            self.calls.lock().unwrap().push("present_modal");
        }
        fn dismiss_modal(&self) {
            self.calls.lock().unwrap().push("dismiss_modal");
        }
    }

    #[test]
    fn default_method_is_modal() {
        let presenter = RecordingPresenter::default();
        let controller = PresentationController::default();

        controller.present(&presenter);
        controller.dismiss(&presenter);

        assert_eq!(presenter.calls(), vec!["present_modal", "dismiss_modal"]);
    }

    #[test]
    fn navigation_push_uses_push_pop() {
        let presenter = RecordingPresenter::default();
        let controller = PresentationController::new(PresentationMethod::NavigationPush);

        controller.present(&presenter);
        controller.dismiss(&presenter);

        assert_eq!(presenter.calls(), vec!["push", "pop"]);
    }

    #[test]
    fn custom_pair_bypasses_presenter() {
        let presented = Arc::new(AtomicUsize::new(0));
        let dismissed = Arc::new(AtomicUsize::new(0));

        let p = Arc::clone(&presented);
        let d = Arc::clone(&dismissed);
        let controller = PresentationController::new(PresentationMethod::Custom {
            present: Arc::new(move || {
                p.fetch_add(1, Ordering::SeqCst);
            }),
            dismiss: Arc::new(move || {
                d.fetch_add(1, Ordering::SeqCst);
            }),
        });

        let presenter = RecordingPresenter::default();
        controller.present(&presenter);
        controller.dismiss(&presenter);

        assert_eq!(presented.load(Ordering::SeqCst), 1);
        assert_eq!(dismissed.load(Ordering::SeqCst), 1);
        assert!(presenter.calls().is_empty());
    }
}
