//! Analysis session: the single owner of application state.
//!
//! A session wraps an [`AnalysisGateway`] and holds an immutable [`AppState`]
//! snapshot that is replaced wholesale on every transition. At most one
//! analysis runs at a time; a second request while one is outstanding is
//! rejected with [`AnalysisError::Busy`] and never reaches the provider.

use crate::canvas::{View, ViewId, select_view};
use crate::error::AnalysisError;
use crate::gateway::AnalysisGateway;
use crate::types::AnalysisResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Coarse lifecycle phase derived from an [`AppState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Busy,
    Ready,
    Failed,
}

/// A snapshot of everything the shell shows.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub loading: bool,
    pub result: Option<Arc<AnalysisResult>>,
    /// User-facing message for the last failure.
    pub error: Option<String>,
    pub active_view: ViewId,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            loading: false,
            result: None,
            error: None,
            active_view: ViewId::Refined,
        }
    }
}

impl AppState {
    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Busy
        } else if self.error.is_some() {
            Phase::Failed
        } else if self.result.is_some() {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }

    /// The active view over the current result, if there is one.
    pub fn current_view(&self) -> Option<View<'_>> {
        self.result
            .as_deref()
            .map(|result| select_view(result, self.active_view))
    }
}

/// Drives analyses and owns the resulting state.
pub struct AnalysisSession {
    gateway: AnalysisGateway,
    busy: AtomicBool,
    state: RwLock<Arc<AppState>>,
}

impl AnalysisSession {
    pub fn new(gateway: AnalysisGateway) -> Self {
        Self {
            gateway,
            busy: AtomicBool::new(false),
            state: RwLock::new(Arc::new(AppState::default())),
        }
    }

    pub fn gateway(&self) -> &AnalysisGateway {
        &self.gateway
    }

    /// The current state snapshot.
    pub fn state(&self) -> Arc<AppState> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether an analysis is currently outstanding.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Switch the active view. Never touches the network.
    pub fn select_view(&self, view: ViewId) {
        self.transition(|s| AppState {
            active_view: view,
            ..s.clone()
        });
    }

    /// Analyze `source_text` and store the outcome.
    ///
    /// Empty input records the input message and leaves any previous result
    /// in place. A real attempt clears the previous result and error first.
    pub async fn analyze(&self, source_text: &str) -> Result<Arc<AnalysisResult>, AnalysisError> {
        let Some(_guard) = BusyGuard::acquire(self) else {
            warn!("Rejected analysis request while another is running");
            return Err(AnalysisError::Busy);
        };

        if source_text.trim().is_empty() {
            let err = AnalysisError::empty_input();
            self.transition(|s| AppState {
                error: Some(err.user_message()),
                ..s.clone()
            });
            return Err(err);
        }

        self.transition(|s| AppState {
            loading: true,
            result: None,
            error: None,
            active_view: s.active_view,
        });

        match self.gateway.analyze(source_text).await {
            Ok(result) => {
                let result = Arc::new(result);
                self.transition(|_| AppState {
                    loading: false,
                    result: Some(result.clone()),
                    error: None,
                    active_view: ViewId::Refined,
                });
                Ok(result)
            }
            Err(e) => {
                self.transition(|s| AppState {
                    loading: false,
                    result: None,
                    error: Some(e.user_message()),
                    active_view: s.active_view,
                });
                Err(e)
            }
        }
    }

    fn transition(&self, next: impl FnOnce(&AppState) -> AppState) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let new_state = next(&state);
        debug!(
            from = ?state.phase(),
            to = ?new_state.phase(),
            view = %new_state.active_view,
            "Session state transition"
        );
        *state = Arc::new(new_state);
    }
}

/// Holds the busy flag for the lifetime of one attempt.
///
/// If the attempt is dropped mid-flight, `loading` is cleared before the flag
/// is released so the state never reports a call that is no longer running.
struct BusyGuard<'a>(&'a AnalysisSession);

impl<'a> BusyGuard<'a> {
    fn acquire(session: &'a AnalysisSession) -> Option<Self> {
        session
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(session))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.0.state().loading {
            debug!("Analysis abandoned before completion");
            self.0.transition(|s| AppState {
                loading: false,
                ..s.clone()
            });
        }
        self.0.busy.store(false, Ordering::Release);
    }
}
