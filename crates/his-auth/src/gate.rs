//! Per-navigation driver for [`SessionGuard`].
//!
//! A [`RouteGate`] belongs to one protected view. Each time the view is
//! shown with a new (token, path) pair it re-enters the guard's state machine
//! and publishes the resulting [`GateState`] on a watch channel.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::guard::{Denial, Evaluation, GuardDecision, RelevanceScope, SessionGuard};

/// What the protected view should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// Validation in flight or not started: show a loading affordance.
    Pending,
    Authorized,
    /// Redirect to login.
    Denied(Denial),
}

impl GateState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, GateState::Pending)
    }
}

impl From<GuardDecision> for GateState {
    fn from(decision: GuardDecision) -> Self {
        match decision {
            GuardDecision::Authorized => GateState::Authorized,
            GuardDecision::Denied(denial) => GateState::Denied(denial),
        }
    }
}

type NavigationKey = (Option<String>, String);

struct GateInner {
    last: Mutex<Option<NavigationKey>>,
    scope: RelevanceScope,
    state: watch::Sender<GateState>,
}

pub struct RouteGate {
    guard: Arc<SessionGuard>,
    inner: Arc<GateInner>,
}

impl RouteGate {
    pub fn new(guard: Arc<SessionGuard>) -> Self {
        let (state, _) = watch::channel(GateState::Pending);
        Self {
            guard,
            inner: Arc::new(GateInner {
                last: Mutex::new(None),
                scope: RelevanceScope::new(),
                state,
            }),
        }
    }

    /// Shows `path` for the current session.
    ///
    /// Does nothing if neither the token nor the path changed since the last
    /// call. Otherwise any outstanding evaluation is superseded; a missing
    /// token is denied immediately and anything else goes `Pending` while a
    /// background task finishes the evaluation.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime while a token is present.
    pub fn navigate(&self, path: &str) -> GateState {
        let key = (self.guard.current_token(), path.to_owned());

        let check = {
            let mut last = self.inner.last.lock();
            if last.as_ref() == Some(&key) {
                return self.state();
            }
            *last = Some(key);
            self.inner.scope.invalidate();

            match self.guard.start(path) {
                Evaluation::Settled(decision) => {
                    let state = GateState::from(decision);
                    self.inner.state.send_replace(state.clone());
                    return state;
                }
                Evaluation::Pending(check) => {
                    self.inner.state.send_replace(GateState::Pending);
                    check
                }
            }
        };

        let relevance = self.inner.scope.ticket();
        let guard = Arc::clone(&self.guard);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let Some(decision) = guard.resume(check, &relevance).await else {
                return;
            };
            relevance.commit(|| inner.state.send_replace(decision.into()));
        });

        GateState::Pending
    }

    /// The view is gone: any outstanding evaluation is dropped on arrival.
    pub fn teardown(&self) {
        let mut last = self.inner.last.lock();
        self.inner.scope.invalidate();
        *last = None;
    }

    pub fn state(&self) -> GateState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.inner.state.subscribe()
    }

    /// Waits until the current navigation reaches a terminal state.
    pub async fn settled(&self) -> GateState {
        let mut rx = self.subscribe();
        match rx.wait_for(GateState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }
}
