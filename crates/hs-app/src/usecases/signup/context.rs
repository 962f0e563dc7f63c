use std::sync::Arc;

use hs_core::signup::WizardState;
use tokio::sync::Mutex;

/// Shared signup context containing state and dispatch lock.
///
/// ## Lock Ordering
/// When acquiring both locks, acquire `dispatch_lock` first, then `state`.
/// - `dispatch_lock`: held while a transition and its local actions run.
/// - `state`: used for reads (`get_state`) and writes (during dispatch).
#[derive(Clone)]
pub struct SignupContext {
    state: Arc<Mutex<WizardState>>,
    dispatch_lock: Arc<Mutex<()>>,
}

impl SignupContext {
    pub fn new(initial_state: WizardState) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial_state)),
            dispatch_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Does NOT acquire `dispatch_lock`.
    pub async fn get_state(&self) -> WizardState {
        self.state.lock().await.clone()
    }

    pub async fn acquire_dispatch_lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.dispatch_lock.lock().await
    }

    /// Only call while holding `dispatch_lock`.
    pub async fn set_state(&self, state: WizardState) {
        *self.state.lock().await = state;
    }
}

impl Default for SignupContext {
    fn default() -> Self {
        Self::new(WizardState::initial())
    }
}
