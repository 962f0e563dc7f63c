//! Signup orchestrator.
//!
//! Coordinates the signup state machine with the checkpoint store, the
//! duplicate-account check and account registration.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use hs_core::ports::{
    AccountRegistrationPort, CheckpointStorePort, ClockPort, DuplicateAccountCheckPort,
};
use hs_core::signup::{
    FieldValue, SignupAction, SignupEvent, SignupStateMachine, WizardCheckpoint, WizardState,
};

use crate::usecases::signup::context::SignupContext;

#[derive(Debug, thiserror::Error)]
pub enum SignupOrchestratorError {
    #[error("signup wizard is detached")]
    Detached,
}

/// Drives one signup wizard.
///
/// Local actions (checkpoint writes) run while the dispatch lock is held. The
/// duplicate-account check and account creation run outside it so edits can
/// land while a check is in flight; their results re-enter the machine as
/// events and are dropped by it when stale.
pub struct SignupOrchestrator {
    context: Arc<SignupContext>,
    detached: AtomicBool,

    checkpoints: Arc<dyn CheckpointStorePort>,
    duplicate_check: Arc<dyn DuplicateAccountCheckPort>,
    registration: Arc<dyn AccountRegistrationPort>,
    clock: Arc<dyn ClockPort>,
}

impl SignupOrchestrator {
    pub fn new(
        checkpoints: Arc<dyn CheckpointStorePort>,
        duplicate_check: Arc<dyn DuplicateAccountCheckPort>,
        registration: Arc<dyn AccountRegistrationPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            context: SignupContext::default().arc(),
            detached: AtomicBool::new(false),
            checkpoints,
            duplicate_check,
            registration,
            clock,
        }
    }

    /// Seed the wizard from the stored checkpoint.
    ///
    /// A checkpoint older than the retention window is discarded and the
    /// wizard starts fresh. A checkpoint that cannot be read is treated as
    /// absent.
    pub async fn restore(&self) -> Result<WizardState, SignupOrchestratorError> {
        self.ensure_attached()?;
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;
        let now = self.clock.now_ms();

        let state = match self.checkpoints.load().await {
            Ok(Some(checkpoint)) if checkpoint.is_fresh(now) => {
                info!(
                    step = %checkpoint.current_tab,
                    age_ms = checkpoint.age_ms(now),
                    "restoring signup checkpoint"
                );
                WizardState::from_checkpoint(checkpoint)
            }
            Ok(Some(checkpoint)) => {
                info!(age_ms = checkpoint.age_ms(now), "discarding expired signup checkpoint");
                self.clear_checkpoint().await;
                WizardState::initial()
            }
            Ok(None) => WizardState::initial(),
            Err(err) => {
                warn!(error = %err, "failed to load signup checkpoint; starting fresh");
                WizardState::initial()
            }
        };

        self.context.set_state(state.clone()).await;
        Ok(state)
    }

    pub async fn state(&self) -> WizardState {
        self.context.get_state().await
    }

    pub async fn set_field(
        &self,
        name: impl Into<String>,
        value: FieldValue,
    ) -> Result<WizardState, SignupOrchestratorError> {
        self.dispatch(SignupEvent::SetField {
            name: name.into(),
            value,
        })
        .await
    }

    pub async fn clear_field(
        &self,
        name: impl Into<String>,
    ) -> Result<WizardState, SignupOrchestratorError> {
        self.dispatch(SignupEvent::ClearField { name: name.into() })
            .await
    }

    pub async fn next(&self) -> Result<WizardState, SignupOrchestratorError> {
        self.dispatch(SignupEvent::Next).await
    }

    pub async fn back(&self) -> Result<WizardState, SignupOrchestratorError> {
        self.dispatch(SignupEvent::Back).await
    }

    pub async fn submit(&self) -> Result<WizardState, SignupOrchestratorError> {
        self.dispatch(SignupEvent::Submit).await
    }

    pub async fn abandon(&self) -> Result<WizardState, SignupOrchestratorError> {
        self.dispatch(SignupEvent::Abandon).await
    }

    /// Stop applying results. Any check still in flight is discarded when it
    /// completes, and later calls return [`SignupOrchestratorError::Detached`].
    pub fn detach(&self) {
        if !self.detached.swap(true, Ordering::SeqCst) {
            debug!("signup orchestrator detached");
        }
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    fn ensure_attached(&self) -> Result<(), SignupOrchestratorError> {
        if self.is_detached() {
            return Err(SignupOrchestratorError::Detached);
        }
        Ok(())
    }

    async fn dispatch(&self, event: SignupEvent) -> Result<WizardState, SignupOrchestratorError> {
        let span = info_span!("usecase.signup.dispatch", event = ?event);
        async {
            let mut pending_events = VecDeque::from([event]);
            let mut current = self.context.get_state().await;

            while let Some(event) = pending_events.pop_front() {
                self.ensure_attached()?;
                let (next, remote_actions) = self.apply(event).await;
                current = next;

                for action in remote_actions {
                    let follow_up = self.execute_remote(action).await;
                    if self.is_detached() {
                        debug!(result = ?follow_up, "discarding signup result after detach");
                        return Err(SignupOrchestratorError::Detached);
                    }
                    pending_events.extend(follow_up);
                }
            }

            Ok(current)
        }
        .instrument(span)
        .await
    }

    /// Run one transition under the dispatch lock. Returns the new state and
    /// the actions that must run outside the lock.
    async fn apply(&self, event: SignupEvent) -> (WizardState, Vec<SignupAction>) {
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;

        let current = self.context.get_state().await;
        let from_step = current.current_step;
        let event_name = format!("{:?}", event);
        let (next, actions) = SignupStateMachine::transition(current, event);
        info!(
            from = %from_step,
            to = %next.current_step,
            phase = ?next.phase,
            event = %event_name,
            "signup state transition"
        );
        if let Some(error) = &next.error {
            debug!(error = %error, "signup state carries error");
        }

        let mut remote_actions = Vec::new();
        for action in actions {
            match action {
                SignupAction::PersistCheckpoint => self.persist_checkpoint(&next).await,
                SignupAction::ClearCheckpoint => self.clear_checkpoint().await,
                remote => remote_actions.push(remote),
            }
        }

        self.context.set_state(next.clone()).await;
        (next, remote_actions)
    }

    async fn execute_remote(&self, action: SignupAction) -> Option<SignupEvent> {
        debug!(?action, "signup executing action");
        match action {
            SignupAction::CheckDuplicateAccount { email } => {
                let outcome = self.duplicate_check.check(&email).await;
                debug!(?outcome, "duplicate account check completed");
                Some(SignupEvent::DuplicateCheckResolved { email, outcome })
            }
            SignupAction::CreateAccount { role, values } => {
                match self.registration.register(role, &values).await {
                    Ok(()) => {
                        info!(role = %role, "signup account created");
                        Some(SignupEvent::SubmissionSucceeded)
                    }
                    Err(err) => {
                        warn!(role = %role, error = %err, "signup account creation failed");
                        Some(SignupEvent::SubmissionFailed {
                            message: err.to_string(),
                        })
                    }
                }
            }
            SignupAction::PersistCheckpoint | SignupAction::ClearCheckpoint => None,
        }
    }

    async fn persist_checkpoint(&self, state: &WizardState) {
        let checkpoint = WizardCheckpoint::capture(state, self.clock.now_ms());
        if let Err(err) = self.checkpoints.save(&checkpoint).await {
            warn!(error = %err, step = %state.current_step, "failed to persist signup checkpoint");
        }
    }

    async fn clear_checkpoint(&self) {
        if let Err(err) = self.checkpoints.clear().await {
            warn!(error = %err, "failed to clear signup checkpoint");
        }
    }
}
