//! Assembly of the full controller from its devices.
//!
//! [`spawn_system`] validates the configuration, builds the shared groups,
//! and spawns every loop onto a `JoinSet`. The returned [`AccessSystem`]
//! keeps the inspection handles (state, signals, audit log, feedback) and
//! owns the tasks; dropping it or calling
//! [`shutdown`](AccessSystem::shutdown) tears the controller down.

use crate::audit::AccessLog;
use crate::card::CardPoller;
use crate::combo::ComboCaptureLoop;
use crate::dispatcher::AccessDispatcher;
use crate::door::DoorMonitor;
use crate::lock::LockController;
use crate::signals::CredentialSignals;
use crate::state::SharedState;
use latchkey_core::constants::MSG_IDLE;
use latchkey_core::{AccessConfig, Result};
use latchkey_hardware::panel::FeedbackWorker;
use latchkey_hardware::{
    Buzzer, Display, DoorContact, FeedbackHandle, LockActuator, PositionDial, StatusLeds,
};
use latchkey_rfid::{Mfrc522, RegisterBus};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Running controller: shared handles plus the task set.
pub struct AccessSystem {
    pub state: Arc<SharedState>,
    pub signals: Arc<CredentialSignals>,
    pub audit: AccessLog,
    pub feedback: FeedbackHandle,
    tasks: JoinSet<()>,
}

impl AccessSystem {
    /// Number of running tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Abort every loop and wait for the tasks to wind down.
    pub async fn shutdown(mut self) {
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
    }
}

/// Validate `config`, wire the devices together, and start all five loops.
///
/// # Errors
///
/// Returns the configuration validation error; nothing is spawned in that
/// case.
#[allow(clippy::too_many_arguments)]
pub fn spawn_system<C, P, B, D, Z, L, A>(
    config: AccessConfig,
    contact: C,
    dial: P,
    reader_bus: B,
    display: D,
    buzzer: Z,
    leds: L,
    actuator: A,
) -> Result<AccessSystem>
where
    C: DoorContact + 'static,
    P: PositionDial + 'static,
    B: RegisterBus + 'static,
    D: Display + 'static,
    Z: Buzzer + 'static,
    L: StatusLeds + 'static,
    A: LockActuator + 'static,
{
    config.validate()?;
    let config = Arc::new(config);

    let state = Arc::new(SharedState::new());
    let signals = Arc::new(CredentialSignals::new());
    let audit = AccessLog::new();

    let (worker, feedback) = FeedbackWorker::new(display, buzzer, leds, MSG_IDLE.0, MSG_IDLE.1);
    let lock = Arc::new(Mutex::new(LockController::new(
        actuator,
        Arc::clone(&state),
        feedback.clone(),
        audit.clone(),
    )));

    let mut tasks = JoinSet::new();
    tasks.spawn(worker.run());
    tasks.spawn(
        DoorMonitor::new(
            contact,
            Arc::clone(&lock),
            Arc::clone(&state),
            Arc::clone(&config),
        )
        .run(),
    );
    tasks.spawn(
        ComboCaptureLoop::new(
            dial,
            &config,
            Arc::clone(&state),
            Arc::clone(&signals),
            feedback.clone(),
            audit.clone(),
        )
        .run(),
    );
    tasks.spawn(
        CardPoller::new(
            Mfrc522::new(reader_bus),
            config.allowed_set(),
            Arc::clone(&signals),
            feedback.clone(),
            audit.clone(),
        )
        .run(),
    );
    tasks.spawn(
        AccessDispatcher::new(
            lock,
            Arc::clone(&state),
            Arc::clone(&signals),
            config,
            audit.clone(),
        )
        .run(),
    );

    Ok(AccessSystem {
        state,
        signals,
        audit,
        feedback,
        tasks,
    })
}
