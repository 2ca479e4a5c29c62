use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

/// Work to run when an armed deadline passes
#[async_trait]
pub trait ExpiryHandler: Send + Sync {
    async fn on_expire(&self, deadline: DateTime<Utc>);
}

/// Observable state of the one-shot alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerState {
    Idle,
    Armed(DateTime<Utc>),
    Fired(DateTime<Utc>),
}

impl SchedulerState {
    #[must_use]
    pub const fn deadline(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Idle => None,
            Self::Armed(deadline) | Self::Fired(deadline) => Some(*deadline),
        }
    }
}

struct Slot {
    state: SchedulerState,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl Slot {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One-shot deadline alarm backed by a Tokio task
///
/// Re-arming aborts the pending timer. Each arm bumps a generation counter and
/// a timer only fires while its generation is current, so at most one expiry
/// runs per armed deadline.
pub struct DeadlineScheduler {
    slot: Arc<Mutex<Slot>>,
    handler: Arc<dyn ExpiryHandler>,
}

impl DeadlineScheduler {
    #[must_use]
    pub fn new(handler: Arc<dyn ExpiryHandler>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                state: SchedulerState::Idle,
                generation: 0,
                timer: None,
            })),
            handler,
        }
    }

    /// Arm (or re-arm) the alarm. A deadline in the past fires immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn arm(&self, deadline: DateTime<Utc>) {
        let mut slot = lock(&self.slot);
        slot.cancel_timer();
        slot.generation += 1;
        slot.state = SchedulerState::Armed(deadline);

        let generation = slot.generation;
        let delay = (deadline - Utc::now()).to_std().unwrap_or_default();
        let shared = Arc::clone(&self.slot);
        let handler = Arc::clone(&self.handler);

        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !Self::claim(&shared, generation) {
                return;
            }
            log::info!("Deadline {deadline} reached");
            handler.on_expire(deadline).await;
            Self::settle(&shared, generation);
        }));
        log::debug!("Scheduler armed for {deadline} (generation {generation})");
    }

    /// Cancel the pending alarm. Returns `true` if one was armed.
    pub fn disarm(&self) -> bool {
        let mut slot = lock(&self.slot);
        slot.cancel_timer();
        slot.generation += 1;
        let was_armed = matches!(slot.state, SchedulerState::Armed(_));
        slot.state = SchedulerState::Idle;
        if was_armed {
            log::debug!("Scheduler disarmed");
        }
        was_armed
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        lock(&self.slot).state
    }

    /// Deadline of the pending alarm, if armed
    #[must_use]
    pub fn armed_deadline(&self) -> Option<DateTime<Utc>> {
        match self.state() {
            SchedulerState::Armed(deadline) => Some(deadline),
            _ => None,
        }
    }

    // Move Armed -> Fired if `generation` is still current.
    fn claim(slot: &Mutex<Slot>, generation: u64) -> bool {
        let mut slot = lock(slot);
        match slot.state {
            SchedulerState::Armed(deadline) if slot.generation == generation => {
                slot.state = SchedulerState::Fired(deadline);
                // Detach; the handler must not be aborted by a later arm.
                slot.timer = None;
                true
            }
            _ => false,
        }
    }

    fn settle(slot: &Mutex<Slot>, generation: u64) {
        let mut slot = lock(slot);
        if slot.generation == generation && matches!(slot.state, SchedulerState::Fired(_)) {
            slot.state = SchedulerState::Idle;
        }
    }
}

impl Drop for DeadlineScheduler {
    fn drop(&mut self) {
        lock(&self.slot).cancel_timer();
    }
}
