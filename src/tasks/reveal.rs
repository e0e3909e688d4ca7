use crate::models::PollRecord;
use crate::selection::{Phase, SelectionState, SequenceToken, Timings};
use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;

#[async_trait]
pub trait RevealHooks: Send + Sync {
    async fn on_fade_out(&self);
    async fn on_swap(&self, poll: &PollRecord);
    async fn on_chart_building(&self, poll: &PollRecord);
}

pub struct RevealScheduler {
    state: Arc<Mutex<SelectionState>>,
    timings: Timings,
    hooks: Arc<dyn RevealHooks>,
    sequence: Mutex<Option<JoinHandle<()>>>,
}

impl RevealScheduler {
    pub fn new(timings: Timings, hooks: Arc<dyn RevealHooks>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SelectionState::default())),
            timings,
            hooks,
            sequence: Mutex::new(None),
        }
    }

    pub fn state(&self) -> Arc<Mutex<SelectionState>> {
        Arc::clone(&self.state)
    }

    // Replaces any sequence in flight; false when `poll` is already selected.
    pub async fn select(&self, poll: PollRecord) -> bool {
        let mut sequence = self.sequence.lock().await;
        let post_id = poll.post_id.clone();
        let token = {
            let mut state = self.state.lock().await;
            match state.begin(poll) {
                Some(token) => token,
                None => return false,
            }
        };

        if let Some(previous) = sequence.take() {
            previous.abort();
        }
        info!("Selecting poll {}", post_id);
        self.hooks.on_fade_out().await;

        let state = Arc::clone(&self.state);
        let hooks = Arc::clone(&self.hooks);
        let timings = self.timings;
        *sequence = Some(tokio::spawn(async move {
            run_sequence(state, token, timings, hooks).await;
        }));
        true
    }

    pub async fn cancel(&self) {
        if let Some(handle) = self.sequence.lock().await.take() {
            handle.abort();
        }
        self.state.lock().await.cancel();
    }

    pub async fn reset(&self) {
        if let Some(handle) = self.sequence.lock().await.take() {
            handle.abort();
        }
        self.state.lock().await.reset();
    }
}

async fn run_sequence(
    state: Arc<Mutex<SelectionState>>,
    token: SequenceToken,
    timings: Timings,
    hooks: Arc<dyn RevealHooks>,
) {
    loop {
        let delay = {
            let state = state.lock().await;
            if state.token() != token {
                return;
            }
            match state.phase().next(&timings) {
                Some((delay, _)) => delay,
                None => return,
            }
        };

        sleep(delay).await;

        let step = match state.lock().await.advance(token, &timings) {
            Some(step) => step,
            None => {
                debug!("Dropping stale reveal step");
                return;
            }
        };

        match step.phase {
            Phase::Swapping => hooks.on_swap(&step.poll).await,
            Phase::ChartBuilding => hooks.on_chart_building(&step.poll).await,
            _ => {}
        }
    }
}
