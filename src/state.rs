use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::services::coach::WritingCoach;
use crate::services::llm_provider::LlmGateway;

/// Shared per-process state. The gateway is built once in `main` and injected
/// here; `None` means it failed to initialize and LLM routes answer 503.
#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    coach: Option<WritingCoach>,
}

impl AppState {
    pub fn new(gateway: Option<Arc<dyn LlmGateway>>) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            coach: gateway.map(WritingCoach::new),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn coach(&self) -> Option<&WritingCoach> {
        self.coach.as_ref()
    }
}
