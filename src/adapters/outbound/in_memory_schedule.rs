use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::domains::fleet::{ParticipantDescription, ParticipantId, ScheduleWriter};

/// Schedule-writer adapter for testing and development: hands out
/// sequential participant ids and remembers the registrations.
#[derive(Default)]
pub struct InMemoryScheduleWriter {
    next_id: AtomicU64,
    registrations: Mutex<Vec<ParticipantDescription>>,
}

impl InMemoryScheduleWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registrations(&self) -> Vec<ParticipantDescription> {
        self.registrations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScheduleWriter for InMemoryScheduleWriter {
    async fn make_participant(
        &self,
        description: ParticipantDescription,
    ) -> Result<ParticipantId, String> {
        self.registrations.lock().unwrap().push(description);
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}
