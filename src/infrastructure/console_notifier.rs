use async_trait::async_trait;

use crate::application::{AppResult, LikeEvent, LikeNotifier};

pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LikeNotifier for ConsoleNotifier {
    async fn notify(&self, event: &LikeEvent) -> AppResult<()> {
        println!(
            "LIKE: tenant={} uid={} region={} outcome={}",
            event.tenant, event.uid, event.region, event.outcome
        );
        Ok(())
    }
}
