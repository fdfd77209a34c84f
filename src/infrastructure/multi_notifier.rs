use async_trait::async_trait;

use crate::application::{AppResult, LikeEvent, LikeNotifier};

/// Fan out to several channels; one channel failing must not stop the rest.
pub struct MultiNotifier {
    notifiers: Vec<Box<dyn LikeNotifier>>,
}

impl MultiNotifier {
    pub fn new(notifiers: Vec<Box<dyn LikeNotifier>>) -> Self {
        Self { notifiers }
    }
}

#[async_trait]
impl LikeNotifier for MultiNotifier {
    async fn notify(&self, event: &LikeEvent) -> AppResult<()> {
        let mut last_err = None;

        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(event).await {
                last_err = Some(e);
            }
        }

        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
