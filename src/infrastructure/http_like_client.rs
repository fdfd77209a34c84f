use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::application::{AppError, AppResult, LikeClient, LikeOutcome};

/// The real like API. `status: 1` in the body means the like landed; any
/// other status value means the uid already hit its limit for the window.
/// Non-2xx HTTP and send/decode failures (including the request timeout)
/// are transport-level and leave the entry untouched.
pub struct HttpLikeClient {
    client: reqwest::Client,
    base_url: String,
    probe_enabled: bool,
}

impl HttpLikeClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        probe_enabled: bool,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            probe_enabled,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LikeResp {
    status: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CheckLikeResp {
    already_liked: bool,
}

#[async_trait]
impl LikeClient for HttpLikeClient {
    async fn perform(&self, region: &str, uid: &str) -> LikeOutcome {
        let url = format!("{}/like?uid={}&server={}", self.base_url, uid, region);

        let resp = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => return LikeOutcome::TransportError(e.to_string()),
        };

        if !resp.status().is_success() {
            return LikeOutcome::RemoteError(resp.status().as_u16());
        }

        match resp.json::<LikeResp>().await {
            Ok(LikeResp { status: Some(1) }) => LikeOutcome::Liked,
            Ok(_) => LikeOutcome::AlreadyAtLimit,
            Err(e) => LikeOutcome::TransportError(e.to_string()),
        }
    }

    fn supports_probe(&self) -> bool {
        self.probe_enabled
    }

    async fn probe_status(&self, region: &str, uid: &str) -> AppResult<bool> {
        let url = format!(
            "{}/check_like?server={}&uid={}",
            self.base_url, region, uid
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Client(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::Client(e.to_string()))?;

        let body: CheckLikeResp = resp
            .json()
            .await
            .map_err(|e| AppError::Client(e.to_string()))?;

        Ok(body.already_liked)
    }
}
