use backon::{ExponentialBuilder, Retryable};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::HeaderMap;
use serde::{Serialize, de::DeserializeOwned};
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use tracing::warn;
use url::Url;

use super::policy::{UpstreamErrorBody, body_preview, classify_upstream_error};
use crate::config::{ProviderKind, UpstreamSettings};
use crate::error::{IsRetryable, LlmError};

/// One provider's outbound lane: shared HTTP client, rate limiter and retry policy.
pub(crate) struct Upstream {
    provider: ProviderKind,
    client: reqwest::Client,
    limiter: Arc<DefaultDirectRateLimiter>,
    retry_policy: ExponentialBuilder,
}

impl Upstream {
    pub(crate) fn new(
        provider: ProviderKind,
        client: reqwest::Client,
        settings: &UpstreamSettings,
    ) -> Self {
        let rps = NonZeroU32::new(settings.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));

        let retry_policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(2))
            .with_max_times(settings.retry_max_times)
            .with_jitter();

        Self {
            provider,
            client,
            limiter,
            retry_policy,
        }
    }

    pub(crate) fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// POST `body` as JSON and decode a successful response into `R`.
    ///
    /// Every attempt waits on the rate limiter. Transport errors, 429 and 5xx
    /// are retried; other statuses fail immediately with the body mapped through `E`.
    pub(crate) async fn post_json<B, R, E>(
        &self,
        url: &Url,
        headers: HeaderMap,
        body: &B,
    ) -> Result<R, LlmError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
        E: UpstreamErrorBody,
    {
        let provider = self.provider;
        let client = &self.client;
        let limiter = &self.limiter;
        let headers = &headers;

        let resp = (move || async move {
            limiter.until_ready().await;

            let resp = client
                .post(url.clone())
                .headers(headers.clone())
                .json(body)
                .send()
                .await
                .map_err(|source| LlmError::Transport { provider, source })?;

            if resp.status().is_success() {
                return Ok(resp);
            }
            Err(classify_upstream_error::<E>(provider, resp).await)
        })
        .retry(self.retry_policy)
        .when(|e: &LlmError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!(
                %provider,
                url = %url,
                "[{provider}] upstream call failed, retrying in {dur:?}: {err}"
            );
        })
        .await?;

        let bytes = resp
            .bytes()
            .await
            .map_err(|source| LlmError::Transport { provider, source })?;

        serde_json::from_slice::<R>(&bytes).map_err(|source| {
            tracing::debug!(
                %provider,
                body = %body_preview(&String::from_utf8_lossy(&bytes)),
                "Upstream success body did not match the expected schema"
            );
            LlmError::Decode { provider, source }
        })
    }
}

/// Resolve `path` against `base`, treating `base` as a directory even without a
/// trailing slash (`http://host/v1` + `chat/completions` -> `http://host/v1/chat/completions`).
pub(crate) fn join_endpoint(
    provider: ProviderKind,
    base: &Url,
    path: &str,
) -> Result<Url, LlmError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    base.join(path.trim_start_matches('/'))
        .map_err(|source| LlmError::InvalidEndpoint { provider, source })
}
