// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! reqwest-backed implementation of [`SyncApi`].

use crate::api::{ApiError, SyncApi};
use crate::config::{Config, ConfigError};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use confab_core::ExternalId;
use confab_protocol::{
    error_code, CheckRequest, CheckResponse, ChunkRequest, ChunkResponse, ErrorBody, InitRequest,
    InitResponse, ValidateResponse, COMPRESS_THRESHOLD, CONTENT_ENCODING_ZSTD, ROUTE_AUTH_VALIDATE,
    ROUTE_SESSIONS_CHECK, ROUTE_SYNC_CHUNK, ROUTE_SYNC_INIT,
};
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Chunk uploads may carry a large initial flush.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);
/// Init handshake.
const INIT_TIMEOUT: Duration = Duration::from_secs(30);
/// Auth validation probe.
const VALIDATE_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP sync client with bearer auth, zstd request compression, and
/// bounded retries for transient failures.
pub struct HttpSyncClient {
    http: reqwest::Client,
    base: String,
    api_key: String,
    retry: RetryPolicy,
}

impl HttpSyncClient {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        // Validate the URL eagerly so misconfiguration fails at startup,
        // not on the first tick.
        reqwest::Url::parse(&config.backend_url)
            .map_err(|_| ConfigError::InvalidUrl(config.backend_url.clone()))?;

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|_| ConfigError::InvalidUrl(config.backend_url.clone()))?;

        Ok(Self {
            http,
            base: config.backend_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<R, ApiError> {
        let payload =
            serde_json::to_vec(body).map_err(|e| ApiError::Protocol(e.to_string()))?;

        let mut req = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .header(CONTENT_TYPE, "application/json");

        if payload.len() > COMPRESS_THRESHOLD {
            match zstd::encode_all(&payload[..], 0) {
                Ok(compressed) => {
                    req = req
                        .header(CONTENT_ENCODING, CONTENT_ENCODING_ZSTD)
                        .body(compressed);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "zstd compression failed, sending plain body");
                    req = req.body(payload);
                }
            }
        } else {
            req = req.body(payload);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;
        decode_response(resp).await
    }
}

/// Map a response to the typed body or the appropriate [`ApiError`].
async fn decode_response<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, ApiError> {
    let status = resp.status();

    if status.is_success() {
        return resp
            .json::<R>()
            .await
            .map_err(|e| ApiError::Protocol(e.to_string()));
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ApiError::Auth);
    }

    if status.is_server_error() {
        return Err(ApiError::Transient(format!("server returned {status}")));
    }

    // Structured 4xx: cursor conflicts carry the server's cursor.
    let body = resp.json::<ErrorBody>().await.ok();
    if status == StatusCode::CONFLICT {
        if let Some(ErrorBody {
            cursor: Some(cursor),
            ..
        }) = body
        {
            return Err(ApiError::CursorConflict { cursor });
        }
        return Err(ApiError::Protocol(
            "409 without a cursor in the error body".to_string(),
        ));
    }

    match body {
        Some(b) => Err(ApiError::Rejected {
            code: b.code,
            message: b.error,
        }),
        None => Err(ApiError::Rejected {
            code: error_code::PROTOCOL_MALFORMED.to_string(),
            message: format!("unexpected status {status}"),
        }),
    }
}

/// Retry `op` on transient failures, up to the policy's attempt bound.
async fn with_retries<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(ApiError::Transient(message)) if attempt < policy.max_attempts => {
                let delay = policy.delay(attempt);
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %message,
                    "transient failure, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[async_trait]
impl SyncApi for HttpSyncClient {
    async fn init(&self, req: &InitRequest) -> Result<InitResponse, ApiError> {
        with_retries(&self.retry, || {
            self.post_json(ROUTE_SYNC_INIT, req, INIT_TIMEOUT)
        })
        .await
    }

    async fn upload_chunk(&self, req: &ChunkRequest) -> Result<ChunkResponse, ApiError> {
        with_retries(&self.retry, || {
            self.post_json(ROUTE_SYNC_CHUNK, req, UPLOAD_TIMEOUT)
        })
        .await
    }

    async fn check_existing(
        &self,
        external_ids: &[ExternalId],
    ) -> Result<CheckResponse, ApiError> {
        let req = CheckRequest {
            external_ids: external_ids.to_vec(),
        };
        self.post_json(ROUTE_SESSIONS_CHECK, &req, DEFAULT_TIMEOUT)
            .await
    }

    async fn validate(&self) -> Result<bool, ApiError> {
        let resp = self
            .http
            .get(self.url(ROUTE_AUTH_VALIDATE))
            .bearer_auth(&self.api_key)
            .timeout(VALIDATE_TIMEOUT)
            .send()
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        match decode_response::<ValidateResponse>(resp).await {
            Ok(body) => Ok(body.valid),
            Err(ApiError::Auth) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
