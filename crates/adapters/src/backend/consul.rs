// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Consul HTTP backend
//!
//! Sessions map to `/v1/session/*`. Locks follow Consul's lock recipe on the
//! KV store: wait with blocking queries while another session holds the key,
//! then `PUT ?acquire=` it. Once held, a monitor task long-polls the key and
//! fires the lock-lost signal when the key disappears or changes hands.

use super::{BackendError, Connector, CoordinationBackend};
use async_trait::async_trait;
use lr_core::{
    CancellationToken, ConsulSettings, LockKey, LockLost, SessionConfig, SessionId, Signal,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Flags value marking a key as a lock, shared with other Consul lock clients
pub const LOCK_FLAG_VALUE: u64 = 0x2ddc_cbc0_58a5_0c18;

const INDEX_HEADER: &str = "X-Consul-Index";
const TOKEN_HEADER: &str = "X-Consul-Token";

#[derive(Debug, Serialize)]
struct SessionCreateRequest<'a> {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(rename = "TTL")]
    ttl: String,
    #[serde(rename = "LockDelay")]
    lock_delay: String,
    #[serde(rename = "Behavior")]
    behavior: &'static str,
}

#[derive(Debug, Deserialize)]
struct SessionCreateResponse {
    #[serde(rename = "ID")]
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct KvPair {
    #[serde(rename = "Session", default)]
    session: Option<String>,
}

/// Result of a (possibly blocking) key read
struct KeyRead {
    pair: Option<KvPair>,
    index: u64,
}

impl KeyRead {
    fn holder(&self) -> Option<&str> {
        self.pair.as_ref().and_then(|pair| pair.session.as_deref())
    }
}

/// Format a duration the way Consul parses it (`10s`, `1ms`)
fn consul_duration(d: Duration) -> String {
    if d.subsec_nanos() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

/// Consul agent client
#[derive(Clone)]
pub struct ConsulBackend {
    http: reqwest::Client,
    base_url: String,
    settings: Arc<ConsulSettings>,
}

impl ConsulBackend {
    pub fn new(settings: ConsulSettings) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| BackendError::Connect(format!("error creating consul client: {e}")))?;
        Ok(Self {
            http,
            base_url: settings.base_url(),
            settings: Arc::new(settings),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}/v1/{}", self.base_url, path));
        match &self.settings.token {
            Some(token) => builder.header(TOKEN_HEADER, token),
            None => builder,
        }
    }

    async fn expect_success(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn read_bool(response: Response) -> Result<bool, BackendError> {
        let response = Self::expect_success(response).await?;
        let body = response.text().await?;
        serde_json::from_str(body.trim()).map_err(|e| BackendError::Decode(e.to_string()))
    }

    /// Check the agent answers and the cluster has a leader
    pub async fn ping(&self) -> Result<(), BackendError> {
        let response = self
            .request(Method::GET, "status/leader")
            .send()
            .await
            .map_err(|e| BackendError::Connect(e.to_string()))?;
        let response = Self::expect_success(response)
            .await
            .map_err(|e| BackendError::Connect(e.to_string()))?;
        let leader: String = response
            .json()
            .await
            .map_err(|e| BackendError::Connect(format!("invalid leader response: {e}")))?;
        if leader.is_empty() {
            return Err(BackendError::Connect("cluster has no leader".to_string()));
        }
        Ok(())
    }

    /// Read a key. With a non-zero `index` the agent holds the request until
    /// the key changes or `wait_time` passes.
    async fn read_key(&self, path: &str, index: u64) -> Result<KeyRead, BackendError> {
        let mut builder = self.request(Method::GET, &format!("kv/{path}"));
        if index > 0 {
            let wait = self.settings.wait_time;
            builder = builder
                .query(&[
                    ("index", index.to_string()),
                    ("wait", consul_duration(wait)),
                ])
                // The agent adds up to wait/16 of jitter
                .timeout(wait + wait / 16 + self.settings.request_timeout);
        }

        let response = builder.send().await?;
        let next_index = response
            .headers()
            .get(INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        // Index going backwards means the agent's state was reset
        let next_index = if next_index < index { 0 } else { next_index };

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(KeyRead {
                pair: None,
                index: next_index,
            });
        }
        let response = Self::expect_success(response).await?;
        let mut pairs: Vec<KvPair> = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(KeyRead {
            pair: pairs.pop(),
            index: next_index,
        })
    }

    async fn try_acquire(&self, path: &str, session: &SessionId) -> Result<bool, BackendError> {
        let response = self
            .request(Method::PUT, &format!("kv/{path}"))
            .query(&[
                ("acquire", session.as_str().to_string()),
                ("flags", LOCK_FLAG_VALUE.to_string()),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::INTERNAL_SERVER_ERROR {
            let body = response.text().await.unwrap_or_default();
            if body.contains("invalid session") {
                return Err(BackendError::InvalidSession {
                    key: path.to_string(),
                    session: session.to_string(),
                });
            }
            return Err(BackendError::Status { status: 500, body });
        }
        Self::read_bool(response).await
    }

    fn start_monitor(&self, path: String, session: SessionId, index: u64) -> LockLost {
        let signal = Signal::new();
        let lost = signal.observer();
        tokio::spawn(self.clone().monitor(path, session, index, signal));
        lost
    }

    async fn monitor(self, path: String, session: SessionId, mut index: u64, lost: Signal) {
        let mut failures = 0u32;
        loop {
            match self.read_key(&path, index.max(1)).await {
                Ok(read) => {
                    failures = 0;
                    if read.holder() != Some(session.as_str()) {
                        tracing::debug!(key = %path, session = %session, "lock no longer held");
                        lost.fire();
                        return;
                    }
                    index = read.index;
                }
                Err(e) => {
                    if failures >= self.settings.monitor_retries {
                        tracing::warn!(key = %path, error = %e, "lock monitor failed");
                        lost.fire();
                        return;
                    }
                    failures += 1;
                    tokio::time::sleep(self.settings.lock_retry).await;
                }
            }
        }
    }
}

#[async_trait]
impl CoordinationBackend for ConsulBackend {
    async fn create_session(
        &self,
        config: &SessionConfig,
        cancel: &CancellationToken,
    ) -> Result<SessionId, BackendError> {
        let body = SessionCreateRequest {
            name: config.name.as_deref(),
            ttl: consul_duration(config.ttl),
            lock_delay: consul_duration(config.lock_delay),
            behavior: config.behavior.as_str(),
        };
        let send = self.request(Method::PUT, "session/create").json(&body).send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(BackendError::Cancelled),
            response = send => response?,
        };
        let response = Self::expect_success(response).await?;
        let created: SessionCreateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(SessionId::new(created.id))
    }

    async fn destroy_session(&self, id: &SessionId) -> Result<(), BackendError> {
        let response = self
            .request(Method::PUT, &format!("session/destroy/{id}"))
            .send()
            .await?;
        if Self::read_bool(response).await? {
            Ok(())
        } else {
            Err(BackendError::SessionNotFound(id.to_string()))
        }
    }

    async fn renew_session(&self, id: &SessionId) -> Result<(), BackendError> {
        let response = self
            .request(Method::PUT, &format!("session/renew/{id}"))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(BackendError::SessionNotFound(id.to_string()));
        }
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn acquire_lock(
        &self,
        key: &LockKey,
        session: &SessionId,
        stop: &CancellationToken,
    ) -> Result<Option<LockLost>, BackendError> {
        let path = key.path();
        let mut index = 0u64;

        loop {
            if stop.is_cancelled() {
                return Ok(None);
            }

            let read = tokio::select! {
                _ = stop.cancelled() => return Ok(None),
                read = self.read_key(&path, index) => read?,
            };
            match read.holder() {
                Some(holder) if holder == session.as_str() => {
                    return Ok(Some(self.start_monitor(path, session.clone(), read.index)));
                }
                Some(_) => {
                    // Index 0 would make the next read non-blocking
                    index = read.index.max(1);
                    continue;
                }
                None => {}
            }

            // Not raced against `stop`: a grant must be observed once sent
            if self.try_acquire(&path, session).await? {
                return Ok(Some(self.start_monitor(path, session.clone(), read.index)));
            }

            // Refused on a free key: a lock-delay is in effect, so poll after a pause
            tracing::trace!(key = %path, "acquire refused, retrying");
            tokio::select! {
                _ = stop.cancelled() => return Ok(None),
                _ = tokio::time::sleep(self.settings.lock_retry) => {}
            }
            index = 0;
        }
    }
}

/// Builds a [`ConsulBackend`] and checks the agent is reachable
#[derive(Clone, Debug, Default)]
pub struct ConsulConnector {
    settings: ConsulSettings,
}

impl ConsulConnector {
    pub fn new(settings: ConsulSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Connector for ConsulConnector {
    type Backend = ConsulBackend;

    async fn connect(&self) -> Result<ConsulBackend, BackendError> {
        let backend = ConsulBackend::new(self.settings.clone())?;
        backend.ping().await?;
        Ok(backend)
    }
}

#[cfg(test)]
#[path = "consul_tests.rs"]
mod tests;
