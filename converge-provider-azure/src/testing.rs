//! In-memory management API for tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::client::{ApiError, ApiResponse, ApiResult, ManagementClient};

/// Scripted answer for the next GET
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Respond with this status and the stored body
    Status(u16),
    Error(ApiError),
    /// Stall for this long, then answer from stored state
    Delay(Duration),
}

#[derive(Default)]
struct Inner {
    resources: HashMap<String, serde_json::Value>,
    /// GETs that still answer 404 after a PUT, per ID
    invisible: HashMap<String, usize>,
    /// GETs that still answer 200 after a DELETE, per ID
    deleting: HashMap<String, usize>,
    replication_lag: usize,
    deletion_lag: usize,
    script: VecDeque<Scripted>,
    calls: Vec<String>,
}

/// Fake ARM endpoint with configurable replication and deletion lag
#[derive(Default)]
pub struct FakeClient {
    inner: Mutex<Inner>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newly created resources answer 404 for this many GETs
    pub fn with_replication_lag(self, gets: usize) -> Self {
        self.inner.lock().unwrap().replication_lag = gets;
        self
    }

    /// Deleted resources answer 200 for this many GETs
    pub fn with_deletion_lag(self, gets: usize) -> Self {
        self.inner.lock().unwrap().deletion_lag = gets;
        self
    }

    /// Queue answers that take precedence over stored state for GETs
    pub fn script(&self, answers: impl IntoIterator<Item = Scripted>) {
        self.inner.lock().unwrap().script.extend(answers);
    }

    pub fn insert(&self, id: &str, body: serde_json::Value) {
        self.inner
            .lock()
            .unwrap()
            .resources
            .insert(id.to_string(), body);
    }

    pub fn body(&self, id: &str) -> Option<serde_json::Value> {
        self.inner.lock().unwrap().resources.get(id).cloned()
    }

    /// Recorded calls, e.g. "PUT /subscriptions/..."
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(' ').next() == Some(method))
            .count()
    }
}

fn not_found() -> ApiError {
    ApiError::status(404, "ResourceNotFound")
}

#[async_trait]
impl ManagementClient for FakeClient {
    async fn get(&self, resource_id: &str, _api_version: &str) -> ApiResult<ApiResponse> {
        let delay = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(format!("GET {}", resource_id));
            match inner.script.front() {
                Some(Scripted::Delay(delay)) => {
                    let delay = *delay;
                    inner.script.pop_front();
                    Some(delay)
                }
                _ => None,
            }
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock().unwrap();
        let stored = inner
            .resources
            .get(resource_id)
            .cloned()
            .unwrap_or_default();
        if delay.is_none()
            && let Some(answer) = inner.script.pop_front()
        {
            return match answer {
                Scripted::Status(404) => Err(not_found()),
                Scripted::Status(status) => Ok(ApiResponse::new(status, stored)),
                Scripted::Error(e) => Err(e),
                Scripted::Delay(_) => Ok(ApiResponse::new(200, stored)),
            };
        }

        if let Some(remaining) = inner.deleting.get_mut(resource_id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(ApiResponse::new(200, serde_json::Value::Null));
            }
            inner.deleting.remove(resource_id);
        }
        if let Some(remaining) = inner.invisible.get_mut(resource_id)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(not_found());
        }

        match inner.resources.get(resource_id) {
            Some(body) => Ok(ApiResponse::new(200, body.clone())),
            None => Err(not_found()),
        }
    }

    async fn put(
        &self,
        resource_id: &str,
        _api_version: &str,
        body: serde_json::Value,
    ) -> ApiResult<ApiResponse> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(format!("PUT {}", resource_id));
        let lag = inner.replication_lag;
        inner.invisible.insert(resource_id.to_string(), lag);
        inner
            .resources
            .insert(resource_id.to_string(), body.clone());
        Ok(ApiResponse::new(201, body))
    }

    async fn patch(
        &self,
        resource_id: &str,
        _api_version: &str,
        body: serde_json::Value,
    ) -> ApiResult<ApiResponse> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(format!("PATCH {}", resource_id));
        let stored = inner.resources.get_mut(resource_id).ok_or_else(not_found)?;

        if let (Some(stored), Some(patch)) = (stored.as_object_mut(), body.as_object()) {
            for (key, value) in patch {
                let merged = match (stored.get_mut(key), value) {
                    (Some(serde_json::Value::Object(existing)), serde_json::Value::Object(update))
                        if key == "properties" =>
                    {
                        for (k, v) in update {
                            existing.insert(k.clone(), v.clone());
                        }
                        true
                    }
                    _ => false,
                };
                if !merged {
                    stored.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(ApiResponse::new(200, stored.clone()))
    }

    async fn delete(&self, resource_id: &str, _api_version: &str) -> ApiResult<ApiResponse> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(format!("DELETE {}", resource_id));
        if inner.resources.remove(resource_id).is_none() {
            return Err(not_found());
        }
        inner.invisible.remove(resource_id);
        let lag = inner.deletion_lag;
        if lag > 0 {
            inner.deleting.insert(resource_id.to_string(), lag);
        }
        Ok(ApiResponse::new(202, serde_json::Value::Null))
    }
}
