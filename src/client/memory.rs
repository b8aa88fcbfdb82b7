//! In-memory stand-in for the Zenduty API.
//!
//! This is a test double. Nothing in the provider or the `zenduty` binary
//! constructs it; it is public so integration tests and downstream crates can
//! drive lifecycle code without a network.
//!
//! Paths are treated as REST collections: a POST creates a child keyed by its
//! `unique_id` (generated when absent), item paths answer GET/PUT/PATCH/DELETE,
//! and unknown items answer 404 the same way the real service does. Collections
//! registered with [`InMemoryApi::number_items`] key their children by a
//! sequence number instead, the way incidents are addressed.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{ApiRequest, ApiResponse, ClientError, Result, Transport};

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<String, Value>,
    collections: BTreeSet<String>,
    numbered: BTreeMap<String, (String, u64)>,
    failures: VecDeque<u16>,
    requests: Vec<(Method, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryApi {
    state: Arc<Mutex<State>>,
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` at the item `path`, bypassing any validation.
    pub fn seed(&self, path: &str, value: Value) {
        let key = normalize(path);
        let mut state = self.lock();
        if let Some((parent, _)) = key.rsplit_once('/') {
            state.collections.insert(parent.to_string());
        }
        state.objects.insert(key, value);
    }

    /// Current stored value at `path`, if any.
    pub fn object(&self, path: &str) -> Option<Value> {
        self.lock().objects.get(&normalize(path)).cloned()
    }

    pub fn remove(&self, path: &str) -> Option<Value> {
        self.lock().objects.remove(&normalize(path))
    }

    /// Give children POSTed to `collection` an increasing integer `field`
    /// (starting at 1) and address them by it.
    pub fn number_items(&self, collection: &str, field: &str) {
        let key = normalize(collection);
        let mut state = self.lock();
        state.collections.insert(key.clone());
        state.numbered.insert(key, (field.to_string(), 0));
    }

    /// Answer the next `times` requests with `status` instead of serving them.
    pub fn fail_next(&self, status: u16, times: usize) {
        let mut state = self.lock();
        state.failures.extend(std::iter::repeat_n(status, times));
    }

    /// Requests served so far, as `(method, normalized path)`.
    pub fn requests(&self) -> Vec<(Method, String)> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked mid-request.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for InMemoryApi {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let key = normalize(&request.path);
        let mut state = self.lock();
        state.requests.push((request.method.clone(), key.clone()));

        if let Some(status) = state.failures.pop_front() {
            return Ok(status_only(status));
        }

        let response = match request.method {
            Method::GET => get(&state, &key),
            Method::POST => {
                let body = object_body(request.body)?;
                create(&mut state, &key, body)
            }
            Method::PUT => {
                let body = object_body(request.body)?;
                replace(&mut state, &key, body, false)
            }
            Method::PATCH => {
                let body = object_body(request.body)?;
                replace(&mut state, &key, body, true)
            }
            Method::DELETE => match state.objects.remove(&key) {
                Some(_) => ApiResponse {
                    status: 204,
                    body: Value::Null,
                },
                None => not_found(),
            },
            other => {
                return Err(ClientError::Transport(format!("unsupported method {}", other)));
            }
        };

        Ok(response)
    }
}

fn get(state: &State, key: &str) -> ApiResponse {
    if let Some(value) = state.objects.get(key) {
        return ok(200, value.clone());
    }

    let prefix = format!("{}/", key);
    let children: Vec<Value> = state
        .objects
        .iter()
        .filter(|(k, _)| k.strip_prefix(&prefix).is_some_and(|rest| !rest.contains('/')))
        .map(|(_, v)| v.clone())
        .collect();

    if !children.is_empty() || state.collections.contains(key) {
        ok(200, Value::Array(children))
    } else {
        not_found()
    }
}

fn create(state: &mut State, collection: &str, mut body: Map<String, Value>) -> ApiResponse {
    let id = match body.get("unique_id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            let id = uuid::Uuid::new_v4().to_string();
            body.insert("unique_id".to_string(), Value::String(id.clone()));
            id
        }
    };

    let key = match state.numbered.get_mut(collection) {
        Some((field, last)) => {
            *last += 1;
            body.insert(field.clone(), json!(*last));
            last.to_string()
        }
        None => id,
    };

    let value = Value::Object(body);
    state.collections.insert(collection.to_string());
    state
        .objects
        .insert(format!("{}/{}", collection, key), value.clone());
    ok(201, value)
}

fn replace(state: &mut State, key: &str, body: Map<String, Value>, merge: bool) -> ApiResponse {
    let Some(existing) = state.objects.get_mut(key) else {
        return not_found();
    };

    let unique_id = existing.get("unique_id").cloned();
    let mut next = if merge {
        existing.as_object().cloned().unwrap_or_default()
    } else {
        Map::new()
    };
    next.extend(body);
    if let Some(id) = unique_id {
        next.insert("unique_id".to_string(), id);
    }

    *existing = Value::Object(next);
    ok(200, existing.clone())
}

fn object_body(body: Option<Value>) -> Result<Map<String, Value>> {
    match body {
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(ClientError::Transport(format!(
            "expected a JSON object body, got {}",
            other
        ))),
        None => Ok(Map::new()),
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn ok(status: u16, body: Value) -> ApiResponse {
    ApiResponse { status, body }
}

fn not_found() -> ApiResponse {
    ApiResponse {
        status: 404,
        body: json!({"detail": "Not found."}),
    }
}

fn status_only(status: u16) -> ApiResponse {
    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");
    ApiResponse {
        status,
        body: json!({"detail": reason}),
    }
}
