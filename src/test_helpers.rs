//! Shared fixtures for unit tests: a scripted transport, a recording
//! navigator, failing stores and sample users.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::AuthError;
use crate::net::transport::{ApiRequest, ApiResponse, Method, Transport};
use crate::net::types::{User, UserType};
use crate::state::manager::SessionManager;
use crate::state::store::{MemoryStore, SessionStore, StoreError};
use crate::util::navigate::{NavigateOptions, Navigator};

// =============================================================================
// SCRIPTED TRANSPORT
// =============================================================================

/// What the scripted backend does with one request.
pub enum Reply {
    Respond(ApiResponse),
    /// Respond after a delay (tests use a paused clock).
    Delayed(Duration, ApiResponse),
    /// Fail without a response, like a refused connection.
    Fail(String),
    /// Never answer.
    Hang,
}

impl Reply {
    pub fn status(status: u16) -> Self {
        Self::Respond(ApiResponse::new(status, ""))
    }

    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self::Respond(ApiResponse::new(status, body.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub bearer: Option<String>,
}

type Handler = Box<dyn Fn(&ApiRequest, Option<&str>) -> Reply + Send + Sync>;

/// Backend stand-in driven by a closure over (request, bearer token).
pub struct ScriptedTransport {
    handler: Handler,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&ApiRequest, Option<&str>) -> Reply + Send + Sync + 'static,
    {
        Arc::new(Self { handler: Box::new(handler), calls: Mutex::new(Vec::new()) })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.path == path)
            .count()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse, AuthError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method,
            path: request.path.clone(),
            query: request.query.clone(),
            body: request.body.clone(),
            bearer: bearer.map(str::to_owned),
        });
        match (self.handler)(request, bearer) {
            Reply::Respond(response) => Ok(response),
            Reply::Delayed(delay, response) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Reply::Fail(message) => Err(AuthError::Transport(message)),
            Reply::Hang => std::future::pending::<Result<ApiResponse, AuthError>>().await,
        }
    }
}

// =============================================================================
// NAVIGATOR / STORES
// =============================================================================

#[derive(Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<(String, NavigateOptions)>>,
}

impl RecordingNavigator {
    pub fn paths(&self) -> Vec<String> {
        self.visits
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }

    pub fn visits(&self) -> Vec<(String, NavigateOptions)> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str, options: NavigateOptions) {
        self.visits.lock().unwrap().push((path.to_owned(), options));
    }
}

/// Store whose writes always fail; reads and removals succeed on nothing.
#[derive(Default)]
pub struct ReadOnlyStore;

impl SessionStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("quota exceeded".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

type WriteFilter = Box<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Memory store that, once armed, refuses writes matching `rejects(key, value)`.
pub struct RejectingStore {
    pub inner: MemoryStore,
    rejects: WriteFilter,
    armed: AtomicBool,
}

impl RejectingStore {
    pub fn new<F>(rejects: F) -> Arc<Self>
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        Arc::new(Self { inner: MemoryStore::new(), rejects: Box::new(rejects), armed: AtomicBool::new(false) })
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl SessionStore for RejectingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.armed.load(Ordering::SeqCst) && (self.rejects)(key, value) {
            return Err(StoreError::Unavailable("quota exceeded".into()));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub fn elder() -> User {
    User::new("1", "Asha Rao", "asha@example.com", UserType::Elder)
}

pub fn caretaker() -> User {
    User::new("2", "Ravi Kumar", "ravi@example.com", UserType::Caretaker)
}

pub fn admin() -> User {
    User::new("3", "Mina Das", "mina@example.com", UserType::Admin)
}

pub fn user_json(user: &User) -> serde_json::Value {
    serde_json::to_value(user).unwrap()
}

pub fn auth_body(user: &User, token: &str) -> serde_json::Value {
    serde_json::json!({ "user": user_json(user), "token": token })
}

/// Manager wired to `transport`, an in-memory store and a recording navigator.
pub struct Harness {
    pub manager: SessionManager,
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<MemoryStore>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    pub fn new(transport: Arc<ScriptedTransport>) -> Self {
        Self::with_store(transport, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(transport: Arc<ScriptedTransport>, store: Arc<MemoryStore>) -> Self {
        let navigator = Arc::new(RecordingNavigator::default());
        let manager = SessionManager::new(ClientConfig::default(), transport.clone(), store.clone(), navigator.clone());
        Self { manager, transport, store, navigator }
    }

    pub fn stored(&self, key: &str) -> Option<String> {
        self.store.get(key).unwrap()
    }
}
