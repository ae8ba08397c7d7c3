// Test doubles for the transport, storage, and notification seams.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{
    Gateway, HttpTransport, Notification, Notifier, TransportRequest, TransportResponse,
    UploadRequest,
};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::storage::{KeyValueStore, MemoryStore, TOKEN_KEY};

pub const TEST_SERVER: &str = "http://qa.test";

#[derive(Debug, Clone)]
enum Reply {
    Respond(TransportResponse),
    Fail,
}

#[derive(Debug, Clone)]
struct Route {
    replies: Vec<Reply>,
    delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct Script {
    routes: HashMap<String, Route>,
    upload: Option<Reply>,
    requests: Vec<TransportRequest>,
    uploads: Vec<UploadRequest>,
}

/// Transport answering from a per-path script.
///
/// Routes match the path after the API base with the query string removed.
/// Queued replies are consumed in order; the last one repeats. Unscripted
/// paths answer 404.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, path: &str, status: u16, body: Value) {
        self.push(path, Reply::Respond(TransportResponse::new(status, body.to_string())));
    }

    pub fn on_delayed(&self, path: &str, delay: Duration, status: u16, body: Value) {
        self.on(path, status, body);
        let mut script = self.script.lock().unwrap();
        if let Some(route) = script.routes.get_mut(path) {
            route.delay = Some(delay);
        }
    }

    pub fn fail(&self, path: &str) {
        self.push(path, Reply::Fail);
    }

    pub fn on_upload(&self, status: u16, body: &str) {
        self.script.lock().unwrap().upload =
            Some(Reply::Respond(TransportResponse::new(status, body)));
    }

    pub fn fail_upload(&self) {
        self.script.lock().unwrap().upload = Some(Reply::Fail);
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.script.lock().unwrap().requests.len()
    }

    pub fn requests_to(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| route_key(&request.url) == path)
            .count()
    }

    pub fn last_request(&self) -> Option<TransportRequest> {
        self.script.lock().unwrap().requests.last().cloned()
    }

    pub fn last_upload(&self) -> Option<UploadRequest> {
        self.script.lock().unwrap().uploads.last().cloned()
    }

    fn push(&self, path: &str, reply: Reply) {
        let mut script = self.script.lock().unwrap();
        script
            .routes
            .entry(path.to_string())
            .or_insert_with(|| Route {
                replies: Vec::new(),
                delay: None,
            })
            .replies
            .push(reply);
    }
}

/// Path after the API base, without the query string.
fn route_key(url: &str) -> &str {
    let path = url
        .strip_prefix(TEST_SERVER)
        .and_then(|rest| rest.strip_prefix("/api"))
        .unwrap_or(url);
    path.split('?').next().unwrap_or(path)
}

fn into_result(reply: Reply) -> Result<TransportResponse> {
    match reply {
        Reply::Respond(response) => Ok(response),
        Reply::Fail => Err(ApiError::Network("connection refused".to_string())),
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let (reply, delay) = {
            let mut script = self.script.lock().unwrap();
            let key = route_key(&request.url).to_string();
            script.requests.push(request);
            match script.routes.get_mut(&key) {
                Some(route) => {
                    let reply = if route.replies.len() > 1 {
                        route.replies.remove(0)
                    } else {
                        route.replies[0].clone()
                    };
                    (reply, route.delay)
                }
                None => (
                    Reply::Respond(TransportResponse::new(
                        404,
                        r#"{"code":404,"message":"not found"}"#,
                    )),
                    None,
                ),
            }
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        into_result(reply)
    }

    async fn upload(&self, request: UploadRequest) -> Result<TransportResponse> {
        let reply = {
            let mut script = self.script.lock().unwrap();
            script.uploads.push(request);
            script
                .upload
                .clone()
                .unwrap_or_else(|| Reply::Respond(TransportResponse::new(404, "")))
        };
        into_result(reply)
    }
}

/// Notifier that remembers everything it was told.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.seen.lock().unwrap())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

pub fn test_config() -> Config {
    let mut config = Config::with_server_url(TEST_SERVER);
    config.data_dir = None;
    config
}

/// Gateway over `transport` with in-memory storage, optionally logged in.
pub fn gateway_with(
    transport: &Arc<ScriptedTransport>,
    token: Option<&str>,
) -> (Gateway, Arc<MemoryStore>, Arc<RecordingNotifier>) {
    let storage = Arc::new(MemoryStore::new());
    if let Some(token) = token {
        storage.set(TOKEN_KEY, token).unwrap();
    }
    let notifier = Arc::new(RecordingNotifier::default());
    let gateway = Gateway::new(test_config(), transport.clone(), storage.clone())
        .with_notifier(notifier.clone());
    (gateway, storage, notifier)
}
