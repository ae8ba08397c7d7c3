// Backend gateway.
// Handles authentication headers, status mapping, and upload echo parsing.

use std::path::Path;
use std::sync::Arc;

use reqwest::Url;
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::storage::{KeyValueStore, TOKEN_KEY};

use super::notify::{LogNotifier, Notification, Notifier};
use super::transport::{HttpMethod, HttpTransport, TransportRequest, TransportResponse, UploadRequest};
use super::types::{Envelope, UploadOutcome};
use super::url::UrlResolver;

const CONTENT_TYPE: &str = "Content-Type";
const AUTHORIZATION: &str = "Authorization";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Options for a single gateway call.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub method: HttpMethod,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    /// Query parameters, form-encoded onto the URL.
    pub query: Vec<(String, String)>,
    /// Skip the user-facing notification on failure. Never changes the result.
    pub suppress_error_notification: bool,
}

impl CallOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Option<Value>) -> Self {
        Self {
            method: HttpMethod::Post,
            body,
            ..Self::default()
        }
    }

    pub fn put(body: Value) -> Self {
        Self {
            method: HttpMethod::Put,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn quiet(mut self) -> Self {
        self.suppress_error_notification = true;
        self
    }
}

/// Stateless façade over the HTTP transport.
#[derive(Clone)]
pub struct Gateway {
    config: Config,
    urls: UrlResolver,
    transport: Arc<dyn HttpTransport>,
    storage: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
}

impl Gateway {
    /// Create a gateway that logs its notifications.
    pub fn new(
        config: Config,
        transport: Arc<dyn HttpTransport>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let urls = UrlResolver::new(&config.server_url, &config.static_prefix);
        Self {
            config,
            urls,
            transport,
            storage,
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Route notifications to the given sink.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn urls(&self) -> &UrlResolver {
        &self.urls
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    /// Resolve a backend-relative resource path to an absolute URL.
    pub fn resolve_url(&self, path: &str) -> String {
        self.urls.resolve(path)
    }

    /// Bearer token from local storage, if any.
    pub fn token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).filter(|token| !token.is_empty())
    }

    /// Make a JSON request against `api_base` followed by the path segments.
    ///
    /// Each segment is percent-encoded on its own, so ids may contain any character.
    pub async fn call(&self, segments: &[&str], options: CallOptions) -> Result<Envelope> {
        let url = self.endpoint_url(segments, &options.query)?;
        let route = segments.join("/");
        let path = route.as_str();
        let notify = !options.suppress_error_notification;

        let mut headers = vec![(CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string())];
        for (name, value) in options.headers {
            set_header(&mut headers, &name, value);
        }
        self.attach_token(&mut headers);

        debug!(method = options.method.as_str(), %url, "sending request");
        let request = TransportRequest {
            method: options.method,
            url,
            headers,
            body: options.body,
        };

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(path, error = %e, "network request failed");
                if notify {
                    self.notifier.notify(Notification::NetworkError);
                }
                return Err(match e {
                    ApiError::Network(_) => e,
                    other => ApiError::Network(other.to_string()),
                });
            }
        };

        self.check_response(path, response, notify)
    }

    /// Upload a local file as multipart form data.
    pub async fn upload_binary(
        &self,
        segments: &[&str],
        file_path: &Path,
        form_fields: Vec<(String, String)>,
        field_name: &str,
    ) -> Result<UploadOutcome> {
        let url = self.endpoint_url(segments, &[])?;
        let route = segments.join("/");
        let path = route.as_str();
        let mut headers = Vec::new();
        self.attach_token(&mut headers);

        debug!(%url, file = %file_path.display(), field_name, "uploading file");
        let request = UploadRequest {
            url,
            headers,
            file_path: file_path.to_path_buf(),
            field_name: field_name.to_string(),
            form_fields,
        };

        let response = match self.transport.upload(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(path, error = %e, "upload request failed");
                self.notifier
                    .notify(Notification::UploadFailed("上传失败，网络错误".to_string()));
                return Err(match e {
                    ApiError::Network(_) | ApiError::Io(_) => e,
                    other => ApiError::Network(other.to_string()),
                });
            }
        };

        match response.status {
            200 => match serde_json::from_str::<Envelope>(&response.body) {
                Ok(envelope) => Ok(UploadOutcome::Parsed(envelope)),
                Err(e) => {
                    warn!(path, error = %e, "upload succeeded but response was not JSON");
                    self.notifier.notify(Notification::UploadDegraded);
                    Ok(UploadOutcome::Degraded(Envelope {
                        code: Envelope::SUCCESS,
                        message: Some("上传成功，但返回数据格式异常".to_string()),
                        data: Some(json!({ "avatarUrl": file_path.to_string_lossy() })),
                    }))
                }
            },
            401 => {
                self.expire_session(true);
                Err(ApiError::Unauthorized)
            }
            status => {
                error!(path, status, "upload rejected");
                self.notifier
                    .notify(Notification::UploadFailed("上传失败，请重试".to_string()));
                Err(ApiError::RequestFailed {
                    status,
                    message: server_message(&response.body),
                })
            }
        }
    }

    /// Check response status and convert errors.
    fn check_response(
        &self,
        path: &str,
        response: TransportResponse,
        notify: bool,
    ) -> Result<Envelope> {
        match response.status {
            200 => match serde_json::from_str::<Envelope>(&response.body) {
                Ok(envelope) => {
                    debug!(path, code = envelope.code, "response received");
                    Ok(envelope)
                }
                Err(e) => {
                    warn!(path, error = %e, "response body is not a JSON envelope");
                    Err(e.into())
                }
            },
            401 => {
                self.expire_session(notify);
                Err(ApiError::Unauthorized)
            }
            status => {
                let message = server_message(&response.body);
                warn!(path, status, message = message.as_deref().unwrap_or(""), "request failed");
                if notify {
                    let title = message.clone().unwrap_or_else(|| "请求失败".to_string());
                    self.notifier.notify(Notification::RequestFailed(title));
                }
                Err(ApiError::RequestFailed { status, message })
            }
        }
    }

    /// `api_base` with the encoded segments and query appended.
    fn endpoint_url(&self, segments: &[&str], query: &[(String, String)]) -> Result<String> {
        let base = &self.config.api_base;
        let mut url = Url::parse(base)
            .map_err(|e| ApiError::Other(format!("invalid API base {}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Other(format!("API base {} cannot take a path", base)))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.to_string())
    }

    /// Drop the persisted token after a 401.
    fn expire_session(&self, notify: bool) {
        warn!("session expired, clearing token");
        if let Err(e) = self.storage.remove(TOKEN_KEY) {
            error!(error = %e, "failed to clear token");
        }
        if notify {
            self.notifier.notify(Notification::SessionExpired);
        }
    }

    fn attach_token(&self, headers: &mut Vec<(String, String)>) {
        if let Some(token) = self.token() {
            set_header(headers, AUTHORIZATION, format!("Bearer {}", token));
        }
    }
}

/// Insert or replace a header, matching names case-insensitively.
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    match headers
        .iter_mut()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
    {
        Some(entry) => entry.1 = value,
        None => headers.push((name.to_string(), value)),
    }
}

/// Extract `message` from an error body, if it is a JSON envelope.
fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<Envelope>(body)
        .ok()
        .and_then(|envelope| envelope.message)
        .filter(|message| !message.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingNotifier, ScriptedTransport, gateway_with};

    #[tokio::test]
    async fn test_call_attaches_bearer_token() {
        let transport = ScriptedTransport::new();
        transport.on("/users/profile", 200, json!({"code": 200, "data": {}}));
        let (gateway, _, _) = gateway_with(&transport, Some("secret"));

        let envelope = gateway.call(&["users", "profile"], CallOptions::get()).await.unwrap();
        assert!(envelope.is_success());

        let request = transport.last_request().unwrap();
        assert_eq!(request.url, "http://qa.test/api/users/profile");
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.header("authorization"), Some("Bearer secret"));
        assert_eq!(request.header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_call_without_token_has_no_auth_header() {
        let transport = ScriptedTransport::new();
        transport.on("/questions", 200, json!({"code": 200, "data": {"questions": []}}));
        let (gateway, _, _) = gateway_with(&transport, None);

        gateway.call(&["questions"], CallOptions::get()).await.unwrap();
        assert!(transport.last_request().unwrap().header("authorization").is_none());
    }

    #[tokio::test]
    async fn test_custom_headers_override_defaults() {
        let transport = ScriptedTransport::new();
        transport.on("/questions", 200, json!({"code": 200}));
        let (gateway, _, _) = gateway_with(&transport, None);

        let options = CallOptions::post(Some(json!({}))).header("content-type", "text/plain");
        gateway.call(&["questions"], options).await.unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.header("Content-Type"), Some("text/plain"));
        assert_eq!(request.headers.len(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_clears_token() {
        let transport = ScriptedTransport::new();
        transport.on("/users/profile", 401, json!({"code": 401, "message": "未授权"}));
        let (gateway, storage, notifier) = gateway_with(&transport, Some("stale"));

        let err = gateway.call(&["users", "profile"], CallOptions::get()).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(storage.get(TOKEN_KEY).is_none());
        assert_eq!(notifier.take(), vec![Notification::SessionExpired]);
        // No retry
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_quiet_call_still_fails_but_does_not_notify() {
        let transport = ScriptedTransport::new();
        transport.on("/questions/abc", 401, json!({}));
        transport.on("/questions/def", 500, json!({"code": 500, "message": "boom"}));
        let (gateway, storage, notifier) = gateway_with(&transport, Some("stale"));

        let err = gateway
            .call(&["questions", "abc"], CallOptions::get().quiet())
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert!(storage.get(TOKEN_KEY).is_none());

        let err = gateway
            .call(&["questions", "def"], CallOptions::get().quiet())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::RequestFailed { status: 500, .. }));
        assert!(notifier.take().is_empty());
    }

    #[tokio::test]
    async fn test_non_200_carries_server_message() {
        let transport = ScriptedTransport::new();
        transport.on("/questions", 400, json!({"code": 400, "message": "标题不能为空"}));
        let (gateway, _, notifier) = gateway_with(&transport, None);

        let err = gateway
            .call(&["questions"], CallOptions::post(Some(json!({}))))
            .await
            .unwrap_err();
        match err {
            ApiError::RequestFailed { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message.as_deref(), Some("标题不能为空"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            notifier.take(),
            vec![Notification::RequestFailed("标题不能为空".to_string())]
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let transport = ScriptedTransport::new();
        transport.fail("/questions");
        let (gateway, _, notifier) = gateway_with(&transport, None);

        let err = gateway.call(&["questions"], CallOptions::get()).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(notifier.take(), vec![Notification::NetworkError]);
    }

    #[tokio::test]
    async fn test_success_status_with_non_envelope_body() {
        let transport = ScriptedTransport::new();
        transport.on("/questions", 200, json!("<html>maintenance</html>"));
        let (gateway, storage, _) = gateway_with(&transport, Some("t"));

        let err = gateway.call(&["questions"], CallOptions::get()).await.unwrap_err();
        assert!(matches!(err, ApiError::Json(_)));
        assert_eq!(err.user_message(), "请求出错");
        assert!(storage.get(TOKEN_KEY).is_some());
    }

    #[tokio::test]
    async fn test_upload_parsed() {
        let transport = ScriptedTransport::new();
        transport.on_upload(200, r#"{"code":200,"data":{"avatarUrl":"/uploads/a.png"}}"#);
        let (gateway, _, _) = gateway_with(&transport, Some("secret"));

        let outcome = gateway
            .upload_binary(&["users", "avatar"], Path::new("/tmp/a.png"), Vec::new(), "avatar")
            .await
            .unwrap();
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.envelope().data()["avatarUrl"], "/uploads/a.png");

        let upload = transport.last_upload().unwrap();
        assert_eq!(upload.field_name, "avatar");
        assert_eq!(upload.url, "http://qa.test/api/users/avatar");
        assert_eq!(
            upload.headers,
            vec![("Authorization".to_string(), "Bearer secret".to_string())]
        );
    }

    #[tokio::test]
    async fn test_upload_with_unparsable_body_degrades() {
        let transport = ScriptedTransport::new();
        transport.on_upload(200, "<html>ok</html>");
        let (gateway, _, notifier) = gateway_with(&transport, None);

        let outcome = gateway
            .upload_binary(&["users", "avatar"], Path::new("/tmp/local.png"), Vec::new(), "avatar")
            .await
            .unwrap();
        assert!(outcome.is_degraded());
        let envelope = outcome.into_envelope();
        assert_eq!(envelope.code, 200);
        assert_eq!(envelope.data(), &json!({"avatarUrl": "/tmp/local.png"}));
        assert_eq!(notifier.take(), vec![Notification::UploadDegraded]);
    }

    #[tokio::test]
    async fn test_upload_rejected() {
        let transport = ScriptedTransport::new();
        transport.on_upload(413, r#"{"code":413,"message":"文件过大"}"#);
        let (gateway, _, _) = gateway_with(&transport, None);

        let err = gateway
            .upload_binary(&["users", "avatar"], Path::new("/tmp/a.png"), Vec::new(), "avatar")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::RequestFailed { status: 413, .. }));
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        set_header(&mut headers, "content-type", "text/plain".to_string());
        set_header(&mut headers, "X-Trace", "1".to_string());
        assert_eq!(
            headers,
            vec![
                ("Content-Type".to_string(), "text/plain".to_string()),
                ("X-Trace".to_string(), "1".to_string()),
            ]
        );
    }
}
