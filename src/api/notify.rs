// User-facing notifications raised by the gateway.
// The UI decides how to show them; the default sink only logs.

use tracing::{info, warn};

/// A notification the UI should surface (toast, redirect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Token rejected; the UI should send the user back to login.
    SessionExpired,
    /// Backend rejected the request.
    RequestFailed(String),
    /// No response reached the client.
    NetworkError,
    /// Upload reached the server but the echo body was unreadable.
    UploadDegraded,
    /// Upload was rejected or never arrived.
    UploadFailed(String),
}

impl Notification {
    pub fn title(&self) -> &str {
        match self {
            Notification::SessionExpired => "登录已过期，请重新登录",
            Notification::RequestFailed(message) => message,
            Notification::NetworkError => "网络请求失败",
            Notification::UploadDegraded => "上传成功但解析结果失败",
            Notification::UploadFailed(message) => message,
        }
    }
}

/// Receiver of gateway notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier that writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match &notification {
            Notification::SessionExpired | Notification::UploadDegraded => {
                info!(title = notification.title(), "notification")
            }
            _ => warn!(title = notification.title(), "notification"),
        }
    }
}
