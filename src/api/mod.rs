// Backend gateway module.
// Provides the transport seam, URL resolution, and typed endpoint calls.

pub mod client;
pub mod endpoints;
pub mod notify;
pub mod transport;
pub mod types;
pub mod url;

pub use client::{CallOptions, Gateway};
pub use notify::{LogNotifier, Notification, Notifier};
pub use transport::{
    HttpMethod, HttpTransport, ReqwestTransport, TransportRequest, TransportResponse,
    UploadRequest,
};
pub use types::*;
pub use url::UrlResolver;
