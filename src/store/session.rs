// Sign-in and sign-out.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::storage::TOKEN_KEY;

use super::models::Outcome;
use super::{Operation, Store, accepted};

impl Store {
    /// Sign in and keep the returned bearer token.
    pub async fn login<B: Serialize + ?Sized>(&self, credentials: &B) -> Outcome<()> {
        let result = self.gateway.login(credentials).await;
        let envelope = match accepted(Operation::Login, result, "登录失败", "登录出错") {
            Ok(envelope) => envelope,
            Err(message) => return Outcome::failed(message),
        };

        let Some(token) = envelope
            .data()
            .get("token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
        else {
            warn!("login response has no token");
            return Outcome::failed("登录失败");
        };

        if let Err(e) = self.gateway.storage().set(TOKEN_KEY, token) {
            warn!(error = %e, "failed to save token");
            return Outcome::failed("登录出错");
        }
        info!("signed in");
        Outcome::ok(())
    }

    /// Sign out. The local session is cleared even if the backend call fails.
    pub async fn logout(&self) -> Outcome<()> {
        if let Err(e) = self.gateway.logout().await {
            warn!(error = %e, "logout request failed, clearing session anyway");
        }
        self.clear_token();
        self.clear_favorites();
        info!("signed out");
        Outcome::ok(())
    }
}
