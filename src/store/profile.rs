// Profile operations on the store.
// Every successful profile change is persisted to local storage.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::ProfileUpdate;

use super::models::{Outcome, StoreState, UserProfile, UserStatistics};
use super::{Operation, Resource, Store, accepted};

impl Store {
    /// Fetch the profile and replace the local copy.
    ///
    /// On failure the current profile is kept.
    pub async fn fetch_user_profile(&self) -> UserProfile {
        let Some(_guard) = self.begin(Resource::Profile) else {
            return self.user_profile();
        };

        match self.gateway.get_profile().await {
            Ok(envelope) if envelope.is_success() && envelope.data().is_object() => {
                let profile = self.normalizer.profile(envelope.data());
                debug!(username = %profile.username, avatar = %profile.avatar, "profile loaded");
                self.replace_profile(Operation::FetchUserProfile, profile);
            }
            Ok(envelope) => {
                warn!(code = envelope.code, message = ?envelope.message, "profile fetch rejected, keeping current profile");
            }
            Err(e) => {
                warn!(error = %e, "profile fetch failed, keeping current profile");
            }
        }
        self.user_profile()
    }

    /// Push profile changes and adopt the server's copy.
    pub async fn update_user_profile(&self, update: &ProfileUpdate) -> Outcome<UserProfile> {
        let result = self.gateway.update_profile(update).await;
        let envelope = match accepted(
            Operation::UpdateUserProfile,
            result,
            "更新资料失败",
            "更新资料出错",
        ) {
            Ok(envelope) => envelope,
            Err(message) => return Outcome::failed(message),
        };

        // Without an echoed profile, apply the update to the local copy
        let raw = if envelope.data().is_object() {
            envelope.data().clone()
        } else {
            overlay(&self.user_profile(), update)
        };
        let profile = self.normalizer.profile(&raw);
        self.replace_profile(Operation::UpdateUserProfile, profile);
        Outcome::ok(self.user_profile())
    }

    /// Upload a new avatar and patch it into the profile. Returns the avatar URL.
    pub async fn upload_avatar(&self, file_path: &Path) -> Outcome<String> {
        let outcome = match self.gateway.upload_avatar(file_path).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "avatar upload failed");
                if e.is_unauthorized() {
                    return Outcome::failed(e.user_message());
                }
                return Outcome::failed("上传头像出错");
            }
        };

        let degraded = outcome.is_degraded();
        let envelope = outcome.into_envelope();
        if !envelope.is_success() {
            return Outcome::failed(envelope.message_or("上传头像失败"));
        }

        let Some(avatar) = envelope.data().get("avatarUrl").and_then(Value::as_str) else {
            warn!("avatar upload response has no avatarUrl");
            return Outcome::failed("上传头像失败");
        };
        // A degraded upload only knows the local file, which must not be absolutized
        let avatar = if degraded {
            avatar.to_string()
        } else {
            self.gateway.resolve_url(avatar)
        };

        self.patch_avatar(Operation::UploadAvatar, &avatar);
        info!(%avatar, degraded, "avatar updated");
        Outcome::ok(avatar)
    }

    /// Replace a placeholder or missing avatar with a random bundled one.
    pub async fn check_and_update_default_avatar(&self) -> Outcome<String> {
        let current = self.user_profile().avatar;
        if !is_placeholder_avatar(&current) {
            return Outcome::ok_with_message("用户已有头像，无需更新");
        }

        let avatar = self.normalizer.avatars().random();
        info!(%current, %avatar, "replacing placeholder avatar");
        let update = ProfileUpdate {
            avatar: Some(avatar.clone()),
            ..ProfileUpdate::default()
        };
        let result = self.gateway.update_profile(&update).await;
        if let Err(message) = accepted(
            Operation::CheckDefaultAvatar,
            result,
            "更新头像失败",
            "更新头像出错",
        ) {
            return Outcome::failed(message);
        }

        self.patch_avatar(Operation::CheckDefaultAvatar, &avatar);
        Outcome::ok(avatar)
    }

    /// Activity counters; all zero when unavailable.
    pub async fn fetch_user_statistics(&self) -> UserStatistics {
        let result = self.gateway.get_statistics().await;
        match accepted(Operation::FetchStatistics, result, "", "") {
            Ok(envelope) => self.normalizer.statistics(envelope.data()),
            Err(_) => UserStatistics::default(),
        }
    }

    fn replace_profile(&self, operation: Operation, profile: UserProfile) {
        self.apply(
            operation,
            |state: &mut StoreState| &mut state.user_profile,
            profile,
        );
        self.persist_profile();
    }

    fn patch_avatar(&self, operation: Operation, avatar: &str) {
        let incoming = UserProfile {
            avatar: avatar.to_string(),
            ..self.user_profile()
        };
        self.replace_profile(operation, incoming);
    }
}

/// Whether an avatar is empty or a known placeholder value.
pub fn is_placeholder_avatar(avatar: &str) -> bool {
    let avatar = avatar.trim();
    avatar.is_empty()
        || avatar == "none"
        || avatar.contains("placeholder.com")
        || avatar.contains("undefined")
}

/// The profile as JSON with the set fields of `update` written over it.
fn overlay(profile: &UserProfile, update: &ProfileUpdate) -> Value {
    let mut raw = serde_json::to_value(profile).unwrap_or(Value::Null);
    if let (Some(target), Ok(Value::Object(fields))) =
        (raw.as_object_mut(), serde_json::to_value(update))
    {
        for (key, value) in fields {
            target.insert(key, value);
        }
    }
    raw
}
