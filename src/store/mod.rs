// View-model store.
// Owns the question feed, favorites, and profile; mirrors backend results into
// a watch channel the UI subscribes to.

pub mod answers;
pub mod favorites;
pub mod flight;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod profile;
pub mod questions;
pub mod seed;
pub mod session;

pub use flight::{InFlight, Resource};
pub use merge::{MergePolicy, Operation, merge};
pub use models::{
    Answer, AnswerPage, Favorite, LikeState, LoadingFlags, Outcome, Question, StoreState,
    UserProfile, UserStatistics,
};
pub use normalize::{ANONYMOUS_USER, AvatarPool, Normalizer};

use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{Notify, watch};
use tracing::{debug, error, warn};

use crate::api::{Envelope, Gateway, ListQuery, PageQuery};
use crate::error::{ApiError, Result};
use crate::storage::{KeyValueStore, TOKEN_KEY, USER_PROFILE_KEY};

/// Process-wide client state and the operations that mutate it.
pub struct Store {
    gateway: Gateway,
    normalizer: Normalizer,
    state: watch::Sender<StoreState>,
    in_flight: InFlight,
    released: Notify,
}

impl Store {
    /// Create a store, restoring the persisted profile if there is one.
    pub fn new(gateway: Gateway) -> Self {
        let normalizer = Normalizer::from_config(gateway.config());
        let user_profile = load_profile(gateway.storage().as_ref(), normalizer.avatars());
        let (state, _) = watch::channel(StoreState {
            user_profile,
            ..StoreState::default()
        });

        Self {
            gateway,
            normalizer,
            state,
            in_flight: InFlight::new(),
            released: Notify::new(),
        }
    }

    /// Load the profile and favorites when signed in, then the question feed.
    pub async fn init(&self) {
        if self.is_logged_in() {
            self.fetch_user_profile().await;
            self.fetch_favorites(PageQuery::default()).await;
        }
        self.fetch_questions(&ListQuery::default()).await;
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Receive a fresh snapshot whenever the state changes.
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    pub fn questions(&self) -> Vec<Question> {
        self.state.borrow().questions.clone()
    }

    pub fn favorites(&self) -> Vec<Favorite> {
        self.state.borrow().favorites.clone()
    }

    pub fn user_profile(&self) -> UserProfile {
        self.state.borrow().user_profile.clone()
    }

    pub fn loading(&self) -> LoadingFlags {
        self.state.borrow().loading
    }

    pub fn is_logged_in(&self) -> bool {
        self.gateway.token().is_some()
    }

    /// Mark a fetch of `resource` as started.
    ///
    /// Returns None when an exclusive fetch of the same resource is already
    /// running; the caller should return current state instead of fetching.
    fn begin(&self, resource: Resource) -> Option<LoadingGuard<'_>> {
        if !self.in_flight.try_acquire(resource) {
            debug!(resource = resource.name(), "fetch already in flight, skipping");
            return None;
        }
        self.sync_loading();
        Some(LoadingGuard {
            store: self,
            resource,
        })
    }

    /// Mark a fetch of `resource` as started, waiting out any fetch already running.
    ///
    /// Used for refreshes after a mutation, whose result must reflect the change.
    async fn begin_after_running(&self, resource: Resource) -> LoadingGuard<'_> {
        loop {
            // Registered before the attempt so a release in between is not missed
            let released = self.released.notified();
            if let Some(guard) = self.begin(resource) {
                return guard;
            }
            released.await;
        }
    }

    fn sync_loading(&self) {
        self.state.send_if_modified(|state| {
            let flags = self.in_flight.flags();
            if state.loading == flags {
                return false;
            }
            state.loading = flags;
            true
        });
    }

    /// Apply `incoming` to one slot of the state under the operation's policy.
    fn apply<T, F>(&self, operation: Operation, select: F, incoming: T)
    where
        T: Clone + Serialize + DeserializeOwned,
        F: FnOnce(&mut StoreState) -> &mut T,
    {
        let policy = operation.merge_policy();
        self.state.send_if_modified(|state| {
            let slot = select(state);
            match merge(slot, incoming, policy) {
                Ok(merged) => {
                    *slot = merged;
                    policy != MergePolicy::Noop
                }
                Err(e) => {
                    error!(?operation, error = %e, "failed to merge result into state");
                    false
                }
            }
        });
    }

    /// Write the current profile to local storage.
    fn persist_profile(&self) {
        let profile = self.user_profile();
        let result = serde_json::to_string(&profile)
            .map_err(ApiError::from)
            .and_then(|json| self.gateway.storage().set(USER_PROFILE_KEY, &json));
        if let Err(e) = result {
            error!(error = %e, "failed to save user profile");
        }
    }

    fn clear_token(&self) {
        if let Err(e) = self.gateway.storage().remove(TOKEN_KEY) {
            error!(error = %e, "failed to clear token");
        }
    }
}

/// Clears the resource's loading flag when dropped, whatever the outcome.
struct LoadingGuard<'a> {
    store: &'a Store,
    resource: Resource,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.store.in_flight.release(self.resource);
        self.store.sync_loading();
        self.store.released.notify_waiters();
    }
}

/// Read the persisted profile, falling back to the built-in default.
fn load_profile(storage: &dyn KeyValueStore, avatars: &AvatarPool) -> UserProfile {
    match storage.get(USER_PROFILE_KEY) {
        Some(json) => match serde_json::from_str(&json) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "stored user profile unreadable, using default");
                seed::default_profile(avatars)
            }
        },
        None => seed::default_profile(avatars),
    }
}

/// Accept a success envelope, or produce the message to show the user.
///
/// A rejected envelope yields the server message or `rejected`; a gateway
/// error yields the server message when there is one, otherwise `errored`.
fn accepted(
    operation: Operation,
    result: Result<Envelope>,
    rejected: &str,
    errored: &str,
) -> std::result::Result<Envelope, String> {
    match result {
        Ok(envelope) if envelope.is_success() => Ok(envelope),
        Ok(envelope) => {
            warn!(?operation, code = envelope.code, message = ?envelope.message, "request rejected");
            Err(envelope.message_or(rejected))
        }
        Err(e) => {
            warn!(?operation, error = %e, "request failed");
            Err(match &e {
                ApiError::RequestFailed {
                    message: Some(message),
                    ..
                } if !message.is_empty() => message.clone(),
                ApiError::Unauthorized => e.user_message(),
                _ => errored.to_string(),
            })
        }
    }
}
