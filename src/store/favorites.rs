// Favorite operations on the store.

use serde_json::Value;
use tracing::{debug, warn};

use crate::api::PageQuery;

use super::models::{Favorite, Outcome, StoreState};
use super::{LoadingGuard, Operation, Resource, Store, accepted};

impl Store {
    /// Fetch the user's favorites and replace the local list.
    ///
    /// On failure the current list is kept.
    pub async fn fetch_favorites(&self, page: PageQuery) -> Vec<Favorite> {
        let Some(guard) = self.begin(Resource::Favorites) else {
            return self.favorites();
        };
        self.load_favorites(page, guard).await
    }

    /// Fetch favorites after any running favorites fetch has finished.
    async fn refresh_favorites(&self, page: PageQuery) -> Vec<Favorite> {
        let guard = self.begin_after_running(Resource::Favorites).await;
        self.load_favorites(page, guard).await
    }

    async fn load_favorites(&self, page: PageQuery, _guard: LoadingGuard<'_>) -> Vec<Favorite> {
        let result = self.gateway.get_favorites(page).await;
        match accepted(Operation::FetchFavorites, result, "", "") {
            Ok(envelope) => match envelope.data().get("favorites").and_then(Value::as_array) {
                Some(raw) => {
                    let favorites: Vec<Favorite> =
                        raw.iter().filter_map(|f| self.normalizer.favorite(f)).collect();
                    debug!(count = favorites.len(), "favorites loaded");
                    self.apply(
                        Operation::FetchFavorites,
                        |state: &mut StoreState| &mut state.favorites,
                        favorites,
                    );
                }
                None => warn!("favorites response has no favorites list"),
            },
            Err(_) => debug!("keeping current favorites"),
        }
        self.favorites()
    }

    /// Flip the favorite state of a question. Returns whether it is now a favorite.
    pub async fn toggle_favorite(&self, question_id: &str) -> Outcome<bool> {
        let result = self.gateway.toggle_favorite(question_id).await;
        let envelope = match accepted(Operation::ToggleFavorite, result, "操作失败", "操作出错")
        {
            Ok(envelope) => envelope,
            Err(message) => return Outcome::failed(message),
        };

        self.refresh_favorites(PageQuery::default()).await;
        let is_favorite = envelope
            .data()
            .get("isFavorite")
            .and_then(Value::as_bool)
            .unwrap_or_else(|| self.is_favorite(question_id));
        Outcome::ok(is_favorite)
    }

    pub fn is_favorite(&self, question_id: &str) -> bool {
        self.state
            .borrow()
            .favorites
            .iter()
            .any(|f| f.id == question_id)
    }

    pub(super) fn clear_favorites(&self) {
        self.state.send_if_modified(|state| {
            let changed = !state.favorites.is_empty();
            state.favorites.clear();
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, gateway_with};
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fetch_favorites_skips_records_without_id() {
        let transport = ScriptedTransport::new();
        transport.on(
            "/favorites",
            200,
            json!({"code": 200, "data": {"favorites": [
                {"_id": "6822952f33dfcdd8581c18dd"}, {"title": "no id"}, {"id": 7}
            ]}}),
        );
        let (gateway, _, _) = gateway_with(&transport, Some("t"));
        let store = Store::new(gateway);

        let favorites = store.fetch_favorites(PageQuery::default()).await;
        assert_eq!(favorites.len(), 2);
        assert!(store.is_favorite("6822952f33dfcdd8581c18dd"));
        assert!(store.is_favorite("7"));
        assert!(!store.loading().favorites);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_favorites() {
        let transport = ScriptedTransport::new();
        transport.on(
            "/favorites",
            200,
            json!({"code": 200, "data": {"favorites": [{"id": "q1"}]}}),
        );
        transport.fail("/favorites");
        let (gateway, _, _) = gateway_with(&transport, Some("t"));
        let store = Store::new(gateway);

        store.fetch_favorites(PageQuery::default()).await;
        let favorites = store.fetch_favorites(PageQuery::default()).await;
        assert_eq!(favorites.len(), 1);
        assert!(store.is_favorite("q1"));
    }

    #[tokio::test]
    async fn test_toggle_favorite_refetches() {
        let transport = ScriptedTransport::new();
        transport.on("/questions/q1/favorite", 200, json!({"code": 200, "data": {}}));
        transport.on(
            "/favorites",
            200,
            json!({"code": 200, "data": {"favorites": [{"id": "q1"}]}}),
        );
        let (gateway, _, _) = gateway_with(&transport, Some("t"));
        let store = Store::new(gateway);

        let outcome = store.toggle_favorite("q1").await;
        assert_eq!(outcome.data, Some(true));
        assert_eq!(transport.requests_to("/favorites"), 1);
    }

    #[tokio::test]
    async fn test_toggle_favorite_prefers_server_flag() {
        let transport = ScriptedTransport::new();
        transport.on(
            "/questions/q1/favorite",
            200,
            json!({"code": 200, "data": {"isFavorite": false}}),
        );
        transport.on(
            "/favorites",
            200,
            json!({"code": 200, "data": {"favorites": [{"id": "q1"}]}}),
        );
        let (gateway, _, _) = gateway_with(&transport, Some("t"));
        let store = Store::new(gateway);

        assert_eq!(store.toggle_favorite("q1").await.data, Some(false));
    }

    #[tokio::test]
    async fn test_toggle_during_fetch_refetches_after_it() {
        let transport = ScriptedTransport::new();
        transport.on_delayed(
            "/favorites",
            Duration::from_millis(30),
            200,
            json!({"code": 200, "data": {"favorites": []}}),
        );
        transport.on(
            "/favorites",
            200,
            json!({"code": 200, "data": {"favorites": [{"id": "q1"}]}}),
        );
        transport.on(
            "/questions/q1/favorite",
            200,
            json!({"code": 200, "data": {"isFavorite": true}}),
        );
        let (gateway, _, _) = gateway_with(&transport, Some("t"));
        let store = Store::new(gateway);

        let (_, toggled) = tokio::join!(store.fetch_favorites(PageQuery::default()), async {
            tokio::task::yield_now().await;
            store.toggle_favorite("q1").await
        });

        assert_eq!(toggled.data, Some(true));
        assert!(store.is_favorite("q1"));
        assert_eq!(transport.requests_to("/favorites"), 2);
        assert!(!store.loading().favorites);
    }

    #[test]
    fn test_empty_favorites_match_nothing() {
        let transport = ScriptedTransport::new();
        let (gateway, _, _) = gateway_with(&transport, None);
        let store = Store::new(gateway);

        assert!(!store.is_favorite("x"));
        assert!(!store.is_favorite(""));
    }

    #[tokio::test]
    async fn test_is_favorite_ignores_database_id() {
        let transport = ScriptedTransport::new();
        transport.on(
            "/favorites",
            200,
            json!({"code": 200, "data": {"favorites": [{"id": "a", "_id": "b"}]}}),
        );
        let (gateway, _, _) = gateway_with(&transport, Some("t"));
        let store = Store::new(gateway);

        store.fetch_favorites(PageQuery::default()).await;
        assert!(store.is_favorite("a"));
        assert!(!store.is_favorite("b"));
    }

    #[tokio::test]
    async fn test_toggle_favorite_failure() {
        let transport = ScriptedTransport::new();
        transport.fail("/questions/q1/favorite");
        let (gateway, _, _) = gateway_with(&transport, Some("t"));
        let store = Store::new(gateway);

        let outcome = store.toggle_favorite("q1").await;
        assert!(!outcome.is_success());
        assert_eq!(outcome.message.as_deref(), Some("操作出错"));
        assert_eq!(transport.requests_to("/favorites"), 0);
    }
}
