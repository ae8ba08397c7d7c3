// Demo entry point: loads the feed against the configured backend and logs a summary.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use campus_qa::{Config, FileStore, Gateway, KeyValueStore, MemoryStore, ReqwestTransport, Store};

#[tokio::main]
async fn main() -> campus_qa::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("campus_qa=info")),
        )
        .init();

    let config = Config::from_env();
    info!(server = %config.server_url, "starting");

    let storage: Arc<dyn KeyValueStore> = match config.storage_path() {
        Some(path) => match FileStore::open(path.clone()) {
            Ok(store) => {
                info!(path = %path.display(), "using file storage");
                Arc::new(store)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "file storage unavailable, using memory");
                Arc::new(MemoryStore::new())
            }
        },
        None => Arc::new(MemoryStore::new()),
    };

    let transport = Arc::new(ReqwestTransport::new()?);
    let store = Store::new(Gateway::new(config, transport, storage));
    store.init().await;

    let state = store.snapshot();
    info!(
        signed_in = store.is_logged_in(),
        user = %state.user_profile.username,
        questions = state.questions.len(),
        favorites = state.favorites.len(),
        "store ready"
    );
    for question in &state.questions {
        info!(id = %question.id, by = %question.user_name, answers = question.answer_count, "{}", question.title);
    }
    Ok(())
}
