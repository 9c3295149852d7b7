use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use parley_store::{ChannelRepository, ChannelStore, FileBackend, StorageBackend};

mod chat;
mod directory;
mod format;
mod session;

use chat::ChatApp;
use directory::UserDirectory;
use session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=info".into()),
        )
        .init();

    // Config
    let data_dir = std::env::var("PARLEY_DATA_DIR").unwrap_or_else(|_| "parley-data".into());
    let poll_ms: u64 = std::env::var("PARLEY_POLL_MS")
        .unwrap_or_else(|_| "1000".into())
        .parse()?;

    let backend: Arc<dyn StorageBackend> = Arc::new(FileBackend::new(PathBuf::from(&data_dir))?);
    let repo = ChannelRepository::new(ChannelStore::new(backend.clone()));
    let session = Session::new(backend);
    let directory = UserDirectory::bundled()?;

    info!("Parley starting; data dir {}", data_dir);

    ChatApp::new(repo, directory, session, Duration::from_millis(poll_ms))
        .run()
        .await
}
