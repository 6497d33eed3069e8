use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;
use tokio::sync::broadcast;

use studybundle_backend::blob::BlobStore;
use studybundle_backend::config::Config;
use studybundle_backend::routes::build_router;
use studybundle_backend::state::AppState;
use studybundle_backend::store::Store;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    _temp_dir: TempDir,
}

pub async fn spawn_test_server() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("studybundle-test.sled");
    let blob_dir = temp_dir.path().join("blobs");

    // Construct the Config directly; set_var would race across test threads
    let config = Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path: sled_path.to_string_lossy().to_string(),
        blob_dir: blob_dir.to_string_lossy().to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        organization_id: "default".to_string(),
        currency: "VND".to_string(),
    };

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");
    let blobs = Arc::new(BlobStore::open(&config.blob_dir).expect("open blob store"));

    let (shutdown_tx, _) = broadcast::channel::<()>(8);
    let state = AppState::new(store, blobs, &config, shutdown_tx);

    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        _temp_dir: temp_dir,
    }
}
