pub mod config;
pub mod error;
pub mod field;
pub mod geometry;
pub mod logging;
pub mod pdf;
pub mod placement;
pub mod queue;
pub mod session;
pub mod signature;
pub use error::{AppError, AppResult};

use pdf::DocumentBackend;
use session::Session;
use signature::store::SignatureStore;

/// Entrypoint used by higher-level integrations and CLI bindings: installs
/// logging, reads the user config, and builds an empty session plus the
/// signature store it should save to.
pub fn bootstrap<B: DocumentBackend>(backend: B) -> AppResult<(Session<B>, SignatureStore)> {
    logging::init();
    tracing::info!("starting sigstack");

    let app_config = config::load_app_config();
    let zoom = app_config.default_zoom.unwrap_or(session::DEFAULT_ZOOM);
    let store = store_from_config(&app_config);

    let session = Session::with_zoom(backend, zoom);
    tracing::info!(
        zoom = session.zoom(),
        store = %store.signatures_dir().display(),
        "session ready"
    );
    Ok((session, store))
}

/// `signatures_dir` names the signatures directory itself; without it,
/// saves go to `signatures/` under the working directory.
fn store_from_config(app_config: &config::AppConfig) -> SignatureStore {
    match &app_config.signatures_dir {
        Some(dir) => SignatureStore::at_dir(dir.clone()),
        None => SignatureStore::new("."),
    }
}
