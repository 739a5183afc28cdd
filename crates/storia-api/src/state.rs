//! Application state.
//!
//! All collaborators are explicitly constructed in `setup::services` and
//! injected here; handlers extract what they need through `State<Arc<AppState>>`.
//! There is no global mutable service state.

use sqlx::PgPool;
use std::sync::Arc;
use storia_core::Config;
use storia_storage::Storage;

use crate::services::upload::UploadService;

/// Main application state shared by request handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub upload_service: UploadService,
    pub storage: Arc<dyn Storage>,
    pub config: Config,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
