use std::sync::Arc;

use boxoffice_core::Coordinator;
use boxoffice_store::CatalogRepository;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub catalog: Arc<CatalogRepository>,
}
