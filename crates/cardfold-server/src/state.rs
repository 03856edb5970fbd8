//! Server state management.

use std::sync::Arc;

use cardfold_core::config::CardfoldConfig;
use cardfold_core::error::CardfoldResult;
use cardfold_core::library::Library;

use crate::factory::create_library;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<Library>,
    pub config: Arc<CardfoldConfig>,
}

impl AppState {
    /// Wrap an already built library.
    pub fn new(library: Library, config: CardfoldConfig) -> Self {
        Self {
            library: Arc::new(library),
            config: Arc::new(config),
        }
    }

    /// Build the store, categorizer and providers described by `config`.
    pub fn from_config(config: CardfoldConfig) -> CardfoldResult<Self> {
        let library = create_library(&config)?;
        Ok(Self::new(library, config))
    }
}
