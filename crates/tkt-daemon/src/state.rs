//! Shared runtime state for tkt-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The boundary is built
//! once at startup; it owns the ledger handle and the engine.

use std::sync::Arc;

use tkt_engine::ScanBoundary;

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub boundary: ScanBoundary,
}

impl AppState {
    pub fn new(boundary: ScanBoundary) -> Self {
        Self { boundary }
    }

    pub fn shared(boundary: ScanBoundary) -> Arc<Self> {
        Arc::new(Self::new(boundary))
    }
}
