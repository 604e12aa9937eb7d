use crate::local_store::LocalStore;
use crate::saved::InFlight;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub local: LocalStore,
    pub in_flight: InFlight,
}

impl AppState {
    pub fn new(pool: SqlitePool, local: LocalStore) -> Self {
        Self {
            pool,
            local,
            in_flight: InFlight::default(),
        }
    }
}
