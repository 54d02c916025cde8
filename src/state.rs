use crate::db::{DbPool, OrmConn};

/// Shared application state. `orm` carries the catalog, account, cart and
/// order queries; the raw `pool` serves the audit log and the fallback
/// customer projection, which need direct SQL.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
}
