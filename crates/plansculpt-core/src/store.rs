//! Store handle injected into the API state

use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::audit::AuditLog;

/// Entry point for every business operation.
///
/// Cheap to clone; all clones share the connection pool and the
/// identifier locks.
#[derive(Clone)]
pub struct Store {
    pub(crate) db: DatabaseConnection,
    pub(crate) audit: AuditLog,
    id_locks: Arc<ScopeLocks>,
}

impl Store {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            audit: AuditLog::new(db.clone()),
            db,
            id_locks: Arc::new(ScopeLocks::default()),
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Serialize identifier allocation for one scope (e.g. `employee:2026`)
    pub(crate) async fn lock_scope(&self, scope: &str) -> OwnedMutexGuard<()> {
        self.id_locks.lock(scope).await
    }
}

/// One async mutex per identifier scope
#[derive(Default)]
struct ScopeLocks {
    scopes: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ScopeLocks {
    async fn lock(&self, scope: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut scopes = self.scopes.lock().await;
            scopes
                .entry(scope.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
