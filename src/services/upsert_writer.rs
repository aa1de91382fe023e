use std::sync::Arc;

use crate::services::catalog_store::{CatalogStore, UpsertRow};
use crate::services::retry::RetryPolicy;

/// Writes rows through the store with retry, giving up quietly.
///
/// An abandoned write leaves whatever the store already held for that key,
/// so a failed refresh never blanks a known price.
#[derive(Clone)]
pub struct UpsertWriter {
    store: Arc<dyn CatalogStore>,
    policy: RetryPolicy,
}

impl UpsertWriter {
    pub fn new(store: Arc<dyn CatalogStore>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    /// Returns `true` once the row is written, `false` if it was abandoned.
    pub async fn upsert(&self, row: &UpsertRow) -> bool {
        let result = self
            .policy
            .run(row.table(), || self.store.upsert(row))
            .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    table = row.table(),
                    conflict_key = ?row.conflict_key(),
                    card_id = %row.card_id(),
                    attempts = self.policy.max_attempts,
                    error = %e,
                    "Upsert abandoned after retries"
                );
                false
            }
        }
    }
}
