use std::sync::Arc;

use contextd_tenant::TenantInfo;
use contextd_vector_store::{Filter, VectorStore};

use crate::types::{StatuslineSnapshot, UNKNOWN_COUNT};

const SERVICE_OK: &str = "ok";
const SERVICE_UNAVAILABLE: &str = "unavailable";

/// Direct-read aggregator: counts collection sizes through the store
/// in-process, never over HTTP. A collection that can't be opened or
/// counted degrades that one field to the unknown sentinel rather than
/// failing the whole snapshot — a broken memory collection shouldn't hide
/// a healthy checkpoint count.
pub struct StatuslineService {
    store: Arc<VectorStore>,
    dimension: usize,
}

impl StatuslineService {
    pub fn new(store: Arc<VectorStore>, dimension: usize) -> Self {
        Self { store, dimension }
    }

    fn tenant_filter(tenant: &TenantInfo) -> Filter {
        tenant
            .as_filter()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    async fn count(&self, name: &str, filter: &Filter) -> Option<i64> {
        let collection = self.store.get_or_create_collection(name, self.dimension).await.ok()?;
        collection.count(filter).await.ok().map(|n| n as i64)
    }

    pub async fn snapshot(&self, tenant: &TenantInfo) -> StatuslineSnapshot {
        let filter = Self::tenant_filter(tenant);
        let mut snapshot = StatuslineSnapshot::default();

        match self.count("checkpoints", &filter).await {
            Some(n) => {
                snapshot.checkpoints = n;
                snapshot.services.insert("checkpoints".to_string(), SERVICE_OK.to_string());
            }
            None => {
                snapshot.checkpoints = UNKNOWN_COUNT;
                snapshot
                    .services
                    .insert("checkpoints".to_string(), SERVICE_UNAVAILABLE.to_string());
            }
        }

        let memories_collection = format!("{}_memories", tenant.tenant_id);
        match self.count(&memories_collection, &filter).await {
            Some(n) => {
                snapshot.memories = n;
                snapshot.services.insert("memories".to_string(), SERVICE_OK.to_string());
            }
            None => {
                snapshot.memories = UNKNOWN_COUNT;
                snapshot
                    .services
                    .insert("memories".to_string(), SERVICE_UNAVAILABLE.to_string());
            }
        }

        snapshot
    }
}
