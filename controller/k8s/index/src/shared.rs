use crate::{
    cache::{Applied, KubernetesCache},
    metrics::IndexMetrics,
    object::{Kind, KubernetesObject},
};
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;

/// A cache shared between the event source and the graph builder.
///
/// Each upsert or delete holds the write lock across both the mutation and the rebuild
/// decision, so that decision never observes a partially applied event.
#[derive(Clone, Debug)]
pub struct SharedCache {
    cache: Arc<RwLock<KubernetesCache>>,
    metrics: IndexMetrics,
}

// === impl SharedCache ===

impl SharedCache {
    pub fn new(cache: KubernetesCache) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            metrics: IndexMetrics::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: IndexMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Stores an object and reports whether the routing graph should be rebuilt.
    ///
    /// Secrets and Services only warrant a rebuild when something references them. Every
    /// other kind warrants one whenever it is admitted, or when its rejection evicts a
    /// previously admitted version.
    pub fn upsert(&self, obj: KubernetesObject) -> bool {
        let kind = obj.kind();
        let meta = obj.meta();
        let referenced = matches!(kind, Kind::Secret | Kind::Service).then(|| obj.clone());

        let mut cache = self.cache.write();
        let applied = cache.apply(obj);
        let rebuild = match (applied, referenced) {
            (Applied::Stored, Some(obj)) => cache.triggers_rebuild(&obj),
            (Applied::Stored, None) | (Applied::Evicted, _) => true,
            (Applied::Rejected, _) => false,
        };
        drop(cache);

        tracing::debug!(%kind, object = %meta, ?applied, rebuild, "Upserted");
        self.metrics.upserted(kind, rebuild);
        rebuild
    }

    /// Evicts an object and reports whether the routing graph should be rebuilt.
    ///
    /// Removing anything that was present warrants a rebuild.
    pub fn delete(&self, obj: &KubernetesObject) -> bool {
        let kind = obj.kind();
        let removed = self.cache.write().remove(obj);
        tracing::debug!(%kind, object = %obj.meta(), removed, "Deleted");
        self.metrics.deleted(kind, removed);
        removed
    }

    /// Returns a point-in-time copy of the cache.
    pub fn snapshot(&self) -> KubernetesCache {
        self.cache.read().clone()
    }

    pub fn metrics(&self) -> &IndexMetrics {
        &self.metrics
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, KubernetesCache> {
        self.cache.read()
    }
}
