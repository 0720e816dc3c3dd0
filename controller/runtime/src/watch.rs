use crate::{
    index::{KubernetesObject, Meta, SharedCache},
    k8s::Resource,
};
use ahash::AHashMap as HashMap;
use futures::prelude::*;
use kube::runtime::watcher;
use std::sync::Arc;
use tokio::sync::Notify;

/// Applies a resource watch to the shared cache, waking the rebuild task whenever an event
/// warrants a new routing graph.
///
/// The watch may restart with a fresh listing at any time. Objects that were known before the
/// restart but are missing from the new listing are removed from the cache.
pub(crate) async fn index<T, S>(cache: SharedCache, rebuild: Arc<Notify>, events: S)
where
    T: Resource + Clone + Into<KubernetesObject>,
    S: Stream<Item = watcher::Event<T>>,
{
    tokio::pin!(events);

    let mut known = HashMap::<Meta, T>::default();
    let mut relisted = HashMap::<Meta, T>::default();
    while let Some(event) = events.next().await {
        let changed = match event {
            watcher::Event::Apply(obj) => {
                known.insert(Meta::from_resource(&obj), obj.clone());
                cache.upsert(obj.into())
            }

            watcher::Event::Delete(obj) => {
                known.remove(&Meta::from_resource(&obj));
                cache.delete(&obj.into())
            }

            watcher::Event::Init => {
                relisted.clear();
                false
            }

            watcher::Event::InitApply(obj) => {
                relisted.insert(Meta::from_resource(&obj), obj.clone());
                cache.upsert(obj.into())
            }

            watcher::Event::InitDone => {
                let mut changed = false;
                for (meta, obj) in known.drain() {
                    if !relisted.contains_key(&meta) {
                        tracing::debug!(object = %meta, "Removing object missing from relist");
                        changed |= cache.delete(&obj.into());
                    }
                }
                std::mem::swap(&mut known, &mut relisted);
                tracing::debug!(objects = known.len(), "Synced");
                changed
            }
        };

        if changed {
            rebuild.notify_one();
        }
    }
}
