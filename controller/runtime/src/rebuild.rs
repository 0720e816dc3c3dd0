use crate::{
    core::{Dag, Status},
    index::{Builder, SharedCache},
};
use std::sync::Arc;
use tokio::{
    sync::{watch, Notify},
    time,
};

/// Rebuilds the routing graph each time the cache signals a change, publishing each new graph.
///
/// Signals that arrive during the holdoff are coalesced into a single rebuild.
pub(crate) async fn run(
    cache: SharedCache,
    signal: Arc<Notify>,
    holdoff: time::Duration,
    tx: watch::Sender<Arc<Dag>>,
) {
    loop {
        signal.notified().await;
        time::sleep(holdoff).await;

        let dag = Builder::new(cache.snapshot()).build();
        cache.metrics().rebuilt();

        let valid = dag.statuses.values().filter(|s| s.is_valid()).count();
        let invalid = dag
            .statuses
            .values()
            .filter(|s| matches!(s, Status::Invalid(_)))
            .count();
        let orphaned = dag
            .statuses
            .values()
            .filter(|s| matches!(s, Status::Orphaned))
            .count();
        tracing::info!(
            virtual_hosts = dag.virtual_hosts.len(),
            secure_virtual_hosts = dag.secure_virtual_hosts.len(),
            valid,
            invalid,
            orphaned,
            "Rebuilt routing graph",
        );
        for (id, status) in &dag.statuses {
            if let Status::Invalid(error) = status {
                tracing::debug!(resource = %id, %error, "Invalid");
            }
        }

        tx.send_replace(Arc::new(dag));
    }
}
