use crate::{object::Kind, shared::SharedCache};
use prometheus_client::{
    collector::Collector,
    encoding::{DescriptorEncoder, EncodeLabelSet, EncodeMetric},
    metrics::{counter::Counter, family::Family, gauge::ConstGauge, MetricType},
    registry::Registry,
};

/// Counts cache events. Unregistered metrics are still updated but never exported.
#[derive(Clone, Debug, Default)]
pub struct IndexMetrics {
    upserts: Family<KindLabels, Counter>,
    deletes: Family<KindLabels, Counter>,
    rebuild_signals: Family<KindLabels, Counter>,
    rebuilds: Counter,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct KindLabels {
    kind: String,
}

#[derive(Debug)]
struct Instrumented(SharedCache);

/// Exports the number of cached objects of each kind.
pub fn register_cache_size(reg: &mut Registry, cache: SharedCache) {
    reg.register_collector(Box::new(Instrumented(cache)));
}

// === impl IndexMetrics ===

impl IndexMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let metrics = Self::default();
        reg.register(
            "upserts",
            "Count of objects offered to the cache",
            metrics.upserts.clone(),
        );
        reg.register(
            "deletes",
            "Count of objects removed from the cache",
            metrics.deletes.clone(),
        );
        reg.register(
            "rebuild_signals",
            "Count of cache events that warranted a routing graph rebuild",
            metrics.rebuild_signals.clone(),
        );
        reg.register(
            "dag_rebuilds",
            "Count of routing graph rebuilds",
            metrics.rebuilds.clone(),
        );
        metrics
    }

    pub(crate) fn upserted(&self, kind: Kind, rebuild: bool) {
        let labels = KindLabels::from(kind);
        self.upserts.get_or_create(&labels).inc();
        if rebuild {
            self.rebuild_signals.get_or_create(&labels).inc();
        }
    }

    pub(crate) fn deleted(&self, kind: Kind, rebuild: bool) {
        let labels = KindLabels::from(kind);
        self.deletes.get_or_create(&labels).inc();
        if rebuild {
            self.rebuild_signals.get_or_create(&labels).inc();
        }
    }

    pub fn rebuilt(&self) {
        self.rebuilds.inc();
    }

    pub fn rebuilds(&self) -> u64 {
        self.rebuilds.get()
    }
}

impl From<Kind> for KindLabels {
    fn from(kind: Kind) -> Self {
        Self {
            kind: kind.as_str().to_string(),
        }
    }
}

// === impl Instrumented ===

impl Collector for Instrumented {
    fn encode(&self, mut encoder: DescriptorEncoder<'_>) -> Result<(), std::fmt::Error> {
        let this = self.0.read();

        let mut size_encoder = encoder.encode_descriptor(
            "cache_size",
            "The number of objects in the cache",
            None,
            MetricType::Gauge,
        )?;
        for kind in Kind::CACHED {
            let labels = vec![("kind", kind.as_str())];
            let size = ConstGauge::new(this.len_of(kind) as i64);
            let kind_encoder = size_encoder.encode_family(&labels)?;
            size.encode(kind_encoder)?;
        }

        Ok(())
    }
}
