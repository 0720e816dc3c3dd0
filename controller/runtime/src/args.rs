use crate::{
    index::{self, IndexMetrics, KubernetesCache, SharedCache, DEFAULT_INGRESS_CLASS},
    k8s::{self, Resource},
    rebuild, watch,
};
use anyhow::{bail, Result};
use clap::Parser;
use kube::{runtime::watcher, Client};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::{
    sync::{watch as channel, Notify},
    time::Duration,
};
use tracing::{info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(name = "contour", about = "An ingress configuration controller")]
pub struct Args {
    #[clap(
        long,
        default_value = "ingress_controller=info,warn",
        env = "CONTOUR_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// Ingresses and routing resources annotated with another class are ignored.
    #[clap(long, default_value = DEFAULT_INGRESS_CLASS, env = "CONTOUR_INGRESS_CLASS")]
    ingress_class: String,

    /// Comma-separated namespaces in which root routing resources may be declared.
    ///
    /// By default roots are permitted in every namespace.
    #[clap(long, value_delimiter = ',')]
    root_namespaces: Vec<String>,

    /// How long to wait after a change before rebuilding, so that bursts of events are
    /// coalesced.
    #[clap(long, default_value = "100")]
    rebuild_holdoff_ms: u64,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            admin,
            client,
            log_level,
            log_format,
            ingress_class,
            root_namespaces,
            rebuild_holdoff_ms,
        } = self;

        let mut prom = <Registry>::default();
        let index_reg = prom.sub_registry_with_prefix("index");
        let metrics = IndexMetrics::register(index_reg);
        let cache = SharedCache::new(KubernetesCache::new(Some(ingress_class), root_namespaces))
            .with_metrics(metrics);
        index::metrics::register_cache_size(index_reg, cache.clone());
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let mut runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        let signal = Arc::new(Notify::new());

        // Spawn resource watches.

        if api_resource_exists::<k8s::ingress::v1beta1::Ingress>(&runtime.client()).await {
            let ingresses =
                runtime.watch_all::<k8s::ingress::v1beta1::Ingress>(watcher::Config::default());
            tokio::spawn(
                watch::index(cache.clone(), signal.clone(), ingresses)
                    .instrument(info_span!("ingresses.networking.k8s.io")),
            );
        } else {
            tracing::warn!("ingresses.networking.k8s.io/v1beta1 resource kind not found, skipping watches");
        }

        if api_resource_exists::<k8s::ingress::extensions::Ingress>(&runtime.client()).await {
            let ingresses =
                runtime.watch_all::<k8s::ingress::extensions::Ingress>(watcher::Config::default());
            tokio::spawn(
                watch::index(cache.clone(), signal.clone(), ingresses)
                    .instrument(info_span!("ingresses.extensions")),
            );
        } else {
            tracing::debug!("ingresses.extensions resource kind not found, skipping watches");
        }

        if api_resource_exists::<k8s::IngressRoute>(&runtime.client()).await {
            let ingressroutes = runtime.watch_all::<k8s::IngressRoute>(watcher::Config::default());
            tokio::spawn(
                watch::index(cache.clone(), signal.clone(), ingressroutes)
                    .instrument(info_span!("ingressroutes.contour.heptio.com")),
            );
        } else {
            tracing::warn!(
                "ingressroutes.contour.heptio.com resource kind not found, skipping watches"
            );
        }

        if api_resource_exists::<k8s::delegation::v1beta1::TlsCertificateDelegation>(
            &runtime.client(),
        )
        .await
        {
            let delegations = runtime
                .watch_all::<k8s::delegation::v1beta1::TlsCertificateDelegation>(
                    watcher::Config::default(),
                );
            tokio::spawn(
                watch::index(cache.clone(), signal.clone(), delegations)
                    .instrument(info_span!("tlscertificatedelegations.contour.heptio.com")),
            );
        } else {
            tracing::warn!(
                "tlscertificatedelegations.contour.heptio.com resource kind not found, skipping watches"
            );
        }

        let proxies = runtime.watch_all::<k8s::HttpProxy>(watcher::Config::default());
        tokio::spawn(
            watch::index(cache.clone(), signal.clone(), proxies)
                .instrument(info_span!("httpproxies")),
        );

        let delegations = runtime
            .watch_all::<k8s::delegation::v1::TlsCertificateDelegation>(watcher::Config::default());
        tokio::spawn(
            watch::index(cache.clone(), signal.clone(), delegations)
                .instrument(info_span!("tlscertificatedelegations")),
        );

        let secrets = runtime.watch_all::<k8s::Secret>(watcher::Config::default());
        tokio::spawn(
            watch::index(cache.clone(), signal.clone(), secrets).instrument(info_span!("secrets")),
        );

        let services = runtime.watch_all::<k8s::Service>(watcher::Config::default());
        tokio::spawn(
            watch::index(cache.clone(), signal.clone(), services)
                .instrument(info_span!("services")),
        );

        // Rebuild the routing graph whenever a watch reports a relevant change. Proxies are
        // configured from the published graph by a separate server.
        let (dag_tx, _dag_rx) = channel::channel(Default::default());
        tokio::spawn(
            rebuild::run(
                cache,
                signal,
                Duration::from_millis(rebuild_holdoff_ms),
                dag_tx,
            )
            .instrument(info_span!("rebuild")),
        );

        // Block the main thread on the shutdown signal. Once it fires, wait for the background tasks to
        // complete before exiting.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}

async fn api_resource_exists<T>(client: &Client) -> bool
where
    T: Resource,
    T::DynamicType: Default,
{
    let dt = Default::default();
    client
        .list_api_group_resources(&T::api_version(&dt))
        .await
        .ok()
        .iter()
        .flat_map(|r| r.resources.iter())
        .any(|r| r.kind == T::kind(&dt))
}
