use crate::{
    ingress_class::{self, DEFAULT_INGRESS_CLASS},
    legacy,
    meta::Meta,
    object::{Kind, KubernetesObject},
    routing::RoutingResource,
};
use ahash::AHashMap as HashMap;
use ingress_controller_core::ResourceKind;
use ingress_controller_k8s_api::{
    self as k8s,
    delegation::{self, CertificateDelegation},
    ingress::v1beta1,
    ObjectMeta,
};
use std::sync::Arc;

/// Holds the latest version of every object that may contribute to the routing graph.
///
/// Values are reference counted so that cloning the cache produces a cheap, point-in-time
/// snapshot.
#[derive(Clone, Debug)]
pub struct KubernetesCache {
    ingress_class: String,

    /// Namespaces permitted to hold root routing resources. Empty permits every namespace.
    root_namespaces: Vec<String>,

    ingresses: HashMap<Meta, Arc<v1beta1::Ingress>>,
    ingressroutes: HashMap<Meta, Arc<RoutingResource>>,
    httpproxies: HashMap<Meta, Arc<RoutingResource>>,
    secrets: HashMap<Meta, Arc<k8s::Secret>>,
    services: HashMap<Meta, Arc<k8s::Service>>,
    ingressroute_delegations: HashMap<Meta, Arc<delegation::v1beta1::TlsCertificateDelegation>>,
    httpproxy_delegations: HashMap<Meta, Arc<delegation::v1::TlsCertificateDelegation>>,
}

/// The outcome of [`KubernetesCache::apply`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Applied {
    Stored,
    Rejected,
    /// Rejected, and a previously stored version was removed.
    Evicted,
}

// === impl KubernetesCache ===

impl KubernetesCache {
    /// An absent or empty ingress class uses [`DEFAULT_INGRESS_CLASS`].
    pub fn new(ingress_class: Option<String>, root_namespaces: Vec<String>) -> Self {
        let ingress_class = ingress_class
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_INGRESS_CLASS.to_string());
        Self {
            ingress_class,
            root_namespaces,
            ingresses: HashMap::default(),
            ingressroutes: HashMap::default(),
            httpproxies: HashMap::default(),
            secrets: HashMap::default(),
            services: HashMap::default(),
            ingressroute_delegations: HashMap::default(),
            httpproxy_delegations: HashMap::default(),
        }
    }

    /// Stores an object, returning true if it was accepted.
    ///
    /// Ingresses and routing resources annotated for another ingress class are rejected, as are
    /// objects of unsupported kinds.
    pub fn insert(&mut self, obj: KubernetesObject) -> bool {
        self.apply(obj) == Applied::Stored
    }

    /// Stores an object, reporting whether a rejected object evicted a previously admitted
    /// version of itself.
    ///
    /// An Ingress or routing resource that moves to another ingress class is no longer ours,
    /// so whatever was stored under its key is dropped.
    pub(crate) fn apply(&mut self, obj: KubernetesObject) -> Applied {
        match obj {
            KubernetesObject::Ingress(ing) => {
                let meta = Meta::from_resource(&ing);
                if !self.admits(Kind::Ingress, &ing.metadata) {
                    return evict(&mut self.ingresses, &meta);
                }
                self.ingresses.insert(meta, Arc::new(ing));
                Applied::Stored
            }

            KubernetesObject::ExtensionsIngress(ing) => {
                let meta = Meta::from_resource(&ing);
                if !self.admits(Kind::Ingress, &ing.metadata) {
                    return evict(&mut self.ingresses, &meta);
                }
                match legacy::transpose_ingress(&ing) {
                    Ok(ing) => {
                        self.ingresses.insert(meta, Arc::new(ing));
                        Applied::Stored
                    }
                    Err(error) => {
                        tracing::debug!(
                            %error,
                            ingress = %meta,
                            "Ignoring extensions/v1beta1 Ingress",
                        );
                        evict(&mut self.ingresses, &meta)
                    }
                }
            }

            KubernetesObject::IngressRoute(ir) => {
                let meta = Meta::from_resource(&ir);
                if !self.admits(Kind::IngressRoute, &ir.metadata) {
                    return evict(&mut self.ingressroutes, &meta);
                }
                let rr = RoutingResource::from_ingressroute(&ir);
                self.ingressroutes.insert(meta, Arc::new(rr));
                Applied::Stored
            }

            KubernetesObject::HttpProxy(proxy) => {
                let meta = Meta::from_resource(&proxy);
                if !self.admits(Kind::HttpProxy, &proxy.metadata) {
                    return evict(&mut self.httpproxies, &meta);
                }
                let rr = RoutingResource::from_httpproxy(&proxy);
                self.httpproxies.insert(meta, Arc::new(rr));
                Applied::Stored
            }

            KubernetesObject::Secret(secret) => {
                self.secrets
                    .insert(Meta::from_resource(&secret), Arc::new(secret));
                Applied::Stored
            }

            KubernetesObject::Service(svc) => {
                self.services.insert(Meta::from_resource(&svc), Arc::new(svc));
                Applied::Stored
            }

            KubernetesObject::IngressRouteDelegation(d) => {
                self.ingressroute_delegations
                    .insert(Meta::from_resource(&d), Arc::new(d));
                Applied::Stored
            }

            KubernetesObject::HttpProxyDelegation(d) => {
                self.httpproxy_delegations
                    .insert(Meta::from_resource(&d), Arc::new(d));
                Applied::Stored
            }

            KubernetesObject::Unknown(obj) => {
                tracing::debug!(
                    kind = obj.types.as_ref().map(|t| t.kind.as_str()).unwrap_or_default(),
                    object = %Meta::from_resource(&obj),
                    "Ignoring unsupported object",
                );
                Applied::Rejected
            }
        }
    }

    /// Evicts an object, returning true if it was present.
    ///
    /// Objects that would not have been admitted are never considered present.
    pub fn remove(&mut self, obj: &KubernetesObject) -> bool {
        let meta = obj.meta();
        match obj {
            KubernetesObject::Ingress(ing) => {
                self.admits(Kind::Ingress, &ing.metadata) && self.ingresses.remove(&meta).is_some()
            }
            KubernetesObject::ExtensionsIngress(ing) => {
                self.admits(Kind::Ingress, &ing.metadata) && self.ingresses.remove(&meta).is_some()
            }
            KubernetesObject::IngressRoute(ir) => {
                self.admits(Kind::IngressRoute, &ir.metadata)
                    && self.ingressroutes.remove(&meta).is_some()
            }
            KubernetesObject::HttpProxy(proxy) => {
                self.admits(Kind::HttpProxy, &proxy.metadata)
                    && self.httpproxies.remove(&meta).is_some()
            }
            KubernetesObject::Secret(_) => self.secrets.remove(&meta).is_some(),
            KubernetesObject::Service(_) => self.services.remove(&meta).is_some(),
            KubernetesObject::IngressRouteDelegation(_) => {
                self.ingressroute_delegations.remove(&meta).is_some()
            }
            KubernetesObject::HttpProxyDelegation(_) => {
                self.httpproxy_delegations.remove(&meta).is_some()
            }
            KubernetesObject::Unknown(_) => false,
        }
    }

    fn admits(&self, kind: Kind, meta: &ObjectMeta) -> bool {
        let admitted = ingress_class::admits(meta, &self.ingress_class);
        if !admitted {
            tracing::debug!(
                %kind,
                namespace = meta.namespace.as_deref().unwrap_or_default(),
                name = meta.name.as_deref().unwrap_or_default(),
                class = ingress_class::annotated_class(meta).unwrap_or_default(),
                "Ignoring object for another ingress class",
            );
        }
        admitted
    }

    pub fn ingress_class(&self) -> &str {
        &self.ingress_class
    }

    pub fn root_namespaces(&self) -> &[String] {
        &self.root_namespaces
    }

    /// True if roots may be declared in `namespace`.
    pub fn permits_root(&self, namespace: &str) -> bool {
        self.root_namespaces.is_empty() || self.root_namespaces.iter().any(|ns| ns == namespace)
    }

    pub fn ingresses(&self) -> impl Iterator<Item = &v1beta1::Ingress> {
        self.ingresses.values().map(|i| &**i)
    }

    pub fn ingressroutes(&self) -> impl Iterator<Item = &RoutingResource> {
        self.ingressroutes.values().map(|r| &**r)
    }

    pub fn httpproxies(&self) -> impl Iterator<Item = &RoutingResource> {
        self.httpproxies.values().map(|r| &**r)
    }

    /// Both generations of routing resource, in canonical form.
    pub fn routing_resources(&self) -> impl Iterator<Item = &RoutingResource> {
        self.ingressroutes().chain(self.httpproxies())
    }

    /// Looks up a routing resource of the given generation. Includes never cross generations.
    pub fn routing_resource(&self, kind: ResourceKind, meta: &Meta) -> Option<&RoutingResource> {
        let resources = match kind {
            ResourceKind::IngressRoute => &self.ingressroutes,
            ResourceKind::HttpProxy => &self.httpproxies,
        };
        resources.get(meta).map(|r| &**r)
    }

    pub fn secret(&self, meta: &Meta) -> Option<&k8s::Secret> {
        self.secrets.get(meta).map(|s| &**s)
    }

    pub fn service(&self, meta: &Meta) -> Option<&k8s::Service> {
        self.services.get(meta).map(|s| &**s)
    }

    /// Every delegation grant's entries keyed by the grant's identity, across both generations.
    pub fn delegations(&self) -> impl Iterator<Item = (&Meta, &[CertificateDelegation])> {
        let v1beta1 = self
            .ingressroute_delegations
            .iter()
            .map(|(m, d)| (m, d.spec.delegations.as_slice()));
        let v1 = self
            .httpproxy_delegations
            .iter()
            .map(|(m, d)| (m, d.spec.delegations.as_slice()));
        v1beta1.chain(v1)
    }

    /// The number of cached objects of a kind.
    pub fn len_of(&self, kind: Kind) -> usize {
        match kind {
            Kind::Ingress => self.ingresses.len(),
            Kind::IngressRoute => self.ingressroutes.len(),
            Kind::HttpProxy => self.httpproxies.len(),
            Kind::Secret => self.secrets.len(),
            Kind::Service => self.services.len(),
            Kind::TlsCertificateDelegation => {
                self.ingressroute_delegations.len() + self.httpproxy_delegations.len()
            }
            Kind::Unknown => 0,
        }
    }

    pub fn len(&self) -> usize {
        Kind::CACHED.iter().map(|k| self.len_of(*k)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for KubernetesCache {
    fn default() -> Self {
        Self::new(None, Vec::new())
    }
}

fn evict<T>(objects: &mut HashMap<Meta, T>, meta: &Meta) -> Applied {
    if objects.remove(meta).is_some() {
        tracing::debug!(object = %meta, "Evicted previously admitted object");
        return Applied::Evicted;
    }
    Applied::Rejected
}
