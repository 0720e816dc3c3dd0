//! Decides whether a changed object can affect the routing graph.
//!
//! Every evaluation is a linear scan of the cached Ingresses and routing resources.
//! TODO: keep a reverse index from referenced object to referencing roots once large clusters
//! make these scans show up.

use crate::{
    cache::KubernetesCache,
    delegation::Delegations,
    meta::Meta,
    object::KubernetesObject,
    secret::{self, SecretRef},
};
use ingress_controller_k8s_api::{self as k8s, ResourceExt};

// === impl KubernetesCache ===

impl KubernetesCache {
    /// True if a rebuild is warranted after `obj` changed. Objects of unsupported kinds never
    /// warrant one.
    pub fn triggers_rebuild(&self, obj: &KubernetesObject) -> bool {
        match obj {
            KubernetesObject::Secret(secret) => self.secret_triggers_rebuild(secret),
            KubernetesObject::Service(svc) => self.service_triggers_rebuild(svc),
            KubernetesObject::Ingress(_)
            | KubernetesObject::ExtensionsIngress(_)
            | KubernetesObject::IngressRoute(_)
            | KubernetesObject::HttpProxy(_)
            | KubernetesObject::IngressRouteDelegation(_)
            | KubernetesObject::HttpProxyDelegation(_) => true,
            KubernetesObject::Unknown(_) => false,
        }
    }

    /// True if an Ingress or routing resource in the service's namespace names it.
    ///
    /// Services are never referenced across namespaces.
    pub fn service_triggers_rebuild(&self, service: &k8s::Service) -> bool {
        let svc = Meta::from_resource(service);

        let by_ingress = self
            .ingresses()
            .filter(|ing| ing.namespace().as_deref() == Some(svc.namespace.as_str()))
            .any(|ing| {
                let spec = &ing.spec;
                let default = spec.backend.iter();
                let paths = spec
                    .rules
                    .iter()
                    .filter_map(|r| r.http.as_ref())
                    .flat_map(|http| http.paths.iter().map(|p| &p.backend));
                default.chain(paths).any(|b| b.service_name == svc.name)
            });
        if by_ingress {
            tracing::trace!(service = %svc, "Service is referenced by an Ingress");
            return true;
        }

        let by_routing = self
            .routing_resources()
            .filter(|rr| rr.meta.namespace == svc.namespace)
            .any(|rr| rr.services().any(|s| s.name == svc.name));
        tracing::trace!(service = %svc, referenced = by_routing);
        by_routing
    }

    /// True if the secret is a CA bundle, or a server certificate that some Ingress or root
    /// routing resource references, directly or through a delegation grant.
    ///
    /// CA bundles always trigger: their references hang off per-service validation policies,
    /// and finding them is the same walk a rebuild performs.
    pub fn secret_triggers_rebuild(&self, secret: &k8s::Secret) -> bool {
        let meta = Meta::from_resource(secret);
        if secret::is_ca_bundle(secret) {
            tracing::trace!(secret = %meta, "CA bundle changed");
            return true;
        }

        let delegations = Delegations::from_cache(self);
        let references = |namespace: &str, name: &str| {
            references_secret(&delegations, &meta, namespace, name)
        };

        let by_ingress = self.ingresses().any(|ing| {
            let ns = ing.namespace().unwrap_or_default();
            ing.spec.tls.iter().any(|tls| references(&ns, &tls.secret_name))
        });
        if by_ingress {
            tracing::trace!(secret = %meta, "Secret is referenced by an Ingress");
            return true;
        }

        let by_root = self.routing_resources().any(|rr| {
            rr.tls()
                .is_some_and(|tls| references(&rr.meta.namespace, &tls.secret_name))
        });
        tracing::trace!(secret = %meta, referenced = by_root);
        by_root
    }
}

/// Checks, in order: a reference within the secret's namespace, a reference delegated to the
/// referencing namespace, and a reference delegated to all namespaces.
fn references_secret(
    delegations: &Delegations,
    secret: &Meta,
    namespace: &str,
    reference: &str,
) -> bool {
    if reference.is_empty() {
        return false;
    }
    let reference = SecretRef::parse(namespace, reference);
    if !reference.refers_to(secret) {
        return false;
    }
    if namespace == secret.namespace {
        return true;
    }
    if delegations.is_delegated_to(secret, namespace) {
        return true;
    }
    delegations.is_delegated_to_all(secret)
}
