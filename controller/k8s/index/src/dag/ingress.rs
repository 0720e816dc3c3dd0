use super::{Builder, PortRef};
use crate::meta::Meta;
use ingress_controller_core::{Cluster, Route};
use ingress_controller_k8s_api::{ingress::v1beta1, ResourceExt};

/// Ingresses annotated with this redirect plain HTTP requests on TLS hosts to HTTPS.
const FORCE_SSL_REDIRECT: &str = "ingress.kubernetes.io/force-ssl-redirect";

/// The virtual host for rules without a host.
const ANY_HOST: &str = "*";

// === impl Builder ===

impl Builder {
    pub(super) fn build_ingresses(&mut self) {
        let mut ingresses = self
            .cache
            .ingresses()
            .map(|ing| (Meta::from_resource(ing), ing.clone()))
            .collect::<Vec<_>>();
        ingresses.sort_by(|(a, _), (b, _)| a.cmp(b));

        // Secure hosts must exist before any Ingress adds routes to them.
        for (meta, ing) in &ingresses {
            self.build_ingress_tls(meta, ing);
        }
        for (meta, ing) in &ingresses {
            self.build_ingress_routes(meta, ing);
        }
    }

    fn build_ingress_tls(&mut self, meta: &Meta, ing: &v1beta1::Ingress) {
        for tls in &ing.spec.tls {
            if tls.secret_name.is_empty() {
                continue;
            }
            let secret = match self.lookup_tls_secret(&meta.namespace, &tls.secret_name) {
                Ok(secret) => secret,
                Err(error) => {
                    tracing::debug!(ingress = %meta, %error, "Skipping TLS hosts");
                    continue;
                }
            };
            for host in &tls.hosts {
                self.dag.ensure_secure_virtual_host(host).secret = Some(secret.clone());
            }
        }
    }

    fn build_ingress_routes(&mut self, meta: &Meta, ing: &v1beta1::Ingress) {
        let https_upgrade = ing
            .annotations()
            .get(FORCE_SSL_REDIRECT)
            .is_some_and(|v| v == "true");

        if let Some(backend) = &ing.spec.backend {
            if let Some(route) = self.ingress_route(meta, "/", backend) {
                self.dag.ensure_virtual_host(ANY_HOST).add_route(route);
            }
        }

        for rule in &ing.spec.rules {
            let host = rule.host.as_deref().filter(|h| !h.is_empty()).unwrap_or(ANY_HOST);
            let paths = rule.http.iter().flat_map(|http| http.paths.iter());
            for path in paths {
                let prefix = path.path.as_deref().filter(|p| !p.is_empty()).unwrap_or("/");
                let Some(route) = self.ingress_route(meta, prefix, &path.backend) else {
                    continue;
                };

                let secure = self
                    .dag
                    .secure_virtual_hosts
                    .get_mut(host)
                    .filter(|s| s.secret.is_some());
                let secured = match secure {
                    Some(secure) => {
                        secure.virtual_host.add_route(route.clone());
                        true
                    }
                    None => false,
                };
                self.dag.ensure_virtual_host(host).add_route(Route {
                    https_upgrade: https_upgrade && secured,
                    ..route
                });
            }
        }
    }

    fn ingress_route(
        &self,
        meta: &Meta,
        prefix: &str,
        backend: &v1beta1::IngressBackend,
    ) -> Option<Route> {
        let upstream = match self.lookup_service(
            &meta.namespace,
            &backend.service_name,
            PortRef::from(&backend.service_port),
        ) {
            Ok(svc) => svc,
            Err(error) => {
                tracing::debug!(ingress = %meta, %error, "Skipping backend");
                return None;
            }
        };
        let mut route = Route::new(prefix);
        route.clusters.push(Cluster::new(upstream));
        Some(route)
    }
}
