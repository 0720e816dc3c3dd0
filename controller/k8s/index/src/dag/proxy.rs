use super::{conditions::Conditions, policy, Builder, Error};
use crate::{meta::Meta, routing::RoutingResource};
use ahash::AHashMap as HashMap;
use ingress_controller_core::{
    LoadBalancerStrategy, ResourceId, Route, SecureVirtualHost, Status, TcpProxy, TlsVersion,
    VirtualHost,
};
use ingress_controller_k8s_api::httpproxy;

/// Everything a valid root adds to the graph.
#[derive(Debug)]
struct Contribution {
    fqdn: String,
    secure: Option<SecureVirtualHost>,
    tcp_proxy: Option<TcpProxy>,

    /// Each route with its `permitInsecure` setting.
    routes: Vec<(Route, bool)>,

    /// Statuses for the fragments the root reached.
    statuses: Vec<(ResourceId, Status)>,
}

/// State carried through a depth-first walk of a root's includes.
#[derive(Debug, Default)]
struct Walk {
    routes: Vec<(Route, bool)>,
    statuses: Vec<(ResourceId, Status)>,

    /// The resources between the root and the current position, inclusive.
    path: Vec<Meta>,
}

// === impl Builder ===

impl Builder {
    pub(super) fn build_routing_resources(&mut self) {
        let mut roots = self
            .cache
            .routing_resources()
            .filter(|rr| rr.is_root())
            .cloned()
            .collect::<Vec<_>>();
        roots.sort_by_key(|rr| rr.id());

        let mut candidates = Vec::with_capacity(roots.len());
        let mut claims = HashMap::<String, Vec<ResourceId>>::default();
        for root in roots {
            if !self.cache.permits_root(&root.meta.namespace) {
                let error = Error::RootNamespaceNotPermitted(root.meta.namespace.clone());
                self.invalidate(&root, error);
                continue;
            }
            let fqdn = fqdn(&root);
            if fqdn.is_empty() {
                self.invalidate(&root, Error::EmptyFqdn);
                continue;
            }
            claims.entry(fqdn).or_default().push(root.id());
            candidates.push(root);
        }

        for root in candidates {
            let fqdn = fqdn(&root);
            if let Some(claimants) = claims.get(&fqdn).filter(|c| c.len() > 1) {
                let roots = claimants
                    .iter()
                    .map(|id| format!("{}/{}", id.namespace, id.name))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.invalidate(&root, Error::DuplicateFqdn { fqdn, roots });
                continue;
            }

            match self.walk_root(&root) {
                Ok(contribution) => {
                    tracing::debug!(root = %root.id(), fqdn = %contribution.fqdn, "Accepted root");
                    self.dag.set_status(root.id(), Status::Valid);
                    self.commit(contribution);
                }
                Err(error) => self.invalidate(&root, error),
            }
        }

        for rr in self.cache.routing_resources().filter(|rr| !rr.is_root()) {
            let id = rr.id();
            if self.dag.status(&id).is_none() {
                tracing::debug!(fragment = %id, "Orphaned");
                self.dag.set_status(id, Status::Orphaned);
            }
        }
    }

    fn invalidate(&mut self, rr: &RoutingResource, error: Error) {
        tracing::debug!(resource = %rr.id(), %error, "Invalid");
        self.dag.set_status(rr.id(), Status::Invalid(error.to_string()));
    }

    fn walk_root(&self, root: &RoutingResource) -> Result<Contribution, Error> {
        let fqdn = fqdn(root);
        let tls = root.tls();
        let secure = tls
            .map(|tls| self.secure_virtual_host(root, &fqdn, tls))
            .transpose()?;
        let passthrough = tls.is_some_and(|tls| tls.passthrough);

        if let Some(tcp) = &root.spec.tcp_proxy {
            if secure.is_none() {
                return Err(Error::TcpProxyWithoutTls);
            }
            let (tcp_proxy, statuses) = self.tcp_proxy(root, tcp)?;
            return Ok(Contribution {
                fqdn,
                secure,
                tcp_proxy: Some(tcp_proxy),
                routes: vec![],
                statuses,
            });
        }
        if passthrough {
            return Err(Error::PassthroughWithoutTcpProxy);
        }

        let mut walk = Walk::default();
        self.walk(root, &Conditions::default(), &mut walk)?;
        Ok(Contribution {
            fqdn,
            secure,
            tcp_proxy: None,
            routes: walk.routes,
            statuses: walk.statuses,
        })
    }

    fn secure_virtual_host(
        &self,
        root: &RoutingResource,
        fqdn: &str,
        tls: &httpproxy::Tls,
    ) -> Result<SecureVirtualHost, Error> {
        let namespace = &root.meta.namespace;
        let secret = match (tls.secret_name.is_empty(), tls.passthrough) {
            (false, true) => return Err(Error::SecretAndPassthrough),
            (true, false) => return Err(Error::NoSecretOrPassthrough),
            (true, true) => None,
            (false, false) => Some(self.lookup_tls_secret(namespace, &tls.secret_name)?),
        };

        let client_validation = match &tls.client_validation {
            Some(_) if tls.passthrough => return Err(Error::ClientValidationWithPassthrough),
            Some(v) => Some(self.lookup_ca_bundle(namespace, &v.ca_certificate)?),
            None => None,
        };
        if tls.enable_fallback_certificate && client_validation.is_some() {
            return Err(Error::FallbackWithClientValidation);
        }

        Ok(SecureVirtualHost {
            virtual_host: VirtualHost::new(fqdn),
            secret,
            minimum_protocol_version: TlsVersion::parse_or_default(
                tls.minimum_protocol_version.as_deref(),
            )?,
            tcp_proxy: None,
            client_validation,
            fallback_certificate: tls.enable_fallback_certificate,
        })
    }

    /// Collects `rr`'s routes and descends into its includes.
    ///
    /// Returns an error when the root must be rejected. A fragment with invalid routes is
    /// marked invalid and contributes nothing, but does not fail its root.
    fn walk(
        &self,
        rr: &RoutingResource,
        conditions: &Conditions,
        walk: &mut Walk,
    ) -> Result<(), Error> {
        walk.path.push(rr.meta.clone());

        let routes = rr
            .spec
            .routes
            .iter()
            .map(|route| {
                let conditions = conditions.merge(rr.kind, &route.conditions)?;
                let built = self.route(&rr.meta.namespace, route, &conditions)?;
                Ok((built, route.permit_insecure))
            })
            .collect::<Result<Vec<_>, Error>>();
        match routes {
            Ok(routes) => {
                walk.routes.extend(routes);
                if !rr.is_root() {
                    walk.statuses.push((rr.id(), Status::Valid));
                }
            }
            Err(error) if rr.is_root() => return Err(error),
            Err(error) => {
                tracing::debug!(fragment = %rr.id(), %error, "Invalid");
                walk.statuses
                    .push((rr.id(), Status::Invalid(error.to_string())));
            }
        }

        for include in &rr.spec.includes {
            let conditions = conditions.merge(rr.kind, &include.conditions)?;
            let target = Meta::new(
                include.namespace.as_deref().unwrap_or(&rr.meta.namespace),
                &include.name,
            );
            let child = self
                .cache
                .routing_resource(rr.kind, &target)
                .ok_or_else(|| Error::IncludeNotFound(target.clone()))?;
            if child.is_root() {
                return Err(Error::IncludeRoot(target));
            }
            if walk.path.contains(&target) {
                return Err(Error::IncludeCycle(target));
            }
            self.walk(child, &conditions, walk)?;
        }

        walk.path.pop();
        Ok(())
    }

    /// Builds a root's TCP proxy, either from its own services or from exactly one level of
    /// include.
    fn tcp_proxy(
        &self,
        root: &RoutingResource,
        tcp: &httpproxy::TcpProxy,
    ) -> Result<(TcpProxy, Vec<(ResourceId, Status)>), Error> {
        let (owner, tcp) = match tcp.include() {
            None => (root, tcp),
            Some(_) if !tcp.services.is_empty() => {
                return Err(Error::TcpProxyServicesAndInclude);
            }
            Some(include) => {
                let target = Meta::new(
                    include.namespace.as_deref().unwrap_or(&root.meta.namespace),
                    &include.name,
                );
                let child = self
                    .cache
                    .routing_resource(root.kind, &target)
                    .ok_or_else(|| Error::TcpProxyIncludeNotFound(target.clone()))?;
                let child_tcp = child
                    .spec
                    .tcp_proxy
                    .as_ref()
                    .ok_or_else(|| Error::TcpProxyIncludeEmpty(target.clone()))?;
                if child_tcp.include().is_some() {
                    return Err(Error::TcpProxyNestedInclude(target));
                }
                (child, child_tcp)
            }
        };
        if tcp.services.is_empty() {
            return Err(Error::TcpProxyWithoutServices);
        }

        let load_balancer = LoadBalancerStrategy::from_name(
            tcp.load_balancer_policy
                .as_ref()
                .and_then(|p| p.strategy.as_deref()),
        );
        let clusters = tcp
            .services
            .iter()
            .map(|svc| {
                let mut cluster = self.cluster(&owner.meta.namespace, svc)?;
                cluster.load_balancer = load_balancer;
                Ok(cluster)
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let statuses = if owner.is_root() {
            vec![]
        } else {
            vec![(owner.id(), Status::Valid)]
        };
        let tcp_proxy = TcpProxy {
            clusters,
            load_balancer,
            health_check: tcp.health_check_policy.as_ref().map(policy::tcp_health_check),
        };
        Ok((tcp_proxy, statuses))
    }

    fn commit(&mut self, contribution: Contribution) {
        let Contribution {
            fqdn,
            secure,
            tcp_proxy,
            routes,
            statuses,
        } = contribution;

        for (id, status) in statuses {
            self.dag.set_status(id, status);
        }

        let Some(secure) = secure else {
            let vhost = self.dag.ensure_virtual_host(&fqdn);
            for (route, _) in routes {
                vhost.add_route(route);
            }
            return;
        };

        let svh = self.dag.ensure_secure_virtual_host(&fqdn);
        svh.secret = secure.secret;
        svh.minimum_protocol_version = secure.minimum_protocol_version;
        svh.client_validation = secure.client_validation;
        svh.fallback_certificate = secure.fallback_certificate;
        svh.tcp_proxy = tcp_proxy;
        for (route, _) in &routes {
            svh.virtual_host.add_route(route.clone());
        }

        if routes.is_empty() {
            return;
        }
        let vhost = self.dag.ensure_virtual_host(&fqdn);
        for (route, permit_insecure) in routes {
            vhost.add_route(Route {
                https_upgrade: !permit_insecure,
                ..route
            });
        }
    }
}

/// Host names are case insensitive.
fn fqdn(rr: &RoutingResource) -> String {
    rr.spec
        .virtual_host
        .as_ref()
        .map(|vh| vh.fqdn.trim().to_ascii_lowercase())
        .unwrap_or_default()
}
