//! One canonical form for both generations of the routing resource.
//!
//! HTTPProxy specs are stored as-is. IngressRoute specs are adapted into the HTTPProxy shape
//! when they enter the cache, so that every rule downstream is written once.

use crate::meta::Meta;
use ingress_controller_core::{ResourceId, ResourceKind};
use ingress_controller_k8s_api::{
    self as k8s,
    httpproxy::{
        self, HttpProxySpec, Include, LoadBalancerPolicy, MatchCondition, PathRewritePolicy,
        ReplacePrefix, TcpProxyInclude,
    },
    ingressroute,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingResource {
    /// The generation this resource was written in.
    ///
    /// IngressRoute delegation uses absolute paths, so the include walk needs to know which
    /// semantics apply.
    pub kind: ResourceKind,
    pub meta: Meta,
    pub spec: HttpProxySpec,
}

// === impl RoutingResource ===

impl RoutingResource {
    pub fn from_httpproxy(proxy: &k8s::HttpProxy) -> Self {
        Self {
            kind: ResourceKind::HttpProxy,
            meta: Meta::from_resource(proxy),
            spec: proxy.spec.clone(),
        }
    }

    pub fn from_ingressroute(route: &k8s::IngressRoute) -> Self {
        let mut spec = HttpProxySpec {
            virtual_host: route.spec.virtual_host.clone(),
            tcp_proxy: route.spec.tcp_proxy.as_ref().map(adapt_tcp_proxy),
            ..Default::default()
        };
        for r in &route.spec.routes {
            match &r.delegate {
                Some(delegate) => spec.includes.push(Include {
                    name: delegate.name.clone(),
                    namespace: delegate.namespace.clone(),
                    conditions: vec![MatchCondition::prefix(&r.prefix)],
                }),
                None => spec.routes.push(adapt_route(r)),
            }
        }
        Self {
            kind: ResourceKind::IngressRoute,
            meta: Meta::from_resource(route),
            spec,
        }
    }

    /// Roots declare a virtual host; everything else is a fragment.
    pub fn is_root(&self) -> bool {
        self.spec.virtual_host.is_some()
    }

    pub fn id(&self) -> ResourceId {
        ResourceId::new(self.kind, &self.meta.namespace, &self.meta.name)
    }

    pub fn tls(&self) -> Option<&httpproxy::Tls> {
        self.spec.virtual_host.as_ref()?.tls.as_ref()
    }

    /// Every service named by a route or the TCP proxy.
    pub fn services(&self) -> impl Iterator<Item = &httpproxy::Service> {
        let routes = self.spec.routes.iter().flat_map(|r| r.services.iter());
        let tcp = self.spec.tcp_proxy.iter().flat_map(|t| t.services.iter());
        routes.chain(tcp)
    }
}

fn adapt_route(route: &ingressroute::Route) -> httpproxy::Route {
    // IngressRoute configures health checks and balancing per service; the first service that
    // sets one decides for the route.
    let health_check_policy = route
        .services
        .iter()
        .find_map(|s| s.health_check.clone());
    let load_balancer_policy = route
        .services
        .iter()
        .find_map(|s| s.strategy.clone())
        .map(|strategy| LoadBalancerPolicy {
            strategy: Some(strategy),
        });
    let path_rewrite_policy = route
        .prefix_rewrite
        .as_ref()
        .map(|replacement| PathRewritePolicy {
            replace_prefix: vec![ReplacePrefix {
                prefix: None,
                replacement: replacement.clone(),
            }],
        });

    httpproxy::Route {
        conditions: vec![MatchCondition::prefix(&route.prefix)],
        services: route.services.iter().map(adapt_service).collect(),
        enable_websockets: route.enable_websockets,
        permit_insecure: route.permit_insecure,
        timeout_policy: route.timeout_policy.clone(),
        retry_policy: route.retry_policy.clone(),
        health_check_policy,
        load_balancer_policy,
        path_rewrite_policy,
        request_headers_policy: None,
        response_headers_policy: None,
    }
}

fn adapt_tcp_proxy(tcp: &ingressroute::TcpProxy) -> httpproxy::TcpProxy {
    httpproxy::TcpProxy {
        load_balancer_policy: tcp
            .services
            .iter()
            .find_map(|s| s.strategy.clone())
            .map(|strategy| LoadBalancerPolicy {
                strategy: Some(strategy),
            }),
        services: tcp.services.iter().map(adapt_service).collect(),
        include: tcp.delegate.as_ref().map(|d| TcpProxyInclude {
            name: d.name.clone(),
            namespace: d.namespace.clone(),
        }),
        includes_deprecated: None,
        health_check_policy: None,
    }
}

fn adapt_service(svc: &ingressroute::Service) -> httpproxy::Service {
    httpproxy::Service {
        name: svc.name.clone(),
        port: svc.port,
        weight: svc.weight,
        upstream_validation: svc.upstream_validation.clone(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingress_controller_k8s_api::{httpproxy::VirtualHost, ObjectMeta};
    use pretty_assertions::assert_eq;

    fn mk_ingressroute(spec: ingressroute::IngressRouteSpec) -> k8s::IngressRoute {
        k8s::IngressRoute {
            metadata: ObjectMeta {
                namespace: Some("default".to_string()),
                name: Some("example".to_string()),
                ..Default::default()
            },
            spec,
        }
    }

    #[test]
    fn delegating_routes_become_includes() {
        let ir = mk_ingressroute(ingressroute::IngressRouteSpec {
            virtual_host: Some(VirtualHost {
                fqdn: "example.com".to_string(),
                tls: None,
            }),
            routes: vec![
                ingressroute::Route {
                    prefix: "/".to_string(),
                    services: vec![ingressroute::Service {
                        name: "home".to_string(),
                        port: 80,
                        strategy: Some("Random".to_string()),
                        ..Default::default()
                    }],
                    prefix_rewrite: Some("/app".to_string()),
                    ..Default::default()
                },
                ingressroute::Route {
                    prefix: "/blog".to_string(),
                    delegate: Some(ingressroute::Delegate {
                        name: "blog".to_string(),
                        namespace: Some("marketing".to_string()),
                    }),
                    ..Default::default()
                },
            ],
            tcp_proxy: None,
        });

        let rr = RoutingResource::from_ingressroute(&ir);
        assert_eq!(rr.kind, ResourceKind::IngressRoute);
        assert!(rr.is_root());
        assert_eq!(
            rr.spec.includes,
            vec![Include {
                name: "blog".to_string(),
                namespace: Some("marketing".to_string()),
                conditions: vec![MatchCondition::prefix("/blog")],
            }]
        );

        assert_eq!(rr.spec.routes.len(), 1);
        let route = &rr.spec.routes[0];
        assert_eq!(route.conditions, vec![MatchCondition::prefix("/")]);
        assert_eq!(route.services[0].name, "home");
        assert_eq!(
            route.load_balancer_policy,
            Some(LoadBalancerPolicy {
                strategy: Some("Random".to_string())
            })
        );
        assert_eq!(
            route.path_rewrite_policy,
            Some(PathRewritePolicy {
                replace_prefix: vec![ReplacePrefix {
                    prefix: None,
                    replacement: "/app".to_string(),
                }],
            })
        );
    }

    #[test]
    fn tcpproxy_delegate_becomes_include() {
        let ir = mk_ingressroute(ingressroute::IngressRouteSpec {
            tcp_proxy: Some(ingressroute::TcpProxy {
                services: vec![],
                delegate: Some(ingressroute::Delegate {
                    name: "backend".to_string(),
                    namespace: None,
                }),
            }),
            ..Default::default()
        });

        let rr = RoutingResource::from_ingressroute(&ir);
        assert!(!rr.is_root());
        let tcp = rr.spec.tcp_proxy.expect("tcpproxy must be adapted");
        assert_eq!(
            tcp.include(),
            Some(&TcpProxyInclude {
                name: "backend".to_string(),
                namespace: None,
            })
        );
    }
}
