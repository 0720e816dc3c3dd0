#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! The routing graph handed to a proxy configuration emitter.
//!
//! ```text
//! [ VirtualHost ] -> [ Route ] -> [ Cluster ] -> [ Service ]
//! [ SecureVirtualHost ] -> [ TcpProxy ] -> [ Cluster ] -> [ Service ]
//! ```
//!
//! None of these types know about Kubernetes. They are produced by a synthesis step that walks a
//! snapshot of the resource cache.

pub mod duration;
pub mod route;
pub mod tls;
pub mod upstream;

pub use self::{
    route::{
        HeaderCondition, HeaderMatch, HeadersPolicy, RetryPolicy, Route, RouteKey, Timeout,
        TimeoutPolicy,
    },
    tls::{CaBundle, TlsSecret, TlsVersion},
    upstream::{
        Cluster, HttpHealthCheck, LoadBalancerStrategy, PeerValidation, Protocol, Service,
        TcpHealthCheck, TcpProxy,
    },
};
use std::collections::BTreeMap;

/// A complete routing graph. Hosts are keyed by fully qualified domain name; `*` is the
/// catch-all host used by Ingress rules without a host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dag {
    pub virtual_hosts: BTreeMap<String, VirtualHost>,
    pub secure_virtual_hosts: BTreeMap<String, SecureVirtualHost>,
    pub statuses: BTreeMap<ResourceId, Status>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VirtualHost {
    pub name: String,
    pub routes: BTreeMap<RouteKey, Route>,
}

/// A virtual host served over TLS.
///
/// A passthrough host has a TCP proxy and no secret; the TLS session is forwarded to the
/// upstream untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecureVirtualHost {
    pub virtual_host: VirtualHost,
    pub secret: Option<TlsSecret>,
    pub minimum_protocol_version: TlsVersion,
    pub tcp_proxy: Option<TcpProxy>,
    pub client_validation: Option<CaBundle>,
    pub fallback_certificate: bool,
}

/// Identifies the resource a status is reported for.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    IngressRoute,
    HttpProxy,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Valid,
    Invalid(String),

    /// A fragment that no valid root includes.
    Orphaned,
}

// === impl Dag ===

impl Dag {
    pub fn virtual_host(&self, fqdn: &str) -> Option<&VirtualHost> {
        self.virtual_hosts.get(fqdn)
    }

    pub fn secure_virtual_host(&self, fqdn: &str) -> Option<&SecureVirtualHost> {
        self.secure_virtual_hosts.get(fqdn)
    }

    pub fn status(&self, id: &ResourceId) -> Option<&Status> {
        self.statuses.get(id)
    }

    pub fn ensure_virtual_host(&mut self, fqdn: &str) -> &mut VirtualHost {
        self.virtual_hosts
            .entry(fqdn.to_string())
            .or_insert_with(|| VirtualHost::new(fqdn))
    }

    pub fn ensure_secure_virtual_host(&mut self, fqdn: &str) -> &mut SecureVirtualHost {
        self.secure_virtual_hosts
            .entry(fqdn.to_string())
            .or_insert_with(|| SecureVirtualHost {
                virtual_host: VirtualHost::new(fqdn),
                ..Default::default()
            })
    }

    /// Records a status, keeping an earlier `Invalid` over anything that follows it.
    pub fn set_status(&mut self, id: ResourceId, status: Status) {
        match self.statuses.get(&id) {
            Some(Status::Invalid(_)) => {}
            _ => {
                self.statuses.insert(id, status);
            }
        }
    }
}

// === impl VirtualHost ===

impl VirtualHost {
    pub fn new(name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            routes: BTreeMap::new(),
        }
    }

    /// Adds a route, replacing any route with identical match conditions.
    pub fn add_route(&mut self, route: Route) {
        self.routes.insert(route.key(), route);
    }

    pub fn route(&self, prefix: &str) -> Option<&Route> {
        self.routes
            .values()
            .find(|r| r.prefix == prefix && r.header_conditions.is_empty())
    }
}

// === impl SecureVirtualHost ===

impl SecureVirtualHost {
    pub fn is_passthrough(&self) -> bool {
        self.secret.is_none() && self.tcp_proxy.is_some()
    }
}

// === impl ResourceId ===

impl ResourceId {
    pub fn new(kind: ResourceKind, namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {}/{}", self.kind, self.namespace, self.name)
    }
}

// === impl Status ===

impl Status {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}
