//! Synthesizes a routing graph from a cache snapshot.
//!
//! Ingresses are processed first, then every root routing resource. Each root is walked
//! depth-first through its includes; a root whose walk fails contributes nothing to the graph.
//! Fragments that no valid root reaches are reported as orphaned.

mod conditions;
mod ingress;
mod policy;
mod proxy;

use crate::{cache::KubernetesCache, delegation::Delegations, meta::Meta, secret};
use ingress_controller_core::{
    duration, tls::InvalidTlsVersion, upstream::InvalidProtocol, CaBundle, Dag, Service,
    TlsSecret,
};
use ingress_controller_k8s_api::IntOrString;

/// Builds a [`Dag`] from a point-in-time cache snapshot.
#[derive(Debug)]
pub struct Builder {
    cache: KubernetesCache,
    delegations: Delegations,
    dag: Dag,
}

/// Explains why a resource, or part of one, was rejected.
///
/// The `Display` text becomes the resource's invalid status.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("root resources are not permitted in namespace {0:?}")]
    RootNamespaceNotPermitted(String),

    #[error("virtualhost.fqdn must be specified")]
    EmptyFqdn,

    #[error("fqdn {fqdn:?} is used by multiple roots: {roots}")]
    DuplicateFqdn { fqdn: String, roots: String },

    #[error("tls: both secretName and passthrough are specified")]
    SecretAndPassthrough,

    #[error("tls: neither secretName nor passthrough is specified")]
    NoSecretOrPassthrough,

    #[error("tls.passthrough requires a tcpproxy")]
    PassthroughWithoutTcpProxy,

    #[error("tls.clientValidation cannot be used with passthrough")]
    ClientValidationWithPassthrough,

    #[error("tls.enableFallbackCertificate cannot be used with clientValidation")]
    FallbackWithClientValidation,

    #[error("tcpproxy requires tls.secretName or tls.passthrough")]
    TcpProxyWithoutTls,

    #[error("Secret {0} not found")]
    SecretNotFound(Meta),

    #[error("Secret {secret} is not delegated to namespace {namespace:?}")]
    SecretNotDelegated { secret: Meta, namespace: String },

    #[error("Secret {0} is not a valid TLS secret")]
    InvalidTlsSecret(Meta),

    #[error("Secret {0} is not a CA bundle")]
    NotCaBundle(Meta),

    #[error(transparent)]
    InvalidTlsVersion(#[from] InvalidTlsVersion),

    #[error("include {0} not found")]
    IncludeNotFound(Meta),

    #[error("include {0} is a root")]
    IncludeRoot(Meta),

    #[error("include {0} creates a cycle")]
    IncludeCycle(Meta),

    #[error("conditions may contain at most one prefix")]
    MultiplePrefixes,

    #[error("a condition must specify exactly one of prefix or header")]
    EmptyCondition,

    #[error("prefix {0:?} must begin with a slash")]
    InvalidPrefix(String),

    #[error("prefix {prefix:?} is outside the delegated prefix {delegated:?}")]
    PrefixOutsideDelegation { prefix: String, delegated: String },

    #[error("header condition on {0:?} must specify exactly one match")]
    InvalidHeaderCondition(String),

    #[error("route has no services")]
    NoServices,

    #[error("route has more than one mirror service")]
    MultipleMirrors,

    #[error("Service {0} not found")]
    ServiceNotFound(Meta),

    #[error("Service {service} has no port {port}")]
    ServicePortNotFound { service: Meta, port: String },

    #[error(transparent)]
    InvalidProtocol(#[from] InvalidProtocol),

    #[error("{field}: {source}")]
    InvalidTimeout {
        field: &'static str,
        #[source]
        source: duration::ParseError,
    },

    #[error("invalid header name {0:?}")]
    InvalidHeaderName(String),

    #[error("invalid value for header {0:?}")]
    InvalidHeaderValue(String),

    #[error("rewriting the Host header is not supported on responses")]
    ResponseHostRewrite,

    #[error("healthCheckPolicy.path must be specified")]
    HealthCheckWithoutPath,

    #[error("tcpproxy cannot specify both services and include")]
    TcpProxyServicesAndInclude,

    #[error("tcpproxy has no services")]
    TcpProxyWithoutServices,

    #[error("tcpproxy include {0} not found")]
    TcpProxyIncludeNotFound(Meta),

    #[error("tcpproxy include {0} has no tcpproxy")]
    TcpProxyIncludeEmpty(Meta),

    #[error("tcpproxy include {0} includes another tcpproxy")]
    TcpProxyNestedInclude(Meta),
}

/// A Service port, as Ingress backends name it either by number or by name.
#[derive(Copy, Clone, Debug)]
enum PortRef<'p> {
    Number(i32),
    Name(&'p str),
}

// === impl Builder ===

impl Builder {
    pub fn new(cache: KubernetesCache) -> Self {
        let delegations = Delegations::from_cache(&cache);
        Self {
            cache,
            delegations,
            dag: Dag::default(),
        }
    }

    pub fn build(mut self) -> Dag {
        self.build_ingresses();
        self.build_routing_resources();
        tracing::debug!(
            virtual_hosts = self.dag.virtual_hosts.len(),
            secure_virtual_hosts = self.dag.secure_virtual_hosts.len(),
            statuses = self.dag.statuses.len(),
            "Built routing graph",
        );
        self.dag
    }

    fn lookup_service(
        &self,
        namespace: &str,
        name: &str,
        port: PortRef<'_>,
    ) -> Result<Service, Error> {
        let meta = Meta::new(namespace, name);
        let svc = self
            .cache
            .service(&meta)
            .ok_or_else(|| Error::ServiceNotFound(meta.clone()))?;

        let ports = svc
            .spec
            .as_ref()
            .and_then(|spec| spec.ports.as_deref())
            .unwrap_or_default();
        let found = ports.iter().find(|p| match port {
            PortRef::Number(n) => p.port == n,
            PortRef::Name(name) => p.name.as_deref() == Some(name),
        });
        let number = found.and_then(|p| u16::try_from(p.port).ok());
        match number {
            Some(port) => Ok(Service::new(namespace, name, port)),
            None => Err(Error::ServicePortNotFound {
                service: meta,
                port: port.to_string(),
            }),
        }
    }

    /// Resolves a server certificate referenced from `namespace`.
    ///
    /// A reference into another namespace must be covered by a delegation grant.
    fn lookup_tls_secret(&self, namespace: &str, reference: &str) -> Result<TlsSecret, Error> {
        let meta = secret::SecretRef::parse(namespace, reference).meta;
        if !self.delegations.is_delegated(&meta, namespace) {
            return Err(Error::SecretNotDelegated {
                secret: meta,
                namespace: namespace.to_string(),
            });
        }
        let obj = self
            .cache
            .secret(&meta)
            .ok_or_else(|| Error::SecretNotFound(meta.clone()))?;
        secret::tls_secret(obj).ok_or(Error::InvalidTlsSecret(meta))
    }

    /// CA bundles are only ever resolved within the referencing namespace.
    fn lookup_ca_bundle(&self, namespace: &str, name: &str) -> Result<CaBundle, Error> {
        let meta = Meta::new(namespace, name);
        let obj = self
            .cache
            .secret(&meta)
            .ok_or_else(|| Error::SecretNotFound(meta.clone()))?;
        secret::ca_bundle(obj).ok_or(Error::NotCaBundle(meta))
    }
}

// === impl PortRef ===

impl<'p> From<&'p IntOrString> for PortRef<'p> {
    fn from(port: &'p IntOrString) -> Self {
        match port {
            IntOrString::Int(n) => Self::Number(*n),
            IntOrString::String(name) => Self::Name(name),
        }
    }
}

impl std::fmt::Display for PortRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => n.fmt(f),
            Self::Name(name) => name.fmt(f),
        }
    }
}
