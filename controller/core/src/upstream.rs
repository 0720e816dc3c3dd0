use crate::{tls::CaBundle, HeadersPolicy};
use std::{str::FromStr, time::Duration};

/// A backend Service and port. Only the reference is modeled; endpoints are resolved by the
/// proxy.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Service {
    pub name: String,
    pub namespace: String,
    pub port: u16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Protocol {
    H2,
    H2c,
    Tls,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cluster {
    pub upstream: Service,
    pub weight: u32,
    pub protocol: Option<Protocol>,
    pub load_balancer: LoadBalancerStrategy,
    pub health_check: Option<HttpHealthCheck>,
    pub upstream_validation: Option<PeerValidation>,
    pub request_headers: Option<HeadersPolicy>,
    pub response_headers: Option<HeadersPolicy>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoadBalancerStrategy {
    #[default]
    RoundRobin,
    WeightedLeastRequest,
    Random,
    Cookie,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpHealthCheck {
    pub path: String,
    pub host: String,
    pub interval: Duration,
    pub timeout: Duration,
    pub unhealthy_threshold: u32,
    pub healthy_threshold: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TcpHealthCheck {
    pub interval: Duration,
    pub timeout: Duration,
    pub unhealthy_threshold: u32,
    pub healthy_threshold: u32,
}

/// Validates an upstream's certificate against a CA bundle and expected subject name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerValidation {
    pub ca: CaBundle,
    pub subject_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TcpProxy {
    pub clusters: Vec<Cluster>,
    pub load_balancer: LoadBalancerStrategy,
    pub health_check: Option<TcpHealthCheck>,
}

#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
#[error("unsupported upstream protocol: {0}")]
pub struct InvalidProtocol(String);

pub const DEFAULT_HEALTH_CHECK_HOST: &str = "contour-envoy-healthcheck";
pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_UNHEALTHY_THRESHOLD: u32 = 3;
pub const DEFAULT_HEALTHY_THRESHOLD: u32 = 2;

// === impl Service ===

impl Service {
    pub fn new(namespace: impl ToString, name: impl ToString, port: u16) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            port,
        }
    }
}

// === impl Protocol ===

impl FromStr for Protocol {
    type Err = InvalidProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "h2" => Ok(Self::H2),
            "h2c" => Ok(Self::H2c),
            "tls" => Ok(Self::Tls),
            s => Err(InvalidProtocol(s.to_string())),
        }
    }
}

// === impl Cluster ===

impl Cluster {
    pub fn new(upstream: Service) -> Self {
        Self {
            upstream,
            weight: 0,
            protocol: None,
            load_balancer: LoadBalancerStrategy::default(),
            health_check: None,
            upstream_validation: None,
            request_headers: None,
            response_headers: None,
        }
    }
}

// === impl LoadBalancerStrategy ===

impl LoadBalancerStrategy {
    /// Unrecognized or absent strategies fall back to round robin.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("WeightedLeastRequest") => Self::WeightedLeastRequest,
            Some("Random") => Self::Random,
            Some("Cookie") => Self::Cookie,
            _ => Self::RoundRobin,
        }
    }
}

// === impl HttpHealthCheck ===

impl HttpHealthCheck {
    pub fn new(path: impl ToString) -> Self {
        Self {
            path: path.to_string(),
            host: DEFAULT_HEALTH_CHECK_HOST.to_string(),
            interval: DEFAULT_HEALTH_CHECK_INTERVAL,
            timeout: DEFAULT_HEALTH_CHECK_TIMEOUT,
            unhealthy_threshold: DEFAULT_UNHEALTHY_THRESHOLD,
            healthy_threshold: DEFAULT_HEALTHY_THRESHOLD,
        }
    }
}

// === impl TcpHealthCheck ===

impl Default for TcpHealthCheck {
    fn default() -> Self {
        Self {
            interval: DEFAULT_HEALTH_CHECK_INTERVAL,
            timeout: DEFAULT_HEALTH_CHECK_TIMEOUT,
            unhealthy_threshold: DEFAULT_UNHEALTHY_THRESHOLD,
            healthy_threshold: DEFAULT_HEALTHY_THRESHOLD,
        }
    }
}
