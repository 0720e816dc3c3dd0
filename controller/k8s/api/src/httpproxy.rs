use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// HTTPProxy is the current generation of the routing resource.
///
/// A proxy with a `virtualhost` is a root. A proxy without one is a fragment that only becomes
/// routable when some root includes it, possibly through other fragments.
#[derive(Clone, Debug, Default, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "projectcontour.io",
    version = "v1",
    kind = "HTTPProxy",
    root = "HttpProxy",
    namespaced
)]
pub struct HttpProxySpec {
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "virtualhost")]
    pub virtual_host: Option<VirtualHost>,

    /// Routes are ignored when a TCP proxy is configured.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "tcpproxy")]
    pub tcp_proxy: Option<TcpProxy>,

    /// Pulls routes in from other proxies, possibly in other namespaces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<Include>,
}

/// Attaches the routes of another proxy, adding `conditions` to each of them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct Include {
    pub name: String,

    /// Defaults to the including proxy's namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// ANDed onto every included route. At most one prefix is permitted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<MatchCondition>,
}

/// Exactly one of `prefix` or `header` should be set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct MatchCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderMatchCondition>,
}

/// Header names are case insensitive. Only one of the value fields should be set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct HeaderMatchCondition {
    pub name: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub present: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "notcontains"
    )]
    pub not_contains: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "notexact")]
    pub not_exact: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct VirtualHost {
    /// The fully qualified domain name served by the root of this tree.
    pub fqdn: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<Tls>,
}

/// Either `secret_name` or `passthrough` must be specified, but not both.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tls {
    /// Either a bare name in the proxy's namespace or a delegated `namespace/name`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_protocol_version: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub passthrough: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_validation: Option<DownstreamValidation>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub enable_fallback_certificate: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// ANDed together. At most one prefix is permitted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<MatchCondition>,

    #[serde(default)]
    pub services: Vec<Service>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub enable_websockets: bool,

    /// Serves this route over plain HTTP even when the virtual host has TLS.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub permit_insecure: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_policy: Option<TimeoutPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_policy: Option<HttpHealthCheckPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer_policy: Option<LoadBalancerPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_rewrite_policy: Option<PathRewritePolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_headers_policy: Option<HeadersPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers_policy: Option<HeadersPolicy>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TcpProxy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer_policy: Option<LoadBalancerPolicy>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,

    /// Delegates this TCP proxy to another HTTPProxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<TcpProxyInclude>,

    /// The plural spelling of `include`, kept for existing v1 users. Same meaning.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "includes")]
    pub includes_deprecated: Option<TcpProxyInclude>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_policy: Option<TcpHealthCheckPolicy>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct TcpProxyInclude {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub name: String,

    pub port: i32,

    /// One of `h2`, `h2c` or `tls`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "validation")]
    pub upstream_validation: Option<UpstreamValidation>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mirror: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_headers_policy: Option<HeadersPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers_policy: Option<HeadersPolicy>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpHealthCheckPolicy {
    pub path: String,

    /// Defaults to `contour-envoy-healthcheck`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default)]
    pub interval_seconds: i64,

    #[serde(default)]
    pub timeout_seconds: i64,

    #[serde(default)]
    pub unhealthy_threshold_count: i64,

    #[serde(default)]
    pub healthy_threshold_count: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TcpHealthCheckPolicy {
    #[serde(default)]
    pub interval_seconds: i64,

    #[serde(default)]
    pub timeout_seconds: i64,

    #[serde(default)]
    pub unhealthy_threshold_count: i64,

    #[serde(default)]
    pub healthy_threshold_count: i64,
}

/// Durations use the Go duration format. `infinity` disables the timeout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct TimeoutPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Defaults to one retry when unset.
    #[serde(default, rename = "count")]
    pub num_retries: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_try_timeout: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retry_on: Vec<String>,

    /// Only honored when `retry_on` includes `retriable-status-codes`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retriable_status_codes: Vec<u32>,
}

/// Replaces a routing prefix after the request has been routed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct ReplacePrefix {
    /// When set, only the rendered prefix that equals this value is replaced. This lets a
    /// fragment included through several roots rewrite selectively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    pub replacement: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PathRewritePolicy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replace_prefix: Vec<ReplacePrefix>,
}

/// One of `RoundRobin`, `WeightedLeastRequest`, `Random` or `Cookie`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct LoadBalancerPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

/// Setting `Host` on a response is rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct HeadersPolicy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set: Vec<HeaderValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct HeaderValue {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamValidation {
    /// A secret in the proxy's namespace holding a `ca.crt` bundle.
    #[serde(rename = "caSecret")]
    pub ca_certificate: String,

    pub subject_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct DownstreamValidation {
    #[serde(rename = "caSecret")]
    pub ca_certificate: String,
}

impl MatchCondition {
    pub fn prefix(prefix: impl ToString) -> Self {
        Self {
            prefix: Some(prefix.to_string()),
            header: None,
        }
    }
}

impl TcpProxy {
    /// Returns the include target, preferring the singular field over the deprecated one.
    pub fn include(&self) -> Option<&TcpProxyInclude> {
        self.include.as_ref().or(self.includes_deprecated.as_ref())
    }
}
