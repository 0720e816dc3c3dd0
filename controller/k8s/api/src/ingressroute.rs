//! The `contour.heptio.com/v1beta1` routing resource, the predecessor of HTTPProxy.
//!
//! Routes match a single path prefix and delegate sub-trees with `delegate` rather than
//! `includes`. Virtual host, TLS and policy shapes are shared with HTTPProxy.

use crate::httpproxy::{
    HttpHealthCheckPolicy, RetryPolicy, TimeoutPolicy, UpstreamValidation, VirtualHost,
};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "contour.heptio.com",
    version = "v1beta1",
    kind = "IngressRoute",
    namespaced
)]
pub struct IngressRouteSpec {
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "virtualhost")]
    pub virtual_host: Option<VirtualHost>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "tcpproxy")]
    pub tcp_proxy: Option<TcpProxy>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// The path prefix this route matches.
    #[serde(rename = "match")]
    pub prefix: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,

    /// Hands every path under `prefix` to another IngressRoute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegate: Option<Delegate>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub enable_websockets: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub permit_insecure: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_rewrite: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_policy: Option<TimeoutPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct TcpProxy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegate: Option<Delegate>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct Delegate {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Unlike HTTPProxy, load balancing and health checks are configured per service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub name: String,

    pub port: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HttpHealthCheckPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "validation")]
    pub upstream_validation: Option<UpstreamValidation>,
}
