//! Ingress controller cache and routing graph synthesis
//!
//! The cache holds the latest version of every object that may contribute to routing
//! configuration:
//!
//! - An `Ingress` (either `networking.k8s.io/v1beta1` or the legacy `extensions/v1beta1` form)
//!   maps hosts and paths to Services. Ingresses may be scoped to a controller by an ingress
//!   class annotation.
//! - An `IngressRoute` or `HTTPProxy` is a routing resource. A root declares a virtual host; a
//!   fragment contributes routes to whatever roots include (or, for IngressRoutes, delegate to)
//!   it.
//! - A `Secret` holds either a TLS certificate and key or a CA bundle.
//! - A `Service` is the upstream for routes.
//! - A `TLSCertificateDelegation` permits routing resources in other namespaces to use a
//!   namespace's certificates.
//!
//! ```text
//! [ Ingress ] ----------------------------> [ Service ]
//! [ HTTPProxy ] -> [ HTTPProxy ] ---------> [ Service ]
//!       |
//!       +--------> [ Secret ] <- [ TLSCertificateDelegation ]
//! ```
//!
//! Each event tells its caller whether the routing graph must be rebuilt. A Secret or Service
//! that nothing references can change without a rebuild. The graph itself is built by a
//! [`dag::Builder`] from a point-in-time snapshot of the cache.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod cache;
pub mod dag;
mod delegation;
pub mod ingress_class;
mod legacy;
mod meta;
pub mod metrics;
mod object;
mod routing;
pub mod secret;
mod shared;
mod triggers;


pub use self::{
    cache::KubernetesCache,
    dag::Builder,
    delegation::{Delegations, Target},
    ingress_class::DEFAULT_INGRESS_CLASS,
    legacy::TransposeError,
    meta::Meta,
    metrics::IndexMetrics,
    object::{Kind, KubernetesObject},
    routing::RoutingResource,
    shared::SharedCache,
};
