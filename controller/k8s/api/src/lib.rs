#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod delegation;
pub mod httpproxy;
pub mod ingress;
pub mod ingressroute;

pub use self::{
    delegation::CertificateDelegation,
    httpproxy::{HttpProxy, HttpProxySpec},
    ingressroute::{IngressRoute, IngressRouteSpec},
};
pub use k8s_openapi::{
    api::{
        self,
        core::v1::{Secret, Service, ServicePort, ServiceSpec},
    },
    apimachinery::pkg::util::intstr::IntOrString,
    ByteString,
};
pub use kube::{
    core::{DynamicObject, ObjectMeta, ResourceExt},
    Resource,
};

/// The secret type used for server certificates and their keys.
pub const SECRET_TYPE_TLS: &str = "kubernetes.io/tls";

/// The data key holding a PEM certificate chain in a TLS secret.
pub const TLS_CERT_KEY: &str = "tls.crt";

/// The data key holding a PEM private key in a TLS secret.
pub const TLS_PRIVATE_KEY_KEY: &str = "tls.key";

/// The data key holding a CA bundle.
pub const CA_CERT_KEY: &str = "ca.crt";
