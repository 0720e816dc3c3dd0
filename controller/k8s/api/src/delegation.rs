//! TLS certificate delegation grants.
//!
//! A grant lives in the namespace of the secrets it names. Each entry permits the listed target
//! namespaces to reference one secret as `namespace/name`. The target `*` permits every
//! namespace.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The target namespace that matches every namespace.
pub const ALL_NAMESPACES: &str = "*";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateDelegation {
    pub secret_name: String,

    #[serde(default)]
    pub target_namespaces: Vec<String>,
}

pub mod v1 {
    use super::CertificateDelegation;
    use kube::CustomResource;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    #[derive(
        Clone, Debug, Default, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema,
    )]
    #[kube(
        group = "projectcontour.io",
        version = "v1",
        kind = "TLSCertificateDelegation",
        root = "TlsCertificateDelegation",
        namespaced
    )]
    pub struct TlsCertificateDelegationSpec {
        #[serde(default)]
        pub delegations: Vec<CertificateDelegation>,
    }
}

pub mod v1beta1 {
    use super::CertificateDelegation;
    use kube::CustomResource;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    #[derive(
        Clone, Debug, Default, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema,
    )]
    #[kube(
        group = "contour.heptio.com",
        version = "v1beta1",
        kind = "TLSCertificateDelegation",
        root = "TlsCertificateDelegation",
        namespaced
    )]
    pub struct TlsCertificateDelegationSpec {
        #[serde(default)]
        pub delegations: Vec<CertificateDelegation>,
    }
}
