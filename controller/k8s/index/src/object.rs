use crate::meta::Meta;
use ingress_controller_k8s_api::{
    self as k8s,
    delegation,
    ingress::{extensions, v1beta1},
    DynamicObject,
};

/// Every object the cache may be handed.
///
/// Objects of any other kind arrive as `Unknown` and are never stored.
#[derive(Clone, Debug)]
pub enum KubernetesObject {
    Ingress(v1beta1::Ingress),
    ExtensionsIngress(extensions::Ingress),
    IngressRoute(k8s::IngressRoute),
    HttpProxy(k8s::HttpProxy),
    Secret(k8s::Secret),
    Service(k8s::Service),
    IngressRouteDelegation(delegation::v1beta1::TlsCertificateDelegation),
    HttpProxyDelegation(delegation::v1::TlsCertificateDelegation),
    Unknown(DynamicObject),
}

/// Labels cache metrics and log events.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Ingress,
    IngressRoute,
    HttpProxy,
    Secret,
    Service,
    TlsCertificateDelegation,
    Unknown,
}

// === impl KubernetesObject ===

impl KubernetesObject {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Ingress(_) | Self::ExtensionsIngress(_) => Kind::Ingress,
            Self::IngressRoute(_) => Kind::IngressRoute,
            Self::HttpProxy(_) => Kind::HttpProxy,
            Self::Secret(_) => Kind::Secret,
            Self::Service(_) => Kind::Service,
            Self::IngressRouteDelegation(_) | Self::HttpProxyDelegation(_) => {
                Kind::TlsCertificateDelegation
            }
            Self::Unknown(_) => Kind::Unknown,
        }
    }

    pub fn meta(&self) -> Meta {
        match self {
            Self::Ingress(o) => Meta::from_resource(o),
            Self::ExtensionsIngress(o) => Meta::from_resource(o),
            Self::IngressRoute(o) => Meta::from_resource(o),
            Self::HttpProxy(o) => Meta::from_resource(o),
            Self::Secret(o) => Meta::from_resource(o),
            Self::Service(o) => Meta::from_resource(o),
            Self::IngressRouteDelegation(o) => Meta::from_resource(o),
            Self::HttpProxyDelegation(o) => Meta::from_resource(o),
            Self::Unknown(o) => Meta::from_resource(o),
        }
    }
}

macro_rules! impl_from {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for KubernetesObject {
                fn from(obj: $ty) -> Self {
                    Self::$variant(obj)
                }
            }
        )+
    };
}

impl_from! {
    Ingress(v1beta1::Ingress),
    ExtensionsIngress(extensions::Ingress),
    IngressRoute(k8s::IngressRoute),
    HttpProxy(k8s::HttpProxy),
    Secret(k8s::Secret),
    Service(k8s::Service),
    IngressRouteDelegation(delegation::v1beta1::TlsCertificateDelegation),
    HttpProxyDelegation(delegation::v1::TlsCertificateDelegation),
    Unknown(DynamicObject),
}

// === impl Kind ===

impl Kind {
    pub const CACHED: [Self; 6] = [
        Self::Ingress,
        Self::IngressRoute,
        Self::HttpProxy,
        Self::Secret,
        Self::Service,
        Self::TlsCertificateDelegation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingress => "Ingress",
            Self::IngressRoute => "IngressRoute",
            Self::HttpProxy => "HTTPProxy",
            Self::Secret => "Secret",
            Self::Service => "Service",
            Self::TlsCertificateDelegation => "TLSCertificateDelegation",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}
