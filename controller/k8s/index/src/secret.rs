use crate::meta::Meta;
use ingress_controller_core::{CaBundle, TlsSecret};
use ingress_controller_k8s_api::{
    self as k8s, ResourceExt, CA_CERT_KEY, SECRET_TYPE_TLS, TLS_CERT_KEY, TLS_PRIVATE_KEY_KEY,
};

/// A secret named by a routing resource or Ingress.
///
/// A bare `name` refers to the referencing object's own namespace. A `namespace/name`
/// reference may cross namespaces, but only where a delegation grant permits it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SecretRef {
    pub meta: Meta,
}

/// Secrets holding a `ca.crt` entry are CA bundles, whatever their type or content.
pub fn is_ca_bundle(secret: &k8s::Secret) -> bool {
    secret
        .data
        .as_ref()
        .is_some_and(|data| data.contains_key(CA_CERT_KEY))
}

/// A TLS secret carries both a certificate chain and a private key.
pub fn is_tls_secret(secret: &k8s::Secret) -> bool {
    secret.type_.as_deref() == Some(SECRET_TYPE_TLS)
        && [TLS_CERT_KEY, TLS_PRIVATE_KEY_KEY]
            .iter()
            .all(|key| data(secret, key).is_some_and(|v| !v.is_empty()))
}

pub fn tls_secret(secret: &k8s::Secret) -> Option<TlsSecret> {
    if !is_tls_secret(secret) {
        return None;
    }
    Some(TlsSecret {
        name: secret.name_any(),
        namespace: secret.namespace().unwrap_or_default(),
        cert_chain: data(secret, TLS_CERT_KEY)?.to_vec(),
        private_key: data(secret, TLS_PRIVATE_KEY_KEY)?.to_vec(),
    })
}

pub fn ca_bundle(secret: &k8s::Secret) -> Option<CaBundle> {
    Some(CaBundle {
        name: secret.name_any(),
        namespace: secret.namespace().unwrap_or_default(),
        certificates: data(secret, CA_CERT_KEY)?.to_vec(),
    })
}

fn data<'s>(secret: &'s k8s::Secret, key: &str) -> Option<&'s [u8]> {
    secret
        .data
        .as_ref()?
        .get(key)
        .map(|k8s::ByteString(bytes)| bytes.as_slice())
}

// === impl SecretRef ===

impl SecretRef {
    pub fn parse(default_namespace: &str, reference: &str) -> Self {
        match reference.split_once('/') {
            Some((namespace, name)) if !namespace.is_empty() => Self {
                meta: Meta::new(namespace, name),
            },
            _ => Self {
                meta: Meta::new(default_namespace, reference.trim_start_matches('/')),
            },
        }
    }

    /// True if this reference resolves to `secret`.
    pub fn refers_to(&self, secret: &Meta) -> bool {
        self.meta == *secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use std::collections::BTreeMap;

    fn mk_secret(type_: &str, data: BTreeMap<String, k8s::ByteString>) -> k8s::Secret {
        k8s::Secret {
            metadata: k8s::ObjectMeta {
                namespace: Some("default".to_string()),
                name: Some("secret".to_string()),
                ..Default::default()
            },
            type_: Some(type_.to_string()),
            data: Some(data),
            ..Default::default()
        }
    }

    #[test]
    fn ca_bundles_are_classified_by_key() {
        let empty = mk_secret(
            "Opaque",
            btreemap! { CA_CERT_KEY.to_string() => k8s::ByteString(vec![]) },
        );
        assert!(is_ca_bundle(&empty));

        let tls_with_ca = mk_secret(
            SECRET_TYPE_TLS,
            btreemap! {
                CA_CERT_KEY.to_string() => k8s::ByteString(b"not a certificate".to_vec()),
                TLS_CERT_KEY.to_string() => k8s::ByteString(b"cert".to_vec()),
                TLS_PRIVATE_KEY_KEY.to_string() => k8s::ByteString(b"key".to_vec()),
            },
        );
        assert!(is_ca_bundle(&tls_with_ca));
        assert!(is_tls_secret(&tls_with_ca));

        assert!(!is_ca_bundle(&mk_secret("Opaque", Default::default())));
    }

    #[test]
    fn tls_secrets_need_a_key_pair() {
        let cert_only = mk_secret(
            SECRET_TYPE_TLS,
            btreemap! { TLS_CERT_KEY.to_string() => k8s::ByteString(b"cert".to_vec()) },
        );
        assert!(!is_tls_secret(&cert_only));
        assert_eq!(tls_secret(&cert_only), None);

        let opaque = mk_secret(
            "Opaque",
            btreemap! {
                TLS_CERT_KEY.to_string() => k8s::ByteString(b"cert".to_vec()),
                TLS_PRIVATE_KEY_KEY.to_string() => k8s::ByteString(b"key".to_vec()),
            },
        );
        assert!(!is_tls_secret(&opaque));
    }

    #[test]
    fn parses_references() {
        assert_eq!(
            SecretRef::parse("extra", "secret"),
            SecretRef {
                meta: Meta::new("extra", "secret"),
            }
        );
        assert_eq!(
            SecretRef::parse("extra", "default/secret"),
            SecretRef {
                meta: Meta::new("default", "secret"),
            }
        );
    }
}
