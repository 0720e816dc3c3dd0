//! Resolves cross-namespace secret references against TLS certificate delegation grants.

use crate::{cache::KubernetesCache, meta::Meta};
use ahash::AHashSet as HashSet;
use ingress_controller_k8s_api::delegation::{CertificateDelegation, ALL_NAMESPACES};

/// The set of delegated secrets, merged across both grant generations.
#[derive(Clone, Debug, Default)]
pub struct Delegations {
    grants: HashSet<(Meta, Target)>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Namespace(String),

    /// Every namespace.
    Any,
}

// === impl Delegations ===

impl Delegations {
    /// Scans every cached grant. A grant can only delegate secrets from its own namespace.
    pub fn from_cache(cache: &KubernetesCache) -> Self {
        let mut delegations = Self::default();
        for (home, entries) in cache.delegations() {
            delegations.extend(&home.namespace, entries);
        }
        delegations
    }

    fn extend<'d>(
        &mut self,
        home: &str,
        entries: impl IntoIterator<Item = &'d CertificateDelegation>,
    ) {
        for CertificateDelegation {
            secret_name,
            target_namespaces,
        } in entries
        {
            let secret = Meta::new(home, secret_name);
            for ns in target_namespaces {
                self.grants.insert((secret.clone(), Target::from(ns.as_str())));
            }
        }
    }

    /// True if a grant names `secret` for exactly `namespace`.
    pub fn is_delegated_to(&self, secret: &Meta, namespace: &str) -> bool {
        self.grants
            .contains(&(secret.clone(), Target::Namespace(namespace.to_string())))
    }

    /// True if a grant names `secret` for every namespace.
    pub fn is_delegated_to_all(&self, secret: &Meta) -> bool {
        self.grants.contains(&(secret.clone(), Target::Any))
    }

    /// True if objects in `namespace` may use `secret`.
    ///
    /// Secrets are always visible within their own namespace. Anything else must be granted
    /// explicitly.
    pub fn is_delegated(&self, secret: &Meta, namespace: &str) -> bool {
        secret.namespace == namespace
            || self.is_delegated_to(secret, namespace)
            || self.is_delegated_to_all(secret)
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

// === impl Target ===

impl From<&str> for Target {
    fn from(ns: &str) -> Self {
        if ns == ALL_NAMESPACES {
            Self::Any
        } else {
            Self::Namespace(ns.to_string())
        }
    }
}
