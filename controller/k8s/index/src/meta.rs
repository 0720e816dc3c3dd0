use ingress_controller_k8s_api::{Resource, ResourceExt};

/// The namespace-qualified name that keys every cached object.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Meta {
    pub name: String,
    pub namespace: String,
}

// === impl Meta ===

impl Meta {
    pub fn new(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }

    /// Cluster-scoped objects have an empty namespace.
    pub fn from_resource<T: Resource>(resource: &T) -> Self {
        Self {
            name: resource.name_any(),
            namespace: resource.namespace().unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for Meta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
