//! The legacy Ingress API generations.
//!
//! `networking.k8s.io/v1beta1` is the shape indexed by the controller. `extensions/v1beta1`
//! carries the same fields and is transcoded into the networking shape before it is stored.

pub mod v1beta1 {
    use crate::IntOrString;
    use kube::CustomResource;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
    #[kube(
        group = "networking.k8s.io",
        version = "v1beta1",
        kind = "Ingress",
        namespaced
    )]
    pub struct IngressSpec {
        /// Handles requests that match no rule.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub backend: Option<IngressBackend>,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub tls: Vec<IngressTls>,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub rules: Vec<IngressRule>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct IngressBackend {
        pub service_name: String,
        pub service_port: IntOrString,
    }

    #[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct IngressTls {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub hosts: Vec<String>,

        /// Either a bare name in the Ingress' namespace or a delegated `namespace/name`.
        #[serde(default, skip_serializing_if = "String::is_empty")]
        pub secret_name: String,
    }

    #[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
    pub struct IngressRule {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub host: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub http: Option<HttpIngressRuleValue>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
    pub struct HttpIngressRuleValue {
        pub paths: Vec<HttpIngressPath>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
    pub struct HttpIngressPath {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub path: Option<String>,

        pub backend: IngressBackend,
    }
}

pub mod extensions {
    use crate::IntOrString;
    use kube::CustomResource;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
    #[kube(group = "extensions", version = "v1beta1", kind = "Ingress", namespaced)]
    pub struct IngressSpec {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub backend: Option<IngressBackend>,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub tls: Vec<IngressTls>,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub rules: Vec<IngressRule>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct IngressBackend {
        pub service_name: String,
        pub service_port: IntOrString,
    }

    #[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct IngressTls {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub hosts: Vec<String>,

        #[serde(default, skip_serializing_if = "String::is_empty")]
        pub secret_name: String,
    }

    #[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
    pub struct IngressRule {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub host: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub http: Option<HttpIngressRuleValue>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
    pub struct HttpIngressRuleValue {
        pub paths: Vec<HttpIngressPath>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
    pub struct HttpIngressPath {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub path: Option<String>,

        pub backend: IngressBackend,
    }
}
