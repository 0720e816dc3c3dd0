//! Ingress-class admission for Ingresses and routing resources.

use ingress_controller_k8s_api::ObjectMeta;

pub const DEFAULT_INGRESS_CLASS: &str = "contour";

/// Annotation keys naming an object's ingress class, in order of precedence.
pub const ANNOTATIONS: [&str; 3] = [
    "projectcontour.io/ingress.class",
    "contour.heptio.com/ingress.class",
    "kubernetes.io/ingress.class",
];

/// Returns the class an object is annotated with, if any.
pub fn annotated_class(meta: &ObjectMeta) -> Option<&str> {
    let annotations = meta.annotations.as_ref()?;
    ANNOTATIONS
        .iter()
        .find_map(|key| annotations.get(*key))
        .map(String::as_str)
}

/// Objects without a class annotation are admitted by every controller.
pub fn admits(meta: &ObjectMeta, class: &str) -> bool {
    annotated_class(meta).map_or(true, |c| c == class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    fn annotated(annotations: std::collections::BTreeMap<String, String>) -> ObjectMeta {
        ObjectMeta {
            annotations: Some(annotations),
            ..Default::default()
        }
    }

    #[test]
    fn unannotated_is_admitted() {
        assert!(admits(&ObjectMeta::default(), "contour"));
        assert!(admits(&annotated(Default::default()), "contour"));
    }

    #[test]
    fn each_key_is_honored() {
        for key in ANNOTATIONS {
            let meta = annotated(btreemap! { key.to_string() => "linkerd".to_string() });
            assert!(admits(&meta, "linkerd"), "{key}");
            assert!(!admits(&meta, "contour"), "{key}");
        }
    }

    #[test]
    fn current_key_takes_precedence() {
        let meta = annotated(btreemap! {
            "kubernetes.io/ingress.class".to_string() => "nginx".to_string(),
            "projectcontour.io/ingress.class".to_string() => "contour".to_string(),
        });
        assert_eq!(annotated_class(&meta), Some("contour"));
        assert!(admits(&meta, "contour"));
    }
}
