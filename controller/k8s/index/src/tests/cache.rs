use super::*;
use crate::{Kind, Meta};
use pretty_assertions::assert_eq;

#[test]
fn insert_is_idempotent() {
    let _tracing = init_tracing();
    let mut cache = KubernetesCache::default();
    let svc = mk_service("default", "kuard", 8080);

    assert!(cache.insert(svc.clone().into()));
    assert!(cache.insert(svc.into()));
    assert_eq!(cache.len_of(Kind::Service), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn ingress_class_gates_insert() {
    let _tracing = init_tracing();
    let mut cache = KubernetesCache::new(Some("linkerd".to_string()), vec![]);
    assert_eq!(cache.ingress_class(), "linkerd");

    let mut foreign = mk_host_ingress("default", "www", "www.example.com", "kuard", None);
    foreign.metadata = with_class(foreign.metadata, "contour");
    assert!(!cache.insert(foreign.into()));

    let mut ours = mk_host_ingress("default", "www", "www.example.com", "kuard", None);
    ours.metadata = with_class(ours.metadata, "linkerd");
    assert!(cache.insert(ours.into()));

    let unannotated = mk_httpproxy("default", "simple", mk_root("example.com", vec![]));
    assert!(cache.insert(unannotated.into()));

    let mut foreign = mk_httpproxy("default", "other", mk_root("other.com", vec![]));
    foreign.metadata = with_class(foreign.metadata, "nginx");
    assert!(!cache.insert(foreign.into()));

    assert_eq!(cache.len_of(Kind::Ingress), 1);
    assert_eq!(cache.len_of(Kind::HttpProxy), 1);
}

#[test]
fn ingress_class_gates_remove() {
    let _tracing = init_tracing();
    let mut cache = KubernetesCache::default();
    let ing = mk_host_ingress("default", "www", "www.example.com", "kuard", None);
    assert!(cache.insert(ing.clone().into()));

    // The same object, now claimed by another controller, is never considered present.
    let mut foreign = ing.clone();
    foreign.metadata = with_class(foreign.metadata, "nginx");
    assert!(!cache.remove(&foreign.into()));
    assert_eq!(cache.ingresses().count(), 1);

    assert!(cache.remove(&ing.clone().into()));
    assert!(!cache.remove(&ing.into()));
    assert!(cache.is_empty());
}

#[test]
fn reclassified_objects_are_evicted() {
    let _tracing = init_tracing();
    let mut cache = KubernetesCache::default();
    let ing = mk_host_ingress("default", "www", "www.example.com", "kuard", None);
    let proxy = mk_httpproxy("default", "simple", mk_root("example.com", vec![]));
    assert!(cache.insert(ing.clone().into()));
    assert!(cache.insert(proxy.clone().into()));

    // Another controller now owns both objects.
    let mut foreign_ing = ing;
    foreign_ing.metadata = with_class(foreign_ing.metadata, "nginx");
    let mut foreign_proxy = proxy;
    foreign_proxy.metadata = with_class(foreign_proxy.metadata, "nginx");
    assert!(!cache.insert(foreign_ing.clone().into()));
    assert!(!cache.insert(foreign_proxy.clone().into()));
    assert_eq!(cache.ingresses().count(), 0);
    assert_eq!(cache.httpproxies().count(), 0);

    assert!(!cache.remove(&foreign_ing.into()));
    assert!(!cache.remove(&foreign_proxy.into()));
    assert!(cache.is_empty());
}

#[test]
fn absent_class_uses_default() {
    assert_eq!(
        KubernetesCache::new(None, vec![]).ingress_class(),
        crate::DEFAULT_INGRESS_CLASS
    );
    assert_eq!(
        KubernetesCache::new(Some(String::new()), vec![]).ingress_class(),
        crate::DEFAULT_INGRESS_CLASS
    );
}

#[test]
fn legacy_ingresses_are_stored_in_networking_form() {
    let _tracing = init_tracing();
    let mut cache = KubernetesCache::default();
    assert!(cache.insert(mk_extensions_ingress("default", "legacy", "kuard").into()));

    let stored = cache.ingresses().collect::<Vec<_>>();
    assert_eq!(stored.len(), 1);
    assert_eq!(Meta::from_resource(stored[0]), Meta::new("default", "legacy"));
    assert_eq!(
        stored[0].spec.backend,
        Some(mk_backend("kuard", 8080)),
        "backend must survive transcoding"
    );

    // Either generation removes the stored object.
    let networking = mk_ingress("default", "legacy", Default::default());
    assert!(cache.remove(&networking.into()));
    assert!(cache.is_empty());
}

#[test]
fn unknown_objects_are_ignored() {
    let _tracing = init_tracing();
    let mut cache = KubernetesCache::default();
    let obj = KubernetesObject::from(mk_unknown("default", "config"));
    assert_eq!(obj.kind(), Kind::Unknown);
    assert_eq!(obj.meta(), Meta::new("default", "config"));

    assert!(!cache.insert(obj.clone()));
    assert!(!cache.remove(&obj));
    assert!(!cache.triggers_rebuild(&obj));
    assert!(cache.is_empty());
}

#[test]
fn routing_resources_are_kept_per_generation() {
    let _tracing = init_tracing();
    let mut cache = KubernetesCache::default();
    let spec = mk_root("example.com", vec![mk_route("/", "kuard", 8080)]);
    assert!(cache.insert(mk_httpproxy("default", "example", spec).into()));
    let ir = mk_ingressroute(
        "default",
        "example",
        IngressRouteSpec {
            virtual_host: mk_virtual_host("example.com"),
            routes: vec![mk_ir_route("/", "kuard", 8080)],
            tcp_proxy: None,
        },
    );
    assert!(cache.insert(ir.into()));

    assert_eq!(cache.httpproxies().count(), 1);
    assert_eq!(cache.ingressroutes().count(), 1);
    assert_eq!(cache.routing_resources().count(), 2);

    let meta = Meta::new("default", "example");
    let kinds = [
        ingress_controller_core::ResourceKind::HttpProxy,
        ingress_controller_core::ResourceKind::IngressRoute,
    ];
    for kind in kinds {
        let rr = cache.routing_resource(kind, &meta).expect("must be cached");
        assert_eq!(rr.kind, kind);
        assert_eq!(rr.spec.routes.len(), 1);
    }
}

#[test]
fn delegations_of_both_generations_are_cached() {
    let _tracing = init_tracing();
    let mut cache = KubernetesCache::default();
    assert!(cache.insert(mk_delegation("default", "v1", "tls", &["app"]).into()));
    assert!(cache.insert(mk_legacy_delegation("default", "v1beta1", "tls", &["*"]).into()));
    assert_eq!(cache.len_of(Kind::TlsCertificateDelegation), 2);
    assert_eq!(cache.delegations().count(), 2);
}

#[test]
fn root_namespaces_restrict_roots() {
    let open = KubernetesCache::default();
    assert!(open.permits_root("anything"));

    let restricted = KubernetesCache::new(None, vec!["roots".to_string()]);
    assert_eq!(restricted.root_namespaces(), ["roots".to_string()]);
    assert!(restricted.permits_root("roots"));
    assert!(!restricted.permits_root("default"));
}
