use super::*;

#[test]
fn unreferenced_secrets_do_not_trigger() {
    let test = TestConfig::default();
    assert!(!test.upsert(mk_tls_secret("default", "secret")));
    assert!(!test.upsert(mk_opaque_secret("default", "password")));
}

#[test]
fn ca_bundles_always_trigger() {
    let test = TestConfig::default();
    assert!(test.upsert(mk_ca_secret("default", "ca")));
    assert!(test.upsert(mk_ca_secret("elsewhere", "ca")));
}

#[test]
fn ca_bundles_trigger_whatever_their_content() {
    let test = TestConfig::default();
    let pems = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n".repeat(3);
    let bundles: [&[u8]; 3] = [b"", b"not a certificate", pems.as_bytes()];
    for (i, bundle) in bundles.into_iter().enumerate() {
        let secret = mk_secret(
            "default",
            format!("ca-{i}"),
            SECRET_TYPE_TLS,
            btreemap! {
                CA_CERT_KEY.to_string() => k8s::ByteString(bundle.to_vec()),
            },
        );
        assert!(test.upsert(secret), "bundle {i} must trigger");
    }
}

#[test]
fn secret_referenced_by_ingress_triggers() {
    let test = TestConfig::default();
    let ing = mk_host_ingress("default", "www", "www.example.com", "kuard", Some("secret"));
    assert!(test.upsert(ing));

    assert!(test.upsert(mk_tls_secret("default", "secret")));
    assert!(!test.upsert(mk_tls_secret("default", "other")));
    assert!(!test.upsert(mk_tls_secret("kube-system", "secret")));
}

#[test]
fn unusable_referenced_secrets_still_trigger() {
    let test = TestConfig::default();
    let ing = mk_host_ingress("default", "www", "www.example.com", "kuard", Some("secret"));
    assert!(test.upsert(ing));

    // The reference must be re-evaluated even though the secret holds no key pair.
    assert!(test.upsert(mk_opaque_secret("default", "secret")));
}

#[test]
fn secret_referenced_by_root_triggers() {
    let test = TestConfig::default();
    let spec = HttpProxySpec {
        virtual_host: mk_tls_virtual_host("example.com", "secret"),
        ..Default::default()
    };
    assert!(test.upsert(mk_httpproxy("default", "simple", spec)));
    assert!(test.upsert(mk_tls_secret("default", "secret")));

    let ir = mk_ingressroute(
        "roots",
        "simple",
        IngressRouteSpec {
            virtual_host: mk_tls_virtual_host("example.org", "ir-secret"),
            ..Default::default()
        },
    );
    assert!(test.upsert(ir));
    assert!(test.upsert(mk_tls_secret("roots", "ir-secret")));
}

#[test]
fn cross_namespace_secret_needs_delegation() {
    let test = TestConfig::default();
    let spec = HttpProxySpec {
        virtual_host: mk_tls_virtual_host("example.com", "default/secret"),
        ..Default::default()
    };
    assert!(test.upsert(mk_httpproxy("app", "simple", spec)));
    assert!(
        !test.upsert(mk_tls_secret("default", "secret")),
        "an undelegated secret must not trigger"
    );

    assert!(test.upsert(mk_delegation("default", "grant", "secret", &["app"])));
    assert!(test.upsert(mk_tls_secret("default", "secret")));

    assert!(test.delete(mk_delegation("default", "grant", "secret", &["app"])));
    assert!(!test.upsert(mk_tls_secret("default", "secret")));
}

#[test]
fn wildcard_delegation_covers_every_namespace() {
    let test = TestConfig::default();
    let spec = HttpProxySpec {
        virtual_host: mk_tls_virtual_host("example.com", "default/wildcard"),
        ..Default::default()
    };
    assert!(test.upsert(mk_httpproxy("app", "simple", spec)));
    assert!(test.upsert(mk_legacy_delegation("default", "grant", "wildcard", &["*"])));
    assert!(test.upsert(mk_tls_secret("default", "wildcard")));
}

#[test]
fn delegation_excludes_ungranted_namespaces() {
    let test = TestConfig::default();
    let spec = HttpProxySpec {
        virtual_host: mk_tls_virtual_host("example.com", "default/s"),
        ..Default::default()
    };
    assert!(test.upsert(mk_httpproxy("other", "simple", spec)));
    assert!(test.upsert(mk_delegation("default", "grant", "s", &["extra"])));
    assert!(!test.upsert(mk_tls_secret("default", "s")));

    let spec = HttpProxySpec {
        virtual_host: mk_tls_virtual_host("example.org", "default/s"),
        ..Default::default()
    };
    assert!(test.upsert(mk_httpproxy("extra", "simple", spec)));
    assert!(test.upsert(mk_tls_secret("default", "s")));
}

#[test]
fn ingress_secrets_honor_delegation() {
    let test = TestConfig::default();
    let ing = mk_host_ingress("app", "www", "www.example.com", "kuard", Some("default/s"));
    assert!(test.upsert(ing));
    assert!(!test.upsert(mk_tls_secret("default", "s")));

    assert!(test.upsert(mk_delegation("default", "grant", "s", &["app"])));
    assert!(test.upsert(mk_tls_secret("default", "s")));
    assert!(test.delete(mk_delegation("default", "grant", "s", &["app"])));

    assert!(test.upsert(mk_legacy_delegation("default", "grant", "s", &["*"])));
    assert!(test.upsert(mk_tls_secret("default", "s")));
}

#[test]
fn delegation_only_covers_its_own_namespace() {
    let test = TestConfig::default();
    let spec = HttpProxySpec {
        virtual_host: mk_tls_virtual_host("example.com", "default/secret"),
        ..Default::default()
    };
    assert!(test.upsert(mk_httpproxy("app", "simple", spec)));

    // A grant in `app` cannot hand out a secret that lives in `default`.
    assert!(test.upsert(mk_delegation("app", "grant", "secret", &["app"])));
    assert!(!test.upsert(mk_tls_secret("default", "secret")));
}

#[test]
fn services_are_only_referenced_within_a_namespace() {
    let test = TestConfig::default();
    let ing = mk_host_ingress("default", "www", "www.example.com", "kuard", None);
    assert!(test.upsert(ing));

    assert!(!test.upsert(mk_service("kube-system", "kuard", 8080)));
    assert!(test.upsert(mk_service("default", "kuard", 8080)));
    assert!(!test.upsert(mk_service("default", "other", 8080)));
}

#[test]
fn service_referenced_by_default_backend_triggers() {
    let test = TestConfig::default();
    let ing = mk_ingress(
        "default",
        "backend",
        v1beta1::IngressSpec {
            backend: Some(mk_backend("fallback", 80)),
            ..Default::default()
        },
    );
    assert!(test.upsert(ing));
    assert!(test.upsert(mk_service("default", "fallback", 80)));
}

#[test]
fn service_referenced_by_routing_resources_triggers() {
    let test = TestConfig::default();
    let spec = mk_root("example.com", vec![mk_route("/", "kuard", 8080)]);
    assert!(test.upsert(mk_httpproxy("default", "simple", spec)));
    let tcp = HttpProxySpec {
        tcp_proxy: Some(httpproxy::TcpProxy {
            services: vec![mk_backend_ref("postgres", 5432)],
            ..Default::default()
        }),
        ..Default::default()
    };
    assert!(test.upsert(mk_httpproxy("db", "tcp", tcp)));

    assert!(test.upsert(mk_service("default", "kuard", 8080)));
    assert!(test.upsert(mk_service("db", "postgres", 5432)));
    assert!(!test.upsert(mk_service("default", "postgres", 5432)));
}

#[test]
fn service_referenced_by_fragment_triggers() {
    let test = TestConfig::default();
    let fragment = HttpProxySpec {
        routes: vec![mk_route("/", "blog", 80)],
        ..Default::default()
    };
    assert!(test.upsert(mk_httpproxy("marketing", "blog", fragment)));
    assert!(test.upsert(mk_service("marketing", "blog", 80)));
}

#[test]
fn deleting_present_objects_triggers() {
    let test = TestConfig::default();
    assert!(!test.upsert(mk_tls_secret("default", "secret")));
    assert!(test.delete(mk_tls_secret("default", "secret")));
    assert!(!test.delete(mk_tls_secret("default", "secret")));
    assert!(!test.delete(mk_service("default", "kuard", 8080)));
}

#[test]
fn secret_stops_triggering_once_its_ingress_is_removed() {
    let test = TestConfig::default();
    let ing = mk_host_ingress("default", "www", "www.example.com", "kuard", Some("secret"));
    assert!(test.upsert(ing.clone()));
    assert!(test.upsert(mk_tls_secret("default", "secret")));

    assert!(test.delete(ing));
    assert!(!test.upsert(mk_tls_secret("default", "secret")));
}
