//! Converts route and service policies into their graph form.

use super::{conditions::Conditions, Builder, Error, PortRef};
use ingress_controller_core::{
    upstream::DEFAULT_HEALTH_CHECK_HOST,
    Cluster, HeadersPolicy, HttpHealthCheck, LoadBalancerStrategy, PeerValidation, Protocol,
    RetryPolicy, Route, TcpHealthCheck, Timeout, TimeoutPolicy,
};
use ingress_controller_k8s_api::httpproxy;
use std::time::Duration;

// === impl Builder ===

impl Builder {
    /// Builds the route for `route`, declared in `namespace`, under the accumulated conditions.
    pub(super) fn route(
        &self,
        namespace: &str,
        route: &httpproxy::Route,
        conditions: &Conditions,
    ) -> Result<Route, Error> {
        if route.services.is_empty() {
            return Err(Error::NoServices);
        }

        let load_balancer = LoadBalancerStrategy::from_name(
            route
                .load_balancer_policy
                .as_ref()
                .and_then(|p| p.strategy.as_deref()),
        );
        let health_check = route
            .health_check_policy
            .as_ref()
            .map(http_health_check)
            .transpose()?;

        let mut clusters = Vec::with_capacity(route.services.len());
        let mut mirror = None;
        for svc in &route.services {
            let mut cluster = self.cluster(namespace, svc)?;
            cluster.load_balancer = load_balancer;
            cluster.health_check = health_check.clone();
            if svc.mirror {
                if mirror.replace(cluster).is_some() {
                    return Err(Error::MultipleMirrors);
                }
            } else {
                clusters.push(cluster);
            }
        }

        let prefix = conditions.prefix().to_string();
        let prefix_rewrite = route
            .path_rewrite_policy
            .as_ref()
            .and_then(|p| replacement_for(&p.replace_prefix, &prefix));

        Ok(Route {
            header_conditions: conditions.headers().to_vec(),
            clusters,
            mirror,
            websocket: route.enable_websockets,
            https_upgrade: false,
            timeout_policy: route
                .timeout_policy
                .as_ref()
                .map(timeout_policy)
                .transpose()?
                .unwrap_or_default(),
            retry_policy: route
                .retry_policy
                .as_ref()
                .map(retry_policy)
                .transpose()?,
            prefix_rewrite,
            request_headers: headers_policy(route.request_headers_policy.as_ref(), false)?,
            response_headers: headers_policy(route.response_headers_policy.as_ref(), true)?,
            prefix,
        })
    }

    pub(super) fn cluster(
        &self,
        namespace: &str,
        svc: &httpproxy::Service,
    ) -> Result<Cluster, Error> {
        let upstream = self.lookup_service(namespace, &svc.name, PortRef::Number(svc.port))?;
        let mut cluster = Cluster::new(upstream);
        cluster.weight = svc.weight.unwrap_or_default();
        cluster.protocol = svc
            .protocol
            .as_deref()
            .map(str::parse::<Protocol>)
            .transpose()?;
        if let Some(validation) = &svc.upstream_validation {
            let ca = self.lookup_ca_bundle(namespace, &validation.ca_certificate)?;
            cluster.upstream_validation = Some(PeerValidation {
                ca,
                subject_name: validation.subject_name.clone(),
            });
        }
        cluster.request_headers = headers_policy(svc.request_headers_policy.as_ref(), false)?;
        cluster.response_headers = headers_policy(svc.response_headers_policy.as_ref(), true)?;
        Ok(cluster)
    }
}

/// Prefers the replacement scoped to exactly this prefix over an unscoped one.
fn replacement_for(replacements: &[httpproxy::ReplacePrefix], prefix: &str) -> Option<String> {
    let scoped = replacements
        .iter()
        .find(|r| r.prefix.as_deref() == Some(prefix));
    let unscoped = || replacements.iter().find(|r| r.prefix.is_none());
    scoped.or_else(unscoped).map(|r| r.replacement.clone())
}

fn timeout_policy(policy: &httpproxy::TimeoutPolicy) -> Result<TimeoutPolicy, Error> {
    Ok(TimeoutPolicy {
        response: timeout("timeoutPolicy.response", policy.response.as_deref())?,
        idle: timeout("timeoutPolicy.idle", policy.idle.as_deref())?,
    })
}

fn timeout(field: &'static str, value: Option<&str>) -> Result<Timeout, Error> {
    Timeout::parse_opt(value).map_err(|source| Error::InvalidTimeout { field, source })
}

fn retry_policy(policy: &httpproxy::RetryPolicy) -> Result<RetryPolicy, Error> {
    let defaults = RetryPolicy::default();
    Ok(RetryPolicy {
        retry_on: if policy.retry_on.is_empty() {
            defaults.retry_on
        } else {
            policy.retry_on.clone()
        },
        num_retries: u32::try_from(policy.num_retries)
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(defaults.num_retries),
        per_try_timeout: timeout("retryPolicy.perTryTimeout", policy.per_try_timeout.as_deref())?,
        retriable_status_codes: policy.retriable_status_codes.clone(),
    })
}

/// Response policies may not set `Host`; it only has meaning on requests.
fn headers_policy(
    policy: Option<&httpproxy::HeadersPolicy>,
    response: bool,
) -> Result<Option<HeadersPolicy>, Error> {
    let Some(policy) = policy else {
        return Ok(None);
    };

    let mut headers = HeadersPolicy::default();
    for httpproxy::HeaderValue { name, value } in &policy.set {
        let key = header_name(name)?;
        if response && key == http::header::HOST {
            return Err(Error::ResponseHostRewrite);
        }
        let value = http::HeaderValue::from_str(value)
            .map_err(|_| Error::InvalidHeaderValue(name.clone()))?;
        headers.set.push((key, value));
    }
    for name in &policy.remove {
        headers.remove.push(header_name(name)?);
    }

    Ok(Some(headers).filter(|h| !h.is_empty()))
}

fn header_name(name: &str) -> Result<http::HeaderName, Error> {
    http::HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| Error::InvalidHeaderName(name.to_string()))
}

fn http_health_check(policy: &httpproxy::HttpHealthCheckPolicy) -> Result<HttpHealthCheck, Error> {
    if policy.path.is_empty() {
        return Err(Error::HealthCheckWithoutPath);
    }
    let mut hc = HttpHealthCheck::new(&policy.path);
    hc.host = policy
        .host
        .clone()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| DEFAULT_HEALTH_CHECK_HOST.to_string());
    hc.interval = seconds_or(policy.interval_seconds, hc.interval);
    hc.timeout = seconds_or(policy.timeout_seconds, hc.timeout);
    hc.unhealthy_threshold = count_or(policy.unhealthy_threshold_count, hc.unhealthy_threshold);
    hc.healthy_threshold = count_or(policy.healthy_threshold_count, hc.healthy_threshold);
    Ok(hc)
}

pub(super) fn tcp_health_check(policy: &httpproxy::TcpHealthCheckPolicy) -> TcpHealthCheck {
    let defaults = TcpHealthCheck::default();
    TcpHealthCheck {
        interval: seconds_or(policy.interval_seconds, defaults.interval),
        timeout: seconds_or(policy.timeout_seconds, defaults.timeout),
        unhealthy_threshold: count_or(
            policy.unhealthy_threshold_count,
            defaults.unhealthy_threshold,
        ),
        healthy_threshold: count_or(policy.healthy_threshold_count, defaults.healthy_threshold),
    }
}

fn seconds_or(secs: i64, default: Duration) -> Duration {
    u64::try_from(secs)
        .ok()
        .filter(|s| *s > 0)
        .map_or(default, Duration::from_secs)
}

fn count_or(count: i64, default: u32) -> u32 {
    u32::try_from(count)
        .ok()
        .filter(|c| *c > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(name: &str, value: &str) -> httpproxy::HeadersPolicy {
        httpproxy::HeadersPolicy {
            set: vec![httpproxy::HeaderValue {
                name: name.to_string(),
                value: value.to_string(),
            }],
            remove: vec![],
        }
    }

    #[test]
    fn host_may_only_be_set_on_requests() {
        let policy = set("Host", "example.com");
        let request = headers_policy(Some(&policy), false)
            .unwrap()
            .expect("policy must not be empty");
        assert!(request.sets(&http::header::HOST));

        assert_eq!(
            headers_policy(Some(&policy), true),
            Err(Error::ResponseHostRewrite)
        );
    }

    #[test]
    fn rejects_invalid_header_names() {
        let policy = set("bad header", "x");
        assert_eq!(
            headers_policy(Some(&policy), false),
            Err(Error::InvalidHeaderName("bad header".to_string()))
        );
    }

    #[test]
    fn scoped_replacements_win() {
        let replacements = vec![
            httpproxy::ReplacePrefix {
                prefix: None,
                replacement: "/".to_string(),
            },
            httpproxy::ReplacePrefix {
                prefix: Some("/v2".to_string()),
                replacement: "/api/v2".to_string(),
            },
        ];
        assert_eq!(
            replacement_for(&replacements, "/v2").as_deref(),
            Some("/api/v2")
        );
        assert_eq!(replacement_for(&replacements, "/v1").as_deref(), Some("/"));
        assert_eq!(replacement_for(&[], "/v1"), None);
    }

    #[test]
    fn parses_timeouts_and_retries() {
        let policy = timeout_policy(&httpproxy::TimeoutPolicy {
            response: Some("infinity".to_string()),
            idle: Some("1m30s".to_string()),
        })
        .unwrap();
        assert_eq!(policy.response, Timeout::Infinite);
        assert_eq!(policy.idle, Timeout::Duration(Duration::from_secs(90)));

        let err = timeout_policy(&httpproxy::TimeoutPolicy {
            response: Some("10 parsecs".to_string()),
            idle: None,
        })
        .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTimeout {
                field: "timeoutPolicy.response",
                ..
            }
        ));

        let retry = retry_policy(&httpproxy::RetryPolicy::default()).unwrap();
        assert_eq!(retry, RetryPolicy::default());
    }

    #[test]
    fn health_check_thresholds_share_defaults() {
        let tcp = tcp_health_check(&httpproxy::TcpHealthCheckPolicy {
            interval_seconds: 10,
            timeout_seconds: -1,
            unhealthy_threshold_count: 0,
            healthy_threshold_count: 5,
        });
        assert_eq!(
            tcp,
            TcpHealthCheck {
                interval: Duration::from_secs(10),
                unhealthy_threshold: 3,
                healthy_threshold: 5,
                ..TcpHealthCheck::default()
            }
        );

        let http = http_health_check(&httpproxy::HttpHealthCheckPolicy {
            path: "/healthz".to_string(),
            unhealthy_threshold_count: -2,
            healthy_threshold_count: 5,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(http.unhealthy_threshold, tcp.unhealthy_threshold);
        assert_eq!(http.healthy_threshold, tcp.healthy_threshold);
        assert_eq!(http.timeout, tcp.timeout);
    }
}
