use super::Error;
use ingress_controller_core::{HeaderCondition, HeaderMatch, ResourceKind};
use ingress_controller_k8s_api::httpproxy::{HeaderMatchCondition, MatchCondition};

/// Match conditions accumulated along an include chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(super) struct Conditions {
    prefix: Option<String>,
    headers: Vec<HeaderCondition>,
}

// === impl Conditions ===

impl Conditions {
    /// Adds a route's or include's conditions to those inherited from its includers.
    ///
    /// HTTPProxy prefixes are relative and concatenate. IngressRoute prefixes are absolute and
    /// must stay within the delegated prefix.
    pub(super) fn merge(
        &self,
        kind: ResourceKind,
        conditions: &[MatchCondition],
    ) -> Result<Self, Error> {
        let mut prefixes = conditions.iter().filter_map(|c| c.prefix.as_deref());
        let prefix = prefixes.next();
        if prefixes.next().is_some() {
            return Err(Error::MultiplePrefixes);
        }

        let mut merged = self.clone();
        if let Some(prefix) = prefix {
            if !prefix.starts_with('/') {
                return Err(Error::InvalidPrefix(prefix.to_string()));
            }
            merged.prefix = Some(match kind {
                ResourceKind::HttpProxy => join_prefix(self.prefix(), prefix),
                ResourceKind::IngressRoute => {
                    if !prefix.starts_with(self.prefix()) {
                        return Err(Error::PrefixOutsideDelegation {
                            prefix: prefix.to_string(),
                            delegated: self.prefix().to_string(),
                        });
                    }
                    prefix.to_string()
                }
            });
        }

        for condition in conditions {
            match (&condition.prefix, &condition.header) {
                (Some(_), None) => {}
                (None, Some(header)) => merged.headers.push(header_condition(header)?),
                _ => return Err(Error::EmptyCondition),
            }
        }
        merged.headers.sort();
        merged.headers.dedup();

        Ok(merged)
    }

    /// The rendered path prefix. Routes without a prefix match everything.
    pub(super) fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("/")
    }

    pub(super) fn headers(&self) -> &[HeaderCondition] {
        &self.headers
    }
}

fn join_prefix(parent: &str, child: &str) -> String {
    let child = child.trim_start_matches('/');
    if child.is_empty() {
        return parent.to_string();
    }
    format!("{}/{}", parent.trim_end_matches('/'), child)
}

fn header_condition(header: &HeaderMatchCondition) -> Result<HeaderCondition, Error> {
    let name = header.name.trim().to_ascii_lowercase();
    if name.is_empty() {
        return Err(Error::InvalidHeaderCondition(header.name.clone()));
    }

    let mut matches = Vec::with_capacity(1);
    if header.present {
        matches.push(HeaderMatch::Present);
    }
    if let Some(v) = &header.contains {
        matches.push(HeaderMatch::Contains(v.clone()));
    }
    if let Some(v) = &header.not_contains {
        matches.push(HeaderMatch::NotContains(v.clone()));
    }
    if let Some(v) = &header.exact {
        matches.push(HeaderMatch::Exact(v.clone()));
    }
    if let Some(v) = &header.not_exact {
        matches.push(HeaderMatch::NotExact(v.clone()));
    }

    match <[HeaderMatch; 1]>::try_from(matches) {
        Ok([kind]) => Ok(HeaderCondition { name, kind }),
        Err(_) => Err(Error::InvalidHeaderCondition(header.name.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(name: &str, exact: &str) -> MatchCondition {
        MatchCondition {
            prefix: None,
            header: Some(HeaderMatchCondition {
                name: name.to_string(),
                exact: Some(exact.to_string()),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn prefixes_concatenate() {
        let root = Conditions::default();
        assert_eq!(root.prefix(), "/");

        let blog = root
            .merge(ResourceKind::HttpProxy, &[MatchCondition::prefix("/blog")])
            .unwrap();
        assert_eq!(blog.prefix(), "/blog");

        let posts = blog
            .merge(ResourceKind::HttpProxy, &[MatchCondition::prefix("/posts/")])
            .unwrap();
        assert_eq!(posts.prefix(), "/blog/posts/");

        let index = blog
            .merge(ResourceKind::HttpProxy, &[MatchCondition::prefix("/")])
            .unwrap();
        assert_eq!(index.prefix(), "/blog");
    }

    #[test]
    fn headers_accumulate() {
        let canary = Conditions::default()
            .merge(ResourceKind::HttpProxy, &[header("X-Canary", "true")])
            .unwrap();
        let both = canary
            .merge(
                ResourceKind::HttpProxy,
                &[MatchCondition::prefix("/api"), header("x-tenant", "a")],
            )
            .unwrap();
        assert_eq!(both.prefix(), "/api");
        assert_eq!(
            both.headers(),
            [
                HeaderCondition::new("x-canary", HeaderMatch::Exact("true".to_string())),
                HeaderCondition::new("x-tenant", HeaderMatch::Exact("a".to_string())),
            ]
        );
    }

    #[test]
    fn rejects_two_prefixes() {
        let err = Conditions::default()
            .merge(
                ResourceKind::HttpProxy,
                &[MatchCondition::prefix("/a"), MatchCondition::prefix("/b")],
            )
            .unwrap_err();
        assert_eq!(err, Error::MultiplePrefixes);
    }

    #[test]
    fn rejects_ambiguous_header_matches() {
        let cond = MatchCondition {
            prefix: None,
            header: Some(HeaderMatchCondition {
                name: "x-a".to_string(),
                present: true,
                exact: Some("b".to_string()),
                ..Default::default()
            }),
        };
        let err = Conditions::default()
            .merge(ResourceKind::HttpProxy, &[cond])
            .unwrap_err();
        assert_eq!(err, Error::InvalidHeaderCondition("x-a".to_string()));
    }

    #[test]
    fn ingressroute_prefixes_are_absolute() {
        let blog = Conditions::default()
            .merge(ResourceKind::IngressRoute, &[MatchCondition::prefix("/blog")])
            .unwrap();
        let posts = blog
            .merge(ResourceKind::IngressRoute, &[MatchCondition::prefix("/blog/posts")])
            .unwrap();
        assert_eq!(posts.prefix(), "/blog/posts");

        let err = blog
            .merge(ResourceKind::IngressRoute, &[MatchCondition::prefix("/admin")])
            .unwrap_err();
        assert_eq!(
            err,
            Error::PrefixOutsideDelegation {
                prefix: "/admin".to_string(),
                delegated: "/blog".to_string(),
            }
        );
    }
}
