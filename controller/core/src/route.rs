use crate::{duration, upstream::Cluster};
use std::{str::FromStr, time::Duration};

/// Identifies a route within a virtual host by its rendered match conditions.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteKey {
    pub prefix: String,
    pub headers: Vec<HeaderCondition>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Route {
    /// The path prefix this route matches. Every route has one; `/` matches everything.
    pub prefix: String,

    /// ANDed together. Kept sorted so that equivalent condition sets compare equal.
    pub header_conditions: Vec<HeaderCondition>,

    pub clusters: Vec<Cluster>,
    pub mirror: Option<Cluster>,

    pub websocket: bool,

    /// Redirects plain HTTP requests to HTTPS.
    pub https_upgrade: bool,

    pub timeout_policy: TimeoutPolicy,
    pub retry_policy: Option<RetryPolicy>,

    /// Replaces `prefix` before the request is forwarded.
    pub prefix_rewrite: Option<String>,

    pub request_headers: Option<HeadersPolicy>,
    pub response_headers: Option<HeadersPolicy>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeaderCondition {
    pub name: String,
    pub kind: HeaderMatch,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeaderMatch {
    Present,
    Contains(String),
    NotContains(String),
    Exact(String),
    NotExact(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub response: Timeout,
    pub idle: Timeout,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Timeout {
    /// Use the proxy's default.
    #[default]
    Default,

    /// Never time out.
    Infinite,

    Duration(Duration),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_on: Vec<String>,
    pub num_retries: u32,
    pub per_try_timeout: Timeout,
    pub retriable_status_codes: Vec<u32>,
}

/// Header mutations applied to a request or response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeadersPolicy {
    pub set: Vec<(http::HeaderName, http::HeaderValue)>,
    pub remove: Vec<http::HeaderName>,
}

// === impl Route ===

impl Route {
    pub fn new(prefix: impl ToString) -> Self {
        Self {
            prefix: prefix.to_string(),
            ..Default::default()
        }
    }

    pub fn key(&self) -> RouteKey {
        RouteKey {
            prefix: self.prefix.clone(),
            headers: self.header_conditions.clone(),
        }
    }
}

// === impl HeaderCondition ===

impl HeaderCondition {
    pub fn new(name: impl ToString, kind: HeaderMatch) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

// === impl Timeout ===

impl FromStr for Timeout {
    type Err = duration::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("infinity") {
            return Ok(Self::Infinite);
        }
        duration::parse(s).map(Self::Duration)
    }
}

impl Timeout {
    /// Parses an optional timeout. An absent or empty value uses the proxy default.
    pub fn parse_opt(s: Option<&str>) -> Result<Self, duration::ParseError> {
        match s {
            None => Ok(Self::Default),
            Some(s) if s.trim().is_empty() => Ok(Self::Default),
            Some(s) => s.parse(),
        }
    }
}

// === impl RetryPolicy ===

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_on: vec!["5xx".to_string()],
            num_retries: 1,
            per_try_timeout: Timeout::Default,
            retriable_status_codes: Vec::new(),
        }
    }
}

// === impl HeadersPolicy ===

impl HeadersPolicy {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty()
    }

    pub fn sets(&self, name: &http::HeaderName) -> bool {
        self.set.iter().any(|(n, _)| n == name)
    }
}
