//! Decides when a page navigation should release an actor's leases.
//!
//! An actor who leaves an edit view without saving would otherwise keep
//! their lease until it times out. The web layer reports each navigation
//! here; anything that is not an editable view the actor may change drops
//! all of that actor's leases. Assets, uploads and background requests are
//! exempt since they do not mean the actor left the page.

use serde::{Deserialize, Serialize};

/// Path prefixes that never trigger a release.
pub const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &[
    "/jsi18n/",
    "/admin/jsi18n/",
    "/media/",
    "/static/",
    "/stats/",
    "/favicon.ico",
    "/login/",
];

/// Path suffixes that never trigger a release.
pub const DEFAULT_EXCLUDED_SUFFIXES: &[&str] = &["-upload/", ".pdf"];

/// Query-string marker that opts a request out of lease handling.
pub const BYPASS_MARKER: &str = "nolock";

/// A navigation event as seen by the web layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    pub path: String,
    #[serde(default)]
    pub query: String,
    /// Background (XHR) request
    #[serde(default)]
    pub ajax: bool,
    /// The target is an edit view and the actor holds change permission on it
    #[serde(default)]
    pub editable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExemptReason {
    Ajax,
    ExcludedPrefix,
    ExcludedSuffix,
    BypassMarker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NavigationVerdict {
    /// Ignore this request entirely
    Exempt(ExemptReason),
    /// The actor is still on an editable view; keep their leases
    Keep,
    /// The actor left; release all their leases
    Release,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePolicy {
    excluded_prefixes: Vec<String>,
    excluded_suffixes: Vec<String>,
}

impl Default for ReleasePolicy {
    fn default() -> Self {
        Self {
            excluded_prefixes: DEFAULT_EXCLUDED_PREFIXES.iter().map(|s| s.to_string()).collect(),
            excluded_suffixes: DEFAULT_EXCLUDED_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ReleasePolicy {
    /// Default rules plus extra excluded prefixes.
    pub fn with_excluded_prefixes<I, P>(extra: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let mut policy = Self::default();
        policy.excluded_prefixes.extend(extra.into_iter().map(Into::into));
        policy
    }

    pub fn evaluate(&self, navigation: &Navigation) -> NavigationVerdict {
        if let Some(reason) = self.exemption(navigation) {
            tracing::debug!(path = %navigation.path, ?reason, "navigation exempt from lease handling");
            return NavigationVerdict::Exempt(reason);
        }

        if navigation.editable {
            NavigationVerdict::Keep
        } else {
            NavigationVerdict::Release
        }
    }

    fn exemption(&self, navigation: &Navigation) -> Option<ExemptReason> {
        let path = navigation.path.as_str();

        if navigation.ajax {
            Some(ExemptReason::Ajax)
        } else if self.excluded_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            Some(ExemptReason::ExcludedPrefix)
        } else if self.excluded_suffixes.iter().any(|s| path.ends_with(s.as_str())) {
            Some(ExemptReason::ExcludedSuffix)
        } else if navigation.query.contains(BYPASS_MARKER) {
            Some(ExemptReason::BypassMarker)
        } else {
            None
        }
    }
}

/// The address a lease is recorded under: the first `X-Forwarded-For` hop
/// when a proxy supplied one, otherwise the socket peer.
pub fn client_address(forwarded_for: Option<&str>, peer: &str) -> String {
    forwarded_for
        .and_then(|header| header.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
        .unwrap_or(peer)
        .to_string()
}
