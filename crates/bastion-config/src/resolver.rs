//! Upstream resolution: turns the `[upstream]` section plus boot-time
//! overrides into the single base URL the gateway talks to.
//!
//! Precedence (first match wins):
//! 1. explicit override URL (CLI `--upstream` / `BASTION_UPSTREAM_URL`)
//! 2. `upstream.base_url`
//! 3. override environment name (CLI `--env` / `BASTION_ENVIRONMENT`)
//! 4. `upstream.environment`
//! 5. the built-in production URL

use std::time::Duration;

use url::Url;

use crate::{BastionConfig, ConfigError, PRODUCTION_UPSTREAM_URL, Result};

/// Boot-time overrides, typically from CLI flags or environment variables.
#[derive(Debug, Clone, Default)]
pub struct UpstreamOverrides {
    pub base_url: Option<String>,
    pub environment: Option<String>,
}

/// A fully resolved upstream target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUpstream {
    /// Absolute http(s) base URL. The path has no trailing slash unless it is `/`.
    pub base_url: Url,
    /// Environment name, if the URL came from a named environment.
    pub environment: Option<String>,
    /// Request timeout, if configured.
    pub timeout: Option<Duration>,
    /// How the URL was resolved.
    pub resolved_from: ResolvedFrom,
}

/// Tracks how the upstream URL was resolved for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedFrom {
    /// Explicit override URL.
    Override,
    /// `upstream.base_url` in config.
    BaseUrl,
    /// Named environment (from override or config).
    Environment(String),
    /// Built-in default.
    Default,
}

impl std::fmt::Display for ResolvedFrom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedFrom::Override => write!(f, "override (--upstream / BASTION_UPSTREAM_URL)"),
            ResolvedFrom::BaseUrl => write!(f, "[upstream] base_url"),
            ResolvedFrom::Environment(name) => write!(f, "upstream environment '{}'", name),
            ResolvedFrom::Default => write!(f, "built-in default"),
        }
    }
}

/// Resolve the upstream API target.
pub fn resolve_upstream(
    config: &BastionConfig,
    overrides: &UpstreamOverrides,
) -> Result<ResolvedUpstream> {
    let upstream = config.upstream();
    let timeout = upstream.timeout_secs.map(Duration::from_secs);

    let non_empty = |s: &Option<String>| {
        s.as_deref()
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
    };

    let (url, environment, resolved_from) = if let Some(url) = non_empty(&overrides.base_url) {
        (url, None, ResolvedFrom::Override)
    } else if let Some(url) = non_empty(&upstream.base_url) {
        (url, None, ResolvedFrom::BaseUrl)
    } else if let Some(name) =
        non_empty(&overrides.environment).or_else(|| non_empty(&upstream.environment))
    {
        let all = upstream.all_environments();
        let url = all
            .get(&name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownEnvironment {
                name: name.clone(),
                available: all.keys().cloned().collect::<Vec<_>>().join(", "),
            })?;
        (url, Some(name.clone()), ResolvedFrom::Environment(name))
    } else {
        (PRODUCTION_UPSTREAM_URL.to_string(), None, ResolvedFrom::Default)
    };

    Ok(ResolvedUpstream {
        base_url: normalize_base_url(&url)?,
        environment,
        timeout,
        resolved_from,
    })
}

/// Parse an upstream base URL and drop trailing slashes from its path.
fn normalize_base_url(raw: &str) -> Result<Url> {
    let invalid = |reason: &str| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must not contain a query or fragment"));
    }

    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);
    Ok(url)
}
