//! URL normalization for company websites and LinkedIn profiles.
//!
//! Tracked companies are keyed by their normalized website, so every code path
//! that stores or compares a website goes through [`normalize_website`].

use regex::Regex;
use url::Url;

use crate::errors::CoreError;

const LINKEDIN_URL_PATTERN: &str =
    r"(?i)^(?:https?://)?(?:[a-z]{2,3}\.)?(?:www\.)?linkedin\.com/(.+)$";

/// Strip protocol, `www.`, query, fragment and trailing slashes; lowercase.
#[must_use]
pub fn strip_url(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let rest = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    rest[..end].trim_end_matches('/').to_string()
}

/// Canonical website form: `https://` + stripped URL.
#[must_use]
pub fn normalize_website(raw: &str) -> String {
    format!("https://{}", strip_url(raw))
}

/// Scheme and host of a website, used to compare two company websites.
///
/// `https://acme.com/about` and `http://www.acme.com` share the root
/// `https://acme.com`.
#[must_use]
pub fn url_root(raw: &str) -> String {
    let normalized = normalize_website(raw);
    match Url::parse(&normalized) {
        Ok(url) => match url.host_str() {
            Some(host) => format!("https://{host}"),
            None => normalized,
        },
        Err(_) => {
            let stripped = strip_url(raw);
            let host = stripped.split('/').next().unwrap_or_default();
            format!("https://{host}")
        }
    }
}

/// True when `raw` parses as an absolute http(s) URL with a dotted host.
#[must_use]
pub fn is_valid_website(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https")
            && url.host_str().is_some_and(|host| host.contains('.'))
    })
}

/// Normalize a LinkedIn URL to `https://www.linkedin.com/<path>`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidUrl`] when the URL is not a LinkedIn URL.
pub fn normalize_linkedin_url(raw: &str) -> Result<String, CoreError> {
    let pattern = Regex::new(LINKEDIN_URL_PATTERN).map_err(anyhow::Error::from)?;
    let captures = pattern
        .captures(raw.trim())
        .ok_or_else(|| CoreError::InvalidUrl {
            url: raw.to_string(),
            reason: "not a linkedin.com URL".to_string(),
        })?;
    let path = captures.get(1).map_or("", |m| m.as_str());
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = path[..end].trim_end_matches('/');
    if path.is_empty() {
        return Err(CoreError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing profile path".to_string(),
        });
    }
    Ok(format!("https://www.linkedin.com/{path}"))
}
