// src/utils/url.rs

//! URL helpers for strategy routing.

use url::Url;

/// Check whether a URL's host falls under the given domain pattern.
///
/// Matches the domain itself and any subdomain (`zhihu.com` matches
/// `www.zhihu.com` but not `notzhihu.com`). URLs that fail to parse fall
/// back to a substring check so routing still works on odd inputs.
pub fn matches_domain(url: &str, domain: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => host == domain || host.ends_with(&format!(".{domain}")),
            None => false,
        },
        Err(_) => url.contains(domain),
    }
}
