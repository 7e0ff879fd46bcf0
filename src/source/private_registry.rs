//! Registry root detection for lockfile-resolved tarball URLs

use crate::domain::Credentials;

/// Derives the registry root from a resolved tarball URL.
///
/// Rules apply in order: Gemfury `/~/` marker, MyGet `/<name>/-/<name>`
/// marker, Nexus/Artifactory `/<name>/-/<basename>` marker, the longest
/// matching `npm_registry` credential, and finally `scheme://host`.
pub fn registry_url_for(resolved_url: &str, name: &str, credentials: &Credentials) -> String {
    let basename = name.rsplit('/').next().unwrap_or(name);
    let markers = [
        "/~/".to_string(),
        format!("/{name}/-/{name}"),
        format!("/{name}/-/{basename}"),
    ];

    for marker in &markers {
        if let Some(idx) = resolved_url.find(marker.as_str()) {
            return resolved_url[..idx].to_string();
        }
    }

    if let Some(url) = url_for_relevant_credential(resolved_url, credentials) {
        return url;
    }

    resolved_url.split('/').take(3).collect::<Vec<_>>().join("/")
}

/// Truncates the URL right after the longest credential registry it contains
fn url_for_relevant_credential(resolved_url: &str, credentials: &Credentials) -> Option<String> {
    let registry = credentials.registry_for_url(resolved_url)?.registry.as_deref()?;
    let idx = resolved_url.find(registry)?;
    Some(format!("{}{}", &resolved_url[..idx], registry))
}
