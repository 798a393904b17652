//! Maps an inbound host name to the property that owns it.
//!
//! "No match" is a normal outcome (platform/dashboard access), so resolution
//! never fails the request: lookup errors are logged and treated as no match.

use axum::http::{header, HeaderMap};

use crate::config::TenancyConfig;
use crate::database::models::Property;
use crate::database::{PropertyStore, Store};

/// The property resolved for this request, if any.
#[derive(Debug, Clone, Default)]
pub struct CurrentProperty(pub Option<Property>);

/// Removes a trailing `:port`, handling bracketed IPv6 literals.
pub fn strip_port(host: &str) -> &str {
    let host = host.trim();
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    match host.rsplit_once(':') {
        // a bare IPv6 literal has several colons and no port
        Some((name, _port)) if !name.contains(':') => name,
        _ => host,
    }
}

/// Host the request is addressed to: the proxy override header when present
/// and non-empty, otherwise `Host`. Port removed.
pub fn request_host(headers: &HeaderMap, config: &TenancyConfig) -> Option<String> {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header_value(&config.host_override_header)
        .or_else(|| header_value(header::HOST.as_str()))
        .map(|h| strip_port(h).to_string())
        .filter(|h| !h.is_empty())
}

/// Looks up the active property whose custom domain equals `host` exactly.
/// Reserved hosts short-circuit to `None` without touching the store.
pub async fn resolve(store: &dyn Store, config: &TenancyConfig, host: Option<&str>) -> Option<Property> {
    let host = host?;
    if config.is_reserved(host) {
        return None;
    }

    match store.find_by_custom_domain(host).await {
        Ok(Some(property)) => {
            tracing::info!("Domain resolved: {} -> property '{}' ({})", host, property.name, property.id);
            Some(property)
        }
        Ok(None) => {
            tracing::warn!("Domain not found: {}", host);
            None
        }
        Err(e) => {
            tracing::error!("Domain lookup failed for '{}': {}", host, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::testing::Fixtures;
    use axum::http::HeaderValue;

    #[test]
    fn strips_ports() {
        assert_eq!(strip_port("pousada.com.br:8080"), "pousada.com.br");
        assert_eq!(strip_port("pousada.com.br"), "pousada.com.br");
        assert_eq!(strip_port("[::1]:3000"), "::1");
        assert_eq!(strip_port("::1"), "::1");
    }

    #[test]
    fn override_header_wins_over_host() {
        let config = TenancyConfig::default();
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost:8000"));
        assert_eq!(request_host(&headers, &config).as_deref(), Some("localhost"));

        headers.insert("x-tenant-host", HeaderValue::from_static("pousada.com.br"));
        assert_eq!(request_host(&headers, &config).as_deref(), Some("pousada.com.br"));

        headers.insert("x-tenant-host", HeaderValue::from_static("  "));
        assert_eq!(request_host(&headers, &config).as_deref(), Some("localhost"));
    }

    #[tokio::test]
    async fn resolves_exact_domain_of_active_property() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let owner = fx.user("owner").await;
        let mut p = fx.property(&owner, "Pousada Vista da Serra").await;
        p.custom_domain = Some("pousadavistadaserra.com.br".to_string());
        store.update_property(&p, None).await.unwrap();

        let config = TenancyConfig::default();
        let found = resolve(&store, &config, Some("pousadavistadaserra.com.br")).await;
        assert_eq!(found.map(|p| p.id), Some(p.id));

        // case-sensitive, exact
        assert!(resolve(&store, &config, Some("PousadaVistaDaSerra.com.br")).await.is_none());
        assert!(resolve(&store, &config, Some("www.pousadavistadaserra.com.br")).await.is_none());
        assert!(resolve(&store, &config, None).await.is_none());
    }

    #[tokio::test]
    async fn inactive_and_reserved_hosts_never_match() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let owner = fx.user("owner").await;

        let mut p = fx.property(&owner, "Pousada Fechada").await;
        p.custom_domain = Some("fechada.com.br".to_string());
        p.is_active = false;
        store.update_property(&p, None).await.unwrap();

        let mut q = fx.property(&owner, "Pousada Local").await;
        q.custom_domain = Some("localhost".to_string());
        store.update_property(&q, None).await.unwrap();

        let config = TenancyConfig::default();
        assert!(resolve(&store, &config, Some("fechada.com.br")).await.is_none());
        assert!(resolve(&store, &config, Some("localhost")).await.is_none());
        assert!(resolve(&store, &config, Some("app.seuservico.com")).await.is_none());
    }
}
