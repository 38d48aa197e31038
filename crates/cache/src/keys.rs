//! Well-known key families.
//!
//! Key shapes are part of the external contract: the schema-refresh
//! endpoint deletes exactly the key the resolver writes, and the hostname
//! mapping is seeded by tooling outside this repo.

/// Per-tenant schema snapshot, refreshed hourly.
pub fn schema(tenant: &str) -> String {
    format!("schema:{tenant}")
}

/// Cached trace + config for one component on one page.
pub fn trace(tenant: &str, page_uri: &str, component_type: &str, block_index: usize) -> String {
    format!("trace:{tenant}:{page_uri}:{component_type}:{block_index}")
}

/// Hostname to tenant mapping, written by deployment tooling.
pub fn origin(hostname: &str) -> String {
    format!("origin:{}", hostname.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_shapes() {
        assert_eq!(schema("visitgeelong"), "schema:visitgeelong");
        assert_eq!(
            trace("visitgeelong", "/stay", "products", 2),
            "trace:visitgeelong:/stay:products:2"
        );
        assert_eq!(origin("Visitgeelong.COM.au"), "origin:visitgeelong.com.au");
    }
}
