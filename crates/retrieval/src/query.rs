//! Search query construction.

use lantern_core::{Domain, ParsedIntent, Tenant};

/// Build the retrieval query: the raw question plus a domain descriptor,
/// and a theme hint when the tenant is known so the embedding space
/// prefers that site's chunks.
pub fn build_query(intent: &ParsedIntent, tenant: Option<&Tenant>) -> String {
    let mut parts = vec![intent.raw_question.clone()];

    match intent.domain {
        Domain::AtdwImport => {
            parts.push(
                "ATDW product import: how products are fetched, filtered by region and \
                 postcode, mapped to categories, and saved as entries"
                    .to_string(),
            );
        }
        Domain::PageComponent | Domain::General => {
            parts.push(format!(
                "How does the {} component work: which settings select, exclude, order \
                 and limit the entries it displays",
                intent.component_type
            ));
        }
    }

    if let Some(tenant) = tenant {
        parts.push(format!("site theme: {tenant}"));
    }

    parts.join("\n")
}
