//! Component and import-record configurations.

use serde::{Deserialize, Serialize};

/// A related element as stored in the relations table: id plus title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedItem {
    pub id: i64,
    pub title: String,
}

impl RelatedItem {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// Result ordering of a products component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "alphabetically")]
    Alphabetically,
    #[serde(rename = "eventDate")]
    EventDate,
    #[serde(rename = "random")]
    Random,
}

impl SortOrder {
    /// Parse the stored field value, falling back to alphabetical for
    /// anything unrecognised.
    pub fn from_field(value: Option<&str>) -> Self {
        match value {
            Some("eventDate") => Self::EventDate,
            Some("random") => Self::Random,
            _ => Self::Alphabetically,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alphabetically => "alphabetically",
            Self::EventDate => "eventDate",
            Self::Random => "random",
        }
    }
}

/// The resolved settings of one products component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentConfig {
    pub categories: Vec<RelatedItem>,
    pub regions: Vec<RelatedItem>,
    pub tiers: Vec<RelatedItem>,
    pub taxonomy: Vec<RelatedItem>,
    pub explicit_products: Vec<RelatedItem>,
    pub exclude_products: Vec<RelatedItem>,
    pub limit: i64,
    pub order: SortOrder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
}

impl ComponentConfig {
    /// Whether any automatic filter dimension is active. Explicit products
    /// are additions, not filters.
    pub fn has_active_filters(&self) -> bool {
        !self.categories.is_empty()
            || !self.regions.is_empty()
            || !self.tiers.is_empty()
            || !self.taxonomy.is_empty()
    }
}

/// One configured import region and its postcode set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionPostcodes {
    pub region: String,
    pub postcodes: Vec<String>,
}

/// Snapshot of an external ATDW product record and its import state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtdwImportConfig {
    pub product_id: String,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atdw_status: Option<String>,
    pub imported: bool,
    pub has_entry: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organisation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub configured_regions: Vec<RegionPostcodes>,
    #[serde(default)]
    pub matching_regions: Vec<String>,
    #[serde(default)]
    pub mapped_categories: Vec<String>,
    #[serde(default)]
    pub unmapped_classifications: Vec<String>,
    #[serde(default)]
    pub entry_categories: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_parses_stored_values() {
        assert_eq!(SortOrder::from_field(Some("eventDate")), SortOrder::EventDate);
        assert_eq!(SortOrder::from_field(Some("random")), SortOrder::Random);
        assert_eq!(
            SortOrder::from_field(Some("alphabetically")),
            SortOrder::Alphabetically
        );
        assert_eq!(SortOrder::from_field(None), SortOrder::Alphabetically);
        assert_eq!(SortOrder::from_field(Some("??")), SortOrder::Alphabetically);
    }

    #[test]
    fn explicit_products_are_not_filters() {
        let config = ComponentConfig {
            explicit_products: vec![RelatedItem::new(1, "A")],
            ..Default::default()
        };
        assert!(!config.has_active_filters());

        let config = ComponentConfig {
            regions: vec![RelatedItem::new(2, "Mallee")],
            ..Default::default()
        };
        assert!(config.has_active_filters());
    }
}
