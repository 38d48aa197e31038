//! Trace steps.
//!
//! A trace is an ordered sequence of verifiable snapshots emitted while a
//! collector walks the platform's data. Each step records the surviving
//! product set and whether the asked-about targets are still in it.
//! Interpretation of the steps is left to the generator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The closed vocabulary of trace steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    // Page-component filter chain, in execution order.
    ResolveCategories,
    ResolveRegions,
    RegionToProducts,
    ResolveTaxonomy,
    MainQuery,
    MergeExplicit,
    ApplyExcludes,
    Sort,
    Limit,
    /// Generic block readout; also used when no block matched.
    BlockConfig,
    // Import-domain collector, in execution order.
    AtdwLookup,
    AtdwRegionConfig,
    AtdwPostcodeMatch,
    AtdwStatusEval,
    AtdwCategoryMapping,
    AtdwEntryState,
    AtdwEntryLink,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResolveCategories => "resolve_categories",
            Self::ResolveRegions => "resolve_regions",
            Self::RegionToProducts => "region_to_products",
            Self::ResolveTaxonomy => "resolve_taxonomy",
            Self::MainQuery => "main_query",
            Self::MergeExplicit => "merge_explicit",
            Self::ApplyExcludes => "apply_excludes",
            Self::Sort => "sort",
            Self::Limit => "limit",
            Self::BlockConfig => "block_config",
            Self::AtdwLookup => "atdw_lookup",
            Self::AtdwRegionConfig => "atdw_region_config",
            Self::AtdwPostcodeMatch => "atdw_postcode_match",
            Self::AtdwStatusEval => "atdw_status_eval",
            Self::AtdwCategoryMapping => "atdw_category_mapping",
            Self::AtdwEntryState => "atdw_entry_state",
            Self::AtdwEntryLink => "atdw_entry_link",
        }
    }

    /// Human label used when rendering a trace into a prompt. These are the
    /// only step names the language model ever sees.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ResolveCategories => "Category selection",
            Self::ResolveRegions => "Region selection",
            Self::RegionToProducts => "Products found in the selected regions",
            Self::ResolveTaxonomy => "Experience-type selection",
            Self::MainQuery => "Combined filter result",
            Self::MergeExplicit => "Hand-picked products added",
            Self::ApplyExcludes => "Excluded products removed",
            Self::Sort => "Ordering",
            Self::Limit => "Display limit",
            Self::BlockConfig => "Component settings",
            Self::AtdwLookup => "ATDW record lookup",
            Self::AtdwRegionConfig => "Configured import regions",
            Self::AtdwPostcodeMatch => "Postcode check",
            Self::AtdwStatusEval => "Import status",
            Self::AtdwCategoryMapping => "Category mapping",
            Self::AtdwEntryState => "Website listing state",
            Self::AtdwEntryLink => "Website listing link",
        }
    }
}

/// One verifiable snapshot in a trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStep {
    pub step: StepKind,
    pub description: String,
    pub count: usize,
    #[serde(default)]
    pub product_ids: Vec<i64>,
    /// `Some(true)` if any target survives this step, `Some(false)` if
    /// targets were supplied and none survive, `None` when no targets were
    /// supplied or the step has no meaningful product set.
    pub target_present: Option<bool>,
    #[serde(default)]
    pub details: Map<String, Value>,
}

impl TraceStep {
    /// A step with no product set (configuration readouts and the like).
    pub fn info(step: StepKind, description: impl Into<String>) -> Self {
        Self {
            step,
            description: description.into(),
            count: 0,
            product_ids: Vec::new(),
            target_present: None,
            details: Map::new(),
        }
    }

    /// A step whose product set is the current surviving set. `count` is
    /// kept equal to the set size and the target predicate is evaluated
    /// against the supplied targets.
    pub fn with_products(
        step: StepKind,
        description: impl Into<String>,
        product_ids: Vec<i64>,
        targets: &[i64],
    ) -> Self {
        let target_present = target_presence(&product_ids, targets);
        Self {
            step,
            description: description.into(),
            count: product_ids.len(),
            product_ids,
            target_present,
            details: Map::new(),
        }
    }

    /// Attach a detail entry, keeping the builder-style call sites terse.
    pub fn detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Override the target predicate for steps where presence is defined by
    /// something other than the product set (e.g. the postcode check).
    pub fn with_target_present(mut self, present: Option<bool>) -> Self {
        self.target_present = present;
        self
    }
}

/// `None` when no targets were supplied, otherwise whether any target id
/// appears in the set.
pub fn target_presence(set: &[i64], targets: &[i64]) -> Option<bool> {
    if targets.is_empty() {
        None
    } else {
        Some(targets.iter().any(|t| set.contains(t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_tracks_product_ids() {
        let step = TraceStep::with_products(
            StepKind::MainQuery,
            "combined filters",
            vec![1, 2, 3],
            &[],
        );
        assert_eq!(step.count, step.product_ids.len());
        assert_eq!(step.target_present, None);
    }

    #[test]
    fn target_predicate() {
        assert_eq!(target_presence(&[1, 2], &[]), None);
        assert_eq!(target_presence(&[1, 2], &[2]), Some(true));
        assert_eq!(target_presence(&[1, 2], &[9]), Some(false));
        assert_eq!(target_presence(&[], &[9]), Some(false));
    }

    #[test]
    fn wire_names_are_camel_case() {
        let step = TraceStep::with_products(StepKind::ApplyExcludes, "x", vec![7], &[7]);
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["step"], "apply_excludes");
        assert_eq!(value["productIds"][0], 7);
        assert_eq!(value["targetPresent"], true);
    }
}
