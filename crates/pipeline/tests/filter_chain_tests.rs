//! Behavioural tests for the products filter chain.

mod common;

use common::{block, schema, tenant, FakeStore};
use lantern_core::trace::StepKind;
use lantern_pipeline::run_filter_chain;
use serde_json::json;

fn step<'a>(
    outcome: &'a lantern_pipeline::ChainOutcome,
    kind: StepKind,
) -> &'a lantern_core::trace::TraceStep {
    outcome
        .trace
        .iter()
        .find(|s| s.step == kind)
        .unwrap_or_else(|| panic!("missing step {kind:?}"))
}

fn store_with_region_products() -> FakeStore {
    let mut store = FakeStore::with_schema();
    // Region 50 (Mallee) covers postcodes 3585/3584; products 1 and 2 are
    // found by postcode, product 3 by direct relation. Yarra Lodge (9) is
    // in no region.
    store
        .region_postcode_field
        .insert(50, vec!["3585".to_string(), "3584".to_string()]);
    store.postcode_products.insert("3585".to_string(), vec![1]);
    store.postcode_products.insert("3584".to_string(), vec![2]);
    store.relation_products.insert(50, vec![2, 3]);
    for (id, title) in [
        (1, "Big River Cruises"),
        (2, "Lake Boga Motel"),
        (3, "Apex Park"),
        (9, "Yarra Lodge"),
    ] {
        store.titles.insert(id, title.to_string());
    }
    store
}

#[tokio::test]
async fn region_filter_excludes_target_from_region_step_onward() {
    let store = store_with_region_products();
    let block = block(
        "products",
        &[("includeRegions", &[(50, "Mallee")])],
        &[("limit", json!(6)), ("order", json!("alphabetically"))],
    );

    let outcome = run_filter_chain(&store, &tenant(), &schema(), &block, &[9])
        .await
        .unwrap();

    assert_eq!(outcome.trace.len(), 9);

    let region_step = step(&outcome, StepKind::RegionToProducts);
    assert_eq!(region_step.count, 3);
    assert_eq!(region_step.target_present, Some(false));
    assert_eq!(region_step.details["postcodes"], json!(["3585", "3584"]));

    // Once absent, the target stays absent through the chain.
    for kind in [
        StepKind::MainQuery,
        StepKind::MergeExplicit,
        StepKind::ApplyExcludes,
        StepKind::Sort,
        StepKind::Limit,
    ] {
        assert_eq!(step(&outcome, kind).target_present, Some(false), "{kind:?}");
    }

    let final_step = step(&outcome, StepKind::Limit);
    assert!(final_step.count <= 6);
    // Alphabetical: Apex Park, Big River Cruises, Lake Boga Motel.
    assert_eq!(final_step.product_ids, vec![3, 1, 2]);
    assert_eq!(
        final_step.details["products"][0],
        json!({"id": 3, "title": "Apex Park"})
    );
}

#[tokio::test]
async fn explicit_products_only_skip_the_main_query() {
    let mut store = FakeStore::with_schema();
    store.titles.insert(21, "Beta Lodge".to_string());
    store.titles.insert(22, "Alpha Farm".to_string());
    let block = block(
        "products",
        &[("includeProducts", &[(21, "Beta Lodge"), (22, "Alpha Farm")])],
        &[("limit", json!(4)), ("order", json!("alphabetically"))],
    );

    let outcome = run_filter_chain(&store, &tenant(), &schema(), &block, &[])
        .await
        .unwrap();

    assert_eq!(step(&outcome, StepKind::MainQuery).count, 0);
    assert_eq!(
        step(&outcome, StepKind::MergeExplicit).product_ids,
        vec![21, 22]
    );
    assert_eq!(
        step(&outcome, StepKind::ApplyExcludes).product_ids,
        vec![21, 22]
    );
    // No targets supplied: the predicate stays unset everywhere.
    assert!(outcome.trace.iter().all(|s| s.target_present.is_none()));
    assert_eq!(step(&outcome, StepKind::Limit).product_ids, vec![22, 21]);
}

#[tokio::test]
async fn excludes_subtract_and_limit_slices() {
    let mut store = FakeStore::with_schema();
    store.relation_products.insert(70, vec![1, 2, 3, 4]);
    for (id, title) in [(1, "A"), (2, "B"), (3, "C"), (4, "D")] {
        store.titles.insert(id, title.to_string());
    }
    let block = block(
        "products",
        &[
            ("includeCategories", &[(70, "Stay")]),
            ("excludeProducts", &[(2, "B")]),
        ],
        &[("limit", json!(2)), ("order", json!("alphabetically"))],
    );

    let outcome = run_filter_chain(&store, &tenant(), &schema(), &block, &[2])
        .await
        .unwrap();

    let merged = step(&outcome, StepKind::MergeExplicit);
    let excluded = step(&outcome, StepKind::ApplyExcludes);
    let limited = step(&outcome, StepKind::Limit);

    // Pure subtraction and slicing keep subsets of their predecessor.
    assert!(excluded.product_ids.iter().all(|id| merged.product_ids.contains(id)));
    assert!(limited.product_ids.iter().all(|id| excluded.product_ids.contains(id)));

    assert_eq!(merged.target_present, Some(true));
    assert_eq!(excluded.target_present, Some(false));
    assert_eq!(excluded.product_ids, vec![1, 3, 4]);
    assert_eq!(limited.product_ids, vec![1, 3]);
}

#[tokio::test]
async fn limit_zero_emits_all_steps_and_an_empty_final_set() {
    let mut store = FakeStore::with_schema();
    store.relation_products.insert(70, vec![1, 2]);
    store.titles.insert(1, "A".to_string());
    store.titles.insert(2, "B".to_string());
    let block = block(
        "products",
        &[("includeCategories", &[(70, "Stay")])],
        &[("limit", json!(0))],
    );

    let outcome = run_filter_chain(&store, &tenant(), &schema(), &block, &[])
        .await
        .unwrap();

    assert_eq!(outcome.trace.len(), 9);
    assert_eq!(step(&outcome, StepKind::Sort).count, 2);
    let final_step = step(&outcome, StepKind::Limit);
    assert_eq!(final_step.count, 0);
    assert!(final_step.product_ids.is_empty());
}

#[tokio::test]
async fn ancestor_categories_are_stripped_before_filtering() {
    let mut store = FakeStore::with_schema();
    // 60 is the parent of 61; only the deepest selection should filter.
    store.parents.insert(61, 60);
    store.relation_products.insert(60, vec![1, 2, 3]);
    store.relation_products.insert(61, vec![2]);
    store.titles.insert(2, "B".to_string());
    let block = block(
        "products",
        &[("includeCategories", &[(60, "Stay"), (61, "Motels")])],
        &[("limit", json!(10))],
    );

    let outcome = run_filter_chain(&store, &tenant(), &schema(), &block, &[])
        .await
        .unwrap();

    let resolve = step(&outcome, StepKind::ResolveCategories);
    assert_eq!(resolve.details["selected"], json!(["Motels"]));
    assert_eq!(resolve.details["removedAncestors"], json!(1));
    assert_eq!(step(&outcome, StepKind::MainQuery).product_ids, vec![2]);
}

#[tokio::test]
async fn empty_region_expansion_does_not_block_other_filters() {
    let mut store = FakeStore::with_schema();
    // Region 50 exists but matches nothing; category 70 still filters.
    store.region_postcode_field.insert(50, vec![]);
    store.relation_products.insert(70, vec![4]);
    store.titles.insert(4, "D".to_string());
    let block = block(
        "products",
        &[
            ("includeRegions", &[(50, "Mallee")]),
            ("includeCategories", &[(70, "Stay")]),
        ],
        &[("limit", json!(10))],
    );

    let outcome = run_filter_chain(&store, &tenant(), &schema(), &block, &[])
        .await
        .unwrap();

    assert_eq!(step(&outcome, StepKind::RegionToProducts).count, 0);
    assert_eq!(step(&outcome, StepKind::MainQuery).product_ids, vec![4]);
    assert_eq!(step(&outcome, StepKind::Limit).product_ids, vec![4]);
}

#[tokio::test]
async fn region_and_category_filters_intersect() {
    let store = {
        let mut store = store_with_region_products();
        // Category 70 relates products 2 and 9; region set is {1, 2, 3}.
        store.relation_products.insert(70, vec![2, 9]);
        store
    };
    let block = block(
        "products",
        &[
            ("includeRegions", &[(50, "Mallee")]),
            ("includeCategories", &[(70, "Stay")]),
        ],
        &[("limit", json!(10))],
    );

    let outcome = run_filter_chain(&store, &tenant(), &schema(), &block, &[])
        .await
        .unwrap();

    assert_eq!(step(&outcome, StepKind::MainQuery).product_ids, vec![2]);
}

#[tokio::test]
async fn event_date_order_comes_from_the_store() {
    let mut store = FakeStore::with_schema();
    store.relation_products.insert(70, vec![1, 2, 3]);
    for (id, title) in [(1, "A"), (2, "B"), (3, "C")] {
        store.titles.insert(id, title.to_string());
    }
    store.event_order = vec![3, 1, 2];
    let block = block(
        "products",
        &[("includeCategories", &[(70, "Events")])],
        &[("limit", json!(10)), ("order", json!("eventDate"))],
    );

    let outcome = run_filter_chain(&store, &tenant(), &schema(), &block, &[])
        .await
        .unwrap();

    assert_eq!(step(&outcome, StepKind::Sort).product_ids, vec![3, 1, 2]);
    assert!(step(&outcome, StepKind::Sort)
        .description
        .contains("event date"));
}
