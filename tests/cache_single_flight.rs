mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::*;
use pbj_wrapped::prelude::*;

#[test]
fn test_concurrent_requests_compute_once() {
    let dataset = dataset();
    let engine = WrappedEngine::new(&dataset);
    let cache = SummaryCache::new();
    let barrier = Barrier::new(8);

    let summaries: Vec<Arc<ScopeSummary>> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let (engine, cache, barrier) = (&engine, &cache, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    let identifier = if i % 2 == 0 { "new-york" } else { "NY" };
                    cache.summarize(engine, identifier).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(cache.computations(), 1);
    assert_eq!(cache.len(), 1);
    assert!(summaries.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
fn test_distinct_scopes_cached_separately() {
    let dataset = dataset();
    let engine = WrappedEngine::new(&dataset);
    let cache = SummaryCache::new();

    let usa = cache.summarize(&engine, "usa").unwrap();
    cache.summarize(&engine, "region-2").unwrap();
    cache.summarize(&engine, "usa").unwrap();
    assert_eq!(cache.computations(), 2);

    let cached = cache.get(&engine, Scope::Usa).unwrap();
    assert!(Arc::ptr_eq(&usa, &cached));

    cache.clear();
    assert!(cache.is_empty());
    assert!(cache.get(&engine, Scope::Usa).is_none());
}

#[test]
fn test_failures_are_not_cached() {
    let dataset = dataset();
    let engine = WrappedEngine::new(&dataset);
    let cache = SummaryCache::new();

    assert!(cache.summarize(&engine, "wyoming").is_err());
    assert!(cache.summarize(&engine, "wyoming").is_err());
    assert_eq!(cache.computations(), 2);
    assert!(cache.get(&engine, Scope::State(StateCode::WY)).is_none());
    assert!(cache.is_empty());

    // unresolvable input never reaches the cache
    assert!(cache.summarize(&engine, "atlantis").is_err());
    assert_eq!(cache.computations(), 2);
}

#[test]
fn test_engines_with_different_settings_share_a_cache() {
    let dataset = dataset();
    let cache = SummaryCache::new();
    let default_engine = WrappedEngine::new(&dataset);
    let low_floor = ConfigBuilder::new().min_census(5.0).build().unwrap();
    let low_floor_engine = WrappedEngine::new(&dataset).with_config(low_floor);

    let strict = cache.summarize(&default_engine, "NY").unwrap();
    let relaxed = cache.summarize(&low_floor_engine, "NY").unwrap();
    assert_eq!(cache.computations(), 2);
    assert_eq!(cache.len(), 2);
    assert!(!Arc::ptr_eq(&strict, &relaxed));

    // the 10-resident facility only clears the lower floor
    assert!(!ids(&strict.extremes.lowest_by_hprd).contains(&"335003"));
    assert_eq!(ids(&relaxed.extremes.lowest_by_hprd)[0], "335003");

    cache.summarize(&low_floor_engine, "new york").unwrap();
    assert_eq!(cache.computations(), 2);
}

#[test]
fn test_separate_datasets_are_not_confused() {
    let with_prior = dataset();
    let without_prior = dataset_without_prior();
    let cache = SummaryCache::new();

    let first = cache.summarize(&WrappedEngine::new(&with_prior), "NJ").unwrap();
    let second = cache.summarize(&WrappedEngine::new(&without_prior), "NJ").unwrap();
    assert_eq!(cache.computations(), 2);
    assert!(first.trends.has_prior_data);
    assert!(!second.trends.has_prior_data);
}
