use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pbj_wrapped::prelude::*;
use std::sync::{Arc, OnceLock};

const FACILITIES_PER_STATE: usize = 300;

// Built once and shared by every benchmark
static DATASET: OnceLock<WrappedDataset> = OnceLock::new();

fn entity_row(key: &str, quarter: &str, total: f64) -> RawEntityRow {
    RawEntityRow {
        entity: key.to_string(),
        quarter: quarter.to_string(),
        facility_count: Some(FACILITIES_PER_STATE as u32),
        avg_daily_census: Some(20_000.0),
        total_hprd: Some(total),
        direct_care_hprd: Some(total * 0.9),
        rn_hprd: Some(total * 0.2),
        rn_direct_care_hprd: Some(total * 0.15),
        contract_percent: Some(10.0),
        ..Default::default()
    }
}

// Deterministic spread of staffing values
fn spread(seed: usize) -> f64 {
    2.0 + ((seed * 7919) % 250) as f64 / 100.0
}

fn quarter_input(tag: &str, shift: usize) -> QuarterInput {
    let mut input = QuarterInput::new(QuarterTag::parse(tag).expect("valid quarter"));
    input.national.push(entity_row("usa", tag, 3.8));
    for (s, state) in StateCode::ALL.iter().enumerate() {
        input.states.push(entity_row(state.as_code(), tag, spread(s + shift)));
        for i in 0..FACILITIES_PER_STATE {
            let id = format!("{:02}{:04}", s + 1, i);
            let total = spread(s * FACILITIES_PER_STATE + i + shift);
            input.facilities.push(RawFacilityRow {
                facility_id: id.clone(),
                state: state.as_code().to_string(),
                quarter: tag.to_string(),
                total_hprd: Some(total),
                direct_care_hprd: Some(total * 0.9),
                rn_hprd: Some(total * 0.25),
                rn_direct_care_hprd: Some(total * 0.2),
                contract_percent: Some(8.0),
                census: Some(20.0 + (i % 120) as f64),
            });
            input.providers.push(RawProviderRow {
                facility_id: id,
                name: format!("Facility {} {}", state.as_code(), i),
                state: state.as_code().to_string(),
                ownership: ["For profit - Corporation", "Non profit - Corporation", "Government - County"][i % 3]
                    .to_string(),
                regulatory_status: if (i + shift) % 97 == 0 { "SFF".to_string() } else { String::new() },
                case_mix_expected_hprd: Some(3.5),
                ..Default::default()
            });
        }
    }
    for n in 1..=10 {
        input.regions.push(entity_row(&format!("region{}", n), tag, spread(n + shift)));
    }
    input
}

fn get_dataset() -> &'static WrappedDataset {
    DATASET.get_or_init(|| {
        let dataset = DatasetBuilder::new()
            .observer(Arc::new(NullObserver))
            .current(quarter_input("2025Q2", 0))
            .prior(quarter_input("2025Q1", 13))
            .build()
            .expect("Failed to build benchmark dataset");
        println!("Benchmark dataset: {} facilities", dataset.current.facilities.len());
        dataset
    })
}

fn benchmark_dataset_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("dataset_build");
    group.sample_size(10);

    let current = quarter_input("2025Q2", 0);
    let prior = quarter_input("2025Q1", 13);
    group.bench_function("ingest_and_index_two_quarters", |b| {
        b.iter(|| {
            DatasetBuilder::new()
                .observer(Arc::new(NullObserver))
                .current(black_box(current.clone()))
                .prior(black_box(prior.clone()))
                .build()
                .expect("build")
        })
    });

    group.finish();
}

fn benchmark_single_scope(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_scope");
    let dataset = get_dataset();
    let engine = WrappedEngine::new(dataset).with_observer(Arc::new(NullObserver));

    for identifier in ["usa", "california", "region-9"] {
        group.bench_with_input(BenchmarkId::new("summarize", identifier), identifier, |b, id| {
            b.iter(|| engine.summarize(black_box(id)).expect("summary"))
        });
    }

    group.finish();
}

fn benchmark_all_scopes(c: &mut Criterion) {
    let mut group = c.benchmark_group("all_scopes");
    group.sample_size(10);
    let dataset = get_dataset();
    let engine = WrappedEngine::new(dataset).with_observer(Arc::new(NullObserver));

    group.bench_function("summarize_all", |b| b.iter(|| engine.summarize_all()));

    group.bench_function("cache_warm_hits", |b| {
        let cache = SummaryCache::new();
        for scope in WrappedEngine::all_scopes() {
            let _ = cache.get_or_compute(&engine, scope);
        }
        b.iter(|| cache.summarize(&engine, black_box("texas")).expect("cached"))
    });

    group.finish();
}

fn benchmark_normalize(c: &mut Criterion) {
    c.bench_function("normalize_identifier", |b| {
        b.iter(|| {
            for id in ["New York", "new-york", "NY", "region_2", "usa", "district of columbia"] {
                black_box(normalize(black_box(id)));
            }
        })
    });
}

criterion_group!(
    benches,
    benchmark_normalize,
    benchmark_dataset_build,
    benchmark_single_scope,
    benchmark_all_scopes
);
criterion_main!(benches);
