// Criterion benchmarks for the discovery core

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nestdrive_discovery::core::geo::haversine_distance;
use nestdrive_discovery::core::scoring::relevance_score;
use nestdrive_discovery::core::sort_candidates;
use nestdrive_discovery::models::{
    CandidateItem, GeoPoint, PropertyListing, PropertyPrice, Rating, ScoredCandidate, SortMode,
    ViewerContext,
};

fn candidate(id: usize) -> CandidateItem {
    CandidateItem::Property(PropertyListing {
        id: id.to_string(),
        title: format!("Property {}", id),
        description: Some("Bright rental close to transit".to_string()),
        city: if id % 3 == 0 { "Delhi" } else { "Mumbai" }.to_string(),
        state: Some("DL".to_string()),
        address: None,
        category: "apartment".to_string(),
        price: PropertyPrice {
            per_month: Some(800.0 + (id % 50) as f64 * 10.0),
            per_week: None,
            per_day: None,
        },
        rating: Rating {
            avg: (id % 5) as f64,
            count: (id % 20) as u32,
        },
        featured: id % 7 == 0,
        available: true,
        coordinates: Some(GeoPoint {
            lat: 28.6 + (id % 100) as f64 * 0.001,
            lng: 77.2 + (id % 100) as f64 * 0.001,
        }),
        images: vec![],
        bedrooms: None,
        bathrooms: None,
        created_at: Some(Utc::now()),
    })
}

fn viewer() -> ViewerContext {
    let mut viewer = ViewerContext::default();
    viewer.home_city = Some("Delhi".to_string());
    for id in (0..200).step_by(13) {
        viewer.favorite_ids.insert(id.to_string());
    }
    viewer
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_distance", |b| {
        b.iter(|| {
            haversine_distance(
                black_box(28.6139),
                black_box(77.2090),
                black_box(19.0760),
                black_box(72.8777),
            )
        });
    });
}

fn bench_relevance_score(c: &mut Criterion) {
    let item = candidate(0);
    let ctx = viewer();

    c.bench_function("relevance_score", |b| {
        b.iter(|| relevance_score(black_box(&item), black_box(&ctx), black_box(4.2)));
    });
}

fn bench_sort_candidates(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_candidates");

    for size in [100usize, 1000, 2000] {
        let base: Vec<ScoredCandidate> = (0..size)
            .map(|i| ScoredCandidate {
                item: candidate(i),
                score: ((i * 31) % 997) as f64,
                distance_km: Some(((i * 17) % 500) as f64 / 10.0),
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("relevance", size), &base, |b, base| {
            b.iter(|| {
                let mut set = base.clone();
                sort_candidates(&mut set, SortMode::Relevance);
                set
            });
        });

        group.bench_with_input(BenchmarkId::new("price_asc", size), &base, |b, base| {
            b.iter(|| {
                let mut set = base.clone();
                sort_candidates(&mut set, SortMode::PriceAsc);
                set
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_haversine_distance,
    bench_relevance_score,
    bench_sort_candidates
);
criterion_main!(benches);
