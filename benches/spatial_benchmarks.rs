use compactness::compute::adjacency::find_neighbours_with;
use compactness::compute::hierarchy::find_parents_with;
use compactness::{Region, RegionCollection, SpatialIndex, compute_scores};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geo::{Rect, coord, polygon};

/// `side * side` unit squares tiling a grid.
fn grid(side: usize) -> RegionCollection {
    (0..side * side)
        .map(|i| {
            let x = (i % side) as f64;
            let y = (i / side) as f64;
            Region::from_polygon(polygon![
                (x: x, y: y),
                (x: x + 1.0, y: y),
                (x: x + 1.0, y: y + 1.0),
                (x: x, y: y + 1.0),
            ])
        })
        .collect()
}

fn cell(i: usize) -> Rect<f64> {
    let x = (i % 100) as f64;
    let y = (i / 100) as f64;
    Rect::new(coord! { x: x, y: y }, coord! { x: x + 1.0, y: y + 1.0 })
}

fn benchmark_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");

    for size in [1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("bulk", size), &size, |b, &size| {
            b.iter(|| {
                let mut index = SpatialIndex::new();
                for i in 0..size {
                    index.insert_deferred(cell(i), i);
                }
                index.build();
                black_box(index.len())
            })
        });

        group.bench_with_input(BenchmarkId::new("incremental", size), &size, |b, &size| {
            b.iter(|| {
                let mut index = SpatialIndex::new();
                for i in 0..size {
                    index.insert(cell(i), i);
                }
                black_box(index.len())
            })
        });
    }

    let index = SpatialIndex::bulk_load((0..10_000).map(|i| (cell(i), i)));
    let window = Rect::new(coord! { x: 40.0, y: 40.0 }, coord! { x: 45.0, y: 45.0 });
    group.bench_function("query_window", |b| {
        b.iter(|| black_box(index.query(black_box(&window))))
    });

    group.finish();
}

fn benchmark_neighbours(c: &mut Criterion) {
    let mut group = c.benchmark_group("neighbours");
    group.sample_size(20);

    for side in [20, 50] {
        let regions = grid(side);
        group.bench_with_input(BenchmarkId::new("sequential", side), &regions, |b, regions| {
            b.iter(|| {
                let mut regions = regions.clone();
                find_neighbours_with(&mut regions, 0.0, false).unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("parallel", side), &regions, |b, regions| {
            b.iter(|| {
                let mut regions = regions.clone();
                find_neighbours_with(&mut regions, 0.0, true).unwrap()
            })
        });
    }

    group.finish();
}

fn benchmark_parents_and_scores(c: &mut Criterion) {
    let mut group = c.benchmark_group("parents_and_scores");
    group.sample_size(10);

    let subunits = grid(30);
    let superunits: RegionCollection = (0..9)
        .map(|i| {
            let x = (i % 3) as f64 * 10.0;
            let y = (i / 3) as f64 * 10.0;
            Region::from_polygon(polygon![
                (x: x, y: y),
                (x: x + 10.0, y: y),
                (x: x + 10.0, y: y + 10.0),
                (x: x, y: y + 10.0),
            ])
        })
        .collect();

    group.bench_function("find_parents", |b| {
        b.iter(|| {
            let mut subunits = subunits.clone();
            find_parents_with(&mut subunits, &superunits, 0.0, 0.5, true).unwrap()
        })
    });

    group.bench_function("convex_hull_scores", |b| {
        let names = vec!["CvxHullPTB".to_string()];
        b.iter(|| {
            let mut subunits = subunits.clone();
            compute_scores(&mut subunits, &superunits, None, &names).unwrap()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_index_build,
    benchmark_neighbours,
    benchmark_parents_and_scores
);
criterion_main!(benches);
