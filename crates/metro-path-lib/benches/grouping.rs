//! Performance benchmarks for metro-path-lib
//!
//! Run with: cargo bench --package metro-path-lib

use chrono::NaiveTime;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use metro_path_lib::{
    Edge, MarkerHandle, MarkerSpec, OverlayReconciler, PolylineHandle, PolylineSpec,
    RenderSurface, Stop, TimeAnnotator, group_path,
};

/// Generate a path of `num_edges` hops, changing line every `run` hops and
/// walking between rides.
fn generate_path(num_edges: usize, run: usize) -> Vec<Edge> {
    let stops: Vec<Stop> = (0..=num_edges)
        .map(|i| {
            let t = i as f64 / num_edges as f64;
            Stop::new(format!("Stop {i}"), 48.80 + t * 0.1, 2.25 + t * 0.2)
        })
        .collect();

    stops
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let edge = Edge::new(pair[0].clone(), pair[1].clone(), 21_600 + i as u32 * 90);
            if i % (run + 1) == run {
                edge
            } else {
                let line = (i / (run + 1)) % 14 + 1;
                edge.on_line(line.to_string(), "Terminus")
            }
        })
        .collect()
}

/// Surface that only hands out handles
#[derive(Default)]
struct NullSurface {
    next_id: u64,
}

impl RenderSurface for NullSurface {
    fn add_marker(&mut self, _spec: &MarkerSpec) -> MarkerHandle {
        self.next_id += 1;
        MarkerHandle::from_raw(self.next_id)
    }

    fn remove_marker(&mut self, _handle: MarkerHandle) {}

    fn add_polyline(&mut self, _spec: &PolylineSpec) -> PolylineHandle {
        self.next_id += 1;
        PolylineHandle::from_raw(self.next_id)
    }

    fn remove_polyline(&mut self, _handle: PolylineHandle) {}

    fn open_popup(&mut self, _anchor: &MarkerHandle) {}

    fn close_popup(&mut self) {}
}

fn bench_group_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_path");

    for num_edges in [50, 1_000, 10_000] {
        let edges = generate_path(num_edges, 8);
        group.throughput(Throughput::Elements(num_edges as u64));
        group.bench_with_input(BenchmarkId::from_parameter(num_edges), &edges, |b, edges| {
            b.iter(|| group_path(edges));
        });
    }

    group.finish();
}

fn bench_set_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_path");

    let segments = group_path(&generate_path(1_000, 8));
    group.bench_function("1k_edges", |b| {
        let mut overlay = OverlayReconciler::default();
        let mut surface = NullSurface::default();
        b.iter(|| overlay.set_path(&segments, &[], &mut surface));
    });

    group.finish();
}

fn bench_itinerary(c: &mut Criterion) {
    let mut group = c.benchmark_group("itinerary");

    let segments = group_path(&generate_path(1_000, 8));
    let departure = NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN);
    group.bench_function("legs_1k_edges", |b| {
        b.iter(|| TimeAnnotator::new(departure, &segments).legs());
    });

    group.finish();
}

criterion_group!(benches, bench_group_path, bench_set_path, bench_itinerary);

criterion_main!(benches);
