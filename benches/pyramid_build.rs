//! Benchmarks for the tile pyramid hot paths.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure:
//! - Cubic convolution sampling
//! - Rendering one top-level tile through a transform
//! - Folding four tiles into one

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgba, RgbaImage};
use std::hint::black_box;

use tinpyramid::{
    geometry::units_per_pixel, sample_cubic, AffineTransform, DownsampleFilter, EdgePolicy, MaxZoomRenderer,
    MemoryTileStore, PyramidDownsampler, RenderOptions, TileBounds, TileIndex, TileStore,
};

fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8, 255]))
}

/// Rotated mapping at zoom-14 resolution
fn rotated() -> AffineTransform {
    let u = units_per_pixel(14);
    let (s, c) = 0.3_f64.sin_cos();
    AffineTransform::new([u * c, u * s, 0.0, u * s, -u * c, 0.0]).expect("valid affine")
}

/// Benchmark single-pixel sampling inside and at the edge of the image
fn bench_sample_cubic(c: &mut Criterion) {
    let source = gradient(1024, 1024);
    let mut group = c.benchmark_group("sample_cubic");

    for (name, x, y) in [("interior", 512.37, 300.81), ("edge", -0.4, 1023.6)] {
        group.bench_with_input(BenchmarkId::new("point", name), &(x, y), |b, &(x, y)| {
            b.iter(|| sample_cubic(black_box(&source), black_box(x), black_box(y), EdgePolicy::Transparent));
        });
    }

    group.finish();
}

/// Benchmark rendering a single 256×256 tile
fn bench_render_tile(c: &mut Criterion) {
    let source = gradient(2048, 2048);
    let transform = rotated();
    let mut group = c.benchmark_group("render_tile");
    group.sample_size(20);

    for edge in [EdgePolicy::Transparent, EdgePolicy::Clamp] {
        let options = RenderOptions::default().with_edge_policy(edge);
        let renderer = MaxZoomRenderer::new(&transform, &source, options);
        group.bench_with_input(BenchmarkId::new("edge", format!("{edge:?}")), &edge, |b, _| {
            b.iter(|| renderer.render_tile(black_box(TileIndex::new(14, 8192, 8191))));
        });
    }

    group.finish();
}

/// Benchmark composing one tile from four parents with each resize filter
fn bench_compose_tile(c: &mut Criterion) {
    let parents = TileBounds::new(10, 0, 1, 0, 1).expect("valid bounds");
    let mut store = MemoryTileStore::new();
    for t in parents.tiles() {
        store.write_tile(t, &gradient(256, 256)).expect("memory store write");
    }

    let mut group = c.benchmark_group("compose_tile");
    for filter in [DownsampleFilter::Nearest, DownsampleFilter::Triangle, DownsampleFilter::CatmullRom] {
        let downsampler = PyramidDownsampler::new(filter);
        group.bench_with_input(BenchmarkId::new("filter", format!("{filter:?}")), &filter, |b, _| {
            b.iter(|| downsampler.compose_tile(black_box(TileIndex::new(9, 0, 0)), &parents, &store));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sample_cubic, bench_render_tile, bench_compose_tile);
criterion_main!(benches);
