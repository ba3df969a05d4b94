use criterion::{criterion_group, criterion_main, Criterion};
use rusty_annotator::{
    brush_engine::{
        brush::{paint_circle, BrushMode},
        stroke::StrokeState,
    },
    canvas::raster::{FillPolicy, LabelRaster},
};
use std::hint::black_box;

fn bench_disk(c: &mut Criterion) {
    let mut raster = LabelRaster::new(1024, 1024);

    c.bench_function("disk_r50_1024px", |b| {
        b.iter(|| {
            paint_circle(
                &mut raster,
                Some(1),
                black_box(512),
                black_box(512),
                50,
                BrushMode::Add,
                FillPolicy::Overwrite,
            )
        });
    });
}

fn bench_stroke(c: &mut Criterion) {
    let mut raster = LabelRaster::new(1024, 1024);
    let path: Vec<(i32, i32)> = (0..64).map(|i| (100 + i * 12, 300 + (i % 8) * 20)).collect();

    c.bench_function("stroke_64_samples_r15", |b| {
        b.iter(|| {
            let mut stroke = StrokeState::new(BrushMode::Add);
            for &pos in &path {
                black_box(stroke.add_point(&mut raster, Some(2), pos, 15, 3, FillPolicy::OnlyEmpty));
            }
            stroke.end();
        });
    });
}

criterion_group!(benches, bench_disk, bench_stroke);
criterion_main!(benches);
