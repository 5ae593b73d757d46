use airwrite::recognition::{LetterClassifier, TemplateClassifier};
use airwrite::stroke::geometry::{normalize, resample};
use airwrite::stroke::{Point2, StrokeConfig, Trajectory, TrajectoryBuffer};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// A wobbly "U" sampled at camera rate: `n` raw fingertip points.
fn raw_stroke(n: usize) -> Vec<Point2> {
    (0..n)
        .map(|i| {
            let t = i as f32 / (n - 1) as f32 * std::f32::consts::PI;
            let wobble = (i as f32 * 0.7).sin() * 0.004;
            Point2::new(0.5 - 0.2 * t.cos() + wobble, 0.3 + 0.25 * t.sin())
        })
        .collect()
}

fn trajectory(n: usize) -> Option<Trajectory> {
    let mut buffer = TrajectoryBuffer::new(StrokeConfig::default());
    let points = raw_stroke(n);
    let (first, rest) = points.split_first()?;
    buffer.begin(*first, 0);
    for (i, point) in rest.iter().enumerate() {
        buffer.add_point(*point, (i as u64 + 1) * 33);
    }
    buffer.finish().ok()
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_resample");
    for n in [20usize, 60, 240] {
        let points = raw_stroke(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &points, |b, points| {
            b.iter(|| resample(&normalize(black_box(points), 1.0), 32))
        });
    }
    group.finish();
}

fn bench_finish(c: &mut Criterion) {
    c.bench_function("buffer_finish_60", |b| b.iter(|| trajectory(black_box(60))));
}

fn bench_classify(c: &mut Criterion) {
    let Ok(classifier) = TemplateClassifier::builtin() else {
        eprintln!("Skipping classify benchmark: built-in templates invalid");
        return;
    };
    let Some(stroke) = trajectory(60) else {
        eprintln!("Skipping classify benchmark: stroke discarded");
        return;
    };
    c.bench_function("template_classify", |b| {
        b.iter(|| classifier.classify(black_box(&stroke)))
    });
}

criterion_group!(benches, bench_normalize, bench_finish, bench_classify);
criterion_main!(benches);
