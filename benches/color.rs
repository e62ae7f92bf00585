use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use framesmith::{
    color::convert_planes,
    fields::{FieldKind, FieldParams, FieldSynthesizer, Synthesizer},
    session::{SessionRequest, SessionValidator},
};

fn planes(len: usize) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    let hue = (0..len).map(|i| (i % 997) as f32 / 997.0).collect();
    let sat = (0..len).map(|i| 0.5 + 0.5 * ((i % 13) as f32 / 13.0)).collect();
    let val = (0..len).map(|i| ((i % 101) as f32 / 100.0) * 1.1).collect();
    (hue, sat, val)
}

fn bench_convert_planes(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert_planes");
    for (width, height) in [(640usize, 360usize), (1920, 1080)] {
        let len = width * height;
        let (hue, sat, val) = planes(len);
        let mut rgb = vec![0u8; len * 3];

        group.throughput(Throughput::Elements(len as u64));
        group.bench_function(BenchmarkId::from_parameter(format!("{}x{}", width, height)), |b| {
            b.iter(|| {
                convert_planes(black_box(&hue), &sat, &val, &mut rgb, width)
                    .unwrap_or_else(|e| panic!("convert_planes failed: {e}"));
            })
        });
    }
    group.finish();
}

fn bench_field_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_step");
    for kind in [FieldKind::Flow, FieldKind::Vortex, FieldKind::Starfield, FieldKind::Gradient] {
        let request = SessionRequest {
            width: 640,
            height: 360,
            seed: Some(7),
            field: FieldParams::defaults_for(kind),
            ..SessionRequest::default()
        };
        let session = SessionValidator::new()
            .validate(&request)
            .unwrap_or_else(|e| panic!("invalid bench session: {e}"));
        let mut field = Synthesizer::init(&session);
        let mut t = 0.0;

        group.bench_function(kind.as_str(), |b| {
            b.iter(|| {
                t += 1.0 / 30.0;
                black_box(field.step(t).unwrap_or_else(|e| panic!("step failed: {e}")));
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_convert_planes, bench_field_step);
criterion_main!(benches);
