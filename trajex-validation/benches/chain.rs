use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use trajex_core::{Point, Rectangle, SessionContext, Shape};
use trajex_validation::{
    Axis, CurvesValidator, GlobalSpeedValidator, MovementAngleValidator, RegionValidator, SpeedValidator,
    TrialDurationValidator, ValidatorChain,
};

fn full_chain() -> ValidatorChain {
    let ctx = SessionContext::default();
    let mut chain = ValidatorChain::new();
    chain.add(TrialDurationValidator::new(10.0, &ctx));
    chain.add(SpeedValidator::new(&ctx).with_axis(Axis::Y).with_limits(Some(1.0), Some(1e6)));
    chain.add(
        GlobalSpeedValidator::new(&ctx)
            .with_path(Axis::Y, -300.0, 300.0)
            .with_max_movement_time(10.0),
    );
    chain.add(CurvesValidator::new(&ctx).with_max_curves(1000));
    chain.add(MovementAngleValidator::new(&ctx));
    chain.add(RegionValidator::new(
        Shape::Rectangle(Rectangle::new(Point::ORIGIN, 1024.0, 768.0)),
        &ctx,
    ));
    chain
}

/// A slightly wavy upward movement, one sample per 60 Hz frame.
fn trajectory(frames: usize) -> Vec<(Point, f64)> {
    (0..frames)
        .map(|i| {
            let t = i as f64 / 60.0;
            (Point::new((t * 6.0).sin() * 20.0, -300.0 + t * 300.0), t)
        })
        .collect()
}

pub fn bench_chain(c: &mut Criterion) {
    let mut g = c.benchmark_group("validator_chain");
    let samples = trajectory(120);

    g.bench_function("evaluate_trial_120_frames", |b| {
        b.iter_batched(
            full_chain,
            |mut chain| {
                chain.reset(0.0);
                for &(p, t) in &samples {
                    let _ = black_box(chain.evaluate(p, t));
                }
            },
            BatchSize::SmallInput,
        )
    });

    g.bench_function("evaluate_single_frame", |b| {
        let mut chain = full_chain();
        chain.reset(0.0);
        let mut t = 0.0;
        b.iter(|| {
            t += 1e-6;
            let _ = black_box(chain.evaluate(Point::new(0.0, -300.0 + t), t));
        })
    });

    g.finish();
}

criterion_group!(benches, bench_chain);
criterion_main!(benches);
