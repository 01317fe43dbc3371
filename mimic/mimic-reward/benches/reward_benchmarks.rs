//! Benchmarks for imitation reward evaluation.
//!
//! Run with: cargo bench -p mimic-reward
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p mimic-reward -- --save-baseline main
//! 2. After changes: cargo bench -p mimic-reward -- --baseline main

#![allow(missing_docs, clippy::unwrap_used, clippy::cast_precision_loss)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mimic_body::{KinematicsAdapter, Walker2d};
use mimic_reward::{
    AngleTargets, DeviationReward, LinearSlope, RewardConfig, RewardEngine, RewardInputs,
};
use mimic_types::{EpisodeStatus, Kinematics};
use nalgebra::DVector;

// =============================================================================
// Fixtures
// =============================================================================

fn walker_state(offset: f64) -> Kinematics {
    Kinematics::new(
        DVector::from_fn(9, |i, _| offset + 0.1 * i as f64),
        DVector::from_fn(9, |i, _| offset - 0.2 * i as f64),
    )
}

fn engine(form: DeviationReward) -> RewardEngine {
    let body = KinematicsAdapter::new(Walker2d::new()).unwrap();
    let stds = DVector::from_element(18, 0.4);
    RewardEngine::new(
        RewardConfig::default()
            .with_deviation(form)
            .with_target_penalty(),
        &body,
        &Walker2d::trajectory_layout(),
        Some(&stds),
        200.0,
    )
    .unwrap()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_imitation_reward(c: &mut Criterion) {
    let mut group = c.benchmark_group("ImitationReward");

    let state = walker_state(0.05);
    let reference = walker_state(0.0);
    let qpos_actuated = DVector::from_element(6, 0.1);
    let targets = DVector::from_element(6, 0.12);
    let inputs = RewardInputs {
        state: &state,
        reference: &reference,
        joint_power_normed: 0.1,
        targets: Some(AngleTargets {
            qpos_actuated: &qpos_actuated,
            targets: &targets,
        }),
    };

    let forms = [
        ("squared_error", DeviationReward::SquaredError),
        ("normalized_exponential", DeviationReward::NormalizedExponential),
        (
            "normalized_linear",
            DeviationReward::NormalizedLinear {
                slope: LinearSlope::Full,
            },
        ),
    ];
    for (name, form) in forms {
        let engine = engine(form);
        group.bench_function(name, |b| {
            b.iter(|| engine.imitation_reward(EpisodeStatus::Active, black_box(&inputs)));
        });
    }

    group.finish();
}

// =============================================================================
// Criterion Setup
// =============================================================================

criterion_group!(benches, bench_imitation_reward);
criterion_main!(benches);
