//! Property-based tests for reward bounds.
//!
//! Run with: cargo test -p mimic-reward -- proptest

use mimic_body::{KinematicsAdapter, Walker2d};
use mimic_reward::{Aggregation, DeviationReward, RewardConfig, RewardEngine, RewardInputs};
use mimic_types::{EpisodeStatus, Kinematics};
use nalgebra::DVector;
use proptest::prelude::*;

/// Generate a 9-channel walker state with bounded values.
fn arb_kinematics() -> impl Strategy<Value = Kinematics> {
    (
        prop::collection::vec(-3.0..3.0f64, 9),
        prop::collection::vec(-10.0..10.0f64, 9),
    )
        .prop_map(|(qpos, qvel)| Kinematics::new(DVector::from_vec(qpos), DVector::from_vec(qvel)))
}

fn arb_exponential_form() -> impl Strategy<Value = DeviationReward> {
    prop_oneof![
        Just(DeviationReward::SquaredError),
        Just(DeviationReward::NormalizedExponential),
    ]
}

fn engine(config: RewardConfig) -> RewardEngine {
    let body = match KinematicsAdapter::new(Walker2d::new()) {
        Ok(body) => body,
        Err(err) => panic!("walker rejected: {err}"),
    };
    let stds = DVector::from_element(18, 0.3);
    match RewardEngine::new(config, &body, &Walker2d::trajectory_layout(), Some(&stds), 200.0) {
        Ok(engine) => engine,
        Err(err) => panic!("engine rejected: {err}"),
    }
}

proptest! {
    /// Exponential forms keep every sub-reward and the total in [0, 1].
    #[test]
    fn exponential_rewards_bounded(
        state in arb_kinematics(),
        reference in arb_kinematics(),
        form in arb_exponential_form(),
        product in any::<bool>(),
    ) {
        let aggregation = if product { Aggregation::PoseComProduct } else { Aggregation::WeightedSum };
        let engine = engine(RewardConfig::default().with_deviation(form).with_aggregation(aggregation));
        let inputs = RewardInputs {
            state: &state,
            reference: &reference,
            joint_power_normed: 0.0,
            targets: None,
        };
        let terms = engine.breakdown(&inputs)?;
        for value in [terms.pose, terms.velocity, terms.com, terms.total] {
            prop_assert!((0.0..=1.0).contains(&value), "reward {} out of [0, 1]", value);
        }
    }

    /// Tracking the reference exactly always scores one.
    #[test]
    fn exact_tracking_scores_one(reference in arb_kinematics(), form in arb_exponential_form()) {
        let engine = engine(RewardConfig::default().with_deviation(form));
        let inputs = RewardInputs {
            state: &reference,
            reference: &reference,
            joint_power_normed: 0.0,
            targets: None,
        };
        let reward = engine.imitation_reward(EpisodeStatus::Active, &inputs)?;
        prop_assert!((reward - 1.0).abs() < 1e-9);
    }
}
