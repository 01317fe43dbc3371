//! Reference trajectory store with a playback cursor.

use std::path::Path;

use mimic_types::{Kinematics, StepSide};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::cursor::PlaybackCursor;
use crate::dataset::MocapDataset;
use crate::error::{Result, TrajectoryError};
use crate::layout::TrajectoryLayout;
use crate::stats::ChannelStats;

/// Frames at the end of a step that random initialization never picks.
pub const DEFAULT_TAIL_MARGIN: usize = 5;

/// Ground-truth motion-capture steps plus the current playback position.
///
/// The store answers "what should the body be doing right now": reference
/// kinematics, gait phase, desired walking speed and COM height at the
/// cursor. It also draws initial states for new episodes.
///
/// Steps are held as `channels x frames` matrices. Step lengths may differ.
///
/// # Example
///
/// ```
/// use mimic_trajectory::{MocapDataset, MocapStep, ReferenceTrajectory, TrajectoryLayout};
///
/// let steps = (0..2)
///     .map(|_| MocapStep::new((0..10).map(|t| vec![f64::from(t), 1.2, 0.8, 0.0]).collect()))
///     .collect();
/// let dataset = MocapDataset::new(200.0, steps);
/// let mut refs = ReferenceTrajectory::new(dataset, TrajectoryLayout::contiguous(2, 2))?;
///
/// for _ in 0..10 {
///     refs.advance();
/// }
/// assert_eq!(refs.cursor().step, 1);
/// assert_eq!(refs.cursor().position, 0);
/// assert!(!refs.is_step_left());
/// # Ok::<(), mimic_trajectory::TrajectoryError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ReferenceTrajectory {
    steps: Vec<DMatrix<f64>>,
    sides: Vec<StepSide>,
    labels: Vec<String>,
    layout: TrajectoryLayout,
    sample_rate_hz: f64,
    step_velocities: Vec<f64>,
    qpos_ranges: DVector<f64>,
    qvel_ranges: DVector<f64>,
    cursor: PlaybackCursor,
    lane: usize,
    reached_last_step: bool,
    ticks: usize,
    frame_stride: usize,
    tail_margin: usize,
    rng: StdRng,
}

impl ReferenceTrajectory {
    /// Builds the store from a dataset and a channel layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset is invalid or the layout references
    /// channels the dataset does not have.
    pub fn new(dataset: MocapDataset, layout: TrajectoryLayout) -> Result<Self> {
        dataset.validate()?;
        layout.validate(dataset.channel_count())?;

        let sides = (0..dataset.steps.len())
            .map(|i| dataset.side_of(i))
            .collect();

        let steps: Vec<DMatrix<f64>> = dataset
            .steps
            .iter()
            .map(|step| {
                let channels = step.frames[0].len();
                DMatrix::from_fn(channels, step.len(), |c, t| step.frames[t][c])
            })
            .collect();

        let velocity_channel = layout.com_velocity_channel();
        let step_velocities = steps
            .iter()
            .map(|step| step.row(velocity_channel).mean())
            .collect();

        let qpos_ranges = channel_ranges(&steps, &layout.qpos_indices);
        let qvel_ranges = channel_ranges(&steps, &layout.qvel_indices);

        Ok(Self {
            steps,
            sides,
            labels: dataset.labels,
            layout,
            sample_rate_hz: dataset.sample_rate_hz,
            step_velocities,
            qpos_ranges,
            qvel_ranges,
            cursor: PlaybackCursor::start(),
            lane: 0,
            reached_last_step: false,
            ticks: 0,
            frame_stride: 1,
            tail_margin: DEFAULT_TAIL_MARGIN,
            rng: StdRng::from_entropy(),
        })
    }

    /// Loads a dataset file and builds the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>, layout: TrajectoryLayout) -> Result<Self> {
        Self::new(MocapDataset::load(path)?, layout)
    }

    /// Sets how many mocap frames one call to [`advance`](Self::advance)
    /// consumes (mocap rate divided by control rate).
    #[must_use]
    pub fn with_frame_stride(mut self, stride: usize) -> Self {
        self.frame_stride = stride.max(1);
        self
    }

    /// Seeds the random initial-state sampler.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Sets how many frames at the end of each step random initialization
    /// skips.
    #[must_use]
    pub const fn with_tail_margin(mut self, frames: usize) -> Self {
        self.tail_margin = frames;
        self
    }

    /// Rewinds the cursor to the first frame of the first step.
    pub fn reset(&mut self) {
        self.cursor = PlaybackCursor::start();
        self.lane = 0;
        self.reached_last_step = false;
        self.ticks = 0;
    }

    /// Advances the cursor by one control tick.
    ///
    /// When the position runs past the current step, playback continues at
    /// the start of the next step. Running past the final step marks the
    /// trajectories as exhausted and wraps around to the first step.
    pub fn advance(&mut self) {
        self.ticks += 1;
        self.cursor.position += self.frame_stride;
        if self.cursor.position >= self.current_step_len() {
            self.cursor.position = self.lane;
            self.cursor.step += 1;
            if self.cursor.step >= self.steps.len() {
                self.reached_last_step = true;
                self.cursor.step = 0;
            }
            // Lanes only exist to interleave stride passes; a step shorter
            // than the lane restarts at its first frame.
            if self.cursor.position >= self.current_step_len() {
                self.cursor.position = 0;
            }
        }
    }

    /// Moves the cursor to an explicit frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the step or position does not exist.
    pub fn seek(&mut self, step: usize, position: usize) -> Result<()> {
        let len = self
            .steps
            .get(step)
            .map(DMatrix::ncols)
            .ok_or(TrajectoryError::CursorOutOfRange { step, position })?;
        if position >= len {
            return Err(TrajectoryError::CursorOutOfRange { step, position });
        }
        self.cursor = PlaybackCursor::new(step, position);
        self.lane = position % self.frame_stride;
        Ok(())
    }

    /// Current cursor.
    #[must_use]
    pub const fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    /// Returns true once the final step has been played past since the last
    /// [`reset`](Self::reset).
    #[must_use]
    pub const fn has_reached_last_step(&self) -> bool {
        self.reached_last_step
    }

    /// Ticks advanced since the last reset or initialization.
    #[must_use]
    pub const fn ticks(&self) -> usize {
        self.ticks
    }

    /// Frames consumed per tick.
    #[must_use]
    pub const fn frame_stride(&self) -> usize {
        self.frame_stride
    }

    /// Sampling rate of the recording in Hz.
    #[must_use]
    pub const fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Channel layout.
    #[must_use]
    pub const fn layout(&self) -> &TrajectoryLayout {
        &self.layout
    }

    /// Number of recorded steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Length of step `index` in frames, if it exists.
    #[must_use]
    pub fn step_len(&self, index: usize) -> Option<usize> {
        self.steps.get(index).map(DMatrix::ncols)
    }

    /// Length of the shortest recorded step.
    #[must_use]
    pub fn min_step_len(&self) -> usize {
        self.steps.iter().map(DMatrix::ncols).min().unwrap_or(0)
    }

    /// Total number of frames across all steps.
    #[must_use]
    pub fn total_frames(&self) -> usize {
        self.steps.iter().map(DMatrix::ncols).sum()
    }

    fn current_step(&self) -> &DMatrix<f64> {
        &self.steps[self.cursor.step]
    }

    fn current_step_len(&self) -> usize {
        self.current_step().ncols()
    }

    fn frame_value(&self, channel: usize) -> f64 {
        self.current_step()[(channel, self.cursor.position)]
    }

    fn gather(&self, channels: &[usize]) -> DVector<f64> {
        DVector::from_iterator(channels.len(), channels.iter().map(|&c| self.frame_value(c)))
    }

    /// Reference joint positions at the cursor.
    #[must_use]
    pub fn qpos(&self) -> DVector<f64> {
        self.gather(&self.layout.qpos_indices)
    }

    /// Reference joint velocities at the cursor.
    #[must_use]
    pub fn qvel(&self) -> DVector<f64> {
        self.gather(&self.layout.qvel_indices)
    }

    /// Reference kinematics at the cursor.
    #[must_use]
    pub fn ref_kinematics(&self) -> Kinematics {
        Kinematics::new(self.qpos(), self.qvel())
    }

    /// Normalized progress within the current step, in `[0, 1)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn phase(&self) -> f64 {
        self.cursor.position as f64 / self.current_step_len() as f64
    }

    /// Desired walking speed: the mean forward COM velocity recorded for the
    /// current step.
    #[must_use]
    pub fn step_velocity(&self) -> f64 {
        self.step_velocities[self.cursor.step]
    }

    /// Reference COM height at the cursor.
    #[must_use]
    pub fn com_height(&self) -> f64 {
        self.frame_value(self.layout.com_height_channel())
    }

    /// Per-channel `max - min` of the reference positions and velocities
    /// over the whole dataset.
    #[must_use]
    pub fn kinematic_ranges(&self) -> (DVector<f64>, DVector<f64>) {
        (self.qpos_ranges.clone(), self.qvel_ranges.clone())
    }

    /// Side of the current step.
    #[must_use]
    pub fn step_side(&self) -> StepSide {
        self.sides[self.cursor.step]
    }

    /// Returns true if the left foot leads the current step.
    #[must_use]
    pub fn is_step_left(&self) -> bool {
        self.step_side().is_left()
    }

    /// Random state initialization.
    ///
    /// Picks a uniformly random step and a uniformly random frame in it,
    /// leaving out the last frames so playback can continue from there.
    /// Moves the cursor to that frame and returns its kinematics.
    pub fn random_init_state(&mut self) -> Kinematics {
        let step = self.rng.gen_range(0..self.steps.len());
        let eligible = self.steps[step]
            .ncols()
            .saturating_sub(self.tail_margin)
            .max(1);
        let position = self.rng.gen_range(0..eligible);
        self.place_anchor(step, position);
        debug!("RSI anchor at step {step}, position {position}");
        self.ref_kinematics()
    }

    /// Deterministic initialization at the first frame of the first step.
    pub fn deterministic_init_state(&mut self) -> Kinematics {
        self.place_anchor(0, 0);
        self.ref_kinematics()
    }

    fn place_anchor(&mut self, step: usize, position: usize) {
        self.cursor = PlaybackCursor::new(step, position);
        self.lane = position % self.frame_stride;
        self.ticks = 0;
    }

    /// Dataset labels of the given model position and velocity indices.
    ///
    /// Unlabelled datasets yield `qpos[i]` / `qvel[i]` placeholders.
    #[must_use]
    pub fn labels_by_model_index(
        &self,
        pos_indices: &[usize],
        vel_indices: &[usize],
    ) -> (Vec<String>, Vec<String>) {
        let lookup = |model_index: usize, channels: &[usize], kind: &str| {
            channels
                .get(model_index)
                .and_then(|&c| self.labels.get(c))
                .cloned()
                .unwrap_or_else(|| format!("{kind}[{model_index}]"))
        };
        (
            pos_indices
                .iter()
                .map(|&i| lookup(i, &self.layout.qpos_indices, "qpos"))
                .collect(),
            vel_indices
                .iter()
                .map(|&i| lookup(i, &self.layout.qvel_indices, "qvel"))
                .collect(),
        )
    }

    /// Labels of all dataset channels (empty if unlabelled).
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Mean, variance and standard deviation of every dataset channel.
    #[must_use]
    pub fn channel_stats(&self) -> ChannelStats {
        ChannelStats::from_steps(&self.steps)
    }
}

fn channel_ranges(steps: &[DMatrix<f64>], channels: &[usize]) -> DVector<f64> {
    DVector::from_iterator(
        channels.len(),
        channels.iter().map(|&c| {
            let (lo, hi) = steps
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), step| {
                    let row = step.row(c);
                    (lo.min(row.min()), hi.max(row.max()))
                });
            hi - lo
        }),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::dataset::MocapStep;
    use approx::assert_relative_eq;

    /// Two 10-frame steps. Channels: [com_x, com_z, joint, com_vx, com_vz, joint_vel].
    fn two_step_refs() -> ReferenceTrajectory {
        let steps = (0..2)
            .map(|s| {
                let frames = (0..10)
                    .map(|t| {
                        let t = f64::from(t);
                        let s = f64::from(s);
                        vec![s + t * 0.1, 1.2, 0.1 * t, 1.0 + s, 0.0, -t]
                    })
                    .collect();
                MocapStep::new(frames)
            })
            .collect();
        let dataset = MocapDataset::new(200.0, steps)
            .with_labels(["COM Pos (X)", "COM Pos (Z)", "Knee", "COM Vel (X)", "COM Vel (Z)", "Knee Vel"]);
        ReferenceTrajectory::new(dataset, TrajectoryLayout::contiguous(3, 3))
            .unwrap()
            .with_seed(7)
    }

    #[test]
    fn starts_at_origin() {
        let refs = two_step_refs();
        assert_eq!(refs.cursor(), PlaybackCursor::start());
        assert!(!refs.has_reached_last_step());
        assert_eq!(refs.phase(), 0.0);
        assert!(refs.is_step_left());
    }

    #[test]
    fn ten_ticks_reach_second_step() {
        let mut refs = two_step_refs();
        for _ in 0..10 {
            refs.advance();
        }
        assert_eq!(refs.cursor(), PlaybackCursor::new(1, 0));
        assert!(!refs.is_step_left());
        assert!(!refs.has_reached_last_step());
    }

    #[test]
    fn last_step_flag_set_at_final_frame() {
        let mut refs = two_step_refs();
        for _ in 0..19 {
            refs.advance();
        }
        assert_eq!(refs.cursor(), PlaybackCursor::new(1, 9));
        assert!(!refs.has_reached_last_step());

        refs.advance();
        assert!(refs.has_reached_last_step());
        assert_eq!(refs.ticks(), 20);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut refs = two_step_refs();
        for _ in 0..13 {
            refs.advance();
        }
        refs.reset();
        let once = (refs.cursor(), refs.has_reached_last_step(), refs.ticks());
        refs.reset();
        let twice = (refs.cursor(), refs.has_reached_last_step(), refs.ticks());
        assert_eq!(once, twice);
        assert_eq!(once.0, PlaybackCursor::start());
    }

    #[test]
    fn phase_resets_at_step_boundary() {
        let mut refs = two_step_refs();
        let mut previous = refs.phase();
        for _ in 0..9 {
            refs.advance();
            assert!(refs.phase() > previous);
            assert!(refs.phase() < 1.0);
            previous = refs.phase();
        }
        refs.advance();
        assert_eq!(refs.phase(), 0.0);
    }

    #[test]
    fn kinematics_follow_layout() {
        let mut refs = two_step_refs();
        refs.seek(1, 4).unwrap();
        let state = refs.ref_kinematics();
        assert_relative_eq!(state.qpos[0], 1.4, epsilon = 1e-12);
        assert_relative_eq!(state.qpos[2], 0.4, epsilon = 1e-12);
        assert_relative_eq!(state.qvel[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(state.qvel[2], -4.0, epsilon = 1e-12);
        assert_relative_eq!(refs.com_height(), 1.2, epsilon = 1e-12);
    }

    #[test]
    fn step_velocity_is_step_mean() {
        let mut refs = two_step_refs();
        assert_relative_eq!(refs.step_velocity(), 1.0, epsilon = 1e-12);
        refs.seek(1, 3).unwrap();
        assert_relative_eq!(refs.step_velocity(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn ranges_span_all_steps() {
        let refs = two_step_refs();
        let (pos, vel) = refs.kinematic_ranges();
        // com_x spans 0.0 .. 1.9
        assert_relative_eq!(pos[0], 1.9, epsilon = 1e-12);
        assert_relative_eq!(pos[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(vel[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(vel[2], 9.0, epsilon = 1e-12);
    }

    #[test]
    fn seek_rejects_missing_frames() {
        let mut refs = two_step_refs();
        assert!(refs.seek(2, 0).is_err());
        assert!(refs.seek(0, 10).is_err());
        assert!(refs.seek(1, 9).is_ok());
    }

    #[test]
    fn random_init_avoids_step_tail() {
        let mut refs = two_step_refs().with_tail_margin(3);
        for _ in 0..200 {
            let state = refs.random_init_state();
            let cursor = refs.cursor();
            assert!(cursor.step < 2);
            assert!(cursor.position < 7);
            assert_eq!(state, refs.ref_kinematics());
            assert_eq!(refs.ticks(), 0);
        }
    }

    #[test]
    fn random_init_with_margin_longer_than_step() {
        let mut refs = two_step_refs().with_tail_margin(50);
        refs.random_init_state();
        assert_eq!(refs.cursor().position, 0);
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let mut a = two_step_refs().with_seed(11);
        let mut b = two_step_refs().with_seed(11);
        for _ in 0..20 {
            assert_eq!(a.random_init_state(), b.random_init_state());
            assert_eq!(a.cursor(), b.cursor());
        }
    }

    #[test]
    fn deterministic_init_is_first_frame() {
        let mut refs = two_step_refs();
        refs.seek(1, 5).unwrap();
        let state = refs.deterministic_init_state();
        assert_eq!(refs.cursor(), PlaybackCursor::start());
        assert_eq!(state.qpos[0], 0.0);
    }

    #[test]
    fn labels_by_model_index() {
        let refs = two_step_refs();
        let (pos, vel) = refs.labels_by_model_index(&[1, 2], &[0]);
        assert_eq!(pos, vec!["COM Pos (Z)", "Knee"]);
        assert_eq!(vel, vec!["COM Vel (X)"]);
    }

    #[test]
    fn unlabelled_dataset_uses_placeholders() {
        let dataset = MocapDataset::new(100.0, vec![MocapStep::new(vec![vec![0.0; 4]; 3])]);
        let refs = ReferenceTrajectory::new(dataset, TrajectoryLayout::contiguous(2, 2)).unwrap();
        let (pos, vel) = refs.labels_by_model_index(&[1], &[0]);
        assert_eq!(pos, vec!["qpos[1]"]);
        assert_eq!(vel, vec!["qvel[0]"]);
    }

    #[test]
    fn stride_keeps_pass_offset_across_steps() {
        let mut refs = two_step_refs().with_frame_stride(2);
        refs.seek(0, 1).unwrap();
        let mut visited = vec![refs.cursor()];
        while !refs.has_reached_last_step() {
            refs.advance();
            visited.push(refs.cursor());
        }
        // Odd frames of both steps, then the wrap
        assert_eq!(visited[4], PlaybackCursor::new(0, 9));
        assert_eq!(visited[5], PlaybackCursor::new(1, 1));
        assert_eq!(visited[9], PlaybackCursor::new(1, 9));
        assert_eq!(visited.len(), 11);
    }

    #[test]
    fn steps_of_different_length() {
        let dataset = MocapDataset::new(
            100.0,
            vec![
                MocapStep::new(vec![vec![0.0; 2]; 4]),
                MocapStep::new(vec![vec![0.0; 2]; 6]),
            ],
        );
        let refs = ReferenceTrajectory::new(dataset, TrajectoryLayout::new(vec![0, 1], vec![1]))
            .unwrap();
        assert_eq!(refs.min_step_len(), 4);
        assert_eq!(refs.step_len(1), Some(6));
        assert_eq!(refs.total_frames(), 10);
    }

    #[test]
    fn rejects_layout_outside_dataset() {
        let dataset = MocapDataset::new(100.0, vec![MocapStep::new(vec![vec![0.0; 2]; 4])]);
        let result = ReferenceTrajectory::new(dataset, TrajectoryLayout::contiguous(2, 2));
        assert!(matches!(result, Err(TrajectoryError::InvalidLayout(_))));
    }
}
