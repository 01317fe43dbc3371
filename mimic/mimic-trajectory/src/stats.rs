//! Per-channel statistics of the reference data.

use std::path::Path;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrajectoryError};

/// Mean, variance and standard deviation of every dataset channel, taken
/// over the frames of all steps.
///
/// Variances are population variances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    /// Per-channel mean.
    pub means: DVector<f64>,
    /// Per-channel variance.
    pub variances: DVector<f64>,
    /// Per-channel standard deviation.
    pub stds: DVector<f64>,
}

impl ChannelStats {
    /// Computes statistics over steps stored as `channels x frames` matrices.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn from_steps(steps: &[DMatrix<f64>]) -> Self {
        let channels = steps.first().map_or(0, |m| m.nrows());
        let count = steps.iter().map(|m| m.ncols()).sum::<usize>().max(1) as f64;

        let mut sums = DVector::<f64>::zeros(channels);
        for step in steps {
            for frame in step.column_iter() {
                sums += frame;
            }
        }
        let means = sums / count;

        let mut squares = DVector::<f64>::zeros(channels);
        for step in steps {
            for frame in step.column_iter() {
                let centered = frame - &means;
                squares += centered.component_mul(&centered);
            }
        }
        let variances = squares / count;
        let stds = variances.map(f64::sqrt);

        Self {
            means,
            variances,
            stds,
        }
    }

    /// Number of channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.means.len()
    }
}

/// Loads per-channel standard deviations from a JSON array.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a JSON array of
/// numbers, or contains a negative or non-finite value.
pub fn load_channel_stds(path: impl AsRef<Path>) -> Result<DVector<f64>> {
    let json = std::fs::read_to_string(path.as_ref())?;
    let values: Vec<f64> = serde_json::from_str(&json)?;
    if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(TrajectoryError::Parse(format!(
            "standard deviation must be finite and non-negative, got {bad}"
        )));
    }
    Ok(DVector::from_vec(values))
}
