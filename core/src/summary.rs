use crate::paths::ResultPaths;
use crate::volume::{percentile, Volume};
use std::path::PathBuf;

/// Statistics of the distortion magnitude in MRI space
///
/// Only voxels with a positive magnitude are counted; the resampled field is
/// zero where the registration gave no displacement information.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct DistortionSummary {
    /// Number of voxels with a positive magnitude
    pub voxels: usize,
    /// Largest distortion in mm
    pub max: f64,
    /// Mean distortion in mm
    pub mean: f64,
    /// 95th percentile of the distortion in mm
    pub p95: f64,
}

impl DistortionSummary {
    /// Summarises a distortion magnitude volume
    ///
    /// # Example
    ///
    /// ```
    /// use geomqa_core::{DistortionSummary, Volume};
    /// use ndarray::Array3;
    ///
    /// let data = Array3::from_shape_vec((1, 1, 4), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
    /// let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    /// let magnitude = Volume::canonical(data, [1.0; 3], &identity);
    ///
    /// let summary = DistortionSummary::from_volume(&magnitude);
    /// assert_eq!(summary.voxels, 3);
    /// assert_eq!(summary.max, 3.0);
    /// assert_eq!(summary.mean, 2.0);
    /// ```
    pub fn from_volume(magnitude: &Volume) -> Self {
        let values: Vec<f64> = magnitude
            .values()
            .into_iter()
            .filter(|v| *v > 0.0)
            .collect();

        if values.is_empty() {
            return Self {
                voxels: 0,
                max: 0.0,
                mean: 0.0,
                p95: 0.0,
            };
        }

        Self {
            voxels: values.len(),
            max: values.iter().copied().fold(f64::MIN, f64::max),
            mean: values.iter().sum::<f64>() / values.len() as f64,
            p95: percentile(&values, 95.0).unwrap_or(0.0),
        }
    }
}

/// Outcome of measuring the distortion of one MRI
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct RunSummary {
    pub mri: PathBuf,
    pub paths: ResultPaths,
    pub distortion: DistortionSummary,
}
