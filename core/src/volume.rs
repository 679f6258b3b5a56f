//! NIfTI volumes in closest canonical (RAS+) orientation
//!
//! Only used for plotting and summarising the results of the external tools;
//! no registration or resampling happens here.

use crate::error::{GeomqaError, Result};
use log::debug;
use ndarray::{Array3, ArrayD, ArrayView2, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::path::Path;

/// 3-D scalar image with its voxel sizes in mm
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// Voxel values indexed `[x, y, z]`, x towards Right, y Anterior, z Superior
    pub data: Array3<f64>,
    /// Voxel sizes along x, y and z
    pub zooms: [f64; 3],
}

impl Volume {
    /// Reads a NIfTI file and reorients it to the closest canonical orientation
    ///
    /// Trailing singleton dimensions are dropped, so a magnitude image stored
    /// as `[x, y, z, 1, 1]` loads as a 3-D volume.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(GeomqaError::MissingFile(path.to_path_buf()));
        }

        let obj = ReaderOptions::new().read_file(path)?;
        let header = obj.header().clone();
        let data = squeeze_to_3d(obj.into_volume().into_ndarray::<f64>()?)?;

        let zooms = [1, 2, 3].map(|i| {
            let size = header.pixdim[i].abs() as f64;
            if size > 0.0 {
                size
            } else {
                1.0
            }
        });
        let rotation = rotation_matrix(&header);
        debug!(
            "Loaded {} with shape {:?}, voxel sizes {:?}",
            path.display(),
            data.shape(),
            zooms
        );

        Ok(Self::canonical(data, zooms, &rotation))
    }

    /// Reorients voxel data given the 3x3 voxel-to-world matrix
    ///
    /// Each voxel axis is assigned to the world axis it is most closely
    /// aligned with; axes pointing towards Left, Posterior or Inferior are
    /// flipped.
    pub fn canonical(data: Array3<f64>, zooms: [f64; 3], rotation: &[[f64; 3]; 3]) -> Self {
        let ornt = axis_orientation(rotation);

        // source voxel axis for each world axis
        let mut source = [0usize; 3];
        for (voxel_axis, (world_axis, _)) in ornt.iter().enumerate() {
            source[*world_axis] = voxel_axis;
        }

        let mut data = data.permuted_axes(source);
        for (world_axis, &voxel_axis) in source.iter().enumerate() {
            if ornt[voxel_axis].1 {
                data.invert_axis(Axis(world_axis));
            }
        }

        Self {
            data,
            zooms: source.map(|voxel_axis| zooms[voxel_axis]),
        }
    }

    pub fn shape(&self) -> [usize; 3] {
        let s = self.data.shape();
        [s[0], s[1], s[2]]
    }

    /// Central slice perpendicular to `axis`, transposed so that rows run
    /// along the vertical display axis
    ///
    /// - axis 0 (sagittal): rows z, columns y
    /// - axis 1 (coronal): rows z, columns x
    /// - axis 2 (axial): rows y, columns x
    pub fn central_slice(&self, axis: usize) -> ArrayView2<'_, f64> {
        let index = self.data.len_of(Axis(axis)) / 2;
        self.data.index_axis(Axis(axis), index).reversed_axes()
    }

    /// Non-NaN voxel values
    pub fn values(&self) -> Vec<f64> {
        self.data.iter().copied().filter(|v| !v.is_nan()).collect()
    }
}

/// Percentile `p` (0-100) with linear interpolation between order statistics
///
/// Returns `None` for an empty slice. NaN values are ignored.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

fn squeeze_to_3d(mut data: ArrayD<f64>) -> Result<Array3<f64>> {
    if data.ndim() < 3 {
        return Err(GeomqaError::InvalidVolume(format!(
            "expected 3 dimensions, found {}",
            data.ndim()
        )));
    }

    while data.ndim() > 3 {
        let last = data.ndim() - 1;
        if data.len_of(Axis(last)) != 1 {
            return Err(GeomqaError::InvalidVolume(format!(
                "expected a scalar volume, found shape {:?}",
                data.shape()
            )));
        }
        data = data.index_axis_move(Axis(last), 0);
    }

    Ok(data.into_dimensionality::<Ix3>()?)
}

/// Voxel-to-world rotation and scaling, from sform, else qform, else pixdim
///
/// Without either transform x runs towards Left, as in the NIfTI base affine.
fn rotation_matrix(header: &NiftiHeader) -> [[f64; 3]; 3] {
    let pixdim = |i: usize| header.pixdim[i] as f64;

    if header.sform_code > 0 {
        let rows = [header.srow_x, header.srow_y, header.srow_z];
        return rows.map(|r| [r[0] as f64, r[1] as f64, r[2] as f64]);
    }

    if header.qform_code > 0 {
        let b = header.quatern_b as f64;
        let c = header.quatern_c as f64;
        let d = header.quatern_d as f64;
        let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();
        let qfac = if pixdim(0) < 0.0 { -1.0 } else { 1.0 };

        let r = [
            [a * a + b * b - c * c - d * d, 2.0 * (b * c - a * d), 2.0 * (b * d + a * c)],
            [2.0 * (b * c + a * d), a * a + c * c - b * b - d * d, 2.0 * (c * d - a * b)],
            [2.0 * (b * d - a * c), 2.0 * (c * d + a * b), a * a + d * d - c * c - b * b],
        ];
        let scale = [pixdim(1), pixdim(2), pixdim(3) * qfac];
        return r.map(|row| [row[0] * scale[0], row[1] * scale[1], row[2] * scale[2]]);
    }

    [
        [-pixdim(1), 0.0, 0.0],
        [0.0, pixdim(2), 0.0],
        [0.0, 0.0, pixdim(3)],
    ]
}

/// For each voxel axis, the world axis it maps to and whether it is flipped
fn axis_orientation(rotation: &[[f64; 3]; 3]) -> [(usize, bool); 3] {
    let mut ornt = [(0usize, false); 3];
    let mut voxel_used = [false; 3];
    let mut world_used = [false; 3];

    // assign the strongest remaining voxel/world pairing first
    for _ in 0..3 {
        let mut best: Option<(usize, usize, f64)> = None;
        for (voxel_axis, _) in voxel_used.iter().enumerate().filter(|(_, used)| !**used) {
            for (world_axis, _) in world_used.iter().enumerate().filter(|(_, used)| !**used) {
                let weight = rotation[world_axis][voxel_axis].abs();
                if best.map_or(true, |(_, _, w)| weight > w) {
                    best = Some((voxel_axis, world_axis, weight));
                }
            }
        }

        if let Some((voxel_axis, world_axis, _)) = best {
            ornt[voxel_axis] = (world_axis, rotation[world_axis][voxel_axis] < 0.0);
            voxel_used[voxel_axis] = true;
            world_used[world_axis] = true;
        }
    }

    ornt
}
