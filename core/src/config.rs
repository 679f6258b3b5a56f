//! External tool configuration
//!
//! Holds the tool versions the distortion measurement has been validated
//! against, and where the NiftyReg/MRtrix programs and the CT reference
//! data live.

use std::path::{Path, PathBuf};

/// MRtrix versions the workflow has been validated with
pub const MRTRIX_VERSIONS: &[&str] = &["3.0.2", "3.0.3", "3.0.4"];

/// NiftyReg versions the workflow has been validated with
pub const NIFTYREG_VERSIONS: &[&str] = &["1.5.68", "1.5.69"];

/// Default directory containing the NiftyReg programs
pub const DEFAULT_NIFTYREG: &str = "/usr/local/niftyreg/bin";

/// Default directory containing `ct.nii.gz` and `ctmask.nii.gz`
pub const DEFAULT_DATA_DIR: &str = "/usr/local/share/geomqa";

/// File name of the CT reference image
pub const CT_FILENAME: &str = "ct.nii.gz";

/// File name of the CT reference mask
pub const CT_MASK_FILENAME: &str = "ctmask.nii.gz";

/// Locations of external programs and reference data
///
/// # Example
///
/// ```
/// use geomqa_core::ToolConfig;
/// use std::path::Path;
///
/// let config = ToolConfig::default()
///     .with_niftyreg_dir("/opt/niftyreg/bin")
///     .with_data_dir("/data/phantom");
///
/// assert_eq!(config.reg_aladin(), Path::new("/opt/niftyreg/bin/reg_aladin"));
/// assert_eq!(config.ct(), Path::new("/data/phantom/ct.nii.gz"));
/// assert_eq!(config.mrinfo(), Path::new("mrinfo"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    /// Directory containing reg_aladin, reg_f3d, reg_transform and reg_resample
    pub niftyreg_dir: PathBuf,

    /// Directory containing mrinfo, mrmath and mrview.
    /// If None, the programs are looked up on PATH.
    pub mrtrix_dir: Option<PathBuf>,

    /// Directory containing the CT reference and its mask
    pub data_dir: PathBuf,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            niftyreg_dir: PathBuf::from(DEFAULT_NIFTYREG),
            mrtrix_dir: None,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl ToolConfig {
    /// Builder: Set the NiftyReg directory
    pub fn with_niftyreg_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.niftyreg_dir = dir.into();
        self
    }

    /// Builder: Set the MRtrix directory
    pub fn with_mrtrix_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.mrtrix_dir = dir;
        self
    }

    /// Builder: Set the reference data directory
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn reg_aladin(&self) -> PathBuf {
        self.niftyreg_dir.join("reg_aladin")
    }

    pub fn reg_f3d(&self) -> PathBuf {
        self.niftyreg_dir.join("reg_f3d")
    }

    pub fn reg_transform(&self) -> PathBuf {
        self.niftyreg_dir.join("reg_transform")
    }

    pub fn reg_resample(&self) -> PathBuf {
        self.niftyreg_dir.join("reg_resample")
    }

    pub fn mrinfo(&self) -> PathBuf {
        self.mrtrix_program("mrinfo")
    }

    pub fn mrmath(&self) -> PathBuf {
        self.mrtrix_program("mrmath")
    }

    pub fn mrview(&self) -> PathBuf {
        self.mrtrix_program("mrview")
    }

    /// CT reference image
    pub fn ct(&self) -> PathBuf {
        self.data_dir.join(CT_FILENAME)
    }

    /// CT reference mask
    pub fn ct_mask(&self) -> PathBuf {
        self.data_dir.join(CT_MASK_FILENAME)
    }

    fn mrtrix_program(&self, name: &str) -> PathBuf {
        match &self.mrtrix_dir {
            Some(dir) => dir.join(name),
            None => Path::new(name).to_path_buf(),
        }
    }
}
