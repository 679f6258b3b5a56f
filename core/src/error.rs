use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type for geomqa operations
pub type Result<T> = std::result::Result<T, GeomqaError>;

/// Error types for geomqa operations
#[derive(Error, Debug)]
pub enum GeomqaError {
    /// External program could not be started because it is not installed
    #[error("{program} not found: {hint}")]
    ToolNotFound { program: String, hint: String },

    /// NiftyReg directory does not exist
    #[error("niftyreg not found")]
    NiftyRegNotFound(PathBuf),

    /// External program ran but exited unsuccessfully
    #[error("{program} failed ({status})")]
    ToolFailed { program: String, status: ExitStatus },

    /// Version output could not be understood
    #[error("Unable to parse version: {0}")]
    VersionParse(String),

    /// Installed tool version has not been validated
    #[error("non-validated {lib} version {found} (expected {expected})")]
    UnvalidatedVersion {
        lib: String,
        found: String,
        expected: String,
    },

    /// Required input file does not exist
    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// Two inputs would write to the same results directory
    #[error("{} and {} both write results to '{}'", .first.display(), .second.display(), .stem)]
    DuplicateStem {
        stem: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// NIfTI reading error
    #[error("NIfTI error: {0}")]
    NiftiError(String),

    /// Volume has an unusable shape
    #[error("Invalid volume: {0}")]
    InvalidVolume(String),

    /// Figure rendering error
    #[error("Plot error: {0}")]
    PlotError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<nifti::NiftiError> for GeomqaError {
    fn from(e: nifti::NiftiError) -> Self {
        GeomqaError::NiftiError(format!("{}", e))
    }
}

impl From<image::ImageError> for GeomqaError {
    fn from(e: image::ImageError) -> Self {
        GeomqaError::PlotError(format!("{}", e))
    }
}

impl From<ndarray::ShapeError> for GeomqaError {
    fn from(e: ndarray::ShapeError) -> Self {
        GeomqaError::InvalidVolume(format!("{}", e))
    }
}
