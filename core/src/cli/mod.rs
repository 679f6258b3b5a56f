pub mod report;

use crate::config::{ToolConfig, DEFAULT_DATA_DIR, DEFAULT_NIFTYREG};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for geomqa
#[derive(Parser, Debug)]
#[command(name = "geomqa")]
#[command(about = "Measure Geometric Distortion of Magnetic Resonance Images of Large \
                   Field-of-View Cylindrical Phantom")]
#[command(version)]
pub struct Cli {
    /// MRI NIfTI files
    #[arg(value_name = "MRI", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Results directory
    #[arg(value_name = "OUTPUT_DIR")]
    pub output: PathBuf,

    /// Directory containing niftyreg programs
    #[arg(long, value_name = "DIR", env = "GEOMQA_NIFTYREG", default_value = DEFAULT_NIFTYREG)]
    pub niftyreg: PathBuf,

    /// Directory containing mrtrix programs (default: search PATH)
    #[arg(long, value_name = "DIR", env = "GEOMQA_MRTRIX")]
    pub mrtrix: Option<PathBuf>,

    /// Directory containing the CT reference (ct.nii.gz) and mask (ctmask.nii.gz)
    #[arg(long, value_name = "DIR", env = "GEOMQA_DATA", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Don't abort if version checks of external software fail
    #[arg(long)]
    pub any_version: bool,

    /// Display the registered images with mrview
    #[arg(long)]
    pub view: bool,

    /// Output format of the run summary
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Tool locations selected on the command line
    pub fn tool_config(&self) -> ToolConfig {
        ToolConfig::default()
            .with_niftyreg_dir(&self.niftyreg)
            .with_mrtrix_dir(self.mrtrix.clone())
            .with_data_dir(&self.data_dir)
    }
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}
