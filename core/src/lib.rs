pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod paths;
pub mod pipeline;
pub mod plot;
pub mod summary;
pub mod vercheck;
pub mod volume;

pub use api::{DistortionQa, ToolVersions};
pub use cli::report::TextReport;
pub use config::ToolConfig;
pub use error::{GeomqaError, Result};
pub use paths::{remove_niigz, ResultPaths};
pub use pipeline::{CommandRunner, ExternalCommand, Pipeline, ProcessRunner};
pub use summary::{DistortionSummary, RunSummary};
pub use volume::Volume;
