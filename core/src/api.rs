use crate::config::{ToolConfig, MRTRIX_VERSIONS, NIFTYREG_VERSIONS};
use crate::error::{GeomqaError, Result};
use crate::paths::remove_niigz;
use crate::pipeline::{CommandRunner, Pipeline};
use crate::plot::{title_for, Figure};
use crate::summary::{DistortionSummary, RunSummary};
use crate::vercheck::{check_version, mrtrix_version, niftyreg_version, VersionCheck};
use crate::volume::Volume;
use log::info;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Versions of the external software found on the system
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ToolVersions {
    pub mrtrix: String,
    pub niftyreg: String,
}

/// Measures the geometric distortion of phantom MRIs against the CT reference
///
/// # Example
///
/// ```no_run
/// use geomqa_core::{DistortionQa, ProcessRunner, ToolConfig};
/// use std::path::Path;
///
/// let qa = DistortionQa::new(ToolConfig::default());
/// qa.check_versions().unwrap();
///
/// let summary = qa
///     .process(Path::new("mri.nii.gz"), Path::new("results"), &mut ProcessRunner)
///     .unwrap();
/// println!("max distortion {:.2} mm", summary.distortion.max);
/// ```
#[derive(Debug, Clone)]
pub struct DistortionQa {
    pub config: ToolConfig,
    /// Continue when a tool version has not been validated
    pub any_version: bool,
    /// Open the registered images in mrview
    pub show_viewer: bool,
}

impl DistortionQa {
    pub fn new(config: ToolConfig) -> Self {
        Self {
            config,
            any_version: false,
            show_viewer: false,
        }
    }

    /// Builder: Accept tool versions that have not been validated
    pub fn any_version(mut self, any_version: bool) -> Self {
        self.any_version = any_version;
        self
    }

    /// Builder: Open the registered images in mrview
    pub fn show_viewer(mut self, show: bool) -> Self {
        self.show_viewer = show;
        self
    }

    /// Checks the MRtrix and NiftyReg versions against the validated lists
    pub fn check_versions(&self) -> Result<ToolVersions> {
        info!("checking versions of external software");

        let mrtrix = mrtrix_version(&self.config)?;
        let mrtrix_check = check_version("MRtrix", &mrtrix, MRTRIX_VERSIONS, self.any_version)?;

        let niftyreg = niftyreg_version(&self.config.niftyreg_dir)?;
        let niftyreg_check =
            check_version("niftyreg", &niftyreg, NIFTYREG_VERSIONS, self.any_version)?;

        if mrtrix_check == VersionCheck::Fail || niftyreg_check == VersionCheck::Fail {
            info!("continuing with non-validated versions");
        }

        Ok(ToolVersions { mrtrix, niftyreg })
    }

    /// Registers one MRI to the CT, then plots and summarises its distortion
    pub fn process<R: CommandRunner>(
        &self,
        mri: &Path,
        out_dir: &Path,
        runner: &mut R,
    ) -> Result<RunSummary> {
        let mri = absolute(mri)?;
        fs::create_dir_all(out_dir)?;
        let out_dir = out_dir.canonicalize()?;

        info!(
            "processing {}",
            mri.file_name().unwrap_or(mri.as_os_str()).to_string_lossy()
        );

        let pipeline = Pipeline::new(&self.config, &mri, &out_dir);
        pipeline.execute(runner, self.show_viewer)?;

        info!("plotting results");
        let base = Volume::load(&mri)?;
        let magnitude = Volume::load(&pipeline.paths.magnitude_mri)?;
        Figure::new(&base, &magnitude, title_for(&mri))?.save(&pipeline.paths.figure)?;

        Ok(RunSummary {
            distortion: DistortionSummary::from_volume(&magnitude),
            paths: pipeline.paths,
            mri,
        })
    }

    /// Processes every MRI in sorted path order, stopping at the first failure
    ///
    /// Inputs whose names reduce to the same stem are rejected before any
    /// registration runs, since their results would overwrite each other.
    pub fn process_all<R: CommandRunner>(
        &self,
        mris: &[PathBuf],
        out_dir: &Path,
        runner: &mut R,
    ) -> Result<Vec<RunSummary>> {
        let mut sorted = mris.to_vec();
        sorted.sort();
        check_unique_stems(&sorted)?;

        sorted
            .iter()
            .map(|mri| self.process(mri, out_dir, runner))
            .collect()
    }
}

fn check_unique_stems(mris: &[PathBuf]) -> Result<()> {
    let mut seen: HashMap<String, &PathBuf> = HashMap::new();
    for mri in mris {
        let stem = mri
            .file_name()
            .map(|name| remove_niigz(&name.to_string_lossy()))
            .unwrap_or_default();
        if let Some(first) = seen.get(&stem) {
            return Err(GeomqaError::DuplicateStem {
                stem,
                first: first.to_path_buf(),
                second: mri.clone(),
            });
        }
        seen.insert(stem, mri);
    }
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        return Err(GeomqaError::MissingFile(path.to_path_buf()));
    }
    Ok(path.canonicalize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ExternalCommand;
    use ndarray::Array3;
    use nifti::writer::WriterOptions;
    use std::fs::File;
    use tempfile::TempDir;

    /// Stands in for the external tools: the resampling step copies the MRI
    /// into the magnitude image, everything else does nothing
    #[derive(Default)]
    struct FakeTools {
        ran: Vec<String>,
    }

    impl CommandRunner for FakeTools {
        fn run(&mut self, command: &ExternalCommand) -> Result<()> {
            self.ran.push(command.program_name());
            if command.program_name() == "reg_resample" {
                let args = command.arg_strings();
                let value = |flag: &str| {
                    let i = args.iter().position(|a| a == flag).unwrap();
                    PathBuf::from(&args[i + 1])
                };
                fs::copy(value("-ref"), value("-res"))?;
            }
            Ok(())
        }

        fn spawn_detached(&mut self, _command: &ExternalCommand) -> Result<()> {
            Ok(())
        }
    }

    fn write_mri(path: &Path) {
        let data = Array3::from_shape_fn((8, 8, 6), |(x, y, z)| (x + y + z) as f32);
        WriterOptions::new(path).write_nifti(&data).unwrap();
    }

    fn setup() -> (TempDir, DistortionQa) {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("ref");
        fs::create_dir_all(&data_dir).unwrap();
        File::create(data_dir.join("ct.nii.gz")).unwrap();
        File::create(data_dir.join("ctmask.nii.gz")).unwrap();

        let qa = DistortionQa::new(ToolConfig::default().with_data_dir(&data_dir));
        (temp_dir, qa)
    }

    #[test]
    fn test_process_writes_figure() {
        let (temp_dir, qa) = setup();
        let mri = temp_dir.path().join("mri.nii.gz");
        write_mri(&mri);
        let out_dir = temp_dir.path().join("out");
        let mut tools = FakeTools::default();

        let summary = qa.process(&mri, &out_dir, &mut tools).unwrap();

        assert_eq!(tools.ran.len(), 7);
        assert!(summary.paths.figure.is_file());
        assert!(summary.paths.results_dir.is_dir());
        assert_eq!(summary.distortion.max, 19.0);
        assert!(summary.paths.figure.ends_with("mri_distortion_results.svg"));
    }

    #[test]
    fn test_process_all_sorted() {
        let (temp_dir, qa) = setup();
        let b = temp_dir.path().join("b.nii.gz");
        let a = temp_dir.path().join("a.nii.gz");
        write_mri(&b);
        write_mri(&a);

        let summaries = qa
            .process_all(&[b, a], &temp_dir.path().join("out"), &mut FakeTools::default())
            .unwrap();

        let names: Vec<_> = summaries
            .iter()
            .map(|s| s.paths.results_dir.file_name().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_process_all_rejects_duplicate_stems() {
        let (temp_dir, qa) = setup();
        let first = temp_dir.path().join("x").join("mri.nii.gz");
        let second = temp_dir.path().join("y").join("mri.nii.gz");
        for mri in [&first, &second] {
            fs::create_dir_all(mri.parent().unwrap()).unwrap();
            write_mri(mri);
        }
        let out_dir = temp_dir.path().join("out");
        let mut tools = FakeTools::default();

        let err = qa
            .process_all(&[second, first], &out_dir, &mut tools)
            .unwrap_err();

        assert!(matches!(err, GeomqaError::DuplicateStem { ref stem, .. } if stem == "mri"));
        assert!(tools.ran.is_empty());
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_process_missing_mri() {
        let (temp_dir, qa) = setup();
        let err = qa
            .process(
                &temp_dir.path().join("missing.nii.gz"),
                temp_dir.path(),
                &mut FakeTools::default(),
            )
            .unwrap_err();
        assert!(matches!(err, GeomqaError::MissingFile(_)));
    }

    #[test]
    fn test_check_versions_without_niftyreg() {
        let temp_dir = TempDir::new().unwrap();
        let config = ToolConfig::default()
            .with_niftyreg_dir(temp_dir.path().join("missing"))
            .with_mrtrix_dir(Some(temp_dir.path().to_path_buf()));

        let err = DistortionQa::new(config).check_versions().unwrap_err();
        assert!(matches!(err, GeomqaError::ToolNotFound { .. }));
    }
}
