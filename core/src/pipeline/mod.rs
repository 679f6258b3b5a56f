//! Registration pipeline
//!
//! Registers one MRI of the phantom to the CT reference with NiftyReg and
//! derives the distortion magnitude in MRI space. Every step is an external
//! program; the outputs of one step are the inputs of the next.

mod command;
mod runner;

pub use command::ExternalCommand;
pub use runner::{CommandRunner, ProcessRunner};

use crate::config::ToolConfig;
use crate::error::{GeomqaError, Result};
use crate::paths::ResultPaths;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Voxel the viewer centres on, chosen through the phantom centre of the CT
const VIEWER_VOXEL: &str = "271,257,134";

/// Commands needed to measure the distortion of a single MRI
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub mri: PathBuf,
    pub ct: PathBuf,
    pub ct_mask: PathBuf,
    pub paths: ResultPaths,
    config: ToolConfig,
}

impl Pipeline {
    /// Creates the pipeline for `mri`, writing results under `out_dir`
    pub fn new(config: &ToolConfig, mri: &Path, out_dir: &Path) -> Self {
        Self {
            mri: mri.to_path_buf(),
            ct: config.ct(),
            ct_mask: config.ct_mask(),
            paths: ResultPaths::new(out_dir, mri),
            config: config.clone(),
        }
    }

    /// Rigid registration of the MRI to the CT
    pub fn rigid_command(&self) -> ExternalCommand {
        ExternalCommand::new("rigid registration with reg_aladin", self.config.reg_aladin())
            .opt("-ref", &self.ct)
            .opt("-flo", &self.mri)
            .opt("-rmask", &self.ct_mask)
            .opt("-res", &self.paths.rigid)
            .arg("-rigOnly")
            .opt("-aff", &self.paths.affine)
    }

    /// Non-rigid registration of the rigidly registered MRI to the CT
    pub fn nonrigid_command(&self) -> ExternalCommand {
        ExternalCommand::new("non-rigid registration with reg_f3d", self.config.reg_f3d())
            .opt("-ref", &self.ct)
            .opt("-flo", &self.paths.rigid)
            .opt("-rmask", &self.ct_mask)
            .opt("-res", &self.paths.nonrigid)
            .opt("-cpp", &self.paths.cpp)
            .opt("-be", "0.005")
            .opt("-maxit", "500")
            .opt("-sx", "15")
            .opt("-ln", "4")
            .opt("-lp", "2")
    }

    /// Viewer overlaying the rigid (red) and non-rigid (blue) results on the CT
    pub fn viewer_command(&self) -> ExternalCommand {
        let mut cmd = ExternalCommand::new("displaying registered images with mrview", self.config.mrview())
            .arg(&self.ct)
            .opt("-voxel", VIEWER_VOXEL)
            .opt("-mode", "2")
            .opt("-intensity_range", "1000,1500");

        for (overlay, colour) in [(&self.paths.rigid, "1,0,0"), (&self.paths.nonrigid, "0,0,1")] {
            cmd = cmd
                .opt("-overlay.load", overlay)
                .opt("-overlay.opacity", "0.6")
                .opt("-overlay.colour", colour)
                .opt("-overlay.intensity", "200,4095")
                .opt("-overlay.threshold_min", "200");
        }

        cmd
    }

    /// Displacement field in CT space from the control point grid
    pub fn displacement_command(&self) -> ExternalCommand {
        ExternalCommand::new(
            "calculating displacement field in CT-space with reg_transform",
            self.config.reg_transform(),
        )
        .opt("-ref", &self.ct)
        .arg("-disp")
        .arg(&self.paths.cpp)
        .arg(&self.paths.displacement_field_ct)
    }

    /// Magnitude of the displacement vectors, in mm
    pub fn magnitude_command(&self) -> ExternalCommand {
        ExternalCommand::new(
            "calculating magnitude of displacement field in CT-space with mrmath",
            self.config.mrmath(),
        )
        .opt("-axis", "4")
        .arg(&self.paths.displacement_field_ct)
        .arg("norm")
        .arg(&self.paths.magnitude_ct)
    }

    /// Composes the rigid affine and the non-rigid control point grid
    pub fn compose_command(&self) -> ExternalCommand {
        ExternalCommand::new(
            "composing mr2ct_rigid.aff and mr2ct_cpp.nii.gz with reg_transform",
            self.config.reg_transform(),
        )
        .opt("-ref", &self.ct)
        .arg("-comp")
        .arg(&self.paths.affine)
        .arg(&self.paths.cpp)
        .arg(&self.paths.mr2ct_deformation)
    }

    /// Inverts the composed MRI to CT deformation
    pub fn invert_command(&self) -> ExternalCommand {
        ExternalCommand::new(
            "inverting composed transformation with reg_transform",
            self.config.reg_transform(),
        )
        .opt("-ref", &self.ct)
        .arg("-invNrr")
        .arg(&self.paths.mr2ct_deformation)
        .arg(&self.mri)
        .arg(&self.paths.ct2mr_deformation)
    }

    /// Resamples the CT-space magnitude into MRI space
    pub fn resample_command(&self) -> ExternalCommand {
        ExternalCommand::new(
            "resampling into MRI space with reg_resample",
            self.config.reg_resample(),
        )
        .opt("-ref", &self.mri)
        .opt("-flo", &self.paths.magnitude_ct)
        .opt("-trans", &self.paths.ct2mr_deformation)
        .opt("-res", &self.paths.magnitude_mri)
        .opt("-inter", "1")
    }

    /// Blocking steps in execution order (the viewer is not included)
    pub fn steps(&self) -> Vec<ExternalCommand> {
        vec![
            self.rigid_command(),
            self.nonrigid_command(),
            self.displacement_command(),
            self.magnitude_command(),
            self.compose_command(),
            self.invert_command(),
            self.resample_command(),
        ]
    }

    /// Creates the results directory and links the CT reference into it
    pub fn prepare(&self) -> Result<()> {
        for required in [&self.mri, &self.ct, &self.ct_mask] {
            if !required.is_file() {
                return Err(GeomqaError::MissingFile(required.clone()));
            }
        }

        fs::create_dir_all(&self.paths.results_dir)?;

        let link = &self.paths.ct_link;
        if link.symlink_metadata().is_ok() {
            warn!("Replacing existing {}", link.display());
            fs::remove_file(link)?;
        }
        link_file(&self.ct, link)
    }

    /// Runs every step, stopping at the first failure
    ///
    /// With `show_viewer` the registered images are opened in mrview once the
    /// non-rigid registration has finished; a viewer that fails to start
    /// does not stop the run.
    pub fn execute<R: CommandRunner>(&self, runner: &mut R, show_viewer: bool) -> Result<()> {
        self.prepare()?;

        info!("registering MRI to CT");
        for step in self.steps() {
            info!("{}", step.label);
            runner.run(&step)?;

            if show_viewer && step.program == self.config.reg_f3d() {
                let viewer = self.viewer_command();
                info!("{}", viewer.label);
                if let Err(e) = runner.spawn_detached(&viewer) {
                    warn!("Viewer not started: {}", e);
                }
            }
        }

        Ok(())
    }
}

#[cfg(unix)]
fn link_file(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link)?;
    Ok(())
}

#[cfg(not(unix))]
fn link_file(target: &Path, link: &Path) -> Result<()> {
    fs::copy(target, link)?;
    Ok(())
}
