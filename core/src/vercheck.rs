//! Version checks of the external software
//!
//! Distortion results are only meaningful for tool versions the workflow has
//! been validated against, so each tool reports its version before any image
//! is processed.

use crate::config::ToolConfig;
use crate::error::{GeomqaError, Result};
use log::{debug, error, info, warn};
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

/// Outcome of comparing an installed version against the validated list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCheck {
    Pass,
    /// Version not validated, but the user asked to continue anyway
    Fail,
}

/// Parses the version out of `mrinfo -version` output
///
/// The first line has the form `== mrinfo 3.0.1-26-g0f28beae ==`
pub fn parse_mrinfo_version(output: &str) -> Result<String> {
    let first_line = output
        .trim()
        .lines()
        .next()
        .ok_or_else(|| GeomqaError::VersionParse("empty mrinfo output".to_string()))?;

    first_line
        .split(' ')
        .nth(2)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GeomqaError::VersionParse(format!("unexpected mrinfo output '{}'", first_line)))
}

/// Determines the MRtrix version installed on the system
pub fn mrtrix_version(config: &ToolConfig) -> Result<String> {
    let mrinfo = config.mrinfo();
    debug!("Running {} -version", mrinfo.display());

    let output = match Command::new(&mrinfo).arg("-version").output() {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(GeomqaError::ToolNotFound {
                program: "mrinfo".to_string(),
                hint: "mrinfo (an mrtrix command) used to check version is not in your path"
                    .to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    if !output.status.success() {
        return Err(GeomqaError::ToolFailed {
            program: mrinfo.display().to_string(),
            status: output.status,
        });
    }

    parse_mrinfo_version(&String::from_utf8_lossy(&output.stdout))
}

/// Determines the NiftyReg version from `reg_aladin -version`
///
/// # Errors
///
/// Returns [`GeomqaError::NiftyRegNotFound`] if `niftyreg_dir` is not a directory
pub fn niftyreg_version(niftyreg_dir: &Path) -> Result<String> {
    if !niftyreg_dir.is_dir() {
        return Err(GeomqaError::NiftyRegNotFound(niftyreg_dir.to_path_buf()));
    }

    let reg_aladin = niftyreg_dir.join("reg_aladin");
    debug!("Running {} -version", reg_aladin.display());

    let output = Command::new(&reg_aladin)
        .arg("-version")
        .output()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => GeomqaError::ToolNotFound {
                program: "reg_aladin".to_string(),
                hint: format!("not present in {}", niftyreg_dir.display()),
            },
            _ => e.into(),
        })?;

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Compares the installed version of a library to the validated versions
///
/// With `any_version` set a failed check is only logged.
pub fn check_version(
    lib: &str,
    found: &str,
    expected: &[&str],
    any_version: bool,
) -> Result<VersionCheck> {
    if expected.contains(&found) {
        info!("PASS version check on {} ({})", lib, found);
        return Ok(VersionCheck::Pass);
    }

    let expected = expected.join(" or ");
    warn!("FAIL using non-validated {} version", lib);
    warn!("expected {}, got {}", expected, found);

    if any_version {
        return Ok(VersionCheck::Fail);
    }

    error!("exiting");
    Err(GeomqaError::UnvalidatedVersion {
        lib: lib.to_string(),
        found: found.to_string(),
        expected,
    })
}
