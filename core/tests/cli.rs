use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn geomqa() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_geomqa"));
    cmd.env_remove("GEOMQA_NIFTYREG")
        .env_remove("GEOMQA_MRTRIX")
        .env_remove("GEOMQA_DATA")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_prints_help_without_arguments() {
    let output = geomqa().output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage: geomqa"));
}

#[test]
fn test_prints_help() {
    let output = geomqa().arg("-h").output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage: geomqa"));
}

#[test]
fn test_prints_usage_for_invalid_option() {
    let output = geomqa().args(["-!", "mri.nii.gz", "out"]).output().unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Usage: geomqa"));
}

#[test]
fn test_prints_version() {
    let output = geomqa().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("geomqa "));
}

#[cfg(not(feature = "json"))]
#[test]
fn test_json_format_requires_feature() {
    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("out");

    let output = geomqa()
        .args(["--format", "json"])
        .arg(dir.path().join("mri.nii.gz"))
        .arg(&out)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("JSON output requires the 'json' feature"));
    assert!(!out.exists());
}

#[cfg(unix)]
mod fake_tools {
    use super::*;
    use ndarray::Array3;
    use nifti::writer::WriterOptions;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    const SUCCEED: &str = "#!/bin/sh\nexit 0\n";

    const RESAMPLE: &str = r#"#!/bin/sh
ref=""
res=""
while [ $# -gt 0 ]; do
    case "$1" in
        -ref) ref="$2"; shift ;;
        -res) res="$2"; shift ;;
    esac
    shift
done
cp "$ref" "$res"
"#;

    /// Installs scripts standing in for NiftyReg and MRtrix, plus the CT
    /// reference data and one MRI
    struct Setup {
        dir: TempDir,
    }

    impl Setup {
        fn new(niftyreg_version: &str) -> Self {
            let dir = TempDir::new().unwrap();
            let setup = Self { dir };

            for sub in ["niftyreg", "mrtrix", "ref"] {
                fs::create_dir_all(setup.path(sub)).unwrap();
            }

            setup.script(
                "niftyreg/reg_aladin",
                &format!(
                    "#!/bin/sh\nif [ \"$1\" = \"-version\" ]; then echo {}; fi\nexit 0\n",
                    niftyreg_version
                ),
            );
            setup.script("niftyreg/reg_f3d", SUCCEED);
            setup.script("niftyreg/reg_transform", SUCCEED);
            setup.script("niftyreg/reg_resample", RESAMPLE);
            setup.script(
                "mrtrix/mrinfo",
                "#!/bin/sh\necho '== mrinfo 3.0.4 =='\necho 'Author(s): test'\n",
            );
            setup.script("mrtrix/mrmath", SUCCEED);

            fs::write(setup.path("ref/ct.nii.gz"), b"").unwrap();
            fs::write(setup.path("ref/ctmask.nii.gz"), b"").unwrap();

            let data = Array3::from_shape_fn((10, 10, 8), |(x, y, z)| (x * y + z) as f32);
            WriterOptions::new(setup.path("mri.nii.gz"))
                .write_nifti(&data)
                .unwrap();

            setup
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn script(&self, name: &str, content: &str) {
            let path = self.path(name);
            fs::write(&path, content).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }

        fn command(&self) -> Command {
            let mut cmd = geomqa();
            cmd.arg("--niftyreg")
                .arg(self.path("niftyreg"))
                .arg("--mrtrix")
                .arg(self.path("mrtrix"))
                .arg("--data-dir")
                .arg(self.path("ref"));
            cmd
        }
    }

    fn assert_is_symlink(path: &Path) {
        assert!(path.symlink_metadata().unwrap().file_type().is_symlink());
    }

    #[test]
    fn test_full_run() {
        let setup = Setup::new("1.5.69");
        let out = setup.path("out");

        let output = setup
            .command()
            .arg(setup.path("mri.nii.gz"))
            .arg(&out)
            .output()
            .unwrap();

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(out.join("mri").is_dir());
        assert_is_symlink(&out.join("mri").join("ct.nii.gz"));
        assert!(out.join("mri").join("mag_displ_field_mri.nii.gz").is_file());

        let figure = fs::read_to_string(out.join("mri_distortion_results.svg")).unwrap();
        assert!(figure.contains("Distortion of mri.nii.gz"));

        let report = stdout(&output);
        assert!(report.contains("Geometric Distortion"));
        assert!(report.contains("NiftyReg:       1.5.69"));
        assert!(report.contains("Maximum:        88.00"));
    }

    #[test]
    fn test_unvalidated_version_aborts() {
        let setup = Setup::new("9.9.9");

        let output = setup
            .command()
            .arg(setup.path("mri.nii.gz"))
            .arg(setup.path("out"))
            .output()
            .unwrap();

        assert!(!output.status.success());
        assert!(stderr(&output).contains("non-validated niftyreg version 9.9.9"));
        assert!(!setup.path("out").exists());
    }

    #[test]
    fn test_any_version_continues() {
        let setup = Setup::new("9.9.9");

        let output = setup
            .command()
            .arg("--any-version")
            .arg(setup.path("mri.nii.gz"))
            .arg(setup.path("out"))
            .output()
            .unwrap();

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(setup.path("out/mri_distortion_results.svg").is_file());
    }

    #[test]
    fn test_failing_tool_aborts() {
        let setup = Setup::new("1.5.69");
        setup.script("niftyreg/reg_f3d", "#!/bin/sh\nexit 2\n");

        let output = setup
            .command()
            .arg(setup.path("mri.nii.gz"))
            .arg(setup.path("out"))
            .output()
            .unwrap();

        assert!(!output.status.success());
        assert!(stderr(&output).contains("reg_f3d failed"));
        assert!(!setup.path("out/mri/mag_displ_field_mri.nii.gz").exists());
        assert!(!setup.path("out/mri_distortion_results.svg").exists());
    }

    #[test]
    fn test_missing_niftyreg() {
        let setup = Setup::new("1.5.69");

        let output = geomqa()
            .arg("--niftyreg")
            .arg(setup.path("missing"))
            .arg("--mrtrix")
            .arg(setup.path("mrtrix"))
            .arg(setup.path("mri.nii.gz"))
            .arg(setup.path("out"))
            .output()
            .unwrap();

        assert!(!output.status.success());
        assert!(stderr(&output).contains("niftyreg not found"));
    }
}
