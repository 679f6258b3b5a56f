use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Removes a trailing `.nii` or `.nii.gz` (any case) from a file name
///
/// # Example
///
/// ```
/// use geomqa_core::remove_niigz;
///
/// assert_eq!(remove_niigz("mri.nii.gz"), "mri");
/// assert_eq!(remove_niigz("mri.nii"), "mri");
/// assert_eq!(remove_niigz("mri.img"), "mri.img");
/// ```
pub fn remove_niigz(name: &str) -> String {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    let re = REGEX.get_or_init(|| Regex::new(r"(?i)\.nii(\.gz)?$").expect("Failed to compile regex"));

    re.replace(name, "").into_owned()
}

/// Paths of every file written while measuring the distortion of one MRI
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ResultPaths {
    /// Per-MRI directory holding the intermediate images
    pub results_dir: PathBuf,
    /// Link to the CT reference for visual checks of the registration
    pub ct_link: PathBuf,
    pub rigid: PathBuf,
    pub affine: PathBuf,
    pub nonrigid: PathBuf,
    /// Control point grid of the non-rigid registration
    pub cpp: PathBuf,
    pub displacement_field_ct: PathBuf,
    pub magnitude_ct: PathBuf,
    pub mr2ct_deformation: PathBuf,
    pub ct2mr_deformation: PathBuf,
    pub magnitude_mri: PathBuf,
    /// Contour figure, written next to (not inside) the results directory
    pub figure: PathBuf,
}

impl ResultPaths {
    /// Derives the result paths for `mri` under `out_dir`
    pub fn new(out_dir: &Path, mri: &Path) -> Self {
        let stem = mri
            .file_name()
            .map(|name| remove_niigz(&name.to_string_lossy()))
            .unwrap_or_default();
        let results_dir = out_dir.join(&stem);
        let file = |name: &str| results_dir.join(name);

        Self {
            ct_link: file("ct.nii.gz"),
            rigid: file("mr2ct_rigid.nii.gz"),
            affine: file("mr2ct_rigid.aff"),
            nonrigid: file("mr2ct_nonrigid.nii.gz"),
            cpp: file("mr2ct_cpp.nii.gz"),
            displacement_field_ct: file("displ_field_ct.nii.gz"),
            magnitude_ct: file("mag_displ_field_ct.nii.gz"),
            mr2ct_deformation: file("mr2ct_deformation.nii.gz"),
            ct2mr_deformation: file("ct2mr_deformation.nii.gz"),
            magnitude_mri: file("mag_displ_field_mri.nii.gz"),
            figure: out_dir.join(format!("{}_distortion_results.svg", stem)),
            results_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a", "a")]
    #[case("a.b", "a.b")]
    #[case("a.nii", "a")]
    #[case("a.nii.gz", "a")]
    #[case("a.NII.GZ", "a")]
    #[case("a.nii.gz.bak", "a.nii.gz.bak")]
    #[case("scan.nii.nii.gz", "scan.nii")]
    fn test_remove_niigz(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(remove_niigz(name), expected);
    }

    #[test]
    fn test_result_paths() {
        let paths = ResultPaths::new(Path::new("/out"), Path::new("/data/mri.nii.gz"));

        assert_eq!(paths.results_dir, PathBuf::from("/out/mri"));
        assert_eq!(paths.ct_link, PathBuf::from("/out/mri/ct.nii.gz"));
        assert_eq!(paths.rigid, PathBuf::from("/out/mri/mr2ct_rigid.nii.gz"));
        assert_eq!(paths.affine, PathBuf::from("/out/mri/mr2ct_rigid.aff"));
        assert_eq!(paths.nonrigid, PathBuf::from("/out/mri/mr2ct_nonrigid.nii.gz"));
        assert_eq!(paths.cpp, PathBuf::from("/out/mri/mr2ct_cpp.nii.gz"));
        assert_eq!(
            paths.displacement_field_ct,
            PathBuf::from("/out/mri/displ_field_ct.nii.gz")
        );
        assert_eq!(
            paths.magnitude_ct,
            PathBuf::from("/out/mri/mag_displ_field_ct.nii.gz")
        );
        assert_eq!(
            paths.mr2ct_deformation,
            PathBuf::from("/out/mri/mr2ct_deformation.nii.gz")
        );
        assert_eq!(
            paths.ct2mr_deformation,
            PathBuf::from("/out/mri/ct2mr_deformation.nii.gz")
        );
        assert_eq!(
            paths.magnitude_mri,
            PathBuf::from("/out/mri/mag_displ_field_mri.nii.gz")
        );
        assert_eq!(
            paths.figure,
            PathBuf::from("/out/mri_distortion_results.svg")
        );
    }

    #[test]
    fn test_result_paths_plain_nii() {
        let paths = ResultPaths::new(Path::new("out"), Path::new("phantom_t1.nii"));
        assert_eq!(paths.results_dir, PathBuf::from("out/phantom_t1"));
        assert_eq!(
            paths.figure,
            PathBuf::from("out/phantom_t1_distortion_results.svg")
        );
    }
}
