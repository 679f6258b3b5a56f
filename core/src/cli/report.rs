use crate::api::ToolVersions;
use crate::summary::RunSummary;
use std::fmt;

/// Text report formatter for a distortion measurement
pub struct TextReport<'a> {
    summary: &'a RunSummary,
    versions: Option<&'a ToolVersions>,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(summary: &'a RunSummary) -> Self {
        Self {
            summary,
            versions: None,
        }
    }

    /// Includes the versions of the external software in the report
    pub fn with_versions(mut self, versions: &'a ToolVersions) -> Self {
        self.versions = Some(versions);
        self
    }
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let distortion = &self.summary.distortion;

        writeln!(f, "Geometric Distortion")?;
        writeln!(f, "====================")?;
        writeln!(f)?;
        writeln!(f, "MRI:            {}", self.summary.mri.display())?;
        writeln!(f, "Results:        {}", self.summary.paths.results_dir.display())?;
        writeln!(f, "Figure:         {}", self.summary.paths.figure.display())?;
        if let Some(versions) = self.versions {
            writeln!(f, "MRtrix:         {}", versions.mrtrix)?;
            writeln!(f, "NiftyReg:       {}", versions.niftyreg)?;
        }
        writeln!(f)?;

        writeln!(f, "Distortion (mm)")?;
        writeln!(f, "---------------")?;
        if distortion.voxels == 0 {
            writeln!(f, "No distortion measured")?;
            return Ok(());
        }
        writeln!(f, "Voxels:         {}", distortion.voxels)?;
        writeln!(f, "Maximum:        {:.2}", distortion.max)?;
        writeln!(f, "Mean:           {:.2}", distortion.mean)?;
        writeln!(f, "95th pct:       {:.2}", distortion.p95)?;

        Ok(())
    }
}
