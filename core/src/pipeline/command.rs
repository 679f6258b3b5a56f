use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// An invocation of an external program
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalCommand {
    /// Short description used in progress messages
    pub label: &'static str,
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(label: &'static str, program: impl Into<PathBuf>) -> Self {
        Self {
            label,
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends a single argument
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends a flag followed by its value, e.g. `-ref ct.nii.gz`
    pub fn opt(self, flag: &str, value: impl AsRef<OsStr>) -> Self {
        self.arg(flag).arg(value)
    }

    /// Program file name without its directory
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// Arguments as strings, lossily converted
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Whether `path` is passed anywhere in the argument list
    pub fn uses(&self, path: &Path) -> bool {
        self.args.iter().any(|a| Path::new(a) == path)
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display() {
        let cmd = ExternalCommand::new("test", "/nr/reg_aladin")
            .opt("-ref", "ct.nii.gz")
            .arg("-rigOnly");

        assert_eq!(cmd.to_string(), "/nr/reg_aladin -ref ct.nii.gz -rigOnly");
        assert_eq!(cmd.program_name(), "reg_aladin");
        assert_eq!(cmd.arg_strings(), vec!["-ref", "ct.nii.gz", "-rigOnly"]);
    }

    #[test]
    fn test_command_uses() {
        let cmd = ExternalCommand::new("test", "mrmath").arg("/out/a.nii.gz");
        assert!(cmd.uses(Path::new("/out/a.nii.gz")));
        assert!(!cmd.uses(Path::new("/out/b.nii.gz")));
    }

    #[test]
    fn test_to_command() {
        let cmd = ExternalCommand::new("test", "mrmath").opt("-axis", "4");
        let command = cmd.to_command();
        assert_eq!(command.get_program(), "mrmath");
        assert_eq!(command.get_args().collect::<Vec<_>>(), vec!["-axis", "4"]);
    }
}
