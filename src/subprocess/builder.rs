use std::path::Path;

use super::ProcessCommand;

/// Assembles a [`ProcessCommand`] argument by argument.
///
/// ```
/// use panbatch::subprocess::ProcessCommandBuilder;
///
/// let command = ProcessCommandBuilder::new("gdaladdo")
///     .path("/data/out_pansh.tif".as_ref())
///     .arg("2")
///     .build();
/// assert_eq!(command.display_line(), "gdaladdo /data/out_pansh.tif 2");
/// ```
pub struct ProcessCommandBuilder {
    program: String,
    args: Vec<String>,
}

impl ProcessCommandBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// A flag followed by its value, e.g. `-p 3413`
    pub fn option(mut self, flag: &str, value: impl ToString) -> Self {
        self.args.push(flag.to_string());
        self.args.push(value.to_string());
        self
    }

    /// Filesystem path argument, lossily converted to UTF-8
    pub fn path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    pub fn build(self) -> ProcessCommand {
        ProcessCommand {
            program: self.program,
            args: self.args,
        }
    }
}
