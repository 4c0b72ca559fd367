//! External packaging tools.
//!
//! Everything that shells out (`jlink`, `dpkg-deb`, `fakeroot`) goes through
//! a [`ToolRunner`] so bundlers can be exercised without the tools installed.

mod detection;
mod runner;

pub use detection::probe;
pub use runner::ProcessRunner;

use crate::bundler::error::Result;
use std::{fmt, path::PathBuf};

/// Exit status shells use for "command not found".
pub const EXIT_NOT_FOUND: i32 = 127;

/// One subprocess invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Runs external tools on behalf of bundlers.
#[async_trait::async_trait]
pub trait ToolRunner: Send + Sync + fmt::Debug {
    /// Location of `program` on the search path, if installed.
    fn probe(&self, program: &str) -> Option<PathBuf>;

    /// Runs the command to completion, streaming its output to the log.
    ///
    /// A non-zero exit is an [`Error::ExternalToolFailure`](crate::bundler::Error::ExternalToolFailure).
    async fn run(&self, command: &ToolCommand) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bundler::Error;
    use std::{
        collections::BTreeSet,
        sync::{Arc, Mutex},
    };

    /// Records commands instead of running them.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingRunner {
        pub(crate) installed: BTreeSet<String>,
        pub(crate) failing: BTreeSet<String>,
        pub(crate) commands: Mutex<Vec<ToolCommand>>,
    }

    impl RecordingRunner {
        pub(crate) fn with_tools(tools: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                installed: tools.iter().map(|t| t.to_string()).collect(),
                ..Self::default()
            })
        }

        pub(crate) fn commands(&self) -> Vec<ToolCommand> {
            self.commands.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ToolRunner for RecordingRunner {
        fn probe(&self, program: &str) -> Option<PathBuf> {
            self.installed
                .contains(program)
                .then(|| PathBuf::from("/usr/bin").join(program))
        }

        async fn run(&self, command: &ToolCommand) -> Result<()> {
            self.commands.lock().unwrap().push(command.clone());
            if self.failing.contains(&command.program) {
                return Err(Error::ExternalToolFailure {
                    tool: command.program.clone(),
                    code: Some(2),
                    detail: "scripted failure".into(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_command_display_quotes_spaces() {
        let cmd = ToolCommand::new("dpkg-deb")
            .arg("-b")
            .arg("My App")
            .current_dir("/tmp");
        assert_eq!(cmd.to_string(), "dpkg-deb -b \"My App\"");
        assert_eq!(cmd.cwd.as_deref(), Some(std::path::Path::new("/tmp")));
    }
}
