//! Command type for building executable commands

use crate::args::split_arguments;
use crate::error::Result;
use crate::resolver::BinaryDescriptor;
use async_process::{Command as AsyncCommand, Stdio};
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// A tool invocation: resolved program, argv, environment overrides and cwd
///
/// Converted to an `async_process::Command` by [`prepare`](Self::prepare) for
/// each run, so one value can be spawned repeatedly.
#[derive(Debug, Clone)]
pub struct Command {
    /// The program to execute
    program: OsString,
    /// The arguments to pass to the program
    args: Vec<OsString>,
    /// Environment overrides, applied over the inherited environment
    env: HashMap<OsString, OsString>,
    /// Working directory for the command
    current_dir: Option<PathBuf>,
}

impl Command {
    /// Create a new command for the given program
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            args: Vec::new(),
            env: HashMap::new(),
            current_dir: None,
        }
    }

    /// Create a command for a resolved binary and a composed argument string
    ///
    /// Fails if the descriptor has no path or the argument string is malformed.
    pub fn for_binary(descriptor: &BinaryDescriptor, arguments: &str) -> Result<Self> {
        let mut cmd = Self::new(descriptor.require_path()?);
        cmd.args(split_arguments(arguments)?);
        Ok(cmd)
    }

    /// Add an argument to the command
    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Add multiple arguments to the command
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.arg(arg);
        }
        self
    }

    /// Set an environment variable
    pub fn env<K, V>(&mut self, key: K, val: V) -> &mut Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.env
            .insert(key.as_ref().to_owned(), val.as_ref().to_owned());
        self
    }

    /// Set multiple environment variables
    pub fn envs<I, K, V>(&mut self, vars: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        for (key, val) in vars {
            self.env(key, val);
        }
        self
    }

    /// Set the working directory for the command
    pub fn current_dir<P: AsRef<std::path::Path>>(&mut self, dir: P) -> &mut Self {
        self.current_dir = Some(dir.as_ref().to_owned());
        self
    }

    /// Get the program name
    pub fn get_program(&self) -> &OsStr {
        &self.program
    }

    /// Get the arguments
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// The command line as a single string, for logs and error messages
    pub fn display(&self) -> String {
        std::iter::once(self.get_program())
            .chain(self.get_args().iter().map(OsString::as_os_str))
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Prepare this command for execution with piped stdout and stderr
    pub fn prepare(&self) -> AsyncCommand {
        let mut cmd = AsyncCommand::new(&self.program);

        cmd.args(&self.args);
        for (key, val) in &self.env {
            cmd.env(key, val);
        }
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_command_setters() {
        let mut cmd = Command::new("docker");
        cmd.arg("ps")
            .arg("-a")
            .env("DOCKER_HOST", "unix:///var/run/docker.sock")
            .current_dir("/tmp");

        assert_eq!(cmd.get_program(), "docker");
        assert_eq!(cmd.get_args(), &["ps", "-a"]);
        assert_eq!(cmd.display(), "docker ps -a");
    }

    #[test]
    fn test_for_binary_splits_arguments() {
        let descriptor = BinaryDescriptor::new("docker", "/usr/bin/docker");
        let cmd = Command::for_binary(&descriptor, r#"inspect --format "{{json .}}" web"#).unwrap();

        assert_eq!(cmd.get_program(), "/usr/bin/docker");
        assert_eq!(cmd.get_args(), &["inspect", "--format", "{{json .}}", "web"]);
    }

    #[test]
    fn test_for_unresolved_binary() {
        let descriptor = BinaryDescriptor::unresolved("podman");
        assert!(matches!(
            Command::for_binary(&descriptor, "ps"),
            Err(Error::BinaryResolution { .. })
        ));
    }
}
