use std::io;
use std::path::PathBuf;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::release::{parse_releases, Release, HELM_TIME_FORMAT};

/// How many releases `helm list` returns when `--max` is not given.
pub const DEFAULT_MAX: usize = 256;

/// Captured result of an external command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub status: String,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Runs external programs to completion.
pub trait Executor {
    async fn execute(&self, program: &str, args: &[String]) -> io::Result<CommandOutput>;
}

/// Spawns real processes.
#[derive(Debug, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    async fn execute(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await?;
        Ok(CommandOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ListOptions {
    pub all_namespaces: bool,
    pub max: usize,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            all_namespaces: false,
            max: DEFAULT_MAX,
        }
    }
}

impl ListOptions {
    fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["list", "--no-headers", "-o", "json", "--time-format", HELM_TIME_FORMAT]
            .into_iter()
            .map(String::from)
            .collect();
        if self.all_namespaces {
            args.push("-A".to_string());
        }
        if self.max != DEFAULT_MAX {
            args.push("-m".to_string());
            args.push(self.max.to_string());
        }
        args
    }
}

/// Talks to the helm binary at a fixed path.
#[derive(Debug)]
pub struct Helm<E = SystemExecutor> {
    bin: PathBuf,
    executor: E,
}

impl Helm {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self::with_executor(bin, SystemExecutor)
    }
}

impl<E: Executor> Helm<E> {
    pub fn with_executor(bin: impl Into<PathBuf>, executor: E) -> Self {
        Self {
            bin: bin.into(),
            executor,
        }
    }

    fn program(&self) -> String {
        self.bin.to_string_lossy().into_owned()
    }

    /// Fetches the release inventory with `helm list`.
    pub async fn list_releases(&self, options: &ListOptions) -> Result<Vec<Release>> {
        let program = self.program();
        let args = options.args();
        debug!("Running {program} {}", args.join(" "));

        let output = self
            .executor
            .execute(&program, &args)
            .await
            .map_err(|source| Error::Spawn {
                program: program.clone(),
                source,
            })?;
        if !output.success {
            return Err(Error::CommandFailed {
                command: format!("{program} list"),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }

        let releases = parse_releases(&output.stdout)?;
        debug!("Got {} releases from {program}.", releases.len());
        Ok(releases)
    }

    /// Removes `release` with `helm uninstall`, returning its stdout and stderr.
    pub async fn uninstall(&self, release: &Release) -> Result<String> {
        let program = self.program();
        let args: Vec<String> = vec![
            "uninstall".to_string(),
            "-n".to_string(),
            release.namespace.clone(),
            release.name.clone(),
        ];
        info!("Uninstalling release {} in namespace {}.", release.name, release.namespace);

        let output = self
            .executor
            .execute(&program, &args)
            .await
            .map_err(|source| Error::UninstallSpawn {
                release: release.key(),
                program: program.clone(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        if !output.success {
            return Err(Error::Uninstall {
                release: release.key(),
                output: format!("{}, {}", output.status, combined.trim_end()),
            });
        }
        Ok(combined)
    }
}
