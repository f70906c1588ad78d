/// Command execution utilities shared by the external tool wrappers
use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Result from command execution with captured output
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl CommandOutput {
    /// Create from tokio Command output
    fn from_output(output: std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        }
    }

    /// Return Ok if successful, otherwise error with stderr
    pub fn into_result(self) -> Result<String> {
        if self.success {
            Ok(self.stdout)
        } else {
            anyhow::bail!("{}", self.stderr.trim())
        }
    }
}

/// Builder for executing external commands with common patterns
pub struct CommandBuilder {
    command: Command,
    display: String,
    context_msg: Option<String>,
    stdin_input: Option<String>,
    interactive: bool,
}

impl CommandBuilder {
    /// Create a new command builder
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        let display = program.as_ref().to_string_lossy().to_string();
        let mut command = Command::new(program);
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
        Self {
            command,
            display,
            context_msg: None,
            stdin_input: None,
            interactive: false,
        }
    }

    /// Add a single argument
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.display.push(' ');
        self.display.push_str(&arg.as_ref().to_string_lossy());
        self.command.arg(arg);
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Set an environment variable
    pub fn env<K, V>(mut self, key: K, val: V) -> Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.command.env(key, val);
        self
    }

    /// Set KUBECONFIG when a session kubeconfig is active
    pub fn kubeconfig(self, path: Option<&Path>) -> Self {
        match path {
            Some(path) => self.env("KUBECONFIG", path),
            None => self,
        }
    }

    /// Feed data to the child's stdin (never logged)
    pub fn stdin_input<S: Into<String>>(mut self, input: S) -> Self {
        self.stdin_input = Some(input.into());
        self
    }

    /// Inherit the terminal so the child can prompt the operator
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    /// Set context message for error reporting
    pub fn context<S: Into<String>>(mut self, msg: S) -> Self {
        self.context_msg = Some(msg.into());
        self
    }

    /// Execute and return raw output
    ///
    /// Interactive commands report only their exit status; stdout and stderr
    /// went straight to the terminal.
    pub async fn output(mut self) -> Result<CommandOutput> {
        debug!("Executing: {}", self);

        let ctx = self
            .context_msg
            .clone()
            .unwrap_or_else(|| format!("Failed to execute {}", self.display));

        if self.interactive {
            self.command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
            let status = self.command.status().await.context(ctx)?;
            return Ok(CommandOutput {
                stdout: String::new(),
                stderr: format!("{} exited with {}", self.display, status),
                success: status.success(),
            });
        }

        let output = match self.stdin_input.take() {
            Some(input) => {
                let mut child = self
                    .command
                    .stdin(Stdio::piped())
                    .spawn()
                    .context(ctx.clone())?;
                if let Some(mut stdin) = child.stdin.take() {
                    stdin
                        .write_all(input.as_bytes())
                        .await
                        .context(ctx.clone())?;
                }
                child.wait_with_output().await.context(ctx)?
            }
            None => self.command.output().await.context(ctx)?,
        };

        Ok(CommandOutput::from_output(output))
    }

    /// Execute and return stdout on success, error on failure
    pub async fn run(self) -> Result<String> {
        self.output().await?.into_result()
    }

    /// Execute and ignore output (just check success)
    pub async fn run_silent(self) -> Result<()> {
        self.output().await?.into_result().map(|_| ())
    }

    /// Execute and report only whether the command succeeded
    pub async fn succeeds(self) -> bool {
        matches!(self.output().await, Ok(out) if out.success)
    }
}

/// The command line as logged; stdin input is never shown
impl fmt::Display for CommandBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Check if a command-line tool is installed
pub async fn is_tool_installed(tool_name: &str, version_args: &[&str]) -> bool {
    CommandBuilder::new(tool_name)
        .args(version_args)
        .succeeds()
        .await
}
