/// Operator prompts
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;

use crate::config::ClusterEnvironment;

/// Decisions the workflow asks the operator for
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Yes/no question; `default` is the answer to an empty reply
    async fn confirm(&self, question: &str, default: bool) -> Result<bool>;

    /// Which environment to configure cluster access for
    async fn select_environment(&self) -> Result<ClusterEnvironment>;
}

/// Prompts on the controlling terminal
pub struct TerminalPrompter {
    non_interactive: bool,
    environment: Option<ClusterEnvironment>,
    stdin: Mutex<BufReader<Stdin>>,
}

impl TerminalPrompter {
    /// `non_interactive` answers every question with its default;
    /// `environment` answers the environment question up front.
    pub fn new(non_interactive: bool, environment: Option<ClusterEnvironment>) -> Self {
        Self {
            non_interactive,
            environment,
            stdin: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }

    /// Print `prompt` and read one line; `None` on end of input
    async fn ask(&self, prompt: &str) -> Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let mut input = String::new();
        let read = self
            .stdin
            .lock()
            .await
            .read_line(&mut input)
            .await
            .context("Failed to read from terminal")?;

        if read == 0 {
            return Ok(None);
        }
        Ok(Some(input.trim().to_string()))
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }

        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            match self.ask(&format!("{} {} ", question, hint)).await? {
                None => return Ok(default),
                Some(reply) => {
                    if let Some(answer) = parse_yes_no(&reply, default) {
                        return Ok(answer);
                    }
                }
            }
        }
    }

    async fn select_environment(&self) -> Result<ClusterEnvironment> {
        if let Some(environment) = self.environment {
            return Ok(environment);
        }
        if self.non_interactive {
            anyhow::bail!("No cluster environment given; pass --environment");
        }

        let mut menu = String::from("Select the cluster environment:\n");
        for (i, env) in ClusterEnvironment::ALL.iter().enumerate() {
            menu.push_str(&format!("  {}) {}\n", i + 1, env));
        }
        menu.push_str("Choice: ");

        loop {
            match self.ask(&menu).await? {
                None => anyhow::bail!("No cluster environment selected"),
                Some(reply) => {
                    if let Some(environment) = parse_environment(&reply) {
                        return Ok(environment);
                    }
                }
            }
        }
    }
}

/// Interpret a yes/no reply; `None` when it is neither
pub fn parse_yes_no(reply: &str, default: bool) -> Option<bool> {
    match reply.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Interpret a menu reply: a 1-based number or an environment name
pub fn parse_environment(reply: &str) -> Option<ClusterEnvironment> {
    let reply = reply.trim().to_ascii_lowercase();
    if let Ok(n) = reply.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| ClusterEnvironment::ALL.get(i))
            .copied();
    }
    ClusterEnvironment::ALL
        .iter()
        .find(|env| env.as_str() == reply)
        .copied()
}
