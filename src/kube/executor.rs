use serde::Serialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::guard::{CommandGuard, KubectlInvocation};
use crate::config::KubectlConfig;
use crate::error::{GuardRejection, KubeError};

/// Captured result of one finished `kubectl` process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Spawns the kubectl binary directly (never through a shell).
#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: PathBuf,
    kubeconfig: Option<PathBuf>,
}

impl Kubectl {
    pub fn from_config(cfg: &KubectlConfig) -> Self {
        Self {
            binary: cfg.binary.clone(),
            kubeconfig: cfg.kubeconfig.as_ref().and(cfg.resolved_kubeconfig()),
        }
    }

    pub async fn output<I, S>(&self, args: I, timeout: Duration) -> Result<CommandOutput, KubeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(kubeconfig) = &self.kubeconfig {
            cmd.env("KUBECONFIG", kubeconfig);
        }

        let child = cmd.spawn().map_err(|source| KubeError::Spawn {
            binary: self.binary.display().to_string(),
            source,
        })?;

        // On timeout the future is dropped, which kills the child.
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| KubeError::Timeout(timeout))?
            .map_err(|source| KubeError::Spawn {
                binary: self.binary.display().to_string(),
                source,
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    /// Trimmed stdout of a successful run; a non-zero exit becomes `CommandFailed`.
    pub async fn stdout<I, S>(&self, args: I, timeout: Duration) -> Result<String, KubeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let out = self.output(args, timeout).await?;
        if out.success() {
            Ok(out.stdout.trim().to_string())
        } else {
            Err(KubeError::CommandFailed {
                code: out.exit_code,
                stderr: out.stderr,
            })
        }
    }
}

/// What running a generated command line produced, rendered for the chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineReport {
    pub message: String,
    pub blocked: bool,
    pub success: bool,
}

impl LineReport {
    fn blocked(reason: &GuardRejection) -> Self {
        Self {
            message: format!("❌ This command is not allowed for security reasons: {reason}"),
            blocked: true,
            success: false,
        }
    }

    fn failed(stderr: &str, exit_code: i32) -> Self {
        Self {
            message: format!(
                "❌ Command execution failed:\nError: {}\nExit code: {exit_code}",
                stderr.trim_end()
            ),
            blocked: false,
            success: false,
        }
    }

    fn unexpected(err: &KubeError) -> Self {
        Self {
            message: format!(
                "❌ Unexpected error:\nError: {err}\nPlease check your configuration and try again"
            ),
            blocked: false,
            success: false,
        }
    }

    fn succeeded(stdout: &str) -> Self {
        let message = if stdout.trim().is_empty() {
            "✅ Command executed successfully, but returned no results. This might mean no resources were found.".to_string()
        } else {
            format!("✅ Command executed successfully:\n{stdout}")
        };
        Self {
            message,
            blocked: false,
            success: true,
        }
    }
}

/// Guarded execution of LLM-generated command lines.
#[derive(Debug, Clone)]
pub struct KubectlExecutor {
    kubectl: Kubectl,
    guard: CommandGuard,
    timeout: Duration,
    max_output_chars: usize,
}

impl KubectlExecutor {
    pub fn new(cfg: &KubectlConfig) -> Self {
        Self {
            kubectl: Kubectl::from_config(cfg),
            guard: CommandGuard,
            timeout: cfg.command_timeout(),
            max_output_chars: cfg.max_output_chars,
        }
    }

    pub fn kubectl(&self) -> &Kubectl {
        &self.kubectl
    }

    pub async fn run(&self, invocation: &KubectlInvocation) -> Result<CommandOutput, KubeError> {
        let started = Instant::now();
        let mut out = self.kubectl.output(invocation.args(), self.timeout).await?;
        debug!(
            command = %invocation,
            exit_code = out.exit_code,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "kubectl finished"
        );
        out.stdout = truncate_output(&out.stdout, self.max_output_chars);
        out.stderr = truncate_output(&out.stderr, self.max_output_chars);
        Ok(out)
    }

    /// Guard then run every invocation in order, stopping at the first failure.
    pub async fn execute_line(&self, line: &str) -> LineReport {
        let invocations = match self.guard.check(line) {
            Ok(invocations) => invocations,
            Err(reason) => {
                warn!(command = line, %reason, "Blocked kubectl command");
                return LineReport::blocked(&reason);
            }
        };

        let mut combined = Vec::with_capacity(invocations.len());
        for invocation in &invocations {
            info!(command = %invocation, "Executing kubectl command");
            match self.run(invocation).await {
                Ok(out) if out.success() => {
                    if !out.stdout.trim().is_empty() {
                        combined.push(out.stdout);
                    }
                }
                Ok(out) => {
                    warn!(command = %invocation, exit_code = out.exit_code, "kubectl command failed");
                    return LineReport::failed(&out.stderr, out.exit_code);
                }
                Err(e) => {
                    warn!(command = %invocation, error = %e, "kubectl command errored");
                    return LineReport::unexpected(&e);
                }
            }
        }

        LineReport::succeeded(&combined.join("\n"))
    }
}

/// Keep the head and tail of `output` when it exceeds `max_chars` characters.
pub fn truncate_output(output: &str, max_chars: usize) -> String {
    let total = output.chars().count();
    if total <= max_chars {
        return output.to_string();
    }
    let half = max_chars / 2;
    let start: String = output.chars().take(half).collect();
    let end: String = output.chars().skip(total - half).collect();
    format!(
        "{start}\n\n... [truncated, {} characters omitted] ...\n\n{end}",
        total - half * 2
    )
}
