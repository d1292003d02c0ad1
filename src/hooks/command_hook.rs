//! Command Hook
//!
//! Runs a registered shell command as a hook: the request JSON goes to the
//! child's stdin, the response is read from its stdout and exit status.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::core::{GuardError, GuardResult};

use super::registry::Hook;
use super::types::{HookRequest, HookResponse, EXIT_APPROVED, EXIT_BLOCKED, EXIT_NON_BLOCKING_ERROR};

/// External hook executed through `sh -c`
#[derive(Debug, Clone)]
pub struct CommandHook {
    command: String,
}

impl CommandHook {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn interpret(&self, code: Option<i32>, stdout: &str, stderr: &str) -> GuardResult<HookResponse> {
        let stdout = stdout.trim();
        let stderr = stderr.trim();

        match code {
            Some(EXIT_APPROVED) if stdout.is_empty() => Ok(HookResponse::approve()),
            Some(EXIT_APPROVED) => self.parse_response(stdout),
            Some(EXIT_BLOCKED) => {
                // A blocking hook may answer with a full envelope or just
                // a reason on stderr.
                if let Ok(mut response) = serde_json::from_str::<HookResponse>(stdout) {
                    response.approved = false;
                    if response.message.is_none() && !stderr.is_empty() {
                        response.message = Some(stderr.to_string());
                    }
                    return Ok(response);
                }
                let reason = if !stderr.is_empty() {
                    stderr
                } else if !stdout.is_empty() {
                    stdout
                } else {
                    "Blocked by hook"
                };
                Ok(HookResponse::block(reason))
            }
            Some(EXIT_NON_BLOCKING_ERROR) => {
                let reason = if stderr.is_empty() { stdout } else { stderr };
                Ok(HookResponse::warn(format!(
                    "Hook '{}' reported a non-blocking error: {}",
                    self.command, reason
                )))
            }
            Some(code) => Err(GuardError::hook_failed(
                &self.command,
                format!("exited with status {}: {}", code, stderr),
            )),
            None => Err(GuardError::hook_failed(&self.command, "terminated by signal")),
        }
    }

    fn parse_response(&self, stdout: &str) -> GuardResult<HookResponse> {
        serde_json::from_str(stdout).map_err(|e| GuardError::MalformedResponse {
            hook: self.command.clone(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Hook for CommandHook {
    fn name(&self) -> &str {
        &self.command
    }

    async fn invoke(&self, request: HookRequest) -> GuardResult<HookResponse> {
        let payload = serde_json::to_vec(&request)?;

        // kill_on_drop: the dispatcher aborts this future on timeout, which
        // must also terminate the child.
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GuardError::hook_failed(&self.command, format!("failed to spawn: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            let command = self.command.clone();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&payload).await {
                    tracing::debug!("[CommandHook] '{}' closed stdin early: {}", command, e);
                }
            });
        }

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        tracing::debug!(
            "[CommandHook] '{}' exited with {:?}",
            self.command,
            output.status.code()
        );
        self.interpret(output.status.code(), &stdout, &stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> HookRequest {
        HookRequest::new("Write").with_param("file_path", ".env")
    }

    #[tokio::test]
    async fn test_empty_output_approves() {
        let hook = CommandHook::new("cat > /dev/null");
        assert_eq!(hook.invoke(request()).await.unwrap(), HookResponse::approve());
    }

    #[tokio::test]
    async fn test_json_response_parsed() {
        let hook = CommandHook::new(r#"cat > /dev/null; echo '{"approved": true, "message": "ok"}'"#);
        let response = hook.invoke(request()).await.unwrap();
        assert!(response.approved);
        assert_eq!(response.message.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_request_reaches_stdin() {
        // Blocks only when the request names .env.
        let hook = CommandHook::new(
            r#"input=$(cat); case "$input" in *'"file_path":".env"'*) echo '{"approved": false, "message": "saw env"}'; exit 2;; esac"#,
        );
        let response = hook.invoke(request()).await.unwrap();
        assert!(!response.approved);
        assert_eq!(response.message.as_deref(), Some("saw env"));
    }

    #[tokio::test]
    async fn test_exit_two_with_stderr_blocks() {
        let hook = CommandHook::new("cat > /dev/null; echo 'protected file' >&2; exit 2");
        let response = hook.invoke(request()).await.unwrap();
        assert!(!response.approved);
        assert_eq!(response.message.as_deref(), Some("protected file"));
    }

    #[tokio::test]
    async fn test_exit_one_warns() {
        let hook = CommandHook::new("cat > /dev/null; echo 'config missing' >&2; exit 1");
        let response = hook.invoke(request()).await.unwrap();
        assert!(response.approved);
        assert!(response.message.unwrap().contains("config missing"));
    }

    #[tokio::test]
    async fn test_other_exit_is_failure() {
        let hook = CommandHook::new("cat > /dev/null; exit 3");
        let err = hook.invoke(request()).await.unwrap_err();
        assert!(matches!(err, GuardError::HookFailed { .. }));
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let hook = CommandHook::new("cat > /dev/null; echo 'not json'");
        let err = hook.invoke(request()).await.unwrap_err();
        assert!(matches!(err, GuardError::MalformedResponse { .. }));
    }
}
