use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

pub const EXEC_TIMEOUT_SECS: u64 = 300;

/// Run a child process and render its outcome in the `[OK]` / `[FAILED]`
/// convention:
///
/// ```text
/// [FAILED] Exit code: 2
///
/// <stdout>
///
/// --- stderr ---
/// <stderr>
/// ```
pub async fn run_captured(
    mut cmd: Command,
    timeout_secs: u64,
    timeout_message: &str,
    cancel: &CancellationToken,
) -> String {
    cmd.kill_on_drop(true);

    let output = tokio::select! {
        _ = cancel.cancelled() => return "[FAILED] Cancelled".to_string(),
        res = tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output()) => res,
    };

    let output = match output {
        Err(_) => return timeout_message.to_string(),
        Ok(Err(e)) => return format!("[FAILED] {e}"),
        Ok(Ok(output)) => output,
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    let mut parts: Vec<String> = Vec::new();
    if output.status.success() {
        parts.push("[OK]".into());
    } else {
        let code = output.status.code().unwrap_or(-1);
        parts.push(format!("[FAILED] Exit code: {code}"));
    }
    parts.push(String::new());

    if !stdout.is_empty() {
        parts.push(stdout.trim_end().to_string());
    }
    if !stderr.is_empty() {
        if !stdout.is_empty() {
            parts.push(String::new());
        }
        parts.push("--- stderr ---".into());
        parts.push(stderr.trim_end().to_string());
    }
    if stdout.is_empty() && stderr.is_empty() {
        parts.push("(no output)".into());
    }

    parts.join("\n")
}
