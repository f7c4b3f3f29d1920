//! Access token resolution.

use crate::config::Config;
use crate::{Error, Result};
use core::time::Duration;
use std::process::Stdio;
use tokio::process::Command;

/// Log target for authentication
const LOG_TARGET: &str = "auth";

/// Resolve the bearer token used for every API request.
///
/// `explicit` holds the value of `--token` / `GITHUB_TOKEN`. When it is absent
/// or blank, the configured token helper (by default `gh auth token`) is run.
pub async fn resolve_token(explicit: Option<&str>, config: &Config) -> Result<String> {
    if let Some(token) = explicit.map(str::trim).filter(|token| !token.is_empty()) {
        log::debug!(target: LOG_TARGET, "Using token from --token or GITHUB_TOKEN");
        return Ok(token.to_string());
    }

    token_from_helper(&config.token_helper, config.token_helper_timeout()).await
}

async fn token_from_helper(argv: &[String], timeout: Duration) -> Result<String> {
    let Some((program, args)) = argv.split_first() else {
        return Err(Error::Authentication(
            "no token found; set GITHUB_TOKEN or configure a token helper".to_string(),
        ));
    };

    log::debug!(target: LOG_TARGET, "Asking '{}' for a token", argv.join(" "));

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            Error::Authentication(format!(
                "no token found; set GITHUB_TOKEN or install '{program}' and log in ({e})"
            ))
        })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(Error::Authentication(format!("running '{}': {e}", argv.join(" ")))),
        Err(_) => {
            return Err(Error::Authentication(format!(
                "'{}' timed out after {} seconds",
                argv.join(" "),
                timeout.as_secs()
            )));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Authentication(format!(
            "'{}' failed: {}; set GITHUB_TOKEN or log in with the helper",
            argv.join(" "),
            stderr.trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Error::Authentication(format!("'{}' did not print a token", argv.join(" "))));
    }

    Ok(token)
}
