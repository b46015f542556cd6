//! Host shell seam for presto.
//!
//! Launching targets and extracting native icon resources are host
//! capabilities behind the [HostShell] trait, one entry point each. The
//! query engine builds a [LaunchRequest] and never touches processes
//! itself, which also makes the router fully testable with a stub shell.
//!
//! [SystemShell] is the std-process default: `cmd start`/`explorer` on
//! Windows, a discovered opener (`xdg-open` or `open`) elsewhere. It leaves
//! native icon extraction to the embedder.

use crate::core::icon::IconBitmap;

use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("empty launch target")]
    EmptyTarget,
    #[error("no opener available on this host")]
    NoOpener,
    #[error("spawn failed: {0}")]
    Spawn(#[from] std::io::Error),
}

/// What the router asks the host to do on Enter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchRequest {
    /// Shell-open a URL in the default browser.
    OpenUrl(String),
    /// Open a file through the default handler for its type.
    OpenPath(String),
    /// Open a directory in the host file manager.
    OpenDirectory(PathBuf),
    /// Run an executable or shortcut target, with optional arguments.
    Run {
        target: String,
        args: Option<String>,
    },
}

impl LaunchRequest {
    fn target_text(&self) -> &str {
        match self {
            LaunchRequest::OpenUrl(t) | LaunchRequest::OpenPath(t) => t,
            LaunchRequest::OpenDirectory(p) => p.to_str().unwrap_or_default(),
            LaunchRequest::Run { target, .. } => target,
        }
    }
}

/// The two capabilities presto needs from its host.
pub trait HostShell: Send + Sync {
    /// Performs one launch. Success means the presenter may close.
    fn launch(&self, request: &LaunchRequest) -> Result<(), LaunchError>;

    /// Extracts an icon resource from a binary. The default host has no
    /// native extractor; embedders with one override this.
    fn extract_icon(&self, _path: &str, _index: i32) -> Option<IconBitmap> {
        None
    }
}

/// Default host shell backed by std::process.
#[derive(Debug, Default)]
pub struct SystemShell;

impl HostShell for SystemShell {
    fn launch(&self, request: &LaunchRequest) -> Result<(), LaunchError> {
        if request.target_text().is_empty() {
            return Err(LaunchError::EmptyTarget);
        }
        tracing::debug!("launching {:?}", request);
        spawn_detached(request)
    }
}

#[cfg(windows)]
fn spawn_detached(request: &LaunchRequest) -> Result<(), LaunchError> {
    let mut cmd = match request {
        LaunchRequest::OpenDirectory(path) => {
            let mut c = Command::new("explorer");
            c.arg(path);
            c
        }
        LaunchRequest::Run {
            target,
            args: Some(args),
        } => {
            // start resolves .lnk and App Paths targets the way the shell does.
            let mut c = Command::new("cmd");
            c.args(["/C", "start", "", target, args]);
            c
        }
        other => {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", "", other.target_text()]);
            c
        }
    };
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

#[cfg(not(windows))]
fn spawn_detached(request: &LaunchRequest) -> Result<(), LaunchError> {
    let opener = ["xdg-open", "open"]
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or(LaunchError::NoOpener)?;

    let mut cmd = Command::new(opener);
    match request {
        LaunchRequest::Run {
            target,
            args: Some(args),
        } => {
            cmd.arg(format!("{target} {args}"));
        }
        other => {
            cmd.arg(other.target_text());
        }
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error;

    #[test]
    fn empty_target_is_rejected_before_spawning() -> Result<(), Box<dyn error::Error>> {
        let shell = SystemShell;
        let result = shell.launch(&LaunchRequest::OpenPath(String::new()));
        assert!(matches!(result, Err(LaunchError::EmptyTarget)));
        Ok(())
    }

    #[test]
    fn default_shell_has_no_native_extractor() -> Result<(), Box<dyn error::Error>> {
        let shell = SystemShell;
        assert!(shell.extract_icon("C:\\Windows\\System32\\shell32.dll", 2).is_none());
        Ok(())
    }
}
