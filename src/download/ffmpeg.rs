// SPDX-License-Identifier: MPL-2.0

//! ffmpeg integration for stream-copy remuxing

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

const PROTOCOL_WHITELIST: &str = "http,https,tls,tcp,file,crypto";

/// What ffmpeg reads from
#[derive(Debug, Clone, Copy)]
pub enum RemuxInput<'a> {
    /// Remote media (an HLS playlist) fetched with an `Authorization` header
    Url { url: &'a str, authorization: &'a str },
    File(&'a Path),
}

/// Copies the audio stream of an input into a new container, no re-encode
#[derive(Debug, Clone)]
pub struct Remuxer {
    program: PathBuf,
}

impl Remuxer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command line for a remux of `input` into `output`
    pub fn args(&self, input: RemuxInput<'_>, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-hide_banner".into(), "-y".into()];
        match input {
            RemuxInput::Url { url, authorization } => {
                args.push("-headers".into());
                args.push(format!("Authorization: {authorization}\r\n").into());
                args.push("-protocol_whitelist".into());
                args.push(PROTOCOL_WHITELIST.into());
                args.push("-i".into());
                args.push(url.into());
            }
            RemuxInput::File(path) => {
                args.push("-i".into());
                args.push(path.into());
            }
        }
        args.extend(["-acodec", "copy", "-loglevel", "error"].map(OsString::from));
        args.push(output.into());
        args
    }

    /// Run the remux. Does not clean up `output` on failure; callers own it.
    pub async fn remux(&self, input: RemuxInput<'_>, output: &Path) -> Result<()> {
        debug!("remuxing into {}", output.display());
        let output_status = Command::new(&self.program)
            .args(self.args(input, output))
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .map_err(Error::ToolSpawn)?;

        if !output_status.status.success() {
            let stderr = String::from_utf8_lossy(&output_status.stderr)
                .trim()
                .to_string();
            return Err(Error::Tool {
                status: output_status.status,
                stderr: if stderr.is_empty() {
                    "no stderr from process".into()
                } else {
                    stderr
                },
            });
        }

        Ok(())
    }

    /// Check if ffmpeg is available on the system
    pub async fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl Default for Remuxer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}
