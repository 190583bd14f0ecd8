// SPDX-License-Identifier: MPL-2.0

use std::process::ExitStatus;
use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("stream resolution failed: {0}")]
    StreamResolution(String),
    #[error("ffmpeg failed ({status}): {stderr}")]
    Tool { status: ExitStatus, stderr: String },
    #[error("failed to run ffmpeg: {0}")]
    ToolSpawn(std::io::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported media kind: {0}")]
    UnsupportedKind(String),
    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
