// ============================================================================
// dlguard-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with the Downloader and the Media Decoder
//
// The pipeline never spawns processes directly. It talks to the `Downloader`
// and `MediaValidator` traits, whose default implementations run the
// configured programs with `std::process::Command`. Tests substitute their
// own implementations.
//
// KEY COMPONENTS:
// - Downloader / CommandDownloader: runs `<program> [args...] <url>`
// - MediaValidator / FfmpegValidator: strict decode of a single file
// - ToolExit: exit code of a finished child process
//
// AI-ASSISTANT-INFO: External tool seams for the downloader and ffmpeg

use std::fmt;
use std::process::{Command, ExitStatus};

use serde::Serialize;

/// Runs the downloader and streams its output lines.
pub mod downloader;

/// Checks media files with a decoder in strict mode.
pub mod validator;

pub use downloader::{CommandDownloader, Downloader};
pub use validator::{FfmpegValidator, MediaValidator, Verdict};

/// Exit code of a child process. `None` means it was terminated by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolExit {
    pub code: Option<i32>,
}

impl ToolExit {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ToolExit {
    fn from(status: ExitStatus) -> Self {
        Self { code: status.code() }
    }
}

impl fmt::Display for ToolExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => write!(f, "termination by signal"),
        }
    }
}

/// Renders a command as a single line for logs and events.
pub(crate) fn describe_command(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|part| {
            let part = part.to_string_lossy();
            if part.is_empty() || part.contains(char::is_whitespace) {
                format!("\"{part}\"")
            } else {
                part.into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
