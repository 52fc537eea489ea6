//! Media integrity checks through a decoder run in strict mode.
//!
//! A file is decoded to the null muxer with `-xerror`, so the first decoding
//! error makes the decoder exit non-zero. The diagnostic text it prints to
//! stderr becomes the corruption reason.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use log::debug;

use super::{ToolExit, describe_command};
use crate::error::{CoreResult, command_start_error};

/// Result of checking one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Corrupted { reason: String },
}

impl Verdict {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

/// Something that can decide whether a media file decodes cleanly.
pub trait MediaValidator {
    /// Checks a single file.
    ///
    /// `Err` means the validator itself could not be run, which makes any
    /// further checks pointless.
    fn check(&self, path: &Path) -> CoreResult<Verdict>;
}

impl<T: MediaValidator + ?Sized> MediaValidator for &T {
    fn check(&self, path: &Path) -> CoreResult<Verdict> {
        (**self).check(path)
    }
}

/// Runs `<program> -v error -i <path> -f null - -xerror`.
#[derive(Debug, Clone)]
pub struct FfmpegValidator {
    program: String,
}

impl FfmpegValidator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for checking `path`.
    pub fn arguments(path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-v", "error", "-i"].iter().map(OsString::from).collect();
        args.push(path.as_os_str().to_os_string());
        args.extend(["-f", "null", "-", "-xerror"].iter().map(OsString::from));
        args
    }
}

impl Default for FfmpegValidator {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_VALIDATOR_PROGRAM)
    }
}

impl MediaValidator for FfmpegValidator {
    fn check(&self, path: &Path) -> CoreResult<Verdict> {
        let mut cmd = Command::new(&self.program);
        cmd.args(Self::arguments(path)).stdin(Stdio::null());

        debug!("Validating with: {}", describe_command(&cmd));

        let output = cmd
            .output()
            .map_err(|e| command_start_error(&self.program, e))?;

        if output.status.success() {
            return Ok(Verdict::Valid);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = match stderr.trim() {
            "" => format!("{} rejected the file with {}", self.program, ToolExit::from(output.status)),
            text => text.to_string(),
        };
        Ok(Verdict::Corrupted { reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn test_arguments_use_strict_null_decode() {
        let args = FfmpegValidator::arguments(Path::new("AM-DL downloads/x.flac"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["-v", "error", "-i", "AM-DL downloads/x.flac", "-f", "null", "-", "-xerror"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_decides_the_verdict() {
        let path = Path::new("whatever.flac");

        assert_eq!(FfmpegValidator::new("true").check(path).unwrap(), Verdict::Valid);

        match FfmpegValidator::new("false").check(path).unwrap() {
            Verdict::Corrupted { reason } => assert!(reason.contains("exit code 1"), "{reason}"),
            Verdict::Valid => panic!("`false` must reject the file"),
        }
    }

    #[test]
    fn test_missing_validator_is_an_error() {
        let err = FfmpegValidator::new("dlguard-test-no-such-ffmpeg")
            .check(Path::new("x.flac"))
            .unwrap_err();
        assert!(matches!(err, CoreError::DependencyNotFound(_)));
    }
}
