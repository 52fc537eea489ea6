// ============================================================================
// dlguard-core/src/external/downloader.rs
// ============================================================================
//
// DOWNLOADER: Child Process Management for the External Download Tool
//
// The downloader is long-running and progress-emitting. Its stdout and stderr
// are each drained by a reader thread; complete lines are forwarded over a
// channel to the calling thread, which hands them to the caller's callback in
// arrival order. Only after both streams reach end-of-file is the child
// reaped. Success is decided solely by the exit code.
//
// AI-ASSISTANT-INFO: Downloader trait and std::process implementation

use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use log::debug;

use super::{ToolExit, describe_command};
use crate::config::ControllerConfig;
use crate::error::{
    CoreError, CoreResult, command_output_error, command_start_error, command_wait_error,
};

/// Something that can fetch a URL and report how it exited.
pub trait Downloader {
    /// Human-readable command line for the given URL, used in events.
    fn command_line(&self, url: &str) -> String;

    /// Runs the download to completion, passing each output line to `on_line`.
    ///
    /// Returns `Err` only when the tool could not be run or its output could
    /// not be read; a non-zero exit is reported through [`ToolExit`].
    fn download<F>(&self, url: &str, on_line: F) -> CoreResult<ToolExit>
    where
        F: FnMut(&str);
}

impl<T: Downloader + ?Sized> Downloader for &T {
    fn command_line(&self, url: &str) -> String {
        (**self).command_line(url)
    }

    fn download<F>(&self, url: &str, on_line: F) -> CoreResult<ToolExit>
    where
        F: FnMut(&str),
    {
        (**self).download(url, on_line)
    }
}

/// Runs `<program> [args...] <url>` inside `work_dir`.
#[derive(Debug, Clone)]
pub struct CommandDownloader {
    program: String,
    args: Vec<String>,
    work_dir: PathBuf,
}

impl CommandDownloader {
    pub fn new(program: impl Into<String>, args: Vec<String>, work_dir: PathBuf) -> Self {
        Self {
            program: program.into(),
            args,
            work_dir,
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(
            config.downloader_program.clone(),
            config.downloader_args.clone(),
            config.work_dir.clone(),
        )
    }

    fn build_command(&self, url: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(url).current_dir(&self.work_dir);
        cmd
    }
}

impl Downloader for CommandDownloader {
    fn command_line(&self, url: &str) -> String {
        describe_command(&self.build_command(url))
    }

    fn download<F>(&self, url: &str, mut on_line: F) -> CoreResult<ToolExit>
    where
        F: FnMut(&str),
    {
        // A missing cwd also surfaces as NotFound from spawn; keep it distinct
        // from a missing program.
        if !self.work_dir.is_dir() {
            return Err(CoreError::CommandStart(
                self.program.clone(),
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("working directory '{}' does not exist", self.work_dir.display()),
                ),
            ));
        }

        let mut cmd = self.build_command(url);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(
            "Executing downloader in {}: {}",
            self.work_dir.display(),
            describe_command(&cmd)
        );

        let mut child = cmd
            .spawn()
            .map_err(|e| command_start_error(&self.program, e))?;

        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, tx.clone()));
        }
        drop(tx);

        for line in rx {
            on_line(&line);
        }

        let read_result = readers.into_iter().try_for_each(|reader| {
            reader
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("output reader thread panicked")))
        });

        let status = child
            .wait()
            .map_err(|e| command_wait_error(&self.program, e))?;
        read_result.map_err(|e| command_output_error(&self.program, e))?;

        let exit = ToolExit::from(status);
        debug!("Downloader finished with {exit}");
        Ok(exit)
    }
}

fn spawn_line_reader<R>(source: R, tx: Sender<String>) -> JoinHandle<io::Result<()>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || forward_lines(source, &tx))
}

/// Splits a byte stream into lines and sends each one.
///
/// `\n`, `\r` and `\r\n` all end a line, so carriage-return progress redraws
/// arrive as separate lines. Invalid UTF-8 is replaced rather than rejected.
pub(crate) fn forward_lines<R: Read>(source: R, tx: &Sender<String>) -> io::Result<()> {
    let mut reader = BufReader::new(source);
    let mut pending = Vec::new();
    let mut after_cr = false;

    loop {
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            break;
        }

        for &byte in available {
            match byte {
                b'\n' if after_cr => {}
                b'\n' | b'\r' => {
                    if tx.send(String::from_utf8_lossy(&pending).into_owned()).is_err() {
                        return Ok(());
                    }
                    pending.clear();
                }
                _ => pending.push(byte),
            }
            after_cr = byte == b'\r';
        }

        let consumed = available.len();
        reader.consume(consumed);
    }

    if !pending.is_empty() {
        let _ = tx.send(String::from_utf8_lossy(&pending).into_owned());
    }
    Ok(())
}
