//! Stitch engine backed by an external stitcher executable.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

use super::controller::EventSink;
use super::engine::StitchEngine;
use crate::error::{StitchError, StitchResult};
use crate::jobs::StitchJobConfig;

/// Number of stderr lines kept for the failure message.
const STDERR_TAIL_LINES: usize = 20;

/// Runs `program [extra_args] <job args>` and follows its output.
///
/// Progress is read from `NN%` tokens on stdout, where each `\r` or `\n`
/// ends a status line. A non-zero exit is reported as an engine error with
/// the tail of stderr; a clean exit completes the job.
pub struct CommandEngine {
    program: String,
    extra_args: Vec<String>,
    progress: Arc<AtomicU32>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, extra_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            extra_args,
            progress: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Full argument list passed to the program for `config`.
    pub fn command_line(&self, config: &StitchJobConfig) -> Vec<String> {
        let mut args = self.extra_args.clone();
        args.extend(config.to_engine_args());
        args
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl StitchEngine for CommandEngine {
    fn name(&self) -> &str {
        &self.program
    }

    fn start(&mut self, config: &StitchJobConfig, events: EventSink) -> StitchResult<()> {
        let args = self.command_line(config);
        tracing::debug!("$ {} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| StitchError::engine_start(&self.program, e.to_string()))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (Some(stdout), Some(stderr)) = (stdout, stderr) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(StitchError::engine_start(&self.program, "failed to capture output"));
        };

        self.progress.store(0, Ordering::SeqCst);
        let progress = Arc::clone(&self.progress);
        let program = self.program.clone();

        thread::Builder::new()
            .name("stitch-engine".to_string())
            .spawn(move || follow_process(&program, child, stdout, stderr, &progress, &events))
            .map_err(|e| StitchError::engine_start(&self.program, e.to_string()))?;

        Ok(())
    }

    fn progress(&self) -> u32 {
        self.progress.load(Ordering::SeqCst)
    }
}

fn follow_process(
    program: &str,
    mut child: Child,
    stdout: impl Read,
    stderr: impl Read + Send + 'static,
    progress: &AtomicU32,
    events: &EventSink,
) {
    let report = FinalReport::new(events);
    let stderr_reader = thread::spawn(move || stderr_tail(stderr));

    let mut reader = BufReader::new(stdout);
    let mut line = Vec::new();
    loop {
        line.clear();
        match read_status_line(&mut reader, &mut line) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                tracing::trace!("[{}] {}", program, text.trim_end());
                if let Some(percent) = parse_progress(&text) {
                    progress.store(percent, Ordering::SeqCst);
                    events.progress(percent, 0);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to read output of {}: {}", program, e);
                break;
            }
        }
    }

    let tail = stderr_reader.join().unwrap_or_default();

    match child.wait() {
        Ok(status) if status.success() => {
            tracing::debug!("{} exited cleanly", program);
            progress.store(100, Ordering::SeqCst);
            report.succeeded();
        }
        Ok(status) => {
            let code = status.code().unwrap_or(-1);
            let message = if tail.is_empty() {
                format!("{} exited with {}", program, status)
            } else {
                tail.join("\n")
            };
            report.failed(code, message);
        }
        Err(e) => report.failed(-1, format!("failed to wait for {}: {}", program, e)),
    }
}

/// Terminal report for one engine run.
///
/// Dropping it without calling `succeeded` or `failed`, including during a
/// panic on the output thread, fails the job so waiters are released.
struct FinalReport<'a> {
    events: &'a EventSink,
    sent: bool,
}

impl<'a> FinalReport<'a> {
    fn new(events: &'a EventSink) -> Self {
        Self { events, sent: false }
    }

    fn succeeded(mut self) {
        self.sent = true;
        self.events.progress(100, 0);
    }

    fn failed(mut self, code: i32, message: String) {
        self.sent = true;
        self.events.error(code, message);
    }
}

impl Drop for FinalReport<'_> {
    fn drop(&mut self) {
        if !self.sent {
            tracing::error!("Engine output thread stopped before the process finished");
            self.events.error(-1, "engine output thread stopped unexpectedly");
        }
    }
}

/// Read bytes up to and including the next `\r` or `\n`.
fn read_status_line(reader: &mut impl BufRead, line: &mut Vec<u8>) -> std::io::Result<usize> {
    let mut total = 0;
    loop {
        let (done, used) = {
            let available = reader.fill_buf()?;
            if available.is_empty() {
                return Ok(total);
            }
            match available.iter().position(|&b| b == b'\r' || b == b'\n') {
                Some(i) => {
                    line.extend_from_slice(&available[..=i]);
                    (true, i + 1)
                }
                None => {
                    line.extend_from_slice(available);
                    (false, available.len())
                }
            }
        };
        reader.consume(used);
        total += used;
        if done {
            return Ok(total);
        }
    }
}

fn stderr_tail(stderr: impl Read) -> Vec<String> {
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    for line in BufReader::new(stderr).lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail.into()
}

/// Extract the last `NN%` percentage from a status line.
///
/// Fractions are truncated and values above 100 are clamped.
pub fn parse_progress(line: &str) -> Option<u32> {
    let before = &line[..line.rfind('%')?];
    let number_start = before
        .char_indices()
        .rev()
        .find(|&(_, c)| !(c.is_ascii_digit() || c == '.'))
        .map_or(0, |(i, c)| i + c.len_utf8());
    let number = before[number_start..].trim_start_matches('.');
    let whole = number.split('.').next().unwrap_or_default();
    if whole.is_empty() {
        return None;
    }
    whole.parse::<u64>().ok().map(|v| v.min(100) as u32)
}
