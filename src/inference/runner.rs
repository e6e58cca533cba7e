//! External inference process execution.
//!
//! Spawns the predict command, merges its stdout and stderr into one line
//! stream, and forwards every line to the log sink as it arrives. Runs
//! take minutes and operators need progress visibility, so output is never
//! buffered until completion. There is no timeout and no cancellation:
//! once started, the process runs to completion or failure.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use crate::inference::error::PipelineError;
use crate::inference::invocation::InferenceInvocation;
use crate::log_info;

/// A running predict process exposing its combined output as a finite,
/// non-restartable sequence of lines, plus a final exit status.
#[derive(Debug)]
pub struct PredictProcess {
    child: Child,
    lines: mpsc::Receiver<String>,
    pumps: Vec<JoinHandle<()>>,
}

impl PredictProcess {
    pub fn spawn(mut cmd: Command) -> Result<Self, PipelineError> {
        let program = cmd.get_program().to_string_lossy().into_owned();
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::ToolNotFound(program.clone())
            } else {
                PipelineError::Execution(e.to_string())
            }
        })?;

        let (tx, rx) = mpsc::channel();
        let mut pumps = Vec::new();

        if let Some(stdout) = child.stdout.take() {
            pumps.push(pump_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(pump_lines(stderr, tx.clone()));
        }
        drop(tx); // receiver ends once both pipes close

        Ok(Self { child, lines: rx, pumps })
    }

    /// Iterate the combined stdout/stderr lines. Blocks until the next line
    /// arrives or the process closes its pipes.
    pub fn output_lines(&self) -> mpsc::Iter<'_, String> {
        self.lines.iter()
    }

    /// Wait for the process to exit and return its exit code. A signal
    /// death has no code and is reported as -1.
    pub fn wait(mut self) -> Result<i32, PipelineError> {
        let status = self
            .child
            .wait()
            .map_err(|e| PipelineError::Execution(e.to_string()))?;
        for pump in self.pumps.drain(..) {
            let _ = pump.join();
        }
        Ok(status.code().unwrap_or(-1))
    }
}

fn pump_lines<R: std::io::Read + Send + 'static>(
    pipe: R,
    tx: mpsc::Sender<String>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let reader = BufReader::new(pipe);
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    })
}

/// Run one inference invocation to completion, streaming its output.
pub fn run(invocation: &InferenceInvocation) -> Result<(), PipelineError> {
    log_info!(
        "Executing: {} {} (cwd: {})",
        invocation.predict_bin,
        invocation.to_args().join(" "),
        invocation.working_dir.display()
    );

    let process = PredictProcess::spawn(invocation.command())?;
    for line in process.output_lines() {
        log_info!("[predict] {}", line);
        println!("{line}");
    }

    let exit_code = process.wait()?;
    if exit_code == 0 {
        log_info!("Predict command finished successfully.");
        Ok(())
    } else {
        Err(PipelineError::InferenceFailed { exit_code })
    }
}
