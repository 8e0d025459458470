use crossbeam_channel::Sender;
use std::ffi::{OsStr, OsString};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

use super::coordinator::{ExecutionStrategy, WorkerJob};
use super::worker::WorkerRequest;
use crate::config::StrategyKind;
use crate::errors::{ScanError, ScanResult};
use crate::results::PartialResult;

/// Subcommand that puts the `keyscan` binary into worker mode
pub const WORKER_SUBCOMMAND: &str = "worker";

/// Runs each worker as a child process with its own address space.
///
/// The child is handed a [`WorkerRequest`] on stdin and must answer with one
/// [`PartialResult`] on stdout, which is what [`serve`](super::worker::serve) does. A
/// relay thread per child parses the answer and forwards it into the coordinator's
/// output channel, so draining works the same as for threads. Child stderr is inherited.
#[derive(Debug, Clone)]
pub struct ProcessStrategy {
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
}

/// A running child worker and the thread relaying its output
#[derive(Debug)]
pub struct ProcessHandle {
    worker_id: usize,
    child: Child,
    relay: JoinHandle<ScanResult<()>>,
}

impl ProcessStrategy {
    /// Spawns `program` for every worker
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Spawns the running executable with the worker subcommand
    pub fn current_exe() -> ScanResult<Self> {
        let exe = std::env::current_exe()?;
        Ok(Self::new(exe).arg(WORKER_SUBCOMMAND))
    }

    /// Appends an argument passed to every child
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Sets an environment variable for every child
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    fn spawn_relay(
        worker_id: usize,
        child: &mut Child,
        output: Sender<PartialResult>,
    ) -> ScanResult<JoinHandle<ScanResult<()>>> {
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ScanError::worker_failed(worker_id, "stdout was not captured"))?;

        thread::Builder::new()
            .name(format!("keyscan-relay-{}", worker_id))
            .spawn(move || -> ScanResult<()> {
                let partial: PartialResult = serde_json::from_reader(BufReader::new(stdout))?;
                if partial.worker_id != worker_id {
                    return Err(ScanError::worker_failed(
                        worker_id,
                        format!("answered as worker {}", partial.worker_id),
                    ));
                }
                output
                    .send(partial)
                    .map_err(|_| ScanError::worker_failed(worker_id, "output channel closed"))
            })
            .map_err(|e| ScanError::worker_spawn(worker_id, e))
    }
}

fn abandon(worker_id: usize, child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!("Worker {}: failed to kill child: {}", worker_id, e);
    }
    let _ = child.wait();
}

impl ExecutionStrategy for ProcessStrategy {
    type Handle = ProcessHandle;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Processes
    }

    fn launch(&self, job: WorkerJob, output: Sender<PartialResult>) -> ScanResult<ProcessHandle> {
        let worker_id = job.worker_id;
        let request = WorkerRequest {
            worker_id,
            paths: job.paths().to_vec(),
            keywords: (*job.keywords).clone(),
            encoding_mode: job.encoding_mode,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| ScanError::worker_spawn(worker_id, e))?;
        debug!("Worker {} running as pid {}", worker_id, child.id());

        // Start reading before writing so a chatty child can never fill the pipe first
        let relay = match Self::spawn_relay(worker_id, &mut child, output) {
            Ok(relay) => relay,
            Err(e) => {
                abandon(worker_id, &mut child);
                return Err(e);
            }
        };

        match child.stdin.take() {
            Some(stdin) => {
                let mut writer = BufWriter::new(stdin);
                let sent = serde_json::to_writer(&mut writer, &request)
                    .map_err(ScanError::from)
                    .and_then(|_| writer.flush().map_err(ScanError::from));
                // A child that died early is reported by join
                if let Err(e) = sent {
                    warn!("Worker {}: could not send request: {}", worker_id, e);
                }
            }
            None => warn!("Worker {}: stdin was not captured", worker_id),
        }

        Ok(ProcessHandle {
            worker_id,
            child,
            relay,
        })
    }

    fn join(&self, handle: ProcessHandle) -> ScanResult<()> {
        let ProcessHandle {
            worker_id,
            mut child,
            relay,
        } = handle;

        let status = child.wait();
        let relayed = relay.join();

        let status = status
            .map_err(|e| ScanError::worker_failed(worker_id, format!("wait failed: {}", e)))?;
        if !status.success() {
            return Err(ScanError::worker_failed(
                worker_id,
                format!("process exited with {}", status),
            ));
        }

        match relayed {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ScanError::worker_failed(
                worker_id,
                format!("unreadable result: {}", e),
            )),
            Err(_) => Err(ScanError::worker_failed(worker_id, "relay thread panicked")),
        }
    }
}
