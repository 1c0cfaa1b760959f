//! Wall-clock bounded extraction in a worker process.
//!
//! The parent spawns a worker, drains its stdout on a reader thread and
//! waits with a deadline. A worker that overruns is killed and reaped. The
//! worker answers with a single [`WorkerReport`] JSON line on stdout; its
//! stderr is inherited so worker logs reach the caller's terminal.

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

use super::error::{ErrorKind, ExtractError};
use super::pipeline::ExtractRequest;
use super::types::Theorem;

/// Hidden subcommand under which the binary acts as a worker.
pub const WORKER_SUBCOMMAND: &str = "worker";

/// Outcome reported by a worker process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WorkerReport<T> {
    /// The job succeeded.
    Ok {
        /// The job's result.
        value: T,
    },
    /// The job failed.
    Err {
        /// Classification of the failure.
        kind: ErrorKind,
        /// Failure message, without the kind tag.
        message: String,
    },
}

impl<T> WorkerReport<T> {
    /// Wraps a job result for transport.
    #[must_use]
    pub fn from_result(result: Result<T, ExtractError>) -> Self {
        match result {
            Ok(value) => Self::Ok { value },
            Err(error) => Self::Err {
                kind: error.kind(),
                message: error.message().to_owned(),
            },
        }
    }

    /// Recovers the job result.
    ///
    /// # Errors
    ///
    /// Returns the reported failure rebuilt as an [`ExtractError`].
    pub fn into_result(self) -> Result<T, ExtractError> {
        match self {
            Self::Ok { value } => Ok(value),
            Self::Err { kind, message } => Err(ExtractError::new(kind, message)),
        }
    }
}

/// Writes `result` to `out` as one newline-terminated report line.
///
/// # Errors
///
/// Returns any I/O or serialization failure from writing the report.
pub fn write_report<T: Serialize, W: Write>(
    mut out: W,
    result: Result<T, ExtractError>,
) -> io::Result<()> {
    let line = serde_json::to_string(&WorkerReport::from_result(result))?;
    writeln!(out, "{line}")?;
    out.flush()
}

/// Runs `command` as a worker and waits at most `budget` for its report.
///
/// Standard input is closed and standard output captured; the command's
/// other settings are left as configured by the caller.
///
/// # Errors
///
/// Returns [`ExtractError::Timeout`] when the budget elapses (the worker is
/// killed and reaped first), the worker's own reported error, or
/// [`ExtractError::Unknown`] when the worker cannot be started or exits
/// without a readable report.
pub fn run_bounded<T: DeserializeOwned>(
    command: &mut Command,
    budget: Duration,
) -> Result<T, ExtractError> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|error| ExtractError::unknown(format!("cannot start worker: {error}")))?;
    info!(pid = child.id(), ?budget, "spawned extraction worker");

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| ExtractError::unknown("worker stdout was not captured"))?;
    let reader = thread::spawn(move || {
        let mut bytes = Vec::new();
        stdout
            .read_to_end(&mut bytes)
            .map(|_| String::from_utf8_lossy(&bytes).into_owned())
    });

    let waited = child
        .wait_timeout(budget)
        .map_err(|error| ExtractError::unknown(format!("cannot wait for worker: {error}")))?;
    let Some(status) = waited else {
        warn!(pid = child.id(), ?budget, "worker overran its budget; killing it");
        if let Err(error) = child.kill() {
            warn!(%error, "failed to kill worker");
        }
        if let Err(error) = child.wait() {
            warn!(%error, "failed to reap worker");
        }
        // The reader ends once every holder of the pipe is gone; it is not
        // joined, since a grandchild may still hold the write end.
        drop(reader);
        return Err(ExtractError::timeout(format!(
            "extraction exceeded its budget of {budget:?}"
        )));
    };
    debug!(%status, "worker exited");

    let output = reader
        .join()
        .map_err(|_| ExtractError::unknown("worker output reader panicked"))?
        .map_err(|error| ExtractError::unknown(format!("cannot read worker output: {error}")))?;
    let Some(line) = output.lines().rev().find(|line| !line.trim().is_empty()) else {
        return Err(ExtractError::unknown(format!(
            "worker exited without returning ({status})"
        )));
    };
    serde_json::from_str::<WorkerReport<T>>(line)
        .map_err(|error| ExtractError::unknown(format!("unreadable worker report: {error}")))?
        .into_result()
}

/// Runs the extraction pipeline for `request` in a worker process.
///
/// `worker_program` must accept `worker --request <json>`, as this crate's
/// binary does.
///
/// # Errors
///
/// See [`run_bounded`].
pub fn extract_paper_bounded(
    request: &ExtractRequest,
    worker_program: &Path,
    budget: Duration,
) -> Result<Vec<Theorem>, ExtractError> {
    let encoded = serde_json::to_string(request)
        .map_err(|error| ExtractError::unknown(format!("cannot encode request: {error}")))?;
    run_bounded(
        Command::new(worker_program)
            .arg(WORKER_SUBCOMMAND)
            .arg("--request")
            .arg(encoded),
        budget,
    )
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn reports_round_trip_through_json_lines() {
        let mut out = Vec::new();
        write_report(&mut out, Err::<u32, _>(ExtractError::validation("Lemma 1 body is empty")))
            .expect("write");
        let text = String::from_utf8(out).expect("utf-8");
        assert_eq!(
            text,
            "{\"status\":\"err\",\"kind\":\"VALIDATION\",\"message\":\"Lemma 1 body is empty\"}\n"
        );
        let report: WorkerReport<u32> = serde_json::from_str(text.trim_end()).expect("parse");
        assert_eq!(
            report.into_result(),
            Err(ExtractError::validation("Lemma 1 body is empty"))
        );
    }

    #[test]
    fn ok_reports_carry_the_value() {
        let mut out = Vec::new();
        write_report(&mut out, Ok::<_, ExtractError>(vec![1, 2])).expect("write");
        assert_eq!(
            String::from_utf8(out).expect("utf-8"),
            "{\"status\":\"ok\",\"value\":[1,2]}\n"
        );
    }

    #[cfg(unix)]
    mod process {
        use super::*;

        fn shell(script: &str) -> Command {
            let mut command = Command::new("sh");
            command.arg("-c").arg(script);
            command
        }

        #[test]
        fn given_stalled_worker_when_budget_elapses_then_timeout() {
            let started = Instant::now();
            let error = run_bounded::<u32>(&mut shell("exec sleep 30"), Duration::from_millis(300))
                .expect_err("stalled worker");
            assert_eq!(error.kind(), ErrorKind::Timeout);
            assert!(started.elapsed() < Duration::from_secs(10));
        }

        #[test]
        fn given_silent_worker_when_it_exits_then_unknown() {
            let error = run_bounded::<u32>(&mut shell("exit 3"), Duration::from_secs(10))
                .expect_err("silent worker");
            assert_eq!(error.kind(), ErrorKind::Unknown);
            assert!(error.message().contains("exited without returning"));
        }

        #[test]
        fn given_reporting_worker_then_value_is_returned() {
            let script = r#"echo 'log noise'; echo '{"status":"ok","value":42}'"#;
            let value = run_bounded::<u32>(&mut shell(script), Duration::from_secs(10))
                .expect("worker value");
            assert_eq!(value, 42);
        }

        #[test]
        fn given_failing_worker_then_its_error_is_propagated() {
            let script = r#"echo '{"status":"err","kind":"DOWNLOAD","message":"gone"}'; exit 1"#;
            let error = run_bounded::<u32>(&mut shell(script), Duration::from_secs(10))
                .expect_err("worker error");
            assert_eq!(error, ExtractError::download("gone"));
        }

        #[test]
        fn given_garbled_report_then_unknown() {
            let error = run_bounded::<u32>(&mut shell("echo '{not json'"), Duration::from_secs(10))
                .expect_err("garbled");
            assert_eq!(error.kind(), ErrorKind::Unknown);
        }

        #[test]
        fn missing_programs_are_unknown_errors() {
            let error = run_bounded::<u32>(
                &mut Command::new("/nonexistent/theoremx-worker"),
                Duration::from_secs(1),
            )
            .expect_err("spawn failure");
            assert_eq!(error.kind(), ErrorKind::Unknown);
        }
    }
}
