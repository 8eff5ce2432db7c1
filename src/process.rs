//! Bounded external-process execution
//!
//! Runs a single command to completion with piped stdout/stderr, a wall-clock
//! deadline, and incremental non-blocking draining of both pipes. Draining
//! while polling is what keeps a chatty child from deadlocking: a child that
//! fills one pipe buffer while the parent blocks on the other stream (or on
//! process exit) hangs forever. The timeout check is interleaved with the
//! draining for the same reason.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::error::{Error, Result};

/// Poll interval between non-blocking read attempts
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Read chunk size per drain attempt
const READ_CHUNK: usize = 8192;

/// Outcome of a completed process run
///
/// A nonzero exit code is data, not an error: `run` returns a result for
/// every process that exits on its own, and callers decide what failure
/// means. Only `run_or_fail` promotes a nonzero exit to an error.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    exit_code: i32,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl ProcessResult {
    pub(crate) fn new(exit_code: i32, stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
        }
    }

    /// Exit code reported by the OS (or -1 if killed by a signal)
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn successful(&self) -> bool {
        self.exit_code == 0
    }

    pub fn failed(&self) -> bool {
        !self.successful()
    }

    /// Raw captured stdout bytes
    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    /// Raw captured stderr bytes
    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    /// Captured stdout as text (lossy for non-UTF-8 output)
    pub fn output(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Captured stderr as text (lossy for non-UTF-8 output)
    pub fn error_output(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

/// A single-shot external command with a wall-clock deadline
///
/// Built once, consumed by [`Process::run`]. No pooling, no restarts, no
/// internal retries; a `Process` value maps to at most one OS process.
///
/// # Examples
///
/// ```no_run
/// use chromepdf::process::Process;
///
/// # fn main() -> chromepdf::Result<()> {
/// let result = Process::from_command(vec!["ls".into(), "-l".into()])
///     .timeout(5)
///     .run()?;
/// assert!(result.successful());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Process {
    command: Vec<String>,
    cwd: Option<PathBuf>,
    env: HashMap<String, String>,
    timeout_secs: u64,
}

impl Process {
    /// Create a process from an argv list (`command[0]` is the executable).
    pub fn from_command(command: Vec<String>) -> Self {
        Self {
            command,
            cwd: None,
            env: HashMap::new(),
            timeout_secs: 60,
        }
    }

    /// Set the working directory for the child.
    pub fn in_directory(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Replace the child's environment with the given mapping.
    pub fn with_environment(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Set the wall-clock deadline in seconds (default 60).
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    /// Run the process to completion or deadline.
    ///
    /// Returns a [`ProcessResult`] whenever the child exits on its own,
    /// regardless of exit code. Fails with [`Error::ProcessStart`] if the OS
    /// refuses to spawn and with [`Error::ProcessTimeout`] if the deadline
    /// elapses first, in which case the child is killed and reaped before
    /// the error is returned.
    pub fn run(self) -> Result<ProcessResult> {
        debug!("running command: {}", self.command.join(" "));

        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| Error::ProcessStart {
                command: String::new(),
                source: std::io::Error::new(ErrorKind::InvalidInput, "empty command"),
            })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        if !self.env.is_empty() {
            cmd.env_clear().envs(&self.env);
        }

        let mut child = cmd.spawn().map_err(|e| Error::ProcessStart {
            command: self.command.join(" "),
            source: e,
        })?;

        // Every failure past the spawn, timeout or I/O, must leave neither
        // a running child nor a zombie behind; dropping a Child does
        // neither kill nor reap.
        let result = drive_to_completion(&mut child, self.timeout_secs);
        if result.is_err() {
            debug!("killing process: {}", self.command.join(" "));
            kill_and_reap(&mut child);
        }
        result
    }

    /// Like [`Process::run`], but a nonzero exit code becomes
    /// [`Error::ProcessFailed`] carrying the full result.
    pub fn run_or_fail(self) -> Result<ProcessResult> {
        let result = self.run()?;

        if result.failed() {
            return Err(Error::ProcessFailed {
                code: result.exit_code(),
                result,
            });
        }

        Ok(result)
    }
}

/// Poll the child until it exits or the deadline passes, draining both
/// pipes along the way. Returns without killing; the caller owns cleanup
/// for every error this produces.
fn drive_to_completion(child: &mut Child, timeout_secs: u64) -> Result<ProcessResult> {
    // The Child always has both handles here because of the piped Stdio
    // configuration at spawn.
    let mut stdout = child.stdout.take().ok_or_else(missing_pipe)?;
    let mut stderr = child.stderr.take().ok_or_else(missing_pipe)?;
    set_nonblocking(&stdout)?;
    set_nonblocking(&stderr)?;

    let mut out_buf = Vec::new();
    let mut err_buf = Vec::new();
    let start = Instant::now();

    loop {
        match child.try_wait()? {
            Some(status) => {
                // Exited: pull whatever is still buffered in the pipes.
                drain(&mut stdout, &mut out_buf)?;
                drain(&mut stderr, &mut err_buf)?;

                let exit_code = status.code().unwrap_or(-1);
                trace!(
                    "process exited with code {} ({} stdout bytes, {} stderr bytes)",
                    exit_code,
                    out_buf.len(),
                    err_buf.len()
                );
                return Ok(ProcessResult::new(exit_code, out_buf, err_buf));
            }
            None => {
                if start.elapsed() >= Duration::from_secs(timeout_secs) {
                    return Err(Error::ProcessTimeout(timeout_secs));
                }

                // Opportunistic reads keep both pipe buffers from filling
                // while the child is still running.
                drain(&mut stdout, &mut out_buf)?;
                drain(&mut stderr, &mut err_buf)?;

                std::thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

fn missing_pipe() -> Error {
    Error::Io(std::io::Error::new(
        ErrorKind::BrokenPipe,
        "child spawned without piped output",
    ))
}

/// Read everything currently available from a non-blocking pipe.
///
/// Absence of data (`WouldBlock`) is not an error; after the child exits
/// this reads through to EOF. Generic over the pipe type so stdout and
/// stderr share the loop.
fn drain(pipe: &mut impl Read, buf: &mut Vec<u8>) -> Result<()> {
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match pipe.read(&mut chunk) {
            Ok(0) => return Ok(()),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
}

/// Forcefully terminate and reap a child; failures are ignored because the
/// child may have exited between the deadline check and the kill.
fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
fn set_nonblocking(pipe: &impl std::os::unix::io::AsRawFd) -> Result<()> {
    use nix::fcntl::{fcntl, FcntlArg, OFlag};

    let fd = pipe.as_raw_fd();
    let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(|e| Error::Io(e.into()))?;
    let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
    fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(|e| Error::Io(e.into()))?;
    Ok(())
}

// Non-unix builds fall back to blocking reads; the drain still runs after
// exit, so short-output commands work even without O_NONBLOCK.
#[cfg(not(unix))]
fn set_nonblocking<T>(_pipe: &T) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Process {
        Process::from_command(vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            script.to_string(),
        ])
    }

    #[test]
    fn test_captures_stdout() {
        let result = sh("printf hello").run().unwrap();
        assert!(result.successful());
        assert_eq!(result.stdout(), b"hello");
        assert!(result.stderr().is_empty());
    }

    #[test]
    fn test_stderr_only_command() {
        let result = sh("printf oops 1>&2").run().unwrap();
        assert!(result.successful());
        assert!(result.stdout().is_empty());
        assert_eq!(result.stderr(), b"oops");
    }

    #[test]
    fn test_exit_code_is_preserved() {
        for code in [0, 1, 7, 42, 255] {
            let result = sh(&format!("exit {}", code)).run().unwrap();
            assert_eq!(result.exit_code(), code);
            assert_eq!(result.successful(), code == 0);
        }
    }

    #[test]
    fn test_nonzero_exit_is_not_an_error_for_run() {
        let result = sh("exit 3").run().unwrap();
        assert!(result.failed());
    }

    #[test]
    fn test_run_or_fail_carries_result() {
        let err = sh("printf bad 1>&2; exit 5").run_or_fail().unwrap_err();
        match err {
            Error::ProcessFailed { code, result } => {
                assert_eq!(code, 5);
                assert_eq!(result.stderr(), b"bad");
            }
            other => panic!("expected ProcessFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_timeout_kills_the_process() {
        let start = Instant::now();
        let err = sh("sleep 30").timeout(1).run().unwrap_err();
        let elapsed = start.elapsed();

        match err {
            Error::ProcessTimeout(secs) => assert_eq!(secs, 1),
            other => panic!("expected ProcessTimeout, got {:?}", other),
        }
        // The call must return shortly after the deadline, not after the
        // child's natural runtime.
        assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);
    }

    #[test]
    fn test_timeout_leaves_no_running_process() {
        // Two commands keep the shell resident, so its cmdline (with the
        // marker) stays visible to pgrep until the kill.
        let marker = "chromepdf-reap-check";
        let err = sh(&format!("sleep 30; true # {}", marker))
            .timeout(1)
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::ProcessTimeout(1)));

        let pgrep = Command::new("pgrep").args(["-f", marker]).output().unwrap();
        assert!(
            pgrep.stdout.is_empty(),
            "child still running after timeout: {}",
            String::from_utf8_lossy(&pgrep.stdout)
        );
    }

    #[test]
    fn test_large_output_does_not_deadlock() {
        // 1 MiB on each stream, far past the default pipe buffer. In the
        // second command stdout must go to stderr before dd's own noise is
        // discarded; redirections apply left to right.
        let result = sh(
            "dd if=/dev/zero bs=1024 count=1024 2>/dev/null; \
             dd if=/dev/zero bs=1024 count=1024 1>&2 2>/dev/null",
        )
        .timeout(30)
        .run()
        .unwrap();

        assert!(result.successful());
        assert_eq!(result.stdout().len(), 1024 * 1024);
        assert_eq!(result.stderr().len(), 1024 * 1024);
    }

    #[test]
    fn test_spawn_failure() {
        let err = Process::from_command(vec!["/nonexistent/binary".to_string()])
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::ProcessStart { .. }));
    }

    #[test]
    fn test_empty_command() {
        let err = Process::from_command(Vec::new()).run().unwrap_err();
        assert!(matches!(err, Error::ProcessStart { .. }));
    }

    #[test]
    fn test_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = sh("pwd").in_directory(dir.path()).run().unwrap();
        let printed = result.output();
        // Compare canonicalized paths; the tempdir may sit behind a symlink.
        let canonical = dir.path().canonicalize().unwrap();
        assert_eq!(printed.trim(), canonical.to_str().unwrap());
    }

    #[test]
    fn test_environment_override() {
        let mut env = HashMap::new();
        env.insert("CHROMEPDF_TEST_VAR".to_string(), "yes".to_string());
        let result = sh("printf \"$CHROMEPDF_TEST_VAR\"")
            .with_environment(env)
            .run()
            .unwrap();
        assert_eq!(result.stdout(), b"yes");
    }
}
