//! # procrun Process Runner (`common::process::runner`)
//!
//! File: cli/src/common/process/runner.rs
//!
//! ## Overview
//!
//! Runs a single external command to completion with `tokio::process`,
//! streaming its output into an optional [`OutputSink`] and returning the
//! captured standard output.
//!
//! ## Architecture
//!
//! Each invocation keeps two projections of the child's output:
//! - **stdout-only**: returned on success, free of stderr noise.
//! - **combined**: stdout and stderr chunks in arrival order, embedded in the
//!   error when the command fails and there is no sink to look at.
//!
//! Both pipes are drained from one task with `tokio::select!`, so chunks are
//! appended strictly one at a time. Bytes are decoded (lossy UTF-8) when the
//! process ends; the sink receives each chunk decoded on its own.
//!
//! Failure shapes:
//! - spawn failure: the `io::Error` from the OS, unchanged
//! - non-zero exit with a sink: the sink is shown, then a generic error pointing at it
//! - non-zero exit without a sink: a detailed error with the combined output
//!
use super::sink::OutputSink;
use crate::core::error::{display_command, ProcessError};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Size of a single pipe read.
const CHUNK_SIZE: usize = 8192;

/// Characters that make a command string more than a plain program name.
const SHELL_METACHARACTERS: &[char] = &[
    '|', '&', ';', '<', '>', '(', ')', '$', '`', '\\', '"', '\'', '*', '?', '[', ']', '#', '~',
    '=', '%', '{', '}', '!',
];

/// # Execution Request (`ExecRequest`)
///
/// Everything needed to run one command. Constructed with [`ExecRequest::new`]
/// and refined with the builder methods.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    /// Executable name or path. In shell mode, interpreted by the shell.
    pub command: String,
    /// Arguments, passed to the program one by one.
    pub args: Vec<String>,
    /// Working directory. `None` runs the command in the system temp directory.
    pub working_dir: Option<PathBuf>,
    /// Run through the platform shell (`sh -c` / `cmd /C`).
    pub shell: bool,
    /// Extra environment variables for the child.
    pub env: BTreeMap<String, String>,
    /// Kill the child and fail after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl ExecRequest {
    /// Creates a request with shell mode on, no timeout and the temp dir as working directory.
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            working_dir: None,
            shell: true,
            env: BTreeMap::new(),
            timeout: None,
        }
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The directory the command will run in.
    pub fn resolved_working_dir(&self) -> PathBuf {
        self.working_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Command and space-joined arguments, as shown to the user.
    pub fn display(&self) -> String {
        display_command(&self.command, &self.args)
    }
}

/// Runs `command` with `args` and returns its standard output.
///
/// With `working_dir` omitted the command runs in the system temporary
/// directory. Shell mode is on, there is no timeout.
///
/// # Errors
///
/// See [`execute_request`].
pub async fn execute(
    sink: Option<&mut dyn OutputSink>,
    working_dir: Option<&Path>,
    command: &str,
    args: &[String],
) -> Result<String, ProcessError> {
    let mut request = ExecRequest::new(command, args.iter().cloned());
    request.working_dir = working_dir.map(Path::to_path_buf);
    execute_request(&request, sink).await
}

/// Runs the command described by `request` and returns its standard output.
///
/// # Errors
///
/// * `ProcessError::Spawn` if the process could not be started (including a
///   program that is not on `PATH`).
/// * `ProcessError::ShownOnSink` on a non-zero exit when `sink` is present;
///   the sink's `show()` has been called by then.
/// * `ProcessError::NonZeroExit` on a non-zero exit without a sink.
/// * `ProcessError::Terminated` if the process was killed by a signal and no sink is present.
/// * `ProcessError::Timeout` if `request.timeout` elapsed; a present sink is shown first.
/// * `ProcessError::Output` if reading a pipe or the exit status failed.
pub async fn execute_request(
    request: &ExecRequest,
    mut sink: Option<&mut dyn OutputSink>,
) -> Result<String, ProcessError> {
    let shown = request.display();
    if let Some(sink) = sink.as_mut() {
        sink.append_line(&format!("Running command: \"{}\"...", shown));
    }

    let cwd = request.resolved_working_dir();
    if request.shell {
        ensure_program_exists(request, &cwd).await?;
    }
    let mut command = build_command(request, &cwd);
    debug!(
        "Spawning \"{}\" in {} (shell: {})",
        shown,
        cwd.display(),
        request.shell
    );
    let mut child = command.spawn()?;

    let mut capture = Capture::default();
    let status = match request.timeout {
        Some(limit) => {
            let outcome =
                tokio::time::timeout(limit, collect_output(&mut child, &mut capture, &mut sink))
                    .await;
            match outcome {
                Ok(status) => status?,
                Err(_) => {
                    warn!("Command \"{}\" exceeded {:?}, killing it", shown, limit);
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill timed out command \"{}\": {}", shown, e);
                    }
                    if let Some(sink) = sink.as_mut() {
                        sink.append_line(&format!(
                            "Command \"{}\" timed out after {:?}.",
                            shown, limit
                        ));
                        sink.show();
                    }
                    return Err(ProcessError::Timeout {
                        command: request.command.clone(),
                        limit,
                    });
                }
            }
        }
        None => collect_output(&mut child, &mut capture, &mut sink).await?,
    };

    match status.code() {
        Some(0) => {
            if let Some(sink) = sink.as_mut() {
                sink.append_line(&format!("Finished running command: \"{}\".", shown));
            }
            info!("Command \"{}\" finished successfully", shown);
            Ok(capture.stdout_text())
        }
        code => {
            warn!("Command \"{}\" failed with status {}", shown, status);
            if let Some(sink) = sink.as_mut() {
                sink.show();
                return Err(ProcessError::ShownOnSink {
                    command: request.command.clone(),
                });
            }
            match code {
                Some(code) => Err(ProcessError::NonZeroExit {
                    command: request.command.clone(),
                    args: request.args.clone(),
                    code,
                    output: capture.combined_text(),
                }),
                None => Err(ProcessError::Terminated {
                    command: request.command.clone(),
                    output: capture.combined_text(),
                }),
            }
        }
    }
}

/// Stdout-only and combined projections of the child's output.
#[derive(Default)]
struct Capture {
    stdout: Vec<u8>,
    combined: Vec<u8>,
}

impl Capture {
    fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    fn combined_text(&self) -> String {
        String::from_utf8_lossy(&self.combined).into_owned()
    }
}

/// Drains both pipes of `child` until EOF, then waits for it to exit.
async fn collect_output(
    child: &mut Child,
    capture: &mut Capture,
    sink: &mut Option<&mut dyn OutputSink>,
) -> Result<ExitStatus, ProcessError> {
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| pipe_not_captured("stdout"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| pipe_not_captured("stderr"))?;

    let mut stdout_buf = vec![0u8; CHUNK_SIZE];
    let mut stderr_buf = vec![0u8; CHUNK_SIZE];
    let mut stdout_open = true;
    let mut stderr_open = true;

    while stdout_open || stderr_open {
        tokio::select! {
            read = stdout.read(&mut stdout_buf), if stdout_open => {
                let n = read.map_err(|source| ProcessError::Output { stream: "stdout", source })?;
                if n == 0 {
                    stdout_open = false;
                    continue;
                }
                let chunk = &stdout_buf[..n];
                capture.stdout.extend_from_slice(chunk);
                capture.combined.extend_from_slice(chunk);
                if let Some(sink) = sink.as_mut() {
                    sink.append(&String::from_utf8_lossy(chunk));
                }
            }
            read = stderr.read(&mut stderr_buf), if stderr_open => {
                let n = read.map_err(|source| ProcessError::Output { stream: "stderr", source })?;
                if n == 0 {
                    stderr_open = false;
                    continue;
                }
                let chunk = &stderr_buf[..n];
                capture.combined.extend_from_slice(chunk);
                if let Some(sink) = sink.as_mut() {
                    sink.append(&String::from_utf8_lossy(chunk));
                }
            }
        }
    }

    debug!(
        "Pipes closed after {} stdout bytes, {} combined bytes",
        capture.stdout.len(),
        capture.combined.len()
    );
    child.wait().await.map_err(|source| ProcessError::Output {
        stream: "exit status",
        source,
    })
}

fn pipe_not_captured(stream: &'static str) -> ProcessError {
    ProcessError::Output {
        stream,
        source: io::Error::new(io::ErrorKind::BrokenPipe, "pipe was not captured"),
    }
}

/// Builds the `tokio` command for `request`, with both output pipes captured.
fn build_command(request: &ExecRequest, cwd: &Path) -> Command {
    let mut command = if request.shell {
        shell_command(&request.command, &request.args)
    } else {
        let mut command = Command::new(&request.command);
        command.args(&request.args);
        command
    };
    command
        .current_dir(cwd)
        .envs(&request.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    command
}

/// `sh -c '<command> "$@"' <command> <args...>`: the shell interprets the
/// command string while each argument is forwarded as one positional parameter.
#[cfg(not(windows))]
fn shell_command(program: &str, args: &[String]) -> Command {
    let mut command = Command::new("sh");
    command
        .arg("-c")
        .arg(format!("{} \"$@\"", program))
        .arg(program)
        .args(args);
    command
}

#[cfg(windows)]
fn shell_command(program: &str, args: &[String]) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(program).args(args);
    command
}

/// Fails with `NotFound` when the request's program is a plain program name
/// or path that does not resolve, so a missing executable is reported as a
/// spawn error instead of the shell's exit code 127. Command strings using
/// shell syntax are left to the shell.
///
/// Names are looked up on the child's `PATH` (a `PATH` in `request.env`
/// replaces the inherited one). A name missing from `PATH` is still accepted
/// when the shell itself resolves it (builtins such as `cd` or `ulimit`).
async fn ensure_program_exists(request: &ExecRequest, cwd: &Path) -> Result<(), ProcessError> {
    let program = request.command.as_str();
    if !is_plain_program(program) {
        return Ok(());
    }
    let has_separator = program.contains('/') || (cfg!(windows) && program.contains('\\'));
    if has_separator {
        if cwd.join(program).exists() {
            return Ok(());
        }
        return Err(not_found(program, "no such file"));
    }
    let search_path = child_path(request).or_else(|| std::env::var_os("PATH"));
    match which::which_in(program, search_path, cwd) {
        Ok(path) => {
            debug!("Resolved '{}' to {}", program, path.display());
            Ok(())
        }
        Err(_) if shell_resolves(request, cwd).await => {
            debug!("'{}' is not on PATH but the shell resolves it", program);
            Ok(())
        }
        Err(e) => Err(not_found(program, &e.to_string())),
    }
}

/// `PATH` override from the request's environment, if any.
fn child_path(request: &ExecRequest) -> Option<OsString> {
    request
        .env
        .iter()
        .find(|(key, _)| {
            if cfg!(windows) {
                key.eq_ignore_ascii_case("PATH")
            } else {
                key.as_str() == "PATH"
            }
        })
        .map(|(_, value)| OsString::from(value))
}

/// Asks `sh` whether it can run `request.command` (`command -v`), in the
/// child's directory and environment.
#[cfg(not(windows))]
async fn shell_resolves(request: &ExecRequest, cwd: &Path) -> bool {
    let status = Command::new("sh")
        .arg("-c")
        .arg("command -v \"$1\"")
        .arg("sh")
        .arg(&request.command)
        .current_dir(cwd)
        .envs(&request.env)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    matches!(status, Ok(status) if status.success())
}

/// `cmd` has no `command -v`; names missing from `PATH` are left to it.
#[cfg(windows)]
async fn shell_resolves(_request: &ExecRequest, _cwd: &Path) -> bool {
    true
}

fn not_found(program: &str, reason: &str) -> ProcessError {
    ProcessError::Spawn(io::Error::new(
        io::ErrorKind::NotFound,
        format!("Failed to spawn \"{}\": {}", program, reason),
    ))
}

fn is_plain_program(program: &str) -> bool {
    !program.is_empty()
        && !program.chars().any(char::is_whitespace)
        && !program.contains(SHELL_METACHARACTERS)
}

// --- Unit Tests ---
#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::common::process::sink::BufferedSink;
    use crate::core::error::LINE_ENDING;
    use tempfile::tempdir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_echo_without_sink_returns_stdout() {
        let out = execute(None, None, "echo", &args(&["hello"])).await.unwrap();
        assert_eq!(out, "hello\n");
    }

    #[tokio::test]
    async fn test_success_excludes_stderr() {
        let script = "printf one; printf noise >&2; printf two";
        let out = execute(None, None, "sh", &args(&["-c", script]))
            .await
            .unwrap();
        assert_eq!(out, "onetwo");
    }

    #[tokio::test]
    async fn test_non_zero_exit_without_sink_is_detailed() {
        let err = execute(None, None, "sh", &args(&["-c", "echo boom >&2; exit 2"]))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(2));
        let message = err.to_string();
        assert!(message.contains("exit code \"2\""), "{}", message);
        assert!(message.contains("boom"), "{}", message);
        assert!(message.contains("sh -c echo boom >&2; exit 2"), "{}", message);
        assert!(message.contains(LINE_ENDING));
    }

    #[tokio::test]
    async fn test_non_zero_exit_keeps_chunk_order() {
        // Sleeps force each write into its own chunk.
        let script = "printf out1; sleep 0.1; printf err1 >&2; sleep 0.1; printf out2; exit 3";
        let err = execute(None, None, "sh", &args(&["-c", script]))
            .await
            .unwrap_err();
        match err {
            ProcessError::NonZeroExit { code, output, .. } => {
                assert_eq!(code, 3);
                assert_eq!(output, "out1err1out2");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_zero_exit_with_sink_shows_sink() {
        let mut sink = BufferedSink::new();
        let err = execute(
            Some(&mut sink),
            None,
            "sh",
            &args(&["-c", "echo partial; exit 1"]),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to run \"sh\" command. Check output window for more details."
        );
        assert!(matches!(err, ProcessError::ShownOnSink { .. }));
        assert!(sink.was_shown());
        assert!(sink.contents().contains("partial\n"));
        assert!(!sink.contents().contains("Finished running command"));
    }

    #[tokio::test]
    async fn test_sink_receives_banner_output_and_footer() {
        let mut sink = BufferedSink::new();
        let out = execute(Some(&mut sink), None, "echo", &args(&["hi", "there"]))
            .await
            .unwrap();
        assert_eq!(out, "hi there\n");
        assert_eq!(
            sink.contents(),
            "Running command: \"echo hi there\"...\nhi there\nFinished running command: \"echo hi there\".\n"
        );
        assert!(!sink.was_shown());
    }

    #[tokio::test]
    async fn test_stderr_reaches_sink_but_not_result() {
        let mut sink = BufferedSink::new();
        let out = execute(
            Some(&mut sink),
            None,
            "sh",
            &args(&["-c", "echo warn >&2; echo data"]),
        )
        .await
        .unwrap();
        assert_eq!(out, "data\n");
        assert!(sink.contents().contains("warn\n"));
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_error() {
        let mut sink = BufferedSink::new();
        let err = execute(Some(&mut sink), None, "nonexistentcommand12345", &[])
            .await
            .unwrap_err();
        match &err {
            ProcessError::Spawn(io_err) => assert_eq!(io_err.kind(), io::ErrorKind::NotFound),
            other => panic!("expected spawn error, got {:?}", other),
        }
        assert!(!err.to_string().contains("exit code"));
        assert!(!sink.was_shown());
    }

    #[tokio::test]
    async fn test_missing_executable_without_shell_is_spawn_error() {
        let request = ExecRequest::new("nonexistentcommand12345", ["x"]).shell(false);
        let err = execute_request(&request, None).await.unwrap_err();
        assert!(matches!(err, ProcessError::Spawn(_)));
    }

    #[tokio::test]
    async fn test_default_working_dir_is_temp_dir() {
        let out = execute(None, None, "pwd", &[]).await.unwrap();
        let reported = std::fs::canonicalize(out.trim()).unwrap();
        let expected = std::fs::canonicalize(std::env::temp_dir()).unwrap();
        assert_eq!(reported, expected);
    }

    #[tokio::test]
    async fn test_explicit_working_dir() {
        let dir = tempdir().unwrap();
        let out = execute(None, Some(dir.path()), "pwd", &[]).await.unwrap();
        assert_eq!(
            std::fs::canonicalize(out.trim()).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[tokio::test]
    async fn test_arguments_are_passed_individually() {
        let out = execute(None, None, "printf", &args(&["%s|", "a b", "$HOME"]))
            .await
            .unwrap();
        assert_eq!(out, "a b|$HOME|");
    }

    #[tokio::test]
    async fn test_shell_interprets_command_string() {
        let request = ExecRequest::new("echo $PROCRUN_TEST_VALUE", Vec::<String>::new())
            .env("PROCRUN_TEST_VALUE", "expanded");
        let out = execute_request(&request, None).await.unwrap();
        assert_eq!(out, "expanded\n");
    }

    #[tokio::test]
    async fn test_multibyte_output_survives_chunking() {
        let out = execute(None, None, "printf", &args(&["héllo wörld"]))
            .await
            .unwrap();
        assert_eq!(out, "héllo wörld");
    }

    #[tokio::test]
    async fn test_timeout_kills_command() {
        let request = ExecRequest::new("sleep", ["5"]).timeout(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let err = execute_request(&request, None).await.unwrap_err();
        assert!(matches!(err, ProcessError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_timeout_with_sink_reveals_partial_output() {
        let mut sink = BufferedSink::new();
        let request = ExecRequest::new("sh", ["-c", "echo partial; sleep 5"])
            .shell(false)
            .timeout(Duration::from_millis(500));
        let err = execute_request(&request, Some(&mut sink)).await.unwrap_err();
        assert!(matches!(err, ProcessError::Timeout { .. }));
        assert!(sink.was_shown());
        assert!(sink.contents().contains("partial\n"));
        assert!(sink.contents().contains("timed out after"));
    }

    #[tokio::test]
    async fn test_signal_termination_without_sink() {
        let request =
            ExecRequest::new("sh", ["-c", "echo before; echo oops >&2; kill -9 $$"]).shell(false);
        let err = execute_request(&request, None).await.unwrap_err();
        match &err {
            ProcessError::Terminated { command, output } => {
                assert_eq!(command, "sh");
                assert!(output.contains("before"), "{}", output);
                assert!(output.contains("oops"), "{}", output);
            }
            other => panic!("expected termination, got {:?}", other),
        }
        assert_eq!(err.exit_code(), None);
    }

    #[tokio::test]
    async fn test_signal_termination_with_sink_shows_sink() {
        let mut sink = BufferedSink::new();
        let request = ExecRequest::new("sh", ["-c", "echo before; kill -9 $$"]).shell(false);
        let err = execute_request(&request, Some(&mut sink)).await.unwrap_err();
        assert!(matches!(err, ProcessError::ShownOnSink { .. }));
        assert!(sink.was_shown());
        assert!(sink.contents().contains("before\n"));
    }

    #[tokio::test]
    async fn test_shell_builtin_runs_in_shell_mode() {
        let out = execute(None, None, "cd", &args(&["/"])).await.unwrap();
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn test_program_found_on_request_path() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let tool = dir.path().join("procrun-fixture-tool");
        std::fs::write(&tool, "#!/bin/sh\necho from-tool\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let path = format!("{}:/usr/bin:/bin", dir.path().display());
        let request = ExecRequest::new("procrun-fixture-tool", Vec::<String>::new())
            .env("PATH", path.as_str());
        assert_eq!(child_path(&request), Some(OsString::from(path)));
        let out = execute_request(&request, None).await.unwrap();
        assert_eq!(out, "from-tool\n");
    }

    #[tokio::test]
    async fn test_concurrent_invocations_are_independent() {
        let a_args = args(&["a"]);
        let b_args = args(&["b"]);
        let (a, b) = tokio::join!(
            execute(None, None, "echo", &a_args),
            execute(None, None, "echo", &b_args)
        );
        assert_eq!(a.unwrap(), "a\n");
        assert_eq!(b.unwrap(), "b\n");
    }

    #[test]
    fn test_plain_program_detection() {
        assert!(is_plain_program("git"));
        assert!(is_plain_program("./bin/tool"));
        assert!(!is_plain_program("echo hi"));
        assert!(!is_plain_program("a|b"));
        assert!(!is_plain_program(""));
    }
}
