//! Shell spawning and line-by-line output capture shared by both runners

use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::error::ExecError;
use crate::result::RunOutput;

/// Shell used to interpret command lines
pub const SHELL: &str = "sh";

/// Run `command_line` through `sh -c`, calling `on_line` for every stdout
/// line as soon as it is read.
///
/// Lines are passed with their terminator. The child is always reaped before
/// returning; dropping the future kills it.
#[instrument(skip(on_line), level = "debug")]
pub(crate) async fn run_shell<F>(command_line: &str, mut on_line: F) -> Result<RunOutput, ExecError>
where
    F: FnMut(&str) + Send,
{
    let start = Instant::now();

    let mut child = Command::new(SHELL)
        .arg("-c")
        .arg(command_line)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ExecError::spawn_failed(SHELL, e))?;

    debug!(pid = ?child.id(), "spawned shell");

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ExecError::IoError("child stdout was not captured".to_string()))?;

    let output = match read_lines(stdout, &mut on_line).await {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "output stream failed, killing child");
            if let Err(kill_err) = child.kill().await {
                warn!(error = %kill_err, "failed to kill child");
            }
            return Err(ExecError::IoError(e.to_string()));
        }
    };

    let status = child
        .wait()
        .await
        .map_err(|e| ExecError::IoError(e.to_string()))?;

    let duration = start.elapsed();
    let status = exit_code(status);

    debug!(status, duration = ?duration, "shell exited");

    Ok(RunOutput {
        status,
        output,
        duration,
    })
}

/// Read `reader` to the end one line at a time, keeping terminators.
///
/// Invalid UTF-8 is replaced rather than treated as an error, so binary noise
/// in a command's output never aborts the run.
pub(crate) async fn read_lines<R, F>(reader: R, on_line: &mut F) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut output = String::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        on_line(&line);
        output.push_str(&line);
    }

    Ok(output)
}

/// Exit code as a shell would report it: signals map to `128 + signal`
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;

    // Yields one line, then fails like a pipe torn down mid-stream
    struct BrokenPipe {
        sent: bool,
    }

    impl AsyncRead for BrokenPipe {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.sent {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "pipe closed",
                )));
            }
            self.sent = true;
            buf.put_slice(b"one\n");
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_read_lines_surfaces_stream_error() {
        let mut seen = Vec::new();
        let err = read_lines(BrokenPipe { sent: false }, &mut |line: &str| {
            seen.push(line.to_string());
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(seen, vec!["one\n"]);
    }

    #[tokio::test]
    async fn test_read_lines_keeps_terminators_and_order() {
        let mut seen = Vec::new();
        let output = read_lines(&b"one\ntwo\r\nthree"[..], &mut |line: &str| {
            seen.push(line.to_string());
        })
        .await
        .unwrap();

        assert_eq!(seen, vec!["one\n", "two\r\n", "three"]);
        assert_eq!(output, "one\ntwo\r\nthree");
    }

    #[tokio::test]
    async fn test_read_lines_replaces_invalid_utf8() {
        let output = read_lines(&b"ok \xff\n"[..], &mut |_: &str| {})
            .await
            .unwrap();

        assert_eq!(output, "ok \u{fffd}\n");
    }

    #[tokio::test]
    async fn test_run_shell_honours_pipes() {
        let result = run_shell("printf 'b\\na\\n' | sort", |_| {}).await.unwrap();

        assert!(result.success());
        assert_eq!(result.output, "a\nb\n");
    }

    #[tokio::test]
    async fn test_run_shell_reports_exit_code() {
        let result = run_shell("echo partial; exit 42", |_| {}).await.unwrap();

        assert_eq!(result.status, 42);
        assert_eq!(result.output, "partial\n");
    }

    #[tokio::test]
    async fn test_run_shell_does_not_capture_stderr() {
        let result = run_shell("echo out; echo err >&2", |_| {}).await.unwrap();

        assert_eq!(result.output, "out\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_signal_maps_to_shell_convention() {
        let result = run_shell("kill -9 $$", |_| {}).await.unwrap();

        assert_eq!(result.status, 137);
    }
}
