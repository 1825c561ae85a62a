use crate::error::ShellError;
use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use tracing::debug;

/// Exit code of a pipe target; signals map to 128 + n.
type ExitCode = i32;

/// Shell used to run the right-hand side of a pipe.
#[cfg(not(windows))]
const SHELL: (&str, &str) = ("sh", "-c");
#[cfg(windows)]
const SHELL: (&str, &str) = ("cmd", "/C");

/// Run `command_line` through the system shell with `input` as its standard input.
///
/// The child's standard output is copied into `out`; standard error is
/// inherited. A non-zero exit status is returned as
/// [`ShellError::ExternalStatus`] after the output has been forwarded.
pub fn pipe_through(
    command_line: &str,
    input: &[u8],
    out: &mut dyn Write,
) -> Result<(), ShellError> {
    let command_line = command_line.trim();
    if command_line.is_empty() {
        return Err(ShellError::EmptyPipeTarget);
    }

    let launch_error = |source: io::Error| ShellError::ExternalLaunch {
        command: command_line.to_string(),
        source,
    };

    let (shell, flag) = SHELL;
    let mut child = Command::new(shell)
        .arg(flag)
        .arg(command_line)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(launch_error)?;
    debug!(command = command_line, bytes = input.len(), "spawned pipe target");

    // Feed stdin from another thread so a target filling its stdout pipe
    // cannot block us while we are still writing.
    let feeder = child.stdin.take().map(|mut stdin| {
        let input = input.to_vec();
        thread::spawn(move || stdin.write_all(&input))
    });

    let output = child.wait_with_output().map_err(launch_error)?;
    if let Some(Ok(Err(e))) = feeder.map(|handle| handle.join()) {
        // The target may exit without reading everything (e.g. `head -1`).
        debug!(error = %e, "pipe target closed its input early");
    }
    out.write_all(&output.stdout)?;
    out.flush()?;

    let code = exit_code(output.status);
    if code != 0 {
        return Err(ShellError::ExternalStatus {
            command: command_line.to_string(),
            code,
        });
    }
    Ok(())
}

fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(x) => x,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitCode {
    -1
}
