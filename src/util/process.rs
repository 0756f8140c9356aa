//! Running a child process to completion and capturing what it printed.

/// Run `command` with no stdin, capturing its stdout and stderr.
///
/// With a `timeout`, the child is killed once it has run for that long.
pub(crate) fn run(
    command: &mut process::Command,
    timeout: Option<Duration>,
) -> Result<process::Output, FilterError> {
    let program = command.get_program().to_string_lossy().into_owned();

    command
        .stdin(process::Stdio::null())
        .stdout(process::Stdio::piped())
        .stderr(process::Stdio::piped());

    let spawn_error = |source: io::Error| match source.kind() {
        io::ErrorKind::NotFound => FilterError::InterpreterNotFound {
            program: program.clone(),
        },
        _ => FilterError::Spawn {
            program: program.clone(),
            source,
        },
    };

    let Some(timeout) = timeout else {
        return command.output().map_err(spawn_error);
    };

    own_process_group(command);

    let mut child = command.spawn().map_err(spawn_error)?;
    let mut stdout = child.stdout.take().unwrap();
    let mut stderr = child.stderr.take().unwrap();

    // Both pipes are drained while we poll; otherwise a chatty child would block on a full pipe.
    // The readers are never waited on after a timeout: whatever still holds the pipes open
    // must not hold us up too.
    let stdout = thread::spawn(move || read_all(&mut stdout));
    let stderr = thread::spawn(move || read_all(&mut stderr));

    let status = match wait_deadline(&mut child, Instant::now() + timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            kill(&mut child);
            return Err(FilterError::TimedOut { program, timeout });
        }
        Err(source) => {
            kill(&mut child);
            return Err(FilterError::Spawn { program, source });
        }
    };

    let read_error = |source| FilterError::Spawn {
        program: program.clone(),
        source,
    };
    Ok(process::Output {
        status,
        stdout: join_reader(stdout).map_err(read_error)?,
        stderr: join_reader(stderr).map_err(read_error)?,
    })
}

/// Kill `child` along with the rest of its process group, then reap it.
fn kill(child: &mut process::Child) {
    kill_process_group(child);
    let _ = child.kill();
    let _ = child.wait();
}

/// Start the child in a process group of its own, so grandchildren holding our pipes can be
/// killed with it.
#[cfg(unix)]
fn own_process_group(command: &mut process::Command) {
    std::os::unix::process::CommandExt::process_group(command, 0);
}

#[cfg(not(unix))]
fn own_process_group(_: &mut process::Command) {}

#[cfg(unix)]
fn kill_process_group(child: &process::Child) {
    let Ok(pid) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: `kill` has no memory safety preconditions.
    unsafe {
        libc::kill(-pid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_: &process::Child) {}

fn join_reader(handle: JoinHandle<io::Result<Vec<u8>>>) -> io::Result<Vec<u8>> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("output reader panicked")))
}

fn read_all(reader: &mut impl Read) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Wait for `child` to exit, returning `None` if `deadline` passes first.
fn wait_deadline(
    child: &mut process::Child,
    deadline: Instant,
) -> io::Result<Option<process::ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(Ord::min(POLL_INTERVAL, deadline - now));
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[cfg(all(test, unix))]
mod tests {
    #[test]
    fn captures_both_streams() {
        let output = run(
            process::Command::new("/bin/sh")
                .arg("-c")
                .arg("printf out; printf err >&2; exit 3"),
            None,
        )
        .unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stdout, b"out");
        assert_eq!(output.stderr, b"err");
    }

    #[test]
    fn captures_with_timeout() {
        let output = run(
            process::Command::new("/bin/sh")
                .arg("-c")
                .arg("printf out; printf err >&2"),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout, b"out");
        assert_eq!(output.stderr, b"err");
    }

    #[test]
    fn large_output_with_timeout() {
        // larger than any pipe buffer
        let output = run(
            process::Command::new("/bin/sh")
                .arg("-c")
                .arg("i=0; while [ $i -lt 20000 ]; do echo 0123456789; i=$((i+1)); done"),
            Some(Duration::from_secs(60)),
        )
        .unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout.len(), 20000 * 11);
    }

    #[test]
    fn times_out() {
        let e = run(
            process::Command::new("/bin/sh").arg("-c").arg("exec sleep 5"),
            Some(Duration::from_millis(100)),
        )
        .unwrap_err();
        assert!(matches!(e, FilterError::TimedOut { .. }), "{e:?}");
    }

    #[test]
    fn times_out_with_grandchildren() {
        // the shell forks `sleep`, which inherits both pipes
        let start = Instant::now();
        let e = run(
            process::Command::new("/bin/sh")
                .arg("-c")
                .arg("sleep 3; echo done"),
            Some(Duration::from_millis(100)),
        )
        .unwrap_err();
        assert!(matches!(e, FilterError::TimedOut { .. }), "{e:?}");
        assert!(start.elapsed() < Duration::from_secs(2), "{:?}", start.elapsed());
    }

    #[test]
    fn grandchildren_are_killed() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let e = run(
            process::Command::new("/bin/sh")
                .arg("-c")
                .arg(format!("(sleep 1; touch '{}') & wait", marker.display())),
            Some(Duration::from_millis(100)),
        )
        .unwrap_err();
        assert!(matches!(e, FilterError::TimedOut { .. }), "{e:?}");
        std::thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists());
    }

    #[test]
    fn missing_program() {
        let e = run(
            &mut process::Command::new("/definitely/not/a/real/program"),
            None,
        )
        .unwrap_err();
        match e {
            FilterError::InterpreterNotFound { program } => {
                assert_eq!(program, "/definitely/not/a/real/program");
            }
            e => panic!("unexpected error: {e:?}"),
        }
    }

    use super::run;
    use crate::error::FilterError;
    use std::process;
    use std::time::Duration;
    use std::time::Instant;
}

use crate::error::FilterError;
use std::io;
use std::io::Read;
use std::process;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;
