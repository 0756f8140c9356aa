//! Errors produced while running an external filter.

#[derive(Debug, thiserror::Error)]
pub(crate) enum FilterError {
    /// The shell (or the OS) could not locate the program to run.
    #[error("`{program}` could not be found; check the configured interpreter and executable paths")]
    InterpreterNotFound { program: String },

    /// The minifier ran but rejected its input.
    #[error("{}", execution_failed_message(.code, .stderr))]
    ExecutionFailed {
        code: Option<i32>,
        stderr: String,
        /// The asset content as it was before the filter ran.
        input: Vec<u8>,
    },

    #[error("failed to prepare temporary input file")]
    TempFile(#[source] io::Error),

    #[error("failed to run `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` did not finish within {}s", .timeout.as_secs_f64())]
    TimedOut { program: String, timeout: Duration },
}

fn execution_failed_message(code: &Option<i32>, stderr: &str) -> String {
    let status = match code {
        Some(code) => format!("exit code {code}"),
        None => "termination by signal".to_owned(),
    };
    let stderr = stderr.trim_end();
    if stderr.is_empty() {
        format!("minifier failed with {status}")
    } else {
        format!("minifier failed with {status}: {stderr}")
    }
}


use std::io;
use std::time::Duration;
