//! Filters that rewrite an asset's content.

mod args;
pub(crate) use args::CleanCssOptions;
pub(crate) use args::DEFAULT_EXECUTABLE;

/// A filter runs in two phases: once when an asset is loaded and once when it is dumped.
pub(crate) trait Filter {
    fn load(&self, asset: &mut dyn Asset) -> Result<(), FilterError> {
        let _ = asset;
        Ok(())
    }

    fn dump(&self, asset: &mut dyn Asset) -> Result<(), FilterError>;
}

/// Minifies CSS by running [clean-css](https://github.com/clean-css/clean-css-cli).
#[derive(Debug, Clone, Default)]
pub(crate) struct CleanCssFilter {
    options: CleanCssOptions,
}

impl CleanCssFilter {
    pub(crate) fn new(options: CleanCssOptions) -> Self {
        Self { options }
    }

    pub(crate) fn options(&self) -> &CleanCssOptions {
        &self.options
    }
}

impl Filter for CleanCssFilter {
    fn dump(&self, asset: &mut dyn Asset) -> Result<(), FilterError> {
        let input = asset.content();

        // Removed on drop, whichever way we leave this function.
        let mut file = tempfile::Builder::new()
            .prefix("cleancss-")
            .suffix(".css")
            .tempfile()
            .map_err(FilterError::TempFile)?;
        file.write_all(input).map_err(FilterError::TempFile)?;
        file.flush().map_err(FilterError::TempFile)?;

        let (program, args) = self.options.to_args(file.path());
        log::debug!("running {program:?} {args:?}");

        let output = process::run(
            Command::new(&program).args(&args),
            self.options.get_timeout(),
        )?;

        match output.status.code() {
            Some(0) => {}
            Some(NOT_FOUND) => {
                return Err(FilterError::InterpreterNotFound {
                    program: program.to_string_lossy().into_owned(),
                });
            }
            code => {
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                log::debug!("minifier exited with {:?}: {}", code, stderr.trim_end());
                return Err(FilterError::ExecutionFailed {
                    code,
                    stderr,
                    input: input.to_vec(),
                });
            }
        }

        drop(file);
        asset.set_content(output.stdout);
        Ok(())
    }
}

/// The exit code shells use for "command not found".
const NOT_FOUND: i32 = 127;


use crate::error::FilterError;
use crate::util::asset::Asset;
use crate::util::process;
use std::io::Write as _;
use std::process::Command;
