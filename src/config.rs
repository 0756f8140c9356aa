//! Loading `cleancss` options from a TOML file and the command line.

/// The contents of a configuration file.
///
/// ```toml
/// executable = "node_modules/.bin/cleancss"
/// interpreter = "node"
/// keep-line-breaks = true
/// compatibility = "ie8"
/// timeout-secs = 30
/// ```
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub(crate) struct FileConfig {
    pub executable: Option<PathBuf>,
    pub interpreter: Option<PathBuf>,
    pub keep_line_breaks: bool,
    pub remove_special_comments: bool,
    pub only_keep_first_special_comment: bool,
    pub root: Option<String>,
    pub skip_import: bool,
    pub skip_rebase: bool,
    pub skip_advanced: bool,
    pub skip_aggressive_merging: bool,
    pub rounding_precision: i32,
    pub compatibility: Option<String>,
    pub debug: bool,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    #[context("failed to load config from `{}`", path.display())]
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let src = fs::read_to_string(path).context("failed to read file")?;
        Ok(toml::from_str(&src)?)
    }
}

/// Options that can be given on the command line, overriding the config file.
#[derive(Debug, Default, clap::Args)]
pub(crate) struct Overrides {
    /// Path to the `cleancss` executable [default: /usr/bin/cleancss].
    #[clap(long, value_name = "PATH")]
    pub executable: Option<PathBuf>,

    /// Interpreter used to run the executable, e.g. `node`.
    #[clap(long, value_name = "PATH")]
    pub interpreter: Option<PathBuf>,

    /// Keep line breaks in the output.
    #[clap(long)]
    pub keep_line_breaks: bool,

    /// Remove all special comments (`/*! ... */`).
    #[clap(long)]
    pub remove_special_comments: bool,

    /// Keep only the first special comment.
    #[clap(long)]
    pub only_keep_first_special_comment: bool,

    /// Path to resolve absolute `@import` rules against.
    #[clap(long, value_name = "PATH")]
    pub root: Option<String>,

    /// Do not inline `@import` rules.
    #[clap(long)]
    pub skip_import: bool,

    /// Do not rebase `url()`s.
    #[clap(long)]
    pub skip_rebase: bool,

    /// Disable advanced optimizations.
    #[clap(long)]
    pub skip_advanced: bool,

    /// Disable property merging based on their order.
    #[clap(long)]
    pub skip_aggressive_merging: bool,

    /// Round numbers to this many decimal places; 0 leaves rounding disabled.
    #[clap(long, value_name = "N", allow_negative_numbers = true)]
    pub rounding_precision: Option<i32>,

    /// Compatibility mode, e.g. `ie8`.
    #[clap(long, value_name = "MODE")]
    pub compatibility: Option<String>,

    /// Ask the minifier to print optimization statistics.
    #[clap(long)]
    pub debug: bool,

    /// Kill the minifier if it runs for longer than this many seconds.
    #[clap(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Combine the config file with command line overrides.
pub(crate) fn options(file: FileConfig, overrides: Overrides) -> CleanCssOptions {
    let executable = overrides
        .executable
        .or(file.executable)
        .unwrap_or_else(|| DEFAULT_EXECUTABLE.into());

    let mut options = CleanCssOptions::new(executable)
        .keep_line_breaks(file.keep_line_breaks || overrides.keep_line_breaks)
        .remove_special_comments(file.remove_special_comments || overrides.remove_special_comments)
        .only_keep_first_special_comment(
            file.only_keep_first_special_comment || overrides.only_keep_first_special_comment,
        )
        .skip_import(file.skip_import || overrides.skip_import)
        .skip_rebase(file.skip_rebase || overrides.skip_rebase)
        .skip_advanced(file.skip_advanced || overrides.skip_advanced)
        .skip_aggressive_merging(file.skip_aggressive_merging || overrides.skip_aggressive_merging)
        .rounding_precision(overrides.rounding_precision.unwrap_or(file.rounding_precision))
        .debug(file.debug || overrides.debug);

    if let Some(interpreter) = overrides.interpreter.or(file.interpreter) {
        options = options.interpreter(interpreter);
    }
    if let Some(root) = overrides.root.or(file.root) {
        options = options.root(root);
    }
    if let Some(compatibility) = overrides.compatibility.or(file.compatibility) {
        options = options.compatibility(compatibility);
    }
    if let Some(secs) = overrides.timeout.or(file.timeout_secs) {
        options = options.timeout(Duration::from_secs(secs));
    }

    options
}


use crate::filter::CleanCssOptions;
use crate::filter::DEFAULT_EXECUTABLE;
use anyhow::Context as _;
use fn_error_context::context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
