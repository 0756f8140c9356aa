//! Options accepted by `cleancss` and their mapping onto its command line.

/// Where `cleancss` lives when no other path is configured.
pub(crate) const DEFAULT_EXECUTABLE: &str = "/usr/bin/cleancss";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CleanCssOptions {
    executable: PathBuf,
    interpreter: Option<PathBuf>,
    keep_line_breaks: bool,
    remove_special_comments: bool,
    only_keep_first_special_comment: bool,
    root: Option<String>,
    skip_import: bool,
    skip_rebase: bool,
    skip_advanced: bool,
    skip_aggressive_merging: bool,
    /// Zero disables rounding.
    rounding_precision: i32,
    compatibility: Option<String>,
    debug: bool,
    timeout: Option<Duration>,
}

impl Default for CleanCssOptions {
    fn default() -> Self {
        Self::new(DEFAULT_EXECUTABLE)
    }
}

impl CleanCssOptions {
    pub(crate) fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            interpreter: None,
            keep_line_breaks: false,
            remove_special_comments: false,
            only_keep_first_special_comment: false,
            root: None,
            skip_import: false,
            skip_rebase: false,
            skip_advanced: false,
            skip_aggressive_merging: false,
            rounding_precision: 0,
            compatibility: None,
            debug: false,
            timeout: None,
        }
    }

    /// Run the executable through an interpreter such as `node`.
    pub(crate) fn interpreter(mut self, interpreter: impl Into<PathBuf>) -> Self {
        self.interpreter = Some(interpreter.into());
        self
    }

    pub(crate) fn keep_line_breaks(mut self, keep_line_breaks: bool) -> Self {
        self.keep_line_breaks = keep_line_breaks;
        self
    }

    pub(crate) fn remove_special_comments(mut self, remove: bool) -> Self {
        self.remove_special_comments = remove;
        self
    }

    pub(crate) fn only_keep_first_special_comment(mut self, only_first: bool) -> Self {
        self.only_keep_first_special_comment = only_first;
        self
    }

    /// Path used to resolve absolute `@import` rules.
    pub(crate) fn root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub(crate) fn skip_import(mut self, skip: bool) -> Self {
        self.skip_import = skip;
        self
    }

    pub(crate) fn skip_rebase(mut self, skip: bool) -> Self {
        self.skip_rebase = skip;
        self
    }

    pub(crate) fn skip_advanced(mut self, skip: bool) -> Self {
        self.skip_advanced = skip;
        self
    }

    pub(crate) fn skip_aggressive_merging(mut self, skip: bool) -> Self {
        self.skip_aggressive_merging = skip;
        self
    }

    pub(crate) fn rounding_precision(mut self, precision: i32) -> Self {
        self.rounding_precision = precision;
        self
    }

    /// e.g. `ie8`.
    pub(crate) fn compatibility(mut self, compatibility: impl Into<String>) -> Self {
        self.compatibility = Some(compatibility.into());
        self
    }

    pub(crate) fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub(crate) fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The program to run and its arguments for minifying the file at `input`.
    pub(crate) fn to_args(&self, input: &Path) -> (OsString, Vec<OsString>) {
        let mut args: Vec<OsString> = Vec::new();

        let program = match &self.interpreter {
            Some(interpreter) => {
                args.push(self.executable.clone().into());
                interpreter.into()
            }
            None => self.executable.clone().into(),
        };

        push_flag(&mut args, self.keep_line_breaks, "--keep-line-breaks");
        push_flag(&mut args, self.remove_special_comments, "--s0");
        push_flag(&mut args, self.only_keep_first_special_comment, "--s1");
        push_value(&mut args, "--root", self.root.as_deref());
        push_flag(&mut args, self.skip_import, "--skip-import");
        push_flag(&mut args, self.skip_rebase, "--skip-rebase");
        push_flag(&mut args, self.skip_advanced, "--skip-advanced");
        push_flag(&mut args, self.skip_aggressive_merging, "--skip-aggressive-merging");
        if self.rounding_precision != 0 {
            let precision = self.rounding_precision.to_string();
            push_value(&mut args, "--rounding-precision", Some(precision.as_str()));
        }
        push_value(&mut args, "--compatibility", self.compatibility.as_deref());
        push_flag(&mut args, self.debug, "--debug");

        args.push(input.into());
        (program, args)
    }
}

fn push_flag(args: &mut Vec<OsString>, enabled: bool, name: &str) {
    if enabled {
        args.push(name.into());
    }
}

/// Push `name` followed by `value` as its own argument, unless `value` is missing or empty.
fn push_value(args: &mut Vec<OsString>, name: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|value| !value.is_empty()) {
        args.push(name.into());
        args.push(value.into());
    }
}


use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
