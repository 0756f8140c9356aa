#![warn(
    noop_method_call,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications,
    clippy::pedantic
)]
#![allow(
    clippy::match_bool,
    clippy::single_component_path_imports, // https://github.com/rust-lang/rust-clippy/issues/7923
    clippy::too_many_lines,
    clippy::items_after_statements,
    clippy::struct_excessive_bools,
    clippy::result_unit_err,
)]

use ::{
    anyhow::{bail, ensure, Context as _},
    crossbeam::channel,
    notify::Watcher,
    std::{
        io::{self, Write as _},
        path::{Path, PathBuf},
        time::{Duration, Instant},
    },
};

mod config;
mod error;
mod filter;
mod minify;

mod util;
use self::{
    config::{FileConfig, Overrides},
    filter::CleanCssFilter,
    util::asset::Asset as _,
};

/// Minify stylesheets with clean-css.
#[derive(clap::Parser)]
struct Args {
    /// Stylesheets, or directories to search for `.css` files.
    #[clap(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory to write minified stylesheets to.
    ///
    /// Without it, a single input file is minified to stdout.
    #[clap(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// TOML file to read options from.
    #[clap(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Minify even when the output is newer than its input.
    #[clap(long)]
    force: bool,

    /// Whether to watch the inputs for changes.
    #[clap(long, requires = "out_dir")]
    watch: bool,

    #[clap(flatten)]
    overrides: Overrides,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let args: Args = clap::Parser::parse();

    let file_config = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let filter = CleanCssFilter::new(config::options(file_config, args.overrides));
    log::debug!("using {:?}", filter.options());

    let Some(out_dir) = &args.out_dir else {
        return to_stdout(&filter, &args.inputs);
    };

    let failed = build(&filter, &args.inputs, out_dir, args.force)?;

    if args.watch {
        watch(&filter, &args.inputs, out_dir)?;
    }

    if failed > 0 {
        bail!("{failed} stylesheet(s) failed to minify");
    }

    Ok(())
}

fn build(
    filter: &CleanCssFilter,
    inputs: &[PathBuf],
    out_dir: &Path,
    force: bool,
) -> anyhow::Result<usize> {
    let jobs = minify::jobs(inputs, out_dir)?;
    Ok(minify::run_all(filter, &jobs, force))
}

fn to_stdout(filter: &CleanCssFilter, inputs: &[PathBuf]) -> anyhow::Result<()> {
    let [input] = inputs else {
        bail!("writing to stdout needs exactly one input file; pass --out-dir for more");
    };
    ensure!(
        !input.is_dir(),
        "`{}` is a directory; pass --out-dir to minify directories",
        input.display()
    );

    let asset = minify::filter_file(filter, input)
        .with_context(|| format!("failed to minify `{}`", input.display()))?;

    io::stdout()
        .lock()
        .write_all(asset.content())
        .context("failed to write to stdout")?;
    log::info!("successfully minified {}", asset.path().display());
    Ok(())
}

fn watch(filter: &CleanCssFilter, inputs: &[PathBuf], out_dir: &Path) -> anyhow::Result<()> {
    let (sender, receiver) = channel::bounded(1);

    let mut watcher = notify::recommended_watcher(move |event_res| {
        let event: notify::Event = match event_res {
            Ok(event) => event,
            Err(e) => {
                log::error!("error watching: {}", e);
                return;
            }
        };
        if !matches!(event.kind, notify::event::EventKind::Access(_)) {
            let _ = sender.try_send(());
        }
    })
    .context("failed to create file watcher")?;

    for input in inputs {
        watcher
            .watch(input, notify::RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch `{}`", input.display()))?;
    }

    log::info!("now watching for changes");

    loop {
        let _ = receiver.recv();
        // debounce
        let debounce_deadline = Instant::now() + Duration::from_millis(10);
        while receiver.recv_deadline(debounce_deadline).is_ok() {}

        log::info!("rebuilding");
        // Outputs written by the previous round are newer than their inputs, so only
        // the stylesheets that changed get minified again.
        let _ = util::log_errors(build(filter, inputs, out_dir, false));
    }
}
