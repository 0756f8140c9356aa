//! This module contains many small independent components.

pub(crate) mod asset;
pub(crate) mod process;

/// Log the error of `res`, if any, keeping only whether it succeeded.
pub(crate) fn log_errors<T>(res: anyhow::Result<T>) -> Result<T, ()> {
    res.map_err(|e| log::error!("{e:?}"))
}

pub(crate) fn write_file<P: AsRef<Path>, D: AsRef<[u8]>>(path: P, data: D) -> anyhow::Result<()> {
    let path = path.as_ref();
    make_parents(path)?;
    fs::write(path, data)
        .with_context(|| format!("couldn't write output to `{}`", path.display()))?;

    Ok(())
}

pub(crate) fn make_parents<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create dir `{}`", parent.display()))?;
    }
    Ok(())
}


use anyhow::Context as _;
use std::fs;
use std::path::Path;
