//! Assets: pieces of content that filters read and rewrite in place.

pub(crate) trait Asset {
    /// The asset's current content.
    fn content(&self) -> &[u8];

    /// Replace the asset's content.
    fn set_content(&mut self, content: Vec<u8>);
}

/// Asset whose content lives only in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct StringAsset {
    content: Vec<u8>,
}

impl StringAsset {
    pub(crate) fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub(crate) fn into_content(self) -> Vec<u8> {
        self.content
    }
}

impl Asset for StringAsset {
    fn content(&self) -> &[u8] {
        &self.content
    }
    fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
    }
}

/// Asset loaded from a file on disk.
///
/// Setting the content does not touch the file; use [`crate::util::write_file`] for that.
#[derive(Debug)]
pub(crate) struct FileAsset {
    path: PathBuf,
    content: Vec<u8>,
}

impl FileAsset {
    #[context("failed to load asset `{}`", path.as_ref().display())]
    pub(crate) fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read(path).context("failed to read file")?;
        Ok(Self {
            path: path.to_owned(),
            content,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Asset for FileAsset {
    fn content(&self) -> &[u8] {
        &self.content
    }
    fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
    }
}

/// When a path on disk was last modified.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub(crate) enum Modified {
    Never,
    At(SystemTime),
}

impl Modified {
    pub(crate) fn path<P: AsRef<Path>>(path: P) -> Self {
        path.as_ref()
            .symlink_metadata()
            .and_then(|meta| meta.modified())
            .map_or(Self::Never, Self::At)
    }

    /// The modification time of the running executable.
    ///
    /// Outputs older than this were produced by a different build and are regenerated.
    pub(crate) fn exe() -> Self {
        *EXE_MODIFIED
    }
}

static EXE_MODIFIED: Lazy<Modified> = Lazy::new(|| {
    env::current_exe()
        .map(Modified::path)
        .unwrap_or_else(|_| Modified::At(SystemTime::now()))
});


use anyhow::Context as _;
use fn_error_context::context;
use once_cell::sync::Lazy;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
