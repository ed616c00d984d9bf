use std::path::{Path, PathBuf};

use tracing::debug;

use crate::assembly::{RowSet, assemble};
use crate::config::Config;
use crate::document::Document;
use crate::env::{TargetEnv, apply};
use crate::error::Error;
use crate::model::LoadReport;
use crate::parser::parse_rows_with_config;

/// Load `.env` from the current working directory into the process
/// environment.
///
/// # Safety
///
/// Mutates the process environment; see [`TargetEnv::process`].
pub unsafe fn dotenv() -> Result<LoadReport, Error> {
    // SAFETY: forwarded to the caller.
    unsafe { from_filename(".env") }
}

/// Load a `.env` file from a specific path into the process environment.
///
/// # Safety
///
/// Mutates the process environment; see [`TargetEnv::process`].
pub unsafe fn from_path(path: impl AsRef<Path>) -> Result<LoadReport, Error> {
    // SAFETY: forwarded to the caller.
    let mut loader = EnvLoader::new().path(path).target(unsafe { TargetEnv::process() });
    loader.load()
}

/// Load multiple `.env` files into the process environment.
///
/// # Safety
///
/// Mutates the process environment; see [`TargetEnv::process`].
pub unsafe fn from_paths<I, P>(paths: I) -> Result<LoadReport, Error>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    // SAFETY: forwarded to the caller.
    let mut loader = EnvLoader::new().paths(paths).target(unsafe { TargetEnv::process() });
    loader.load()
}

/// Load a dotenv file by filename from the current working directory.
///
/// # Safety
///
/// Mutates the process environment; see [`TargetEnv::process`].
pub unsafe fn from_filename(name: &str) -> Result<LoadReport, Error> {
    // SAFETY: forwarded to the caller.
    unsafe { from_path(PathBuf::from(name)) }
}

/// Read and merge files in order into one document; later files win.
///
/// An empty path list reads `.env`.
pub fn load<I, P>(paths: I) -> Result<Document, Error>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    EnvLoader::new().paths(paths).load_document()
}

/// Write the full serialization of `document` to `path`, replacing it.
pub fn save(document: &Document, path: impl AsRef<Path>) -> Result<(), Error> {
    save_with_config(document, path, &Config::default())
}

pub fn save_with_config(
    document: &Document,
    path: impl AsRef<Path>,
    config: &Config,
) -> Result<(), Error> {
    std::fs::write(path, document.marshal(config))?;
    Ok(())
}

/// Builder-style dotenv loader.
#[derive(Debug, Clone, Default)]
pub struct EnvLoader {
    paths: Vec<PathBuf>,
    config: Config,
    override_existing: bool,
    target: TargetEnv,
}

impl EnvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.paths
            .extend(paths.into_iter().map(|path| path.as_ref().to_path_buf()));
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn override_existing(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    pub fn target(mut self, target: TargetEnv) -> Self {
        self.target = target;
        self
    }

    pub fn target_env(&self) -> &TargetEnv {
        &self.target
    }

    pub fn target_env_mut(&mut self) -> &mut TargetEnv {
        &mut self.target
    }

    pub fn into_target(self) -> TargetEnv {
        self.target
    }

    /// Read every file and merge them into one document without touching
    /// the target.
    ///
    /// The first file that cannot be read or parsed aborts the whole load.
    pub fn load_document(&self) -> Result<Document, Error> {
        let (rows, _) = self.collect_rows()?;
        Ok(assemble(rows, &self.config))
    }

    /// Load the document and export its live rows into the target.
    pub fn load(&mut self) -> Result<LoadReport, Error> {
        let (rows, files_read) = self.collect_rows()?;
        let document = assemble(rows, &self.config);
        let applied = apply(&document, &mut self.target, self.override_existing);

        Ok(LoadReport {
            loaded: applied.loaded,
            skipped_existing: applied.skipped_existing,
            files_read,
        })
    }

    fn collect_rows(&self) -> Result<(RowSet, usize), Error> {
        let mut merged = RowSet::new();
        let mut files_read = 0usize;

        for path in self.effective_paths() {
            debug!(path = %path.display(), "reading env file");
            let bytes = std::fs::read(&path)?;
            files_read += 1;
            let content = std::str::from_utf8(&bytes)?;
            merged.merge(parse_rows_with_config(content, &self.config)?);
        }

        Ok((merged, files_read))
    }

    fn effective_paths(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            vec![PathBuf::from(".env")]
        } else {
            self.paths.clone()
        }
    }
}
