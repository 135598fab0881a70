use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("cannot create output directory {dir}: {source}")]
    CreateDir { dir: PathBuf, source: io::Error },
    #[error("cannot save {file}: {source}")]
    Save { file: PathBuf, source: io::Error },
}

/// Creates the download directory unless it already exists.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PersistError::NotADirectory(dir.to_path_buf())),
        Err(_) => fs::create_dir_all(dir).map_err(|source| PersistError::CreateDir {
            dir: dir.to_path_buf(),
            source,
        }),
    }
}

/// Saves downloaded artifacts into one directory.
///
/// Each artifact is staged in a temp file next to its target and renamed into
/// place; an artifact saved twice under the same name keeps the later bytes.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, file_name: &str, contents: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;
        let target = self.dir.join(file_name);
        stage_and_rename(&self.dir, &target, contents).map_err(|source| PersistError::Save {
            file: target.clone(),
            source,
        })?;
        Ok(target)
    }
}

fn stage_and_rename(dir: &Path, target: &Path, contents: &[u8]) -> io::Result<()> {
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(contents)?;
    staged.as_file().sync_all()?;
    staged.persist(target).map_err(|err| err.error)?;
    Ok(())
}
