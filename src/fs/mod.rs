use std::path::{Path, PathBuf};
use std::{fs, io};

use anyhow::{Context, Result};

mod layout;
pub use layout::Layout;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Specified output directory \"{0}\" is not a directory")]
    NotDirectory(String),
    #[error("Can't perform IO operation: \"{0}\" is not whitelisted")]
    NotWhitelisted(String),
    #[error("Filesystem path is not valid UTF-8")]
    PathEncoding,
}

/// All file operations in the crate go through this struct.
///
/// Destructive operations check that the path in question is a child of the
/// single whitelisted prefix (the workflow output dir), otherwise they will
/// not be performed.
#[derive(Debug)]
pub struct Fs {
    /// The directory we are allowed to modify
    output_prefix: PathBuf,
}

impl Fs {
    /// Create a new `Fs` restricted to the given output directory.
    pub fn new(output_prefix: &Path) -> Self {
        Self {
            output_prefix: output_prefix.to_path_buf(),
        }
    }

    /// Check whether output dir exists, and create it if not.
    pub fn ensure_output_dir_exists(&mut self) -> Result<()> {
        if !self.output_prefix.exists() {
            log::debug!("Creating output directory {:?}", self.output_prefix);
            fs::create_dir_all(&self.output_prefix).context("creating output directory")?;
        } else if !self.output_prefix.is_dir() {
            return Err(Error::NotDirectory(
                self.output_prefix
                    .to_str()
                    .ok_or(Error::PathEncoding)?
                    .to_owned(),
            )
            .into());
        }
        self.output_prefix = self.output_prefix.canonicalize()?;
        Ok(())
    }

    /// Check if path exists on disk.
    pub fn exists<T: AsRef<Path>>(&self, path: T) -> bool {
        let path = path.as_ref();
        path.exists() || path.is_symlink()
    }

    /// Create a directory, along with any missing ancestors.
    pub fn create_dir<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::create_dir_all(path).context("creating dir")?;
        Ok(())
    }

    /// Write entire str to a file.
    pub fn write_file<T: AsRef<Path>>(&self, path: T, text: &str) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::write(path, text).context("writing file")?;
        Ok(())
    }

    /// Recursively delete a directory.
    pub fn delete_dir<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::remove_dir_all(path).context("deleting dir")?;
        Ok(())
    }

    /// Read entire file into a String.
    pub fn read_to_string<T: AsRef<Path>>(&self, path: T) -> Result<String> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading file {:?}", path))?;
        Ok(text)
    }

    /// List entries in a directory.
    pub fn read_dir<T: AsRef<Path>>(&self, path: T) -> Result<fs::ReadDir, io::Error> {
        fs::read_dir(path)
    }

    fn check_whitelist(&self, path: &Path) -> Result<()> {
        if path.starts_with(&self.output_prefix) {
            Ok(())
        } else {
            Err(Error::NotWhitelisted(
                path.to_str().ok_or(Error::PathEncoding)?.to_owned(),
            )
            .into())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_destructive_ops_are_whitelisted() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let fs = Fs::new(dir.path());
        let inside = dir.path().join("ok.txt");
        fs.write_file(&inside, "fine")?;
        assert!(fs.exists(&inside));

        let outside = std::env::temp_dir().join("definitely-not-whitelisted.txt");
        assert!(fs.write_file(&outside, "nope").is_err());
        Ok(())
    }
}
