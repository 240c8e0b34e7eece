//! Filesystem archive sink: one plain file per entry.
//!
//! The engine only sees the [`ArchiveSink`] seam; container choice
//! (directory, zip, tarball) belongs to the caller. The CLI ships the
//! directory flavor.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use survex_core::source::ArchiveSink;
use survex_model::Result;

pub struct DirArchive {
    root: PathBuf,
}

impl DirArchive {
    /// Create the directory (and parents) and return a sink writing into it.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArchiveSink for DirArchive {
    fn put_entry(&mut self, name: &str, reader: &mut dyn Read) -> Result<()> {
        let mut file = File::create(self.root.join(name))?;
        io::copy(reader, &mut file)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_become_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut archive = DirArchive::create(temp.path().join("out")).expect("create");
        archive
            .put_entry("Code Book.csv", &mut "a,b\n".as_bytes())
            .expect("entry");
        let written =
            fs::read_to_string(temp.path().join("out").join("Code Book.csv")).expect("read");
        assert_eq!(written, "a,b\n");
    }
}
