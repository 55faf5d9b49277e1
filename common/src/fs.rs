use std::path::{Path, PathBuf};

use anyhow::Result;

pub trait FsExt {
    // Converts the provided relative path to be based from the path of the currently working directory.
    // If the path is absolute, then it returns the absolute path.
    fn relative_to_cwd(&self) -> Result<PathBuf>
    where
        Self: AsRef<Path>,
    {
        let cwd_dir = std::env::current_dir()?;

        Ok(cwd_dir.join(self))
    }
}

impl FsExt for String {}

impl FsExt for &str {}

impl FsExt for PathBuf {}

/// Strips the extension from a path, including a trailing `.gz` compression suffix.
///
/// `runs/itr_100.json.gz` becomes `runs/itr_100`.
pub fn base_filename(path: &Path) -> PathBuf {
    let path = if path.extension().is_some_and(|ext| ext == "gz") {
        path.with_extension("")
    } else {
        path.to_path_buf()
    };

    path.with_extension("")
}
