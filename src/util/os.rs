/// Filesystem helpers for locating the reference data directory
/// and preparing output locations.

use std::{fs, io, path::{Path, PathBuf}};

pub type Error = String;

const DATA_DIR_NAME: &str = ".vmw-tax";

// Returns $HOME/.vmw-tax/. Unlike output dirs, this is not created, since it
// is only ever read from.
pub fn home_data_dir_path() -> Result<PathBuf, Error> {
    match dirs::home_dir() {
        Some(d) => Ok(d.join(DATA_DIR_NAME)),
        None => Err(Error::from("Unable to determine home directory")),
    }
}

// With a file name (eg. prices.csv), returns a path like $HOME/.vmw-tax/prices.csv
pub fn home_data_file_path(fname: &Path) -> Result<PathBuf, Error> {
    Ok(home_data_dir_path()?.join(fname))
}

/// Ensures the parent directory of an output file exists.
pub fn ensure_parent_dir(file_path: &Path) -> io::Result<()> {
    match file_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

/// Appends an extension to a path without replacing any existing one,
/// so "out/tax.2023" becomes "out/tax.2023.txt".
pub fn with_appended_extension(base: &Path, ext: &str) -> PathBuf {
    let mut s = base.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}
