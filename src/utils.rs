use dirs::data_dir;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

pub fn data_root() -> PathBuf {
    let base = data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    base.join("free-food-sync")
}

pub fn database_path() -> PathBuf {
    data_root().join("events.sqlite")
}

pub fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
