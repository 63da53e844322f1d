//! Removal of files generated by the CVODE build.

use std::fs;
use std::io;
use std::path::Path;

/// Driver sources in `src/` that are never removed.
pub const PRESERVED_SOURCES: [&str; 2] = ["integrate_cvode.c", "integrate_idas.c"];

/// Removes generated model files below `root`.
///
/// Deletes the `bin/` and `includes/` directories and every entry of `src/`
/// except the [`PRESERVED_SOURCES`]. Missing directories are skipped, so the
/// function can be called repeatedly.
///
/// # Returns
///
/// * `io::Result<bool>` - `Ok(true)` once the tree is clean
pub fn remove_model_files(root: impl AsRef<Path>) -> io::Result<bool> {
    let root = root.as_ref();

    for dir in ["bin", "includes"] {
        let path = root.join(dir);
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
            log::debug!("Removed {}", path.display());
        }
    }

    let src = root.join("src");
    if src.is_dir() {
        for entry in fs::read_dir(&src)? {
            let entry = entry?;
            let preserved = entry
                .file_name()
                .to_str()
                .is_some_and(|name| PRESERVED_SOURCES.contains(&name));
            if preserved {
                continue;
            }

            let path = entry.path();
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
            log::debug!("Removed {}", path.display());
        }
    }

    Ok(true)
}
