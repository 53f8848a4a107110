/*!
    Utilities for working with paths given to and printed by luabundle.
*/

use std::{
    env::current_dir,
    ffi::OsStr,
    path::{Path, PathBuf, MAIN_SEPARATOR},
    sync::Arc,
};

use once_cell::sync::Lazy;
use path_clean::PathClean;

static CWD: Lazy<Arc<Path>> = Lazy::new(create_cwd);

fn create_cwd() -> Arc<Path> {
    let mut cwd = current_dir()
        .expect("failed to find current working directory")
        .to_str()
        .expect("current working directory is not valid UTF-8")
        .to_string();
    if !cwd.ends_with(MAIN_SEPARATOR) {
        cwd.push(MAIN_SEPARATOR);
    }
    dunce::canonicalize(cwd)
        .expect("failed to canonicalize current working directory")
        .into()
}

/**
    Gets the current working directory as an absolute path.

    This absolute path is canonicalized and does not contain any `.` or `..`
    components, and it is also in a friendly (non-UNC) format.
*/
#[must_use]
pub fn get_current_dir() -> Arc<Path> {
    Arc::clone(&CWD)
}

/**
    Makes a path absolute, if it is relative, and then cleans it.

    Relative paths are resolved against the current working directory.
*/
#[must_use]
pub fn clean_path_and_make_absolute(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_relative() {
        CWD.join(path).clean()
    } else {
        path.clean()
    }
}

/**
    Returns a path suitable for printing to the user, relative
    to the current working directory whenever possible.

    Paths that can not be made relative, such as paths on a
    different drive, are returned as cleaned absolute paths.
*/
#[must_use]
pub fn display_path(path: impl AsRef<Path>) -> PathBuf {
    let absolute = clean_path_and_make_absolute(path);
    match pathdiff::diff_paths(&absolute, get_current_dir()) {
        Some(relative) if relative.as_os_str().is_empty() => PathBuf::from("."),
        Some(relative) => relative,
        None => absolute,
    }
}

/**
    Derives the default output path for a bundled script.

    A source file extension such as `.lua` or `.luau` is kept as the final
    extension, with a `bundle` extension inserted before it, so that
    `src/main.lua` becomes `src/main.bundle.lua`.
*/
#[must_use]
pub fn bundled_file_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    match path.extension().and_then(OsStr::to_str) {
        Some(ext @ ("lua" | "luau")) => path.with_extension(format!("bundle.{ext}")),
        _ => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".bundle.lua");
            PathBuf::from(name)
        }
    }
}
