// src/exec/lookup.rs

//! Resolve a program name against `PATH`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Find the executable for `program`.
///
/// Names containing a path separator are checked as-is; bare names are
/// searched in every `PATH` entry in order.
pub fn find_binary(program: &str) -> Option<PathBuf> {
    find_binary_in(program, std::env::var_os("PATH").as_deref())
}

pub fn find_binary_in(program: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }

    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path_var = path_var?;
    std::env::split_paths(path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| executable_names(program).into_iter().map(move |name| dir.join(name)))
        .find(|path| is_executable(path))
}

#[cfg(windows)]
fn executable_names(program: &str) -> Vec<String> {
    vec![program.to_string(), format!("{program}.exe")]
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> Vec<String> {
    vec![program.to_string()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn finds_executable_in_path_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();

        // Not executable: must be skipped.
        std::fs::write(first.path().join("helm"), "").unwrap();

        let real = second.path().join("helm");
        std::fs::write(&real, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&real, std::fs::Permissions::from_mode(0o755)).unwrap();

        let path_var = std::env::join_paths([first.path(), second.path()]).unwrap();
        assert_eq!(find_binary_in("helm", Some(&path_var)), Some(real));
        assert_eq!(find_binary_in("terragrunt", Some(&path_var)), None);
        assert_eq!(find_binary_in("helm", None), None);
    }

    #[test]
    fn explicit_paths_are_not_searched() {
        assert_eq!(find_binary_in("/bin/sh", None), Some(PathBuf::from("/bin/sh")));
        assert_eq!(find_binary_in("./does-not-exist", None), None);
    }
}
