// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Path resolution helpers.
//!
//! Dataset files store the video and schema paths relative to the dataset's
//! own directory, so they can be moved around together. These helpers work
//! lexically and never touch the filesystem, which means the paths involved
//! do not need to exist yet.

use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `base` and normalise away `.` and `..` components.
///
/// An absolute `path` ignores `base`. A relative `base` is itself resolved
/// against the current working directory.
pub fn resolve(base: &Path, path: &Path) -> std::io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else if base.is_absolute() {
        base.join(path)
    } else {
        std::env::current_dir()?.join(base).join(path)
    };
    Ok(normalize(&joined))
}

/// Resolve `path` against the current working directory.
pub fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    resolve(&std::env::current_dir()?, path)
}

/// Lexically normalise a path.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = out.components().next_back();
                let poppable = matches!(last, Some(Component::Normal(_)));
                // `..` at the root stays at the root
                let at_root = matches!(last, Some(Component::RootDir | Component::Prefix(_)));
                if poppable {
                    out.pop();
                } else if !at_root {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Express `path` relative to the directory `base`.
///
/// Both paths should be absolute. If they share no common root (different
/// drive prefixes on Windows) the normalised `path` is returned unchanged.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path = normalize(path);
    let base = normalize(base);

    if path.components().next() != base.components().next() {
        return path;
    }

    match pathdiff::diff_paths(&path, &base) {
        Some(relative) if relative.as_os_str().is_empty() => PathBuf::from("."),
        Some(relative) => relative,
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_removes_dot_components() {
        assert_eq!(
            normalize(Path::new("/data/./videos/../schemas/s.yml")),
            PathBuf::from("/data/schemas/s.yml")
        );
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn test_resolve_relative_against_base() {
        let resolved = resolve(Path::new("/data/datasets"), Path::new("../videos/clip.mp4")).unwrap();
        assert_eq!(resolved, PathBuf::from("/data/videos/clip.mp4"));

        let absolute = resolve(Path::new("/data"), Path::new("/elsewhere/clip.mp4")).unwrap();
        assert_eq!(absolute, PathBuf::from("/elsewhere/clip.mp4"));
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to(Path::new("/data/videos/clip.mp4"), Path::new("/data/datasets")),
            PathBuf::from("../videos/clip.mp4")
        );
        assert_eq!(
            relative_to(Path::new("/data/clip.mp4"), Path::new("/data")),
            PathBuf::from("clip.mp4")
        );
        assert_eq!(relative_to(Path::new("/data"), Path::new("/data")), PathBuf::from("."));
        assert_eq!(
            relative_to(Path::new("/data/./videos/../clip.mp4"), Path::new("/data/sets/")),
            PathBuf::from("../clip.mp4")
        );
    }

    #[test]
    fn test_relative_to_relative_inputs() {
        // No shared root, so the path comes back as given
        assert_eq!(
            relative_to(Path::new("videos/clip.mp4"), Path::new("/data")),
            PathBuf::from("videos/clip.mp4")
        );
    }

    #[test]
    fn test_relative_roundtrip() {
        let base = Path::new("/a/b/c");
        let target = Path::new("/a/x/y.json");
        let relative = relative_to(target, base);
        assert_eq!(resolve(base, &relative).unwrap(), target);
    }
}
