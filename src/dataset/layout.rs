use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{PrepError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitKind {
    Test,
    Train,
}

impl SplitKind {
    pub fn dir_name(self) -> &'static str {
        match self {
            SplitKind::Test => "test",
            SplitKind::Train => "train",
        }
    }
}

impl fmt::Display for SplitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Create the output root, or make sure an existing one is empty.
///
/// A non-empty directory is never cleaned up automatically.
pub fn prepare_output_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| PrepError::io(path, e))?;
        return Ok(());
    }

    let mut entries = fs::read_dir(path).map_err(|e| PrepError::io(path, e))?;
    if entries.next().is_some() {
        return Err(PrepError::OutputNotEmpty(path.to_path_buf()));
    }
    Ok(())
}

pub fn create_split_dir(output_root: &Path, split: SplitKind) -> Result<PathBuf> {
    let dir = output_root.join(split.dir_name());
    fs::create_dir_all(&dir).map_err(|e| PrepError::io(&dir, e))?;
    Ok(dir)
}

/// File names of the regular files in `dir`, sorted.
pub fn list_clips(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| PrepError::io(dir, e))?;

    let mut clips = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PrepError::io(dir, e))?;
        let path = entry.path();
        let mut file_type = entry.file_type().map_err(|e| PrepError::io(&path, e))?;
        if file_type.is_symlink() {
            file_type = fs::metadata(&path).map_err(|e| PrepError::io(&path, e))?.file_type();
        }
        if file_type.is_file() {
            clips.push(entry.file_name().to_string_lossy().into_owned());
        } else {
            debug!(entry = %path.display(), "skipping non-file entry");
        }
    }

    clips.sort();
    Ok(clips)
}

/// `<stem>-<variant>.<ext>`, or `<stem>-<variant>` for clips without an extension.
pub fn variant_file_name(clip_name: &str, variant: &str) -> String {
    let path = Path::new(clip_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| clip_name.to_string());
    match path.extension() {
        Some(ext) => format!("{}-{}.{}", stem, variant, ext.to_string_lossy()),
        None => format!("{}-{}", stem, variant),
    }
}

/// Every file one clip's recipe touches inside its split directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub downsampled: PathBuf,
    pub center: PathBuf,
    pub gray: PathBuf,
    pub context: PathBuf,
    pub fovea: PathBuf,
}

impl ArtifactPaths {
    pub fn intermediates(&self) -> [&Path; 3] {
        [self.downsampled.as_path(), self.center.as_path(), self.gray.as_path()]
    }

    pub fn all(&self) -> [&Path; 5] {
        [
            self.downsampled.as_path(),
            self.center.as_path(),
            self.gray.as_path(),
            self.context.as_path(),
            self.fovea.as_path(),
        ]
    }
}

pub fn artifact_paths(split_dir: &Path, clip_name: &str) -> ArtifactPaths {
    ArtifactPaths {
        downsampled: split_dir.join(clip_name),
        center: split_dir.join(variant_file_name(clip_name, "center")),
        gray: split_dir.join(variant_file_name(clip_name, "gray")),
        context: split_dir.join(variant_file_name(clip_name, "context")),
        fovea: split_dir.join(variant_file_name(clip_name, "fovea")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_variant_file_name() {
        assert_eq!(variant_file_name("match01.mp4", "context"), "match01-context.mp4");
        assert_eq!(variant_file_name("round.2.avi", "fovea"), "round.2-fovea.avi");
        assert_eq!(variant_file_name("noext", "gray"), "noext-gray");
    }

    #[test]
    fn test_artifact_paths() {
        let paths = artifact_paths(Path::new("/out/train"), "a.mp4");
        assert_eq!(paths.downsampled, PathBuf::from("/out/train/a.mp4"));
        assert_eq!(paths.center, PathBuf::from("/out/train/a-center.mp4"));
        assert_eq!(paths.gray, PathBuf::from("/out/train/a-gray.mp4"));
        assert_eq!(paths.context, PathBuf::from("/out/train/a-context.mp4"));
        assert_eq!(paths.fovea, PathBuf::from("/out/train/a-fovea.mp4"));
    }

    #[test]
    fn test_prepare_output_dir() {
        let dir = tempdir().unwrap();
        let fresh = dir.path().join("processed");
        prepare_output_dir(&fresh).unwrap();
        assert!(fresh.is_dir());
        // empty and existing is fine
        prepare_output_dir(&fresh).unwrap();

        fs::write(fresh.join("leftover.mp4"), b"x").unwrap();
        assert!(matches!(prepare_output_dir(&fresh), Err(PrepError::OutputNotEmpty(_))));
        assert!(fresh.join("leftover.mp4").exists());
    }

    #[test]
    fn test_list_clips_skips_directories() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.mp4"), b"").unwrap();
        fs::write(dir.path().join("a.mp4"), b"").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        assert_eq!(list_clips(dir.path()).unwrap(), vec!["a.mp4", "b.mp4"]);
    }

    #[test]
    fn test_list_clips_reports_unreadable_dir() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("not_cheating");
        match list_clips(&missing) {
            Err(PrepError::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected an io error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_list_clips_does_not_drop_symlinked_files() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("real.mp4");
        fs::write(&target, b"").unwrap();
        let class_dir = dir.path().join("class");
        fs::create_dir(&class_dir).unwrap();
        fs::write(class_dir.join("b.mp4"), b"").unwrap();
        std::os::unix::fs::symlink(&target, class_dir.join("a.mp4")).unwrap();

        assert_eq!(list_clips(&class_dir).unwrap(), vec!["a.mp4", "b.mp4"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_list_clips_reports_dangling_symlink() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.mp4"), b"").unwrap();
        let dangling = dir.path().join("gone.mp4");
        std::os::unix::fs::symlink(dir.path().join("deleted.mp4"), &dangling).unwrap();

        match list_clips(dir.path()) {
            Err(PrepError::Io { path, .. }) => assert_eq!(path, dangling),
            other => panic!("expected an io error, got {:?}", other),
        }
    }
}
