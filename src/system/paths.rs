//! Build output layout.
//!
//! Every manifest group renders into `<build_dir>/<group>`. A group directory
//! is owned by the task hydrating it and is wiped and recreated immediately
//! before each render, so stale manifests never survive a run.

use crate::error::{Result, TaskError};
use crate::models::ManifestGroup;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct BuildLayout {
    root: PathBuf,
}

impl BuildLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        BuildLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn group_dir(&self, group: ManifestGroup) -> PathBuf {
        self.root.join(group.dir_name())
    }

    /// Delete and recreate the directory of `group`, returning its path.
    pub fn reset_group(&self, group: ManifestGroup) -> Result<PathBuf> {
        let dir = self.group_dir(group);
        remove_dir_if_present(&dir)?;
        fs::create_dir_all(&dir).map_err(|e| {
            TaskError::Workspace(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        log::debug!("[Workspace] Reset {}", dir.display());
        Ok(dir)
    }

    /// Remove the whole build root. An absent root is not an error.
    pub fn clean(&self) -> Result<()> {
        remove_dir_if_present(&self.root)?;
        log::info!("[Workspace] Removed {}", self.root.display());
        Ok(())
    }

    /// Sorted `.yaml` files directly inside the directory of `group`.
    pub fn manifest_files(&self, group: ManifestGroup) -> Result<Vec<PathBuf>> {
        let dir = self.group_dir(group);
        let entries = fs::read_dir(&dir).map_err(|e| {
            TaskError::Workspace(format!(
                "Cannot read hydrated manifests in {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().map_or(false, |ext| ext == "yaml") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn remove_dir_if_present(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TaskError::Workspace(format!(
            "Failed to remove {}: {}",
            dir.display(),
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_group_removes_stale_files() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = BuildLayout::new(tmp.path().join(".build"));

        let dir = layout.reset_group(ManifestGroup::Cluster).unwrap();
        fs::write(dir.join("stale.yaml"), "kind: ConfigMap\n").unwrap();

        let dir = layout.reset_group(ManifestGroup::Cluster).unwrap();
        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = BuildLayout::new(tmp.path().join(".build"));
        layout.reset_group(ManifestGroup::KccIam).unwrap();

        layout.clean().unwrap();
        assert!(!layout.root().exists());
        layout.clean().unwrap();
    }

    #[test]
    fn test_manifest_files_sorted_yaml_only() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = BuildLayout::new(tmp.path());
        let dir = layout.reset_group(ManifestGroup::KccSystem).unwrap();
        for name in ["b.yaml", "a.yaml", "notes.txt"] {
            fs::write(dir.join(name), "").unwrap();
        }
        fs::create_dir(dir.join("nested.yaml")).unwrap();

        let files = layout.manifest_files(ManifestGroup::KccSystem).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.yaml", "b.yaml"]);
    }

    #[test]
    fn test_manifest_files_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = BuildLayout::new(tmp.path());
        assert!(layout.manifest_files(ManifestGroup::KccSystem).is_err());
    }
}
