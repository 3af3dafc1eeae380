use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use crate::error::ArtifactError;

use super::types::{normalize_path, Artifact, TargetId};

type ArtifactMap = BTreeMap<TargetId, BTreeMap<String, Artifact>>;

/// Build-wide registry of artifacts, keyed by producing target and artifact key.
///
/// Append-only: each (producer, key) pair is written at most once, by the
/// scheduler, when the producing target completes. Clones share the same
/// registry.
#[derive(Debug, Clone, Default)]
pub struct ArtifactCollector {
    inner: Arc<RwLock<ArtifactMap>>,
}

impl ArtifactCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, ArtifactMap> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn collect(&self, producer: &TargetId, artifact: Artifact) -> Result<(), ArtifactError> {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let slot = map.entry(producer.clone()).or_default();
        if slot.contains_key(&artifact.key) {
            return Err(ArtifactError::AlreadyCollected {
                producer: producer.to_string(),
                key: artifact.key,
            });
        }
        slot.insert(artifact.key.clone(), artifact);
        Ok(())
    }

    pub fn get(&self, producer: &TargetId, key: &str) -> Option<Artifact> {
        self.read()
            .get(producer)
            .and_then(|artifacts| artifacts.get(key))
            .cloned()
    }

    /// Look an artifact up by the directory of its producer.
    ///
    /// When several targets in `directory` produced `key`, the one with the
    /// smallest target name wins.
    pub fn get_by_key(&self, directory: &Path, key: &str) -> Option<Artifact> {
        let directory = normalize_path(directory);
        self.read()
            .iter()
            .filter(|(producer, _)| producer.path() == directory)
            .find_map(|(_, artifacts)| artifacts.get(key))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.read().values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_second_write_of_same_key() {
        let collector = ArtifactCollector::new();
        let producer = TargetId::new("/repo/svc", "build-images");

        collector
            .collect(&producer, Artifact::new("image", "svc:1"))
            .unwrap();
        let err = collector
            .collect(&producer, Artifact::new("image", "svc:2"))
            .unwrap_err();

        assert_eq!(
            err,
            ArtifactError::AlreadyCollected {
                producer: "/repo/svc:build-images".into(),
                key: "image".into()
            }
        );
        assert_eq!(collector.get(&producer, "image").unwrap().value, "svc:1");
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn same_key_from_different_producers_is_allowed() {
        let collector = ArtifactCollector::new();
        collector
            .collect(&TargetId::new("/r/a", "x"), Artifact::new("image", "a"))
            .unwrap();
        collector
            .collect(&TargetId::new("/r/b", "x"), Artifact::new("image", "b"))
            .unwrap();

        assert_eq!(
            collector.get_by_key(Path::new("/r/b/"), "image").unwrap().value,
            "b"
        );
        assert!(collector.get_by_key(Path::new("/r"), "image").is_none());
    }

    #[test]
    fn clones_share_state() {
        let collector = ArtifactCollector::new();
        let view = collector.clone();
        let producer = TargetId::new("/r", "a");
        collector
            .collect(&producer, Artifact::new("k", "v"))
            .unwrap();
        assert_eq!(view.get(&producer, "k"), Some(Artifact::new("k", "v")));
    }
}
