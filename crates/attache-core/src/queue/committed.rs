//! Committed set: assets already persisted under the current parent.

use crate::domain::CommittedAsset;

/// Externally supplied assets plus the ones persisted this session.
///
/// Keyed by filename; order is first-seen order.
#[derive(Debug, Clone, Default)]
pub struct CommittedSet {
    assets: Vec<CommittedAsset>,
}

impl CommittedSet {
    pub fn new(initial: Vec<CommittedAsset>) -> Self {
        let mut set = Self::default();
        for asset in initial {
            set.insert(asset);
        }
        set
    }

    /// Insert or replace by filename. Returns the replaced asset.
    pub fn insert(&mut self, asset: CommittedAsset) -> Option<CommittedAsset> {
        match self.assets.iter_mut().find(|existing| existing.filename == asset.filename) {
            Some(existing) => Some(std::mem::replace(existing, asset)),
            None => {
                self.assets.push(asset);
                None
            }
        }
    }

    pub fn remove(&mut self, filename: &str) -> Option<CommittedAsset> {
        let index = self.assets.iter().position(|asset| asset.filename == filename)?;
        Some(self.assets.remove(index))
    }

    pub fn get(&self, filename: &str) -> Option<&CommittedAsset> {
        self.assets.iter().find(|asset| asset.filename == filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.get(filename).is_some()
    }

    pub fn list(&self) -> Vec<CommittedAsset> {
        self.assets.clone()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_unique() {
        let mut set = CommittedSet::new(vec![
            CommittedAsset::new("a.png", "image/png", 1),
            CommittedAsset::new("a.png", "image/png", 2),
        ]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a.png").unwrap().size, 2);

        assert!(set.insert(CommittedAsset::new("b.pdf", "application/pdf", 3)).is_none());
        let replaced = set.insert(CommittedAsset::new("a.png", "image/png", 4)).unwrap();
        assert_eq!(replaced.size, 2);
        let names: Vec<_> = set.list().into_iter().map(|a| a.filename).collect();
        assert_eq!(names, vec!["a.png", "b.pdf"]);
    }

    #[test]
    fn remove_by_filename() {
        let mut set = CommittedSet::new(vec![CommittedAsset::new("a.png", "image/png", 1)]);
        assert!(set.remove("missing").is_none());
        assert_eq!(set.remove("a.png").unwrap().filename, "a.png");
        assert!(set.is_empty());
    }
}
