use std::collections::HashMap;

/// Maps a trimmed display name to the row id assigned at insert time.
/// Later registrations under the same key overwrite earlier ones.
#[derive(Debug, Default)]
pub struct NameMap {
    entries: HashMap<String, i64>,
}

impl NameMap {
    pub fn register(&mut self, key: &str, id: i64) {
        let key = key.trim();
        if key.is_empty() {
            return;
        }
        self.entries.insert(key.to_owned(), id);
    }

    pub fn resolve(&self, key: &str) -> Option<i64> {
        self.entries.get(key.trim()).copied()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Per-run resolution state, built up stage by stage as inserts complete and
/// discarded when the run ends.
#[derive(Debug, Default)]
pub struct ResolutionMaps {
    pub courses: NameMap,
    pub units: NameMap,
    pub chunks: NameMap,
}
