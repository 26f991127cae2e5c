use std::collections::HashSet;

/// Match ids whose detail fetch has already been attempted in this run.
#[derive(Debug, Default)]
pub struct DedupStore {
    processed: HashSet<String>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeded from ids that an earlier run already persisted.
    pub fn seeded<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            processed: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn should_process(&self, match_id: &str) -> bool {
        !match_id.is_empty() && !self.processed.contains(match_id)
    }

    /// Returns `false` if the id was already marked.
    pub fn mark_processed(&mut self, match_id: &str) -> bool {
        self.processed.insert(match_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}
