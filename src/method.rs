use std::cmp::Ordering;

/// One method record, constructed once from a source entry and immutable
/// thereafter. Ordered by sort key (title as tie-break) so a batch of
/// records forms the store's record sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// Bell count; identical across all records of one store.
    pub stage: u8,
    /// Original title text.
    pub title: String,
    /// Device-encoded title bytes, without terminator.
    pub device_title: Vec<u8>,
    /// Normalized ordering key derived from the title.
    pub sort_title: String,
    /// Notation words: one bit per bell position, 0 for a cross.
    pub notation: Vec<u16>,
    /// Rows until the lead-head permutation returns to rounds.
    pub lead_count: u16,
    /// Bitmask of bell positions fixed by the lead head.
    pub hunt_bells: u16,
}

impl PartialOrd for Method {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Method {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_title
            .cmp(&other.sort_title)
            .then_with(|| self.title.cmp(&other.title))
    }
}
