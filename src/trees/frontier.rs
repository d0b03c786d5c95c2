//! Work list of nodes waiting to be expanded.

/// A pending node: the slice `[start, end)` of the sample permutation routed to it and
/// the leaf estimate to use if it ends up terminal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrontierEntry {
    pub start: usize,
    pub end: usize,
    pub is_left: bool,
    pub depth: usize,
    pub weight: f64,
    pub parent: usize,
    pub value: f64,
}

impl FrontierEntry {
    pub fn n_samples(&self) -> usize {
        self.end - self.start
    }
}

/// LIFO stack of pending nodes, so the tree is expanded depth first.
#[derive(Debug, Default)]
pub struct Frontier {
    entries: Vec<FrontierEntry>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: FrontierEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
