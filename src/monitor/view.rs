//! Per-view controls the presentation layer feeds back into a monitor:
//! the visible row range and the live filter text.

/// Inclusive range of rows currently on screen, as indexes into the sorted
/// entity listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub first: usize,
    pub last: usize,
}

impl Viewport {
    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    pub fn contains(&self, row: usize) -> bool {
        row >= self.first && row <= self.last
    }
}

/// Controls a monitor reads at the start of each cycle. A missing viewport
/// means the view has not been measured yet and nothing counts as visible.
#[derive(Debug, Clone, Default)]
pub(crate) struct ViewControls {
    pub viewport: Option<Viewport>,
    pub filter: String,
}

/// Case-insensitive substring match. An empty filter admits everything.
pub fn matches_filter(name: &str, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    name.to_lowercase().contains(&filter.to_lowercase())
}
