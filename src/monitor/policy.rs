//! Fetch policy: bounds remote-call volume per cycle to roughly what the
//! operator can currently see, plus anything never yet resolved.

use crate::monitor::view::Viewport;

/// Whether the entity at `row` of the sorted listing gets a full fetch this
/// cycle. Entities outside the visible range keep their cached state, except
/// ones that have never been fetched at all. `None` for the viewport means
/// the view is unmeasured, so no row counts as visible.
pub fn should_fetch(row: usize, viewport: Option<Viewport>, fetched_before: bool) -> bool {
    if !fetched_before {
        return true;
    }
    viewport.is_some_and(|vp| vp.contains(row))
}
