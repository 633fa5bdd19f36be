use simulation::ElementId;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Which elements have been inspected, per step.
///
/// Progress is monotonic: ids are only ever added, and switching steps keeps
/// what was recorded. Ids are not validated against the model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgressTracker {
    steps: HashMap<String, SmallVec<[ElementId; 8]>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `element` for `step_id`. Returns `true` when it was not recorded yet.
    pub fn mark_inspected(&mut self, step_id: &str, element: ElementId) -> bool {
        let inspected = self.steps.entry(step_id.to_owned()).or_default();
        if inspected.contains(&element) {
            return false;
        }
        inspected.push(element);
        true
    }

    /// Number of distinct elements inspected on `step_id`.
    pub fn inspected_count(&self, step_id: &str) -> usize {
        self.steps.get(step_id).map_or(0, |inspected| inspected.len())
    }

    /// Inspected elements in discovery order.
    pub fn inspected(&self, step_id: &str) -> &[ElementId] {
        self.steps
            .get(step_id)
            .map_or(&[][..], |inspected| inspected.as_slice())
    }

    pub fn contains(&self, step_id: &str, element: &ElementId) -> bool {
        self.steps
            .get(step_id)
            .is_some_and(|inspected| inspected.contains(element))
    }

    /// Threshold check: `inspected_count >= required_count`.
    pub fn is_step_complete(&self, step_id: &str, required_count: usize) -> bool {
        self.inspected_count(step_id) >= required_count
    }

    /// Inspections recorded across every step.
    pub fn total_inspected(&self) -> usize {
        self.steps.values().map(|inspected| inspected.len()).sum()
    }
}
