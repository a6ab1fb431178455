//! Visibility observation against the scrolled viewport.

use super::*;

/// Reveal progress of one animated element. The only transition is
/// `Unrevealed` to `Revealed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevealState {
    Unrevealed,
    Revealed,
}

/// One change in a target's intersection with the root.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IntersectionEntry {
    pub(crate) target: NodeId,
    pub(crate) bounding_rect: Rect,
    pub(crate) root_bounds: Rect,
    pub(crate) intersection_ratio: f64,
    pub(crate) is_intersecting: bool,
    pub(crate) time: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct IntersectionObserver {
    root_margin: RootMargin,
    // Last reported intersection; None until the first check.
    observed: Vec<(NodeId, Option<bool>)>,
}

impl IntersectionObserver {
    pub(crate) fn new(root_margin: RootMargin) -> Self {
        Self {
            root_margin,
            observed: Vec::new(),
        }
    }

    pub(crate) fn observe(&mut self, target: NodeId) {
        if !self.observed.iter().any(|(node, _)| *node == target) {
            self.observed.push((target, None));
        }
    }

    pub(crate) fn unobserve(&mut self, target: NodeId) {
        self.observed.retain(|(node, _)| *node != target);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// Entries for every target seen for the first time or whose intersection
    /// flipped since the last check, in observation order.
    pub(crate) fn check_intersections(
        &mut self,
        viewport: Rect,
        rect_of: impl Fn(NodeId) -> Rect,
        time: i64,
    ) -> Vec<IntersectionEntry> {
        let root = self.root_margin.apply(viewport);
        let mut entries = Vec::new();
        for (node, last) in &mut self.observed {
            let rect = rect_of(*node);
            let intersection = rect.intersect(&root);
            let is_intersecting = intersection.is_some();
            if *last == Some(is_intersecting) {
                continue;
            }
            *last = Some(is_intersecting);

            let intersection_ratio = match intersection {
                Some(hit) if rect.area() > 0.0 => hit.area() / rect.area(),
                Some(_) => 1.0,
                None => 0.0,
            };
            entries.push(IntersectionEntry {
                target: *node,
                bounding_rect: rect,
                root_bounds: root,
                intersection_ratio,
                is_intersecting,
                time,
            });
        }
        entries
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RevealTracker {
    pub(crate) states: HashMap<NodeId, RevealState>,
    pub(crate) observer: Option<IntersectionObserver>,
}

impl RevealTracker {
    pub(crate) fn has_observed_targets(&self) -> bool {
        self.observer
            .as_ref()
            .is_some_and(|observer| !observer.is_empty())
    }

    pub(crate) fn state(&self, node: NodeId) -> Option<RevealState> {
        self.states.get(&node).copied()
    }

    /// Returns `true` only on the transition.
    pub(crate) fn mark_revealed(&mut self, node: NodeId) -> bool {
        let previous = self.states.insert(node, RevealState::Revealed);
        if let Some(observer) = self.observer.as_mut() {
            observer.unobserve(node);
        }
        previous != Some(RevealState::Revealed)
    }
}
