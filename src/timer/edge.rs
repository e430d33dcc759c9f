use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttentionEdge {
    /// focused -> not focused; starts a distraction episode.
    Lost,
    /// not focused -> focused; ends the episode.
    Regained,
}

/// Turns a per-second attention level into edges. Shared by both timer modes
/// so a distraction episode is counted the same way everywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeDetector {
    last: Option<bool>,
}

impl EdgeDetector {
    pub fn observe(&mut self, focused: bool) -> Option<AttentionEdge> {
        let edge = match (self.last, focused) {
            (Some(true), false) => Some(AttentionEdge::Lost),
            (Some(false), true) => Some(AttentionEdge::Regained),
            _ => None,
        };
        self.last = Some(focused);
        edge
    }

    /// Forget the last level; the next observation never produces an edge.
    pub fn clear(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_is_never_an_edge() {
        let mut edges = EdgeDetector::default();
        assert_eq!(edges.observe(false), None);
        let mut edges = EdgeDetector::default();
        assert_eq!(edges.observe(true), None);
    }

    #[test]
    fn one_edge_per_episode() {
        let mut edges = EdgeDetector::default();
        let seen: Vec<_> = [true, false, false, false, true, true, false]
            .into_iter()
            .map(|focused| edges.observe(focused))
            .collect();
        assert_eq!(
            seen,
            vec![
                None,
                Some(AttentionEdge::Lost),
                None,
                None,
                Some(AttentionEdge::Regained),
                None,
                Some(AttentionEdge::Lost),
            ]
        );
    }

    #[test]
    fn clear_suppresses_the_next_edge() {
        let mut edges = EdgeDetector::default();
        edges.observe(true);
        edges.clear();
        assert_eq!(edges.observe(false), None);
    }
}
