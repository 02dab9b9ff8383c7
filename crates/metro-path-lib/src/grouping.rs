//! Partitioning of a computed path into line-homogeneous segments

use crate::{Edge, Segment};

/// Group an ordered edge list into segments
///
/// An edge joins the open segment only when both carry the same non-empty
/// line identifier. Edges without a line (walking transfers) always form a
/// segment of their own, even when the previous edge was also a walk.
///
/// Concatenating the edges of the returned segments reproduces `edges`
/// exactly. An empty input yields no segments.
pub fn group_path(edges: &[Edge]) -> Vec<Segment> {
    #[cfg(feature = "profiling")]
    profiling::scope!("grouping::group_path");

    let mut segments: Vec<Segment> = Vec::new();

    for edge in edges {
        let joins_open_segment = match (edge.line(), segments.last()) {
            (Some(line), Some(open)) => open.line_id() == Some(line),
            _ => false,
        };

        match segments.last_mut() {
            Some(open) if joins_open_segment => open.push(edge.clone()),
            _ => segments.push(Segment::starting_with(edge.clone())),
        }
    }

    tracing::trace!(
        "Grouped {} edges into {} segments",
        edges.len(),
        segments.len()
    );

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Stop;

    fn stop(name: &str, offset: f64) -> Stop {
        Stop::new(name, 48.85 + offset, 2.35 + offset)
    }

    fn ride(from: &str, to: &str, weight: u32, line: &str) -> Edge {
        Edge::new(stop(from, 0.0), stop(to, 0.01), weight).on_line(line, "Terminus")
    }

    fn walk(from: &str, to: &str, weight: u32) -> Edge {
        Edge::new(stop(from, 0.0), stop(to, 0.01), weight)
    }

    fn flatten(segments: &[Segment]) -> Vec<Edge> {
        segments
            .iter()
            .flat_map(|segment| segment.edges().iter().cloned())
            .collect()
    }

    #[test]
    fn test_empty_path() {
        assert!(group_path(&[]).is_empty());
    }

    #[test]
    fn test_same_line_merges() {
        let edges = vec![ride("A", "B", 10, "14"), ride("B", "C", 20, "14")];
        let segments = group_path(&edges);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].line_id(), Some("14"));
        assert_eq!(segments[0].edges().len(), 2);
    }

    #[test]
    fn test_line_change_splits() {
        let edges = vec![
            ride("A", "B", 10, "1"),
            ride("B", "C", 20, "1"),
            ride("C", "D", 30, "4"),
        ];
        let segments = group_path(&edges);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].edges().len(), 2);
        assert_eq!(segments[1].line_id(), Some("4"));
    }

    #[test]
    fn test_consecutive_walks_stay_separate() {
        let edges = vec![walk("A", "B", 10), walk("B", "C", 20)];
        let segments = group_path(&edges);

        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|segment| segment.is_walking()));
        assert!(segments.iter().all(|segment| segment.edges().len() == 1));
    }

    #[test]
    fn test_walk_between_same_line_rides_splits() {
        let edges = vec![
            ride("A", "B", 10, "7"),
            walk("B", "B'", 15),
            ride("B'", "C", 30, "7"),
        ];
        let segments = group_path(&edges);

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].line_id(), Some("7"));
        assert!(segments[1].is_walking());
        assert_eq!(segments[2].line_id(), Some("7"));
    }

    #[test]
    fn test_branch_lines_do_not_merge() {
        let edges = vec![ride("A", "B", 10, "3"), ride("B", "C", 20, "3B")];
        assert_eq!(group_path(&edges).len(), 2);
    }

    #[test]
    fn test_empty_line_id_treated_as_walk() {
        let mut first = ride("A", "B", 10, "2");
        first.line_id = Some(String::new());
        let mut second = ride("B", "C", 20, "2");
        second.line_id = Some(String::new());

        let segments = group_path(&[first, second]);
        assert_eq!(segments.len(), 2);
        assert!(segments[0].is_walking());
    }

    #[test]
    fn test_concatenation_reproduces_input() {
        let edges = vec![
            walk("Home", "A", 100),
            ride("A", "B", 200, "1"),
            ride("B", "C", 300, "1"),
            walk("C", "C'", 350),
            walk("C'", "C''", 400),
            ride("C''", "D", 500, "12"),
            ride("D", "E", 600, "13"),
            ride("E", "F", 700, "13"),
        ];
        let segments = group_path(&edges);

        assert_eq!(flatten(&segments), edges);
        assert_eq!(segments.len(), 6);
    }

    #[test]
    fn test_terminus_taken_from_first_edge() {
        let first = Edge::new(stop("A", 0.0), stop("B", 0.01), 10).on_line("14", "Olympiades");
        let second = Edge::new(stop("B", 0.0), stop("C", 0.01), 20).on_line("14", "Other");
        let segments = group_path(&[first, second]);
        assert_eq!(segments[0].terminus(), Some("Olympiades"));
    }
}
