//! Group nodes: visual containers on the canvas
//!
//! A group is a node variant with no ports; it does not participate in
//! data propagation. Membership is geometric: a node belongs to the group
//! whose rectangle contains its position. Moving a group drags its
//! members along.

use crate::node_data::NodeData;
use crate::types::{GraphNode, NodeId, Position, WorkflowGraph};

/// Fallback size for a group node with no explicit style
const DEFAULT_GROUP_SIZE: (f64, f64) = (400.0, 300.0);

/// Axis-aligned rectangle on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Whether a point lies inside (inclusive)
    pub fn contains(&self, position: Position) -> bool {
        position.x >= self.min_x
            && position.x <= self.max_x
            && position.y >= self.min_y
            && position.y <= self.max_y
    }
}

/// Whether a node is a group container
pub fn is_group(node: &GraphNode) -> bool {
    matches!(node.data, NodeData::Group(_))
}

/// The rectangle a group node covers
pub fn group_bounds(group: &GraphNode) -> Bounds {
    let (width, height) = group
        .style
        .map(|s| (s.width, s.height))
        .unwrap_or(DEFAULT_GROUP_SIZE);
    Bounds {
        min_x: group.position.x,
        min_y: group.position.y,
        max_x: group.position.x + width,
        max_y: group.position.y + height,
    }
}

/// Ids of the non-group nodes visually nested inside a group
pub fn members_of(graph: &WorkflowGraph, group_id: &str) -> Vec<NodeId> {
    let Some(group) = graph.find_node(group_id).filter(|n| is_group(n)) else {
        return Vec::new();
    };
    let bounds = group_bounds(group);
    graph
        .nodes
        .iter()
        .filter(|n| n.id != group_id && !is_group(n) && bounds.contains(n.position))
        .map(|n| n.id.clone())
        .collect()
}

/// Move a group to a new position, translating its members by the same
/// delta. Returns whether anything moved.
pub fn move_group(graph: &mut WorkflowGraph, group_id: &str, position: Position) -> bool {
    let members = members_of(graph, group_id);
    let Some(group) = graph.find_node_mut(group_id) else {
        return false;
    };
    let dx = position.x - group.position.x;
    let dy = position.y - group.position.y;
    if dx == 0.0 && dy == 0.0 {
        return false;
    }
    group.position = position;

    for id in members {
        if let Some(node) = graph.find_node_mut(&id) {
            node.position.x += dx;
            node.position.y += dy;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;

    fn grouped_graph() -> WorkflowGraph {
        GraphBuilder::new()
            .group("grp", "Moodboard", (0.0, 0.0), (500.0, 400.0))
            .image_upload("inside", "img://a.png", (100.0, 100.0))
            .image_upload("outside", "img://b.png", (900.0, 100.0))
            .build()
    }

    #[test]
    fn test_members_by_containment() {
        let graph = grouped_graph();
        assert_eq!(members_of(&graph, "grp"), vec!["inside".to_string()]);
    }

    #[test]
    fn test_members_of_non_group_is_empty() {
        let graph = grouped_graph();
        assert!(members_of(&graph, "inside").is_empty());
        assert!(members_of(&graph, "missing").is_empty());
    }

    #[test]
    fn test_groups_do_not_nest_as_members() {
        let graph = GraphBuilder::new()
            .group("outer", "Outer", (0.0, 0.0), (1000.0, 800.0))
            .group("inner", "Inner", (100.0, 100.0), (200.0, 200.0))
            .build();
        assert!(members_of(&graph, "outer").is_empty());
    }

    #[test]
    fn test_move_group_translates_members() {
        let mut graph = grouped_graph();
        assert!(move_group(&mut graph, "grp", Position::new(50.0, 25.0)));

        let inside = graph.find_node("inside").unwrap();
        assert_eq!(inside.position, Position::new(150.0, 125.0));
        // Nodes outside the group stay put.
        let outside = graph.find_node("outside").unwrap();
        assert_eq!(outside.position, Position::new(900.0, 100.0));
    }

    #[test]
    fn test_move_group_noop_for_same_position() {
        let mut graph = grouped_graph();
        assert!(!move_group(&mut graph, "grp", Position::new(0.0, 0.0)));
    }
}
