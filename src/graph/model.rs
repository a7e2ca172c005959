// Diagram graph model
//
// Nodes are classes, edges are references and inheritance relations.
// Storage is a petgraph DiGraph so node and edge ids are stable indices.

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

/// Identifier of a diagram node
pub type NodeId = NodeIndex;

/// Identifier of a diagram edge
pub type EdgeId = EdgeIndex;

/// A class box in the diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub label: String,
    pub is_abstract: bool,
    /// Defined in a foreign metamodel (dashed border)
    pub external: bool,
    /// Attribute lines in feature order
    pub attributes: Vec<String>,
    /// Written to the description field
    pub description: Option<String>,
}

impl GraphNode {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            is_abstract: false,
            external: false,
            attributes: Vec::new(),
            description: None,
        }
    }
}

/// Kind of relation an edge stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Reference,
    Containment,
    Inheritance,
}

/// Arrow marker at one end of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowHead {
    None,
    Plain,
    Diamond,
    WhiteDelta,
}

impl ArrowHead {
    /// Arrow name understood by yEd
    pub fn as_str(&self) -> &'static str {
        match self {
            ArrowHead::None => "none",
            ArrowHead::Plain => "plain",
            ArrowHead::Diamond => "diamond",
            ArrowHead::WhiteDelta => "white_delta",
        }
    }
}

/// Feature name and multiplicity shown at one end of an edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndLabel {
    pub name: String,
    pub multiplicity: String,
}

impl EndLabel {
    pub fn new(name: &str, multiplicity: &str) -> Self {
        Self {
            name: name.to_string(),
            multiplicity: multiplicity.to_string(),
        }
    }
}

/// A relation between two class boxes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub kind: RelationKind,
    pub source_arrow: ArrowHead,
    pub target_arrow: ArrowHead,
    /// Label near the target end
    pub target_label: Option<EndLabel>,
    /// Label near the source end, only set for merged opposite pairs
    pub source_label: Option<EndLabel>,
}

impl GraphEdge {
    /// Reference edge; containment puts a diamond at the source
    pub fn reference(containment: bool, label: EndLabel) -> Self {
        let (kind, source_arrow, target_arrow) = if containment {
            (RelationKind::Containment, ArrowHead::Diamond, ArrowHead::None)
        } else {
            (RelationKind::Reference, ArrowHead::None, ArrowHead::Plain)
        };
        Self {
            kind,
            source_arrow,
            target_arrow,
            target_label: Some(label),
            source_label: None,
        }
    }

    /// Inheritance edge from subclass to supertype
    pub fn inheritance() -> Self {
        Self {
            kind: RelationKind::Inheritance,
            source_arrow: ArrowHead::None,
            target_arrow: ArrowHead::WhiteDelta,
            target_label: None,
            source_label: None,
        }
    }

    pub fn with_source_label(mut self, label: EndLabel) -> Self {
        self.source_label = Some(label);
        self
    }
}

/// Textual id of a node (`n0`, `n1`, ...)
pub fn node_key(id: NodeId) -> String {
    format!("n{}", id.index())
}

/// Textual id of an edge (`e0`, `e1`, ...)
pub fn edge_key(id: EdgeId) -> String {
    format!("e{}", id.index())
}

/// Statistics about a diagram graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub external_nodes: usize,
    pub reference_edges: usize,
    pub containment_edges: usize,
    pub inheritance_edges: usize,
    pub attribute_lines: usize,
}

impl GraphStats {
    pub fn edges(&self) -> usize {
        self.reference_edges + self.containment_edges + self.inheritance_edges
    }
}

/// The diagram graph
#[derive(Debug, Clone, Default)]
pub struct DiagramGraph {
    graph: DiGraph<GraphNode, GraphEdge>,
}

impl DiagramGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: GraphNode) -> NodeId {
        self.graph.add_node(node)
    }

    pub fn add_edge(&mut self, source: NodeId, target: NodeId, edge: GraphEdge) -> EdgeId {
        self.graph.add_edge(source, target, edge)
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.graph.node_weight(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        self.graph.node_weight_mut(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&GraphEdge> {
        self.graph.edge_weight(id)
    }

    /// Source and target of an edge
    pub fn endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        self.graph.edge_endpoints(id)
    }

    /// All nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &GraphNode)> {
        self.graph
            .node_indices()
            .filter_map(move |id| self.graph.node_weight(id).map(|n| (id, n)))
    }

    /// All edges in creation order as (id, source, target, edge)
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, NodeId, NodeId, &GraphEdge)> {
        self.graph
            .edge_references()
            .map(|e| (e.id(), e.source(), e.target(), e.weight()))
    }

    /// Edges between two nodes in either direction
    pub fn edges_between(&self, a: NodeId, b: NodeId) -> Vec<EdgeId> {
        self.edges()
            .filter(|(_, s, t, _)| (*s == a && *t == b) || (*s == b && *t == a))
            .map(|(id, ..)| id)
            .collect()
    }

    /// First node with the given label
    pub fn find_node(&self, label: &str) -> Option<NodeId> {
        self.nodes().find(|(_, n)| n.label == label).map(|(id, _)| id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            nodes: self.node_count(),
            ..Default::default()
        };
        for (_, node) in self.nodes() {
            if node.external {
                stats.external_nodes += 1;
            }
            stats.attribute_lines += node.attributes.len();
        }
        for (.., edge) in self.edges() {
            match edge.kind {
                RelationKind::Reference => stats.reference_edges += 1,
                RelationKind::Containment => stats.containment_edges += 1,
                RelationKind::Inheritance => stats.inheritance_edges += 1,
            }
        }
        stats
    }

    /// Serializable view of the graph
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self
                .nodes()
                .map(|(id, node)| NodeRecord {
                    id: node_key(id),
                    node: node.clone(),
                })
                .collect(),
            edges: self
                .edges()
                .map(|(id, source, target, edge)| EdgeRecord {
                    id: edge_key(id),
                    source: node_key(source),
                    target: node_key(target),
                    edge: edge.clone(),
                })
                .collect(),
        }
    }
}

/// Node with its textual id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(flatten)]
    pub node: GraphNode,
}

/// Edge with its textual ids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub edge: GraphEdge,
}

/// Plain node/edge lists for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}
