//! Directed causal graph over the dataset columns plus latent confounders.
//!
//! Generated datasets always carry a latent `U` pointing into the outcome and
//! every treatment, so their back-door estimand is only identifiable after
//! dropping it.

use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;

use dv_core::{ColumnId, Error, Result};

/// Name of the latent confounder added by [`CausalGraph::from_roles`].
pub const LATENT_CONFOUNDER: &str = "U";

/// Label written for latent nodes in the DOT and GML encodings.
pub const LATENT_LABEL: &str = "Unobserved Confounders";

/// A node of the causal graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphNode {
    /// A column present in the data.
    Observed(ColumnId),
    /// A variable assumed to exist but never measured.
    Latent(String),
}

impl GraphNode {
    /// Display name used by the textual encodings.
    pub fn name(&self) -> String {
        match self {
            GraphNode::Observed(id) => id.name(),
            GraphNode::Latent(name) => name.clone(),
        }
    }

    /// Whether the node is measured.
    pub fn is_observed(&self) -> bool {
        matches!(self, GraphNode::Observed(_))
    }

    /// Column id for observed nodes.
    pub fn column(&self) -> Option<ColumnId> {
        match self {
            GraphNode::Observed(id) => Some(*id),
            GraphNode::Latent(_) => None,
        }
    }
}

/// Directed causal graph.
///
/// Nodes keep insertion order and edges keep insertion order, so the DOT and
/// GML encodings are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CausalGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<(usize, usize)>,
}

impl CausalGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard graph for a linear dataset:
    /// `U -> y`, then per treatment `v -> y`, `U -> v`, `W -> v`, `Z -> v`,
    /// then `W -> y`, `X -> y`.
    pub fn from_roles(
        treatments: &[ColumnId],
        outcome: ColumnId,
        common_causes: &[ColumnId],
        instruments: &[ColumnId],
        effect_modifiers: &[ColumnId],
    ) -> Self {
        let u = GraphNode::Latent(LATENT_CONFOUNDER.to_string());
        let mut g = Self::new();
        g.add_node(GraphNode::Observed(outcome));
        for &id in common_causes.iter().chain(instruments).chain(effect_modifiers) {
            g.add_node(GraphNode::Observed(id));
        }
        g.add_edge(u.clone(), GraphNode::Observed(outcome));
        for &t in treatments {
            g.add_edge(GraphNode::Observed(t), GraphNode::Observed(outcome));
            g.add_edge(u.clone(), GraphNode::Observed(t));
            for &v in common_causes.iter().chain(instruments) {
                g.add_edge(GraphNode::Observed(v), GraphNode::Observed(t));
            }
        }
        for &v in common_causes.iter().chain(effect_modifiers) {
            g.add_edge(GraphNode::Observed(v), GraphNode::Observed(outcome));
        }
        g
    }

    /// Add a node if absent; returns its index.
    pub fn add_node(&mut self, node: GraphNode) -> usize {
        if let Some(i) = self.index_of(&node) {
            return i;
        }
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Add an edge, inserting either endpoint if needed. Duplicate edges are ignored.
    pub fn add_edge(&mut self, from: GraphNode, to: GraphNode) {
        let a = self.add_node(from);
        let b = self.add_node(to);
        if !self.edges.contains(&(a, b)) {
            self.edges.push((a, b));
        }
    }

    /// Add a latent confounder pointing into every listed node.
    pub fn add_latent_confounder(&mut self, name: &str, targets: &[ColumnId]) {
        for &t in targets {
            self.add_edge(GraphNode::Latent(name.to_string()), GraphNode::Observed(t));
        }
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Edges as node pairs, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&GraphNode, &GraphNode)> + '_ {
        self.edges.iter().map(|&(a, b)| (&self.nodes[a], &self.nodes[b]))
    }

    /// Number of edges.
    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph contains `node`.
    pub fn contains(&self, node: &GraphNode) -> bool {
        self.index_of(node).is_some()
    }

    /// Direct causes of `node`.
    pub fn parents(&self, node: &GraphNode) -> Vec<&GraphNode> {
        match self.index_of(node) {
            Some(i) => self.edges.iter().filter(|e| e.1 == i).map(|e| &self.nodes[e.0]).collect(),
            None => Vec::new(),
        }
    }

    /// Direct effects of `node`.
    pub fn children(&self, node: &GraphNode) -> Vec<&GraphNode> {
        match self.index_of(node) {
            Some(i) => self.edges.iter().filter(|e| e.0 == i).map(|e| &self.nodes[e.1]).collect(),
            None => Vec::new(),
        }
    }

    /// Whether a directed path `from -> ... -> to` exists that does not pass
    /// through any node in `blocked` (endpoints excluded from the check).
    pub fn has_directed_path(&self, from: &GraphNode, to: &GraphNode, blocked: &[GraphNode]) -> bool {
        let (Some(src), Some(dst)) = (self.index_of(from), self.index_of(to)) else {
            return false;
        };
        let blocked: Vec<usize> = blocked.iter().filter_map(|b| self.index_of(b)).collect();
        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([src]);
        seen[src] = true;
        while let Some(cur) = queue.pop_front() {
            for &(a, b) in &self.edges {
                if a != cur || seen[b] {
                    continue;
                }
                if b == dst {
                    return true;
                }
                if blocked.contains(&b) {
                    continue;
                }
                seen[b] = true;
                queue.push_back(b);
            }
        }
        false
    }

    /// Check that every observed node is one of `columns`.
    pub fn validate_against(&self, columns: &[ColumnId]) -> Result<()> {
        for node in &self.nodes {
            if let GraphNode::Observed(id) = node {
                if !columns.contains(id) {
                    return Err(Error::Validation(format!(
                        "graph node {id} has no matching column in the data"
                    )));
                }
            }
        }
        Ok(())
    }

    /// DOT encoding, e.g. `digraph {U[label="Unobserved Confounders" observed="no"]; U->y; v0->y; ...}`.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph {");
        for node in self.nodes.iter().filter(|n| !n.is_observed()) {
            let _ = write!(out, "{}[label=\"{LATENT_LABEL}\" observed=\"no\"]; ", node.name());
        }
        let edges: Vec<String> =
            self.edges().map(|(a, b)| format!("{}->{};", a.name(), b.name())).collect();
        out.push_str(&edges.join(" "));
        out.push('}');
        out
    }

    /// GML encoding with one `node[...]` per node followed by `edge[...]` entries.
    pub fn to_gml(&self) -> String {
        let mut out = String::from("graph[directed 1 ");
        for node in &self.nodes {
            let name = node.name();
            if node.is_observed() {
                let _ = write!(out, "node[ id \"{name}\" label \"{name}\"] ");
            } else {
                let _ = write!(out, "node[ id \"{name}\" label \"{LATENT_LABEL}\" observed \"no\"] ");
            }
        }
        for (a, b) in self.edges() {
            let _ = write!(out, "edge[ source \"{}\" target \"{}\"] ", a.name(), b.name());
        }
        out.push(']');
        out
    }

    fn index_of(&self, node: &GraphNode) -> Option<usize> {
        self.nodes.iter().position(|n| n == node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dv_core::VariableRole;

    fn ids(role: VariableRole, n: usize) -> Vec<ColumnId> {
        (0..n).map(|i| ColumnId::new(role, i)).collect()
    }

    fn standard() -> CausalGraph {
        CausalGraph::from_roles(
            &ids(VariableRole::Treatment, 1),
            ColumnId::outcome(),
            &ids(VariableRole::CommonCause, 2),
            &ids(VariableRole::Instrument, 1),
            &[],
        )
    }

    #[test]
    fn test_from_roles_edges() {
        let g = standard();
        // U->y, v0->y, U->v0, W0->v0, W1->v0, Z0->v0, W0->y, W1->y
        assert_eq!(g.n_edges(), 8);
        let t = GraphNode::Observed(ColumnId::new(VariableRole::Treatment, 0));
        let parents: Vec<String> = g.parents(&t).iter().map(|n| n.name()).collect();
        assert_eq!(parents, vec!["U", "W0", "W1", "Z0"]);
        let y = GraphNode::Observed(ColumnId::outcome());
        let latent: Vec<&GraphNode> = g.parents(&y).into_iter().filter(|n| !n.is_observed()).collect();
        assert_eq!(latent, vec![&GraphNode::Latent(LATENT_CONFOUNDER.into())]);
        let children: Vec<String> = g.children(&t).iter().map(|n| n.name()).collect();
        assert_eq!(children, vec!["y"]);
    }

    #[test]
    fn test_directed_paths() {
        let g = standard();
        let z = GraphNode::Observed(ColumnId::new(VariableRole::Instrument, 0));
        let w = GraphNode::Observed(ColumnId::new(VariableRole::CommonCause, 0));
        let t = GraphNode::Observed(ColumnId::new(VariableRole::Treatment, 0));
        let y = GraphNode::Observed(ColumnId::outcome());
        assert!(g.has_directed_path(&z, &y, &[]));
        assert!(!g.has_directed_path(&z, &y, std::slice::from_ref(&t)));
        assert!(g.has_directed_path(&w, &y, std::slice::from_ref(&t)));
        assert!(!g.has_directed_path(&y, &t, &[]));
    }

    #[test]
    fn test_encodings_agree() {
        let g = standard();
        let dot = g.to_dot();
        let gml = g.to_gml();
        assert!(dot.starts_with("digraph {") && dot.ends_with('}'));
        assert!(gml.starts_with("graph[directed 1") && gml.ends_with(']'));
        for (a, b) in g.edges() {
            assert!(dot.contains(&format!("{}->{};", a.name(), b.name())));
            assert!(gml.contains(&format!("edge[ source \"{}\" target \"{}\"]", a.name(), b.name())));
        }
        for n in g.nodes() {
            assert!(gml.contains(&format!("node[ id \"{}\"", n.name())));
        }
    }

    #[test]
    fn test_latent_confounder_encoding() {
        let g = standard();
        let dot = g.to_dot();
        assert!(dot.starts_with("digraph {U[label=\"Unobserved Confounders\" observed=\"no\"]; U->y;"));
        assert!(dot.contains("U->v0;"));
        assert!(g.to_gml().contains(r#"node[ id "U" label "Unobserved Confounders" observed "no"]"#));
        assert!(g.to_gml().contains(r#"edge[ source "U" target "v0"]"#));
    }

    #[test]
    fn test_latent_nodes_skip_column_check() {
        let mut g = standard();
        g.add_latent_confounder("U2", &[ColumnId::new(VariableRole::Instrument, 0)]);
        let columns: Vec<ColumnId> = g.nodes().iter().filter_map(GraphNode::column).collect();
        assert_eq!(columns.len(), 5);
        assert!(g.validate_against(&columns).is_ok());
        assert!(g.validate_against(&[]).is_err());
    }
}
