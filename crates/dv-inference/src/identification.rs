//! Non-parametric identification of the average treatment effect.
//!
//! Two estimands are produced from the graph:
//!
//! - **back-door**: parents of the treatments that reach the outcome without
//!   going through a treatment
//! - **instrumental variables**: parents of the treatments whose only route
//!   to the outcome runs through a treatment and which share no cause with
//!   the outcome

use dv_core::{ColumnId, Error, Result};
use dv_data::{CausalGraph, GraphNode};
use serde::Serialize;

/// Variables selected for each identification strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentifiedEstimand {
    /// Treatment columns.
    pub treatments: Vec<ColumnId>,
    /// Outcome column.
    pub outcome: ColumnId,
    /// Back-door adjustment set (observed only).
    pub backdoor_variables: Vec<ColumnId>,
    /// Valid instruments.
    pub instrumental_variables: Vec<ColumnId>,
    /// Outcome causes that are not confounders.
    pub effect_modifiers: Vec<ColumnId>,
    /// Whether a latent node was dropped from the back-door set.
    pub backdoor_unobserved_dropped: bool,
}

impl IdentifiedEstimand {
    /// Whether an IV estimand exists.
    pub fn has_instruments(&self) -> bool {
        !self.instrumental_variables.is_empty()
    }
}

fn push_unique(out: &mut Vec<GraphNode>, node: &GraphNode) {
    if !out.contains(node) {
        out.push(node.clone());
    }
}

/// Identify the effect of `treatments` on `outcome` in `graph`.
///
/// `declared_instruments` are added to the IV set when the graph shows them
/// to be valid (they cause a treatment and reach the outcome only through it).
pub fn identify_effect(
    graph: &CausalGraph,
    treatments: &[ColumnId],
    outcome: ColumnId,
    declared_instruments: &[ColumnId],
    proceed_when_unidentifiable: bool,
) -> Result<IdentifiedEstimand> {
    if treatments.is_empty() {
        return Err(Error::Validation("at least one treatment is required".into()));
    }
    let t_nodes: Vec<GraphNode> = treatments.iter().map(|&t| GraphNode::Observed(t)).collect();
    let y_node = GraphNode::Observed(outcome);
    for node in t_nodes.iter().chain(std::iter::once(&y_node)) {
        if !graph.contains(node) {
            return Err(Error::Validation(format!("{} is not a node of the graph", node.name())));
        }
    }

    let reaches_outcome = |n: &GraphNode| graph.has_directed_path(n, &y_node, &t_nodes);

    let mut parents: Vec<GraphNode> = Vec::new();
    for t in &t_nodes {
        for p in graph.parents(t) {
            if !t_nodes.contains(p) {
                push_unique(&mut parents, p);
            }
        }
    }

    // Back-door set.
    let mut backdoor: Vec<GraphNode> = Vec::new();
    for p in parents.iter().filter(|&p| reaches_outcome(p)) {
        push_unique(&mut backdoor, p);
    }
    let latent: Vec<String> =
        backdoor.iter().filter(|n| !n.is_observed()).map(GraphNode::name).collect();
    let dropped = !latent.is_empty();
    if dropped {
        if !proceed_when_unidentifiable {
            return Err(Error::Identification(format!(
                "back-door set contains unobserved variables: {}",
                latent.join(", ")
            )));
        }
        tracing::warn!(
            latent = %latent.join(", "),
            "back-door set contains unobserved variables; proceeding without them"
        );
    }
    let backdoor_variables: Vec<ColumnId> = backdoor.iter().filter_map(GraphNode::column).collect();

    // Instruments: no route to the outcome except through a treatment, and no
    // cause in common with the outcome.
    let is_instrument = |z: &GraphNode| {
        z.is_observed()
            && !t_nodes.contains(z)
            && *z != y_node
            && t_nodes.iter().any(|t| graph.has_directed_path(z, t, &[]))
            && !reaches_outcome(z)
            && graph.parents(z).iter().all(|&q| !reaches_outcome(q))
    };
    let mut ivs: Vec<GraphNode> = Vec::new();
    for p in parents.iter().filter(|&p| is_instrument(p)) {
        push_unique(&mut ivs, p);
    }
    for &z in declared_instruments {
        let node = GraphNode::Observed(z);
        if ivs.contains(&node) {
            continue;
        }
        if graph.contains(&node) && is_instrument(&node) {
            ivs.push(node);
        } else {
            tracing::warn!(instrument = %z, "declared instrument is not valid in the graph; ignored");
        }
    }
    let instrumental_variables: Vec<ColumnId> = ivs.iter().filter_map(GraphNode::column).collect();

    // Effect modifiers: other observed causes of the outcome that do not
    // touch any treatment.
    let effect_modifiers: Vec<ColumnId> = graph
        .parents(&y_node)
        .into_iter()
        .filter(|p| {
            p.is_observed()
                && !t_nodes.contains(p)
                && !backdoor.contains(p)
                && !t_nodes.iter().any(|t| graph.has_directed_path(p, t, &[]))
        })
        .filter_map(GraphNode::column)
        .collect();

    tracing::debug!(
        backdoor = backdoor_variables.len(),
        instruments = instrumental_variables.len(),
        effect_modifiers = effect_modifiers.len(),
        "identified estimand"
    );

    Ok(IdentifiedEstimand {
        treatments: treatments.to_vec(),
        outcome,
        backdoor_variables,
        instrumental_variables,
        effect_modifiers,
        backdoor_unobserved_dropped: dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dv_core::VariableRole;

    fn ids(role: VariableRole, n: usize) -> Vec<ColumnId> {
        (0..n).map(|i| ColumnId::new(role, i)).collect()
    }

    fn graph(n_w: usize, n_z: usize, n_x: usize) -> CausalGraph {
        CausalGraph::from_roles(
            &ids(VariableRole::Treatment, 1),
            ColumnId::outcome(),
            &ids(VariableRole::CommonCause, n_w),
            &ids(VariableRole::Instrument, n_z),
            &ids(VariableRole::EffectModifier, n_x),
        )
    }

    #[test]
    fn test_standard_graph() {
        let g = graph(3, 2, 1);
        let e = identify_effect(&g, &ids(VariableRole::Treatment, 1), ColumnId::outcome(), &[], true)
            .unwrap();
        assert_eq!(e.backdoor_variables, ids(VariableRole::CommonCause, 3));
        assert_eq!(e.instrumental_variables, ids(VariableRole::Instrument, 2));
        assert_eq!(e.effect_modifiers, ids(VariableRole::EffectModifier, 1));
        assert!(e.backdoor_unobserved_dropped);
    }

    #[test]
    fn test_no_optional_groups() {
        let g = graph(0, 0, 0);
        let e = identify_effect(&g, &ids(VariableRole::Treatment, 1), ColumnId::outcome(), &[], true)
            .unwrap();
        assert!(e.backdoor_variables.is_empty());
        assert!(!e.has_instruments());
    }

    #[test]
    fn test_latent_confounder() {
        let g = graph(2, 1, 0);
        let t = ColumnId::new(VariableRole::Treatment, 0);
        let err = identify_effect(&g, &[t], ColumnId::outcome(), &[], false).unwrap_err();
        assert!(matches!(err, Error::Identification(ref m) if m.contains('U')));

        let e = identify_effect(&g, &[t], ColumnId::outcome(), &[], true).unwrap();
        assert!(e.backdoor_unobserved_dropped);
        assert_eq!(e.backdoor_variables, ids(VariableRole::CommonCause, 2));
        assert_eq!(e.instrumental_variables, ids(VariableRole::Instrument, 1));
    }

    #[test]
    fn test_fully_observed_graph_is_identifiable() {
        let t = ColumnId::new(VariableRole::Treatment, 0);
        let w0 = ColumnId::new(VariableRole::CommonCause, 0);
        let mut g = CausalGraph::new();
        g.add_edge(GraphNode::Observed(t), GraphNode::Observed(ColumnId::outcome()));
        g.add_edge(GraphNode::Observed(w0), GraphNode::Observed(t));
        g.add_edge(GraphNode::Observed(w0), GraphNode::Observed(ColumnId::outcome()));
        let e = identify_effect(&g, &[t], ColumnId::outcome(), &[], false).unwrap();
        assert_eq!(e.backdoor_variables, vec![w0]);
        assert!(!e.backdoor_unobserved_dropped);
    }

    #[test]
    fn test_confounded_instrument_rejected() {
        let mut g = graph(1, 2, 0);
        let z0 = ColumnId::new(VariableRole::Instrument, 0);
        g.add_latent_confounder("U", &[z0, ColumnId::outcome()]);
        let e = identify_effect(&g, &ids(VariableRole::Treatment, 1), ColumnId::outcome(), &[z0], true)
            .unwrap();
        assert_eq!(e.instrumental_variables, vec![ColumnId::new(VariableRole::Instrument, 1)]);
    }

    #[test]
    fn test_missing_treatment() {
        let g = graph(1, 0, 0);
        let t1 = ColumnId::new(VariableRole::Treatment, 1);
        assert!(identify_effect(&g, &[t1], ColumnId::outcome(), &[], true).is_err());
        assert!(identify_effect(&g, &[], ColumnId::outcome(), &[], true).is_err());
    }
}
