//! Causal model: a data table, a causal graph and the treatment/outcome roles.

use dv_core::{ColumnId, Error, Result};
use dv_data::{CausalGraph, ColumnData, SyntheticDataset, Table};

use crate::estimators::{self, CausalEstimate, EstimationData, EstimatorMethod};
use crate::identification::{self, IdentifiedEstimand};

/// Data + graph + roles, ready for identification and estimation.
#[derive(Debug, Clone)]
pub struct CausalModel<'a> {
    table: &'a Table,
    graph: &'a CausalGraph,
    treatments: Vec<ColumnId>,
    outcome: ColumnId,
    instruments: Vec<ColumnId>,
    proceed_when_unidentifiable: bool,
}

impl<'a> CausalModel<'a> {
    /// Build a model, checking that every role and observed graph node is a table column.
    pub fn new(
        table: &'a Table,
        treatments: &[ColumnId],
        outcome: ColumnId,
        graph: &'a CausalGraph,
        instruments: &[ColumnId],
        proceed_when_unidentifiable: bool,
    ) -> Result<Self> {
        if treatments.is_empty() {
            return Err(Error::Validation("at least one treatment is required".into()));
        }
        for &id in treatments.iter().chain(std::iter::once(&outcome)).chain(instruments) {
            if !table.contains(id) {
                return Err(Error::Validation(format!("column {id} not in data")));
            }
        }
        if treatments.contains(&outcome) {
            return Err(Error::Validation(format!("{outcome} is both treatment and outcome")));
        }
        graph.validate_against(&table.column_ids())?;
        Ok(Self {
            table,
            graph,
            treatments: treatments.to_vec(),
            outcome,
            instruments: instruments.to_vec(),
            proceed_when_unidentifiable,
        })
    }

    /// Model over a generated dataset, using its graph and declared instruments.
    pub fn from_dataset(ds: &'a SyntheticDataset, proceed_when_unidentifiable: bool) -> Result<Self> {
        Self::new(
            &ds.table,
            &ds.treatments,
            ds.outcome,
            &ds.graph,
            &ds.instruments,
            proceed_when_unidentifiable,
        )
    }

    /// Treatment columns.
    pub fn treatments(&self) -> &[ColumnId] {
        &self.treatments
    }

    /// Outcome column.
    pub fn outcome(&self) -> ColumnId {
        self.outcome
    }

    /// Identify back-door and IV estimands.
    pub fn identify_effect(&self) -> Result<IdentifiedEstimand> {
        identification::identify_effect(
            self.graph,
            &self.treatments,
            self.outcome,
            &self.instruments,
            self.proceed_when_unidentifiable,
        )
    }

    /// Estimate the ATE with `method` under `estimand`.
    pub fn estimate_effect(
        &self,
        estimand: &IdentifiedEstimand,
        method: &EstimatorMethod,
    ) -> Result<CausalEstimate> {
        let data = self.estimation_data(estimand, method)?;
        let value = estimators::estimate(&data, method)?;
        tracing::debug!(method = %method, value, "estimated effect");
        Ok(CausalEstimate { value, method: method.clone(), n_obs: data.n_obs() })
    }

    fn columns(&self, ids: &[ColumnId]) -> Result<Vec<Vec<f64>>> {
        ids.iter().map(|&id| self.table.column_f64(id)).collect()
    }

    fn instrument_ids(&self, estimand: &IdentifiedEstimand, method: &EstimatorMethod) -> Result<Vec<ColumnId>> {
        let EstimatorMethod::InstrumentalVariable { iv_instrument_name } = method else {
            return Ok(Vec::new());
        };
        match iv_instrument_name {
            None => Ok(estimand.instrumental_variables.clone()),
            Some(names) => names
                .iter()
                .map(|name| {
                    let id: ColumnId = name.parse()?;
                    if !self.table.contains(id) {
                        return Err(Error::Validation(format!("unknown instrument '{name}'")));
                    }
                    if !estimand.instrumental_variables.contains(&id) {
                        tracing::warn!(instrument = %id, "instrument not identified as valid; using it anyway");
                    }
                    Ok(id)
                })
                .collect(),
        }
    }

    fn estimation_data(
        &self,
        estimand: &IdentifiedEstimand,
        method: &EstimatorMethod,
    ) -> Result<EstimationData> {
        let treatment_is_binary = self.treatments.iter().all(|&t| match self.table.column(t) {
            Some(ColumnData::Bool(_)) => true,
            Some(ColumnData::Float(v)) => v.iter().all(|&x| x == 0.0 || x == 1.0),
            None => false,
        });
        let (backdoor, effect_modifiers) = if method.is_backdoor() {
            let em = if matches!(method, EstimatorMethod::LinearRegression) {
                self.columns(&estimand.effect_modifiers)?
            } else {
                Vec::new()
            };
            (self.columns(&estimand.backdoor_variables)?, em)
        } else {
            (Vec::new(), Vec::new())
        };
        Ok(EstimationData {
            y: self.table.column_f64(self.outcome)?,
            treatments: self.columns(&self.treatments)?,
            treatment_is_binary,
            backdoor,
            effect_modifiers,
            instruments: self.columns(&self.instrument_ids(estimand, method)?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dv_core::VariableRole;
    use dv_data::{ConfoundInjection, DatasetSpec, generate_dataset};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn dataset(beta: f64, n_w: usize, n_z: usize, conf: ConfoundInjection, seed: u64) -> SyntheticDataset {
        let spec = DatasetSpec::new(beta, n_w, 10_000).with_instruments(n_z).with_confound(conf);
        generate_dataset(&spec, &mut StdRng::seed_from_u64(seed)).unwrap()
    }

    fn estimate(ds: &SyntheticDataset, method: EstimatorMethod) -> f64 {
        let model = CausalModel::from_dataset(ds, true).unwrap();
        let estimand = model.identify_effect().unwrap();
        model.estimate_effect(&estimand, &method).unwrap().value
    }

    #[test]
    fn test_linear_regression_exact_without_confounding() {
        let ds = dataset(10.0, 5, 2, ConfoundInjection::none(), 1);
        let v = estimate(&ds, EstimatorMethod::LinearRegression);
        assert!((v - 10.0).abs() < 1e-6, "lr={v}");
    }

    #[test]
    fn test_propensity_estimators_recover_beta() {
        let ds = dataset(1.0, 2, 0, ConfoundInjection::none(), 2);
        for (method, tol) in [
            (EstimatorMethod::stratification(), 0.15),
            (EstimatorMethod::PropensityScoreMatching, 0.2),
            (EstimatorMethod::weighting(crate::WeightingScheme::IpsWeight), 0.2),
            (EstimatorMethod::weighting(crate::WeightingScheme::IpsNormalizedWeight), 0.15),
            (EstimatorMethod::weighting(crate::WeightingScheme::IpsStabilizedWeight), 0.15),
        ] {
            let v = estimate(&ds, method.clone());
            assert!((v - 1.0).abs() < tol, "{method}: {v}");
        }
    }

    #[test]
    fn test_iv_recovers_beta_with_outcome_confounding() {
        let conf = ConfoundInjection { effect_on_y: 2.0, ..Default::default() };
        let ds = dataset(10.0, 0, 1, conf, 3);
        let v = estimate(&ds, EstimatorMethod::instrumental_variable(["Z0"]));
        assert!((v - 10.0).abs() < 1.0, "iv={v}");
    }

    #[test]
    fn test_treatment_confounding_biases_regression() {
        let conf = ConfoundInjection {
            num_t_affected: 1,
            effect_on_t: 5.0,
            effect_on_y: 5.0,
            ..Default::default()
        };
        let ds = dataset(10.0, 5, 0, conf, 4);
        let v = estimate(&ds, EstimatorMethod::LinearRegression);
        assert!(v - 10.0 > 1.0, "lr={v}");
    }

    #[test]
    fn test_generated_graph_needs_proceed_flag() {
        let ds = dataset(10.0, 5, 2, ConfoundInjection::none(), 9);
        let strict = CausalModel::from_dataset(&ds, false).unwrap();
        assert!(matches!(strict.identify_effect(), Err(Error::Identification(_))));

        let model = CausalModel::from_dataset(&ds, true).unwrap();
        let estimand = model.identify_effect().unwrap();
        assert!(estimand.backdoor_unobserved_dropped);
        assert_eq!(estimand.backdoor_variables, ds.common_causes);
        assert_eq!(estimand.instrumental_variables, ds.instruments);
        let v = model.estimate_effect(&estimand, &EstimatorMethod::LinearRegression).unwrap().value;
        assert!((v - 10.0).abs() < 1e-6, "lr={v}");
    }

    #[test]
    fn test_unknown_instrument_name() {
        let ds = dataset(10.0, 1, 1, ConfoundInjection::none(), 5);
        let model = CausalModel::from_dataset(&ds, true).unwrap();
        let estimand = model.identify_effect().unwrap();
        let err = model
            .estimate_effect(&estimand, &EstimatorMethod::instrumental_variable(["Z7"]))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_iv_without_instruments() {
        let ds = dataset(10.0, 2, 0, ConfoundInjection::none(), 6);
        let model = CausalModel::from_dataset(&ds, true).unwrap();
        let estimand = model.identify_effect().unwrap();
        let method = EstimatorMethod::InstrumentalVariable { iv_instrument_name: None };
        let err = model.estimate_effect(&estimand, &method).unwrap_err();
        assert!(matches!(err, Error::Identification(_)));
    }

    #[test]
    fn test_rejects_missing_columns() {
        let ds = dataset(10.0, 1, 0, ConfoundInjection::none(), 7);
        let missing = ColumnId::new(VariableRole::Treatment, 3);
        assert!(CausalModel::new(&ds.table, &[missing], ds.outcome, &ds.graph, &[], true).is_err());
        let other = CausalGraph::from_roles(
            &ds.treatments,
            ds.outcome,
            &[ColumnId::new(VariableRole::CommonCause, 9)],
            &[],
            &[],
        );
        assert!(CausalModel::new(&ds.table, &ds.treatments, ds.outcome, &other, &[], true).is_err());
    }

    #[test]
    fn test_propensity_needs_binary_treatment() {
        let spec = DatasetSpec::new(1.0, 1, 200).with_binary_treatment(false);
        let ds = generate_dataset(&spec, &mut StdRng::seed_from_u64(8)).unwrap();
        let model = CausalModel::from_dataset(&ds, true).unwrap();
        let estimand = model.identify_effect().unwrap();
        let err = model.estimate_effect(&estimand, &EstimatorMethod::PropensityScoreMatching).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
