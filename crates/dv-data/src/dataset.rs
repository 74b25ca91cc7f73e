//! Linear dataset generator with an injectable unobserved confounder.
//!
//! Structural model (one row per sample, `U ~ N(0, 1)` never written out):
//!
//! - `W ~ MVN(μ_W, I)`, `Z_k ~ U(0, 1)`, `X ~ MVN(μ_X, I)`
//! - selected `W`/`Z` columns get `+ U · effect_on_{w,z}` before use
//! - `t = ε + [U · effect_on_t] + W·c1 + Z·cz`, then optionally binarized
//! - `y = t·β + W·c2 + (X·ce) · Π t + U · effect_on_y`
//!
//! The true ATE is obtained by evaluating the treatment-dependent part of the
//! outcome at `t = 1` and `t = 0` with every other draw held fixed.

use dv_core::{ColumnId, Error, Result, VariableRole};
use dv_prob::sampling::{
    choose_without_replacement, multivariate_normal_identity, standard_normal, stochastic_binary,
    uniform,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::graph::CausalGraph;
use crate::table::{ColumnData, Table};

/// How strongly, and into how many members of each group, `U` is injected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfoundInjection {
    /// Number of common causes affected by `U`.
    pub num_w_affected: usize,
    /// Effect of `U` on each affected common cause.
    pub effect_on_w: f64,
    /// Number of instruments affected by `U`.
    pub num_z_affected: usize,
    /// Effect of `U` on each affected instrument.
    pub effect_on_z: f64,
    /// Number of treatments affected by `U`.
    pub num_t_affected: usize,
    /// Effect of `U` on each affected treatment.
    pub effect_on_t: f64,
    /// Effect of `U` on the outcome.
    pub effect_on_y: f64,
}

impl ConfoundInjection {
    /// No confounding anywhere.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether `U` touches nothing.
    pub fn is_none(&self) -> bool {
        (self.num_w_affected == 0 || self.effect_on_w == 0.0)
            && (self.num_z_affected == 0 || self.effect_on_z == 0.0)
            && (self.num_t_affected == 0 || self.effect_on_t == 0.0)
            && self.effect_on_y == 0.0
    }
}

/// Parameters of one generated dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSpec {
    /// True per-treatment effect.
    pub beta: f64,
    /// Number of rows.
    pub num_samples: usize,
    /// Number of common causes (`W`).
    pub num_common_causes: usize,
    /// Number of instruments (`Z`).
    pub num_instruments: usize,
    /// Number of effect modifiers (`X`).
    pub num_effect_modifiers: usize,
    /// Number of treatments (`v`).
    pub num_treatments: usize,
    /// Binarize treatments.
    pub treatment_is_binary: bool,
    /// Binarize the outcome.
    pub outcome_is_binary: bool,
    /// Unobserved-confounder injection.
    pub confound: ConfoundInjection,
}

impl Default for DatasetSpec {
    fn default() -> Self {
        Self {
            beta: 10.0,
            num_samples: 10_000,
            num_common_causes: 5,
            num_instruments: 2,
            num_effect_modifiers: 0,
            num_treatments: 1,
            treatment_is_binary: true,
            outcome_is_binary: false,
            confound: ConfoundInjection::none(),
        }
    }
}

impl DatasetSpec {
    /// Dataset with `num_common_causes` common causes and no other optional groups.
    pub fn new(beta: f64, num_common_causes: usize, num_samples: usize) -> Self {
        Self {
            beta,
            num_samples,
            num_common_causes,
            num_instruments: 0,
            ..Default::default()
        }
    }

    /// Set the number of instruments.
    pub fn with_instruments(mut self, n: usize) -> Self {
        self.num_instruments = n;
        self
    }

    /// Set the number of effect modifiers.
    pub fn with_effect_modifiers(mut self, n: usize) -> Self {
        self.num_effect_modifiers = n;
        self
    }

    /// Set the number of treatments.
    pub fn with_treatments(mut self, n: usize) -> Self {
        self.num_treatments = n;
        self
    }

    /// Keep treatments continuous or binarize them.
    pub fn with_binary_treatment(mut self, binary: bool) -> Self {
        self.treatment_is_binary = binary;
        self
    }

    /// Set the confound injection.
    pub fn with_confound(mut self, confound: ConfoundInjection) -> Self {
        self.confound = confound;
        self
    }

    /// Check group sizes against the requested injection.
    pub fn validate(&self) -> Result<()> {
        if !self.beta.is_finite() {
            return Err(Error::Validation(format!("beta must be finite, got {}", self.beta)));
        }
        if self.num_samples == 0 {
            return Err(Error::Validation("num_samples must be > 0".into()));
        }
        if self.num_treatments == 0 {
            return Err(Error::Validation("num_treatments must be > 0".into()));
        }
        let c = &self.confound;
        for (what, affected, width) in [
            ("common causes", c.num_w_affected, self.num_common_causes),
            ("instruments", c.num_z_affected, self.num_instruments),
            ("treatments", c.num_t_affected, self.num_treatments),
        ] {
            if affected > width {
                return Err(Error::Validation(format!(
                    "{affected} {what} affected by U but only {width} exist"
                )));
            }
        }
        for (what, v) in [
            ("effect_on_w", c.effect_on_w),
            ("effect_on_z", c.effect_on_z),
            ("effect_on_t", c.effect_on_t),
            ("effect_on_y", c.effect_on_y),
        ] {
            if !v.is_finite() {
                return Err(Error::Validation(format!("{what} must be finite, got {v}")));
            }
        }
        Ok(())
    }
}

/// Structural coefficients drawn for one dataset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StructuralCoefficients {
    /// `W -> t`, indexed `[common cause][treatment]`.
    pub c1: Vec<Vec<f64>>,
    /// `W -> y`, one per common cause.
    pub c2: Vec<f64>,
    /// `Z -> t`, indexed `[instrument][treatment]`.
    pub cz: Vec<Vec<f64>>,
    /// `X · t -> y`, one per effect modifier.
    pub ce: Vec<f64>,
}

/// Group members into which `U` was injected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AffectedMembers {
    /// Indices into the common-cause group.
    pub common_causes: Vec<usize>,
    /// Indices into the instrument group.
    pub instruments: Vec<usize>,
    /// Indices into the treatment group.
    pub treatments: Vec<usize>,
}

/// One generated dataset with its metadata.
#[derive(Debug, Clone)]
pub struct SyntheticDataset {
    /// Data, columns ordered effect modifiers, instruments, common causes, treatments, outcome.
    pub table: Table,
    /// Treatment columns.
    pub treatments: Vec<ColumnId>,
    /// Outcome column.
    pub outcome: ColumnId,
    /// Common-cause columns.
    pub common_causes: Vec<ColumnId>,
    /// Instrument columns.
    pub instruments: Vec<ColumnId>,
    /// Effect-modifier columns.
    pub effect_modifiers: Vec<ColumnId>,
    /// Causal graph over the columns plus the latent `U`.
    pub graph: CausalGraph,
    /// True average treatment effect under the structural equations.
    pub ate: f64,
    /// Where `U` was injected.
    pub affected: AffectedMembers,
    /// Drawn structural coefficients.
    pub coefficients: StructuralCoefficients,
}

impl SyntheticDataset {
    /// DOT encoding of [`Self::graph`].
    pub fn dot_graph(&self) -> String {
        self.graph.to_dot()
    }

    /// GML encoding of [`Self::graph`].
    pub fn gml_graph(&self) -> String {
        self.graph.to_gml()
    }
}

/// Outcome equation split into the part that depends on treatment and the part that does not.
struct OutcomeModel<'a> {
    beta: f64,
    common_causes: &'a [Vec<f64>],
    effect_modifiers: &'a [Vec<f64>],
    coef: &'a StructuralCoefficients,
    u: &'a [f64],
    effect_on_y: f64,
}

impl OutcomeModel<'_> {
    /// `t·β` for row `i`.
    fn direct(&self, t_row: &[f64]) -> f64 {
        t_row.iter().map(|&t| t * self.beta).sum()
    }

    /// `(X_i·ce) · Π t`.
    fn interaction(&self, i: usize, t_row: &[f64]) -> f64 {
        if self.effect_modifiers.is_empty() {
            return 0.0;
        }
        let xce: f64 = self.effect_modifiers.iter().zip(&self.coef.ce).map(|(x, c)| x[i] * c).sum();
        xce * t_row.iter().product::<f64>()
    }

    /// `W_i·c2 + U_i · effect_on_y`.
    fn baseline(&self, i: usize) -> f64 {
        let wc2: f64 = self.common_causes.iter().zip(&self.coef.c2).map(|(w, c)| w[i] * c).sum();
        wc2 + self.u[i] * self.effect_on_y
    }

    fn outcome(&self, i: usize, t_row: &[f64]) -> f64 {
        self.direct(t_row) + self.baseline(i) + self.interaction(i, t_row)
    }

    /// Mean of `y(t=1) - y(t=0)`. The baseline cancels term by term; the
    /// direct part does not vary by row, so it is taken once.
    fn ate(&self, n: usize, num_treatments: usize) -> f64 {
        let ones = vec![1.0; num_treatments];
        let zeros = vec![0.0; num_treatments];
        let direct = self.direct(&ones) - self.direct(&zeros);
        if self.effect_modifiers.is_empty() {
            return direct;
        }
        let modified: f64 =
            (0..n).map(|i| self.interaction(i, &ones) - self.interaction(i, &zeros)).sum();
        direct + modified / n as f64
    }
}

/// `n` uniform draws between `a` and `b`, whichever order they come in.
fn uniform_between<R: Rng + ?Sized>(rng: &mut R, n: usize, a: f64, b: f64) -> Result<Vec<f64>> {
    uniform(rng, n, a.min(b), a.max(b))
}

/// Generate one dataset.
///
/// Random draws happen in a fixed order (common causes, instruments, effect
/// modifiers, `U`, injections, treatment noise, binarization), so a seeded
/// RNG reproduces the dataset exactly.
pub fn generate_dataset<R: Rng + ?Sized>(spec: &DatasetSpec, rng: &mut R) -> Result<SyntheticDataset> {
    spec.validate()?;
    let n = spec.num_samples;
    let num_t = spec.num_treatments;
    let beta = spec.beta;
    let conf = &spec.confound;
    let mut coef = StructuralCoefficients::default();

    let mut w: Vec<Vec<f64>> = Vec::new();
    if spec.num_common_causes > 0 {
        let range = beta * 0.5;
        let means = uniform(rng, spec.num_common_causes, -1.0, 1.0)?;
        w = multivariate_normal_identity(rng, &means, n);
        coef.c1 = (0..spec.num_common_causes)
            .map(|_| uniform_between(rng, num_t, 0.0, range))
            .collect::<Result<_>>()?;
        coef.c2 = uniform_between(rng, spec.num_common_causes, 0.0, range)?;
    }

    let mut z: Vec<Vec<f64>> = Vec::new();
    if spec.num_instruments > 0 {
        z = (0..spec.num_instruments).map(|_| uniform(rng, n, 0.0, 1.0)).collect::<Result<_>>()?;
        coef.cz = (0..spec.num_instruments)
            .map(|_| uniform_between(rng, num_t, beta * 0.95, beta * 1.05))
            .collect::<Result<_>>()?;
    }

    let mut x: Vec<Vec<f64>> = Vec::new();
    if spec.num_effect_modifiers > 0 {
        let means = uniform(rng, spec.num_effect_modifiers, -1.0, 1.0)?;
        x = multivariate_normal_identity(rng, &means, n);
        coef.ce = uniform_between(rng, spec.num_effect_modifiers, 0.0, beta * 0.5)?;
    }

    let u = standard_normal(rng, n);
    let mut affected = AffectedMembers::default();

    if conf.num_w_affected > 0 {
        affected.common_causes = choose_without_replacement(rng, w.len(), conf.num_w_affected)?;
        for &k in &affected.common_causes {
            add_scaled(&mut w[k], &u, conf.effect_on_w);
        }
    }
    if conf.num_z_affected > 0 {
        affected.instruments = choose_without_replacement(rng, z.len(), conf.num_z_affected)?;
        for &k in &affected.instruments {
            add_scaled(&mut z[k], &u, conf.effect_on_z);
        }
    }

    // Treatment noise, drawn row-major like an (n × num_t) array.
    let noise = standard_normal(rng, n * num_t);
    let mut t: Vec<Vec<f64>> =
        (0..num_t).map(|j| (0..n).map(|i| noise[i * num_t + j]).collect()).collect();
    if conf.num_t_affected > 0 {
        affected.treatments = choose_without_replacement(rng, num_t, conf.num_t_affected)?;
        for &k in &affected.treatments {
            add_scaled(&mut t[k], &u, conf.effect_on_t);
        }
    }
    for (j, tj) in t.iter_mut().enumerate() {
        for (k, wk) in w.iter().enumerate() {
            add_scaled(tj, wk, coef.c1[k][j]);
        }
        for (k, zk) in z.iter().enumerate() {
            add_scaled(tj, zk, coef.cz[k][j]);
        }
    }

    let t_bool: Option<Vec<Vec<bool>>> = if spec.treatment_is_binary {
        let mut cols: Vec<Vec<bool>> = vec![Vec::with_capacity(n); num_t];
        for i in 0..n {
            for (j, col) in cols.iter_mut().enumerate() {
                col.push(stochastic_binary(rng, t[j][i]));
            }
        }
        for (tj, bj) in t.iter_mut().zip(&cols) {
            for (v, &b) in tj.iter_mut().zip(bj) {
                *v = if b { 1.0 } else { 0.0 };
            }
        }
        Some(cols)
    } else {
        None
    };

    let model = OutcomeModel {
        beta,
        common_causes: &w,
        effect_modifiers: &x,
        coef: &coef,
        u: &u,
        effect_on_y: conf.effect_on_y,
    };
    let mut t_row = vec![0.0; num_t];
    let y: Vec<f64> = (0..n)
        .map(|i| {
            for (j, tj) in t.iter().enumerate() {
                t_row[j] = tj[i];
            }
            model.outcome(i, &t_row)
        })
        .collect();
    let ate = model.ate(n, num_t);

    let effect_modifiers = role_ids(VariableRole::EffectModifier, x.len());
    let instruments = role_ids(VariableRole::Instrument, z.len());
    let common_causes = role_ids(VariableRole::CommonCause, w.len());
    let treatments = role_ids(VariableRole::Treatment, num_t);
    let outcome = ColumnId::outcome();

    let mut table = Table::new(n);
    for (id, col) in effect_modifiers.iter().zip(x) {
        table.push_column(*id, ColumnData::Float(col))?;
    }
    for (id, col) in instruments.iter().zip(z) {
        table.push_column(*id, ColumnData::Float(col))?;
    }
    for (id, col) in common_causes.iter().zip(w) {
        table.push_column(*id, ColumnData::Float(col))?;
    }
    match t_bool {
        Some(cols) => {
            for (id, col) in treatments.iter().zip(cols) {
                table.push_column(*id, ColumnData::Bool(col))?;
            }
        }
        None => {
            for (id, col) in treatments.iter().zip(t) {
                table.push_column(*id, ColumnData::Float(col))?;
            }
        }
    }
    let y_data = if spec.outcome_is_binary {
        ColumnData::Bool(y.iter().map(|&v| stochastic_binary(rng, v)).collect())
    } else {
        ColumnData::Float(y)
    };
    table.push_column(outcome, y_data)?;

    let graph = CausalGraph::from_roles(
        &treatments,
        outcome,
        &common_causes,
        &instruments,
        &effect_modifiers,
    );

    tracing::debug!(
        rows = n,
        cols = table.n_cols(),
        ate,
        affected_w = ?affected.common_causes,
        affected_z = ?affected.instruments,
        affected_t = ?affected.treatments,
        "generated dataset"
    );

    Ok(SyntheticDataset {
        table,
        treatments,
        outcome,
        common_causes,
        instruments,
        effect_modifiers,
        graph,
        ate,
        affected,
        coefficients: coef,
    })
}

fn role_ids(role: VariableRole, n: usize) -> Vec<ColumnId> {
    (0..n).map(|i| ColumnId::new(role, i)).collect()
}

#[inline]
fn add_scaled(dst: &mut [f64], src: &[f64], scale: f64) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d += s * scale;
    }
}
