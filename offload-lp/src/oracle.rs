//! Fronteira do oráculo LP
//!
//! O oráculo recebe a tabela numérica de transições, os custos por par
//! (estado, ação) e o orçamento, e devolve a medida de ocupação ótima
//! `x(s, a)`. A implementação padrão usa o simplex do `minilp`.

use crate::error::{LpError, LpResult};
use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem, Variable};
use offload_core::{Action, UserEquipmentDynamics};
use offload_dtmc::NumericTransitionTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Instância do programa linear
///
/// Os vetores de custo são indexados como a tabela: `[estado][linha]`, uma
/// linha por ação legal.
#[derive(Debug, Clone)]
pub struct LpInstance<'a> {
    pub table: &'a NumericTransitionTable,
    /// Comprimento de fila do estado (objetivo)
    pub delay_costs: Vec<Vec<f64>>,
    /// Potência do tick
    pub resource_costs: Vec<Vec<f64>>,
    /// Orçamento de potência média
    pub budget: f64,
    /// Descartes esperados do tick
    pub drop_rates: Vec<Vec<f64>>,
    pub max_drop_rate: Option<f64>,
}

impl<'a> LpInstance<'a> {
    /// Monta os custos a partir da dinâmica do UE
    pub fn from_dynamics(
        table: &'a NumericTransitionTable,
        dynamics: &UserEquipmentDynamics,
        budget: f64,
        max_drop_rate: Option<f64>,
    ) -> Self {
        let per_pair = |cost: &dyn Fn(usize, Action) -> f64| -> Vec<Vec<f64>> {
            (0..table.state_count())
                .map(|s| table.rows(s).iter().map(|row| cost(s, row.action)).collect())
                .collect()
        };
        let states = table.states();

        Self {
            table,
            delay_costs: per_pair(&|s, _| f64::from(states[s].total_queue_length())),
            resource_costs: per_pair(&|s, a| dynamics.tick_power(&states[s], a)),
            budget,
            drop_rates: per_pair(&|s, a| dynamics.expected_drops(&states[s], a)),
            max_drop_rate,
        }
    }

    /// Verifica o alinhamento das tabelas de custo
    pub fn validate(&self) -> LpResult<()> {
        for (name, costs) in [
            ("delay", &self.delay_costs),
            ("resource", &self.resource_costs),
            ("drop", &self.drop_rates),
        ] {
            if costs.len() != self.table.state_count() {
                return Err(LpError::MalformedInstance(format!(
                    "{name} costs cover {} states, table has {}",
                    costs.len(),
                    self.table.state_count()
                )));
            }
            if let Some(s) = (0..costs.len()).find(|&s| costs[s].len() != self.table.rows(s).len()) {
                return Err(LpError::MalformedInstance(format!(
                    "{name} costs of state {} do not match its legal actions",
                    self.table.states()[s]
                )));
            }
        }
        if !(self.budget >= 0.0 && self.budget.is_finite()) {
            return Err(LpError::MalformedInstance(format!("budget must be finite and non-negative, got {}", self.budget)));
        }
        Ok(())
    }

    /// Número de variáveis: pares (estado, ação legal)
    pub fn variable_count(&self) -> usize {
        self.table.pair_count()
    }
}

/// Medida de ocupação estacionária `x(s, a)` e valor do objetivo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupationMeasure {
    /// `[estado][linha]`, alinhado à tabela
    pub values: Vec<Vec<f64>>,
    pub objective: f64,
}

impl OccupationMeasure {
    /// Massa estacionária do estado
    pub fn state_mass(&self, state: usize) -> f64 {
        self.values.get(state).map_or(0.0, |row| row.iter().sum())
    }

    /// Σ x(s, a)·custo(s, a)
    pub fn expectation(&self, costs: &[Vec<f64>]) -> f64 {
        self.values
            .iter()
            .zip(costs)
            .flat_map(|(xs, cs)| xs.iter().zip(cs).map(|(x, c)| x * c))
            .sum()
    }
}

/// Oráculo de programação linear
pub trait LpOracle: Send + Sync {
    fn solve(&self, instance: &LpInstance<'_>) -> LpResult<OccupationMeasure>;
}

/// Oráculo simplex baseado em `minilp`
#[derive(Debug, Clone, Copy, Default)]
pub struct MinilpOracle;

impl LpOracle for MinilpOracle {
    fn solve(&self, instance: &LpInstance<'_>) -> LpResult<OccupationMeasure> {
        instance.validate()?;
        let table = instance.table;
        let n = table.state_count();

        let mut problem = Problem::new(OptimizationDirection::Minimize);
        let mut variables: Vec<Vec<Variable>> = Vec::with_capacity(n);
        let mut flat: Vec<Variable> = Vec::with_capacity(instance.variable_count());
        for s in 0..n {
            let row_vars: Vec<Variable> = instance.delay_costs[s]
                .iter()
                .map(|&cost| problem.add_var(cost, (0.0, f64::INFINITY)))
                .collect();
            flat.extend(row_vars.iter().copied());
            variables.push(row_vars);
        }

        // Σ x = 1
        let mut normalization = LinearExpr::empty();
        for &v in &flat {
            normalization.add(v, 1.0);
        }
        problem.add_constraint(normalization, ComparisonOp::Eq, 1.0);

        // Balanço: Σ_a x(j, a) = Σ_{s,a} x(s, a)·P(s, a, j)
        let mut balance: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        let mut next = 0usize;
        for s in 0..n {
            for row in table.rows(s) {
                *balance[s].entry(next).or_insert(0.0) += 1.0;
                for &(destination, p) in &row.transitions {
                    *balance[destination].entry(next).or_insert(0.0) -= p;
                }
                next += 1;
            }
        }
        // uma equação é redundante
        for coefficients in balance.iter().take(n.saturating_sub(1)) {
            let terms: Vec<(usize, f64)> = coefficients
                .iter()
                .filter(|&(_, &c)| c != 0.0)
                .map(|(&index, &c)| (index, c))
                .collect();
            if terms.is_empty() {
                continue;
            }
            let mut expr = LinearExpr::empty();
            for (index, coefficient) in terms {
                expr.add(flat[index], coefficient);
            }
            problem.add_constraint(expr, ComparisonOp::Eq, 0.0);
        }

        let weighted = |costs: &[Vec<f64>]| {
            let mut expr = LinearExpr::empty();
            for (row_vars, row_costs) in variables.iter().zip(costs) {
                for (&v, &c) in row_vars.iter().zip(row_costs) {
                    if c != 0.0 {
                        expr.add(v, c);
                    }
                }
            }
            expr
        };
        problem.add_constraint(weighted(&instance.resource_costs), ComparisonOp::Le, instance.budget);
        if let Some(max_drop_rate) = instance.max_drop_rate {
            problem.add_constraint(weighted(&instance.drop_rates), ComparisonOp::Le, max_drop_rate);
        }

        debug!(variables = flat.len(), states = n, "solving occupation-measure LP");

        let solution = match problem.solve() {
            Ok(solution) => solution,
            Err(minilp::Error::Infeasible) => {
                return Err(LpError::Infeasible(format!(
                    "no stationary policy meets budget {}{}",
                    instance.budget,
                    instance
                        .max_drop_rate
                        .map(|rate| format!(" with drop rate <= {rate}"))
                        .unwrap_or_default()
                )));
            }
            Err(minilp::Error::Unbounded) => return Err(LpError::Unbounded),
            #[allow(unreachable_patterns)]
            Err(other) => return Err(LpError::Solver(other.to_string())),
        };

        let values = variables
            .iter()
            .map(|row_vars| row_vars.iter().map(|&v| solution[v].max(0.0)).collect())
            .collect();

        Ok(OccupationMeasure {
            values,
            objective: solution.objective(),
        })
    }
}
