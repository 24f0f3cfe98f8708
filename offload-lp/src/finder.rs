//! Busca da política ótima para um orçamento eta
//!
//! Pipeline: DTMC → tabela numérica → LP de medida de ocupação → política
//! estocástica estacionária. A variante por faixa compartilha a cadeia
//! simbólica (somente leitura) entre os pontos e resolve cada eta num worker.

use crate::error::{LpError, LpResult};
use crate::oracle::{LpInstance, LpOracle, MinilpOracle, OccupationMeasure};
use offload_core::parallel::{default_workers, run_indexed};
use offload_core::{
    ActionDistribution, OffloadingSystemConfig, ParameterRange, Policy, StochasticPolicy, SymbolValues,
    UserEquipmentDynamics, UserEquipmentState,
};
use offload_dtmc::{DiscreteTimeMarkovChain, DtmcCreator, IndependentTransitionCalculator, NumericTransitionTable};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use tracing::{debug, info};

/// Menor e maior número de dígitos aceitos para `precision`
pub const MIN_PRECISION: u32 = 1;
pub const MAX_PRECISION: u32 = 15;

/// Piso das tolerâncias verificadas após o simplex
const SOLVER_EPSILON: f64 = 1e-7;

/// Teto das tolerâncias de verificação; `precision` atua entre o piso e o teto
const VERIFICATION_CEILING: f64 = 1e-6;

/// Valor do simplex tratado como zero na extração da política
const NEGLIGIBLE_MASS: f64 = 1e-12;

/// Resíduo máximo do balanço da política extraída
const STATIONARITY_TOLERANCE: f64 = 1e-5;

/// Tolerância numérica `10^-precision`
pub fn tolerance(precision: u32) -> LpResult<f64> {
    if (MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
        Ok(10f64.powi(-(precision as i32)))
    } else {
        Err(LpError::InvalidPrecision(precision))
    }
}

/// Política ótima e suas métricas estacionárias
///
/// As métricas são as da política devolvida, avaliada sobre a distribuição
/// estacionária do LP. Na serialização a política vira uma lista ordenada de
/// pares (estado, distribuição).
#[derive(Debug, Clone, Serialize)]
pub struct OptimalPolicy {
    pub eta: f64,
    #[serde(serialize_with = "serialize_policy")]
    pub policy: StochasticPolicy,
    /// Objetivo do LP: comprimento médio total das filas
    pub expected_queue_length: f64,
    /// Atraso médio por tarefa (Little, sobre a carga oferecida)
    pub expected_delay: f64,
    pub expected_power: f64,
    pub expected_drop_rate: f64,
}

/// Busca de políticas ótimas sobre um oráculo LP
#[derive(Debug, Clone)]
pub struct OptimalPolicyFinder<O: LpOracle = MinilpOracle> {
    oracle: O,
    workers: usize,
}

impl OptimalPolicyFinder {
    pub fn new() -> Self {
        Self::with_oracle(MinilpOracle)
    }
}

impl Default for OptimalPolicyFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: LpOracle> OptimalPolicyFinder<O> {
    pub fn with_oracle(oracle: O) -> Self {
        Self {
            oracle,
            workers: default_workers(),
        }
    }

    /// Número de workers da variante por faixa
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Política ótima para o eta da configuração
    pub fn find_optimal_policy_for_given_eta(
        &self,
        config: &OffloadingSystemConfig,
        precision: u32,
    ) -> LpResult<OptimalPolicy> {
        tolerance(precision)?;
        let chain = DtmcCreator::new(config)?.create()?;
        self.find_optimal_policy_with_chain(config, &chain, precision)
    }

    /// Igual a [`Self::find_optimal_policy_for_given_eta`], reaproveitando uma
    /// cadeia construída a partir da mesma forma e dos mesmos custos de potência
    ///
    /// A cadeia precisa ter os estados e as ações legais da configuração;
    /// caso contrário o resultado é `MalformedInstance`.
    pub fn find_optimal_policy_with_chain(
        &self,
        config: &OffloadingSystemConfig,
        chain: &DiscreteTimeMarkovChain,
        precision: u32,
    ) -> LpResult<OptimalPolicy> {
        let eps = tolerance(precision)?;
        let check = eps.clamp(SOLVER_EPSILON, VERIFICATION_CEILING);

        let dynamics = UserEquipmentDynamics::new(config)?;
        check_chain_matches(chain, config, &dynamics)?;

        let calculator = IndependentTransitionCalculator::new(SymbolValues::from_components(config.components()), chain)?;
        let table = calculator.resolve()?;
        table.validate_stochastic(check)?;

        let eta = config.eta();
        let max_drop_rate = config.components().max_drop_rate;
        let instance = LpInstance::from_dynamics(&table, &dynamics, eta, max_drop_rate);
        let measure = self.oracle.solve(&instance)?;

        let policy = StochasticPolicy::new(format!("Optimal(eta={eta})"), extract_policy(&table, &measure));
        let evaluation = evaluate_policy(&instance, &measure, &policy)?;

        if evaluation.balance_residual > STATIONARITY_TOLERANCE {
            return Err(LpError::Solver(format!(
                "extracted policy does not keep the occupation measure stationary (residual {})",
                evaluation.balance_residual
            )));
        }
        if evaluation.power > eta + check {
            return Err(LpError::BudgetViolated {
                power: evaluation.power,
                eta,
            });
        }
        if let Some(rate) = max_drop_rate {
            if evaluation.drop_rate > rate + check {
                return Err(LpError::Infeasible(format!(
                    "extracted policy drops {} tasks per tick, above {rate}",
                    evaluation.drop_rate
                )));
            }
        }

        let expected_queue_length = evaluation.queue_length;
        let expected_delay = expected_queue_length / config.components().total_arrival_rate();
        let fallback_states = table.state_count() - policy.len();

        debug!(
            eta,
            expected_queue_length,
            expected_power = evaluation.power,
            lp_objective = measure.objective,
            fallback_states,
            "optimal policy found"
        );

        Ok(OptimalPolicy {
            eta,
            policy,
            expected_queue_length,
            expected_delay,
            expected_power: evaluation.power,
            expected_drop_rate: evaluation.drop_rate,
        })
    }

    /// Uma política por ponto de `eta_range`, alinhadas pelo índice
    pub fn find_optimal_policies_for_eta_range(
        &self,
        config: &OffloadingSystemConfig,
        eta_range: &ParameterRange,
        precision: u32,
    ) -> LpResult<Vec<OptimalPolicy>> {
        eta_range.validate()?;
        tolerance(precision)?;

        let points = eta_range
            .to_vec()
            .into_iter()
            .map(|eta| config.with_eta(eta))
            .collect::<Result<Vec<_>, _>>()?;

        let chain = DtmcCreator::new(config)?.create()?;
        info!(
            points = points.len(),
            states = chain.state_count(),
            workers = self.workers,
            "eta sweep started"
        );

        let chain = &chain;
        run_indexed(points, self.workers, |index, point| {
            let result = self.find_optimal_policy_with_chain(&point, chain, precision);
            if let Ok(found) = &result {
                info!(index, eta = found.eta, delay = found.expected_delay, "eta point solved");
            }
            result
        })
        .into_iter()
        .collect()
    }
}

/// Estados e ações legais da cadeia precisam coincidir com os da configuração
fn check_chain_matches(
    chain: &DiscreteTimeMarkovChain,
    config: &OffloadingSystemConfig,
    dynamics: &UserEquipmentDynamics,
) -> LpResult<()> {
    let states = config.state_config().all_states()?;
    if chain.state_count() != states.len() {
        return Err(LpError::MalformedInstance(format!(
            "chain has {} states, configuration describes {}",
            chain.state_count(),
            states.len()
        )));
    }
    for (s, state) in states.iter().enumerate() {
        if chain.state(s) != Some(state) {
            return Err(LpError::MalformedInstance(format!("chain state {s} is not {state}")));
        }
        if chain.legal_actions(s) != dynamics.legal_actions(state).as_slice() {
            return Err(LpError::MalformedInstance(format!(
                "legal actions of {state} differ between the chain and the configuration"
            )));
        }
    }
    Ok(())
}

/// `π(a|s) = x(s,a) / Σ_a x(s,a)`, descartando apenas valores numericamente nulos
fn extract_policy(
    table: &NumericTransitionTable,
    measure: &OccupationMeasure,
) -> HashMap<UserEquipmentState, ActionDistribution> {
    let mut distributions = HashMap::new();
    for (s, state) in table.states().iter().enumerate() {
        let kept: ActionDistribution = table
            .rows(s)
            .iter()
            .zip(&measure.values[s])
            .filter(|&(_, &x)| x > NEGLIGIBLE_MASS)
            .map(|(row, &x)| (row.action, x))
            .collect();
        let mass: f64 = kept.iter().map(|(_, x)| x).sum();
        if mass <= NEGLIGIBLE_MASS {
            continue;
        }
        distributions.insert(state.clone(), kept.into_iter().map(|(action, x)| (action, x / mass)).collect());
    }
    distributions
}

/// Métricas da política extraída sob a massa estacionária do LP
#[derive(Debug, Clone, Copy, PartialEq)]
struct PolicyEvaluation {
    queue_length: f64,
    power: f64,
    drop_rate: f64,
    /// Σ_j |fluxo de entrada(j) − massa(j)|
    balance_residual: f64,
}

/// Avalia a política efetivamente devolvida (incluindo o fallback) sobre a
/// massa de estados `μ` da medida de ocupação
fn evaluate_policy(
    instance: &LpInstance<'_>,
    measure: &OccupationMeasure,
    policy: &StochasticPolicy,
) -> LpResult<PolicyEvaluation> {
    let table = instance.table;
    let mut inflow = vec![0.0; table.state_count()];
    let mut evaluation = PolicyEvaluation {
        queue_length: 0.0,
        power: 0.0,
        drop_rate: 0.0,
        balance_residual: 0.0,
    };

    for (s, state) in table.states().iter().enumerate() {
        let mass = measure.state_mass(s);
        let rows = table.rows(s);
        let legal: Vec<_> = rows.iter().map(|row| row.action).collect();

        for (action, p) in policy.distribution_for(state, &legal) {
            let r = legal.iter().position(|&a| a == action).ok_or_else(|| {
                LpError::MalformedInstance(format!("policy chooses {action}, illegal in {state}"))
            })?;
            let weight = mass * p;
            evaluation.queue_length += weight * instance.delay_costs[s][r];
            evaluation.power += weight * instance.resource_costs[s][r];
            evaluation.drop_rate += weight * instance.drop_rates[s][r];
            for &(destination, probability) in &rows[r].transitions {
                inflow[destination] += weight * probability;
            }
        }
    }

    evaluation.balance_residual = inflow
        .iter()
        .enumerate()
        .map(|(j, flow)| (flow - measure.state_mass(j)).abs())
        .sum();
    Ok(evaluation)
}

fn serialize_policy<S: Serializer>(policy: &StochasticPolicy, serializer: S) -> Result<S::Ok, S::Error> {
    let mut entries: Vec<_> = policy.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    serializer.collect_seq(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use offload_core::{
        EnvironmentParameters, Policy, UserEquipmentComponentsConfig, UserEquipmentConfig, UserEquipmentStateConfig,
    };

    fn config(eta: f64) -> OffloadingSystemConfig {
        config_with_cap(eta, 10.0)
    }

    fn config_with_cap(eta: f64, p_max: f64) -> OffloadingSystemConfig {
        OffloadingSystemConfig::new(
            UserEquipmentConfig {
                state_config: UserEquipmentStateConfig::single_queue(4, 2, 2),
                components_config: UserEquipmentComponentsConfig::single_queue(0.4, 0.7, eta, 1.0, 1.0, p_max),
            },
            EnvironmentParameters::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_precision_bounds() {
        assert!(tolerance(0).is_err());
        assert!(tolerance(16).is_err());
        assert_eq!(tolerance(3).unwrap(), 1e-3);

        let finder = OptimalPolicyFinder::new();
        assert!(matches!(
            finder.find_optimal_policy_for_given_eta(&config(1.0), 0),
            Err(LpError::InvalidPrecision(0))
        ));
    }

    #[test]
    fn test_policy_is_a_distribution_over_legal_actions() {
        let config = config(1.0);
        let found = OptimalPolicyFinder::new().find_optimal_policy_for_given_eta(&config, 6).unwrap();
        let dynamics = UserEquipmentDynamics::new(&config).unwrap();

        assert!(!found.policy.is_empty());
        for (state, distribution) in found.policy.iter() {
            let legal = dynamics.legal_actions(state);
            let total: f64 = distribution.iter().map(|(_, p)| p).sum();
            assert!((total - 1.0).abs() < 1e-9);
            assert!(distribution.iter().all(|(a, p)| legal.contains(a) && *p > 0.0));
        }
    }

    #[test]
    fn test_budget_is_respected() {
        for eta in [0.3, 0.8, 1.5] {
            let found = OptimalPolicyFinder::new()
                .find_optimal_policy_for_given_eta(&config(eta), 8)
                .unwrap();
            assert!(found.expected_power <= eta + 1e-7, "eta {eta}: power {}", found.expected_power);
        }
    }

    #[test]
    fn test_zero_mass_states_fall_back() {
        let config = config(1.0);
        let found = OptimalPolicyFinder::new().find_optimal_policy_for_given_eta(&config, 6).unwrap();
        let dynamics = UserEquipmentDynamics::new(&config).unwrap();

        for state in config.state_config().all_states().unwrap() {
            let legal = dynamics.legal_actions(&state);
            let distribution = found.policy.distribution_for(&state, &legal);
            assert!(!distribution.is_empty());
            assert!(distribution.iter().all(|(a, _)| legal.contains(a)));
        }
    }

    #[test]
    fn test_mismatched_chain_is_rejected() {
        let small = config(1.0).with_state_config(UserEquipmentStateConfig::single_queue(2, 1, 1)).unwrap();
        let chain = DtmcCreator::new(&small).unwrap().create().unwrap();
        let err = OptimalPolicyFinder::new()
            .find_optimal_policy_with_chain(&config(1.0), &chain, 6)
            .unwrap_err();
        assert!(matches!(err, LpError::MalformedInstance(_)));
    }

    #[test]
    fn test_precision_does_not_prune_the_policy() {
        let config = config(0.6);
        let finder = OptimalPolicyFinder::new();
        let reference = finder.find_optimal_policy_for_given_eta(&config, 8).unwrap();

        for precision in 1..=3 {
            let found = finder.find_optimal_policy_for_given_eta(&config, precision).unwrap();
            assert_eq!(found.policy.len(), reference.policy.len(), "precision {precision}");
            for (state, distribution) in reference.policy.iter() {
                for &(action, p) in distribution {
                    assert!((found.policy.probability(state, action) - p).abs() < 1e-12);
                }
            }
            assert!(found.expected_power <= 0.6 + 1e-6);
            assert!((found.expected_queue_length - reference.expected_queue_length).abs() < 1e-9);
        }
    }

    #[test]
    fn test_chain_with_other_power_cap_is_rejected() {
        let permissive = config_with_cap(1.0, 500.0);
        let chain = DtmcCreator::new(&permissive).unwrap().create().unwrap();
        let strict = config_with_cap(1.0, 1.5);

        let err = OptimalPolicyFinder::new()
            .find_optimal_policy_with_chain(&strict, &chain, 6)
            .unwrap_err();
        assert!(matches!(err, LpError::MalformedInstance(_)));

        // mesma legalidade: aceita
        assert!(OptimalPolicyFinder::new()
            .find_optimal_policy_with_chain(&permissive.with_eta(0.5).unwrap(), &chain, 6)
            .is_ok());
    }

    #[test]
    fn test_optimal_policy_serialization() {
        let found = OptimalPolicyFinder::new().find_optimal_policy_for_given_eta(&config(1.0), 6).unwrap();
        let value = serde_json::to_value(&found).unwrap();

        assert_eq!(value["eta"], 1.0);
        let entries = value["policy"].as_array().unwrap();
        assert_eq!(entries.len(), found.policy.len());
        assert!(value["expected_delay"].as_f64().unwrap() > 0.0);
    }
}
