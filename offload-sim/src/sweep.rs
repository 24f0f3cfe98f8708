//! Varredura das probabilidades de chegada
//!
//! Cada combinação de alphas (produto cartesiano das faixas por fila) é um
//! pipeline independente: resolve a cadeia compartilhada, resolve o LP e
//! simula as quatro baselines e a política estocástica com a mesma semente.

use crate::error::{SimResult, SimulationError};
use crate::simulator::{DEFAULT_SEED, Simulator};
use offload_core::parallel::{default_workers, run_indexed};
use offload_core::{
    GreedyLocalFirstPolicy, GreedyOffloadFirstPolicy, LocalOnlyPolicy, OffloadingSystemConfig, ParameterRange,
    Policy, TransmitOnlyPolicy, cartesian_product,
};
use offload_dtmc::{DiscreteTimeMarkovChain, DtmcCreator};
use offload_lp::{LpOracle, MinilpOracle, OptimalPolicyFinder, tolerance};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Janela de erro padrão: `estocástico · janela < baseline`
pub const DEFAULT_ERROR_WINDOW: f64 = 0.99;

/// Espalha as sementes dos pontos da varredura
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Atrasos simulados de um ponto da varredura
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaDelayResult {
    pub alpha: Vec<f64>,
    pub local_only_delay: f64,
    pub offload_only_delay: f64,
    pub greedy_offload_first_delay: f64,
    pub greedy_local_first_delay: f64,
    pub stochastic_delay: f64,
    /// Atraso previsto pelo LP
    pub expected_stochastic_delay: f64,
}

impl AlphaDelayResult {
    /// (nome, atraso) das baselines
    pub fn baselines(&self) -> [(&'static str, f64); 4] {
        [
            ("LocalOnly", self.local_only_delay),
            ("TransmitOnly", self.offload_only_delay),
            ("GreedyOffloadFirst", self.greedy_offload_first_delay),
            ("GreedyLocalFirst", self.greedy_local_first_delay),
        ]
    }

    /// Melhor baseline
    pub fn best_baseline(&self) -> (&'static str, f64) {
        self.baselines()
            .into_iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or(("LocalOnly", self.local_only_delay))
    }

    /// Exige `stochastic_delay · window < baseline` para todas as baselines
    pub fn validate(&self, window: f64) -> SimResult<()> {
        let scaled = self.stochastic_delay * window;
        match self.baselines().into_iter().find(|&(_, delay)| !(scaled < delay)) {
            Some((baseline, baseline_delay)) => Err(SimulationError::BaselineDominates {
                baseline: baseline.to_string(),
                baseline_delay,
                stochastic_delay: self.stochastic_delay,
                window,
                alpha: self.alpha.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Resultado da varredura, alinhado ao produto cartesiano das faixas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    pub alpha_ranges: Vec<ParameterRange>,
    pub points: Vec<AlphaDelayResult>,
}

impl SweepResult {
    fn column(&self, pick: fn(&AlphaDelayResult) -> f64) -> Vec<f64> {
        self.points.iter().map(pick).collect()
    }

    pub fn local_only_delays(&self) -> Vec<f64> {
        self.column(|p| p.local_only_delay)
    }

    pub fn offload_only_delays(&self) -> Vec<f64> {
        self.column(|p| p.offload_only_delay)
    }

    pub fn greedy_offload_first_delays(&self) -> Vec<f64> {
        self.column(|p| p.greedy_offload_first_delay)
    }

    pub fn greedy_local_first_delays(&self) -> Vec<f64> {
        self.column(|p| p.greedy_local_first_delay)
    }

    pub fn stochastic_delays(&self) -> Vec<f64> {
        self.column(|p| p.stochastic_delay)
    }
}

/// Testador de políticas sobre faixas de alpha por fila
#[derive(Debug, Clone)]
pub struct RangedAlphaTester<O: LpOracle = MinilpOracle> {
    base_config: OffloadingSystemConfig,
    alpha_ranges: Vec<ParameterRange>,
    precision: u32,
    simulation_ticks: u64,
    assertions_enabled: bool,
    error_window: f64,
    seed: u64,
    workers: usize,
    finder: OptimalPolicyFinder<O>,
}

impl RangedAlphaTester {
    pub fn new(
        base_config: &OffloadingSystemConfig,
        alpha_ranges: Vec<ParameterRange>,
        precision: u32,
        simulation_ticks: u64,
        assertions_enabled: bool,
    ) -> SimResult<Self> {
        Self::with_finder(
            base_config,
            alpha_ranges,
            precision,
            simulation_ticks,
            assertions_enabled,
            OptimalPolicyFinder::new(),
        )
    }
}

impl<O: LpOracle> RangedAlphaTester<O> {
    /// Construtor com um buscador de políticas próprio
    pub fn with_finder(
        base_config: &OffloadingSystemConfig,
        alpha_ranges: Vec<ParameterRange>,
        precision: u32,
        simulation_ticks: u64,
        assertions_enabled: bool,
        finder: OptimalPolicyFinder<O>,
    ) -> SimResult<Self> {
        if alpha_ranges.is_empty() {
            return Err(SimulationError::InvalidSweep("at least one alpha range is required".into()));
        }
        if alpha_ranges.len() != base_config.number_of_queues() {
            return Err(SimulationError::InvalidSweep(format!(
                "{} alpha ranges for {} queues",
                alpha_ranges.len(),
                base_config.number_of_queues()
            )));
        }
        for range in &alpha_ranges {
            range.validate_arrival_probability()?;
        }
        tolerance(precision)?;
        if simulation_ticks == 0 {
            return Err(SimulationError::EmptyRun);
        }

        Ok(Self {
            base_config: base_config.clone(),
            alpha_ranges,
            precision,
            simulation_ticks,
            assertions_enabled,
            error_window: DEFAULT_ERROR_WINDOW,
            seed: DEFAULT_SEED,
            workers: default_workers(),
            finder,
        })
    }

    /// Janela em (0, 1]; menor tolera mais ruído de simulação
    pub fn with_error_window(mut self, window: f64) -> SimResult<Self> {
        if !(window > 0.0 && window <= 1.0) {
            return Err(SimulationError::InvalidSweep(format!("error window must be in (0, 1], got {window}")));
        }
        self.error_window = window;
        Ok(self)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Combinações de alpha, na ordem dos resultados
    pub fn alpha_combinations(&self) -> Vec<Vec<f64>> {
        let lists: Vec<Vec<f64>> = self.alpha_ranges.iter().map(ParameterRange::to_vec).collect();
        cartesian_product(&lists)
    }

    /// Semente do ponto `index`
    pub fn point_seed(&self, index: usize) -> u64 {
        self.seed.wrapping_add((index as u64).wrapping_mul(SEED_STRIDE))
    }

    pub fn run(&self) -> SimResult<SweepResult> {
        let combinations = self.alpha_combinations();
        let chain = DtmcCreator::new(&self.base_config)?.create()?;
        info!(
            points = combinations.len(),
            ticks = self.simulation_ticks,
            workers = self.workers,
            "alpha sweep started"
        );

        let chain = &chain;
        let points = run_indexed(combinations, self.workers, |index, alpha| {
            self.delays_for_alpha(index, alpha, chain)
        })
        .into_iter()
        .collect::<SimResult<Vec<_>>>()?;

        if self.assertions_enabled {
            for point in &points {
                point.validate(self.error_window)?;
            }
        }

        Ok(SweepResult {
            alpha_ranges: self.alpha_ranges.clone(),
            points,
        })
    }

    fn delays_for_alpha(
        &self,
        index: usize,
        alpha: Vec<f64>,
        chain: &DiscreteTimeMarkovChain,
    ) -> SimResult<AlphaDelayResult> {
        let config = self.base_config.with_alpha(alpha.clone())?;
        let simulator = Simulator::new(&config)?.with_seed(self.point_seed(index));
        let optimal = self.finder.find_optimal_policy_with_chain(&config, chain, self.precision)?;

        let delay = |policy: &dyn Policy| -> SimResult<f64> {
            Ok(simulator.simulate_policy(policy, self.simulation_ticks)?.average_delay)
        };

        let result = AlphaDelayResult {
            local_only_delay: delay(&LocalOnlyPolicy)?,
            offload_only_delay: delay(&TransmitOnlyPolicy)?,
            greedy_offload_first_delay: delay(&GreedyOffloadFirstPolicy)?,
            greedy_local_first_delay: delay(&GreedyLocalFirstPolicy)?,
            stochastic_delay: delay(&optimal.policy)?,
            expected_stochastic_delay: optimal.expected_delay,
            alpha,
        };

        let (baseline, baseline_delay) = result.best_baseline();
        info!(
            index,
            alpha = ?result.alpha,
            stochastic = result.stochastic_delay,
            baseline,
            baseline_delay,
            "alpha point simulated"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offload_core::{
        EnvironmentParameters, UserEquipmentComponentsConfig, UserEquipmentConfig, UserEquipmentStateConfig,
    };

    fn point(stochastic: f64, baselines: [f64; 4]) -> AlphaDelayResult {
        AlphaDelayResult {
            alpha: vec![0.5],
            local_only_delay: baselines[0],
            offload_only_delay: baselines[1],
            greedy_offload_first_delay: baselines[2],
            greedy_local_first_delay: baselines[3],
            stochastic_delay: stochastic,
            expected_stochastic_delay: stochastic,
        }
    }

    fn base_config() -> OffloadingSystemConfig {
        OffloadingSystemConfig::new(
            UserEquipmentConfig {
                state_config: UserEquipmentStateConfig::single_queue(3, 2, 2),
                components_config: UserEquipmentComponentsConfig::single_queue(0.3, 0.6, 5.0, 1.0, 1.0, 10.0),
            },
            EnvironmentParameters::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_error_window() {
        // até ~1% pior que a melhor baseline é aceito
        assert!(point(1.005, [1.0, 2.0, 1.5, 1.2]).validate(0.99).is_ok());
        let err = point(1.02, [1.0, 2.0, 1.5, 1.2]).validate(0.99).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::BaselineDominates { ref baseline, .. } if baseline == "LocalOnly"
        ));
        assert!(point(1.0, [1.0, 1.0, 1.0, 1.0]).validate(1.0).is_err());
    }

    #[test]
    fn test_best_baseline() {
        let p = point(1.0, [3.0, 2.0, 1.5, 1.7]);
        assert_eq!(p.best_baseline(), ("GreedyOffloadFirst", 1.5));
    }

    #[test]
    fn test_constructor_validation() {
        let config = base_config();
        let range = ParameterRange::Constant(0.3);

        assert!(RangedAlphaTester::new(&config, vec![], 6, 100, false).is_err());
        assert!(RangedAlphaTester::new(&config, vec![range, range], 6, 100, false).is_err());
        assert!(RangedAlphaTester::new(&config, vec![ParameterRange::Constant(1.3)], 6, 100, false).is_err());
        assert!(RangedAlphaTester::new(&config, vec![range], 0, 100, false).is_err());
        assert!(RangedAlphaTester::new(&config, vec![range], 6, 0, false).is_err());

        let tester = RangedAlphaTester::new(&config, vec![range], 6, 100, false).unwrap();
        assert!(tester.clone().with_error_window(0.0).is_err());
        assert!(tester.with_error_window(0.95).is_ok());
    }

    #[test]
    fn test_point_seeds_differ() {
        let tester = RangedAlphaTester::new(&base_config(), vec![ParameterRange::Constant(0.3)], 6, 100, false)
            .unwrap()
            .with_seed(42);
        assert_eq!(tester.point_seed(0), 42);
        assert_ne!(tester.point_seed(1), tester.point_seed(2));
    }

    #[test]
    fn test_combinations_follow_cartesian_order() {
        let config = OffloadingSystemConfig::new(
            UserEquipmentConfig {
                state_config: UserEquipmentStateConfig::multi_queue(vec![2, 2], 1, 1),
                components_config: UserEquipmentComponentsConfig::multi_queue(vec![0.2, 0.2], 0.6, 5.0, 1.0, 1.0, 10.0),
            },
            EnvironmentParameters::default(),
        )
        .unwrap();
        let tester = RangedAlphaTester::new(
            &config,
            vec![
                ParameterRange::Variable { start: 0.1, end: 0.2, count: 2 },
                ParameterRange::Constant(0.3),
            ],
            6,
            100,
            false,
        )
        .unwrap();

        assert_eq!(tester.alpha_combinations(), vec![vec![0.1, 0.3], vec![0.2, 0.3]]);
    }
}
