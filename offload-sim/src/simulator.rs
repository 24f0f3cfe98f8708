//! Simulador em tempo discreto do UE
//!
//! Um tick: o custo de fila é acumulado no estado corrente, a política
//! escolhe uma ação legal, e a mesma função de transição usada pela DTMC
//! aplica admissão, TU, CPU e chegadas.
//!
//! Dois fluxos `StdRng` independentes: o do ambiente sorteia todos os
//! eventos em todo tick, na mesma ordem, e o da política só amostra ações.
//! Com a mesma semente, políticas diferentes enfrentam a mesma realização
//! de chegadas e sucessos.

use crate::error::{SimResult, SimulationError};
use offload_core::{
    Action, ActionDistribution, OffloadingSystemConfig, Outcome, Policy, StochasticEvent, UserEquipmentDynamics,
    UserEquipmentState,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Semente padrão
pub const DEFAULT_SEED: u64 = 0x0FF1_0AD5_EED0_0001;

/// Separa o fluxo da política do fluxo do ambiente
const POLICY_STREAM: u64 = 0x5DEE_CE66_D1CE_B00C;

/// Capacidade inicial máxima do trace; o vetor cresce sob demanda
const TRACE_PREALLOCATION: u64 = 1 << 16;

/// Um tick registrado no trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub tick: u64,
    pub state: UserEquipmentState,
    pub action: Action,
    pub next_state: UserEquipmentState,
    pub power: f64,
}

/// Estatísticas agregadas de uma execução
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub policy: String,
    pub ticks: u64,
    /// Comprimento médio de fila dividido pela taxa oferecida Σα
    pub average_delay: f64,
    pub average_queue_length: f64,
    pub average_power: f64,
    /// Chegadas sorteadas, aceitas ou descartadas
    pub arrived_tasks: u64,
    pub dropped_tasks: u64,
    pub local_completions: u64,
    pub offloaded_completions: u64,
    /// Latência fim a fim média das tarefas concluídas (ticks)
    pub average_task_latency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<TickRecord>>,
}

impl SimulationStats {
    /// Fração das chegadas descartadas
    pub fn drop_ratio(&self) -> f64 {
        if self.arrived_tasks == 0 {
            0.0
        } else {
            self.dropped_tasks as f64 / self.arrived_tasks as f64
        }
    }
}

/// Estágio remoto: `n_cloud` réplicas, cada tarefa ocupa uma por `t_rx` ticks
#[derive(Debug, Clone)]
struct RemoteStage {
    replica_free_at: Vec<f64>,
    t_rx: f64,
}

impl RemoteStage {
    fn new(n_cloud: u32, t_rx: f64) -> Self {
        Self {
            replica_free_at: vec![0.0; n_cloud as usize],
            t_rx,
        }
    }

    /// Instante em que a resposta de uma tarefa enviada em `uploaded_at` chega
    fn serve(&mut self, uploaded_at: f64) -> f64 {
        let Some(replica) = self
            .replica_free_at
            .iter_mut()
            .min_by(|a, b| a.total_cmp(b))
        else {
            return uploaded_at + self.t_rx;
        };
        let finish = (*replica).max(uploaded_at) + self.t_rx;
        *replica = finish;
        finish
    }
}

/// Idades das tarefas em fila e em serviço
#[derive(Debug, Clone)]
struct LatencyTracker {
    queues: Vec<VecDeque<u64>>,
    in_transmission: Option<u64>,
    in_processing: Option<u64>,
    total: f64,
    completed: u64,
}

impl LatencyTracker {
    fn new(number_of_queues: usize) -> Self {
        Self {
            queues: vec![VecDeque::new(); number_of_queues],
            in_transmission: None,
            in_processing: None,
            total: 0.0,
            completed: 0,
        }
    }

    /// Mais antigas saem primeiro; com ambas as unidades, a TU recebe a primeira
    fn admit(&mut self, action: Action) {
        let Some(queue) = action.queue().and_then(|q| self.queues.get_mut(q)) else {
            return;
        };
        if action.admits_to_tu() {
            self.in_transmission = queue.pop_front();
        }
        if action.admits_to_cpu() {
            self.in_processing = queue.pop_front();
        }
    }

    fn record(&mut self, arrived_at: Option<u64>, finished_at: f64) {
        if let Some(arrived_at) = arrived_at {
            self.total += finished_at - arrived_at as f64;
            self.completed += 1;
        }
    }

    fn average(&self) -> Option<f64> {
        (self.completed > 0).then(|| self.total / self.completed as f64)
    }
}

/// Simulador semeado de uma configuração
#[derive(Debug, Clone)]
pub struct Simulator {
    config: OffloadingSystemConfig,
    dynamics: UserEquipmentDynamics,
    seed: u64,
    record_trace: bool,
}

impl Simulator {
    pub fn new(config: &OffloadingSystemConfig) -> SimResult<Self> {
        Ok(Self {
            config: config.clone(),
            dynamics: UserEquipmentDynamics::new(config)?,
            seed: DEFAULT_SEED,
            record_trace: false,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Guarda um registro por tick
    pub fn with_trace(mut self, record_trace: bool) -> Self {
        self.record_trace = record_trace;
        self
    }

    pub fn config(&self) -> &OffloadingSystemConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Executa `policy` por `number_of_ticks` ticks a partir do UE ocioso
    pub fn simulate_policy(&self, policy: &dyn Policy, number_of_ticks: u64) -> SimResult<SimulationStats> {
        if number_of_ticks == 0 {
            return Err(SimulationError::EmptyRun);
        }

        let components = self.config.components();
        let queues = self.config.number_of_queues();
        let environment = &self.config.environment_parameters;

        let mut environment_rng = StdRng::seed_from_u64(self.seed);
        let mut policy_rng = StdRng::seed_from_u64(self.seed ^ POLICY_STREAM);

        let mut state = UserEquipmentState::idle(queues);
        let mut remote = RemoteStage::new(environment.n_cloud, environment.t_rx);
        let mut latency = LatencyTracker::new(queues);
        let mut trace = self
            .record_trace
            .then(|| Vec::with_capacity(number_of_ticks.min(TRACE_PREALLOCATION) as usize));

        let mut queue_length_sum = 0u64;
        let mut power_sum = 0.0;
        let mut arrived_tasks = 0u64;
        let mut dropped_tasks = 0u64;
        let mut local_completions = 0u64;
        let mut offloaded_completions = 0u64;

        for tick in 0..number_of_ticks {
            queue_length_sum += u64::from(state.total_queue_length());

            let legal = self.dynamics.legal_actions(&state);
            let distribution = policy.distribution_for(&state, &legal);
            let action = sample_action(&distribution, &mut policy_rng).ok_or_else(|| SimulationError::InvalidPolicy {
                policy: policy.name().to_string(),
                state: state.to_string(),
            })?;
            let power = self.dynamics.tick_power(&state, action);
            power_sum += power;

            let mut outcome = Outcome::quiet(queues);
            for q in 0..queues {
                outcome.set(StochasticEvent::Arrival(q), environment_rng.gen_bool(components.alpha[q]));
            }
            outcome.set(StochasticEvent::Transmission, environment_rng.gen_bool(components.beta));
            outcome.set(StochasticEvent::LocalProcessing, environment_rng.gen_bool(components.gamma));

            let result = self.dynamics.step(&state, action, &outcome)?;
            latency.admit(action);

            let end_of_tick = (tick + 1) as f64;
            if result.local_completed {
                local_completions += 1;
                let arrived_at = latency.in_processing.take();
                latency.record(arrived_at, end_of_tick);
            }
            if result.transmission_completed {
                offloaded_completions += 1;
                let arrived_at = latency.in_transmission.take();
                let replied_at = remote.serve(end_of_tick);
                latency.record(arrived_at, replied_at);
            }
            for q in 0..queues {
                if result.accepted[q] {
                    arrived_tasks += 1;
                    latency.queues[q].push_back(tick + 1);
                }
                if result.dropped[q] {
                    arrived_tasks += 1;
                    dropped_tasks += 1;
                }
            }

            if let Some(trace) = trace.as_mut() {
                trace.push(TickRecord {
                    tick,
                    state: state.clone(),
                    action,
                    next_state: result.next_state.clone(),
                    power,
                });
            }
            state = result.next_state;
        }

        let ticks = number_of_ticks as f64;
        let average_queue_length = queue_length_sum as f64 / ticks;
        let stats = SimulationStats {
            policy: policy.name().to_string(),
            ticks: number_of_ticks,
            average_delay: average_queue_length / components.total_arrival_rate(),
            average_queue_length,
            average_power: power_sum / ticks,
            arrived_tasks,
            dropped_tasks,
            local_completions,
            offloaded_completions,
            average_task_latency: latency.average(),
            trace,
        };

        debug!(
            policy = %stats.policy,
            ticks = number_of_ticks,
            delay = stats.average_delay,
            power = stats.average_power,
            dropped = stats.dropped_tasks,
            "simulation finished"
        );
        Ok(stats)
    }
}

/// Amostra uma ação; `None` para distribuição vazia ou sem massa
fn sample_action(distribution: &ActionDistribution, rng: &mut StdRng) -> Option<Action> {
    match distribution.as_slice() {
        [] => None,
        [(action, _)] => Some(*action),
        entries => {
            let total: f64 = entries.iter().map(|(_, p)| p.max(0.0)).sum();
            if !(total > 0.0) {
                return None;
            }
            let mut threshold = rng.gen_range(0.0..total);
            for &(action, p) in entries {
                let p = p.max(0.0);
                if threshold < p {
                    return Some(action);
                }
                threshold -= p;
            }
            // arredondamento: última ação com massa
            entries.iter().rev().find(|(_, p)| *p > 0.0).map(|(action, _)| *action)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offload_core::{
        EnvironmentParameters, GreedyLocalFirstPolicy, LocalOnlyPolicy, StochasticPolicy, TransmitOnlyPolicy,
        UserEquipmentComponentsConfig, UserEquipmentConfig, UserEquipmentStateConfig,
    };
    use std::collections::HashMap;

    fn config(alpha: f64, n_cloud: u32, t_rx: f64) -> OffloadingSystemConfig {
        OffloadingSystemConfig::new(
            UserEquipmentConfig {
                state_config: UserEquipmentStateConfig::single_queue(4, 2, 2),
                components_config: UserEquipmentComponentsConfig::single_queue(alpha, 0.7, 5.0, 1.0, 1.5, 10.0),
            },
            EnvironmentParameters::new(n_cloud, t_rx),
        )
        .unwrap()
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let simulator = Simulator::new(&config(0.4, 1, 0.0)).unwrap().with_seed(7);
        let a = simulator.simulate_policy(&LocalOnlyPolicy, 5_000).unwrap();
        let b = simulator.simulate_policy(&LocalOnlyPolicy, 5_000).unwrap();
        assert_eq!(a, b);

        let other = Simulator::new(&config(0.4, 1, 0.0)).unwrap().with_seed(8);
        let c = other.simulate_policy(&LocalOnlyPolicy, 5_000).unwrap();
        assert_ne!(a.average_queue_length, c.average_queue_length);
    }

    #[test]
    fn test_arrivals_are_shared_across_policies() {
        let simulator = Simulator::new(&config(0.3, 1, 0.0)).unwrap();
        let local = simulator.simulate_policy(&LocalOnlyPolicy, 3_000).unwrap();
        let transmit = simulator.simulate_policy(&TransmitOnlyPolicy, 3_000).unwrap();
        assert_eq!(local.arrived_tasks, transmit.arrived_tasks);
    }

    #[test]
    fn test_task_conservation() {
        let simulator = Simulator::new(&config(0.5, 1, 0.0)).unwrap();
        let stats = simulator.simulate_policy(&LocalOnlyPolicy, 10_000).unwrap();
        let completed = stats.local_completions + stats.offloaded_completions;
        // sobra no máximo o que cabe na fila e nas unidades
        let in_system = stats.arrived_tasks - stats.dropped_tasks - completed;
        assert!(in_system <= 4 + 2);
        assert_eq!(stats.offloaded_completions, 0);
        assert!((stats.average_delay - stats.average_queue_length / 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_trace_records_every_tick() {
        let simulator = Simulator::new(&config(0.5, 1, 0.0)).unwrap().with_trace(true);
        let stats = simulator.simulate_policy(&TransmitOnlyPolicy, 200).unwrap();
        let trace = stats.trace.unwrap();
        assert_eq!(trace.len(), 200);
        assert_eq!(trace[0].state, UserEquipmentState::single_queue(0, 0, 0));
        for pair in trace.windows(2) {
            assert_eq!(pair[0].next_state, pair[1].state);
        }
    }

    #[test]
    fn test_trace_grows_past_preallocation() {
        let ticks = TRACE_PREALLOCATION + 1_000;
        let simulator = Simulator::new(&config(0.5, 1, 0.0)).unwrap().with_trace(true);
        let stats = simulator.simulate_policy(&GreedyLocalFirstPolicy, ticks).unwrap();
        let trace = stats.trace.unwrap();
        assert_eq!(trace.len() as u64, ticks);
        assert_eq!(trace.last().unwrap().tick, ticks - 1);
    }

    #[test]
    fn test_zero_ticks_is_rejected() {
        let simulator = Simulator::new(&config(0.5, 1, 0.0)).unwrap();
        assert!(matches!(
            simulator.simulate_policy(&LocalOnlyPolicy, 0),
            Err(SimulationError::EmptyRun)
        ));
    }

    #[test]
    fn test_illegal_policy_action_is_reported() {
        let mut table = HashMap::new();
        table.insert(UserEquipmentState::single_queue(0, 0, 0), vec![(Action::AddToCpu(0), 1.0)]);
        let policy = StochasticPolicy::new("broken", table);

        let simulator = Simulator::new(&config(0.5, 1, 0.0)).unwrap();
        let err = simulator.simulate_policy(&policy, 10).unwrap_err();
        assert!(matches!(err, SimulationError::Core(_)));

        let mut table = HashMap::new();
        table.insert(UserEquipmentState::single_queue(0, 0, 0), Vec::new());
        let empty = StochasticPolicy::new("empty", table);
        let err = simulator.simulate_policy(&empty, 10).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidPolicy { .. }));
    }

    #[test]
    fn test_cloud_replicas_reduce_latency() {
        let slow = Simulator::new(&config(0.6, 1, 6.0)).unwrap();
        let fast = Simulator::new(&config(0.6, 4, 6.0)).unwrap();
        let slow = slow.simulate_policy(&TransmitOnlyPolicy, 20_000).unwrap();
        let fast = fast.simulate_policy(&TransmitOnlyPolicy, 20_000).unwrap();

        // a fila do UE não depende da nuvem
        assert_eq!(slow.average_queue_length, fast.average_queue_length);
        assert!(fast.average_task_latency.unwrap() < slow.average_task_latency.unwrap());
    }

    #[test]
    fn test_sample_action() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sample_action(&Vec::new(), &mut rng), None);
        assert_eq!(
            sample_action(&vec![(Action::NoOperation, 1.0)], &mut rng),
            Some(Action::NoOperation)
        );

        let distribution = vec![(Action::NoOperation, 0.25), (Action::AddToCpu(0), 0.75)];
        let cpu = (0..4_000)
            .filter(|_| sample_action(&distribution, &mut rng) == Some(Action::AddToCpu(0)))
            .count();
        assert!((2_800..3_200).contains(&cpu), "{cpu}");
    }

    #[test]
    fn test_stats_serialize() {
        let simulator = Simulator::new(&config(0.4, 1, 0.0)).unwrap();
        let stats = simulator.simulate_policy(&LocalOnlyPolicy, 100).unwrap();
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"average_delay\""));
        assert!(!json.contains("\"trace\""));
    }
}
