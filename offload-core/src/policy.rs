//! Políticas de offloading
//!
//! Uma única capacidade: dada a situação do UE e suas ações legais, produzir
//! uma distribuição de probabilidade sobre ações. Baselines determinísticas
//! retornam distribuições degeneradas (one-hot).

use crate::action::Action;
use crate::state::UserEquipmentState;
use std::collections::HashMap;

/// Distribuição sobre ações: pares (ação, probabilidade)
pub type ActionDistribution = Vec<(Action, f64)>;

/// Capacidade comum consumida pelo simulador
pub trait Policy: Send + Sync {
    /// Nome da política
    fn name(&self) -> &str;

    /// Distribuição sobre `legal_actions` para `state`
    fn distribution_for(&self, state: &UserEquipmentState, legal_actions: &[Action]) -> ActionDistribution;
}

/// Política que escolhe uma única ação por estado
pub trait DeterministicPolicy: Send + Sync {
    fn name(&self) -> &str;

    fn action_for(&self, state: &UserEquipmentState, legal_actions: &[Action]) -> Action;
}

impl<T: DeterministicPolicy> Policy for T {
    fn name(&self) -> &str {
        DeterministicPolicy::name(self)
    }

    fn distribution_for(&self, state: &UserEquipmentState, legal_actions: &[Action]) -> ActionDistribution {
        vec![(self.action_for(state, legal_actions), 1.0)]
    }
}

/// Ação legal do tipo pedido, servindo a fila mais longa (empate: menor índice)
fn longest_queue(state: &UserEquipmentState, legal_actions: &[Action], kind: fn(&Action) -> bool) -> Option<Action> {
    legal_actions
        .iter()
        .copied()
        .filter(|action| kind(action))
        .max_by_key(|action| {
            let q = action.queue().unwrap_or(0);
            (state.task_queue_lengths.get(q).copied().unwrap_or(0), std::cmp::Reverse(q))
        })
}

fn is_cpu(action: &Action) -> bool {
    matches!(action, Action::AddToCpu(_))
}

fn is_tu(action: &Action) -> bool {
    matches!(action, Action::AddToTransmissionUnit(_))
}

fn is_both(action: &Action) -> bool {
    matches!(action, Action::AddToBothUnits(_))
}

/// Sempre processa localmente quando possível
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalOnlyPolicy;

impl DeterministicPolicy for LocalOnlyPolicy {
    fn name(&self) -> &str {
        "LocalOnly"
    }

    fn action_for(&self, state: &UserEquipmentState, legal_actions: &[Action]) -> Action {
        longest_queue(state, legal_actions, is_cpu).unwrap_or(Action::NoOperation)
    }
}

/// Sempre transmite quando possível
#[derive(Debug, Clone, Copy, Default)]
pub struct TransmitOnlyPolicy;

impl DeterministicPolicy for TransmitOnlyPolicy {
    fn name(&self) -> &str {
        "TransmitOnly"
    }

    fn action_for(&self, state: &UserEquipmentState, legal_actions: &[Action]) -> Action {
        longest_queue(state, legal_actions, is_tu).unwrap_or(Action::NoOperation)
    }
}

/// Prefere transmitir; senão processa localmente
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyOffloadFirstPolicy;

impl DeterministicPolicy for GreedyOffloadFirstPolicy {
    fn name(&self) -> &str {
        "GreedyOffloadFirst"
    }

    fn action_for(&self, state: &UserEquipmentState, legal_actions: &[Action]) -> Action {
        longest_queue(state, legal_actions, is_tu)
            .or_else(|| longest_queue(state, legal_actions, is_cpu))
            .unwrap_or(Action::NoOperation)
    }
}

/// Prefere processar localmente; senão transmite
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyLocalFirstPolicy;

impl DeterministicPolicy for GreedyLocalFirstPolicy {
    fn name(&self) -> &str {
        "GreedyLocalFirst"
    }

    fn action_for(&self, state: &UserEquipmentState, legal_actions: &[Action]) -> Action {
        longest_queue(state, legal_actions, is_cpu)
            .or_else(|| longest_queue(state, legal_actions, is_tu))
            .unwrap_or(Action::NoOperation)
    }
}

/// Admite o máximo possível: ambas as unidades, depois TU, depois CPU
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkConservingPolicy;

impl DeterministicPolicy for WorkConservingPolicy {
    fn name(&self) -> &str {
        "WorkConserving"
    }

    fn action_for(&self, state: &UserEquipmentState, legal_actions: &[Action]) -> Action {
        longest_queue(state, legal_actions, is_both)
            .or_else(|| longest_queue(state, legal_actions, is_tu))
            .or_else(|| longest_queue(state, legal_actions, is_cpu))
            .unwrap_or(Action::NoOperation)
    }
}

/// Política estocástica estacionária: tabela estado → distribuição
///
/// Imutável após a construção. Estados fora da tabela (sem massa
/// estacionária) usam `WorkConservingPolicy`.
#[derive(Debug, Clone)]
pub struct StochasticPolicy {
    name: String,
    table: HashMap<UserEquipmentState, ActionDistribution>,
}

impl StochasticPolicy {
    pub fn new(name: impl Into<String>, table: HashMap<UserEquipmentState, ActionDistribution>) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }

    /// Distribuição registrada para o estado
    pub fn distribution(&self, state: &UserEquipmentState) -> Option<&ActionDistribution> {
        self.table.get(state)
    }

    /// Probabilidade de `action` em `state` (0 se ausente)
    pub fn probability(&self, state: &UserEquipmentState, action: Action) -> f64 {
        self.table
            .get(state)
            .and_then(|dist| dist.iter().find(|(a, _)| *a == action))
            .map_or(0.0, |(_, p)| *p)
    }

    /// Número de estados com distribuição explícita
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserEquipmentState, &ActionDistribution)> {
        self.table.iter()
    }
}

impl Policy for StochasticPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn distribution_for(&self, state: &UserEquipmentState, legal_actions: &[Action]) -> ActionDistribution {
        match self.table.get(state) {
            Some(distribution) => distribution.clone(),
            None => WorkConservingPolicy.distribution_for(state, legal_actions),
        }
    }
}

/// As quatro baselines determinísticas
pub fn baseline_policies() -> Vec<Box<dyn Policy>> {
    vec![
        Box::new(LocalOnlyPolicy),
        Box::new(TransmitOnlyPolicy),
        Box::new(GreedyOffloadFirstPolicy),
        Box::new(GreedyLocalFirstPolicy),
    ]
}
