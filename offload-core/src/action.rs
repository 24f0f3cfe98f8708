//! Alfabeto de ações do UE

use std::fmt;

/// Ação tomada a cada tick; o índice é a fila de onde sai a tarefa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Action {
    NoOperation,
    /// Admite a cabeça da fila no processamento local
    AddToCpu(usize),
    /// Admite a cabeça da fila na unidade de transmissão
    AddToTransmissionUnit(usize),
    /// Admite duas tarefas da mesma fila, uma em cada unidade
    AddToBothUnits(usize),
}

impl Action {
    /// Todas as ações possíveis para `number_of_queues` filas
    pub fn all(number_of_queues: usize) -> Vec<Action> {
        std::iter::once(Action::NoOperation)
            .chain((0..number_of_queues).flat_map(|q| {
                [
                    Action::AddToCpu(q),
                    Action::AddToTransmissionUnit(q),
                    Action::AddToBothUnits(q),
                ]
            }))
            .collect()
    }

    /// Fila de origem, se a ação admite tarefas
    pub fn queue(&self) -> Option<usize> {
        match *self {
            Action::NoOperation => None,
            Action::AddToCpu(q) | Action::AddToTransmissionUnit(q) | Action::AddToBothUnits(q) => Some(q),
        }
    }

    pub fn admits_to_cpu(&self) -> bool {
        matches!(self, Action::AddToCpu(_) | Action::AddToBothUnits(_))
    }

    pub fn admits_to_tu(&self) -> bool {
        matches!(self, Action::AddToTransmissionUnit(_) | Action::AddToBothUnits(_))
    }

    /// Tarefas retiradas da fila
    pub fn tasks_taken(&self) -> u32 {
        match self {
            Action::NoOperation => 0,
            Action::AddToCpu(_) | Action::AddToTransmissionUnit(_) => 1,
            Action::AddToBothUnits(_) => 2,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::NoOperation => write!(f, "NoOperation"),
            Action::AddToCpu(q) => write!(f, "AddToCpu({q})"),
            Action::AddToTransmissionUnit(q) => write!(f, "AddToTransmissionUnit({q})"),
            Action::AddToBothUnits(q) => write!(f, "AddToBothUnits({q})"),
        }
    }
}
