//! Estado do UE e enumeração do espaço de estados

use crate::config::UserEquipmentStateConfig;
use crate::error::CoreResult;
use std::fmt;

/// Estado do UE: filas, ocupação da TU e da CPU
///
/// `tu_state = k > 0` significa que o pacote `k` da tarefa na TU está sendo
/// transmitido; `cpu_state = k > 0` significa que a seção `k` está em
/// processamento. Zero indica unidade ociosa.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct UserEquipmentState {
    pub task_queue_lengths: Vec<u32>,
    pub tu_state: u32,
    pub cpu_state: u32,
}

impl UserEquipmentState {
    pub fn new(task_queue_lengths: Vec<u32>, tu_state: u32, cpu_state: u32) -> Self {
        Self {
            task_queue_lengths,
            tu_state,
            cpu_state,
        }
    }

    /// Estado de fila única (l, t, c)
    pub fn single_queue(task_queue_length: u32, tu_state: u32, cpu_state: u32) -> Self {
        Self::new(vec![task_queue_length], tu_state, cpu_state)
    }

    /// Filas vazias e unidades ociosas
    pub fn idle(number_of_queues: usize) -> Self {
        Self::new(vec![0; number_of_queues], 0, 0)
    }

    /// Total de tarefas esperando nas filas
    pub fn total_queue_length(&self) -> u32 {
        self.task_queue_lengths.iter().sum()
    }

    pub fn is_tu_active(&self) -> bool {
        self.tu_state > 0
    }

    pub fn is_cpu_active(&self) -> bool {
        self.cpu_state > 0
    }

    /// Verifica se cada coordenada respeita a capacidade
    pub fn fits(&self, config: &UserEquipmentStateConfig) -> bool {
        self.task_queue_lengths.len() == config.task_queue_capacities.len()
            && self
                .task_queue_lengths
                .iter()
                .zip(&config.task_queue_capacities)
                .all(|(len, cap)| len <= cap)
            && self.tu_state <= config.tu_number_of_packets
            && self.cpu_state <= config.cpu_number_of_sections
    }

    fn from_digits(digits: &[u32]) -> Self {
        let queues = digits.len() - 2;
        Self::new(digits[..queues].to_vec(), digits[queues], digits[queues + 1])
    }
}

impl fmt::Display for UserEquipmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.task_queue_lengths.as_slice() {
            [single] => write!(f, "({single}, {}, {})", self.tu_state, self.cpu_state),
            lengths => write!(f, "({lengths:?}, {}, {})", self.tu_state, self.cpu_state),
        }
    }
}

impl UserEquipmentStateConfig {
    /// Todos os estados do produto cartesiano, em ordem lexicográfica
    ///
    /// Função pura da configuração: sem duplicatas e com exatamente
    /// ∏(capacidade + 1) elementos.
    pub fn all_states(&self) -> CoreResult<Vec<UserEquipmentState>> {
        self.validate()?;

        let mut maxima = self.task_queue_capacities.clone();
        maxima.push(self.tu_number_of_packets);
        maxima.push(self.cpu_number_of_sections);

        let mut states = Vec::with_capacity(self.state_count()?);
        let mut digits = vec![0u32; maxima.len()];

        loop {
            states.push(UserEquipmentState::from_digits(&digits));

            // Odômetro: incrementa da última coordenada para a primeira
            let mut position = maxima.len();
            loop {
                if position == 0 {
                    return Ok(states);
                }
                position -= 1;
                if digits[position] < maxima[position] {
                    digits[position] += 1;
                    break;
                }
                digits[position] = 0;
            }
        }
    }
}
