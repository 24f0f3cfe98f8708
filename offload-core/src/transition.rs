//! Dinâmica de um tick do UE
//!
//! Função determinística compartilhada pelo construtor da DTMC e pelo
//! simulador: admissão → tentativa da TU → tentativa da CPU → chegadas.
//! Apenas a verossimilhança dos resultados é estocástica.

use crate::action::Action;
use crate::config::{OffloadingSystemConfig, UserEquipmentComponentsConfig, UserEquipmentStateConfig};
use crate::error::{CoreError, CoreResult};
use crate::state::UserEquipmentState;
use crate::symbol::Symbol;

/// Evento binário independente dentro de um tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StochasticEvent {
    Arrival(usize),
    Transmission,
    LocalProcessing,
}

impl StochasticEvent {
    /// Símbolo que rotula o evento ocorrido ou não ocorrido
    pub fn symbol(&self, occurred: bool) -> Symbol {
        let symbol = match *self {
            StochasticEvent::Arrival(q) => Symbol::Alpha(q),
            StochasticEvent::Transmission => Symbol::Beta,
            StochasticEvent::LocalProcessing => Symbol::Gamma,
        };
        if occurred { symbol } else { symbol.complement() }
    }
}

/// Realização dos eventos de um tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub arrivals: Vec<bool>,
    pub transmission_success: bool,
    pub local_success: bool,
}

impl Outcome {
    /// Nenhum evento ocorre
    pub fn quiet(number_of_queues: usize) -> Self {
        Self {
            arrivals: vec![false; number_of_queues],
            transmission_success: false,
            local_success: false,
        }
    }

    /// Marca um evento como ocorrido
    pub fn set(&mut self, event: StochasticEvent, occurred: bool) {
        match event {
            StochasticEvent::Arrival(q) => self.arrivals[q] = occurred,
            StochasticEvent::Transmission => self.transmission_success = occurred,
            StochasticEvent::LocalProcessing => self.local_success = occurred,
        }
    }
}

/// Resultado de um tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickResult {
    pub next_state: UserEquipmentState,
    /// Última fatia da tarefa na TU foi enviada
    pub transmission_completed: bool,
    /// Última seção local foi concluída
    pub local_completed: bool,
    /// Chegadas aceitas por fila
    pub accepted: Vec<bool>,
    /// Chegadas descartadas por fila cheia
    pub dropped: Vec<bool>,
}

/// Regras de legalidade, custo e transição do UE
#[derive(Debug, Clone)]
pub struct UserEquipmentDynamics {
    state_config: UserEquipmentStateConfig,
    components: UserEquipmentComponentsConfig,
}

impl UserEquipmentDynamics {
    pub fn new(config: &OffloadingSystemConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            state_config: config.state_config().clone(),
            components: config.components().clone(),
        })
    }

    pub fn state_config(&self) -> &UserEquipmentStateConfig {
        &self.state_config
    }

    pub fn number_of_queues(&self) -> usize {
        self.state_config.number_of_queues()
    }

    /// Ocupação estrutural, sem considerar o teto de potência
    fn is_admissible(&self, state: &UserEquipmentState, action: Action) -> bool {
        let cpu_free = self.state_config.cpu_number_of_sections > 0 && state.cpu_state == 0;
        let tu_free = self.state_config.tu_number_of_packets > 0 && state.tu_state == 0;
        let queued = |q: usize| state.task_queue_lengths.get(q).copied().unwrap_or(0);

        match action {
            Action::NoOperation => true,
            Action::AddToCpu(q) => queued(q) >= 1 && cpu_free,
            Action::AddToTransmissionUnit(q) => queued(q) >= 1 && tu_free,
            Action::AddToBothUnits(q) => queued(q) >= 2 && cpu_free && tu_free,
        }
    }

    /// Ação legal: ocupação permite e a potência do tick não excede `p_max`
    pub fn is_legal(&self, state: &UserEquipmentState, action: Action) -> bool {
        match action {
            Action::NoOperation => true,
            _ => self.is_admissible(state, action) && self.tick_power(state, action) <= self.components.p_max,
        }
    }

    /// Ações legais, na ordem do alfabeto
    pub fn legal_actions(&self, state: &UserEquipmentState) -> Vec<Action> {
        Action::all(self.number_of_queues())
            .into_iter()
            .filter(|&action| self.is_legal(state, action))
            .collect()
    }

    /// Estado após a admissão, antes dos eventos estocásticos
    pub fn admit(&self, state: &UserEquipmentState, action: Action) -> CoreResult<UserEquipmentState> {
        if !state.fits(&self.state_config) {
            return Err(CoreError::InvalidState(format!(
                "{state} does not fit the configured capacities"
            )));
        }
        if !self.is_legal(state, action) {
            return Err(CoreError::InvalidAction {
                action: action.to_string(),
                state: state.to_string(),
            });
        }

        let mut post = state.clone();
        if let Some(q) = action.queue() {
            post.task_queue_lengths[q] -= action.tasks_taken();
        }
        if action.admits_to_tu() {
            post.tu_state = 1;
        }
        if action.admits_to_cpu() {
            post.cpu_state = 1;
        }
        Ok(post)
    }

    /// Eventos que influenciam o tick a partir do estado pós-admissão
    pub fn relevant_events(&self, post: &UserEquipmentState) -> Vec<StochasticEvent> {
        let mut events: Vec<_> = (0..self.number_of_queues()).map(StochasticEvent::Arrival).collect();
        if post.is_tu_active() {
            events.push(StochasticEvent::Transmission);
        }
        if post.is_cpu_active() {
            events.push(StochasticEvent::LocalProcessing);
        }
        events
    }

    /// Aplica os eventos ao estado pós-admissão
    pub fn advance(&self, post: &UserEquipmentState, outcome: &Outcome) -> TickResult {
        let mut next = post.clone();
        let mut transmission_completed = false;
        let mut local_completed = false;

        if next.is_tu_active() && outcome.transmission_success {
            if next.tu_state == self.state_config.tu_number_of_packets {
                next.tu_state = 0;
                transmission_completed = true;
            } else {
                next.tu_state += 1;
            }
        }

        if next.is_cpu_active() && outcome.local_success {
            if next.cpu_state == self.state_config.cpu_number_of_sections {
                next.cpu_state = 0;
                local_completed = true;
            } else {
                next.cpu_state += 1;
            }
        }

        let queues = self.number_of_queues();
        let mut accepted = vec![false; queues];
        let mut dropped = vec![false; queues];
        for q in 0..queues {
            if !outcome.arrivals.get(q).copied().unwrap_or(false) {
                continue;
            }
            if next.task_queue_lengths[q] < self.state_config.task_queue_capacities[q] {
                next.task_queue_lengths[q] += 1;
                accepted[q] = true;
            } else {
                dropped[q] = true;
            }
        }

        TickResult {
            next_state: next,
            transmission_completed,
            local_completed,
            accepted,
            dropped,
        }
    }

    /// Um tick completo
    pub fn step(&self, state: &UserEquipmentState, action: Action, outcome: &Outcome) -> CoreResult<TickResult> {
        let post = self.admit(state, action)?;
        Ok(self.advance(&post, outcome))
    }

    /// Potência consumida no tick: unidades ocupadas após a admissão
    pub fn tick_power(&self, state: &UserEquipmentState, action: Action) -> f64 {
        let tu_busy = state.is_tu_active() || action.admits_to_tu();
        let cpu_busy = state.is_cpu_active() || action.admits_to_cpu();
        let mut power = 0.0;
        if tu_busy {
            power += self.components.p_tx;
        }
        if cpu_busy {
            power += self.components.p_local;
        }
        power
    }

    /// Descartes esperados no tick: Σ α_q·[fila q cheia após a admissão]
    pub fn expected_drops(&self, state: &UserEquipmentState, action: Action) -> f64 {
        self.state_config
            .task_queue_capacities
            .iter()
            .enumerate()
            .filter(|&(q, &cap)| {
                let taken = if action.queue() == Some(q) { action.tasks_taken() } else { 0 };
                state.task_queue_lengths[q].saturating_sub(taken) >= cap
            })
            .map(|(q, _)| self.components.alpha[q])
            .sum()
    }
}
