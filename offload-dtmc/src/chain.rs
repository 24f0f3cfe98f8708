//! DTMC simbólica do UE
//!
//! Grafo imutável (arena de estados + arestas rotuladas) construído uma vez
//! por forma de espaço de estados. Os rótulos são produtos de símbolos; os
//! valores numéricos só entram na resolução.

use crate::error::{DtmcError, DtmcResult};
use offload_core::{
    Action, OffloadingSystemConfig, Outcome, Symbol, SymbolProduct, UserEquipmentDynamics,
    UserEquipmentState,
};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Aresta rotulada: destino (índice na arena) e verossimilhança simbólica
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub destination: usize,
    pub label: SymbolProduct,
}

/// Multigrafo rotulado estado × ação → transições
///
/// Arestas repetidas para o mesmo destino são mantidas: eventos físicos
/// distintos podem produzir a mesma transição observável.
#[derive(Debug, Clone)]
pub struct DiscreteTimeMarkovChain {
    states: Vec<UserEquipmentState>,
    index: HashMap<UserEquipmentState, usize>,
    legal_actions: Vec<Vec<Action>>,
    edges: HashMap<(usize, Action), Vec<Transition>>,
}

impl DiscreteTimeMarkovChain {
    /// Estados em ordem de enumeração
    pub fn states(&self) -> &[UserEquipmentState] {
        &self.states
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn state(&self, index: usize) -> Option<&UserEquipmentState> {
        self.states.get(index)
    }

    pub fn state_index(&self, state: &UserEquipmentState) -> Option<usize> {
        self.index.get(state).copied()
    }

    /// Índice do estado ou `InvalidState`
    pub fn require_index(&self, state: &UserEquipmentState) -> DtmcResult<usize> {
        self.state_index(state)
            .ok_or_else(|| DtmcError::InvalidState(format!("{state} is not part of the chain")))
    }

    /// Ações legais de um estado
    pub fn legal_actions(&self, index: usize) -> &[Action] {
        self.legal_actions.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Arestas de (origem, ação); `None` se a ação não é legal na origem
    pub fn transitions(&self, source: usize, action: Action) -> Option<&[Transition]> {
        self.edges.get(&(source, action)).map(Vec::as_slice)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Símbolos referenciados por algum rótulo
    pub fn symbols(&self) -> BTreeSet<Symbol> {
        self.edges
            .values()
            .flatten()
            .flat_map(|t| t.label.symbols().iter().copied())
            .collect()
    }
}

/// Construtor da DTMC
#[derive(Debug, Clone)]
pub struct DtmcCreator {
    dynamics: UserEquipmentDynamics,
}

impl DtmcCreator {
    pub fn new(config: &OffloadingSystemConfig) -> DtmcResult<Self> {
        Ok(Self {
            dynamics: UserEquipmentDynamics::new(config)?,
        })
    }

    /// Enumera, para cada estado e ação legal, os 2^k resultados dos eventos
    /// relevantes e rotula cada destino com o produto simbólico
    pub fn create(&self) -> DtmcResult<DiscreteTimeMarkovChain> {
        let states = self.dynamics.state_config().all_states()?;
        let index: HashMap<_, _> = states.iter().cloned().enumerate().map(|(i, s)| (s, i)).collect();
        let queues = self.dynamics.number_of_queues();

        let mut legal_actions = Vec::with_capacity(states.len());
        let mut edges = HashMap::new();

        for (source, state) in states.iter().enumerate() {
            let actions = self.dynamics.legal_actions(state);

            for &action in &actions {
                let post = self.dynamics.admit(state, action)?;
                let events = self.dynamics.relevant_events(&post);
                let mut transitions = Vec::with_capacity(1 << events.len());

                for mask in 0u32..(1 << events.len()) {
                    let mut outcome = Outcome::quiet(queues);
                    let mut symbols = Vec::with_capacity(events.len());
                    for (bit, event) in events.iter().enumerate() {
                        let occurred = mask & (1 << bit) != 0;
                        outcome.set(*event, occurred);
                        symbols.push(event.symbol(occurred));
                    }

                    let next = self.dynamics.advance(&post, &outcome).next_state;
                    let destination = *index.get(&next).ok_or_else(|| {
                        DtmcError::InvalidState(format!("{state} --{action}--> {next} leaves the state space"))
                    })?;

                    transitions.push(Transition {
                        destination,
                        label: SymbolProduct::new(symbols),
                    });
                }

                edges.insert((source, action), transitions);
            }

            legal_actions.push(actions);
        }

        let chain = DiscreteTimeMarkovChain {
            states,
            index,
            legal_actions,
            edges,
        };
        debug!(
            states = chain.state_count(),
            edges = chain.edge_count(),
            "symbolic DTMC created"
        );
        Ok(chain)
    }
}
