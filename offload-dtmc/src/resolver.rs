//! Resolução numérica das transições simbólicas
//!
//! Substitui cada símbolo pelo seu valor, multiplica dentro de uma aresta e
//! soma entre arestas que chegam ao mesmo destino (dupla rotulagem). Função
//! pura: a mesma cadeia serve a uma varredura inteira de parâmetros.

use crate::chain::{DiscreteTimeMarkovChain, Transition};
use crate::error::{DtmcError, DtmcResult};
use offload_core::{Action, SymbolValues, UserEquipmentState};
use std::collections::BTreeMap;

/// Calculadora de transições independentes sobre uma cadeia simbólica
#[derive(Debug, Clone)]
pub struct IndependentTransitionCalculator<'a> {
    symbol_values: SymbolValues,
    chain: &'a DiscreteTimeMarkovChain,
}

impl<'a> IndependentTransitionCalculator<'a> {
    /// Exige que todo valor seja uma probabilidade
    pub fn new(symbol_values: SymbolValues, chain: &'a DiscreteTimeMarkovChain) -> DtmcResult<Self> {
        if let Some((symbol, value)) = symbol_values
            .iter()
            .find(|&(_, &value)| !(0.0..=1.0).contains(&value))
        {
            return Err(DtmcError::InvalidSymbolValue {
                symbol: *symbol,
                value: *value,
            });
        }
        Ok(Self { symbol_values, chain })
    }

    pub fn chain(&self) -> &DiscreteTimeMarkovChain {
        self.chain
    }

    /// Probabilidade de `source --action--> destination`
    ///
    /// Soma todas as arestas de (origem, ação) que chegam ao destino. Uma ação
    /// legal cujas arestas nunca alcançam o destino resulta em `0.0`; uma ação
    /// ilegal na origem é `InvalidTransition`.
    pub fn get_independent_transition_fraction(
        &self,
        source: &UserEquipmentState,
        destination: &UserEquipmentState,
        action: Action,
    ) -> DtmcResult<f64> {
        let source_index = self.chain.require_index(source)?;
        let destination_index = self.chain.require_index(destination)?;
        self.fraction_by_index(source_index, destination_index, action)
    }

    fn fraction_by_index(&self, source: usize, destination: usize, action: Action) -> DtmcResult<f64> {
        let transitions = self.transitions_or_err(source, action)?;

        transitions
            .iter()
            .filter(|t| t.destination == destination)
            .try_fold(0.0, |acc, t| {
                t.label
                    .evaluate(&self.symbol_values)
                    .map(|p| acc + p)
                    .map_err(DtmcError::UnknownSymbol)
            })
    }

    fn transitions_or_err(&self, source: usize, action: Action) -> DtmcResult<&'a [Transition]> {
        let chain: &'a DiscreteTimeMarkovChain = self.chain;
        chain.transitions(source, action).ok_or_else(|| DtmcError::InvalidTransition {
            state: chain
                .state(source)
                .map_or_else(|| format!("#{source}"), ToString::to_string),
            action,
        })
    }

    /// Linha (origem, ação) com destinos fundidos, em ordem de índice
    pub fn resolve_row(&self, source: usize, action: Action) -> DtmcResult<Vec<(usize, f64)>> {
        let transitions = self.transitions_or_err(source, action)?;

        let mut merged: BTreeMap<usize, f64> = BTreeMap::new();
        for t in transitions {
            let p = t.label.evaluate(&self.symbol_values).map_err(DtmcError::UnknownSymbol)?;
            *merged.entry(t.destination).or_insert(0.0) += p;
        }
        Ok(merged.into_iter().collect())
    }

    /// Tabela numérica completa da cadeia
    pub fn resolve(&self) -> DtmcResult<NumericTransitionTable> {
        let rows = (0..self.chain.state_count())
            .map(|source| {
                self.chain
                    .legal_actions(source)
                    .iter()
                    .map(|&action| {
                        Ok(ActionRow {
                            action,
                            transitions: self.resolve_row(source, action)?,
                        })
                    })
                    .collect::<DtmcResult<Vec<_>>>()
            })
            .collect::<DtmcResult<Vec<_>>>()?;

        Ok(NumericTransitionTable {
            states: self.chain.states().to_vec(),
            rows,
        })
    }
}

/// Transições numéricas de uma ação legal
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRow {
    pub action: Action,
    /// (índice do destino, probabilidade), destinos únicos
    pub transitions: Vec<(usize, f64)>,
}

impl ActionRow {
    pub fn total(&self) -> f64 {
        self.transitions.iter().map(|(_, p)| p).sum()
    }
}

/// Cadeia totalmente numérica: estado → ações legais → destinos
#[derive(Debug, Clone, PartialEq)]
pub struct NumericTransitionTable {
    states: Vec<UserEquipmentState>,
    rows: Vec<Vec<ActionRow>>,
}

impl NumericTransitionTable {
    pub fn states(&self) -> &[UserEquipmentState] {
        &self.states
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Linhas de um estado, uma por ação legal
    pub fn rows(&self, state: usize) -> &[ActionRow] {
        self.rows.get(state).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Probabilidade de (origem, ação, destino); 0 se não houver aresta
    pub fn probability(&self, source: usize, action: Action, destination: usize) -> f64 {
        self.rows(source)
            .iter()
            .find(|row| row.action == action)
            .and_then(|row| row.transitions.iter().find(|(d, _)| *d == destination))
            .map_or(0.0, |(_, p)| *p)
    }

    /// Número total de pares (estado, ação)
    pub fn pair_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Toda linha deve somar 1 dentro da tolerância
    pub fn validate_stochastic(&self, tolerance: f64) -> DtmcResult<()> {
        for (state, rows) in self.states.iter().zip(&self.rows) {
            for row in rows {
                let sum = row.total();
                if (sum - 1.0).abs() > tolerance {
                    return Err(DtmcError::NotStochastic {
                        state: state.to_string(),
                        action: row.action,
                        sum,
                    });
                }
            }
        }
        Ok(())
    }
}
