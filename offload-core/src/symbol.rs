//! Símbolos algébricos dos parâmetros estocásticos
//!
//! Os rótulos das transições da DTMC são produtos de símbolos. Um símbolo não
//! carrega valor numérico: o significado vem de um `SymbolValues` fornecido
//! apenas na resolução.

use crate::config::UserEquipmentComponentsConfig;
use std::collections::HashMap;
use std::fmt;

/// Token opaco de parâmetro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Symbol {
    /// Chegada na fila q
    Alpha(usize),
    /// Nenhuma chegada na fila q
    AlphaC(usize),
    /// Pacote transmitido com sucesso
    Beta,
    BetaC,
    /// Seção local concluída
    Gamma,
    GammaC,
}

impl Symbol {
    /// Evento complementar
    pub fn complement(&self) -> Symbol {
        match *self {
            Symbol::Alpha(q) => Symbol::AlphaC(q),
            Symbol::AlphaC(q) => Symbol::Alpha(q),
            Symbol::Beta => Symbol::BetaC,
            Symbol::BetaC => Symbol::Beta,
            Symbol::Gamma => Symbol::GammaC,
            Symbol::GammaC => Symbol::Gamma,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Alpha(q) => write!(f, "Alpha[{q}]"),
            Symbol::AlphaC(q) => write!(f, "AlphaC[{q}]"),
            Symbol::Beta => write!(f, "Beta"),
            Symbol::BetaC => write!(f, "BetaC"),
            Symbol::Gamma => write!(f, "Gamma"),
            Symbol::GammaC => write!(f, "GammaC"),
        }
    }
}

/// Produto de símbolos em forma canônica (ordenado)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct SymbolProduct(Vec<Symbol>);

impl SymbolProduct {
    pub fn new(mut symbols: Vec<Symbol>) -> Self {
        symbols.sort();
        Self(symbols)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    /// Avalia o produto; `Err` carrega o primeiro símbolo sem valor
    pub fn evaluate(&self, values: &SymbolValues) -> Result<f64, Symbol> {
        self.0
            .iter()
            .try_fold(1.0, |acc, symbol| values.get(symbol).map(|v| acc * v).ok_or(*symbol))
    }
}

impl fmt::Display for SymbolProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "1");
        }
        for (i, symbol) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "·")?;
            }
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

/// Mapeamento símbolo → valor numérico
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolValues(HashMap<Symbol, f64>);

impl SymbolValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adiciona um valor (builder)
    pub fn with(mut self, symbol: Symbol, value: f64) -> Self {
        self.insert(symbol, value);
        self
    }

    pub fn insert(&mut self, symbol: Symbol, value: f64) {
        self.0.insert(symbol, value);
    }

    pub fn get(&self, symbol: &Symbol) -> Option<f64> {
        self.0.get(symbol).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &f64)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Valores (e complementos) derivados dos componentes do UE
    pub fn from_components(components: &UserEquipmentComponentsConfig) -> Self {
        let mut values = Self::new()
            .with(Symbol::Beta, components.beta)
            .with(Symbol::BetaC, 1.0 - components.beta)
            .with(Symbol::Gamma, components.gamma)
            .with(Symbol::GammaC, 1.0 - components.gamma);
        for (q, &alpha) in components.alpha.iter().enumerate() {
            values.insert(Symbol::Alpha(q), alpha);
            values.insert(Symbol::AlphaC(q), 1.0 - alpha);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_is_canonical() {
        let a = SymbolProduct::new(vec![Symbol::BetaC, Symbol::Alpha(0)]);
        let b = SymbolProduct::new(vec![Symbol::Alpha(0), Symbol::BetaC]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "Alpha[0]·BetaC");
        assert_eq!(SymbolProduct::default().to_string(), "1");
    }

    #[test]
    fn test_evaluate() {
        let values = SymbolValues::new().with(Symbol::Alpha(0), 0.5).with(Symbol::Beta, 0.25);
        let product = SymbolProduct::new(vec![Symbol::Alpha(0), Symbol::Beta]);
        assert_eq!(product.evaluate(&values), Ok(0.125));

        let missing = SymbolProduct::new(vec![Symbol::Alpha(0), Symbol::GammaC]);
        assert_eq!(missing.evaluate(&values), Err(Symbol::GammaC));
    }

    #[test]
    fn test_complement_roundtrip() {
        for symbol in [Symbol::Alpha(1), Symbol::Beta, Symbol::GammaC] {
            assert_eq!(symbol.complement().complement(), symbol);
        }
    }

    #[test]
    fn test_values_from_components() {
        let components = UserEquipmentComponentsConfig::multi_queue(vec![0.2, 0.4], 0.9, 0.0, 1.0, 1.0, 10.0);
        let values = SymbolValues::from_components(&components);
        assert_eq!(values.len(), 8);
        assert_eq!(values.get(&Symbol::AlphaC(1)), Some(0.6));
        assert!((values.get(&Symbol::BetaC).unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(values.get(&Symbol::Gamma), Some(1.0));
    }
}
