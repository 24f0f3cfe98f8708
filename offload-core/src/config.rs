//! Configuração do sistema de offloading
//!
//! Três grupos imutáveis: forma do espaço de estados, parâmetros estocásticos
//! dos componentes do UE e parâmetros do ambiente (nuvem).

use crate::error::{CoreError, CoreResult};
use std::fmt;
use std::str::FromStr;

/// Forma do espaço de estados do UE
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct UserEquipmentStateConfig {
    /// Capacidade de cada fila lógica de tarefas
    pub task_queue_capacities: Vec<u32>,
    /// Número de pacotes de uma tarefa na unidade de transmissão (0 = sem TU)
    pub tu_number_of_packets: u32,
    /// Número de seções de processamento local (0 = sem CPU)
    pub cpu_number_of_sections: u32,
}

impl UserEquipmentStateConfig {
    /// Variante de fila única
    pub fn single_queue(
        task_queue_capacity: u32,
        tu_number_of_packets: u32,
        cpu_number_of_sections: u32,
    ) -> Self {
        Self::multi_queue(vec![task_queue_capacity], tu_number_of_packets, cpu_number_of_sections)
    }

    /// Variante com múltiplas filas compartilhando TU e CPU
    pub fn multi_queue(
        task_queue_capacities: Vec<u32>,
        tu_number_of_packets: u32,
        cpu_number_of_sections: u32,
    ) -> Self {
        Self {
            task_queue_capacities,
            tu_number_of_packets,
            cpu_number_of_sections,
        }
    }

    /// Constrói a partir de inteiros com sinal, rejeitando capacidades negativas
    pub fn try_from_signed(
        task_queue_capacities: &[i64],
        tu_number_of_packets: i64,
        cpu_number_of_sections: i64,
    ) -> CoreResult<Self> {
        let to_u32 = |name: &str, value: i64| {
            u32::try_from(value)
                .map_err(|_| CoreError::config(format!("{name} must be a non-negative 32-bit integer, got {value}")))
        };

        let capacities = task_queue_capacities
            .iter()
            .map(|&c| to_u32("task queue capacity", c))
            .collect::<CoreResult<Vec<_>>>()?;

        let config = Self::multi_queue(
            capacities,
            to_u32("tu number of packets", tu_number_of_packets)?,
            to_u32("cpu number of sections", cpu_number_of_sections)?,
        );
        config.validate()?;
        Ok(config)
    }

    /// Número de filas lógicas
    pub fn number_of_queues(&self) -> usize {
        self.task_queue_capacities.len()
    }

    /// Valida as capacidades
    pub fn validate(&self) -> CoreResult<()> {
        if self.task_queue_capacities.is_empty() {
            return Err(CoreError::config("at least one task queue is required"));
        }
        if let Some(q) = self.task_queue_capacities.iter().position(|&c| c == 0) {
            return Err(CoreError::config(format!("task queue {q} must have a positive capacity")));
        }
        self.state_count().map(|_| ())
    }

    /// Tamanho do espaço de estados: ∏(capacidade + 1)
    pub fn state_count(&self) -> CoreResult<usize> {
        self.task_queue_capacities
            .iter()
            .chain([&self.tu_number_of_packets, &self.cpu_number_of_sections])
            .try_fold(1usize, |acc, &cap| acc.checked_mul(cap as usize + 1))
            .ok_or_else(|| CoreError::config("state space size overflows usize"))
    }
}

/// Parâmetros estocásticos e custos dos componentes do UE
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UserEquipmentComponentsConfig {
    /// Probabilidade de chegada por fila, em (0, 1]
    pub alpha: Vec<f64>,
    /// Probabilidade de sucesso de transmissão de um pacote, em [0, 1]
    pub beta: f64,
    /// Probabilidade de sucesso de uma seção local, em [0, 1]
    pub gamma: f64,
    /// Orçamento de potência média por tick usado pelo LP
    pub eta: f64,
    /// Potência da TU ocupada (por tick)
    pub p_tx: f64,
    /// Potência da CPU ocupada (por tick)
    pub p_local: f64,
    /// Potência instantânea máxima por tick
    pub p_max: f64,
    /// Limite opcional de descartes esperados por tick
    pub max_drop_rate: Option<f64>,
}

impl UserEquipmentComponentsConfig {
    /// Variante de fila única com CPU determinística
    pub fn single_queue(alpha: f64, beta: f64, eta: f64, p_tx: f64, p_local: f64, p_max: f64) -> Self {
        Self::multi_queue(vec![alpha], beta, eta, p_tx, p_local, p_max)
    }

    /// Variante com uma probabilidade de chegada por fila
    pub fn multi_queue(alpha: Vec<f64>, beta: f64, eta: f64, p_tx: f64, p_local: f64, p_max: f64) -> Self {
        Self {
            alpha,
            beta,
            gamma: 1.0,
            eta,
            p_tx,
            p_local,
            p_max,
            max_drop_rate: None,
        }
    }

    /// Define a probabilidade de sucesso local
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Define o limite de descartes
    pub fn with_max_drop_rate(mut self, max_drop_rate: f64) -> Self {
        self.max_drop_rate = Some(max_drop_rate);
        self
    }

    /// Taxa total de chegada oferecida (Σ α)
    pub fn total_arrival_rate(&self) -> f64 {
        self.alpha.iter().sum()
    }

    /// Valida contra o número de filas
    pub fn validate(&self, number_of_queues: usize) -> CoreResult<()> {
        if self.alpha.len() != number_of_queues {
            return Err(CoreError::config(format!(
                "expected {number_of_queues} arrival probabilities, got {}",
                self.alpha.len()
            )));
        }
        for (q, &alpha) in self.alpha.iter().enumerate() {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(CoreError::config(format!("alpha[{q}] must be in (0, 1], got {alpha}")));
            }
        }
        check_unit_interval("beta", self.beta)?;
        check_unit_interval("gamma", self.gamma)?;
        check_positive("p_tx", self.p_tx)?;
        check_positive("p_local", self.p_local)?;
        check_positive("p_max", self.p_max)?;
        check_non_negative("eta", self.eta)?;
        if let Some(rate) = self.max_drop_rate {
            check_non_negative("max_drop_rate", rate)?;
        }
        Ok(())
    }
}

/// Parâmetros do ambiente remoto
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnvironmentParameters {
    /// Réplicas de nuvem servindo tarefas em paralelo
    pub n_cloud: u32,
    /// Latência de ida e volta da resposta da nuvem (ticks)
    pub t_rx: f64,
}

impl EnvironmentParameters {
    pub fn new(n_cloud: u32, t_rx: f64) -> Self {
        Self { n_cloud, t_rx }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.n_cloud == 0 {
            return Err(CoreError::config("n_cloud must be at least 1"));
        }
        check_non_negative("t_rx", self.t_rx)
    }
}

impl Default for EnvironmentParameters {
    fn default() -> Self {
        Self::new(1, 0.0)
    }
}

/// Configuração do UE: forma + componentes
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UserEquipmentConfig {
    pub state_config: UserEquipmentStateConfig,
    pub components_config: UserEquipmentComponentsConfig,
}

/// Configuração completa do sistema
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OffloadingSystemConfig {
    pub user_equipment_config: UserEquipmentConfig,
    pub environment_parameters: EnvironmentParameters,
}

impl OffloadingSystemConfig {
    /// Cria e valida a configuração
    pub fn new(
        user_equipment_config: UserEquipmentConfig,
        environment_parameters: EnvironmentParameters,
    ) -> CoreResult<Self> {
        let config = Self {
            user_equipment_config,
            environment_parameters,
        };
        config.validate()?;
        Ok(config)
    }

    /// Valida todos os grupos
    pub fn validate(&self) -> CoreResult<()> {
        let state_config = self.state_config();
        state_config.validate()?;
        self.components().validate(state_config.number_of_queues())?;
        self.environment_parameters.validate()
    }

    pub fn state_config(&self) -> &UserEquipmentStateConfig {
        &self.user_equipment_config.state_config
    }

    pub fn components(&self) -> &UserEquipmentComponentsConfig {
        &self.user_equipment_config.components_config
    }

    pub fn number_of_queues(&self) -> usize {
        self.state_config().number_of_queues()
    }

    pub fn alpha(&self) -> &[f64] {
        &self.components().alpha
    }

    pub fn beta(&self) -> f64 {
        self.components().beta
    }

    pub fn eta(&self) -> f64 {
        self.components().eta
    }

    /// Cópia com novas probabilidades de chegada
    pub fn with_alpha(&self, alpha: Vec<f64>) -> CoreResult<Self> {
        let mut config = self.clone();
        config.user_equipment_config.components_config.alpha = alpha;
        config.validate()?;
        Ok(config)
    }

    /// Cópia com novo orçamento eta
    pub fn with_eta(&self, eta: f64) -> CoreResult<Self> {
        let mut config = self.clone();
        config.user_equipment_config.components_config.eta = eta;
        config.validate()?;
        Ok(config)
    }

    /// Cópia com nova forma de espaço de estados
    pub fn with_state_config(&self, state_config: UserEquipmentStateConfig) -> CoreResult<Self> {
        let mut config = self.clone();
        config.user_equipment_config.state_config = state_config;
        config.validate()?;
        Ok(config)
    }
}

/// Parâmetro constante ou varrido linearmente
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ParameterRange {
    Constant(f64),
    Variable { start: f64, end: f64, count: usize },
}

impl ParameterRange {
    /// Valida a forma da faixa
    pub fn validate(&self) -> CoreResult<()> {
        match *self {
            ParameterRange::Constant(value) if !value.is_finite() => {
                Err(CoreError::config(format!("range value must be finite, got {value}")))
            }
            ParameterRange::Constant(_) => Ok(()),
            ParameterRange::Variable { start, end, count } => {
                if !start.is_finite() || !end.is_finite() {
                    return Err(CoreError::config("range endpoints must be finite"));
                }
                if count == 0 {
                    return Err(CoreError::config("range count must be positive"));
                }
                if count == 1 && start != end {
                    return Err(CoreError::config("a single-point range requires start == end"));
                }
                Ok(())
            }
        }
    }

    /// Valida uma faixa de probabilidades de chegada, em (0, 1]
    pub fn validate_arrival_probability(&self) -> CoreResult<()> {
        self.validate()?;
        let (low, high) = match *self {
            ParameterRange::Constant(value) => (value, value),
            ParameterRange::Variable { start, end, .. } => (start.min(end), start.max(end)),
        };
        if low > 0.0 && high <= 1.0 {
            Ok(())
        } else {
            Err(CoreError::config(format!("arrival probability range must lie in (0, 1], got {self}")))
        }
    }

    /// Número de pontos
    pub fn len(&self) -> usize {
        match *self {
            ParameterRange::Constant(_) => 1,
            ParameterRange::Variable { count, .. } => count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pontos igualmente espaçados, extremos inclusos
    pub fn to_vec(&self) -> Vec<f64> {
        match *self {
            ParameterRange::Constant(value) => vec![value],
            ParameterRange::Variable { start, count: 1, .. } => vec![start],
            ParameterRange::Variable { start, end, count } => {
                let step = (end - start) / (count - 1) as f64;
                (0..count).map(|i| start + i as f64 * step).collect()
            }
        }
    }
}

impl fmt::Display for ParameterRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterRange::Constant(value) => write!(f, "{value}"),
            ParameterRange::Variable { start, end, count } => write!(f, "{start}:{end}:{count}"),
        }
    }
}

/// Aceita `v` ou `início:fim:quantidade`
impl FromStr for ParameterRange {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_f64 = |part: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| CoreError::config(format!("invalid number '{part}': {e}")))
        };

        let parts: Vec<&str> = s.split(':').collect();
        let range = match parts.as_slice() {
            [value] => ParameterRange::Constant(parse_f64(value)?),
            [start, end, count] => ParameterRange::Variable {
                start: parse_f64(start)?,
                end: parse_f64(end)?,
                count: count
                    .trim()
                    .parse()
                    .map_err(|e| CoreError::config(format!("invalid count '{count}': {e}")))?,
            },
            _ => return Err(CoreError::config(format!("expected 'value' or 'start:end:count', got '{s}'"))),
        };
        range.validate()?;
        Ok(range)
    }
}

/// Produto cartesiano de listas, na ordem lexicográfica
pub fn cartesian_product(lists: &[Vec<f64>]) -> Vec<Vec<f64>> {
    lists.iter().fold(vec![Vec::new()], |acc, list| {
        acc.iter()
            .flat_map(|prefix| {
                list.iter().map(move |&value| {
                    let mut combination = prefix.clone();
                    combination.push(value);
                    combination
                })
            })
            .collect()
    })
}

fn check_unit_interval(name: &str, value: f64) -> CoreResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::config(format!("{name} must be in [0, 1], got {value}")))
    }
}

fn check_positive(name: &str, value: f64) -> CoreResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CoreError::config(format!("{name} must be positive, got {value}")))
    }
}

fn check_non_negative(name: &str, value: f64) -> CoreResult<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CoreError::config(format!("{name} must be non-negative, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> OffloadingSystemConfig {
        OffloadingSystemConfig::new(
            UserEquipmentConfig {
                state_config: UserEquipmentStateConfig::single_queue(5, 4, 3),
                components_config: UserEquipmentComponentsConfig::single_queue(0.1, 0.9, 0.0, 1.5, 1.5, 500.0),
            },
            EnvironmentParameters::new(1, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn test_state_count() {
        let config = UserEquipmentStateConfig::single_queue(5, 4, 3);
        assert_eq!(config.state_count().unwrap(), 6 * 5 * 4);

        let config = UserEquipmentStateConfig::multi_queue(vec![2, 3], 1, 0);
        assert_eq!(config.state_count().unwrap(), 3 * 4 * 2);
    }

    #[test]
    fn test_rejects_negative_capacity() {
        let err = UserEquipmentStateConfig::try_from_signed(&[5], -1, 3).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfiguration(_)));

        let ok = UserEquipmentStateConfig::try_from_signed(&[5], 4, 3).unwrap();
        assert_eq!(ok, UserEquipmentStateConfig::single_queue(5, 4, 3));
    }

    #[test]
    fn test_rejects_zero_queue_capacity() {
        assert!(UserEquipmentStateConfig::single_queue(0, 1, 1).validate().is_err());
        assert!(UserEquipmentStateConfig::multi_queue(vec![], 1, 1).validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_probabilities() {
        let config = sample_config();
        assert!(config.with_alpha(vec![0.0]).is_err());
        assert!(config.with_alpha(vec![1.2]).is_err());
        assert!(config.with_alpha(vec![0.3, 0.3]).is_err());
        assert!(config.with_alpha(vec![1.0]).is_ok());

        let mut bad = config.clone();
        bad.user_equipment_config.components_config.beta = -0.1;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_with_eta_revalidates() {
        let config = sample_config();
        assert_eq!(config.with_eta(2.5).unwrap().eta(), 2.5);
        assert!(config.with_eta(-1.0).is_err());
    }

    #[test]
    fn test_parameter_range_to_vec() {
        assert_eq!(ParameterRange::Constant(0.4).to_vec(), vec![0.4]);

        let values = ParameterRange::Variable { start: 0.1, end: 0.5, count: 5 }.to_vec();
        assert_eq!(values.len(), 5);
        assert!((values[0] - 0.1).abs() < 1e-12);
        assert!((values[2] - 0.3).abs() < 1e-12);
        assert!((values[4] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_parameter_range_validation() {
        assert!(ParameterRange::Variable { start: 0.1, end: 0.2, count: 1 }.validate().is_err());
        assert!(ParameterRange::Variable { start: 0.1, end: 0.2, count: 0 }.validate().is_err());
        assert!(ParameterRange::Constant(1.5).validate_arrival_probability().is_err());
        assert!(ParameterRange::Variable { start: 0.1, end: 1.0, count: 3 }.validate_arrival_probability().is_ok());
    }

    #[test]
    fn test_parameter_range_from_str() {
        assert_eq!("0.3".parse::<ParameterRange>().unwrap(), ParameterRange::Constant(0.3));
        assert_eq!(
            "0.1:0.9:5".parse::<ParameterRange>().unwrap(),
            ParameterRange::Variable { start: 0.1, end: 0.9, count: 5 }
        );
        assert!("0.1:0.9".parse::<ParameterRange>().is_err());
        assert!("a:b:c".parse::<ParameterRange>().is_err());
    }

    #[test]
    fn test_cartesian_product() {
        let product = cartesian_product(&[vec![1.0, 2.0], vec![3.0, 4.0, 5.0]]);
        assert_eq!(product.len(), 6);
        assert_eq!(product[0], vec![1.0, 3.0]);
        assert_eq!(product[5], vec![2.0, 5.0]);
    }

    #[test]
    fn test_config_serialization() {
        let config = sample_config();
        let json = serde_json::to_string(&config).unwrap();
        let back: OffloadingSystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
