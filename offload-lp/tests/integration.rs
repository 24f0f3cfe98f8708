//! Testes de integração para offload-lp

use offload_core::*;
use offload_lp::*;
use std::sync::atomic::{AtomicUsize, Ordering};

fn config(eta: f64) -> OffloadingSystemConfig {
    OffloadingSystemConfig::new(
        UserEquipmentConfig {
            state_config: UserEquipmentStateConfig::single_queue(5, 2, 3),
            components_config: UserEquipmentComponentsConfig::single_queue(0.4, 0.6, eta, 1.0, 1.0, 10.0),
        },
        EnvironmentParameters::default(),
    )
    .unwrap()
}

/// Conta as chamadas ao oráculo
#[derive(Default)]
struct CountingOracle {
    calls: AtomicUsize,
}

impl LpOracle for CountingOracle {
    fn solve(&self, instance: &LpInstance<'_>) -> LpResult<OccupationMeasure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        MinilpOracle.solve(instance)
    }
}

#[test]
fn test_infeasible_drop_bound() {
    let components = UserEquipmentComponentsConfig::single_queue(0.5, 0.6, 0.0, 1.0, 1.0, 10.0).with_max_drop_rate(0.01);
    let config = OffloadingSystemConfig::new(
        UserEquipmentConfig {
            state_config: UserEquipmentStateConfig::single_queue(5, 2, 3),
            components_config: components,
        },
        EnvironmentParameters::default(),
    )
    .unwrap();

    let err = OptimalPolicyFinder::new().find_optimal_policy_for_given_eta(&config, 6).unwrap_err();
    assert!(matches!(err, LpError::Infeasible(_)), "got {err:?}");
}

#[test]
fn test_drop_bound_is_respected_when_feasible() {
    let mut config = config(2.0);
    config.user_equipment_config.components_config.max_drop_rate = Some(0.1);
    let found = OptimalPolicyFinder::new().find_optimal_policy_for_given_eta(&config, 6).unwrap();
    assert!(found.expected_drop_rate <= 0.1 + 1e-6);
}

#[test]
fn test_eta_range_is_index_aligned() {
    let range = ParameterRange::Variable {
        start: 0.2,
        end: 2.0,
        count: 5,
    };
    let results = OptimalPolicyFinder::new()
        .with_workers(3)
        .find_optimal_policies_for_eta_range(&config(1.0), &range, 6)
        .unwrap();

    assert_eq!(results.len(), 5);
    for (found, eta) in results.iter().zip(range.to_vec()) {
        assert_eq!(found.eta, eta);
        assert!(found.expected_power <= eta + 1e-6);
    }
}

#[test]
fn test_larger_budget_never_hurts() {
    let range = ParameterRange::Variable {
        start: 0.1,
        end: 2.0,
        count: 6,
    };
    let results = OptimalPolicyFinder::new()
        .find_optimal_policies_for_eta_range(&config(1.0), &range, 8)
        .unwrap();

    for pair in results.windows(2) {
        assert!(pair[1].expected_queue_length <= pair[0].expected_queue_length + 1e-6);
    }
}

#[test]
fn test_ranged_matches_single_point() {
    let range = ParameterRange::Constant(0.7);
    let ranged = OptimalPolicyFinder::new()
        .find_optimal_policies_for_eta_range(&config(1.0), &range, 8)
        .unwrap();
    let single = OptimalPolicyFinder::new()
        .find_optimal_policy_for_given_eta(&config(0.7), 8)
        .unwrap();

    assert_eq!(ranged.len(), 1);
    assert!((ranged[0].expected_queue_length - single.expected_queue_length).abs() < 1e-9);
}

#[test]
fn test_one_oracle_call_per_point() {
    let finder = OptimalPolicyFinder::with_oracle(CountingOracle::default()).with_workers(2);
    let range = ParameterRange::Variable {
        start: 0.5,
        end: 1.5,
        count: 4,
    };
    finder.find_optimal_policies_for_eta_range(&config(1.0), &range, 6).unwrap();
    assert_eq!(finder.oracle().calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_multi_queue_policy() {
    let config = OffloadingSystemConfig::new(
        UserEquipmentConfig {
            state_config: UserEquipmentStateConfig::multi_queue(vec![2, 2], 1, 2),
            components_config: UserEquipmentComponentsConfig::multi_queue(vec![0.2, 0.3], 0.8, 1.2, 1.0, 1.0, 10.0),
        },
        EnvironmentParameters::default(),
    )
    .unwrap();

    let found = OptimalPolicyFinder::new().find_optimal_policy_for_given_eta(&config, 6).unwrap();
    assert!(found.expected_power <= 1.2 + 1e-6);
    assert!(found.expected_delay > 0.0);
    assert!((found.expected_delay * 0.5 - found.expected_queue_length).abs() < 1e-9);
}

#[test]
fn test_invalid_range_is_rejected() {
    let range = ParameterRange::Variable {
        start: 0.1,
        end: 0.2,
        count: 0,
    };
    let err = OptimalPolicyFinder::new()
        .find_optimal_policies_for_eta_range(&config(1.0), &range, 6)
        .unwrap_err();
    assert!(matches!(err, LpError::Core(CoreError::InvalidConfiguration(_))));
}
