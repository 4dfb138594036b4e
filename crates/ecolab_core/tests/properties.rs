use ecolab_core::api;
use ecolab_core::equilibrium::SystemKind;
use ecolab_core::integrate::{IntegratorMethod, IntegratorSettings};
use ecolab_core::leslie::LeslieMatrix;
use ecolab_core::models::continuous::{self, ContinuousModel, LotkaVolterraParams};
use ecolab_core::models::discrete;
use ecolab_core::vector_field;
use ecolab_core::{
    ContinuousModelId, DiscreteModelId, EcoError, ModelId, ParamSet, StateVector, TimeSpec,
    Trajectory,
};
use proptest::prelude::*;

fn param_set(pairs: &[(&str, f64)]) -> ParamSet {
    let mut params = ParamSet::new();
    for (name, value) in pairs {
        params.insert(name, *value);
    }
    params
}

fn uniform_state(names: &[&str], value: f64) -> StateVector {
    StateVector::from_parts(names, &vec![value; names.len()])
}

fn typical_continuous(id: ContinuousModelId) -> ParamSet {
    use ContinuousModelId::*;
    match id {
        Exponential => param_set(&[("r", 0.2)]),
        Logistic => param_set(&[("r", 0.5), ("K", 100.0)]),
        LaggedLogistic => param_set(&[("r", 0.7), ("K", 40.0), ("tau", 1.3)]),
        LotkaVolterra => param_set(&[("r", 1.0), ("a", 0.1), ("e", 0.5), ("d", 0.5)]),
        LogisticPrey => {
            param_set(&[("r", 1.0), ("K", 200.0), ("a", 0.1), ("e", 0.5), ("d", 0.5)])
        }
        HollingTypeTwo => {
            param_set(&[("r", 1.0), ("a", 0.1), ("e", 0.5), ("d", 0.5), ("T_h", 0.2)])
        }
        RosenzweigMacArthur => param_set(&[
            ("r", 1.0),
            ("K", 200.0),
            ("a", 0.1),
            ("e", 0.5),
            ("d", 0.5),
            ("T_h", 0.2),
        ]),
        TwoPredator => param_set(&[
            ("r", 1.0),
            ("q", 0.01),
            ("a1", 0.2),
            ("a2", 0.1),
            ("T_h1", 0.5),
            ("T_h2", 0.1),
            ("e1", 0.5),
            ("e2", 0.5),
            ("d1", 0.1),
            ("d2", 0.1),
        ]),
        Tilman => param_set(&[
            ("r1", 1.6),
            ("r2", 1.0),
            ("m1", 0.2),
            ("m2", 0.2),
            ("k11", 18.0),
            ("k12", 4.0),
            ("k21", 2.0),
            ("k22", 14.0),
            ("c11", 0.1),
            ("c12", 0.1),
            ("c21", 0.1),
            ("c22", 0.1),
            ("S1", 40.0),
            ("S2", 40.0),
            ("D", 0.1),
        ]),
        CompetitionCarrying => param_set(&[
            ("r1", 1.0),
            ("r2", 0.8),
            ("K1", 100.0),
            ("K2", 80.0),
            ("alpha12", 0.5),
            ("alpha21", 0.5),
        ]),
        CompetitionAbsolute => param_set(&[
            ("r1", 1.0),
            ("r2", 0.8),
            ("alpha11", 0.01),
            ("alpha12", 0.005),
            ("alpha21", 0.006),
            ("alpha22", 0.0125),
        ]),
    }
}

fn typical_discrete(id: DiscreteModelId) -> ParamSet {
    use DiscreteModelId::*;
    match id {
        Exponential => param_set(&[("lambda", 1.1)]),
        LogisticMap => param_set(&[("r_d", 3.7), ("K", 100.0)]),
        Ricker => param_set(&[("r", 1.5), ("K", 100.0)]),
        BevertonHolt => param_set(&[("R", 2.0), ("K", 100.0)]),
        NicholsonBailey => param_set(&[("lambda", 2.0), ("a", 0.05), ("c", 1.0)]),
        NicholsonBaileyDensity => {
            param_set(&[("r", 0.5), ("K", 100.0), ("a", 0.05), ("c", 1.0)])
        }
        SourceSink => param_set(&[
            ("pa", 0.6),
            ("pj", 0.2),
            ("beta1", 3.0),
            ("beta2", 1.0),
            ("N1", 50.0),
        ]),
    }
}

/// Every sample as raw bits, so `-0.0` and `0.0` count as different.
fn bit_pattern(result: &ecolab_core::Result<Trajectory>) -> Option<Vec<u64>> {
    let traj = result.as_ref().ok()?;
    Some(
        traj.times
            .iter()
            .chain(traj.states.iter().flatten())
            .map(|v| v.to_bits())
            .collect(),
    )
}

prop_compose! {
    fn arb_logistic()(
        r in 0.05f64..2.0,
        k in 10.0f64..1000.0
    ) -> (f64, f64) {
        (r, k)
    }
}

prop_compose! {
    fn arb_vital_rates()(size in 2usize..6)(
        fecundity in prop::collection::vec(0.1f64..3.0, size),
        survival in prop::collection::vec(0.1f64..1.0, size - 1)
    ) -> (Vec<f64>, Vec<f64>) {
        (fecundity, survival)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_logistic_rises_monotonically_below_capacity(
        (r, k) in arb_logistic(),
        fraction in 0.01f64..0.95
    ) {
        let traj = api::simulate_continuous(
            ContinuousModelId::Logistic,
            &TimeSpec::horizon(30.0),
            &StateVector::from([("N", fraction * k)]),
            &ParamSet::from([("r", r), ("K", k)]),
        )
        .unwrap();
        let n = traj.series("N").unwrap();
        for pair in n.windows(2) {
            prop_assert!(pair[1] >= pair[0] - 1e-6 * k, "N fell from {} to {}", pair[0], pair[1]);
        }
        prop_assert!(n.iter().all(|v| *v <= k * (1.0 + 1e-6)));
    }

    #[test]
    fn test_logistic_falls_monotonically_above_capacity(
        (r, k) in arb_logistic(),
        factor in 1.05f64..3.0
    ) {
        let traj = api::simulate_continuous(
            ContinuousModelId::Logistic,
            &TimeSpec::horizon(30.0),
            &StateVector::from([("N", factor * k)]),
            &ParamSet::from([("r", r), ("K", k)]),
        )
        .unwrap();
        let n = traj.series("N").unwrap();
        for pair in n.windows(2) {
            prop_assert!(pair[1] <= pair[0] + 1e-6 * k, "N rose from {} to {}", pair[0], pair[1]);
        }
        prop_assert!(n.iter().all(|v| *v >= k * (1.0 - 1e-6)));
    }

    #[test]
    fn test_repeated_runs_are_bit_identical(n0 in 1.0f64..50.0) {
        let spec = TimeSpec::horizon(10.0);
        for id in ContinuousModelId::ALL {
            let params = typical_continuous(*id);
            let init = uniform_state(continuous::compartments(*id), n0);
            let first = api::simulate_continuous(*id, &spec, &init, &params);
            let second = api::simulate_continuous(*id, &spec, &init, &params);
            prop_assert!(first.is_ok(), "{id}: {:?}", first);
            prop_assert_eq!(bit_pattern(&first), bit_pattern(&second), "{}", id);
            prop_assert_eq!(first, second);
        }
        for id in DiscreteModelId::ALL {
            let params = typical_discrete(*id);
            let init = uniform_state(discrete::compartments(*id), n0);
            let first = api::simulate_discrete(*id, &init, &params, 40);
            let second = api::simulate_discrete(*id, &init, &params, 40);
            prop_assert_eq!(bit_pattern(&first), bit_pattern(&second), "{}", id);
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn test_fixed_step_budget_is_enforced(
        dt in 0.001f64..0.009,
        max_steps in 1usize..50
    ) {
        let settings = IntegratorSettings {
            method: IntegratorMethod::Rk4 { dt },
            max_steps,
            ..IntegratorSettings::default()
        };
        let result = api::simulate_continuous_with(
            ContinuousModelId::Logistic,
            &TimeSpec::Explicit { times: vec![0.0, 1.0] },
            &StateVector::from([("N", 5.0)]),
            &ParamSet::from([("r", 0.5), ("K", 100.0)]),
            &settings,
        );
        match result {
            Err(EcoError::Integration { last_time, last_state, .. }) => {
                prop_assert!(last_time < 1.0);
                prop_assert!(last_time <= max_steps as f64 * dt * (1.0 + 1e-9));
                prop_assert!(last_state[0].is_finite());
            }
            other => prop_assert!(false, "expected integration error, got {:?}", other),
        }
    }

    #[test]
    fn test_ragged_trajectory_is_an_error_not_a_panic(
        rows in prop::collection::vec((0.0f64..100.0, 0.0f64..100.0), 1..8),
        short_row in any::<prop::sample::Index>()
    ) {
        let mut traj = Trajectory::new(&["H", "P"]);
        for (i, (h, p)) in rows.iter().enumerate() {
            traj.push(i as f64, &[*h, *p]);
        }
        let cut = short_row.index(rows.len());
        traj.states[cut].pop();
        let params = ParamSet::from([("r", 1.0), ("a", 0.1), ("e", 0.5), ("d", 0.5)]);
        let id = ModelId::Continuous(ContinuousModelId::LotkaVolterra);
        prop_assert!(api::vector_field(id, &traj, &params, 5).is_err());
    }

    #[test]
    fn test_beverton_holt_approaches_capacity_from_below(
        big_r in 1.1f64..5.0,
        k in 10.0f64..1000.0,
        fraction in 0.01f64..0.99
    ) {
        let traj = api::simulate_discrete(
            DiscreteModelId::BevertonHolt,
            &StateVector::from([("N", fraction * k)]),
            &ParamSet::from([("R", big_r), ("K", k)]),
            25,
        )
        .unwrap();
        let n = traj.series("N").unwrap();
        for pair in n.windows(2) {
            prop_assert!(pair[1] >= pair[0] - 1e-9 * k);
            prop_assert!(pair[1] <= k * (1.0 + 1e-12));
        }
    }

    #[test]
    fn test_constant_trajectory_yields_full_grid(
        h in 0.0f64..100.0,
        p in 0.0f64..100.0,
        density in 2usize..12
    ) {
        let model = ContinuousModel::LotkaVolterra(LotkaVolterraParams {
            r: 1.0,
            a: 0.1,
            e: 0.5,
            d: 0.5,
        });
        let mut traj = Trajectory::new(&["H", "P"]);
        traj.push(0.0, &[h, p]);
        let field = vector_field::sample(&model, SystemKind::Flow, &traj, None, density).unwrap();
        prop_assert_eq!(field.arrows.len(), density * density);
        prop_assert!(field.x_window.max > field.x_window.min);
        prop_assert!(field.y_window.max > field.y_window.min);
        prop_assert!(field
            .arrows
            .iter()
            .all(|a| a.start.iter().chain(&a.end).all(|v| v.is_finite())));
    }

    #[test]
    fn test_growth_trend_agrees_with_net_reproduction(
        (fecundity, survival) in arb_vital_rates()
    ) {
        let matrix = LeslieMatrix::from_vital_rates(&fecundity, &survival).unwrap();
        let r0 = matrix.net_reproductive_rate();
        prop_assume!((r0 - 1.0).abs() > 1e-3);
        let eigen = matrix.dominant_eigen().unwrap();
        prop_assert!(eigen.eigenvalue > 0.0);
        prop_assert_eq!(eigen.eigenvalue > 1.0, r0 > 1.0);
    }
}
