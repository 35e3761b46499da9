//! Quarter five-spot waterflood: injector at (0,0), producer at (ni-1, nj-1).

use wf_reservoir::{
    Corey, Injector, Producer, ReservoirConfig, ReservoirGrid, ReservoirSimulator,
};

fn five_spot() -> ReservoirSimulator {
    let grid = ReservoirGrid::uniform(5, 5, 600.0, 600.0, 20.0, 0.2, 100.0).unwrap();
    let config = ReservoirConfig {
        initial_pressure: 300.0,
        producer: Producer { rw: 0.1, skin: 0.0 },
        injector: Some(Injector {
            rw: 0.1,
            skin: 0.0,
            rate: 350.0,
        }),
        ..ReservoirConfig::default()
    };
    ReservoirSimulator::new(grid, Corey::default(), config).unwrap()
}

#[test]
fn waterflood_advances_front_from_injector() {
    let mut sim = five_spot();
    for _ in 0..10 {
        let outcome = sim.step(5.0, 200.0).unwrap();
        sim.accept(outcome.state).unwrap();
    }

    assert_eq!(sim.history().len(), 11);
    assert!((sim.time() - 50.0).abs() < 1e-12);

    let state = sim.current();
    let injector_cell = 0;
    let producer_cell = sim.well_cell();
    assert!(state.saturation(injector_cell) > 0.2);
    assert!(state.saturation(injector_cell) >= state.saturation(producer_cell));
    assert!(state.pressure(injector_cell) > state.pressure(producer_cell));
    assert!(state.pressure(producer_cell) > 200.0);

    for c in 0..state.n_cells() {
        assert!(state.pressure(c).is_finite());
        let sw = state.saturation(c);
        assert!((0.19..=0.81).contains(&sw), "cell {c} saturation {sw}");
    }

    let bhp = sim.injector_bhp(state).unwrap();
    assert!(bhp > state.pressure(injector_cell));

    let rates = sim.well_rates(state);
    assert!(rates.oil > 0.0);
    assert!(rates.liquid() > 0.0);
}

#[test]
fn injector_saturation_history_is_non_decreasing() {
    let mut sim = five_spot();
    for _ in 0..5 {
        let outcome = sim.step(10.0, 200.0).unwrap();
        sim.accept(outcome.state).unwrap();
    }
    let sw = sim.saturation_history(0, 0).unwrap();
    for pair in sw.windows(2) {
        assert!(pair[1] >= pair[0] - 1e-9, "{:?}", sw);
    }
}

#[test]
fn linearized_inflow_reproduces_well_rates() {
    let mut sim = five_spot();
    let outcome = sim.step(5.0, 220.0).unwrap();
    sim.accept(outcome.state).unwrap();
    let state = sim.current();
    let (pi, pr) = sim.linearized_inflow(state);
    let rates = sim.well_rates(state);
    assert!((pi * (pr - state.pwf) - rates.liquid()).abs() < 1e-9 * rates.liquid().max(1.0));
}
