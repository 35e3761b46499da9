//! Operating point between a linear IPR and a vertical well.

use wf_core::units::{Pressure, VolumeRate, bar, degc, m, m3pd, to_bar, to_m3pd};
use wf_flow::{FlowError, FlowResult, InflowRelation, LinearIpr, Network, PipeDefaults};
use wf_fluids::BlackOilFluid;

fn vertical_well() -> Network {
    let mut net = Network::new("producer", BlackOilFluid::new(30.0, 0.7, 100.0).unwrap());
    net.add_pipe("tubing")
        .set_length(m(1000.0))
        .unwrap()
        .set_elevations(m(-1000.0), m(0.0))
        .unwrap()
        .set_divisions(8)
        .unwrap();
    net.set_wellhead(bar(20.0), degc(50.0));
    net
}

#[test]
fn inflow_and_lift_agree() {
    let mut net = vertical_well();
    let ipr = LinearIpr::new(10.0, bar(300.0)).unwrap();
    net.set_ipr(ipr);
    let op = net.solve_operating_point(None).unwrap();
    assert!(op.converged);

    let pwf = to_bar(op.pwf);
    assert!(pwf > 20.0 && pwf < 300.0);
    let q_ipr = 10.0 * (300.0 - pwf);
    assert!((to_m3pd(op.q_std) - q_ipr).abs() < 1e-6);

    let lift = to_bar(net.vlp(op.q_std).unwrap());
    assert!((lift - pwf).abs() < 1e-2, "pwf {pwf} vs lift {lift}");
    assert_eq!(net.operating_point(), Some(&op));
}

#[test]
fn estimate_seeds_the_search() {
    let mut net = vertical_well();
    net.set_ipr(LinearIpr::new(10.0, bar(300.0)).unwrap());
    let cold = net.solve_operating_point(None).unwrap();
    let warm = net.solve_operating_point(Some(cold.pwf)).unwrap();
    assert!(warm.converged);
    assert!((to_bar(warm.pwf) - to_bar(cold.pwf)).abs() < 1e-2);
    assert!(warm.evaluations <= cold.evaluations);
}

#[test]
fn weaker_reservoir_flows_less() {
    let mut strong = vertical_well();
    strong.set_ipr(LinearIpr::new(10.0, bar(300.0)).unwrap());
    let mut weak = vertical_well();
    weak.set_ipr(LinearIpr::new(10.0, bar(200.0)).unwrap());
    let q_strong = to_m3pd(strong.solve_operating_point(None).unwrap().q_std);
    let q_weak = to_m3pd(weak.solve_operating_point(None).unwrap().q_std);
    assert!(q_weak < q_strong);
}

/// Inflow that stops at 150 bar regardless of drawdown below 100 bar.
struct CappedInflow {
    calls: usize,
}

impl InflowRelation for CappedInflow {
    fn rate(&mut self, pwf: Pressure) -> FlowResult<VolumeRate> {
        self.calls += 1;
        let dd = (150.0 - to_bar(pwf)).clamp(0.0, 50.0);
        Ok(m3pd(20.0 * dd))
    }

    fn reservoir_pressure(&self) -> Pressure {
        bar(150.0)
    }
}

#[test]
fn custom_inflow_relation() {
    let mut net = vertical_well();
    let mut inflow = CappedInflow { calls: 0 };
    let op = net.solve_operating_point_with(&mut inflow, None).unwrap();
    assert_eq!(inflow.calls, op.evaluations);
    assert!(to_bar(op.pwf) <= 150.0);
    let lift = to_bar(net.vlp(op.q_std).unwrap());
    assert!((lift - to_bar(op.pwf)).abs() < 1e-2);
}

#[test]
fn reservoir_below_minimum_pressure_is_rejected() {
    let mut net = vertical_well();
    let mut ipr = LinearIpr::new(5.0, bar(0.5)).unwrap();
    assert!(net.solve_operating_point_with(&mut ipr, None).is_err());
}

/// Vertical tubing followed by a flowline that drops 100 m to a low-pressure
/// wellhead. At low rates the flowline traverse falls below the pressure floor.
fn downhill_flowline_well() -> Network {
    let mut net = Network::new("producer", BlackOilFluid::new(30.0, 0.7, 100.0).unwrap());
    net.set_defaults(PipeDefaults {
        diameter: m(0.1),
        ..PipeDefaults::default()
    })
    .unwrap();
    net.add_pipe("tubing")
        .set_length(m(1000.0))
        .unwrap()
        .set_elevations(m(-1000.0), m(0.0))
        .unwrap();
    net.add_pipe("flowline")
        .set_length(m(2000.0))
        .unwrap()
        .set_elevations(m(0.0), m(-100.0))
        .unwrap();
    net.set_wellhead(bar(5.0), degc(40.0));
    net
}

#[test]
fn infeasible_trials_do_not_abort_the_search() {
    let mut net = downhill_flowline_well();
    assert!(matches!(net.vlp(m3pd(50.0)), Err(e) if e.is_infeasible()));

    let mut ipr = LinearIpr::new(10.0, bar(300.0)).unwrap();
    let op = net.solve_operating_point_with(&mut ipr, None).unwrap();
    assert!(op.converged);
    let pwf = to_bar(op.pwf);
    assert!(pwf > 1.0 && pwf < 300.0);
    assert!((to_m3pd(op.q_std) - 10.0 * (300.0 - pwf)).abs() < 1e-6);
    let lift = to_bar(net.vlp(op.q_std).unwrap());
    assert!((lift - pwf).abs() < 1e-2, "pwf {pwf} vs lift {lift}");
}

#[test]
fn no_feasible_trial_is_non_physical() {
    let mut net = downhill_flowline_well();
    let mut ipr = LinearIpr::new(10.0, bar(5.0)).unwrap();
    assert!(matches!(
        net.solve_operating_point_with(&mut ipr, None),
        Err(FlowError::NonPhysical { .. })
    ));
}
