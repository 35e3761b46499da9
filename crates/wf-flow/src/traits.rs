//! Capability shared by segments, elements, boosters and networks.

use crate::boundary::FlowState;
use crate::error::FlowResult;
use crate::quantity::FlowQuantity;

/// Anything that carries fluid from an inlet port to an outlet port.
///
/// Both solve directions share one contract: the known port is the input, the
/// other port is produced and stored. Composites chain their children with
/// the same contract, so a network, an element and a single segment are
/// interchangeable wherever a `Flowable` is expected.
pub trait Flowable {
    fn name(&self) -> &str;

    /// Given the inlet state, produce the outlet state.
    fn solve_out_flow(&mut self, inlet: &FlowState) -> FlowResult<FlowState>;

    /// Given the outlet state, produce the inlet state.
    fn solve_in_flow(&mut self, outlet: &FlowState) -> FlowResult<FlowState>;

    /// Inlet state of the last solve.
    fn inlet(&self) -> Option<FlowState>;

    /// Outlet state of the last solve.
    fn outlet(&self) -> Option<FlowState>;

    /// One value per segment, ordered inlet to outlet. Quantities that are not
    /// available yet are NaN.
    fn profile(&self, quantity: FlowQuantity) -> Vec<f64>;
}
