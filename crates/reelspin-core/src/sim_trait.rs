use crate::clock::FrameTime;

/// Core trait implemented by every randomizer animation.
///
/// The host owns the frame loop and rendering; a simulation only turns frame
/// times into state, and reports what happened on each tick as events.
/// Every event a simulation emits fires exactly once.
pub trait Simulation {
    /// Events emitted during `advance` or `force_stop`.
    type Event;

    /// Advance by one frame. Returns the events that became true on this tick.
    fn advance(&mut self, frame: &FrameTime) -> Vec<Self::Event>;

    /// Drive every moving part to its terminal state immediately, landing on
    /// the already-committed outcome. Calling this on a settled simulation
    /// is a no-op and returns no events.
    fn force_stop(&mut self) -> Vec<Self::Event>;

    /// Whether the simulation has reached its terminal state.
    fn is_settled(&self) -> bool;
}

/// Drive a simulation with a stream of frames until it settles or the frames
/// run out. Returns every emitted event and the number of frames consumed.
pub fn run_until_settled<S: Simulation + ?Sized>(
    sim: &mut S,
    frames: impl IntoIterator<Item = FrameTime>,
) -> (Vec<S::Event>, usize) {
    let mut events = Vec::new();
    let mut consumed = 0;
    for frame in frames {
        if sim.is_settled() {
            break;
        }
        events.extend(sim.advance(&frame));
        consumed += 1;
    }
    (events, consumed)
}
