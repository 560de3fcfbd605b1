pub mod clock;
pub mod error;
pub mod motion;
pub mod outcome;
pub mod sim_trait;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::clock::{FrameTime, fixed_frames};
    use crate::sim_trait::{Simulation, run_until_settled};

    /// 60 Hz frame interval in milliseconds.
    pub const FRAME_MS: f64 = 1000.0 / 60.0;

    /// `n` frames at 60 Hz, starting from a fresh clock.
    pub fn frames_60hz(n: usize) -> Vec<FrameTime> {
        fixed_frames(FRAME_MS).take(n).collect()
    }

    /// Run a simulation at `frame_ms` intervals for at most `max_frames`.
    /// Returns the events and the index of the frame on which it settled.
    pub fn run_at<S: Simulation + ?Sized>(
        sim: &mut S,
        frame_ms: f64,
        max_frames: usize,
    ) -> (Vec<S::Event>, usize) {
        run_until_settled(sim, fixed_frames(frame_ms).take(max_frames))
    }

    // ================================================================
    // Simulation Contract Tests
    // ================================================================
    // Every Simulation implementation must pass these. Randomizer crates
    // call them from their own #[cfg(test)] modules with a freshly started
    // simulation.

    /// Running at 60 Hz must settle within `max_frames`.
    pub fn contract_eventually_settles<S: Simulation + ?Sized>(sim: &mut S, max_frames: usize) {
        let (_, frames) = run_at(sim, FRAME_MS, max_frames);
        assert!(
            sim.is_settled(),
            "Simulation must settle within {max_frames} frames (ran {frames})"
        );
    }

    /// force_stop() must settle immediately, and a second call must be a no-op.
    pub fn contract_force_stop_idempotent<S: Simulation + ?Sized>(sim: &mut S) {
        let frames = frames_60hz(10);
        for f in &frames {
            sim.advance(f);
        }
        sim.force_stop();
        assert!(sim.is_settled(), "force_stop() must settle the simulation");
        let again = sim.force_stop();
        assert!(again.is_empty(), "force_stop() on a settled simulation must emit nothing");
    }

    /// Once settled, further ticks must not emit anything.
    pub fn contract_settled_is_quiet<S: Simulation + ?Sized>(sim: &mut S, max_frames: usize) {
        run_at(sim, FRAME_MS, max_frames);
        assert!(sim.is_settled());
        for f in frames_60hz(30) {
            let events = sim.advance(&FrameTime::new(f.elapsed + 1000.0, f.dt));
            assert!(events.is_empty(), "settled simulation emitted events");
        }
    }

    /// A 5 s frame hitch must not crash or stall the simulation.
    pub fn contract_survives_hitch<S: Simulation + ?Sized>(sim: &mut S, max_frames: usize) {
        let frames = frames_60hz(20);
        for f in &frames {
            sim.advance(f);
        }
        let last = frames.last().copied().unwrap_or(FrameTime::new(0.0, 0.0));
        let resume = last.elapsed + 5.0;
        sim.advance(&FrameTime::new(resume, 5.0));
        sim.advance(&FrameTime::new(resume, f32::NAN));
        let after_hitch = frames_60hz(max_frames)
            .into_iter()
            .map(|f| FrameTime::new(resume + f.elapsed, f.dt));
        run_until_settled(sim, after_hitch);
        assert!(sim.is_settled(), "Simulation must settle after a frame hitch");
    }
}
