use reelspin_core::clock::FrameTime;
use reelspin_core::sim_trait::Simulation;
use reelspin_core::test_helpers::{self, FRAME_MS};
use reelspin_reel::{
    ColumnSpec, PhysicsConfig, ReelEvent, ReelPhase, SpinOrchestrator, SpinSequence,
};
use reelspin_sim::{RunOptions, run};
use reelspin_wheel::config::WheelConfig;
use reelspin_wheel::physics::WheelPhase;
use reelspin_wheel::pocket::PocketTable;
use reelspin_wheel::{WheelEvent, WheelLaunch, WheelSimulator};

fn frame_secs() -> f32 {
    FRAME_MS as f32 / 1000.0
}

#[test]
fn single_fast_reel_lands_on_zero() {
    let config = PhysicsConfig {
        item_extent: 80.0,
        max_velocity: 4000.0,
        ..Default::default()
    };
    let mut seq = SpinSequence::new(&config, &[ColumnSpec::new(10)], &[0], false).unwrap();
    test_helpers::run_at(&mut seq, FRAME_MS, 2000);

    let reel = &seq.reels()[0];
    assert_eq!(reel.phase(), ReelPhase::Stopped);
    assert_eq!(reel.position(), 0.0);
    assert_eq!(reel.target_position(), Some(0.0));
    assert_eq!(reel.visible_item(), 0);
}

#[test]
fn five_columns_stop_one_stagger_apart() {
    for is_final in [false, true] {
        let config = PhysicsConfig::default();
        let stagger = config.timing(is_final).column_stagger_delay_ms / 1000.0;
        let columns = vec![ColumnSpec::new(16); 5];
        let mut seq = SpinSequence::new(&config, &columns, &[3, 1, 4, 1, 5], is_final).unwrap();
        test_helpers::run_at(&mut seq, FRAME_MS, 3000);

        let ticks: Vec<u64> = seq.stop_ticks().iter().map(|t| t.unwrap()).collect();
        let spread = (ticks[4] - ticks[0]) as f32 * frame_secs();
        assert!(
            (spread - 4.0 * stagger).abs() <= 2.0 * frame_secs(),
            "stop spread {spread}s, expected {}s",
            4.0 * stagger
        );
        assert!(ticks.windows(2).all(|w| w[0] <= w[1]));
    }
}

#[test]
fn restart_while_spinning_lands_new_outcome() {
    let mut orch = SpinOrchestrator::new(PhysicsConfig::default(), vec![ColumnSpec::new(12); 5]).unwrap();
    orch.start(&[0, 1, 2, 3, 4], false).unwrap();
    for f in test_helpers::frames_60hz(45) {
        orch.advance(&f);
    }
    assert!(orch.is_running());

    let forced = orch.start(&[11, 10, 9, 8, 7], true).unwrap();
    assert!(matches!(forced.last(), Some(ReelEvent::SequenceComplete { .. })));

    test_helpers::run_at(&mut orch, FRAME_MS, 4000);
    let seq = orch.sequence().unwrap();
    assert!(seq.is_complete());
    assert_eq!(seq.visible_items(), vec![11, 10, 9, 8, 7]);
    for reel in seq.reels() {
        assert_eq!(reel.phase(), ReelPhase::Stopped);
        assert_eq!(Some(reel.position()), reel.target_position());
        assert_eq!(reel.velocity(), 0.0);
        assert!(!reel.was_forced());
    }
}

#[test]
fn extreme_ball_speed_caps_bounces_and_completes() {
    let config = WheelConfig {
        max_bounces: 3,
        ..Default::default()
    };
    let table = PocketTable::new((0..config.pocket_count).collect::<Vec<usize>>()).unwrap();
    let mut wheel = WheelSimulator::new(config, table).unwrap();
    wheel
        .spin(WheelLaunch {
            wheel_speed: 3.0,
            ball_speed: 5.0e4,
            target: Some(10),
        })
        .unwrap();

    let (events, _) = test_helpers::run_at(&mut wheel, FRAME_MS, 4000);
    assert_eq!(wheel.phase(), WheelPhase::Complete);
    assert!(wheel.state().bounce_count <= 3);
    let resolved: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            WheelEvent::PocketResolved { pocket, .. } => Some(*pocket),
            _ => None,
        })
        .collect();
    assert_eq!(resolved, vec![10]);
}

#[test]
fn frame_spike_moves_reel_less_than_one_item() {
    let config = PhysicsConfig::default();
    let columns = vec![ColumnSpec::new(12); 3];
    let mut seq = SpinSequence::new(&config, &columns, &[1, 2, 3], true).unwrap();

    let mut last = FrameTime::new(0.0, 0.0);
    for f in test_helpers::frames_60hz(40) {
        seq.advance(&f);
        last = f;
    }
    assert!(seq.reels().iter().all(|r| r.phase() == ReelPhase::Spinning));

    let travel = |seq: &SpinSequence| -> Vec<f32> {
        seq.reels()
            .iter()
            .map(|r| r.cursor() as f32 * config.item_extent + r.position())
            .collect()
    };
    let before = travel(&seq);
    seq.advance(&FrameTime::new(last.elapsed + 5.0, 5.0));
    let after = travel(&seq);

    for (b, a) in before.iter().zip(&after) {
        assert!(a - b < config.item_extent, "reel jumped {}px", a - b);
    }

    test_helpers::run_at(&mut seq, FRAME_MS, 3000);
    assert_eq!(seq.visible_items(), vec![1, 2, 3]);
}

#[test]
fn headless_run_matches_its_plan() {
    let options = RunOptions {
        seed: 1234,
        columns: 4,
        spins: 2,
        ..Default::default()
    };
    let summary = run(&options, PhysicsConfig::default(), WheelConfig::default()).unwrap();

    assert_eq!(summary.results, summary.plan);
    assert_eq!(summary.forced_columns, 0);
    assert_eq!(summary.wheel.pocket, Some(summary.wheel.target));
    for spin in &summary.stop_ticks {
        assert!(spin.windows(2).all(|w| w[0] <= w[1]));
    }

    let again = run(&options, PhysicsConfig::default(), WheelConfig::default()).unwrap();
    assert_eq!(summary, again);
}
