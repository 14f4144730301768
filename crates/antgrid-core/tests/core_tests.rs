//! Tests for antgrid-core: config, board setup, and the ant state machine
//! driven one step at a time on hand-built boards.

use antgrid_core::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tempfile::TempDir;

fn ant(id: usize, row: usize, col: usize, phase: Phase) -> Agent {
    Agent::new(
        id,
        Coord::new(row, col),
        AgentState::awake(phase),
        StdRng::seed_from_u64(id as u64 + 11),
    )
}

fn board(rows: &[&str]) -> CellLockManager {
    CellLockManager::new(Grid::from_rows(rows).unwrap())
}

fn render(locks: &CellLockManager) -> String {
    locks.lock_grid().snapshot().to_string()
}

// ============================================================
// Config
// ============================================================

#[test]
fn config_defaults_match_classic_timings() {
    let config = SimConfig::default();
    assert_eq!(config.grid.size, GRID_SIZE);
    assert_eq!(config.grid.write_delay_us, 1_000);
    assert_eq!(config.grid.write_jitter_us, 500);
    assert_eq!(config.pacing.step_delay_ms, 50);
    assert_eq!(config.pacing.step_jitter_ms, 5);
    assert_eq!(config.pacing.delay_increment_ms, 10);
    assert_eq!(config.observer.frame_delay(), Duration::from_millis(50));
    assert_eq!(config.initial_sleepers, 0);
    assert!(config.seed.is_none());
}

#[test]
fn config_load_missing_file_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = SimConfig::load(&tmp.path().join("nope.toml"));
    assert_eq!(config, SimConfig::default());
}

#[test]
fn config_load_partial_file_keeps_other_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("antgrid.toml");
    std::fs::write(
        &path,
        "seed = 42\n\n[grid]\nsize = 12\n\n[pacing]\nstep_delay_ms = 5\n",
    )
    .unwrap();

    let config = SimConfig::load(&path);
    assert_eq!(config.seed, Some(42));
    assert_eq!(config.grid.size, 12);
    assert_eq!(config.grid.write_delay_us, 1_000);
    assert_eq!(config.pacing.step_delay_ms, 5);
    assert_eq!(config.pacing.delay_increment_ms, 10);
    assert_eq!(config.observer.frame_delay_ms, 50);
}

#[test]
fn config_load_garbage_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.toml");
    std::fs::write(&path, "[grid\nsize = ").unwrap();
    assert_eq!(SimConfig::load(&path), SimConfig::default());
}

#[test]
fn config_from_toml_str_reports_errors() {
    let err = SimConfig::from_toml_str("grid = 3").unwrap_err();
    assert!(matches!(err, Error::ConfigError(_)));
}

#[test]
fn config_to_toml_reparses_to_same_value() {
    let config = SimConfig {
        initial_sleepers: 3,
        seed: Some(9),
        ..SimConfig::default()
    };
    let text = config.to_toml();
    assert!(text.contains("[pacing]"));
    assert_eq!(SimConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn unpaced_config_has_no_delays() {
    let config = SimConfig::unpaced();
    assert_eq!(config.grid.write_pacing(), WritePacing::none());
    assert_eq!(config.pacing.step_delay_ms, 0);
    assert_eq!(config.pacing.step_jitter_ms, 0);
}

// ============================================================
// Parameters and setup
// ============================================================

#[test]
fn params_fill_board_exactly() {
    let p = Params::new(4, 5, Duration::from_secs(1));
    assert!(p.validate(3).is_ok());
    let err = Params::new(5, 5, Duration::from_secs(1)).validate(3).unwrap_err();
    assert!(err.to_string().contains("do not fit"));
}

#[test]
fn start_rejects_impossible_params_before_spawning() {
    let config = SimConfig {
        grid: config::GridConfig {
            size: 2,
            ..SimConfig::unpaced().grid
        },
        ..SimConfig::unpaced()
    };
    let result = Simulation::start(Params::new(3, 2, Duration::ZERO), &config);
    assert!(matches!(result, Err(Error::InvalidParams(_))));
}

#[test]
fn start_rejects_oversized_board() {
    let mut config = SimConfig::unpaced();
    config.grid.size = usize::MAX;
    let result = Simulation::start(Params::new(1, 1, Duration::ZERO), &config);
    assert!(matches!(result, Err(Error::InvalidParams(_))));
}

#[test]
fn seeded_food_is_reproducible() {
    let mut a = Grid::new(8);
    let mut b = Grid::new(8);
    a.seed_food(10, &mut StdRng::seed_from_u64(5)).unwrap();
    b.seed_food(10, &mut StdRng::seed_from_u64(5)).unwrap();
    let snap_a = CellLockManager::new(a).lock_grid().snapshot();
    let snap_b = CellLockManager::new(b).lock_grid().snapshot();
    assert_eq!(snap_a, snap_b);
    assert_eq!(snap_a.count(Cell::Food), 10);
}

// ============================================================
// State machine
// ============================================================

#[test]
fn hemmed_in_ant_picks_up_its_only_free_neighbour() {
    let locks = board(&["1o", "11"]);
    let mut a = ant(0, 0, 0, Phase::Foraging);

    let outcome = a.step(&locks);

    assert_eq!(
        outcome,
        StepOutcome::PickedUp {
            from: Coord::new(0, 0),
            to: Coord::new(0, 1)
        }
    );
    assert_eq!(a.state(), AgentState::awake(Phase::Carrying));
    assert_eq!(render(&locks), "-P\n11\n");
    assert_eq!(locks.locked_cells(), 0);
}

#[test]
fn foraging_prefers_food_over_empty_cells() {
    for seed in 0..16 {
        let locks = board(&["---", "-1o", "---"]);
        let mut a = Agent::new(
            0,
            Coord::new(1, 1),
            AgentState::awake(Phase::Foraging),
            StdRng::seed_from_u64(seed),
        );
        a.step(&locks);
        assert_eq!(a.pos(), Coord::new(1, 2), "seed {seed}");
        assert_eq!(a.state().phase, Phase::Carrying);
    }
}

#[test]
fn foraging_without_food_wanders_onto_empty() {
    let locks = board(&["1-", "--"]);
    let mut a = ant(0, 0, 0, Phase::Foraging);
    match a.step(&locks) {
        StepOutcome::Moved { from, to } => {
            assert_eq!(from, Coord::new(0, 0));
            assert_ne!(to, from);
        }
        other => panic!("expected a move, got {other:?}"),
    }
    assert_eq!(a.state().phase, Phase::Foraging);
    let snap = locks.lock_grid().snapshot();
    assert_eq!(snap.get(Coord::new(0, 0)), Cell::Empty);
    assert_eq!(snap.get(a.pos()), Cell::Ant);
    assert_eq!(snap.count(Cell::Ant), 1);
}

#[test]
fn boxed_in_ant_idles() {
    let locks = board(&["111", "111", "111"]);
    let mut a = ant(4, 1, 1, Phase::Foraging);
    assert_eq!(a.step(&locks), StepOutcome::Idle);
    assert_eq!(a.pos(), Coord::new(1, 1));
    assert_eq!(render(&locks), "111\n111\n111\n");
}

#[test]
fn carrying_ant_surrounded_by_food_stays_put() {
    let locks = board(&["ooo", "oPo", "ooo"]);
    let mut a = ant(0, 1, 1, Phase::Carrying);

    assert_eq!(a.step(&locks), StepOutcome::Idle);

    assert_eq!(a.state(), AgentState::awake(Phase::Carrying));
    assert_eq!(a.pos(), Coord::new(1, 1));
    assert_eq!(render(&locks), "ooo\noPo\nooo\n");
    assert_eq!(locks.locked_cells(), 0);
}

#[test]
fn carrying_ant_drops_food_next_to_food() {
    let locks = board(&["oP-", "ooo", "ooo"]);
    let mut a = ant(0, 0, 1, Phase::Carrying);

    let outcome = a.step(&locks);

    assert_eq!(
        outcome,
        StepOutcome::Dropped {
            from: Coord::new(0, 1),
            to: Coord::new(0, 2)
        }
    );
    assert_eq!(a.state(), AgentState::awake(Phase::Returning));
    assert_eq!(render(&locks), "oo1\nooo\nooo\n");
}

#[test]
fn carrying_ant_without_food_nearby_keeps_carrying() {
    let locks = board(&["-P", "--"]);
    let mut a = ant(0, 0, 1, Phase::Carrying);
    assert!(matches!(a.step(&locks), StepOutcome::Moved { .. }));
    assert_eq!(a.state().phase, Phase::Carrying);
    let snap = locks.lock_grid().snapshot();
    assert_eq!(snap.get(a.pos()), Cell::FoodAnt);
    assert_eq!(snap.count(Cell::FoodAnt), 1);
    assert_eq!(snap.count(Cell::Empty), 3);
}

#[test]
fn returning_ant_steps_off_and_forages_again() {
    let locks = board(&["o1", "o-"]);
    let mut a = ant(0, 0, 1, Phase::Returning);
    assert_eq!(
        a.step(&locks),
        StepOutcome::Moved {
            from: Coord::new(0, 1),
            to: Coord::new(1, 1)
        }
    );
    assert_eq!(a.state().phase, Phase::Foraging);
    assert_eq!(render(&locks), "o-\no1\n");
}

#[test]
fn returning_ant_ignores_food() {
    let locks = board(&["o1", "oo"]);
    let mut a = ant(0, 0, 1, Phase::Returning);
    assert_eq!(a.step(&locks), StepOutcome::Idle);
    assert_eq!(a.state().phase, Phase::Returning);
}

#[test]
#[should_panic(expected = "stepped while asleep")]
fn stepping_while_asleep_is_rejected() {
    let locks = board(&["S-", "--"]);
    let mut a = Agent::new(
        0,
        Coord::new(0, 0),
        AgentState::awake(Phase::Foraging).asleep(),
        StdRng::seed_from_u64(0),
    );
    a.step(&locks);
}

#[test]
fn sequential_ants_conserve_food() {
    let locks = board(&[
        "o-o--o",
        "-1--o-",
        "--o---",
        "o---1-",
        "-o----",
        "---1-o",
    ]);
    let mut ants = vec![
        ant(0, 1, 1, Phase::Foraging),
        ant(1, 3, 4, Phase::Foraging),
        ant(2, 5, 3, Phase::Foraging),
    ];
    let food = locks.lock_grid().snapshot().food_total();

    for _ in 0..300 {
        for a in ants.iter_mut() {
            a.step(&locks);
        }
        let snap = locks.lock_grid().snapshot();
        assert_eq!(snap.food_total(), food);
        assert_eq!(snap.count_where(|c| c.is_ant()), 3);
        for a in &ants {
            assert_eq!(snap.get(a.pos()), a.state().symbol());
        }
    }
    assert_eq!(locks.locked_cells(), 0);
}
