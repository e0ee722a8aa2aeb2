//! Two-color Life on a bounded torus.
//!
//! Standard birth-on-3, survive-on-2-or-3 dynamics; a newborn cell
//! takes the color held by the majority of its three parents. With
//! three parents there is never a color tie.

use crate::evolve::{Arena, Placement, SimError, Simulator, TrialCounts};
use crate::schema::{BLUE, RED, Seed};

/// In-process trial engine implementing the two-color rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmigrationSim;

impl Simulator for ImmigrationSim {
    fn run_trial(
        &self,
        left: &Seed,
        left_at: Placement,
        right: &Seed,
        right_at: Placement,
        arena: Arena,
    ) -> Result<TrialCounts, SimError> {
        let mut board = Board::new(arena)?;
        board.stamp(left, left_at)?;
        board.stamp(right, right_at)?;
        for _ in 0..arena.steps {
            board.step();
        }
        Ok(board.counts())
    }
}

/// Toroidal two-color Life board.
struct Board {
    width: usize,
    height: usize,
    cells: Vec<u8>,
    scratch: Vec<u8>,
}

impl Board {
    fn new(arena: Arena) -> Result<Self, SimError> {
        if arena.width == 0 || arena.height == 0 {
            return Err(SimError::EmptyArena);
        }
        Ok(Self {
            width: arena.width,
            height: arena.height,
            cells: vec![0; arena.width * arena.height],
            scratch: vec![0; arena.width * arena.height],
        })
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Copy a seed's cells onto the board at the given corner.
    fn stamp(&mut self, seed: &Seed, at: Placement) -> Result<(), SimError> {
        if at.x + seed.xspan > self.width || at.y + seed.yspan > self.height {
            return Err(SimError::OutOfBounds {
                x: at.x,
                y: at.y,
                width: self.width,
                height: self.height,
            });
        }
        for x in 0..seed.xspan {
            for y in 0..seed.yspan {
                let cell = seed.get(x, y);
                if cell != 0 {
                    let idx = self.index(at.x + x, at.y + y);
                    self.cells[idx] = cell;
                }
            }
        }
        Ok(())
    }

    /// One rule application over the whole torus.
    fn step(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                let mut live = 0u8;
                let mut red = 0u8;
                for dy in [self.height - 1, 0, 1] {
                    for dx in [self.width - 1, 0, 1] {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = (x + dx) % self.width;
                        let ny = (y + dy) % self.height;
                        match self.cells[self.index(nx, ny)] {
                            0 => {}
                            RED => {
                                live += 1;
                                red += 1;
                            }
                            _ => live += 1,
                        }
                    }
                }
                let idx = self.index(x, y);
                let current = self.cells[idx];
                self.scratch[idx] = match (current, live) {
                    (c, 2 | 3) if c != 0 => c,
                    (0, 3) => {
                        if red >= 2 {
                            RED
                        } else {
                            BLUE
                        }
                    }
                    _ => 0,
                };
            }
        }
        std::mem::swap(&mut self.cells, &mut self.scratch);
    }

    fn counts(&self) -> TrialCounts {
        let mut counts = TrialCounts::default();
        for &cell in &self.cells {
            match cell {
                RED => counts.red += 1,
                BLUE => counts.blue += 1,
                _ => {}
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(width: usize, height: usize, steps: usize) -> Arena {
        Arena {
            width,
            height,
            steps,
        }
    }

    fn at(x: usize, y: usize) -> Placement {
        Placement { x, y }
    }

    /// Horizontal blinker: period two, population three.
    fn blinker() -> Seed {
        Seed::from_cells(3, 1, vec![RED, RED, RED])
    }

    /// Two-by-two block: still life.
    fn block() -> Seed {
        Seed::from_cells(2, 2, vec![RED, RED, RED, RED])
    }

    #[test]
    fn test_block_is_still() {
        let sim = ImmigrationSim;
        let counts = sim
            .run_trial(
                &block(),
                at(2, 2),
                &block().recolor(BLUE),
                at(10, 2),
                arena(16, 8, 50),
            )
            .unwrap();
        assert_eq!(counts.red, 4);
        assert_eq!(counts.blue, 4);
    }

    #[test]
    fn test_blinker_oscillates() {
        let sim = ImmigrationSim;
        // Odd step count leaves the blinker vertical; population holds.
        let counts = sim
            .run_trial(
                &blinker(),
                at(2, 3),
                &blinker().recolor(BLUE),
                at(10, 3),
                arena(16, 8, 51),
            )
            .unwrap();
        assert_eq!(counts.red, 3);
        assert_eq!(counts.blue, 3);
    }

    #[test]
    fn test_lone_cells_die() {
        let lone = Seed::from_cells(1, 1, vec![RED]);
        let sim = ImmigrationSim;
        let counts = sim
            .run_trial(
                &lone,
                at(2, 2),
                &lone.recolor(BLUE),
                at(10, 2),
                arena(16, 8, 1),
            )
            .unwrap();
        assert_eq!(counts.red, 0);
        assert_eq!(counts.blue, 0);
    }

    #[test]
    fn test_birth_takes_majority_color() {
        // An L of two reds and one blue births a red cell at the
        // corner they share.
        let mut board = Board::new(arena(8, 8, 0)).unwrap();
        board.stamp(&Seed::from_cells(1, 2, vec![RED, RED]), at(2, 2)).unwrap();
        board.stamp(&Seed::from_cells(1, 1, vec![BLUE]), at(3, 2)).unwrap();
        board.step();
        assert_eq!(board.cells[board.index(3, 3)], RED);
        assert_eq!(board.cells[board.index(2, 3)], RED);
    }

    #[test]
    fn test_torus_wraps() {
        // A blinker laid across the seam keeps oscillating instead of
        // dying at an edge.
        let mut board = Board::new(arena(6, 6, 0)).unwrap();
        board.stamp(&Seed::from_cells(1, 3, vec![RED, RED, RED]), at(0, 2)).unwrap();
        board.step();
        assert_eq!(board.cells[board.index(5, 3)], RED);
        assert_eq!(board.cells[board.index(0, 3)], RED);
        assert_eq!(board.cells[board.index(1, 3)], RED);
    }

    #[test]
    fn test_out_of_bounds_placement_is_reported() {
        let sim = ImmigrationSim;
        let result = sim.run_trial(
            &block(),
            at(15, 2),
            &block().recolor(BLUE),
            at(10, 2),
            arena(16, 8, 1),
        );
        assert!(matches!(result, Err(SimError::OutOfBounds { .. })));
    }

    #[test]
    fn test_empty_arena_is_reported() {
        assert!(matches!(
            Board::new(arena(0, 8, 1)),
            Err(SimError::EmptyArena)
        ));
    }

    #[test]
    fn test_full_run_against_real_engine() {
        use crate::evolve::EvolutionRun;
        use crate::schema::EvolutionConfig;

        let config = EvolutionConfig {
            pop_size: 6,
            s_xspan: 4,
            s_yspan: 4,
            seed_density: 0.5,
            num_trials: 1,
            num_generations: 6,
            elite_size: 2,
            snapshot_interval: 3,
            max_seed_area: 40,
            // Small arenas keep the full-rule run quick.
            width_factor: 2.5,
            height_factor: 1.5,
            time_factor: 1.5,
            random_seed: Some(7),
            ..Default::default()
        };

        let mut run = EvolutionRun::new(config, ImmigrationSim).unwrap();
        let progress = run.run().unwrap();
        assert_eq!(progress.generation, 6);
        assert_eq!(run.ledger().len(), 6);
        for seed in run.ledger().seeds() {
            assert_eq!(seed.num_living, seed.count_living());
        }
        assert!((0.0..=1.0).contains(&progress.best_fitness));
    }
}
