//! Pairwise competitive fitness scoring.
//!
//! A pair of seeds is scored by repeated trials: both are randomly
//! reoriented, dropped into opposite halves of a fresh arena, and run
//! under the simulator. The seed that grew more wins the trial.

use rand::Rng;

use crate::schema::{BLUE, EvolutionConfig, Seed};

use super::simulator::{Arena, Placement, SimError, Simulator};

/// Scores seed pairs by averaged competitive trials.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    width_factor: f64,
    height_factor: f64,
    time_factor: f64,
    num_trials: usize,
}

impl FitnessEvaluator {
    pub fn new(config: &EvolutionConfig) -> Self {
        Self {
            width_factor: config.width_factor,
            height_factor: config.height_factor,
            time_factor: config.time_factor,
            num_trials: config.num_trials,
        }
    }

    /// Arena geometry for a pair, scaled from the largest span of
    /// either seed so both always fit their half with room to grow.
    pub fn arena_for(&self, a: &Seed, b: &Seed) -> Arena {
        let max_span = a.xspan.max(a.yspan).max(b.xspan).max(b.yspan);
        let width = (max_span as f64 * self.width_factor) as usize;
        let height = (max_span as f64 * self.height_factor) as usize;
        let steps = ((width + height) as f64 * self.time_factor) as usize;
        Arena {
            width,
            height,
            steps,
        }
    }

    /// Run `num_trials` trials of `a` against `b` and return their
    /// averaged scores. Each trial awards 1 to the seed with the
    /// larger net growth, or 0.5 each on a tie, so the two scores of
    /// any single trial sum to exactly 1.
    ///
    /// Growth is measured against the seed's own starting size and
    /// floored at zero: shrinking below the initial count never scores
    /// negative. Both seeds must hold at least one live cell.
    pub fn score_pair<S: Simulator + ?Sized, R: Rng>(
        &self,
        sim: &S,
        rng: &mut R,
        a: &Seed,
        b: &Seed,
    ) -> Result<(f64, f64), SimError> {
        assert!(a.num_living > 0, "first seed has no living cells");
        assert!(b.num_living > 0, "second seed has no living cells");

        let mut score_a = 0.0;
        let mut score_b = 0.0;

        for _ in 0..self.num_trials {
            // Fresh orientation draws every trial.
            let left = a.random_rotate(rng);
            let right = b.random_rotate(rng).recolor(BLUE);
            let arena = self.arena_for(&left, &right);

            let left_at = place_in(rng, &left, 0, arena.width / 2, arena.height);
            let right_at = place_in(rng, &right, arena.width / 2, arena.width, arena.height);

            let counts = sim.run_trial(&left, left_at, &right, right_at, arena)?;

            let growth_a = counts.red.saturating_sub(left.num_living);
            let growth_b = counts.blue.saturating_sub(right.num_living);

            match growth_a.cmp(&growth_b) {
                std::cmp::Ordering::Greater => score_a += 1.0,
                std::cmp::Ordering::Less => score_b += 1.0,
                std::cmp::Ordering::Equal => {
                    score_a += 0.5;
                    score_b += 0.5;
                }
            }
        }

        let trials = self.num_trials as f64;
        Ok((score_a / trials, score_b / trials))
    }

    /// Absolute fitness of a seed: its averaged score against freshly
    /// shuffled copies of itself. A shuffled copy keeps the seed's
    /// dimensions and density, so scores above 0.5 reflect structure
    /// rather than bulk.
    pub fn score_against_shuffled<S: Simulator + ?Sized, R: Rng>(
        &self,
        sim: &S,
        rng: &mut R,
        seed: &Seed,
        samples: usize,
    ) -> Result<f64, SimError> {
        assert!(samples > 0, "sample count must be non-zero");
        let mut total = 0.0;
        for _ in 0..samples {
            let shuffled = seed.shuffle(rng);
            let (_, evolved) = self.score_pair(sim, rng, &shuffled, seed)?;
            total += evolved;
        }
        Ok(total / samples as f64)
    }
}

/// Uniform placement of a seed inside one horizontal band of the
/// arena, clamped so the seed never hangs over the band edge.
fn place_in<R: Rng>(
    rng: &mut R,
    seed: &Seed,
    x_lo: usize,
    x_hi: usize,
    height: usize,
) -> Placement {
    let x_max = x_hi.saturating_sub(seed.xspan).max(x_lo);
    let y_max = height.saturating_sub(seed.yspan);
    Placement {
        x: rng.gen_range(x_lo..=x_max),
        y: rng.gen_range(0..=y_max),
    }
}
