//! Population bookkeeping: the seed array and its pairwise matrices.
//!
//! The ledger owns a fixed-size population plus two square caches:
//! `history[i][j]` is the averaged trial outcome of seed i against
//! seed j (0.5 on the diagonal by convention), and `similarities[i][j]`
//! is their structural agreement (1.0 on the diagonal). Both stay
//! symmetric; only [`PopulationLedger::replace`] writes them, and it
//! rebuilds the full row and column for the incoming seed before
//! returning.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use rayon::prelude::*;

use crate::schema::{EvolutionConfig, Seed, similarity};

use super::fitness::FitnessEvaluator;
use super::simulator::{SimError, Simulator};

/// Fixed-capacity population with pairwise fitness and similarity
/// caches.
#[derive(Debug, Clone)]
pub struct PopulationLedger {
    seeds: Vec<Seed>,
    history: Vec<Vec<f64>>,
    similarities: Vec<Vec<f64>>,
}

impl PopulationLedger {
    /// Random initial population at the configured size and density.
    ///
    /// The history matrix starts flat (0.5 diagonal, zeros elsewhere)
    /// and fills in as replacements run their trials; similarities are
    /// computed up front since they cost no simulator calls.
    pub fn random<R: Rng>(config: &EvolutionConfig, rng: &mut R) -> Self {
        let seeds = (0..config.pop_size)
            .map(|_| loop {
                let seed =
                    Seed::random(config.s_xspan, config.s_yspan, config.seed_density, rng);
                // A dead seed can never be trialed; redraw.
                if seed.num_living > 0 {
                    break seed;
                }
            })
            .collect();
        Self::from_seeds(seeds)
    }

    /// Adopt an existing seed list (for example a loaded elite) as a
    /// population. Addresses are assigned from array order.
    pub fn from_seeds(mut seeds: Vec<Seed>) -> Self {
        assert!(seeds.len() >= 2, "population needs at least two seeds");
        let n = seeds.len();
        for (i, seed) in seeds.iter_mut().enumerate() {
            seed.address = i;
        }

        let mut history = vec![vec![0.0; n]; n];
        let mut similarities = vec![vec![0.0; n]; n];
        for i in 0..n {
            history[i][i] = 0.5;
            similarities[i][i] = 1.0;
            for j in (i + 1)..n {
                let s = similarity(&seeds[i], &seeds[j]);
                similarities[i][j] = s;
                similarities[j][i] = s;
            }
        }

        Self {
            seeds,
            history,
            similarities,
        }
    }

    /// Population size. Constant for the ledger's lifetime.
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Seed at the given address.
    pub fn seed(&self, addr: usize) -> &Seed {
        &self.seeds[addr]
    }

    /// All seeds in address order.
    pub fn seeds(&self) -> &[Seed] {
        &self.seeds
    }

    /// Averaged outcome of seed i against seed j.
    pub fn history(&self, i: usize, j: usize) -> f64 {
        self.history[i][j]
    }

    /// Cached structural agreement of seeds i and j.
    pub fn similarity_between(&self, i: usize, j: usize) -> f64 {
        self.similarities[i][j]
    }

    /// Fitness of a seed: the mean of its history row across the
    /// whole population, its own tie value included.
    pub fn fitness(&self, addr: usize) -> f64 {
        let row = &self.history[addr];
        row.iter().sum::<f64>() / row.len() as f64
    }

    /// Mean fitness across the population.
    pub fn mean_fitness(&self) -> f64 {
        (0..self.len()).map(|i| self.fitness(i)).sum::<f64>() / self.len() as f64
    }

    /// Fittest seed; earliest address wins ties.
    pub fn best(&self) -> &Seed {
        let mut best = 0;
        for i in 1..self.len() {
            if self.fitness(i) > self.fitness(best) {
                best = i;
            }
        }
        &self.seeds[best]
    }

    /// Least fit seed; earliest address wins ties.
    pub fn worst(&self) -> &Seed {
        let mut worst = 0;
        for i in 1..self.len() {
            if self.fitness(i) < self.fitness(worst) {
                worst = i;
            }
        }
        &self.seeds[worst]
    }

    /// The k fittest seeds in descending fitness order; ties keep
    /// address order.
    pub fn top_k(&self, k: usize) -> Vec<&Seed> {
        assert!(k > 0 && k < self.len(), "k must lie in 1..pop_size");
        let mut addrs: Vec<usize> = (0..self.len()).collect();
        // Stable sort so equal fitness preserves address order.
        addrs.sort_by(|&a, &b| self.fitness(b).partial_cmp(&self.fitness(a)).unwrap());
        addrs.into_iter().take(k).map(|i| &self.seeds[i]).collect()
    }

    /// k distinct seeds drawn uniformly, by shuffling the address
    /// space rather than rejection sampling.
    pub fn random_sample<R: Rng>(&self, k: usize, rng: &mut R) -> Vec<&Seed> {
        assert!(k > 0 && k < self.len(), "k must lie in 1..pop_size");
        let mut addrs: Vec<usize> = (0..self.len()).collect();
        addrs.shuffle(rng);
        addrs.into_iter().take(k).map(|i| &self.seeds[i]).collect()
    }

    /// Fittest member of a uniform k-sample.
    pub fn tournament<R: Rng>(&self, k: usize, rng: &mut R) -> &Seed {
        let sample = self.random_sample(k, rng);
        let mut best = sample[0];
        for &seed in &sample[1..] {
            if self.fitness(seed.address) > self.fitness(best.address) {
                best = seed;
            }
        }
        best
    }

    /// Population members (the target excluded) whose cached
    /// similarity to the target lies in `[lo, hi]`.
    pub fn similar_to(&self, target: &Seed, lo: f64, hi: f64) -> Vec<&Seed> {
        let row = &self.similarities[target.address];
        self.seeds
            .iter()
            .filter(|other| {
                other.address != target.address
                    && row[other.address] >= lo
                    && row[other.address] <= hi
            })
            .collect()
    }

    /// Install `child` at `addr` and rebuild that row and column of
    /// both matrices against the whole population.
    ///
    /// The self-pair costs no simulator call (history 0.5, similarity
    /// 1.0); every other member costs one scored pair. The trials fan
    /// out across worker threads with one child rng per opponent, and
    /// all results are joined before either matrix is touched, so a
    /// failed trial leaves the matrices unwritten.
    pub fn replace<S: Simulator + ?Sized, R: Rng>(
        &mut self,
        addr: usize,
        mut child: Seed,
        evaluator: &FitnessEvaluator,
        sim: &S,
        rng: &mut R,
    ) -> Result<(), SimError> {
        assert!(addr < self.len(), "address out of range");
        assert_eq!(
            child.num_living,
            child.count_living(),
            "stale num_living on incoming seed"
        );

        child.address = addr;
        self.seeds[addr] = child;

        let trial_seeds: Vec<u64> = (0..self.len()).map(|_| rng.r#gen()).collect();
        let seeds = &self.seeds;
        let outcomes: Vec<(f64, f64)> = trial_seeds
            .into_par_iter()
            .enumerate()
            .map(|(j, trial_seed)| {
                if j == addr {
                    return Ok((0.5, 0.5));
                }
                let mut trial_rng = StdRng::seed_from_u64(trial_seed);
                evaluator.score_pair(sim, &mut trial_rng, &seeds[addr], &seeds[j])
            })
            .collect::<Result<_, SimError>>()?;

        for (j, (score_new, score_old)) in outcomes.into_iter().enumerate() {
            self.history[addr][j] = score_new;
            self.history[j][addr] = score_old;
            let s = if j == addr {
                1.0
            } else {
                similarity(&self.seeds[addr], &self.seeds[j])
            };
            self.similarities[addr][j] = s;
            self.similarities[j][addr] = s;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RED;
    use rand::SeedableRng;

    use super::super::simulator::{Arena, Placement, TrialCounts};

    /// Deterministic double: the larger seed grows, the smaller dies.
    struct BiggerWinsSim;

    impl Simulator for BiggerWinsSim {
        fn run_trial(
            &self,
            left: &Seed,
            _left_at: Placement,
            right: &Seed,
            _right_at: Placement,
            _arena: Arena,
        ) -> Result<TrialCounts, SimError> {
            Ok(TrialCounts {
                red: left.num_living * 2,
                blue: right.num_living * 2,
            })
        }
    }

    fn config(pop_size: usize) -> EvolutionConfig {
        EvolutionConfig {
            pop_size,
            s_xspan: 4,
            s_yspan: 4,
            seed_density: 0.5,
            num_trials: 2,
            ..Default::default()
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    fn assert_symmetric(ledger: &PopulationLedger) {
        for i in 0..ledger.len() {
            for j in 0..ledger.len() {
                assert_eq!(
                    ledger.similarity_between(i, j),
                    ledger.similarity_between(j, i)
                );
            }
            assert_eq!(ledger.history(i, i), 0.5);
            assert_eq!(ledger.similarity_between(i, i), 1.0);
        }
    }

    #[test]
    fn test_random_population_invariants() {
        let mut rng = rng();
        let ledger = PopulationLedger::random(&config(10), &mut rng);
        assert_eq!(ledger.len(), 10);
        for seed in ledger.seeds() {
            assert!(seed.num_living > 0);
            assert_eq!(seed.num_living, seed.count_living());
        }
        for (i, seed) in ledger.seeds().iter().enumerate() {
            assert_eq!(seed.address, i);
        }
        assert_symmetric(&ledger);
    }

    #[test]
    fn test_replace_rebuilds_row_and_column() {
        let mut rng = rng();
        let mut ledger = PopulationLedger::random(&config(6), &mut rng);
        let evaluator = FitnessEvaluator::new(&config(6));

        let child = Seed::random(4, 4, 0.5, &mut rng).flip_bits(0.2, &mut rng);
        let child = if child.num_living == 0 {
            Seed::from_cells(4, 4, vec![RED; 16])
        } else {
            child
        };
        ledger
            .replace(3, child.clone(), &evaluator, &BiggerWinsSim, &mut rng)
            .unwrap();

        assert_eq!(ledger.seed(3).address, 3);
        assert_eq!(ledger.history(3, 3), 0.5);
        assert_eq!(ledger.similarity_between(3, 3), 1.0);
        for j in 0..ledger.len() {
            if j == 3 {
                continue;
            }
            // BiggerWinsSim doubles both sides, so per-trial outcomes
            // follow num_living and both directions stay coupled.
            assert!((ledger.history(3, j) + ledger.history(j, 3) - 1.0).abs() < 1e-9);
            assert_eq!(
                ledger.similarity_between(3, j),
                similarity(ledger.seed(3), ledger.seed(j))
            );
        }
        assert_symmetric(&ledger);
    }

    #[test]
    fn test_fitness_is_history_row_mean() {
        let mut rng = rng();
        let mut ledger = PopulationLedger::random(&config(5), &mut rng);
        let evaluator = FitnessEvaluator::new(&config(5));
        let child = Seed::from_cells(4, 4, vec![RED; 16]);
        ledger
            .replace(0, child, &evaluator, &BiggerWinsSim, &mut rng)
            .unwrap();

        let row_mean: f64 = (0..5).map(|j| ledger.history(0, j)).sum::<f64>() / 5.0;
        assert!((ledger.fitness(0) - row_mean).abs() < 1e-12);
    }

    #[test]
    fn test_worst_prefers_first_on_ties() {
        let mut rng = rng();
        let ledger = PopulationLedger::random(&config(4), &mut rng);
        // Untouched history rows are identical, so everyone ties.
        assert_eq!(ledger.worst().address, 0);
        assert_eq!(ledger.best().address, 0);
    }

    #[test]
    fn test_top_k_is_stable_descending() {
        let mut rng = rng();
        let mut ledger = PopulationLedger::random(&config(6), &mut rng);
        let evaluator = FitnessEvaluator::new(&config(6));
        // A full seed beats everything under BiggerWinsSim.
        let strong = Seed::from_cells(4, 4, vec![RED; 16]);
        ledger
            .replace(4, strong, &evaluator, &BiggerWinsSim, &mut rng)
            .unwrap();

        let top = ledger.top_k(3);
        assert_eq!(top.len(), 3);
        assert!(ledger.fitness(top[0].address) >= ledger.fitness(top[1].address));
        assert!(ledger.fitness(top[1].address) >= ledger.fitness(top[2].address));
        assert_eq!(top[0].address, 4);
    }

    #[test]
    fn test_random_sample_is_distinct() {
        let mut rng = rng();
        let ledger = PopulationLedger::random(&config(8), &mut rng);
        for _ in 0..20 {
            let sample = ledger.random_sample(5, &mut rng);
            let mut addrs: Vec<usize> = sample.iter().map(|s| s.address).collect();
            addrs.sort_unstable();
            addrs.dedup();
            assert_eq!(addrs.len(), 5);
        }
    }

    #[test]
    #[should_panic(expected = "k must lie in 1..pop_size")]
    fn test_sample_size_at_pop_size_is_fatal() {
        let mut rng = rng();
        let ledger = PopulationLedger::random(&config(4), &mut rng);
        let _ = ledger.random_sample(4, &mut rng);
    }

    #[test]
    fn test_similar_to_excludes_self_and_respects_bounds() {
        let a = Seed::from_cells(2, 2, vec![RED, RED, RED, RED]);
        let b = Seed::from_cells(2, 2, vec![RED, RED, RED, 0]);
        let c = Seed::from_cells(2, 2, vec![0, 0, 0, 0]);
        let d = Seed::from_cells(3, 2, vec![RED; 6]);
        let ledger = PopulationLedger::from_seeds(vec![a, b, c, d]);

        let target = ledger.seed(0);
        let close: Vec<usize> = ledger
            .similar_to(target, 0.7, 1.0)
            .iter()
            .map(|s| s.address)
            .collect();
        // b agrees on 3 of 4 cells; c on none; d has other dimensions.
        assert_eq!(close, vec![1]);

        let everyone: Vec<usize> = ledger
            .similar_to(target, 0.0, 1.0)
            .iter()
            .map(|s| s.address)
            .collect();
        assert_eq!(everyone, vec![1, 2, 3]);
    }

    #[test]
    fn test_replace_failure_leaves_matrices_unwritten() {
        struct FailingSim;
        impl Simulator for FailingSim {
            fn run_trial(
                &self,
                _: &Seed,
                _: Placement,
                _: &Seed,
                _: Placement,
                _: Arena,
            ) -> Result<TrialCounts, SimError> {
                Err(SimError::Unavailable("engine offline".into()))
            }
        }

        let mut rng = rng();
        let mut ledger = PopulationLedger::random(&config(4), &mut rng);
        let evaluator = FitnessEvaluator::new(&config(4));
        let before = ledger.clone();

        let child = Seed::from_cells(4, 4, vec![RED; 16]);
        let result = ledger.replace(1, child, &evaluator, &FailingSim, &mut rng);
        assert!(result.is_err());
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(ledger.history(i, j), before.history(i, j));
            }
        }
    }
}
