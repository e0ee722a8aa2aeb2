//! Reproduction operators and their fallback chains.
//!
//! Every operator maps a tournament-selected candidate (plus the
//! population) to one replacement seed. When an operator is
//! infeasible it defers to the next operator in its chain rather than
//! failing; the chain always terminates at uniform asexual mutation,
//! which cannot be infeasible. A successful child replaces the least
//! fit member of the population and the ledger rebuilds its pairwise
//! caches before the event completes.

use std::fmt;

use log::debug;
use rand::{Rng, seq::SliceRandom};

use crate::schema::{EvolutionConfig, Seed, join};

use super::EvolveError;
use super::archive::FusionRecord;
use super::fitness::FitnessEvaluator;
use super::ledger::PopulationLedger;
use super::simulator::Simulator;

/// The reproduction operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Bit-flip mutation of the candidate; size unchanged.
    UniformAsexual,
    /// Bit-flip plus probabilistic growth or shrinkage.
    VariableAsexual,
    /// Single-point crossover with a same-species mate, then mutation.
    Sexual,
    /// Split the candidate at its sparsest column, keep one fragment.
    Fission,
    /// Join the candidate with a tournament-selected partner.
    Fusion,
    /// Probability-weighted routing among fission, fusion, and sexual.
    Symbiotic,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::UniformAsexual => "uniform asexual",
            Operator::VariableAsexual => "variable asexual",
            Operator::Sexual => "sexual",
            Operator::Fission => "fission",
            Operator::Fusion => "fusion",
            Operator::Symbiotic => "symbiotic",
        };
        write!(f, "{}", name)
    }
}

/// What one reproduction event did to the population.
#[derive(Debug, Clone)]
pub struct Report {
    /// Running count of children born, this one included.
    pub birth: u64,
    /// Operator that finally produced the child.
    pub operator: Operator,
    /// Operators tried or routed through before that one.
    pub fallbacks: Vec<Operator>,
    /// Address the child now occupies.
    pub child_address: usize,
    /// Candidate fitness at event start.
    pub parent_fitness: f64,
    /// Mate fitness, for the two-parent operators.
    pub mate_fitness: Option<f64>,
    /// Child fitness after its history row was rebuilt.
    pub child_fitness: f64,
    /// Fitness of the seed the child displaced.
    pub replaced_fitness: f64,
    /// Captured parts for a committed fusion.
    pub fusion: Option<FusionRecord>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "birth {} via {}: parent fitness {:.3}",
            self.birth, self.operator, self.parent_fitness
        )?;
        if let Some(mate) = self.mate_fitness {
            write!(f, ", mate fitness {:.3}", mate)?;
        }
        write!(
            f,
            ", child fitness {:.3}, replaced fitness {:.3}",
            self.child_fitness, self.replaced_fitness
        )?;
        if !self.fallbacks.is_empty() {
            let trail: Vec<String> = self.fallbacks.iter().map(|op| op.to_string()).collect();
            write!(f, " (after {})", trail.join(" -> "))?;
        }
        Ok(())
    }
}

/// A produced child, with the context its report needs.
struct Child {
    seed: Seed,
    mate_fitness: Option<f64>,
    /// Rotated parts as joined, captured for the fusion log and for
    /// the immediate-symbiosis gate.
    fusion_parts: Option<(Seed, Seed)>,
}

/// Outcome of one operator attempt.
enum Attempt {
    Child(Child),
    /// Operator infeasible (or purely routing); continue with this one.
    Defer(Operator),
}

/// Applies reproduction operators to a population ledger.
#[derive(Debug)]
pub struct Reproducer {
    config: EvolutionConfig,
    evaluator: FitnessEvaluator,
    births: u64,
}

impl Reproducer {
    pub fn new(config: EvolutionConfig) -> Self {
        let evaluator = FitnessEvaluator::new(&config);
        Self {
            config,
            evaluator,
            births: 0,
        }
    }

    /// Children produced so far.
    pub fn births(&self) -> u64 {
        self.births
    }

    /// Run one reproduction event starting from the given operator.
    ///
    /// Follows the fallback chain until a child is produced, installs
    /// the child over the least fit member, and returns the report.
    /// Only a simulator failure surfaces as an error; infeasible
    /// operators fall through by design.
    pub fn reproduce<S: Simulator + ?Sized, R: Rng>(
        &mut self,
        op: Operator,
        candidate_addr: usize,
        ledger: &mut PopulationLedger,
        sim: &S,
        rng: &mut R,
    ) -> Result<Report, EvolveError> {
        // Snapshot the candidate: a committed-then-rejected fusion may
        // displace the candidate's own slot, and the rest of the chain
        // still reproduces the original seed.
        let candidate = ledger.seed(candidate_addr).clone();
        let parent_fitness = ledger.fitness(candidate_addr);
        let mut trail = Vec::new();
        let mut current = op;

        loop {
            match self.attempt(current, &candidate, ledger, rng) {
                Attempt::Defer(next) => {
                    debug!("{} deferred to {}", current, next);
                    trail.push(current);
                    current = next;
                }
                Attempt::Child(child) => {
                    let replaced = ledger.worst().address;
                    let replaced_fitness = ledger.fitness(replaced);
                    ledger.replace(replaced, child.seed, &self.evaluator, sim, rng)?;
                    self.births += 1;
                    let child_fitness = ledger.fitness(replaced);

                    if current == Operator::Fusion && self.config.immediate_symbiosis {
                        // Symbiosis means the whole out-competes its
                        // parts; an unearned fusion is abandoned.
                        let mate_fitness = child.mate_fitness.unwrap_or(parent_fitness);
                        if child_fitness <= parent_fitness || child_fitness <= mate_fitness {
                            debug!(
                                "fusion fitness {:.3} did not clear both parents, \
                                 deferring to sexual",
                                child_fitness
                            );
                            trail.push(current);
                            current = Operator::Sexual;
                            continue;
                        }
                    }

                    let fusion = child.fusion_parts.map(|(left, right)| FusionRecord {
                        left,
                        right,
                        fused: ledger.seed(replaced).clone(),
                        birth_index: self.births,
                    });

                    return Ok(Report {
                        birth: self.births,
                        operator: current,
                        fallbacks: trail,
                        child_address: replaced,
                        parent_fitness,
                        mate_fitness: child.mate_fitness,
                        child_fitness,
                        replaced_fitness,
                        fusion,
                    });
                }
            }
        }
    }

    /// Try one operator. Never touches the ledger's matrices; an
    /// infeasible draw defers down the chain instead of erroring.
    fn attempt<R: Rng>(
        &self,
        op: Operator,
        candidate: &Seed,
        ledger: &PopulationLedger,
        rng: &mut R,
    ) -> Attempt {
        match op {
            Operator::Symbiotic => {
                let u: f64 = rng.r#gen();
                let next = if u < self.config.prob_fission {
                    Operator::Fission
                } else if u < self.config.prob_fission + self.config.prob_fusion {
                    Operator::Fusion
                } else {
                    Operator::Sexual
                };
                Attempt::Defer(next)
            }

            Operator::UniformAsexual => Attempt::Child(Child {
                seed: candidate.flip_bits(self.config.mutation_rate, rng),
                mate_fitness: None,
                fusion_parts: None,
            }),

            Operator::VariableAsexual => {
                let seed = self.mutate(candidate, rng);
                if seed.area() > self.config.max_seed_area {
                    return Attempt::Defer(Operator::UniformAsexual);
                }
                Attempt::Child(Child {
                    seed,
                    mate_fitness: None,
                    fusion_parts: None,
                })
            }

            Operator::Sexual => {
                let mates = ledger.similar_to(
                    candidate,
                    self.config.min_similarity,
                    self.config.max_similarity,
                );
                if mates.is_empty() {
                    return Attempt::Defer(Operator::VariableAsexual);
                }
                let mate = self.tournament_over(&mates, ledger, rng);
                let mate_fitness = ledger.fitness(mate.address);
                let seed = self.mutate(&crossover(candidate, mate, rng), rng);
                if seed.area() > self.config.max_seed_area {
                    return Attempt::Defer(Operator::UniformAsexual);
                }
                Attempt::Child(Child {
                    seed,
                    mate_fitness: Some(mate_fitness),
                    fusion_parts: None,
                })
            }

            Operator::Fission => {
                let min = self.config.min_s_xspan;
                if candidate.xspan <= min {
                    return Attempt::Defer(Operator::Sexual);
                }
                let split = sparsest_column(candidate);
                let left_width = split;
                let right_width = candidate.xspan - split - 1;
                let keep_left = match (left_width >= min, right_width >= min) {
                    (true, true) => rng.gen_bool(0.5),
                    (true, false) => true,
                    (false, true) => false,
                    (false, false) => return Attempt::Defer(Operator::Sexual),
                };
                let fragment = if keep_left {
                    candidate.slice_columns(0..split)
                } else {
                    candidate.slice_columns(split + 1..candidate.xspan)
                };
                // A dead fragment can never be trialed; treat it like
                // an undersized one.
                if fragment.num_living == 0 {
                    return Attempt::Defer(Operator::Sexual);
                }
                Attempt::Child(Child {
                    seed: fragment,
                    mate_fitness: None,
                    fusion_parts: None,
                })
            }

            Operator::Fusion => {
                // The partner may be the candidate itself.
                let mate = ledger.tournament(self.config.tournament_size, rng);
                let mate_fitness = ledger.fitness(mate.address);
                let left = candidate.random_rotate(rng);
                let right = mate.random_rotate(rng);
                let xspan = left.xspan + right.xspan + 1;
                let yspan = left.yspan.max(right.yspan);
                if xspan * yspan > self.config.max_seed_area {
                    return Attempt::Defer(Operator::Sexual);
                }
                let fused = join(&left, &right);
                Attempt::Child(Child {
                    seed: fused,
                    mate_fitness: Some(mate_fitness),
                    fusion_parts: Some((left, right)),
                })
            }
        }
    }

    /// Variable mutation with the configured knobs.
    fn mutate<R: Rng>(&self, seed: &Seed, rng: &mut R) -> Seed {
        seed.mutate(
            self.config.prob_grow,
            self.config.prob_flip,
            self.config.prob_shrink,
            self.config.seed_density,
            self.config.mutation_rate,
            rng,
        )
    }

    /// Tournament over an arbitrary pool: small pools skip straight to
    /// their best member, larger ones are sampled first.
    fn tournament_over<'a, R: Rng>(
        &self,
        pool: &[&'a Seed],
        ledger: &PopulationLedger,
        rng: &mut R,
    ) -> &'a Seed {
        let sample: Vec<&Seed> = if pool.len() <= self.config.tournament_size {
            pool.to_vec()
        } else {
            let mut shuffled = pool.to_vec();
            shuffled.shuffle(rng);
            shuffled.truncate(self.config.tournament_size);
            shuffled
        };
        let mut best = sample[0];
        for &seed in &sample[1..] {
            if ledger.fitness(seed.address) > ledger.fitness(best.address) {
                best = seed;
            }
        }
        best
    }
}

/// Single-point crossover. One split along a uniformly chosen axis;
/// the parents are swapped with probability one half so neither is
/// pinned to the leading side. Parents must share dimensions (the
/// similarity gate only admits equal-size mates).
pub fn crossover<R: Rng>(a: &Seed, b: &Seed, rng: &mut R) -> Seed {
    assert_eq!(
        (a.xspan, a.yspan),
        (b.xspan, b.yspan),
        "crossover requires equal dimensions"
    );
    let (first, second) = if rng.gen_bool(0.5) { (a, b) } else { (b, a) };
    if rng.gen_bool(0.5) {
        assert!(a.yspan > 1, "cannot split a single-row seed on y");
        let split = rng.gen_range(0..a.yspan - 1);
        Seed::from_fn(a.xspan, a.yspan, |x, y| {
            if y <= split { first.get(x, y) } else { second.get(x, y) }
        })
    } else {
        assert!(a.xspan > 1, "cannot split a single-column seed on x");
        let split = rng.gen_range(0..a.xspan - 1);
        Seed::from_fn(a.xspan, a.yspan, |x, y| {
            if x <= split { first.get(x, y) } else { second.get(x, y) }
        })
    }
}

/// Index of the column with the fewest live cells; first wins ties.
fn sparsest_column(seed: &Seed) -> usize {
    let sums = seed.column_sums();
    let mut best = 0;
    for (x, &sum) in sums.iter().enumerate() {
        if sum < sums[best] {
            best = x;
        }
    }
    best
}
