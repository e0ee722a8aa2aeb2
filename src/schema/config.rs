//! Run configuration for the evolutionary arena.

use serde::{Deserialize, Serialize};

/// Top-level configuration for an evolutionary run.
///
/// Every knob has a serde default so partial JSON configs load; the
/// core treats a validated config as read-only for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Number of seeds in the population. Fixed for the whole run.
    #[serde(default = "default_pop_size")]
    pub pop_size: usize,
    /// Initial seed width.
    #[serde(default = "default_s_xspan")]
    pub s_xspan: usize,
    /// Initial seed height.
    #[serde(default = "default_s_yspan")]
    pub s_yspan: usize,
    /// Live-cell density of random and grown seed material.
    #[serde(default = "default_seed_density")]
    pub seed_density: f64,
    /// Number of top seeds captured per elite snapshot.
    #[serde(default = "default_elite_size")]
    pub elite_size: usize,
    /// Sample size for tournament selection.
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
    /// Per-cell flip probability for bit-flip mutation.
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Probability that a variable mutation grows the seed.
    #[serde(default = "default_prob_grow")]
    pub prob_grow: f64,
    /// Probability that a variable mutation flips bits.
    #[serde(default = "default_prob_flip")]
    pub prob_flip: f64,
    /// Probability that a variable mutation shrinks the seed.
    #[serde(default = "default_prob_shrink")]
    pub prob_shrink: f64,
    /// Minimum width of a fission fragment.
    #[serde(default = "default_min_s_xspan")]
    pub min_s_xspan: usize,
    /// Maximum seed area; oversized children divert to a smaller
    /// operator instead of entering the population.
    #[serde(default = "default_max_seed_area")]
    pub max_seed_area: usize,
    /// Lower similarity bound for the crossover mate pool.
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
    /// Upper similarity bound for the crossover mate pool.
    #[serde(default = "default_max_similarity")]
    pub max_similarity: f64,
    /// Probability that the symbiotic dispatcher picks fission.
    #[serde(default = "default_prob_fission")]
    pub prob_fission: f64,
    /// Probability that the symbiotic dispatcher picks fusion.
    #[serde(default = "default_prob_fusion")]
    pub prob_fusion: f64,
    /// Arena width as a multiple of the largest seed span.
    #[serde(default = "default_width_factor")]
    pub width_factor: f64,
    /// Arena height as a multiple of the largest seed span.
    #[serde(default = "default_height_factor")]
    pub height_factor: f64,
    /// Trial length as a multiple of arena width plus height.
    #[serde(default = "default_time_factor")]
    pub time_factor: f64,
    /// Trials averaged into one pairwise score.
    #[serde(default = "default_num_trials")]
    pub num_trials: usize,
    /// Reproduction events in a full run.
    #[serde(default = "default_num_generations")]
    pub num_generations: usize,
    /// Generations between elite snapshots.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: usize,
    /// Require a fused seed to out-score both of its parts, else the
    /// fusion is abandoned for sexual reproduction.
    #[serde(default)]
    pub immediate_symbiosis: bool,
    /// Random seed for reproducibility. None draws from entropy.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            pop_size: default_pop_size(),
            s_xspan: default_s_xspan(),
            s_yspan: default_s_yspan(),
            seed_density: default_seed_density(),
            elite_size: default_elite_size(),
            tournament_size: default_tournament_size(),
            mutation_rate: default_mutation_rate(),
            prob_grow: default_prob_grow(),
            prob_flip: default_prob_flip(),
            prob_shrink: default_prob_shrink(),
            min_s_xspan: default_min_s_xspan(),
            max_seed_area: default_max_seed_area(),
            min_similarity: default_min_similarity(),
            max_similarity: default_max_similarity(),
            prob_fission: default_prob_fission(),
            prob_fusion: default_prob_fusion(),
            width_factor: default_width_factor(),
            height_factor: default_height_factor(),
            time_factor: default_time_factor(),
            num_trials: default_num_trials(),
            num_generations: default_num_generations(),
            snapshot_interval: default_snapshot_interval(),
            immediate_symbiosis: false,
            random_seed: None,
        }
    }
}

fn default_pop_size() -> usize {
    100
}
fn default_s_xspan() -> usize {
    5
}
fn default_s_yspan() -> usize {
    5
}
fn default_seed_density() -> f64 {
    0.375
}
fn default_elite_size() -> usize {
    10
}
fn default_tournament_size() -> usize {
    2
}
fn default_mutation_rate() -> f64 {
    0.01
}
fn default_prob_grow() -> f64 {
    0.2
}
fn default_prob_flip() -> f64 {
    0.6
}
fn default_prob_shrink() -> f64 {
    0.2
}
fn default_min_s_xspan() -> usize {
    2
}
fn default_max_seed_area() -> usize {
    170
}
fn default_min_similarity() -> f64 {
    0.8
}
fn default_max_similarity() -> f64 {
    0.99
}
fn default_prob_fission() -> f64 {
    0.1
}
fn default_prob_fusion() -> f64 {
    0.1
}
fn default_width_factor() -> f64 {
    6.0
}
fn default_height_factor() -> f64 {
    3.0
}
fn default_time_factor() -> f64 {
    6.0
}
fn default_num_trials() -> usize {
    2
}
fn default_num_generations() -> usize {
    100
}
fn default_snapshot_interval() -> usize {
    10
}

impl EvolutionConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.s_xspan == 0 || self.s_yspan == 0 {
            return Err(ConfigError::InvalidSpans);
        }
        if self.pop_size < 2 {
            return Err(ConfigError::PopulationTooSmall);
        }
        if self.elite_size == 0 || self.elite_size >= self.pop_size {
            return Err(ConfigError::InvalidEliteSize);
        }
        if self.tournament_size == 0 || self.tournament_size >= self.pop_size {
            return Err(ConfigError::InvalidTournamentSize);
        }
        if !(0.0..=1.0).contains(&self.seed_density) || self.seed_density == 0.0 {
            return Err(ConfigError::InvalidSeedDensity);
        }
        for (name, value) in [
            ("mutation_rate", self.mutation_rate),
            ("prob_grow", self.prob_grow),
            ("prob_flip", self.prob_flip),
            ("prob_shrink", self.prob_shrink),
            ("min_similarity", self.min_similarity),
            ("max_similarity", self.max_similarity),
            ("prob_fission", self.prob_fission),
            ("prob_fusion", self.prob_fusion),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::UnitInterval { name });
            }
        }
        if self.prob_grow + self.prob_flip + self.prob_shrink > 1.0 {
            return Err(ConfigError::MutationKindSum);
        }
        if self.prob_fission + self.prob_fusion > 1.0 {
            return Err(ConfigError::OperatorProbSum);
        }
        if self.min_similarity > self.max_similarity {
            return Err(ConfigError::SimilarityBoundsReversed);
        }
        // Two seeds side by side need more than twice the widest span.
        if self.width_factor <= 2.0 {
            return Err(ConfigError::InvalidWidthFactor);
        }
        if self.height_factor <= 1.0 {
            return Err(ConfigError::InvalidHeightFactor);
        }
        if self.time_factor <= 1.0 {
            return Err(ConfigError::InvalidTimeFactor);
        }
        if self.min_s_xspan == 0 {
            return Err(ConfigError::InvalidMinXspan);
        }
        if self.max_seed_area < self.s_xspan * self.s_yspan {
            return Err(ConfigError::AreaBelowInitial {
                max_seed_area: self.max_seed_area,
                initial: self.s_xspan * self.s_yspan,
            });
        }
        if self.num_trials == 0 {
            return Err(ConfigError::InvalidTrials);
        }
        if self.snapshot_interval == 0 {
            return Err(ConfigError::InvalidSnapshotInterval);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("initial seed spans must be non-zero")]
    InvalidSpans,
    #[error("population size must be at least 2")]
    PopulationTooSmall,
    #[error("elite size must lie in 1..pop_size")]
    InvalidEliteSize,
    #[error("tournament size must lie in 1..pop_size")]
    InvalidTournamentSize,
    #[error("seed density must lie in (0, 1]")]
    InvalidSeedDensity,
    #[error("{name} must lie in [0, 1]")]
    UnitInterval { name: &'static str },
    #[error("grow, flip, and shrink probabilities must sum to at most 1")]
    MutationKindSum,
    #[error("fission and fusion probabilities must sum to at most 1")]
    OperatorProbSum,
    #[error("min_similarity exceeds max_similarity")]
    SimilarityBoundsReversed,
    #[error("width factor must exceed 2")]
    InvalidWidthFactor,
    #[error("height factor must exceed 1")]
    InvalidHeightFactor,
    #[error("time factor must exceed 1")]
    InvalidTimeFactor,
    #[error("minimum fission width must be non-zero")]
    InvalidMinXspan,
    #[error("maximum seed area {max_seed_area} is below the initial seed area {initial}")]
    AreaBelowInitial { max_seed_area: usize, initial: usize },
    #[error("trial count must be non-zero")]
    InvalidTrials,
    #[error("snapshot interval must be non-zero")]
    InvalidSnapshotInterval,
}
