//! Population, fitness, and reproduction core.
//!
//! # Overview
//!
//! The evolutionary core is built from:
//!
//! - **Simulator contract** (`simulator`): the trait a cellular
//!   automaton engine implements to run one competitive trial
//! - **Fitness Evaluator** (`fitness`): averaged pairwise trials with
//!   randomized orientation and placement
//! - **Population Ledger** (`ledger`): the seed array plus pairwise
//!   history and similarity caches
//! - **Reproduction Dispatcher** (`reproduce`): five operators with
//!   cascading fallback chains
//! - **Archive** (`archive`): elite snapshots and the fusion log
//! - **Driver** (`driver`): tournament selection looped over events
//!
//! # Example
//!
//! ```rust,no_run
//! use symbio::evolve::EvolutionRun;
//! use symbio::schema::EvolutionConfig;
//! use symbio::sim::ImmigrationSim;
//!
//! let config = EvolutionConfig::default();
//! let mut run = EvolutionRun::new(config, ImmigrationSim).unwrap();
//! let progress = run
//!     .run_with_callback(|progress, report| {
//!         println!("generation {}: {}", progress.generation, report);
//!     })
//!     .unwrap();
//! println!("best fitness {:.3}", progress.best_fitness);
//! ```
//!
//! # Error taxonomy
//!
//! Precondition violations (an empty seed offered for trial, a sample
//! size at or above the population size) panic: they signal a defect
//! upstream, not a run-time condition. Infeasible operator draws are
//! not errors at all; they fall through their chains. Only simulator
//! and archive failures surface as [`EvolveError`].

mod archive;
mod driver;
mod fitness;
mod ledger;
mod reproduce;
mod simulator;

pub use archive::{FusionRecord, RunArchive, load_elite, load_fusions};
pub use driver::{EvolutionRun, Progress};
pub use fitness::FitnessEvaluator;
pub use ledger::PopulationLedger;
pub use reproduce::{Operator, Report, Reproducer, crossover};
pub use simulator::{Arena, Placement, SimError, Simulator, TrialCounts};

/// Failures surfaced from a reproduction event or a run.
#[derive(Debug, thiserror::Error)]
pub enum EvolveError {
    /// The simulator collaborator failed. No automatic retry: the
    /// caller decides whether to rerun the whole event.
    #[error(transparent)]
    Sim(#[from] SimError),
    /// An archive write failed.
    #[error("archive write failed: {0}")]
    Archive(#[from] std::io::Error),
}
