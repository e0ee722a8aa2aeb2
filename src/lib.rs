//! Competitive coevolution of binary grid seeds.
//!
//! A fixed-size population of small two-dimensional grid genomes
//! ("seeds") evolves through pairwise competition: two seeds are
//! dropped into opposite halves of a toroidal arena, the rule runs,
//! and whichever seed grew more wins the trial. There is no static
//! objective function; fitness is the averaged outcome of every seed
//! against every other, cached in a pairwise history matrix.
//!
//! Reproduction happens through five competing operators: bit-flip
//! mutation, size-changing mutation, single-point crossover gated by
//! structural similarity, fission of one seed into a fragment, and
//! fusion of two seeds into a symbiotic whole. Infeasible choices fall
//! through a fixed chain of cheaper operators rather than failing.
//!
//! # Architecture
//!
//! - `schema`: configuration and the [`Seed`] entity with its
//!   geometric transforms
//! - `evolve`: the core (fitness evaluator, population ledger,
//!   reproduction dispatcher, archives, generational driver)
//! - `sim`: bundled trial engine implementing the simulator contract
//!
//! # Example
//!
//! ```rust,no_run
//! use symbio::{EvolutionConfig, EvolutionRun};
//! use symbio::sim::ImmigrationSim;
//!
//! let config = EvolutionConfig {
//!     pop_size: 50,
//!     num_generations: 200,
//!     ..Default::default()
//! };
//!
//! let mut run = EvolutionRun::new(config, ImmigrationSim).unwrap();
//! let progress = run.run().unwrap();
//! println!(
//!     "best fitness {:.3}, mean {:.3}",
//!     progress.best_fitness, progress.mean_fitness
//! );
//! ```

pub mod evolve;
pub mod schema;
pub mod sim;

// Re-export commonly used types
pub use evolve::{
    EvolutionRun, EvolveError, Operator, PopulationLedger, Report, Reproducer, RunArchive,
    Simulator,
};
pub use schema::{EvolutionConfig, Seed};
