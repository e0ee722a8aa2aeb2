//! Contract between the evolutionary core and a cellular-automaton
//! engine.
//!
//! The core prepares both competitors (rotation, coloring, placement)
//! and derives the arena geometry; the engine is responsible only for
//! stepping the rule and counting what survived.

use crate::schema::Seed;

/// Grid geometry and duration of one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arena {
    /// Toroidal grid width in cells.
    pub width: usize,
    /// Toroidal grid height in cells.
    pub height: usize,
    /// Rule applications to run before counting.
    pub steps: usize,
}

/// Top-left corner of a seed on the arena grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: usize,
    pub y: usize,
}

/// Post-run live-cell totals per color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrialCounts {
    /// Live cells of the first competitor's color.
    pub red: usize,
    /// Live cells of the second competitor's color.
    pub blue: usize,
}

/// Failures of the simulator collaborator. These surface unchanged
/// from a reproduction event; the caller decides whether to retry.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("seed placed at ({x}, {y}) spans outside the {width}x{height} arena")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[error("arena has zero area")]
    EmptyArena,
    #[error("simulator backend unavailable: {0}")]
    Unavailable(String),
}

/// A cellular-automaton engine able to run one competitive trial.
///
/// Implementations must be callable from worker threads: a ledger
/// replacement fans its pairwise trials out in parallel.
pub trait Simulator: Sync {
    /// Step the rule for `arena.steps` applications with both seeds
    /// stamped onto an empty toroidal grid, then report how many live
    /// cells of each color remain.
    fn run_trial(
        &self,
        left: &Seed,
        left_at: Placement,
        right: &Seed,
        right_at: Placement,
        arena: Arena,
    ) -> Result<TrialCounts, SimError>;
}

impl<S: Simulator + ?Sized> Simulator for &S {
    fn run_trial(
        &self,
        left: &Seed,
        left_at: Placement,
        right: &Seed,
        right_at: Placement,
        arena: Arena,
    ) -> Result<TrialCounts, SimError> {
        (**self).run_trial(left, left_at, right, right_at, arena)
    }
}
