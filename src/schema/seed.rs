//! Seed grids: the binary genomes that compete in pairwise trials.

use rand::Rng;
use rand::seq::SliceRandom;
use rand_distr::{Bernoulli, Distribution};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Cell state of the first competitor in a trial.
pub const RED: u8 = 1;
/// Cell state of the second competitor in a trial.
pub const BLUE: u8 = 2;

/// A rectangular grid genome.
///
/// Cells are dead (0) or carry one of two live colors. Seeds in a
/// population are stored red; the second seed of a trial is recolored
/// blue just before placement so the two growths can be told apart.
///
/// Every transform takes `&self` and returns a fresh seed with
/// `num_living` already recomputed, so a seed re-entering a population
/// always carries an accurate live-cell count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    /// Grid width in cells.
    pub xspan: usize,
    /// Grid height in cells.
    pub yspan: usize,
    /// Cell states, x-major.
    cells: Vec<u8>,
    /// Cached count of live (non-zero) cells.
    pub num_living: usize,
    /// Index of this seed in its population array. Meaningless while
    /// the seed is not a population member.
    #[serde(default)]
    pub address: usize,
}

impl Seed {
    /// All-dead seed of the given dimensions.
    pub fn blank(xspan: usize, yspan: usize) -> Self {
        assert!(xspan > 0 && yspan > 0, "seed spans must be non-zero");
        Self {
            xspan,
            yspan,
            cells: vec![0; xspan * yspan],
            num_living: 0,
            address: 0,
        }
    }

    /// Build a seed by evaluating `f` at every cell, x-major order.
    pub fn from_fn<F: FnMut(usize, usize) -> u8>(xspan: usize, yspan: usize, mut f: F) -> Self {
        assert!(xspan > 0 && yspan > 0, "seed spans must be non-zero");
        let mut cells = Vec::with_capacity(xspan * yspan);
        for x in 0..xspan {
            for y in 0..yspan {
                cells.push(f(x, y));
            }
        }
        let num_living = cells.iter().filter(|&&c| c != 0).count();
        Self {
            xspan,
            yspan,
            cells,
            num_living,
            address: 0,
        }
    }

    /// Build a seed from an x-major cell vector.
    pub fn from_cells(xspan: usize, yspan: usize, cells: Vec<u8>) -> Self {
        assert!(xspan > 0 && yspan > 0, "seed spans must be non-zero");
        assert_eq!(cells.len(), xspan * yspan, "cell vector length mismatch");
        let num_living = cells.iter().filter(|&&c| c != 0).count();
        Self {
            xspan,
            yspan,
            cells,
            num_living,
            address: 0,
        }
    }

    /// Random seed with each cell live (red) at the given density.
    pub fn random<R: Rng>(xspan: usize, yspan: usize, density: f64, rng: &mut R) -> Self {
        let coin = Bernoulli::new(density).expect("density must lie in [0, 1]");
        Self::from_fn(xspan, yspan, |_, _| if coin.sample(rng) { RED } else { 0 })
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.xspan && y < self.yspan);
        x * self.yspan + y
    }

    /// Cell state at (x, y).
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[self.index(x, y)]
    }

    /// Grid area in cells.
    #[inline]
    pub fn area(&self) -> usize {
        self.xspan * self.yspan
    }

    /// Count live cells by scanning the grid. `num_living` caches this.
    pub fn count_living(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    /// Flip each cell between dead and live (red) at the given rate.
    pub fn flip_bits<R: Rng>(&self, rate: f64, rng: &mut R) -> Seed {
        let coin = Bernoulli::new(rate).expect("rate must lie in [0, 1]");
        Self::from_fn(self.xspan, self.yspan, |x, y| {
            let cell = self.get(x, y);
            if coin.sample(rng) {
                if cell == 0 { RED } else { 0 }
            } else {
                cell
            }
        })
    }

    /// Quarter turn clockwise.
    pub fn rotate(&self) -> Seed {
        Seed::from_fn(self.yspan, self.xspan, |x, y| {
            self.get(y, self.yspan - 1 - x)
        })
    }

    /// Mirror across the vertical axis.
    pub fn flip_x(&self) -> Seed {
        Seed::from_fn(self.xspan, self.yspan, |x, y| {
            self.get(self.xspan - 1 - x, y)
        })
    }

    /// Random orientation: zero to three quarter turns, then an
    /// optional mirror. Used to strip placement bias from trials.
    pub fn random_rotate<R: Rng>(&self, rng: &mut R) -> Seed {
        let mut seed = self.clone();
        for _ in 0..rng.gen_range(0..4) {
            seed = seed.rotate();
        }
        if rng.gen_bool(0.5) { seed.flip_x() } else { seed }
    }

    /// Same dimensions and density, cell positions permuted.
    pub fn shuffle<R: Rng>(&self, rng: &mut R) -> Seed {
        let mut cells = self.cells.clone();
        cells.shuffle(rng);
        Seed::from_cells(self.xspan, self.yspan, cells)
    }

    /// Repaint every live cell with the given color.
    pub fn recolor(&self, color: u8) -> Seed {
        Seed::from_fn(self.xspan, self.yspan, |x, y| {
            if self.get(x, y) == 0 { 0 } else { color }
        })
    }

    /// Insert one row or column (axis and position uniform) with new
    /// cells live at the given density.
    pub fn grow<R: Rng>(&self, density: f64, rng: &mut R) -> Seed {
        let coin = Bernoulli::new(density).expect("density must lie in [0, 1]");
        if rng.gen_bool(0.5) {
            let at = rng.gen_range(0..=self.xspan);
            Seed::from_fn(self.xspan + 1, self.yspan, |x, y| {
                if x == at {
                    if coin.sample(rng) { RED } else { 0 }
                } else if x < at {
                    self.get(x, y)
                } else {
                    self.get(x - 1, y)
                }
            })
        } else {
            let at = rng.gen_range(0..=self.yspan);
            Seed::from_fn(self.xspan, self.yspan + 1, |x, y| {
                if y == at {
                    if coin.sample(rng) { RED } else { 0 }
                } else if y < at {
                    self.get(x, y)
                } else {
                    self.get(x, y - 1)
                }
            })
        }
    }

    /// Remove one row or column at a uniform position. A 1x1 seed is
    /// returned unchanged; a seed never shrinks below one cell.
    pub fn shrink<R: Rng>(&self, rng: &mut R) -> Seed {
        if self.xspan == 1 && self.yspan == 1 {
            return self.clone();
        }
        let drop_column = if self.xspan > 1 && self.yspan > 1 {
            rng.gen_bool(0.5)
        } else {
            self.xspan > 1
        };
        if drop_column {
            let at = rng.gen_range(0..self.xspan);
            Seed::from_fn(self.xspan - 1, self.yspan, |x, y| {
                if x < at { self.get(x, y) } else { self.get(x + 1, y) }
            })
        } else {
            let at = rng.gen_range(0..self.yspan);
            Seed::from_fn(self.xspan, self.yspan - 1, |x, y| {
                if y < at { self.get(x, y) } else { self.get(x, y + 1) }
            })
        }
    }

    /// Variable mutation: one draw selects growing, bit-flipping, or
    /// shrinking, weighted by the three probabilities; any remainder
    /// leaves the seed unchanged.
    pub fn mutate<R: Rng>(
        &self,
        prob_grow: f64,
        prob_flip: f64,
        prob_shrink: f64,
        seed_density: f64,
        mutation_rate: f64,
        rng: &mut R,
    ) -> Seed {
        let u: f64 = rng.r#gen();
        if u < prob_grow {
            self.grow(seed_density, rng)
        } else if u < prob_grow + prob_flip {
            self.flip_bits(mutation_rate, rng)
        } else if u < prob_grow + prob_flip + prob_shrink {
            self.shrink(rng)
        } else {
            self.clone()
        }
    }

    /// Live-cell count of each column, left to right.
    pub fn column_sums(&self) -> Vec<usize> {
        (0..self.xspan)
            .map(|x| (0..self.yspan).filter(|&y| self.get(x, y) != 0).count())
            .collect()
    }

    /// Copy of the given column range as a standalone seed.
    pub fn slice_columns(&self, range: Range<usize>) -> Seed {
        assert!(
            range.start < range.end && range.end <= self.xspan,
            "column range out of bounds"
        );
        let start = range.start;
        Seed::from_fn(range.end - range.start, self.yspan, |x, y| {
            self.get(start + x, y)
        })
    }
}

/// Join two seeds side by side with a single dead gap column. The
/// result is `left.xspan + right.xspan + 1` wide and as tall as the
/// taller part; shorter parts are padded with dead cells below.
pub fn join(left: &Seed, right: &Seed) -> Seed {
    let xspan = left.xspan + right.xspan + 1;
    let yspan = left.yspan.max(right.yspan);
    Seed::from_fn(xspan, yspan, |x, y| {
        if x < left.xspan {
            if y < left.yspan { left.get(x, y) } else { 0 }
        } else if x == left.xspan {
            0
        } else if y < right.yspan {
            right.get(x - left.xspan - 1, y)
        } else {
            0
        }
    })
}

/// Fraction of cell positions on which two seeds agree, or 0.0 when
/// their dimensions differ. Symmetric; 1.0 on self.
pub fn similarity(a: &Seed, b: &Seed) -> f64 {
    if a.xspan != b.xspan || a.yspan != b.yspan {
        return 0.0;
    }
    let agree = a
        .cells
        .iter()
        .zip(&b.cells)
        .filter(|(ca, cb)| ca == cb)
        .count();
    agree as f64 / a.area() as f64
}

impl fmt::Display for Seed {
    /// Row-per-line sketch: `.` dead, `O` red, `X` blue.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.yspan {
            for x in 0..self.xspan {
                let glyph = match self.get(x, y) {
                    0 => '.',
                    RED => 'O',
                    _ => 'X',
                };
                write!(f, "{}", glyph)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
