//! The machine's tape: a double-ended, lazily materialized sequence of symbols with a head
//! index, and the [`Filler`] that decides what new cells contain.

use crate::types::{Direction, FillPolicy, Symbol, TuringMachineError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Synthesizes the content of newly materialized cells according to a [`FillPolicy`].
///
/// The random source is only consulted for [`FillPolicy::Random`], so fixed policies never
/// advance it.
#[derive(Debug, Clone)]
pub struct Filler {
    policy: FillPolicy,
    rng: ChaCha8Rng,
}

impl Filler {
    /// Creates a filler whose random source is seeded from system entropy.
    pub fn new(policy: FillPolicy) -> Self {
        Self {
            policy,
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Creates a filler with a fixed seed, making random fills reproducible.
    pub fn with_seed(policy: FillPolicy, seed: u64) -> Self {
        Self {
            policy,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn policy(&self) -> FillPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: FillPolicy) {
        self.policy = policy;
    }

    /// Returns the symbol for the next new cell.
    pub fn fill(&mut self) -> Symbol {
        match self.policy {
            FillPolicy::Blank => Symbol::Blank,
            FillPolicy::Off => Symbol::Off,
            FillPolicy::On => Symbol::On,
            FillPolicy::Random => self.coin(),
        }
    }

    /// Flips a fair coin between `Off` and `On`, regardless of the policy.
    pub fn coin(&mut self) -> Symbol {
        if self.rng.gen_bool(0.5) {
            Symbol::On
        } else {
            Symbol::Off
        }
    }

    /// Generates `count` random `Off`/`On` symbols.
    pub fn random_symbols(&mut self, count: usize) -> Vec<Symbol> {
        (0..count).map(|_| self.coin()).collect()
    }
}

impl Default for Filler {
    fn default() -> Self {
        Self::new(FillPolicy::default())
    }
}

/// Which edge of the tape, if any, grew during a head move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    None,
    Left,
    Right,
}

/// A conceptually infinite tape. Only visited cells exist.
///
/// `head` is always a valid index once the tape holds at least one cell and a step has run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tape {
    cells: VecDeque<Symbol>,
    head: usize,
}

impl Tape {
    /// Creates an empty tape with the head at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tape holding `symbols` with the head on the first cell.
    pub fn from_symbols(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            cells: symbols.into_iter().collect(),
            head: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// Returns the symbol under the head, if the head is on a materialized cell.
    pub fn read(&self) -> Option<Symbol> {
        self.cells.get(self.head).copied()
    }

    /// Overwrites the cell under the head. Does nothing when the head is off the tape.
    pub fn write(&mut self, symbol: Symbol) {
        if let Some(cell) = self.cells.get_mut(self.head) {
            *cell = symbol;
        }
    }

    pub fn get(&self, index: usize) -> Option<Symbol> {
        self.cells.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.cells.iter().copied()
    }

    /// Returns the materialized cells, left to right.
    pub fn symbols(&self) -> Vec<Symbol> {
        self.iter().collect()
    }

    /// Empties the tape and puts the head back at 0.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.head = 0;
    }

    /// Inserts `symbols` in front of the existing cells, keeping their order.
    ///
    /// The head index is not adjusted; this is meant to be called on a freshly cleared tape.
    pub fn prepend(&mut self, symbols: &[Symbol]) {
        for &symbol in symbols.iter().rev() {
            self.cells.push_front(symbol);
        }
    }

    /// Materializes the first cell of an empty tape so the head has something to read.
    pub fn ensure_cell(&mut self, filler: &mut Filler) {
        if self.cells.is_empty() {
            self.cells.push_back(filler.fill());
            self.head = 0;
        }
    }

    /// Moves the head to `index`.
    pub fn set_head(&mut self, index: usize) -> Result<(), TuringMachineError> {
        if index >= self.cells.len() {
            return Err(TuringMachineError::ValidationError(format!(
                "Head position {} is out of bounds (tape has {} cells)",
                index,
                self.cells.len()
            )));
        }

        self.head = index;
        Ok(())
    }

    /// Moves the head one cell in `direction`, growing the tape when it walks off an edge.
    ///
    /// Walking off the left edge inserts a new cell at the front and leaves the head at 0,
    /// which is now the new cell. Walking off the right edge appends a cell and the head
    /// lands on it.
    pub fn shift(&mut self, direction: Direction, filler: &mut Filler) -> Growth {
        match direction {
            Direction::Left => {
                if self.head == 0 {
                    self.cells.push_front(filler.fill());
                    Growth::Left
                } else {
                    self.head -= 1;
                    Growth::None
                }
            }
            Direction::Right => {
                self.head += 1;
                if self.head == self.cells.len() {
                    self.cells.push_back(filler.fill());
                    Growth::Right
                } else {
                    Growth::None
                }
            }
            Direction::Stay => Growth::None,
        }
    }
}
