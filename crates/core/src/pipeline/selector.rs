use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::Correction;

/// Random source consulted by the selector.
pub trait Dice: Send {
    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Uniform integer in `[0, upper)`.
    fn below(&mut self, upper: u32) -> u32;
}

/// `Dice` over any `rand` generator.
#[derive(Debug)]
pub struct RngDice<R> {
    rng: R,
}

impl RngDice<StdRng> {
    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl<R: Rng + Send> Dice for RngDice<R> {
    fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn below(&mut self, upper: u32) -> u32 {
        self.rng.random_range(0..upper)
    }
}

/// Replays fixed values; falls back to 0 when a queue runs dry.
#[derive(Debug, Default)]
pub struct ScriptedDice {
    units: VecDeque<f64>,
    draws: VecDeque<u32>,
}

impl ScriptedDice {
    pub fn new(
        units: impl IntoIterator<Item = f64>,
        draws: impl IntoIterator<Item = u32>,
    ) -> Self {
        Self {
            units: units.into_iter().collect(),
            draws: draws.into_iter().collect(),
        }
    }
}

impl Dice for ScriptedDice {
    fn unit(&mut self) -> f64 {
        self.units.pop_front().unwrap_or(0.0)
    }

    fn below(&mut self, upper: u32) -> u32 {
        self.draws.pop_front().unwrap_or(0).min(upper.saturating_sub(1))
    }
}

/// Map a troll draw onto the vocabulary via cumulative weight bounds
/// (`≤99 your`, `≤198 you're`, `≤199 yore`, `≤200 yer`).
pub fn bucket(draw: u32) -> Correction {
    let mut bound = 0;
    for word in Correction::ALL {
        bound += word.weight();
        if draw <= bound {
            return word;
        }
    }
    Correction::Yer
}

/// Turns an inferred correction into the word actually sent back.
pub struct CorrectionSelector {
    confirm_probability: f64,
    dice: Box<dyn Dice>,
}

impl CorrectionSelector {
    pub fn new(confirm_probability: f64, dice: Box<dyn Dice>) -> Self {
        Self {
            confirm_probability: confirm_probability.clamp(0.0, 1.0),
            dice,
        }
    }

    /// Seeded when `seed` is set, OS entropy otherwise.
    pub fn from_seed(confirm_probability: f64, seed: Option<u64>) -> Self {
        let dice: Box<dyn Dice> = match seed {
            Some(seed) => Box::new(RngDice::seeded(seed)),
            None => Box::new(RngDice::from_os_rng()),
        };
        Self::new(confirm_probability, dice)
    }

    /// Confirm a known correction most of the time; otherwise troll.
    /// Always yields a concrete word.
    pub fn select(&mut self, inferred: Option<Correction>) -> Correction {
        if let Some(word) = inferred
            && self.dice.unit() < self.confirm_probability
        {
            return word;
        }
        bucket(self.dice.below(Correction::draw_space()))
    }
}

impl std::fmt::Debug for CorrectionSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrectionSelector")
            .field("confirm_probability", &self.confirm_probability)
            .finish_non_exhaustive()
    }
}
