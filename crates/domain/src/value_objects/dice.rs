//! Dice formula value objects and parsing.
//!
//! Supports formulas like "1d100", "2d8+2", "3d6-1". The activation roll
//! (1d100) and every heal/damage delta in the effect table are expressed
//! as formulas so the engine can roll them through an injectable RNG.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error when parsing a dice formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    /// The formula string is empty
    #[error("Empty dice formula")]
    Empty,
    /// Invalid format - expected XdY or XdY+Z
    #[error("Invalid dice format: {0}")]
    InvalidFormat(String),
    /// Dice count must be at least 1
    #[error("Dice count must be at least 1")]
    InvalidDiceCount,
    /// Die size must be at least 2
    #[error("Die size must be at least 2")]
    InvalidDieSize,
}

/// A parsed dice formula like "2d8+2"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceFormula {
    /// Number of dice to roll (X in XdY)
    pub dice_count: u8,
    /// Size of each die (Y in XdY)
    pub die_size: u8,
    /// Modifier added after rolling (+Z or -Z)
    pub modifier: i32,
}

impl DiceFormula {
    /// Create a new dice formula
    pub fn new(dice_count: u8, die_size: u8, modifier: i32) -> Result<Self, DiceParseError> {
        if dice_count == 0 {
            return Err(DiceParseError::InvalidDiceCount);
        }
        if die_size < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }
        Ok(Self {
            dice_count,
            die_size,
            modifier,
        })
    }

    /// The activation die: one uniformly distributed roll in 1..=100.
    pub fn d100() -> Self {
        Self {
            dice_count: 1,
            die_size: 100,
            modifier: 0,
        }
    }

    /// Parse a dice formula string like "2d8+2", "3d6-1", "d100".
    ///
    /// Parsed manually to avoid a regex dependency in the domain layer.
    pub fn parse(input: &str) -> Result<Self, DiceParseError> {
        let input = input.trim().to_lowercase();
        if input.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let d_pos = input.find('d').ok_or_else(|| {
            DiceParseError::InvalidFormat(format!("Missing 'd' separator in '{}'", input))
        })?;

        // "d100" is shorthand for "1d100"
        let dice_count_str = &input[..d_pos];
        let dice_count: u8 = if dice_count_str.is_empty() {
            1
        } else {
            dice_count_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid dice count: '{}'", dice_count_str))
            })?
        };
        if dice_count == 0 {
            return Err(DiceParseError::InvalidDiceCount);
        }

        let after_d = &input[d_pos + 1..];
        let (die_size_str, modifier) = if let Some(plus_pos) = after_d.find('+') {
            let mod_str = &after_d[plus_pos + 1..];
            let modifier: i32 = mod_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid modifier: '+{}'", mod_str))
            })?;
            (&after_d[..plus_pos], modifier)
        } else if let Some(minus_pos) = after_d.find('-') {
            if minus_pos == 0 {
                return Err(DiceParseError::InvalidFormat(format!(
                    "Invalid die size: '{}'",
                    after_d
                )));
            }
            let mod_str = &after_d[minus_pos + 1..];
            let modifier: i32 = mod_str.parse::<i32>().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid modifier: '-{}'", mod_str))
            })?;
            (&after_d[..minus_pos], -modifier)
        } else {
            (after_d, 0)
        };

        let die_size: u8 = die_size_str.parse().map_err(|_| {
            DiceParseError::InvalidFormat(format!("Invalid die size: '{}'", die_size_str))
        })?;
        if die_size < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }

        Ok(Self {
            dice_count,
            die_size,
            modifier,
        })
    }

    /// Roll the dice with the given RNG and return the result.
    ///
    /// The RNG is injected so the engine's dice port (and tests) control
    /// the randomness source.
    pub fn roll_with<R: Rng + ?Sized>(&self, rng: &mut R) -> DiceRollResult {
        let mut individual_rolls = Vec::with_capacity(self.dice_count as usize);
        for _ in 0..self.dice_count {
            individual_rolls.push(rng.gen_range(1..=self.die_size as i32));
        }

        let dice_total: i32 = individual_rolls.iter().sum();
        DiceRollResult {
            formula: self.clone(),
            individual_rolls,
            dice_total,
            total: dice_total + self.modifier,
        }
    }

    /// Get the minimum possible roll
    pub fn min_roll(&self) -> i32 {
        self.dice_count as i32 + self.modifier
    }

    /// Get the maximum possible roll
    pub fn max_roll(&self) -> i32 {
        (self.dice_count as i32 * self.die_size as i32) + self.modifier
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifier == 0 {
            write!(f, "{}d{}", self.dice_count, self.die_size)
        } else if self.modifier > 0 {
            write!(f, "{}d{}+{}", self.dice_count, self.die_size, self.modifier)
        } else {
            write!(f, "{}d{}{}", self.dice_count, self.die_size, self.modifier)
        }
    }
}

/// Result of rolling dice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceRollResult {
    /// The formula that was rolled
    pub formula: DiceFormula,
    /// Individual die results
    pub individual_rolls: Vec<i32>,
    /// Sum of dice before modifier
    pub dice_total: i32,
    /// Final total (dice_total + modifier)
    pub total: i32,
}

impl DiceRollResult {
    /// Format as a breakdown string for chat output,
    /// e.g. "1d100(42) = 42" or "2d8[3, 7] + 2 = 12".
    pub fn breakdown(&self) -> String {
        let rolls = if self.individual_rolls.len() == 1 {
            format!("({})", self.individual_rolls[0])
        } else {
            let parts: Vec<String> = self.individual_rolls.iter().map(|r| r.to_string()).collect();
            format!("[{}]", parts.join(", "))
        };
        let base = format!("{}d{}{}", self.formula.dice_count, self.formula.die_size, rolls);
        match self.formula.modifier {
            0 => format!("{} = {}", base, self.total),
            m if m > 0 => format!("{} + {} = {}", base, m, self.total),
            m => format!("{} - {} = {}", base, -m, self.total),
        }
    }
}
