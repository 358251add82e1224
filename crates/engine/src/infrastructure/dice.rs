//! System implementation of the dice port.

use magicbeans_domain::{DiceFormula, DiceRollResult};

use super::ports::DicePort;

/// Rolls with the thread-local RNG.
pub struct SystemDice;

impl DicePort for SystemDice {
    fn roll(&self, formula: &DiceFormula) -> DiceRollResult {
        formula.roll_with(&mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_dice_respects_formula_bounds() {
        let dice = SystemDice;
        let formula = DiceFormula::d100();
        for _ in 0..100 {
            let result = dice.roll(&formula);
            assert!(result.total >= formula.min_roll());
            assert!(result.total <= formula.max_roll());
        }
    }
}
