//! Value objects: validated, immutable domain values.

mod dice;
mod visual;

pub use dice::{DiceFormula, DiceParseError, DiceRollResult};
pub use visual::{LightProfile, TintColor, TintParseError, VisualState};
