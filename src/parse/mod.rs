//! Rules text: line structure, properties, literal and boolean inputs, and
//! instruction compilation.

mod error;
pub(crate) mod input;
pub(crate) mod instruction;
mod properties;
mod skeleton;

pub use error::RuleParseError;
pub use skeleton::{InstructionSkeleton, RuleSkeleton, parse_skeletons};
