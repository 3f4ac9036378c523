mod action;
mod element;
mod error;
mod input;
mod instruction;
mod literal_register;
mod report;
mod rule;

pub use action::Action;
pub use element::InputElement;
pub use error::{MatchRuntimeError, RuleErrorKind};
pub use input::{BooleanExpr, RuleInput, literal};
pub use instruction::{
    BoostDirection, ID_PROPERTY, Instruction, InstructionQuery, InstructionType, Instructions,
    LOG_PROPERTY,
};
pub use literal_register::{LiteralId, LiteralRegister};
pub use report::{DecorationSink, Decorations, RewriteReport};
pub use rule::Rule;
pub(crate) use rule::TrieTarget;
