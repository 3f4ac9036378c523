mod collection;
mod compile;
mod config;
mod engine;
mod error;
mod evaluate;
mod network;
pub mod parse;
pub mod query;
mod trie;
mod types;

pub use collection::{RulesCollection, RulesCollectionBuilder};
pub use config::{
    IdentityNormalizer, InstructionTypes, LowercaseNormalizer, RulesConfig, TermNormalizer,
};
pub use engine::RewriteEngine;
pub use error::RewriteError;
pub use parse::RuleParseError;
pub use query::{
    BoostQuery, ExpandedQuery, Node, NodeId, Occur, Query, QueryParseError, QueryParser, SubQuery,
    Term, TermPositionSequence, TermRef, WhitespaceQueryParser,
};
pub use types::{
    Action, BoostDirection, BooleanExpr, DecorationSink, Decorations, ID_PROPERTY, InputElement,
    Instruction, InstructionQuery, InstructionType, Instructions, LOG_PROPERTY, LiteralId,
    LiteralRegister, MatchRuntimeError, RewriteReport, Rule, RuleErrorKind, RuleInput, literal,
};
