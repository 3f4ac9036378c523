//! The mutable query representation rules are applied to.

mod model;
mod parser;
mod sequence;

pub use model::{Node, NodeId, Occur, Query, Term};
pub use parser::{QueryParseError, QueryParser, WhitespaceQueryParser};
pub use sequence::{TermPositionSequence, TermRef};

use crate::types::BoostDirection;

/// A query attached to the request by a boost or filter instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum SubQuery {
    /// Backend-specific query text passed through as is.
    Raw(String),
    Query(Query),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoostQuery {
    pub query: SubQuery,
    pub boost: f32,
}

/// The user query plus the request-level boost and filter collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpandedQuery {
    pub user_query: Query,
    pub boost_up: Vec<BoostQuery>,
    pub boost_down: Vec<BoostQuery>,
    pub filters: Vec<SubQuery>,
}

impl ExpandedQuery {
    #[must_use]
    pub fn new(user_query: Query) -> Self {
        Self {
            user_query,
            ..Self::default()
        }
    }

    pub fn add_boost_query(&mut self, direction: BoostDirection, query: BoostQuery) {
        match direction {
            BoostDirection::Up => self.boost_up.push(query),
            BoostDirection::Down => self.boost_down.push(query),
        }
    }

    pub fn add_filter_query(&mut self, query: SubQuery) {
        self.filters.push(query);
    }
}
