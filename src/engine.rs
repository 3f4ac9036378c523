use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::collection::RulesCollection;
use crate::error::RewriteError;
use crate::query::{
    BoostQuery, ExpandedQuery, NodeId, Occur, Query, QueryParser, SubQuery, Term,
    TermPositionSequence, TermRef,
};
use crate::types::{
    Action, DecorationSink, Decorations, InputElement, Instruction, InstructionQuery,
    Instructions, MatchRuntimeError, RewriteReport,
};

const WILDCARD_PLACEHOLDER: &str = "$1";

/// Applies a [`RulesCollection`] to requests.
///
/// The engine borrows the collection and holds no per-request state, so one
/// engine can serve many threads.
///
/// # Example
///
/// ```
/// use qrewrite::{ExpandedQuery, Query, RewriteEngine, RulesCollection};
///
/// let collection = RulesCollection::from_rules_text("notebook =>\n  SYNONYM: laptop").unwrap();
/// let engine = RewriteEngine::new(&collection);
///
/// let mut request = ExpandedQuery::new(Query::from_terms(["cheap", "notebook"]));
/// let report = engine.rewrite(&mut request).unwrap();
///
/// assert_eq!(request.user_query.to_string(), "cheap (notebook | laptop)");
/// assert_eq!(report.applied(), ["notebook#0"]);
/// ```
#[derive(Debug, Clone)]
pub struct RewriteEngine<'c> {
    collection: &'c RulesCollection,
    parser: Arc<dyn QueryParser>,
    fail_fast: bool,
    time_budget: Option<Duration>,
}

impl<'c> RewriteEngine<'c> {
    /// An engine building sub-queries with the collection's configured parser.
    #[must_use]
    pub fn new(collection: &'c RulesCollection) -> Self {
        Self {
            collection,
            parser: Arc::clone(&collection.config.query_parser),
            fail_fast: false,
            time_budget: None,
        }
    }

    /// Build `UP`/`DOWN`/`FILTER` sub-queries with `parser` instead.
    #[must_use]
    pub fn with_parser(mut self, parser: impl QueryParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// Return the first request-time error instead of skipping the action.
    #[must_use]
    pub fn fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    /// Stop applying actions once `budget` has elapsed. Checked between
    /// actions; an action is never applied partially.
    #[must_use]
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Rewrite `query` in place, collecting decorations into the report.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Runtime`] only when fail-fast is enabled and a
    /// sub-query cannot be built.
    pub fn rewrite(&self, query: &mut ExpandedQuery) -> Result<RewriteReport, RewriteError> {
        let mut decorations = Decorations::default();
        let mut report = self.rewrite_with_sink(query, &mut decorations)?;
        report.decorations = decorations;
        Ok(report)
    }

    /// Rewrite `query` in place, sending decorations to `sink`.
    ///
    /// # Errors
    ///
    /// See [`rewrite`](Self::rewrite).
    pub fn rewrite_with_sink(
        &self,
        query: &mut ExpandedQuery,
        sink: &mut dyn DecorationSink,
    ) -> Result<RewriteReport, RewriteError> {
        let started = Instant::now();
        let mut report = RewriteReport::default();
        let sequences = TermPositionSequence::from_query(&query.user_query);
        let mut fired = HashSet::new();

        'sequences: for sequence in &sequences {
            let actions =
                crate::evaluate::rewrite_actions(self.collection, sequence, &mut fired);
            for action in &actions {
                if let Some(budget) = self.time_budget {
                    if started.elapsed() >= budget {
                        tracing::warn!(
                            budget_ms = budget.as_millis() as u64,
                            applied = report.applied.len(),
                            "rewrite time budget exhausted"
                        );
                        report.truncated = true;
                        break 'sequences;
                    }
                }
                self.apply_action(action, query, sink, &mut report)?;
            }
        }

        report.duration = started.elapsed();
        Ok(report)
    }

    fn apply_action(
        &self,
        action: &Action<'_>,
        query: &mut ExpandedQuery,
        sink: &mut dyn DecorationSink,
        report: &mut RewriteReport,
    ) -> Result<(), RewriteError> {
        let sub_queries = match self.prepare_sub_queries(action) {
            Ok(sub_queries) => sub_queries,
            Err(err) => {
                if self.fail_fast {
                    return Err(err.into());
                }
                tracing::warn!(rule = %err.rule_id, error = %err, "skipping action");
                report.skipped += 1;
                return Ok(());
            }
        };
        let mut sub_queries = sub_queries.into_iter();

        tracing::trace!(action = %action, "applying action");
        for instructions in &action.instructions_list {
            for instruction in &instructions.instructions {
                match instruction {
                    Instruction::Synonym { terms, weight } => {
                        apply_synonym(action, terms, *weight, &mut query.user_query);
                    }
                    Instruction::Boost {
                        direction, weight, ..
                    } => {
                        if let Some(sub) = sub_queries.next() {
                            query.add_boost_query(
                                *direction,
                                BoostQuery {
                                    query: sub,
                                    boost: *weight,
                                },
                            );
                        }
                    }
                    Instruction::Filter { .. } => {
                        if let Some(sub) = sub_queries.next() {
                            query.add_filter_query(sub);
                        }
                    }
                    Instruction::Delete { terms } => {
                        self.apply_delete(action, terms.as_deref(), &mut query.user_query);
                    }
                    Instruction::Decorate { value, key } => match key {
                        Some(key) => sink.add_named_decoration(key.clone(), value.clone()),
                        None => sink.add_decoration(value.clone()),
                    },
                    Instruction::Replace { .. } => {
                        tracing::debug!(rule = %instructions.id_text(), "REPLACE has no effect");
                    }
                }
            }
            report.applied.push(instructions.log_message());
        }
        Ok(())
    }

    /// Build every sub-query of the action up front so that a failure leaves
    /// the request untouched.
    fn prepare_sub_queries(&self, action: &Action<'_>) -> Result<Vec<SubQuery>, MatchRuntimeError> {
        let mut out = Vec::new();
        for instructions in &action.instructions_list {
            for instruction in &instructions.instructions {
                let query = match instruction {
                    Instruction::Boost { query, .. } | Instruction::Filter { query } => query,
                    _ => continue,
                };
                out.push(self.sub_query(instructions, instruction, query)?);
            }
        }
        Ok(out)
    }

    fn sub_query(
        &self,
        instructions: &Instructions,
        instruction: &Instruction,
        query: &InstructionQuery,
    ) -> Result<SubQuery, MatchRuntimeError> {
        match query {
            InstructionQuery::Raw(text) => Ok(SubQuery::Raw(text.clone())),
            InstructionQuery::Parsed(text) => {
                let mut parsed = self.parser.parse(text).map_err(|e| MatchRuntimeError {
                    rule_id: instructions.id_text(),
                    message: format!(
                        "cannot build {} query '{text}': {e}",
                        instruction.instruction_type()
                    ),
                })?;
                if matches!(instruction, Instruction::Filter { .. }) {
                    parsed.require_all_clauses();
                }
                parsed.mark_generated();
                Ok(SubQuery::Query(parsed))
            }
        }
    }

    fn apply_delete(&self, action: &Action<'_>, terms: Option<&[InputElement]>, query: &mut Query) {
        for matched in &action.matched_terms {
            let delete = match terms {
                None => true,
                Some(terms) => {
                    let value = self.collection.config.normalize(&matched.value);
                    terms
                        .iter()
                        .any(|t| t.accepts_value(&value) && t.accepts_fields(&matched.fields))
                }
            };
            if delete {
                query.remove_term(matched.id);
            }
        }
    }
}

fn apply_synonym(action: &Action<'_>, terms: &[InputElement], weight: f32, query: &mut Query) {
    let values: Vec<(String, &InputElement)> = terms
        .iter()
        .map(|t| (substitute_suffix(&t.value, action.wildcard_suffix.as_deref()), t))
        .collect();

    let mut groups: HashSet<NodeId> = HashSet::new();
    for matched in &action.matched_terms {
        let Some(group) = live_group(query, matched) else {
            continue;
        };
        if !groups.insert(group) {
            continue;
        }
        if let [(value, element)] = values.as_slice() {
            query.add_term(group, synonym_term(value, element, weight));
        } else {
            let clause = query.add_boolean(group, Occur::Should, true);
            for (value, element) in &values {
                let dmq = query.add_dismax(clause, Occur::Must, true);
                query.add_term(dmq, synonym_term(value, element, weight));
            }
        }
    }
}

fn live_group(query: &Query, matched: &TermRef) -> Option<NodeId> {
    query.term(matched.id)?;
    query.parent(matched.id)
}

fn synonym_term(value: &str, element: &InputElement, weight: f32) -> Term {
    Term::generated(value)
        .in_fields(element.fields.iter().cloned())
        .with_boost(weight)
}

fn substitute_suffix(value: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) => value.replace(WILDCARD_PLACEHOLDER, suffix),
        None => value.to_owned(),
    }
}
