use std::time::Duration;

use qrewrite::{ExpandedQuery, Query, QueryParseError, QueryParser, RewriteEngine, RulesCollection};

/// Rejects every sub-query, to show how request-time failures are reported.
#[derive(Debug)]
struct OfflineParser;

impl QueryParser for OfflineParser {
    fn parse(&self, text: &str) -> Result<Query, QueryParseError> {
        Err(QueryParseError::InvalidToken {
            token: text.to_owned(),
            reason: "parser offline",
        })
    }
}

const RULES: &str = r#"
shoes =>
  SYNONYM: sneakers
  @_log: "shoe synonyms"

running =>
  UP(5): category:sport
  @_id: "running-boost"

sale =>
  DECORATE: /landing/sale
  DECORATE(banner): spring-sale
"#;

fn main() {
    let collection = RulesCollection::from_rules_text(RULES).expect("failed to compile rules");
    let engine = RewriteEngine::new(&collection)
        .with_parser(OfflineParser)
        .with_time_budget(Duration::from_millis(5));

    let mut request = ExpandedQuery::new(Query::from_terms(["running", "shoes", "sale"]));
    let report = engine.rewrite(&mut request).expect("rewrite failed");

    println!("{report}");
    println!();
    println!("Rewritten query: {}", request.user_query);
    println!("Applied rules:   {:?}", report.applied());
    println!("Skipped actions: {}", report.skipped());
    println!(
        "Decorations:     {}",
        serde_json::to_string(report.decorations()).unwrap_or_default()
    );
    println!("Duration: {:?}", report.duration());
}
