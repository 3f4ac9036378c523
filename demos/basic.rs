use qrewrite::{ExpandedQuery, Query, RewriteEngine, RulesCollection};

const RULES: &str = r#"
notebook =>
  SYNONYM: laptop
  UP(20): brand:acme
  @_id: "notebook"

cheap =>
  DELETE
  DECORATE(banner): budget-picks
"#;

fn main() {
    let collection = RulesCollection::from_rules_text(RULES).expect("failed to compile rules");

    println!("{collection}");

    let engine = RewriteEngine::new(&collection);
    let mut request = ExpandedQuery::new(Query::from_terms(["cheap", "notebook"]));

    match engine.rewrite(&mut request) {
        Ok(report) => {
            println!("Query:   {}", request.user_query);
            println!("Boosts:  {}", request.boost_up.len());
            println!("Report:  {report}");
        }
        Err(e) => println!("Rewrite failed: {e}"),
    }
}
