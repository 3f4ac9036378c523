use std::sync::Arc;
use std::thread;

use qrewrite::{ExpandedQuery, Query, RewriteEngine, RulesCollection};

const RULES: &str = r#"
notebook =>
  SYNONYM: laptop
  @_id: "notebook"

cheap AND NOT refurbished =>
  UP(10): discount
  @_id: "cheap"

sale =>
  DECORATE(banner): sale
  @_id: "sale"
"#;

fn rewrite(collection: &RulesCollection, terms: &[&str]) -> (String, Vec<String>) {
    let engine = RewriteEngine::new(collection);
    let mut request = ExpandedQuery::new(Query::from_terms(terms.iter().copied()));
    let report = engine.rewrite(&mut request).unwrap();
    (request.user_query.to_string(), report.applied().to_vec())
}

#[test]
fn rewrite_across_threads() {
    let collection = Arc::new(RulesCollection::from_rules_text(RULES).unwrap());

    let requests: Vec<Vec<&'static str>> = vec![
        vec!["notebook"],
        vec!["cheap", "notebook"],
        vec!["cheap", "refurbished", "notebook"],
        vec!["sale"],
        vec!["garden"],
    ];

    let handles: Vec<_> = requests
        .iter()
        .cloned()
        .map(|terms| {
            let c = Arc::clone(&collection);
            thread::spawn(move || rewrite(&c, &terms))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results[0], ("(notebook | laptop)".to_owned(), vec!["notebook".to_owned()]));
    assert_eq!(results[1].1, vec!["cheap", "notebook"]);
    assert_eq!(results[2].1, vec!["notebook"]);
    assert_eq!(results[3].1, vec!["sale"]);
    assert!(results[4].1.is_empty());
}

#[test]
fn shared_engine_is_consistent_under_load() {
    let collection = RulesCollection::from_rules_text(RULES).unwrap();
    let engine = RewriteEngine::new(&collection);
    let expected = {
        let mut request = ExpandedQuery::new(Query::from_terms(["cheap", "notebook", "sale"]));
        engine.rewrite(&mut request).unwrap();
        request
    };

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..200 {
                    let mut request =
                        ExpandedQuery::new(Query::from_terms(["cheap", "notebook", "sale"]));
                    engine.rewrite(&mut request).unwrap();
                    assert_eq!(request, expected);
                }
            });
        }
    });
}
