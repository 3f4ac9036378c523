use std::sync::Arc;
use std::thread;

use qrewrite::{ExpandedQuery, Query, RewriteEngine, RulesCollection};

fn main() {
    let collection = Arc::new(
        RulesCollection::from_rules_text("tv =>\n  SYNONYM: television\nlaptop* =>\n  SYNONYM: notebook$1")
            .expect("failed to compile rules"),
    );

    let queries = ["tv stand", "laptops", "cheap tv", "garden hose"];
    let handles: Vec<_> = queries
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let rc = Arc::clone(&collection);
            thread::spawn(move || {
                let engine = RewriteEngine::new(&rc);
                let mut request = ExpandedQuery::new(Query::from_terms(text.split_whitespace()));
                let report = engine.rewrite(&mut request);
                println!("Thread {i}: {} -> {} ({report:?})", text, request.user_query);
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
