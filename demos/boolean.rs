use qrewrite::{RulesCollection, TermPositionSequence};

const RULES: &str = r#"
iphone AND (case OR cover) =>
  UP(10): category:accessories
  @_id: "iphone-accessories"

iphone AND NOT refurbished =>
  FILTER: * condition:new
  @_id: "new-iphones"

apple watch =>
  DECORATE(banner): wearables
"#;

fn main() {
    let collection = RulesCollection::from_rules_text(RULES).expect("failed to compile rules");

    for query in [
        vec!["cover", "for", "iphone"],
        vec!["iphone", "refurbished", "case"],
        vec!["apple", "watch", "iphone"],
    ] {
        let seq = TermPositionSequence::from_values(query.iter().copied());
        println!("{}:", query.join(" "));
        for action in collection.rewrite_actions(&seq) {
            println!("  {action}");
        }
    }
}
