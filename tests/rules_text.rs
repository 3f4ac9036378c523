use qrewrite::{
    Instruction, InstructionType, InstructionTypes, RewriteError, RuleErrorKind, RuleInput,
    RuleParseError, RulesCollection, RulesConfig, TermPositionSequence,
};

fn parse_err(text: &str) -> RuleParseError {
    match RulesCollection::from_rules_text(text) {
        Err(RewriteError::Parse(e)) => e,
        Err(other) => panic!("expected a parse error, got {other:?}"),
        Ok(_) => panic!("expected '{text}' to fail"),
    }
}

const CATALOG: &str = r#"
# electronics
notebook =>
  SYNONYM: laptop
  SYNONYM(0.5): {title,category}:portable computer
  UP(50): brand:acme
  @_id: "notebook"

iphone* =>
  SYNONYM: apple phone$1
  DECORATE(banner): apple-week

cheap AND NOT refurbished =>
  FILTER: * price:[0 TO 100]
  DOWN(10): premium
  @{
    _id: "cheap-new",
    _log: 'cheap, not refurbished',
    tags: ["price", "quality",],
  }@

help =>
  DECORATE: redirect:/service
  REPLACE: support
"#;

#[test]
fn catalog_compiles() {
    let collection = RulesCollection::from_rules_text(CATALOG).unwrap();
    assert_eq!(collection.len(), 4);

    let rules = collection.rules();
    assert_eq!(rules[0].instructions.id_text(), "notebook");
    assert_eq!(rules[0].instructions.instructions.len(), 3);
    assert_eq!(rules[1].instructions.id_text(), "iphone*#1");
    assert!(rules[2].input.is_boolean());
    assert_eq!(rules[2].instructions.log_message(), "cheap, not refurbished");
    assert_eq!(
        rules[2].instructions.properties["tags"],
        serde_json::json!(["price", "quality"])
    );
    assert_eq!(rules[3].instructions.id_text(), "help#3");
}

#[test]
fn catalog_literal_details() {
    let collection = RulesCollection::from_rules_text(CATALOG).unwrap();
    let rules = collection.rules();

    match &rules[1].input {
        RuleInput::Simple(elements) => {
            assert_eq!(elements.len(), 1);
            assert_eq!(elements[0].value, "iphone");
            assert!(elements[0].is_prefix);
        }
        other => panic!("unexpected input {other:?}"),
    }

    match &rules[0].instructions.instructions[1] {
        Instruction::Synonym { terms, weight } => {
            assert_eq!(*weight, 0.5);
            assert_eq!(terms.len(), 2);
            assert!(terms[0].fields.contains("title"));
            assert!(terms[0].fields.contains("category"));
            assert!(terms[1].fields.is_empty());
        }
        other => panic!("unexpected instruction {other:?}"),
    }

    // two distinct literals in the boolean rule
    assert_eq!(collection.literals().len(), 2);
}

#[test]
fn compile_is_deterministic() {
    let c1 = RulesCollection::from_rules_text(CATALOG).unwrap();
    let c2 = RulesCollection::from_rules_text(CATALOG).unwrap();
    let seq = TermPositionSequence::from_values(["cheap", "iphone12", "notebook", "help"]);
    let summary = |c: &RulesCollection| -> Vec<(String, usize, usize)> {
        c.rewrite_actions(&seq)
            .iter()
            .map(|a| (a.to_string(), a.start, a.end))
            .collect()
    };
    assert_eq!(summary(&c1), summary(&c2));
    assert_eq!(summary(&c1).len(), 4);
}

#[test]
fn explicit_duplicate_id_fails() {
    let err = parse_err("a =>\n  UP: x\n  @_id: \"same\"\nb =>\n  UP: y\n  @_id: \"same\"");
    assert_eq!(err.kind(), &RuleErrorKind::DuplicateId { id: "same".into() });
    assert_eq!(err.line(), Some(4));
}

#[test]
fn default_ids_never_collide() {
    let collection =
        RulesCollection::from_rules_text("a =>\n  UP: x\na =>\n  UP: y\na =>\n  UP: z").unwrap();
    let ids: Vec<String> = collection
        .rules()
        .iter()
        .map(|r| r.instructions.id_text())
        .collect();
    assert_eq!(ids, vec!["a#0", "a#1", "a#2"]);
}

#[test]
fn delete_term_must_be_in_input() {
    let err = parse_err("a b =>\n  DELETE: c");
    assert_eq!(err.line(), Some(2));
    assert_eq!(
        err.kind().to_string(),
        "Condition doesn't contain the term to delete: fields=[] value=c"
    );
}

#[test]
fn negative_boost_fails() {
    let err = parse_err("a =>\n  UP(-1): b");
    assert!(matches!(
        err.kind(),
        RuleErrorKind::InvalidParam { instruction: InstructionType::Up, param } if param == "-1"
    ));
}

#[test]
fn filter_param_fails() {
    let err = parse_err("a =>\n  FILTER(1): b");
    assert_eq!(
        err.kind(),
        &RuleErrorKind::ParamNotAllowed {
            instruction: InstructionType::Filter
        }
    );
}

#[test]
fn boolean_input_rejects_synonym() {
    let err = parse_err("a AND b =>\n  SYNONYM: c");
    assert_eq!(
        err.kind(),
        &RuleErrorKind::NotAllowedForBooleanInput {
            instruction: InstructionType::Synonym
        }
    );
}

#[test]
fn malformed_boolean_input_is_positioned() {
    let err = parse_err("x =>\n  UP: y\n\n(a OR b =>\n  UP: c");
    assert_eq!(err.line(), Some(4));
    assert!(matches!(err.kind(), RuleErrorKind::BooleanSyntax { .. }));
}

#[test]
fn unterminated_property_block() {
    let err = parse_err("a =>\n  UP: b\n  @{\n    _id: \"x\"");
    assert_eq!(err.kind(), &RuleErrorKind::UnterminatedProperty);
    assert_eq!(err.line(), Some(3));
}

#[test]
fn unsupported_type_with_restricted_config() {
    let config = RulesConfig::new().instruction_types(InstructionTypes::SYNONYM | InstructionTypes::UP);
    assert!(RulesCollection::from_rules_text_with_config("a =>\n  UP: b", config.clone()).is_ok());
    match RulesCollection::from_rules_text_with_config("a =>\n  DECORATE: b", config) {
        Err(RewriteError::Parse(e)) => {
            assert!(matches!(e.kind(), RuleErrorKind::UnsupportedInstruction { .. }));
        }
        other => panic!("expected unsupported instruction, got {other:?}"),
    }
}

#[test]
fn error_display_includes_line() {
    let err = parse_err("a =>\n  FILTER(1): b");
    assert_eq!(
        err.to_string(),
        "rule error at line 2: FILTER does not take a parameter"
    );
}
