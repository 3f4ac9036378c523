use thiserror::Error;

use super::InstructionType;

/// What went wrong while compiling a rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleErrorKind {
    #[error("cannot parse line: '{line}'")]
    MalformedLine { line: String },

    #[error("instruction or property before the first input line")]
    MissingInput,

    #[error("rule input is empty")]
    EmptyInput,

    #[error("unsupported instruction type '{name}'")]
    UnsupportedInstruction { name: String },

    #[error("duplicate rule id {id}")]
    DuplicateId { id: String },

    #[error("duplicate property '{key}'")]
    DuplicateProperty { key: String },

    #[error("invalid property: {message}")]
    InvalidProperty { message: String },

    #[error("property block is not terminated with '}}@'")]
    UnterminatedProperty,

    #[error("literal value must not be blank")]
    BlankLiteral,

    #[error("field block is not closed in '{literal}'")]
    UnclosedFieldBlock { literal: String },

    #[error("more than one wildcard in '{literal}'")]
    RepeatedWildcard { literal: String },

    #[error("wildcard is only allowed at the end of '{literal}'")]
    MisplacedWildcard { literal: String },

    #[error("wildcard is only allowed in the last input term")]
    PrefixNotLast,

    #[error("invalid boolean input '{input}': {message}")]
    BooleanSyntax { input: String, message: String },

    #[error("boolean input needs at least one literal outside NOT")]
    NoPositiveLiteral,

    #[error("{instruction} is not allowed for boolean input")]
    NotAllowedForBooleanInput { instruction: InstructionType },

    #[error("Condition doesn't contain the term to delete: {term}")]
    DeleteTermNotInInput { term: String },

    #[error("{instruction} requires a value")]
    MissingValue { instruction: InstructionType },

    #[error("{instruction} does not take a parameter")]
    ParamNotAllowed { instruction: InstructionType },

    #[error("invalid parameter '{param}' for {instruction}: expected a non-negative number")]
    InvalidParam {
        instruction: InstructionType,
        param: String,
    },

    #[error("invalid query '{query}' in {instruction}: {message}")]
    InvalidQuery {
        instruction: InstructionType,
        query: String,
        message: String,
    },
}

/// A request-time failure while applying one rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rule {rule_id}: {message}")]
pub struct MatchRuntimeError {
    pub rule_id: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_term_message() {
        let err = RuleErrorKind::DeleteTermNotInInput {
            term: "fields=[] value=c".into(),
        };
        assert_eq!(
            err.to_string(),
            "Condition doesn't contain the term to delete: fields=[] value=c"
        );
    }

    #[test]
    fn invalid_param_message() {
        let err = RuleErrorKind::InvalidParam {
            instruction: InstructionType::Up,
            param: "-1".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid parameter '-1' for UP: expected a non-negative number"
        );
    }

    #[test]
    fn boolean_restriction_message() {
        let err = RuleErrorKind::NotAllowedForBooleanInput {
            instruction: InstructionType::Synonym,
        };
        assert_eq!(err.to_string(), "SYNONYM is not allowed for boolean input");
    }

    #[test]
    fn unterminated_property_message() {
        assert_eq!(
            RuleErrorKind::UnterminatedProperty.to_string(),
            "property block is not terminated with '}@'"
        );
    }

    #[test]
    fn runtime_error_message() {
        let err = MatchRuntimeError {
            rule_id: "r7".into(),
            message: "query text is empty".into(),
        };
        assert_eq!(err.to_string(), "rule r7: query text is empty");
    }
}
