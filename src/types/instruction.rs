use std::fmt;

use serde_json::{Map, Value};

use super::InputElement;

/// Property key holding a rule's unique identifier.
pub const ID_PROPERTY: &str = "_id";
/// Property key holding the message reported when a rule is applied.
pub const LOG_PROPERTY: &str = "_log";

/// Direction of a boost instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoostDirection {
    Up,
    Down,
}

/// The query text attached to a boost or filter instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionQuery {
    /// Passed through untouched to the search backend (`* text` in rules).
    Raw(String),
    /// Handed to the configured [`QueryParser`](crate::QueryParser).
    Parsed(String),
}

impl InstructionQuery {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            InstructionQuery::Raw(text) | InstructionQuery::Parsed(text) => text,
        }
    }
}

/// A single rewrite instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Synonym {
        terms: Vec<InputElement>,
        weight: f32,
    },
    Boost {
        query: InstructionQuery,
        direction: BoostDirection,
        weight: f32,
    },
    Filter {
        query: InstructionQuery,
    },
    /// `None` deletes every matched term.
    Delete {
        terms: Option<Vec<InputElement>>,
    },
    Decorate {
        value: String,
        key: Option<String>,
    },
    /// Accepted by the rules parser; has no effect when applied.
    Replace {
        value: Option<String>,
    },
}

impl Instruction {
    #[must_use]
    pub fn instruction_type(&self) -> InstructionType {
        match self {
            Instruction::Synonym { .. } => InstructionType::Synonym,
            Instruction::Boost {
                direction: BoostDirection::Up,
                ..
            } => InstructionType::Up,
            Instruction::Boost {
                direction: BoostDirection::Down,
                ..
            } => InstructionType::Down,
            Instruction::Filter { .. } => InstructionType::Filter,
            Instruction::Delete { .. } => InstructionType::Delete,
            Instruction::Decorate { .. } => InstructionType::Decorate,
            Instruction::Replace { .. } => InstructionType::Replace,
        }
    }
}

/// Instruction type names as written in rules text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionType {
    Synonym,
    Up,
    Down,
    Filter,
    Delete,
    Decorate,
    Replace,
}

impl InstructionType {
    pub const ALL: [InstructionType; 7] = [
        InstructionType::Synonym,
        InstructionType::Up,
        InstructionType::Down,
        InstructionType::Filter,
        InstructionType::Delete,
        InstructionType::Decorate,
        InstructionType::Replace,
    ];

    /// Case-insensitive lookup of a type name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            InstructionType::Synonym => "SYNONYM",
            InstructionType::Up => "UP",
            InstructionType::Down => "DOWN",
            InstructionType::Filter => "FILTER",
            InstructionType::Delete => "DELETE",
            InstructionType::Decorate => "DECORATE",
            InstructionType::Replace => "REPLACE",
        }
    }
}

impl fmt::Display for InstructionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The instructions of one rule together with its identity and properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Instructions {
    /// Source declaration order; the tie-breaker when actions share a start.
    pub order: usize,
    pub id: Value,
    pub instructions: Vec<Instruction>,
    /// All rule properties, including `_id` and `_log`.
    pub properties: Map<String, Value>,
}

impl Instructions {
    /// Create instructions with `_id` set to `id` and `_log` defaulting to it.
    pub fn new(order: usize, id: impl Into<Value>, instructions: Vec<Instruction>) -> Self {
        Self::with_properties(order, id, instructions, Map::new())
    }

    /// Like [`new`](Self::new), merging extra properties. An explicit `_log`
    /// in `properties` wins over the default.
    pub fn with_properties(
        order: usize,
        id: impl Into<Value>,
        instructions: Vec<Instruction>,
        mut properties: Map<String, Value>,
    ) -> Self {
        let id = id.into();
        properties.insert(ID_PROPERTY.to_owned(), id.clone());
        if !properties.contains_key(LOG_PROPERTY) {
            properties.insert(LOG_PROPERTY.to_owned(), id.clone());
        }
        Self {
            order,
            id,
            instructions,
            properties,
        }
    }

    /// The `_log` message, rendered as plain text when it is a JSON string.
    #[must_use]
    pub fn log_message(&self) -> String {
        match self.properties.get(LOG_PROPERTY) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => id_text(&self.id),
        }
    }

    /// The id rendered as plain text when it is a JSON string.
    #[must_use]
    pub fn id_text(&self) -> String {
        id_text(&self.id)
    }
}

fn id_text(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_defaults_to_id() {
        let ins = Instructions::new(0, "r1", vec![]);
        assert_eq!(ins.properties[LOG_PROPERTY], Value::from("r1"));
        assert_eq!(ins.log_message(), "r1");
    }

    #[test]
    fn explicit_log_is_kept() {
        let mut props = Map::new();
        props.insert(LOG_PROPERTY.into(), Value::from("laptop synonyms"));
        let ins = Instructions::with_properties(3, 17, vec![], props);
        assert_eq!(ins.log_message(), "laptop synonyms");
        assert_eq!(ins.id_text(), "17");
        assert_eq!(ins.properties[ID_PROPERTY], Value::from(17));
    }

    #[test]
    fn type_names_are_case_insensitive() {
        assert_eq!(InstructionType::from_name("synonym"), Some(InstructionType::Synonym));
        assert_eq!(InstructionType::from_name("Down"), Some(InstructionType::Down));
        assert_eq!(InstructionType::from_name("boost"), None);
    }

    #[test]
    fn instruction_type_of_boost_follows_direction() {
        let ins = Instruction::Boost {
            query: InstructionQuery::Parsed("a".into()),
            direction: BoostDirection::Down,
            weight: 1.0,
        };
        assert_eq!(ins.instruction_type(), InstructionType::Down);
    }
}
