//! Action trait, the dynamic `Message` type and key-mirrored action tables

use crate::error::DispatchError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Debug};
use std::ops::Index;

/// Trait for values that can be broadcast by a [`Dispatcher`](crate::Dispatcher)
///
/// Actions represent something that happened. They should be:
/// - Clone: Actions may be logged or recorded by middleware
/// - Debug: For debugging and logging
///
/// The name is the discriminant mapping reducers match on.
/// Use `#[derive(Action)]` from `fluxury-macros` to implement this for enums.
pub trait Action: Clone + Debug + 'static {
    /// Get the action name used for reducer lookup and logging
    fn name(&self) -> &str;
}

/// A dynamically typed action: a `type` string plus optional payload
///
/// Serializes as `{"type": "...", "data": ...}`, with `data` omitted when absent.
/// Deserializing rejects any other key, and reads `"data": null` as no payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Message {
    /// Discriminant used by reducers
    #[serde(rename = "type")]
    pub kind: String,
    /// Optional payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Message {
    /// Create a message with no payload
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: None,
        }
    }

    /// Create a message carrying a payload
    pub fn with_data(kind: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            data: Some(data.into()),
        }
    }

    /// Deserialize the payload into a concrete type
    ///
    /// Returns `None` when the message has no payload.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.data
            .as_ref()
            .map(|data| serde_json::from_value(data.clone()))
    }
}

impl Action for Message {
    fn name(&self) -> &str {
        &self.kind
    }
}

impl From<&str> for Message {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

impl From<String> for Message {
    fn from(kind: String) -> Self {
        Self::new(kind)
    }
}

impl TryFrom<Value> for Message {
    type Error = DispatchError;

    /// A string becomes a message of that type; an object must carry a string
    /// `type` field and at most a `data` field besides. Anything else is rejected.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(kind) => Ok(Self::new(kind)),
            Value::Object(ref fields) => {
                if !matches!(fields.get("type"), Some(Value::String(_))) {
                    return Err(DispatchError::InvalidArgument(
                        "message object must have a string `type` field".to_string(),
                    ));
                }
                serde_json::from_value(value)
                    .map_err(|e| DispatchError::InvalidArgument(e.to_string()))
            }
            other => Err(DispatchError::InvalidArgument(format!(
                "type must be string or object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Immutable key-mirrored table of action type names
///
/// Every entry maps a name to itself. Built with [`create_actions`].
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ActionTypes {
    names: Vec<String>,
}

impl ActionTypes {
    /// Look up an action type by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.names
            .iter()
            .find(|n| n.as_str() == name)
            .map(String::as_str)
    }

    /// Whether the table contains `name`
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Index<&str> for ActionTypes {
    type Output = str;

    /// # Panics
    ///
    /// Panics if `name` was not declared.
    fn index(&self, name: &str) -> &str {
        self.get(name)
            .unwrap_or_else(|| panic!("unknown action type: {name:?}"))
    }
}

impl Debug for ActionTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.names.iter().map(|n| (n, n)))
            .finish()
    }
}

/// Transform a list of action names into a key-mirrored table
///
/// Duplicate names collapse into a single entry at their first position.
///
/// # Example
/// ```
/// use fluxury_core::create_actions;
///
/// let actions = create_actions(["INC", "DEC", "SET"]);
/// assert_eq!(&actions["INC"], "INC");
/// assert_eq!(actions.iter().collect::<Vec<_>>(), vec!["INC", "DEC", "SET"]);
/// ```
pub fn create_actions<I, S>(names: I) -> ActionTypes
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut table = ActionTypes::default();
    for name in names {
        let name = name.into();
        if !table.contains(&name) {
            table.names.push(name);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_actions_mirrors_keys() {
        let actions = create_actions(["INC", "DEC", "SET"]);

        assert_eq!(actions.len(), 3);
        assert_eq!(actions.get("INC"), Some("INC"));
        assert_eq!(&actions["SET"], "SET");
        assert_eq!(actions.get("RESET"), None);
        assert_eq!(format!("{actions:?}"), r#"{"INC": "INC", "DEC": "DEC", "SET": "SET"}"#);
    }

    #[test]
    fn test_create_actions_dedups() {
        let actions = create_actions(vec!["A".to_string(), "B".to_string(), "A".to_string()]);
        assert_eq!(actions.iter().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    #[should_panic(expected = "unknown action type")]
    fn test_index_unknown_panics() {
        let actions = create_actions(["INC"]);
        let _ = &actions["DEC"];
    }

    #[test]
    fn test_message_serde_shape() {
        let msg = Message::with_data("SET", json!({ "foo": 1 }));
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "type": "SET", "data": { "foo": 1 } })
        );

        let bare = Message::new("INC");
        assert_eq!(serde_json::to_value(&bare).unwrap(), json!({ "type": "INC" }));
    }

    #[test]
    fn test_message_from_value_string() {
        let msg = Message::try_from(json!("INC")).unwrap();
        assert_eq!(msg, Message::new("INC"));
        assert_eq!(msg.name(), "INC");
    }

    #[test]
    fn test_message_from_value_object() {
        let msg = Message::try_from(json!({ "type": "SET", "data": [1, 2] })).unwrap();
        assert_eq!(msg.kind, "SET");
        assert_eq!(msg.data, Some(json!([1, 2])));
    }

    #[test]
    fn test_message_from_value_rejects_other_shapes() {
        for value in [json!(42), json!(null), json!([1]), json!({ "data": 1 }), json!({ "type": 3 })] {
            let err = Message::try_from(value).unwrap_err();
            assert!(matches!(err, DispatchError::InvalidArgument(_)));
        }
    }

    #[test]
    fn test_message_from_value_rejects_extra_keys() {
        let err = Message::try_from(json!({ "type": "SET", "data": 1, "meta": true })).unwrap_err();
        match err {
            DispatchError::InvalidArgument(reason) => assert!(reason.contains("meta"), "{reason}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_message_from_value_null_data_is_absent() {
        let msg = Message::try_from(json!({ "type": "SET", "data": null })).unwrap();
        assert_eq!(msg, Message::new("SET"));
    }

    #[test]
    fn test_data_as() {
        let msg = Message::with_data("loadMessage", "Test");
        let data: String = msg.data_as().unwrap().unwrap();
        assert_eq!(data, "Test");
        assert!(Message::new("INC").data_as::<String>().is_none());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_create_actions_is_key_mirror(names in prop::collection::vec("[A-Z_]{1,8}", 0..20)) {
                let actions = create_actions(names.clone());
                for name in &names {
                    prop_assert_eq!(actions.get(name), Some(name.as_str()));
                }
                let unique: std::collections::HashSet<_> = names.iter().collect();
                prop_assert_eq!(actions.len(), unique.len());
            }
        }
    }
}
