use serde_json::Value;

use super::message::Message;
use crate::json::{read_list, write_list, JsonElement, JsonObject, JsonReader, JsonRecord, JsonWriter};

const ITEM_REFERENCE: &str = "item_reference";

/// Points at an item from an earlier response by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemReference {
    id: String,
    extra: JsonObject,
}

impl ItemReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        let changed = self.id != id;
        self.id = id;
        changed
    }
}

impl JsonRecord for ItemReference {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new(ITEM_REFERENCE, json, errors);
        if !reader.check_type(ITEM_REFERENCE) {
            return reader.finish();
        }
        if let Some(id) = reader.string("id") {
            self.id = id;
        }
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.tag(ITEM_REFERENCE);
        writer.string("id", &self.id);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.id.is_empty()
    }
}

/// One element of the `input` list.
///
/// Items of a type this crate does not model are kept verbatim in `Other`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InputItem {
    #[default]
    Empty,
    Message(Message),
    ItemReference(ItemReference),
    Other(JsonObject),
}

impl InputItem {
    pub fn is_empty(&self) -> bool {
        match self {
            InputItem::Empty => true,
            InputItem::Message(message) => message.is_empty(),
            InputItem::ItemReference(reference) => reference.is_empty(),
            InputItem::Other(object) => object.is_empty(),
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            InputItem::Message(message) => Some(message),
            _ => None,
        }
    }
}

impl From<Message> for InputItem {
    fn from(message: Message) -> Self {
        InputItem::Message(message)
    }
}

impl From<ItemReference> for InputItem {
    fn from(reference: ItemReference) -> Self {
        InputItem::ItemReference(reference)
    }
}

impl JsonElement for InputItem {
    fn from_value(value: &Value, errors: &mut Vec<String>) -> Option<Self> {
        let Some(object) = value.as_object() else {
            errors.push(format!("input item: expected object, got {}", value));
            return None;
        };
        if object.is_empty() {
            return Some(InputItem::Empty);
        }
        // Easy-input messages may omit the discriminator.
        let item = match object.get("type") {
            Some(Value::String(ty)) if ty == "message" => {
                InputItem::Message(Message::from_json(object, Some(errors)).0)
            }
            Some(Value::String(ty)) if ty == ITEM_REFERENCE => {
                InputItem::ItemReference(ItemReference::from_json(object, Some(errors)).0)
            }
            None if object.contains_key("role") => {
                InputItem::Message(Message::from_json(object, Some(errors)).0)
            }
            None if object.contains_key("id") => {
                InputItem::ItemReference(ItemReference::from_json(object, Some(errors)).0)
            }
            Some(Value::String(_)) => InputItem::Other(object.clone()),
            _ => {
                errors.push(format!("input item: cannot determine type of {}", value));
                return None;
            }
        };
        Some(item)
    }

    fn to_value(&self, full: bool) -> Value {
        match self {
            InputItem::Empty => Value::Object(JsonObject::new()),
            InputItem::Message(message) => message.to_value(full),
            InputItem::ItemReference(reference) => reference.to_value(full),
            InputItem::Other(object) => Value::Object(object.clone()),
        }
    }
}

/// The `input` list.
pub type InputItemList = Vec<InputItem>;

/// The `input` parameter: absent, a bare string, or a list of items.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Input {
    #[default]
    Empty,
    Text(String),
    Items(InputItemList),
}

impl Input {
    pub fn is_empty(&self) -> bool {
        match self {
            Input::Empty => true,
            Input::Text(text) => text.is_empty(),
            Input::Items(items) => items.is_empty(),
        }
    }

    /// Decode from a string or array. `None` for any other shape.
    pub fn from_value(value: &Value, errors: &mut Vec<String>) -> Option<(Self, bool)> {
        match value {
            Value::String(text) => Some((Input::Text(text.clone()), true)),
            Value::Array(values) => {
                let (items, ok) = read_list(values, errors);
                Some((Input::Items(items), ok))
            }
            Value::Null => Some((Input::Empty, true)),
            _ => None,
        }
    }

    /// `None` when there is nothing to send.
    pub fn to_value(&self, full: bool) -> Option<Value> {
        match self {
            Input::Empty => None,
            Input::Text(text) => Some(Value::String(text.clone())),
            Input::Items(items) => Some(Value::Array(write_list(items, full))),
        }
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::Text(text.to_string())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::Text(text)
    }
}

impl From<InputItemList> for Input {
    fn from(items: InputItemList) -> Self {
        Input::Items(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use serde_json::json;

    #[test]
    fn test_item_reference_json() {
        let reference = ItemReference::new("msg_9");
        assert_eq!(
            reference.to_value(false),
            json!({"type": "item_reference", "id": "msg_9"})
        );
    }

    #[test]
    fn test_input_items_mixed_validity() {
        let value = json!([
            {"role": "user", "content": "first"},
            "not an object",
            {"type": "item_reference", "id": "msg_1"},
            {"type": "function_call_output", "call_id": "call_1", "output": "42"},
            {"id": "rs_1"}
        ]);
        let mut errors = Vec::new();
        let (input, ok) = Input::from_value(&value, &mut errors).unwrap();
        assert!(!ok);
        assert_eq!(errors.len(), 1);
        let Input::Items(items) = input else {
            panic!("expected items");
        };
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].as_message().and_then(Message::role), Some(Role::User));
        assert_eq!(items[1], InputItem::ItemReference(ItemReference::new("msg_1")));
        assert!(matches!(&items[2], InputItem::Other(object) if object["call_id"] == "call_1"));
        assert_eq!(items[3], InputItem::ItemReference(ItemReference::new("rs_1")));
    }

    #[test]
    fn test_input_encoding() {
        assert_eq!(Input::Empty.to_value(false), None);
        assert_eq!(Input::from("hi").to_value(false), Some(json!("hi")));
        let items = Input::from(vec![InputItem::from(Message::user("hi"))]);
        assert_eq!(
            items.to_value(false),
            Some(json!([{"type": "message", "role": "user", "content": "hi"}]))
        );
    }

    #[test]
    fn test_input_rejects_numbers() {
        let mut errors = Vec::new();
        assert!(Input::from_value(&json!(7), &mut errors).is_none());
    }
}
