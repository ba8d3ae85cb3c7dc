use crate::json::{JsonObject, JsonReader, JsonRecord, JsonWriter};

const TYPE: &str = "conversation";

/// A server-side conversation the response is attached to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    id: String,
    extra: JsonObject,
}

impl Conversation {
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

impl JsonRecord for Conversation {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new(TYPE, json, errors);
        if !reader.check_type(TYPE) {
            return reader.finish();
        }
        if let Some(id) = reader.string("id") {
            self.id = id;
        }
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.string("id", &self.id);
        writer.tag(TYPE);
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_encode_with_extra() {
        let mut conversation = Conversation::new("conv_1");
        conversation
            .extra_mut()
            .insert("foo".to_string(), json!("bar"));

        let encoded = Value::Object(conversation.to_json(false));
        assert_eq!(encoded, json!({"id": "conv_1", "type": "conversation", "foo": "bar"}));
    }

    #[test]
    fn test_decode_with_extra() {
        let json = json!({"id": "conv_1", "type": "conversation", "foo": "bar"});
        let (conversation, ok) = Conversation::from_json(json.as_object().unwrap(), None);
        assert!(ok);
        assert_eq!(conversation.id(), "conv_1");
        assert_eq!(Value::Object(conversation.extra().clone()), json!({"foo": "bar"}));
        assert_eq!(Value::Object(conversation.to_json(false)), json);
    }

    #[test]
    fn test_decode_rejects_wrong_type() {
        let json = json!({"id": "conv_1", "type": "message"});
        let mut errors = Vec::new();
        let (conversation, ok) = Conversation::from_json(json.as_object().unwrap(), Some(&mut errors));
        assert!(!ok);
        assert_eq!(errors.len(), 1);
        assert!(conversation.is_empty());
    }
}
