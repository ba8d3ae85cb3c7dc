use itertools::Itertools;
use serde_json::Value;

use crate::json::{
    read_list, wire_enum, write_list, JsonElement, JsonObject, JsonReader, JsonRecord, JsonWriter,
};

const TYPE: &str = "message";

wire_enum! {
    /// Author of a message.
    pub enum Role fallback User {
        User => "user",
        Assistant => "assistant",
        System => "system",
        Developer => "developer",
    }
}

wire_enum! {
    /// Lifecycle status of an input or output item.
    pub enum ItemStatus fallback Completed {
        InProgress => "in_progress",
        Completed => "completed",
        Incomplete => "incomplete",
    }
}

wire_enum! {
    /// Detail level for image inputs.
    pub enum ImageDetail fallback Auto {
        Auto => "auto",
        Low => "low",
        High => "high",
    }
}

/// Plain text given to the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputText {
    pub text: String,
    pub extra: JsonObject,
}

/// Text produced by the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputText {
    pub text: String,
    /// Citations and file references, kept as raw objects.
    pub annotations: Vec<Value>,
    pub extra: JsonObject,
}

/// An image given to the model, by URL, data URL or file id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputImage {
    pub image_url: String,
    pub file_id: String,
    pub detail: ImageDetail,
    pub extra: JsonObject,
}

/// A file given to the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputFile {
    pub file_id: String,
    pub file_data: String,
    pub file_url: String,
    pub filename: String,
    pub extra: JsonObject,
}

/// The model declined to answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Refusal {
    pub refusal: String,
    pub extra: JsonObject,
}

impl JsonRecord for InputText {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("input_text", json, errors);
        if reader.check_type("input_text") {
            self.text = reader.string("text").unwrap_or_default();
        }
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.tag("input_text");
        writer.required_string("text", &self.text);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl JsonRecord for OutputText {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("output_text", json, errors);
        if reader.check_type("output_text") {
            self.text = reader.string("text").unwrap_or_default();
            self.annotations = reader.array("annotations").unwrap_or_default();
        }
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.tag("output_text");
        writer.required_string("text", &self.text);
        if self.annotations.is_empty() {
            writer.fill("annotations", Value::Array(Vec::new()));
        } else {
            writer.raw("annotations", Value::Array(self.annotations.clone()));
        }
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty() && self.annotations.is_empty()
    }
}

impl JsonRecord for InputImage {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("input_image", json, errors);
        if reader.check_type("input_image") {
            self.image_url = reader.string("image_url").unwrap_or_default();
            self.file_id = reader.string("file_id").unwrap_or_default();
            self.detail = reader.enumeration("detail").unwrap_or_default();
        }
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.tag("input_image");
        writer.string("image_url", &self.image_url);
        writer.string("file_id", &self.file_id);
        writer.enumeration("detail", self.detail, ImageDetail::Auto);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.image_url.is_empty() && self.file_id.is_empty()
    }
}

impl JsonRecord for InputFile {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("input_file", json, errors);
        if reader.check_type("input_file") {
            self.file_id = reader.string("file_id").unwrap_or_default();
            self.file_data = reader.string("file_data").unwrap_or_default();
            self.file_url = reader.string("file_url").unwrap_or_default();
            self.filename = reader.string("filename").unwrap_or_default();
        }
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.tag("input_file");
        writer.string("file_id", &self.file_id);
        writer.string("file_data", &self.file_data);
        writer.string("file_url", &self.file_url);
        writer.string("filename", &self.filename);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.file_id.is_empty() && self.file_data.is_empty() && self.file_url.is_empty()
    }
}

impl JsonRecord for Refusal {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("refusal", json, errors);
        if reader.check_type("refusal") {
            self.refusal = reader.string("refusal").unwrap_or_default();
        }
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.tag("refusal");
        writer.required_string("refusal", &self.refusal);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.refusal.is_empty()
    }
}

/// One element of a message's content list, selected by `"type"`.
///
/// Part types this crate does not model are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    InputText(InputText),
    OutputText(OutputText),
    InputImage(InputImage),
    InputFile(InputFile),
    Refusal(Refusal),
    Other(JsonObject),
}

impl ContentPart {
    pub fn input_text(text: impl Into<String>) -> Self {
        ContentPart::InputText(InputText {
            text: text.into(),
            ..InputText::default()
        })
    }

    pub fn output_text(text: impl Into<String>) -> Self {
        ContentPart::OutputText(OutputText {
            text: text.into(),
            ..OutputText::default()
        })
    }

    /// The text carried by text parts.
    pub fn text(&self) -> Option<&str> {
        match self {
            ContentPart::InputText(part) => Some(&part.text),
            ContentPart::OutputText(part) => Some(&part.text),
            _ => None,
        }
    }
}

impl JsonElement for ContentPart {
    fn from_value(value: &Value, errors: &mut Vec<String>) -> Option<Self> {
        let Some(object) = value.as_object() else {
            errors.push(format!("content part: expected object, got {}", value));
            return None;
        };
        let errors = Some(errors);
        let part = match object.get("type").and_then(Value::as_str) {
            Some("input_text") => ContentPart::InputText(InputText::from_json(object, errors).0),
            Some("output_text") => ContentPart::OutputText(OutputText::from_json(object, errors).0),
            Some("input_image") => ContentPart::InputImage(InputImage::from_json(object, errors).0),
            Some("input_file") => ContentPart::InputFile(InputFile::from_json(object, errors).0),
            Some("refusal") => ContentPart::Refusal(Refusal::from_json(object, errors).0),
            Some(_) => ContentPart::Other(object.clone()),
            None => {
                if let Some(errors) = errors {
                    errors.push(format!("content part: missing \"type\" in {}", value));
                }
                return None;
            }
        };
        Some(part)
    }

    fn to_value(&self, full: bool) -> Value {
        match self {
            ContentPart::InputText(part) => part.to_value(full),
            ContentPart::OutputText(part) => part.to_value(full),
            ContentPart::InputImage(part) => part.to_value(full),
            ContentPart::InputFile(part) => part.to_value(full),
            ContentPart::Refusal(part) => part.to_value(full),
            ContentPart::Other(object) => Value::Object(object.clone()),
        }
    }
}

/// Message content: absent, a bare string, or a list of parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MessageContent {
    #[default]
    Empty,
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    pub fn is_empty(&self) -> bool {
        match self {
            MessageContent::Empty => true,
            MessageContent::Text(text) => text.is_empty(),
            MessageContent::Parts(parts) => parts.is_empty(),
        }
    }

    fn read(value: Value, errors: &mut Vec<String>) -> Result<Self, Value> {
        match value {
            Value::String(text) => Ok(MessageContent::Text(text)),
            Value::Array(values) => Ok(MessageContent::Parts(read_list(&values, errors).0)),
            other => Err(other),
        }
    }

    fn to_value(&self, full: bool) -> Option<Value> {
        match self {
            MessageContent::Empty => None,
            MessageContent::Text(text) => Some(Value::String(text.clone())),
            MessageContent::Parts(parts) => Some(Value::Array(write_list(parts, full))),
        }
    }
}

/// A message item: `{"type": "message", "role", "content", ...}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    id: String,
    /// `None` when absent or not a known role; an unknown role string stays
    /// in the extra bag.
    role: Option<Role>,
    status: Option<ItemStatus>,
    content: MessageContent,
    extra: JsonObject,
}

impl Message {
    pub fn new(role: Role, content: MessageContent) -> Self {
        Self {
            role: Some(role),
            content,
            ..Self::default()
        }
    }

    /// A user message with plain text content.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, MessageContent::Text(text.into()))
    }

    /// A developer (system-level) instruction message.
    pub fn developer(text: impl Into<String>) -> Self {
        Self::new(Role::Developer, MessageContent::Text(text.into()))
    }

    /// An assistant message, as used to replay earlier turns.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(
            Role::Assistant,
            MessageContent::Parts(vec![ContentPart::output_text(text)]),
        )
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

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn set_role(&mut self, role: impl Into<Option<Role>>) -> bool {
        let role = role.into();
        let changed = self.role != role;
        self.role = role;
        changed
    }

    pub fn status(&self) -> Option<ItemStatus> {
        self.status
    }

    pub fn set_status(&mut self, status: Option<ItemStatus>) -> bool {
        let changed = self.status != status;
        self.status = status;
        changed
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    pub fn set_content(&mut self, content: MessageContent) -> bool {
        let changed = self.content != content;
        self.content = content;
        changed
    }

    /// All text in the message, parts joined by newlines.
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Empty => String::new(),
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts.iter().filter_map(ContentPart::text).join("\n"),
        }
    }
}

impl JsonRecord for Message {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new(TYPE, json, errors);
        if !reader.check_type(TYPE) {
            return reader.finish();
        }
        if let Some(id) = reader.string("id") {
            self.id = id;
        }
        self.role = reader.enumeration("role");
        self.status = reader.enumeration("status");
        if let Some(value) = reader.raw("content") {
            let before = reader.errors().len();
            match MessageContent::read(value, reader.errors()) {
                Ok(content) => {
                    self.content = content;
                    let ok = reader.errors().len() == before;
                    reader.merge(ok);
                }
                Err(other) => {
                    reader.fail(format!("\"content\" expected string or array, got {}", other));
                }
            }
        }
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.tag(TYPE);
        writer.string("id", &self.id);
        writer.optional_enumeration("role", self.role);
        writer.optional_enumeration("status", self.status);
        match self.content.to_value(full) {
            Some(content) => writer.raw("content", content),
            None if full => writer.fill("content", Value::Array(Vec::new())),
            None => {}
        }
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.id.is_empty() && self.role.is_none() && self.status.is_none() && self.content.is_empty()
    }

    fn is_valid(&self) -> bool {
        !self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::WireEnum;
    use serde_json::json;

    fn decode(value: Value) -> (Message, bool, Vec<String>) {
        let mut errors = Vec::new();
        let (message, ok) = Message::from_json(value.as_object().unwrap(), Some(&mut errors));
        (message, ok, errors)
    }

    #[test]
    fn test_role_table() {
        for role in Role::VARIANTS {
            assert_eq!(Role::parse(role.as_str()), *role);
        }
        assert_eq!(Role::parse("tool"), Role::User);
    }

    #[test]
    fn test_user_text_message() {
        let message = Message::user("Hello");
        assert_eq!(
            message.to_value(false),
            json!({"type": "message", "role": "user", "content": "Hello"})
        );
        assert!(message.is_valid());
    }

    #[test]
    fn test_decode_output_message() {
        let (message, ok, errors) = decode(json!({
            "type": "message",
            "id": "msg_1",
            "status": "completed",
            "role": "assistant",
            "content": [
                {"type": "output_text", "text": "Hi", "annotations": []},
                {"type": "refusal", "refusal": "no"},
                {"type": "output_text", "text": "there", "annotations": [], "logprobs": []}
            ]
        }));
        assert!(ok, "{:?}", errors);
        assert_eq!(message.id(), "msg_1");
        assert_eq!(message.role(), Some(Role::Assistant));
        assert_eq!(message.status(), Some(ItemStatus::Completed));
        assert_eq!(message.text(), "Hi\nthere");
        let MessageContent::Parts(parts) = message.content() else {
            panic!("expected parts");
        };
        assert_eq!(parts.len(), 3);
        let ContentPart::OutputText(last) = &parts[2] else {
            panic!("expected output_text");
        };
        assert_eq!(last.extra.get("logprobs"), Some(&json!([])));
    }

    #[test]
    fn test_decode_message_without_type() {
        let (message, ok, _) = decode(json!({"role": "developer", "content": "Be terse."}));
        assert!(ok);
        assert_eq!(message.role(), Some(Role::Developer));
        assert_eq!(message.content(), &MessageContent::Text("Be terse.".to_string()));
    }

    #[test]
    fn test_unmodelled_part_is_kept() {
        let raw = json!({
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "output_text", "text": "look", "annotations": []},
                {"type": "output_audio", "data": "UklGR...", "transcript": "look"},
                {"type": "input_image", "image_url": "https://example.com/cat.png", "detail": "high"}
            ]
        });
        let (message, ok, errors) = decode(raw.clone());
        assert!(ok, "{:?}", errors);
        let MessageContent::Parts(parts) = message.content() else {
            panic!("expected parts");
        };
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[1], ContentPart::Other(object) if object["type"] == "output_audio"));
        assert_eq!(
            parts[2],
            ContentPart::InputImage(InputImage {
                image_url: "https://example.com/cat.png".to_string(),
                detail: ImageDetail::High,
                ..InputImage::default()
            })
        );
        assert_eq!(message.text(), "look");
        assert_eq!(message.to_value(false), raw);
    }

    #[test]
    fn test_part_without_type_is_reported() {
        let (message, ok, errors) = decode(json!({
            "role": "user",
            "content": [{"type": "input_text", "text": "a"}, {"text": "b"}]
        }));
        assert!(!ok);
        assert_eq!(errors.len(), 1);
        assert_eq!(message.text(), "a");
    }

    #[test]
    fn test_unknown_role_survives_round_trip() {
        let raw = json!({"type": "message", "role": "critic", "content": "x"});
        let (message, ok, _) = decode(raw.clone());
        assert!(ok);
        assert_eq!(message.role(), None);
        assert_eq!(message.to_value(false), raw);
        assert_eq!(message.to_json(true)["role"], json!("critic"));
    }

    #[test]
    fn test_set_role_replaces_unknown_role() {
        let (mut message, _, _) = decode(json!({"role": "critic", "content": "x"}));
        assert!(message.set_role(Role::Assistant));
        assert_eq!(message.to_json(false)["role"], json!("assistant"));
    }

    #[test]
    fn test_bad_content_shape() {
        let (message, ok, errors) = decode(json!({"role": "user", "content": 42}));
        assert!(!ok);
        assert_eq!(errors.len(), 1);
        assert!(message.content().is_empty());
    }

    #[test]
    fn test_round_trip_is_stable() {
        let (message, _, _) = decode(json!({
            "type": "message",
            "role": "user",
            "content": [
                {"type": "input_text", "text": "describe"},
                {"type": "input_file", "file_id": "file-1", "filename": "a.pdf"}
            ],
            "custom": {"nested": true}
        }));
        let encoded = message.to_json(false);
        let (again, ok) = Message::from_json(&encoded, None);
        assert!(ok);
        assert_eq!(again.to_json(false), encoded);
        assert_eq!(encoded.get("custom"), Some(&json!({"nested": true})));
    }
}
