use serde_json::Value;

use super::message::Message;
use crate::json::{wire_enum, JsonElement, JsonObject, JsonReader, JsonRecord, JsonWriter};

const IMAGE_GENERATION_CALL: &str = "image_generation_call";

wire_enum! {
    /// Progress of an image generation tool call.
    pub enum ImageGenerationStatus fallback InProgress {
        InProgress => "in_progress",
        Generating => "generating",
        Completed => "completed",
        Failed => "failed",
    }
}

/// Output of the image generation tool inside a response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageGenerationCall {
    id: String,
    status: Option<ImageGenerationStatus>,
    /// Base64-encoded image.
    result: String,
    revised_prompt: String,
    extra: JsonObject,
}

impl ImageGenerationCall {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        let changed = self.id != id;
        self.id = id;
        changed
    }

    pub fn status(&self) -> Option<ImageGenerationStatus> {
        self.status
    }

    pub fn set_status(&mut self, status: Option<ImageGenerationStatus>) -> bool {
        let changed = self.status != status;
        self.status = status;
        changed
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn set_result(&mut self, result: impl Into<String>) -> bool {
        let result = result.into();
        let changed = self.result != result;
        self.result = result;
        changed
    }

    pub fn revised_prompt(&self) -> &str {
        &self.revised_prompt
    }

    pub fn set_revised_prompt(&mut self, revised_prompt: impl Into<String>) -> bool {
        let revised_prompt = revised_prompt.into();
        let changed = self.revised_prompt != revised_prompt;
        self.revised_prompt = revised_prompt;
        changed
    }
}

impl JsonRecord for ImageGenerationCall {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new(IMAGE_GENERATION_CALL, json, errors);
        if !reader.check_type(IMAGE_GENERATION_CALL) {
            return reader.finish();
        }
        if let Some(id) = reader.string("id") {
            self.id = id;
        }
        self.status = reader.enumeration("status");
        if let Some(result) = reader.string("result") {
            self.result = result;
        }
        if let Some(revised_prompt) = reader.string("revised_prompt") {
            self.revised_prompt = revised_prompt;
        }
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.tag(IMAGE_GENERATION_CALL);
        writer.string("id", &self.id);
        writer.optional_enumeration("status", self.status);
        writer.string("result", &self.result);
        writer.string("revised_prompt", &self.revised_prompt);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.id.is_empty()
            && self.status.is_none()
            && self.result.is_empty()
            && self.revised_prompt.is_empty()
    }

    fn is_valid(&self) -> bool {
        !self.id.is_empty()
    }
}

/// One element of a response's `output` list.
///
/// Item types this crate does not model are kept verbatim in `Other`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OutputItem {
    #[default]
    Empty,
    Message(Message),
    ImageGenerationCall(ImageGenerationCall),
    Other(JsonObject),
}

impl OutputItem {
    pub fn is_empty(&self) -> bool {
        match self {
            OutputItem::Empty => true,
            OutputItem::Message(message) => message.is_empty(),
            OutputItem::ImageGenerationCall(call) => call.is_empty(),
            OutputItem::Other(object) => object.is_empty(),
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            OutputItem::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_image_generation_call(&self) -> Option<&ImageGenerationCall> {
        match self {
            OutputItem::ImageGenerationCall(call) => Some(call),
            _ => None,
        }
    }

    /// The discriminator this item is written with.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            OutputItem::Empty => None,
            OutputItem::Message(_) => Some("message"),
            OutputItem::ImageGenerationCall(_) => Some(IMAGE_GENERATION_CALL),
            OutputItem::Other(object) => object.get("type").and_then(Value::as_str),
        }
    }
}

impl JsonElement for OutputItem {
    fn from_value(value: &Value, errors: &mut Vec<String>) -> Option<Self> {
        let Some(object) = value.as_object() else {
            errors.push(format!("output item: expected object, got {}", value));
            return None;
        };
        if object.is_empty() {
            return Some(OutputItem::Empty);
        }
        let item = match object.get("type").and_then(Value::as_str) {
            Some("message") => OutputItem::Message(Message::from_json(object, Some(errors)).0),
            Some(IMAGE_GENERATION_CALL) => {
                OutputItem::ImageGenerationCall(ImageGenerationCall::from_json(object, Some(errors)).0)
            }
            Some(_) => OutputItem::Other(object.clone()),
            None => {
                errors.push(format!("output item: missing \"type\" in {}", value));
                return None;
            }
        };
        Some(item)
    }

    fn to_value(&self, full: bool) -> Value {
        match self {
            OutputItem::Empty => Value::Object(JsonObject::new()),
            OutputItem::Message(message) => message.to_value(full),
            OutputItem::ImageGenerationCall(call) => call.to_value(full),
            OutputItem::Other(object) => Value::Object(object.clone()),
        }
    }
}

/// A response's `output` list.
pub type OutputItemList = Vec<OutputItem>;
