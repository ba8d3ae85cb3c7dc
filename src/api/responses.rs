//! `POST /v1/responses`: text generation with optional tool calls.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde_json::Value;

use super::Endpoint;
use crate::json::{wire_enum, JsonObject, JsonReader, JsonRecord, JsonWriter, WireValue};
use crate::model::{
    ContentPart, Conversation, Include, IncludeList, Input, MessageContent, OutputItem, OutputItemList,
    Prompt, Reasoning,
};
use crate::request::{setters, Explicit, ExplicitSet, RequestData};

wire_enum! {
    /// How the server handles input that exceeds the context window.
    pub enum Truncation fallback Disabled {
        Auto => "auto",
        Disabled => "disabled",
    }
}

wire_enum! {
    pub enum ServiceTier fallback Auto {
        Auto => "auto",
        Default => "default",
        Flex => "flex",
        Priority => "priority",
    }
}

wire_enum! {
    /// Lifecycle status of a generated response.
    pub enum ResponseStatus fallback InProgress {
        Completed => "completed",
        Failed => "failed",
        InProgress => "in_progress",
        Cancelled => "cancelled",
        Queued => "queued",
        Incomplete => "incomplete",
    }
}

/// Request parameters of the Responses endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    input: Input,
    instructions: String,
    include: IncludeList,
    reasoning: Reasoning,
    prompt: Prompt,
    conversation: Conversation,
    /// Decoded from an object rather than a bare id; written back the same way.
    conversation_as_object: bool,
    previous_response_id: String,
    max_output_tokens: Option<u32>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    store: Option<bool>,
    background: Option<bool>,
    truncation: Option<Truncation>,
    service_tier: Option<ServiceTier>,
    user: String,
}

impl Endpoint for Params {
    type Body = ResponseObject;

    const PATH: &'static str = "/v1/responses";
    const DEFAULT_MODEL: &'static str = "gpt-4o";

    fn read_json(
        &mut self,
        json: &mut JsonObject,
        explicit: &mut ExplicitSet,
        errors: &mut Vec<String>,
    ) -> bool {
        let mut reader = JsonReader::new("responses request", json, errors);
        let mut mark = |name: &'static str, found: bool| {
            if found {
                explicit.apply(name, Explicit::Set);
            }
        };

        let input = reader.take_if("input", "string or array", |v| v.is_string() || v.is_array());
        if let Some(value) = input {
            if let Some((input, ok)) = Input::from_value(&value, reader.errors()) {
                self.input = input;
                reader.merge(ok);
            }
            mark("input", true);
        }
        if let Some(instructions) = reader.string("instructions") {
            self.instructions = instructions;
            mark("instructions", true);
        }
        if let Some(include) = reader.list::<WireValue<Include>>("include") {
            self.include = IncludeList::from(include);
            mark("include", true);
        }
        if let Some(reasoning) = reader.record("reasoning") {
            self.reasoning = reasoning;
            mark("reasoning", true);
        }
        if let Some(prompt) = reader.record("prompt") {
            self.prompt = prompt;
            mark("prompt", true);
        }
        match reader.take_if("conversation", "string or object", |v| v.is_string() || v.is_object()) {
            Some(Value::String(id)) => {
                self.conversation = Conversation::new(id);
                self.conversation_as_object = false;
                mark("conversation", true);
            }
            Some(Value::Object(object)) => {
                let (conversation, ok) = Conversation::from_json(&object, Some(reader.errors()));
                reader.merge(ok);
                self.conversation = conversation;
                self.conversation_as_object = true;
                mark("conversation", true);
            }
            _ => {}
        }
        if let Some(id) = reader.string("previous_response_id") {
            self.previous_response_id = id;
            mark("previous_response_id", true);
        }
        self.max_output_tokens = reader.u32("max_output_tokens");
        mark("max_output_tokens", self.max_output_tokens.is_some());
        self.temperature = reader.f64("temperature");
        mark("temperature", self.temperature.is_some());
        self.top_p = reader.f64("top_p");
        mark("top_p", self.top_p.is_some());
        self.store = reader.bool("store");
        mark("store", self.store.is_some());
        self.background = reader.bool("background");
        mark("background", self.background.is_some());
        self.truncation = reader.enumeration("truncation");
        mark("truncation", self.truncation.is_some());
        self.service_tier = reader.enumeration("service_tier");
        mark("service_tier", self.service_tier.is_some());
        if let Some(user) = reader.string("user") {
            self.user = user;
            mark("user", true);
        }
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        if let Some(input) = self.input.to_value(full) {
            json.insert("input".to_string(), input);
        }
        let mut writer = JsonWriter::new(json, full);
        writer.string("instructions", &self.instructions);
        writer.list("include", self.include.values());
        writer.record("reasoning", &self.reasoning);
        writer.record("prompt", &self.prompt);
        if self.conversation_as_object || !self.conversation.extra().is_empty() {
            writer.record("conversation", &self.conversation);
        } else {
            writer.string("conversation", self.conversation.id());
        }
        writer.string("previous_response_id", &self.previous_response_id);
        writer.optional("max_output_tokens", &self.max_output_tokens);
        writer.optional("temperature", &self.temperature);
        writer.optional("top_p", &self.top_p);
        writer.optional("store", &self.store);
        writer.optional("background", &self.background);
        writer.optional_enumeration("truncation", self.truncation);
        writer.optional_enumeration("service_tier", self.service_tier);
        writer.string("user", &self.user);
    }

    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Responses endpoint accessors on the request data.
impl RequestData<Params> {
    pub fn input(&self) -> &Input {
        &self.params.input
    }

    pub fn instructions(&self) -> &str {
        &self.params.instructions
    }

    pub fn include(&self) -> &IncludeList {
        &self.params.include
    }

    pub fn reasoning(&self) -> &Reasoning {
        &self.params.reasoning
    }

    pub fn prompt(&self) -> &Prompt {
        &self.params.prompt
    }

    pub fn conversation(&self) -> &Conversation {
        &self.params.conversation
    }

    pub fn previous_response_id(&self) -> &str {
        &self.params.previous_response_id
    }

    pub fn max_output_tokens(&self) -> Option<u32> {
        self.params.max_output_tokens
    }

    pub fn temperature(&self) -> Option<f64> {
        self.params.temperature
    }

    pub fn top_p(&self) -> Option<f64> {
        self.params.top_p
    }

    pub fn store(&self) -> Option<bool> {
        self.params.store
    }

    pub fn background(&self) -> Option<bool> {
        self.params.background
    }

    pub fn truncation(&self) -> Option<Truncation> {
        self.params.truncation
    }

    pub fn service_tier(&self) -> Option<ServiceTier> {
        self.params.service_tier
    }

    pub fn user(&self) -> &str {
        &self.params.user
    }

    setters!(set_input, set_input_with, reset_input, params.input: Input = Input::Empty, "input");
    setters!(set_instructions, set_instructions_with, reset_instructions, params.instructions: String = String::new(), "instructions");
    setters!(set_include, set_include_with, reset_include, params.include: IncludeList = IncludeList::new(), "include");
    setters!(set_reasoning, set_reasoning_with, reset_reasoning, params.reasoning: Reasoning = Reasoning::default(), "reasoning");
    setters!(set_prompt, set_prompt_with, reset_prompt, params.prompt: Prompt = Prompt::default(), "prompt");
    setters!(set_conversation, set_conversation_with, reset_conversation, params.conversation: Conversation = Conversation::default(), "conversation");
    setters!(set_previous_response_id, set_previous_response_id_with, reset_previous_response_id, params.previous_response_id: String = String::new(), "previous_response_id");
    setters!(set_max_output_tokens, set_max_output_tokens_with, reset_max_output_tokens, params.max_output_tokens: Option<u32> = None::<u32>, "max_output_tokens");
    setters!(set_temperature, set_temperature_with, reset_temperature, params.temperature: Option<f64> = None::<f64>, "temperature");
    setters!(set_top_p, set_top_p_with, reset_top_p, params.top_p: Option<f64> = None::<f64>, "top_p");
    setters!(set_store, set_store_with, reset_store, params.store: Option<bool> = None::<bool>, "store");
    setters!(set_background, set_background_with, reset_background, params.background: Option<bool> = None::<bool>, "background");
    setters!(set_truncation, set_truncation_with, reset_truncation, params.truncation: Option<Truncation> = None::<Truncation>, "truncation");
    setters!(set_service_tier, set_service_tier_with, reset_service_tier, params.service_tier: Option<ServiceTier> = None::<ServiceTier>, "service_tier");
    setters!(set_user, set_user_with, reset_user, params.user: String = String::new(), "user");
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputTokensDetails {
    pub cached_tokens: u32,
    extra: JsonObject,
}

impl JsonRecord for InputTokensDetails {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("input_tokens_details", json, errors);
        self.cached_tokens = reader.u32("cached_tokens").unwrap_or_default();
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        JsonWriter::new(json, full).number("cached_tokens", self.cached_tokens, 0);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.cached_tokens == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputTokensDetails {
    pub reasoning_tokens: u32,
    extra: JsonObject,
}

impl JsonRecord for OutputTokensDetails {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("output_tokens_details", json, errors);
        self.reasoning_tokens = reader.u32("reasoning_tokens").unwrap_or_default();
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        JsonWriter::new(json, full).number("reasoning_tokens", self.reasoning_tokens, 0);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.reasoning_tokens == 0
    }
}

/// Token accounting of a response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Usage {
    pub input_tokens: u32,
    pub input_tokens_details: InputTokensDetails,
    pub output_tokens: u32,
    pub output_tokens_details: OutputTokensDetails,
    pub total_tokens: u32,
    extra: JsonObject,
}

impl JsonRecord for Usage {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("usage", json, errors);
        self.input_tokens = reader.u32("input_tokens").unwrap_or_default();
        self.input_tokens_details = reader.record("input_tokens_details").unwrap_or_default();
        self.output_tokens = reader.u32("output_tokens").unwrap_or_default();
        self.output_tokens_details = reader.record("output_tokens_details").unwrap_or_default();
        self.total_tokens = reader.u32("total_tokens").unwrap_or_default();
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.number("input_tokens", self.input_tokens, 0);
        writer.record("input_tokens_details", &self.input_tokens_details);
        writer.number("output_tokens", self.output_tokens, 0);
        writer.record("output_tokens_details", &self.output_tokens_details);
        writer.number("total_tokens", self.total_tokens, 0);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.input_tokens == 0
            && self.output_tokens == 0
            && self.total_tokens == 0
            && self.input_tokens_details.is_empty()
            && self.output_tokens_details.is_empty()
    }
}

/// Why a response stopped short.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncompleteDetails {
    pub reason: String,
    extra: JsonObject,
}

impl JsonRecord for IncompleteDetails {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("incomplete_details", json, errors);
        self.reason = reader.string("reason").unwrap_or_default();
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        JsonWriter::new(json, full).string("reason", &self.reason);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.reason.is_empty()
    }
}

/// Body of a Responses endpoint reply: `{"object": "response", ...}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseObject {
    pub id: String,
    pub object: String,
    pub created_at: i64,
    pub status: Option<ResponseStatus>,
    pub model: String,
    pub output: OutputItemList,
    pub usage: Usage,
    pub incomplete_details: IncompleteDetails,
    pub instructions: String,
    pub previous_response_id: String,
    pub conversation: Conversation,
    pub reasoning: Reasoning,
    pub metadata: BTreeMap<String, String>,
    extra: JsonObject,
}

impl ResponseObject {
    /// Text of every `output_text` part across all output messages.
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .filter_map(OutputItem::as_message)
            .filter_map(|message| match message.content() {
                MessageContent::Parts(parts) => Some(parts),
                _ => None,
            })
            .flatten()
            .filter_map(|part| match part {
                ContentPart::OutputText(text) => Some(text.text.as_str()),
                _ => None,
            })
            .join("")
    }
}

impl JsonRecord for ResponseObject {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("response", json, errors);
        self.id = reader.string("id").unwrap_or_default();
        self.object = reader.string("object").unwrap_or_default();
        self.created_at = reader.i64("created_at").unwrap_or_default();
        self.status = reader.enumeration("status");
        self.model = reader.string("model").unwrap_or_default();
        self.output = reader.list("output").unwrap_or_default();
        self.usage = reader.record("usage").unwrap_or_default();
        self.incomplete_details = reader.record("incomplete_details").unwrap_or_default();
        self.instructions = reader.string("instructions").unwrap_or_default();
        self.previous_response_id = reader.string("previous_response_id").unwrap_or_default();
        self.conversation = reader.record("conversation").unwrap_or_default();
        self.reasoning = reader.record("reasoning").unwrap_or_default();
        self.metadata = reader.string_map("metadata").unwrap_or_default();
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.string("id", &self.id);
        writer.string("object", &self.object);
        writer.number("created_at", self.created_at, 0);
        writer.optional_enumeration("status", self.status);
        writer.string("model", &self.model);
        writer.list("output", &self.output);
        writer.record("usage", &self.usage);
        writer.record("incomplete_details", &self.incomplete_details);
        writer.string("instructions", &self.instructions);
        writer.string("previous_response_id", &self.previous_response_id);
        writer.record("conversation", &self.conversation);
        writer.record("reasoning", &self.reasoning);
        writer.string_map("metadata", &self.metadata);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.id.is_empty() && self.output.is_empty() && self.status.is_none()
    }

    fn is_valid(&self) -> bool {
        !self.id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InputItem, Message, ReasoningEffort};
    use serde_json::json;

    type Data = RequestData<Params>;

    #[test]
    fn test_request_body() {
        let mut data = Data::new();
        data.set_model("gpt-4o-mini");
        data.set_input(vec![InputItem::from(Message::user("Hello"))]);
        data.set_instructions("Be brief.");
        data.set_include(vec![Include::ReasoningEncryptedContent]);
        data.set_reasoning(Reasoning::new(ReasoningEffort::Low));
        data.set_max_output_tokens(256u32);
        data.set_temperature(0.5);
        data.set_truncation(Truncation::Auto);
        assert_eq!(
            Value::Object(data.to_json(false)),
            json!({
                "model": "gpt-4o-mini",
                "input": [{"type": "message", "role": "user", "content": "Hello"}],
                "instructions": "Be brief.",
                "include": ["reasoning.encrypted_content"],
                "reasoning": {"effort": "low"},
                "max_output_tokens": 256,
                "temperature": 0.5,
                "truncation": "auto"
            })
        );
    }

    #[test]
    fn test_optional_params_reset() {
        let mut data = Data::new();
        assert!(data.set_store(false));
        assert_eq!(data.to_json(false).get("store"), Some(&json!(false)));
        assert!(data.is_explicit("store"));
        assert!(data.reset_store());
        assert!(!data.is_explicit("store"));
        assert!(data.to_json(false).get("store").is_none());
        assert_eq!(data.to_json(true).get("store"), Some(&Value::Null));
    }

    #[test]
    fn test_read_request_marks_explicit() {
        let json = json!({
            "model": "gpt-4o",
            "input": "Say hi",
            "service_tier": "flex",
            "top_p": 0.9,
            "tools": [{"type": "web_search"}]
        });
        let (data, ok) = Data::from_json(json.as_object().unwrap(), None);
        assert!(ok);
        assert_eq!(data.input(), &Input::from("Say hi"));
        assert_eq!(data.service_tier(), Some(ServiceTier::Flex));
        assert!(data.is_explicit("input"));
        assert!(data.is_explicit("top_p"));
        assert!(!data.is_explicit("temperature"));
        assert_eq!(data.extra().get("tools"), Some(&json!([{"type": "web_search"}])));
        assert_eq!(Value::Object(data.to_json(false)), json);
    }

    #[test]
    fn test_conversation_keeps_its_shape() {
        let as_id = json!({"conversation": "conv_1"});
        let (data, _) = Data::from_json(as_id.as_object().unwrap(), None);
        assert_eq!(data.conversation().id(), "conv_1");
        assert_eq!(Value::Object(data.to_json(false)), as_id);

        let as_object = json!({"conversation": {"id": "conv_2", "type": "conversation"}});
        let (data, _) = Data::from_json(as_object.as_object().unwrap(), None);
        assert_eq!(data.conversation().id(), "conv_2");
        assert_eq!(Value::Object(data.to_json(false)), as_object);
    }

    #[test]
    fn test_unknown_include_values_survive() {
        let json = json!({"include": ["reasoning.encrypted_content", "future.thing"]});
        let (data, ok) = Data::from_json(json.as_object().unwrap(), None);
        assert!(ok);
        assert_eq!(data.include().len(), 2);
        assert!(data.include().contains(Include::ReasoningEncryptedContent));
        assert_eq!(Value::Object(data.to_json(false)), json);
    }

    #[test]
    fn test_bad_input_stays_in_extra() {
        let json = json!({"input": 42});
        let mut errors = Vec::new();
        let (data, ok) = Data::from_json(json.as_object().unwrap(), Some(&mut errors));
        assert!(!ok);
        assert_eq!(data.input(), &Input::Empty);
        assert!(!data.is_explicit("input"));
        assert_eq!(data.extra().get("input"), Some(&json!(42)));
    }

    #[test]
    fn test_response_body() {
        let json = json!({
            "id": "resp_1",
            "object": "response",
            "created_at": 1741476542,
            "status": "completed",
            "model": "gpt-4o-2024-08-06",
            "output": [
                {"type": "message", "id": "msg_1", "status": "completed", "role": "assistant",
                 "content": [
                     {"type": "output_text", "text": "Hello ", "annotations": []},
                     {"type": "output_text", "text": "there.", "annotations": []}
                 ]}
            ],
            "usage": {
                "input_tokens": 36,
                "input_tokens_details": {"cached_tokens": 0},
                "output_tokens": 87,
                "output_tokens_details": {"reasoning_tokens": 12},
                "total_tokens": 123
            },
            "parallel_tool_calls": true
        });
        let (body, ok) = ResponseObject::from_json(json.as_object().unwrap(), None);
        assert!(ok);
        assert!(body.is_valid());
        assert_eq!(body.status, Some(ResponseStatus::Completed));
        assert_eq!(body.output_text(), "Hello there.");
        assert_eq!(body.usage.output_tokens_details.reasoning_tokens, 12);
        assert_eq!(body.extra().get("parallel_tool_calls"), Some(&json!(true)));
    }

    #[test]
    fn test_unknown_status_survives() {
        let json = json!({"id": "resp_2", "status": "paused"});
        let (body, ok) = ResponseObject::from_json(json.as_object().unwrap(), None);
        assert!(ok);
        assert_eq!(body.status, None);
        assert_eq!(Value::Object(body.to_json(false)), json);
    }
}
