use crate::json::{JsonObject, JsonReader, JsonRecord, JsonWriter};

/// One generated image: base64 data or a temporary URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageResponseData {
    b64_json: String,
    url: String,
    revised_prompt: String,
    extra: JsonObject,
}

impl ImageResponseData {
    pub fn b64_json(&self) -> &str {
        &self.b64_json
    }

    pub fn set_b64_json(&mut self, b64_json: impl Into<String>) -> bool {
        let b64_json = b64_json.into();
        let changed = self.b64_json != b64_json;
        self.b64_json = b64_json;
        changed
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        let changed = self.url != url;
        self.url = url;
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

impl JsonRecord for ImageResponseData {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("image", json, errors);
        if let Some(b64_json) = reader.string("b64_json") {
            self.b64_json = b64_json;
        }
        if let Some(url) = reader.string("url") {
            self.url = url;
        }
        if let Some(revised_prompt) = reader.string("revised_prompt") {
            self.revised_prompt = revised_prompt;
        }
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.string("b64_json", &self.b64_json);
        writer.string("url", &self.url);
        writer.string("revised_prompt", &self.revised_prompt);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.b64_json.is_empty() && self.url.is_empty() && self.revised_prompt.is_empty()
    }

    fn is_valid(&self) -> bool {
        !self.b64_json.is_empty() || !self.url.is_empty()
    }
}

/// Breakdown of image input tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageTokenDetails {
    pub image_tokens: u32,
    pub text_tokens: u32,
    extra: JsonObject,
}

impl JsonRecord for ImageTokenDetails {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("input_tokens_details", json, errors);
        self.image_tokens = reader.u32("image_tokens").unwrap_or_default();
        self.text_tokens = reader.u32("text_tokens").unwrap_or_default();
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.number("image_tokens", self.image_tokens, 0);
        writer.number("text_tokens", self.text_tokens, 0);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.image_tokens == 0 && self.text_tokens == 0
    }
}

/// Token accounting of an image generation (GPT image models only).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
    pub input_tokens_details: ImageTokenDetails,
    extra: JsonObject,
}

impl JsonRecord for ImageUsage {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("usage", json, errors);
        self.input_tokens = reader.u32("input_tokens").unwrap_or_default();
        self.output_tokens = reader.u32("output_tokens").unwrap_or_default();
        self.total_tokens = reader.u32("total_tokens").unwrap_or_default();
        self.input_tokens_details = reader.record("input_tokens_details").unwrap_or_default();
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.number("input_tokens", self.input_tokens, 0);
        writer.number("output_tokens", self.output_tokens, 0);
        writer.number("total_tokens", self.total_tokens, 0);
        writer.record("input_tokens_details", &self.input_tokens_details);
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
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_usage_round_trip() {
        let json = json!({
            "total_tokens": 100,
            "input_tokens": 50,
            "output_tokens": 50,
            "input_tokens_details": {"text_tokens": 10, "image_tokens": 40}
        });
        let (usage, ok) = ImageUsage::from_json(json.as_object().unwrap(), None);
        assert!(ok);
        assert_eq!(usage.input_tokens_details.image_tokens, 40);
        assert_eq!(Value::Object(usage.to_json(false)), json);
    }

    #[test]
    fn test_usage_rejects_negative_counts() {
        let json = json!({"input_tokens": -1, "output_tokens": 3});
        let mut errors = Vec::new();
        let (usage, ok) = ImageUsage::from_json(json.as_object().unwrap(), Some(&mut errors));
        assert!(!ok);
        assert_eq!(usage.output_tokens, 3);
        assert_eq!(usage.extra().get("input_tokens"), Some(&json!(-1)));
    }

    #[test]
    fn test_image_data_validity() {
        let json = json!({"url": "https://example.com/a.png", "revised_prompt": "a cat"});
        let (image, ok) = ImageResponseData::from_json(json.as_object().unwrap(), None);
        assert!(ok);
        assert!(image.is_valid());
        assert_eq!(image.revised_prompt(), "a cat");
        assert!(!ImageResponseData::default().is_valid());
    }
}
