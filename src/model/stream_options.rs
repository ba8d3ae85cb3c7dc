use crate::json::{JsonObject, JsonReader, JsonRecord, JsonWriter};

/// Options for streamed responses. Only meaningful when streaming.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamOptions {
    include_obfuscation: bool,
    extra: JsonObject,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            include_obfuscation: true,
            extra: JsonObject::new(),
        }
    }
}

impl StreamOptions {
    pub fn include_obfuscation(&self) -> bool {
        self.include_obfuscation
    }

    pub fn set_include_obfuscation(&mut self, include_obfuscation: bool) -> bool {
        let changed = self.include_obfuscation != include_obfuscation;
        self.include_obfuscation = include_obfuscation;
        changed
    }
}

impl JsonRecord for StreamOptions {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("stream_options", json, errors);
        if let Some(include_obfuscation) = reader.bool("include_obfuscation") {
            self.include_obfuscation = include_obfuscation;
        }
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        JsonWriter::new(json, full).bool("include_obfuscation", self.include_obfuscation, true);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.include_obfuscation
    }

    // No required fields; the default is a valid configuration.
    fn is_valid(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_default_is_empty_and_valid() {
        let options = StreamOptions::default();
        assert!(options.is_empty());
        assert!(options.is_valid());
        assert!(options.to_json(false).is_empty());
        assert_eq!(
            Value::Object(options.to_json(true)),
            json!({"include_obfuscation": true})
        );
    }

    #[test]
    fn test_disable_obfuscation() {
        let mut options = StreamOptions::default();
        assert!(options.set_include_obfuscation(false));
        assert!(!options.set_include_obfuscation(false));
        assert_eq!(
            Value::Object(options.to_json(false)),
            json!({"include_obfuscation": false})
        );
    }
}
