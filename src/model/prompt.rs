use crate::json::{JsonObject, JsonReader, JsonRecord, JsonWriter};

/// Reference to a stored prompt template and its variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prompt {
    id: String,
    version: String,
    variables: JsonObject,
    extra: JsonObject,
}

impl Prompt {
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

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn set_version(&mut self, version: impl Into<String>) -> bool {
        let version = version.into();
        let changed = self.version != version;
        self.version = version;
        changed
    }

    /// Substitution values; strings or input content objects.
    pub fn variables(&self) -> &JsonObject {
        &self.variables
    }

    pub fn set_variables(&mut self, variables: JsonObject) -> bool {
        let changed = self.variables != variables;
        self.variables = variables;
        changed
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> bool {
        let value = value.into();
        let name = name.into();
        if self.variables.get(&name) == Some(&value) {
            return false;
        }
        self.variables.insert(name, value);
        true
    }
}

impl JsonRecord for Prompt {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("prompt", json, errors);
        if let Some(id) = reader.string("id") {
            self.id = id;
        }
        if let Some(version) = reader.string("version") {
            self.version = version;
        }
        if let Some(variables) = reader.object("variables") {
            self.variables = variables;
        }
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.string("id", &self.id);
        writer.string("version", &self.version);
        writer.object("variables", &self.variables);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.id.is_empty() && self.version.is_empty() && self.variables.is_empty()
    }

    fn is_valid(&self) -> bool {
        !self.id.is_empty()
    }
}
