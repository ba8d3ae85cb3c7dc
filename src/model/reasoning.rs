use crate::json::{wire_enum, JsonObject, JsonReader, JsonRecord, JsonWriter};

wire_enum! {
    /// How much effort a reasoning model spends before answering.
    pub enum ReasoningEffort fallback Medium {
        Minimal => "minimal",
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

wire_enum! {
    /// Level of detail of the reasoning summary.
    pub enum ReasoningSummary fallback Auto {
        Auto => "auto",
        Concise => "concise",
        Detailed => "detailed",
    }
}

/// Reasoning configuration for reasoning-capable models.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reasoning {
    effort: Option<ReasoningEffort>,
    summary: Option<ReasoningSummary>,
    extra: JsonObject,
}

impl Reasoning {
    pub fn new(effort: ReasoningEffort) -> Self {
        Self {
            effort: Some(effort),
            ..Self::default()
        }
    }

    pub fn effort(&self) -> Option<ReasoningEffort> {
        self.effort
    }

    pub fn set_effort(&mut self, effort: Option<ReasoningEffort>) -> bool {
        let changed = self.effort != effort;
        self.effort = effort;
        changed
    }

    pub fn summary(&self) -> Option<ReasoningSummary> {
        self.summary
    }

    pub fn set_summary(&mut self, summary: Option<ReasoningSummary>) -> bool {
        let changed = self.summary != summary;
        self.summary = summary;
        changed
    }
}

impl JsonRecord for Reasoning {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("reasoning", json, errors);
        self.effort = reader.enumeration("effort");
        self.summary = reader.enumeration("summary");
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.optional_enumeration("effort", self.effort);
        writer.optional_enumeration("summary", self.summary);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.effort.is_none() && self.summary.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::WireEnum;
    use serde_json::{json, Value};

    #[test]
    fn test_enum_tables() {
        for effort in ReasoningEffort::VARIANTS {
            assert_eq!(ReasoningEffort::parse(effort.as_str()), *effort);
        }
        for summary in ReasoningSummary::VARIANTS {
            assert_eq!(ReasoningSummary::parse(summary.as_str()), *summary);
        }
        assert_eq!(ReasoningEffort::parse("extreme"), ReasoningEffort::Medium);
        assert_eq!(ReasoningSummary::parse("verbose"), ReasoningSummary::Auto);
    }

    #[test]
    fn test_unknown_effort_survives_round_trip() {
        let json = json!({"effort": "extreme", "summary": "concise"});
        let (reasoning, ok) = Reasoning::from_json(json.as_object().unwrap(), None);
        assert!(ok);
        assert_eq!(reasoning.effort(), None);
        assert_eq!(reasoning.summary(), Some(ReasoningSummary::Concise));
        assert_eq!(Value::Object(reasoning.to_json(false)), json);
    }

    #[test]
    fn test_null_summary_from_response() {
        let json = json!({"effort": "high", "summary": null});
        let (reasoning, ok) = Reasoning::from_json(json.as_object().unwrap(), None);
        assert!(ok);
        assert_eq!(reasoning.effort(), Some(ReasoningEffort::High));
        assert_eq!(Value::Object(reasoning.to_json(false)), json!({"effort": "high"}));
    }
}
