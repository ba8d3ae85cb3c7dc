use crate::json::{wire_enum, WireValue};

wire_enum! {
    /// Additional output data to include in a response.
    pub enum Include fallback MessageOutputTextLogprobs {
        WebSearchCallResults => "web_search_call.results",
        WebSearchCallActionSources => "web_search_call.action.sources",
        CodeInterpreterCallOutputs => "code_interpreter_call.outputs",
        ComputerCallOutputImageUrl => "computer_call_output.output.image_url",
        FileSearchCallResults => "file_search_call.results",
        MessageInputImageUrl => "message.input_image.image_url",
        MessageOutputTextLogprobs => "message.output_text.logprobs",
        ReasoningEncryptedContent => "reasoning.encrypted_content",
    }
}

/// The `include` parameter. Values this crate does not know are kept in
/// order next to the known ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncludeList(Vec<WireValue<Include>>);

impl IncludeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, include: impl Into<WireValue<Include>>) {
        self.0.push(include.into());
    }

    pub fn contains(&self, include: Include) -> bool {
        self.known().any(|known| known == include)
    }

    /// The known values, skipping unknown ones.
    pub fn known(&self) -> impl Iterator<Item = Include> + '_ {
        self.0.iter().filter_map(WireValue::known)
    }

    pub fn values(&self) -> &[WireValue<Include>] {
        &self.0
    }
}

impl From<Vec<Include>> for IncludeList {
    fn from(values: Vec<Include>) -> Self {
        values.into_iter().collect()
    }
}

impl From<Vec<WireValue<Include>>> for IncludeList {
    fn from(values: Vec<WireValue<Include>>) -> Self {
        Self(values)
    }
}

impl FromIterator<Include> for IncludeList {
    fn from_iter<I: IntoIterator<Item = Include>>(iter: I) -> Self {
        Self(iter.into_iter().map(WireValue::Known).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::{read_list, write_list, WireEnum};
    use serde_json::json;

    #[test]
    fn test_include_table() {
        for include in Include::VARIANTS {
            assert_eq!(Include::parse(include.as_str()), *include);
        }
    }

    #[test]
    fn test_include_list_keeps_unknown_entries() {
        let values = json!(["reasoning.encrypted_content", "future.thing", "file_search_call.results"]);
        let values = values.as_array().unwrap();
        let mut errors = Vec::new();
        let (items, ok) = read_list::<WireValue<Include>>(values, &mut errors);
        assert!(ok, "{:?}", errors);
        let list = IncludeList::from(items);
        assert_eq!(list.len(), 3);
        assert!(list.contains(Include::FileSearchCallResults));
        assert_eq!(
            list.known().collect::<Vec<_>>(),
            vec![Include::ReasoningEncryptedContent, Include::FileSearchCallResults]
        );
        assert_eq!(&write_list(list.values(), false), values);
    }
}
