//! JSON record plumbing shared by every value object.
//!
//! A record decodes by *consuming* the keys it recognises from a mutable
//! object. Whatever is left once every layer had its turn becomes the record's
//! extra bag, so keys this crate does not know about survive a round trip.
//!
//! Field problems never abort decoding. They are appended to an error list and
//! flip the returned `ok` flag; the caller decides whether a partially decoded
//! record is good enough.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

/// A decoded JSON object.
pub type JsonObject = Map<String, Value>;

/// Returned by `FromStr` on wire enums for strings outside the lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// A closed enumeration with a bidirectional string lookup table.
pub trait WireEnum: Sized + Copy + 'static {
    /// Name used in diagnostics.
    const NAME: &'static str;

    /// Every variant, in table order.
    const VARIANTS: &'static [Self];

    /// Canonical wire string.
    fn as_str(&self) -> &'static str;

    /// Strict lookup, `None` for unknown strings.
    fn from_wire(s: &str) -> Option<Self>;
}

/// Declares a wire enum: the enum itself, its lookup table, a `Default` equal
/// to the fallback variant, lossy `parse`, `Display` and `FromStr`.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident fallback $fallback:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$fallback
            }
        }

        impl $crate::json::WireEnum for $name {
            const NAME: &'static str = stringify!($name);
            const VARIANTS: &'static [Self] = &[ $( Self::$variant ),+ ];

            fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $wire ),+
                }
            }

            fn from_wire(s: &str) -> Option<Self> {
                match s {
                    $( $wire => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl $name {
            /// Lossy lookup: unknown strings map to the fallback variant.
            pub fn parse(s: &str) -> Self {
                <Self as $crate::json::WireEnum>::from_wire(s).unwrap_or_default()
            }

            /// Canonical wire string.
            pub fn as_str(&self) -> &'static str {
                <Self as $crate::json::WireEnum>::as_str(self)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::json::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as $crate::json::WireEnum>::from_wire(s).ok_or_else(|| {
                    $crate::json::UnknownVariant {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }
                })
            }
        }
    };
}

pub(crate) use wire_enum;

/// A typed, partially sparse JSON record with an extra bag.
pub trait JsonRecord: Default {
    /// Consume recognised keys from `json`. Returns `false` when any field had
    /// the wrong shape.
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool;

    /// Write known fields into `json`. Defaults are skipped unless `full`.
    fn write_json(&self, json: &mut JsonObject, full: bool);

    fn extra(&self) -> &JsonObject;

    fn extra_mut(&mut self) -> &mut JsonObject;

    /// No known field is set.
    fn is_empty(&self) -> bool;

    /// The minimum set of fields is present.
    fn is_valid(&self) -> bool {
        !self.is_empty()
    }

    /// Encode known fields over the extra bag.
    ///
    /// Set fields replace extra keys of the same name. Defaults written in
    /// full mode only fill keys the extra bag does not hold, so a raw value
    /// that failed to decode is written back unchanged.
    fn to_json(&self, full: bool) -> JsonObject {
        let mut json = self.extra().clone();
        self.write_json(&mut json, full);
        json
    }

    /// Decode from an object. Unrecognised keys end up in the extra bag.
    fn from_json(json: &JsonObject, errors: Option<&mut Vec<String>>) -> (Self, bool) {
        let mut scratch = Vec::new();
        let errors = match errors {
            Some(errors) => errors,
            None => &mut scratch,
        };
        let mut rest = json.clone();
        let mut value = Self::default();
        let ok = value.read_json(&mut rest, errors);
        value.extra_mut().extend(rest);
        (value, ok)
    }
}

/// Something that can sit in a JSON array.
pub trait JsonElement: Sized {
    /// `None` rejects the element; the reason is pushed to `errors`.
    fn from_value(value: &Value, errors: &mut Vec<String>) -> Option<Self>;

    fn to_value(&self, full: bool) -> Value;
}

impl<T: JsonRecord> JsonElement for T {
    fn from_value(value: &Value, errors: &mut Vec<String>) -> Option<Self> {
        let Some(object) = value.as_object() else {
            errors.push(format!("expected object, got {}", value));
            return None;
        };
        let (record, _) = T::from_json(object, Some(errors));
        Some(record)
    }

    fn to_value(&self, full: bool) -> Value {
        Value::Object(self.to_json(full))
    }
}

impl JsonElement for String {
    fn from_value(value: &Value, errors: &mut Vec<String>) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            other => {
                errors.push(format!("expected string, got {}", other));
                None
            }
        }
    }

    fn to_value(&self, _full: bool) -> Value {
        Value::String(self.clone())
    }
}

/// A list of strings, decoded element-wise.
pub type StringList = Vec<String>;

/// Decode an array element-wise. Failing elements are skipped; the others
/// survive. The flag is `false` when anything was skipped or reported.
pub fn read_list<T: JsonElement>(values: &[Value], errors: &mut Vec<String>) -> (Vec<T>, bool) {
    let before = errors.len();
    let items = values
        .iter()
        .filter_map(|value| T::from_value(value, errors))
        .collect();
    (items, errors.len() == before)
}

/// Encode a list by concatenating per-element encodings.
pub fn write_list<T: JsonElement>(items: &[T], full: bool) -> Vec<Value> {
    items.iter().map(|item| item.to_value(full)).collect()
}

/// A list element that is a known wire enum or any other value.
///
/// Unknown strings are a normal part of an evolving API; they are kept as
/// `Other` and written back verbatim instead of being dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue<T> {
    Known(T),
    Other(Value),
}

impl<T: WireEnum> WireValue<T> {
    pub fn known(&self) -> Option<T> {
        match self {
            WireValue::Known(value) => Some(*value),
            WireValue::Other(_) => None,
        }
    }
}

impl<T> From<T> for WireValue<T> {
    fn from(value: T) -> Self {
        WireValue::Known(value)
    }
}

impl<T: WireEnum> JsonElement for WireValue<T> {
    /// Unknown strings are kept silently. Other shapes are kept too, but
    /// reported.
    fn from_value(value: &Value, errors: &mut Vec<String>) -> Option<Self> {
        match value.as_str() {
            Some(s) => Some(T::from_wire(s).map_or_else(|| WireValue::Other(value.clone()), WireValue::Known)),
            None => {
                errors.push(format!("{}: expected string, got {}", T::NAME, value));
                Some(WireValue::Other(value.clone()))
            }
        }
    }

    fn to_value(&self, _full: bool) -> Value {
        match self {
            WireValue::Known(value) => Value::String(value.as_str().to_string()),
            WireValue::Other(value) => value.clone(),
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Consumes typed fields from an object.
///
/// Values of the wrong shape are left in place so they end up in the extra
/// bag, and a message is recorded. `null` counts as absent.
pub struct JsonReader<'a> {
    context: &'static str,
    json: &'a mut JsonObject,
    errors: &'a mut Vec<String>,
    ok: bool,
}

impl<'a> JsonReader<'a> {
    pub fn new(context: &'static str, json: &'a mut JsonObject, errors: &'a mut Vec<String>) -> Self {
        Self {
            context,
            json,
            errors,
            ok: true,
        }
    }

    /// Record a failure for this record.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.errors.push(format!("{}: {}", self.context, message.into()));
        self.ok = false;
    }

    fn mismatch(&mut self, key: &str, expected: &str) {
        let got = self.json.get(key).map_or("nothing", describe);
        self.fail(format!("\"{}\" expected {}, got {}", key, expected, got));
    }

    /// Take the value under `key` if `accept` likes it. Values `accept`
    /// rejects stay in the object and are reported as `expected`.
    pub fn take_if(&mut self, key: &str, expected: &str, accept: impl Fn(&Value) -> bool) -> Option<Value> {
        match self.json.get(key) {
            None => None,
            Some(Value::Null) => {
                self.json.remove(key);
                None
            }
            Some(value) if accept(value) => self.json.remove(key),
            Some(_) => {
                self.mismatch(key, expected);
                None
            }
        }
    }

    /// Validate the `"type"` discriminator when present and consume it.
    pub fn check_type(&mut self, expected: &str) -> bool {
        match self.json.get("type") {
            None => true,
            Some(Value::String(s)) if s == expected => {
                self.json.remove("type");
                true
            }
            Some(other) => {
                let other = other.clone();
                self.fail(format!("expected type \"{}\", got {}", expected, other));
                false
            }
        }
    }

    /// Take any value.
    pub fn raw(&mut self, key: &str) -> Option<Value> {
        self.take_if(key, "any", |_| true)
    }

    pub fn string(&mut self, key: &str) -> Option<String> {
        match self.take_if(key, "string", Value::is_string)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn bool(&mut self, key: &str) -> Option<bool> {
        self.take_if(key, "bool", Value::is_boolean)?.as_bool()
    }

    pub fn i64(&mut self, key: &str) -> Option<i64> {
        self.take_if(key, "integer", Value::is_i64)?.as_i64()
    }

    pub fn u32(&mut self, key: &str) -> Option<u32> {
        let accept = |v: &Value| v.as_u64().is_some_and(|n| u32::try_from(n).is_ok());
        self.take_if(key, "unsigned integer", accept)?
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
    }

    pub fn f64(&mut self, key: &str) -> Option<f64> {
        self.take_if(key, "number", Value::is_number)?.as_f64()
    }

    pub fn object(&mut self, key: &str) -> Option<JsonObject> {
        match self.take_if(key, "object", Value::is_object)? {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn array(&mut self, key: &str) -> Option<Vec<Value>> {
        match self.take_if(key, "array", Value::is_array)? {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Take a wire enum. Unknown strings are left in place (so they survive in
    /// the extra bag) and yield `None`; callers fall back to the default.
    pub fn enumeration<T: WireEnum>(&mut self, key: &str) -> Option<T> {
        let s = match self.json.get(key) {
            None => return None,
            Some(Value::Null) => {
                self.json.remove(key);
                return None;
            }
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                self.mismatch(key, "string");
                return None;
            }
        };
        let parsed = T::from_wire(&s)?;
        self.json.remove(key);
        Some(parsed)
    }

    /// Take a nested record.
    pub fn record<T: JsonRecord>(&mut self, key: &str) -> Option<T> {
        let object = self.object(key)?;
        let (record, ok) = T::from_json(&object, Some(&mut *self.errors));
        self.ok &= ok;
        Some(record)
    }

    /// Take an array decoded element-wise.
    pub fn list<T: JsonElement>(&mut self, key: &str) -> Option<Vec<T>> {
        let values = self.array(key)?;
        let (items, ok) = read_list(&values, &mut *self.errors);
        self.ok &= ok;
        Some(items)
    }

    /// Take a string-to-string map.
    pub fn string_map(&mut self, key: &str) -> Option<BTreeMap<String, String>> {
        let accept = |v: &Value| v.as_object().is_some_and(|o| o.values().all(Value::is_string));
        match self.take_if(key, "object of strings", accept)? {
            Value::Object(object) => Some(
                object
                    .into_iter()
                    .filter_map(|(k, v)| match v {
                        Value::String(s) => Some((k, s)),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Access to the error list for decoders that hand-roll a field.
    pub fn errors(&mut self) -> &mut Vec<String> {
        &mut *self.errors
    }

    /// Fold a nested decode result into this record's flag.
    pub fn merge(&mut self, ok: bool) {
        self.ok &= ok;
    }

    pub fn finish(self) -> bool {
        self.ok
    }
}

/// Writes typed fields into an object, skipping defaults unless `full`.
///
/// Set values always replace what the object holds. Defaults written in full
/// mode go through [`fill`](Self::fill) and never replace an existing key.
pub struct JsonWriter<'a> {
    json: &'a mut JsonObject,
    full: bool,
}

impl<'a> JsonWriter<'a> {
    pub fn new(json: &'a mut JsonObject, full: bool) -> Self {
        Self { json, full }
    }

    pub fn full(&self) -> bool {
        self.full
    }

    /// Inject the `"type"` discriminator.
    pub fn tag(&mut self, ty: &str) {
        self.json.insert("type".to_string(), Value::String(ty.to_string()));
    }

    pub fn raw(&mut self, key: &str, value: Value) {
        self.json.insert(key.to_string(), value);
    }

    /// Write `value` only if the object has no `key` yet.
    pub fn fill(&mut self, key: &str, value: Value) {
        self.json.entry(key.to_string()).or_insert(value);
    }

    fn put(&mut self, key: &str, value: Value, is_default: bool) {
        if !is_default {
            self.raw(key, value);
        } else if self.full {
            self.fill(key, value);
        }
    }

    pub fn string(&mut self, key: &str, value: &str) {
        self.put(key, Value::String(value.to_string()), value.is_empty());
    }

    /// A string the wire format always carries, even when empty.
    pub fn required_string(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            self.fill(key, Value::String(String::new()));
        } else {
            self.raw(key, Value::String(value.to_string()));
        }
    }

    pub fn bool(&mut self, key: &str, value: bool, default: bool) {
        self.put(key, Value::Bool(value), value == default);
    }

    pub fn number<T: Into<Value> + PartialEq + Copy>(&mut self, key: &str, value: T, default: T) {
        self.put(key, value.into(), value == default);
    }

    /// `Some` is always written; `None` only as `null` in full mode.
    pub fn optional<T: Into<Value> + Clone>(&mut self, key: &str, value: &Option<T>) {
        match value {
            Some(v) => self.raw(key, v.clone().into()),
            None => self.put(key, Value::Null, true),
        }
    }

    pub fn enumeration<T: WireEnum + PartialEq>(&mut self, key: &str, value: T, default: T) {
        self.put(key, Value::String(value.as_str().to_string()), value == default);
    }

    pub fn optional_enumeration<T: WireEnum>(&mut self, key: &str, value: Option<T>) {
        match value {
            Some(v) => self.raw(key, Value::String(v.as_str().to_string())),
            None => self.put(key, Value::Null, true),
        }
    }

    pub fn record<T: JsonRecord>(&mut self, key: &str, value: &T) {
        let is_default = value.is_empty() && value.extra().is_empty();
        self.put(key, Value::Object(value.to_json(self.full)), is_default);
    }

    pub fn list<T: JsonElement>(&mut self, key: &str, items: &[T]) {
        self.put(key, Value::Array(write_list(items, self.full)), items.is_empty());
    }

    pub fn object(&mut self, key: &str, value: &JsonObject) {
        self.put(key, Value::Object(value.clone()), value.is_empty());
    }

    pub fn string_map(&mut self, key: &str, map: &BTreeMap<String, String>) {
        if self.full || !map.is_empty() {
            let object = map
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            self.put(key, Value::Object(object), map.is_empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    wire_enum! {
        enum Flavour fallback Plain {
            Plain => "plain",
            Spicy => "spicy",
        }
    }

    fn object(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_wire_enum_lookup() {
        for variant in Flavour::VARIANTS {
            assert_eq!(Flavour::parse(variant.as_str()), *variant);
        }
        assert_eq!(Flavour::parse("sweet"), Flavour::Plain);
        assert!("sweet".parse::<Flavour>().is_err());
        assert_eq!("spicy".parse::<Flavour>(), Ok(Flavour::Spicy));
        assert_eq!(Flavour::Spicy.to_string(), "spicy");
    }

    #[test]
    fn test_reader_consumes_known_keys() {
        let mut json = object(json!({"name": "a", "count": 3, "other": true}));
        let mut errors = Vec::new();
        let mut reader = JsonReader::new("test", &mut json, &mut errors);
        assert_eq!(reader.string("name"), Some("a".to_string()));
        assert_eq!(reader.u32("count"), Some(3));
        assert!(reader.finish());
        assert_eq!(json, object(json!({"other": true})));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_reader_leaves_mismatched_values() {
        let mut json = object(json!({"name": 5, "flag": null}));
        let mut errors = Vec::new();
        let mut reader = JsonReader::new("test", &mut json, &mut errors);
        assert_eq!(reader.string("name"), None);
        assert_eq!(reader.bool("flag"), None);
        assert!(!reader.finish());
        assert_eq!(json, object(json!({"name": 5})));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("\"name\""));
    }

    #[test]
    fn test_reader_unknown_enum_stays_in_object() {
        let mut json = object(json!({"flavour": "sweet", "other": "spicy"}));
        let mut errors = Vec::new();
        let mut reader = JsonReader::new("test", &mut json, &mut errors);
        assert_eq!(reader.enumeration::<Flavour>("flavour"), None);
        assert_eq!(reader.enumeration::<Flavour>("other"), Some(Flavour::Spicy));
        assert!(reader.finish());
        assert_eq!(json, object(json!({"flavour": "sweet"})));
    }

    #[test]
    fn test_check_type() {
        let mut json = object(json!({"type": "message"}));
        let mut errors = Vec::new();
        let mut reader = JsonReader::new("test", &mut json, &mut errors);
        assert!(!reader.check_type("conversation"));
        assert!(reader.check_type("message"));
        assert!(!reader.finish());
        assert!(json.is_empty());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_read_list_tolerates_bad_elements() {
        let values = vec![json!("a"), json!(1), json!("b")];
        let mut errors = Vec::new();
        let (items, ok): (StringList, bool) = read_list(&values, &mut errors);
        assert_eq!(items, vec!["a".to_string(), "b".to_string()]);
        assert!(!ok);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_writer_skips_defaults_unless_full() {
        let mut json = JsonObject::new();
        let mut writer = JsonWriter::new(&mut json, false);
        writer.string("empty", "");
        writer.number("n", 1u32, 1u32);
        writer.optional::<f64>("t", &None);
        writer.enumeration("f", Flavour::Plain, Flavour::Plain);
        assert!(json.is_empty());

        let mut writer = JsonWriter::new(&mut json, true);
        writer.string("empty", "");
        writer.number("n", 1u32, 1u32);
        writer.optional::<f64>("t", &None);
        writer.enumeration("f", Flavour::Plain, Flavour::Plain);
        assert_eq!(
            Value::Object(json),
            json!({"empty": "", "n": 1, "t": null, "f": "plain"})
        );
    }

    #[test]
    fn test_writer_set_values_replace_defaults_fill() {
        let mut json = object(json!({"id": "extra", "f": "sweet", "foo": "bar"}));
        let mut writer = JsonWriter::new(&mut json, true);
        writer.string("id", "known");
        writer.enumeration("f", Flavour::Plain, Flavour::Plain);
        writer.string("name", "");
        assert_eq!(
            Value::Object(json),
            json!({"id": "known", "f": "sweet", "foo": "bar", "name": ""})
        );
    }

    #[test]
    fn test_wire_value_keeps_unknown_strings() {
        let values = vec![json!("spicy"), json!("sweet"), json!(3)];
        let mut errors = Vec::new();
        let (items, ok): (Vec<WireValue<Flavour>>, bool) = read_list(&values, &mut errors);
        assert!(!ok);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            items,
            vec![
                WireValue::Known(Flavour::Spicy),
                WireValue::Other(json!("sweet")),
                WireValue::Other(json!(3)),
            ]
        );
        assert_eq!(items[0].known(), Some(Flavour::Spicy));
        assert_eq!(items[1].known(), None);
        assert_eq!(write_list(&items, false), values);
    }
}
