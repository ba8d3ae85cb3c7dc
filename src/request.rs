//! Request data with explicit-attribute tracking, and the request facade.
//!
//! Every attribute remembers whether the caller set it on purpose. A
//! [`Client`](crate::client::Client) only fills in attributes that are not
//! explicit, so "the caller asked for the default" and "the caller never
//! mentioned this" stay distinguishable.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Deref;

use tracing::warn;

use crate::api::Endpoint;
use crate::json::{JsonObject, JsonReader, JsonRecord, JsonWriter};
use crate::model::StreamOptions;
use crate::options::SecretString;

/// Names of the generic attributes in an [`ExplicitSet`].
pub mod attr {
    pub const ID: &str = "id";
    pub const API_KEY: &str = "api_key";
    pub const URL: &str = "url";
    pub const METADATA: &str = "metadata";
    pub const MODEL: &str = "model";
    pub const STREAMING: &str = "stream";
    pub const STREAM_OPTIONS: &str = "stream_options";
}

/// What a mutator does to the explicit flag of the attribute it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Explicit {
    /// Keep the flag as it is.
    Leave,
    /// Mark the attribute as set by the caller.
    #[default]
    Set,
    /// Mark the attribute as not set by the caller.
    Clear,
}

/// The attributes a caller set on purpose, by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitSet(BTreeSet<&'static str>);

impl ExplicitSet {
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn apply(&mut self, name: &'static str, explicit: Explicit) {
        match explicit {
            Explicit::Leave => {}
            Explicit::Set => {
                self.0.insert(name);
            }
            Explicit::Clear => {
                self.0.remove(name);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Assign `value` to `field`, update the explicit flag, report a change.
pub(crate) fn update<T: PartialEq>(
    field: &mut T,
    value: T,
    explicit: &mut ExplicitSet,
    name: &'static str,
    mode: Explicit,
) -> bool {
    explicit.apply(name, mode);
    if *field == value {
        return false;
    }
    *field = value;
    true
}

/// Generates `set_x`, `set_x_with` and `reset_x` for one attribute of
/// [`RequestData`].
macro_rules! setters {
    ($set:ident, $set_with:ident, $reset:ident, $($field:ident).+ : $ty:ty = $default:expr, $name:expr) => {
        pub fn $set(&mut self, value: impl Into<$ty>) -> bool {
            self.$set_with(value, $crate::request::Explicit::Set)
        }

        pub fn $set_with(&mut self, value: impl Into<$ty>, explicit: $crate::request::Explicit) -> bool {
            $crate::request::update(&mut self.$($field).+, value.into(), &mut self.explicit, $name, explicit)
        }

        pub fn $reset(&mut self) -> bool {
            self.$set_with($default, $crate::request::Explicit::Clear)
        }
    };
}

pub(crate) use setters;

/// Attributes shared by every endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestCore {
    pub(crate) id: String,
    pub(crate) api_key: SecretString,
    pub(crate) url: String,
    pub(crate) metadata: BTreeMap<String, String>,
    pub(crate) model: String,
    pub(crate) streaming: bool,
    pub(crate) stream_options: StreamOptions,
}

impl RequestCore {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn streaming(&self) -> bool {
        self.streaming
    }
}

/// Generic request attributes plus one endpoint's parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestData<E> {
    pub(crate) core: RequestCore,
    pub(crate) params: E,
    pub(crate) explicit: ExplicitSet,
    pub(crate) extra: JsonObject,
}

impl<E: Endpoint> RequestData<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn core(&self) -> &RequestCore {
        &self.core
    }

    pub fn params(&self) -> &E {
        &self.params
    }

    /// Attributes the caller set on purpose.
    pub fn explicit(&self) -> &ExplicitSet {
        &self.explicit
    }

    pub fn is_explicit(&self, name: &str) -> bool {
        self.explicit.contains(name)
    }

    /// Local identifier, never sent on the wire.
    pub fn id(&self) -> &str {
        &self.core.id
    }

    pub fn api_key(&self) -> &SecretString {
        &self.core.api_key
    }

    /// Full endpoint URL.
    pub fn url(&self) -> &str {
        &self.core.url
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.core.metadata
    }

    pub fn model(&self) -> &str {
        &self.core.model
    }

    pub fn streaming(&self) -> bool {
        self.core.streaming
    }

    pub fn stream_options(&self) -> &StreamOptions {
        &self.core.stream_options
    }

    setters!(set_id, set_id_with, reset_id, core.id: String = String::new(), attr::ID);
    setters!(set_api_key, set_api_key_with, reset_api_key, core.api_key: SecretString = SecretString::default(), attr::API_KEY);
    setters!(set_url, set_url_with, reset_url, core.url: String = String::new(), attr::URL);
    setters!(set_metadata, set_metadata_with, reset_metadata, core.metadata: BTreeMap<String, String> = BTreeMap::new(), attr::METADATA);
    setters!(set_streaming, set_streaming_with, reset_streaming, core.streaming: bool = false, attr::STREAMING);
    setters!(set_stream_options, set_stream_options_with, reset_stream_options, core.stream_options: StreamOptions = StreamOptions::default(), attr::STREAM_OPTIONS);

    pub fn set_model(&mut self, model: impl Into<String>) -> bool {
        self.set_model_with(model, Explicit::Set)
    }

    /// Changing the model re-applies model-dependent parameter limits.
    pub fn set_model_with(&mut self, model: impl Into<String>, explicit: Explicit) -> bool {
        let changed = update(&mut self.core.model, model.into(), &mut self.explicit, attr::MODEL, explicit);
        if changed {
            self.params.normalize(&self.core);
        }
        changed
    }

    pub fn reset_model(&mut self) -> bool {
        self.set_model_with(String::new(), Explicit::Clear)
    }

    /// Insert one metadata entry; marks metadata explicit.
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let mut metadata = self.core.metadata.clone();
        metadata.insert(key.into(), value.into());
        self.set_metadata(metadata)
    }

}

impl<E: Endpoint> JsonRecord for RequestData<E> {
    /// Keys found in `json` are marked explicit.
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("request", json, errors);
        if let Some(model) = reader.string("model") {
            self.core.model = model;
            self.explicit.apply(attr::MODEL, Explicit::Set);
        }
        if let Some(streaming) = reader.bool("stream") {
            self.core.streaming = streaming;
            self.explicit.apply(attr::STREAMING, Explicit::Set);
        }
        if let Some(stream_options) = reader.record("stream_options") {
            self.core.stream_options = stream_options;
            self.explicit.apply(attr::STREAM_OPTIONS, Explicit::Set);
        }
        if let Some(metadata) = reader.string_map("metadata") {
            self.core.metadata = metadata;
            self.explicit.apply(attr::METADATA, Explicit::Set);
        }
        let ok = reader.finish();
        let params_ok = self.params.read_json(json, &mut self.explicit, errors);
        self.params.normalize(&self.core);
        ok && params_ok
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.string("model", &self.core.model);
        writer.bool("stream", self.core.streaming, false);
        if self.core.streaming {
            writer.record("stream_options", &self.core.stream_options);
        }
        writer.string_map("metadata", &self.core.metadata);
        self.params.write_json(json, full);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.core == RequestCore::default() && self.params.is_empty()
    }

    fn is_valid(&self) -> bool {
        !self.core.url.is_empty() && !self.core.api_key.is_empty() && !self.core.model.is_empty()
    }
}

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    /// Configurable, not sent yet.
    #[default]
    Ready,
    /// Handed to the transport.
    Started,
    /// The response arrived.
    Finished,
    /// Cancelled before finishing.
    Aborted,
}

/// A request with a lifecycle. Configuration is only possible while ready.
///
/// Reads go through `Deref` to [`RequestData`]; writes go through
/// [`Request::edit`], which refuses once the request is in flight.
#[derive(Debug, Clone, Default)]
pub struct Request<E: Endpoint> {
    data: RequestData<E>,
    state: RequestState,
}

impl<E: Endpoint> Request<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: RequestData<E>) -> Self {
        Self {
            data,
            state: RequestState::Ready,
        }
    }

    pub fn data(&self) -> &RequestData<E> {
        &self.data
    }

    pub fn into_data(self) -> RequestData<E> {
        self.data
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == RequestState::Ready
    }

    pub fn is_started(&self) -> bool {
        self.state != RequestState::Ready
    }

    pub fn is_finished(&self) -> bool {
        self.state == RequestState::Finished
    }

    pub fn is_aborted(&self) -> bool {
        self.state == RequestState::Aborted
    }

    /// Mutable access to the data, or `None` (with a warning) once started.
    pub fn edit(&mut self) -> Option<&mut RequestData<E>> {
        if self.is_ready() {
            Some(&mut self.data)
        } else {
            warn!(
                id = %self.data.core.id,
                state = ?self.state,
                "cannot configure a request that is already in flight"
            );
            None
        }
    }

    pub fn set_api_key(&mut self, api_key: impl Into<SecretString>) -> bool {
        self.edit().is_some_and(|data| data.set_api_key(api_key))
    }

    pub fn set_url(&mut self, url: impl Into<String>) -> bool {
        self.edit().is_some_and(|data| data.set_url(url))
    }

    pub fn set_model(&mut self, model: impl Into<String>) -> bool {
        self.edit().is_some_and(|data| data.set_model(model))
    }

    pub fn set_streaming(&mut self, streaming: bool) -> bool {
        self.edit().is_some_and(|data| data.set_streaming(streaming))
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        self.edit().is_some_and(|data| data.insert_metadata(key, value))
    }

    pub(crate) fn data_mut(&mut self) -> &mut RequestData<E> {
        &mut self.data
    }

    pub(crate) fn set_state(&mut self, state: RequestState) {
        self.state = state;
    }

    /// Back to a fresh, ready request without reallocating the facade.
    pub fn reset(&mut self) {
        self.data = RequestData::default();
        self.state = RequestState::Ready;
    }
}

impl<E: Endpoint> Deref for Request<E> {
    type Target = RequestData<E>;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<E: Endpoint> From<RequestData<E>> for Request<E> {
    fn from(data: RequestData<E>) -> Self {
        Self::from_data(data)
    }
}
