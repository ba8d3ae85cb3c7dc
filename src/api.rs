//! Endpoint-specific request parameters and response bodies.
//!
//! A request is a generic [`RequestCore`](crate::request::RequestCore) plus one
//! endpoint's parameter struct; a response is the generic error envelope plus
//! one endpoint's body. [`Endpoint`] ties the two halves together.

pub mod images;
pub mod responses;

use crate::json::{JsonObject, JsonRecord};
use crate::request::{ExplicitSet, RequestCore};

/// Default base URL of the vendor API.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com";

/// Parameters of one REST endpoint.
///
/// Implemented by the parameter struct itself; the response body type and the
/// URL path come along as associated items.
pub trait Endpoint: Default + Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Decoded response body.
    type Body: JsonRecord + Clone + std::fmt::Debug + Send + 'static;

    /// Path appended to the API base URL.
    const PATH: &'static str;

    /// Model used when neither the request nor the client names one.
    const DEFAULT_MODEL: &'static str;

    /// Consume this endpoint's keys from `json`, marking each one explicit.
    fn read_json(
        &mut self,
        json: &mut JsonObject,
        explicit: &mut ExplicitSet,
        errors: &mut Vec<String>,
    ) -> bool;

    /// Write this endpoint's keys.
    fn write_json(&self, json: &mut JsonObject, full: bool);

    /// Re-apply constraints that depend on the generic fields (e.g. the model).
    fn normalize(&mut self, _core: &RequestCore) {}

    fn is_empty(&self) -> bool;
}

/// Full URL of `E` under the default base.
pub fn default_url<E: Endpoint>() -> String {
    endpoint_url::<E>(DEFAULT_API_BASE)
}

/// Full URL of `E` under `base`.
pub fn endpoint_url<E: Endpoint>(base: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), E::PATH)
}
