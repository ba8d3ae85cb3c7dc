//! # aikit - typed client for a generative-AI REST API
//!
//! Request parameters and response payloads are plain value objects that
//! round-trip through JSON, keeping keys they do not know about. Requests
//! remember which attributes the caller set on purpose, so a [`Client`] can
//! fill in its defaults without overriding deliberate choices.
//!
//! ## Features
//! - Responses (`/v1/responses`) and image generation (`/v1/images/generations`)
//! - Minimal wire payloads by default, exhaustive ones on request
//! - Explicit-vs-default tracking for every request attribute
//! - Async transfers on tokio with a lifecycle event stream per request
//!
//! ## Architecture
//!
//! - **`RequestData<E>`**: generic attributes (url, api key, model, metadata,
//!   streaming) plus one endpoint's parameters `E`
//! - **`Request<E>`**: lifecycle wrapper; only configurable while ready
//! - **`Client<E>`**: defaults, preparation, validation and posting
//! - **`Response<B>`**: decodes the reply body `B` and reports events
//!
//! ## Example
//! ```no_run
//! use aikit::api::responses;
//! use aikit::client::ResponsesClient;
//! use aikit::request::Request;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = ResponsesClient::new("your-api-key")?;
//!     client.set_model("gpt-4o");
//!
//!     let mut request = Request::<responses::Params>::new();
//!     if let Some(data) = request.edit() {
//!         data.set_input("Write a haiku about the sea.");
//!     }
//!
//!     let reply = client.post(request)?;
//!     let response = reply.finished().await?;
//!     println!("{}", response.body().output_text());
//!     Ok(())
//! }
//! ```

pub mod json;

pub mod api;
pub mod client;
pub mod error;
pub mod http;
pub mod model;
pub mod options;
pub mod request;
pub mod response;

// Re-exports for convenience
pub use api::Endpoint;
pub use client::{Client, ClientError, ImagesClient, PostError, Reply, ResponsesClient};
pub use error::{Error, ErrorCode, ErrorType};
pub use json::{JsonObject, JsonRecord};
pub use options::{ClientOptions, SecretString, TransportOptions};
pub use request::{Explicit, Request, RequestData, RequestState};
pub use response::{Response, ResponseData, ResponseEvent};
