//! Response data and the network-facing response lifecycle.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Error, ErrorCode};
use crate::http::{HttpRequest, Transport, TransportError};
use crate::json::{JsonObject, JsonReader, JsonRecord, JsonWriter};

/// The vendor error envelope plus one endpoint's body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseData<B> {
    error: Error,
    body: B,
    extra: JsonObject,
}

impl<B: JsonRecord> ResponseData<B> {
    pub fn error(&self) -> &Error {
        &self.error
    }

    pub fn set_error(&mut self, error: Error) -> bool {
        let changed = self.error != error;
        self.error = error;
        changed
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    pub fn into_body(self) -> B {
        self.body
    }
}

impl<B: JsonRecord> JsonRecord for ResponseData<B> {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("response", json, errors);
        if let Some(error) = reader.record("error") {
            self.error = error;
        }
        let ok = reader.finish();
        self.body.read_json(json, errors) && ok
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        JsonWriter::new(json, full).record("error", &self.error);
        self.body.write_json(json, full);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.error.is_empty() && self.body.is_empty()
    }

    fn is_valid(&self) -> bool {
        !self.error.is_error() && self.body.is_valid()
    }
}

/// Lifecycle notifications of one response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEvent {
    /// The request went out and the server answered with a status line.
    RequestSent,
    /// A chunk of the body arrived.
    ReadyRead(Bytes),
    /// The transport failed or the server answered with an error status.
    ErrorOccurred { code: ErrorCode, message: String },
    /// Terminal. `ok` is false when the body could not be decoded or
    /// described an error.
    Finished { ok: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseState {
    #[default]
    Pending,
    Started,
    Finished,
}

/// One response bound to one request id.
///
/// Events go to an unbounded channel; a dropped receiver is not an error.
#[derive(Debug)]
pub struct Response<B> {
    request_id: String,
    data: ResponseData<B>,
    state: ResponseState,
    status: Option<u16>,
    buffer: BytesMut,
    keep_body: bool,
    ok: bool,
    events: Option<mpsc::UnboundedSender<ResponseEvent>>,
}

impl<B: JsonRecord> Response<B> {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            data: ResponseData::default(),
            state: ResponseState::Pending,
            status: None,
            buffer: BytesMut::new(),
            keep_body: false,
            ok: false,
            events: None,
        }
    }

    /// Deliver lifecycle events to `events`.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<ResponseEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Keep the raw body after finishing.
    pub fn with_keep_body(mut self, keep_body: bool) -> Self {
        self.keep_body = keep_body;
        self
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn state(&self) -> ResponseState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == ResponseState::Finished
    }

    /// `true` once finished with a decoded body and no error.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// HTTP status, once known.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn data(&self) -> &ResponseData<B> {
        &self.data
    }

    pub fn into_data(self) -> ResponseData<B> {
        self.data
    }

    pub fn error(&self) -> &Error {
        &self.data.error
    }

    pub fn body(&self) -> &B {
        &self.data.body
    }

    /// The raw body. Empty after finishing unless the body is kept.
    pub fn raw_body(&self) -> &[u8] {
        &self.buffer
    }

    fn emit(&self, event: ResponseEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }

    pub fn handle_started(&mut self) {
        debug!(request_id = %self.request_id, "response started");
        self.state = ResponseState::Started;
    }

    pub fn handle_request_sent(&mut self, status: u16) {
        self.status = Some(status);
        self.emit(ResponseEvent::RequestSent);
    }

    pub fn handle_ready_read(&mut self, chunk: Bytes) {
        self.buffer.extend_from_slice(&chunk);
        self.emit(ResponseEvent::ReadyRead(chunk));
    }

    pub fn handle_transport_error(&mut self, error: TransportError) {
        warn!(request_id = %self.request_id, code = %error.code, "transport error: {}", error.message);
        self.data.error = Error::new(error.code, error.message.clone());
        self.emit(ResponseEvent::ErrorOccurred {
            code: error.code,
            message: error.message,
        });
    }

    /// Decode the buffered body and emit `Finished`. Returns the `ok` flag.
    ///
    /// A body that is not a JSON object does not raise `ErrorOccurred`; the
    /// failure is stored as an internal error and `Finished` carries `false`.
    pub fn handle_finished(&mut self) -> bool {
        let http_error = self.status.filter(|status| !(200..300).contains(status));
        if let Some(status) = http_error {
            let message = format!("HTTP {}", status);
            self.emit(ResponseEvent::ErrorOccurred {
                code: ErrorCode::NetworkError,
                message: message.clone(),
            });
            self.data.error = Error::new(ErrorCode::NetworkError, message);
        }

        let ok = if self.status.is_none() {
            // Transport failed before a status line; the error is already set.
            false
        } else {
            match self.decode() {
                Ok(ok) => ok && http_error.is_none() && !self.data.error.is_error(),
                Err(message) => {
                    warn!(request_id = %self.request_id, "{}", message);
                    if !self.data.error.is_error() {
                        self.data.error = Error::new(ErrorCode::InternalError, message);
                    }
                    false
                }
            }
        };

        self.state = ResponseState::Finished;
        self.ok = ok;
        if !self.keep_body {
            self.buffer.clear();
        }
        debug!(request_id = %self.request_id, ok, "response finished");
        self.emit(ResponseEvent::Finished { ok });
        // Closes the channel so receivers see the end of the event stream.
        self.events = None;
        ok
    }

    /// `Err` when the body is not a JSON object, `Ok(false)` when it is but
    /// some fields failed to decode.
    fn decode(&mut self) -> Result<bool, String> {
        let value: Value = serde_json::from_slice(&self.buffer)
            .map_err(|e| format!("response body is not valid JSON: {}", e))?;
        let Value::Object(object) = value else {
            return Err("response body is not a JSON object".to_string());
        };
        let http_error = std::mem::take(&mut self.data.error);
        let mut errors = Vec::new();
        let (data, ok) = ResponseData::from_json(&object, Some(&mut errors));
        if !ok {
            warn!(request_id = %self.request_id, errors = ?errors, "response body decoded with errors");
        }
        self.data = data;
        // A vendor error object is more specific than the bare status.
        if !self.data.error.is_error() {
            self.data.error = http_error;
        }
        Ok(ok)
    }

    /// Run one POST through `transport`, feeding every lifecycle handler.
    pub async fn run(mut self, transport: Arc<dyn Transport>, request: HttpRequest) -> Self {
        self.handle_started();
        let mut reply = match transport.post(request).await {
            Ok(reply) => reply,
            Err(error) => {
                self.handle_transport_error(error);
                self.handle_finished();
                return self;
            }
        };
        self.handle_request_sent(reply.status());
        loop {
            match reply.chunk().await {
                Ok(Some(chunk)) => self.handle_ready_read(chunk),
                Ok(None) => break,
                Err(error) => {
                    self.handle_transport_error(error);
                    break;
                }
            }
        }
        self.handle_finished();
        self
    }
}
