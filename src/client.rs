//! The client: request defaults, preparation, validation and posting.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{default_url, endpoint_url, images, responses, Endpoint};
use crate::error::{Error, ErrorCode};
use crate::http::{HttpRequest, ReqwestTransport, Transport};
use crate::json::JsonRecord;
use crate::model::StreamOptions;
use crate::options::{ClientOptions, SecretString};
use crate::request::{attr, Explicit, Request, RequestData, RequestState};
use crate::response::{Response, ResponseEvent};

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request preparation failed: {0}")]
    Prepare(Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request {0} is not ready")]
    NotReady(String),

    #[error("Request {0} was aborted")]
    Aborted(String),

    #[error("Request task failed: {0}")]
    Task(String),
}

/// A rejected [`Client::post`]. Carries the request back so it can be fixed
/// and posted again; it keeps any id and defaults preparation filled in.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct PostError<E: Endpoint> {
    #[source]
    pub error: ClientError,
    pub request: Request<E>,
}

impl<E: Endpoint> PostError<E> {
    pub fn into_request(self) -> Request<E> {
        self.request
    }
}

impl<E: Endpoint> From<PostError<E>> for ClientError {
    fn from(error: PostError<E>) -> Self {
        error.error
    }
}

/// Client for the Responses endpoint.
pub type ResponsesClient = Client<responses::Params>;

/// Client for the image generation endpoint.
pub type ImagesClient = Client<images::Params>;

struct Pending<E: Endpoint> {
    request: Request<E>,
    abort: AbortHandle,
    /// Set by the task once the transfer ran to the end.
    completed: Arc<AtomicBool>,
}

/// Posts requests of one endpoint.
///
/// Holds the application-level defaults. [`Client::prepare_request`] copies a
/// default into a request only where the request did not set the attribute
/// itself. Posted requests stay in the pending set until [`Client::finish`]
/// or [`Client::abort`] takes them out.
pub struct Client<E: Endpoint> {
    defaults: RequestData<E>,
    transport: Arc<dyn Transport>,
    pending: HashMap<String, Pending<E>>,
    recycled: Vec<Request<E>>,
    error: Error,
    keep_body: bool,
}

impl<E: Endpoint> Client<E> {
    /// Client with the default reqwest transport and `api_key`.
    pub fn new(api_key: impl Into<SecretString>) -> Result<Self, ClientError> {
        Self::from_options(ClientOptions::default().with_api_key(api_key))
    }

    /// Client configured from `options`, e.g. [`ClientOptions::from_env`].
    pub fn from_options(options: ClientOptions) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(&options.transport)?;
        let mut client = Self::with_transport(Arc::new(transport));
        client.apply_options(&options);
        debug!(options = ?options.summary(), path = E::PATH, "client configured");
        Ok(client)
    }

    /// Client over a custom transport. The url, model and streaming flag are
    /// set to the endpoint defaults; there is no api key.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        let mut defaults = RequestData::default();
        defaults.set_url(default_url::<E>());
        defaults.set_model(E::DEFAULT_MODEL);
        defaults.set_streaming(false);
        Self {
            defaults,
            transport,
            pending: HashMap::new(),
            recycled: Vec::new(),
            error: Error::default(),
            keep_body: false,
        }
    }

    fn apply_options(&mut self, options: &ClientOptions) {
        if let Some(api_key) = &options.api_key {
            self.set_api_key(api_key.clone());
        }
        if let Some(api_url) = &options.api_url {
            self.set_api_url(api_url);
        }
        if let Some(model) = &options.model {
            self.set_model(model.clone());
        }
        if !options.metadata.is_empty() {
            self.defaults.set_metadata(options.metadata.clone());
        }
        if let Some(streaming) = options.streaming {
            self.set_streaming(streaming);
        }
    }

    /// Client-level defaults. Only explicit attributes are ever copied.
    pub fn defaults(&self) -> &RequestData<E> {
        &self.defaults
    }

    pub fn defaults_mut(&mut self) -> &mut RequestData<E> {
        &mut self.defaults
    }

    pub fn set_api_key(&mut self, api_key: impl Into<SecretString>) -> bool {
        self.defaults.set_api_key(api_key)
    }

    /// Point the client at another base URL; the endpoint path is appended.
    pub fn set_api_url(&mut self, base: &str) -> bool {
        self.defaults.set_url(endpoint_url::<E>(base))
    }

    pub fn set_model(&mut self, model: impl Into<String>) -> bool {
        self.defaults.set_model(model)
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        self.defaults.insert_metadata(key, value)
    }

    pub fn set_streaming(&mut self, streaming: bool) -> bool {
        self.defaults.set_streaming(streaming)
    }

    pub fn set_stream_options(&mut self, stream_options: StreamOptions) -> bool {
        self.defaults.set_stream_options(stream_options)
    }

    /// The last preparation or validation failure.
    pub fn error(&self) -> &Error {
        &self.error
    }

    pub fn keep_body(&self) -> bool {
        self.keep_body
    }

    /// Keep raw response bodies after they were decoded.
    pub fn set_keep_body(&mut self, keep_body: bool) {
        self.keep_body = keep_body;
    }

    fn fail(&mut self, error: Error) -> bool {
        warn!(code = %error.code(), param = error.param(), "{}", error.message());
        self.error = error;
        false
    }

    /// `true` when `name` can be filled in from the client defaults.
    fn inherits(&self, data: &RequestData<E>, name: &str) -> bool {
        !data.is_explicit(name) && self.defaults.is_explicit(name)
    }

    /// Fill every attribute the request did not set from an explicit client
    /// default. Metadata is merged key by key with the request's keys winning.
    ///
    /// Fails, recording an internal error, when a required attribute (url,
    /// api key, model, streaming) is set on neither side.
    pub fn prepare_request(&mut self, data: &mut RequestData<E>) -> bool {
        if self.inherits(data, attr::URL) {
            data.set_url_with(self.defaults.url(), Explicit::Leave);
        }
        if self.inherits(data, attr::API_KEY) {
            data.set_api_key_with(self.defaults.api_key().clone(), Explicit::Leave);
        }
        if self.inherits(data, attr::MODEL) {
            data.set_model_with(self.defaults.model(), Explicit::Leave);
        }
        if self.inherits(data, attr::STREAMING) {
            data.set_streaming_with(self.defaults.streaming(), Explicit::Leave);
        }
        if self.inherits(data, attr::STREAM_OPTIONS) {
            data.set_stream_options_with(self.defaults.stream_options().clone(), Explicit::Leave);
        }
        if self.defaults.is_explicit(attr::METADATA) {
            let mut metadata = self.defaults.metadata().clone();
            metadata.extend(data.metadata().iter().map(|(k, v)| (k.clone(), v.clone())));
            let explicit = if data.is_explicit(attr::METADATA) {
                Explicit::Set
            } else {
                Explicit::Leave
            };
            data.set_metadata_with(metadata, explicit);
        }

        let required = [attr::URL, attr::API_KEY, attr::MODEL, attr::STREAMING];
        let missing = required
            .into_iter()
            .find(|name| !data.is_explicit(name) && !self.defaults.is_explicit(name));
        if let Some(name) = missing {
            let mut error = Error::new(
                ErrorCode::InternalError,
                format!("missing required parameter: {}", name),
            );
            error.set_param(name);
            return self.fail(error);
        }
        true
    }

    /// Reject an unusable url, an empty api key or model, and stream options
    /// on a request that does not stream.
    pub fn validate_request(&self, data: &RequestData<E>) -> bool {
        let url_ok = reqwest::Url::parse(data.url())
            .is_ok_and(|url| matches!(url.scheme(), "http" | "https"));
        let stream_options_ok = data.stream_options().is_valid()
            && (data.streaming() || data.stream_options().is_empty());
        url_ok && !data.api_key().is_empty() && !data.model().is_empty() && stream_options_ok
    }

    fn headers(data: &RequestData<E>) -> Result<HeaderMap, ClientError> {
        let bearer = format!("Bearer {}", data.api_key().expose_secret());
        let mut authorization = HeaderValue::from_str(&bearer)
            .map_err(|_| ClientError::Config("API key is not a valid header value".to_string()))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let accept = if data.streaming() {
            "text/event-stream"
        } else {
            "application/json"
        };
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        Ok(headers)
    }

    /// Prepare, validate and send `request`.
    ///
    /// The request gets a fresh id when it has none and moves into the
    /// pending set. The transfer runs on a tokio task; the returned
    /// [`Reply`] streams its events and yields the finished response.
    ///
    /// On failure the request comes back inside the [`PostError`], still
    /// ready.
    pub fn post(&mut self, mut request: Request<E>) -> Result<Reply<E>, PostError<E>> {
        match self.start(&mut request) {
            Ok((id, http_request)) => Ok(self.spawn(id, request, http_request)),
            Err(error) => Err(PostError { error, request }),
        }
    }

    /// Assign the id, prepare, validate and build the HTTP request.
    fn start(&mut self, request: &mut Request<E>) -> Result<(String, HttpRequest), ClientError> {
        if !request.is_ready() {
            return Err(ClientError::NotReady(request.id().to_string()));
        }
        let data = request.data_mut();
        if data.id().is_empty() {
            data.set_id(Uuid::new_v4().to_string());
        }
        let id = data.id().to_string();
        if self.pending.contains_key(&id) {
            return Err(ClientError::InvalidRequest(format!("request {} is already pending", id)));
        }
        if !self.prepare_request(data) {
            return Err(ClientError::Prepare(self.error.clone()));
        }
        if !self.validate_request(data) {
            let error = Error::new(ErrorCode::InternalError, format!("request {} is invalid", id));
            self.fail(error.clone());
            return Err(ClientError::InvalidRequest(error.message().to_string()));
        }

        let body = serde_json::to_vec(&Value::Object(data.to_json(false)))?;
        let http_request = HttpRequest {
            url: data.url().to_string(),
            headers: Self::headers(data)?,
            body: Bytes::from(body),
        };
        Ok((id, http_request))
    }

    fn spawn(&mut self, id: String, mut request: Request<E>, http_request: HttpRequest) -> Reply<E> {
        info!(id = %id, url = %http_request.url, model = request.model(), streaming = request.streaming(), "posting request");

        let (tx, rx) = mpsc::unbounded_channel();
        let response = Response::new(id.clone())
            .with_events(tx)
            .with_keep_body(self.keep_body);
        let transport = Arc::clone(&self.transport);
        let completed = Arc::new(AtomicBool::new(false));
        let done = Arc::clone(&completed);
        let handle = tokio::spawn(async move {
            let response = response.run(transport, http_request).await;
            done.store(true, Ordering::Release);
            response
        });

        request.set_state(RequestState::Started);
        self.pending.insert(
            id.clone(),
            Pending {
                request,
                abort: handle.abort_handle(),
                completed,
            },
        );
        Reply {
            id,
            events: rx,
            handle,
        }
    }

    /// Take a request whose transfer ended out of the pending set.
    ///
    /// The request is `Finished` when the transfer ran to the end and
    /// `Aborted` when it was cancelled, e.g. through [`Reply::abort`].
    /// Returns `None` when `id` is unknown or still in flight.
    pub fn finish(&mut self, id: &str) -> Option<Request<E>> {
        if !self.pending.get(id)?.abort.is_finished() {
            debug!(id, "request is still in flight");
            return None;
        }
        let Pending {
            mut request,
            completed,
            ..
        } = self.pending.remove(id)?;
        if completed.load(Ordering::Acquire) {
            request.set_state(RequestState::Finished);
        } else {
            debug!(id, "request was cancelled");
            request.set_state(RequestState::Aborted);
        }
        Some(request)
    }

    /// Cancel a pending request and take it out of the pending set.
    pub fn abort(&mut self, id: &str) -> Option<Request<E>> {
        let Pending { mut request, abort, .. } = self.pending.remove(id)?;
        abort.abort();
        info!(id, "request aborted");
        request.set_state(RequestState::Aborted);
        Some(request)
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_ids(&self) -> impl Iterator<Item = &str> {
        self.pending.keys().map(String::as_str)
    }

    /// Retire a request for later reuse.
    pub fn recycle(&mut self, mut request: Request<E>) {
        request.reset();
        self.recycled.push(request);
    }

    /// A ready request: the most recently recycled one, or a new one.
    pub fn revive(&mut self) -> Request<E> {
        self.recycled.pop().unwrap_or_default()
    }

    pub fn recycled_count(&self) -> usize {
        self.recycled.len()
    }
}

/// Handle to one posted request.
#[derive(Debug)]
pub struct Reply<E: Endpoint> {
    id: String,
    events: mpsc::UnboundedReceiver<ResponseEvent>,
    handle: JoinHandle<Response<E::Body>>,
}

impl<E: Endpoint> Reply<E> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Next lifecycle event; `None` after `Finished` once the task ended.
    pub async fn next_event(&mut self) -> Option<ResponseEvent> {
        self.events.recv().await
    }

    /// Cancel the transfer. The client reports the request as aborted once
    /// it is taken out with [`Client::finish`].
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for the response.
    pub async fn finished(self) -> Result<Response<E::Body>, ClientError> {
        let id = self.id;
        self.handle.await.map_err(|e: JoinError| {
            if e.is_cancelled() {
                ClientError::Aborted(id)
            } else {
                ClientError::Task(e.to_string())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{ReplyBody, TransportError};
    use crate::model::{InputItem, Message};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::Mutex;

    struct FakeBody {
        status: u16,
        chunks: VecDeque<Bytes>,
    }

    #[async_trait]
    impl ReplyBody for FakeBody {
        fn status(&self) -> u16 {
            self.status
        }

        async fn chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
            Ok(self.chunks.pop_front())
        }
    }

    enum Behaviour {
        Reply(u16, Value),
        Fail(TransportError),
        Hang,
    }

    struct FakeTransport {
        behaviour: Behaviour,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn post(&self, request: HttpRequest) -> Result<Box<dyn ReplyBody>, TransportError> {
            self.seen.lock().unwrap().push(request);
            match &self.behaviour {
                Behaviour::Reply(status, body) => {
                    let text = body.to_string();
                    let (head, tail) = text.split_at(text.len() / 2);
                    Ok(Box::new(FakeBody {
                        status: *status,
                        chunks: VecDeque::from([
                            Bytes::copy_from_slice(head.as_bytes()),
                            Bytes::copy_from_slice(tail.as_bytes()),
                        ]),
                    }))
                }
                Behaviour::Fail(error) => Err(error.clone()),
                Behaviour::Hang => std::future::pending().await,
            }
        }
    }

    fn client(transport: Arc<FakeTransport>) -> ResponsesClient {
        let mut client = ResponsesClient::with_transport(transport);
        client.set_api_key("sk-test");
        client
    }

    fn completed() -> Value {
        json!({
            "id": "resp_1",
            "object": "response",
            "status": "completed",
            "output": [{"type": "message", "id": "msg_1", "role": "assistant",
                        "content": [{"type": "output_text", "text": "Hi!", "annotations": []}]}]
        })
    }

    #[test]
    fn test_prepare_only_fills_implicit_attributes() {
        let mut client = client(FakeTransport::new(Behaviour::Hang));
        client.set_model("gpt-4o");

        let mut data = RequestData::<responses::Params>::new();
        data.set_model("gpt-5");
        assert!(client.prepare_request(&mut data));
        assert_eq!(data.model(), "gpt-5");
        assert_eq!(data.api_key().expose_secret(), "sk-test");
        assert_eq!(data.url(), "https://api.openai.com/v1/responses");
        assert!(!data.is_explicit(attr::API_KEY));

        let mut data = RequestData::<responses::Params>::new();
        assert!(client.prepare_request(&mut data));
        assert_eq!(data.model(), "gpt-4o");
        assert!(!data.is_explicit(attr::MODEL));
    }

    #[test]
    fn test_prepare_merges_metadata() {
        let mut client = client(FakeTransport::new(Behaviour::Hang));
        client.insert_metadata("app", "demo");
        client.insert_metadata("env", "prod");
        let mut data = RequestData::<responses::Params>::new();
        data.insert_metadata("env", "dev");
        assert!(client.prepare_request(&mut data));
        let expected: BTreeMap<String, String> = [("app", "demo"), ("env", "dev")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(data.metadata(), &expected);
    }

    #[test]
    fn test_prepare_reports_missing_api_key() {
        let mut client = ResponsesClient::with_transport(FakeTransport::new(Behaviour::Hang));
        let mut data = RequestData::<responses::Params>::new();
        assert!(!client.prepare_request(&mut data));
        assert_eq!(client.error().code(), ErrorCode::InternalError);
        assert_eq!(client.error().param(), attr::API_KEY);
    }

    #[test]
    fn test_validate_request() {
        let client = client(FakeTransport::new(Behaviour::Hang));
        let mut data = RequestData::<responses::Params>::new();
        data.set_url("https://api.openai.com/v1/responses");
        data.set_api_key("sk-test");
        data.set_model("gpt-4o");
        assert!(client.validate_request(&data));

        let mut bad = data.clone();
        bad.reset_api_key();
        assert!(!client.validate_request(&bad));

        let mut bad = data.clone();
        bad.reset_model();
        assert!(!client.validate_request(&bad));

        let mut bad = data.clone();
        bad.set_url("not a url");
        assert!(!client.validate_request(&bad));

        let mut bad = data.clone();
        bad.set_url("ftp://api.openai.com/v1/responses");
        assert!(!client.validate_request(&bad));

        let mut options = StreamOptions::default();
        options.set_include_obfuscation(false);
        let mut bad = data.clone();
        bad.set_stream_options(options.clone());
        assert!(!client.validate_request(&bad));
        bad.set_streaming(true);
        assert!(client.validate_request(&bad));
    }

    #[tokio::test]
    async fn test_post_round_trip() {
        let transport = FakeTransport::new(Behaviour::Reply(200, completed()));
        let mut client = client(transport.clone());

        let mut request = Request::<responses::Params>::new();
        let data = request.edit().unwrap();
        data.set_input(vec![InputItem::from(Message::user("Hello"))]);
        data.insert_metadata("trace", "t-1");

        let mut reply = client.post(request).unwrap();
        let id = reply.id().to_string();
        assert!(client.is_pending(&id));

        let mut events = Vec::new();
        while let Some(event) = reply.next_event().await {
            events.push(event);
        }
        assert_eq!(events.first(), Some(&ResponseEvent::RequestSent));
        assert_eq!(events.last(), Some(&ResponseEvent::Finished { ok: true }));
        assert!(events.iter().any(|e| matches!(e, ResponseEvent::ReadyRead(_))));

        let response = reply.finished().await.unwrap();
        assert!(response.is_ok());
        assert_eq!(response.request_id(), id);
        assert_eq!(response.body().output_text(), "Hi!");

        let seen = transport.seen.lock().unwrap();
        let sent = &seen[0];
        assert_eq!(sent.url, "https://api.openai.com/v1/responses");
        assert_eq!(sent.headers[AUTHORIZATION], "Bearer sk-test");
        assert_eq!(sent.headers[ACCEPT], "application/json");
        let body: Value = serde_json::from_slice(&sent.body).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4o",
                "input": [{"type": "message", "role": "user", "content": "Hello"}],
                "metadata": {"trace": "t-1"}
            })
        );
        drop(seen);

        let request = client.finish(&id).unwrap();
        assert!(request.is_finished());
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_streaming_accept_header() {
        let transport = FakeTransport::new(Behaviour::Reply(200, completed()));
        let mut client = client(transport.clone());
        let mut request = Request::<responses::Params>::new();
        request.set_streaming(true);
        let reply = client.post(request).unwrap();
        reply.finished().await.unwrap();
        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].headers[ACCEPT], "text/event-stream");
        let body: Value = serde_json::from_slice(&seen[0].body).unwrap();
        assert_eq!(body["stream"], json!(true));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let transport = FakeTransport::new(Behaviour::Fail(TransportError::network("connection refused")));
        let mut client = client(transport);
        let mut reply = client.post(Request::new()).unwrap();
        assert_eq!(
            reply.next_event().await,
            Some(ResponseEvent::ErrorOccurred {
                code: ErrorCode::NetworkError,
                message: "connection refused".to_string(),
            })
        );
        let response = reply.finished().await.unwrap();
        assert!(!response.is_ok());
        assert_eq!(response.error().code(), ErrorCode::NetworkError);
    }

    #[tokio::test]
    async fn test_abort_pending_request() {
        let mut client = client(FakeTransport::new(Behaviour::Hang));
        let reply = client.post(Request::new()).unwrap();
        let id = reply.id().to_string();
        assert!(client.finish(&id).is_none());

        let request = client.abort(&id).unwrap();
        assert!(request.is_aborted());
        assert!(!client.is_pending(&id));
        assert!(matches!(reply.finished().await, Err(ClientError::Aborted(aborted)) if aborted == id));
    }

    #[tokio::test]
    async fn test_reply_abort_marks_request_aborted() {
        let mut client = client(FakeTransport::new(Behaviour::Hang));
        let reply = client.post(Request::new()).unwrap();
        let id = reply.id().to_string();
        reply.abort();
        assert!(matches!(reply.finished().await, Err(ClientError::Aborted(_))));

        let request = client.finish(&id).unwrap();
        assert_eq!(request.state(), RequestState::Aborted);
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_post_rejects_started_request() {
        let mut client = client(FakeTransport::new(Behaviour::Hang));
        let mut request = Request::<responses::Params>::new();
        request.set_state(RequestState::Finished);
        let rejected = client.post(request).unwrap_err();
        assert!(matches!(rejected.error, ClientError::NotReady(_)));
        assert!(rejected.request.is_finished());
    }

    #[tokio::test]
    async fn test_post_rejects_invalid_request() {
        let mut client = client(FakeTransport::new(Behaviour::Hang));
        let mut request = Request::<responses::Params>::new();
        request.set_url("mailto:someone@example.com");
        let rejected = client.post(request).unwrap_err();
        assert!(matches!(rejected.error, ClientError::InvalidRequest(_)));
        assert_eq!(client.pending_count(), 0);

        let mut request = rejected.into_request();
        assert!(request.is_ready());
        let id = request.id().to_string();
        request.set_url("https://api.openai.com/v1/responses");
        let reply = client.post(request).unwrap();
        assert_eq!(reply.id(), id);
        assert!(client.is_pending(&id));
    }

    #[tokio::test]
    async fn test_post_error_converts_to_client_error() {
        async fn send(client: &mut ResponsesClient) -> Result<(), ClientError> {
            client.post(Request::new())?;
            Ok(())
        }
        let mut client = ResponsesClient::with_transport(FakeTransport::new(Behaviour::Hang));
        assert!(matches!(send(&mut client).await, Err(ClientError::Prepare(_))));
    }

    #[test]
    fn test_recycle_and_revive() {
        let mut client = client(FakeTransport::new(Behaviour::Hang));
        let mut request = Request::<responses::Params>::new();
        request.set_model("gpt-4o-mini");
        request.set_state(RequestState::Finished);
        client.recycle(request);
        assert_eq!(client.recycled_count(), 1);

        let revived = client.revive();
        assert!(revived.is_ready());
        assert_eq!(revived.model(), "");
        assert_eq!(client.recycled_count(), 0);
        assert!(client.revive().is_ready());
    }

    #[tokio::test]
    async fn test_images_client_clamps_before_sending() {
        let transport = FakeTransport::new(Behaviour::Reply(200, json!({"created": 1, "data": [{"url": "u"}]})));
        let mut client = ImagesClient::with_transport(transport.clone());
        client.set_api_key("sk-test");
        client.set_model("dall-e-3");

        let mut request = Request::<images::Params>::new();
        let data = request.edit().unwrap();
        data.set_prompt("A red kite");
        data.set_n(3u32);
        let reply = client.post(request).unwrap();
        let response = reply.finished().await.unwrap();
        assert!(response.is_ok());

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].url, "https://api.openai.com/v1/images/generations");
        let body: Value = serde_json::from_slice(&seen[0].body).unwrap();
        assert_eq!(body["model"], json!("dall-e-3"));
        assert_eq!(body["n"], json!(1));
    }
}
