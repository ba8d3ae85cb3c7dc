//! Error taxonomy and the `Error` value object.
//!
//! The same record carries locally raised failures (preparation, transport)
//! and the vendor's `"error"` member of a response body.

use crate::json::{wire_enum, JsonObject, JsonReader, JsonRecord, JsonWriter};

wire_enum! {
    /// What went wrong.
    pub enum ErrorCode fallback NoError {
        NoError => "no_error",
        UnknownError => "unknown_error",
        InternalError => "internal_error",
        NetworkError => "network_error",
        SslError => "ssl_error",
        MissingRequiredParameter => "missing_required_parameter",
    }
}

wire_enum! {
    /// Which layer the error belongs to.
    pub enum ErrorType fallback NoErrorType {
        NoErrorType => "no_error",
        UnknownErrorType => "unknown_error",
        InternalErrorType => "internal_error",
        NetworkErrorType => "network_error",
        InvalidRequestErrorType => "invalid_request_error",
    }
}

impl ErrorCode {
    /// The type an error with this code is reported under.
    pub fn error_type(self) -> ErrorType {
        match self {
            ErrorCode::NoError => ErrorType::NoErrorType,
            ErrorCode::UnknownError => ErrorType::UnknownErrorType,
            ErrorCode::InternalError => ErrorType::InternalErrorType,
            ErrorCode::NetworkError | ErrorCode::SslError => ErrorType::NetworkErrorType,
            ErrorCode::MissingRequiredParameter => ErrorType::InvalidRequestErrorType,
        }
    }
}

/// An error record: `{ "code", "type", "message", "param" }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Error {
    code: ErrorCode,
    error_type: ErrorType,
    message: String,
    param: String,
    extra: JsonObject,
}

impl Error {
    /// Build an error whose type follows from its code.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            error_type: code.error_type(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// A missing-parameter error naming the parameter.
    pub fn missing_parameter(param: impl Into<String>) -> Self {
        let param = param.into();
        Self {
            message: format!("missing required parameter: {}", param),
            param,
            ..Self::new(ErrorCode::MissingRequiredParameter, String::new())
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn set_code(&mut self, code: ErrorCode) -> bool {
        let changed = self.code != code;
        self.code = code;
        changed
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub fn set_error_type(&mut self, error_type: ErrorType) -> bool {
        let changed = self.error_type != error_type;
        self.error_type = error_type;
        changed
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) -> bool {
        let message = message.into();
        let changed = self.message != message;
        self.message = message;
        changed
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    pub fn set_param(&mut self, param: impl Into<String>) -> bool {
        let param = param.into();
        let changed = self.param != param;
        self.param = param;
        changed
    }

    /// Something is being reported.
    pub fn is_error(&self) -> bool {
        self.code != ErrorCode::NoError || !self.message.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.param.is_empty() {
            write!(f, "{} ({})", self.message, self.code)
        } else {
            write!(f, "{} ({}, param {})", self.message, self.code, self.param)
        }
    }
}

impl std::error::Error for Error {}

impl JsonRecord for Error {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("error", json, errors);
        if let Some(code) = reader.enumeration("code") {
            self.code = code;
        }
        if let Some(error_type) = reader.enumeration("type") {
            self.error_type = error_type;
        }
        if let Some(message) = reader.string("message") {
            self.message = message;
        }
        if let Some(param) = reader.string("param") {
            self.param = param;
        }
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.enumeration("code", self.code, ErrorCode::NoError);
        writer.enumeration("type", self.error_type, ErrorType::NoErrorType);
        writer.string("message", &self.message);
        writer.string("param", &self.param);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.code == ErrorCode::NoError
            && self.error_type == ErrorType::NoErrorType
            && self.message.is_empty()
            && self.param.is_empty()
    }

    fn is_valid(&self) -> bool {
        self.is_error()
    }
}
