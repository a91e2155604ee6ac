use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SensorLogResult<T> = Result<T, SensorLogError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Success,
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl ErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ComputationError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
            Self::InternalError => "InternalError",
        }
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

/// Failure taxonomy shared by every pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Decode,
    Encode,
    Parse,
    SchemaMismatch,
    InvalidFilename,
    UnknownColumn,
    MissingField,
    MissingColumn,
    InvalidRange,
    InvalidParameter,
    Io,
    Internal,
}

impl ErrorKind {
    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::Decode
            | Self::Parse
            | Self::SchemaMismatch
            | Self::InvalidFilename
            | Self::UnknownColumn
            | Self::MissingField
            | Self::MissingColumn
            | Self::InvalidRange
            | Self::InvalidParameter => ErrorCategory::InputValidationError,
            Self::Io => ErrorCategory::IoSystemError,
            Self::Encode => ErrorCategory::ComputationError,
            Self::Internal => ErrorCategory::InternalError,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Decode => "DecodeError",
            Self::Encode => "EncodeError",
            Self::Parse => "ParseError",
            Self::SchemaMismatch => "SchemaMismatchError",
            Self::InvalidFilename => "InvalidFilenameError",
            Self::UnknownColumn => "UnknownColumnError",
            Self::MissingField => "MissingFieldError",
            Self::MissingColumn => "MissingColumnError",
            Self::InvalidRange => "InvalidRangeError",
            Self::InvalidParameter => "InvalidParameterError",
            Self::Io => "IoError",
            Self::Internal => "InternalError",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorLogError {
    kind: ErrorKind,
    placeholder: &'static str,
    message: String,
}

impl SensorLogError {
    pub fn new(kind: ErrorKind, placeholder: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            placeholder,
            message: message.into(),
        }
    }

    pub fn decode(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, placeholder, message)
    }

    pub fn encode(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Encode, placeholder, message)
    }

    pub fn parse(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, placeholder, message)
    }

    pub fn schema_mismatch(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SchemaMismatch, placeholder, message)
    }

    pub fn invalid_filename(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidFilename, placeholder, message)
    }

    pub fn unknown_column(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownColumn, placeholder, message)
    }

    pub fn missing_field(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingField, placeholder, message)
    }

    pub fn missing_column(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingColumn, placeholder, message)
    }

    pub fn invalid_range(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRange, placeholder, message)
    }

    pub fn invalid_parameter(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameter, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, placeholder, message)
    }

    /// Prefixes the message with the name of the file being processed.
    pub fn for_source(self, source_name: &str) -> Self {
        Self {
            message: format!("{}: {}", source_name, self.message),
            ..self
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub const fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.kind.category().exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category().is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category()
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for SensorLogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.kind.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for SensorLogError {}

#[cfg(test)]
mod tests {
    use super::{ErrorCategory, ErrorKind, SensorLogError};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (ErrorCategory::Success, 0, "Success"),
            (ErrorCategory::InputValidationError, 2, "InputValidationError"),
            (ErrorCategory::IoSystemError, 3, "IoSystemError"),
            (ErrorCategory::ComputationError, 4, "ComputationError"),
            (ErrorCategory::InternalError, 5, "InternalError"),
        ];

        for (category, exit_code, name) in cases {
            assert_eq!(category.exit_code(), exit_code);
            assert_eq!(category.as_str(), name);
        }
    }

    #[test]
    fn data_errors_are_input_validation_failures() {
        for kind in [
            ErrorKind::Decode,
            ErrorKind::Parse,
            ErrorKind::SchemaMismatch,
            ErrorKind::InvalidFilename,
            ErrorKind::UnknownColumn,
            ErrorKind::MissingField,
            ErrorKind::MissingColumn,
            ErrorKind::InvalidRange,
            ErrorKind::InvalidParameter,
        ] {
            assert_eq!(kind.category(), ErrorCategory::InputValidationError);
        }
        assert_eq!(ErrorKind::Io.category().exit_code(), 3);
        assert_eq!(ErrorKind::Encode.category().exit_code(), 4);
    }

    #[test]
    fn fatal_error_renders_diagnostic_lines() {
        let error = SensorLogError::unknown_column(
            "INPUT.EXTRACT_COLUMN",
            "column '电源9黑片温度' is not present in the merged table",
        );

        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [INPUT.EXTRACT_COLUMN] column '电源9黑片温度' is not present in the merged table"
        );
        assert_eq!(error.fatal_exit_line().as_deref(), Some("FATAL EXIT CODE: 2"));
        assert!(error.to_string().starts_with("UnknownColumnError"));
    }
}
