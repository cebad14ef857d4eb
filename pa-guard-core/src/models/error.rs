use std::fmt;

use thiserror::Error;

use crate::traits::host::AudioHost;

/// Result alias used by every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Integer status returned by the audio library.
///
/// Zero means success; every other value names a specific failure that the
/// library can describe through its text lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    pub const NO_ERROR: Self = Self(0);
    pub const NOT_INITIALIZED: Self = Self(-10000);
    pub const UNANTICIPATED_HOST_ERROR: Self = Self(-9999);
    pub const INVALID_CHANNEL_COUNT: Self = Self(-9998);
    pub const INVALID_SAMPLE_RATE: Self = Self(-9997);
    pub const INVALID_DEVICE: Self = Self(-9996);
    pub const INVALID_FLAG: Self = Self(-9995);
    pub const SAMPLE_FORMAT_NOT_SUPPORTED: Self = Self(-9994);
    pub const BAD_IO_DEVICE_COMBINATION: Self = Self(-9993);
    pub const INSUFFICIENT_MEMORY: Self = Self(-9992);
    pub const BUFFER_TOO_BIG: Self = Self(-9991);
    pub const BUFFER_TOO_SMALL: Self = Self(-9990);
    pub const NULL_CALLBACK: Self = Self(-9989);
    pub const BAD_STREAM_PTR: Self = Self(-9988);
    pub const TIMED_OUT: Self = Self(-9987);
    pub const INTERNAL_ERROR: Self = Self(-9986);
    pub const DEVICE_UNAVAILABLE: Self = Self(-9985);
    pub const INCOMPATIBLE_HOST_API_SPECIFIC_STREAM_INFO: Self = Self(-9984);
    pub const STREAM_IS_STOPPED: Self = Self(-9983);
    pub const STREAM_IS_NOT_STOPPED: Self = Self(-9982);
    pub const INPUT_OVERFLOWED: Self = Self(-9981);
    pub const OUTPUT_UNDERFLOWED: Self = Self(-9980);
    pub const HOST_API_NOT_FOUND: Self = Self(-9979);
    pub const INVALID_HOST_API: Self = Self(-9978);
    pub const CAN_NOT_READ_FROM_A_CALLBACK_STREAM: Self = Self(-9977);
    pub const CAN_NOT_WRITE_TO_A_CALLBACK_STREAM: Self = Self(-9976);
    pub const CAN_NOT_READ_FROM_AN_OUTPUT_ONLY_STREAM: Self = Self(-9975);
    pub const CAN_NOT_WRITE_TO_AN_INPUT_ONLY_STREAM: Self = Self(-9974);
    pub const INCOMPATIBLE_STREAM_HOST_API: Self = Self(-9973);
    pub const BAD_BUFFER_PTR: Self = Self(-9972);
    pub const CAN_NOT_INITIALIZE_RECURSIVELY: Self = Self(-9971);

    pub fn is_success(self) -> bool {
        self == Self::NO_ERROR
    }

    /// Raw status value as passed across the C boundary.
    pub fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The library call an [`Error`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Initialize,
    Terminate,
    OpenDefault,
    OpenExplicit,
    Start,
    Stop,
    Abort,
    Write,
    Close,
    IsActive,
    IsStopped,
    StreamInfo,
    DeviceCount,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Terminate => "terminate",
            Self::OpenDefault => "open-default",
            Self::OpenExplicit => "open-explicit",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Abort => "abort",
            Self::Write => "write",
            Self::Close => "close",
            Self::IsActive => "is-active",
            Self::IsStopped => "is-stopped",
            Self::StreamInfo => "stream-info",
            Self::DeviceCount => "device-count",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failed operation against the audio library.
///
/// There is exactly one failure kind for this subsystem; callers tell
/// failures apart by [`Error::code`] or [`Error::message`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{operation}: {message}")]
pub struct Error {
    operation: Operation,
    code: ErrorCode,
    message: String,
}

impl Error {
    /// Builds an error for a failure `code`, resolving the message through
    /// the host's text lookup.
    ///
    /// A host that reports failure with the success code gets
    /// [`ErrorCode::UNANTICIPATED_HOST_ERROR`] instead, so an `Error` never
    /// carries zero.
    pub(crate) fn from_status<H: AudioHost + ?Sized>(host: &H, operation: Operation, code: ErrorCode) -> Self {
        let code = if code.is_success() {
            ErrorCode::UNANTICIPATED_HOST_ERROR
        } else {
            code
        };
        Self {
            operation,
            code,
            message: host.error_text(code),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Turns a host status into a crate result tagged with `operation`.
pub(crate) fn check<H, T>(host: &H, operation: Operation, status: std::result::Result<T, ErrorCode>) -> Result<T>
where
    H: AudioHost + ?Sized,
{
    status.map_err(|code| Error::from_status(host, operation, code))
}
