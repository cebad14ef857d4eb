//! The seam between the lifecycle types and the native audio library.
//!
//! [`AudioHost`] mirrors the library's C entry points one to one: every
//! fallible call reports an [`ErrorCode`] and nothing here owns anything.
//! Ownership and ordering live in [`LibrarySession`](crate::LibrarySession)
//! and [`DeviceStream`](crate::DeviceStream).

use std::ffi::c_void;
use std::fmt;
use std::os::raw::{c_int, c_ulong};
use std::sync::atomic::AtomicBool;

use crate::models::config::{DefaultStreamConfig, StreamConfig};
use crate::models::device::{DeviceIndex, DeviceInfo, StreamInfo};
use crate::models::error::ErrorCode;

/// Timing information handed to a [`StreamCallback`], in seconds of the
/// stream clock.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StreamCallbackTimeInfo {
    pub input_buffer_adc_time: f64,
    pub current_time: f64,
    pub output_buffer_dac_time: f64,
}

/// Bits of the `status_flags` argument of a [`StreamCallback`].
pub mod status_flags {
    use std::os::raw::c_ulong;

    pub const INPUT_UNDERFLOW: c_ulong = 0x0000_0001;
    pub const INPUT_OVERFLOW: c_ulong = 0x0000_0002;
    pub const OUTPUT_UNDERFLOW: c_ulong = 0x0000_0004;
    pub const OUTPUT_OVERFLOW: c_ulong = 0x0000_0008;
    pub const PRIMING_OUTPUT: c_ulong = 0x0000_0010;
}

/// Value a [`StreamCallback`] returns to keep or end the stream.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackResult {
    Continue = 0,
    /// Play out what is buffered, then stop.
    Complete = 1,
    /// Stop as soon as possible, discarding buffered audio.
    Abort = 2,
}

impl From<CallbackResult> for c_int {
    fn from(result: CallbackResult) -> Self {
        result as c_int
    }
}

/// Signature of the library's audio callback.
///
/// Runs on the library's real-time thread. It must not block: no
/// allocation, locking or I/O.
pub type StreamCallback = unsafe extern "C" fn(
    input: *const c_void,
    output: *mut c_void,
    frame_count: c_ulong,
    time_info: *const StreamCallbackTimeInfo,
    status_flags: c_ulong,
    user_data: *mut c_void,
) -> c_int;

/// A callback plus the context pointer forwarded verbatim to each call.
#[derive(Clone, Copy)]
pub struct CallbackBinding {
    callback: StreamCallback,
    user_data: *mut c_void,
}

impl CallbackBinding {
    /// # Safety
    ///
    /// `user_data` must stay valid, and be safe to use from the callback
    /// thread, until every stream opened with this binding is closed.
    /// `callback` must treat its arguments according to the layout the
    /// stream is opened with.
    pub unsafe fn new(callback: StreamCallback, user_data: *mut c_void) -> Self {
        Self { callback, user_data }
    }

    pub fn callback(&self) -> StreamCallback {
        self.callback
    }

    pub fn user_data(&self) -> *mut c_void {
        self.user_data
    }
}

impl fmt::Debug for CallbackBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackBinding")
            .field("callback", &(self.callback as *const c_void))
            .field("user_data", &self.user_data)
            .finish()
    }
}

/// Entry points of a callback-driven audio I/O library.
///
/// Methods taking a `Self::Stream` are `unsafe`: the handle must come from
/// this host's `open_default_stream`/`open_stream` and must not have been
/// passed to `close_stream` yet.
pub trait AudioHost {
    /// Opaque native stream handle.
    type Stream: Copy + fmt::Debug;

    /// Flag claimed by the one live session of this library.
    fn session_flag(&self) -> &AtomicBool;

    fn initialize(&self) -> Result<(), ErrorCode>;

    fn terminate(&self) -> Result<(), ErrorCode>;

    fn open_default_stream(
        &self,
        config: &DefaultStreamConfig,
        callback: Option<CallbackBinding>,
    ) -> Result<Self::Stream, ErrorCode>;

    fn open_stream(&self, config: &StreamConfig, callback: Option<CallbackBinding>) -> Result<Self::Stream, ErrorCode>;

    /// # Safety
    /// See the trait documentation.
    unsafe fn start_stream(&self, stream: Self::Stream) -> Result<(), ErrorCode>;

    /// # Safety
    /// See the trait documentation.
    unsafe fn stop_stream(&self, stream: Self::Stream) -> Result<(), ErrorCode>;

    /// # Safety
    /// See the trait documentation.
    unsafe fn abort_stream(&self, stream: Self::Stream) -> Result<(), ErrorCode>;

    /// # Safety
    /// See the trait documentation. The handle is invalid afterwards, even
    /// when an error is returned.
    unsafe fn close_stream(&self, stream: Self::Stream) -> Result<(), ErrorCode>;

    /// Blocks until `frames` frames from `buffer` have been accepted.
    ///
    /// # Safety
    /// See the trait documentation. `buffer` must hold `frames` frames in
    /// the layout the stream was opened with.
    unsafe fn write_stream(&self, stream: Self::Stream, buffer: *const c_void, frames: u64) -> Result<(), ErrorCode>;

    /// # Safety
    /// See the trait documentation.
    unsafe fn is_stream_active(&self, stream: Self::Stream) -> Result<bool, ErrorCode>;

    /// # Safety
    /// See the trait documentation.
    unsafe fn is_stream_stopped(&self, stream: Self::Stream) -> Result<bool, ErrorCode>;

    /// # Safety
    /// See the trait documentation.
    unsafe fn stream_info(&self, stream: Self::Stream) -> Option<StreamInfo>;

    /// Human-readable text for a status code.
    fn error_text(&self, code: ErrorCode) -> String;

    fn version_text(&self) -> String;

    fn device_count(&self) -> Result<i32, ErrorCode>;

    /// [`DeviceIndex::NO_DEVICE`] when there is none.
    fn default_input_device(&self) -> DeviceIndex;

    /// [`DeviceIndex::NO_DEVICE`] when there is none.
    fn default_output_device(&self) -> DeviceIndex;

    fn device_info(&self, device: DeviceIndex) -> Option<DeviceInfo>;
}
