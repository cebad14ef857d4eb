//! [`AudioHost`] over the system PortAudio library.

use std::ffi::{c_void, CStr};
use std::fmt;
use std::os::raw::{c_char, c_ulong};
use std::path::Path;
use std::ptr::{self, NonNull};
use std::sync::atomic::AtomicBool;

use pa_guard_core::{
    AudioHost, CallbackBinding, DefaultStreamConfig, DeviceIndex, DeviceInfo, ErrorCode, StreamCallback, StreamConfig,
    StreamInfo,
};

use crate::ffi::{self, PaError, PaStream, PaStreamParameters};
use crate::library::{LoadError, PortAudioLibrary};

/// PortAudio keeps one global library state per process, no matter how many
/// times the shared object is loaded.
static SESSION_LIVE: AtomicBool = AtomicBool::new(false);

/// Native `PaStream*`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NativeStream(NonNull<PaStream>);

impl fmt::Debug for NativeStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeStream({:p})", self.0)
    }
}

/// The system PortAudio library, resolved at runtime.
pub struct NativeHost {
    lib: PortAudioLibrary,
}

impl NativeHost {
    /// Load PortAudio from `$PORTAUDIO_LIBRARY` or the platform's default
    /// library names.
    pub fn load() -> Result<Self, LoadError> {
        PortAudioLibrary::load().map(|lib| Self { lib })
    }

    /// Load PortAudio from an explicit path.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        PortAudioLibrary::load_from(path.as_ref()).map(|lib| Self { lib })
    }
}

impl fmt::Debug for NativeHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHost").finish_non_exhaustive()
    }
}

fn status(code: PaError) -> Result<(), ErrorCode> {
    let code = ErrorCode(code);
    if code.is_success() {
        Ok(())
    } else {
        Err(code)
    }
}

/// PortAudio reports booleans as 1/0 and errors as negative codes.
fn flag(code: PaError) -> Result<bool, ErrorCode> {
    if code < 0 {
        Err(ErrorCode(code))
    } else {
        Ok(code == 1)
    }
}

fn frame_count(frames: u64) -> Result<c_ulong, ErrorCode> {
    c_ulong::try_from(frames).map_err(|_| ErrorCode::BUFFER_TOO_BIG)
}

fn split_binding(binding: Option<CallbackBinding>) -> (Option<StreamCallback>, *mut c_void) {
    match binding {
        Some(binding) => (Some(binding.callback()), binding.user_data()),
        None => (None, ptr::null_mut()),
    }
}

/// # Safety
/// `text` must be null or point to a NUL-terminated string.
unsafe fn owned_text(text: *const c_char) -> Option<String> {
    if text.is_null() {
        None
    } else {
        Some(CStr::from_ptr(text).to_string_lossy().into_owned())
    }
}

impl NativeHost {
    fn opened(&self, code: PaError, raw: *mut PaStream) -> Result<NativeStream, ErrorCode> {
        status(code)?;
        NonNull::new(raw).map(NativeStream).ok_or(ErrorCode::BAD_STREAM_PTR)
    }
}

impl AudioHost for NativeHost {
    type Stream = NativeStream;

    fn session_flag(&self) -> &AtomicBool {
        &SESSION_LIVE
    }

    fn initialize(&self) -> Result<(), ErrorCode> {
        // SAFETY: no preconditions.
        status(unsafe { (self.lib.initialize)() })
    }

    fn terminate(&self) -> Result<(), ErrorCode> {
        // SAFETY: no preconditions; PortAudio closes any stream still open.
        status(unsafe { (self.lib.terminate)() })
    }

    fn open_default_stream(
        &self,
        config: &DefaultStreamConfig,
        callback: Option<CallbackBinding>,
    ) -> Result<NativeStream, ErrorCode> {
        let frames_per_buffer = frame_count(config.frames_per_buffer)?;
        let (callback, user_data) = split_binding(callback);
        let mut raw: *mut PaStream = ptr::null_mut();
        // SAFETY: `raw` is a valid out-pointer; the binding's contract covers
        // the callback and its user data.
        let code = unsafe {
            (self.lib.open_default_stream)(
                &mut raw,
                config.input_channels,
                config.output_channels,
                config.sample_format.with_layout(config.non_interleaved) as ffi::PaSampleFormat,
                config.sample_rate,
                frames_per_buffer,
                callback,
                user_data,
            )
        };
        self.opened(code, raw)
    }

    fn open_stream(&self, config: &StreamConfig, callback: Option<CallbackBinding>) -> Result<NativeStream, ErrorCode> {
        let frames_per_buffer = frame_count(config.frames_per_buffer)?;
        let flags = ffi::PaStreamFlags::try_from(config.flags.bits()).map_err(|_| ErrorCode::INVALID_FLAG)?;
        let input = config.input.as_ref().map(PaStreamParameters::from);
        let output = config.output.as_ref().map(PaStreamParameters::from);
        let (callback, user_data) = split_binding(callback);
        let mut raw: *mut PaStream = ptr::null_mut();
        // SAFETY: parameter pointers are null or borrow locals that outlive
        // the call; see `open_default_stream` for the rest.
        let code = unsafe {
            (self.lib.open_stream)(
                &mut raw,
                input.as_ref().map_or(ptr::null(), |p| p as *const _),
                output.as_ref().map_or(ptr::null(), |p| p as *const _),
                config.sample_rate,
                frames_per_buffer,
                flags,
                callback,
                user_data,
            )
        };
        self.opened(code, raw)
    }

    unsafe fn start_stream(&self, stream: NativeStream) -> Result<(), ErrorCode> {
        status((self.lib.start_stream)(stream.0.as_ptr()))
    }

    unsafe fn stop_stream(&self, stream: NativeStream) -> Result<(), ErrorCode> {
        status((self.lib.stop_stream)(stream.0.as_ptr()))
    }

    unsafe fn abort_stream(&self, stream: NativeStream) -> Result<(), ErrorCode> {
        status((self.lib.abort_stream)(stream.0.as_ptr()))
    }

    unsafe fn close_stream(&self, stream: NativeStream) -> Result<(), ErrorCode> {
        status((self.lib.close_stream)(stream.0.as_ptr()))
    }

    unsafe fn write_stream(&self, stream: NativeStream, buffer: *const c_void, frames: u64) -> Result<(), ErrorCode> {
        status((self.lib.write_stream)(stream.0.as_ptr(), buffer, frame_count(frames)?))
    }

    unsafe fn is_stream_active(&self, stream: NativeStream) -> Result<bool, ErrorCode> {
        flag((self.lib.is_stream_active)(stream.0.as_ptr()))
    }

    unsafe fn is_stream_stopped(&self, stream: NativeStream) -> Result<bool, ErrorCode> {
        flag((self.lib.is_stream_stopped)(stream.0.as_ptr()))
    }

    unsafe fn stream_info(&self, stream: NativeStream) -> Option<StreamInfo> {
        let info = (self.lib.get_stream_info)(stream.0.as_ptr()).as_ref()?;
        Some(StreamInfo {
            input_latency: info.input_latency,
            output_latency: info.output_latency,
            sample_rate: info.sample_rate,
        })
    }

    fn error_text(&self, code: ErrorCode) -> String {
        // SAFETY: returns a static string for any code.
        unsafe { owned_text((self.lib.get_error_text)(code.raw())) }.unwrap_or_else(|| format!("error {}", code.raw()))
    }

    fn version_text(&self) -> String {
        // SAFETY: returns a static string.
        unsafe { owned_text((self.lib.get_version_text)()) }.unwrap_or_default()
    }

    fn device_count(&self) -> Result<i32, ErrorCode> {
        // SAFETY: no preconditions; negative results are error codes.
        let count = unsafe { (self.lib.get_device_count)() };
        if count < 0 {
            Err(ErrorCode(count))
        } else {
            Ok(count)
        }
    }

    fn default_input_device(&self) -> DeviceIndex {
        // SAFETY: no preconditions.
        DeviceIndex(unsafe { (self.lib.get_default_input_device)() })
    }

    fn default_output_device(&self) -> DeviceIndex {
        // SAFETY: no preconditions.
        DeviceIndex(unsafe { (self.lib.get_default_output_device)() })
    }

    fn device_info(&self, device: DeviceIndex) -> Option<DeviceInfo> {
        // SAFETY: out-of-range indices yield null; the returned struct is
        // owned by PortAudio and stays valid until terminate.
        let info = unsafe { (self.lib.get_device_info)(device.0).as_ref() }?;
        Some(DeviceInfo {
            // SAFETY: `name` is null or NUL-terminated.
            name: unsafe { owned_text(info.name) }.unwrap_or_default(),
            max_input_channels: info.max_input_channels,
            max_output_channels: info.max_output_channels,
            default_low_input_latency: info.default_low_input_latency,
            default_low_output_latency: info.default_low_output_latency,
            default_high_input_latency: info.default_high_input_latency,
            default_high_output_latency: info.default_high_output_latency,
            default_sample_rate: info.default_sample_rate,
        })
    }
}
