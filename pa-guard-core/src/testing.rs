//! In-memory stand-in for the native audio library, plus a log capture for
//! asserting on the diagnostics side channel.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::ffi::c_void;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Once};

use parking_lot::{Mutex, MutexGuard};

use crate::models::config::{DefaultStreamConfig, StreamConfig};
use crate::models::device::{DeviceIndex, DeviceInfo, StreamInfo};
use crate::models::error::ErrorCode;
use crate::traits::host::{AudioHost, CallbackBinding};

/// Library entry points the mock records and can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    Initialize,
    Terminate,
    OpenDefault,
    OpenStream,
    Start,
    Stop,
    Abort,
    Close,
    Write,
    IsActive,
    IsStopped,
}

#[derive(Debug, Clone)]
pub struct MockStream {
    pub active: bool,
    pub uses_callback: bool,
    pub has_input: bool,
    pub has_output: bool,
    pub sample_rate: f64,
}

#[derive(Debug, Clone)]
pub struct MockState {
    pub initialize_calls: usize,
    pub terminate_calls: usize,
    pub initialized: bool,
    pub next_handle: u64,
    /// Streams opened and not yet closed, by handle.
    pub streams: BTreeMap<u64, MockStream>,
    /// Handles in the order they were closed.
    pub closed: Vec<u64>,
    /// Handles in the order they were aborted.
    pub aborted: Vec<u64>,
    pub frames_written: BTreeMap<u64, u64>,
    /// Every recorded call with the handle it targeted.
    pub calls: Vec<(MockCall, Option<u64>)>,
    pub default_input: DeviceIndex,
    pub default_output: DeviceIndex,
    failures: HashMap<MockCall, ErrorCode>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            initialize_calls: 0,
            terminate_calls: 0,
            initialized: false,
            next_handle: 1,
            streams: BTreeMap::new(),
            closed: Vec::new(),
            aborted: Vec::new(),
            frames_written: BTreeMap::new(),
            calls: Vec::new(),
            default_input: DeviceIndex(0),
            default_output: DeviceIndex(1),
            failures: HashMap::new(),
        }
    }
}

impl MockState {
    fn record(&mut self, call: MockCall, handle: Option<u64>) -> Result<(), ErrorCode> {
        self.calls.push((call, handle));
        match self.failures.remove(&call) {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }

    fn stream_mut(&mut self, handle: u64) -> Result<&mut MockStream, ErrorCode> {
        if !self.initialized {
            return Err(ErrorCode::NOT_INITIALIZED);
        }
        self.streams.get_mut(&handle).ok_or(ErrorCode::BAD_STREAM_PTR)
    }

    fn open(&mut self, stream: MockStream) -> Result<u64, ErrorCode> {
        if !self.initialized {
            return Err(ErrorCode::NOT_INITIALIZED);
        }
        if stream.sample_rate <= 0.0 {
            return Err(ErrorCode::INVALID_SAMPLE_RATE);
        }
        let handle = self.next_handle;
        self.next_handle += 1;
        self.streams.insert(handle, stream);
        Ok(handle)
    }
}

struct Inner {
    session_flag: AtomicBool,
    state: Mutex<MockState>,
}

/// Cloneable handle to one simulated library; clones share state and the
/// session flag.
#[derive(Clone)]
pub struct MockHost {
    inner: Arc<Inner>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                session_flag: AtomicBool::new(false),
                state: Mutex::new(MockState::default()),
            }),
        }
    }

    /// Make the next `call` fail with `code`.
    pub fn fail_next(&self, call: MockCall, code: ErrorCode) {
        self.inner.state.lock().failures.insert(call, code);
    }

    /// Snapshot of the recorded state.
    pub fn state(&self) -> MockState {
        self.inner.state.lock().clone()
    }

    pub fn state_mut(&self) -> MutexGuard<'_, MockState> {
        self.inner.state.lock()
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioHost for MockHost {
    type Stream = u64;

    fn session_flag(&self) -> &AtomicBool {
        &self.inner.session_flag
    }

    fn initialize(&self) -> Result<(), ErrorCode> {
        let mut state = self.inner.state.lock();
        state.initialize_calls += 1;
        state.record(MockCall::Initialize, None)?;
        state.initialized = true;
        Ok(())
    }

    fn terminate(&self) -> Result<(), ErrorCode> {
        let mut state = self.inner.state.lock();
        state.terminate_calls += 1;
        state.initialized = false;
        state.record(MockCall::Terminate, None)
    }

    fn open_default_stream(
        &self,
        config: &DefaultStreamConfig,
        callback: Option<CallbackBinding>,
    ) -> Result<u64, ErrorCode> {
        let mut state = self.inner.state.lock();
        state.record(MockCall::OpenDefault, None)?;
        state.open(MockStream {
            active: false,
            uses_callback: callback.is_some(),
            has_input: config.input_channels > 0,
            has_output: config.output_channels > 0,
            sample_rate: config.sample_rate,
        })
    }

    fn open_stream(&self, config: &StreamConfig, callback: Option<CallbackBinding>) -> Result<u64, ErrorCode> {
        let mut state = self.inner.state.lock();
        state.record(MockCall::OpenStream, None)?;
        state.open(MockStream {
            active: false,
            uses_callback: callback.is_some(),
            has_input: config.input.is_some(),
            has_output: config.output.is_some(),
            sample_rate: config.sample_rate,
        })
    }

    unsafe fn start_stream(&self, handle: u64) -> Result<(), ErrorCode> {
        let mut state = self.inner.state.lock();
        state.record(MockCall::Start, Some(handle))?;
        let stream = state.stream_mut(handle)?;
        if stream.active {
            return Err(ErrorCode::STREAM_IS_NOT_STOPPED);
        }
        stream.active = true;
        Ok(())
    }

    unsafe fn stop_stream(&self, handle: u64) -> Result<(), ErrorCode> {
        let mut state = self.inner.state.lock();
        state.record(MockCall::Stop, Some(handle))?;
        let stream = state.stream_mut(handle)?;
        if !stream.active {
            return Err(ErrorCode::STREAM_IS_STOPPED);
        }
        stream.active = false;
        Ok(())
    }

    unsafe fn abort_stream(&self, handle: u64) -> Result<(), ErrorCode> {
        let mut state = self.inner.state.lock();
        state.record(MockCall::Abort, Some(handle))?;
        let stream = state.stream_mut(handle)?;
        if !stream.active {
            return Err(ErrorCode::STREAM_IS_STOPPED);
        }
        stream.active = false;
        state.aborted.push(handle);
        Ok(())
    }

    unsafe fn close_stream(&self, handle: u64) -> Result<(), ErrorCode> {
        let mut state = self.inner.state.lock();
        let scripted = state.record(MockCall::Close, Some(handle));
        if state.streams.remove(&handle).is_none() {
            return Err(ErrorCode::BAD_STREAM_PTR);
        }
        state.closed.push(handle);
        scripted
    }

    unsafe fn write_stream(&self, handle: u64, buffer: *const c_void, frames: u64) -> Result<(), ErrorCode> {
        let mut state = self.inner.state.lock();
        state.record(MockCall::Write, Some(handle))?;
        // Same order as Pa_WriteStream: handle, zero frames, buffer, stopped,
        // then the host API's own checks.
        let stream = state.stream_mut(handle)?;
        if frames == 0 {
            return Ok(());
        }
        if buffer.is_null() {
            return Err(ErrorCode::BAD_BUFFER_PTR);
        }
        if !stream.active {
            return Err(ErrorCode::STREAM_IS_STOPPED);
        }
        if stream.uses_callback {
            return Err(ErrorCode::CAN_NOT_WRITE_TO_A_CALLBACK_STREAM);
        }
        if !stream.has_output {
            return Err(ErrorCode::CAN_NOT_WRITE_TO_AN_INPUT_ONLY_STREAM);
        }
        *state.frames_written.entry(handle).or_insert(0) += frames;
        Ok(())
    }

    unsafe fn is_stream_active(&self, handle: u64) -> Result<bool, ErrorCode> {
        let mut state = self.inner.state.lock();
        state.record(MockCall::IsActive, Some(handle))?;
        Ok(state.stream_mut(handle)?.active)
    }

    unsafe fn is_stream_stopped(&self, handle: u64) -> Result<bool, ErrorCode> {
        let mut state = self.inner.state.lock();
        state.record(MockCall::IsStopped, Some(handle))?;
        Ok(!state.stream_mut(handle)?.active)
    }

    unsafe fn stream_info(&self, handle: u64) -> Option<StreamInfo> {
        let state = self.inner.state.lock();
        state.streams.get(&handle).map(|stream| StreamInfo {
            input_latency: if stream.has_input { 0.01 } else { 0.0 },
            output_latency: if stream.has_output { 0.02 } else { 0.0 },
            sample_rate: stream.sample_rate,
        })
    }

    fn error_text(&self, code: ErrorCode) -> String {
        let text = match code {
            ErrorCode::NO_ERROR => "Success",
            ErrorCode::NOT_INITIALIZED => "PortAudio not initialized",
            ErrorCode::UNANTICIPATED_HOST_ERROR => "Unanticipated host error",
            ErrorCode::INVALID_CHANNEL_COUNT => "Invalid number of channels",
            ErrorCode::INVALID_SAMPLE_RATE => "Invalid sample rate",
            ErrorCode::INVALID_DEVICE => "Invalid device",
            ErrorCode::SAMPLE_FORMAT_NOT_SUPPORTED => "Sample format not supported",
            ErrorCode::BAD_IO_DEVICE_COMBINATION => "Illegal combination of I/O devices",
            ErrorCode::INSUFFICIENT_MEMORY => "Insufficient memory",
            ErrorCode::BUFFER_TOO_BIG => "Buffer too big",
            ErrorCode::BAD_STREAM_PTR => "Invalid stream pointer",
            ErrorCode::TIMED_OUT => "Wait timed out",
            ErrorCode::INTERNAL_ERROR => "Internal PortAudio error",
            ErrorCode::DEVICE_UNAVAILABLE => "Device unavailable",
            ErrorCode::STREAM_IS_STOPPED => "Stream is stopped",
            ErrorCode::STREAM_IS_NOT_STOPPED => "Stream is not stopped",
            ErrorCode::CAN_NOT_WRITE_TO_A_CALLBACK_STREAM => "Can't write to a callback stream",
            ErrorCode::CAN_NOT_WRITE_TO_AN_INPUT_ONLY_STREAM => "Can't write to an input only stream",
            ErrorCode::BAD_BUFFER_PTR => "Bad buffer pointer",
            ErrorCode::CAN_NOT_INITIALIZE_RECURSIVELY => "PortAudio can not be initialized recursively",
            _ => "Invalid error code",
        };
        text.to_string()
    }

    fn version_text(&self) -> String {
        "PortAudio V19.7.0-mock".to_string()
    }

    fn device_count(&self) -> Result<i32, ErrorCode> {
        if self.inner.state.lock().initialized {
            Ok(2)
        } else {
            Err(ErrorCode::NOT_INITIALIZED)
        }
    }

    fn default_input_device(&self) -> DeviceIndex {
        self.inner.state.lock().default_input
    }

    fn default_output_device(&self) -> DeviceIndex {
        self.inner.state.lock().default_output
    }

    fn device_info(&self, device: DeviceIndex) -> Option<DeviceInfo> {
        let (name, inputs, outputs) = match device.0 {
            0 => ("Mock Microphone", 1, 0),
            1 => ("Mock Speakers", 0, 2),
            _ => return None,
        };
        Some(DeviceInfo {
            name: name.to_string(),
            max_input_channels: inputs,
            max_output_channels: outputs,
            default_low_input_latency: 0.01,
            default_low_output_latency: 0.01,
            default_high_input_latency: 0.1,
            default_high_output_latency: 0.1,
            default_sample_rate: 48000.0,
        })
    }
}

struct CaptureLogger;

thread_local! {
    static CAPTURED: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        CAPTURED.with(|captured| {
            captured
                .borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INSTALL: Once = Once::new();

/// Route log records into a per-thread buffer and clear this thread's buffer.
///
/// Each test runs on its own thread, so tests never see each other's logs.
pub fn capture_logs() {
    INSTALL.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);
    });
    CAPTURED.with(|captured| captured.borrow_mut().clear());
}

/// Warnings and errors logged on this thread since `capture_logs`.
pub fn logged_problems() -> Vec<String> {
    CAPTURED.with(|captured| {
        captured
            .borrow()
            .iter()
            .filter(|(level, _)| *level <= log::Level::Warn)
            .map(|(_, message)| message.clone())
            .collect()
    })
}
