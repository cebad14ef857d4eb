use std::ffi::c_void;
use std::fmt;
use std::mem;

use crate::models::config::{DefaultStreamConfig, Sample, SampleFormat, StreamConfig};
use crate::models::device::StreamInfo;
use crate::models::error::{check, Error, ErrorCode, Operation, Result};
use crate::models::state::StreamState;
use crate::session::library::LibrarySession;
use crate::traits::host::{AudioHost, CallbackBinding};

/// What `write` needs to know about the buffers a stream accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OutputLayout {
    channels: i32,
    sample_format: SampleFormat,
    non_interleaved: bool,
    uses_callback: bool,
}

impl OutputLayout {
    fn check_write<S: Sample>(&self, samples: usize, frames: usize) -> std::result::Result<(), ErrorCode> {
        if self.uses_callback {
            return Err(ErrorCode::CAN_NOT_WRITE_TO_A_CALLBACK_STREAM);
        }
        if self.channels <= 0 {
            return Err(ErrorCode::CAN_NOT_WRITE_TO_AN_INPUT_ONLY_STREAM);
        }
        if self.non_interleaved
            || S::FORMAT != self.sample_format
            || mem::size_of::<S>() != self.sample_format.sample_size()
        {
            return Err(ErrorCode::SAMPLE_FORMAT_NOT_SUPPORTED);
        }
        let needed = frames
            .checked_mul(self.channels as usize)
            .ok_or(ErrorCode::BUFFER_TOO_BIG)?;
        if samples < needed {
            return Err(ErrorCode::BAD_BUFFER_PTR);
        }
        Ok(())
    }
}

/// Exclusive owner of one open audio stream.
///
/// The native handle is closed exactly once: on [`close`](Self::close) or on
/// drop, whichever comes first. [`take`](Self::take) moves the handle into a
/// new value and leaves this one empty, so the old owner's drop does
/// nothing. Assigning over an open stream closes its handle before the new
/// one is stored.
///
/// Release on drop is best effort: a running stream is aborted, then
/// closed, and failures go to the log instead of the caller.
pub struct DeviceStream<'s, H: AudioHost> {
    session: &'s LibrarySession<H>,
    handle: Option<H::Stream>,
    layout: OutputLayout,
}

impl<'s, H: AudioHost> DeviceStream<'s, H> {
    /// Open a stream on the platform default input and/or output device.
    ///
    /// Without a `callback` the stream is in blocking mode and audio is
    /// pushed with [`write`](Self::write). With one, the library calls it
    /// from its own real-time thread once the stream is started.
    pub fn open_default(
        session: &'s LibrarySession<H>,
        config: &DefaultStreamConfig,
        callback: Option<CallbackBinding>,
    ) -> Result<Self> {
        let host = session.host();
        config
            .validate()
            .map_err(|code| Error::from_status(host, Operation::OpenDefault, code))?;

        let handle = check(host, Operation::OpenDefault, host.open_default_stream(config, callback))?;
        log::debug!(
            "opened default stream {:?}: {} in / {} out, {:?} @ {} Hz",
            handle,
            config.input_channels,
            config.output_channels,
            config.sample_format,
            config.sample_rate
        );

        Ok(Self {
            session,
            handle: Some(handle),
            layout: OutputLayout {
                channels: config.output_channels,
                sample_format: config.sample_format,
                non_interleaved: config.non_interleaved,
                uses_callback: callback.is_some(),
            },
        })
    }

    /// Open a stream on explicitly chosen devices.
    pub fn open(session: &'s LibrarySession<H>, config: &StreamConfig, callback: Option<CallbackBinding>) -> Result<Self> {
        let host = session.host();
        config
            .validate()
            .map_err(|code| Error::from_status(host, Operation::OpenExplicit, code))?;

        let handle = check(host, Operation::OpenExplicit, host.open_stream(config, callback))?;
        log::debug!(
            "opened stream {:?}: input {:?}, output {:?} @ {} Hz",
            handle,
            config.input.as_ref().map(|p| p.device),
            config.output.as_ref().map(|p| p.device),
            config.sample_rate
        );

        let layout = match &config.output {
            Some(output) => OutputLayout {
                channels: output.channel_count,
                sample_format: output.sample_format,
                non_interleaved: output.non_interleaved,
                uses_callback: callback.is_some(),
            },
            None => OutputLayout {
                channels: 0,
                sample_format: SampleFormat::default(),
                non_interleaved: false,
                uses_callback: callback.is_some(),
            },
        };

        Ok(Self {
            session,
            handle: Some(handle),
            layout,
        })
    }

    pub fn session(&self) -> &'s LibrarySession<H> {
        self.session
    }

    pub fn state(&self) -> StreamState {
        if self.handle.is_some() {
            StreamState::Open
        } else {
            StreamState::Empty
        }
    }

    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Begin processing audio.
    pub fn start(&mut self) -> Result<()> {
        let stream = self.handle(Operation::Start)?;
        // SAFETY: `stream` is owned by `self` and has not been closed.
        check(self.host(), Operation::Start, unsafe { self.host().start_stream(stream) })?;
        log::debug!("stream {:?} started", stream);
        Ok(())
    }

    /// Play out buffered audio, then halt.
    ///
    /// A stream that is already stopped (for instance because its callback
    /// returned `Complete`) is not an error.
    pub fn stop(&mut self) -> Result<()> {
        let stream = self.handle(Operation::Stop)?;
        // SAFETY: `stream` is owned by `self` and has not been closed.
        match unsafe { self.host().stop_stream(stream) } {
            Ok(()) => log::debug!("stream {:?} stopped", stream),
            Err(ErrorCode::STREAM_IS_STOPPED) => log::debug!("stream {:?} was already stopped", stream),
            Err(code) => return Err(Error::from_status(self.host(), Operation::Stop, code)),
        }
        Ok(())
    }

    /// Halt immediately, discarding buffered audio.
    pub fn abort(&mut self) -> Result<()> {
        let stream = self.handle(Operation::Abort)?;
        // SAFETY: `stream` is owned by `self` and has not been closed.
        check(self.host(), Operation::Abort, unsafe { self.host().abort_stream(stream) })?;
        log::debug!("stream {:?} aborted", stream);
        Ok(())
    }

    /// Write `frames` interleaved frames from `buffer`, blocking until the
    /// device has accepted all of them.
    ///
    /// Only for streams opened without a callback, with interleaved output
    /// in the format `S` stands for. `buffer` must hold at least
    /// `frames * channels` samples. Whether a stopped stream accepts data is
    /// up to the library; this call never starts the stream itself.
    pub fn write<S: Sample>(&mut self, buffer: &[S], frames: usize) -> Result<()> {
        self.handle(Operation::Write)?;
        self.layout
            .check_write::<S>(buffer.len(), frames)
            .map_err(|code| Error::from_status(self.host(), Operation::Write, code))?;

        // SAFETY: the layout check guarantees `buffer` covers `frames`
        // interleaved frames of the stream's sample format.
        unsafe { self.write_raw(buffer.as_ptr().cast(), frames as u64) }
    }

    /// Write `frames` frames from a buffer in any layout the stream accepts.
    ///
    /// For non-interleaved streams `buffer` points to an array of channel
    /// buffer pointers.
    ///
    /// # Safety
    ///
    /// `buffer` must be valid for reads of `frames` frames in the layout and
    /// sample format the stream was opened with.
    pub unsafe fn write_raw(&mut self, buffer: *const c_void, frames: u64) -> Result<()> {
        let stream = self.handle(Operation::Write)?;
        let status = self.host().write_stream(stream, buffer, frames);
        check(self.host(), Operation::Write, status)?;
        log::trace!("wrote {} frames to stream {:?}", frames, stream);
        Ok(())
    }

    /// Whether the stream is currently processing audio.
    pub fn is_active(&self) -> Result<bool> {
        let stream = self.handle(Operation::IsActive)?;
        // SAFETY: `stream` is owned by `self` and has not been closed.
        check(self.host(), Operation::IsActive, unsafe { self.host().is_stream_active(stream) })
    }

    /// Whether the stream is stopped (never started, stopped or aborted).
    pub fn is_stopped(&self) -> Result<bool> {
        let stream = self.handle(Operation::IsStopped)?;
        // SAFETY: `stream` is owned by `self` and has not been closed.
        check(self.host(), Operation::IsStopped, unsafe { self.host().is_stream_stopped(stream) })
    }

    /// Latencies and sample rate the library actually chose.
    pub fn info(&self) -> Result<StreamInfo> {
        let stream = self.handle(Operation::StreamInfo)?;
        // SAFETY: `stream` is owned by `self` and has not been closed.
        unsafe { self.host().stream_info(stream) }
            .ok_or_else(|| Error::from_status(self.host(), Operation::StreamInfo, ErrorCode::BAD_STREAM_PTR))
    }

    /// Close the stream now and report failure to the caller.
    ///
    /// The handle is given up even if closing fails, so drop will not try
    /// again. Closing an empty stream does nothing.
    pub fn close(&mut self) -> Result<()> {
        let Some(stream) = self.handle.take() else {
            return Ok(());
        };
        // SAFETY: the handle was just taken out of `self`, so it is closed once.
        check(self.host(), Operation::Close, unsafe { self.host().close_stream(stream) })?;
        log::debug!("stream {:?} closed", stream);
        Ok(())
    }

    /// Move the handle into a new value, leaving `self` empty.
    pub fn take(&mut self) -> Self {
        Self {
            session: self.session,
            handle: self.handle.take(),
            layout: self.layout,
        }
    }

    /// Release the current handle (best effort, like drop), then adopt
    /// `other`'s. Same as `*self = other`.
    pub fn replace(&mut self, other: Self) {
        *self = other;
    }

    fn host(&self) -> &'s H {
        self.session.host()
    }

    fn handle(&self, operation: Operation) -> Result<H::Stream> {
        self.handle
            .ok_or_else(|| Error::from_status(self.host(), operation, ErrorCode::BAD_STREAM_PTR))
    }

    fn release(&mut self) {
        let Some(stream) = self.handle.take() else {
            return;
        };
        let host = self.host();

        // SAFETY: the handle was just taken out of `self`; it is queried,
        // possibly aborted, and closed exactly once here.
        unsafe {
            if let Ok(true) = host.is_stream_active(stream) {
                if let Err(code) = host.abort_stream(stream) {
                    log::warn!("{}", Error::from_status(host, Operation::Abort, code));
                }
            }
            match host.close_stream(stream) {
                Ok(()) => log::debug!("stream {:?} released", stream),
                Err(code) => log::error!("{}", Error::from_status(host, Operation::Close, code)),
            }
        }
    }
}

impl<H: AudioHost> Drop for DeviceStream<'_, H> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<H: AudioHost> fmt::Debug for DeviceStream<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceStream")
            .field("handle", &self.handle)
            .field("layout", &self.layout)
            .finish()
    }
}
