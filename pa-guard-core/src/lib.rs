//! # pa-guard-core
//!
//! Ownership layer over a callback-driven audio I/O library.
//!
//! Guarantees that library initialization and every opened device stream
//! are released exactly once, in the right order, whether a scope ends
//! normally, through `?`, or by unwinding. The native library sits behind
//! the [`AudioHost`] trait; `pa-guard-native` provides the PortAudio
//! implementation.
//!
//! ## Architecture
//!
//! ```text
//! pa-guard-core (this crate)
//! ├── traits/   ← AudioHost, StreamCallback, CallbackBinding
//! ├── models/   ← Error, ErrorCode, Operation, stream configs, device info
//! └── session/  ← LibrarySession, DeviceStream
//! ```
//!
//! ## Usage
//! ```ignore
//! use pa_guard_core::{DefaultStreamConfig, LibrarySession, SampleFormat};
//! use pa_guard_native::NativeHost;
//!
//! let session = LibrarySession::new(NativeHost::load()?)?;
//! let config = DefaultStreamConfig::output(2, SampleFormat::Float32, 44100.0);
//! let mut stream = session.open_default_stream(&config, None)?;
//! stream.start()?;
//! stream.write(&samples, samples.len() / 2)?;
//! stream.stop()?;
//! // `stream` closes, then `session` terminates the library.
//! ```

pub mod models;
pub mod session;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience.
pub use models::config::{
    DefaultStreamConfig, Sample, SampleFormat, StreamConfig, StreamFlags, StreamParameters,
    FRAMES_PER_BUFFER_UNSPECIFIED, NON_INTERLEAVED_BIT,
};
pub use models::device::{DeviceIndex, DeviceInfo, StreamInfo};
pub use models::error::{Error, ErrorCode, Operation, Result};
pub use models::state::StreamState;
pub use session::device_stream::DeviceStream;
pub use session::library::LibrarySession;
pub use traits::host::{status_flags, AudioHost, CallbackBinding, CallbackResult, StreamCallback, StreamCallbackTimeInfo};
