//! # pa-guard-native
//!
//! PortAudio backend for `pa-guard-core`.
//!
//! The shared library is opened at runtime, so binaries build and start on
//! machines without PortAudio and report [`LoadError`] instead.
//!
//! Lookup order:
//! - `$PORTAUDIO_LIBRARY`, when set
//! - `libportaudio.so.2` / `libportaudio.so` (Linux and other Unix)
//! - `libportaudio.2.dylib` / `libportaudio.dylib` (macOS)
//! - `portaudio.dll` / `portaudio_x64.dll` / `libportaudio-2.dll` (Windows)
//!
//! ## Usage
//! ```ignore
//! use pa_guard_core::{DefaultStreamConfig, DeviceStream, LibrarySession};
//! use pa_guard_native::NativeHost;
//!
//! let session = LibrarySession::new(NativeHost::load()?)?;
//! let mut stream = DeviceStream::open_default(&session, &DefaultStreamConfig::default(), None)?;
//! stream.start()?;
//! stream.write(&[0.0f32; 512], 256)?;
//! stream.stop()?;
//! ```

mod ffi;
pub mod host;
pub mod library;

pub use host::{NativeHost, NativeStream};
pub use library::{LoadError, LIBRARY_PATH_ENV};
