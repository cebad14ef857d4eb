//! Locating and loading the PortAudio shared library.

use std::env;
use std::ffi::OsString;
use std::path::Path;

use libloading::Library;
use thiserror::Error;

use crate::ffi;

/// Environment variable naming an explicit PortAudio library to load.
pub const LIBRARY_PATH_ENV: &str = "PORTAUDIO_LIBRARY";

#[cfg(target_os = "windows")]
const PLATFORM_CANDIDATES: &[&str] = &["portaudio.dll", "portaudio_x64.dll", "libportaudio-2.dll"];

#[cfg(target_os = "macos")]
const PLATFORM_CANDIDATES: &[&str] = &["libportaudio.2.dylib", "libportaudio.dylib"];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const PLATFORM_CANDIDATES: &[&str] = &["libportaudio.so.2", "libportaudio.so"];

/// Errors raised while loading PortAudio, before any session exists.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("PortAudio library not found (tried: {})", .tried.join(", "))]
    LibraryNotFound { tried: Vec<String> },

    #[error("failed to load {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: libloading::Error,
    },

    #[error("PortAudio library lacks `{symbol}`: {source}")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },
}

/// Names to try, in order: the override (if set) first, then the
/// platform's usual file names.
pub(crate) fn library_candidates(override_path: Option<OsString>) -> Vec<OsString> {
    override_path
        .into_iter()
        .filter(|path| !path.is_empty())
        .chain(PLATFORM_CANDIDATES.iter().map(OsString::from))
        .collect()
}

/// The loaded library and every entry point this crate calls.
///
/// Function pointers stay valid for as long as `_lib` is loaded, which is
/// the lifetime of this value.
pub(crate) struct PortAudioLibrary {
    pub initialize: ffi::PaInitialize,
    pub terminate: ffi::PaTerminate,
    pub open_default_stream: ffi::PaOpenDefaultStream,
    pub open_stream: ffi::PaOpenStream,
    pub start_stream: ffi::PaStreamCall,
    pub stop_stream: ffi::PaStreamCall,
    pub abort_stream: ffi::PaStreamCall,
    pub close_stream: ffi::PaStreamCall,
    pub is_stream_active: ffi::PaStreamCall,
    pub is_stream_stopped: ffi::PaStreamCall,
    pub write_stream: ffi::PaWriteStream,
    pub get_stream_info: ffi::PaGetStreamInfo,
    pub get_error_text: ffi::PaGetErrorText,
    pub get_version_text: ffi::PaGetVersionText,
    pub get_device_count: ffi::PaGetDeviceIndex,
    pub get_default_input_device: ffi::PaGetDeviceIndex,
    pub get_default_output_device: ffi::PaGetDeviceIndex,
    pub get_device_info: ffi::PaGetDeviceInfo,
    _lib: Library,
}

impl PortAudioLibrary {
    /// Load from the override path or the first platform name that opens.
    pub fn load() -> Result<Self, LoadError> {
        let candidates = library_candidates(env::var_os(LIBRARY_PATH_ENV));
        let mut tried = Vec::with_capacity(candidates.len());

        for candidate in &candidates {
            // SAFETY: loading PortAudio runs only its library constructors,
            // which have no preconditions.
            match unsafe { Library::new(candidate) } {
                Ok(lib) => {
                    log::debug!("loaded PortAudio from {}", candidate.to_string_lossy());
                    return Self::resolve(lib);
                }
                Err(e) => {
                    log::debug!("could not load {}: {}", candidate.to_string_lossy(), e);
                    tried.push(candidate.to_string_lossy().into_owned());
                }
            }
        }

        Err(LoadError::LibraryNotFound { tried })
    }

    pub fn load_from(path: &Path) -> Result<Self, LoadError> {
        // SAFETY: see `load`.
        let lib = unsafe { Library::new(path) }.map_err(|source| LoadError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::resolve(lib)
    }

    fn resolve(lib: Library) -> Result<Self, LoadError> {
        // SAFETY: every type below matches the PortAudio V19 prototype of the
        // symbol it is resolved from.
        unsafe {
            Ok(Self {
                initialize: symbol(&lib, "Pa_Initialize")?,
                terminate: symbol(&lib, "Pa_Terminate")?,
                open_default_stream: symbol(&lib, "Pa_OpenDefaultStream")?,
                open_stream: symbol(&lib, "Pa_OpenStream")?,
                start_stream: symbol(&lib, "Pa_StartStream")?,
                stop_stream: symbol(&lib, "Pa_StopStream")?,
                abort_stream: symbol(&lib, "Pa_AbortStream")?,
                close_stream: symbol(&lib, "Pa_CloseStream")?,
                is_stream_active: symbol(&lib, "Pa_IsStreamActive")?,
                is_stream_stopped: symbol(&lib, "Pa_IsStreamStopped")?,
                write_stream: symbol(&lib, "Pa_WriteStream")?,
                get_stream_info: symbol(&lib, "Pa_GetStreamInfo")?,
                get_error_text: symbol(&lib, "Pa_GetErrorText")?,
                get_version_text: symbol(&lib, "Pa_GetVersionText")?,
                get_device_count: symbol(&lib, "Pa_GetDeviceCount")?,
                get_default_input_device: symbol(&lib, "Pa_GetDefaultInputDevice")?,
                get_default_output_device: symbol(&lib, "Pa_GetDefaultOutputDevice")?,
                get_device_info: symbol(&lib, "Pa_GetDeviceInfo")?,
                _lib: lib,
            })
        }
    }
}

/// # Safety
/// `T` must be the exact function pointer type of `name`.
unsafe fn symbol<T: Copy>(lib: &Library, name: &'static str) -> Result<T, LoadError> {
    lib.get::<T>(name.as_bytes())
        .map(|sym| *sym)
        .map_err(|source| LoadError::MissingSymbol { symbol: name, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_is_tried_first() {
        let candidates = library_candidates(Some(OsString::from("/opt/pa/libportaudio.so")));
        assert_eq!(candidates[0], OsString::from("/opt/pa/libportaudio.so"));
        assert_eq!(candidates.len(), PLATFORM_CANDIDATES.len() + 1);
    }

    #[test]
    fn empty_override_is_ignored() {
        let candidates = library_candidates(Some(OsString::new()));
        assert_eq!(candidates.len(), PLATFORM_CANDIDATES.len());
        assert!(!candidates.is_empty());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = PortAudioLibrary::load_from(Path::new("/nonexistent/libportaudio.so.2"))
            .err()
            .unwrap();
        match &err {
            LoadError::Open { path, .. } => assert_eq!(path, "/nonexistent/libportaudio.so.2"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("failed to load /nonexistent/libportaudio.so.2"));
    }

    #[test]
    fn not_found_lists_every_candidate() {
        let err = LoadError::LibraryNotFound {
            tried: vec!["a.so".into(), "b.so".into()],
        };
        assert_eq!(err.to_string(), "PortAudio library not found (tried: a.so, b.so)");
    }
}
