use std::fmt;
use std::sync::atomic::Ordering;

use crate::models::config::{DefaultStreamConfig, StreamConfig};
use crate::models::device::{DeviceIndex, DeviceInfo};
use crate::models::error::{check, Error, ErrorCode, Operation, Result};
use crate::session::device_stream::DeviceStream;
use crate::traits::host::{AudioHost, CallbackBinding};

/// Proof that the audio library is initialized.
///
/// Construction initializes the library, dropping terminates it. At most
/// one session per library can be live; a second `new` fails until the
/// first is dropped. Streams borrow the session, so they are always dropped
/// before it.
///
/// ```text
/// uninitialized ──new()──► live ──drop──► terminated
/// ```
pub struct LibrarySession<H: AudioHost> {
    host: H,
}

impl<H: AudioHost> LibrarySession<H> {
    /// Initialize the library behind `host`.
    ///
    /// Fails with [`ErrorCode::CAN_NOT_INITIALIZE_RECURSIVELY`] while another
    /// session of the same library is live. When initialization itself
    /// fails no teardown is attempted.
    pub fn new(host: H) -> Result<Self> {
        if host.session_flag().swap(true, Ordering::AcqRel) {
            return Err(Error::from_status(
                &host,
                Operation::Initialize,
                ErrorCode::CAN_NOT_INITIALIZE_RECURSIVELY,
            ));
        }

        if let Err(code) = host.initialize() {
            host.session_flag().store(false, Ordering::Release);
            return Err(Error::from_status(&host, Operation::Initialize, code));
        }

        log::debug!("audio library initialized: {}", host.version_text());
        Ok(Self { host })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Open a stream on the default devices. See [`DeviceStream::open_default`].
    pub fn open_default_stream(
        &self,
        config: &DefaultStreamConfig,
        callback: Option<CallbackBinding>,
    ) -> Result<DeviceStream<'_, H>> {
        DeviceStream::open_default(self, config, callback)
    }

    /// Open a stream on explicit devices. See [`DeviceStream::open`].
    pub fn open_stream(&self, config: &StreamConfig, callback: Option<CallbackBinding>) -> Result<DeviceStream<'_, H>> {
        DeviceStream::open(self, config, callback)
    }

    pub fn version_text(&self) -> String {
        self.host.version_text()
    }

    pub fn device_count(&self) -> Result<i32> {
        check(&self.host, Operation::DeviceCount, self.host.device_count())
    }

    pub fn default_input_device(&self) -> Option<DeviceIndex> {
        Some(self.host.default_input_device()).filter(|device| *device != DeviceIndex::NO_DEVICE)
    }

    pub fn default_output_device(&self) -> Option<DeviceIndex> {
        Some(self.host.default_output_device()).filter(|device| *device != DeviceIndex::NO_DEVICE)
    }

    pub fn device_info(&self, device: DeviceIndex) -> Option<DeviceInfo> {
        self.host.device_info(device)
    }
}

impl<H: AudioHost> Drop for LibrarySession<H> {
    fn drop(&mut self) {
        match self.host.terminate() {
            Ok(()) => log::debug!("audio library terminated"),
            Err(code) => log::error!("{}", Error::from_status(&self.host, Operation::Terminate, code)),
        }
        self.host.session_flag().store(false, Ordering::Release);
    }
}

impl<H: AudioHost> fmt::Debug for LibrarySession<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibrarySession").finish_non_exhaustive()
    }
}
