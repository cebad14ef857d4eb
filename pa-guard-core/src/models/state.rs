/// Ownership state of a [`DeviceStream`](crate::DeviceStream).
///
/// ```text
/// open ──► Open ──take()/close()──► Empty
/// ```
///
/// Whether an open stream is running is not tracked here; ask the library
/// through `is_active`/`is_stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No device handle owned; dropping is a no-op.
    Empty,
    /// Exactly one device handle owned.
    Open,
}

impl StreamState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}
