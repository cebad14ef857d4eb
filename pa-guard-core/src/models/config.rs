use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use super::device::DeviceIndex;
use super::error::ErrorCode;

/// Let the library pick the buffer size, possibly varying between callbacks.
pub const FRAMES_PER_BUFFER_UNSPECIFIED: u64 = 0;

/// Bit marking a non-interleaved layout (one buffer per channel).
pub const NON_INTERLEAVED_BIT: u64 = 0x8000_0000;

/// Sample encoding of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    #[default]
    Float32,
    Int32,
    Int24,
    Int16,
    Int8,
    UInt8,
}

impl SampleFormat {
    /// The library's bit value for this format.
    pub fn bits(self) -> u64 {
        match self {
            Self::Float32 => 0x0000_0001,
            Self::Int32 => 0x0000_0002,
            Self::Int24 => 0x0000_0004,
            Self::Int16 => 0x0000_0008,
            Self::Int8 => 0x0000_0010,
            Self::UInt8 => 0x0000_0020,
        }
    }

    /// Format bits plus the non-interleaved flag when requested.
    pub fn with_layout(self, non_interleaved: bool) -> u64 {
        if non_interleaved {
            self.bits() | NON_INTERLEAVED_BIT
        } else {
            self.bits()
        }
    }

    /// Bytes per sample; 24-bit samples are packed.
    pub fn sample_size(self) -> usize {
        match self {
            Self::Float32 | Self::Int32 => 4,
            Self::Int24 => 3,
            Self::Int16 => 2,
            Self::Int8 | Self::UInt8 => 1,
        }
    }
}

pub(crate) mod sealed {
    pub trait Sealed {}

    impl Sealed for f32 {}
    impl Sealed for i32 {}
    impl Sealed for i16 {}
    impl Sealed for i8 {}
    impl Sealed for u8 {}
}

/// Rust sample types that map directly onto a [`SampleFormat`].
///
/// Sealed: every implementor is exactly [`SampleFormat::sample_size`]
/// bytes wide, which the safe [`DeviceStream::write`](crate::DeviceStream::write)
/// relies on. Packed 24-bit audio has no native type; write it with
/// [`DeviceStream::write_raw`](crate::DeviceStream::write_raw).
pub trait Sample: sealed::Sealed + Copy + 'static {
    const FORMAT: SampleFormat;
}

impl Sample for f32 {
    const FORMAT: SampleFormat = SampleFormat::Float32;
}

impl Sample for i32 {
    const FORMAT: SampleFormat = SampleFormat::Int32;
}

impl Sample for i16 {
    const FORMAT: SampleFormat = SampleFormat::Int16;
}

impl Sample for i8 {
    const FORMAT: SampleFormat = SampleFormat::Int8;
}

impl Sample for u8 {
    const FORMAT: SampleFormat = SampleFormat::UInt8;
}

/// Flags modifying how an explicitly parameterized stream behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamFlags(pub u64);

impl StreamFlags {
    pub const NO_FLAG: Self = Self(0);
    /// Disable default clipping of out of range samples.
    pub const CLIP_OFF: Self = Self(0x0000_0001);
    /// Disable default dithering.
    pub const DITHER_OFF: Self = Self(0x0000_0002);
    /// Full duplex only: never discard overflowed input.
    pub const NEVER_DROP_INPUT: Self = Self(0x0000_0004);
    /// Fill initial output buffers from the callback instead of silence.
    pub const PRIME_OUTPUT_BUFFERS_USING_STREAM_CALLBACK: Self = Self(0x0000_0008);

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for StreamFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for StreamFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Configuration for a stream on the platform default devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultStreamConfig {
    /// Input channels; 0 opens an output-only stream.
    pub input_channels: i32,

    /// Output channels; 0 opens an input-only stream.
    pub output_channels: i32,

    pub sample_format: SampleFormat,

    /// One buffer per channel instead of interleaved frames.
    pub non_interleaved: bool,

    /// Sample rate in Hz (default: 44100).
    pub sample_rate: f64,

    /// Frames per callback/buffer, or [`FRAMES_PER_BUFFER_UNSPECIFIED`].
    pub frames_per_buffer: u64,
}

impl DefaultStreamConfig {
    /// Output-only interleaved stream, the common playback case.
    pub fn output(channels: i32, sample_format: SampleFormat, sample_rate: f64) -> Self {
        Self {
            input_channels: 0,
            output_channels: channels,
            sample_format,
            sample_rate,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ErrorCode> {
        validate_sample_rate(self.sample_rate)?;
        if self.input_channels < 0 || self.output_channels < 0 {
            return Err(ErrorCode::INVALID_CHANNEL_COUNT);
        }
        if self.input_channels == 0 && self.output_channels == 0 {
            return Err(ErrorCode::INVALID_CHANNEL_COUNT);
        }
        Ok(())
    }
}

impl Default for DefaultStreamConfig {
    fn default() -> Self {
        Self {
            input_channels: 0,
            output_channels: 2,
            sample_format: SampleFormat::Float32,
            non_interleaved: false,
            sample_rate: 44100.0,
            frames_per_buffer: FRAMES_PER_BUFFER_UNSPECIFIED,
        }
    }
}

/// One direction (input or output) of an explicitly parameterized stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamParameters {
    pub device: DeviceIndex,
    pub channel_count: i32,
    pub sample_format: SampleFormat,
    pub non_interleaved: bool,

    /// Desired latency in seconds; the library rounds to what the device supports.
    pub suggested_latency: f64,
}

impl StreamParameters {
    pub fn new(device: DeviceIndex, channel_count: i32, sample_format: SampleFormat) -> Self {
        Self {
            device,
            channel_count,
            sample_format,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), ErrorCode> {
        if self.device.0 < 0 {
            return Err(ErrorCode::INVALID_DEVICE);
        }
        if self.channel_count <= 0 {
            return Err(ErrorCode::INVALID_CHANNEL_COUNT);
        }
        Ok(())
    }
}

impl Default for StreamParameters {
    fn default() -> Self {
        Self {
            device: DeviceIndex(0),
            channel_count: 2,
            sample_format: SampleFormat::Float32,
            non_interleaved: false,
            suggested_latency: 0.0,
        }
    }
}

/// Configuration for a stream on explicitly chosen devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub input: Option<StreamParameters>,
    pub output: Option<StreamParameters>,
    pub sample_rate: f64,
    pub frames_per_buffer: u64,
    pub flags: StreamFlags,
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), ErrorCode> {
        validate_sample_rate(self.sample_rate)?;
        if self.input.is_none() && self.output.is_none() {
            return Err(ErrorCode::INVALID_DEVICE);
        }
        if let Some(input) = &self.input {
            input.validate()?;
        }
        if let Some(output) = &self.output {
            output.validate()?;
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            sample_rate: 44100.0,
            frames_per_buffer: FRAMES_PER_BUFFER_UNSPECIFIED,
            flags: StreamFlags::NO_FLAG,
        }
    }
}

fn validate_sample_rate(sample_rate: f64) -> Result<(), ErrorCode> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(ErrorCode::INVALID_SAMPLE_RATE)
    }
}
