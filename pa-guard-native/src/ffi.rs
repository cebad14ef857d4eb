//! C layouts and entry point signatures of the PortAudio API.

use std::ffi::c_void;
use std::os::raw::{c_char, c_int, c_ulong};

use pa_guard_core::{StreamCallback, StreamParameters};

pub type PaError = c_int;
pub type PaDeviceIndex = c_int;
pub type PaHostApiIndex = c_int;
pub type PaSampleFormat = c_ulong;
pub type PaStreamFlags = c_ulong;
pub type PaTime = f64;
pub type PaStream = c_void;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PaStreamParameters {
    pub device: PaDeviceIndex,
    pub channel_count: c_int,
    pub sample_format: PaSampleFormat,
    pub suggested_latency: PaTime,
    pub host_api_specific_stream_info: *mut c_void,
}

impl From<&StreamParameters> for PaStreamParameters {
    fn from(params: &StreamParameters) -> Self {
        Self {
            device: params.device.0,
            channel_count: params.channel_count,
            sample_format: params.sample_format.with_layout(params.non_interleaved) as PaSampleFormat,
            suggested_latency: params.suggested_latency,
            host_api_specific_stream_info: std::ptr::null_mut(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PaStreamInfo {
    pub struct_version: c_int,
    pub input_latency: PaTime,
    pub output_latency: PaTime,
    pub sample_rate: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PaDeviceInfo {
    pub struct_version: c_int,
    pub name: *const c_char,
    pub host_api: PaHostApiIndex,
    pub max_input_channels: c_int,
    pub max_output_channels: c_int,
    pub default_low_input_latency: PaTime,
    pub default_low_output_latency: PaTime,
    pub default_high_input_latency: PaTime,
    pub default_high_output_latency: PaTime,
    pub default_sample_rate: f64,
}

pub type PaInitialize = unsafe extern "C" fn() -> PaError;
pub type PaTerminate = unsafe extern "C" fn() -> PaError;
pub type PaOpenDefaultStream = unsafe extern "C" fn(
    stream: *mut *mut PaStream,
    num_input_channels: c_int,
    num_output_channels: c_int,
    sample_format: PaSampleFormat,
    sample_rate: f64,
    frames_per_buffer: c_ulong,
    stream_callback: Option<StreamCallback>,
    user_data: *mut c_void,
) -> PaError;
pub type PaOpenStream = unsafe extern "C" fn(
    stream: *mut *mut PaStream,
    input_parameters: *const PaStreamParameters,
    output_parameters: *const PaStreamParameters,
    sample_rate: f64,
    frames_per_buffer: c_ulong,
    stream_flags: PaStreamFlags,
    stream_callback: Option<StreamCallback>,
    user_data: *mut c_void,
) -> PaError;
pub type PaStreamCall = unsafe extern "C" fn(stream: *mut PaStream) -> PaError;
pub type PaWriteStream = unsafe extern "C" fn(stream: *mut PaStream, buffer: *const c_void, frames: c_ulong) -> PaError;
pub type PaGetStreamInfo = unsafe extern "C" fn(stream: *mut PaStream) -> *const PaStreamInfo;
pub type PaGetErrorText = unsafe extern "C" fn(error_code: PaError) -> *const c_char;
pub type PaGetVersionText = unsafe extern "C" fn() -> *const c_char;
pub type PaGetDeviceIndex = unsafe extern "C" fn() -> PaDeviceIndex;
pub type PaGetDeviceInfo = unsafe extern "C" fn(device: PaDeviceIndex) -> *const PaDeviceInfo;
