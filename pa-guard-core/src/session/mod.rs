pub mod device_stream;
pub mod library;
