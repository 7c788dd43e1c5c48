pub mod log_format;
