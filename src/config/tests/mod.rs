//! Unit tests for configuration loading and precedence.
//!
//! - `helpers`: shared layer composition
//! - `precedence`: layer precedence
//! - `operation_mode`: operation mode determination
//! - `field_resolution`: token, URL, anchor and save frequency resolution
//! - `loading`: loading from real CLI arguments and environment

mod helpers;
