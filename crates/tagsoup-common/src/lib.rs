//! # Tagsoup Common
//!
//! Pieces shared by every tagsoup crate.
//!
//! ## Features
//!
//! - The HTML vocabulary the scanner consults: whitespace classification,
//!   trimming and the void element table
//! - Logging configuration and setup

pub mod html;
pub mod logging;

pub use html::{is_all_whitespace, is_void_element, is_whitespace, trim, VOID_ELEMENTS};
pub use logging::{init_logging, LogConfig, LogFormat};
