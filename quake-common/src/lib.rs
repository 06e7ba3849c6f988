//! # Quake Common Library
//!
//! Shared code for the quake bulletin services including:
//! - Error type
//! - Configuration loading
//! - Area code registry for crowd reports
//! - Record codes and bulletin enumerations
//! - Timestamp helpers

pub mod area;
pub mod codes;
pub mod config;
pub mod error;
pub mod time;

pub use area::Area;
pub use codes::{QuakeType, Scale};
pub use error::{Error, Result};
