//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `line`: Line assembly for byte-at-a-time consoles
//! - `fs`: Directory-backed [`FileSystem`](crate::traits::FileSystem) (requires `std`)
//! - `desktop`: stdin console, host clock and network for desktop runs (requires `std`)
//! - `esp32`: ESP32 with a hobby servo on GPIO13 (requires `esp32` feature)

pub mod line;
pub mod mock;

#[cfg(feature = "std")]
pub mod desktop;
#[cfg(feature = "std")]
pub mod fs;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use mock::*;

#[cfg(feature = "std")]
pub use desktop::*;
#[cfg(feature = "std")]
pub use fs::DirFileSystem;

#[cfg(feature = "esp32")]
pub use esp32::*;
