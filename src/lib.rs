#![doc = include_str!("../README.md")]
#![no_std]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod commands;
mod driver;
mod error;
pub mod event;
pub mod settings;
pub mod soft_spi;
pub mod status;
pub mod transport;

pub use driver::{Config, Ls7366r, SignMode};
pub use error::Error;
pub use soft_spi::SoftSpi;
pub use transport::{HardSpi, Transport};
