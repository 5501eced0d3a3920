//! The PHY-facing side of the MAC: the radio driver contract and the
//! frame buffer that crosses it.
//!
//! The MAC never talks to radio hardware directly. Everything it needs is
//! expressed through the [`RadioDriver`] trait: timed transmission and
//! reception for TSCH, clear channel assessment, channel selection, and a
//! handful of configuration hooks. A driver advertises what it can do
//! through [`Capabilities`]; TSCH refuses to start without timed TX and
//! RX.

pub mod config;
pub mod driver;

pub use config::{Channel, ChannelPage, DriverConfig};
pub use driver::{Capabilities, CcaResult, FrameBuffer, RadioDriver};

/// An error from the radio driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The medium or the driver is busy.
    Busy,
    /// The hardware reported a failure.
    Io,
    /// The requested operation or configuration is not supported.
    NotSupported,
    /// The requested channel is outside the supported ranges.
    InvalidChannel,
}

/// A type alias for `Result<T, phy::Error>`.
pub type Result<T> = core::result::Result<T, Error>;
