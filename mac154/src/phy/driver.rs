//! The radio driver contract.

use core::future::Future;

use bitflags::bitflags;

use super::config::{ChannelPage, DriverConfig};
use super::Result;
use crate::time::NetTime;

bitflags! {
    /// Hardware capabilities a driver advertises to the MAC.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        /// The radio can transmit at an absolute timestamp.
        const TIMED_TX = 0b0000_0001;
        /// The radio can open a reception window at an absolute
        /// timestamp.
        const TIMED_RX = 0b0000_0010;
        /// The radio acknowledges received frames itself.
        const AUTO_ACK = 0b0000_0100;
    }
}

/// The result of a clear channel assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcaResult {
    /// The channel is idle.
    Idle,
    /// Energy was detected on the channel.
    Busy,
}

/// A buffer holding one frame on its way through the driver.
///
/// The buffer is sized for the largest MPDU plus one octet of slack for
/// radios that prepend a length byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    /// The frame octets.
    pub buffer: [u8; 128],
    /// The number of valid octets in `buffer`.
    pub len: usize,
    /// For TX: the absolute time the first symbol must leave the antenna.
    /// For RX: the timestamp the driver captured for the incoming frame.
    pub timestamp: Option<NetTime>,
}

impl FrameBuffer {
    /// Return the valid frame octets.
    pub fn frame(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Return the valid frame octets mutably.
    pub fn frame_mut(&mut self) -> &mut [u8] {
        &mut self.buffer[..self.len]
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self {
            buffer: [0u8; 128],
            len: 0,
            timestamp: None,
        }
    }
}

/// The driver interface the MAC core is written against.
///
/// Blocking radio work (CCA, transmission) is async; bookkeeping
/// (capabilities, channel validity) is not. A driver only needs to
/// implement what its hardware supports and advertise the rest away
/// through [`capabilities`].
///
/// [`capabilities`]: RadioDriver::capabilities
pub trait RadioDriver {
    /// Return the hardware capabilities.
    fn capabilities(&self) -> Capabilities;

    /// Tune the radio to the given channel.
    fn set_channel(&mut self, channel: u16) -> Result<()>;

    /// Perform one clear channel assessment on the current channel.
    fn cca(&mut self) -> impl Future<Output = Result<CcaResult>>;

    /// Apply a configuration request.
    fn configure(&mut self, config: DriverConfig<'_>) -> Result<()>;

    /// Transmit a frame. When the buffer carries a timestamp and the
    /// driver has [`Capabilities::TIMED_TX`], the first symbol leaves the
    /// antenna at that time.
    fn send(&mut self, frame: &mut FrameBuffer) -> impl Future<Output = Result<()>>;

    /// Return the channel page the radio currently operates on.
    fn channel_page(&self) -> ChannelPage;

    /// Returns `true` when the given channel is usable on the current
    /// page.
    fn verify_channel(&self, channel: u16) -> bool;

    /// Return the supported channel ranges, inclusive on both ends.
    fn supported_channel_ranges(&self) -> &[(u16, u16)];
}
