//! Radio configuration types.

use crate::time::NetTime;

/// An IEEE 802.15.4 channel page.
///
/// The page selects the PHY family and with it the timeslot template the
/// MAC applies in TSCH mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelPage {
    /// Page 0: the 2.4 GHz O-QPSK PHY (channels 11-26).
    #[default]
    Oqpsk2450 = 0,
    /// Page 2: the sub-GHz O-QPSK PHY (channels 0-10).
    OqpskSubGhz = 2,
    /// Page 9: SUN PHYs with frequency hopping.
    Sun = 9,
}

impl ChannelPage {
    /// Returns `true` for the sub-GHz pages, which use the slower
    /// timeslot template.
    pub fn is_sub_ghz(&self) -> bool {
        !matches!(self, ChannelPage::Oqpsk2450)
    }
}

/// An IEEE 802.15.4 channel number on the 2.4 GHz O-QPSK page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// 2405 MHz.
    _11 = 11,
    /// 2410 MHz.
    _12 = 12,
    /// 2415 MHz.
    _13 = 13,
    /// 2420 MHz.
    _14 = 14,
    /// 2425 MHz.
    _15 = 15,
    /// 2430 MHz.
    _16 = 16,
    /// 2435 MHz.
    _17 = 17,
    /// 2440 MHz.
    _18 = 18,
    /// 2445 MHz.
    _19 = 19,
    /// 2450 MHz.
    _20 = 20,
    /// 2455 MHz.
    _21 = 21,
    /// 2460 MHz.
    _22 = 22,
    /// 2465 MHz.
    _23 = 23,
    /// 2470 MHz.
    _24 = 24,
    /// 2475 MHz.
    _25 = 25,
    /// 2480 MHz.
    _26 = 26,
}

impl TryFrom<u16> for Channel {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Ok(match value {
            11 => Channel::_11,
            12 => Channel::_12,
            13 => Channel::_13,
            14 => Channel::_14,
            15 => Channel::_15,
            16 => Channel::_16,
            17 => Channel::_17,
            18 => Channel::_18,
            19 => Channel::_19,
            20 => Channel::_20,
            21 => Channel::_21,
            22 => Channel::_22,
            23 => Channel::_23,
            24 => Channel::_24,
            25 => Channel::_25,
            26 => Channel::_26,
            _ => return Err(()),
        })
    }
}

impl From<Channel> for u16 {
    fn from(channel: Channel) -> u16 {
        channel as u16
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::_26
    }
}

/// A configuration request passed to [`RadioDriver::configure`].
///
/// [`RadioDriver::configure`]: super::RadioDriver::configure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverConfig<'a> {
    /// Open a reception window of `duration_ns` starting at `start` on
    /// the given channel.
    RxSlot {
        /// The start of the window, in network time.
        start: NetTime,
        /// The length of the window.
        duration_ns: i64,
        /// The channel to listen on.
        channel: u16,
    },
    /// Declare when the next frame is expected, so an auto-ACK capable
    /// driver can compute the time correction itself.
    ExpectedRxTime(NetTime),
    /// Install a header IE template the driver appends to the enhanced
    /// acknowledgments it generates for the given source address.
    EnhAckHeaderIe {
        /// The raw header IE, descriptor included.
        ie: &'a [u8],
        /// The short address the template applies to.
        short_addr: u16,
        /// The extended address the template applies to.
        ext_addr: [u8; 8],
    },
}
