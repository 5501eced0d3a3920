//! MAC constants and PIB attribute defaults.

use mac154_frame::time::Duration;

/// The broadcast PAN identifier, also the "not associated" value.
pub const MAC_PAN_ID_BROADCAST: u16 = 0xffff;

/// The short address of a device that is not associated.
pub const MAC_SHORT_ADDR_UNASSOCIATED: u16 = 0xffff;

/// The short address of a device that is associated but uses only its
/// extended address.
pub const MAC_SHORT_ADDR_NO_SHORT: u16 = 0xfffe;

/// The largest assignable short address.
pub const MAC_SHORT_ADDR_MAX: u16 = 0xfffd;

/// The broadcast short address.
pub const MAC_BROADCAST_ADDR: u16 = 0xffff;

/// The default macMaxFrameRetries.
pub const MAC_MAX_FRAME_RETRIES: u8 = 3;

/// The default macMinBe.
pub const MAC_MIN_BE: u8 = 3;

/// The default macMaxBe.
pub const MAC_MAX_BE: u8 = 5;

/// The default macMaxCsmaBackoffs.
pub const MAC_MAX_CSMA_BACKOFFS: u8 = 4;

/// The AIFS period: the turnaround before an acknowledgment.
pub const MAC_AIFS_PERIOD: Duration = Duration::from_us(1000);

/// The SIFS period: the gap after a short frame.
pub const MAC_SIFS_PERIOD: Duration = Duration::from_us(192);

/// The LIFS period: the gap after a long frame.
pub const MAC_LIFS_PERIOD: Duration = Duration::from_us(640);

/// The frame counter value at which the security engine refuses to send:
/// a counter must never repeat under the same key.
pub const MAC_FRAME_COUNTER_LIMIT: u32 = 0xffff_ffff;

/// The maximum value of the 40-bit absolute slot number.
pub const MAC_ASN_MAX: u64 = (1 << 40) - 1;
