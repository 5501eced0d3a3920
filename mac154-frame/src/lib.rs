//! Zero-copy read and write structures for IEEE 802.15.4-2020 MAC frames.
//!
//! The crate is split in two layers:
//!
//! - **Readers/writers**: thin wrappers around a byte buffer that give
//!   field-level access without copying. Each reader provides [`new`] (with
//!   length validation), [`new_unchecked`], and per-field accessors; writers
//!   additionally provide setters when the buffer is mutable.
//! - **Representations** (`*Repr`): owned, high-level values that can be
//!   [`parse`]d from a reader and [`emit`]ted into a buffer. The repr layer is
//!   what the MAC uses to compute header sizes before a single byte is
//!   written.
//!
//! The most important reader is [`Frame`], which dispatches on the frame type
//! and version found in the Frame Control field:
//!
//! ```
//! use mac154_frame::{Frame, FrameType};
//!
//! // An immediate acknowledgment for sequence number 42.
//! let frame = Frame::new(&[0x02, 0x00, 0x2a][..]).unwrap();
//! assert_eq!(frame.frame_control().frame_type(), FrameType::Ack);
//! assert_eq!(frame.sequence_number(), Some(0x2a));
//! ```
//!
//! ## Information Elements
//!
//! Header IEs live in the MAC header and are terminated by a Header
//! Termination 1 or 2 element; Payload IEs live at the start of the MAC
//! payload. The MLME payload group carries nested IEs, which is where the
//! TSCH synchronization, timeslot, slotframe/link and channel-hopping
//! elements are found. See the [`ie`] module items for the supported set.
//!
//! ## Endianness
//!
//! Everything on the wire is little-endian, including the byte order of
//! short and extended addresses inside the addressing fields. [`Address`]
//! values are kept in canonical (big-endian, printable) order in memory and
//! reversed on read/write, matching what a reader of a packet dump expects.
//!
//! [`new`]: Frame::new
//! [`new_unchecked`]: Frame::new_unchecked
//! [`parse`]: FrameRepr::parse
//! [`emit`]: FrameRepr::emit
#![no_std]
#![deny(unsafe_code)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[cfg(test)]
mod tests;

mod frames;
pub use frames::*;

pub mod time;

mod frame_control;
pub use frame_control::*;

mod aux_sec_header;
pub use aux_sec_header::*;

mod addressing;
pub use addressing::*;

mod ie;
pub use ie::*;

mod repr;
pub use repr::*;

/// An error that can occur when reading or writing an IEEE 802.15.4 frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The buffer is too short, or a length field contradicts the buffer.
    WrongLength,
    /// A field value contradicts another field of the same frame.
    BadFormat,
    /// A reserved frame type, version, addressing mode or security level.
    Reserved,
    /// A well-formed but unsupported option, e.g. a non-implicit key
    /// identifier mode.
    NotSupported,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::WrongLength => write!(f, "wrong length"),
            Error::BadFormat => write!(f, "bad format"),
            Error::Reserved => write!(f, "reserved value"),
            Error::NotSupported => write!(f, "not supported"),
        }
    }
}

/// A type alias for `Result<T, mac154_frame::Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// The maximum size of an MPDU, in octets (the PHY FCS not included).
pub const MAX_MPDU_LEN: usize = 127;
