//! Addressing field readers and writers.

use super::{Error, Result};
use super::{FrameControl, FrameVersion};

/// An IEEE 802.15.4 address.
///
/// Addresses are held in canonical byte order and reversed when read from or
/// written to the wire, where they are little-endian.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Address {
    /// The address is absent.
    Absent,
    /// A 16-bit short address.
    Short([u8; 2]),
    /// A 64-bit extended address.
    Extended([u8; 8]),
}

impl Address {
    /// The broadcast address.
    pub const BROADCAST: Address = Address::Short([0xff; 2]);

    /// Query whether this address is a unicast address.
    pub fn is_unicast(&self) -> bool {
        !self.is_broadcast() && !self.is_absent()
    }

    /// Query whether this address is the broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Query whether the address is absent.
    pub fn is_absent(&self) -> bool {
        matches!(self, Address::Absent)
    }

    /// Query whether the address is short.
    pub fn is_short(&self) -> bool {
        matches!(self, Address::Short(_))
    }

    /// Query whether the address is extended.
    pub fn is_extended(&self) -> bool {
        matches!(self, Address::Extended(_))
    }

    /// Create an [`Address`] from a slice of 0, 2 or 8 bytes.
    ///
    /// # Panics
    /// Panics on any other length.
    pub fn from_bytes(a: &[u8]) -> Self {
        match a.len() {
            0 => Address::Absent,
            2 => {
                let mut b = [0u8; 2];
                b.copy_from_slice(a);
                Address::Short(b)
            }
            8 => {
                let mut b = [0u8; 8];
                b.copy_from_slice(a);
                Address::Extended(b)
            }
            _ => panic!("invalid address length"),
        }
    }

    /// Create a short [`Address`] from a host-order `u16`.
    pub const fn from_short(value: u16) -> Self {
        Address::Short(value.to_be_bytes())
    }

    /// Return a short address as a host-order `u16`, if it is one.
    pub fn as_short(&self) -> Option<u16> {
        match self {
            Address::Short(b) => Some(u16::from_be_bytes(*b)),
            _ => None,
        }
    }

    /// Return the address as a slice of bytes in canonical order.
    pub const fn as_bytes(&self) -> &[u8] {
        match self {
            Address::Absent => &[],
            Address::Short(value) => value,
            Address::Extended(value) => value,
        }
    }

    /// Return the length of the address in octets.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        match self {
            Address::Absent => 0,
            Address::Short(_) => 2,
            Address::Extended(_) => 8,
        }
    }
}

impl From<Address> for AddressingMode {
    fn from(value: Address) -> Self {
        match value {
            Address::Absent => AddressingMode::Absent,
            Address::Short(_) => AddressingMode::Short,
            Address::Extended(_) => AddressingMode::Extended,
        }
    }
}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Address::Absent => write!(f, "absent"),
            Address::Short(value) => write!(f, "{:02x}:{:02x}", value[0], value[1]),
            Address::Extended(value) => {
                for (i, b) in value.iter().enumerate() {
                    if i != 0 {
                        write!(f, ":")?;
                    }
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// IEEE 802.15.4 addressing mode.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum AddressingMode {
    /// No address is present.
    Absent = 0b00,
    /// A short address is present.
    Short = 0b10,
    /// An extended address is present.
    Extended = 0b11,
    /// The reserved addressing mode value.
    Unknown,
}

impl AddressingMode {
    /// Return the size of an address of this mode, in octets.
    pub fn size(&self) -> usize {
        match self {
            Self::Short => 2,
            Self::Extended => 8,
            Self::Absent | Self::Unknown => 0,
        }
    }
}

impl From<u8> for AddressingMode {
    fn from(value: u8) -> Self {
        match value {
            0b00 => Self::Absent,
            0b10 => Self::Short,
            0b11 => Self::Extended,
            _ => Self::Unknown,
        }
    }
}

/// Presence of the PAN ID and address fields, derived from the Frame Control
/// field per IEEE 802.15.4-2020 §7.2.2.6 (the "PAN ID Compression" rules,
/// first specified in the 2015 revision).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) struct AddressPresence {
    pub dst_pan_id: bool,
    pub dst_addr: AddressingMode,
    pub src_pan_id: bool,
    pub src_addr: AddressingMode,
}

impl AddressPresence {
    /// Derive the field presence from the frame version, the addressing
    /// modes and the PAN ID compression bit. Returns `None` for combinations
    /// the standard declares invalid.
    pub(crate) fn derive(
        frame_version: FrameVersion,
        dst_addr_mode: AddressingMode,
        src_addr_mode: AddressingMode,
        pan_id_compression: bool,
    ) -> Option<Self> {
        use AddressingMode::*;

        let p = |dst_pan_id, dst_addr, src_pan_id, src_addr| Self {
            dst_pan_id,
            dst_addr,
            src_pan_id,
            src_addr,
        };

        match frame_version {
            FrameVersion::Ieee802154_2003 | FrameVersion::Ieee802154_2006 => {
                match (dst_addr_mode, src_addr_mode, pan_id_compression) {
                    // Both addresses present: the source PAN ID is elided
                    // exactly when the compression bit is set.
                    (dst @ (Short | Extended), src @ (Short | Extended), false) => {
                        Some(p(true, dst, true, src))
                    }
                    (dst @ (Short | Extended), src @ (Short | Extended), true) => {
                        Some(p(true, dst, false, src))
                    }
                    // A single address carries its own PAN ID, and the
                    // compression bit shall be zero.
                    (Absent, src @ (Short | Extended), false) => Some(p(false, Absent, true, src)),
                    (dst @ (Short | Extended), Absent, false) => Some(p(true, dst, false, Absent)),
                    _ => None,
                }
            }
            FrameVersion::Ieee802154_2020 => {
                Some(match (dst_addr_mode, src_addr_mode, pan_id_compression) {
                    (Absent, Absent, false) => p(false, Absent, false, Absent),
                    (Absent, Absent, true) => p(true, Absent, false, Absent),
                    (dst @ (Short | Extended), Absent, false) => p(true, dst, false, Absent),
                    (dst @ (Short | Extended), Absent, true) => p(false, dst, false, Absent),
                    (Absent, src @ (Short | Extended), false) => p(false, Absent, true, src),
                    (Absent, src @ (Short | Extended), true) => p(false, Absent, false, src),
                    (Extended, Extended, false) => p(true, Extended, false, Extended),
                    (Extended, Extended, true) => p(false, Extended, false, Extended),
                    (Short, Short, false) => p(true, Short, true, Short),
                    (Short, Extended, false) => p(true, Short, true, Extended),
                    (Extended, Short, false) => p(true, Extended, true, Short),
                    (Short, Extended, true) => p(true, Short, false, Extended),
                    (Extended, Short, true) => p(true, Extended, false, Short),
                    (Short, Short, true) => p(true, Short, false, Short),
                    _ => return None,
                })
            }
            FrameVersion::Unknown => None,
        }
    }

    /// Return the total length of the addressing fields in octets.
    pub(crate) fn len(&self) -> usize {
        (self.dst_pan_id as usize) * 2
            + self.dst_addr.size()
            + (self.src_pan_id as usize) * 2
            + self.src_addr.size()
    }
}

/// A reader/writer for the IEEE 802.15.4 addressing fields.
///
/// The reader needs the Frame Control field to know which of the PAN ID and
/// address fields are present.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct AddressingFields<T: AsRef<[u8]>, FC: AsRef<[u8]>> {
    buffer: T,
    fc: FrameControl<FC>,
}

impl<T: AsRef<[u8]>, FC: AsRef<[u8]>> AddressingFields<T, FC> {
    /// Create a new [`AddressingFields`] reader/writer from a given buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the Frame Control field selects an invalid
    /// addressing combination, or if the buffer is too short to contain it.
    pub fn new(buffer: T, fc: FrameControl<FC>) -> Result<Self> {
        let af = Self::new_unchecked(buffer, fc);

        match af.presence() {
            Some(presence) if af.buffer.as_ref().len() >= presence.len() => Ok(af),
            Some(_) => Err(Error::WrongLength),
            None => Err(Error::BadFormat),
        }
    }

    /// Create a new [`AddressingFields`] reader/writer from a given buffer
    /// without checking the length.
    pub fn new_unchecked(buffer: T, fc: FrameControl<FC>) -> Self {
        Self { buffer, fc }
    }

    fn presence(&self) -> Option<AddressPresence> {
        AddressPresence::derive(
            self.fc.frame_version(),
            self.fc.dst_addressing_mode(),
            self.fc.src_addressing_mode(),
            self.fc.pan_id_compression(),
        )
    }

    /// Return the length of the addressing fields in octets.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.presence().map(|p| p.len()).unwrap_or(0)
    }

    fn read_address(&self, offset: usize, mode: AddressingMode) -> Option<Address> {
        match mode {
            AddressingMode::Absent => Some(Address::Absent),
            AddressingMode::Short => {
                let mut raw = [0u8; 2];
                raw.copy_from_slice(&self.buffer.as_ref()[offset..][..2]);
                raw.reverse();
                Some(Address::Short(raw))
            }
            AddressingMode::Extended => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&self.buffer.as_ref()[offset..][..8]);
                raw.reverse();
                Some(Address::Extended(raw))
            }
            AddressingMode::Unknown => None,
        }
    }

    /// Return the destination [`Address`], if present.
    pub fn dst_address(&self) -> Option<Address> {
        let presence = self.presence()?;
        let offset = (presence.dst_pan_id as usize) * 2;
        self.read_address(offset, presence.dst_addr)
    }

    /// Return the source [`Address`], if present.
    pub fn src_address(&self) -> Option<Address> {
        let presence = self.presence()?;
        let offset = (presence.dst_pan_id as usize) * 2
            + presence.dst_addr.size()
            + (presence.src_pan_id as usize) * 2;
        self.read_address(offset, presence.src_addr)
    }

    /// Return the destination PAN ID, if not elided.
    pub fn dst_pan_id(&self) -> Option<u16> {
        let presence = self.presence()?;
        if !presence.dst_pan_id {
            return None;
        }

        let b = &self.buffer.as_ref()[..2];
        Some(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Return the source PAN ID, if not elided.
    pub fn src_pan_id(&self) -> Option<u16> {
        let presence = self.presence()?;
        if !presence.src_pan_id {
            return None;
        }

        let offset = (presence.dst_pan_id as usize) * 2 + presence.dst_addr.size();
        let b = &self.buffer.as_ref()[offset..][..2];
        Some(u16::from_le_bytes([b[0], b[1]]))
    }
}

impl<T: AsRef<[u8]>, FC: AsRef<[u8]>> core::fmt::Display for AddressingFields<T, FC> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Addressing Fields")?;

        if let Some(id) = self.dst_pan_id() {
            writeln!(f, "  dst pan id: {id:0x}")?;
        }

        if let Some(addr) = self.dst_address() {
            writeln!(f, "  dst address: {addr}")?;
        }

        if let Some(id) = self.src_pan_id() {
            writeln!(f, "  src pan id: {id:0x}")?;
        }

        if let Some(addr) = self.src_address() {
            writeln!(f, "  src address: {addr}")?;
        }

        Ok(())
    }
}
