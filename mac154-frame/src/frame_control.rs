//! Frame Control field readers and writers.
//!
//! The Frame Control field is the first two octets of every MPDU. It is read
//! and written as a little-endian 16-bit word; the bit layout follows
//! IEEE 802.15.4-2020 §7.2.2.1.

use super::AddressingMode;
use super::{Error, Result};

const FRAME_TYPE_MASK: u16 = 0b0000_0000_0000_0111;
const SECURITY_ENABLED_SHIFT: u16 = 3;
const FRAME_PENDING_SHIFT: u16 = 4;
const ACK_REQUEST_SHIFT: u16 = 5;
const PAN_ID_COMPRESSION_SHIFT: u16 = 6;
const SEQUENCE_NUMBER_SUPPRESSION_SHIFT: u16 = 8;
const IE_PRESENT_SHIFT: u16 = 9;
const DST_ADDRESSING_MODE_SHIFT: u16 = 10;
const FRAME_VERSION_SHIFT: u16 = 12;
const SRC_ADDRESSING_MODE_SHIFT: u16 = 14;

/// IEEE 802.15.4 frame type.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum FrameType {
    /// A beacon or enhanced beacon frame.
    Beacon = 0b000,
    /// A data frame.
    Data = 0b001,
    /// An immediate or enhanced acknowledgment frame.
    Ack = 0b010,
    /// A MAC command frame.
    MacCommand = 0b011,
    /// A multipurpose frame.
    Multipurpose = 0b101,
    /// A fragment or FRAK frame.
    FragmentOrFrak = 0b110,
    /// An extended frame.
    Extended = 0b111,
    /// A reserved frame type value.
    Unknown,
}

impl From<u8> for FrameType {
    fn from(value: u8) -> Self {
        match value {
            0b000 => Self::Beacon,
            0b001 => Self::Data,
            0b010 => Self::Ack,
            0b011 => Self::MacCommand,
            0b101 => Self::Multipurpose,
            0b110 => Self::FragmentOrFrak,
            0b111 => Self::Extended,
            _ => Self::Unknown,
        }
    }
}

/// IEEE 802.15.4 frame version.
///
/// The `0b10` value covers the 2015 revision and everything after it; the
/// frame formats it selects did not change in 2020.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum FrameVersion {
    /// IEEE 802.15.4-2003.
    Ieee802154_2003 = 0b00,
    /// IEEE 802.15.4-2006.
    Ieee802154_2006 = 0b01,
    /// IEEE 802.15.4-2015 and later.
    Ieee802154_2020 = 0b10,
    /// The reserved frame version value.
    Unknown,
}

impl FrameVersion {
    /// Returns `true` for the 2003 and 2006 revisions.
    pub fn is_pre_2015(&self) -> bool {
        matches!(self, Self::Ieee802154_2003 | Self::Ieee802154_2006)
    }
}

impl From<u8> for FrameVersion {
    fn from(value: u8) -> Self {
        match value {
            0b00 => Self::Ieee802154_2003,
            0b01 => Self::Ieee802154_2006,
            0b10 => Self::Ieee802154_2020,
            _ => Self::Unknown,
        }
    }
}

/// A reader/writer for the IEEE 802.15.4 Frame Control field.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct FrameControl<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> FrameControl<T> {
    /// Create a new [`FrameControl`] reader/writer from a given buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is shorter than two octets.
    pub fn new(buffer: T) -> Result<Self> {
        let fc = Self::new_unchecked(buffer);

        if !fc.check_len() {
            return Err(Error::WrongLength);
        }

        Ok(fc)
    }

    fn check_len(&self) -> bool {
        self.buffer.as_ref().len() >= 2
    }

    /// Create a new [`FrameControl`] reader/writer from a given buffer without
    /// length checking.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    fn word(&self) -> u16 {
        let b = &self.buffer.as_ref()[..2];
        u16::from_le_bytes([b[0], b[1]])
    }

    fn bit(&self, shift: u16) -> bool {
        (self.word() >> shift) & 0b1 == 0b1
    }

    /// Return the [`FrameType`] field.
    pub fn frame_type(&self) -> FrameType {
        FrameType::from((self.word() & FRAME_TYPE_MASK) as u8)
    }

    /// Returns `true` when the security enabled field is set.
    pub fn security_enabled(&self) -> bool {
        self.bit(SECURITY_ENABLED_SHIFT)
    }

    /// Returns `true` when the frame pending field is set.
    pub fn frame_pending(&self) -> bool {
        self.bit(FRAME_PENDING_SHIFT)
    }

    /// Returns `true` when the acknowledgment request field is set.
    pub fn ack_request(&self) -> bool {
        self.bit(ACK_REQUEST_SHIFT)
    }

    /// Returns `true` when the PAN ID compression field is set.
    pub fn pan_id_compression(&self) -> bool {
        self.bit(PAN_ID_COMPRESSION_SHIFT)
    }

    /// Returns `true` when the sequence number suppression field is set.
    pub fn sequence_number_suppression(&self) -> bool {
        self.bit(SEQUENCE_NUMBER_SUPPRESSION_SHIFT)
    }

    /// Returns `true` when the information elements present field is set.
    pub fn information_elements_present(&self) -> bool {
        self.bit(IE_PRESENT_SHIFT)
    }

    /// Return the destination [`AddressingMode`].
    pub fn dst_addressing_mode(&self) -> AddressingMode {
        AddressingMode::from(((self.word() >> DST_ADDRESSING_MODE_SHIFT) & 0b11) as u8)
    }

    /// Return the source [`AddressingMode`].
    pub fn src_addressing_mode(&self) -> AddressingMode {
        AddressingMode::from(((self.word() >> SRC_ADDRESSING_MODE_SHIFT) & 0b11) as u8)
    }

    /// Return the [`FrameVersion`].
    pub fn frame_version(&self) -> FrameVersion {
        FrameVersion::from(((self.word() >> FRAME_VERSION_SHIFT) & 0b11) as u8)
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> FrameControl<T> {
    fn set_word(&mut self, value: u16) {
        self.buffer.as_mut()[..2].copy_from_slice(&value.to_le_bytes());
    }

    fn set_bit(&mut self, shift: u16, value: bool) {
        let word = self.word() & !(0b1 << shift);
        self.set_word(word | ((value as u16) << shift));
    }

    fn set_field(&mut self, shift: u16, width_mask: u16, value: u16) {
        let word = self.word() & !(width_mask << shift);
        self.set_word(word | ((value & width_mask) << shift));
    }

    /// Set the frame type field.
    pub fn set_frame_type(&mut self, frame_type: FrameType) {
        self.set_field(0, FRAME_TYPE_MASK, frame_type as u16);
    }

    /// Set the security enabled field.
    pub fn set_security_enabled(&mut self, security_enabled: bool) {
        self.set_bit(SECURITY_ENABLED_SHIFT, security_enabled);
    }

    /// Set the frame pending field.
    pub fn set_frame_pending(&mut self, frame_pending: bool) {
        self.set_bit(FRAME_PENDING_SHIFT, frame_pending);
    }

    /// Set the acknowledgment request field.
    pub fn set_ack_request(&mut self, ack_request: bool) {
        self.set_bit(ACK_REQUEST_SHIFT, ack_request);
    }

    /// Set the PAN ID compression field.
    pub fn set_pan_id_compression(&mut self, pan_id_compression: bool) {
        self.set_bit(PAN_ID_COMPRESSION_SHIFT, pan_id_compression);
    }

    /// Set the sequence number suppression field.
    pub fn set_sequence_number_suppression(&mut self, suppression: bool) {
        self.set_bit(SEQUENCE_NUMBER_SUPPRESSION_SHIFT, suppression);
    }

    /// Set the information elements present field.
    pub fn set_information_elements_present(&mut self, present: bool) {
        self.set_bit(IE_PRESENT_SHIFT, present);
    }

    /// Set the destination addressing mode field.
    pub fn set_dst_addressing_mode(&mut self, mode: AddressingMode) {
        self.set_field(DST_ADDRESSING_MODE_SHIFT, 0b11, mode as u16);
    }

    /// Set the source addressing mode field.
    pub fn set_src_addressing_mode(&mut self, mode: AddressingMode) {
        self.set_field(SRC_ADDRESSING_MODE_SHIFT, 0b11, mode as u16);
    }

    /// Set the frame version field.
    pub fn set_frame_version(&mut self, version: FrameVersion) {
        self.set_field(FRAME_VERSION_SHIFT, 0b11, version as u16);
    }
}

impl<T: AsRef<[u8]>> core::fmt::Display for FrameControl<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Frame Control")?;
        writeln!(f, "  type: {:?}", self.frame_type())?;
        writeln!(f, "  security enabled: {}", self.security_enabled() as usize)?;
        writeln!(f, "  frame pending: {}", self.frame_pending() as usize)?;
        writeln!(f, "  ack request: {}", self.ack_request() as usize)?;
        writeln!(
            f,
            "  pan id compression: {}",
            self.pan_id_compression() as usize
        )?;
        writeln!(
            f,
            "  sequence number suppression: {}",
            self.sequence_number_suppression() as usize
        )?;
        writeln!(
            f,
            "  information elements present: {}",
            self.information_elements_present() as usize
        )?;
        writeln!(f, "  dst addressing mode: {:?}", self.dst_addressing_mode())?;
        writeln!(f, "  src addressing mode: {:?}", self.src_addressing_mode())?;
        writeln!(f, "  frame version: {:?}", self.frame_version())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_fields() {
        // Frame control of an enhanced beacon: 0x40, 0xeb.
        let fc = FrameControl::new(&[0x40, 0xeb][..]).unwrap();
        assert_eq!(fc.frame_type(), FrameType::Beacon);
        assert!(!fc.security_enabled());
        assert!(!fc.frame_pending());
        assert!(!fc.ack_request());
        assert!(fc.pan_id_compression());
        assert!(fc.sequence_number_suppression());
        assert!(fc.information_elements_present());
        assert_eq!(fc.dst_addressing_mode(), AddressingMode::Short);
        assert_eq!(fc.src_addressing_mode(), AddressingMode::Extended);
        assert_eq!(fc.frame_version(), FrameVersion::Ieee802154_2020);
    }

    #[test]
    fn write_fields() {
        let mut buffer = [0u8; 2];
        let mut fc = FrameControl::new_unchecked(&mut buffer[..]);
        fc.set_frame_type(FrameType::Data);
        fc.set_ack_request(true);
        fc.set_pan_id_compression(true);
        fc.set_frame_version(FrameVersion::Ieee802154_2006);
        fc.set_dst_addressing_mode(AddressingMode::Short);
        fc.set_src_addressing_mode(AddressingMode::Short);

        // 0x61 0x88: the classic unicast data frame control.
        assert_eq!(buffer, [0x61, 0x88]);
    }

    #[test]
    fn set_and_clear_bit() {
        let mut buffer = [0xff, 0xff];
        let mut fc = FrameControl::new_unchecked(&mut buffer[..]);
        fc.set_frame_pending(false);
        fc.set_frame_type(FrameType::Beacon);
        let fc = FrameControl::new_unchecked(&buffer[..]);
        assert!(!fc.frame_pending());
        assert_eq!(fc.frame_type(), FrameType::Beacon);
        // Other bits are untouched.
        assert!(fc.security_enabled());
        assert!(fc.ack_request());
    }

    #[test]
    fn too_short() {
        assert_eq!(
            FrameControl::new(&[0x02][..]).unwrap_err(),
            Error::WrongLength
        );
    }

    #[test]
    fn reserved_values() {
        assert_eq!(FrameType::from(0b100), FrameType::Unknown);
        assert_eq!(FrameVersion::from(0b11), FrameVersion::Unknown);
        assert!(FrameVersion::Ieee802154_2003.is_pre_2015());
        assert!(FrameVersion::Ieee802154_2006.is_pre_2015());
        assert!(!FrameVersion::Ieee802154_2020.is_pre_2015());
    }
}
