//! High-level readers for IEEE 802.15.4 frames.
//!
//! [`Mpdu`] is the version-aware reader every frame type shares: it walks
//! the MAC header (frame control, sequence number, addressing fields,
//! auxiliary security header, header IEs) and exposes the MAC payload. The
//! typed wrappers ([`Ack`], [`EnhancedAck`], [`BeaconFrame`],
//! [`EnhancedBeaconFrame`], [`DataFrame`], [`CommandFrame`]) add the
//! per-frame-type interpretation of the payload, and [`Frame`] dispatches on
//! the Frame Control field.

use crate::{Error, Result, MAX_MPDU_LEN};

use crate::{
    AddressPresence, AddressingFields, AddressingMode, AuxiliarySecurityHeader, FrameControl,
    FrameType, FrameVersion, InformationElements, KeyIdentifierMode,
};

pub(crate) mod ack;
pub(crate) mod beacon;
pub(crate) mod command;
pub(crate) mod data;

pub use ack::*;
pub use beacon::*;
pub use command::*;
pub use data::*;

/// A generic reader for the MAC header and payload of an MPDU.
///
/// Creating an [`Mpdu`] performs the version-independent header validation:
/// reserved frame types, versions and addressing modes are rejected, as are
/// the cross-field combinations the standard forbids. The typed frame
/// wrappers build on a validated `Mpdu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mpdu<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> Mpdu<T> {
    /// Create a new [`Mpdu`] reader from a given buffer, validating the MAC
    /// header.
    pub fn new(buffer: T) -> Result<Self> {
        let mpdu = Self::new_unchecked(buffer);
        mpdu.validate()?;
        Ok(mpdu)
    }

    /// Create a new [`Mpdu`] reader from a given buffer without validation.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    pub(crate) fn buffer_ref(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let buffer = self.buffer.as_ref();

        if buffer.len() < 2 || buffer.len() > MAX_MPDU_LEN {
            return Err(Error::WrongLength);
        }

        let fc = self.frame_control();

        if fc.frame_type() == FrameType::Unknown {
            return Err(Error::Reserved);
        }

        if fc.frame_version() == FrameVersion::Unknown {
            return Err(Error::Reserved);
        }

        if fc.dst_addressing_mode() == AddressingMode::Unknown
            || fc.src_addressing_mode() == AddressingMode::Unknown
        {
            return Err(Error::Reserved);
        }

        // Sequence number suppression and IEs only exist since the 2015
        // revision of the standard.
        if fc.frame_version().is_pre_2015()
            && (fc.sequence_number_suppression() || fc.information_elements_present())
        {
            return Err(Error::BadFormat);
        }

        if !fc.sequence_number_suppression() && buffer.len() < 3 {
            return Err(Error::WrongLength);
        }

        // A data frame must address someone; a beacon never addresses
        // anyone.
        match fc.frame_type() {
            FrameType::Data
                if fc.frame_version().is_pre_2015()
                    && fc.dst_addressing_mode() == AddressingMode::Absent
                    && fc.src_addressing_mode() == AddressingMode::Absent =>
            {
                return Err(Error::BadFormat)
            }
            FrameType::Beacon if fc.dst_addressing_mode() != AddressingMode::Absent => {
                return Err(Error::BadFormat)
            }
            _ => {}
        }

        let presence = AddressPresence::derive(
            fc.frame_version(),
            fc.dst_addressing_mode(),
            fc.src_addressing_mode(),
            fc.pan_id_compression(),
        );

        let Some(presence) = presence else {
            // An immediate acknowledgment has no addressing at all, which
            // the pre-2015 presence table does not describe.
            if fc.frame_type() == FrameType::Ack
                && fc.dst_addressing_mode() == AddressingMode::Absent
                && fc.src_addressing_mode() == AddressingMode::Absent
                && !fc.pan_id_compression()
            {
                return Ok(());
            }
            return Err(Error::BadFormat);
        };

        let mut offset = 2 + !fc.sequence_number_suppression() as usize;

        if buffer.len() < offset + presence.len() {
            return Err(Error::WrongLength);
        }
        offset += presence.len();

        if fc.security_enabled() {
            let aux = AuxiliarySecurityHeader::new(&buffer[offset..])?;
            if aux.security_control().key_identifier_mode() != KeyIdentifierMode::Implicit {
                return Err(Error::NotSupported);
            }
            aux.security_control().security_level()?;
            offset += aux.len();
        }

        if fc.information_elements_present() {
            InformationElements::new(&buffer[offset..])?;
        }

        Ok(())
    }

    /// Return a [`FrameControl`] reader.
    pub fn frame_control(&self) -> FrameControl<&'_ [u8]> {
        FrameControl::new_unchecked(&self.buffer.as_ref()[..2])
    }

    /// Return the sequence number, if not suppressed.
    pub fn sequence_number(&self) -> Option<u8> {
        if self.frame_control().sequence_number_suppression() {
            None
        } else {
            Some(self.buffer.as_ref()[2])
        }
    }

    fn addressing_offset(&self) -> usize {
        2 + !self.frame_control().sequence_number_suppression() as usize
    }

    /// Return an [`AddressingFields`] reader, if any address field is
    /// present.
    pub fn addressing(&self) -> Option<AddressingFields<&'_ [u8], &'_ [u8]>> {
        AddressingFields::new(
            &self.buffer.as_ref()[self.addressing_offset()..],
            self.frame_control(),
        )
        .ok()
    }

    fn aux_offset(&self) -> usize {
        self.addressing_offset() + self.addressing().map(|af| af.len()).unwrap_or(0)
    }

    /// Return an [`AuxiliarySecurityHeader`] reader, if security is enabled.
    pub fn auxiliary_security_header(&self) -> Option<AuxiliarySecurityHeader<&'_ [u8]>> {
        if self.frame_control().security_enabled() {
            AuxiliarySecurityHeader::new(&self.buffer.as_ref()[self.aux_offset()..]).ok()
        } else {
            None
        }
    }

    /// Return the length of the MAC header: frame control, sequence number,
    /// addressing fields and auxiliary security header. Header IEs are not
    /// included.
    pub fn header_len(&self) -> usize {
        self.aux_offset()
            + self
                .auxiliary_security_header()
                .map(|aux| aux.len())
                .unwrap_or(0)
    }

    /// Return an [`InformationElements`] reader, if the IE present bit is
    /// set.
    pub fn information_elements(&self) -> Option<InformationElements<&'_ [u8]>> {
        if self.frame_control().information_elements_present() {
            InformationElements::new(&self.buffer.as_ref()[self.header_len()..]).ok()
        } else {
            None
        }
    }
}

impl<'f, T: AsRef<[u8]> + ?Sized> Mpdu<&'f T> {
    pub(crate) fn buffer_ref_f(&self) -> &'f [u8] {
        self.buffer.as_ref()
    }

    /// Return the MAC payload: everything after the header IEs, including
    /// payload IEs.
    pub fn mac_payload(&self) -> Option<&'f [u8]> {
        let mut offset = self.header_len();

        if let Some(ie) = self.information_elements() {
            offset += ie.header_ies_len();
        }

        let buffer = self.buffer.as_ref();
        if buffer.len() <= offset {
            return None;
        }

        Some(&buffer[offset..])
    }

    /// Return the frame payload: everything after all IEs.
    pub fn frame_payload(&self) -> Option<&'f [u8]> {
        let mut offset = self.header_len();

        if let Some(ie) = self.information_elements() {
            offset += ie.len();
        }

        let buffer = self.buffer.as_ref();
        if buffer.len() <= offset {
            return None;
        }

        Some(&buffer[offset..])
    }
}

/// A high-level representation of an IEEE 802.15.4 frame, dispatched on
/// frame type and version.
#[derive(Debug)]
pub enum Frame<T: AsRef<[u8]>> {
    /// An immediate acknowledgment frame.
    Ack(Ack<T>),
    /// An enhanced acknowledgment frame.
    EnhancedAck(EnhancedAck<T>),
    /// A beacon frame.
    Beacon(BeaconFrame<T>),
    /// An enhanced beacon frame.
    EnhancedBeacon(EnhancedBeaconFrame<T>),
    /// A data frame.
    Data(DataFrame<T>),
    /// A MAC command frame.
    MacCommand(CommandFrame<T>),
}

impl<T: AsRef<[u8]>> Frame<T> {
    /// Create a new [`Frame`] from a given buffer.
    pub fn new(buffer: T) -> Result<Self> {
        if buffer.as_ref().len() < 2 {
            return Err(Error::WrongLength);
        }

        let fc = FrameControl::new(&buffer.as_ref()[..2])?;
        let frame_type = fc.frame_type();
        let version = fc.frame_version();

        match frame_type {
            FrameType::Ack => match version {
                FrameVersion::Ieee802154_2003 | FrameVersion::Ieee802154_2006 => {
                    Ok(Frame::Ack(Ack::new(buffer)?))
                }
                FrameVersion::Ieee802154_2020 => Ok(Frame::EnhancedAck(EnhancedAck::new(buffer)?)),
                FrameVersion::Unknown => Err(Error::Reserved),
            },
            FrameType::Beacon => match version {
                FrameVersion::Ieee802154_2003 | FrameVersion::Ieee802154_2006 => {
                    Ok(Frame::Beacon(BeaconFrame::new(buffer)?))
                }
                FrameVersion::Ieee802154_2020 => {
                    Ok(Frame::EnhancedBeacon(EnhancedBeaconFrame::new(buffer)?))
                }
                FrameVersion::Unknown => Err(Error::Reserved),
            },
            FrameType::Data => Ok(Frame::Data(DataFrame::new(buffer)?)),
            FrameType::MacCommand => Ok(Frame::MacCommand(CommandFrame::new(buffer)?)),
            FrameType::Unknown => Err(Error::Reserved),
            _ => Err(Error::NotSupported),
        }
    }

    /// Convert the [`Frame`] into an [`Ack`].
    ///
    /// # Panics
    /// Panics if the frame is not an immediate acknowledgment.
    pub fn into_ack(self) -> Ack<T> {
        match self {
            Frame::Ack(frame) => frame,
            _ => panic!("not an ack"),
        }
    }

    /// Convert the [`Frame`] into an [`EnhancedAck`].
    ///
    /// # Panics
    /// Panics if the frame is not an enhanced acknowledgment.
    pub fn into_enhanced_ack(self) -> EnhancedAck<T> {
        match self {
            Frame::EnhancedAck(frame) => frame,
            _ => panic!("not an enhanced ack"),
        }
    }

    /// Convert the [`Frame`] into a [`BeaconFrame`].
    ///
    /// # Panics
    /// Panics if the frame is not a beacon.
    pub fn into_beacon(self) -> BeaconFrame<T> {
        match self {
            Frame::Beacon(frame) => frame,
            _ => panic!("not a beacon"),
        }
    }

    /// Convert the [`Frame`] into an [`EnhancedBeaconFrame`].
    ///
    /// # Panics
    /// Panics if the frame is not an enhanced beacon.
    pub fn into_enhanced_beacon(self) -> EnhancedBeaconFrame<T> {
        match self {
            Frame::EnhancedBeacon(frame) => frame,
            _ => panic!("not an enhanced beacon"),
        }
    }

    /// Convert the [`Frame`] into a [`DataFrame`].
    ///
    /// # Panics
    /// Panics if the frame is not a data frame.
    pub fn into_data(self) -> DataFrame<T> {
        match self {
            Frame::Data(frame) => frame,
            _ => panic!("not a data frame"),
        }
    }

    /// Convert the [`Frame`] into a [`CommandFrame`].
    ///
    /// # Panics
    /// Panics if the frame is not a MAC command.
    pub fn into_mac_command(self) -> CommandFrame<T> {
        match self {
            Frame::MacCommand(frame) => frame,
            _ => panic!("not a MAC command"),
        }
    }

    /// Return the frame control field of the frame.
    pub fn frame_control(&self) -> FrameControl<&'_ [u8]> {
        match self {
            Frame::Ack(frame) => frame.frame_control(),
            Frame::EnhancedAck(frame) => frame.mpdu().frame_control(),
            Frame::Beacon(frame) => frame.frame_control(),
            Frame::EnhancedBeacon(frame) => frame.mpdu().frame_control(),
            Frame::Data(frame) => frame.mpdu().frame_control(),
            Frame::MacCommand(frame) => frame.mpdu().frame_control(),
        }
    }

    /// Return the sequence number of the frame, if not suppressed.
    pub fn sequence_number(&self) -> Option<u8> {
        match self {
            Frame::Ack(frame) => Some(frame.sequence_number()),
            Frame::EnhancedAck(frame) => frame.mpdu().sequence_number(),
            Frame::Beacon(frame) => Some(frame.sequence_number()),
            Frame::EnhancedBeacon(frame) => frame.mpdu().sequence_number(),
            Frame::Data(frame) => frame.mpdu().sequence_number(),
            Frame::MacCommand(frame) => frame.mpdu().sequence_number(),
        }
    }

    /// Return the addressing fields of the frame, if any.
    pub fn addressing(&self) -> Option<AddressingFields<&'_ [u8], &'_ [u8]>> {
        match self {
            Frame::Ack(_) => None,
            Frame::EnhancedAck(frame) => frame.mpdu().addressing(),
            Frame::Beacon(frame) => frame.mpdu().addressing(),
            Frame::EnhancedBeacon(frame) => frame.mpdu().addressing(),
            Frame::Data(frame) => frame.mpdu().addressing(),
            Frame::MacCommand(frame) => frame.mpdu().addressing(),
        }
    }

    /// Return the auxiliary security header of the frame, if any.
    pub fn auxiliary_security_header(&self) -> Option<AuxiliarySecurityHeader<&'_ [u8]>> {
        match self {
            Frame::Ack(_) => None,
            Frame::EnhancedAck(frame) => frame.mpdu().auxiliary_security_header(),
            Frame::Beacon(frame) => frame.mpdu().auxiliary_security_header(),
            Frame::EnhancedBeacon(frame) => frame.mpdu().auxiliary_security_header(),
            Frame::Data(frame) => frame.mpdu().auxiliary_security_header(),
            Frame::MacCommand(frame) => frame.mpdu().auxiliary_security_header(),
        }
    }

    /// Return the information elements of the frame, if any.
    pub fn information_elements(&self) -> Option<InformationElements<&'_ [u8]>> {
        match self {
            Frame::Ack(_) | Frame::Beacon(_) => None,
            Frame::EnhancedAck(frame) => frame.mpdu().information_elements(),
            Frame::EnhancedBeacon(frame) => frame.mpdu().information_elements(),
            Frame::Data(frame) => frame.mpdu().information_elements(),
            Frame::MacCommand(frame) => frame.mpdu().information_elements(),
        }
    }
}

impl<'f, T: AsRef<[u8]> + ?Sized> Frame<&'f T> {
    /// Return the frame payload, excluding any IEs.
    pub fn payload(&self) -> Option<&'f [u8]> {
        match self {
            Frame::Ack(_) => None,
            Frame::EnhancedAck(frame) => frame.mpdu().frame_payload(),
            Frame::Beacon(frame) => frame.payload(),
            Frame::EnhancedBeacon(frame) => frame.mpdu().frame_payload(),
            Frame::Data(frame) => frame.mpdu().frame_payload(),
            Frame::MacCommand(frame) => frame.mpdu().frame_payload(),
        }
    }
}

/// An IEEE 802.15.4 frame followed by its Frame Check Sequence (FCS).
#[derive(Debug)]
pub struct FrameWithFcs<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> FrameWithFcs<T> {
    /// Create a new [`FrameWithFcs`] from a given buffer, verifying the FCS.
    pub fn new(buffer: T) -> Result<Self> {
        let frame = Self::new_unchecked(buffer);

        if frame.buffer.as_ref().len() < 4 {
            return Err(Error::WrongLength);
        }

        if !frame.check_fcs() {
            return Err(Error::BadFormat);
        }

        Ok(frame)
    }

    /// Create a new [`FrameWithFcs`] from a given buffer without checking
    /// the FCS.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    /// Calculate the Frame Check Sequence of the frame content.
    #[inline]
    pub fn calculate_fcs(&self) -> u16 {
        // The FCS is a 16-bit ITU-T CRC over the MPDU, using the
        // x^16 + x^12 + x^5 + 1 polynomial with initial and final values of
        // 0x0000 rather than the 0xffff of the ITU-T CRC-16 standard.
        const CRC_16_IEEE802154: crc::Algorithm<u16> = crc::Algorithm {
            width: 16,
            poly: 0x1021,
            init: 0x0000,
            refin: true,
            refout: true,
            xorout: 0x0000,
            check: 0x2189,
            residue: 0x0000,
        };
        crc::Crc::<u16>::new(&CRC_16_IEEE802154).checksum(self.content())
    }

    /// Check the Frame Check Sequence of the frame.
    #[inline]
    pub fn check_fcs(&self) -> bool {
        self.calculate_fcs() == self.fcs()
    }

    /// Return the content of the frame, excluding the FCS.
    pub fn content(&self) -> &[u8] {
        let buffer = self.buffer.as_ref();
        &buffer[..buffer.len() - 2]
    }

    /// Return the Frame Check Sequence of the frame.
    pub fn fcs(&self) -> u16 {
        let buffer = self.buffer.as_ref();
        u16::from_le_bytes([buffer[buffer.len() - 2], buffer[buffer.len() - 1]])
    }

    /// Return a [`Frame`] reader over the content, excluding the FCS.
    pub fn frame(&self) -> Result<Frame<&'_ [u8]>> {
        Frame::new(self.content())
    }
}
