//! Beacon frame readers.
//!
//! Pre-2015 beacons carry a superframe specification, GTS fields and a
//! pending address list before the beacon payload. Enhanced beacons
//! (2015 and later) carry their content in information elements instead.

use super::Mpdu;
use crate::{Address, Error, Result};
use crate::{FrameType, FrameVersion, InformationElements};

/// A reader for a pre-2015 IEEE 802.15.4 beacon frame.
#[derive(Debug)]
pub struct BeaconFrame<T: AsRef<[u8]>> {
    mpdu: Mpdu<T>,
}

impl<T: AsRef<[u8]>> BeaconFrame<T> {
    /// Create a new [`BeaconFrame`] reader from a given buffer.
    pub fn new(buffer: T) -> Result<Self> {
        let frame = Self::new_unchecked(buffer);

        let fc = frame.mpdu.frame_control();
        if fc.frame_type() != FrameType::Beacon || !fc.frame_version().is_pre_2015() {
            return Err(Error::BadFormat);
        }

        frame.mpdu.validate()?;

        // The fixed beacon fields must fit after the header.
        let offset = frame.mpdu.header_len();
        let buffer = frame.mpdu().buffer_ref();
        if buffer.len() < offset + 2 {
            return Err(Error::WrongLength);
        }

        let gts = GtsFields::new(&buffer[offset + 2..])?;
        let pending_offset = offset + 2 + gts.len();
        PendingAddressFields::new(&buffer[pending_offset..])?;

        Ok(frame)
    }

    /// Create a new [`BeaconFrame`] reader from a given buffer without
    /// validation.
    pub fn new_unchecked(buffer: T) -> Self {
        Self {
            mpdu: Mpdu::new_unchecked(buffer),
        }
    }

    /// Return the underlying [`Mpdu`] reader.
    pub fn mpdu(&self) -> &Mpdu<T> {
        &self.mpdu
    }

    /// Return a [`crate::FrameControl`] reader.
    pub fn frame_control(&self) -> crate::FrameControl<&'_ [u8]> {
        self.mpdu.frame_control()
    }

    /// Return the sequence number. Pre-2015 frames cannot suppress it.
    pub fn sequence_number(&self) -> u8 {
        self.mpdu().buffer_ref()[2]
    }

    /// Return the [`SuperframeSpecification`] field.
    pub fn superframe_specification(&self) -> SuperframeSpecification {
        let offset = self.mpdu.header_len();
        let b = &self.mpdu().buffer_ref()[offset..][..2];
        SuperframeSpecification::from_word(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Return a [`GtsFields`] reader.
    pub fn gts_fields(&self) -> GtsFields<&'_ [u8]> {
        let offset = self.mpdu.header_len() + 2;
        GtsFields::new_unchecked(&self.mpdu().buffer_ref()[offset..])
    }

    /// Return a [`PendingAddressFields`] reader.
    pub fn pending_address_fields(&self) -> PendingAddressFields<&'_ [u8]> {
        let offset = self.mpdu.header_len() + 2 + self.gts_fields().len();
        PendingAddressFields::new_unchecked(&self.mpdu().buffer_ref()[offset..])
    }
}

impl<'f, T: AsRef<[u8]> + ?Sized> BeaconFrame<&'f T> {
    /// Return the beacon payload.
    pub fn payload(&self) -> Option<&'f [u8]> {
        let offset = self.mpdu.header_len()
            + 2
            + self.gts_fields().len()
            + self.pending_address_fields().len();

        let buffer = self.mpdu.buffer_ref_f();
        if buffer.len() <= offset {
            return None;
        }

        Some(&buffer[offset..])
    }
}

/// The decoded Superframe Specification field of a beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperframeSpecification {
    /// The beacon order; 15 means beacons are sent on demand.
    pub beacon_order: u8,
    /// The superframe order; 15 means the superframe is inactive after the
    /// beacon.
    pub superframe_order: u8,
    /// The final slot of the contention access period.
    pub final_cap_slot: u8,
    /// The battery life extension flag.
    pub battery_life_extension: bool,
    /// Set when the beacon is sent by the PAN coordinator.
    pub pan_coordinator: bool,
    /// Set when the coordinator accepts association requests.
    pub association_permit: bool,
}

impl SuperframeSpecification {
    /// Decode the specification from its little-endian 16-bit word.
    pub fn from_word(word: u16) -> Self {
        Self {
            beacon_order: (word & 0b1111) as u8,
            superframe_order: ((word >> 4) & 0b1111) as u8,
            final_cap_slot: ((word >> 8) & 0b1111) as u8,
            battery_life_extension: (word >> 12) & 0b1 == 0b1,
            pan_coordinator: (word >> 14) & 0b1 == 0b1,
            association_permit: (word >> 15) & 0b1 == 0b1,
        }
    }

    /// Encode the specification into its 16-bit word.
    pub fn to_word(&self) -> u16 {
        (self.beacon_order as u16 & 0b1111)
            | ((self.superframe_order as u16 & 0b1111) << 4)
            | ((self.final_cap_slot as u16 & 0b1111) << 8)
            | ((self.battery_life_extension as u16) << 12)
            | ((self.pan_coordinator as u16) << 14)
            | ((self.association_permit as u16) << 15)
    }
}

/// A reader for the GTS specification, directions and descriptor list of a
/// beacon.
pub struct GtsFields<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> GtsFields<T> {
    /// Create a new [`GtsFields`] reader from a given buffer.
    pub fn new(buffer: T) -> Result<Self> {
        let gts = Self::new_unchecked(buffer);

        if gts.buffer.as_ref().is_empty() {
            return Err(Error::WrongLength);
        }

        if gts.buffer.as_ref().len() < gts.len() {
            return Err(Error::WrongLength);
        }

        Ok(gts)
    }

    /// Create a new [`GtsFields`] reader from a given buffer without length
    /// checking.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    /// Return the GTS descriptor count.
    pub fn descriptor_count(&self) -> u8 {
        self.buffer.as_ref()[0] & 0b111
    }

    /// Returns `true` when the coordinator accepts GTS requests.
    pub fn gts_permit(&self) -> bool {
        (self.buffer.as_ref()[0] >> 7) & 0b1 == 0b1
    }

    /// Return the length of the GTS fields in octets: the specification,
    /// and, when descriptors are present, the directions byte and the
    /// 3-octet descriptors.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        let count = self.descriptor_count() as usize;
        if count == 0 {
            1
        } else {
            1 + 1 + count * 3
        }
    }

    /// Return an [`Iterator`] over the GTS descriptors.
    pub fn descriptors(&self) -> GtsDescriptorIterator {
        let count = self.descriptor_count() as usize;
        if count == 0 {
            GtsDescriptorIterator {
                data: &[],
                directions: 0,
                index: 0,
                count: 0,
            }
        } else {
            GtsDescriptorIterator {
                data: &self.buffer.as_ref()[2..][..count * 3],
                directions: self.buffer.as_ref()[1] & 0b0111_1111,
                index: 0,
                count,
            }
        }
    }
}

/// A decoded GTS descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GtsDescriptor {
    /// The short address of the device the GTS belongs to.
    pub short_address: Address,
    /// The superframe slot at which the GTS begins.
    pub starting_slot: u8,
    /// The number of contiguous superframe slots of the GTS.
    pub length: u8,
    /// The direction of the GTS: `true` is receive-only.
    pub receive_only: bool,
}

/// An [`Iterator`] over [`GtsDescriptor`].
pub struct GtsDescriptorIterator<'f> {
    data: &'f [u8],
    directions: u8,
    index: usize,
    count: usize,
}

impl Iterator for GtsDescriptorIterator<'_> {
    type Item = GtsDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count || self.data.len() < (self.index + 1) * 3 {
            return None;
        }

        let d = &self.data[self.index * 3..][..3];
        let descriptor = GtsDescriptor {
            short_address: Address::Short([d[1], d[0]]),
            starting_slot: d[2] & 0b1111,
            length: (d[2] >> 4) & 0b1111,
            receive_only: (self.directions >> self.index) & 0b1 == 0b1,
        };

        self.index += 1;
        Some(descriptor)
    }
}

/// A reader for the pending address specification and list of a beacon.
pub struct PendingAddressFields<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> PendingAddressFields<T> {
    /// Create a new [`PendingAddressFields`] reader from a given buffer.
    pub fn new(buffer: T) -> Result<Self> {
        let pending = Self::new_unchecked(buffer);

        if pending.buffer.as_ref().is_empty() {
            return Err(Error::WrongLength);
        }

        if pending.buffer.as_ref().len() < pending.len() {
            return Err(Error::WrongLength);
        }

        Ok(pending)
    }

    /// Create a new [`PendingAddressFields`] reader from a given buffer
    /// without length checking.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    /// Return the number of pending short addresses.
    pub fn short_address_count(&self) -> u8 {
        self.buffer.as_ref()[0] & 0b111
    }

    /// Return the number of pending extended addresses.
    pub fn extended_address_count(&self) -> u8 {
        (self.buffer.as_ref()[0] >> 4) & 0b111
    }

    /// Return the length of the pending address fields in octets.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        1 + self.short_address_count() as usize * 2 + self.extended_address_count() as usize * 8
    }

    /// Return an [`Iterator`] over the pending addresses, short addresses
    /// first.
    pub fn addresses(&self) -> PendingAddressIterator {
        PendingAddressIterator {
            data: &self.buffer.as_ref()[1..][..self.len() - 1],
            short_remaining: self.short_address_count(),
            extended_remaining: self.extended_address_count(),
        }
    }
}

/// An [`Iterator`] over the pending addresses of a beacon.
pub struct PendingAddressIterator<'f> {
    data: &'f [u8],
    short_remaining: u8,
    extended_remaining: u8,
}

impl Iterator for PendingAddressIterator<'_> {
    type Item = Address;

    fn next(&mut self) -> Option<Self::Item> {
        if self.short_remaining > 0 {
            if self.data.len() < 2 {
                return None;
            }

            // On-wire addresses are little-endian.
            let address = Address::Short([self.data[1], self.data[0]]);
            self.data = &self.data[2..];
            self.short_remaining -= 1;
            return Some(address);
        }

        if self.extended_remaining > 0 {
            if self.data.len() < 8 {
                return None;
            }

            let mut raw = [0u8; 8];
            raw.copy_from_slice(&self.data[..8]);
            raw.reverse();
            self.data = &self.data[8..];
            self.extended_remaining -= 1;
            return Some(Address::Extended(raw));
        }

        None
    }
}

/// A reader for an IEEE 802.15.4 enhanced beacon frame.
#[derive(Debug)]
pub struct EnhancedBeaconFrame<T: AsRef<[u8]>> {
    mpdu: Mpdu<T>,
}

impl<T: AsRef<[u8]>> EnhancedBeaconFrame<T> {
    /// Create a new [`EnhancedBeaconFrame`] reader from a given buffer.
    pub fn new(buffer: T) -> Result<Self> {
        let frame = Self::new_unchecked(buffer);

        let fc = frame.mpdu.frame_control();
        if fc.frame_type() != FrameType::Beacon
            || fc.frame_version() != FrameVersion::Ieee802154_2020
        {
            return Err(Error::BadFormat);
        }

        frame.mpdu.validate()?;

        Ok(frame)
    }

    /// Create a new [`EnhancedBeaconFrame`] reader from a given buffer
    /// without validation.
    pub fn new_unchecked(buffer: T) -> Self {
        Self {
            mpdu: Mpdu::new_unchecked(buffer),
        }
    }

    /// Return the underlying [`Mpdu`] reader.
    pub fn mpdu(&self) -> &Mpdu<T> {
        &self.mpdu
    }

    /// Return an [`InformationElements`] reader, if present.
    pub fn information_elements(&self) -> Option<InformationElements<&'_ [u8]>> {
        self.mpdu.information_elements()
    }
}
