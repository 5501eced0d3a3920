//! Header Information Element readers and writers.
//!
//! A header IE starts with a 2-byte descriptor in little-endian packed
//! layout:
//!
//! ```notrust
//! +----------+--------------+--------+-------------+
//! | Length:7 | Element ID:8 | Type:1 | Content ... |
//! +----------+--------------+--------+-------------+
//! ```

use crate::time::Duration;
use crate::{Error, Result};

const LENGTH_MASK: u16 = 0b0111_1111;
const ELEMENT_ID_SHIFT: u16 = 7;
const ELEMENT_ID_MASK: u16 = 0b1111_1111;

/// A reader/writer for an IEEE 802.15.4 Header Information Element.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub struct HeaderInformationElement<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> HeaderInformationElement<T> {
    /// Create a new [`HeaderInformationElement`] reader/writer from a given
    /// buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is too short for the descriptor or
    /// the content it declares.
    pub fn new(data: T) -> Result<Self> {
        let ie = Self::new_unchecked(data);

        if ie.data.as_ref().len() < 2 {
            return Err(Error::WrongLength);
        }

        if ie.data.as_ref().len() < 2 + ie.len() {
            return Err(Error::WrongLength);
        }

        Ok(ie)
    }

    /// Create a new [`HeaderInformationElement`] reader/writer from a given
    /// buffer without length checking.
    pub fn new_unchecked(data: T) -> Self {
        Self { data }
    }

    fn descriptor(&self) -> u16 {
        let b = &self.data.as_ref()[0..2];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Returns `true` when the length field is 0.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the content length declared by the descriptor.
    pub fn len(&self) -> usize {
        (self.descriptor() & LENGTH_MASK) as usize
    }

    /// Return the [`HeaderElementId`].
    pub fn element_id(&self) -> HeaderElementId {
        HeaderElementId::from(((self.descriptor() >> ELEMENT_ID_SHIFT) & ELEMENT_ID_MASK) as u8)
    }

    /// Return the content of this Header Information Element.
    pub fn content(&self) -> &[u8] {
        &self.data.as_ref()[2..][..self.len()]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> HeaderInformationElement<T> {
    /// Zero the element, descriptor included.
    pub fn clear(&mut self) {
        self.data.as_mut().fill(0);
    }

    fn set_descriptor(&mut self, value: u16) {
        self.data.as_mut()[0..2].copy_from_slice(&value.to_le_bytes());
    }

    /// Set the content length field.
    pub fn set_length(&mut self, len: u16) {
        let value = self.descriptor() & !LENGTH_MASK;
        self.set_descriptor(value | (len & LENGTH_MASK));
    }

    /// Set the element ID field. The type bit of a header IE is zero.
    pub fn set_element_id(&mut self, id: HeaderElementId) {
        let value = self.descriptor() & !(ELEMENT_ID_MASK << ELEMENT_ID_SHIFT);
        self.set_descriptor(value | (((id as u16) & ELEMENT_ID_MASK) << ELEMENT_ID_SHIFT));
    }

    /// Return a mutable reference to the content of this element.
    pub fn content_mut(&mut self) -> &mut [u8] {
        &mut self.data.as_mut()[2..]
    }
}

impl<T: AsRef<[u8]>> core::fmt::Display for HeaderInformationElement<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let id = self.element_id();
        match id {
            HeaderElementId::HeaderTermination1 | HeaderElementId::HeaderTermination2 => {
                write!(f, "{id:?}")
            }
            HeaderElementId::TimeCorrection => {
                let Ok(tc) = TimeCorrection::new(self.content()) else {
                    return write!(f, "{:?}({:0x?})", id, self.content());
                };
                write!(f, "{id:?} {tc}")
            }
            id => write!(f, "{:?}({:0x?})", id, self.content()),
        }
    }
}

/// Header Information Element ID.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum HeaderElementId {
    /// Vendor specific header.
    VendorSpecificHeader = 0x00,
    /// CSL header.
    Csl = 0x1a,
    /// RIT header.
    Rit = 0x1b,
    /// DSME PAN descriptor header.
    DsmePanDescriptor = 0x1c,
    /// Rendezvous Time header.
    RendezvousTime = 0x1d,
    /// Time Correction header.
    TimeCorrection = 0x1e,
    /// Simplified Superframe Specification header.
    SimplifiedSuperframeSpecification = 0x23,
    /// Header Termination 1: payload IEs follow.
    HeaderTermination1 = 0x7e,
    /// Header Termination 2: the plain payload follows.
    HeaderTermination2 = 0x7f,
    /// An element ID this crate does not interpret.
    Unknown,
}

impl From<u8> for HeaderElementId {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::VendorSpecificHeader,
            0x1a => Self::Csl,
            0x1b => Self::Rit,
            0x1c => Self::DsmePanDescriptor,
            0x1d => Self::RendezvousTime,
            0x1e => Self::TimeCorrection,
            0x23 => Self::SimplifiedSuperframeSpecification,
            0x7e => Self::HeaderTermination1,
            0x7f => Self::HeaderTermination2,
            _ => Self::Unknown,
        }
    }
}

/// An [`Iterator`] over [`HeaderInformationElement`].
///
/// Unknown element IDs are yielded and skipped over; a Header Termination 1
/// or 2 terminates the walk.
#[derive(Debug)]
pub struct HeaderInformationElementsIterator<'f> {
    pub(crate) data: &'f [u8],
    pub(crate) offset: usize,
    pub(crate) terminated: bool,
}

impl HeaderInformationElementsIterator<'_> {
    /// Return the offset behind the last yielded element.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'f> Iterator for HeaderInformationElementsIterator<'f> {
    type Item = HeaderInformationElement<&'f [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.terminated {
            return None;
        }

        let ie = HeaderInformationElement::new(&self.data[self.offset..]).ok()?;

        self.terminated = matches!(
            ie.element_id(),
            HeaderElementId::HeaderTermination1 | HeaderElementId::HeaderTermination2
        );

        self.offset += ie.len() + 2;

        if self.offset >= self.data.len() {
            self.terminated = true;
        }

        Some(ie)
    }
}

/// A reader/writer for the CSL Header Information Element.
///
/// The reduced form carries the CSL phase and period; the full form
/// additionally carries the rendezvous time. The two are distinguished by
/// the element length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Csl<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> Csl<T> {
    /// Create a new [`Csl`] reader/writer from a given buffer.
    pub fn new(data: T) -> Result<Self> {
        let csl = Self::new_unchecked(data);

        if csl.data.as_ref().len() < 4 {
            return Err(Error::WrongLength);
        }

        Ok(csl)
    }

    /// Create a new [`Csl`] reader/writer from a given buffer without length
    /// checking.
    pub fn new_unchecked(data: T) -> Self {
        Self { data }
    }

    /// Return the CSL phase field, in units of 10 symbols.
    pub fn csl_phase(&self) -> u16 {
        let b = &self.data.as_ref()[0..2];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Return the CSL period field, in units of 10 symbols.
    pub fn csl_period(&self) -> u16 {
        let b = &self.data.as_ref()[2..4];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Return the rendezvous time field of the full form, if present.
    pub fn rendezvous_time(&self) -> Option<u16> {
        if self.data.as_ref().len() < 6 {
            return None;
        }

        let b = &self.data.as_ref()[4..6];
        Some(u16::from_le_bytes([b[0], b[1]]))
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Csl<T> {
    /// Set the CSL phase field.
    pub fn set_csl_phase(&mut self, phase: u16) {
        self.data.as_mut()[0..2].copy_from_slice(&phase.to_le_bytes());
    }

    /// Set the CSL period field.
    pub fn set_csl_period(&mut self, period: u16) {
        self.data.as_mut()[2..4].copy_from_slice(&period.to_le_bytes());
    }

    /// Set the rendezvous time field of the full form.
    pub fn set_rendezvous_time(&mut self, time: u16) {
        self.data.as_mut()[4..6].copy_from_slice(&time.to_le_bytes());
    }
}

/// A reader/writer for the RIT Header Information Element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rit<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> Rit<T> {
    /// Create a new [`Rit`] reader/writer from a given buffer.
    pub fn new(data: T) -> Result<Self> {
        let rit = Self::new_unchecked(data);

        if rit.data.as_ref().len() < 4 {
            return Err(Error::WrongLength);
        }

        Ok(rit)
    }

    /// Create a new [`Rit`] reader/writer from a given buffer without length
    /// checking.
    pub fn new_unchecked(data: T) -> Self {
        Self { data }
    }

    /// Return the time to first listen field.
    pub fn time_to_first_listen(&self) -> u8 {
        self.data.as_ref()[0]
    }

    /// Return the number of repeat listen field.
    pub fn number_of_repeat_listen(&self) -> u8 {
        self.data.as_ref()[1]
    }

    /// Return the repeat listen interval field.
    pub fn repeat_listen_interval(&self) -> u16 {
        let b = &self.data.as_ref()[2..4];
        u16::from_le_bytes([b[0], b[1]])
    }
}

/// A reader/writer for the Rendezvous Time Header Information Element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendezvousTime<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> RendezvousTime<T> {
    /// Create a new [`RendezvousTime`] reader/writer from a given buffer.
    pub fn new(data: T) -> Result<Self> {
        let rt = Self::new_unchecked(data);

        if rt.data.as_ref().len() < 4 {
            return Err(Error::WrongLength);
        }

        Ok(rt)
    }

    /// Create a new [`RendezvousTime`] reader/writer from a given buffer
    /// without length checking.
    pub fn new_unchecked(data: T) -> Self {
        Self { data }
    }

    /// Return the rendezvous time field.
    pub fn rendezvous_time(&self) -> u16 {
        let b = &self.data.as_ref()[0..2];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Return the wake-up interval field.
    pub fn wake_up_interval(&self) -> u16 {
        let b = &self.data.as_ref()[2..4];
        u16::from_le_bytes([b[0], b[1]])
    }
}

/// A reader/writer for the Time Correction Header Information Element
/// (IEEE 802.15.4-2020 §7.4.2.7).
///
/// The two content octets pack a signed 12-bit time correction in
/// microseconds and, in the top bit, the NACK flag.
pub struct TimeCorrection<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> TimeCorrection<T> {
    /// The representable correction range, in microseconds.
    pub const MIN_CORRECTION_US: i64 = -2048;
    /// The representable correction range, in microseconds.
    pub const MAX_CORRECTION_US: i64 = 2047;

    /// Create a new [`TimeCorrection`] reader/writer from a given buffer.
    pub fn new(buffer: T) -> Result<Self> {
        let tc = Self::new_unchecked(buffer);

        if tc.buffer.as_ref().len() < 2 {
            return Err(Error::WrongLength);
        }

        Ok(tc)
    }

    /// Create a new [`TimeCorrection`] reader/writer from a given buffer
    /// without length checking.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    /// Return the length of the Time Correction content.
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        2
    }

    /// Return the time correction value.
    pub fn time_correction(&self) -> Duration {
        let b = &self.buffer.as_ref()[0..2];
        // Sign-extend the 12-bit field.
        let raw = ((u16::from_le_bytes([b[0], b[1]]) & 0x0fff) << 4) as i16;
        Duration::from_us((raw >> 4) as i64)
    }

    /// Returns `true` when the frame is negatively acknowledged.
    pub fn nack(&self) -> bool {
        let b = &self.buffer.as_ref()[0..2];
        u16::from_le_bytes([b[0], b[1]]) & 0x8000 != 0
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> TimeCorrection<T> {
    /// Set the time correction value, truncated to the signed 12-bit range.
    pub fn set_time_correction(&mut self, time_correction: Duration) {
        let raw = (time_correction.as_us() as i16) as u16 & 0x0fff;
        let b = &mut self.buffer.as_mut()[0..2];
        let value = (u16::from_le_bytes([b[0], b[1]]) & 0x8000) | raw;
        b.copy_from_slice(&value.to_le_bytes());
    }

    /// Set the NACK flag.
    pub fn set_nack(&mut self, nack: bool) {
        let b = &mut self.buffer.as_mut()[0..2];
        let value = u16::from_le_bytes([b[0], b[1]]) & 0x7fff;
        let value = value | ((nack as u16) << 15);
        b.copy_from_slice(&value.to_le_bytes());
    }
}

impl<T: AsRef<[u8]>> core::fmt::Display for TimeCorrection<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}, nack: {}", self.time_correction(), self.nack() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_ie_descriptor() {
        let mut buffer = [0u8; 4];
        let mut ie = HeaderInformationElement::new_unchecked(&mut buffer[..]);
        ie.clear();
        ie.set_length(2);
        ie.set_element_id(HeaderElementId::TimeCorrection);

        assert_eq!(buffer[..2], [0x02, 0x0f]);

        let ie = HeaderInformationElement::new(&buffer[..]).unwrap();
        assert_eq!(ie.len(), 2);
        assert_eq!(ie.element_id(), HeaderElementId::TimeCorrection);
    }

    #[test]
    fn iterator_stops_at_termination() {
        // Time Correction, HT2, then garbage that must not be yielded.
        let data = [0x02, 0x0f, 0x01, 0x00, 0x80, 0x3f, 0xde, 0xad];
        let iter = HeaderInformationElementsIterator {
            data: &data,
            offset: 0,
            terminated: false,
        };

        let ids: std::vec::Vec<_> = iter.map(|ie| ie.element_id()).collect();
        assert_eq!(
            ids,
            [
                HeaderElementId::TimeCorrection,
                HeaderElementId::HeaderTermination2
            ]
        );
    }

    #[test]
    fn time_correction_roundtrip() {
        let mut buffer = [0u8; 2];
        let mut tc = TimeCorrection::new_unchecked(&mut buffer[..]);
        tc.set_time_correction(Duration::from_us(1));
        tc.set_nack(false);

        assert_eq!(buffer, [0x01, 0x00]);

        let tc = TimeCorrection::new(&buffer[..]).unwrap();
        assert_eq!(tc.time_correction(), Duration::from_us(1));
        assert!(!tc.nack());
    }

    #[test]
    fn time_correction_negative() {
        let mut buffer = [0u8; 2];
        let mut tc = TimeCorrection::new_unchecked(&mut buffer[..]);
        tc.set_time_correction(Duration::from_us(-600));
        tc.set_nack(true);

        let tc = TimeCorrection::new(&buffer[..]).unwrap();
        assert_eq!(tc.time_correction(), Duration::from_us(-600));
        assert!(tc.nack());
    }

    #[test]
    fn csl_forms() {
        let reduced = [0x10, 0x00, 0x20, 0x00];
        let csl = Csl::new(&reduced[..]).unwrap();
        assert_eq!(csl.csl_phase(), 0x10);
        assert_eq!(csl.csl_period(), 0x20);
        assert_eq!(csl.rendezvous_time(), None);

        let full = [0x10, 0x00, 0x20, 0x00, 0x30, 0x00];
        let csl = Csl::new(&full[..]).unwrap();
        assert_eq!(csl.rendezvous_time(), Some(0x30));
    }
}
