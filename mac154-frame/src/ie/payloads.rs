//! Payload Information Element readers and writers.
//!
//! A payload IE starts with a 2-byte descriptor in little-endian packed
//! layout:
//!
//! ```notrust
//! +-----------+------------+--------+-------------+
//! | Length:11 | Group ID:4 | Type:1 | Content ... |
//! +-----------+------------+--------+-------------+
//! ```

use super::NestedInformationElementsIterator;
use crate::{Error, Result};

const LENGTH_MASK: u16 = 0b0000_0111_1111_1111;
const GROUP_ID_SHIFT: u16 = 11;
const GROUP_ID_MASK: u16 = 0b1111;
const TYPE_BIT: u16 = 0b1000_0000_0000_0000;

/// A reader/writer for an IEEE 802.15.4 Payload Information Element.
#[derive(Debug, Eq, PartialEq)]
pub struct PayloadInformationElement<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> PayloadInformationElement<T> {
    /// Create a new [`PayloadInformationElement`] reader/writer from a given
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

    /// Create a new [`PayloadInformationElement`] reader/writer from a given
    /// buffer without length checking.
    pub fn new_unchecked(data: T) -> Self {
        Self { data }
    }

    fn descriptor(&self) -> u16 {
        let b = &self.data.as_ref()[0..2];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Return the content length declared by the descriptor.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        (self.descriptor() & LENGTH_MASK) as usize
    }

    /// Return the [`PayloadGroupId`].
    pub fn group_id(&self) -> PayloadGroupId {
        PayloadGroupId::from(((self.descriptor() >> GROUP_ID_SHIFT) & GROUP_ID_MASK) as u8)
    }

    /// Return the content of this Payload Information Element.
    pub fn content(&self) -> &[u8] {
        &self.data.as_ref()[2..][..self.len()]
    }

    /// Returns an [`Iterator`] over the nested IEs of an MLME group.
    ///
    /// # Panics
    /// Panics if the group is not [`PayloadGroupId::Mlme`].
    pub fn nested_information_elements(&self) -> NestedInformationElementsIterator {
        assert!(self.group_id() == PayloadGroupId::Mlme);
        NestedInformationElementsIterator::new(self.content())
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> PayloadInformationElement<T> {
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

    /// Set the group ID field. The type bit of a payload IE is one.
    pub fn set_group_id(&mut self, id: PayloadGroupId) {
        let value = self.descriptor() & !(GROUP_ID_MASK << GROUP_ID_SHIFT);
        self.set_descriptor(value | (((id as u16) & GROUP_ID_MASK) << GROUP_ID_SHIFT) | TYPE_BIT);
    }

    /// Return a mutable reference to the content of this element.
    pub fn content_mut(&mut self) -> &mut [u8] {
        &mut self.data.as_mut()[2..]
    }
}

/// Payload Information Element group ID.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum PayloadGroupId {
    /// Encapsulated Service Data Unit.
    Esdu = 0x00,
    /// MLME: the content is a list of nested IEs.
    Mlme = 0x01,
    /// Vendor specific nested IEs.
    VendorSpecific = 0x02,
    /// Payload Termination.
    PayloadTermination = 0x0f,
    /// A group ID this crate does not interpret.
    Unknown,
}

impl From<u8> for PayloadGroupId {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::Esdu,
            0x01 => Self::Mlme,
            0x02 => Self::VendorSpecific,
            0x0f => Self::PayloadTermination,
            _ => Self::Unknown,
        }
    }
}

/// An [`Iterator`] over [`PayloadInformationElement`].
///
/// Unknown groups are yielded and skipped by their declared length; a
/// Payload Termination element terminates the walk.
#[derive(Debug)]
pub struct PayloadInformationElementsIterator<'f> {
    pub(crate) data: &'f [u8],
    pub(crate) offset: usize,
    pub(crate) terminated: bool,
}

impl PayloadInformationElementsIterator<'_> {
    /// Return the offset behind the last yielded element.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'f> Iterator for PayloadInformationElementsIterator<'f> {
    type Item = PayloadInformationElement<&'f [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.terminated {
            return None;
        }

        let ie = PayloadInformationElement::new(&self.data[self.offset..]).ok()?;

        self.terminated = matches!(ie.group_id(), PayloadGroupId::PayloadTermination);

        self.offset += ie.len() + 2;

        if self.offset >= self.data.len() {
            self.terminated = true;
        }

        Some(ie)
    }
}
