//! Information Element readers and writers.

mod headers;
pub use headers::*;

mod payloads;
pub use payloads::*;

mod nested;
pub use nested::*;

use super::{Error, Result};

/// A reader over the Information Elements of a frame.
///
/// The buffer starts right after the MAC header. Header IEs come first,
/// terminated by a Header Termination 1 or 2 element (or by the end of the
/// buffer); payload IEs follow a Header Termination 1.
pub struct InformationElements<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> InformationElements<T> {
    /// Create a new [`InformationElements`] reader from a given buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is too short for the elements it
    /// declares.
    pub fn new(data: T) -> Result<Self> {
        let ie = Self::new_unchecked(data);

        if !ie.check_len() {
            return Err(Error::WrongLength);
        }

        Ok(ie)
    }

    fn check_len(&self) -> bool {
        let mut len = self.header_ies_len();

        if len > self.data.as_ref().len() {
            return false;
        }

        let mut iter = self.payload_information_elements();
        while iter.next().is_some() {}
        len += iter.offset();

        self.data.as_ref().len() >= len
    }

    /// Create a new [`InformationElements`] reader from a given buffer
    /// without length checking.
    pub fn new_unchecked(data: T) -> Self {
        Self { data }
    }

    /// Return the length of the header IE part, terminators included.
    pub fn header_ies_len(&self) -> usize {
        let mut iter = self.header_information_elements();
        while iter.next().is_some() {}
        iter.offset()
    }

    /// Return the total length of the information elements.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        let mut len = self.header_ies_len();

        let mut iter = self.payload_information_elements();
        while iter.next().is_some() {}
        len += iter.offset();

        len
    }

    /// Returns an [`Iterator`] over the [`HeaderInformationElement`]s.
    pub fn header_information_elements(&self) -> HeaderInformationElementsIterator {
        HeaderInformationElementsIterator {
            data: self.data.as_ref(),
            offset: 0,
            terminated: self.data.as_ref().is_empty(),
        }
    }

    /// Returns an [`Iterator`] over the [`PayloadInformationElement`]s.
    pub fn payload_information_elements(&self) -> PayloadInformationElementsIterator {
        let start = self.header_ies_len();
        let terminated = start >= self.data.as_ref().len();

        PayloadInformationElementsIterator {
            data: &self.data.as_ref()[start.min(self.data.as_ref().len())..],
            offset: 0,
            terminated,
        }
    }
}
