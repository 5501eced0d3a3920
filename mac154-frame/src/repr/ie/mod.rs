mod headers;
pub use headers::*;

mod nested;
pub use nested::*;

mod payloads;
pub use payloads::*;

use super::super::{InformationElements, PayloadInformationElement};
use super::Result;

use heapless::Vec;

/// A high-level representation of the Information Elements of a frame.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InformationElementsRepr {
    /// The header information elements.
    pub header_information_elements: Vec<HeaderInformationElementRepr, 8>,
    /// The payload information elements.
    pub payload_information_elements: Vec<PayloadInformationElementRepr, 8>,
}

impl InformationElementsRepr {
    /// Parse the Information Elements of a frame.
    ///
    /// Termination elements are consumed by the iterators and re-derived at
    /// emission time, so they are not stored in the representation.
    pub fn parse(ie: InformationElements<&[u8]>) -> Result<Self> {
        let mut header_information_elements = Vec::new();
        let mut payload_information_elements = Vec::new();

        for header_ie in ie.header_information_elements() {
            match HeaderInformationElementRepr::parse(&header_ie)? {
                HeaderInformationElementRepr::HeaderTermination1
                | HeaderInformationElementRepr::HeaderTermination2 => {}
                repr => {
                    if header_information_elements.push(repr).is_err() {
                        break;
                    }
                }
            }
        }

        for payload_ie in ie.payload_information_elements() {
            match PayloadInformationElementRepr::parse(&payload_ie)? {
                PayloadInformationElementRepr::PayloadTermination => {}
                repr => {
                    if payload_information_elements.push(repr).is_err() {
                        break;
                    }
                }
            }
        }

        Ok(Self {
            header_information_elements,
            payload_information_elements,
        })
    }

    /// The termination elements required when emitting: Header
    /// Termination 1, Header Termination 2 and Payload Termination.
    fn terminations(&self, contains_payload: bool) -> (bool, bool, bool) {
        match (
            !self.header_information_elements.is_empty(),
            !self.payload_information_elements.is_empty(),
            contains_payload,
        ) {
            // Payload IEs require a Header Termination 1, whether or not
            // header IEs precede it.
            (_, true, false) => (true, false, false),
            (_, true, true) => (true, false, true),
            // Header IEs followed by a plain payload require a Header
            // Termination 2.
            (true, false, true) => (false, true, false),
            // Header IEs alone are terminated by the end of the frame.
            (true, false, false) => (false, false, false),
            (false, false, _) => (false, false, false),
        }
    }

    /// The buffer length required to emit the Information Elements.
    pub fn buffer_len(&self, contains_payload: bool) -> usize {
        let (ht1, ht2, pt) = self.terminations(contains_payload);

        let mut len = 0;

        for ie in self.header_information_elements.iter() {
            len += ie.buffer_len();
        }

        len += (ht1 as usize + ht2 as usize) * 2;

        for ie in self.payload_information_elements.iter() {
            len += ie.buffer_len();
        }

        len += pt as usize * 2;

        len
    }

    /// Emit the Information Elements into a buffer.
    pub fn emit(&self, buffer: &mut [u8], contains_payload: bool) {
        let (ht1, ht2, pt) = self.terminations(contains_payload);

        let mut offset = 0;

        for ie in self.header_information_elements.iter() {
            ie.emit(&mut buffer[offset..][..ie.buffer_len()]);
            offset += ie.buffer_len();
        }

        if ht1 {
            HeaderInformationElementRepr::HeaderTermination1.emit(&mut buffer[offset..][..2]);
            offset += 2;
        }

        if ht2 {
            HeaderInformationElementRepr::HeaderTermination2.emit(&mut buffer[offset..][..2]);
            offset += 2;
        }

        for ie in self.payload_information_elements.iter() {
            ie.emit(&mut PayloadInformationElement::new_unchecked(
                &mut buffer[offset..][..ie.buffer_len()],
            ));
            offset += ie.buffer_len();
        }

        if pt {
            PayloadInformationElementRepr::PayloadTermination.emit(
                &mut PayloadInformationElement::new_unchecked(&mut buffer[offset..][..2]),
            );
        }
    }
}
