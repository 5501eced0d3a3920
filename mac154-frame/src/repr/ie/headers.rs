use super::super::super::{Error, Result};
use super::super::super::{HeaderElementId, HeaderInformationElement, TimeCorrection};

use crate::time::Duration;

/// A high-level representation of a Header Information Element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderInformationElementRepr {
    /// Time Correction Header Information Element.
    TimeCorrection(TimeCorrectionRepr),
    /// Header Termination 1.
    HeaderTermination1,
    /// Header Termination 2.
    HeaderTermination2,
}

impl HeaderInformationElementRepr {
    /// Parse a Header Information Element.
    pub fn parse(ie: &HeaderInformationElement<&[u8]>) -> Result<Self> {
        Ok(match ie.element_id() {
            HeaderElementId::TimeCorrection => Self::TimeCorrection(TimeCorrectionRepr::parse(
                &TimeCorrection::new(ie.content())?,
            )),
            HeaderElementId::HeaderTermination1 => Self::HeaderTermination1,
            HeaderElementId::HeaderTermination2 => Self::HeaderTermination2,
            _ => return Err(Error::NotSupported),
        })
    }

    /// The buffer length required to emit this element.
    pub fn buffer_len(&self) -> usize {
        2 + self.content_len()
    }

    fn content_len(&self) -> usize {
        match self {
            Self::TimeCorrection(tc) => tc.buffer_len(),
            Self::HeaderTermination1 | Self::HeaderTermination2 => 0,
        }
    }

    /// Emit this element into a buffer.
    pub fn emit(&self, buffer: &mut [u8]) {
        let mut w = HeaderInformationElement::new_unchecked(buffer);
        w.clear();
        w.set_length(self.content_len() as u16);
        w.set_element_id(self.into());

        if let Self::TimeCorrection(repr) = self {
            repr.emit(&mut TimeCorrection::new_unchecked(w.content_mut()));
        }
    }
}

impl From<&HeaderInformationElementRepr> for HeaderElementId {
    fn from(value: &HeaderInformationElementRepr) -> Self {
        match value {
            HeaderInformationElementRepr::TimeCorrection(_) => HeaderElementId::TimeCorrection,
            HeaderInformationElementRepr::HeaderTermination1 => {
                HeaderElementId::HeaderTermination1
            }
            HeaderInformationElementRepr::HeaderTermination2 => {
                HeaderElementId::HeaderTermination2
            }
        }
    }
}

/// A high-level representation of a Time Correction Header Information
/// Element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeCorrectionRepr {
    /// The time correction, in microseconds.
    pub time_correction: Duration,
    /// The negative acknowledgment flag.
    pub nack: bool,
}

impl TimeCorrectionRepr {
    /// Parse a Time Correction Header Information Element.
    pub fn parse(tc: &TimeCorrection<&'_ [u8]>) -> Self {
        Self {
            time_correction: tc.time_correction(),
            nack: tc.nack(),
        }
    }

    /// The buffer length required to emit the element content.
    pub const fn buffer_len(&self) -> usize {
        2
    }

    /// Emit the element content.
    pub fn emit(&self, tc: &mut TimeCorrection<&mut [u8]>) {
        tc.set_time_correction(self.time_correction);
        tc.set_nack(self.nack);
    }
}
