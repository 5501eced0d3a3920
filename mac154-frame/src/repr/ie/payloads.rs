use super::super::super::{NestedInformationElement, PayloadGroupId, PayloadInformationElement};
use super::super::super::{Error, Result};
use super::NestedInformationElementRepr;

use heapless::Vec;

/// A high-level representation of a Payload Information Element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadInformationElementRepr {
    /// An MLME group carrying nested IEs.
    Mlme(Vec<NestedInformationElementRepr, 8>),
    /// Payload Termination.
    PayloadTermination,
}

impl PayloadInformationElementRepr {
    /// Parse a Payload Information Element.
    pub fn parse(ie: &PayloadInformationElement<&[u8]>) -> Result<Self> {
        match ie.group_id() {
            PayloadGroupId::Mlme => {
                let mut nested_information_elements = Vec::new();

                for nested in ie.nested_information_elements() {
                    if nested_information_elements
                        .push(NestedInformationElementRepr::parse(&nested)?)
                        .is_err()
                    {
                        break;
                    }
                }

                Ok(Self::Mlme(nested_information_elements))
            }
            PayloadGroupId::PayloadTermination => Ok(Self::PayloadTermination),
            _ => Err(Error::NotSupported),
        }
    }

    /// The buffer length required to emit this element.
    pub fn buffer_len(&self) -> usize {
        2 + self.content_len()
    }

    fn content_len(&self) -> usize {
        match self {
            Self::Mlme(nested) => nested.iter().map(|n| n.buffer_len()).sum(),
            Self::PayloadTermination => 0,
        }
    }

    /// Emit this element into a buffer.
    pub fn emit(&self, w: &mut PayloadInformationElement<&mut [u8]>) {
        w.clear();
        w.set_length(self.content_len() as u16);
        w.set_group_id(self.into());

        if let Self::Mlme(nested_ies) = self {
            let buffer = w.content_mut();
            let mut offset = 0;

            for nested in nested_ies.iter() {
                nested.emit(&mut NestedInformationElement::new_unchecked(
                    &mut buffer[offset..][..nested.buffer_len()],
                ));
                offset += nested.buffer_len();
            }
        }
    }
}

impl From<&PayloadInformationElementRepr> for PayloadGroupId {
    fn from(value: &PayloadInformationElementRepr) -> Self {
        match value {
            PayloadInformationElementRepr::Mlme(_) => PayloadGroupId::Mlme,
            PayloadInformationElementRepr::PayloadTermination => {
                PayloadGroupId::PayloadTermination
            }
        }
    }
}
