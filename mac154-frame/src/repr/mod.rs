use super::{Error, Frame, FrameControl, FrameType, Result};

mod addressing;
pub use addressing::AddressingFieldsRepr;

mod aux_sec_header;
pub use aux_sec_header::AuxiliarySecurityHeaderRepr;

mod frame_control;
pub use frame_control::FrameControlRepr;

mod ie;
pub use ie::*;

mod builder;
pub use builder::FrameBuilder;

/// A high-level representation of an IEEE 802.15.4 frame.
///
/// The payload is borrowed; the representation must not outlive the buffer
/// it was parsed from.
#[derive(Debug)]
pub struct FrameRepr<'p> {
    /// The frame control field.
    pub frame_control: FrameControlRepr,
    /// The sequence number, if not suppressed.
    pub sequence_number: Option<u8>,
    /// The addressing fields, if any.
    pub addressing_fields: Option<AddressingFieldsRepr>,
    /// The auxiliary security header, if security is enabled.
    pub aux_security_header: Option<AuxiliarySecurityHeaderRepr>,
    /// The information elements, if any.
    pub information_elements: Option<InformationElementsRepr>,
    /// The frame payload.
    pub payload: Option<&'p [u8]>,
}

impl<'f> FrameRepr<'f> {
    /// Parse an IEEE 802.15.4 frame into its representation.
    pub fn parse(reader: &Frame<&'f [u8]>) -> Result<Self> {
        let frame_control = FrameControlRepr::parse(reader.frame_control())?;
        let addressing_fields = reader.addressing().map(AddressingFieldsRepr::parse);
        let aux_security_header = reader
            .auxiliary_security_header()
            .as_ref()
            .map(AuxiliarySecurityHeaderRepr::parse)
            .transpose()?;
        let information_elements = reader
            .information_elements()
            .map(InformationElementsRepr::parse)
            .transpose()?;

        Ok(Self {
            frame_control,
            sequence_number: reader.sequence_number(),
            addressing_fields,
            aux_security_header,
            information_elements,
            payload: reader.payload(),
        })
    }

    /// Validate the cross-field consistency of the representation.
    pub fn validate(&self) -> Result<()> {
        let fc = &self.frame_control;

        // Suppressing the sequence number or carrying IEs needs a 2015
        // frame.
        if fc.frame_version.is_pre_2015()
            && (fc.sequence_number_suppression || fc.information_elements_present)
        {
            return Err(Error::BadFormat);
        }

        if fc.sequence_number_suppression != self.sequence_number.is_none() {
            return Err(Error::BadFormat);
        }

        if fc.security_enabled != self.aux_security_header.is_some() {
            return Err(Error::BadFormat);
        }

        match fc.frame_type {
            FrameType::Data => {
                if self.addressing_fields.is_none() {
                    return Err(Error::BadFormat);
                }

                if self.payload.map(|p| p.is_empty()).unwrap_or(true) {
                    return Err(Error::BadFormat);
                }
            }
            FrameType::Ack if fc.frame_version.is_pre_2015() => {
                if self.sequence_number.is_none() {
                    return Err(Error::BadFormat);
                }

                if self.addressing_fields.is_some() || self.payload.is_some() {
                    return Err(Error::BadFormat);
                }

                // Nothing else to check on an immediate acknowledgment.
                return Ok(());
            }
            _ => {}
        }

        if let Some(af) = &self.addressing_fields {
            af.validate(fc)?;
        }

        Ok(())
    }

    /// Return the length of the MAC header: frame control, sequence number,
    /// addressing fields and auxiliary security header.
    ///
    /// This is the deterministic size computation the MAC uses before
    /// emission; [`emit`] asserts that it matches what is actually written.
    ///
    /// [`emit`]: Self::emit
    pub fn header_len(&self) -> usize {
        let mut len = self.frame_control.buffer_len();

        if self.sequence_number.is_some() {
            len += 1;
        }

        if let Some(af) = &self.addressing_fields {
            len += af.buffer_len(&self.frame_control);
        }

        if let Some(aux) = &self.aux_security_header {
            len += aux.buffer_len();
        }

        len
    }

    /// Return the total length of the frame when emitted.
    pub fn buffer_len(&self) -> usize {
        let mut len = self.header_len();

        if let Some(ie) = &self.information_elements {
            len += ie.buffer_len(self.payload.is_some());
        }

        if let Some(payload) = self.payload {
            len += payload.len();
        }

        len
    }

    /// Emit the frame into a buffer of at least [`buffer_len`] octets.
    ///
    /// # Panics
    /// Panics if the number of header octets written does not match
    /// [`header_len`]: a mismatch means the size computation and the
    /// emission have diverged, which would corrupt the security procedure
    /// downstream.
    ///
    /// [`buffer_len`]: Self::buffer_len
    /// [`header_len`]: Self::header_len
    pub fn emit(&self, buffer: &mut [u8]) {
        buffer[..2].fill(0);
        self.frame_control
            .emit(&mut FrameControl::new_unchecked(&mut buffer[..2]));
        let mut offset = 2;

        if let Some(sequence_number) = self.sequence_number {
            buffer[offset] = sequence_number;
            offset += 1;
        }

        if let Some(af) = &self.addressing_fields {
            offset += af.emit(&mut buffer[offset..], &self.frame_control);
        }

        if let Some(aux) = &self.aux_security_header {
            offset += aux.emit(&mut buffer[offset..]);
        }

        assert_eq!(offset, self.header_len(), "MAC header length mismatch");

        if let Some(ie) = &self.information_elements {
            ie.emit(&mut buffer[offset..], self.payload.is_some());
            offset += ie.buffer_len(self.payload.is_some());
        }

        if let Some(payload) = self.payload {
            buffer[offset..][..payload.len()].copy_from_slice(payload);
            offset += payload.len();
        }

        assert_eq!(offset, self.buffer_len(), "frame length mismatch");
    }
}
