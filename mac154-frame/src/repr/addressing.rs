use super::super::{Address, AddressPresence, AddressingFields, FrameControlRepr};
use super::super::{Error, Result};

/// A high-level representation of the IEEE 802.15.4 addressing fields.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AddressingFieldsRepr {
    /// The destination PAN ID, if carried by the frame.
    pub dst_pan_id: Option<u16>,
    /// The source PAN ID, if carried by the frame.
    pub src_pan_id: Option<u16>,
    /// The destination address, if carried by the frame.
    pub dst_address: Option<Address>,
    /// The source address, if carried by the frame.
    pub src_address: Option<Address>,
}

impl AddressingFieldsRepr {
    /// Parse the addressing fields of a frame.
    pub fn parse(af: AddressingFields<&[u8], &[u8]>) -> Self {
        Self {
            dst_pan_id: af.dst_pan_id(),
            src_pan_id: af.src_pan_id(),
            dst_address: af.dst_address(),
            src_address: af.src_address(),
        }
    }

    fn presence(&self, fc: &FrameControlRepr) -> Result<AddressPresence> {
        AddressPresence::derive(
            fc.frame_version,
            fc.dst_addressing_mode,
            fc.src_addressing_mode,
            fc.pan_id_compression,
        )
        .ok_or(Error::BadFormat)
    }

    /// Validate the representation against a Frame Control representation:
    /// the addressing modes must describe a valid combination, and every
    /// field the combination requires must be present.
    pub fn validate(&self, fc: &FrameControlRepr) -> Result<()> {
        let presence = self.presence(fc)?;

        if presence.dst_pan_id && self.dst_pan_id.is_none() {
            return Err(Error::BadFormat);
        }

        if presence.src_pan_id && self.src_pan_id.is_none() {
            return Err(Error::BadFormat);
        }

        match (self.dst_address, presence.dst_addr.size()) {
            (Some(addr), size) if addr.len() == size => {}
            (None, 0) => {}
            _ => return Err(Error::BadFormat),
        }

        match (self.src_address, presence.src_addr.size()) {
            (Some(addr), size) if addr.len() == size => {}
            (None, 0) => {}
            _ => return Err(Error::BadFormat),
        }

        Ok(())
    }

    /// Return the length of the addressing fields when emitted with the
    /// given Frame Control.
    pub fn buffer_len(&self, fc: &FrameControlRepr) -> usize {
        self.presence(fc).map(|p| p.len()).unwrap_or(0)
    }

    /// Emit the addressing fields into a buffer, returning the number of
    /// octets written.
    ///
    /// # Panics
    /// Panics if a field required by the Frame Control combination is
    /// missing; [`validate`] catches this beforehand.
    ///
    /// [`validate`]: Self::validate
    pub fn emit(&self, buffer: &mut [u8], fc: &FrameControlRepr) -> usize {
        let presence = self
            .presence(fc)
            .expect("invalid addressing combination");

        let mut offset = 0;

        if presence.dst_pan_id {
            let id = self.dst_pan_id.expect("destination PAN ID required");
            buffer[offset..][..2].copy_from_slice(&id.to_le_bytes());
            offset += 2;
        }

        if let Some(addr) = self.dst_address {
            let b = &mut buffer[offset..][..addr.len()];
            b.copy_from_slice(addr.as_bytes());
            b.reverse();
            offset += addr.len();
        }

        if presence.src_pan_id {
            let id = self.src_pan_id.expect("source PAN ID required");
            buffer[offset..][..2].copy_from_slice(&id.to_le_bytes());
            offset += 2;
        }

        if let Some(addr) = self.src_address {
            let b = &mut buffer[offset..][..addr.len()];
            b.copy_from_slice(addr.as_bytes());
            b.reverse();
            offset += addr.len();
        }

        offset
    }
}
