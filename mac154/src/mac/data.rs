//! Outgoing frame assembly: addressing resolution, deterministic header
//! sizing, and emission through the security engine.

use mac154_frame::{
    Address, FrameBuilder, FrameRepr, FrameType, FrameVersion, SecurityLevel,
};

use super::security::{CcmStarCipher, NonceKind};
use super::{Error, MacContext, Result};

/// The resolved parameters of an outgoing frame.
///
/// The header length is computed here, before any byte is written;
/// [`MacContext::write_mhr_and_security`] asserts that emission produces
/// exactly this many header octets.
#[derive(Debug, Clone, Copy)]
pub struct FrameParams {
    /// The destination PAN ID.
    pub dst_pan_id: u16,
    /// The destination address.
    pub dst_address: Address,
    /// The source PAN ID.
    pub src_pan_id: u16,
    /// The resolved source address.
    pub src_address: Address,
    /// The security level the frame will be secured with.
    pub security_level: SecurityLevel,
    /// The length of the MAC header, auxiliary security header included.
    pub ll_hdr_len: usize,
    /// The length of the authentication tag appended by the security
    /// engine.
    pub authtag_len: usize,
}

impl MacContext {
    /// Return the device's address in canonical byte order, preferring
    /// the short address.
    pub(crate) fn own_address(&self) -> Result<Address> {
        if self.pib.has_short_address() {
            return Ok(Address::from_short(self.pib.short_address));
        }

        match self.pib.extended_address {
            Some(wire) => {
                let mut canonical = wire;
                canonical.reverse();
                Ok(Address::Extended(canonical))
            }
            None => Err(Error::NotAssociated),
        }
    }

    /// The extended address in canonical order, for nonce construction.
    pub(crate) fn own_extended_address(&self) -> Option<Address> {
        self.pib.extended_address.map(|wire| {
            let mut canonical = wire;
            canonical.reverse();
            Address::Extended(canonical)
        })
    }

    fn mhr_repr(
        &self,
        frame_type: FrameType,
        params: &FrameParams,
        sequence_number: u8,
    ) -> Result<FrameRepr<'static>> {
        let mut builder = match frame_type {
            FrameType::Data => FrameBuilder::new_data(&[]),
            _ => return Err(Error::NotSupported),
        };

        // A broadcast frame must never request an acknowledgment,
        // whatever the interface preference says.
        let ack_request = self.pib.ack_request && params.dst_address.is_unicast();

        builder = builder
            .set_sequence_number(sequence_number)
            .set_ack_request(ack_request)
            .set_dst_pan_id(params.dst_pan_id)
            .set_src_pan_id(params.src_pan_id)
            .set_dst_address(params.dst_address)
            .set_src_address(params.src_address);

        if params.security_level != SecurityLevel::None {
            // Secured frames use the 2015 frame format.
            builder = builder
                .set_frame_version(FrameVersion::Ieee802154_2020)
                .set_security(params.security_level, self.security.frame_counter);
        }

        let mut repr = builder.finalize().map_err(Error::from)?;
        repr.payload = None;
        Ok(repr)
    }

    /// Resolve the addressing and sizing of an outgoing data frame.
    ///
    /// The source addressing mode follows the association state: a short
    /// address when one is assigned, the extended address otherwise, and
    /// `NotAssociated` when the device has neither. A caller-supplied
    /// source address must match the interface's own address exactly. An
    /// absent destination resolves to broadcast.
    pub fn data_frame_params(
        &self,
        dst_address: Address,
        src_address: Option<Address>,
    ) -> Result<FrameParams> {
        let own = self.own_address()?;

        if let Some(requested) = src_address {
            if requested != own {
                return Err(Error::Invalid);
            }
        }

        let dst_address = if dst_address.is_absent() {
            Address::BROADCAST
        } else {
            dst_address
        };

        let security_level = self.security.level;

        let mut params = FrameParams {
            dst_pan_id: self.pib.pan_id,
            dst_address,
            src_pan_id: self.pib.pan_id,
            src_address: own,
            security_level,
            ll_hdr_len: 0,
            authtag_len: security_level.authtag_len(),
        };

        let repr = self.mhr_repr(FrameType::Data, &params, self.pib.sequence_number)?;
        params.ll_hdr_len = repr.header_len();

        Ok(params)
    }

    /// Emit the MAC header into `buffer` and run the outgoing security
    /// procedure over the payload that follows it.
    ///
    /// The caller has placed `payload_len` octets at
    /// `buffer[params.ll_hdr_len..]`. The sequence counter advances
    /// exactly once for every non-acknowledgment frame. Returns the final
    /// frame length, authentication tag included.
    ///
    /// # Panics
    /// Panics if the emitted header does not match `params.ll_hdr_len`;
    /// that would mean the size computation and the emission have
    /// diverged, and every downstream length would be wrong.
    pub fn write_mhr_and_security<C: CcmStarCipher>(
        &mut self,
        cipher: &mut C,
        frame_type: FrameType,
        params: &FrameParams,
        buffer: &mut [u8],
        payload_len: usize,
    ) -> Result<usize> {
        let sequence_number = if frame_type == FrameType::Ack {
            self.pib.sequence_number
        } else {
            self.next_sequence_number()
        };

        let repr = self.mhr_repr(frame_type, params, sequence_number)?;

        assert_eq!(
            repr.header_len(),
            params.ll_hdr_len,
            "MAC header size computation diverged from emission"
        );

        repr.emit(&mut buffer[..repr.buffer_len()]);

        let frame_len = params.ll_hdr_len + payload_len;

        if params.security_level == SecurityLevel::None {
            return Ok(frame_len);
        }

        let (nonce_source, kind) = self.outgoing_nonce()?;

        let secured_len = self.security.secure_outgoing(
            cipher,
            buffer,
            frame_len,
            params.ll_hdr_len,
            &nonce_source,
            kind,
            frame_type == FrameType::Beacon,
        )?;

        Ok(secured_len)
    }

    /// The nonce inputs for an outgoing frame: the ASN construction in
    /// TSCH mode, the frame counter construction otherwise.
    pub(crate) fn outgoing_nonce(&self) -> Result<(Address, NonceKind)> {
        #[cfg(feature = "tsch")]
        if self.tsch.mode.is_on() {
            let source = self
                .own_extended_address()
                .or_else(|| self.own_address().ok())
                .ok_or(Error::NotAssociated)?;
            return Ok((
                source,
                NonceKind::Asn {
                    asn: self.tsch.asn.as_u64(),
                    pan_id: self.pib.pan_id,
                },
            ));
        }

        let source = self.own_extended_address().ok_or(Error::NotSupported)?;
        Ok((
            source,
            NonceKind::FrameCounter {
                counter: self.security.frame_counter,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mac154_frame::Frame;

    fn context() -> MacContext {
        let mut ctx = MacContext::new();
        ctx.pib.pan_id = 0xabcd;
        ctx.pib.short_address = 0x1234;
        ctx.pib.ack_request = true;
        ctx
    }

    #[test]
    fn unicast_header_emission() {
        let mut ctx = context();
        ctx.pib.sequence_number = 0x05;

        let params = ctx
            .data_frame_params(Address::from_short(0xbeef), None)
            .unwrap();
        assert_eq!(params.ll_hdr_len, 9);
        assert_eq!(params.authtag_len, 0);

        let mut buffer = [0u8; 127];
        buffer[params.ll_hdr_len..][..2].copy_from_slice(&[0x68, 0x69]);

        let len = ctx
            .write_mhr_and_security(
                &mut NullCipher,
                FrameType::Data,
                &params,
                &mut buffer,
                2,
            )
            .unwrap();

        assert_eq!(len, 11);
        assert_eq!(
            &buffer[..len],
            &[0x61, 0x88, 0x05, 0xcd, 0xab, 0xef, 0xbe, 0x34, 0x12, 0x68, 0x69]
        );

        // The sequence number advanced exactly once.
        assert_eq!(ctx.pib.sequence_number, 0x06);
    }

    #[test]
    fn broadcast_forces_ack_request_off() {
        let mut ctx = context();

        let params = ctx.data_frame_params(Address::Absent, None).unwrap();
        assert!(params.dst_address.is_broadcast());

        let mut buffer = [0u8; 127];
        buffer[params.ll_hdr_len] = 0x01;

        let len = ctx
            .write_mhr_and_security(
                &mut NullCipher,
                FrameType::Data,
                &params,
                &mut buffer,
                1,
            )
            .unwrap();

        let frame = Frame::new(&buffer[..len]).unwrap();
        assert!(!frame.frame_control().ack_request());
    }

    #[test]
    fn source_resolution_follows_association() {
        let mut ctx = MacContext::new();

        // Neither address: not associated.
        assert_eq!(
            ctx.data_frame_params(Address::BROADCAST, None).unwrap_err(),
            Error::NotAssociated
        );

        // Extended only.
        ctx.pib.extended_address =
            Some([0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
        ctx.pib.pan_id = 0xabcd;
        let params = ctx.data_frame_params(Address::BROADCAST, None).unwrap();
        assert!(params.src_address.is_extended());

        // A short address takes precedence.
        ctx.pib.short_address = 0x1234;
        let params = ctx.data_frame_params(Address::BROADCAST, None).unwrap();
        assert_eq!(params.src_address, Address::from_short(0x1234));
    }

    #[test]
    fn mismatched_source_is_rejected() {
        let ctx = context();
        assert_eq!(
            ctx.data_frame_params(
                Address::BROADCAST,
                Some(Address::from_short(0x9999))
            )
            .unwrap_err(),
            Error::Invalid
        );
    }

    #[test]
    fn secured_params_account_for_the_tag() {
        let mut ctx = context();
        ctx.security.level = mac154_frame::SecurityLevel::EncMic32;

        let params = ctx
            .data_frame_params(Address::from_short(0xbeef), None)
            .unwrap();
        // Header grows by the auxiliary security header.
        assert_eq!(params.ll_hdr_len, 9 + 5);
        assert_eq!(params.authtag_len, 4);
    }

    /// A cipher for paths that must not reach it.
    struct NullCipher;

    impl CcmStarCipher for NullCipher {
        fn encrypt(
            &mut self,
            _key: &[u8; 16],
            _nonce: &[u8; super::super::security::NONCE_LEN],
            _aad: &[u8],
            _payload: &mut [u8],
            _tag: &mut [u8],
        ) -> Result<()> {
            panic!("unexpected cipher invocation");
        }

        fn decrypt(
            &mut self,
            _key: &[u8; 16],
            _nonce: &[u8; super::super::security::NONCE_LEN],
            _aad: &[u8],
            _payload: &mut [u8],
            _tag: &[u8],
        ) -> Result<()> {
            panic!("unexpected cipher invocation");
        }
    }
}
