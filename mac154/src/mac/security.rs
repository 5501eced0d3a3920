//! The CCM* frame protection engine.
//!
//! Key management is out of scope: the interface holds exactly one
//! 16-byte key with an implicit key identifier, per the security
//! sub-context of the link-layer context. What lives here is the hard
//! part the codec feeds into: per-frame nonce construction, the outgoing
//! and incoming transformation of the frame in place, and the frame
//! counter discipline.
//!
//! Two nonce constructions exist (IEEE 802.15.4-2020 §9.3.3):
//!
//! - outside TSCH, the nonce is the extended source address, the 32-bit
//!   frame counter and the security level;
//! - in TSCH, the nonce is the (extended, or CID-expanded short) source
//!   address followed by the 40-bit ASN, and carries no level byte. TSCH
//!   enhanced beacons are additionally never encrypted; an encrypting
//!   level is downgraded to its MIC-only counterpart for those frames.
//!
//! The AES primitive itself is a collaborator behind [`CcmStarCipher`].

use mac154_frame::{Address, SecurityLevel};

use super::constants::{MAC_ASN_MAX, MAC_FRAME_COUNTER_LIMIT};
use super::{Error, Result};

/// The length of a CCM* nonce.
pub const NONCE_LEN: usize = 13;

/// The IEEE Company ID used to expand short addresses into TSCH nonces.
const IEEE_CID: [u8; 3] = [0xba, 0x55, 0xec];

/// The security sub-context of an interface.
pub struct SecurityContext {
    /// The security level applied to outgoing frames and required of
    /// incoming ones.
    pub level: SecurityLevel,
    /// The single, implicitly identified key.
    pub key: [u8; 16],
    /// The outgoing frame counter. Monotonic; the engine refuses to send
    /// once it reaches [`MAC_FRAME_COUNTER_LIMIT`].
    pub frame_counter: u32,
}

impl Default for SecurityContext {
    fn default() -> Self {
        Self {
            level: SecurityLevel::None,
            key: [0u8; 16],
            frame_counter: 0,
        }
    }
}

/// The nonce input of a frame: either the frame counter construction or
/// the TSCH ASN construction.
#[derive(Debug, Clone, Copy)]
pub enum NonceKind {
    /// §9.3.3.1: frame counter based, extended source addresses only.
    FrameCounter {
        /// The frame counter carried in the auxiliary security header.
        counter: u32,
    },
    /// §9.3.3.2: ASN based, as used in TSCH mode.
    Asn {
        /// The 40-bit absolute slot number of the slot the frame
        /// occupies.
        asn: u64,
        /// The PAN ID, used when the source address is short.
        pan_id: u16,
    },
}

/// Build the 13-byte CCM* nonce for a frame.
///
/// `source` is the source address of the frame: the interface's own
/// address for outgoing frames, the peer's for incoming ones. The frame
/// counter construction accepts only extended addresses; short-source
/// support outside TSCH is not implemented.
pub fn build_nonce(
    source: &Address,
    kind: NonceKind,
    level: SecurityLevel,
) -> Result<[u8; NONCE_LEN]> {
    let mut nonce = [0u8; NONCE_LEN];

    match kind {
        NonceKind::FrameCounter { counter } => {
            let Address::Extended(addr) = source else {
                return Err(Error::NotSupported);
            };

            // The address goes in as it appears on the wire.
            let mut wire = *addr;
            wire.reverse();
            nonce[..8].copy_from_slice(&wire);
            nonce[8..12].copy_from_slice(&counter.to_be_bytes());
            nonce[12] = level.bits();
        }
        NonceKind::Asn { asn, pan_id } => {
            match source {
                Address::Extended(addr) => {
                    let mut wire = *addr;
                    wire.reverse();
                    nonce[..8].copy_from_slice(&wire);
                }
                Address::Short(short) => {
                    nonce[..3].copy_from_slice(&IEEE_CID);
                    nonce[3] = 0;
                    nonce[4..6].copy_from_slice(&pan_id.to_be_bytes());
                    nonce[6..8].copy_from_slice(short);
                }
                Address::Absent => return Err(Error::Security),
            }

            // The trailer is the 40-bit ASN, big-endian, with no level
            // byte.
            let asn = asn & MAC_ASN_MAX;
            nonce[8] = (asn >> 32) as u8;
            nonce[9] = (asn >> 24) as u8;
            nonce[10] = (asn >> 16) as u8;
            nonce[11] = (asn >> 8) as u8;
            nonce[12] = asn as u8;
        }
    }

    Ok(nonce)
}

/// The AES-128-CCM* primitive the engine delegates to.
///
/// `payload` is transformed in place; `tag.len()` selects the CCM* M
/// parameter (4, 8 or 16). A MIC-only level passes the entire frame as
/// `aad` with an empty `payload`.
pub trait CcmStarCipher {
    /// Encrypt and authenticate.
    fn encrypt(
        &mut self,
        key: &[u8; 16],
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        payload: &mut [u8],
        tag: &mut [u8],
    ) -> Result<()>;

    /// Decrypt and verify.
    fn decrypt(
        &mut self,
        key: &[u8; 16],
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        payload: &mut [u8],
        tag: &[u8],
    ) -> Result<()>;
}

impl SecurityContext {
    /// Apply the outgoing security procedure to a frame in place
    /// (§9.2.2, the implemented subset).
    ///
    /// Calling this *is* the explicit request to secure the frame: an
    /// unsecured interface never reaches the engine (its frames go out in
    /// the clear), so a level of 0 here is a configuration error and is
    /// refused. Level 4 is unrepresentable and refused by the codec.
    ///
    /// `buffer[..ll_hdr_len]` is the emitted MAC header with the
    /// auxiliary security header and the security-enabled bit already in
    /// place; `buffer[ll_hdr_len..frame_len]` is the payload. On success
    /// the authentication tag has been appended, the frame counter has
    /// advanced, and the secured frame length is returned.
    ///
    /// `is_beacon` downgrades an encrypting level to MIC-only: TSCH
    /// enhanced beacons must stay readable to joining nodes.
    pub fn secure_outgoing<C: CcmStarCipher>(
        &mut self,
        cipher: &mut C,
        buffer: &mut [u8],
        frame_len: usize,
        ll_hdr_len: usize,
        source: &Address,
        kind: NonceKind,
        is_beacon: bool,
    ) -> Result<usize> {
        if self.level == SecurityLevel::None {
            debug!("security: level 0 cannot secure a frame");
            return Err(Error::Security);
        }

        let mut level = self.level;
        if is_beacon {
            level = level.without_encryption();
        }

        let tag_len = level.authtag_len();

        if self.frame_counter >= MAC_FRAME_COUNTER_LIMIT {
            debug!("security: frame counter exhausted");
            return Err(Error::Security);
        }

        if buffer.len() < frame_len + tag_len || frame_len < ll_hdr_len {
            debug!("security: frame does not fit its authentication tag");
            return Err(Error::NoMemory);
        }

        let nonce = build_nonce(source, kind, level)?;

        if level.is_encrypted() {
            let (header, rest) = buffer.split_at_mut(ll_hdr_len);
            let payload_len = frame_len - ll_hdr_len;
            let (payload, tail) = rest.split_at_mut(payload_len);
            cipher.encrypt(&self.key, &nonce, header, payload, &mut tail[..tag_len])?;
        } else {
            let (frame, tail) = buffer.split_at_mut(frame_len);
            let mut empty = [0u8; 0];
            cipher.encrypt(&self.key, &nonce, frame, &mut empty, &mut tail[..tag_len])?;
        }

        self.frame_counter += 1;
        Ok(frame_len + tag_len)
    }

    /// Apply the incoming security procedure to a frame in place
    /// (§9.2.4/§9.2.5, the implemented subset).
    ///
    /// `frame_level` and the nonce inputs come from the parsed frame; the
    /// caller has already checked that security is enabled and that the
    /// frame version is 2015 or later. On success the payload has been
    /// decrypted in place and the unsecured frame length (the tag
    /// stripped) is returned. Any failure means the frame is dropped.
    pub fn unsecure_incoming<C: CcmStarCipher>(
        &self,
        cipher: &mut C,
        buffer: &mut [u8],
        frame_len: usize,
        ll_hdr_len: usize,
        frame_level: SecurityLevel,
        source: &Address,
        kind: NonceKind,
    ) -> Result<usize> {
        if self.level == SecurityLevel::None {
            debug!("security: secured frame on an unsecured interface");
            return Err(Error::Security);
        }

        if frame_level != self.level {
            debug!("security: level mismatch");
            return Err(Error::Security);
        }

        let tag_len = frame_level.authtag_len();
        if frame_len < ll_hdr_len + tag_len {
            debug!("security: frame shorter than its authentication tag");
            return Err(Error::Security);
        }

        let nonce = build_nonce(source, kind, frame_level)?;

        let unsecured_len = frame_len - tag_len;

        if frame_level.is_encrypted() {
            let (header, rest) = buffer.split_at_mut(ll_hdr_len);
            let payload_len = unsecured_len - ll_hdr_len;
            let (payload, tail) = rest.split_at_mut(payload_len);
            cipher
                .decrypt(&self.key, &nonce, header, payload, &tail[..tag_len])
                .map_err(|_| {
                    debug!("security: authentication failed");
                    Error::Security
                })?;
        } else {
            let (frame, tail) = buffer.split_at_mut(unsecured_len);
            let mut empty = [0u8; 0];
            cipher
                .decrypt(&self.key, &nonce, frame, &mut empty, &tail[..tag_len])
                .map_err(|_| {
                    debug!("security: authentication failed");
                    Error::Security
                })?;
        }

        Ok(unsecured_len)
    }
}

/// AES-128-CCM* backed by the RustCrypto `aes` and `ccm` crates.
#[cfg(feature = "security")]
pub use aes_ccm_star::Aes128CcmStar;

#[cfg(feature = "security")]
mod aes_ccm_star {
    use super::{CcmStarCipher, Error, Result, NONCE_LEN};

    use aes::Aes128;
    use ccm::aead::generic_array::GenericArray;
    use ccm::aead::{AeadInPlace, KeyInit};
    use ccm::consts::{U13, U16, U4, U8};
    use ccm::Ccm;

    type Ccm32 = Ccm<Aes128, U4, U13>;
    type Ccm64 = Ccm<Aes128, U8, U13>;
    type Ccm128 = Ccm<Aes128, U16, U13>;

    /// The default [`CcmStarCipher`] implementation.
    #[derive(Default)]
    pub struct Aes128CcmStar;

    impl CcmStarCipher for Aes128CcmStar {
        fn encrypt(
            &mut self,
            key: &[u8; 16],
            nonce: &[u8; NONCE_LEN],
            aad: &[u8],
            payload: &mut [u8],
            tag: &mut [u8],
        ) -> Result<()> {
            let nonce = GenericArray::from_slice(nonce);

            match tag.len() {
                4 => {
                    let cipher = Ccm32::new(GenericArray::from_slice(key));
                    let t = cipher
                        .encrypt_in_place_detached(nonce, aad, payload)
                        .map_err(|_| Error::Security)?;
                    tag.copy_from_slice(&t);
                }
                8 => {
                    let cipher = Ccm64::new(GenericArray::from_slice(key));
                    let t = cipher
                        .encrypt_in_place_detached(nonce, aad, payload)
                        .map_err(|_| Error::Security)?;
                    tag.copy_from_slice(&t);
                }
                16 => {
                    let cipher = Ccm128::new(GenericArray::from_slice(key));
                    let t = cipher
                        .encrypt_in_place_detached(nonce, aad, payload)
                        .map_err(|_| Error::Security)?;
                    tag.copy_from_slice(&t);
                }
                _ => return Err(Error::NotSupported),
            }

            Ok(())
        }

        fn decrypt(
            &mut self,
            key: &[u8; 16],
            nonce: &[u8; NONCE_LEN],
            aad: &[u8],
            payload: &mut [u8],
            tag: &[u8],
        ) -> Result<()> {
            let nonce = GenericArray::from_slice(nonce);

            match tag.len() {
                4 => {
                    let cipher = Ccm32::new(GenericArray::from_slice(key));
                    cipher
                        .decrypt_in_place_detached(
                            nonce,
                            aad,
                            payload,
                            GenericArray::from_slice(tag),
                        )
                        .map_err(|_| Error::Security)
                }
                8 => {
                    let cipher = Ccm64::new(GenericArray::from_slice(key));
                    cipher
                        .decrypt_in_place_detached(
                            nonce,
                            aad,
                            payload,
                            GenericArray::from_slice(tag),
                        )
                        .map_err(|_| Error::Security)
                }
                16 => {
                    let cipher = Ccm128::new(GenericArray::from_slice(key));
                    cipher
                        .decrypt_in_place_detached(
                            nonce,
                            aad,
                            payload,
                            GenericArray::from_slice(tag),
                        )
                        .map_err(|_| Error::Security)
                }
                _ => Err(Error::NotSupported),
            }
        }
    }
}

#[cfg(all(test, feature = "security"))]
mod tests {
    use super::*;

    fn extended_source() -> Address {
        // Canonical order; 00..07 on the wire.
        Address::Extended([0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01, 0x00])
    }

    #[test]
    fn frame_counter_nonce_layout() {
        let nonce = build_nonce(
            &extended_source(),
            NonceKind::FrameCounter { counter: 1 },
            SecurityLevel::EncMic32,
        )
        .unwrap();

        assert_eq!(&nonce[..8], &[0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);
        assert_eq!(&nonce[8..12], &[0x00, 0x00, 0x00, 0x01]);
        assert_eq!(nonce[12], 0x05);
    }

    #[test]
    fn frame_counter_nonce_rejects_short_source() {
        assert_eq!(
            build_nonce(
                &Address::from_short(0x1234),
                NonceKind::FrameCounter { counter: 1 },
                SecurityLevel::EncMic32,
            )
            .unwrap_err(),
            Error::NotSupported
        );
    }

    #[test]
    fn tsch_nonce_layout_short_source() {
        let nonce = build_nonce(
            &Address::from_short(0x1234),
            NonceKind::Asn {
                asn: 0xab_1234_5678,
                pan_id: 0xabcd,
            },
            SecurityLevel::Mic32,
        )
        .unwrap();

        assert_eq!(&nonce[..3], &[0xba, 0x55, 0xec]);
        assert_eq!(nonce[3], 0x00);
        assert_eq!(&nonce[4..6], &[0xab, 0xcd]);
        assert_eq!(&nonce[6..8], &[0x12, 0x34]);
        assert_eq!(&nonce[8..], &[0xab, 0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn nonce_is_strictly_increasing_in_counter() {
        let source = extended_source();
        let mut previous = build_nonce(
            &source,
            NonceKind::FrameCounter { counter: 0 },
            SecurityLevel::EncMic32,
        )
        .unwrap();

        for counter in 1..100u32 {
            let nonce = build_nonce(
                &source,
                NonceKind::FrameCounter { counter },
                SecurityLevel::EncMic32,
            )
            .unwrap();
            assert!(nonce > previous);
            previous = nonce;
        }
    }

    #[test]
    fn nonce_is_strictly_increasing_in_asn() {
        let source = Address::from_short(0x1234);
        let mut previous = None;

        for asn in [0u64, 1, 2, 0x100, 0x10000, 0xff_ffff_ffff] {
            let nonce = build_nonce(
                &source,
                NonceKind::Asn { asn, pan_id: 0xabcd },
                SecurityLevel::Mic32,
            )
            .unwrap();
            if let Some(previous) = previous {
                assert!(nonce > previous);
            }
            previous = Some(nonce);
        }
    }

    fn secured_frame(payload: &[u8]) -> ([u8; 127], usize, usize) {
        // A plausible header: the exact bytes only matter as AAD.
        let header = [
            0x69u8, 0x88, 0x05, 0xcd, 0xab, 0xef, 0xbe, 0x34, 0x12, 0x05, 0x01, 0x00, 0x00, 0x00,
        ];

        let mut buffer = [0u8; 127];
        buffer[..header.len()].copy_from_slice(&header);
        buffer[header.len()..][..payload.len()].copy_from_slice(payload);

        let frame_len = header.len() + payload.len();
        (buffer, frame_len, header.len())
    }

    #[test]
    fn encrypt_then_decrypt_roundtrip() {
        let mut cipher = Aes128CcmStar;
        let mut context = SecurityContext {
            level: SecurityLevel::EncMic32,
            key: [0u8; 16],
            frame_counter: 1,
        };
        let source = extended_source();

        let payload = [0x68, 0x69];
        let (mut buffer, frame_len, ll_hdr_len) = secured_frame(&payload);

        let secured_len = context
            .secure_outgoing(
                &mut cipher,
                &mut buffer,
                frame_len,
                ll_hdr_len,
                &source,
                NonceKind::FrameCounter { counter: 1 },
                false,
            )
            .unwrap();

        assert_eq!(secured_len, frame_len + 4);
        // The plaintext was replaced by ciphertext.
        assert_ne!(&buffer[ll_hdr_len..frame_len], &payload);
        // The sender's frame counter advanced.
        assert_eq!(context.frame_counter, 2);

        let unsecured_len = context
            .unsecure_incoming(
                &mut cipher,
                &mut buffer,
                secured_len,
                ll_hdr_len,
                SecurityLevel::EncMic32,
                &source,
                NonceKind::FrameCounter { counter: 1 },
            )
            .unwrap();

        assert_eq!(unsecured_len, frame_len);
        assert_eq!(&buffer[ll_hdr_len..frame_len], &payload);
    }

    #[test]
    fn roundtrip_at_every_level() {
        for level in [
            SecurityLevel::Mic32,
            SecurityLevel::Mic64,
            SecurityLevel::Mic128,
            SecurityLevel::EncMic32,
            SecurityLevel::EncMic64,
            SecurityLevel::EncMic128,
        ] {
            let mut cipher = Aes128CcmStar;
            let mut context = SecurityContext {
                level,
                key: [0x42u8; 16],
                frame_counter: 10,
            };
            let source = extended_source();
            let payload = [0xde, 0xad, 0xbe, 0xef];

            let (mut buffer, frame_len, ll_hdr_len) = secured_frame(&payload);

            let secured_len = context
                .secure_outgoing(
                    &mut cipher,
                    &mut buffer,
                    frame_len,
                    ll_hdr_len,
                    &source,
                    NonceKind::FrameCounter { counter: 10 },
                    false,
                )
                .unwrap();
            assert_eq!(secured_len, frame_len + level.authtag_len());

            let unsecured_len = context
                .unsecure_incoming(
                    &mut cipher,
                    &mut buffer,
                    secured_len,
                    ll_hdr_len,
                    level,
                    &source,
                    NonceKind::FrameCounter { counter: 10 },
                )
                .unwrap();
            assert_eq!(unsecured_len, frame_len);
            assert_eq!(&buffer[ll_hdr_len..frame_len], &payload);
        }
    }

    #[test]
    fn bit_flips_fail_authentication() {
        let mut cipher = Aes128CcmStar;
        let mut context = SecurityContext {
            level: SecurityLevel::EncMic32,
            key: [0u8; 16],
            frame_counter: 1,
        };
        let source = extended_source();
        let payload = [0x68, 0x69];

        let (reference, frame_len, ll_hdr_len) = {
            let (mut buffer, frame_len, ll_hdr_len) = secured_frame(&payload);
            context
                .secure_outgoing(
                    &mut cipher,
                    &mut buffer,
                    frame_len,
                    ll_hdr_len,
                    &source,
                    NonceKind::FrameCounter { counter: 1 },
                    false,
                )
                .unwrap();
            (buffer, frame_len, ll_hdr_len)
        };
        let secured_len = frame_len + 4;

        // A flip anywhere in the header (AAD), ciphertext or tag must be
        // caught.
        for flip_at in [0usize, 5, ll_hdr_len, frame_len, secured_len - 1] {
            let mut buffer = reference;
            buffer[flip_at] ^= 0x01;

            assert_eq!(
                context
                    .unsecure_incoming(
                        &mut cipher,
                        &mut buffer,
                        secured_len,
                        ll_hdr_len,
                        SecurityLevel::EncMic32,
                        &source,
                        NonceKind::FrameCounter { counter: 1 },
                    )
                    .unwrap_err(),
                Error::Security
            );
        }

        // A wrong nonce input fails as well.
        let mut buffer = reference;
        assert!(context
            .unsecure_incoming(
                &mut cipher,
                &mut buffer,
                secured_len,
                ll_hdr_len,
                SecurityLevel::EncMic32,
                &source,
                NonceKind::FrameCounter { counter: 2 },
            )
            .is_err());
    }

    #[test]
    fn level_mismatch_is_rejected() {
        let mut cipher = Aes128CcmStar;
        let context = SecurityContext {
            level: SecurityLevel::EncMic32,
            key: [0u8; 16],
            frame_counter: 1,
        };
        let mut buffer = [0u8; 64];

        assert_eq!(
            context
                .unsecure_incoming(
                    &mut cipher,
                    &mut buffer,
                    32,
                    10,
                    SecurityLevel::EncMic64,
                    &extended_source(),
                    NonceKind::FrameCounter { counter: 1 },
                )
                .unwrap_err(),
            Error::Security
        );
    }

    #[test]
    fn level_zero_cannot_secure_a_frame() {
        let mut cipher = Aes128CcmStar;
        let mut context = SecurityContext::default();
        let source = extended_source();

        let (mut buffer, frame_len, ll_hdr_len) = secured_frame(&[0x68, 0x69]);

        assert_eq!(
            context
                .secure_outgoing(
                    &mut cipher,
                    &mut buffer,
                    frame_len,
                    ll_hdr_len,
                    &source,
                    NonceKind::FrameCounter { counter: 0 },
                    false,
                )
                .unwrap_err(),
            Error::Security
        );

        // Nothing was written and the counter did not advance.
        assert_eq!(&buffer[ll_hdr_len..frame_len], &[0x68, 0x69]);
        assert_eq!(context.frame_counter, 0);
    }

    #[test]
    fn exhausted_frame_counter_is_refused() {
        let mut cipher = Aes128CcmStar;
        let mut context = SecurityContext {
            level: SecurityLevel::EncMic32,
            key: [0u8; 16],
            frame_counter: MAC_FRAME_COUNTER_LIMIT,
        };
        let source = extended_source();

        let (mut buffer, frame_len, ll_hdr_len) = secured_frame(&[0x00]);

        assert_eq!(
            context
                .secure_outgoing(
                    &mut cipher,
                    &mut buffer,
                    frame_len,
                    ll_hdr_len,
                    &source,
                    NonceKind::FrameCounter {
                        counter: MAC_FRAME_COUNTER_LIMIT
                    },
                    false,
                )
                .unwrap_err(),
            Error::Security
        );
    }

    #[test]
    fn beacon_downgrades_to_mic_only() {
        let mut cipher = Aes128CcmStar;
        let mut context = SecurityContext {
            level: SecurityLevel::EncMic32,
            key: [0u8; 16],
            frame_counter: 1,
        };
        let source = extended_source();
        let payload = [0x68, 0x69];

        let (mut buffer, frame_len, ll_hdr_len) = secured_frame(&payload);

        context
            .secure_outgoing(
                &mut cipher,
                &mut buffer,
                frame_len,
                ll_hdr_len,
                &source,
                NonceKind::Asn {
                    asn: 7,
                    pan_id: 0xabcd,
                },
                true,
            )
            .unwrap();

        // The payload stayed in the clear.
        assert_eq!(&buffer[ll_hdr_len..frame_len], &payload);
    }
}
