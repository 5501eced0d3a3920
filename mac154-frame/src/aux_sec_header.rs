//! Auxiliary Security Header readers and writers.
//!
//! Layout per IEEE 802.15.4-2020 §9.4:
//!
//! ```notrust
//! +------------------+---------------+--------------------+
//! | Security Control | Frame Counter | Key Identifier     |
//! +------------------+---------------+--------------------+
//! 0                  1               5   (0, 1, 5 or 9 B)
//! ```
//!
//! Only the implicit key identifier mode is supported; parsing any other
//! mode fails with [`Error::NotSupported`].

use super::{Error, Result};

/// IEEE 802.15.4 security level, the low three bits of the Security Control
/// field.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Default)]
pub enum SecurityLevel {
    /// No security.
    #[default]
    None = 0b000,
    /// Authentication with a 32-bit MIC.
    Mic32 = 0b001,
    /// Authentication with a 64-bit MIC.
    Mic64 = 0b010,
    /// Authentication with a 128-bit MIC.
    Mic128 = 0b011,
    /// Encryption and authentication with a 32-bit MIC.
    EncMic32 = 0b101,
    /// Encryption and authentication with a 64-bit MIC.
    EncMic64 = 0b110,
    /// Encryption and authentication with a 128-bit MIC.
    EncMic128 = 0b111,
}

impl SecurityLevel {
    /// Decode a 3-bit security level. Level 4 is reserved.
    pub fn from_bits(value: u8) -> Result<Self> {
        match value & 0b111 {
            0b000 => Ok(Self::None),
            0b001 => Ok(Self::Mic32),
            0b010 => Ok(Self::Mic64),
            0b011 => Ok(Self::Mic128),
            0b101 => Ok(Self::EncMic32),
            0b110 => Ok(Self::EncMic64),
            0b111 => Ok(Self::EncMic128),
            _ => Err(Error::Reserved),
        }
    }

    /// Return the raw 3-bit value.
    pub const fn bits(&self) -> u8 {
        *self as u8
    }

    /// Return the length of the authentication tag in octets.
    pub const fn authtag_len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Mic32 | Self::EncMic32 => 4,
            Self::Mic64 | Self::EncMic64 => 8,
            Self::Mic128 | Self::EncMic128 => 16,
        }
    }

    /// Returns `true` when the level provides confidentiality.
    pub const fn is_encrypted(&self) -> bool {
        matches!(self, Self::EncMic32 | Self::EncMic64 | Self::EncMic128)
    }

    /// Return the authentication-only level with the same tag length.
    ///
    /// TSCH enhanced beacons must not be encrypted, so the outgoing
    /// procedure downgrades encrypting levels through this.
    pub const fn without_encryption(&self) -> Self {
        match self {
            Self::EncMic32 => Self::Mic32,
            Self::EncMic64 => Self::Mic64,
            Self::EncMic128 => Self::Mic128,
            level => *level,
        }
    }
}

/// IEEE 802.15.4 key identifier mode, bits 3-4 of the Security Control
/// field.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Default)]
pub enum KeyIdentifierMode {
    /// The key is determined implicitly from the frame addressing.
    #[default]
    Implicit = 0b00,
    /// The key is determined from a 1-byte key index.
    Index = 0b01,
    /// The key is determined from a 4-byte key source and a key index.
    Source4 = 0b10,
    /// The key is determined from an 8-byte key source and a key index.
    Source8 = 0b11,
}

impl KeyIdentifierMode {
    fn from_bits(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Self::Implicit,
            0b01 => Self::Index,
            0b10 => Self::Source4,
            _ => Self::Source8,
        }
    }

    /// Return the length of the Key Identifier field in octets.
    pub const fn key_identifier_len(&self) -> usize {
        match self {
            Self::Implicit => 0,
            Self::Index => 1,
            Self::Source4 => 5,
            Self::Source8 => 9,
        }
    }
}

/// A decoded Security Control field.
#[derive(Debug, Clone, Copy)]
pub struct SecurityControl(u8);

impl SecurityControl {
    /// Create a [`SecurityControl`] from the raw field value.
    pub const fn from_byte(value: u8) -> Self {
        Self(value)
    }

    /// Return the raw field value.
    pub const fn as_byte(&self) -> u8 {
        self.0
    }

    /// Return the security level field.
    pub fn security_level(&self) -> Result<SecurityLevel> {
        SecurityLevel::from_bits(self.0 & 0b111)
    }

    /// Return the key identifier mode field.
    pub fn key_identifier_mode(&self) -> KeyIdentifierMode {
        KeyIdentifierMode::from_bits((self.0 >> 3) & 0b11)
    }

    /// Returns `true` when the frame counter is suppressed.
    pub fn frame_counter_suppression(&self) -> bool {
        (self.0 >> 5) & 0b1 == 0b1
    }

    /// Returns `true` when the ASN is used in the nonce.
    pub fn asn_in_nonce(&self) -> bool {
        (self.0 >> 6) & 0b1 == 0b1
    }
}

/// A reader/writer for the IEEE 802.15.4 Auxiliary Security Header.
#[derive(Debug)]
pub struct AuxiliarySecurityHeader<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> AuxiliarySecurityHeader<T> {
    /// Create a new [`AuxiliarySecurityHeader`] reader/writer from a given
    /// buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is too short for the fields its
    /// Security Control selects.
    pub fn new(buffer: T) -> Result<Self> {
        let aux = Self::new_unchecked(buffer);

        if aux.buffer.as_ref().is_empty() {
            return Err(Error::WrongLength);
        }

        if aux.buffer.as_ref().len() < aux.len() {
            return Err(Error::WrongLength);
        }

        Ok(aux)
    }

    /// Create a new [`AuxiliarySecurityHeader`] reader/writer from a given
    /// buffer without length checking.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    /// Return the length of the Auxiliary Security Header in octets.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        let control = self.security_control();
        1 + if control.frame_counter_suppression() {
            0
        } else {
            4
        } + control.key_identifier_mode().key_identifier_len()
    }

    /// Return the decoded Security Control field.
    pub fn security_control(&self) -> SecurityControl {
        SecurityControl::from_byte(self.buffer.as_ref()[0])
    }

    /// Return the frame counter field, unless suppressed.
    pub fn frame_counter(&self) -> Option<u32> {
        if self.security_control().frame_counter_suppression() {
            return None;
        }

        let b = &self.buffer.as_ref()[1..][..4];
        Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Return the raw Key Identifier field.
    pub fn key_identifier(&self) -> &[u8] {
        let control = self.security_control();
        let offset = 1 + if control.frame_counter_suppression() {
            0
        } else {
            4
        };
        &self.buffer.as_ref()[offset..][..control.key_identifier_mode().key_identifier_len()]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> AuxiliarySecurityHeader<T> {
    /// Set the Security Control field.
    pub fn set_security_control(&mut self, control: SecurityControl) {
        self.buffer.as_mut()[0] = control.as_byte();
    }

    /// Set the frame counter field.
    pub fn set_frame_counter(&mut self, counter: u32) {
        self.buffer.as_mut()[1..][..4].copy_from_slice(&counter.to_le_bytes());
    }
}

impl<T: AsRef<[u8]>> core::fmt::Display for AuxiliarySecurityHeader<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let control = self.security_control();
        writeln!(f, "Auxiliary Security Header")?;
        match control.security_level() {
            Ok(level) => writeln!(f, "  security level: {level:?}")?,
            Err(_) => writeln!(f, "  security level: reserved")?,
        }
        writeln!(
            f,
            "  key identifier mode: {:?}",
            control.key_identifier_mode()
        )?;
        if let Some(counter) = self.frame_counter() {
            writeln!(f, "  frame counter: {counter}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_levels() {
        assert_eq!(SecurityLevel::from_bits(0).unwrap(), SecurityLevel::None);
        assert_eq!(SecurityLevel::from_bits(5).unwrap(), SecurityLevel::EncMic32);
        assert_eq!(SecurityLevel::from_bits(4).unwrap_err(), Error::Reserved);

        assert_eq!(SecurityLevel::None.authtag_len(), 0);
        assert_eq!(SecurityLevel::Mic32.authtag_len(), 4);
        assert_eq!(SecurityLevel::Mic64.authtag_len(), 8);
        assert_eq!(SecurityLevel::Mic128.authtag_len(), 16);
        assert_eq!(SecurityLevel::EncMic32.authtag_len(), 4);
        assert_eq!(SecurityLevel::EncMic64.authtag_len(), 8);
        assert_eq!(SecurityLevel::EncMic128.authtag_len(), 16);

        assert!(!SecurityLevel::Mic64.is_encrypted());
        assert!(SecurityLevel::EncMic64.is_encrypted());

        assert_eq!(
            SecurityLevel::EncMic32.without_encryption(),
            SecurityLevel::Mic32
        );
        assert_eq!(
            SecurityLevel::Mic128.without_encryption(),
            SecurityLevel::Mic128
        );
    }

    #[test]
    fn key_identifier_modes() {
        assert_eq!(KeyIdentifierMode::Implicit.key_identifier_len(), 0);
        assert_eq!(KeyIdentifierMode::Index.key_identifier_len(), 1);
        assert_eq!(KeyIdentifierMode::Source4.key_identifier_len(), 5);
        assert_eq!(KeyIdentifierMode::Source8.key_identifier_len(), 9);
    }

    #[test]
    fn read_implicit_header() {
        // Level 5, implicit key id, frame counter 0x01020304.
        let buffer = [0x05, 0x04, 0x03, 0x02, 0x01];
        let aux = AuxiliarySecurityHeader::new(&buffer[..]).unwrap();

        assert_eq!(aux.len(), 5);
        let control = aux.security_control();
        assert_eq!(control.security_level().unwrap(), SecurityLevel::EncMic32);
        assert_eq!(control.key_identifier_mode(), KeyIdentifierMode::Implicit);
        assert!(!control.frame_counter_suppression());
        assert_eq!(aux.frame_counter(), Some(0x01020304));
        assert!(aux.key_identifier().is_empty());
    }

    #[test]
    fn length_with_key_identifier() {
        // Level 6, key id mode 2 (4-byte source + index), counter, key id.
        let buffer = [0x16, 0x01, 0x00, 0x00, 0x00, 0xaa, 0xbb, 0xcc, 0xdd, 0x01];
        let aux = AuxiliarySecurityHeader::new(&buffer[..]).unwrap();
        assert_eq!(aux.len(), 10);
        assert_eq!(aux.key_identifier(), &[0xaa, 0xbb, 0xcc, 0xdd, 0x01]);
    }

    #[test]
    fn write_header() {
        let mut buffer = [0u8; 5];
        let mut aux = AuxiliarySecurityHeader::new_unchecked(&mut buffer[..]);
        aux.set_security_control(SecurityControl::from_byte(SecurityLevel::EncMic32.bits()));
        aux.set_frame_counter(1);
        assert_eq!(buffer, [0x05, 0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn too_short() {
        assert!(AuxiliarySecurityHeader::new(&[][..]).is_err());
        assert!(AuxiliarySecurityHeader::new(&[0x05, 0x01][..]).is_err());
    }
}
