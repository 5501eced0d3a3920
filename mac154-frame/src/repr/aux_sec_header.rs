use super::super::{
    AuxiliarySecurityHeader, KeyIdentifierMode, SecurityControl, SecurityLevel,
};
use super::super::{Error, Result};

/// A high-level representation of the IEEE 802.15.4 Auxiliary Security
/// Header.
///
/// Only the implicit key identifier mode is representable; the key
/// identifier field is therefore always empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuxiliarySecurityHeaderRepr {
    /// The security level of the frame.
    pub security_level: SecurityLevel,
    /// The frame counter used for the nonce.
    pub frame_counter: u32,
}

impl AuxiliarySecurityHeaderRepr {
    /// Parse an Auxiliary Security Header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] for any key identifier mode other
    /// than implicit, and [`Error::Reserved`] for security level 4.
    pub fn parse(aux: &AuxiliarySecurityHeader<&[u8]>) -> Result<Self> {
        let control = aux.security_control();

        if control.key_identifier_mode() != KeyIdentifierMode::Implicit {
            return Err(Error::NotSupported);
        }

        Ok(Self {
            security_level: control.security_level()?,
            frame_counter: aux.frame_counter().ok_or(Error::NotSupported)?,
        })
    }

    /// Return the length of the Auxiliary Security Header when emitted:
    /// the Security Control octet and the frame counter.
    pub const fn buffer_len(&self) -> usize {
        1 + 4
    }

    /// Emit the Auxiliary Security Header into a buffer, returning the
    /// number of octets written.
    pub fn emit(&self, buffer: &mut [u8]) -> usize {
        let mut aux = AuxiliarySecurityHeader::new_unchecked(buffer);
        aux.set_security_control(SecurityControl::from_byte(self.security_level.bits()));
        aux.set_frame_counter(self.frame_counter);
        self.buffer_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let repr = AuxiliarySecurityHeaderRepr {
            security_level: SecurityLevel::EncMic32,
            frame_counter: 1,
        };

        let mut buffer = [0u8; 5];
        assert_eq!(repr.emit(&mut buffer), 5);
        assert_eq!(buffer, [0x05, 0x01, 0x00, 0x00, 0x00]);

        let aux = AuxiliarySecurityHeader::new(&buffer[..]).unwrap();
        assert_eq!(AuxiliarySecurityHeaderRepr::parse(&aux).unwrap(), repr);
    }

    #[test]
    fn rejects_explicit_key_identifier() {
        // Key identifier mode 1.
        let buffer = [0x0d, 0x01, 0x00, 0x00, 0x00, 0x07];
        let aux = AuxiliarySecurityHeader::new(&buffer[..]).unwrap();
        assert_eq!(
            AuxiliarySecurityHeaderRepr::parse(&aux).unwrap_err(),
            Error::NotSupported
        );
    }
}
