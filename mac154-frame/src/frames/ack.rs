//! Acknowledgment frame readers.

use super::Mpdu;
use crate::{Error, Result};
use crate::{FrameControl, FrameType, FrameVersion};

/// A reader for an IEEE 802.15.4 immediate acknowledgment frame.
///
/// An immediate acknowledgment is exactly three octets: the frame control
/// word and the sequence number of the acknowledged frame.
#[derive(Debug)]
pub struct Ack<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> Ack<T> {
    /// Create a new [`Ack`] reader from a given buffer.
    pub fn new(buffer: T) -> Result<Self> {
        let ack = Self::new_unchecked(buffer);

        if ack.buffer.as_ref().len() != 3 {
            return Err(Error::WrongLength);
        }

        let fc = ack.frame_control();
        if fc.frame_type() != FrameType::Ack || !fc.frame_version().is_pre_2015() {
            return Err(Error::BadFormat);
        }

        Ok(ack)
    }

    /// Create a new [`Ack`] reader from a given buffer without length
    /// checking.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    /// Return a [`FrameControl`] reader.
    pub fn frame_control(&self) -> FrameControl<&'_ [u8]> {
        FrameControl::new_unchecked(&self.buffer.as_ref()[..2])
    }

    /// Return the sequence number field.
    pub fn sequence_number(&self) -> u8 {
        self.buffer.as_ref()[2]
    }
}

/// A reader for an IEEE 802.15.4 enhanced acknowledgment frame.
///
/// Enhanced acknowledgments are 2015-and-later frames; they may carry
/// addressing, security, and information elements. In TSCH mode the
/// acknowledgment carries a Time Correction header IE.
#[derive(Debug)]
pub struct EnhancedAck<T: AsRef<[u8]>> {
    mpdu: Mpdu<T>,
}

impl<T: AsRef<[u8]>> EnhancedAck<T> {
    /// Create a new [`EnhancedAck`] reader from a given buffer.
    pub fn new(buffer: T) -> Result<Self> {
        let ack = Self::new_unchecked(buffer);

        let fc = ack.mpdu.frame_control();
        if fc.frame_type() != FrameType::Ack
            || fc.frame_version() != FrameVersion::Ieee802154_2020
        {
            return Err(Error::BadFormat);
        }

        ack.mpdu.validate()?;

        Ok(ack)
    }

    /// Create a new [`EnhancedAck`] reader from a given buffer without
    /// validation.
    pub fn new_unchecked(buffer: T) -> Self {
        Self {
            mpdu: Mpdu::new_unchecked(buffer),
        }
    }

    /// Return the underlying [`Mpdu`] reader.
    pub fn mpdu(&self) -> &Mpdu<T> {
        &self.mpdu
    }
}
