//! Data frame reader.

use super::Mpdu;
use crate::{Error, Result};
use crate::{FrameType, InformationElements};

/// A reader for an IEEE 802.15.4 data frame.
#[derive(Debug)]
pub struct DataFrame<T: AsRef<[u8]>> {
    mpdu: Mpdu<T>,
}

impl<T: AsRef<[u8]>> DataFrame<T> {
    /// Create a new [`DataFrame`] reader from a given buffer.
    pub fn new(buffer: T) -> Result<Self> {
        let frame = Self::new_unchecked(buffer);

        if frame.mpdu.frame_control().frame_type() != FrameType::Data {
            return Err(Error::BadFormat);
        }

        frame.mpdu.validate()?;

        Ok(frame)
    }

    /// Create a new [`DataFrame`] reader from a given buffer without
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

    /// Return an [`InformationElements`] reader, if present.
    pub fn information_elements(&self) -> Option<InformationElements<&'_ [u8]>> {
        self.mpdu.information_elements()
    }
}

impl<'f, T: AsRef<[u8]> + ?Sized> DataFrame<&'f T> {
    /// Return the frame payload.
    ///
    /// A data frame without payload is not a valid data frame; the MAC drops
    /// it (`parse_payload` in the MAC runtime).
    pub fn payload(&self) -> Option<&'f [u8]> {
        self.mpdu.frame_payload()
    }
}
