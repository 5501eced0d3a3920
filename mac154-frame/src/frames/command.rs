//! MAC command frame reader and the command frame identifier table.

use super::Mpdu;
use crate::{AddressingMode, Error, FrameControl, FrameType, Result};

/// Command Frame Identifier, the first octet of a MAC command payload
/// (IEEE 802.15.4-2020 §7.5, Table 7-49).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandId {
    /// Association Request (§7.5.2).
    AssociationRequest = 0x01,
    /// Association Response (§7.5.3).
    AssociationResponse = 0x02,
    /// Disassociation Notification (§7.5.4).
    DisassociationNotification = 0x03,
    /// Data Request (§7.5.5).
    DataRequest = 0x04,
    /// PAN ID Conflict Notification (§7.5.6).
    PanIdConflictNotification = 0x05,
    /// Orphan Notification (§7.5.7).
    OrphanNotification = 0x06,
    /// Beacon Request (§7.5.8).
    BeaconRequest = 0x07,
    /// Coordinator Realignment (§7.5.9).
    CoordinatorRealignment = 0x08,
    /// GTS Request (§7.5.10).
    GtsRequest = 0x09,
}

impl CommandId {
    /// Decode a command frame identifier octet.
    pub fn from_byte(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::AssociationRequest),
            0x02 => Ok(Self::AssociationResponse),
            0x03 => Ok(Self::DisassociationNotification),
            0x04 => Ok(Self::DataRequest),
            0x05 => Ok(Self::PanIdConflictNotification),
            0x06 => Ok(Self::OrphanNotification),
            0x07 => Ok(Self::BeaconRequest),
            0x08 => Ok(Self::CoordinatorRealignment),
            0x09 => Ok(Self::GtsRequest),
            _ => Err(Error::Reserved),
        }
    }

    /// Return the raw identifier octet.
    pub const fn as_byte(&self) -> u8 {
        *self as u8
    }

    /// Return the length of the command content, the octets following the
    /// identifier. A coordinator realignment may additionally carry one
    /// channel-page octet.
    pub const fn content_len(&self) -> usize {
        match self {
            // Capability Information.
            Self::AssociationRequest => 1,
            // Short Address + Association Status.
            Self::AssociationResponse => 3,
            // Disassociation Reason.
            Self::DisassociationNotification => 1,
            Self::DataRequest => 0,
            Self::PanIdConflictNotification => 0,
            Self::OrphanNotification => 0,
            Self::BeaconRequest => 0,
            // PAN ID + Coordinator Short Address + Channel + Short Address.
            Self::CoordinatorRealignment => 7,
            // GTS Characteristics.
            Self::GtsRequest => 1,
        }
    }

    /// Check the addressing constraints of the command against the frame
    /// control modes and the destination address bytes (§7.5.1 to §7.5.11).
    pub fn validate_addressing(
        &self,
        dst_mode: AddressingMode,
        src_mode: AddressingMode,
        dst_is_broadcast: bool,
    ) -> Result<()> {
        use AddressingMode::*;

        let ok = match self {
            // The device identifies itself with its extended address.
            Self::AssociationRequest => {
                matches!(dst_mode, Short | Extended) && src_mode == Extended
            }
            // Both sides use extended addresses during association.
            Self::AssociationResponse | Self::PanIdConflictNotification => {
                dst_mode == Extended && src_mode == Extended
            }
            Self::DisassociationNotification => {
                matches!(dst_mode, Short | Extended) && src_mode == Extended
            }
            Self::DataRequest => {
                matches!(dst_mode, Absent | Short | Extended)
                    && matches!(src_mode, Short | Extended)
            }
            // Sent to the broadcast short address from an orphaned device.
            Self::OrphanNotification => {
                dst_mode == Short && dst_is_broadcast && src_mode == Extended
            }
            // Broadcast, with no source address.
            Self::BeaconRequest => dst_mode == Short && dst_is_broadcast && src_mode == Absent,
            Self::CoordinatorRealignment => {
                matches!(dst_mode, Short | Extended) && src_mode == Extended
            }
            Self::GtsRequest => dst_mode == Absent && src_mode == Short,
        };

        if ok {
            Ok(())
        } else {
            Err(Error::BadFormat)
        }
    }
}

impl core::fmt::Display for CommandId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AssociationRequest => write!(f, "Association Request"),
            Self::AssociationResponse => write!(f, "Association Response"),
            Self::DisassociationNotification => write!(f, "Disassociation Notification"),
            Self::DataRequest => write!(f, "Data Request"),
            Self::PanIdConflictNotification => write!(f, "PAN ID Conflict Notification"),
            Self::OrphanNotification => write!(f, "Orphan Notification"),
            Self::BeaconRequest => write!(f, "Beacon Request"),
            Self::CoordinatorRealignment => write!(f, "Coordinator Realignment"),
            Self::GtsRequest => write!(f, "GTS Request"),
        }
    }
}

/// A reader for an IEEE 802.15.4 MAC command frame.
#[derive(Debug)]
pub struct CommandFrame<T: AsRef<[u8]>> {
    mpdu: Mpdu<T>,
}

impl<T: AsRef<[u8]>> CommandFrame<T> {
    /// Create a new [`CommandFrame`] reader from a given buffer.
    ///
    /// Beyond the generic MPDU validation this checks the command frame
    /// identifier, the per-identifier content length and the addressing
    /// constraints of §7.5.
    pub fn new(buffer: T) -> Result<Self> {
        let frame = Self::new_unchecked(buffer);

        let fc = frame.mpdu.frame_control();
        if fc.frame_type() != FrameType::MacCommand {
            return Err(Error::BadFormat);
        }

        frame.mpdu.validate()?;

        let Some(payload) = frame.raw_payload() else {
            return Err(Error::WrongLength);
        };

        let id = CommandId::from_byte(payload[0])?;

        let required = id.content_len();
        let content_len = payload.len() - 1;
        if content_len != required {
            // Coordinator realignment may carry one extra channel-page
            // octet.
            if !(id == CommandId::CoordinatorRealignment && content_len == required + 1) {
                return Err(Error::WrongLength);
            }
        }

        let dst_is_broadcast = frame
            .mpdu
            .addressing()
            .and_then(|af| af.dst_address())
            .map(|addr| addr.is_broadcast())
            .unwrap_or(false);

        id.validate_addressing(
            fc.dst_addressing_mode(),
            fc.src_addressing_mode(),
            dst_is_broadcast,
        )?;

        Ok(frame)
    }

    /// Create a new [`CommandFrame`] reader from a given buffer without
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

    fn raw_payload(&self) -> Option<&[u8]> {
        let mut offset = self.mpdu.header_len();
        if let Some(ie) = self.mpdu.information_elements() {
            offset += ie.len();
        }

        let buffer = self.mpdu.buffer_ref();
        if buffer.len() <= offset {
            return None;
        }

        Some(&buffer[offset..])
    }

    /// Return a [`FrameControl`] reader.
    pub fn frame_control(&self) -> FrameControl<&'_ [u8]> {
        self.mpdu.frame_control()
    }

    /// Return the command frame identifier.
    pub fn command_id(&self) -> Result<CommandId> {
        let payload = self.raw_payload().ok_or(Error::WrongLength)?;
        CommandId::from_byte(payload[0])
    }

    /// Return the command content, the octets following the identifier.
    pub fn content(&self) -> &[u8] {
        match self.raw_payload() {
            Some(payload) => &payload[1..],
            None => &[],
        }
    }
}
