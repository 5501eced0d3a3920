use super::*;
use crate::{Address, AddressingMode, CommandId, FrameType, FrameVersion, SecurityLevel};
use crate::{Error, Result};

/// Marker for beacon builders.
pub struct Beacon;
/// Marker for enhanced beacon builders.
pub struct EnhancedBeacon;
/// Marker for acknowledgment builders.
pub struct Ack;
/// Marker for data frame builders.
pub struct Data;
/// Marker for MAC command builders.
pub struct MacCommand;

/// A helper for building IEEE 802.15.4 frame representations.
///
/// The builder starts from a frame-type specific template and resolves the
/// PAN ID compression rules in [`finalize`].
///
/// [`finalize`]: FrameBuilder::finalize
pub struct FrameBuilder<'p, T> {
    frame: FrameRepr<'p>,
    marker: core::marker::PhantomData<T>,
}

fn base_frame_control(frame_type: FrameType, frame_version: FrameVersion) -> FrameControlRepr {
    FrameControlRepr {
        frame_type,
        security_enabled: false,
        frame_pending: false,
        ack_request: false,
        pan_id_compression: false,
        sequence_number_suppression: frame_version == FrameVersion::Ieee802154_2020,
        information_elements_present: false,
        dst_addressing_mode: AddressingMode::Absent,
        src_addressing_mode: AddressingMode::Absent,
        frame_version,
    }
}

fn base_frame<'p>(frame_type: FrameType, frame_version: FrameVersion) -> FrameRepr<'p> {
    FrameRepr {
        frame_control: base_frame_control(frame_type, frame_version),
        sequence_number: None,
        addressing_fields: None,
        aux_security_header: None,
        information_elements: None,
        payload: None,
    }
}

impl<'p> FrameBuilder<'p, Ack> {
    /// Create a builder for an immediate acknowledgment frame.
    pub fn new_imm_ack(sequence_number: u8) -> Self {
        let mut frame = base_frame(FrameType::Ack, FrameVersion::Ieee802154_2006);
        frame.sequence_number = Some(sequence_number);

        Self {
            frame,
            marker: core::marker::PhantomData,
        }
    }

    /// Create a builder for an enhanced acknowledgment frame.
    pub fn new_enhanced_ack() -> Self {
        Self {
            frame: base_frame(FrameType::Ack, FrameVersion::Ieee802154_2020),
            marker: core::marker::PhantomData,
        }
    }
}

impl<'p> FrameBuilder<'p, Beacon> {
    /// Create a builder for a pre-2015 beacon frame.
    pub fn new_beacon() -> Self {
        Self {
            frame: base_frame(FrameType::Beacon, FrameVersion::Ieee802154_2006),
            marker: core::marker::PhantomData,
        }
    }
}

impl<'p> FrameBuilder<'p, EnhancedBeacon> {
    /// Create a builder for an enhanced beacon frame.
    pub fn new_enhanced_beacon() -> Self {
        Self {
            frame: base_frame(FrameType::Beacon, FrameVersion::Ieee802154_2020),
            marker: core::marker::PhantomData,
        }
    }
}

impl<'p> FrameBuilder<'p, Data> {
    /// Create a builder for a data frame.
    pub fn new_data(payload: &'p [u8]) -> Self {
        let mut frame = base_frame(FrameType::Data, FrameVersion::Ieee802154_2006);
        frame.payload = Some(payload);

        Self {
            frame,
            marker: core::marker::PhantomData,
        }
    }
}

impl<'p> FrameBuilder<'p, MacCommand> {
    /// Create a builder for a MAC command frame. The payload must start
    /// with the command frame identifier octet.
    pub fn new_mac_command(command_id: CommandId, payload: &'p [u8]) -> Result<Self> {
        if payload.first() != Some(&command_id.as_byte()) {
            return Err(Error::BadFormat);
        }

        let mut frame = base_frame(FrameType::MacCommand, FrameVersion::Ieee802154_2006);
        frame.payload = Some(payload);

        Ok(Self {
            frame,
            marker: core::marker::PhantomData,
        })
    }
}

impl<'p, T> FrameBuilder<'p, T> {
    /// Set the sequence number, disabling sequence number suppression.
    pub fn set_sequence_number(mut self, sequence_number: u8) -> Self {
        self.frame.sequence_number = Some(sequence_number);
        self.frame.frame_control.sequence_number_suppression = false;
        self
    }

    /// Set the frame version.
    pub fn set_frame_version(mut self, frame_version: FrameVersion) -> Self {
        self.frame.frame_control.frame_version = frame_version;
        self
    }

    /// Set the acknowledgment request bit.
    pub fn set_ack_request(mut self, ack_request: bool) -> Self {
        self.frame.frame_control.ack_request = ack_request;
        self
    }

    /// Set the destination PAN ID.
    pub fn set_dst_pan_id(mut self, pan_id: u16) -> Self {
        self.frame
            .addressing_fields
            .get_or_insert_with(AddressingFieldsRepr::default)
            .dst_pan_id = Some(pan_id);
        self
    }

    /// Set the source PAN ID.
    pub fn set_src_pan_id(mut self, pan_id: u16) -> Self {
        self.frame
            .addressing_fields
            .get_or_insert_with(AddressingFieldsRepr::default)
            .src_pan_id = Some(pan_id);
        self
    }

    /// Set the destination address and the matching addressing mode.
    pub fn set_dst_address(mut self, address: Address) -> Self {
        self.frame.frame_control.dst_addressing_mode = address.into();
        self.frame
            .addressing_fields
            .get_or_insert_with(AddressingFieldsRepr::default)
            .dst_address = Some(address);
        self
    }

    /// Set the source address and the matching addressing mode.
    pub fn set_src_address(mut self, address: Address) -> Self {
        self.frame.frame_control.src_addressing_mode = address.into();
        self.frame
            .addressing_fields
            .get_or_insert_with(AddressingFieldsRepr::default)
            .src_address = Some(address);
        self
    }

    /// Enable security with the given level and frame counter.
    ///
    /// The auxiliary security header is emitted by the builder; the
    /// payload transformation itself is the security engine's concern.
    pub fn set_security(mut self, security_level: SecurityLevel, frame_counter: u32) -> Self {
        self.frame.frame_control.security_enabled = true;
        self.frame.aux_security_header = Some(AuxiliarySecurityHeaderRepr {
            security_level,
            frame_counter,
        });
        self
    }

    /// Add a header Information Element, setting the IE present bit and
    /// the 2015 frame version.
    pub fn add_header_information_element(mut self, ie: HeaderInformationElementRepr) -> Self {
        self.frame.frame_control.information_elements_present = true;
        self.frame.frame_control.frame_version = FrameVersion::Ieee802154_2020;
        self.frame
            .information_elements
            .get_or_insert_with(InformationElementsRepr::default)
            .header_information_elements
            .push(ie)
            .unwrap();
        self
    }

    /// Add a payload Information Element, setting the IE present bit and
    /// the 2015 frame version.
    pub fn add_payload_information_element(mut self, ie: PayloadInformationElementRepr) -> Self {
        self.frame.frame_control.information_elements_present = true;
        self.frame.frame_control.frame_version = FrameVersion::Ieee802154_2020;
        self.frame
            .information_elements
            .get_or_insert_with(InformationElementsRepr::default)
            .payload_information_elements
            .push(ie)
            .unwrap();
        self
    }

    /// Set the frame payload.
    pub fn set_payload(mut self, payload: &'p [u8]) -> Self {
        self.frame.payload = Some(payload);
        self
    }

    /// Finalize the builder, resolving PAN ID compression.
    ///
    /// The compression rules depend on the frame version; the source PAN
    /// ID is elided when the rules say so.
    pub fn finalize(mut self) -> Result<FrameRepr<'p>> {
        if self.frame.frame_control.frame_version == FrameVersion::Ieee802154_2020 {
            let Some(addr) = self.frame.addressing_fields.as_mut() else {
                // An addressless 2015 frame (e.g. an enhanced ACK between
                // TSCH neighbors) carries no PAN ID either.
                self.frame.frame_control.pan_id_compression = false;
                return Ok(self.frame);
            };

            self.frame.frame_control.pan_id_compression = match (
                addr.dst_address,
                addr.src_address,
                addr.dst_pan_id,
                addr.src_pan_id,
            ) {
                (None, None, None, None) => false,
                (None, None, Some(_), None) => true,
                (Some(_), None, Some(_), None) => false,
                (Some(_), None, None, None) => true,
                (None, Some(_), None, Some(_)) => false,
                (None, Some(_), None, None) => true,
                (Some(Address::Extended(_)), Some(Address::Extended(_)), Some(_), None) => false,
                (Some(Address::Extended(_)), Some(Address::Extended(_)), None, None) => true,
                (Some(_), Some(_), Some(dst), Some(src)) => {
                    if dst == src {
                        addr.src_pan_id = None;
                    }
                    dst == src
                }
                (Some(_), Some(_), Some(_), None) => true,
                _ => return Err(Error::BadFormat),
            };
        } else {
            if self.frame.frame_control.frame_type == FrameType::Ack {
                // An immediate acknowledgment needs a sequence number and
                // nothing else.
                if self.frame.sequence_number.is_none() {
                    return Err(Error::BadFormat);
                }

                self.frame.addressing_fields = None;

                return Ok(self.frame);
            }

            let Some(addr) = self.frame.addressing_fields.as_mut() else {
                return Err(Error::BadFormat);
            };

            match (
                addr.dst_address,
                addr.src_address,
                addr.dst_pan_id,
                addr.src_pan_id,
            ) {
                // Both addresses present: elide the source PAN ID when the
                // PAN IDs match.
                (Some(_), Some(_), Some(dst_pan_id), Some(src_pan_id)) => {
                    if dst_pan_id == src_pan_id {
                        self.frame.frame_control.pan_id_compression = true;
                        addr.src_pan_id = None;
                    }
                }
                // A single address carries its own PAN ID.
                (Some(_), None, Some(_), _) => {
                    self.frame.frame_control.pan_id_compression = false;
                    addr.src_pan_id = None;
                }
                (None, Some(_), _, Some(_)) => {
                    self.frame.frame_control.pan_id_compression = false;
                    addr.dst_pan_id = None;
                }
                _ => return Err(Error::BadFormat),
            }
        }

        Ok(self.frame)
    }
}
