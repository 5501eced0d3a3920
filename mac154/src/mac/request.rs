//! The management request surface.
//!
//! The configuration layer above the MAC drives it through typed,
//! synchronous requests. Every setter takes the context lock for the
//! duration of the write; getters snapshot under the lock. The one
//! request that is not a plain attribute write, `SetTschMode`, is served
//! by the TSCH service because it needs the radio capabilities; the
//! context-level handler refuses it.

use mac154_frame::{Address, SecurityLevel, TschLinkOption};

use super::constants::{MAC_PAN_ID_BROADCAST, MAC_SHORT_ADDR_MAX};
use super::pib::DeviceRole;
use super::{Error, MacContext, Result};

#[cfg(feature = "tsch")]
use super::tsch::{TschLink, TschLinkType};

/// The security settings installed by [`MacRequest::SetSecuritySettings`].
#[derive(Debug, Clone, Copy)]
pub struct SecuritySettings {
    /// The security level for outgoing and incoming frames.
    pub level: SecurityLevel,
    /// The implicit key.
    pub key: [u8; 16],
}

/// A slotframe installed by [`MacRequest::SetTschSlotframe`].
#[cfg(feature = "tsch")]
#[derive(Debug, Clone, Copy)]
pub struct SlotframeRequest {
    /// The slotframe handle.
    pub handle: u8,
    /// The slotframe size in timeslots.
    pub size: u16,
    /// Whether the slotframe is advertised in enhanced beacons.
    pub advertise: bool,
}

/// A link installed by [`MacRequest::SetTschLink`].
#[cfg(feature = "tsch")]
#[derive(Debug, Clone, Copy)]
pub struct LinkRequest {
    /// The link handle, unique across slotframes.
    pub handle: u16,
    /// The slotframe the link belongs to.
    pub slotframe_handle: u8,
    /// The timeslot inside the slotframe.
    pub timeslot: u16,
    /// The channel offset of the link.
    pub channel_offset: u16,
    /// The neighbor of the link.
    pub node_address: Address,
    /// The link options.
    pub options: TschLinkOption,
    /// Whether the link advertises the network.
    pub advertising: bool,
}

/// A management request to the MAC.
#[derive(Debug, Clone)]
pub enum MacRequest {
    /// Request acknowledgments for unicast transmissions.
    SetAck,
    /// Stop requesting acknowledgments.
    UnsetAck,
    /// Tune to a channel.
    SetChannel(u16),
    /// Set the PAN identifier.
    SetPanId(u16),
    /// Set the short address.
    SetShortAddr(u16),
    /// Set the transmit power in dBm.
    SetTxPower(i8),
    /// Set the device role.
    SetDeviceRole(DeviceRole),
    /// Install the security level and key.
    SetSecuritySettings(SecuritySettings),
    /// Install or replace a slotframe.
    #[cfg(feature = "tsch")]
    SetTschSlotframe(SlotframeRequest),
    /// Install or replace a link.
    #[cfg(feature = "tsch")]
    SetTschLink(LinkRequest),
    /// Install the hopping sequence.
    #[cfg(feature = "tsch")]
    SetHoppingSequence(heapless::Vec<u16, 16>),
    /// Turn TSCH mode on or off. Served by the TSCH service, not by the
    /// context.
    #[cfg(feature = "tsch")]
    SetTschMode(bool),
    /// Read the device role.
    GetDeviceRole,
}

/// The response to a [`MacRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacResponse {
    /// The request was applied.
    Done,
    /// The device role.
    DeviceRole(DeviceRole),
}

impl MacContext {
    /// Apply a management request to the context. The caller holds the
    /// context lock.
    pub fn handle_request(&mut self, request: MacRequest) -> Result<MacResponse> {
        match request {
            MacRequest::SetAck => {
                self.pib.ack_request = true;
            }
            MacRequest::UnsetAck => {
                self.pib.ack_request = false;
            }
            MacRequest::SetChannel(channel) => {
                self.pib.channel = channel;
            }
            MacRequest::SetPanId(pan_id) => {
                // A PAN coordinator must preside over a real PAN.
                if self.pib.role == DeviceRole::PanCoordinator
                    && pan_id == MAC_PAN_ID_BROADCAST
                {
                    return Err(Error::Invalid);
                }
                self.pib.pan_id = pan_id;
            }
            MacRequest::SetShortAddr(short_address) => {
                if self.pib.role == DeviceRole::PanCoordinator
                    && short_address > MAC_SHORT_ADDR_MAX
                {
                    return Err(Error::Invalid);
                }
                self.pib.short_address = short_address;
            }
            MacRequest::SetTxPower(tx_power) => {
                self.pib.tx_power = tx_power;
            }
            MacRequest::SetDeviceRole(role) => {
                if role == DeviceRole::PanCoordinator
                    && (self.pib.pan_id == MAC_PAN_ID_BROADCAST
                        || self.pib.short_address > MAC_SHORT_ADDR_MAX)
                {
                    return Err(Error::Invalid);
                }
                self.pib.role = role;
            }
            MacRequest::SetSecuritySettings(settings) => {
                // Level 0 means no security; installing it as the frame
                // protection level is a contradiction. An interface that
                // never had settings installed simply stays unsecured.
                if settings.level == SecurityLevel::None {
                    return Err(Error::Invalid);
                }
                self.security.level = settings.level;
                self.security.key = settings.key;
            }
            #[cfg(feature = "tsch")]
            MacRequest::SetTschSlotframe(request) => {
                self.tsch
                    .schedule
                    .set_slotframe(request.handle, request.size, request.advertise)?;
            }
            #[cfg(feature = "tsch")]
            MacRequest::SetTschLink(request) => {
                self.tsch.schedule.set_link(TschLink {
                    handle: request.handle,
                    slotframe_handle: request.slotframe_handle,
                    timeslot: request.timeslot,
                    channel_offset: request.channel_offset,
                    node_address: request.node_address,
                    options: request.options,
                    link_type: if request.advertising {
                        TschLinkType::Advertising
                    } else {
                        TschLinkType::Normal
                    },
                })?;
            }
            #[cfg(feature = "tsch")]
            MacRequest::SetHoppingSequence(channels) => {
                self.tsch.hopping = super::tsch::HoppingSequence::new(&channels)?;
            }
            #[cfg(feature = "tsch")]
            MacRequest::SetTschMode(_) => {
                // Mode transitions need the radio; the TSCH service owns
                // them.
                return Err(Error::NotSupported);
            }
            MacRequest::GetDeviceRole => {
                return Ok(MacResponse::DeviceRole(self.pib.role));
            }
        }

        Ok(MacResponse::Done)
    }
}
