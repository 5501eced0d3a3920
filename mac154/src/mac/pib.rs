//! The PAN Information Base: the semantic attributes of one interface.

use super::constants::*;
use mac154_frame::time::Duration;

/// The role of the device in its PAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceRole {
    /// An end device.
    #[default]
    EndDevice,
    /// A coordinator.
    Coordinator,
    /// The PAN coordinator.
    PanCoordinator,
}

/// PAN Information Base attributes of the MAC sublayer.
///
/// All fields live under the context lock; none of them are touched
/// outside of it.
pub struct Pib {
    /// The identifier of the PAN the device operates on. `0xffff` means
    /// the device is not associated.
    pub pan_id: u16,
    /// The short address of the device. `0xffff` when not associated,
    /// `0xfffe` when associated without a short address.
    pub short_address: u16,
    /// The extended address of the device, in little-endian byte order as
    /// it appears on the wire.
    pub extended_address: Option<[u8; 8]>,
    /// The outgoing sequence counter, incremented once per non-ACK
    /// emission.
    pub sequence_number: u8,
    /// The radio channel in use.
    pub channel: u16,
    /// The transmit power in dBm.
    pub tx_power: i8,
    /// The role of the device.
    pub role: DeviceRole,
    /// Whether unicast transmissions request acknowledgments.
    pub ack_request: bool,
    /// The sequence number of the last acknowledgment sent.
    pub last_acked_sequence: Option<u8>,
    /// The short address of the coordinator the device associated
    /// through. `0xfffe` means the coordinator uses only its extended
    /// address; `0xffff` means unknown.
    pub coord_short_address: u16,
    /// The extended address of the coordinator the device associated
    /// through.
    pub coord_extended_address: Option<[u8; 8]>,
    /// Whether the device associated through the PAN coordinator.
    pub associated_pan_coord: bool,
    /// Whether a coordinator currently accepts association requests.
    pub association_permit: bool,
    /// Whether the MAC passes every received frame up, regardless of
    /// addressing.
    pub promiscuous_mode: bool,
    /// How often a coordinator emits enhanced beacons; 15 disables the
    /// periodic beacon.
    pub enhanced_beacon_order: u8,
    /// The minimum long interframe spacing.
    pub lifs_period: Duration,
    /// The minimum short interframe spacing.
    pub sifs_period: Duration,
}

impl Pib {
    /// Returns `true` when the device is associated to a PAN.
    pub fn is_associated(&self) -> bool {
        self.pan_id != MAC_PAN_ID_BROADCAST
            && self.short_address != MAC_SHORT_ADDR_UNASSOCIATED
    }

    /// Returns `true` when the device holds an assignable short address.
    pub fn has_short_address(&self) -> bool {
        self.short_address <= MAC_SHORT_ADDR_MAX
    }
}

impl Default for Pib {
    fn default() -> Self {
        Self {
            pan_id: MAC_PAN_ID_BROADCAST,
            short_address: MAC_SHORT_ADDR_UNASSOCIATED,
            extended_address: None,
            sequence_number: 0,
            channel: 26,
            tx_power: 0,
            role: DeviceRole::EndDevice,
            ack_request: false,
            last_acked_sequence: None,
            coord_short_address: MAC_SHORT_ADDR_UNASSOCIATED,
            coord_extended_address: None,
            associated_pan_coord: false,
            association_permit: false,
            promiscuous_mode: false,
            enhanced_beacon_order: 0,
            lifs_period: MAC_LIFS_PERIOD,
            sifs_period: MAC_SIFS_PERIOD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn association_state() {
        let mut pib = Pib::default();
        assert!(!pib.is_associated());
        assert!(!pib.has_short_address());

        pib.pan_id = 0xabcd;
        pib.short_address = 0x1234;
        assert!(pib.is_associated());
        assert!(pib.has_short_address());

        pib.short_address = MAC_SHORT_ADDR_NO_SHORT;
        assert!(pib.is_associated());
        assert!(!pib.has_short_address());
    }
}
