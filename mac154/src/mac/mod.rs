//! The MAC sublayer: context, frame assembly, filtering, security and
//! TSCH.
//!
//! One [`MacContext`] exists per interface. It owns the PAN Information
//! Base, the security sub-context and the TSCH sub-context, and is
//! shared between the MAC activities under a single async mutex (the
//! *context lock*); scanning and mode transitions take a separate *scan
//! lock* so a scan can run concurrently with normal traffic.

pub mod acknowledgment;
#[cfg(feature = "tsch")]
pub mod beacon;
pub mod command;
pub mod constants;
pub mod data;
pub mod neighbors;
pub mod pib;
pub mod request;
pub mod security;

#[cfg(feature = "tsch")]
pub mod tsch;

use mac154_frame::{Address, CommandId, Frame, FrameType};

use crate::sync::mutex::Mutex;
use neighbors::NeighborTable;
use pib::{DeviceRole, Pib};
use security::SecurityContext;

/// A MAC error.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Malformed bytes or out-of-range arguments.
    Invalid,
    /// A well-formed but unsupported option or a missing driver
    /// capability.
    NotSupported,
    /// The interface is not associated to a PAN.
    NotAssociated,
    /// The medium, the driver or a lock is busy.
    Busy,
    /// A security procedure failed: nonce derivation, verification, or
    /// frame counter exhaustion.
    Security,
    /// Nothing to dequeue.
    NoData,
    /// Out of buffers or queue slots.
    NoMemory,
    /// A synchronization deadline passed.
    Timeout,
    /// The network side of the interface is down.
    NetDown,
}

impl From<mac154_frame::Error> for Error {
    fn from(value: mac154_frame::Error) -> Self {
        match value {
            mac154_frame::Error::NotSupported => Error::NotSupported,
            _ => Error::Invalid,
        }
    }
}

impl From<crate::phy::Error> for Error {
    fn from(value: crate::phy::Error) -> Self {
        match value {
            crate::phy::Error::Busy => Error::Busy,
            crate::phy::Error::NotSupported => Error::NotSupported,
            _ => Error::Invalid,
        }
    }
}

/// A type alias for `Result<T, mac::Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// The scan state of an interface, guarded by the scan lock.
#[derive(Default)]
pub struct ScanState {
    /// Set while a channel scan owns the radio.
    pub scanning: bool,
    /// Set while the interface runs in TSCH mode.
    pub tsch_mode: bool,
}

/// The shared link-layer context of one interface.
///
/// Every mutable field is protected by the context [`Mutex`] the context
/// is stored in; the accessors assume the lock is held.
pub struct MacContext {
    /// The PAN Information Base.
    pub pib: Pib,
    /// The security sub-context.
    pub security: SecurityContext,
    /// The TSCH sub-context.
    #[cfg(feature = "tsch")]
    pub tsch: tsch::TschContext,
    /// Per-neighbor TX queue depths for slot prioritization.
    pub neighbors: NeighborTable<8>,
}

impl MacContext {
    /// Create a context with default attributes.
    pub fn new() -> Self {
        Self {
            pib: Pib::default(),
            security: SecurityContext::default(),
            #[cfg(feature = "tsch")]
            tsch: tsch::TschContext::new(),
            neighbors: NeighborTable::new(),
        }
    }

    /// Take the next outgoing sequence number, incrementing the counter
    /// exactly once.
    pub fn next_sequence_number(&mut self) -> u8 {
        let sequence = self.pib.sequence_number;
        self.pib.sequence_number = self.pib.sequence_number.wrapping_add(1);
        sequence
    }

    /// Decide whether a received frame is for us.
    ///
    /// The verdict only depends on the frame and the context attributes,
    /// so filtering the same frame twice yields the same verdict.
    pub fn filter(&self, frame: &Frame<&[u8]>) -> bool {
        if self.pib.promiscuous_mode {
            return true;
        }

        if let Some(addressing) = frame.addressing() {
            if let Some(dst_pan) = addressing.dst_pan_id() {
                if dst_pan != constants::MAC_PAN_ID_BROADCAST && dst_pan != self.pib.pan_id {
                    return false;
                }
            }

            match addressing.dst_address() {
                Some(Address::Short(_)) => {
                    let dst = addressing.dst_address().unwrap();
                    if !dst.is_broadcast() && dst.as_short() != Some(self.pib.short_address) {
                        return false;
                    }
                }
                Some(Address::Extended(addr)) => {
                    // The context caches the extended address in on-wire
                    // (little-endian) order; the parsed address is in
                    // canonical order.
                    let mut ours = match self.pib.extended_address {
                        Some(ours) => ours,
                        None => return false,
                    };
                    ours.reverse();
                    if addr != ours {
                        return false;
                    }
                }
                Some(Address::Absent) | None => {}
            }
        }

        // Addressing coherent with the interface role: commands that only
        // a coordinator can serve are dropped on end devices.
        if let Frame::MacCommand(command) = frame {
            if let Ok(id) = command.command_id() {
                let needs_coordinator = matches!(
                    id,
                    CommandId::AssociationRequest
                        | CommandId::OrphanNotification
                        | CommandId::BeaconRequest
                        | CommandId::DataRequest
                );
                if needs_coordinator && self.pib.role == DeviceRole::EndDevice {
                    return false;
                }
            }
        }

        true
    }
}

impl Default for MacContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse and validate the MAC header of a received frame.
///
/// The buffer is mutable because of one in-place repair the standard
/// mandates: a pre-2015 MAC command must not have the frame pending bit
/// set, and a frame that does is accepted with the bit cleared rather
/// than dropped.
pub fn parse_mhr(buffer: &mut [u8]) -> Result<Frame<&[u8]>> {
    if buffer.len() >= 2 {
        let fc = mac154_frame::FrameControl::new_unchecked(&buffer[..2]);
        if fc.frame_version().is_pre_2015()
            && fc.frame_type() == FrameType::MacCommand
            && fc.frame_pending()
        {
            let mut fc = mac154_frame::FrameControl::new_unchecked(&mut buffer[..2]);
            fc.set_frame_pending(false);
        }
    }

    Ok(Frame::new(&buffer[..])?)
}

/// Validate the payload of a parsed frame against its frame type.
///
/// Beacon and MAC command payloads are validated structurally during
/// [`parse_mhr`]; what remains here are the presence rules.
pub fn parse_payload(frame: &Frame<&[u8]>) -> Result<()> {
    match frame {
        Frame::Data(data) => match data.payload() {
            Some(payload) if !payload.is_empty() => Ok(()),
            _ => Err(Error::Invalid),
        },
        // An immediate acknowledgment is exactly three octets, so its
        // payload is empty by construction; the remaining types carry the
        // validation in their readers.
        _ => Ok(()),
    }
}

/// A context behind its lock, the shape every MAC service works with.
pub type SharedContext = Mutex<MacContext>;

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> MacContext {
        let mut ctx = MacContext::new();
        ctx.pib.pan_id = 0xabcd;
        ctx.pib.short_address = 0x1234;
        ctx.pib.extended_address = Some([0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
        ctx
    }

    #[test]
    fn sequence_increments_once() {
        let mut ctx = MacContext::new();
        assert_eq!(ctx.next_sequence_number(), 0);
        assert_eq!(ctx.next_sequence_number(), 1);

        ctx.pib.sequence_number = 0xff;
        assert_eq!(ctx.next_sequence_number(), 0xff);
        assert_eq!(ctx.pib.sequence_number, 0);
    }

    #[test]
    fn filter_accepts_our_pan_and_address() {
        let ctx = context();

        // Unicast data to us.
        let frame = [
            0x61, 0x88, 0x05, 0xcd, 0xab, 0x34, 0x12, 0xef, 0xbe, 0x01,
        ];
        let frame = Frame::new(&frame[..]).unwrap();
        assert!(ctx.filter(&frame));
        // Filtering is idempotent.
        assert!(ctx.filter(&frame));
    }

    #[test]
    fn filter_drops_foreign_pan() {
        let ctx = context();

        let frame = [
            0x61, 0x88, 0x05, 0x22, 0x11, 0x34, 0x12, 0xef, 0xbe, 0x01,
        ];
        let frame = Frame::new(&frame[..]).unwrap();
        assert!(!ctx.filter(&frame));
    }

    #[test]
    fn filter_drops_foreign_short_address() {
        let ctx = context();

        let frame = [
            0x61, 0x88, 0x05, 0xcd, 0xab, 0x99, 0x99, 0xef, 0xbe, 0x01,
        ];
        let frame = Frame::new(&frame[..]).unwrap();
        assert!(!ctx.filter(&frame));
    }

    #[test]
    fn filter_accepts_broadcast() {
        let ctx = context();

        let frame = [
            0x41, 0x88, 0x05, 0xff, 0xff, 0xff, 0xff, 0xef, 0xbe, 0x01,
        ];
        let frame = Frame::new(&frame[..]).unwrap();
        assert!(ctx.filter(&frame));
    }

    #[test]
    fn filter_drops_orphan_notification_on_end_device() {
        let mut ctx = context();

        // Orphan notification: broadcast dst, extended src.
        let frame = [
            0x03, 0xc8, 0x01, 0xff, 0xff, 0xff, 0xff, 0xcd, 0xab, 0x08, 0x07, 0x06, 0x05, 0x04,
            0x03, 0x02, 0x01, 0x06,
        ];
        let frame = Frame::new(&frame[..]).unwrap();

        ctx.pib.role = DeviceRole::EndDevice;
        assert!(!ctx.filter(&frame));

        ctx.pib.role = DeviceRole::PanCoordinator;
        assert!(ctx.filter(&frame));
    }

    #[test]
    fn repair_clears_frame_pending_on_legacy_command() {
        // Data request with the frame pending bit set.
        let mut buffer = [
            0x73, 0x88, 0x01, 0xcd, 0xab, 0x00, 0x00, 0x34, 0x12, 0x04,
        ];

        let frame = parse_mhr(&mut buffer[..]).unwrap();
        assert!(!frame.frame_control().frame_pending());
        drop(frame);

        // The repair happened in the buffer itself.
        assert_eq!(buffer[0], 0x63);
    }

    #[test]
    fn payload_rules() {
        // A data frame without payload is dropped.
        let buffer = [0x61, 0x88, 0x05, 0xcd, 0xab, 0x34, 0x12, 0xef, 0xbe];
        let frame = Frame::new(&buffer[..]).unwrap();
        assert_eq!(parse_payload(&frame).unwrap_err(), Error::Invalid);

        let buffer = [0x02, 0x00, 0x2a];
        let frame = Frame::new(&buffer[..]).unwrap();
        parse_payload(&frame).unwrap();
    }
}
