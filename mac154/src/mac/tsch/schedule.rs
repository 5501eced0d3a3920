//! The TSCH schedule: slotframes, links, the hopping sequence, and the
//! link selector.
//!
//! Slotframes are kept sorted by handle and the links of a slotframe by
//! (timeslot, handle), so that link selection walks each slotframe once
//! and mutation is a sorted insert. Replacing an entry hands the previous
//! one back to the caller.

use heapless::Vec;
use mac154_frame::{Address, TschLinkOption};

use super::asn::Asn;
use crate::mac::{Error, Result};

/// The kind of traffic a link carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TschLinkType {
    /// An ordinary traffic link.
    #[default]
    Normal,
    /// A link that may carry enhanced beacons in addition to traffic.
    Advertising,
    /// A link reserved for enhanced beacons.
    AdvertisingOnly,
}

/// One entry of the TSCH schedule: a (slotframe, timeslot, channel
/// offset, neighbor, direction) assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TschLink {
    /// The link handle, unique across all slotframes.
    pub handle: u16,
    /// The handle of the slotframe the link belongs to.
    pub slotframe_handle: u8,
    /// The timeslot inside the slotframe.
    pub timeslot: u16,
    /// The channel offset applied to the hopping sequence.
    pub channel_offset: u16,
    /// The neighbor the link talks to; broadcast for shared cells.
    pub node_address: Address,
    /// The TX/RX/shared/timekeeping options.
    pub options: TschLinkOption,
    /// Whether the link advertises the network.
    pub link_type: TschLinkType,
}

impl TschLink {
    /// Returns `true` when the link may transmit.
    pub fn is_tx(&self) -> bool {
        self.options.contains(TschLinkOption::Tx)
    }

    /// Returns `true` when the link may receive.
    pub fn is_rx(&self) -> bool {
        self.options.contains(TschLinkOption::Rx)
    }

    /// Returns `true` when frames received on the link discipline the
    /// local clock.
    pub fn is_timekeeping(&self) -> bool {
        self.options.contains(TschLinkOption::TimeKeeping)
    }

    /// Returns `true` when the link may carry an enhanced beacon.
    pub fn is_advertising(&self) -> bool {
        matches!(
            self.link_type,
            TschLinkType::Advertising | TschLinkType::AdvertisingOnly
        )
    }
}

/// A cyclic sequence of timeslots.
#[derive(Debug, Clone)]
pub struct TschSlotframe<const L: usize> {
    /// The slotframe handle.
    pub handle: u8,
    /// The slotframe size in timeslots. Prime sizes avoid links of
    /// parallel slotframes shadowing each other cycle after cycle.
    pub size: u16,
    /// Whether the slotframe is advertised in enhanced beacons.
    pub advertise: bool,
    links: Vec<TschLink, L>,
}

impl<const L: usize> TschSlotframe<L> {
    /// Create an empty slotframe.
    pub fn new(handle: u8, size: u16, advertise: bool) -> Self {
        Self {
            handle,
            size,
            advertise,
            links: Vec::new(),
        }
    }

    /// The links of the slotframe, in (timeslot, handle) order.
    pub fn links(&self) -> &[TschLink] {
        &self.links
    }

    fn insert_link(&mut self, link: TschLink) -> Result<Option<TschLink>> {
        let replaced = match self.links.iter().position(|l| l.handle == link.handle) {
            Some(index) => Some(self.links.remove(index)),
            None => None,
        };

        let index = self
            .links
            .iter()
            .position(|l| (l.timeslot, l.handle) > (link.timeslot, link.handle))
            .unwrap_or(self.links.len());

        self.links
            .insert(index, link)
            .map_err(|_| Error::NoMemory)?;

        Ok(replaced)
    }

    fn remove_link(&mut self, handle: u16) -> Option<TschLink> {
        let index = self.links.iter().position(|l| l.handle == handle)?;
        Some(self.links.remove(index))
    }
}

/// The channel hopping sequence of the PAN.
#[derive(Debug, Clone, Default)]
pub struct HoppingSequence {
    channels: Vec<u16, 16>,
}

impl HoppingSequence {
    /// Create a hopping sequence from a list of channels.
    pub fn new(channels: &[u16]) -> Result<Self> {
        let mut sequence = Vec::new();
        sequence
            .extend_from_slice(channels)
            .map_err(|()| Error::NoMemory)?;
        Ok(Self { channels: sequence })
    }

    /// The default 16-channel sequence of the 2.4 GHz band.
    pub fn sequence_16_16() -> Self {
        Self::new(&[16, 17, 23, 18, 26, 15, 25, 22, 19, 11, 12, 13, 24, 14, 20, 21]).unwrap()
    }

    /// The default 4-channel sequence.
    pub fn sequence_4_4() -> Self {
        Self::new(&[15, 25, 26, 20]).unwrap()
    }

    /// The default 2-channel sequence.
    pub fn sequence_2_2() -> Self {
        Self::new(&[20, 25]).unwrap()
    }

    /// The single-channel sequence, which disables hopping.
    pub fn sequence_1_1() -> Self {
        Self::new(&[20]).unwrap()
    }

    /// Returns `true` when the sequence holds no channels.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// The number of channels in the sequence.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// The channels of the sequence.
    pub fn channels(&self) -> &[u16] {
        &self.channels
    }

    /// The channel a link uses in the given slot:
    /// `sequence[(asn + channel_offset) mod len]`.
    pub fn channel(&self, asn: Asn, channel_offset: u16) -> Option<u16> {
        if self.channels.is_empty() {
            return None;
        }

        let index = (asn.as_u64() + channel_offset as u64) % self.channels.len() as u64;
        Some(self.channels[index as usize])
    }
}

/// The outcome of link selection: the slot to operate and how far away it
/// is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSlot {
    /// The handle of the primary link.
    pub link_handle: u16,
    /// The handle of the backup RX link sharing the slot, if any.
    pub backup_handle: Option<u16>,
    /// The distance to the slot, in timeslots, from the ASN the selection
    /// ran at.
    pub offset: u16,
}

/// The schedule of an interface: up to `S` slotframes of up to `L` links
/// each.
#[derive(Debug, Default)]
pub struct TschSchedule<const S: usize, const L: usize> {
    slotframes: Vec<TschSlotframe<L>, S>,
}

impl<const S: usize, const L: usize> TschSchedule<S, L> {
    /// Create an empty schedule.
    pub const fn new() -> Self {
        Self {
            slotframes: Vec::new(),
        }
    }

    /// The slotframes of the schedule, in handle order.
    pub fn slotframes(&self) -> &[TschSlotframe<L>] {
        &self.slotframes
    }

    /// Look up a slotframe by handle.
    pub fn slotframe(&self, handle: u8) -> Option<&TschSlotframe<L>> {
        self.slotframes.iter().find(|s| s.handle == handle)
    }

    /// Look up a link by its globally unique handle.
    pub fn link(&self, handle: u16) -> Option<&TschLink> {
        self.slotframes
            .iter()
            .flat_map(|s| s.links().iter())
            .find(|l| l.handle == handle)
    }

    /// Install or replace a slotframe, returning the replaced one.
    ///
    /// Replacing a slotframe drops its links; the caller owns the
    /// returned value and can migrate them.
    pub fn set_slotframe(
        &mut self,
        handle: u8,
        size: u16,
        advertise: bool,
    ) -> Result<Option<TschSlotframe<L>>> {
        if size == 0 {
            return Err(Error::Invalid);
        }

        let replaced = match self.slotframes.iter().position(|s| s.handle == handle) {
            Some(index) => Some(self.slotframes.remove(index)),
            None => None,
        };

        let index = self
            .slotframes
            .iter()
            .position(|s| s.handle > handle)
            .unwrap_or(self.slotframes.len());

        self.slotframes
            .insert(index, TschSlotframe::new(handle, size, advertise))
            .map_err(|_| Error::NoMemory)?;

        Ok(replaced)
    }

    /// Remove a slotframe, returning it.
    pub fn remove_slotframe(&mut self, handle: u8) -> Option<TschSlotframe<L>> {
        let index = self.slotframes.iter().position(|s| s.handle == handle)?;
        Some(self.slotframes.remove(index))
    }

    /// Install or replace a link, returning the replaced one.
    ///
    /// The link handle is unique across slotframes: installing a handle
    /// that lives in another slotframe moves it. A link must be able to
    /// do something (`tx` or `rx`), its timeslot must fit its slotframe,
    /// and the slotframe must exist.
    pub fn set_link(&mut self, link: TschLink) -> Result<Option<TschLink>> {
        if !link.is_tx() && !link.is_rx() {
            return Err(Error::Invalid);
        }

        let slotframe = self
            .slotframes
            .iter()
            .find(|s| s.handle == link.slotframe_handle)
            .ok_or(Error::Invalid)?;

        if link.timeslot >= slotframe.size {
            return Err(Error::Invalid);
        }

        // Uniqueness across slotframes: take an existing assignment of
        // the handle out first, wherever it lives.
        let mut replaced = None;
        for slotframe in self.slotframes.iter_mut() {
            if let Some(previous) = slotframe.remove_link(link.handle) {
                replaced = Some(previous);
                break;
            }
        }

        let slotframe = self
            .slotframes
            .iter_mut()
            .find(|s| s.handle == link.slotframe_handle)
            .expect("slotframe existence checked above");

        slotframe.insert_link(link)?;

        Ok(replaced)
    }

    /// Remove a link by handle, returning it.
    pub fn remove_link(&mut self, handle: u16) -> Option<TschLink> {
        for slotframe in self.slotframes.iter_mut() {
            if let Some(link) = slotframe.remove_link(handle) {
                return Some(link);
            }
        }
        None
    }

    /// Returns `true` when no slotframe carries a link.
    pub fn is_empty(&self) -> bool {
        self.slotframes.iter().all(|s| s.links().is_empty())
    }

    /// Select the link to operate at or after `asn`.
    ///
    /// For every slotframe the distance of each link to the current
    /// timeslot is computed modulo the slotframe size; the link with the
    /// smallest distance wins, ties broken by the link comparator:
    ///
    /// 1. a TX link beats an RX-only link;
    /// 2. among links of the same polarity, the lower slotframe handle;
    /// 3. among links of the same neighbor, or RX-only links, the lower
    ///    link handle;
    /// 4. among TX links of different neighbors, the deeper TX queue,
    ///    then the lower link handle.
    ///
    /// The backup is the RX link with the lowest slotframe handle in the
    /// winning slot, so the slot can still receive when the primary TX
    /// link turns out to have nothing to send.
    pub fn next_active_link<F>(&self, asn: Asn, queue_depth: F) -> Option<ActiveSlot>
    where
        F: Fn(&Address) -> usize,
    {
        let mut best: Option<(u16, &TschLink)> = None;

        for slotframe in self.slotframes.iter() {
            let current = asn.slot_in_frame(slotframe.size);

            for link in slotframe.links() {
                let offset = ((link.timeslot as u32 + slotframe.size as u32 - current as u32)
                    % slotframe.size as u32) as u16;

                match best {
                    Some((best_offset, _)) if offset > best_offset => {}
                    Some((best_offset, best_link)) if offset == best_offset => {
                        if Self::beats(link, best_link, &queue_depth) {
                            best = Some((offset, link));
                        }
                    }
                    _ => best = Some((offset, link)),
                }
            }
        }

        let (offset, primary) = best?;

        let backup = self
            .slotframes
            .iter()
            .flat_map(|slotframe| {
                let current = asn.slot_in_frame(slotframe.size);
                slotframe
                    .links()
                    .iter()
                    .filter(move |link| {
                        ((link.timeslot as u32 + slotframe.size as u32 - current as u32)
                            % slotframe.size as u32) as u16
                            == offset
                    })
            })
            .filter(|link| link.is_rx() && link.handle != primary.handle)
            .min_by_key(|link| (link.slotframe_handle, link.handle));

        Some(ActiveSlot {
            link_handle: primary.handle,
            backup_handle: backup.map(|link| link.handle),
            offset,
        })
    }

    /// The link comparator: `true` when `a` wins the slot over `b`.
    fn beats<F>(a: &TschLink, b: &TschLink, queue_depth: &F) -> bool
    where
        F: Fn(&Address) -> usize,
    {
        if a.is_tx() != b.is_tx() {
            return a.is_tx();
        }

        if a.slotframe_handle != b.slotframe_handle {
            return a.slotframe_handle < b.slotframe_handle;
        }

        if !a.is_tx() || a.node_address == b.node_address {
            return a.handle < b.handle;
        }

        let (depth_a, depth_b) = (queue_depth(&a.node_address), queue_depth(&b.node_address));
        if depth_a != depth_b {
            return depth_a > depth_b;
        }

        a.handle < b.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx_link(handle: u16, slotframe: u8, timeslot: u16, node: Address) -> TschLink {
        TschLink {
            handle,
            slotframe_handle: slotframe,
            timeslot,
            channel_offset: 0,
            node_address: node,
            options: TschLinkOption::Tx,
            link_type: TschLinkType::Normal,
        }
    }

    fn rx_link(handle: u16, slotframe: u8, timeslot: u16) -> TschLink {
        TschLink {
            handle,
            slotframe_handle: slotframe,
            timeslot,
            channel_offset: 0,
            node_address: Address::BROADCAST,
            options: TschLinkOption::Rx,
            link_type: TschLinkType::Normal,
        }
    }

    #[test]
    fn slotframes_stay_sorted() {
        let mut schedule = TschSchedule::<4, 8>::new();
        schedule.set_slotframe(2, 7, false).unwrap();
        schedule.set_slotframe(0, 13, true).unwrap();
        schedule.set_slotframe(1, 101, false).unwrap();

        let handles: std::vec::Vec<u8> =
            schedule.slotframes().iter().map(|s| s.handle).collect();
        assert_eq!(handles, [0, 1, 2]);
    }

    #[test]
    fn replacing_returns_the_predecessor() {
        let mut schedule = TschSchedule::<4, 8>::new();
        assert!(schedule.set_slotframe(0, 13, false).unwrap().is_none());

        let replaced = schedule.set_slotframe(0, 17, true).unwrap().unwrap();
        assert_eq!(replaced.size, 13);
        assert_eq!(schedule.slotframe(0).unwrap().size, 17);
    }

    #[test]
    fn links_sorted_by_timeslot_then_handle() {
        let mut schedule = TschSchedule::<4, 8>::new();
        schedule.set_slotframe(0, 13, false).unwrap();

        schedule
            .set_link(tx_link(3, 0, 5, Address::BROADCAST))
            .unwrap();
        schedule
            .set_link(tx_link(1, 0, 2, Address::BROADCAST))
            .unwrap();
        schedule
            .set_link(rx_link(2, 0, 5))
            .unwrap();

        let order: std::vec::Vec<(u16, u16)> = schedule
            .slotframe(0)
            .unwrap()
            .links()
            .iter()
            .map(|l| (l.timeslot, l.handle))
            .collect();
        assert_eq!(order, [(2, 1), (5, 2), (5, 3)]);
    }

    #[test]
    fn link_handles_are_globally_unique() {
        let mut schedule = TschSchedule::<4, 8>::new();
        schedule.set_slotframe(0, 13, false).unwrap();
        schedule.set_slotframe(1, 7, false).unwrap();

        schedule
            .set_link(tx_link(1, 0, 2, Address::BROADCAST))
            .unwrap();

        // Reinstalling handle 1 in another slotframe moves it.
        let replaced = schedule
            .set_link(tx_link(1, 1, 3, Address::BROADCAST))
            .unwrap()
            .unwrap();
        assert_eq!(replaced.slotframe_handle, 0);
        assert!(schedule.slotframe(0).unwrap().links().is_empty());
        assert_eq!(schedule.link(1).unwrap().slotframe_handle, 1);
    }

    #[test]
    fn link_must_do_something() {
        let mut schedule = TschSchedule::<4, 8>::new();
        schedule.set_slotframe(0, 13, false).unwrap();

        let mut link = tx_link(0, 0, 0, Address::BROADCAST);
        link.options = TschLinkOption::Shared;
        assert_eq!(schedule.set_link(link).unwrap_err(), Error::Invalid);
    }

    #[test]
    fn link_timeslot_must_fit() {
        let mut schedule = TschSchedule::<4, 8>::new();
        schedule.set_slotframe(0, 13, false).unwrap();

        assert_eq!(
            schedule
                .set_link(tx_link(0, 0, 13, Address::BROADCAST))
                .unwrap_err(),
            Error::Invalid
        );
    }

    #[test]
    fn selection_walks_the_slotframe() {
        // The schedule of the end-to-end scenario: one slotframe of 13
        // slots, a TX link at slot 0 and an RX link at slot 1.
        let mut schedule = TschSchedule::<4, 8>::new();
        schedule.set_slotframe(0, 13, false).unwrap();
        schedule
            .set_link(tx_link(0, 0, 0, Address::BROADCAST))
            .unwrap();
        schedule.set_link(rx_link(1, 0, 1)).unwrap();

        let hopping = HoppingSequence::sequence_4_4();
        assert_eq!(hopping.channels(), &[15, 25, 26, 20]);
        let hopping = HoppingSequence::new(&[20, 25, 26, 15]).unwrap();

        // At ASN 0 the TX link is due now.
        let slot = schedule
            .next_active_link(Asn::new(0), |_| 0)
            .unwrap();
        assert_eq!(slot.link_handle, 0);
        assert_eq!(slot.offset, 0);
        assert_eq!(hopping.channel(Asn::new(0), 0), Some(20));

        // One slot later the RX link wins.
        let slot = schedule
            .next_active_link(Asn::new(1), |_| 0)
            .unwrap();
        assert_eq!(slot.link_handle, 1);
        assert_eq!(slot.offset, 0);
        assert_eq!(hopping.channel(Asn::new(1), 0), Some(25));

        // Between slots 2 and 12 nothing is scheduled; the TX link is
        // eleven slots away from ASN 2.
        let slot = schedule
            .next_active_link(Asn::new(2), |_| 0)
            .unwrap();
        assert_eq!(slot.link_handle, 0);
        assert_eq!(slot.offset, 11);
    }

    #[test]
    fn tx_beats_rx_in_the_same_slot() {
        let mut schedule = TschSchedule::<4, 8>::new();
        schedule.set_slotframe(0, 13, false).unwrap();
        schedule.set_link(rx_link(0, 0, 4)).unwrap();
        schedule
            .set_link(tx_link(1, 0, 4, Address::from_short(0x0001)))
            .unwrap();

        let slot = schedule
            .next_active_link(Asn::new(4), |_| 1)
            .unwrap();
        assert_eq!(slot.link_handle, 1);
        // The RX link backs the slot up.
        assert_eq!(slot.backup_handle, Some(0));
    }

    #[test]
    fn deeper_queue_wins_between_neighbors() {
        let a = Address::from_short(0x000a);
        let b = Address::from_short(0x000b);

        let mut schedule = TschSchedule::<4, 8>::new();
        schedule.set_slotframe(0, 13, false).unwrap();
        schedule.set_link(tx_link(0, 0, 4, a)).unwrap();
        schedule.set_link(tx_link(1, 0, 4, b)).unwrap();

        let slot = schedule
            .next_active_link(Asn::new(4), |addr| {
                if *addr == b {
                    3
                } else {
                    1
                }
            })
            .unwrap();
        assert_eq!(slot.link_handle, 1);

        // Equal depths fall back to the link handle.
        let slot = schedule.next_active_link(Asn::new(4), |_| 1).unwrap();
        assert_eq!(slot.link_handle, 0);
    }

    #[test]
    fn lower_slotframe_handle_wins_across_slotframes() {
        let mut schedule = TschSchedule::<4, 8>::new();
        schedule.set_slotframe(0, 13, false).unwrap();
        schedule.set_slotframe(1, 13, false).unwrap();
        schedule
            .set_link(tx_link(7, 1, 4, Address::BROADCAST))
            .unwrap();
        schedule
            .set_link(tx_link(9, 0, 4, Address::BROADCAST))
            .unwrap();

        let slot = schedule.next_active_link(Asn::new(4), |_| 0).unwrap();
        assert_eq!(slot.link_handle, 9);
    }

    #[test]
    fn empty_hopping_sequence_yields_no_channel() {
        let hopping = HoppingSequence::default();
        assert!(hopping.is_empty());
        assert_eq!(hopping.channel(Asn::new(0), 0), None);
    }

    #[test]
    fn hopping_wraps_with_offset() {
        let hopping = HoppingSequence::new(&[20, 25, 26, 15]).unwrap();
        assert_eq!(hopping.channel(Asn::new(2), 3), Some(25));
        assert_eq!(hopping.channel(Asn::new(6), 2), Some(20));
    }
}
