//! Time-Slotted Channel Hopping.
//!
//! TSCH replaces contention with a global schedule: time is divided into
//! timeslots, counted by the network-wide Absolute Slot Number, and every
//! slot either transmits to a neighbor, listens for one, or sleeps. The
//! channel changes every slot by indexing the hopping sequence with the
//! ASN.
//!
//! One cooperative task per interface owns all TSCH behavior: the
//! [`TschMode`] service. Its loop is tickless: it asks the schedule for
//! the next active link, sleeps on the network time reference until the
//! slot starts, and operates the link with timed radio operations. Time
//! flows back in through enhanced acknowledgments: the receiver measures
//! the arrival offset of each frame and returns it as a Time Correction
//! IE, and frames arriving on a timekeeping link discipline the local
//! clock.

pub mod asn;
pub mod schedule;

pub use asn::Asn;
pub use schedule::{
    ActiveSlot, HoppingSequence, TschLink, TschLinkType, TschSchedule, TschSlotframe,
};

use embedded_hal_async::delay::DelayNs;
use mac154_frame::{Address, TschTimeslotTimings};

use crate::mac::beacon::create_enhanced_beacon;
use crate::mac::neighbors::TxQueue;
use crate::mac::pib::DeviceRole;
use crate::mac::{Error, MacContext, Result, ScanState};
use crate::phy::{Capabilities, DriverConfig, RadioDriver};
use crate::sync::mutex::Mutex;
use crate::time::{NetTime, NetTimeApi, Rounding};

/// How often the state machine re-checks the association state while
/// waiting for it.
const ASSOCIATION_POLL_MS: u32 = 1000;

/// The per-interface TSCH state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TschState {
    /// TSCH is not running.
    #[default]
    Off,
    /// TSCH is on, waiting for the interface to associate.
    WaitingForAssociation,
    /// The slot loop is running.
    Operating,
}

impl TschState {
    /// Returns `true` unless the mode is off.
    pub fn is_on(&self) -> bool {
        !matches!(self, TschState::Off)
    }
}

/// The slot currently armed on the radio, kept for correlating incoming
/// frames to their link.
#[derive(Debug, Clone, Copy)]
pub struct CurrentSlot {
    /// The handle of the operated link.
    pub link_handle: u16,
    /// Whether the slot listens.
    pub is_rx: bool,
    /// The neighbor of the link.
    pub node_address: Address,
    /// Whether frames of this slot discipline the local clock.
    pub timekeeping: bool,
    /// The hopped channel of the slot.
    pub channel: u16,
    /// When the incoming frame is expected, for the time correction.
    pub expected_rx_time: Option<NetTime>,
}

/// The TSCH sub-context, owned by the [`MacContext`].
pub struct TschContext {
    /// The mode state.
    pub mode: TschState,
    /// The absolute slot number of the next scheduled slot.
    pub asn: Asn,
    /// The slotframe and link tables.
    pub schedule: TschSchedule<4, 8>,
    /// The channel hopping sequence.
    pub hopping: HoppingSequence,
    /// The timeslot timing template in use.
    pub timings: TschTimeslotTimings,
    /// The join metric advertised in enhanced beacons.
    pub join_metric: u8,
    /// The slot the radio is currently armed for.
    pub current_slot: Option<CurrentSlot>,
}

impl TschContext {
    /// Create an idle TSCH sub-context with the default 2.4 GHz timeslot
    /// template and an empty schedule.
    pub fn new() -> Self {
        Self {
            mode: TschState::Off,
            asn: Asn::ZERO,
            schedule: TschSchedule::new(),
            hopping: HoppingSequence::default(),
            timings: TschTimeslotTimings::default(),
            join_metric: 1,
            current_slot: None,
        }
    }
}

impl Default for TschContext {
    fn default() -> Self {
        Self::new()
    }
}

/// The verdict of [`handle_rx`] on an incoming frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxVerdict {
    /// Process the frame further.
    Continue,
    /// Drop the frame.
    Drop,
}

/// Correlate an incoming frame to the armed RX slot and compute its time
/// correction.
///
/// Called from the driver RX path with the captured frame timestamp.
/// Frames arriving outside an RX slot, or from a neighbor other than the
/// link's, are dropped. The returned correction, in microseconds rounded
/// to nearest, is what the enhanced acknowledgment carries back to the
/// sender; a frame on a timekeeping link additionally feeds the local
/// clock discipline.
pub fn handle_rx<NT: NetTimeApi>(
    context: &Mutex<MacContext>,
    time: &NT,
    src_address: &Address,
    pkt_timestamp: NetTime,
) -> Result<(RxVerdict, i16)> {
    // The RX path must not wait on the slot loop.
    let Some(ctx) = context.try_lock() else {
        return Err(Error::Busy);
    };

    let Some(slot) = ctx.tsch.current_slot else {
        return Ok((RxVerdict::Drop, 0));
    };

    if !slot.is_rx {
        return Ok((RxVerdict::Drop, 0));
    }

    if !slot.node_address.is_broadcast() && *src_address != slot.node_address {
        return Ok((RxVerdict::Drop, 0));
    }

    let Some(expected) = slot.expected_rx_time else {
        return Ok((RxVerdict::Drop, 0));
    };

    let correction_ns = expected - pkt_timestamp;
    let correction_us = if correction_ns >= 0 {
        (correction_ns + 500) / 1000
    } else {
        (correction_ns - 500) / 1000
    };

    if slot.timekeeping {
        let timepoint = time.timepoint_from_time(pkt_timestamp, Rounding::Nearest);
        time.syntonize(expected, timepoint);
    }

    Ok((RxVerdict::Continue, correction_us as i16))
}

/// The TSCH state machine: one cooperative task owning all TSCH behavior
/// of an interface.
pub struct TschMode<'a, D, NT, TIMER, Q> {
    context: &'a Mutex<MacContext>,
    scan: &'a Mutex<ScanState>,
    driver: D,
    time: &'a NT,
    timer: TIMER,
    tx_queue: Q,
    /// The channel the radio is tuned to, to skip redundant retunes.
    current_channel: Option<u16>,
    /// Whether a single CCA guards TSCH transmissions.
    pub cca_enabled: bool,
}

impl<'a, D, NT, TIMER, Q> TschMode<'a, D, NT, TIMER, Q>
where
    D: RadioDriver,
    NT: NetTimeApi,
    TIMER: DelayNs,
    Q: TxQueue,
{
    /// Create the TSCH service for an interface.
    pub fn new(
        context: &'a Mutex<MacContext>,
        scan: &'a Mutex<ScanState>,
        driver: D,
        time: &'a NT,
        timer: TIMER,
        tx_queue: Q,
    ) -> Self {
        Self {
            context,
            scan,
            driver,
            time,
            timer,
            tx_queue,
            current_channel: None,
            cca_enabled: false,
        }
    }

    /// Turn TSCH mode on.
    ///
    /// Requires the driver to support timed transmission and reception;
    /// without them the slot boundaries cannot be honored and the mode is
    /// refused. A driver with automatic acknowledgment gets the default
    /// enhanced-ACK Time Correction header IE installed, so its
    /// acknowledgments carry the field the peer expects.
    pub async fn tsch_mode_on(&mut self) -> Result<()> {
        let capabilities = self.driver.capabilities();
        if !capabilities.contains(Capabilities::TIMED_TX | Capabilities::TIMED_RX) {
            return Err(Error::NotSupported);
        }

        {
            let mut scan = self.scan.lock().await;
            if scan.tsch_mode {
                return Err(Error::Busy);
            }
            scan.tsch_mode = true;
        }

        if capabilities.contains(Capabilities::AUTO_ACK) {
            // An empty Time Correction IE template; the driver fills the
            // correction per acknowledged frame.
            let ie = [0x02, 0x0f, 0x00, 0x00];
            let ctx = self.context.lock().await;
            let short_addr = ctx.pib.short_address;
            let ext_addr = ctx.pib.extended_address.unwrap_or([0u8; 8]);
            drop(ctx);

            self.driver
                .configure(DriverConfig::EnhAckHeaderIe {
                    ie: &ie,
                    short_addr,
                    ext_addr,
                })
                .map_err(Error::from)?;
        }

        self.context.lock().await.tsch.mode = TschState::WaitingForAssociation;
        Ok(())
    }

    /// Turn TSCH mode off.
    ///
    /// The flag flips under the scan lock; the state machine observes it
    /// after its current slot or association wait and unwinds. A pending
    /// transmission is not cancelled, and an armed RX slot expires on its
    /// own.
    pub async fn tsch_mode_off(&mut self) {
        self.scan.lock().await.tsch_mode = false;
    }

    async fn mode_requested(&self) -> bool {
        self.scan.lock().await.tsch_mode
    }

    /// Run the TSCH task until the mode is turned off.
    pub async fn run(&mut self) {
        loop {
            if !self.mode_requested().await {
                let mut ctx = self.context.lock().await;
                ctx.tsch.mode = TschState::Off;
                ctx.tsch.current_slot = None;
                return;
            }

            let associated = self.context.lock().await.pib.is_associated();
            if !associated {
                self.context.lock().await.tsch.mode = TschState::WaitingForAssociation;
                self.timer.delay_ms(ASSOCIATION_POLL_MS).await;
                continue;
            }

            self.operate().await;
        }
    }

    /// The operating state: the tickless slot loop.
    async fn operate(&mut self) {
        self.time.counter_wake_up();

        let mut slot_start = self.time.now();
        self.context.lock().await.tsch.mode = TschState::Operating;

        loop {
            if !self.mode_requested().await {
                break;
            }

            let selection = {
                let mut ctx = self.context.lock().await;

                if !ctx.pib.is_associated() {
                    break;
                }

                let active = ctx
                    .tsch
                    .schedule
                    .next_active_link(ctx.tsch.asn, |addr| ctx.neighbors.queue_depth(addr));

                match active {
                    Some(active) => {
                        // The ASN advances exactly once per scheduled
                        // slot, to the slot about to be operated.
                        ctx.tsch.asn = ctx.tsch.asn.wrapping_add(active.offset as u64);
                        let dt_ns = active.offset as i64
                            * ctx.tsch.timings.timeslot_length().as_us()
                            * 1000;
                        Some((active, dt_ns))
                    }
                    None => None,
                }
            };

            let Some((active, dt_ns)) = selection else {
                error!("TSCH: schedule has no links, idling one slotframe");
                let idle_ns = {
                    let ctx = self.context.lock().await;
                    ctx.tsch.timings.timeslot_length().as_us() * 1000 * 10
                };
                slot_start = slot_start + idle_ns;
                self.time.wait_until(slot_start).await;
                continue;
            };

            // Sleep to the slot with every lock released.
            slot_start = slot_start + dt_ns;
            self.time.wait_until(slot_start).await;

            self.operate_link(&active, slot_start).await;

            // One slot has elapsed once it has been operated.
            let mut ctx = self.context.lock().await;
            ctx.tsch.asn.increment();
            ctx.tsch.current_slot = None;
            let slot_len_ns = ctx.tsch.timings.timeslot_length().as_us() * 1000;
            drop(ctx);
            slot_start = slot_start + slot_len_ns;
        }

        self.context.lock().await.tsch.current_slot = None;
        self.time.counter_may_sleep();
    }

    /// Operate one scheduled slot.
    ///
    /// Runs right after the slot timer fired, so it must not wait for the
    /// context: on contention the slot is abandoned and the loop moves to
    /// the next one.
    async fn operate_link(&mut self, active: &ActiveSlot, slot_start: NetTime) {
        // Everything needed from the context is resolved under one
        // non-blocking lock, and the radio work happens after it is
        // released.
        enum SlotAction {
            Beacon(crate::phy::FrameBuffer, u16),
            Tx(crate::phy::FrameBuffer, u16),
            Rx {
                channel: u16,
                rx_start: NetTime,
                rx_wait_ns: i64,
                auto_ack: bool,
            },
        }

        let action = {
            let Some(mut ctx) = self.context.try_lock() else {
                debug!("TSCH: context contended, abandoning slot");
                return;
            };

            let Some(link) = ctx.tsch.schedule.link(active.link_handle).cloned() else {
                debug!("TSCH: scheduled link disappeared");
                return;
            };

            let Some(channel) = ctx.tsch.hopping.channel(ctx.tsch.asn, link.channel_offset)
            else {
                error!("TSCH: empty hopping sequence, skipping slot");
                return;
            };

            let advertise =
                ctx.pib.role == DeviceRole::PanCoordinator && link.is_advertising();

            let mut tx_frame = None;
            let mut operated = link.clone();

            if advertise {
                match create_enhanced_beacon(&ctx, true) {
                    Ok(frame) => tx_frame = Some(frame),
                    Err(_) => debug!("TSCH: enhanced beacon does not fit"),
                }
            } else if link.is_tx() {
                if let Some(frame) = self.tx_queue.dequeue(&link.node_address) {
                    ctx.neighbors.packet_dequeued(&link.node_address);
                    tx_frame = Some(frame);
                }
            }

            // A TX link with nothing to send falls back to the backup RX
            // link of the slot.
            if tx_frame.is_none() && !link.is_rx() {
                let backup = active
                    .backup_handle
                    .and_then(|handle| ctx.tsch.schedule.link(handle).cloned());
                match backup {
                    Some(backup) => operated = backup,
                    None => {
                        debug!("TSCH: nothing to send and no backup link");
                        return;
                    }
                }
            }

            let timings = ctx.tsch.timings;

            if let Some(mut frame) = tx_frame {
                frame.timestamp = Some(slot_start + timings.tx_offset().as_us() * 1000);
                ctx.tsch.current_slot = Some(CurrentSlot {
                    link_handle: operated.handle,
                    is_rx: false,
                    node_address: operated.node_address,
                    timekeeping: operated.is_timekeeping(),
                    channel,
                    expected_rx_time: None,
                });

                if advertise {
                    SlotAction::Beacon(frame, channel)
                } else {
                    SlotAction::Tx(frame, channel)
                }
            } else {
                let rx_start = slot_start + timings.rx_offset().as_us() * 1000;
                let rx_wait_ns = timings.rx_wait().as_us() * 1000;
                let expected = rx_start + rx_wait_ns / 2;

                ctx.tsch.current_slot = Some(CurrentSlot {
                    link_handle: operated.handle,
                    is_rx: true,
                    node_address: operated.node_address,
                    timekeeping: operated.is_timekeeping(),
                    channel,
                    expected_rx_time: Some(expected),
                });

                SlotAction::Rx {
                    channel,
                    rx_start,
                    rx_wait_ns,
                    auto_ack: self.driver.capabilities().contains(Capabilities::AUTO_ACK),
                }
            }
        };

        match action {
            SlotAction::Beacon(mut frame, channel) | SlotAction::Tx(mut frame, channel) => {
                if self.retune(channel).is_err() {
                    return;
                }

                if self.cca_enabled {
                    // TSCH CCA is a single assessment; a busy channel
                    // aborts the slot with no backoff. Shared-link
                    // CSMA/CA is not implemented: a shared link
                    // transmits as if dedicated.
                    match self.driver.cca().await {
                        Ok(crate::phy::CcaResult::Idle) => {}
                        Ok(crate::phy::CcaResult::Busy) => {
                            debug!("TSCH: channel busy, aborting slot");
                            return;
                        }
                        Err(_) => {
                            debug!("TSCH: CCA failed, aborting slot");
                            return;
                        }
                    }
                }

                if self.driver.send(&mut frame).await.is_err() {
                    debug!("TSCH: transmission failed");
                }
            }
            SlotAction::Rx {
                channel,
                rx_start,
                rx_wait_ns,
                auto_ack,
            } => {
                if self.retune(channel).is_err() {
                    return;
                }

                if self
                    .driver
                    .configure(DriverConfig::RxSlot {
                        start: rx_start,
                        duration_ns: rx_wait_ns,
                        channel,
                    })
                    .is_err()
                {
                    debug!("TSCH: failed to arm the RX slot");
                    return;
                }

                if auto_ack {
                    let _ = self
                        .driver
                        .configure(DriverConfig::ExpectedRxTime(rx_start + rx_wait_ns / 2));
                }
            }
        }
    }

    fn retune(&mut self, channel: u16) -> Result<()> {
        if self.current_channel == Some(channel) {
            return Ok(());
        }

        match self.driver.set_channel(channel) {
            Ok(()) => {
                self.current_channel = Some(channel);
                Ok(())
            }
            Err(_) => {
                debug!("TSCH: failed to tune, skipping slot");
                Err(Error::Busy)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mac::neighbors::TxQueue;
    use crate::phy::driver::tests::{TestDriver, TestDriverEvent};
    use crate::phy::FrameBuffer;
    use crate::sync::{join::join, select::select, yield_now::yield_now, Either};
    use crate::time::reference::tests::sim_reference;
    use mac154_frame::TschLinkOption;
    use pollster::FutureExt as _;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// A timer that yields instead of sleeping, suitable for driving the
    /// association wait in tests.
    struct YieldTimer;

    impl DelayNs for YieldTimer {
        async fn delay_ns(&mut self, _ns: u32) {
            yield_now().await;
        }
    }

    #[derive(Clone, Default)]
    struct VecQueue {
        frames: Rc<RefCell<VecDeque<(Address, FrameBuffer)>>>,
    }

    impl VecQueue {
        fn push(&self, neighbor: Address, frame: FrameBuffer) {
            self.frames.borrow_mut().push_back((neighbor, frame));
        }
    }

    impl TxQueue for VecQueue {
        fn dequeue(&mut self, neighbor: &Address) -> Option<FrameBuffer> {
            let mut frames = self.frames.borrow_mut();
            let index = frames.iter().position(|(addr, _)| {
                *addr == *neighbor || neighbor.is_broadcast()
            })?;
            frames.remove(index).map(|(_, frame)| frame)
        }

        fn queued(&self, neighbor: &Address) -> usize {
            self.frames
                .borrow()
                .iter()
                .filter(|(addr, _)| *addr == *neighbor)
                .count()
        }
    }

    fn tsch_context() -> Mutex<MacContext> {
        let mut ctx = MacContext::new();
        ctx.pib.pan_id = 0xabcd;
        ctx.pib.short_address = 0x1234;
        ctx.pib.extended_address = Some([0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);

        ctx.tsch.schedule.set_slotframe(0, 13, true).unwrap();
        ctx.tsch
            .schedule
            .set_link(TschLink {
                handle: 0,
                slotframe_handle: 0,
                timeslot: 0,
                channel_offset: 0,
                node_address: Address::BROADCAST,
                options: TschLinkOption::Tx,
                link_type: TschLinkType::Normal,
            })
            .unwrap();
        ctx.tsch
            .schedule
            .set_link(TschLink {
                handle: 1,
                slotframe_handle: 0,
                timeslot: 1,
                channel_offset: 0,
                node_address: Address::BROADCAST,
                options: TschLinkOption::Rx | TschLinkOption::TimeKeeping,
                link_type: TschLinkType::Normal,
            })
            .unwrap();
        ctx.tsch.hopping = HoppingSequence::new(&[20, 25, 26, 15]).unwrap();

        Mutex::new(ctx)
    }

    #[test]
    fn mode_on_requires_timed_radio() {
        async {
            let context = tsch_context();
            let scan = Mutex::new(ScanState::default());
            let (_clock, reference) = sim_reference();
            let driver = TestDriver::new();
            driver.state.borrow_mut().capabilities = Some(Capabilities::empty());

            let mut mode = TschMode::new(
                &context,
                &scan,
                driver,
                &reference,
                YieldTimer,
                VecQueue::default(),
            );

            assert_eq!(mode.tsch_mode_on().await.unwrap_err(), Error::NotSupported);
            assert!(!scan.lock().await.tsch_mode);
        }
        .block_on();
    }

    #[test]
    fn mode_on_installs_enh_ack_template() {
        async {
            let context = tsch_context();
            let scan = Mutex::new(ScanState::default());
            let (_clock, reference) = sim_reference();
            let driver = TestDriver::new();

            let mut mode = TschMode::new(
                &context,
                &scan,
                driver.clone(),
                &reference,
                YieldTimer,
                VecQueue::default(),
            );

            mode.tsch_mode_on().await.unwrap();
            assert!(scan.lock().await.tsch_mode);
            assert_eq!(
                context.lock().await.tsch.mode,
                TschState::WaitingForAssociation
            );
            assert!(driver
                .events()
                .contains(&TestDriverEvent::EnhAckHeaderIe));
        }
        .block_on();
    }

    #[test]
    fn slot_loop_transmits_then_receives() {
        async {
            let context = tsch_context();
            let scan = Mutex::new(ScanState::default());
            let (clock, reference) = sim_reference();
            let driver = TestDriver::new();
            let queue = VecQueue::default();

            // One queued broadcast frame for the TX slot.
            let mut frame = FrameBuffer::default();
            frame.buffer[..3].copy_from_slice(&[0x01, 0x08, 0x00]);
            frame.len = 3;
            queue.push(Address::BROADCAST, frame);
            context
                .lock()
                .await
                .neighbors
                .packet_queued(Address::BROADCAST);

            let mut mode = TschMode::new(
                &context,
                &scan,
                driver.clone(),
                &reference,
                YieldTimer,
                queue.clone(),
            );
            mode.tsch_mode_on().await.unwrap();

            // Drive the loop for two slots, then turn the mode off.
            let driver_loop = async {
                for _ in 0..20_000 {
                    clock.advance_ns(10_000);
                    if clock.compare_due() {
                        reference.on_compare();
                    }
                    yield_now().await;

                    let events = driver.events();
                    let sent = events
                        .iter()
                        .any(|e| matches!(e, TestDriverEvent::Send { .. }));
                    let armed_rx = events
                        .iter()
                        .any(|e| matches!(e, TestDriverEvent::RxSlot { .. }));
                    if sent && armed_rx {
                        break;
                    }
                }
                scan.lock().await.tsch_mode = false;
            };

            match select(mode.run(), driver_loop).await {
                Either::First(_) => {}
                Either::Second(_) => {
                    // The mode flag is down; let the loop unwind.
                }
            }

            let events = driver.events();

            // The TX slot went out on the first hop, stamped at the TX
            // offset inside its slot.
            let send = events
                .iter()
                .find_map(|e| match e {
                    TestDriverEvent::Send { at_ns, frame } => Some((at_ns.unwrap(), frame.clone())),
                    _ => None,
                })
                .expect("the queued frame was sent");
            assert_eq!(send.1, &[0x01, 0x08, 0x00]);
            assert_eq!(send.0 % 10_000_000, 2_120_000);

            // The RX slot that followed hopped to the next channel and
            // declared the expected arrival mid-window.
            let rx = events.iter().find_map(|e| match e {
                TestDriverEvent::RxSlot {
                    start_ns,
                    duration_ns,
                    channel,
                } => Some((*start_ns, *duration_ns, *channel)),
                _ => None,
            });
            let (rx_start, rx_duration, rx_channel) = rx.expect("an RX slot was armed");
            assert_eq!(rx_channel, 25);
            assert_eq!(rx_duration, 2_200_000);
            assert_eq!(rx_start % 10_000_000, 1_020_000);

            assert!(events.contains(&TestDriverEvent::SetChannel(20)));
            assert!(events.contains(&TestDriverEvent::SetChannel(25)));
        }
        .block_on();
    }

    #[test]
    fn handle_rx_computes_the_time_correction() {
        async {
            let context = tsch_context();
            let (_clock, reference) = sim_reference();

            context.lock().await.tsch.current_slot = Some(CurrentSlot {
                link_handle: 1,
                is_rx: true,
                node_address: Address::BROADCAST,
                timekeeping: true,
                channel: 25,
                expected_rx_time: Some(NetTime::from_ns(1_000_000)),
            });

            let (verdict, correction) = handle_rx(
                &context,
                &reference,
                &Address::from_short(0x5678),
                NetTime::from_ns(999_400),
            )
            .unwrap();

            assert_eq!(verdict, RxVerdict::Continue);
            assert_eq!(correction, 1);
        }
        .block_on();
    }

    #[test]
    fn handle_rx_drops_outside_rx_slots() {
        async {
            let context = tsch_context();
            let (_clock, reference) = sim_reference();

            // No armed slot.
            let (verdict, _) = handle_rx(
                &context,
                &reference,
                &Address::from_short(0x5678),
                NetTime::from_ns(0),
            )
            .unwrap();
            assert_eq!(verdict, RxVerdict::Drop);

            // A TX slot.
            context.lock().await.tsch.current_slot = Some(CurrentSlot {
                link_handle: 0,
                is_rx: false,
                node_address: Address::BROADCAST,
                timekeeping: false,
                channel: 20,
                expected_rx_time: None,
            });
            let (verdict, _) = handle_rx(
                &context,
                &reference,
                &Address::from_short(0x5678),
                NetTime::from_ns(0),
            )
            .unwrap();
            assert_eq!(verdict, RxVerdict::Drop);
        }
        .block_on();
    }

    #[test]
    fn handle_rx_drops_wrong_neighbor() {
        async {
            let context = tsch_context();
            let (_clock, reference) = sim_reference();

            context.lock().await.tsch.current_slot = Some(CurrentSlot {
                link_handle: 1,
                is_rx: true,
                node_address: Address::from_short(0x0001),
                timekeeping: false,
                channel: 25,
                expected_rx_time: Some(NetTime::from_ns(1_000_000)),
            });

            let (verdict, _) = handle_rx(
                &context,
                &reference,
                &Address::from_short(0x0002),
                NetTime::from_ns(999_400),
            )
            .unwrap();
            assert_eq!(verdict, RxVerdict::Drop);

            let (verdict, _) = handle_rx(
                &context,
                &reference,
                &Address::from_short(0x0001),
                NetTime::from_ns(999_400),
            )
            .unwrap();
            assert_eq!(verdict, RxVerdict::Continue);
        }
        .block_on();
    }
}
