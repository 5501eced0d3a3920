//! Drive the TSCH slot loop against a simulated radio and clock.
//!
//! Run with `cargo run --example tsch`. The example installs the minimal
//! schedule (one advertising TX link, one RX link), starts the state
//! machine, and prints what the driver sees for the first few slots.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;

use mac154::mac::neighbors::TxQueue;
use mac154::mac::request::{LinkRequest, MacRequest, SlotframeRequest};
use mac154::mac::tsch::TschMode;
use mac154::mac::{MacContext, ScanState};
use mac154::phy::{
    Capabilities, CcaResult, ChannelPage, DriverConfig, FrameBuffer, RadioDriver,
};
use mac154::sync::mutex::Mutex;
use mac154::sync::select::select;
use mac154::sync::yield_now::yield_now;
use mac154::time::reference::{NetTimeReference, RadioCounter, SleepCounter};
use mac154_frame::{Address, TschLinkOption};

use embedded_hal_async::delay::DelayNs;

#[derive(Clone)]
struct SimClock {
    ns: Rc<Cell<u64>>,
    compare: Rc<Cell<Option<u64>>>,
}

impl SimClock {
    fn ticks(&self) -> u64 {
        self.ns.get() * 4 / 1000
    }

    fn compare_due(&self) -> bool {
        self.compare.get().is_some_and(|at| self.ticks() >= at)
    }
}

struct SimSleep(SimClock);

impl SleepCounter for SimSleep {
    fn frequency(&self) -> u64 {
        32_768
    }

    fn now(&self) -> u64 {
        self.0.ns.get() * 32_768 / 1_000_000_000
    }
}

struct SimRadioClock(SimClock);

impl RadioCounter for SimRadioClock {
    fn frequency(&self) -> u64 {
        4_000_000
    }

    fn start(&self) {}

    fn stop(&self) {}

    fn now(&self) -> u64 {
        self.0.ticks()
    }

    fn set_compare(&self, tick: u64) {
        self.0.compare.set(Some(tick));
    }

    fn clear_compare(&self) {
        self.0.compare.set(None);
    }
}

#[derive(Clone, Default)]
struct PrintingDriver {
    channel: Rc<Cell<u16>>,
}

impl RadioDriver for PrintingDriver {
    fn capabilities(&self) -> Capabilities {
        Capabilities::TIMED_TX | Capabilities::TIMED_RX | Capabilities::AUTO_ACK
    }

    fn set_channel(&mut self, channel: u16) -> mac154::phy::Result<()> {
        println!("radio: tune to channel {channel}");
        self.channel.set(channel);
        Ok(())
    }

    fn cca(&mut self) -> impl Future<Output = mac154::phy::Result<CcaResult>> {
        async { Ok(CcaResult::Idle) }
    }

    fn configure(&mut self, config: DriverConfig<'_>) -> mac154::phy::Result<()> {
        match config {
            DriverConfig::RxSlot {
                start, duration_ns, ..
            } => println!(
                "radio: RX window at {}us for {}us on channel {}",
                start.as_ns() / 1000,
                duration_ns / 1000,
                self.channel.get()
            ),
            DriverConfig::ExpectedRxTime(t) => {
                println!("radio: expecting a frame at {}us", t.as_ns() / 1000)
            }
            DriverConfig::EnhAckHeaderIe { .. } => {
                println!("radio: enhanced ACK template installed")
            }
        }
        Ok(())
    }

    fn send(&mut self, frame: &mut FrameBuffer) -> impl Future<Output = mac154::phy::Result<()>> {
        let at = frame.timestamp.map(|t| t.as_ns() / 1000).unwrap_or(0);
        let len = frame.len;
        let channel = self.channel.get();
        async move {
            println!("radio: TX {len} octets at {at}us on channel {channel}");
            Ok(())
        }
    }

    fn channel_page(&self) -> ChannelPage {
        ChannelPage::Oqpsk2450
    }

    fn verify_channel(&self, channel: u16) -> bool {
        (11..=26).contains(&channel)
    }

    fn supported_channel_ranges(&self) -> &[(u16, u16)] {
        &[(11, 26)]
    }
}

#[derive(Clone, Default)]
struct SimQueue {
    frames: Rc<RefCell<VecDeque<FrameBuffer>>>,
}

impl TxQueue for SimQueue {
    fn dequeue(&mut self, _neighbor: &Address) -> Option<FrameBuffer> {
        self.frames.borrow_mut().pop_front()
    }

    fn queued(&self, _neighbor: &Address) -> usize {
        self.frames.borrow().len()
    }
}

struct YieldTimer;

impl DelayNs for YieldTimer {
    async fn delay_ns(&mut self, _ns: u32) {
        yield_now().await;
    }
}

fn main() {
    env_logger::init();

    let clock = SimClock {
        ns: Rc::new(Cell::new(0)),
        compare: Rc::new(Cell::new(None)),
    };
    let reference = NetTimeReference::new(SimSleep(clock.clone()), SimRadioClock(clock.clone()));

    let mut ctx = MacContext::new();
    ctx.handle_request(MacRequest::SetPanId(0xabcd)).unwrap();
    ctx.handle_request(MacRequest::SetShortAddr(0x1234)).unwrap();
    ctx.handle_request(MacRequest::SetTschSlotframe(SlotframeRequest {
        handle: 0,
        size: 13,
        advertise: true,
    }))
    .unwrap();
    ctx.handle_request(MacRequest::SetTschLink(LinkRequest {
        handle: 0,
        slotframe_handle: 0,
        timeslot: 0,
        channel_offset: 0,
        node_address: Address::BROADCAST,
        options: TschLinkOption::Tx,
        advertising: false,
    }))
    .unwrap();
    ctx.handle_request(MacRequest::SetTschLink(LinkRequest {
        handle: 1,
        slotframe_handle: 0,
        timeslot: 1,
        channel_offset: 0,
        node_address: Address::BROADCAST,
        options: TschLinkOption::Rx | TschLinkOption::TimeKeeping,
        advertising: false,
    }))
    .unwrap();
    let mut channels = heapless::Vec::new();
    channels.extend_from_slice(&[20, 25, 26, 15]).unwrap();
    ctx.handle_request(MacRequest::SetHoppingSequence(channels))
        .unwrap();

    let queue = SimQueue::default();
    let mut frame = FrameBuffer::default();
    frame.buffer[..10].copy_from_slice(&[
        0x41, 0x88, 0x01, 0xcd, 0xab, 0xff, 0xff, 0x34, 0x12, 0x2b,
    ]);
    frame.len = 10;
    queue.frames.borrow_mut().push_back(frame);
    ctx.neighbors.packet_queued(Address::BROADCAST);

    let context = Mutex::new(ctx);
    let scan = Mutex::new(ScanState::default());
    let driver = PrintingDriver::default();

    let mut tsch = TschMode::new(
        &context,
        &scan,
        driver,
        &reference,
        YieldTimer,
        queue,
    );

    pollster::block_on(async {
        tsch.tsch_mode_on().await.unwrap();

        let clock_driver = async {
            // Simulate 50 ms, five timeslots.
            for _ in 0..5000 {
                clock.ns.set(clock.ns.get() + 10_000);
                if clock.compare_due() {
                    reference.on_compare();
                }
                yield_now().await;
            }
            scan.lock().await.tsch_mode = false;
        };

        let _ = select(tsch.run(), clock_driver).await;
    });

    println!("done");
}
