//! Acknowledgment frames: immediate ACKs, enhanced ACKs with time
//! correction, and the wait-for-ACK timeout.

use embedded_hal_async::delay::DelayNs;
use mac154_frame::time::Duration;
use mac154_frame::{
    Frame, FrameBuilder, HeaderInformationElementRepr, TimeCorrection, TimeCorrectionRepr,
};

use super::constants::{MAC_AIFS_PERIOD, MAC_SIFS_PERIOD};
use super::{Error, Result};
use crate::phy::FrameBuffer;
use crate::sync::channel::Receiver;
use crate::sync::{select::select, Either};

/// Create a 3-octet immediate acknowledgment for the given sequence
/// number.
pub fn create_imm_ack(sequence_number: u8) -> FrameBuffer {
    let repr = FrameBuilder::new_imm_ack(sequence_number)
        .finalize()
        .expect("an immediate acknowledgment is always buildable");

    let mut frame = FrameBuffer::default();
    frame.len = repr.buffer_len();
    repr.emit(&mut frame.buffer[..frame.len]);
    frame
}

/// Create an enhanced acknowledgment carrying a Time Correction header
/// IE (IEEE 802.15.4-2020 §7.4.2.7).
///
/// `time_correction` is the measured offset of the acknowledged frame in
/// microseconds; `is_ack` clear sets the NACK flag, telling the peer the
/// frame was heard but not accepted. The correction must fit the signed
/// 12-bit field, [-2048, 2047] microseconds.
pub fn create_enh_ack(
    sequence_number: Option<u8>,
    is_ack: bool,
    time_correction: Duration,
) -> Result<FrameBuffer> {
    if time_correction.as_us() < TimeCorrection::<&[u8]>::MIN_CORRECTION_US
        || time_correction.as_us() > TimeCorrection::<&[u8]>::MAX_CORRECTION_US
    {
        return Err(Error::Invalid);
    }

    let mut builder = FrameBuilder::new_enhanced_ack().add_header_information_element(
        HeaderInformationElementRepr::TimeCorrection(TimeCorrectionRepr {
            time_correction,
            nack: !is_ack,
        }),
    );

    if let Some(sequence_number) = sequence_number {
        builder = builder.set_sequence_number(sequence_number);
    }

    let repr = builder.finalize().map_err(Error::from)?;

    let mut frame = FrameBuffer::default();
    frame.len = repr.buffer_len();
    repr.emit(&mut frame.buffer[..frame.len]);
    Ok(frame)
}

/// Whether a received frame must be acknowledged with an immediate ACK,
/// and with which sequence number.
pub fn imm_ack_for(frame: &Frame<&[u8]>) -> Option<u8> {
    match frame {
        Frame::Data(data) if data.mpdu().frame_control().ack_request() => {
            data.mpdu().sequence_number()
        }
        Frame::MacCommand(command) if command.frame_control().ack_request() => {
            command.mpdu().sequence_number()
        }
        _ => None,
    }
}

/// How long to wait for an acknowledgment before declaring the
/// transmission unacknowledged: the acknowledgment interframe spacing,
/// the ACK airtime at 250 kb/s, and a SIFS of guard.
pub fn ack_wait_duration() -> Duration {
    // An immediate ACK is 3 octets plus 6 octets of PHY overhead,
    // 288 us at 250 kb/s.
    MAC_AIFS_PERIOD + MAC_SIFS_PERIOD + Duration::from_us(288)
}

/// Wait for the acknowledgment of a transmitted sequence number.
///
/// Frames arriving on `rx` that are not the matching acknowledgment are
/// discarded; the wait gives up after [`ack_wait_duration`]. Returns
/// `true` when the acknowledgment arrived in time.
pub async fn wait_for_ack<TIMER: DelayNs>(
    rx: &Receiver<'_, FrameBuffer>,
    timer: &mut TIMER,
    sequence_number: u8,
) -> bool {
    let deadline = timer.delay_us(ack_wait_duration().as_us() as u32);

    let matching_ack = async {
        loop {
            let frame = rx.receive().await;
            let Ok(Frame::Ack(ack)) = Frame::new(frame.frame()) else {
                continue;
            };
            if ack.sequence_number() == sequence_number {
                break;
            }
        }
    };

    matches!(select(matching_ack, deadline).await, Either::First(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mac154_frame::{FrameType, HeaderElementId};

    #[test]
    fn imm_ack_wire_format() {
        let frame = create_imm_ack(0x2a);
        assert_eq!(frame.frame(), &[0x02, 0x00, 0x2a]);
    }

    #[test]
    fn imm_ack_parses_back() {
        let frame = create_imm_ack(0x2a);
        let parsed = Frame::new(frame.frame()).unwrap();
        assert_eq!(parsed.frame_control().frame_type(), FrameType::Ack);
        assert_eq!(parsed.sequence_number(), Some(0x2a));
    }

    #[test]
    fn enh_ack_carries_time_correction() {
        let frame = create_enh_ack(None, true, Duration::from_us(1)).unwrap();
        let parsed = Frame::new(frame.frame()).unwrap();

        let Frame::EnhancedAck(ack) = &parsed else {
            panic!("expected an enhanced ack");
        };

        let ie = ack.mpdu().information_elements().unwrap();
        let tc = ie
            .header_information_elements()
            .find(|ie| ie.element_id() == HeaderElementId::TimeCorrection)
            .unwrap();
        let tc = TimeCorrection::new(tc.content()).unwrap();
        assert_eq!(tc.time_correction(), Duration::from_us(1));
        assert!(!tc.nack());

        // The twelve-bit field holds +1.
        assert_eq!(&frame.frame()[frame.len - 2..], &[0x01, 0x00]);
    }

    #[test]
    fn enh_nack_sets_the_flag() {
        let frame = create_enh_ack(None, false, Duration::from_us(-300)).unwrap();
        let parsed = Frame::new(frame.frame()).unwrap();

        let Frame::EnhancedAck(ack) = &parsed else {
            panic!("expected an enhanced ack");
        };

        let ie = ack.mpdu().information_elements().unwrap();
        let tc = ie.header_information_elements().next().unwrap();
        let tc = TimeCorrection::new(tc.content()).unwrap();
        assert_eq!(tc.time_correction(), Duration::from_us(-300));
        assert!(tc.nack());
    }

    #[test]
    fn out_of_range_correction_is_rejected() {
        assert_eq!(
            create_enh_ack(None, true, Duration::from_us(2048)).unwrap_err(),
            Error::Invalid
        );
        assert_eq!(
            create_enh_ack(None, true, Duration::from_us(-2049)).unwrap_err(),
            Error::Invalid
        );
        assert!(create_enh_ack(None, true, Duration::from_us(2047)).is_ok());
        assert!(create_enh_ack(None, true, Duration::from_us(-2048)).is_ok());
    }

    #[test]
    fn wait_for_ack_matches_the_sequence_number() {
        use crate::sync::channel::Channel;
        use crate::sync::join::join;
        use pollster::FutureExt as _;

        struct NeverExpires;

        impl DelayNs for NeverExpires {
            async fn delay_ns(&mut self, _ns: u32) {
                core::future::pending::<()>().await;
            }
        }

        async {
            let mut channel = Channel::new();
            let (tx, rx) = channel.split();
            let mut timer = NeverExpires;

            let (acked, ()) = join(wait_for_ack(&rx, &mut timer, 0x2a), async {
                // A stray frame first, then the acknowledgment.
                let mut stray = FrameBuffer::default();
                stray.buffer[..3].copy_from_slice(&[0x02, 0x00, 0x11]);
                stray.len = 3;
                tx.send_async(stray).await;

                tx.send_async(create_imm_ack(0x2a)).await;
            })
            .await;

            assert!(acked);
        }
        .block_on();
    }

    #[test]
    fn wait_for_ack_times_out() {
        use crate::sync::channel::Channel;
        use crate::sync::yield_now::yield_now;
        use pollster::FutureExt as _;

        struct InstantExpiry;

        impl DelayNs for InstantExpiry {
            async fn delay_ns(&mut self, _ns: u32) {
                yield_now().await;
            }
        }

        async {
            let mut channel = Channel::<FrameBuffer>::new();
            let (_tx, rx) = channel.split();
            let mut timer = InstantExpiry;

            assert!(!wait_for_ack(&rx, &mut timer, 0x2a).await);
        }
        .block_on();
    }

    #[test]
    fn ack_requested_data_wants_imm_ack() {
        let buffer = [
            0x61, 0x88, 0x05, 0xcd, 0xab, 0xef, 0xbe, 0x34, 0x12, 0x01,
        ];
        let frame = Frame::new(&buffer[..]).unwrap();
        assert_eq!(imm_ack_for(&frame), Some(0x05));

        // Without the ack request bit, no acknowledgment.
        let buffer = [
            0x41, 0x88, 0x05, 0xcd, 0xab, 0xef, 0xbe, 0x34, 0x12, 0x01,
        ];
        let frame = Frame::new(&buffer[..]).unwrap();
        assert_eq!(imm_ack_for(&frame), None);
    }
}
