use crate::*;

#[test]
fn parse_immediate_ack() {
    let frame = [0x02, 0x00, 0x2a];

    let frame = Frame::new(&frame[..]).unwrap();
    assert!(matches!(frame, Frame::Ack(_)));

    let fc = frame.frame_control();
    assert_eq!(fc.frame_type(), FrameType::Ack);
    assert_eq!(fc.frame_version(), FrameVersion::Ieee802154_2003);
    assert!(!fc.security_enabled());
    assert!(!fc.sequence_number_suppression());

    assert_eq!(frame.sequence_number(), Some(0x2a));
    assert!(frame.addressing().is_none());
    assert!(frame.payload().is_none());
}

#[test]
fn immediate_ack_wrong_length() {
    assert!(Frame::new(&[0x02, 0x00][..]).is_err());
    assert!(Frame::new(&[0x02, 0x00, 0x2a, 0x00][..]).is_err());
}

#[test]
fn parse_enhanced_ack() {
    let frame = hex::decode("022e37cdab02000200020002000200020fe18f").unwrap();

    let frame = Frame::new(&frame[..]).unwrap();
    assert!(matches!(frame, Frame::EnhancedAck(_)));

    let fc = frame.frame_control();
    assert_eq!(fc.frame_type(), FrameType::Ack);
    assert_eq!(fc.frame_version(), FrameVersion::Ieee802154_2020);
    assert!(fc.information_elements_present());

    assert_eq!(frame.sequence_number(), Some(0x37));

    let addressing = frame.addressing().unwrap();
    assert_eq!(addressing.dst_pan_id(), Some(0xabcd));
    assert_eq!(
        addressing.dst_address(),
        Some(Address::Extended([
            0x00, 0x02, 0x00, 0x02, 0x00, 0x02, 0x00, 0x02
        ]))
    );

    // One Time Correction header IE.
    let ie = frame.information_elements().unwrap();
    let mut headers = ie.header_information_elements();
    let tc = headers.next().unwrap();
    assert_eq!(tc.element_id(), HeaderElementId::TimeCorrection);
    let tc = TimeCorrection::new(tc.content()).unwrap();
    assert_eq!(tc.time_correction(), crate::time::Duration::from_us(-31));
    assert!(tc.nack());
}

#[test]
fn enhanced_ack_without_addressing() {
    // Sequence number suppressed, no addresses, a single Time Correction
    // header IE.
    let frame = [0x02, 0x23, 0x02, 0x0f, 0x01, 0x00];

    let frame = Frame::new(&frame[..]).unwrap();
    let Frame::EnhancedAck(_) = frame else {
        panic!("expected an enhanced ack");
    };
}
