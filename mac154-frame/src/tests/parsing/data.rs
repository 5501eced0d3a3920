use crate::*;

#[test]
fn parse_data_frame() {
    let frame = hex::decode("41d801cdabffffc7d9b514004b12002b000000").unwrap();

    let frame = DataFrame::new(&frame[..]).unwrap();
    let mpdu = frame.mpdu();

    let fc = mpdu.frame_control();
    assert_eq!(fc.frame_type(), FrameType::Data);
    assert!(!fc.security_enabled());
    assert!(!fc.frame_pending());
    assert!(!fc.ack_request());
    assert!(fc.pan_id_compression());
    assert_eq!(fc.dst_addressing_mode(), AddressingMode::Short);
    assert_eq!(fc.src_addressing_mode(), AddressingMode::Extended);
    assert_eq!(fc.frame_version(), FrameVersion::Ieee802154_2006);

    assert_eq!(mpdu.sequence_number(), Some(1));

    let addressing = mpdu.addressing().unwrap();
    assert_eq!(addressing.dst_pan_id(), Some(0xabcd));
    assert_eq!(addressing.dst_address(), Some(Address::BROADCAST));
    assert_eq!(addressing.src_pan_id(), None);
    assert_eq!(
        addressing.src_address(),
        Some(Address::Extended([
            0x00, 0x12, 0x4b, 0x00, 0x14, 0xb5, 0xd9, 0xc7
        ]))
    );

    assert!(mpdu.information_elements().is_none());

    assert_eq!(frame.payload(), Some(&[0x2b, 0x00, 0x00, 0x00][..]));
}

#[test]
fn parse_unicast_data_header() {
    // Unicast data frame, short source and destination on the same PAN:
    // pan 0xabcd, dst 0xbeef, src 0x1234, ack requested.
    let frame = [
        0x61, 0x88, 0x05, 0xcd, 0xab, 0xef, 0xbe, 0x34, 0x12, 0x68, 0x69,
    ];

    let frame = Frame::new(&frame[..]).unwrap();
    let Frame::Data(frame) = frame else {
        panic!("expected a data frame");
    };
    let mpdu = frame.mpdu();

    let fc = mpdu.frame_control();
    assert_eq!(fc.frame_type(), FrameType::Data);
    assert!(fc.ack_request());
    assert!(fc.pan_id_compression());

    assert_eq!(mpdu.sequence_number(), Some(5));
    assert_eq!(mpdu.header_len(), 9);

    let addressing = mpdu.addressing().unwrap();
    assert_eq!(addressing.dst_pan_id(), Some(0xabcd));
    assert_eq!(addressing.src_pan_id(), None);
    assert_eq!(addressing.dst_address(), Some(Address::from_short(0xbeef)));
    assert_eq!(addressing.src_address(), Some(Address::from_short(0x1234)));

    assert_eq!(frame.payload(), Some(&[0x68, 0x69][..]));
    assert_eq!(mpdu.frame_payload(), Some(&[0x68, 0x69][..]));
    assert_eq!(mpdu.mac_payload(), Some(&[0x68, 0x69][..]));
}

#[test]
fn parse_secured_data_frame() {
    // Same header with security enabled, level 5, implicit key id,
    // frame counter 1, followed by two payload octets and a 4-octet tag.
    let frame = [
        0x69, 0x88, 0x05, 0xcd, 0xab, 0xef, 0xbe, 0x34, 0x12, // MHR
        0x05, 0x01, 0x00, 0x00, 0x00, // aux security header
        0x68, 0x69, 0xde, 0xad, 0xbe, 0xef, // payload + tag
    ];

    let frame = DataFrame::new(&frame[..]).unwrap();
    let mpdu = frame.mpdu();

    assert!(mpdu.frame_control().security_enabled());
    assert_eq!(mpdu.header_len(), 9 + 5);

    let aux = mpdu.auxiliary_security_header().unwrap();
    assert_eq!(
        aux.security_control().security_level().unwrap(),
        SecurityLevel::EncMic32
    );
    assert_eq!(aux.frame_counter(), Some(1));
}

#[test]
fn rejects_explicit_key_identifier_mode() {
    // As above, but with key identifier mode 1.
    let frame = [
        0x69, 0x88, 0x05, 0xcd, 0xab, 0xef, 0xbe, 0x34, 0x12, // MHR
        0x0d, 0x01, 0x00, 0x00, 0x00, 0x07, // aux security header
        0x68, 0x69, 0xde, 0xad, 0xbe, 0xef,
    ];

    assert_eq!(DataFrame::new(&frame[..]).unwrap_err(), Error::NotSupported);
}

#[test]
fn rejects_reserved_fields() {
    // Reserved frame version.
    assert_eq!(
        Frame::new(&[0x01, 0x30, 0x01][..]).unwrap_err(),
        Error::Reserved
    );

    // Reserved destination addressing mode (0b01).
    let frame = [0x01, 0x84, 0x01, 0xcd, 0xab, 0x34, 0x12];
    assert!(Frame::new(&frame[..]).is_err());
}

#[test]
fn rejects_pre_2015_contradictions() {
    // Sequence number suppression on a 2006 frame.
    let frame = [0x41, 0x89, 0xcd, 0xab, 0xef, 0xbe, 0x34, 0x12, 0x2b];
    assert_eq!(DataFrame::new(&frame[..]).unwrap_err(), Error::BadFormat);

    // Data frame without any addressing.
    let frame = [0x01, 0x00, 0x01, 0x2b];
    assert_eq!(Frame::new(&frame[..]).unwrap_err(), Error::BadFormat);
}

#[test]
fn rejects_oversized_frame() {
    let frame = [0u8; 128];
    assert!(Mpdu::new(&frame[..]).is_err());
}
