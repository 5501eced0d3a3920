use crate::time::Duration;
use crate::*;

fn emit(repr: &FrameRepr) -> std::vec::Vec<u8> {
    let mut buffer = std::vec![0u8; repr.buffer_len()];
    repr.emit(&mut buffer);
    buffer
}

#[test]
fn immediate_ack_emission() {
    let repr = FrameBuilder::new_imm_ack(0x2a).finalize().unwrap();
    assert_eq!(repr.buffer_len(), 3);
    assert_eq!(emit(&repr), [0x02, 0x00, 0x2a]);
}

#[test]
fn immediate_ack_roundtrip() {
    let repr = FrameBuilder::new_imm_ack(0x2a).finalize().unwrap();
    let buffer = emit(&repr);

    let frame = Frame::new(&buffer[..]).unwrap();
    let parsed = FrameRepr::parse(&frame).unwrap();
    parsed.validate().unwrap();

    assert_eq!(parsed.frame_control.frame_type, FrameType::Ack);
    assert_eq!(parsed.sequence_number, Some(0x2a));
    assert!(parsed.addressing_fields.is_none());
    assert_eq!(parsed.header_len(), 3);
}

#[test]
fn unicast_data_emission() {
    // Context: pan 0xabcd, short address 0x1234, acknowledgments
    // requested. Destination 0xbeef.
    let payload = [0x68, 0x69];
    let repr = FrameBuilder::new_data(&payload)
        .set_sequence_number(0x05)
        .set_ack_request(true)
        .set_dst_pan_id(0xabcd)
        .set_src_pan_id(0xabcd)
        .set_dst_address(Address::from_short(0xbeef))
        .set_src_address(Address::from_short(0x1234))
        .finalize()
        .unwrap();

    repr.validate().unwrap();

    assert_eq!(repr.header_len(), 9);
    assert_eq!(
        emit(&repr),
        [0x61, 0x88, 0x05, 0xcd, 0xab, 0xef, 0xbe, 0x34, 0x12, 0x68, 0x69]
    );
}

#[test]
fn unicast_data_roundtrip() {
    let payload = [0x2b, 0x00, 0x00, 0x00];
    let repr = FrameBuilder::new_data(&payload)
        .set_sequence_number(0x11)
        .set_dst_pan_id(0xabcd)
        .set_src_pan_id(0xabcd)
        .set_dst_address(Address::from_short(0xbeef))
        .set_src_address(Address::Extended([
            0x00, 0x12, 0x4b, 0x00, 0x14, 0xb5, 0xd9, 0xc7,
        ]))
        .finalize()
        .unwrap();

    let buffer = emit(&repr);
    assert_eq!(buffer.len(), repr.buffer_len());

    let frame = Frame::new(&buffer[..]).unwrap();
    let parsed = FrameRepr::parse(&frame).unwrap();
    parsed.validate().unwrap();

    assert_eq!(parsed.frame_control, repr.frame_control);
    assert_eq!(parsed.sequence_number, repr.sequence_number);
    assert_eq!(parsed.payload, Some(&payload[..]));
    assert_eq!(parsed.header_len(), repr.header_len());
    assert_eq!(parsed.buffer_len(), repr.buffer_len());

    let addressing = parsed.addressing_fields.unwrap();
    assert_eq!(addressing.dst_pan_id, Some(0xabcd));
    // The source PAN ID was compressed away.
    assert_eq!(addressing.src_pan_id, None);
    assert_eq!(addressing.dst_address, Some(Address::from_short(0xbeef)));
    assert_eq!(
        addressing.src_address,
        Some(Address::Extended([
            0x00, 0x12, 0x4b, 0x00, 0x14, 0xb5, 0xd9, 0xc7
        ]))
    );
}

#[test]
fn secured_data_roundtrip() {
    let payload = [0x68, 0x69];
    let repr = FrameBuilder::new_data(&payload)
        .set_sequence_number(0x07)
        .set_dst_pan_id(0xabcd)
        .set_src_pan_id(0xabcd)
        .set_dst_address(Address::from_short(0xbeef))
        .set_src_address(Address::from_short(0x1234))
        .set_security(SecurityLevel::EncMic32, 7)
        .finalize()
        .unwrap();

    assert_eq!(repr.header_len(), 9 + 5);

    let buffer = emit(&repr);
    let frame = Frame::new(&buffer[..]).unwrap();
    let parsed = FrameRepr::parse(&frame).unwrap();

    let aux = parsed.aux_security_header.unwrap();
    assert_eq!(aux.security_level, SecurityLevel::EncMic32);
    assert_eq!(aux.frame_counter, 7);
    assert_eq!(parsed.header_len(), repr.header_len());
}

#[test]
fn enhanced_ack_with_time_correction_roundtrip() {
    let repr = FrameBuilder::new_enhanced_ack()
        .add_header_information_element(HeaderInformationElementRepr::TimeCorrection(
            TimeCorrectionRepr {
                time_correction: Duration::from_us(1),
                nack: false,
            },
        ))
        .finalize()
        .unwrap();

    let buffer = emit(&repr);

    // Frame control + Time Correction IE, nothing else.
    assert_eq!(buffer.len(), 2 + 4);

    let frame = Frame::new(&buffer[..]).unwrap();
    let Frame::EnhancedAck(ack) = &frame else {
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

    let parsed = FrameRepr::parse(&frame).unwrap();
    assert_eq!(parsed.buffer_len(), repr.buffer_len());
}

#[test]
fn enhanced_beacon_roundtrip() {
    let mut nested = heapless::Vec::new();
    nested
        .push(NestedInformationElementRepr::TschSynchronization(
            TschSynchronizationRepr {
                absolute_slot_number: 0x11,
                join_metric: 0,
            },
        ))
        .unwrap();
    nested
        .push(NestedInformationElementRepr::TschTimeslot(
            TschTimeslotRepr::Id(0),
        ))
        .unwrap();
    nested
        .push(NestedInformationElementRepr::ChannelHopping(
            ChannelHoppingRepr::Id(0),
        ))
        .unwrap();

    let repr = FrameBuilder::new_enhanced_beacon()
        .set_src_pan_id(0xabcd)
        .set_src_address(Address::Extended([
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
        ]))
        .add_payload_information_element(PayloadInformationElementRepr::Mlme(nested))
        .finalize()
        .unwrap();

    let buffer = emit(&repr);

    let frame = Frame::new(&buffer[..]).unwrap();
    let Frame::EnhancedBeacon(_) = &frame else {
        panic!("expected an enhanced beacon");
    };

    let parsed = FrameRepr::parse(&frame).unwrap();
    assert_eq!(parsed.buffer_len(), repr.buffer_len());

    let ies = parsed.information_elements.unwrap();
    assert_eq!(ies.payload_information_elements.len(), 1);
    let PayloadInformationElementRepr::Mlme(parsed_nested) =
        &ies.payload_information_elements[0]
    else {
        panic!("expected an MLME payload IE");
    };
    assert_eq!(parsed_nested.len(), 3);
    assert!(matches!(
        parsed_nested[0],
        NestedInformationElementRepr::TschSynchronization(TschSynchronizationRepr {
            absolute_slot_number: 0x11,
            join_metric: 0,
        })
    ));
}

#[test]
fn broadcast_never_requests_ack() {
    // The MAC forces the ack request bit off for broadcast destinations;
    // the codec must carry it through unchanged in both directions.
    let payload = [0x01];
    let repr = FrameBuilder::new_data(&payload)
        .set_sequence_number(0x01)
        .set_dst_pan_id(0xabcd)
        .set_src_pan_id(0xabcd)
        .set_dst_address(Address::BROADCAST)
        .set_src_address(Address::from_short(0x1234))
        .set_ack_request(false)
        .finalize()
        .unwrap();

    let buffer = emit(&repr);
    let frame = Frame::new(&buffer[..]).unwrap();
    assert!(!frame.frame_control().ack_request());
}

#[test]
fn full_channel_hopping_roundtrip() {
    let mut sequence = heapless::Vec::new();
    for channel in [20u16, 25, 26, 15] {
        sequence.push(channel).unwrap();
    }

    let mut nested = heapless::Vec::new();
    nested
        .push(NestedInformationElementRepr::ChannelHopping(
            ChannelHoppingRepr::Full {
                hopping_sequence_id: 1,
                channel_page: 0,
                number_of_channels: 16,
                phy_configuration: 0,
                hopping_sequence: sequence,
                current_hop: 0,
            },
        ))
        .unwrap();

    let repr = FrameBuilder::new_enhanced_beacon()
        .set_src_pan_id(0xabcd)
        .set_src_address(Address::Extended([0x01; 8]))
        .add_payload_information_element(PayloadInformationElementRepr::Mlme(nested))
        .finalize()
        .unwrap();

    let buffer = emit(&repr);
    let frame = Frame::new(&buffer[..]).unwrap();
    let parsed = FrameRepr::parse(&frame).unwrap();

    let ies = parsed.information_elements.unwrap();
    let PayloadInformationElementRepr::Mlme(nested) = &ies.payload_information_elements[0]
    else {
        panic!("expected an MLME payload IE");
    };
    let NestedInformationElementRepr::ChannelHopping(ChannelHoppingRepr::Full {
        hopping_sequence,
        ..
    }) = &nested[0]
    else {
        panic!("expected a full channel hopping IE");
    };
    assert_eq!(hopping_sequence.as_slice(), &[20, 25, 26, 15]);
}
