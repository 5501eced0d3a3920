use crate::*;

#[test]
fn parse_beacon_request() {
    // Broadcast beacon request, no source address.
    let frame = [0x03, 0x08, 0x01, 0xff, 0xff, 0xff, 0xff, 0x07];

    let frame = Frame::new(&frame[..]).unwrap();
    let Frame::MacCommand(command) = frame else {
        panic!("expected a MAC command");
    };

    assert_eq!(command.command_id().unwrap(), CommandId::BeaconRequest);
    assert!(command.content().is_empty());

    let addressing = command.mpdu().addressing().unwrap();
    assert_eq!(addressing.dst_pan_id(), Some(0xffff));
    assert_eq!(addressing.dst_address(), Some(Address::BROADCAST));
}

#[test]
fn parse_data_request() {
    // Data request from short address 0x1234 to the coordinator.
    let frame = [
        0x63, 0x88, 0x01, 0xcd, 0xab, 0x00, 0x00, 0x34, 0x12, 0x04,
    ];

    let command = CommandFrame::new(&frame[..]).unwrap();
    assert_eq!(command.command_id().unwrap(), CommandId::DataRequest);
    assert!(command.content().is_empty());
    assert!(command.frame_control().ack_request());
}

#[test]
fn parse_association_request() {
    // Association request: extended source, one capability octet.
    let frame = [
        0x23, 0xc8, 0x01, 0xcd, 0xab, 0x00, 0x00, // dst pan + coord addr
        0xff, 0xff, // src pan (unassociated)
        0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01, // src address
        0x01, 0x8e, // CFI + capability information
    ];

    let command = CommandFrame::new(&frame[..]).unwrap();
    assert_eq!(
        command.command_id().unwrap(),
        CommandId::AssociationRequest
    );
    assert_eq!(command.content(), &[0x8e]);
}

#[test]
fn rejects_bad_command_length() {
    // Association request without the capability octet.
    let frame = [
        0x23, 0xc8, 0x01, 0xcd, 0xab, 0x00, 0x00, 0xff, 0xff, 0x08, 0x07, 0x06, 0x05, 0x04,
        0x03, 0x02, 0x01, 0x01,
    ];

    assert_eq!(CommandFrame::new(&frame[..]).unwrap_err(), Error::WrongLength);
}

#[test]
fn rejects_bad_command_addressing() {
    // A beacon request must not carry a source address.
    let frame = [
        0x43, 0x88, 0x01, 0xcd, 0xab, 0xff, 0xff, 0x34, 0x12, 0x07,
    ];

    assert_eq!(CommandFrame::new(&frame[..]).unwrap_err(), Error::BadFormat);
}

#[test]
fn rejects_reserved_command_id() {
    let frame = [0x03, 0x08, 0x01, 0xff, 0xff, 0xff, 0xff, 0x42];
    assert_eq!(CommandFrame::new(&frame[..]).unwrap_err(), Error::Reserved);
}
