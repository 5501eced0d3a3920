use crate::*;

#[test]
fn parse_beacon() {
    // 2003 beacon: source 0x1234 on PAN 0xabcd, on-demand beacon order,
    // PAN coordinator accepting association, no GTS, no pending
    // addresses, two payload octets.
    let frame = [
        0x00, 0x80, 0x2a, 0xcd, 0xab, 0x34, 0x12, 0xff, 0xcf, 0x00, 0x00, 0xde, 0xad,
    ];

    let frame = Frame::new(&frame[..]).unwrap();
    let Frame::Beacon(beacon) = frame else {
        panic!("expected a beacon");
    };

    assert_eq!(beacon.sequence_number(), 0x2a);

    let addressing = beacon.mpdu().addressing().unwrap();
    assert_eq!(addressing.src_pan_id(), Some(0xabcd));
    assert_eq!(addressing.src_address(), Some(Address::from_short(0x1234)));
    assert_eq!(addressing.dst_pan_id(), None);
    assert_eq!(addressing.dst_address(), Some(Address::Absent));

    let spec = beacon.superframe_specification();
    assert_eq!(spec.beacon_order, 15);
    assert_eq!(spec.superframe_order, 15);
    assert_eq!(spec.final_cap_slot, 15);
    assert!(!spec.battery_life_extension);
    assert!(spec.pan_coordinator);
    assert!(spec.association_permit);

    let gts = beacon.gts_fields();
    assert_eq!(gts.descriptor_count(), 0);
    assert!(!gts.gts_permit());
    assert_eq!(gts.len(), 1);
    assert_eq!(gts.descriptors().count(), 0);

    let pending = beacon.pending_address_fields();
    assert_eq!(pending.short_address_count(), 0);
    assert_eq!(pending.extended_address_count(), 0);
    assert_eq!(pending.addresses().count(), 0);

    assert_eq!(beacon.payload(), Some(&[0xde, 0xad][..]));
}

#[test]
fn parse_beacon_with_gts_and_pending() {
    let frame = [
        0x00, 0x80, 0x2a, 0xcd, 0xab, 0x34, 0x12, // MHR
        0xff, 0xc0, // superframe specification
        0x81, // GTS specification: one descriptor, permit
        0x01, // GTS directions: descriptor 0 is receive-only
        0xef, 0xbe, 0x23, // GTS descriptor: 0xbeef, slot 3, length 2
        0x12, // pending: two short, one extended
        0x01, 0x00, 0x02, 0x00, // short addresses 0x0001, 0x0002
        0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01, // extended
    ];

    let beacon = BeaconFrame::new(&frame[..]).unwrap();

    let gts = beacon.gts_fields();
    assert_eq!(gts.descriptor_count(), 1);
    assert!(gts.gts_permit());
    assert_eq!(gts.len(), 5);

    let descriptor = gts.descriptors().next().unwrap();
    assert_eq!(descriptor.short_address, Address::from_short(0xbeef));
    assert_eq!(descriptor.starting_slot, 3);
    assert_eq!(descriptor.length, 2);
    assert!(descriptor.receive_only);

    let pending = beacon.pending_address_fields();
    assert_eq!(pending.short_address_count(), 2);
    assert_eq!(pending.extended_address_count(), 1);

    let addresses: std::vec::Vec<Address> = pending.addresses().collect();
    assert_eq!(
        addresses,
        [
            Address::from_short(0x0001),
            Address::from_short(0x0002),
            Address::Extended([0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]),
        ]
    );

    assert!(beacon.payload().is_none());
}

#[test]
fn parse_enhanced_beacon() {
    // Enhanced beacon: extended source, sequence number suppressed, one
    // MLME payload IE holding a TSCH Synchronization nested IE.
    let frame = [
        0x00, 0xe3, // frame control
        0xcd, 0xab, // source PAN
        0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01, // source address
        0x00, 0x3f, // Header Termination 1
        0x08, 0x88, // MLME payload IE
        0x06, 0x1a, // TSCH Synchronization nested IE
        0x11, 0x00, 0x00, 0x00, 0x00, // ASN
        0x00, // join metric
    ];

    let frame = Frame::new(&frame[..]).unwrap();
    let Frame::EnhancedBeacon(beacon) = frame else {
        panic!("expected an enhanced beacon");
    };

    assert_eq!(beacon.mpdu().sequence_number(), None);

    let addressing = beacon.mpdu().addressing().unwrap();
    assert_eq!(addressing.src_pan_id(), Some(0xabcd));
    assert_eq!(
        addressing.src_address(),
        Some(Address::Extended([
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08
        ]))
    );

    let ie = beacon.information_elements().unwrap();
    let mut found = false;
    for payload_ie in ie.payload_information_elements() {
        if payload_ie.group_id() != PayloadGroupId::Mlme {
            continue;
        }
        for nested in payload_ie.nested_information_elements() {
            if let NestedSubId::Short(NestedSubIdShort::TschSynchronization) = nested.sub_id() {
                let sync = TschSynchronization::new(nested.content()).unwrap();
                assert_eq!(sync.absolute_slot_number(), 0x11);
                assert_eq!(sync.join_metric(), 0);
                found = true;
            }
        }
    }
    assert!(found);
}

#[test]
fn beacon_with_destination_is_invalid() {
    // A beacon addressing a destination contradicts its frame type.
    let frame = [
        0x00, 0x88, 0x2a, 0xcd, 0xab, 0xff, 0xff, 0xcd, 0xab, 0x34, 0x12, 0xff, 0xcf, 0x00, 0x00,
    ];

    assert_eq!(Frame::new(&frame[..]).unwrap_err(), Error::BadFormat);
}
