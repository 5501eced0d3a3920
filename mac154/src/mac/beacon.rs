//! Enhanced beacon assembly.
//!
//! A TSCH enhanced beacon advertises everything a joining node needs:
//! the current ASN and join metric (TSCH Synchronization IE), the
//! timeslot template (TSCH Timeslot IE), the advertised slotframes and
//! their links (TSCH Slotframe and Link IE), and the hopping sequence
//! (Channel Hopping IE). The shortened IE forms carry only template IDs;
//! the full forms spell the tables out for radios joining cold.

use heapless::Vec;
use mac154_frame::{
    ChannelHoppingRepr, FrameBuilder, LinkInformationRepr, NestedInformationElementRepr,
    PayloadInformationElementRepr, SlotframeDescriptorRepr, TschSlotframeAndLinkRepr,
    TschSynchronizationRepr, TschTimeslotRepr,
};

use super::{Error, MacContext, Result};
use crate::phy::FrameBuffer;

/// Assemble an enhanced beacon from the context.
///
/// `full` selects the full Timeslot and Channel Hopping IE forms. The
/// caller holds the context lock; the schedule and timing tables are
/// read under it.
pub fn create_enhanced_beacon(ctx: &MacContext, full: bool) -> Result<FrameBuffer> {
    let mut nested: Vec<NestedInformationElementRepr, 8> = Vec::new();

    nested
        .push(NestedInformationElementRepr::TschSynchronization(
            TschSynchronizationRepr {
                absolute_slot_number: ctx.tsch.asn.as_u64(),
                join_metric: ctx.tsch.join_metric,
            },
        ))
        .map_err(|_| Error::NoMemory)?;

    let timeslot = if full {
        TschTimeslotRepr::Timings(ctx.tsch.timings)
    } else {
        TschTimeslotRepr::Id(ctx.tsch.timings.id())
    };
    nested
        .push(NestedInformationElementRepr::TschTimeslot(timeslot))
        .map_err(|_| Error::NoMemory)?;

    let mut slotframes = TschSlotframeAndLinkRepr::default();
    for slotframe in ctx.tsch.schedule.slotframes() {
        if !slotframe.advertise {
            continue;
        }

        let mut descriptor = SlotframeDescriptorRepr {
            handle: slotframe.handle,
            size: slotframe.size,
            links: Vec::new(),
        };

        for link in slotframe.links() {
            descriptor
                .links
                .push(LinkInformationRepr {
                    timeslot: link.timeslot,
                    channel_offset: link.channel_offset,
                    link_options: link.options,
                })
                .map_err(|_| Error::NoMemory)?;
        }

        slotframes
            .slotframe_descriptors
            .push(descriptor)
            .map_err(|_| Error::NoMemory)?;
    }
    nested
        .push(NestedInformationElementRepr::TschSlotframeAndLink(
            slotframes,
        ))
        .map_err(|_| Error::NoMemory)?;

    let hopping = if full && !ctx.tsch.hopping.is_empty() {
        let mut sequence = Vec::new();
        sequence
            .extend_from_slice(ctx.tsch.hopping.channels())
            .map_err(|()| Error::NoMemory)?;
        ChannelHoppingRepr::Full {
            hopping_sequence_id: 0,
            channel_page: 0,
            number_of_channels: 16,
            phy_configuration: 0,
            hopping_sequence: sequence,
            current_hop: (ctx.tsch.asn.as_u64() % ctx.tsch.hopping.len() as u64) as u16,
        }
    } else {
        ChannelHoppingRepr::Id(0)
    };
    nested
        .push(NestedInformationElementRepr::ChannelHopping(hopping))
        .map_err(|_| Error::NoMemory)?;

    let repr = FrameBuilder::new_enhanced_beacon()
        .set_src_pan_id(ctx.pib.pan_id)
        .set_src_address(ctx.own_address()?)
        .add_payload_information_element(PayloadInformationElementRepr::Mlme(nested))
        .finalize()
        .map_err(Error::from)?;

    let mut frame = FrameBuffer::default();
    let len = repr.buffer_len();
    if len > frame.buffer.len() {
        return Err(Error::NoMemory);
    }
    repr.emit(&mut frame.buffer[..len]);
    frame.len = len;

    Ok(frame)
}
