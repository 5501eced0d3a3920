use super::super::super::{
    ChannelHopping, LinkInformation, NestedInformationElement, NestedSubId, NestedSubIdLong,
    NestedSubIdShort, SlotframeDescriptor, TschLinkOption, TschSlotframeAndLink,
    TschSynchronization, TschTimeslot, TschTimeslotTimings,
};
use super::super::super::{Error, Result};

use heapless::Vec;

/// A high-level representation of a nested Information Element found in an
/// MLME payload IE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NestedInformationElementRepr {
    /// TSCH Synchronization Information Element.
    TschSynchronization(TschSynchronizationRepr),
    /// TSCH Timeslot Information Element.
    TschTimeslot(TschTimeslotRepr),
    /// TSCH Slotframe and Link Information Element.
    TschSlotframeAndLink(TschSlotframeAndLinkRepr),
    /// Channel Hopping Information Element.
    ChannelHopping(ChannelHoppingRepr),
}

impl NestedInformationElementRepr {
    /// Parse a Nested Information Element.
    pub fn parse(ie: &NestedInformationElement<&[u8]>) -> Result<Self> {
        Ok(match ie.sub_id() {
            NestedSubId::Short(NestedSubIdShort::TschSynchronization) => Self::TschSynchronization(
                TschSynchronizationRepr::parse(&TschSynchronization::new(ie.content())?),
            ),
            NestedSubId::Short(NestedSubIdShort::TschTimeslot) => {
                Self::TschTimeslot(TschTimeslotRepr::parse(&TschTimeslot::new(ie.content())?))
            }
            NestedSubId::Short(NestedSubIdShort::TschSlotframeAndLink) => {
                Self::TschSlotframeAndLink(TschSlotframeAndLinkRepr::parse(
                    &TschSlotframeAndLink::new(ie.content())?,
                ))
            }
            NestedSubId::Long(NestedSubIdLong::ChannelHopping) => {
                Self::ChannelHopping(ChannelHoppingRepr::parse(&ChannelHopping::new(
                    ie.content(),
                )?))
            }
            _ => return Err(Error::NotSupported),
        })
    }

    /// The buffer length required to emit this element.
    pub fn buffer_len(&self) -> usize {
        2 + self.content_len()
    }

    /// The buffer length required by the element content.
    pub fn content_len(&self) -> usize {
        match self {
            Self::TschSynchronization(repr) => repr.buffer_len(),
            Self::TschTimeslot(repr) => repr.buffer_len(),
            Self::TschSlotframeAndLink(repr) => repr.buffer_len(),
            Self::ChannelHopping(repr) => repr.buffer_len(),
        }
    }

    /// Emit this element into a buffer.
    pub fn emit(&self, w: &mut NestedInformationElement<&mut [u8]>) {
        let id = NestedSubId::from(self);

        w.clear();
        w.set_length(self.content_len() as u16, id);
        w.set_sub_id(id);

        match self {
            Self::TschSynchronization(repr) => {
                repr.emit(&mut TschSynchronization::new_unchecked(w.content_mut()))
            }
            Self::TschTimeslot(repr) => {
                repr.emit(&mut TschTimeslot::new_unchecked(w.content_mut()))
            }
            Self::TschSlotframeAndLink(repr) => {
                repr.emit(&mut TschSlotframeAndLink::new_unchecked(w.content_mut()))
            }
            Self::ChannelHopping(repr) => {
                repr.emit(&mut ChannelHopping::new_unchecked(w.content_mut()))
            }
        }
    }
}

impl From<&NestedInformationElementRepr> for NestedSubId {
    fn from(value: &NestedInformationElementRepr) -> Self {
        match value {
            NestedInformationElementRepr::TschSynchronization(_) => {
                NestedSubId::Short(NestedSubIdShort::TschSynchronization)
            }
            NestedInformationElementRepr::TschTimeslot(_) => {
                NestedSubId::Short(NestedSubIdShort::TschTimeslot)
            }
            NestedInformationElementRepr::TschSlotframeAndLink(_) => {
                NestedSubId::Short(NestedSubIdShort::TschSlotframeAndLink)
            }
            NestedInformationElementRepr::ChannelHopping(_) => {
                NestedSubId::Long(NestedSubIdLong::ChannelHopping)
            }
        }
    }
}

/// A high-level representation of a TSCH Synchronization nested IE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TschSynchronizationRepr {
    /// The absolute slot number.
    pub absolute_slot_number: u64,
    /// The join metric.
    pub join_metric: u8,
}

impl TschSynchronizationRepr {
    /// Parse a TSCH Synchronization IE.
    pub fn parse(ie: &TschSynchronization<&[u8]>) -> Self {
        Self {
            absolute_slot_number: ie.absolute_slot_number(),
            join_metric: ie.join_metric(),
        }
    }

    /// The buffer length required to emit the element content.
    pub const fn buffer_len(&self) -> usize {
        TschSynchronization::<&[u8]>::LEN
    }

    /// Emit the element content.
    pub fn emit(&self, ie: &mut TschSynchronization<&mut [u8]>) {
        ie.set_absolute_slot_number(self.absolute_slot_number);
        ie.set_join_metric(self.join_metric);
    }
}

/// A high-level representation of a TSCH Timeslot nested IE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TschTimeslotRepr {
    /// The shortened form: a timeslot template ID.
    Id(u8),
    /// The full form: a complete timing template.
    Timings(TschTimeslotTimings),
}

impl TschTimeslotRepr {
    /// Parse a TSCH Timeslot IE.
    pub fn parse(ie: &TschTimeslot<&[u8]>) -> Self {
        if ie.has_timings() {
            Self::Timings(ie.timings())
        } else {
            Self::Id(ie.id())
        }
    }

    /// The buffer length required to emit the element content.
    pub fn buffer_len(&self) -> usize {
        match self {
            Self::Id(_) => 1,
            Self::Timings(timings) => timings.buffer_len(),
        }
    }

    /// Emit the element content.
    pub fn emit(&self, ie: &mut TschTimeslot<&mut [u8]>) {
        match self {
            Self::Id(id) => ie.set_id(*id),
            Self::Timings(timings) => ie.set_timings(timings),
        }
    }
}

/// A high-level representation of a TSCH Slotframe and Link nested IE.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TschSlotframeAndLinkRepr {
    /// The slotframe descriptors.
    pub slotframe_descriptors: Vec<SlotframeDescriptorRepr, 4>,
}

impl TschSlotframeAndLinkRepr {
    /// Parse a TSCH Slotframe and Link IE.
    pub fn parse(ie: &TschSlotframeAndLink<&[u8]>) -> Self {
        let mut slotframe_descriptors = Vec::new();

        for descriptor in ie.slotframe_descriptors() {
            if slotframe_descriptors
                .push(SlotframeDescriptorRepr::parse(&descriptor))
                .is_err()
            {
                break;
            }
        }

        Self {
            slotframe_descriptors,
        }
    }

    /// The buffer length required to emit the element content.
    pub fn buffer_len(&self) -> usize {
        1 + self
            .slotframe_descriptors
            .iter()
            .map(|d| d.buffer_len())
            .sum::<usize>()
    }

    /// Emit the element content.
    pub fn emit(&self, ie: &mut TschSlotframeAndLink<&mut [u8]>) {
        ie.set_number_of_slotframes(self.slotframe_descriptors.len() as u8);

        let buffer = ie.content_mut();
        let mut offset = 0;

        for descriptor in self.slotframe_descriptors.iter() {
            descriptor.emit(&mut SlotframeDescriptor::new_unchecked(
                &mut buffer[offset..][..descriptor.buffer_len()],
            ));
            offset += descriptor.buffer_len();
        }
    }
}

/// A high-level representation of a Slotframe Descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotframeDescriptorRepr {
    /// The slotframe handle.
    pub handle: u8,
    /// The slotframe size, in timeslots.
    pub size: u16,
    /// The link information records of the slotframe.
    pub links: Vec<LinkInformationRepr, 8>,
}

impl SlotframeDescriptorRepr {
    /// Parse a Slotframe Descriptor.
    pub fn parse(ie: &SlotframeDescriptor<&[u8]>) -> Self {
        let mut links = Vec::new();

        for link in ie.link_informations() {
            if links.push(LinkInformationRepr::parse(&link)).is_err() {
                break;
            }
        }

        Self {
            handle: ie.handle(),
            size: ie.size(),
            links,
        }
    }

    /// The buffer length required to emit the descriptor.
    pub fn buffer_len(&self) -> usize {
        4 + self.links.len() * LinkInformation::<&[u8]>::LEN
    }

    /// Emit the descriptor.
    pub fn emit(&self, ie: &mut SlotframeDescriptor<&mut [u8]>) {
        ie.set_handle(self.handle);
        ie.set_size(self.size);
        ie.set_links(self.links.len() as u8);

        let buffer = ie.content_mut();
        let mut offset = 0;

        for link in self.links.iter() {
            link.emit(&mut LinkInformation::new_unchecked(
                &mut buffer[offset..][..LinkInformation::<&[u8]>::LEN],
            ));
            offset += LinkInformation::<&[u8]>::LEN;
        }
    }
}

/// A high-level representation of a Link Information record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkInformationRepr {
    /// The timeslot of the link.
    pub timeslot: u16,
    /// The channel offset of the link.
    pub channel_offset: u16,
    /// The link options bitmap.
    pub link_options: TschLinkOption,
}

impl LinkInformationRepr {
    /// Parse a Link Information record.
    pub fn parse(ie: &LinkInformation<&[u8]>) -> Self {
        Self {
            timeslot: ie.timeslot(),
            channel_offset: ie.channel_offset(),
            link_options: ie.link_options(),
        }
    }

    /// The buffer length required to emit the record.
    pub const fn buffer_len(&self) -> usize {
        LinkInformation::<&[u8]>::LEN
    }

    /// Emit the record.
    pub fn emit(&self, ie: &mut LinkInformation<&mut [u8]>) {
        ie.set_timeslot(self.timeslot);
        ie.set_channel_offset(self.channel_offset);
        ie.set_link_options(self.link_options);
    }
}

/// A high-level representation of a Channel Hopping nested IE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelHoppingRepr {
    /// The shortened form: a hopping sequence ID.
    Id(u8),
    /// The full form: the complete hopping sequence.
    Full {
        /// The hopping sequence ID.
        hopping_sequence_id: u8,
        /// The channel page of the sequence.
        channel_page: u8,
        /// The number of channels of the page.
        number_of_channels: u16,
        /// The PHY configuration bitmap.
        phy_configuration: u32,
        /// The hopping sequence.
        hopping_sequence: Vec<u16, 16>,
        /// The current position in the sequence.
        current_hop: u16,
    },
}

impl ChannelHoppingRepr {
    /// Parse a Channel Hopping IE.
    pub fn parse(ie: &ChannelHopping<&[u8]>) -> Self {
        if !ie.is_full() {
            return Self::Id(ie.hopping_sequence_id());
        }

        let mut hopping_sequence = Vec::new();
        for channel in ie.hopping_sequence() {
            if hopping_sequence.push(channel).is_err() {
                break;
            }
        }

        Self::Full {
            hopping_sequence_id: ie.hopping_sequence_id(),
            channel_page: ie.channel_page(),
            number_of_channels: ie.number_of_channels(),
            phy_configuration: ie.phy_configuration(),
            hopping_sequence,
            current_hop: ie.current_hop(),
        }
    }

    /// The buffer length required to emit the element content.
    pub fn buffer_len(&self) -> usize {
        match self {
            Self::Id(_) => ChannelHopping::<&[u8]>::SHORT_LEN,
            Self::Full {
                hopping_sequence, ..
            } => 12 + hopping_sequence.len() * 2,
        }
    }

    /// Emit the element content.
    pub fn emit(&self, ie: &mut ChannelHopping<&mut [u8]>) {
        match self {
            Self::Id(id) => ie.set_hopping_sequence_id(*id),
            Self::Full {
                hopping_sequence_id,
                channel_page,
                number_of_channels,
                phy_configuration,
                hopping_sequence,
                current_hop,
            } => {
                ie.set_hopping_sequence_id(*hopping_sequence_id);
                ie.set_channel_page(*channel_page);
                ie.set_number_of_channels(*number_of_channels);
                ie.set_phy_configuration(*phy_configuration);
                ie.set_hopping_sequence(hopping_sequence);
                ie.set_current_hop(*current_hop);
            }
        }
    }
}
