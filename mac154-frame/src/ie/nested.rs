//! Nested Information Element readers and writers.
//!
//! Nested IEs live inside an MLME payload IE. The descriptor distinguishes
//! a short and a long form by its type bit:
//!
//! ```notrust
//! Short: +----------+----------+--------+--------------------------+
//!        | Length:8 | Sub-ID:7 | Type=0 | Content (0-255 octets)   |
//!        +----------+----------+--------+--------------------------+
//! Long:  +-----------+---------+--------+--------------------------+
//!        | Length:11 | Sub-ID:4| Type=1 | Content (0-2047 octets)  |
//!        +-----------+---------+--------+--------------------------+
//! ```

use crate::time::Duration;
use crate::{Error, Result};
use bitflags::bitflags;

const TYPE_BIT: u16 = 0b1000_0000_0000_0000;
const SHORT_LENGTH_MASK: u16 = 0b0000_0000_1111_1111;
const SHORT_SUB_ID_SHIFT: u16 = 8;
const SHORT_SUB_ID_MASK: u16 = 0b0111_1111;
const LONG_LENGTH_MASK: u16 = 0b0000_0111_1111_1111;
const LONG_SUB_ID_SHIFT: u16 = 11;
const LONG_SUB_ID_MASK: u16 = 0b1111;

/// A reader/writer for an IEEE 802.15.4 Nested Information Element.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct NestedInformationElement<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> NestedInformationElement<T> {
    /// Create a new [`NestedInformationElement`] reader/writer from a given
    /// buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is too short for the descriptor or
    /// the content it declares.
    pub fn new(data: T) -> Result<Self> {
        let nested = Self::new_unchecked(data);

        if nested.data.as_ref().len() < 2 {
            return Err(Error::WrongLength);
        }

        if nested.data.as_ref().len() < 2 + nested.len() {
            return Err(Error::WrongLength);
        }

        Ok(nested)
    }

    /// Create a new [`NestedInformationElement`] reader/writer from a given
    /// buffer without length checking.
    pub fn new_unchecked(data: T) -> Self {
        Self { data }
    }

    fn descriptor(&self) -> u16 {
        let b = &self.data.as_ref()[0..2];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Returns `true` when this is a long nested IE.
    pub fn is_long(&self) -> bool {
        self.descriptor() & TYPE_BIT == TYPE_BIT
    }

    /// Returns `true` when this is a short nested IE.
    pub fn is_short(&self) -> bool {
        !self.is_long()
    }

    /// Return the content length declared by the descriptor.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        if self.is_long() {
            (self.descriptor() & LONG_LENGTH_MASK) as usize
        } else {
            (self.descriptor() & SHORT_LENGTH_MASK) as usize
        }
    }

    /// Return the [`NestedSubId`].
    pub fn sub_id(&self) -> NestedSubId {
        let descriptor = self.descriptor();
        if self.is_long() {
            NestedSubId::Long(NestedSubIdLong::from(
                ((descriptor >> LONG_SUB_ID_SHIFT) & LONG_SUB_ID_MASK) as u8,
            ))
        } else {
            NestedSubId::Short(NestedSubIdShort::from(
                ((descriptor >> SHORT_SUB_ID_SHIFT) & SHORT_SUB_ID_MASK) as u8,
            ))
        }
    }

    /// Return the content of this Nested Information Element.
    pub fn content(&self) -> &[u8] {
        &self.data.as_ref()[2..][..self.len()]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> NestedInformationElement<T> {
    /// Zero the element, descriptor included.
    pub fn clear(&mut self) {
        self.data.as_mut().fill(0);
    }

    fn set_descriptor(&mut self, value: u16) {
        self.data.as_mut()[0..2].copy_from_slice(&value.to_le_bytes());
    }

    /// Set the content length field of the form selected by `id`.
    pub fn set_length(&mut self, len: u16, id: NestedSubId) {
        let mask = if id.is_long() {
            LONG_LENGTH_MASK
        } else {
            SHORT_LENGTH_MASK
        };
        let value = self.descriptor() & !mask;
        self.set_descriptor(value | (len & mask));
    }

    /// Set the [`NestedSubId`], along with the matching type bit.
    pub fn set_sub_id(&mut self, id: NestedSubId) {
        let value = match id {
            NestedSubId::Short(id) => {
                (self.descriptor() & !TYPE_BIT & !(SHORT_SUB_ID_MASK << SHORT_SUB_ID_SHIFT))
                    | ((id as u16) << SHORT_SUB_ID_SHIFT)
            }
            NestedSubId::Long(id) => {
                (self.descriptor() & !(LONG_SUB_ID_MASK << LONG_SUB_ID_SHIFT))
                    | ((id as u16) << LONG_SUB_ID_SHIFT)
                    | TYPE_BIT
            }
        };
        self.set_descriptor(value);
    }

    /// Return a mutable reference to the content of this element.
    pub fn content_mut(&mut self) -> &mut [u8] {
        &mut self.data.as_mut()[2..]
    }
}

impl<T: AsRef<[u8]>> core::fmt::Display for NestedInformationElement<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.sub_id() {
            NestedSubId::Short(NestedSubIdShort::TschSynchronization) => {
                match TschSynchronization::new(self.content()) {
                    Ok(sync) => write!(f, "TSCH Synchronization {sync}"),
                    Err(_) => write!(f, "TSCH Synchronization (truncated)"),
                }
            }
            NestedSubId::Short(NestedSubIdShort::TschTimeslot) => {
                match TschTimeslot::new(self.content()) {
                    Ok(slot) => write!(f, "TSCH Timeslot {slot}"),
                    Err(_) => write!(f, "TSCH Timeslot (truncated)"),
                }
            }
            NestedSubId::Short(NestedSubIdShort::TschSlotframeAndLink) => {
                match TschSlotframeAndLink::new(self.content()) {
                    Ok(sfl) => write!(f, "TSCH Slotframe and Link {sfl}"),
                    Err(_) => write!(f, "TSCH Slotframe and Link (truncated)"),
                }
            }
            NestedSubId::Long(NestedSubIdLong::ChannelHopping) => {
                match ChannelHopping::new(self.content()) {
                    Ok(ch) => write!(f, "Channel Hopping {ch}"),
                    Err(_) => write!(f, "Channel Hopping (truncated)"),
                }
            }
            id => write!(f, "{:?}({:0x?})", id, self.content()),
        }
    }
}

/// Nested Information Element sub-ID.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum NestedSubId {
    /// A short nested IE sub-ID.
    Short(NestedSubIdShort),
    /// A long nested IE sub-ID.
    Long(NestedSubIdLong),
}

impl NestedSubId {
    /// Returns `true` when this is a short sub-ID.
    pub fn is_short(&self) -> bool {
        matches!(self, Self::Short(_))
    }

    /// Returns `true` when this is a long sub-ID.
    pub fn is_long(&self) -> bool {
        matches!(self, Self::Long(_))
    }
}

/// Short Nested Information Element sub-ID.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum NestedSubIdShort {
    /// TSCH Synchronization.
    TschSynchronization = 0x1a,
    /// TSCH Slotframe and Link.
    TschSlotframeAndLink = 0x1b,
    /// TSCH Timeslot.
    TschTimeslot = 0x1c,
    /// Hopping Timing.
    HoppingTiming = 0x1d,
    /// Enhanced Beacon Filter.
    EnhancedBeaconFilter = 0x1e,
    /// MAC Metrics.
    MacMetrics = 0x1f,
    /// Vendor Specific.
    VendorSpecific = 0x40,
    /// A sub-ID this crate does not interpret.
    Unknown,
}

impl From<u8> for NestedSubIdShort {
    fn from(value: u8) -> Self {
        match value {
            0x1a => Self::TschSynchronization,
            0x1b => Self::TschSlotframeAndLink,
            0x1c => Self::TschTimeslot,
            0x1d => Self::HoppingTiming,
            0x1e => Self::EnhancedBeaconFilter,
            0x1f => Self::MacMetrics,
            0x40 => Self::VendorSpecific,
            _ => Self::Unknown,
        }
    }
}

/// Long Nested Information Element sub-ID.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum NestedSubIdLong {
    /// Vendor specific nested IEs.
    VendorSpecificNested = 0x08,
    /// Channel Hopping.
    ChannelHopping = 0x09,
    /// A sub-ID this crate does not interpret.
    Unknown,
}

impl From<u8> for NestedSubIdLong {
    fn from(value: u8) -> Self {
        match value {
            0x08 => Self::VendorSpecificNested,
            0x09 => Self::ChannelHopping,
            _ => Self::Unknown,
        }
    }
}

/// An [`Iterator`] over [`NestedInformationElement`].
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct NestedInformationElementsIterator<'f> {
    data: &'f [u8],
    offset: usize,
    terminated: bool,
}

impl<'f> NestedInformationElementsIterator<'f> {
    /// Create a new [`NestedInformationElementsIterator`].
    pub fn new(data: &'f [u8]) -> Self {
        Self {
            data,
            offset: 0,
            terminated: data.is_empty(),
        }
    }
}

impl<'f> Iterator for NestedInformationElementsIterator<'f> {
    type Item = NestedInformationElement<&'f [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.terminated {
            return None;
        }

        let Ok(nested) = NestedInformationElement::new(&self.data[self.offset..]) else {
            self.terminated = true;
            return None;
        };

        let len = nested.len() + 2;
        let nested = NestedInformationElement::new_unchecked(&self.data[self.offset..][..len]);

        self.offset += len;

        if self.offset >= self.data.len() {
            self.terminated = true;
        }

        Some(nested)
    }
}

/// A reader/writer for the TSCH Synchronization nested IE.
///
/// ```notrust
/// +-----+-------------+
/// | ASN | Join metric |
/// +-----+-------------+
/// 0     5             6
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TschSynchronization<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> TschSynchronization<T> {
    /// The content length of a TSCH Synchronization IE.
    pub const LEN: usize = 6;

    /// Create a new [`TschSynchronization`] reader/writer from a given
    /// buffer.
    pub fn new(data: T) -> Result<Self> {
        let sync = Self::new_unchecked(data);

        if sync.data.as_ref().len() < Self::LEN {
            return Err(Error::WrongLength);
        }

        Ok(sync)
    }

    /// Create a new [`TschSynchronization`] reader/writer from a given
    /// buffer without length checking.
    pub fn new_unchecked(data: T) -> Self {
        Self { data }
    }

    /// Return the absolute slot number field, a 5-octet little-endian
    /// integer.
    pub fn absolute_slot_number(&self) -> u64 {
        let data = self.data.as_ref();
        let mut asn = 0u64;
        for (i, b) in data[..5].iter().enumerate() {
            asn |= (*b as u64) << (8 * i);
        }
        asn
    }

    /// Return the join metric field.
    pub fn join_metric(&self) -> u8 {
        self.data.as_ref()[5]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> TschSynchronization<T> {
    /// Set the absolute slot number field.
    pub fn set_absolute_slot_number(&mut self, asn: u64) {
        let data = self.data.as_mut();
        for i in 0..5 {
            data[i] = ((asn >> (8 * i)) & 0xff) as u8;
        }
    }

    /// Set the join metric field.
    pub fn set_join_metric(&mut self, join_metric: u8) {
        self.data.as_mut()[5] = join_metric;
    }
}

impl<T: AsRef<[u8]>> core::fmt::Display for TschSynchronization<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "ASN: {}, join metric: {}",
            self.absolute_slot_number(),
            self.join_metric()
        )
    }
}

/// The TSCH timeslot timing template (IEEE 802.15.4-2020, Table 8-93).
///
/// All values are in microseconds. Template 0 is the default 10 ms
/// timeslot of the 2.4 GHz O-QPSK PHY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TschTimeslotTimings {
    id: u8,
    /// Offset from the slot start to the start of the CCA.
    cca_offset: Duration,
    /// Duration of the CCA.
    cca: Duration,
    /// Radio turnaround time.
    rx_tx: Duration,
    /// Offset from the slot start to the start of the TX.
    tx_offset: Duration,
    /// Maximum transmission time for a frame.
    max_tx: Duration,
    /// Wait between the end of the TX and the start of the ACK RX.
    rx_ack_delay: Duration,
    /// Maximum time to wait for an ACK.
    ack_wait: Duration,
    /// Offset from the slot start to the start of the RX.
    rx_offset: Duration,
    /// Maximum time to wait for an incoming frame.
    rx_wait: Duration,
    /// Wait between the end of the RX and the start of the ACK TX.
    tx_ack_delay: Duration,
    /// Maximum transmission time for an ACK.
    max_ack: Duration,
    /// Total length of the timeslot.
    timeslot_length: Duration,
}

impl Default for TschTimeslotTimings {
    fn default() -> Self {
        Self::new_2450_mhz(0, Self::DEFAULT_GUARD_TIME)
    }
}

impl TschTimeslotTimings {
    /// The default guard time (2200 us).
    pub const DEFAULT_GUARD_TIME: Duration = Duration::from_us(2200);

    /// Create the 10 ms timeslot template of the 2.4 GHz band.
    pub fn new_2450_mhz(id: u8, guard_time: Duration) -> Self {
        Self {
            id,
            cca_offset: Duration::from_us(1800),
            cca: Duration::from_us(128),
            tx_offset: Duration::from_us(2120),
            rx_offset: Duration::from_us(2120) - (guard_time / 2),
            rx_ack_delay: Duration::from_us(800),
            tx_ack_delay: Duration::from_us(1000),
            rx_wait: guard_time,
            ack_wait: Duration::from_us(400),
            rx_tx: Duration::from_us(192),
            max_ack: Duration::from_us(2400),
            max_tx: Duration::from_us(4256),
            timeslot_length: Duration::from_us(10000),
        }
    }

    /// Create a 25 ms timeslot template for the slower sub-GHz bands. The
    /// offsets scale with the slot length.
    pub fn new_sub_ghz(id: u8, guard_time: Duration) -> Self {
        Self {
            id,
            cca_offset: Duration::from_us(4500),
            cca: Duration::from_us(320),
            tx_offset: Duration::from_us(5300),
            rx_offset: Duration::from_us(5300) - (guard_time / 2),
            rx_ack_delay: Duration::from_us(2000),
            tx_ack_delay: Duration::from_us(2500),
            rx_wait: guard_time,
            ack_wait: Duration::from_us(1000),
            rx_tx: Duration::from_us(480),
            max_ack: Duration::from_us(6000),
            max_tx: Duration::from_us(10640),
            timeslot_length: Duration::from_us(25000),
        }
    }

    /// Return the timeslot template ID.
    pub const fn id(&self) -> u8 {
        self.id
    }

    /// Return the CCA offset.
    pub const fn cca_offset(&self) -> Duration {
        self.cca_offset
    }

    /// Set the CCA offset.
    pub fn set_cca_offset(&mut self, cca_offset: Duration) {
        self.cca_offset = cca_offset;
    }

    /// Return the CCA duration.
    pub const fn cca(&self) -> Duration {
        self.cca
    }

    /// Set the CCA duration.
    pub fn set_cca(&mut self, cca: Duration) {
        self.cca = cca;
    }

    /// Return the TX offset.
    pub const fn tx_offset(&self) -> Duration {
        self.tx_offset
    }

    /// Set the TX offset.
    pub fn set_tx_offset(&mut self, tx_offset: Duration) {
        self.tx_offset = tx_offset;
    }

    /// Return the RX offset.
    pub const fn rx_offset(&self) -> Duration {
        self.rx_offset
    }

    /// Set the RX offset.
    pub fn set_rx_offset(&mut self, rx_offset: Duration) {
        self.rx_offset = rx_offset;
    }

    /// Return the RX ACK delay.
    pub const fn rx_ack_delay(&self) -> Duration {
        self.rx_ack_delay
    }

    /// Set the RX ACK delay.
    pub fn set_rx_ack_delay(&mut self, rx_ack_delay: Duration) {
        self.rx_ack_delay = rx_ack_delay;
    }

    /// Return the TX ACK delay.
    pub const fn tx_ack_delay(&self) -> Duration {
        self.tx_ack_delay
    }

    /// Set the TX ACK delay.
    pub fn set_tx_ack_delay(&mut self, tx_ack_delay: Duration) {
        self.tx_ack_delay = tx_ack_delay;
    }

    /// Return the RX wait.
    pub const fn rx_wait(&self) -> Duration {
        self.rx_wait
    }

    /// Set the RX wait.
    pub fn set_rx_wait(&mut self, rx_wait: Duration) {
        self.rx_wait = rx_wait;
    }

    /// Return the ACK wait.
    pub const fn ack_wait(&self) -> Duration {
        self.ack_wait
    }

    /// Set the ACK wait.
    pub fn set_ack_wait(&mut self, ack_wait: Duration) {
        self.ack_wait = ack_wait;
    }

    /// Return the RX/TX turnaround time.
    pub const fn rx_tx(&self) -> Duration {
        self.rx_tx
    }

    /// Set the RX/TX turnaround time.
    pub fn set_rx_tx(&mut self, rx_tx: Duration) {
        self.rx_tx = rx_tx;
    }

    /// Return the maximum ACK transmission time.
    pub const fn max_ack(&self) -> Duration {
        self.max_ack
    }

    /// Set the maximum ACK transmission time.
    pub fn set_max_ack(&mut self, max_ack: Duration) {
        self.max_ack = max_ack;
    }

    /// Return the maximum frame transmission time.
    pub const fn max_tx(&self) -> Duration {
        self.max_tx
    }

    /// Set the maximum frame transmission time.
    pub fn set_max_tx(&mut self, max_tx: Duration) {
        self.max_tx = max_tx;
    }

    /// Return the timeslot length.
    pub const fn timeslot_length(&self) -> Duration {
        self.timeslot_length
    }

    /// Set the timeslot length.
    pub fn set_timeslot_length(&mut self, timeslot_length: Duration) {
        self.timeslot_length = timeslot_length;
    }

    /// Return the emitted length of the full template: 25 octets, or 27
    /// when `max_tx` or the timeslot length need three octets.
    pub fn buffer_len(&self) -> usize {
        if self.max_tx.as_us() > u16::MAX as i64 || self.timeslot_length.as_us() > u16::MAX as i64
        {
            27
        } else {
            25
        }
    }

    /// Emit the full template into a buffer of [`Self::buffer_len`] octets.
    pub fn emit(&self, buffer: &mut [u8]) {
        let mut emit_u16 = |offset: usize, value: Duration| {
            buffer[offset..][..2].copy_from_slice(&(value.as_us() as u16).to_le_bytes());
        };

        emit_u16(1, self.cca_offset);
        emit_u16(3, self.cca);
        emit_u16(5, self.tx_offset);
        emit_u16(7, self.rx_offset);
        emit_u16(9, self.rx_ack_delay);
        emit_u16(11, self.tx_ack_delay);
        emit_u16(13, self.rx_wait);
        emit_u16(15, self.ack_wait);
        emit_u16(17, self.rx_tx);
        emit_u16(19, self.max_ack);

        buffer[0] = self.id;

        if self.buffer_len() == 27 {
            let max_tx = (self.max_tx.as_us() as u32).to_le_bytes();
            buffer[21..24].copy_from_slice(&max_tx[..3]);
            let length = (self.timeslot_length.as_us() as u32).to_le_bytes();
            buffer[24..27].copy_from_slice(&length[..3]);
        } else {
            buffer[21..23].copy_from_slice(&(self.max_tx.as_us() as u16).to_le_bytes());
            buffer[23..25].copy_from_slice(&(self.timeslot_length.as_us() as u16).to_le_bytes());
        }
    }
}

impl core::fmt::Display for TschTimeslotTimings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "cca offset: {}", self.cca_offset())?;
        writeln!(f, "cca: {}", self.cca())?;
        writeln!(f, "tx offset: {}", self.tx_offset())?;
        writeln!(f, "rx offset: {}", self.rx_offset())?;
        writeln!(f, "rx ack delay: {}", self.rx_ack_delay())?;
        writeln!(f, "tx ack delay: {}", self.tx_ack_delay())?;
        writeln!(f, "rx wait: {}", self.rx_wait())?;
        writeln!(f, "ack wait: {}", self.ack_wait())?;
        writeln!(f, "rx/tx: {}", self.rx_tx())?;
        writeln!(f, "max ack: {}", self.max_ack())?;
        writeln!(f, "max tx: {}", self.max_tx())?;
        writeln!(f, "timeslot length: {}", self.timeslot_length())
    }
}

/// A reader/writer for the TSCH Timeslot nested IE.
///
/// The shortened form carries only the template ID; the full form carries
/// the complete timing template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TschTimeslot<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> TschTimeslot<T> {
    /// The default timeslot template ID.
    pub const DEFAULT_ID: u8 = 0;

    /// Create a new [`TschTimeslot`] reader/writer from a given buffer.
    pub fn new(data: T) -> Result<Self> {
        let slot = Self::new_unchecked(data);

        let len = slot.data.as_ref().len();
        if len < 1 || (len > 1 && len < 25) {
            return Err(Error::WrongLength);
        }

        Ok(slot)
    }

    /// Create a new [`TschTimeslot`] reader/writer from a given buffer
    /// without length checking.
    pub fn new_unchecked(data: T) -> Self {
        Self { data }
    }

    /// Return the timeslot template ID.
    pub fn id(&self) -> u8 {
        self.data.as_ref()[0]
    }

    /// Returns `true` when the IE carries a full timing template.
    pub fn has_timings(&self) -> bool {
        self.data.as_ref().len() >= 25
    }

    /// Return the timing template. The shortened form yields the default
    /// template of the 2.4 GHz band.
    pub fn timings(&self) -> TschTimeslotTimings {
        if !self.has_timings() {
            return TschTimeslotTimings::default();
        }

        let data = self.data.as_ref();
        let three_byte = data.len() >= 27;

        let read_u16 = |offset: usize| {
            Duration::from_us(u16::from_le_bytes([data[offset], data[offset + 1]]) as i64)
        };
        let read_final = |offset: usize| {
            if three_byte {
                Duration::from_us(u32::from_le_bytes([
                    data[offset],
                    data[offset + 1],
                    data[offset + 2],
                    0,
                ]) as i64)
            } else {
                read_u16(offset)
            }
        };

        let mut timings = TschTimeslotTimings::new_2450_mhz(self.id(), Duration::ZERO);
        timings.set_cca_offset(read_u16(1));
        timings.set_cca(read_u16(3));
        timings.set_tx_offset(read_u16(5));
        timings.set_rx_offset(read_u16(7));
        timings.set_rx_ack_delay(read_u16(9));
        timings.set_tx_ack_delay(read_u16(11));
        timings.set_rx_wait(read_u16(13));
        timings.set_ack_wait(read_u16(15));
        timings.set_rx_tx(read_u16(17));
        timings.set_max_ack(read_u16(19));
        timings.set_max_tx(read_final(21));
        timings.set_timeslot_length(read_final(if three_byte { 24 } else { 23 }));
        timings
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> TschTimeslot<T> {
    /// Set the timeslot template ID of the shortened form.
    pub fn set_id(&mut self, id: u8) {
        self.data.as_mut()[0] = id;
    }

    /// Emit a full timing template.
    pub fn set_timings(&mut self, timings: &TschTimeslotTimings) {
        timings.emit(self.data.as_mut());
    }
}

impl<T: AsRef<[u8]>> core::fmt::Display for TschTimeslot<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "template ID: {}", self.id())
    }
}

bitflags! {
    /// TSCH link options bitmap.
    ///
    /// ```notrust
    /// +----+----+--------+--------------+----------+----------+
    /// | Tx | Rx | Shared | Time keeping | Priority | Reserved |
    /// +----+----+--------+--------------+----------+----------+
    /// ```
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct TschLinkOption: u8 {
        /// The link may transmit.
        const Tx = 0b0000_0001;
        /// The link may receive.
        const Rx = 0b0000_0010;
        /// The link is shared between neighbors.
        const Shared = 0b0000_0100;
        /// Frames received on the link discipline the local clock.
        const TimeKeeping = 0b0000_1000;
        /// The link carries priority traffic.
        const Priority = 0b0001_0000;
    }
}

/// A reader/writer for a Link Information record inside a slotframe
/// descriptor.
///
/// ```notrust
/// +----------+----------------+--------------+
/// | Timeslot | Channel offset | Link options |
/// +----------+----------------+--------------+
/// 0          2                4              5
/// ```
pub struct LinkInformation<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> LinkInformation<T> {
    /// The length of a Link Information record.
    pub const LEN: usize = 5;

    /// Create a new [`LinkInformation`] reader/writer from a given buffer.
    pub fn new(data: T) -> Result<Self> {
        let link = Self::new_unchecked(data);

        if link.data.as_ref().len() < Self::LEN {
            return Err(Error::WrongLength);
        }

        Ok(link)
    }

    /// Create a new [`LinkInformation`] reader/writer from a given buffer
    /// without length checking.
    pub fn new_unchecked(data: T) -> Self {
        Self { data }
    }

    /// Return the timeslot field.
    pub fn timeslot(&self) -> u16 {
        let b = &self.data.as_ref()[0..2];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Return the channel offset field.
    pub fn channel_offset(&self) -> u16 {
        let b = &self.data.as_ref()[2..4];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Return the link options field.
    pub fn link_options(&self) -> TschLinkOption {
        TschLinkOption::from_bits_truncate(self.data.as_ref()[4])
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> LinkInformation<T> {
    /// Set the timeslot field.
    pub fn set_timeslot(&mut self, timeslot: u16) {
        self.data.as_mut()[0..2].copy_from_slice(&timeslot.to_le_bytes());
    }

    /// Set the channel offset field.
    pub fn set_channel_offset(&mut self, channel_offset: u16) {
        self.data.as_mut()[2..4].copy_from_slice(&channel_offset.to_le_bytes());
    }

    /// Set the link options field.
    pub fn set_link_options(&mut self, options: TschLinkOption) {
        self.data.as_mut()[4] = options.bits();
    }
}

/// An [`Iterator`] over [`LinkInformation`].
pub struct LinkInformationIterator<'f> {
    data: &'f [u8],
    offset: usize,
}

impl<'f> LinkInformationIterator<'f> {
    /// Create a new [`LinkInformationIterator`].
    pub fn new(data: &'f [u8]) -> Self {
        Self { data, offset: 0 }
    }
}

impl<'f> Iterator for LinkInformationIterator<'f> {
    type Item = LinkInformation<&'f [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        let link = LinkInformation::new(&self.data[self.offset.min(self.data.len())..]).ok()?;
        self.offset += LinkInformation::<&[u8]>::LEN;
        Some(link)
    }
}

/// A reader/writer for a Slotframe Descriptor.
///
/// ```notrust
/// +--------+------+-------+----------------------+
/// | Handle | Size | Links | Link information ... |
/// +--------+------+-------+----------------------+
/// 0        1      3       4
/// ```
pub struct SlotframeDescriptor<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> SlotframeDescriptor<T> {
    /// Create a new [`SlotframeDescriptor`] reader/writer from a given
    /// buffer.
    pub fn new(data: T) -> Result<Self> {
        let descriptor = Self::new_unchecked(data);

        if descriptor.data.as_ref().len() < 4 {
            return Err(Error::WrongLength);
        }

        if descriptor.data.as_ref().len() < descriptor.len() {
            return Err(Error::WrongLength);
        }

        Ok(descriptor)
    }

    /// Create a new [`SlotframeDescriptor`] reader/writer from a given
    /// buffer without length checking.
    pub fn new_unchecked(data: T) -> Self {
        Self { data }
    }

    /// Return the length of the descriptor in octets.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        4 + self.links() as usize * LinkInformation::<&[u8]>::LEN
    }

    /// Return the slotframe handle field.
    pub fn handle(&self) -> u8 {
        self.data.as_ref()[0]
    }

    /// Return the slotframe size field, in timeslots.
    pub fn size(&self) -> u16 {
        let b = &self.data.as_ref()[1..3];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Return the number of link information records.
    pub fn links(&self) -> u8 {
        self.data.as_ref()[3]
    }

    /// Return an [`Iterator`] over the link information records.
    pub fn link_informations(&self) -> LinkInformationIterator {
        LinkInformationIterator::new(
            &self.data.as_ref()[4..][..self.links() as usize * LinkInformation::<&[u8]>::LEN],
        )
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> SlotframeDescriptor<T> {
    /// Set the slotframe handle field.
    pub fn set_handle(&mut self, handle: u8) {
        self.data.as_mut()[0] = handle;
    }

    /// Set the slotframe size field.
    pub fn set_size(&mut self, size: u16) {
        self.data.as_mut()[1..3].copy_from_slice(&size.to_le_bytes());
    }

    /// Set the number of link information records.
    pub fn set_links(&mut self, links: u8) {
        self.data.as_mut()[3] = links;
    }

    /// Return a mutable reference to the link information records.
    pub fn content_mut(&mut self) -> &mut [u8] {
        &mut self.data.as_mut()[4..]
    }
}

/// An [`Iterator`] over [`SlotframeDescriptor`].
pub struct SlotframeDescriptorIterator<'f> {
    data: &'f [u8],
    offset: usize,
    remaining: usize,
}

impl<'f> SlotframeDescriptorIterator<'f> {
    /// Create a new [`SlotframeDescriptorIterator`] over `slotframes`
    /// descriptors.
    pub fn new(slotframes: usize, data: &'f [u8]) -> Self {
        Self {
            data,
            offset: 0,
            remaining: slotframes,
        }
    }
}

impl<'f> Iterator for SlotframeDescriptorIterator<'f> {
    type Item = SlotframeDescriptor<&'f [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let descriptor =
            SlotframeDescriptor::new(&self.data[self.offset.min(self.data.len())..]).ok()?;

        self.offset += descriptor.len();
        self.remaining -= 1;

        Some(descriptor)
    }
}

/// A reader/writer for the TSCH Slotframe and Link nested IE.
///
/// ```notrust
/// +----------------------+---------------------------+
/// | Number of slotframes | Slotframe descriptors ... |
/// +----------------------+---------------------------+
/// 0                      1
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TschSlotframeAndLink<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> TschSlotframeAndLink<T> {
    /// Create a new [`TschSlotframeAndLink`] reader/writer from a given
    /// buffer.
    pub fn new(data: T) -> Result<Self> {
        let sfl = Self::new_unchecked(data);

        if sfl.data.as_ref().is_empty() {
            return Err(Error::WrongLength);
        }

        // Walking the descriptors validates their lengths.
        let declared = sfl.number_of_slotframes() as usize;
        if sfl.slotframe_descriptors().count() != declared {
            return Err(Error::BadFormat);
        }

        Ok(sfl)
    }

    /// Create a new [`TschSlotframeAndLink`] reader/writer from a given
    /// buffer without length checking.
    pub fn new_unchecked(data: T) -> Self {
        Self { data }
    }

    /// Return the number of slotframes field.
    pub fn number_of_slotframes(&self) -> u8 {
        self.data.as_ref()[0]
    }

    /// Return an [`Iterator`] over the [`SlotframeDescriptor`]s.
    pub fn slotframe_descriptors(&self) -> SlotframeDescriptorIterator {
        SlotframeDescriptorIterator::new(
            self.number_of_slotframes() as usize,
            &self.data.as_ref()[1..],
        )
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> TschSlotframeAndLink<T> {
    /// Set the number of slotframes field.
    pub fn set_number_of_slotframes(&mut self, number_of_slotframes: u8) {
        self.data.as_mut()[0] = number_of_slotframes;
    }

    /// Return a mutable reference to the slotframe descriptors.
    pub fn content_mut(&mut self) -> &mut [u8] {
        &mut self.data.as_mut()[1..]
    }
}

impl<T: AsRef<[u8]>> core::fmt::Display for TschSlotframeAndLink<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#slotframes: {}", self.number_of_slotframes())
    }
}

/// A reader/writer for the Channel Hopping nested IE.
///
/// The shortened form carries only the hopping sequence ID. The full form
/// carries the complete sequence:
///
/// ```notrust
/// +----+------+------------+------------+---------+----------+-------------+
/// | ID | Page | # channels | PHY bitmap | Seq len | Channels | Current hop |
/// +----+------+------------+------------+---------+----------+-------------+
/// 0    1      2            4            8         10         10+2n
/// ```
///
/// The declared IE length must match the length implied by the sequence
/// length exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelHopping<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> ChannelHopping<T> {
    /// The content length of the shortened form.
    pub const SHORT_LEN: usize = 1;

    /// Create a new [`ChannelHopping`] reader/writer from a given buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is empty, or if a full-form buffer
    /// length does not exactly match the length implied by the hopping
    /// sequence length field.
    pub fn new(data: T) -> Result<Self> {
        let ch = Self::new_unchecked(data);

        let len = ch.data.as_ref().len();
        if len == 0 {
            return Err(Error::WrongLength);
        }

        if len > Self::SHORT_LEN {
            if len < 12 {
                return Err(Error::WrongLength);
            }

            let expected = 12 + ch.hopping_sequence_length() as usize * 2;
            if len != expected {
                return Err(Error::BadFormat);
            }
        }

        Ok(ch)
    }

    /// Create a new [`ChannelHopping`] reader/writer from a given buffer
    /// without length checking.
    pub fn new_unchecked(data: T) -> Self {
        Self { data }
    }

    /// Returns `true` when the IE carries the full hopping sequence.
    pub fn is_full(&self) -> bool {
        self.data.as_ref().len() > Self::SHORT_LEN
    }

    /// Return the hopping sequence ID field.
    pub fn hopping_sequence_id(&self) -> u8 {
        self.data.as_ref()[0]
    }

    /// Return the channel page field of the full form.
    pub fn channel_page(&self) -> u8 {
        self.data.as_ref()[1]
    }

    /// Return the number of channels field of the full form.
    pub fn number_of_channels(&self) -> u16 {
        let b = &self.data.as_ref()[2..4];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Return the PHY configuration bitmap of the full form.
    pub fn phy_configuration(&self) -> u32 {
        let b = &self.data.as_ref()[4..8];
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }

    /// Return the hopping sequence length field of the full form.
    pub fn hopping_sequence_length(&self) -> u16 {
        let b = &self.data.as_ref()[8..10];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Return an [`Iterator`] over the hopping sequence channels of the
    /// full form.
    pub fn hopping_sequence(&self) -> impl Iterator<Item = u16> + '_ {
        let len = self.hopping_sequence_length() as usize;
        self.data.as_ref()[10..][..len * 2]
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    /// Return the current hop field of the full form.
    pub fn current_hop(&self) -> u16 {
        let offset = 10 + self.hopping_sequence_length() as usize * 2;
        let b = &self.data.as_ref()[offset..][..2];
        u16::from_le_bytes([b[0], b[1]])
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> ChannelHopping<T> {
    /// Set the hopping sequence ID field.
    pub fn set_hopping_sequence_id(&mut self, id: u8) {
        self.data.as_mut()[0] = id;
    }

    /// Set the channel page field of the full form.
    pub fn set_channel_page(&mut self, page: u8) {
        self.data.as_mut()[1] = page;
    }

    /// Set the number of channels field of the full form.
    pub fn set_number_of_channels(&mut self, channels: u16) {
        self.data.as_mut()[2..4].copy_from_slice(&channels.to_le_bytes());
    }

    /// Set the PHY configuration bitmap of the full form.
    pub fn set_phy_configuration(&mut self, configuration: u32) {
        self.data.as_mut()[4..8].copy_from_slice(&configuration.to_le_bytes());
    }

    /// Set the hopping sequence of the full form, along with its length
    /// field.
    pub fn set_hopping_sequence(&mut self, sequence: &[u16]) {
        self.data.as_mut()[8..10].copy_from_slice(&(sequence.len() as u16).to_le_bytes());
        for (i, channel) in sequence.iter().enumerate() {
            self.data.as_mut()[10 + i * 2..][..2].copy_from_slice(&channel.to_le_bytes());
        }
    }

    /// Set the current hop field of the full form. The sequence length must
    /// have been set first.
    pub fn set_current_hop(&mut self, hop: u16) {
        let offset = 10 + self.hopping_sequence_length() as usize * 2;
        self.data.as_mut()[offset..][..2].copy_from_slice(&hop.to_le_bytes());
    }
}

impl<T: AsRef<[u8]>> core::fmt::Display for ChannelHopping<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sequence ID: {}", self.hopping_sequence_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_descriptor_short() {
        let mut buffer = [0u8; 8];
        let mut nested = NestedInformationElement::new_unchecked(&mut buffer[..]);
        nested.clear();
        let id = NestedSubId::Short(NestedSubIdShort::TschSynchronization);
        nested.set_length(6, id);
        nested.set_sub_id(id);

        assert_eq!(buffer[..2], [0x06, 0x1a]);

        let nested = NestedInformationElement::new(&buffer[..]).unwrap();
        assert!(nested.is_short());
        assert_eq!(nested.len(), 6);
        assert_eq!(
            nested.sub_id(),
            NestedSubId::Short(NestedSubIdShort::TschSynchronization)
        );
    }

    #[test]
    fn nested_descriptor_long() {
        let mut buffer = [0u8; 14];
        let mut nested = NestedInformationElement::new_unchecked(&mut buffer[..]);
        nested.clear();
        let id = NestedSubId::Long(NestedSubIdLong::ChannelHopping);
        nested.set_length(12, id);
        nested.set_sub_id(id);

        assert_eq!(buffer[..2], [0x0c, 0xc8]);

        let nested = NestedInformationElement::new(&buffer[..]).unwrap();
        assert!(nested.is_long());
        assert_eq!(nested.len(), 12);
        assert_eq!(
            nested.sub_id(),
            NestedSubId::Long(NestedSubIdLong::ChannelHopping)
        );
    }

    #[test]
    fn tsch_synchronization_roundtrip() {
        let mut buffer = [0u8; 6];
        let mut sync = TschSynchronization::new_unchecked(&mut buffer[..]);
        sync.set_absolute_slot_number(0xab_1234_5678);
        sync.set_join_metric(2);

        assert_eq!(buffer, [0x78, 0x56, 0x34, 0x12, 0xab, 0x02]);

        let sync = TschSynchronization::new(&buffer[..]).unwrap();
        assert_eq!(sync.absolute_slot_number(), 0xab_1234_5678);
        assert_eq!(sync.join_metric(), 2);
    }

    #[test]
    fn timeslot_template_roundtrip() {
        let timings = TschTimeslotTimings::default();
        assert_eq!(timings.buffer_len(), 25);

        let mut buffer = [0u8; 25];
        timings.emit(&mut buffer);

        let slot = TschTimeslot::new(&buffer[..]).unwrap();
        assert!(slot.has_timings());
        assert_eq!(slot.timings(), timings);
    }

    #[test]
    fn timeslot_short_form() {
        let slot = TschTimeslot::new(&[0x00][..]).unwrap();
        assert!(!slot.has_timings());
        assert_eq!(slot.id(), TschTimeslot::<&[u8]>::DEFAULT_ID);
        assert_eq!(slot.timings(), TschTimeslotTimings::default());
    }

    #[test]
    fn timeslot_three_byte_form() {
        let mut timings = TschTimeslotTimings::new_sub_ghz(1, Duration::from_us(2200));
        timings.set_timeslot_length(Duration::from_us(120_000));
        assert_eq!(timings.buffer_len(), 27);

        let mut buffer = [0u8; 27];
        timings.emit(&mut buffer);

        let slot = TschTimeslot::new(&buffer[..]).unwrap();
        assert_eq!(slot.timings().timeslot_length(), Duration::from_us(120_000));
    }

    #[test]
    fn slotframe_descriptor_roundtrip() {
        let mut buffer = [0u8; 9];
        let mut descriptor = SlotframeDescriptor::new_unchecked(&mut buffer[..]);
        descriptor.set_handle(1);
        descriptor.set_size(101);
        descriptor.set_links(1);
        let mut link = LinkInformation::new_unchecked(descriptor.content_mut());
        link.set_timeslot(3);
        link.set_channel_offset(2);
        link.set_link_options(TschLinkOption::Tx | TschLinkOption::TimeKeeping);

        let descriptor = SlotframeDescriptor::new(&buffer[..]).unwrap();
        assert_eq!(descriptor.handle(), 1);
        assert_eq!(descriptor.size(), 101);
        assert_eq!(descriptor.links(), 1);
        assert_eq!(descriptor.len(), 9);

        let link = descriptor.link_informations().next().unwrap();
        assert_eq!(link.timeslot(), 3);
        assert_eq!(link.channel_offset(), 2);
        assert_eq!(
            link.link_options(),
            TschLinkOption::Tx | TschLinkOption::TimeKeeping
        );
    }

    #[test]
    fn slotframe_and_link_validates_descriptors() {
        // One descriptor declared, but the buffer is too short for it.
        let data = [0x01, 0x00, 0x65];
        assert!(TschSlotframeAndLink::new(&data[..]).is_err());
    }

    #[test]
    fn channel_hopping_short_form() {
        let ch = ChannelHopping::new(&[0x00][..]).unwrap();
        assert!(!ch.is_full());
        assert_eq!(ch.hopping_sequence_id(), 0);
    }

    #[test]
    fn channel_hopping_full_roundtrip() {
        let sequence = [20u16, 25, 26, 15];
        let mut buffer = [0u8; 12 + 8];
        let mut ch = ChannelHopping::new_unchecked(&mut buffer[..]);
        ch.set_hopping_sequence_id(1);
        ch.set_channel_page(0);
        ch.set_number_of_channels(16);
        ch.set_phy_configuration(0x0000_07ff);
        ch.set_hopping_sequence(&sequence);
        ch.set_current_hop(2);

        let ch = ChannelHopping::new(&buffer[..]).unwrap();
        assert!(ch.is_full());
        assert_eq!(ch.hopping_sequence_id(), 1);
        assert_eq!(ch.channel_page(), 0);
        assert_eq!(ch.number_of_channels(), 16);
        assert_eq!(ch.phy_configuration(), 0x0000_07ff);
        assert_eq!(ch.hopping_sequence_length(), 4);
        let channels: std::vec::Vec<u16> = ch.hopping_sequence().collect();
        assert_eq!(channels, sequence);
        assert_eq!(ch.current_hop(), 2);
    }

    #[test]
    fn channel_hopping_rejects_length_mismatch() {
        // Sequence length of 4 declared but only 3 channels present.
        let mut buffer = [0u8; 12 + 6];
        {
            let mut ch = ChannelHopping::new_unchecked(&mut buffer[..]);
            ch.set_hopping_sequence_id(1);
            buffer[8..10].copy_from_slice(&4u16.to_le_bytes());
        }
        assert_eq!(
            ChannelHopping::new(&buffer[..]).unwrap_err(),
            Error::BadFormat
        );
    }
}
