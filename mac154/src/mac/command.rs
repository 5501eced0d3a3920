//! MAC command frame creation.
//!
//! A command frame is built in two steps: [`MacContext::create_mac_cmd_frame`]
//! emits the MAC header and the command frame identifier into a
//! max-MTU buffer and hands back a [`MacCommandFrame`]; the caller fills
//! the per-identifier content and [`MacCommandFrame::finish`] validates
//! its length against the §7.5 table.

use mac154_frame::{Address, CommandId, FrameBuilder, FrameVersion};

use super::constants::MAC_PAN_ID_BROADCAST;
use super::{Error, MacContext, Result};
use crate::phy::FrameBuffer;

/// A command frame under construction.
pub struct MacCommandFrame {
    /// The buffer holding the emitted header and identifier.
    pub frame: FrameBuffer,
    command_id: CommandId,
    content_offset: usize,
}

impl MacCommandFrame {
    /// The octets following the command frame identifier, for the caller
    /// to fill.
    pub fn content_mut(&mut self) -> &mut [u8] {
        &mut self.frame.buffer[self.content_offset..]
    }

    /// Validate the content length against the identifier and return the
    /// finished frame.
    pub fn finish(mut self, content_len: usize) -> Result<FrameBuffer> {
        let required = self.command_id.content_len();
        let valid = content_len == required
            || (self.command_id == CommandId::CoordinatorRealignment
                && content_len == required + 1);
        if !valid {
            return Err(Error::Invalid);
        }

        self.frame.len = self.content_offset + content_len;
        Ok(self.frame)
    }
}

/// The addressing of an outgoing MAC command.
#[derive(Debug, Clone, Copy)]
pub struct CommandParams {
    /// The destination PAN ID.
    pub dst_pan_id: u16,
    /// The destination address; absent where §7.5 says so.
    pub dst_address: Address,
    /// The source PAN ID.
    pub src_pan_id: u16,
    /// The source address; absent where §7.5 says so.
    pub src_address: Address,
}

impl CommandParams {
    /// The addressing of a broadcast beacon request.
    pub fn beacon_request() -> Self {
        Self {
            dst_pan_id: MAC_PAN_ID_BROADCAST,
            dst_address: Address::BROADCAST,
            src_pan_id: MAC_PAN_ID_BROADCAST,
            src_address: Address::Absent,
        }
    }
}

impl MacContext {
    /// Allocate a max-MTU buffer and write the MAC header followed by the
    /// command frame identifier.
    ///
    /// The §7.5 addressing constraints of the identifier are enforced;
    /// a violation fails the whole operation before anything is emitted.
    pub fn create_mac_cmd_frame(
        &mut self,
        command_id: CommandId,
        params: &CommandParams,
    ) -> Result<MacCommandFrame> {
        command_id.validate_addressing(
            params.dst_address.into(),
            params.src_address.into(),
            params.dst_address.is_broadcast(),
        )?;

        let sequence_number = self.next_sequence_number();

        let payload = [command_id.as_byte()];
        let mut builder = FrameBuilder::new_mac_command(command_id, &payload)
            .map_err(Error::from)?
            .set_frame_version(FrameVersion::Ieee802154_2006)
            .set_sequence_number(sequence_number);

        if !params.dst_address.is_absent() {
            builder = builder
                .set_dst_pan_id(params.dst_pan_id)
                .set_dst_address(params.dst_address);
        }

        if !params.src_address.is_absent() {
            builder = builder
                .set_src_pan_id(params.src_pan_id)
                .set_src_address(params.src_address);
        }

        let repr = builder.finalize().map_err(Error::from)?;

        let mut frame = FrameBuffer::default();
        let emitted = repr.buffer_len();
        repr.emit(&mut frame.buffer[..emitted]);
        frame.len = emitted;

        Ok(MacCommandFrame {
            frame,
            command_id,
            content_offset: emitted,
        })
    }
}
