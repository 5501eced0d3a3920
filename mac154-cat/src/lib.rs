//! Render IEEE 802.15.4 frames for human eyes.

use colored::*;
use mac154_frame::*;

struct Writer<'b> {
    buffer: &'b mut String,
    indent: usize,
}

impl<'b> Writer<'b> {
    fn new(buffer: &'b mut String) -> Self {
        Self { buffer, indent: 0 }
    }

    fn increase_indent(&mut self) {
        self.indent += 2;
    }

    fn decrease_indent(&mut self) {
        self.indent -= 2;
    }

    fn writeln(&mut self, s: String) {
        self.buffer.push_str(&" ".repeat(self.indent));
        self.buffer.push_str(&s);
        self.buffer.push('\n');
    }
}

/// Parses a frame and renders every field of it into a string.
pub struct FrameParser {}

impl FrameParser {
    /// Parse a frame given as a hex string.
    pub fn parse_hex(input: &str) -> Result<String> {
        let data = hex::decode(input).map_err(|_| Error::BadFormat)?;
        Self::parse(&data)
    }

    /// Parse a frame and render it.
    pub fn parse(input: &[u8]) -> Result<String> {
        let frame = Frame::new(input)?;
        let mut buffer = String::new();
        let mut w = Writer::new(&mut buffer);

        let fc = frame.frame_control();

        w.writeln("Frame Control".underline().bold().to_string());
        w.increase_indent();
        w.writeln(format!(
            "{}: {}",
            "frame type".bold(),
            format!(
                "{}{:?}",
                if fc.frame_version() == FrameVersion::Ieee802154_2020
                    && matches!(fc.frame_type(), FrameType::Beacon | FrameType::Ack)
                {
                    "Enhanced "
                } else {
                    ""
                },
                fc.frame_type()
            )
            .bright_blue(),
        ));
        w.writeln(format!(
            "{}: {}",
            "security".bold(),
            fc.security_enabled() as usize
        ));
        w.writeln(format!(
            "{}: {}",
            "frame pending".bold(),
            fc.frame_pending() as usize
        ));
        w.writeln(format!(
            "{}: {}",
            "ack request".bold(),
            fc.ack_request() as usize
        ));
        w.writeln(format!(
            "{}: {}",
            "pan id compression".bold(),
            fc.pan_id_compression() as usize
        ));
        w.writeln(format!(
            "{}: {}",
            "sequence number suppression".bold(),
            fc.sequence_number_suppression() as usize
        ));
        w.writeln(format!(
            "{}: {}",
            "information elements present".bold(),
            fc.information_elements_present() as usize
        ));
        w.writeln(format!(
            "{}: {:?}",
            "dst addressing mode".bold(),
            fc.dst_addressing_mode()
        ));
        w.writeln(format!(
            "{}: {:?}",
            "src addressing mode".bold(),
            fc.src_addressing_mode()
        ));
        w.writeln(format!(
            "{}: {:?}",
            "frame version".bold(),
            fc.frame_version()
        ));
        w.decrease_indent();

        if let Some(sequence_number) = frame.sequence_number() {
            w.writeln(format!(
                "{}: {}",
                "Sequence Number".underline().bold(),
                sequence_number
            ));
        }

        if let Some(addressing) = frame.addressing() {
            w.writeln("Addressing".underline().bold().to_string());
            w.increase_indent();

            if let Some(dst_pan_id) = addressing.dst_pan_id() {
                w.writeln(format!("{}: {:x}", "dst pan id".bold(), dst_pan_id));
            }

            if let Some(dst_addr) = addressing.dst_address() {
                w.writeln(format!(
                    "{}: {}{}",
                    "dst addr".bold(),
                    dst_addr,
                    if dst_addr.is_broadcast() {
                        " (broadcast)".dimmed().to_string()
                    } else {
                        String::new()
                    }
                ));
            }

            if let Some(src_pan_id) = addressing.src_pan_id() {
                w.writeln(format!("{}: {:x}", "src pan id".bold(), src_pan_id));
            }

            if let Some(src_addr) = addressing.src_address() {
                w.writeln(format!("{}: {}", "src addr".bold(), src_addr));
            }

            w.decrease_indent();
        }

        if let Some(aux) = frame.auxiliary_security_header() {
            w.writeln("Auxiliary Security Header".underline().bold().to_string());
            w.increase_indent();

            let control = aux.security_control();
            match control.security_level() {
                Ok(level) => w.writeln(format!("{}: {:?}", "security level".bold(), level)),
                Err(_) => w.writeln(format!("{}: reserved", "security level".bold())),
            }
            w.writeln(format!(
                "{}: {:?}",
                "key identifier mode".bold(),
                control.key_identifier_mode()
            ));
            if let Some(counter) = aux.frame_counter() {
                w.writeln(format!("{}: {}", "frame counter".bold(), counter));
            }

            w.decrease_indent();
        }

        if let Some(ie) = frame.information_elements() {
            w.writeln("Information Elements".underline().bold().to_string());
            w.increase_indent();

            let headers: Vec<_> = ie.header_information_elements().collect();
            if !headers.is_empty() {
                w.writeln("Header Information Elements".italic().to_string());
                w.increase_indent();
                for header in headers {
                    w.writeln(format!("{header}"));
                }
                w.decrease_indent();
            }

            let payloads: Vec<_> = ie.payload_information_elements().collect();
            if !payloads.is_empty() {
                w.writeln("Payload Information Elements".italic().to_string());
                w.increase_indent();
                for payload in payloads {
                    match payload.group_id() {
                        PayloadGroupId::Mlme => {
                            w.writeln("MLME".to_string());
                            w.increase_indent();
                            for nested in payload.nested_information_elements() {
                                w.writeln(format!("{nested}"));
                            }
                            w.decrease_indent();
                        }
                        id => w.writeln(format!("{:?}({:0x?})", id, payload.content())),
                    }
                }
                w.decrease_indent();
            }

            w.decrease_indent();
        }

        if let Some(payload) = frame.payload() {
            w.writeln("Payload".underline().bold().to_string());
            w.increase_indent();
            w.writeln(format!("{}", hex::encode(payload).bright_green()));
            w.decrease_indent();
        }

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(hex_frame: &str) -> String {
        let rendered = FrameParser::parse_hex(hex_frame).unwrap();
        String::from_utf8(strip_ansi_escapes::strip(rendered)).unwrap()
    }

    #[test]
    fn renders_an_imm_ack() {
        let rendered = render("02002a");
        assert!(rendered.contains("frame type: Ack"));
        assert!(rendered.contains("Sequence Number: 42"));
    }

    #[test]
    fn renders_a_data_frame() {
        let rendered = render("618805cdabefbe34126869");
        assert!(rendered.contains("frame type: Data"));
        assert!(rendered.contains("dst pan id: abcd"));
        assert!(rendered.contains("dst addr: be:ef"));
        assert!(rendered.contains("src addr: 12:34"));
        assert!(rendered.contains("6869"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(FrameParser::parse_hex("zz").is_err());
        assert!(FrameParser::parse_hex("02").is_err());
    }
}
