//! Hex formatting for page offsets, header fields and raw page dumps.

use std::fmt::Write;

/// Bytes shown per dump line.
const DUMP_WIDTH: usize = 16;

/// Format a byte offset as "decimal (0xhex)".
pub fn format_offset(offset: u64) -> String {
    format!("{} (0x{:x})", offset, offset)
}

/// Format a 32-bit header field (checksums, flags) as zero-padded hex.
pub fn format_hex32(value: u32) -> String {
    format!("0x{:08x}", value)
}

/// Format bytes as a compact lowercase hex string.
///
/// ```
/// use ibr::util::hex::format_bytes;
///
/// assert_eq!(format_bytes(&[0xde, 0xad, 0x00]), "dead00");
/// ```
pub fn format_bytes(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for b in data {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Dump `data` 16 bytes per line, addressed from `base_offset`.
///
/// ```text
/// 0000c000  00 00 00 00 00 00 00 07  ff ff ff ff ff ff ff ff  |................|
/// ```
pub fn hex_dump(data: &[u8], base_offset: u64) -> String {
    data.chunks(DUMP_WIDTH)
        .enumerate()
        .map(|(i, chunk)| dump_line(base_offset + (i * DUMP_WIDTH) as u64, chunk))
        .collect::<Vec<_>>()
        .join("\n")
}

fn dump_line(offset: u64, chunk: &[u8]) -> String {
    let mut line = format!("{:08x}  ", offset);
    for slot in 0..DUMP_WIDTH {
        if slot == DUMP_WIDTH / 2 {
            line.push(' ');
        }
        match chunk.get(slot) {
            Some(b) => {
                let _ = write!(line, "{:02x} ", b);
            }
            None => line.push_str("   "),
        }
    }
    line.push_str(" |");
    for slot in 0..DUMP_WIDTH {
        line.push(match chunk.get(slot) {
            Some(&b) if b.is_ascii_graphic() || b == b' ' => b as char,
            Some(_) => '.',
            None => ' ',
        });
    }
    line.push('|');
    line
}
