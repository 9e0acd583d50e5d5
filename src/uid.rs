//! Text encodings of a captured FIFO payload.
//!
//! Byte 0 of the FIFO is a frame header and is never rendered. Both encodings
//! print bytes from the highest index down.

use crate::register::Fifo;
use core::fmt::{self, Write};
use heapless::String;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

pub const UID_STR_LEN: usize = 16;
pub const MERG_STR_LEN: usize = 12;

fn write_hex<W: Write>(out: &mut W, byte: u8) -> fmt::Result {
    out.write_char(HEX[(byte >> 4) as usize] as char)?;
    out.write_char(HEX[(byte & 0x0F) as usize] as char)
}

/// Bytes 8..=1 as 16 uppercase hex digits.
pub fn write_uid<W: Write>(fifo: &Fifo, out: &mut W) -> fmt::Result {
    for &b in fifo[1..].iter().rev() {
        write_hex(out, b)?;
    }
    Ok(())
}

/// XOR of bytes 5..=1.
pub fn merg_checksum(fifo: &Fifo) -> u8 {
    fifo[1..=5].iter().fold(0, |acc, b| acc ^ b)
}

/// Bytes 5..=1 followed by their XOR checksum, 12 uppercase hex digits.
pub fn write_merg<W: Write>(fifo: &Fifo, out: &mut W) -> fmt::Result {
    for &b in fifo[1..=5].iter().rev() {
        write_hex(out, b)?;
    }
    write_hex(out, merg_checksum(fifo))
}

pub fn uid_string(fifo: &Fifo) -> String<UID_STR_LEN> {
    let mut s = String::new();
    // capacity is exactly the rendered length
    let _ = write_uid(fifo, &mut s);
    s
}

pub fn merg_string(fifo: &Fifo) -> String<MERG_STR_LEN> {
    let mut s = String::new();
    let _ = write_merg(fifo, &mut s);
    s
}
