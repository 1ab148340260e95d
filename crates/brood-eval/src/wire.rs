//! Wire primitives shared by both ends of the protocol.
//!
//! Integers travel big-endian; strings are plain UTF-8 with a leading
//! unsigned 16-bit byte length (not Java's modified UTF-8).

use brood_core::Result;
use brood_error::{brood_bail, brood_err};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

pub fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() > u16::MAX as usize {
        brood_bail!(Protocol: "string of {} bytes exceeds the wire limit", bytes.len());
    }

    writer.write_u16::<BigEndian>(bytes.len() as u16)?;
    writer.write_all(bytes)?;
    Ok(())
}

pub fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let length = reader.read_u16::<BigEndian>()? as usize;
    let mut bytes = vec![0u8; length];
    reader.read_exact(&mut bytes)?;

    String::from_utf8(bytes).map_err(|_| brood_err!(Protocol: "string is not valid UTF-8"))
}

pub fn write_count<W: Write>(writer: &mut W, count: usize) -> Result<()> {
    writer.write_i32::<BigEndian>(count as i32)?;
    Ok(())
}

pub fn read_count<R: Read>(reader: &mut R) -> Result<usize> {
    let count = reader.read_i32::<BigEndian>()?;
    if count < 0 {
        brood_bail!(Protocol: "negative count {} on the wire", count);
    }
    Ok(count as usize)
}
