use std::io::{Read, Seek, Write};

use binrw::{BinRead, BinWrite};

use crate::error::Result;

pub const MAGIC: [u8; 4] = *b"CCML";
pub const VERSION: u8 = 0x02;

/// File offset of the pointer table, immediately after the fixed header.
pub const POINTERS_START: u64 = 8;

/// Fixed-size store header: magic, format version, stage, one reserved
/// byte, index depth.
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = b"CCML")]
#[br(assert(version == VERSION, "unsupported store version"))]
#[br(assert(reserved == 0, "reserved header byte is not zero"))]
#[bw(assert(*reserved == 0, "reserved header byte is not zero"))]
pub struct StoreHeader {
    pub version: u8,
    pub stage: u8,
    reserved: u8,
    pub depth: u8,
}

impl StoreHeader {
    pub fn new(stage: u8, depth: u8) -> Self {
        Self {
            version: VERSION,
            stage,
            reserved: 0,
            depth,
        }
    }

    pub fn write_to<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        self.write_le(writer)?;
        Ok(())
    }

    pub fn read_from<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        Ok(Self::read_le(reader)?)
    }
}
