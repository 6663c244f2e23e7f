mod codec;
mod device;
mod table;

pub use codec::DeviceCharset;
pub use device::device_table;
pub use table::{
    CharsetEntry, CharsetTable, DecodeSlot, DecodeTable, EncodeTable, GroupEntry, DEFAULT_GLYPH,
};
