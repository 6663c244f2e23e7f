mod header;
mod record;

pub use header::{StoreHeader, MAGIC, POINTERS_START, VERSION};
pub use record::{
    read_record, serialize_record, RawRecord, MAX_NOTATION_LENGTH, MAX_TITLE_LENGTH,
};
