use std::io::{Seek, SeekFrom, Write};

use binrw::BinWrite;
use log::debug;

use crate::error::{CcmlError, Result};
use crate::format::{serialize_record, StoreHeader, POINTERS_START};
use crate::method::Method;
use crate::search::{bucket_prefixes, bucket_space};

/// Single-use writer for one method store.
///
/// Writes the fixed header, reserves a zeroed pointer table, appends the
/// records in sort-key order while advancing a cursor over the bucket
/// lower bounds, then rewrites the pointer table with the real offsets.
/// Every bucket pointer ends up at the offset of the first record whose
/// sort key is >= the bucket's lower bound, or at end-of-file.
pub struct StoreWriter<W: Write + Seek> {
    writer: W,
    header: StoreHeader,
    pointers: Vec<u32>,
}

impl<W: Write + Seek> StoreWriter<W> {
    pub fn new(writer: W, stage: u8, depth: u8) -> Result<Self> {
        let slots = bucket_space(depth);
        // the pointer table itself must sit below the u32 offset limit
        let table_end = slots
            .checked_mul(4)
            .and_then(|bytes| bytes.checked_add(POINTERS_START));
        if table_end.is_none_or(|end| end > u64::from(u32::MAX)) {
            return Err(CcmlError::InvalidArgument(format!(
                "index depth {} does not fit u32 store offsets",
                depth
            )));
        }
        let slots = usize::try_from(slots).map_err(|_| {
            CcmlError::InvalidArgument(format!("index depth {} is too large", depth))
        })?;
        Ok(Self {
            writer,
            header: StoreHeader::new(stage, depth),
            pointers: vec![0; slots],
        })
    }

    fn offset_slot(offset: u64) -> Result<u32> {
        u32::try_from(offset)
            .map_err(|_| CcmlError::InvalidFormat(format!("store offset {} overflows u32", offset)))
    }

    /// Write the whole store. `methods` must already be sorted by sort
    /// key and share the writer's stage. Returns the total file length.
    pub fn write_store(mut self, methods: &[Method]) -> Result<u64> {
        self.writer.seek(SeekFrom::Start(0))?;
        self.header.write_to(&mut self.writer)?;
        // placeholder pointer table; patched once offsets are known
        self.pointers.write_le(&mut self.writer)?;

        let prefixes = bucket_prefixes(self.header.depth);
        let mut cursor = 0usize;

        for method in methods {
            if method.stage != self.header.stage {
                return Err(CcmlError::InvariantViolation(format!(
                    "method {:?} has stage {}, store has stage {}",
                    method.title, method.stage, self.header.stage
                )));
            }

            let offset = self.writer.stream_position()?;
            while cursor < prefixes.len() && prefixes[cursor].as_str() < method.sort_title.as_str()
            {
                self.pointers[cursor] = Self::offset_slot(offset)?;
                cursor += 1;
            }

            let bytes = serialize_record(method)?;
            self.writer.write_all(&bytes)?;
        }

        // every remaining bucket, including the implicit sentinel range,
        // points at end-of-file
        let end = self.writer.stream_position()?;
        while cursor < self.pointers.len() {
            self.pointers[cursor] = Self::offset_slot(end)?;
            cursor += 1;
        }

        self.writer.seek(SeekFrom::Start(POINTERS_START))?;
        self.pointers.write_le(&mut self.writer)?;
        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()?;

        debug!(
            "wrote store: stage {} depth {} records {} bytes {}",
            self.header.stage,
            self.header.depth,
            methods.len(),
            end
        );
        Ok(end)
    }
}
