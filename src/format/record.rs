use std::io::{Cursor, Read, Seek};

use binrw::{BinRead, BinWrite};

use crate::error::{CcmlError, Result};
use crate::method::Method;

/// Maximum device-encoded title length, including the terminator byte.
pub const MAX_TITLE_LENGTH: usize = 128;
/// Maximum notation word count.
pub const MAX_NOTATION_LENGTH: usize = 256;

/// Record body, after the outer u16 total-length prefix.
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
struct RecordBody {
    title_len: u8,
    /// Title bytes plus one null terminator.
    #[br(count = title_len as usize + 1)]
    title: Vec<u8>,
    word_count: u16,
    #[br(count = word_count)]
    words: Vec<u16>,
    lead_count: u16,
    hunt_bells: u16,
}

/// Serialize one record as a length-prefixed variable-size binary record.
pub fn serialize_record(method: &Method) -> Result<Vec<u8>> {
    if method.device_title.len() + 1 > MAX_TITLE_LENGTH {
        return Err(CcmlError::TitleTooLong(method.title.clone()));
    }
    if method.notation.len() > MAX_NOTATION_LENGTH {
        return Err(CcmlError::NotationTooLong(method.title.clone()));
    }

    let mut title = method.device_title.clone();
    title.push(0);
    let body = RecordBody {
        title_len: method.device_title.len() as u8,
        title,
        word_count: method.notation.len() as u16,
        words: method.notation.clone(),
        lead_count: method.lead_count,
        hunt_bells: method.hunt_bells,
    };

    let mut cursor = Cursor::new(Vec::new());
    body.write_le(&mut cursor)?;
    let bytes = cursor.into_inner();

    let total = u16::try_from(bytes.len())
        .map_err(|_| CcmlError::InvalidFormat(format!("record too large: {}", method.title)))?;
    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.extend_from_slice(&total.to_le_bytes());
    out.extend_from_slice(&bytes);
    Ok(out)
}

/// Parsed record, used to verify store contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub title: Vec<u8>,
    pub words: Vec<u16>,
    pub lead_count: u16,
    pub hunt_bells: u16,
}

/// Read one length-prefixed record.
pub fn read_record<R: Read + Seek>(reader: &mut R) -> Result<RawRecord> {
    let total = u16::read_le(reader)?;
    let mut bytes = vec![0u8; total as usize];
    reader.read_exact(&mut bytes)?;
    let body = RecordBody::read_le(&mut Cursor::new(bytes))?;
    if body.title.last() != Some(&0) {
        return Err(CcmlError::InvalidFormat(
            "record title is not null-terminated".to_string(),
        ));
    }
    let mut title = body.title;
    title.pop();
    Ok(RawRecord {
        title,
        words: body.words,
        lead_count: body.lead_count,
        hunt_bells: body.hunt_bells,
    })
}
