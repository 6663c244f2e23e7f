use std::cell::RefCell;

use fnv::FnvHashMap;
use icu::normalizer::DecomposingNormalizerBorrowed;
use log::warn;

use crate::error::{CcmlError, Result};

use super::device::device_table;
use super::table::{CharsetTable, DecodeSlot, DecodeTable, EncodeTable, DEFAULT_GLYPH};

/// Bidirectional codec between Unicode text and the device byte charset.
///
/// Encoding is longest-match over the derived encode table, so combining
/// sequences that collapse to a single device byte win over their parts.
/// Characters outside the table fall back to a lossy ASCII transliteration
/// of their compatibility decomposition; a character with no ASCII
/// decomposition fails the whole string.
pub struct DeviceCharset {
    table: CharsetTable,
    encode: EncodeTable,
    decode: DecodeTable,
    nfkd: DecomposingNormalizerBorrowed<'static>,
    fallback_cache: RefCell<FnvHashMap<char, Option<Vec<u8>>>>,
}

impl DeviceCharset {
    pub fn new() -> Result<Self> {
        let table = device_table()?;
        let encode = EncodeTable::build(&table)?;
        let decode = DecodeTable::build(&table)?;
        Ok(Self {
            table,
            encode,
            decode,
            nfkd: DecomposingNormalizerBorrowed::new_nfkd(),
            fallback_cache: RefCell::new(FnvHashMap::default()),
        })
    }

    pub fn table(&self) -> &CharsetTable {
        &self.table
    }

    pub fn encode_table(&self) -> &EncodeTable {
        &self.encode
    }

    pub fn decode_slot(&self, lead: u8) -> Option<&DecodeSlot> {
        self.decode.get(lead)
    }

    /// Whether `text` is a primary entry of the encode table.
    pub fn has_primary(&self, text: &str) -> bool {
        self.encode.contains(text)
    }

    fn fallback_char(&self, c: char) -> Option<Vec<u8>> {
        if let Some(cached) = self.fallback_cache.borrow().get(&c) {
            return cached.clone();
        }

        let text = c.to_string();
        let norm = self.nfkd.normalize(&text);
        let first = norm.chars().next().unwrap_or(c);
        let mapped = if first.is_ascii_alphanumeric() || first.is_ascii_punctuation() {
            let bytes: Vec<u8> = norm.chars().filter(char::is_ascii).map(|a| a as u8).collect();
            warn!("char normalising {:?} -> {:?}", c, bytes);
            Some(bytes)
        } else {
            warn!("char skipping {:?}", c);
            None
        };

        self.fallback_cache.borrow_mut().insert(c, mapped.clone());
        mapped
    }

    /// Encode a single character, using the ASCII fallback if it is not in
    /// the table. `None` means the character cannot be represented at all.
    pub fn encode_char(&self, c: char) -> Option<Vec<u8>> {
        if let Some(bytes) = self.encode.get(&c.to_string()) {
            return Some(bytes.to_vec());
        }
        self.fallback_char(c)
    }

    /// Encode a whole string with longest-match scanning.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let chars: Vec<char> = text.chars().collect();
        let mut out = Vec::new();
        let mut index = 0;
        while index < chars.len() {
            let mut matched = None;
            let limit = (index + self.encode.max_len()).min(chars.len());
            for end in (index + 1..=limit).rev() {
                let candidate: String = chars[index..end].iter().collect();
                if let Some(bytes) = self.encode.get_with_len(end - index, &candidate) {
                    matched = Some((bytes.to_vec(), end));
                    break;
                }
            }
            match matched {
                Some((bytes, end)) => {
                    out.extend_from_slice(&bytes);
                    index = end;
                }
                None => {
                    let c = chars[index];
                    match self.fallback_char(c) {
                        Some(bytes) => out.extend_from_slice(&bytes),
                        None => {
                            return Err(CcmlError::UnmappableChar(format!(
                                "{:?} in {:?}",
                                c, text
                            )))
                        }
                    }
                    index += 1;
                }
            }
        }
        Ok(out)
    }

    /// Decode a device byte sequence. Unknown bytes and unknown trail bytes
    /// render as the default glyph; decoding never fails.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::new();
        let mut iter = bytes.iter();
        while let Some(&lead) = iter.next() {
            match self.decode.get(lead) {
                Some(DecodeSlot::Text(text)) => out.push_str(text),
                Some(DecodeSlot::Group(map)) => {
                    match iter.next().and_then(|trail| map.get(trail)) {
                        Some(text) => out.push_str(text),
                        None => out.push(DEFAULT_GLYPH),
                    }
                }
                None => out.push(DEFAULT_GLYPH),
            }
        }
        out
    }
}
