use std::collections::{BTreeMap, HashMap};

use icu::normalizer::ComposingNormalizerBorrowed;

use crate::error::{CcmlError, Result};

/// Glyph rendered for device bytes with no table entry.
pub const DEFAULT_GLYPH: char = ' ';

/// One trail-byte slot inside a multi-byte group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupEntry {
    Primary(String),
    Alias(String),
}

/// One lead-byte slot of the charset table: a direct mapping, an alias
/// that renders like another entry but never appears in the encode table,
/// or a nested trail-byte group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharsetEntry {
    Primary(String),
    Alias(String),
    Group(BTreeMap<u8, GroupEntry>),
}

/// Hand-built lead/trail byte table. Every stored string must be NFC and
/// every alias must point at a primary entry somewhere in the table.
#[derive(Debug, Clone, Default)]
pub struct CharsetTable {
    slots: BTreeMap<u8, CharsetEntry>,
}

fn check_nfc(text: &str) -> Result<()> {
    if !ComposingNormalizerBorrowed::new_nfc().is_normalized(text) {
        return Err(CcmlError::InvalidArgument(format!(
            "charset entry {:?} is not NFC",
            text
        )));
    }
    Ok(())
}

impl CharsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> impl Iterator<Item = (u8, &CharsetEntry)> {
        self.slots.iter().map(|(&b, e)| (b, e))
    }

    pub fn get(&self, index: u8) -> Option<&CharsetEntry> {
        self.slots.get(&index)
    }

    fn set_entry(&mut self, index: u8, entry: CharsetEntry) -> Result<()> {
        if self.slots.contains_key(&index) {
            return Err(CcmlError::InvalidArgument(format!(
                "charset slot {:#04x} already occupied",
                index
            )));
        }
        self.slots.insert(index, entry);
        Ok(())
    }

    pub fn set_char(&mut self, index: u8, text: &str) -> Result<()> {
        check_nfc(text)?;
        self.set_entry(index, CharsetEntry::Primary(text.to_string()))
    }

    pub fn set_alias(&mut self, index: u8, target: &str) -> Result<()> {
        check_nfc(target)?;
        self.set_entry(index, CharsetEntry::Alias(target.to_string()))
    }

    /// Fill consecutive slots starting at `offset` from one char per cell.
    /// `'_'` and `' '` cells are placeholders and are skipped.
    pub fn fill_chars(&mut self, offset: u8, cells: &str) -> Result<()> {
        for (i, c) in cells.chars().enumerate() {
            if c == '_' || c == ' ' {
                continue;
            }
            let index = offset as usize + i;
            let index = u8::try_from(index).map_err(|_| {
                CcmlError::InvalidArgument(format!("charset fill overruns table at {}", index))
            })?;
            self.set_char(index, &c.to_string())?;
        }
        Ok(())
    }

    fn group_mut(&mut self, lead: u8) -> Result<&mut BTreeMap<u8, GroupEntry>> {
        let entry = self
            .slots
            .entry(lead)
            .or_insert_with(|| CharsetEntry::Group(BTreeMap::new()));
        match entry {
            CharsetEntry::Group(map) => Ok(map),
            _ => Err(CcmlError::InvalidArgument(format!(
                "lead byte {:#04x} already holds a direct mapping",
                lead
            ))),
        }
    }

    /// Register `lead` as a multi-byte lead, with no trail entries yet.
    pub fn set_group(&mut self, lead: u8) -> Result<()> {
        self.group_mut(lead).map(|_| ())
    }

    fn set_group_entry(&mut self, lead: u8, trail: u8, entry: GroupEntry) -> Result<()> {
        let map = self.group_mut(lead)?;
        if map.contains_key(&trail) {
            return Err(CcmlError::InvalidArgument(format!(
                "charset slot {:#04x} {:#04x} already occupied",
                lead, trail
            )));
        }
        map.insert(trail, entry);
        Ok(())
    }

    pub fn set_group_char(&mut self, lead: u8, trail: u8, text: &str) -> Result<()> {
        check_nfc(text)?;
        self.set_group_entry(lead, trail, GroupEntry::Primary(text.to_string()))
    }

    pub fn set_group_alias(&mut self, lead: u8, trail: u8, target: &str) -> Result<()> {
        check_nfc(target)?;
        self.set_group_entry(lead, trail, GroupEntry::Alias(target.to_string()))
    }

    pub fn fill_group_chars(&mut self, lead: u8, offset: u8, cells: &str) -> Result<()> {
        for (i, c) in cells.chars().enumerate() {
            if c == '_' || c == ' ' {
                continue;
            }
            let trail = offset as usize + i;
            let trail = u8::try_from(trail).map_err(|_| {
                CcmlError::InvalidArgument(format!("charset fill overruns group at {}", trail))
            })?;
            self.set_group_char(lead, trail, &c.to_string())?;
        }
        Ok(())
    }

    /// Walk every entry as (encoded byte sequence, text, is_alias).
    pub fn crawl(&self) -> Vec<(Vec<u8>, &str, bool)> {
        let mut out = Vec::new();
        for (&lead, entry) in &self.slots {
            match entry {
                CharsetEntry::Primary(text) => out.push((vec![lead], text.as_str(), false)),
                CharsetEntry::Alias(target) => out.push((vec![lead], target.as_str(), true)),
                CharsetEntry::Group(map) => {
                    for (&trail, sub) in map {
                        match sub {
                            GroupEntry::Primary(text) => {
                                out.push((vec![lead, trail], text.as_str(), false))
                            }
                            GroupEntry::Alias(target) => {
                                out.push((vec![lead, trail], target.as_str(), true))
                            }
                        }
                    }
                }
            }
        }
        out
    }
}

/// Inverse of all non-alias entries, plus a length-bucketed view used for
/// longest-match scanning. Lengths are counted in codepoints.
#[derive(Debug, Clone)]
pub struct EncodeTable {
    map: HashMap<String, Vec<u8>>,
    by_len: BTreeMap<usize, HashMap<String, Vec<u8>>>,
    max_len: usize,
}

impl EncodeTable {
    pub fn build(table: &CharsetTable) -> Result<Self> {
        let mut map: HashMap<String, Vec<u8>> = HashMap::new();
        for (bytes, text, is_alias) in table.crawl() {
            if is_alias {
                continue;
            }
            if map.insert(text.to_string(), bytes).is_some() {
                return Err(CcmlError::InvalidArgument(format!(
                    "duplicate charset entry {:?}",
                    text
                )));
            }
        }
        for (_, text, is_alias) in table.crawl() {
            if is_alias && !map.contains_key(text) {
                return Err(CcmlError::InvalidArgument(format!(
                    "alias target {:?} has no primary entry",
                    text
                )));
            }
        }

        let mut by_len: BTreeMap<usize, HashMap<String, Vec<u8>>> = BTreeMap::new();
        for (text, bytes) in &map {
            by_len
                .entry(text.chars().count())
                .or_default()
                .insert(text.clone(), bytes.clone());
        }
        let max_len = by_len.keys().next_back().copied().unwrap_or(0);

        Ok(Self {
            map,
            by_len,
            max_len,
        })
    }

    pub fn get(&self, text: &str) -> Option<&[u8]> {
        self.map.get(text).map(|b| b.as_slice())
    }

    pub fn contains(&self, text: &str) -> bool {
        self.map.contains_key(text)
    }

    pub fn get_with_len(&self, len: usize, text: &str) -> Option<&[u8]> {
        self.by_len
            .get(&len)
            .and_then(|m| m.get(text))
            .map(|b| b.as_slice())
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

/// One decoded lead byte: direct text, or a trail-byte group. Aliases are
/// resolved to their target text when this table is built, so decoding
/// never chases an indirection.
#[derive(Debug, Clone)]
pub enum DecodeSlot {
    Text(String),
    Group(BTreeMap<u8, String>),
}

#[derive(Debug, Clone)]
pub struct DecodeTable {
    slots: Vec<Option<DecodeSlot>>,
}

impl DecodeTable {
    pub fn build(table: &CharsetTable) -> Result<Self> {
        let mut slots: Vec<Option<DecodeSlot>> = vec![None; 256];
        for (&lead, entry) in table.slots.iter() {
            let slot = match entry {
                CharsetEntry::Primary(text) | CharsetEntry::Alias(text) => {
                    DecodeSlot::Text(text.clone())
                }
                CharsetEntry::Group(map) => {
                    let mut sub = BTreeMap::new();
                    for (&trail, e) in map {
                        let text = match e {
                            GroupEntry::Primary(text) | GroupEntry::Alias(text) => text.clone(),
                        };
                        sub.insert(trail, text);
                    }
                    DecodeSlot::Group(sub)
                }
            };
            slots[lead as usize] = Some(slot);
        }
        Ok(Self { slots })
    }

    pub fn get(&self, lead: u8) -> Option<&DecodeSlot> {
        self.slots[lead as usize].as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_double_assignment() {
        let mut t = CharsetTable::new();
        t.set_char(0x41, "A").unwrap();
        assert!(t.set_char(0x41, "B").is_err());
    }

    #[test]
    fn rejects_group_over_direct_mapping() {
        let mut t = CharsetTable::new();
        t.set_char(0x41, "A").unwrap();
        assert!(t.set_group_char(0x41, 0x01, "B").is_err());
    }

    #[test]
    fn rejects_non_nfc_entry() {
        let mut t = CharsetTable::new();
        // e + combining acute composes to U+00E9, so this is not NFC
        assert!(t.set_char(0x10, "e\u{0301}").is_err());
    }

    #[test]
    fn rejects_dangling_alias() {
        let mut t = CharsetTable::new();
        t.set_alias(0x10, "Q").unwrap();
        assert!(EncodeTable::build(&t).is_err());
    }

    #[test]
    fn encode_table_buckets_by_codepoint_length() {
        let mut t = CharsetTable::new();
        t.set_char(0x41, "A").unwrap();
        t.set_char(0x42, "x\u{0304}").unwrap();
        let enc = EncodeTable::build(&t).unwrap();
        assert_eq!(enc.max_len(), 2);
        assert_eq!(enc.get_with_len(2, "x\u{0304}"), Some(&[0x42][..]));
        assert!(enc.get_with_len(1, "x\u{0304}").is_none());
    }
}
