use std::cell::RefCell;

use fnv::FnvHashMap;
use icu::casemap::{CaseMapper, CaseMapperBorrowed};
use icu::locale::LanguageIdentifier;
use icu::normalizer::DecomposingNormalizerBorrowed;
use icu::properties::props::{GeneralCategory, GeneralCategoryGroup};
use icu::properties::{CodePointMapData, CodePointMapDataBorrowed};
use log::warn;

use crate::charset::DeviceCharset;
use crate::error::{CcmlError, Result};

use super::jump::JumpSymbol;

/// Parallel normalized keys for one title: a sort key used purely for
/// ordering, and a jump key used to place the title in an index bucket.
///
/// Appending stops growing the jump key once it has reached a stop
/// symbol, so the jump key is a prefix classification, never a full
/// transliteration. Invariant: at most the last symbol is a stop.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchKey {
    pub sort_text: String,
    pub jump_key: Vec<JumpSymbol>,
}

impl SearchKey {
    fn single(sort: &str, symbol: JumpSymbol) -> Self {
        Self {
            sort_text: sort.to_string(),
            jump_key: vec![symbol],
        }
    }

    pub fn terminated(&self) -> bool {
        self.jump_key.last().is_some_and(|s| s.is_stop())
    }

    pub fn append(&mut self, other: &SearchKey) {
        self.sort_text.push_str(&other.sort_text);
        if !self.terminated() {
            self.jump_key.extend_from_slice(&other.jump_key);
        }
    }
}

/// Hard-coded compatibility substitutions applied on top of the generic
/// decomposition. Deliberately tiny; see the codec's ASCII fallback for
/// everything else.
const COMPAT_SUBSTITUTIONS: &[(char, char)] = &[('Ø', 'O'), ('ø', 'o')];

fn substitute(c: char) -> char {
    COMPAT_SUBSTITUTIONS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|&(_, to)| to)
        .unwrap_or(c)
}

/// Derives search keys from title text, one Unicode character at a time.
/// Per-character results are memoized; the domain of valid title
/// characters is small and finite in practice.
pub struct Classifier<'a> {
    charset: &'a DeviceCharset,
    cache: RefCell<FnvHashMap<char, Option<SearchKey>>>,
    categories: CodePointMapDataBorrowed<'static, GeneralCategory>,
    nfkd: DecomposingNormalizerBorrowed<'static>,
    casemap: CaseMapperBorrowed<'static>,
}

impl<'a> Classifier<'a> {
    pub fn new(charset: &'a DeviceCharset) -> Self {
        Self {
            charset,
            cache: RefCell::new(FnvHashMap::default()),
            categories: CodePointMapData::<GeneralCategory>::new(),
            nfkd: DecomposingNormalizerBorrowed::new_nfkd(),
            casemap: CaseMapper::new(),
        }
    }

    fn in_groups(&self, c: char, groups: &[GeneralCategoryGroup]) -> bool {
        let gc = self.categories.get(c);
        groups.iter().any(|g| g.contains(gc))
    }

    /// Classify one charset entry text. Entries are normally a single
    /// character but may be a short combining sequence.
    pub fn classify_entry(&self, text: &str) -> Option<SearchKey> {
        let mut chars = text.chars();
        let Some(first) = chars.next() else {
            return Some(SearchKey::default());
        };
        if chars.next().is_none()
            && self.in_groups(
                first,
                &[
                    GeneralCategoryGroup::Punctuation,
                    GeneralCategoryGroup::Symbol,
                    GeneralCategoryGroup::Separator,
                ],
            )
        {
            return Some(SearchKey::single(" ", JumpSymbol::Space));
        }

        let folded = self.casemap.fold_string(text);
        let decomposed = self.nfkd.normalize(&folded);
        let upper = self
            .casemap
            .uppercase_to_string(&decomposed, &LanguageIdentifier::UNKNOWN);
        let mut norm: String = upper.chars().map(substitute).collect();
        if self.charset.has_primary(text) {
            // single device glyphs classify as single symbols, so a
            // multi-character decomposition keeps only its base letter
            norm.truncate(norm.chars().next().map_or(0, char::len_utf8));
        }

        let mut key = SearchKey::default();
        for (index, nc) in norm.chars().enumerate() {
            if let Some(letter) = JumpSymbol::from_letter(nc) {
                key.append(&SearchKey::single(&nc.to_string(), letter));
            } else if nc.is_ascii_digit() {
                key.append(&SearchKey::single(&nc.to_string(), JumpSymbol::Digit));
            } else if index > 0
                && !self.in_groups(
                    nc,
                    &[
                        GeneralCategoryGroup::Letter,
                        GeneralCategoryGroup::Number,
                        GeneralCategoryGroup::Punctuation,
                        GeneralCategoryGroup::Symbol,
                        GeneralCategoryGroup::Separator,
                    ],
                )
            {
                continue;
            } else {
                warn!("search skipping {:?}", text);
                return None;
            }
        }
        Some(key)
    }

    pub fn classify_char(&self, c: char) -> Option<SearchKey> {
        if let Some(cached) = self.cache.borrow().get(&c) {
            return cached.clone();
        }
        let key = self.classify_entry(&c.to_string());
        self.cache.borrow_mut().insert(c, key.clone());
        key
    }

    /// Index of the first jump symbol an entry classifies to, if any.
    pub fn jump_symbol_index(&self, text: &str) -> Option<u64> {
        let key = self.classify_entry(text)?;
        key.jump_key.first().map(|s| s.index())
    }

    /// Classify a whole title. Any unclassifiable character fails the
    /// whole title; an empty title yields the empty key.
    pub fn classify(&self, text: &str) -> Result<SearchKey> {
        let mut key = SearchKey::default();
        for c in text.chars() {
            match self.classify_char(c) {
                Some(k) => key.append(&k),
                None => return Err(CcmlError::Unclassifiable(text.to_string())),
            }
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charset() -> DeviceCharset {
        DeviceCharset::new().unwrap()
    }

    #[test]
    fn plain_bob() {
        let cs = charset();
        let classifier = Classifier::new(&cs);
        let key = classifier.classify("Plain Bob").unwrap();
        assert_eq!(key.sort_text, "PLAIN BOB");
        // the jump key stops at the space and ignores the second word
        assert_eq!(
            key.jump_key,
            vec![
                JumpSymbol::Letter(b'P' - b'A'),
                JumpSymbol::Letter(b'L' - b'A'),
                JumpSymbol::Letter(b'A' - b'A'),
                JumpSymbol::Letter(b'I' - b'A'),
                JumpSymbol::Letter(b'N' - b'A'),
                JumpSymbol::Space,
            ]
        );
    }

    #[test]
    fn digit_is_a_stop() {
        let cs = charset();
        let classifier = Classifier::new(&cs);
        let key = classifier.classify("7").unwrap();
        assert_eq!(key.sort_text, "7");
        assert_eq!(key.jump_key, vec![JumpSymbol::Digit]);
    }

    #[test]
    fn empty_title_is_empty_key() {
        let cs = charset();
        let classifier = Classifier::new(&cs);
        let key = classifier.classify("").unwrap();
        assert_eq!(key, SearchKey::default());
    }

    #[test]
    fn accents_fold_to_base_letters() {
        let cs = charset();
        let classifier = Classifier::new(&cs);
        let key = classifier.classify("Éire").unwrap();
        assert_eq!(key.sort_text, "EIRE");
    }

    #[test]
    fn charset_native_char_truncates_to_base() {
        let cs = charset();
        let classifier = Classifier::new(&cs);
        // ß is charset-native; its casefold expands to "ss" but only the
        // base letter survives classification
        let key = classifier.classify_entry("ß").unwrap();
        assert_eq!(key.sort_text, "S");
        assert_eq!(key.jump_key, vec![JumpSymbol::Letter(b'S' - b'A')]);
    }

    #[test]
    fn stroked_o_substitution() {
        let cs = charset();
        let classifier = Classifier::new(&cs);
        let key = classifier.classify("Øster").unwrap();
        assert_eq!(key.sort_text, "OSTER");
    }

    #[test]
    fn punctuation_maps_to_space_stop() {
        let cs = charset();
        let classifier = Classifier::new(&cs);
        let key = classifier.classify("St Clement's College Bob").unwrap();
        assert_eq!(key.sort_text, "ST CLEMENT S COLLEGE BOB");
        assert_eq!(
            key.jump_key,
            vec![
                JumpSymbol::Letter(b'S' - b'A'),
                JumpSymbol::Letter(b'T' - b'A'),
                JumpSymbol::Space,
            ]
        );
    }

    #[test]
    fn unclassifiable_title_fails() {
        let cs = charset();
        let classifier = Classifier::new(&cs);
        let err = classifier.classify("鐘").unwrap_err();
        assert!(matches!(err, CcmlError::Unclassifiable(_)));
    }
}
