use std::fmt;

use crate::error::{CcmlError, Result};

/// Bell symbols in order, one per position. 33 symbols covers every
/// stage the source dataset describes.
pub const BELLS: &str = "1234567890ETABCDFGHJKLMNPQRSUVWYZ";

/// 0-based bell index for a bell symbol, case-insensitive.
pub fn bell_index(c: char) -> Option<usize> {
    BELLS.find(c.to_ascii_uppercase())
}

/// One row: a permutation of bell positions. `places[i]` is the bell at
/// position `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    places: Vec<u8>,
}

impl Row {
    pub fn parse(text: &str) -> Result<Self> {
        let mut places = Vec::with_capacity(text.len());
        for c in text.chars() {
            let bell = bell_index(c).ok_or_else(|| {
                CcmlError::InvalidFormat(format!("unknown bell symbol {:?} in row {:?}", c, text))
            })?;
            places.push(bell as u8);
        }
        Ok(Self { places })
    }

    pub fn stage(&self) -> usize {
        self.places.len()
    }

    /// Permutation composition: `(self ∘ other)[i] = self[other[i]]`.
    pub fn compose(&self, other: &Row) -> Result<Row> {
        if self.stage() != other.stage() {
            return Err(CcmlError::InvalidArgument(format!(
                "cannot compose rows of stage {} and {}",
                self.stage(),
                other.stage()
            )));
        }
        let places = other
            .places
            .iter()
            .map(|&p| self.places[p as usize])
            .collect();
        Ok(Row { places })
    }

    pub fn is_rounds(&self) -> bool {
        self.places.iter().enumerate().all(|(i, &p)| i == p as usize)
    }

    /// Positions left unchanged by this permutation.
    pub fn unchanged_places(&self) -> Vec<usize> {
        self.places
            .iter()
            .enumerate()
            .filter(|&(i, &p)| i == p as usize)
            .map(|(i, _)| i)
            .collect()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &p in &self.places {
            f.write_str(&BELLS[p as usize..p as usize + 1])?;
        }
        Ok(())
    }
}

/// Iterate the lead-head permutation until it returns to rounds,
/// yielding the lead count.
pub fn lead_count(lead_head: &Row) -> Result<u16> {
    let mut row = lead_head.clone();
    let mut count: u16 = 1;
    while !row.is_rounds() {
        row = row.compose(lead_head)?;
        count = count.checked_add(1).ok_or_else(|| {
            CcmlError::InvalidFormat(format!("lead head {} does not close", lead_head))
        })?;
    }
    Ok(count)
}
