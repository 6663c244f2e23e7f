use crate::error::{CcmlError, Result};

use super::row::bell_index;

/// Convert one comma-free notation segment to words. Bells accumulate
/// into the current word; a cross closes any open word and emits the
/// literal 0; a dot only closes the open word.
fn convert_part(part: &str) -> Result<Vec<u16>> {
    let mut current: u16 = 0;
    let mut out = Vec::new();
    for c in part.chars() {
        match c {
            '-' | 'X' => {
                if current != 0 {
                    out.push(current);
                    current = 0;
                }
                out.push(0);
            }
            '.' => {
                if current != 0 {
                    out.push(current);
                    current = 0;
                }
            }
            _ => {
                let bell = bell_index(c).ok_or_else(|| {
                    CcmlError::InvalidFormat(format!("unknown notation symbol {:?}", c))
                })?;
                if bell >= 16 {
                    return Err(CcmlError::InvalidFormat(format!(
                        "place {:?} is beyond the 16-bell word width",
                        c
                    )));
                }
                current |= 1 << bell;
            }
        }
    }
    if current != 0 {
        out.push(current);
    }
    Ok(out)
}

/// Convert a place-notation string to notation words. A comma splits the
/// notation into palindrome segments: each segment is emitted followed by
/// its own mirror image, excluding the segment's last word.
pub fn convert_notation(notation: &str) -> Result<Vec<u16>> {
    let notation = notation.to_uppercase();
    let parts: Vec<&str> = notation.split(',').collect();
    if parts.len() > 1 {
        let mut out = Vec::new();
        for part in parts {
            let words = convert_part(part)?;
            out.extend_from_slice(&words);
            if !words.is_empty() {
                out.extend(words[..words.len() - 1].iter().rev());
            }
        }
        Ok(out)
    } else {
        convert_part(parts[0])
    }
}
