/// Stop symbols per index position: the space class and the digit class.
pub const STOP_COUNT: u64 = 2;
/// Non-stop symbols per index position: the 26 letters.
pub const LETTER_COUNT: u64 = 26;
/// Total symbol alphabet size.
pub const JUMP_CHAR_COUNT: u64 = STOP_COUNT + LETTER_COUNT;

/// One symbol of a jump key. Stop symbols terminate the key; letters may
/// be followed by further symbols up to the index depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpSymbol {
    Space,
    Digit,
    /// Letter index 0..26 (A..Z).
    Letter(u8),
}

impl JumpSymbol {
    pub fn from_letter(c: char) -> Option<JumpSymbol> {
        c.is_ascii_uppercase()
            .then(|| JumpSymbol::Letter(c as u8 - b'A'))
    }

    pub fn is_stop(self) -> bool {
        !matches!(self, JumpSymbol::Letter(_))
    }

    /// The symbol's contribution to a bucket prefix string. The space
    /// class is the empty string so its bucket sorts before everything.
    pub fn prefix(self) -> String {
        match self {
            JumpSymbol::Space => String::new(),
            JumpSymbol::Digit => "0".to_string(),
            JumpSymbol::Letter(i) => ((b'A' + i) as char).to_string(),
        }
    }

    /// Position in the fixed symbol order: space, digit, A..Z.
    pub fn index(self) -> u64 {
        match self {
            JumpSymbol::Space => 0,
            JumpSymbol::Digit => 1,
            JumpSymbol::Letter(i) => 2 + i as u64,
        }
    }

    /// All symbols in index order.
    pub fn all() -> impl Iterator<Item = JumpSymbol> {
        [JumpSymbol::Space, JumpSymbol::Digit]
            .into_iter()
            .chain((0..26).map(JumpSymbol::Letter))
    }
}

/// Number of index buckets implied by `depth`.
///
/// The recurrence is `space(0) = 1`, `space(d) = STOP_COUNT +
/// LETTER_COUNT * space(d - 1)`; the geometric series gives the closed
/// form used here. Saturates at `u64::MAX` for depths beyond any
/// representable store, so a hostile header byte cannot overflow.
pub fn bucket_space(depth: u8) -> u64 {
    let rd = LETTER_COUNT.saturating_pow(depth as u32);
    (STOP_COUNT.saturating_mul(rd - 1) / (LETTER_COUNT - 1)).saturating_add(rd)
}

/// All bucket lower-bound prefixes for `depth`, in strictly increasing
/// lexicographic order. Exactly `bucket_space(depth)` entries.
pub fn bucket_prefixes(depth: u8) -> Vec<String> {
    if depth == 0 {
        return vec![String::new()];
    }
    let mut out = Vec::with_capacity(bucket_space(depth) as usize);
    for sym in JumpSymbol::all() {
        if sym.is_stop() || depth == 1 {
            out.push(sym.prefix());
        } else {
            for suffix in bucket_prefixes(depth - 1) {
                out.push(format!("{}{}", sym.prefix(), suffix));
            }
        }
    }
    out
}

/// Bucket index of a jump key, computed arithmetically. Agrees
/// bit-for-bit with the ordering of [`bucket_prefixes`].
pub fn bucket_index(key: &[JumpSymbol], depth: u8) -> u64 {
    let mut pindex = 0u64;
    for (kindex, &k) in key.iter().enumerate() {
        if kindex >= depth as usize {
            break;
        }
        let layer = bucket_space(depth - kindex as u8 - 1);
        for sym in JumpSymbol::all() {
            if k == sym {
                if k.is_stop() {
                    return pindex;
                }
                break;
            }
            // shifts the index of every following symbol
            pindex += if sym.is_stop() { 1 } else { layer };
        }
    }
    pindex
}
