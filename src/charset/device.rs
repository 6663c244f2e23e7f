use crate::error::Result;

use super::table::CharsetTable;

// The device's multi-byte charset. Lead bytes 0xE5-0xE7 (and the unused
// 0xF7/0xF9) introduce two-byte sequences; everything else is one byte.
// Cells holding '_' or ' ' are placeholders, assigned explicitly below
// where a real mapping exists.

const MAIN: &str = concat!(
    "_𝐟𝐩𝐧𝝁𝐦𝐤𝐌𝐆𝐓𝐏  ↵_ ",
    "≤≠≥⇒______𝐀𝐁𝐂𝐃𝐄𝐅",
    " !\"#$%&'()*+,-./",
    "0123456789:;<=>?",
    "@ABCDEFGHIJKLMNO",
    "PQRSTUVWXYZ[\\]^_",
    "`abcdefghijklmno",
    "pqrstuvwxyz{|}~_",
    "______√−____ ___",
    "𝑥___________°___",
    "_________×__ ___",
    "_____⏨___÷_  ___",
    "__ ȳ_______ ŷ𝐫𝜽_",
    "________ _______",
);

// Latin Extended-A / Greek / Cyrillic. 0xE5 holds this as-is, 0xE6 the
// lowercase forms.
const E56_CASELESS: &str = concat!(
    "_ÀÁÂÃÄÅÆÇÈÉÊËÌÍÎ",
    "ÏÐÑÒÓÔÕÖØÙÚÛÜÝÞ_",
    "ŸĂĄĆČŒĎĘĚŁŃŇŐŘŚŠ",
    "ŤŮŰŹŻŽ__________",
    "ΑΒΓΔΕΖΗΘΙΚΛΜΝΞΟΠ",
    "ΡΣ_ΤΥΦΧΨΩ_______",
    "АБВГДЕЁЖЗИЙКЛМНО",
    "ПРСТУФХЦЧШЩЪЫЬЭ_",
    "ЮЯЄ_____________",
);

const SYMBOLS_E590: &str = concat!(
    "¡¿€_…‘’“”¢£¤¥§©ª",
    "¬®º«»  ⋅___⁉‼☆  ",
    "𝒆  𝐗𝐘         ±∓",
    "⁰¹²³⁴⁵⁶⁷⁸⁹ ⁺⁻   ",
    "₀₁₂₃₄₅₆₇₈₉ ₊₋ ₙ ",
    "♠♣♥♦ ___⇦⇨⇧⇩☜☞☝☟",
    "①②③④⑤⑥_____⑦⑧⑨__",
);

const SYMBOLS_E690: &str = concat!(
    "←→↑↓↔↕↖↗↘↙◀▶▲▼▸▷",
    "   ○●□■◇◆☑ _△▽ ◁",
    "≒≈≡≢≅∼∝∬∮∂_∫∡∈∋⊆",
    "⊇⊂⊃∪∩∉∌⊈⊉⊄⊅∅∃∟∨∧",
    "∀⊕⊖⊗⊘⊥⇔∥∦⫽∇∴∵´˝_",
    "________________",
    "___________    _",
);

const ITALICS_E780: &str = concat!(
    "_____ℎ__ 𝑎______",
    "𝑢____𝐹𝑒_𝑘_𝑅___𝜎_",
    "__𝑔__𝑡𝐺____𝑝𝜇𝑁𝐴𝐵",
);

fn lowercase_cells(cells: &str) -> String {
    cells
        .chars()
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Build the full device charset table.
pub fn device_table() -> Result<CharsetTable> {
    let mut t = CharsetTable::new();

    t.fill_chars(0x00, MAIN)?;
    t.set_alias(0x0B, "𝐄")?;
    t.set_char(0x20, " ")?;
    t.set_char(0x5F, "_")?;
    t.set_char(0xC2, "x\u{0304}")?; // x + combining macron
    t.set_char(0xCB, "x\u{0302}")?; // x + combining circumflex

    t.set_group_char(0x7F, 0x50, "𝐢")?;
    t.set_group_char(0x7F, 0x53, "∞")?;
    t.set_group_char(0x7F, 0x54, "∠")?;
    t.set_group_char(0x7F, 0xC7, "p\u{0302}")?;

    t.fill_group_chars(0xE5, 0x00, E56_CASELESS)?;
    t.fill_group_chars(0xE6, 0x00, &lowercase_cells(E56_CASELESS))?;
    t.set_group_char(0xE6, 0x1F, "ß")?;
    t.set_group_char(0xE6, 0x52, "ς")?;

    t.fill_group_chars(0xE5, 0x90, SYMBOLS_E590)?;
    t.set_group_alias(0xE5, 0xB1, "𝐏")?;
    t.set_group_alias(0xE5, 0xB2, "𝐫")?;
    t.set_group_alias(0xE5, 0xBD, ",")?;
    t.set_group_alias(0xE5, 0xCD, "₀")?;
    t.set_group_alias(0xE5, 0xCE, "₁")?;
    t.set_group_alias(0xE5, 0xCF, "₂")?;
    t.set_group_alias(0xE5, 0xDF, "³")?;

    t.fill_group_chars(0xE6, 0x90, SYMBOLS_E690)?;
    t.set_group_alias(0xE6, 0xA1, "[")?;
    t.set_group_alias(0xE6, 0xA2, "]")?;
    t.set_group_alias(0xE6, 0xFD, "⏨")?;

    // Subscript and italic letters under 0xE7
    for (i, c) in "₀₁₂₃₄₅₆₇₈₉".chars().enumerate() {
        t.set_group_alias(0xE7, 0x30 + i as u8, &c.to_string())?;
    }
    t.set_group_char(0xE7, 0x61, "ₐ")?;
    t.set_group_char(0xE7, 0x65, "ₑ")?;
    t.set_group_char(0xE7, 0x68, "ₕ")?;
    t.set_group_char(0xE7, 0x6B, "ₖ")?;
    t.set_group_char(0xE7, 0x6C, "ₗ")?;
    t.set_group_char(0xE7, 0x6D, "ₘ")?;
    t.set_group_alias(0xE7, 0x6E, "ₙ")?;
    t.set_group_char(0xE7, 0x6F, "ₒ")?;
    t.set_group_char(0xE7, 0x70, "ₚ")?;
    t.set_group_char(0xE7, 0x73, "ₛ")?;
    t.set_group_char(0xE7, 0x74, "ₜ")?;
    t.set_group_char(0xE7, 0x78, "ₓ")?;
    t.fill_group_chars(0xE7, 0x80, ITALICS_E780)?;

    // Lead bytes the OS treats as multi-byte but with no known characters
    t.set_group(0xF7)?;
    t.set_group(0xF9)?;

    Ok(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::table::{CharsetEntry, EncodeTable};

    #[test]
    fn device_table_builds() {
        let t = device_table().unwrap();
        // the derived encode table validates all alias targets
        EncodeTable::build(&t).unwrap();
    }

    #[test]
    fn ascii_range_is_identity() {
        let t = device_table().unwrap();
        let enc = EncodeTable::build(&t).unwrap();
        for b in 0x20u8..0x7F {
            let c = (b as char).to_string();
            assert_eq!(enc.get(&c), Some(&[b][..]), "ascii {:?}", c);
        }
    }

    #[test]
    fn multibyte_leads_are_groups() {
        let t = device_table().unwrap();
        for lead in [0x7F, 0xE5, 0xE6, 0xE7, 0xF7, 0xF9] {
            assert!(matches!(t.get(lead), Some(CharsetEntry::Group(_))));
        }
    }
}
