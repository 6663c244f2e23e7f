//! C++ header generation for the on-device reader. Emits switch-based
//! lookup functions derived from the charset table and the jump alphabet,
//! so the reader never carries the tables themselves.

use std::collections::{BTreeMap, BTreeSet};

use crate::charset::{CharsetEntry, DeviceCharset, GroupEntry};
use crate::search::{Classifier, JumpSymbol, JUMP_CHAR_COUNT, LETTER_COUNT, STOP_COUNT};

/// Sort character covered by the switch default, so never emitted as a
/// case of its own.
const DEFAULT_SORT_CHAR: char = ' ';

/// Format a byte as a C character literal. Printable ASCII stays literal
/// when allowed; quote and backslash always use the hex form.
fn c_char(byte: u8, allow_ascii: bool) -> String {
    if allow_ascii && (0x20..0x7F).contains(&byte) && byte != b'\'' && byte != b'\\' {
        format!("'{}'", byte as char)
    } else {
        format!("'\\x{:02x}'", byte)
    }
}

/// Derived sort maps: one sort character per device byte (or byte pair),
/// and a jump symbol index per printable ASCII byte. Entries whose text
/// has no search classification are simply absent and fall through to the
/// switch default.
struct SortMaps {
    direct: BTreeMap<u8, char>,
    groups: BTreeMap<u8, BTreeMap<u8, char>>,
    ascii_ptr: BTreeMap<u8, u64>,
}

fn sort_char(classifier: &Classifier<'_>, text: &str) -> Option<char> {
    classifier
        .classify_entry(text)
        .and_then(|key| key.sort_text.chars().next())
}

fn build_sort_maps(charset: &DeviceCharset) -> SortMaps {
    let classifier = Classifier::new(charset);
    let mut maps = SortMaps {
        direct: BTreeMap::new(),
        groups: BTreeMap::new(),
        ascii_ptr: BTreeMap::new(),
    };

    for (lead, entry) in charset.table().slots() {
        match entry {
            CharsetEntry::Primary(text) | CharsetEntry::Alias(text) => {
                if let Some(c) = sort_char(&classifier, text) {
                    maps.direct.insert(lead, c);
                }
                if (0x20..0x7F).contains(&lead) {
                    if let Some(index) = classifier.jump_symbol_index(text) {
                        maps.ascii_ptr.insert(lead, index);
                    }
                }
            }
            CharsetEntry::Group(group) => {
                // empty groups still get a nested switch, all-default
                let sub = maps.groups.entry(lead).or_default();
                for (&trail, sub_entry) in group {
                    let text = match sub_entry {
                        GroupEntry::Primary(text) | GroupEntry::Alias(text) => text,
                    };
                    if let Some(c) = sort_char(&classifier, text) {
                        sub.insert(trail, c);
                    }
                }
            }
        }
    }
    maps
}

fn switched_top(ret: &str, fname: &str, null: &str) -> String {
    format!(
        "{ret} {fname}(const MBChar *&c)\n{{\n    if (*c == '\\0')\n        return {null};\n    switch (*c++)\n    {{",
    )
}

fn case_line(indent: &str, src: &str) -> String {
    format!("{indent}case {src}:")
}

fn case_return(indent: &str, dest: &str) -> String {
    format!("{indent}    return {dest};")
}

fn switched_bottom(default: &str) -> String {
    format!("        default:\n            return {default};\n    }}\n}}\n")
}

/// Invert a byte-to-value map so equal return values share one case run.
fn invert<V: Ord + Copy>(map: &BTreeMap<u8, V>) -> BTreeMap<V, BTreeSet<u8>> {
    let mut out: BTreeMap<V, BTreeSet<u8>> = BTreeMap::new();
    for (&byte, &value) in map {
        out.entry(value).or_default().insert(byte);
    }
    out
}

/// Switch mapping a device character (one or two bytes) to its sort
/// character, for on-device title comparison.
pub fn cpp_search_convert(charset: &DeviceCharset, fname: &str) -> String {
    let maps = build_sort_maps(charset);
    let default = c_char(DEFAULT_SORT_CHAR as u8, true);

    let mut elements = vec![switched_top("NonMBChar", fname, "'\\0'")];
    for (sort, bytes) in invert(&maps.direct) {
        if sort == DEFAULT_SORT_CHAR {
            continue;
        }
        for byte in bytes {
            elements.push(case_line("        ", &c_char(byte, true)));
        }
        elements.push(case_return("        ", &c_char(sort as u8, true)));
    }

    for (lead, sub) in &maps.groups {
        elements.push(case_line("        ", &c_char(*lead, false)));
        elements.push("            switch (*c++)\n            {".to_string());
        for (sort, bytes) in invert(sub) {
            if sort == DEFAULT_SORT_CHAR {
                continue;
            }
            for byte in bytes {
                elements.push(case_line("                ", &c_char(byte, false)));
            }
            elements.push(case_return("                ", &c_char(sort as u8, true)));
        }
        elements.push(format!(
            "                default:\n                    return {default};\n            }}"
        ));
    }

    elements.push(switched_bottom(&default));
    elements.join("\n")
}

/// Switch mapping a printable ASCII search character to its jump symbol
/// index, for on-device jump table lookups.
pub fn cpp_search_ptr_convert(charset: &DeviceCharset, fname: &str) -> String {
    let maps = build_sort_maps(charset);
    let default = JumpSymbol::Space.index();

    let mut elements = vec![switched_top("SearchIndex", fname, "-1")];
    for (index, bytes) in invert(&maps.ascii_ptr) {
        if index == default {
            continue;
        }
        for byte in bytes {
            elements.push(case_line("        ", &c_char(byte, true)));
        }
        elements.push(case_return("        ", &index.to_string()));
    }
    elements.push(switched_bottom(&default.to_string()));
    elements.join("\n")
}

/// Predicate over lead bytes that start a two-byte device character.
pub fn cpp_mb_start_check(charset: &DeviceCharset, fname: &str) -> String {
    let maps = build_sort_maps(charset);
    let mut elements = vec![format!(
        "bool {fname}(const MBChar c)\n{{\n    switch (c)\n    {{"
    )];
    if !maps.groups.is_empty() {
        for lead in maps.groups.keys() {
            elements.push(case_line("        ", &c_char(*lead, false)));
        }
        elements.push(case_return("        ", "true"));
    }
    elements.push("        default:\n            return false;\n    }\n}\n".to_string());
    elements.join("\n")
}

/// Jump alphabet size constant.
pub fn cpp_jump_char_count(cname: &str) -> String {
    format!("const int {cname} = {JUMP_CHAR_COUNT};\n")
}

/// Bucket count for a given index depth, as the same geometric series the
/// writer uses.
pub fn cpp_jump_layer_size(fname: &str) -> String {
    format!(
        "int {fname}(const int depth)\n\
         {{\n\
         \x20   const int jump_stopcount = {STOP_COUNT};\n\
         \x20   const int jump_recursecount = {LETTER_COUNT};\n\
         \n\
         \x20   int rd = 1;\n\
         \x20   for (int i = 0; i < depth; i++)\n\
         \x20       rd *= jump_recursecount;\n\
         \x20   return jump_stopcount * (1 - rd) / (1 - jump_recursecount) + rd;\n\
         }}\n"
    )
}

/// Predicate over jump symbol indexes: true for the stop symbols.
pub fn cpp_is_jump_stop(fname: &str) -> String {
    let mut cases = String::new();
    for sym in JumpSymbol::all().filter(|s| !s.is_stop()) {
        cases.push_str(&format!("        case {}:\n", sym.index()));
    }
    if !cases.is_empty() {
        cases.push_str("            return false;\n");
    }
    format!(
        "bool {fname}(const SearchIndex i)\n\
         {{\n\
         \x20   switch (i)\n\
         \x20   {{\n\
         {cases}\
         \x20       default:\n\
         \x20           return true;\n\
         \x20   }}\n\
         }}\n"
    )
}

/// Generate the complete reader header.
pub fn generate_hpp(charset: &DeviceCharset) -> String {
    [
        cpp_search_convert(charset, "ReadSearchChar"),
        cpp_search_ptr_convert(charset, "ReadSearchCharPtr"),
        cpp_jump_char_count("jumpCharCount"),
        cpp_jump_layer_size("GetJumpDepth"),
        cpp_is_jump_stop("IsSearchStop"),
    ]
    .join("\n")
}
