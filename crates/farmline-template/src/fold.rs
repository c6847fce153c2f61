//! German special-character folding.
//!
//! Rendered names end up in file paths and farm job names, where umlauts and
//! sharp s cause grief on mixed-platform render nodes. The substitution table
//! is fixed: ö→oe ü→ue ä→ae Ö→OE Ü→UE Ä→AE ß→ss ẞ→SS.

use phf::phf_map;

static GERMAN_FOLD: phf::Map<char, &'static str> = phf_map! {
    'ö' => "oe",
    'ü' => "ue",
    'ä' => "ae",
    'Ö' => "OE",
    'Ü' => "UE",
    'Ä' => "AE",
    'ß' => "ss",
    'ẞ' => "SS",
};

/// Replace German special characters with their ASCII transliterations.
///
/// Characters outside the table pass through unchanged.
pub fn fold_german(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match GERMAN_FOLD.get(&c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }
    out
}
