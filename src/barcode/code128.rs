//! # Code128 Symbol Construction
//!
//! Code128 encodes each symbol character as three bars and three spaces,
//! eleven modules wide. A complete symbol is:
//!
//! ```text
//! ┌───────┬──────────────────────┬──────────┬──────────────┐
//! │ START │ data (set B / set C) │ checksum │ STOP (13 mod)│
//! └───────┴──────────────────────┴──────────┴──────────────┘
//! ```
//!
//! ## Code Sets
//!
//! | Set | Encodes | Value |
//! |-----|---------|-------|
//! | B | ASCII 0x20-0x7F, one char per symbol | `ascii - 32` |
//! | C | digit pairs 00-99, two chars per symbol | `pair` |
//!
//! Set A (control characters) is not used; [`BarcodeValue`] rejects them.
//!
//! ## Checksum
//!
//! ```text
//! checksum = (start + Σ position × value) mod 103     position = 1, 2, ...
//! ```

use super::{BarcodeValue, Segment};

/// Bar/space widths for symbol values 0..=105 (bar first).
const PATTERNS: [[u8; 6]; 106] = [
    [2, 1, 2, 2, 2, 2], [2, 2, 2, 1, 2, 2], [2, 2, 2, 2, 2, 1], [1, 2, 1, 2, 2, 3],
    [1, 2, 1, 3, 2, 2], [1, 3, 1, 2, 2, 2], [1, 2, 2, 2, 1, 3], [1, 2, 2, 3, 1, 2],
    [1, 3, 2, 2, 1, 2], [2, 2, 1, 2, 1, 3], [2, 2, 1, 3, 1, 2], [2, 3, 1, 2, 1, 2],
    [1, 1, 2, 2, 3, 2], [1, 2, 2, 1, 3, 2], [1, 2, 2, 2, 3, 1], [1, 1, 3, 2, 2, 2],
    [1, 2, 3, 1, 2, 2], [1, 2, 3, 2, 2, 1], [2, 2, 3, 2, 1, 1], [2, 2, 1, 1, 3, 2],
    [2, 2, 1, 2, 3, 1], [2, 1, 3, 2, 1, 2], [2, 2, 3, 1, 1, 2], [3, 1, 2, 1, 3, 1],
    [3, 1, 1, 2, 2, 2], [3, 2, 1, 1, 2, 2], [3, 2, 1, 2, 2, 1], [3, 1, 2, 2, 1, 2],
    [3, 2, 2, 1, 1, 2], [3, 2, 2, 2, 1, 1], [2, 1, 2, 1, 2, 3], [2, 1, 2, 3, 2, 1],
    [2, 3, 2, 1, 2, 1], [1, 1, 1, 3, 2, 3], [1, 3, 1, 1, 2, 3], [1, 3, 1, 3, 2, 1],
    [1, 1, 2, 3, 1, 3], [1, 3, 2, 1, 1, 3], [1, 3, 2, 3, 1, 1], [2, 1, 1, 3, 1, 3],
    [2, 3, 1, 1, 1, 3], [2, 3, 1, 3, 1, 1], [1, 1, 2, 1, 3, 3], [1, 1, 2, 3, 3, 1],
    [1, 3, 2, 1, 3, 1], [1, 1, 3, 1, 2, 3], [1, 1, 3, 3, 2, 1], [1, 3, 3, 1, 2, 1],
    [3, 1, 3, 1, 2, 1], [2, 1, 1, 3, 3, 1], [2, 3, 1, 1, 3, 1], [2, 1, 3, 1, 1, 3],
    [2, 1, 3, 3, 1, 1], [2, 1, 3, 1, 3, 1], [3, 1, 1, 1, 2, 3], [3, 1, 1, 3, 2, 1],
    [3, 3, 1, 1, 2, 1], [3, 1, 2, 1, 1, 3], [3, 1, 2, 3, 1, 1], [3, 3, 2, 1, 1, 1],
    [3, 1, 4, 1, 1, 1], [2, 2, 1, 4, 1, 1], [4, 3, 1, 1, 1, 1], [1, 1, 1, 2, 2, 4],
    [1, 1, 1, 4, 2, 2], [1, 2, 1, 1, 2, 4], [1, 2, 1, 4, 2, 1], [1, 4, 1, 1, 2, 2],
    [1, 4, 1, 2, 2, 1], [1, 1, 2, 2, 1, 4], [1, 1, 2, 4, 1, 2], [1, 2, 2, 1, 1, 4],
    [1, 2, 2, 4, 1, 1], [1, 4, 2, 1, 1, 2], [1, 4, 2, 2, 1, 1], [2, 4, 1, 2, 1, 1],
    [2, 2, 1, 1, 1, 4], [4, 1, 3, 1, 1, 1], [2, 4, 1, 1, 1, 2], [1, 3, 4, 1, 1, 1],
    [1, 1, 1, 2, 4, 2], [1, 2, 1, 1, 4, 2], [1, 2, 1, 2, 4, 1], [1, 1, 4, 2, 1, 2],
    [1, 2, 4, 1, 1, 2], [1, 2, 4, 2, 1, 1], [4, 1, 1, 2, 1, 2], [4, 2, 1, 1, 1, 2],
    [4, 2, 1, 2, 1, 1], [2, 1, 2, 1, 4, 1], [2, 1, 4, 1, 2, 1], [4, 1, 2, 1, 2, 1],
    [1, 1, 1, 1, 4, 3], [1, 1, 1, 3, 4, 1], [1, 3, 1, 1, 4, 1], [1, 1, 4, 1, 1, 3],
    [1, 1, 4, 3, 1, 1], [4, 1, 1, 1, 1, 3], [4, 1, 1, 3, 1, 1], [1, 1, 3, 1, 4, 1],
    [1, 1, 4, 1, 3, 1], [3, 1, 1, 1, 4, 1], [4, 1, 1, 1, 3, 1], [2, 1, 1, 4, 1, 2],
    [2, 1, 1, 2, 1, 4], [2, 1, 1, 2, 3, 2],
];

/// Stop pattern: 7 elements, 13 modules, ends on a bar.
const STOP_PATTERN: [u8; 7] = [2, 3, 3, 1, 1, 1, 2];

/// Switch from set C to set B
pub const CODE_B: u8 = 100;
/// Switch from set B to set C
pub const CODE_C: u8 = 99;
pub const START_B: u8 = 104;
pub const START_C: u8 = 105;
/// Symbol value used for the stop pattern in [`SymbolStructure::codes`]
pub const STOP: u8 = 106;

/// Modules per symbol character
pub const SYMBOL_MODULES: usize = 11;
/// Modules in the stop pattern
pub const STOP_MODULES: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    B,
    C,
}

/// # Code128 Symbol
///
/// The complete, immutable symbol for one [`BarcodeValue`]: code values
/// (start, data, checksum, stop) and the derived bar/space segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolStructure {
    value: BarcodeValue,
    codes: Vec<u8>,
    segments: Vec<Segment>,
}

impl SymbolStructure {
    /// The value this symbol encodes.
    pub fn value(&self) -> &BarcodeValue {
        &self.value
    }

    /// Symbol values: start, data, checksum, then [`STOP`].
    pub fn codes(&self) -> &[u8] {
        &self.codes
    }

    /// Bar/space runs from the start pattern through the stop pattern.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The modulo-103 check value.
    pub fn checksum(&self) -> u8 {
        self.codes[self.codes.len() - 2]
    }

    /// Total width in modules, excluding quiet zones.
    pub fn module_count(&self) -> usize {
        self.segments.iter().map(|s| s.width as usize).sum()
    }

    /// Expand segments into individual modules (`true` = bar).
    pub fn modules(&self) -> impl Iterator<Item = bool> + '_ {
        self.segments
            .iter()
            .flat_map(|s| std::iter::repeat_n(s.is_bar, s.width as usize))
    }
}

/// Encode a validated value into a Code128 symbol.
///
/// Deterministic: the same value always yields the same structure.
pub fn encode(value: &BarcodeValue) -> SymbolStructure {
    let mut codes = plan_codes(value.as_bytes());
    codes.push(checksum(&codes));
    codes.push(STOP);

    let segments = codes.iter().flat_map(|&code| pattern_for(code)).collect();

    SymbolStructure {
        value: value.clone(),
        codes,
        segments,
    }
}

/// `(start + Σ i × value_i) mod 103` over start + data codes.
///
/// Reduced on every term so values of any length stay in range.
fn checksum(codes: &[u8]) -> u8 {
    let sum = codes.iter().enumerate().fold(0u32, |acc, (i, &code)| {
        let weight = (i.max(1) % 103) as u32;
        (acc + code as u32 * weight) % 103
    });
    sum as u8
}

fn pattern_for(code: u8) -> impl Iterator<Item = Segment> {
    let widths: &'static [u8] = if code == STOP {
        &STOP_PATTERN
    } else {
        &PATTERNS[code as usize]
    };
    widths.iter().enumerate().map(|(i, &width)| Segment {
        width,
        is_bar: i % 2 == 0,
    })
}

/// Number of consecutive ASCII digits starting at `from`.
fn digit_run(bytes: &[u8], from: usize) -> usize {
    bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Choose code sets and produce start + data codes (no checksum, no stop).
fn plan_codes(bytes: &[u8]) -> Vec<u8> {
    let mut codes = Vec::with_capacity(bytes.len() + 2);

    let leading = digit_run(bytes, 0);
    let mut set = if leading >= 4 || (leading == 2 && bytes.len() == 2) {
        codes.push(START_C);
        CodeSet::C
    } else {
        codes.push(START_B);
        CodeSet::B
    };

    let mut i = 0;
    while i < bytes.len() {
        let run = digit_run(bytes, i);
        match set {
            CodeSet::C if run >= 2 => {
                codes.push((bytes[i] - b'0') * 10 + (bytes[i + 1] - b'0'));
                i += 2;
            }
            CodeSet::C => {
                codes.push(CODE_B);
                set = CodeSet::B;
            }
            CodeSet::B => {
                let reaches_end = i + run == bytes.len();
                if run >= 6 || (run >= 4 && reaches_end) {
                    if run % 2 == 1 {
                        codes.push(bytes[i] - b' ');
                        i += 1;
                    }
                    codes.push(CODE_C);
                    set = CodeSet::C;
                } else {
                    codes.push(bytes[i] - b' ');
                    i += 1;
                }
            }
        }
    }

    codes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn symbol(text: &str) -> SymbolStructure {
        encode(&BarcodeValue::new(text).unwrap())
    }

    #[test]
    fn test_patterns_are_eleven_modules() {
        for (value, pattern) in PATTERNS.iter().enumerate() {
            let sum: u8 = pattern.iter().sum();
            assert_eq!(sum as usize, SYMBOL_MODULES, "pattern {}", value);
        }
        let stop: u8 = STOP_PATTERN.iter().sum();
        assert_eq!(stop as usize, STOP_MODULES);
    }

    #[test]
    fn test_known_checksum() {
        // Classic worked example: Start B, P J J 1 2 3 C
        let s = symbol("PJJ123C");
        assert_eq!(s.codes().to_vec(), vec![104, 48, 42, 42, 17, 18, 19, 35, 55, STOP]);
        assert_eq!(s.checksum(), 55);
    }

    #[test]
    fn test_checksum_of_long_value() {
        // 104 + 94 * (1 + 2 + ... + 12000) overflows u32 when summed directly
        let s = symbol(&"~".repeat(12_000));
        let expected = (104u64 + 94 * (12_000 * 12_001 / 2)) % 103;
        assert_eq!(s.checksum() as u64, expected);
        assert_eq!(s.codes().len(), 12_003);
    }

    #[test]
    fn test_all_digits_use_set_c() {
        let s = symbol("123456");
        assert_eq!(s.codes().to_vec(), vec![START_C, 12, 34, 56, 44, STOP]);
    }

    #[test]
    fn test_two_digits_use_set_c() {
        let s = symbol("42");
        assert_eq!(s.codes()[..2].to_vec(), vec![START_C, 42]);
    }

    #[test]
    fn test_odd_leading_digits_switch_to_b() {
        let s = symbol("12345");
        assert_eq!(s.codes()[..5].to_vec(), vec![START_C, 12, 34, CODE_B, 21]);
    }

    #[test]
    fn test_short_digit_run_stays_in_b() {
        let s = symbol("AB12");
        assert_eq!(s.codes()[..5].to_vec(), vec![START_B, 33, 34, 17, 18]);
    }

    #[test]
    fn test_trailing_digit_run_switches_to_c() {
        let s = symbol("X12345");
        // X, then odd run: '1' in B, then C for 23 45
        assert_eq!(s.codes()[..6].to_vec(), vec![START_B, 56, 17, CODE_C, 23, 45]);
    }

    #[test]
    fn test_middle_digit_run_switches_back() {
        let s = symbol("A123456B");
        assert_eq!(
            s.codes()[..8].to_vec(),
            vec![START_B, 33, CODE_C, 12, 34, 56, CODE_B, 34]
        );
    }

    #[test]
    fn test_module_count() {
        let s = symbol("Hello");
        // start + 5 data + checksum = 7 symbols, plus stop
        assert_eq!(s.module_count(), 7 * SYMBOL_MODULES + STOP_MODULES);
        assert_eq!(s.modules().count(), s.module_count());
    }

    #[test]
    fn test_segments_alternate_and_end_on_bar() {
        let s = symbol("Label-01");
        let segments = s.segments();
        assert!(segments[0].is_bar);
        assert!(segments.last().unwrap().is_bar);
        for pair in segments.windows(2) {
            assert_ne!(pair[0].is_bar, pair[1].is_bar);
        }
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(symbol("ABC-123"), symbol("ABC-123"));
    }

    /// Compare against the `barcoders` reference encoder, ignoring any
    /// quiet-zone padding it may add.
    fn reference_modules(prefixed: &str) -> Vec<u8> {
        use barcoders::sym::code128::Code128;

        let encoded = Code128::new(prefixed).unwrap().encode();
        let first = encoded.iter().position(|&m| m == 1).unwrap();
        let last = encoded.iter().rposition(|&m| m == 1).unwrap();
        encoded[first..=last].to_vec()
    }

    fn our_modules(text: &str) -> Vec<u8> {
        symbol(text).modules().map(u8::from).collect()
    }

    #[test]
    fn test_matches_reference_set_b() {
        assert_eq!(our_modules("Hello"), reference_modules("\u{0181}Hello"));
        assert_eq!(our_modules("PJJ123C"), reference_modules("\u{0181}PJJ123C"));
    }

    #[test]
    fn test_matches_reference_set_c() {
        assert_eq!(our_modules("12345678"), reference_modules("\u{0106}12345678"));
    }
}
