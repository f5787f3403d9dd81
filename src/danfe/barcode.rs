//! CODE-128C encoding of the access key.
//!
//! The DANFE carries the 44-digit access key as a CODE-128 set C symbol
//! (digit pairs, mod-103 checksum). `bars` exposes the raw bar geometry
//! for the PDF layout; `barcode_svg` wraps the same geometry as a
//! standalone SVG image for the pure text-to-image-bytes contract.

use crate::core::FiscalError;

/// Bar/space width patterns for symbol values 0..=105, in module units.
/// Index = symbol value; each pattern is bar,space,bar,space,bar,space.
const PATTERNS: [&str; 106] = [
    "212222", "222122", "222221", "121223", "121322", "131222", "122213", "122312", "132212",
    "221213", "221312", "231212", "112232", "122132", "122231", "113222", "123122", "123221",
    "223211", "221132", "221231", "213212", "223112", "312131", "311222", "321122", "321221",
    "312212", "322112", "322211", "212123", "212321", "232121", "111323", "131123", "131321",
    "112313", "132113", "132311", "211313", "231113", "231311", "112133", "112331", "132131",
    "113123", "113321", "133121", "313121", "211331", "231131", "213113", "213311", "213131",
    "311123", "311321", "331121", "312113", "312311", "332111", "314111", "221411", "431111",
    "111224", "111422", "121124", "121421", "141122", "141221", "112214", "112412", "122114",
    "122411", "142112", "142211", "241211", "221114", "413111", "241112", "134111", "111242",
    "121142", "121241", "114212", "124112", "124211", "411212", "421112", "421211", "212141",
    "214121", "412121", "111143", "111341", "131141", "114113", "114311", "411113", "411311",
    "113141", "114131", "311141", "411131", "211412", "211214", "211232",
];

const START_C: u32 = 105;
const STOP_PATTERN: &str = "2331112";

/// One dark bar: offset and width, both in module units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bar {
    pub x: u32,
    pub width: u32,
}

/// Encoded symbol: dark bars plus the total width in modules.
#[derive(Debug, Clone)]
pub struct BarGeometry {
    pub bars: Vec<Bar>,
    pub modules: u32,
}

/// Encode an even-length digit string as CODE-128C bar geometry.
pub fn bars(digits: &str) -> Result<BarGeometry, FiscalError> {
    if digits.is_empty()
        || digits.len() % 2 != 0
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(FiscalError::InvalidIdentifier(format!(
            "CODE-128C needs an even number of digits, got {:?}",
            digits.len()
        )));
    }

    let mut values = vec![START_C];
    for pair in digits.as_bytes().chunks(2) {
        values.push(u32::from(pair[0] - b'0') * 10 + u32::from(pair[1] - b'0'));
    }
    let checksum = values
        .iter()
        .enumerate()
        .map(|(i, v)| v * (i as u32).max(1))
        .sum::<u32>()
        % 103;
    values.push(checksum);

    let mut geometry = BarGeometry {
        bars: Vec::new(),
        modules: 0,
    };
    for v in &values {
        push_pattern(&mut geometry, PATTERNS[*v as usize]);
    }
    push_pattern(&mut geometry, STOP_PATTERN);
    Ok(geometry)
}

fn push_pattern(geometry: &mut BarGeometry, pattern: &str) {
    for (i, w) in pattern.bytes().enumerate() {
        let width = u32::from(w - b'0');
        if i % 2 == 0 {
            geometry.bars.push(Bar {
                x: geometry.modules,
                width,
            });
        }
        geometry.modules += width;
    }
}

/// Render a 44-digit access key as a CODE-128C barcode SVG.
///
/// Pure function of the digit string; fails with
/// [`FiscalError::InvalidIdentifier`] for anything that is not 44 digits.
pub fn barcode_svg(access_key: &str) -> Result<Vec<u8>, FiscalError> {
    if !crate::core::is_access_key_well_formed(access_key) {
        return Err(FiscalError::InvalidIdentifier(format!(
            "access key must be 44 digits, got {} characters",
            access_key.len()
        )));
    }
    let geometry = bars(access_key)?;

    // 10-module quiet zone on each side, 2x scale, 50pt tall.
    let quiet = 10;
    let scale = 2;
    let width = (geometry.modules + 2 * quiet) * scale;
    let height = 50;

    let mut svg = String::with_capacity(4096);
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {width} {height}\">\n"
    ));
    svg.push_str(&format!(
        "<rect width=\"{width}\" height=\"{height}\" fill=\"#ffffff\"/>\n"
    ));
    for bar in &geometry.bars {
        svg.push_str(&format!(
            "<rect x=\"{}\" y=\"0\" width=\"{}\" height=\"{height}\" fill=\"#000000\"/>\n",
            (bar.x + quiet) * scale,
            bar.width * scale,
        ));
    }
    svg.push_str("</svg>\n");
    Ok(svg.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_odd_or_non_digit_input() {
        assert!(bars("123").is_err());
        assert!(bars("12a4").is_err());
        assert!(bars("").is_err());
    }

    #[test]
    fn known_checksum() {
        // "10" alone: checksum = (105 + 10*1) % 103 = 12.
        let g = bars("10").unwrap();
        // start + data + checksum each 11 modules, stop 13.
        assert_eq!(g.modules, 11 * 3 + 13);
        let expected: Vec<Bar> = {
            let mut acc = BarGeometry { bars: Vec::new(), modules: 0 };
            push_pattern(&mut acc, PATTERNS[105]); // start C
            push_pattern(&mut acc, PATTERNS[10]); // "10"
            push_pattern(&mut acc, PATTERNS[12]); // checksum
            push_pattern(&mut acc, STOP_PATTERN);
            acc.bars
        };
        assert_eq!(g.bars, expected);
    }

    #[test]
    fn svg_for_well_formed_key() {
        let key = "1".repeat(44);
        let svg = barcode_svg(&key).unwrap();
        let text = String::from_utf8(svg).unwrap();
        assert!(text.starts_with("<svg"));
        assert!(text.contains("fill=\"#000000\""));
    }

    #[test]
    fn svg_rejects_bad_key() {
        assert!(barcode_svg("123").is_err());
    }
}
