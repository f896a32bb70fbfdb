//! Free-text quantity entry.
//!
//! Counters type quantities the way they count shelves: `12`, `2.5`, or a
//! running sum such as `6+6+3`. Parsing never fails; anything unreadable
//! counts as zero.

/// Parse a quantity expression.
///
/// All whitespace is removed first. If the text contains `+`, each segment
/// is parsed on its own (unreadable or empty segments count as 0) and the
/// parts are summed. Otherwise the whole text is parsed, defaulting to 0.
/// The result is always finite. Negative values pass through unclamped.
#[must_use]
pub fn parse_quantity(text: &str) -> f64 {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return 0.0;
    }

    let sum = if cleaned.contains('+') {
        cleaned.split('+').map(parse_segment).sum()
    } else {
        parse_segment(&cleaned)
    };

    if sum.is_finite() { sum } else { 0.0 }
}

fn parse_segment(segment: &str) -> f64 {
    segment
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Render a quantity for display: integral values without a fraction,
/// everything else in shortest round-trip form. Negative zero prints as `0`.
#[must_use]
pub fn format_quantity(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}
