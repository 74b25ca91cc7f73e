//! Approximate text metrics.
//!
//! Widths come from per-character advance classes tuned for a sans-serif
//! face; they are only used for margins and legend boxes, so a few percent
//! of error is harmless.

use crate::primitives::{FontWeight, TextStyle};

#[derive(Debug, Clone, Copy)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub ascent: f64,
}

fn advance(ch: char) -> f64 {
    match ch {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.26,
        'f' | 't' | 'r' | ' ' | '(' | ')' | '[' | ']' | '-' => 0.34,
        'm' | 'w' | 'M' | 'W' => 0.84,
        '0'..='9' => 0.56,
        c if c.is_ascii_uppercase() => 0.66,
        _ => 0.53,
    }
}

/// Measure text width and height in points.
pub fn measure_text(text: &str, size_pt: f64, weight: FontWeight) -> TextMetrics {
    let em: f64 = text.chars().map(advance).sum();
    let bold = if weight == FontWeight::Bold { 1.06 } else { 1.0 };
    TextMetrics { width: em * size_pt * bold, height: 1.2 * size_pt, ascent: 0.93 * size_pt }
}

/// Measure text with a TextStyle.
pub fn measure_styled(text: &str, style: &TextStyle) -> TextMetrics {
    measure_text(text, style.size, style.weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_hello() {
        let m = measure_text("Hello", 12.0, FontWeight::Regular);
        assert!(m.width > 20.0);
        assert!(m.height > 8.0);
        assert!(m.ascent > 0.0);
    }

    #[test]
    fn bold_wider_than_regular() {
        let r = measure_text("Test", 12.0, FontWeight::Regular);
        let b = measure_text("Test", 12.0, FontWeight::Bold);
        assert!(b.width > r.width);
    }

    #[test]
    fn scales_with_size() {
        let small = measure_styled("outcome", &TextStyle { size: 8.0, ..Default::default() });
        let large = measure_styled("outcome", &TextStyle { size: 16.0, ..Default::default() });
        assert!((large.width - 2.0 * small.width).abs() < 1e-9);
        assert_eq!(measure_text("", 10.0, FontWeight::Regular).width, 0.0);
    }
}
