//! Text measurement for the builtin Helvetica faces the painter emits.
//!
//! Widths come from the standard Helvetica AFM advance table (1/1000 em),
//! so wrapping in layout matches what the PDF viewer draws.

/// Advance widths for the builtin Helvetica family.
#[derive(Debug, Clone)]
pub struct FontManager {
    units_per_em: f32,
    ascender: f32,
    /// Bold glyphs are uniformly wider than regular ones.
    bold_factor: f32,
}

impl Default for FontManager {
    fn default() -> Self {
        Self {
            units_per_em: 1000.0,
            ascender: 718.0,
            bold_factor: 1.07,
        }
    }
}

impl FontManager {
    fn advance(ch: char) -> f32 {
        let units = match ch {
            ' ' | '.' | ',' | ':' | ';' | '!' | '/' | 'f' | 't' | 'I' | '\u{00A0}' => 278,
            'i' | 'j' | 'l' => 222,
            'r' | '-' | '(' | ')' => 333,
            'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' | 'J' => 500,
            'm' | 'M' => 833,
            'w' | 'C' | 'D' | 'H' | 'N' | 'R' | 'U' => 722,
            'A' | 'B' | 'E' | 'K' | 'P' | 'S' | 'V' | 'X' | 'Y' | '&' => 667,
            'F' | 'T' | 'Z' => 611,
            'G' | 'O' | 'Q' => 778,
            'L' => 556,
            'W' => 944,
            '\'' => 191,
            '"' => 355,
            '*' => 389,
            '+' => 584,
            '%' => 889,
            '@' => 1015,
            '|' => 260,
            c if c.is_ascii_digit() => 556,
            c if c.is_uppercase() => 722,
            c if c.is_lowercase() => 556,
            _ => 556,
        };
        units as f32
    }

    /// Width of `text` in px at `font_size`.
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool) -> f32 {
        let units: f32 = text.chars().map(Self::advance).sum();
        let width = units * font_size / self.units_per_em;
        if bold {
            width * self.bold_factor
        } else {
            width
        }
    }

    pub fn line_height_px(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    /// Distance from the top of a line box to the baseline.
    pub fn ascender_px(&self, font_size: f32) -> f32 {
        self.ascender * font_size / self.units_per_em
    }
}

/// Word-wrap text to fit within `max_width` pixels. Returns a vec of lines.
/// Words wider than a full line are broken between characters.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let fits = |s: &str| fonts.measure_text_width(s, font_size, bold) <= max_width;
    let mut lines: Vec<String> = Vec::new();

    // Hard breaks (<br>) arrive as '\n'.
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if fits(&candidate) {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if fits(word) {
                current = word.to_string();
                continue;
            }
            for ch in word.chars() {
                current.push(ch);
                if !fits(&current) && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                }
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_advances() {
        let mgr = FontManager::default();
        // H(722) e(556) l(222) l(222) o(556) = 2278 units
        let w = mgr.measure_text_width("Hello", 10.0, false);
        assert!((w - 22.78).abs() < 0.01);
        assert!(mgr.measure_text_width("Hello", 10.0, true) > w);
    }

    #[test]
    fn word_wrap_basic() {
        let mgr = FontManager::default();
        let lines = wrap_text("Hello world foo bar", 16.0, false, 60.0, &mgr);
        assert!(lines.len() >= 2, "Expected wrapping, got {lines:?}");
    }

    #[test]
    fn long_words_break_between_characters() {
        let mgr = FontManager::default();
        let lines = wrap_text("https://comunidadfeliz.cl/ayuda/gastos-comunes", 12.0, false, 80.0, &mgr);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(mgr.measure_text_width(line, 12.0, false) <= 80.0);
        }
        assert_eq!(lines.concat(), "https://comunidadfeliz.cl/ayuda/gastos-comunes");
    }

    #[test]
    fn hard_breaks_start_new_lines() {
        let mgr = FontManager::default();
        let lines = wrap_text("uno\ndos", 12.0, false, 500.0, &mgr);
        assert_eq!(lines, vec!["uno", "dos"]);
    }
}
