//! Static font-metric tables for the base-14 fonts the résumé renderer uses.
//!
//! Character widths are the published AFM advance widths, in thousandths of an em.
//! Kerning and ligatures are ignored: the estimate only has to rank layouts and
//! converge, not match the renderer to the point.
//! All tables cover ASCII 0x20..=0x7E (95 printable characters).
//! Index = (char as usize) - 32.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Font family enum
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    /// Body font of the default résumé template.
    TimesRoman,
    Helvetica,
}

impl FontFamily {
    /// Parses the `PAGE_FONT` setting.
    pub fn from_setting(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "times" | "times-roman" | "times_roman" => Some(FontFamily::TimesRoman),
            "helvetica" => Some(FontFamily::Helvetica),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page geometry
// ────────────────────────────────────────────────────────────────────────────

/// Physical page parameters, all in PostScript points.
///
/// Default: US letter, 0.5" side margins, 10.5 pt body at 109% leading.
/// Bullet lines hang: the bullet sits at `bullet_left_indent + bullet_first_line_indent`
/// and wrapped lines align to `bullet_left_indent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageGeometry {
    pub font: FontFamily,
    pub page_width_pt: f32,
    pub margin_left_pt: f32,
    pub margin_right_pt: f32,
    pub font_size_pt: f32,
    pub leading_pt: f32,
    pub bullet_left_indent_pt: f32,
    pub bullet_first_line_indent_pt: f32,
}

impl PageGeometry {
    pub fn content_width_pt(&self) -> f32 {
        self.page_width_pt - self.margin_left_pt - self.margin_right_pt
    }
}

pub fn default_page_geometry(font: FontFamily) -> PageGeometry {
    let font_size_pt = 10.5;
    PageGeometry {
        font,
        page_width_pt: 612.0,
        margin_left_pt: 36.0,
        margin_right_pt: 36.0,
        font_size_pt,
        leading_pt: font_size_pt * 1.09,
        bullet_left_indent_pt: 36.0,
        bullet_first_line_indent_pt: -17.85,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for a font family.
///
/// `widths[i]` = advance width of ASCII character `(i + 32)` in 1/1000 em.
///
/// Width array slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    widths: [u16; 95],
    /// Fallback for non-ASCII characters without an explicit entry.
    pub average_char_width: u16,
    pub bullet_width: u16,
    pub en_dash_width: u16,
    pub em_dash_width: u16,
}

impl FontMetricTable {
    fn char_width(&self, c: char) -> u16 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            return self.widths[code - 32];
        }
        match c {
            '\u{2022}' => self.bullet_width,
            '\u{2013}' => self.en_dash_width,
            '\u{2014}' => self.em_dash_width,
            '\u{2018}' | '\u{2019}' => self.widths[7].max(333),
            '\u{201C}' | '\u{201D}' => self.widths[2],
            _ => self.average_char_width,
        }
    }

    /// Width of a string in points at `font_size_pt`.
    pub fn measure_str(&self, s: &str, font_size_pt: f32) -> f32 {
        let units: u32 = s.chars().map(|c| self.char_width(c) as u32).sum();
        units as f32 * font_size_pt / 1000.0
    }

    pub fn space_width(&self, font_size_pt: f32) -> f32 {
        self.widths[0] as f32 * font_size_pt / 1000.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

static TIMES_ROMAN_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
        // 0    1    2    3    4    5    6    7    8    9
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        // :    ;    <    =    >    ?    @
        278, 278, 564, 564, 564, 444, 921,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
        // [    \    ]    ^    _    `
        333, 278, 333, 469, 500, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
        // {    |    }    ~
        480, 200, 480, 541,
    ],
    average_char_width: 500,
    bullet_width: 350,
    en_dash_width: 500,
    em_dash_width: 1000,
};

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        278, 278, 584, 584, 584, 556, 1015,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        278, 278, 278, 469, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        // {    |    }    ~
        334, 260, 334, 584,
    ],
    average_char_width: 556,
    bullet_width: 350,
    en_dash_width: 556,
    em_dash_width: 1000,
};

/// Returns the static metric table for a given font family.
pub fn get_metrics(font: &FontFamily) -> &'static FontMetricTable {
    match font {
        FontFamily::TimesRoman => &TIMES_ROMAN_TABLE,
        FontFamily::Helvetica => &HELVETICA_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_str_empty_returns_zero() {
        let metrics = get_metrics(&FontFamily::TimesRoman);
        assert_eq!(metrics.measure_str("", 10.0), 0.0);
    }

    #[test]
    fn test_measure_str_ascii_characters() {
        let metrics = get_metrics(&FontFamily::TimesRoman);
        // "Rust" = R(667) + u(500) + s(389) + t(278) = 1834 units → 18.34pt at 10pt
        let width = metrics.measure_str("Rust", 10.0);
        assert!((width - 18.34).abs() < 1e-3, "got {width}");
    }

    #[test]
    fn test_measure_scales_with_font_size() {
        let metrics = get_metrics(&FontFamily::Helvetica);
        let small = metrics.measure_str("Latency", 10.0);
        let large = metrics.measure_str("Latency", 20.0);
        assert!((large - 2.0 * small).abs() < 1e-3);
    }

    #[test]
    fn test_bullet_and_non_ascii_widths() {
        let metrics = get_metrics(&FontFamily::TimesRoman);
        assert!((metrics.measure_str("\u{2022}", 1000.0) - 350.0).abs() < 1e-3);
        assert!((metrics.measure_str("é", 1000.0) - metrics.average_char_width as f32).abs() < 1e-3);
    }

    #[test]
    fn test_helvetica_wider_than_times() {
        let text = "Architected distributed caching layer";
        let times = get_metrics(&FontFamily::TimesRoman).measure_str(text, 10.5);
        let helvetica = get_metrics(&FontFamily::Helvetica).measure_str(text, 10.5);
        assert!(helvetica > times);
    }

    #[test]
    fn test_default_geometry() {
        let geometry = default_page_geometry(FontFamily::TimesRoman);
        assert!((geometry.content_width_pt() - 540.0).abs() < 1e-4);
        assert!((geometry.leading_pt - 11.445).abs() < 1e-3);
    }

    #[test]
    fn test_font_from_setting() {
        assert_eq!(FontFamily::from_setting("Times"), Some(FontFamily::TimesRoman));
        assert_eq!(FontFamily::from_setting("helvetica"), Some(FontFamily::Helvetica));
        assert_eq!(FontFamily::from_setting("comic-sans"), None);
    }
}
