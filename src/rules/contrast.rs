// SPDX-License-Identifier: PMPL-1.0-or-later
//! Color contrast check - WCAG 1.4.3 Contrast Minimum (Level AA)
//!
//! Reads `color` / `background-color` pairs from inline `style` attributes
//! and computes the WCAG contrast ratio between them. A `background`
//! shorthand contributes its color token, if it has one.
//! - below 4.5:1 fails
//! - below 3:1 is high severity

use super::markup;
use super::{Check, CheckInput, CONTRAST_RULE};
use crate::model::{Severity, ValidationResult};
use regex::Regex;
use std::sync::LazyLock;

/// Minimum ratio for normal text at level AA
pub const MIN_CONTRAST_RATIO: f64 = 4.5;

/// Ratio below which a failure is high severity
pub const SEVERE_CONTRAST_RATIO: f64 = 3.0;

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|;)\s*color\s*:\s*([^;]+)").expect("valid regex"));

static BG_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|;)\s*background-color\s*:\s*([^;]+)").expect("valid regex"));

static BG_SHORTHAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|;)\s*background\s*:\s*([^;]+)").expect("valid regex"));

/// One shorthand component: a bare word or a function call like `rgb(0, 0, 0)`
static SHORTHAND_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\s(]+(?:\([^)]*\))?").expect("valid regex"));

static RGB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^rgba?\(\s*(\d{1,3})\s*[,\s]\s*(\d{1,3})\s*[,\s]\s*(\d{1,3})\s*(?:[,/]\s*[\d.]+%?\s*)?\)$")
        .expect("valid regex")
});

static HSL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^hsla?\(\s*(\d+(?:\.\d+)?)(?:deg)?\s*[,\s]\s*(\d+(?:\.\d+)?)%\s*[,\s]\s*(\d+(?:\.\d+)?)%\s*(?:[,/]\s*[\d.]+%?\s*)?\)$")
        .expect("valid regex")
});

/// Parse a CSS hex color (#rgb, #rrggbb, with optional alpha digits ignored)
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 | 4 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some((r, g, b))
        }
        6 | 8 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        _ => None,
    }
}

/// Parse an rgb() or rgba() color into (r, g, b)
pub fn parse_rgb_color(value: &str) -> Option<(u8, u8, u8)> {
    let caps = RGB_RE.captures(value)?;
    let r: u8 = caps[1].parse().ok()?;
    let g: u8 = caps[2].parse().ok()?;
    let b: u8 = caps[3].parse().ok()?;
    Some((r, g, b))
}

/// Parse an hsl() or hsla() color into (r, g, b)
pub fn parse_hsl_color(value: &str) -> Option<(u8, u8, u8)> {
    let caps = HSL_RE.captures(value)?;
    let h: f64 = caps[1].parse::<f64>().ok()?.rem_euclid(360.0) / 360.0;
    let s: f64 = caps[2].parse::<f64>().ok()?.min(100.0) / 100.0;
    let l: f64 = caps[3].parse::<f64>().ok()?.min(100.0) / 100.0;

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |t: f64| {
        let t = t.rem_euclid(1.0);
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round() as u8
    };
    Some((channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)))
}

/// Parse a named CSS color
pub fn parse_named_color(name: &str) -> Option<(u8, u8, u8)> {
    match name {
        "white" => Some((255, 255, 255)),
        "black" => Some((0, 0, 0)),
        "red" => Some((255, 0, 0)),
        "green" => Some((0, 128, 0)),
        "blue" => Some((0, 0, 255)),
        "yellow" => Some((255, 255, 0)),
        "gray" | "grey" => Some((128, 128, 128)),
        "darkgray" | "darkgrey" => Some((169, 169, 169)),
        "lightgray" | "lightgrey" => Some((211, 211, 211)),
        "silver" => Some((192, 192, 192)),
        "maroon" => Some((128, 0, 0)),
        "olive" => Some((128, 128, 0)),
        "lime" => Some((0, 255, 0)),
        "aqua" | "cyan" => Some((0, 255, 255)),
        "teal" => Some((0, 128, 128)),
        "navy" => Some((0, 0, 128)),
        "fuchsia" | "magenta" => Some((255, 0, 255)),
        "purple" => Some((128, 0, 128)),
        "orange" => Some((255, 165, 0)),
        _ => None,
    }
}

/// Parse any CSS color value into (r, g, b)
pub fn parse_color(value: &str) -> Option<(u8, u8, u8)> {
    let lowered = value.trim().to_lowercase();
    let trimmed = lowered.trim_end_matches("!important").trim();
    if trimmed.starts_with('#') {
        parse_hex_color(trimmed)
    } else if trimmed.starts_with("rgb") {
        parse_rgb_color(trimmed)
    } else if trimmed.starts_with("hsl") {
        parse_hsl_color(trimmed)
    } else {
        parse_named_color(trimmed)
    }
}

/// Background color declared in a style attribute.
///
/// `background-color` wins; otherwise the first color token of a
/// `background` shorthand. A shorthand without a color gives `None`.
fn background_color(style: &str) -> Option<String> {
    if let Some(caps) = BG_COLOR_RE.captures(style) {
        return Some(caps[1].trim().to_string());
    }
    let shorthand = BG_SHORTHAND_RE.captures(style)?;
    SHORTHAND_TOKEN_RE
        .find_iter(&shorthand[1])
        .map(|m| m.as_str())
        .find(|token| parse_color(token).is_some())
        .map(str::to_string)
}

/// Calculate relative luminance per WCAG 2.x
/// <https://www.w3.org/TR/WCAG21/#dfn-relative-luminance>
pub fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    let srgb = [r, g, b].map(|c| {
        let v = c as f64 / 255.0;
        if v <= 0.04045 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    });
    0.2126 * srgb[0] + 0.7152 * srgb[1] + 0.0722 * srgb[2]
}

/// Calculate contrast ratio between two colors
/// Returns a ratio >= 1.0 (e.g., 4.5, 7.0, 21.0)
pub fn contrast_ratio(fg: (u8, u8, u8), bg: (u8, u8, u8)) -> f64 {
    let l1 = relative_luminance(fg.0, fg.1, fg.2);
    let l2 = relative_luminance(bg.0, bg.1, bg.2);
    let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Inline style contrast check
pub struct ContrastCheck;

impl Check for ContrastCheck {
    fn rule_id(&self) -> &'static str {
        CONTRAST_RULE
    }

    fn check(&self, input: &CheckInput<'_>) -> Vec<ValidationResult> {
        let mut results = Vec::new();

        for tag in markup::all_tags(input.content) {
            let Some(style) = tag.attr("style") else {
                continue;
            };
            let fg_raw = COLOR_RE.captures(style).map(|c| c[1].trim().to_string());
            let bg_raw = background_color(style);

            let (Some(fg_raw), Some(bg_raw)) = (fg_raw, bg_raw) else {
                continue;
            };

            let fg = parse_color(&fg_raw);
            let bg = parse_color(&bg_raw);

            match (fg, bg) {
                (Some(fg), Some(bg)) => {
                    let ratio = contrast_ratio(fg, bg);
                    if ratio < MIN_CONTRAST_RATIO {
                        let severity = if ratio < SEVERE_CONTRAST_RATIO {
                            Severity::High
                        } else {
                            Severity::Medium
                        };
                        results.push(
                            ValidationResult::failure(
                                CONTRAST_RULE,
                                severity,
                                format!(
                                    "Contrast ratio {:.2}:1 between {} and {} is below the {}:1 minimum",
                                    ratio, fg_raw, bg_raw, MIN_CONTRAST_RATIO
                                ),
                            )
                            .with_element(tag.snippet())
                            .with_suggestion(
                                "Darken the text or lighten the background to reach at least 4.5:1",
                            ),
                        );
                    }
                }
                _ => {
                    let unparsed: Vec<&str> = [(fg, fg_raw.as_str()), (bg, bg_raw.as_str())]
                        .iter()
                        .filter(|(parsed, _)| parsed.is_none())
                        .map(|(_, raw)| *raw)
                        .collect();
                    results.push(
                        ValidationResult::failure(
                            CONTRAST_RULE,
                            Severity::Low,
                            format!("Could not parse color value(s) {}; contrast not verified", unparsed.join(", ")),
                        )
                        .with_element(tag.snippet())
                        .with_suggestion("Use hex, rgb(), hsl() or named colors so contrast can be verified"),
                    );
                }
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;

    fn run(content: &str) -> Vec<ValidationResult> {
        let config = RuleConfig::default();
        ContrastCheck.check(&CheckInput { content, images: &[], config: &config })
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#fff"), Some((255, 255, 255)));
        assert_eq!(parse_hex_color("#000"), Some((0, 0, 0)));
        assert_eq!(parse_hex_color("#ff0000"), Some((255, 0, 0)));
        assert_eq!(parse_hex_color("#ff000080"), Some((255, 0, 0)));
        assert_eq!(parse_hex_color("#ggg"), None);
        assert_eq!(parse_hex_color("#12345"), None);
    }

    #[test]
    fn test_parse_rgb_and_hsl() {
        assert_eq!(parse_color("rgb(255, 0, 0)"), Some((255, 0, 0)));
        assert_eq!(parse_color("rgba(0, 128, 0, 0.5)"), Some((0, 128, 0)));
        assert_eq!(parse_color("hsl(0, 100%, 50%)"), Some((255, 0, 0)));
        assert_eq!(parse_color("hsl(120, 100%, 25%)"), Some((0, 128, 0)));
        assert_eq!(parse_color("WHITE !important"), Some((255, 255, 255)));
        assert_eq!(parse_color("rgb(300, 0, 0)"), None);
    }

    #[test]
    fn test_contrast_ratio_black_white() {
        let ratio = contrast_ratio((0, 0, 0), (255, 255, 255));
        assert!((ratio - 21.0).abs() < 0.1, "Black on white should be ~21:1, got {:.2}", ratio);
    }

    #[test]
    fn test_contrast_ratio_is_symmetric() {
        let a = contrast_ratio((119, 119, 119), (255, 255, 255));
        let b = contrast_ratio((255, 255, 255), (119, 119, 119));
        assert!((a - b).abs() < f64::EPSILON);
    }

    #[test]
    fn test_good_contrast() {
        assert!(run(r#"<p style="color: #000; background-color: #fff">ok</p>"#).is_empty());
    }

    #[test]
    fn test_medium_failure_between_three_and_four_point_five() {
        // #888 on white is roughly 3.5:1
        let results = run(r#"<p style="color: #888888; background-color: #ffffff">meh</p>"#);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::Medium);
    }

    #[test]
    fn test_high_failure_below_three() {
        let results = run(r#"<span style="color:#aaa;background-color:#ccc">faint</span>"#);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::High);
    }

    #[test]
    fn test_unparsable_color_is_low_diagnostic() {
        let results = run(r#"<p style="color: var(--ink); background-color: #fff">x</p>"#);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::Low);
        assert!(!results[0].passed);
        assert!(results[0].message.contains("var(--ink)"));
    }

    #[test]
    fn test_single_color_is_not_checked() {
        assert!(run(r#"<p style="color: #eee">only foreground</p>"#).is_empty());
    }

    #[test]
    fn test_background_color_not_mistaken_for_color() {
        // "background-color" must not satisfy the foreground pattern
        assert!(run(r#"<p style="background-color: #fff">bg only</p>"#).is_empty());
    }

    #[test]
    fn test_background_shorthand_color_token() {
        assert!(run(r#"<p style="color: #000; background: #fff url(x.png) no-repeat">ok</p>"#).is_empty());

        let results = run(r#"<p style="color: #aaa; background: url(x.png) rgb(204, 204, 204)">faint</p>"#);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::High);
    }

    #[test]
    fn test_background_shorthand_without_color_is_not_checked() {
        assert!(run(r#"<p style="color: #000; background: url(x.png) center">x</p>"#).is_empty());
    }

    #[test]
    fn test_uppercase_important_is_stripped() {
        assert_eq!(parse_color("#FFF !IMPORTANT"), Some((255, 255, 255)));
        assert!(run(r#"<p style="color: #000 !IMPORTANT; background-color: #FFF !Important">ok</p>"#).is_empty());
    }
}
