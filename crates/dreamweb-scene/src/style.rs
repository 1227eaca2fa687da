//! Style token resolution.
//!
//! Every function here is total: unknown tokens fall through to a passthrough
//! or to the category default, never to an error. Lookups are exact and
//! case-sensitive.

use serde_json::Value;

const DEFAULT_BORDER_COLOR: &str = "#d1d5db";
const ROUNDED_RADIUS: &str = "0.375rem";

/// Named colors understood by `color`, `background` and gradient tokens.
const COLORS: &[(&str, &str)] = &[
    ("primary", "#3b82f6"),
    ("secondary", "#6b7280"),
    ("success", "#10b981"),
    ("danger", "#ef4444"),
    ("warning", "#f59e0b"),
    ("info", "#06b6d4"),
    ("black", "#000000"),
    ("white", "#ffffff"),
    ("gray", "#6b7280"),
    ("red", "#ef4444"),
    ("blue", "#3b82f6"),
    ("green", "#10b981"),
    ("yellow", "#f59e0b"),
    ("purple", "#8b5cf6"),
    ("pink", "#ec4899"),
];

const FONT_SIZES: &[(&str, &str)] = &[
    ("xs", "0.75rem"),
    ("sm", "0.875rem"),
    ("md", "1rem"),
    ("lg", "1.125rem"),
    ("xl", "1.25rem"),
    ("2xl", "1.5rem"),
    ("3xl", "1.875rem"),
    ("4xl", "2.25rem"),
];

const FONT_WEIGHTS: &[(&str, &str)] = &[
    ("normal", "400"),
    ("medium", "500"),
    ("semibold", "600"),
    ("bold", "700"),
];

const SHADOWS: &[(&str, &str)] = &[
    ("sm", "0 1px 2px 0 rgba(0, 0, 0, 0.05)"),
    ("md", "0 4px 6px -1px rgba(0, 0, 0, 0.1)"),
    ("lg", "0 10px 15px -3px rgba(0, 0, 0, 0.1)"),
    ("xl", "0 20px 25px -5px rgba(0, 0, 0, 0.1)"),
    ("2xl", "0 25px 50px -12px rgba(0, 0, 0, 0.25)"),
    ("none", "none"),
];

const BUTTON_PADDING: &[(&str, &str)] = &[
    ("sm", "0.5rem 1rem"),
    ("md", "0.625rem 1.25rem"),
    ("lg", "0.75rem 1.5rem"),
    ("xl", "1rem 2rem"),
];

const BUTTON_FONT_SIZES: &[(&str, &str)] = &[
    ("sm", "0.875rem"),
    ("md", "1rem"),
    ("lg", "1.125rem"),
    ("xl", "1.25rem"),
];

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn lookup_value(table: &[(&str, &'static str)], value: &Value) -> Option<&'static str> {
    value.as_str().and_then(|key| lookup(table, key))
}

/// Print a number the way style values expect it: `12`, not `12.0`.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Plain text form of a prop value, used for passthrough.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn px(value: &Value) -> Option<String> {
    value.as_f64().map(|n| format!("{}px", format_number(n)))
}

/// Width/height: numbers are pixels, `full` is 100%.
pub fn parse_size(size: &Value) -> String {
    if let Some(pixels) = px(size) {
        return pixels;
    }
    match size.as_str() {
        Some("full") => "100%".to_string(),
        _ => value_text(size),
    }
}

/// Padding/margin: a number is uniform, an object is a four-value shorthand
/// with missing sides at zero.
pub fn parse_spacing(spacing: &Value) -> String {
    if let Some(pixels) = px(spacing) {
        return pixels;
    }
    if let Value::Object(sides) = spacing {
        let side = |name: &str| match sides.get(name) {
            Some(v) if !v.is_null() => format!("{}px", value_text(v)),
            _ => "0px".to_string(),
        };
        return format!(
            "{} {} {} {}",
            side("top"),
            side("right"),
            side("bottom"),
            side("left")
        );
    }
    value_text(spacing)
}

/// Named color, `gradient-<from>-<to>`, or passthrough.
pub fn parse_color(color: &str) -> String {
    if let Some(stops) = color.strip_prefix("gradient-") {
        let parts: Vec<&str> = stops.split('-').collect();
        if let [from, to] = parts.as_slice() {
            let from = lookup(COLORS, from).unwrap_or(*from);
            let to = lookup(COLORS, to).unwrap_or(*to);
            return format!("linear-gradient(135deg, {from}, {to})");
        }
    }
    lookup(COLORS, color).unwrap_or(color).to_string()
}

pub fn parse_font_size(size: &Value) -> String {
    if let Some(mapped) = lookup_value(FONT_SIZES, size) {
        return mapped.to_string();
    }
    px(size).unwrap_or_else(|| value_text(size))
}

pub fn parse_font_weight(weight: &Value) -> String {
    lookup_value(FONT_WEIGHTS, weight)
        .map(str::to_string)
        .unwrap_or_else(|| value_text(weight))
}

/// `true` is the standard radius, `false` is square, numbers are pixels.
pub fn parse_rounded(rounded: &Value) -> String {
    match rounded {
        Value::Bool(true) => ROUNDED_RADIUS.to_string(),
        Value::Bool(false) => "0".to_string(),
        other => px(other).unwrap_or_else(|| value_text(other)),
    }
}

pub fn parse_shadow(shadow: &Value) -> String {
    lookup_value(SHADOWS, shadow)
        .map(str::to_string)
        .unwrap_or_else(|| value_text(shadow))
}

pub fn parse_button_padding(size: Option<&str>) -> &'static str {
    size.and_then(|s| lookup(BUTTON_PADDING, s))
        .unwrap_or("0.625rem 1.25rem")
}

pub fn parse_button_font_size(size: Option<&str>) -> &'static str {
    size.and_then(|s| lookup(BUTTON_FONT_SIZES, s))
        .unwrap_or("1rem")
}

/// Background, text color and border for a button variant.
///
/// `variant` is one of `solid` (default), `outline`, `ghost` or `link`.
/// Declarations that depend on an absent base color are left out.
pub fn button_colors(color: Option<&str>, variant: Option<&str>) -> Vec<(&'static str, String)> {
    let base = color.map(parse_color);
    let mut out = Vec::new();
    match variant {
        Some(kind @ ("outline" | "ghost" | "link")) => {
            out.push(("background", "transparent".to_string()));
            if let Some(base) = &base {
                out.push(("color", base.clone()));
            }
            if kind == "outline" {
                let border = match &base {
                    Some(base) => format!("2px solid {base}"),
                    None => "2px solid".to_string(),
                };
                out.push(("border", border));
            } else {
                out.push(("border", "none".to_string()));
            }
            if kind == "link" {
                out.push(("text-decoration", "underline".to_string()));
            }
        }
        _ => {
            if let Some(base) = base {
                out.push(("background", base));
            }
            out.push(("color", "#ffffff".to_string()));
            out.push(("border", "none".to_string()));
        }
    }
    out
}

/// Border shorthand from a pixel width or `{ width, style, color }`.
pub fn border(border: &Value) -> Option<String> {
    if let Some(width) = border.as_f64() {
        return Some(format!(
            "{}px solid {DEFAULT_BORDER_COLOR}",
            format_number(width)
        ));
    }
    let Value::Object(parts) = border else {
        return None;
    };
    let field = |name: &str| parts.get(name).filter(|v| dreamweb_ir::is_truthy(v));
    let width = field("width").map(value_text).unwrap_or_else(|| "1".into());
    let style = field("style").map(value_text).unwrap_or_else(|| "solid".into());
    let color = field("color")
        .map(value_text)
        .unwrap_or_else(|| DEFAULT_BORDER_COLOR.into());
    Some(format!("{width}px {style} {color}"))
}

/// Cross-axis alignment; defaults to `stretch`.
pub fn map_align(align: Option<&str>) -> &'static str {
    match align {
        Some("start") => "flex-start",
        Some("center") => "center",
        Some("end") => "flex-end",
        _ => "stretch",
    }
}

/// Main-axis distribution; defaults to `flex-start`.
pub fn map_justify(justify: Option<&str>) -> &'static str {
    match justify {
        Some("start") => "flex-start",
        Some("center") => "center",
        Some("end") => "flex-end",
        Some("between") => "space-between",
        Some("around") => "space-around",
        _ => "flex-start",
    }
}
