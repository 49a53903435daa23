//! Helpers over element texts and style values read from the browser
//!
//! The browser driver returns plain strings; these functions hold the
//! comparison logic step definitions need on top of them.

use regex::Regex;

use crate::error::{E2eError, E2eResult};

/// 1-based position of `value` among `texts`.
///
/// With `exact` the text must equal `value`, otherwise it must contain it.
/// The whole list is scanned before reporting a miss.
pub fn element_index(texts: &[String], value: &str, exact: bool) -> E2eResult<usize> {
    if texts.is_empty() {
        return Err(E2eError::ElementNotFound("no elements matched the locator".to_string()));
    }

    texts
        .iter()
        .position(|text| if exact { text == value } else { text.contains(value) })
        .map(|i| i + 1)
        .ok_or_else(|| {
            E2eError::ValueNotFound(format!("elements found by locator do not contain the value: {}", value))
        })
}

/// Assert `actual` holds exactly `expected`, in order
pub fn compare_list_contents(actual: &[String], expected: &[&str], message: Option<&str>) -> E2eResult<()> {
    if actual.iter().map(String::as_str).eq(expected.iter().copied()) {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(format!(
            "{}: expected {:?}, got {:?}",
            message.unwrap_or("Lists do not match"),
            expected,
            actual
        )))
    }
}

/// Convert `rgb(..)`/`rgba(..)` CSS values to `#rrggbb[aa]`.
///
/// The alpha channel is a 0..=1 fraction scaled to a byte.
pub fn rgba_to_hex(value: &str) -> E2eResult<String> {
    let re = Regex::new(r"(\d+)\s*,\s*(\d+)\s*,\s*(\d+)(?:\s*,\s*([\d.]+))?").map_err(|e| {
        E2eError::AssertionFailed(format!("invalid color pattern: {}", e))
    })?;
    let caps = re
        .captures(value)
        .ok_or_else(|| E2eError::ValueNotFound(format!("not an rgb/rgba color: {}", value)))?;

    let mut hex = String::from("#");
    for i in 1..=3 {
        let channel: u8 = caps[i]
            .parse()
            .map_err(|_| E2eError::ValueNotFound(format!("color channel out of range in {}", value)))?;
        hex.push_str(&format!("{:02x}", channel));
    }
    if let Some(alpha) = caps.get(4) {
        let alpha: f64 = alpha
            .as_str()
            .parse()
            .map_err(|_| E2eError::ValueNotFound(format!("bad alpha in {}", value)))?;
        hex.push_str(&format!("{:02x}", (alpha.clamp(0.0, 1.0) * 255.0).round() as u8));
    }
    Ok(hex)
}

/// Lower-case `text`, then camel-case on non-word boundaries.
///
/// The first `+` becomes `Plus`, e.g. `"Disney+ Originals"` → `"disneyPlusOriginals"`.
pub fn to_camel_case(text: &str) -> String {
    let lowered = text.to_lowercase().replacen('+', "Plus", 1);
    let spaced: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();

    let mut out = String::with_capacity(spaced.len());
    let mut upper_next = false;
    for c in spaced.chars() {
        if c == ' ' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
