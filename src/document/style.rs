use std::fmt;

use crate::shape::{FillRule, JoinType, LineCap, StrokeStyle};

/// An inline CSS declaration list such as `fill:#ff0000;stroke:none`.
///
/// Declaration order is preserved when writing the style back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    declarations: Vec<(String, String)>,
}

impl Style {
    /// Parses a `style` attribute. Malformed declarations are dropped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut style = Self::default();
        for declaration in text.split(';') {
            let Some((name, value)) = declaration.split_once(':') else {
                continue;
            };
            let name = name.trim();
            if !name.is_empty() {
                style.set(name, value.trim());
            }
        }
        style
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets a property, replacing an existing value in place.
    pub fn set(&mut self, name: &str, value: &str) {
        if let Some(entry) = self.declarations.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value.to_owned();
        } else {
            self.declarations.push((name.to_owned(), value.to_owned()));
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.declarations.retain(|(n, _)| n != name);
    }

    /// Leading number of a property value, ignoring units such as `px`.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        let value = self.get(name)?.trim();
        let end = value
            .char_indices()
            .find(|&(i, c)| {
                !(c.is_ascii_digit()
                    || c == '.'
                    || ((c == '-' || c == '+') && i == 0)
                    || c == 'e'
                    || c == 'E')
            })
            .map_or(value.len(), |(i, _)| i);
        value[..end].parse().ok()
    }

    #[must_use]
    pub fn fill_rule(&self) -> FillRule {
        self.get("fill-rule").map_or(FillRule::NonZero, FillRule::from_css)
    }

    /// Whether the object paints a stroke.
    #[must_use]
    pub fn has_stroke(&self) -> bool {
        self.get("stroke").is_some_and(|v| v != "none")
    }

    /// Stroke geometry, with the CSS initial values for missing properties.
    #[must_use]
    pub fn stroke_style(&self) -> StrokeStyle {
        let defaults = StrokeStyle::default();
        StrokeStyle {
            width: self.number("stroke-width").unwrap_or(defaults.width),
            join: self.get("stroke-linejoin").map_or(defaults.join, JoinType::from_css),
            cap: self.get("stroke-linecap").map_or(defaults.cap, LineCap::from_css),
            miter_limit: self
                .number("stroke-miterlimit")
                .unwrap_or(defaults.miter_limit),
        }
    }

    /// Style of the filled outline replacing a stroke: the stroke paint
    /// becomes the fill and the stroke is removed.
    #[must_use]
    pub fn outline_fill(&self) -> Self {
        let mut style = self.clone();
        if let Some(stroke) = self.get("stroke") {
            style.set("fill", stroke);
        }
        style.set("fill-opacity", self.get("stroke-opacity").unwrap_or("1.0"));
        style.set("stroke", "none");
        style.set("stroke-opacity", "1.0");
        style
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.declarations.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{name}:{value}")?;
        }
        Ok(())
    }
}
