//! Reading and writing SVG path data (`d` attribute strings).

use std::fmt::Write as _;

use crate::error::{GeometryError, Result};
use crate::math::{Point2, Vector2};

use super::path::{Path, PathCommand};

/// Serializes a path as SVG path data with absolute commands.
///
/// Cubic tangents are converted back to control points.
#[must_use]
pub fn write_path_data(path: &Path) -> String {
    let mut out = String::new();
    let mut pen = Point2::origin();
    let mut start = pen;
    for cmd in path.commands() {
        if !out.is_empty() {
            out.push(' ');
        }
        match *cmd {
            PathCommand::MoveTo(p) => {
                let _ = write!(out, "M {},{}", num(p.x), num(p.y));
                pen = p;
                start = p;
            }
            PathCommand::LineTo(p) => {
                let _ = write!(out, "L {},{}", num(p.x), num(p.y));
                pen = p;
            }
            PathCommand::CubicTo {
                end,
                start_tangent,
                end_tangent,
            } => {
                let c1 = pen + start_tangent / 3.0;
                let c2 = end - end_tangent / 3.0;
                let _ = write!(
                    out,
                    "C {},{} {},{} {},{}",
                    num(c1.x),
                    num(c1.y),
                    num(c2.x),
                    num(c2.y),
                    num(end.x),
                    num(end.y)
                );
                pen = end;
            }
            PathCommand::Close => {
                out.push('Z');
                pen = start;
            }
        }
    }
    out
}

/// Formats a coordinate without trailing noise.
fn num(v: f64) -> String {
    let rounded = (v * 1e8).round() / 1e8;
    if rounded == 0.0 {
        // Avoid "-0".
        return "0".to_string();
    }
    format!("{rounded}")
}

/// Parses SVG path data.
///
/// Supports `M L H V C S Q T Z` in absolute and relative forms. Quadratic
/// segments are elevated to cubics.
///
/// # Errors
///
/// Returns [`GeometryError::InvalidPathData`] on unsupported commands,
/// malformed numbers or missing arguments.
pub fn parse_path_data(data: &str) -> Result<Path> {
    let mut parser = Parser {
        bytes: data.as_bytes(),
        pos: 0,
    };
    let mut path = Path::new();
    let mut pen = Point2::origin();
    let mut start = pen;
    // Reflection sources for the smooth forms.
    let mut last_cubic_c2: Option<Point2> = None;
    let mut last_quad_c: Option<Point2> = None;
    let mut command: Option<u8> = None;

    loop {
        parser.skip_separators();
        let Some(&next) = parser.bytes.get(parser.pos) else {
            break;
        };
        let letter = if next.is_ascii_alphabetic() {
            parser.pos += 1;
            next
        } else {
            match command {
                // Extra coordinate pairs after a moveto are linetos.
                Some(b'M') => b'L',
                Some(b'm') => b'l',
                Some(c) if !matches!(c, b'Z' | b'z') => c,
                _ => return Err(parser.error("expected a command letter")),
            }
        };
        command = Some(letter);
        let relative = letter.is_ascii_lowercase();
        let base = if relative { pen.coords } else { Vector2::zeros() };

        let mut next_cubic_c2 = None;
        let mut next_quad_c = None;
        match letter.to_ascii_uppercase() {
            b'M' => {
                pen = Point2::from(base + parser.pair()?);
                start = pen;
                path.move_to(pen);
            }
            b'L' => {
                pen = Point2::from(base + parser.pair()?);
                path.line_to(pen);
            }
            b'H' => {
                let x = parser.number()?;
                pen = Point2::new(if relative { pen.x + x } else { x }, pen.y);
                path.line_to(pen);
            }
            b'V' => {
                let y = parser.number()?;
                pen = Point2::new(pen.x, if relative { pen.y + y } else { y });
                path.line_to(pen);
            }
            b'C' => {
                let c1 = Point2::from(base + parser.pair()?);
                let c2 = Point2::from(base + parser.pair()?);
                let end = Point2::from(base + parser.pair()?);
                path.cubic_to(end, (c1 - pen) * 3.0, (end - c2) * 3.0);
                pen = end;
                next_cubic_c2 = Some(c2);
            }
            b'S' => {
                let c1 = last_cubic_c2.map_or(pen, |c| pen + (pen - c));
                let c2 = Point2::from(base + parser.pair()?);
                let end = Point2::from(base + parser.pair()?);
                path.cubic_to(end, (c1 - pen) * 3.0, (end - c2) * 3.0);
                pen = end;
                next_cubic_c2 = Some(c2);
            }
            b'Q' => {
                let c = Point2::from(base + parser.pair()?);
                let end = Point2::from(base + parser.pair()?);
                push_quadratic(&mut path, pen, c, end);
                pen = end;
                next_quad_c = Some(c);
            }
            b'T' => {
                let c = last_quad_c.map_or(pen, |q| pen + (pen - q));
                let end = Point2::from(base + parser.pair()?);
                push_quadratic(&mut path, pen, c, end);
                pen = end;
                next_quad_c = Some(c);
            }
            b'Z' => {
                path.close();
                pen = start;
            }
            _ => {
                parser.pos -= 1;
                return Err(parser.error("unsupported command"));
            }
        }
        last_cubic_c2 = next_cubic_c2;
        last_quad_c = next_quad_c;
    }
    Ok(path)
}

fn push_quadratic(path: &mut Path, from: Point2, control: Point2, end: Point2) {
    // Degree elevation: cubic handles sit 2/3 of the way to the control point,
    // so the end tangents are twice the quadratic handle vectors.
    path.cubic_to(end, (control - from) * 2.0, (end - control) * 2.0);
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> crate::error::PathOpsError {
        GeometryError::InvalidPathData {
            offset: self.pos,
            reason: reason.to_string(),
        }
        .into()
    }

    fn skip_separators(&mut self) {
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_whitespace() || *b == b',')
        {
            self.pos += 1;
        }
    }

    fn pair(&mut self) -> Result<Vector2> {
        let x = self.number()?;
        let y = self.number()?;
        Ok(Vector2::new(x, y))
    }

    fn number(&mut self) -> Result<f64> {
        self.skip_separators();
        let begin = self.pos;
        let at = |pos: usize| self.bytes.get(pos).copied();
        let mut end = begin;
        if matches!(at(end), Some(b'+' | b'-')) {
            end += 1;
        }
        let mut digits = 0;
        while at(end).is_some_and(|b| b.is_ascii_digit()) {
            end += 1;
            digits += 1;
        }
        if at(end) == Some(b'.') {
            end += 1;
            while at(end).is_some_and(|b| b.is_ascii_digit()) {
                end += 1;
                digits += 1;
            }
        }
        if digits == 0 {
            return Err(self.error("expected a number"));
        }
        if matches!(at(end), Some(b'e' | b'E')) {
            let mut exp_end = end + 1;
            if matches!(at(exp_end), Some(b'+' | b'-')) {
                exp_end += 1;
            }
            if at(exp_end).is_some_and(|b| b.is_ascii_digit()) {
                while at(exp_end).is_some_and(|b| b.is_ascii_digit()) {
                    exp_end += 1;
                }
                end = exp_end;
            }
        }
        let text = std::str::from_utf8(&self.bytes[begin..end])
            .map_err(|_| self.error("invalid utf-8 in number"))?;
        let value = text
            .parse::<f64>()
            .map_err(|_| self.error("malformed number"))?;
        self.pos = end;
        Ok(value)
    }
}
