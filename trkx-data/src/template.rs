//! Path templates
//!
//! A template is literal text with `{name}` or `{name:spec}` placeholders.
//! `spec` follows a subset of the Python format mini-language:
//! `[0][width][.precision][d|f|s]`. `{{` and `}}` stand for literal braces.
//!
//! Without an explicit `d` or `f`, values render as Python's `str` would:
//! booleans as `True`/`False`, and floats in shortest round-trip form,
//! switching to `1e+20` style outside `1e-4 <= |x| < 1e16`.

use std::fmt;

use indexmap::IndexMap;
use trkx_data_core::Value;

use crate::error::{Error, Result};

/// Variable values substituted into templates
pub type Bindings = IndexMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Integer,
    Fixed,
    Text,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FormatSpec {
    zero_pad: bool,
    width: usize,
    precision: Option<usize>,
    kind: Option<Kind>,
}

impl FormatSpec {
    fn parse(template: &str, spec: &str) -> Result<Self> {
        let invalid = || Error::template(template, format!("invalid format spec '{spec}'"));

        let mut rest = spec;
        let mut parsed = FormatSpec::default();

        if let Some(stripped) = rest.strip_prefix('0') {
            parsed.zero_pad = true;
            rest = stripped;
        }

        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits > 0 {
            parsed.width = rest[..digits].parse().map_err(|_| invalid())?;
            rest = &rest[digits..];
        }

        if let Some(stripped) = rest.strip_prefix('.') {
            let digits =
                stripped.len() - stripped.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            if digits == 0 {
                return Err(invalid());
            }
            parsed.precision = Some(stripped[..digits].parse().map_err(|_| invalid())?);
            rest = &stripped[digits..];
        }

        parsed.kind = match rest {
            "" => None,
            "d" => Some(Kind::Integer),
            "f" => Some(Kind::Fixed),
            "s" => Some(Kind::Text),
            _ => return Err(invalid()),
        };

        Ok(parsed)
    }

    fn format(&self, template: &str, name: &str, value: &Value) -> Result<String> {
        let kind = match (self.kind, value) {
            (Some(kind), _) => kind,
            (None, Value::Int(_)) => Kind::Integer,
            (None, Value::Float(_)) if self.precision.is_some() => Kind::Fixed,
            (None, _) => Kind::Text,
        };
        let width = self.width;

        match kind {
            Kind::Integer => {
                let v = match value {
                    Value::Int(v) => *v,
                    Value::Bool(b) => i64::from(*b),
                    other => {
                        return Err(Error::template(
                            template,
                            format!("'{name}' is a {}, format 'd' needs an integer", other.kind()),
                        ))
                    }
                };
                Ok(if self.zero_pad {
                    format!("{v:0width$}")
                } else {
                    format!("{v:>width$}")
                })
            }
            Kind::Fixed => {
                let v = value.as_f64().ok_or_else(|| {
                    Error::template(
                        template,
                        format!("'{name}' is a {}, format 'f' needs a number", value.kind()),
                    )
                })?;
                let precision = self.precision.unwrap_or(6);
                Ok(if self.zero_pad {
                    format!("{v:0width$.precision$}")
                } else {
                    format!("{v:>width$.precision$}")
                })
            }
            Kind::Text => {
                let mut text = python_str(value);
                if let Some(precision) = self.precision {
                    text = text.chars().take(precision).collect();
                }
                Ok(format!("{text:<width$}"))
            }
        }
    }
}

fn python_str(value: &Value) -> String {
    match value {
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Float(v) => python_float(*v),
        other => other.to_string(),
    }
}

fn python_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = v.abs();
    if v == 0.0 || (1e-4..1e16).contains(&magnitude) {
        return format!("{v:?}");
    }

    let scientific = format!("{v:e}");
    match scientific.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => scientific,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder { name: String, spec: FormatSpec },
}

/// A parsed path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut body = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => {
                                return Err(Error::template(source, "unclosed '{'"));
                            }
                            Some(c) => body.push(c),
                        }
                    }

                    let (name, spec) = match body.split_once(':') {
                        Some((name, spec)) => (name, FormatSpec::parse(source, spec)?),
                        None => (body.as_str(), FormatSpec::default()),
                    };
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(Error::template(source, "empty placeholder"));
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder {
                        name: name.to_string(),
                        spec,
                    });
                }
                '}' => return Err(Error::template(source, "single '}' must be escaped as '}}'")),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Original template text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of appearance
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute `bindings` into the template
    pub fn render(&self, bindings: &Bindings) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder { name, spec } => {
                    let value = bindings.get(name).ok_or_else(|| Error::UnresolvedPlaceholder {
                        template: self.source.clone(),
                        name: name.clone(),
                    })?;
                    out.push_str(&spec.format(&self.source, name, value)?);
                }
            }
        }

        Ok(out)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
