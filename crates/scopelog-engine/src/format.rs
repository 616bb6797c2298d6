//! Decoration of log arguments
//!
//! A decorated line is either a plain argument list or a console format string
//! in the `%c` / `%s` / `%O` dialect understood by browser consoles:
//!
//! ```text
//! %c%s %c<one placeholder per argument> %c%s
//! ```
//!
//! The first `%c%s` pair is the namespace in its bold colour, the middle `%c`
//! switches to the severity text colour, and the trailing pair is the relative
//! time in the namespace colour again.

use std::fmt::Write;

use crossterm::style::{Attribute, Color, ContentStyle};
use serde_json::Value;

use scopelog_types::{Rgb, Severity};

const SECOND_MS: f64 = 1000.0;
const MINUTE_MS: f64 = SECOND_MS * 60.0;
const HOUR_MS: f64 = MINUTE_MS * 60.0;
const DAY_MS: f64 = HOUR_MS * 24.0;

/// Style carried by a `%c` directive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentStyle {
    pub bold: bool,
    pub color: Rgb,
}

impl SegmentStyle {
    pub fn bold(color: Rgb) -> Self {
        Self { bold: true, color }
    }

    pub fn normal(color: Rgb) -> Self {
        Self { bold: false, color }
    }

    /// CSS declaration list for consoles that accept `%c`
    pub fn css(&self) -> String {
        format!(
            "font-weight:{};color:{};",
            if self.bold { "bold" } else { "normal" },
            self.color.hex()
        )
    }
}

/// One substitution value for a format string
#[derive(Clone, Debug, PartialEq)]
pub enum FormatParam {
    Style(SegmentStyle),
    Value(Value),
}

/// Run of text sharing one style
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub style: Option<SegmentStyle>,
    pub text: String,
}

/// Format string plus its substitution values
#[derive(Clone, Debug, PartialEq)]
pub struct StyledRecord {
    pub template: String,
    pub params: Vec<FormatParam>,
}

impl StyledRecord {
    /// Expand the template into styled runs of text
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut current = Segment {
            style: None,
            text: String::new(),
        };
        let mut params = self.params.iter();
        let mut chars = self.template.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                current.text.push(c);
                continue;
            }
            match chars.peek().copied() {
                Some('%') => {
                    chars.next();
                    current.text.push('%');
                }
                Some('c') => {
                    chars.next();
                    let style = match params.next() {
                        Some(FormatParam::Style(style)) => Some(*style),
                        _ => None,
                    };
                    if !current.text.is_empty() {
                        segments.push(current);
                    }
                    current = Segment {
                        style,
                        text: String::new(),
                    };
                }
                Some(directive @ ('s' | 'O' | 'o' | 'd' | 'i' | 'f')) => {
                    chars.next();
                    match params.next() {
                        Some(FormatParam::Value(value)) => {
                            current.text.push_str(&display_value(value, directive));
                        }
                        Some(FormatParam::Style(_)) => {}
                        None => {
                            current.text.push('%');
                            current.text.push(directive);
                        }
                    }
                }
                _ => current.text.push('%'),
            }
        }

        // leftover values are appended space-separated, like a console does
        for param in params {
            if let FormatParam::Value(value) = param {
                current.text.push(' ');
                current.text.push_str(&display_value(value, 'O'));
            }
        }

        if !current.text.is_empty() {
            segments.push(current);
        }
        segments
    }
}

/// Output of the decorator, ready for a sink
#[derive(Clone, Debug, PartialEq)]
pub enum Decorated {
    /// `[namespace, ...args, "+elapsed"]`
    Plain(Vec<Value>),
    Styled(StyledRecord),
}

impl Decorated {
    /// Text without any styling
    pub fn render_plain(&self) -> String {
        match self {
            Self::Plain(values) => values
                .iter()
                .map(|value| display_value(value, 's'))
                .collect::<Vec<_>>()
                .join(" "),
            Self::Styled(record) => record
                .segments()
                .into_iter()
                .map(|segment| segment.text)
                .collect(),
        }
    }

    /// Text with ANSI escape sequences for terminals
    pub fn render_ansi(&self) -> String {
        match self {
            Self::Plain(_) => self.render_plain(),
            Self::Styled(record) => {
                let mut out = String::new();
                for segment in record.segments() {
                    match segment.style {
                        Some(style) => {
                            let _ = write!(out, "{}", ansi_style(style).apply(&segment.text));
                        }
                        None => out.push_str(&segment.text),
                    }
                }
                out
            }
        }
    }
}

fn ansi_style(style: SegmentStyle) -> ContentStyle {
    let Rgb { r, g, b } = style.color;
    let mut content = ContentStyle::new();
    content.foreground_color = Some(Color::Rgb { r, g, b });
    if style.bold {
        content.attributes.set(Attribute::Bold);
    }
    content
}

/// Placeholder for an argument: textual for strings and numbers, inspect otherwise
pub fn placeholder(value: &Value) -> &'static str {
    match value {
        Value::String(_) | Value::Number(_) => "%s ",
        _ => "%O ",
    }
}

/// Build the coloured format string for one log call
pub fn decorate_styled(
    namespace: &str,
    namespace_color: Rgb,
    severity: Severity,
    args: Vec<Value>,
    elapsed: &str,
) -> StyledRecord {
    let namespace_style = SegmentStyle::bold(namespace_color);
    let text_style = SegmentStyle::normal(severity.text_color());

    let mut template = String::from("%c%s %c");
    for arg in &args {
        template.push_str(placeholder(arg));
    }
    template.push_str(" %c%s");

    let mut params = Vec::with_capacity(args.len() + 5);
    params.push(FormatParam::Style(namespace_style));
    params.push(FormatParam::Value(Value::String(namespace.to_string())));
    params.push(FormatParam::Style(text_style));
    params.extend(args.into_iter().map(FormatParam::Value));
    params.push(FormatParam::Style(namespace_style));
    params.push(FormatParam::Value(Value::String(elapsed.to_string())));

    StyledRecord { template, params }
}

/// Build the monochrome argument list for one log call
pub fn decorate_plain(namespace: &str, args: Vec<Value>, elapsed: &str) -> Vec<Value> {
    let mut values = Vec::with_capacity(args.len() + 2);
    values.push(Value::String(namespace.to_string()));
    values.extend(args);
    values.push(Value::String(elapsed.to_string()));
    values
}

/// Relative duration like `+120ms`, `+3s`, `+2m`
pub fn format_elapsed(millis: i64) -> String {
    let ms = millis as f64;
    let abs = ms.abs();
    let short = if abs >= DAY_MS {
        format!("{}d", (ms / DAY_MS).round())
    } else if abs >= HOUR_MS {
        format!("{}h", (ms / HOUR_MS).round())
    } else if abs >= MINUTE_MS {
        format!("{}m", (ms / MINUTE_MS).round())
    } else if abs >= SECOND_MS {
        format!("{}s", (ms / SECOND_MS).round())
    } else {
        format!("{}ms", millis)
    };
    format!("+{}", short)
}

fn display_value(value: &Value, directive: char) -> String {
    match (value, directive) {
        (Value::String(s), 's') => s.clone(),
        (Value::String(s), 'O' | 'o') => format!("{:?}", s),
        (Value::String(s), _) => s.clone(),
        (other, _) => other.to_string(),
    }
}
