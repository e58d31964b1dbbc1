//! Message template arguments and composite formatting
//!
//! Templates use positional placeholders: `{index[,alignment][:format]}`.
//! `{{` and `}}` produce literal braces. A template with no arguments is
//! never parsed and is used verbatim as the rendered message.
//!
//! The deferral policy lives here as well: [`needs_eager_format`] decides,
//! purely from the argument list, whether a record may postpone rendering
//! until its message is first read.

use super::error::FormatError;
use std::borrow::Cow;
use std::fmt::{self, Write as _};
use std::sync::Arc;

/// Above this many arguments a record is always rendered eagerly
pub const MAX_DEFERRED_ARGS: usize = 3;

/// Alignments must stay strictly below this width in either direction
pub const MAX_ALIGNMENT: u32 = 1_000_000;

/// Largest precision honored by `D`, `X` and `F` format strings; larger
/// values fall back to plain rendering
const MAX_FORMAT_PRECISION: usize = 99;

/// One positional argument of a message template.
///
/// Every variant except `Object` has a rendering that cannot change after
/// the logging call returns and cannot run caller code, so those are the
/// only ones formatting may be deferred for.
#[derive(Clone)]
pub enum FormatArg {
    Null,
    Bool(bool),
    Char(char),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    /// Arbitrary caller value rendered through its `Display` impl
    Object(Arc<dyn fmt::Display + Send + Sync>),
}

impl FormatArg {
    /// Wrap an arbitrary displayable value
    pub fn object<T>(value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        FormatArg::Object(Arc::new(value))
    }

    /// Wrap an already shared displayable value
    pub fn shared(value: Arc<dyn fmt::Display + Send + Sync>) -> Self {
        FormatArg::Object(value)
    }

    /// Whether rendering this argument later gives the same text as now
    #[inline]
    pub fn is_safe_to_defer(&self) -> bool {
        !matches!(self, FormatArg::Object(_))
    }

    /// Built-in rendering, honouring the supported numeric format strings
    pub fn render(&self, format: Option<&str>) -> Result<String, fmt::Error> {
        let mut out = String::new();
        match self {
            FormatArg::Null => {}
            FormatArg::Bool(b) => write!(out, "{}", b)?,
            FormatArg::Char(c) => out.push(*c),
            FormatArg::Int(v) => write_integer(&mut out, *v as i128, *v as u64, format)?,
            FormatArg::UInt(v) => write_integer(&mut out, *v as i128, *v, format)?,
            FormatArg::Float(v) => write_float(&mut out, *v, format)?,
            FormatArg::Str(s) => out.push_str(s),
            FormatArg::Object(value) => write!(out, "{}", value)?,
        }
        Ok(out)
    }
}

impl fmt::Debug for FormatArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatArg::Null => f.write_str("Null"),
            FormatArg::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            FormatArg::Char(c) => f.debug_tuple("Char").field(c).finish(),
            FormatArg::Int(v) => f.debug_tuple("Int").field(v).finish(),
            FormatArg::UInt(v) => f.debug_tuple("UInt").field(v).finish(),
            FormatArg::Float(v) => f.debug_tuple("Float").field(v).finish(),
            FormatArg::Str(s) => f.debug_tuple("Str").field(s).finish(),
            FormatArg::Object(_) => f.write_str("Object(..)"),
        }
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for FormatArg {
            fn from(v: $t) -> Self {
                FormatArg::Int(v as i64)
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for FormatArg {
            fn from(v: $t) -> Self {
                FormatArg::UInt(v as u64)
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for FormatArg {
    fn from(v: f32) -> Self {
        FormatArg::Float(v as f64)
    }
}

impl From<f64> for FormatArg {
    fn from(v: f64) -> Self {
        FormatArg::Float(v)
    }
}

impl From<bool> for FormatArg {
    fn from(v: bool) -> Self {
        FormatArg::Bool(v)
    }
}

impl From<char> for FormatArg {
    fn from(v: char) -> Self {
        FormatArg::Char(v)
    }
}

impl From<&str> for FormatArg {
    fn from(v: &str) -> Self {
        FormatArg::Str(v.to_string())
    }
}

impl From<String> for FormatArg {
    fn from(v: String) -> Self {
        FormatArg::Str(v)
    }
}

impl From<&String> for FormatArg {
    fn from(v: &String) -> Self {
        FormatArg::Str(v.clone())
    }
}

impl From<Cow<'_, str>> for FormatArg {
    fn from(v: Cow<'_, str>) -> Self {
        FormatArg::Str(v.into_owned())
    }
}

impl<T: Into<FormatArg>> From<Option<T>> for FormatArg {
    fn from(v: Option<T>) -> Self {
        v.map_or(FormatArg::Null, Into::into)
    }
}

/// Culture or application specific formatting context.
///
/// Consulted for every placeholder before the built-in rendering; returning
/// `None` falls back to [`FormatArg::render`].
pub trait FormatProvider: Send + Sync {
    fn format_arg(&self, value: &FormatArg, format: Option<&str>) -> Option<String>;
}

/// Decide whether a record built from `args` must be rendered immediately.
///
/// * no arguments: never (the template is the message)
/// * more than [`MAX_DEFERRED_ARGS`]: always
/// * otherwise: only if some argument is not safe to defer
pub fn needs_eager_format(args: &[FormatArg]) -> bool {
    match args.len() {
        0 => false,
        n if n > MAX_DEFERRED_ARGS => true,
        _ => !args.iter().all(FormatArg::is_safe_to_defer),
    }
}

/// Render `template` against `args`.
///
/// With no arguments the template is returned untouched, braces and all.
pub fn format_message(
    template: &str,
    args: &[FormatArg],
    provider: Option<&dyn FormatProvider>,
) -> Result<String, FormatError> {
    if args.is_empty() {
        return Ok(template.to_string());
    }

    let bytes = template.as_bytes();
    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                out.push_str(&template[literal_start..=i]);
                i += 2;
                literal_start = i;
            }
            b'{' => {
                out.push_str(&template[literal_start..i]);
                let close = template[i + 1..]
                    .find('}')
                    .map(|p| i + 1 + p)
                    .ok_or_else(|| FormatError::template(i, "unclosed placeholder"))?;
                let hole = Placeholder::parse(&template[i + 1..close], i)?;
                let arg = args.get(hole.index).ok_or(FormatError::ArgumentIndex {
                    index: hole.index,
                    count: args.len(),
                })?;
                hole.write(&mut out, arg, provider)?;
                i = close + 1;
                literal_start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                out.push_str(&template[literal_start..=i]);
                i += 2;
                literal_start = i;
            }
            b'}' => return Err(FormatError::template(i, "unescaped '}'")),
            _ => i += 1,
        }
    }

    out.push_str(&template[literal_start..]);
    Ok(out)
}

struct Placeholder<'a> {
    index: usize,
    alignment: i32,
    format: Option<&'a str>,
}

impl<'a> Placeholder<'a> {
    fn parse(body: &'a str, position: usize) -> Result<Self, FormatError> {
        let (head, format) = match body.split_once(':') {
            Some((head, format)) => (head, Some(format)),
            None => (body, None),
        };
        let (index, alignment) = match head.split_once(',') {
            Some((index, alignment)) => (index, Some(alignment)),
            None => (head, None),
        };

        let index = index
            .trim()
            .parse::<usize>()
            .map_err(|_| FormatError::template(position, format!("invalid argument index '{}'", index)))?;
        let alignment = match alignment {
            Some(a) => a
                .trim()
                .parse::<i32>()
                .map_err(|_| FormatError::template(position, format!("invalid alignment '{}'", a)))?,
            None => 0,
        };
        if alignment.unsigned_abs() >= MAX_ALIGNMENT {
            return Err(FormatError::template(
                position,
                format!("alignment {} exceeds the limit of {}", alignment, MAX_ALIGNMENT - 1),
            ));
        }

        Ok(Self {
            index,
            alignment,
            format,
        })
    }

    fn write(
        &self,
        out: &mut String,
        arg: &FormatArg,
        provider: Option<&dyn FormatProvider>,
    ) -> Result<(), FormatError> {
        let text = match provider.and_then(|p| p.format_arg(arg, self.format)) {
            Some(text) => text,
            None => arg
                .render(self.format)
                .map_err(|_| FormatError::Conversion { index: self.index })?,
        };

        let width = self.alignment.unsigned_abs() as usize;
        let pad = width.saturating_sub(text.chars().count());
        if self.alignment > 0 {
            out.extend(std::iter::repeat(' ').take(pad));
            out.push_str(&text);
        } else {
            out.push_str(&text);
            out.extend(std::iter::repeat(' ').take(pad));
        }
        Ok(())
    }
}

/// Split a format string such as `X8` into its specifier and precision
fn split_format(format: Option<&str>) -> Option<(char, Option<usize>)> {
    let format = format?.trim();
    let mut chars = format.chars();
    let spec = chars.next()?;
    let rest = chars.as_str();
    if rest.is_empty() {
        Some((spec, None))
    } else {
        rest.parse()
            .ok()
            .filter(|p| *p <= MAX_FORMAT_PRECISION)
            .map(|p| (spec, Some(p)))
    }
}

fn write_integer(out: &mut String, signed: i128, bits: u64, format: Option<&str>) -> fmt::Result {
    match split_format(format) {
        Some(('D' | 'd', precision)) => {
            let width = precision.unwrap_or(0);
            if signed < 0 {
                write!(out, "-{:0width$}", signed.unsigned_abs(), width = width)
            } else {
                write!(out, "{:0width$}", signed, width = width)
            }
        }
        Some(('X', precision)) => write!(out, "{:0width$X}", bits, width = precision.unwrap_or(0)),
        Some(('x', precision)) => write!(out, "{:0width$x}", bits, width = precision.unwrap_or(0)),
        Some(('F' | 'f', precision)) => {
            write!(out, "{:.prec$}", signed as f64, prec = precision.unwrap_or(2))
        }
        _ => write!(out, "{}", signed),
    }
}

fn write_float(out: &mut String, value: f64, format: Option<&str>) -> fmt::Result {
    match split_format(format) {
        Some(('F' | 'f', precision)) => {
            write!(out, "{:.prec$}", value, prec = precision.unwrap_or(2))
        }
        _ => write!(out, "{}", value),
    }
}
