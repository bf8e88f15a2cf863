//! printf-style interpretation of column format strings.
//!
//! Column formats are presentation metadata carried verbatim from the user
//! (`"%d"`, `"%.10g"`, `"%s"`, …) and applied when a text sink renders a
//! row.  This module interprets the common printf subset over a single
//! argument: conversions `d i u x X o f F e E g G s c %` with the `- + 0
//! # space` flags, a width, and a precision.  Length modifiers (`h`, `l`,
//! `z`, …) are accepted and ignored.  Anything unparsable is emitted
//! verbatim rather than rejected — a bad format should never abort a run.

/// The single argument a column supplies to its format string.
pub(crate) enum Arg<'a> {
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(&'a str),
}

impl Arg<'_> {
    fn as_int(&self) -> i64 {
        match self {
            Arg::Int(v) => *v,
            Arg::Uint(v) => *v as i64,
            Arg::Float(v) => *v as i64,
            Arg::Str(_) => 0,
        }
    }

    fn as_uint(&self) -> u64 {
        match self {
            Arg::Int(v) => *v as u64,
            Arg::Uint(v) => *v,
            Arg::Float(v) => *v as u64,
            Arg::Str(_) => 0,
        }
    }

    fn as_float(&self) -> f64 {
        match self {
            Arg::Int(v) => *v as f64,
            Arg::Uint(v) => *v as f64,
            Arg::Float(v) => *v,
            Arg::Str(_) => 0.0,
        }
    }
}

#[derive(Default)]
struct Spec {
    minus: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alt: bool,
    width: Option<usize>,
    precision: Option<usize>,
    conv: char,
}

/// Render `arg` through the printf-style `fmt` string.
pub(crate) fn format(fmt: &str, arg: &Arg) -> String {
    let chars: Vec<char> = fmt.chars().collect();
    let mut out = String::with_capacity(fmt.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '%' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        match parse_spec(&chars, i) {
            Some((spec, next)) => {
                if spec.conv == '%' {
                    out.push('%');
                } else {
                    out.push_str(&render(&spec, arg));
                }
                i = next;
            }
            None => {
                // Not a recognizable conversion; emit verbatim.
                out.push('%');
                i += 1;
            }
        }
    }
    out
}

/// Parse one conversion spec starting at the `%` at `chars[start]`.
/// Returns the spec and the index just past it.
fn parse_spec(chars: &[char], start: usize) -> Option<(Spec, usize)> {
    let mut spec = Spec::default();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            '-' => spec.minus = true,
            '+' => spec.plus = true,
            ' ' => spec.space = true,
            '0' => spec.zero = true,
            '#' => spec.alt = true,
            _ => break,
        }
        i += 1;
    }

    let (width, j) = parse_number(chars, i);
    spec.width = width;
    i = j;

    if i < chars.len() && chars[i] == '.' {
        let (prec, j) = parse_number(chars, i + 1);
        spec.precision = Some(prec.unwrap_or(0));
        i = j;
    }

    while i < chars.len() && matches!(chars[i], 'h' | 'l' | 'z' | 'j' | 't' | 'L' | 'q') {
        i += 1;
    }

    let conv = *chars.get(i)?;
    if !matches!(
        conv,
        'd' | 'i' | 'u' | 'x' | 'X' | 'o' | 'f' | 'F' | 'e' | 'E' | 'g' | 'G' | 's' | 'c' | '%'
    ) {
        return None;
    }
    spec.conv = conv;
    Some((spec, i + 1))
}

fn parse_number(chars: &[char], mut i: usize) -> (Option<usize>, usize) {
    let begin = i;
    let mut n = 0usize;
    while i < chars.len() && chars[i].is_ascii_digit() {
        n = n.saturating_mul(10).saturating_add(chars[i] as usize - '0' as usize);
        i += 1;
    }
    if i == begin {
        (None, i)
    } else {
        (Some(n), i)
    }
}

fn render(spec: &Spec, arg: &Arg) -> String {
    let body = match spec.conv {
        'd' | 'i' => signed(spec, arg.as_int()),
        'u' => unsigned_digits(spec, arg.as_uint().to_string()),
        'x' => radix(spec, format!("{:x}", arg.as_uint()), "0x"),
        'X' => radix(spec, format!("{:X}", arg.as_uint()), "0X"),
        'o' => radix(spec, format!("{:o}", arg.as_uint()), "0"),
        'f' | 'F' => float_sign(spec, format!("{:.*}", spec.precision.unwrap_or(6), arg.as_float())),
        'e' => float_sign(spec, sci(arg.as_float(), spec.precision.unwrap_or(6), false)),
        'E' => float_sign(spec, sci(arg.as_float(), spec.precision.unwrap_or(6), true)),
        'g' => float_sign(spec, gfmt(arg.as_float(), spec.precision.unwrap_or(6), false)),
        'G' => float_sign(spec, gfmt(arg.as_float(), spec.precision.unwrap_or(6), true)),
        's' => match arg {
            Arg::Str(s) => {
                let mut s = (*s).to_string();
                if let Some(p) = spec.precision {
                    s = s.chars().take(p).collect();
                }
                s
            }
            other => format!("{}", other.as_float()),
        },
        'c' => match arg {
            Arg::Str(s) => s.chars().next().map(String::from).unwrap_or_default(),
            other => char::from_u32(other.as_uint() as u32)
                .map(String::from)
                .unwrap_or_default(),
        },
        _ => String::new(),
    };
    pad(spec, body)
}

fn signed(spec: &Spec, v: i64) -> String {
    let digits = v.unsigned_abs().to_string();
    let digits = match spec.precision {
        Some(p) if digits.len() < p => format!("{:0>width$}", digits, width = p),
        _ => digits,
    };
    let sign = if v < 0 {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    };
    format!("{sign}{digits}")
}

fn unsigned_digits(spec: &Spec, digits: String) -> String {
    match spec.precision {
        Some(p) if digits.len() < p => format!("{:0>width$}", digits, width = p),
        _ => digits,
    }
}

fn radix(spec: &Spec, digits: String, prefix: &str) -> String {
    let digits = unsigned_digits(spec, digits);
    if spec.alt && digits != "0" {
        format!("{prefix}{digits}")
    } else {
        digits
    }
}

fn float_sign(spec: &Spec, body: String) -> String {
    if !body.starts_with('-') && spec.plus {
        format!("+{body}")
    } else if !body.starts_with('-') && spec.space {
        format!(" {body}")
    } else {
        body
    }
}

/// `%e`-style scientific notation with a signed, two-digit exponent.
fn sci(v: f64, prec: usize, upper: bool) -> String {
    let s = format!("{:.*e}", prec, v);
    let (mant, exp) = match s.split_once('e') {
        Some(parts) => parts,
        None => return s, // inf / NaN
    };
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(d) => ('-', d),
        None => ('+', exp),
    };
    let e = if upper { 'E' } else { 'e' };
    format!("{mant}{e}{sign}{digits:0>2}")
}

/// `%g`: shortest of fixed/scientific with `prec` significant digits and
/// trailing zeros stripped.
fn gfmt(v: f64, prec: usize, upper: bool) -> String {
    let p = prec.max(1);
    if v == 0.0 {
        return "0".to_string();
    }
    if !v.is_finite() {
        return format!("{v}");
    }
    let exp = v.abs().log10().floor() as i64;
    if exp >= -4 && exp < p as i64 {
        let dec = (p as i64 - 1 - exp).max(0) as usize;
        strip_zeros(format!("{:.*}", dec, v))
    } else {
        let s = sci(v, p - 1, upper);
        let split = s.find(if upper { 'E' } else { 'e' });
        match split {
            Some(at) => format!("{}{}", strip_zeros(s[..at].to_string()), &s[at..]),
            None => s,
        }
    }
}

fn strip_zeros(s: String) -> String {
    if !s.contains('.') {
        return s;
    }
    let s = s.trim_end_matches('0');
    s.trim_end_matches('.').to_string()
}

/// Apply width padding.  Zero padding goes after the sign and only applies
/// to numeric conversions without an explicit precision.
fn pad(spec: &Spec, body: String) -> String {
    let width = match spec.width {
        Some(w) if body.chars().count() < w => w,
        _ => return body,
    };
    if spec.minus {
        return format!("{body:<width$}");
    }
    let numeric = !matches!(spec.conv, 's' | 'c');
    if spec.zero && numeric && (spec.precision.is_none() || matches!(spec.conv, 'f' | 'F' | 'e' | 'E' | 'g' | 'G')) {
        let (sign, digits) = match body.strip_prefix(&['-', '+', ' '][..]) {
            Some(rest) => (&body[..1], rest),
            None => ("", body.as_str()),
        };
        let fill = width - body.chars().count();
        return format!("{sign}{}{digits}", "0".repeat(fill));
    }
    format!("{body:>width$}")
}
