//! VSS datatype table and the value representations generated code uses.
use serde::Serialize;
use std::fmt;

// ------------------------------- Table ----------------------------------- //

/// Scalar representations a VSS datatype can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scalar {
    String,
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

/// The fixed datatype table. Array spellings are the scalar name plus `[]`.
pub const VSS_DATA_TYPES: &[(&str, Scalar)] = &[
    ("string", Scalar::String),
    ("boolean", Scalar::Bool),
    ("int8", Scalar::I8),
    ("uint8", Scalar::U8),
    ("int16", Scalar::I16),
    ("uint16", Scalar::U16),
    ("int32", Scalar::I32),
    ("uint32", Scalar::U32),
    ("int64", Scalar::I64),
    ("uint64", Scalar::U64),
    ("float", Scalar::F32),
    ("double", Scalar::F64),
];

const ARRAY_SUFFIX: &str = "[]";

/// Semantic value type of a node's `value` and of its min/max bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "lowercase")]
pub enum ValueType {
    Scalar(Scalar),
    Array(Scalar),
    /// Untyped: branches, missing or unknown datatypes.
    #[default]
    Any,
}

impl ValueType {
    /// Resolve a VSS datatype string. Unknown spellings fall back to `Any` so
    /// newer VSS releases never break generation.
    pub fn from_vss(datatype: &str) -> Self {
        let datatype = datatype.trim();
        match datatype.strip_suffix(ARRAY_SUFFIX) {
            Some(element) => match find_scalar(element) {
                Some(s) => ValueType::Array(s),
                None => ValueType::Any,
            },
            None => match find_scalar(datatype) {
                Some(s) => ValueType::Scalar(s),
                None => ValueType::Any,
            },
        }
    }

    /// Rust spelling of the value field type.
    pub fn rust_type(&self) -> String {
        match self {
            ValueType::Scalar(s) => s.rust_type().to_string(),
            ValueType::Array(s) => format!("Vec<{}>", s.rust_type()),
            ValueType::Any => "()".to_string(),
        }
    }

    /// Expression used for the value field in a `Default` impl.
    pub fn default_expr(&self) -> &'static str {
        match self {
            ValueType::Scalar(s) => s.default_literal(),
            ValueType::Array(_) => "Vec::new()",
            ValueType::Any => "()",
        }
    }

    /// Type of the `MIN`/`MAX` constants. Arrays bound their elements.
    pub fn bound_type(&self) -> Option<&'static str> {
        match self {
            ValueType::Scalar(s) | ValueType::Array(s) => Some(s.const_type()),
            ValueType::Any => None,
        }
    }

    /// Render a bound as a Rust literal of [`Self::bound_type`], if it fits.
    pub fn bound_literal(&self, raw: &str) -> Option<String> {
        match self {
            ValueType::Scalar(s) | ValueType::Array(s) => s.literal(raw),
            ValueType::Any => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => f.write_str("any"),
            other => f.write_str(&other.rust_type()),
        }
    }
}

fn find_scalar(name: &str) -> Option<Scalar> {
    VSS_DATA_TYPES
        .iter()
        .find(|(vss, _)| *vss == name)
        .map(|(_, s)| *s)
}

// ------------------------------ Scalars ---------------------------------- //

impl Scalar {
    pub fn rust_type(&self) -> &'static str {
        match self {
            Scalar::String => "String",
            Scalar::Bool => "bool",
            Scalar::I8 => "i8",
            Scalar::U8 => "u8",
            Scalar::I16 => "i16",
            Scalar::U16 => "u16",
            Scalar::I32 => "i32",
            Scalar::U32 => "u32",
            Scalar::I64 => "i64",
            Scalar::U64 => "u64",
            Scalar::F32 => "f32",
            Scalar::F64 => "f64",
        }
    }

    fn const_type(&self) -> &'static str {
        match self {
            Scalar::String => "&'static str",
            other => other.rust_type(),
        }
    }

    fn default_literal(&self) -> &'static str {
        match self {
            Scalar::String => "String::new()",
            Scalar::Bool => "false",
            Scalar::F32 | Scalar::F64 => "0.0",
            _ => "0",
        }
    }

    fn literal(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        match self {
            Scalar::String => Some(format!("{raw:?}")),
            Scalar::Bool => raw.parse::<bool>().ok().map(|b| b.to_string()),
            Scalar::F32 | Scalar::F64 => {
                let v = raw.parse::<f64>().ok().filter(|v| v.is_finite())?;
                if matches!(self, Scalar::F32) && v.abs() > f32::MAX as f64 {
                    return None;
                }
                Some(format!("{v:?}"))
            }
            integer => {
                let v = parse_integral(raw)?;
                let (lo, hi) = integer.int_range();
                (lo..=hi).contains(&v).then(|| v.to_string())
            }
        }
    }

    fn int_range(&self) -> (i128, i128) {
        match self {
            Scalar::I8 => (i8::MIN as i128, i8::MAX as i128),
            Scalar::U8 => (0, u8::MAX as i128),
            Scalar::I16 => (i16::MIN as i128, i16::MAX as i128),
            Scalar::U16 => (0, u16::MAX as i128),
            Scalar::I32 => (i32::MIN as i128, i32::MAX as i128),
            Scalar::U32 => (0, u32::MAX as i128),
            Scalar::I64 => (i64::MIN as i128, i64::MAX as i128),
            Scalar::U64 => (0, u64::MAX as i128),
            _ => (0, -1),
        }
    }
}

/// Integers, plus floats without a fractional part (`100.0` from JSON numbers).
fn parse_integral(raw: &str) -> Option<i128> {
    if let Ok(v) = raw.parse::<i128>() {
        return Some(v);
    }
    let f = raw.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 1e38).then_some(f as i128)
}
