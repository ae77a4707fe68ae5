//! Fixed-width field descriptors.
//!
//! A [`Field`] knows how to turn one value into exactly `width` characters
//! and back. Numeric fields hold non-negative integers, zero padded on the
//! left. Alphanumeric fields hold printable ASCII text padded with spaces on
//! the side opposite their alignment.

use crate::error::{NachaError, Result};
use std::fmt;

/// Storage class of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Alphanumeric,
}

/// Which side of the window the value hugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A compile-time value used for constants, defaults and label tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Numeric(u64),
    Text(&'static str),
}

/// A runtime field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Numeric(u64),
    Text(String),
}

impl Value {
    /// Returns the integer if this is a numeric value.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Numeric(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    /// Returns the text if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Numeric(_) => None,
            Value::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Numeric(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Numeric(n) => Value::Numeric(n),
            Literal::Text(s) => Value::Text(s.to_string()),
        }
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Numeric(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Symbolic names over a value domain. Purely descriptive: packing never
/// rejects a value because it is missing from the table.
pub type Labels = &'static [(&'static str, Literal)];

/// A typed, fixed-width pack/unpack unit.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub width: usize,
    pub pad: char,
    pub align: Align,
    pub required: bool,
    pub default: Option<Literal>,
    pub constant: Option<Literal>,
    pub reserved: bool,
    pub labels: Option<Labels>,
}

impl Field {
    /// A required numeric field, zero padded and right aligned.
    pub const fn numeric(name: &'static str, width: usize) -> Self {
        Field {
            name,
            kind: FieldKind::Numeric,
            width,
            pad: '0',
            align: Align::Right,
            required: true,
            default: None,
            constant: None,
            reserved: false,
            labels: None,
        }
    }

    /// A required alphanumeric field, space padded and left aligned.
    pub const fn alphanumeric(name: &'static str, width: usize) -> Self {
        Field {
            name,
            kind: FieldKind::Alphanumeric,
            width,
            pad: ' ',
            align: Align::Left,
            required: true,
            default: None,
            constant: None,
            reserved: false,
            labels: None,
        }
    }

    pub const fn pad(mut self, pad: char) -> Self {
        self.pad = pad;
        self
    }

    pub const fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Accepts a missing value, packing it as blank fill.
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Substitutes `literal` when no value is supplied.
    pub const fn default_value(mut self, literal: Literal) -> Self {
        self.default = Some(literal);
        self
    }

    /// Pins the field to `literal`; conflicting explicit values fail.
    pub const fn constant(mut self, literal: Literal) -> Self {
        self.constant = Some(literal);
        self
    }

    /// Always packs and unpacks as empty.
    pub const fn reserved(mut self) -> Self {
        self.reserved = true;
        self.required = false;
        self
    }

    pub const fn labels(mut self, labels: Labels) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Packs `value` into exactly `width` characters.
    pub fn pack(&self, value: Option<&Value>) -> Result<String> {
        if self.reserved {
            return Ok(self.fill(""));
        }

        let value = match (value, self.constant) {
            (Some(given), Some(constant)) => {
                let expected = Value::from(constant);
                if self.normalize(given)? != self.normalize(&expected)? {
                    return Err(NachaError::field(
                        self.name,
                        given.to_string(),
                        format!("must be {}", expected),
                    ));
                }
                expected
            }
            (Some(given), None) => given.clone(),
            (None, Some(constant)) => constant.into(),
            (None, None) => match self.default {
                Some(default) => default.into(),
                None if self.required => {
                    return Err(NachaError::MissingField {
                        field: self.name.to_string(),
                    })
                }
                None => return Ok(self.fill("")),
            },
        };

        let text = self.normalize(&value)?;
        if text.len() > self.width {
            return Err(NachaError::field(
                self.name,
                text,
                format!("exceeds width {}", self.width),
            ));
        }
        Ok(self.fill(&text))
    }

    /// Unpacks a `width`-character window into a value.
    ///
    /// Returns `None` only for an optional numeric field left blank.
    pub fn unpack(&self, text: &str) -> Result<Option<Value>> {
        if text.chars().count() != self.width {
            return Err(NachaError::field(
                self.name,
                text,
                format!("must be exactly {} characters", self.width),
            ));
        }
        if self.reserved {
            return Ok(match self.kind {
                FieldKind::Alphanumeric => Some(Value::Text(String::new())),
                FieldKind::Numeric => None,
            });
        }

        let value = match self.kind {
            FieldKind::Numeric => {
                let digits = if self.pad == '0' {
                    text
                } else {
                    self.strip(text)
                };
                if digits.is_empty() {
                    if self.required {
                        return Err(NachaError::field(self.name, text, "must be a whole number"));
                    }
                    return Ok(None);
                }
                Value::Numeric(parse_whole(self.name, digits)?)
            }
            FieldKind::Alphanumeric => {
                check_characters(self.name, text)?;
                Value::Text(self.strip(text).to_string())
            }
        };

        if let Some(constant) = self.constant {
            if value != Value::from(constant) {
                return Err(NachaError::field(
                    self.name,
                    value.to_string(),
                    format!("must be {}", Value::from(constant)),
                ));
            }
        }
        Ok(Some(value))
    }

    /// Symbolic name of `value` in the attached label table, if any.
    pub fn label_for(&self, value: &Value) -> Option<&'static str> {
        self.labels?
            .iter()
            .find(|(_, literal)| Value::from(*literal) == *value)
            .map(|(label, _)| *label)
    }

    /// Value carried by the symbolic name `label`, if any.
    pub fn value_for(&self, label: &str) -> Option<Value> {
        self.labels?
            .iter()
            .find(|(name, _)| *name == label)
            .map(|(_, literal)| (*literal).into())
    }

    /// Renders a value as the unpadded text this field would store.
    fn normalize(&self, value: &Value) -> Result<String> {
        match (self.kind, value) {
            (FieldKind::Numeric, Value::Numeric(n)) => Ok(n.to_string()),
            (FieldKind::Numeric, Value::Text(s)) => {
                Ok(parse_whole(self.name, s.trim())?.to_string())
            }
            (FieldKind::Alphanumeric, Value::Numeric(n)) => Ok(n.to_string()),
            (FieldKind::Alphanumeric, Value::Text(s)) => {
                check_characters(self.name, s)?;
                Ok(s.clone())
            }
        }
    }

    fn fill(&self, text: &str) -> String {
        let padding: String = std::iter::repeat(self.pad)
            .take(self.width - text.len())
            .collect();
        match self.align {
            Align::Left => format!("{}{}", text, padding),
            Align::Right => format!("{}{}", padding, text),
        }
    }

    fn strip<'a>(&self, text: &'a str) -> &'a str {
        match self.align {
            Align::Left => text.trim_end_matches(self.pad),
            Align::Right => text.trim_start_matches(self.pad),
        }
    }
}

fn parse_whole(field: &str, digits: &str) -> Result<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NachaError::field(field, digits, "must be a whole number"));
    }
    digits
        .parse::<u64>()
        .map_err(|_| NachaError::field(field, digits, "is too large"))
}

fn check_characters(field: &str, text: &str) -> Result<()> {
    match text.chars().find(|c| !(' '..='~').contains(c)) {
        Some(c) => Err(NachaError::field(
            field,
            text,
            format!("has invalid character {:?}", c),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: Labels = &[("MIXED", Literal::Numeric(200)), ("CREDITS", Literal::Numeric(220))];

    #[test]
    fn test_alphanumeric_pads_right() {
        let field = Field::alphanumeric("memo", 18);
        assert_eq!(field.pack(Some(&"X9X".into())).unwrap(), format!("{:<18}", "X9X"));
    }

    #[test]
    fn test_alphanumeric_right_aligned() {
        let field = Field::alphanumeric("account", 17).align(Align::Right);
        let packed = field.pack(Some(&"1123456789".into())).unwrap();
        assert_eq!(packed, "       1123456789");
        assert_eq!(field.unpack(&packed).unwrap(), Some("1123456789".into()));
    }

    #[test]
    fn test_alphanumeric_rejects_non_ascii() {
        let field = Field::alphanumeric("memo", 18);
        let err = field.pack(Some(&"BALANCEDバカ".into())).unwrap_err();
        assert!(err.to_string().contains("has invalid character"));
    }

    #[test]
    fn test_alphanumeric_rejects_overflow() {
        let field = Field::alphanumeric("code", 3);
        let err = field.pack(Some(&"ABCD".into())).unwrap_err();
        assert!(err.to_string().contains("exceeds width 3"));
    }

    #[test]
    fn test_numeric_zero_pads() {
        let field = Field::numeric("amount", 9);
        assert_eq!(field.pack(Some(&"1".into())).unwrap(), "000000001");
        assert_eq!(field.pack(Some(&Value::Numeric(12345))).unwrap(), "000012345");
    }

    #[test]
    fn test_numeric_rejects_non_digits() {
        let field = Field::numeric("amount", 9);
        let err = field.pack(Some(&"%^&".into())).unwrap_err();
        assert_eq!(err.to_string(), "amount value \"%^&\" must be a whole number");
    }

    #[test]
    fn test_numeric_overflow_fails_instead_of_truncating() {
        let field = Field::numeric("count", 2);
        assert!(field.pack(Some(&Value::Numeric(99))).is_ok());
        let err = field.pack(Some(&Value::Numeric(100))).unwrap_err();
        assert!(err.is_field_error());
    }

    #[test]
    fn test_numeric_space_padding_round_trips() {
        let field = Field::numeric("destination", 10).pad(' ');
        let packed = field.pack(Some(&Value::Numeric(91000019))).unwrap();
        assert_eq!(packed, "  91000019");
        assert_eq!(field.unpack(&packed).unwrap(), Some(Value::Numeric(91000019)));
    }

    #[test]
    fn test_constant_fills_and_rejects_conflicts() {
        let field = Field::numeric("priority_code", 2).constant(Literal::Numeric(1));
        assert_eq!(field.pack(None).unwrap(), "01");
        assert_eq!(field.pack(Some(&"01".into())).unwrap(), "01");
        assert!(field.pack(Some(&Value::Numeric(2))).is_err());
        assert!(field.unpack("02").is_err());
    }

    #[test]
    fn test_missing_required_value() {
        let field = Field::alphanumeric("origin", 10);
        let err = field.pack(None).unwrap_err();
        assert!(matches!(err, NachaError::MissingField { .. }));
    }

    #[test]
    fn test_optional_and_default() {
        let optional = Field::alphanumeric("discretionary", 4).optional();
        assert_eq!(optional.pack(None).unwrap(), "    ");

        let defaulted = Field::alphanumeric("reference", 8).default_value(Literal::Text("REF"));
        assert_eq!(defaulted.pack(None).unwrap(), "REF     ");
    }

    #[test]
    fn test_reserved_always_empty() {
        let field = Field::alphanumeric("filler", 6).reserved();
        assert_eq!(field.pack(Some(&"XYZ".into())).unwrap(), "      ");
        assert_eq!(field.unpack("ABCDEF").unwrap(), Some(Value::Text(String::new())));
    }

    #[test]
    fn test_labels_are_an_open_overlay() {
        let field = Field::numeric("service_class_code", 3).labels(LABELS);
        assert_eq!(field.label_for(&Value::Numeric(200)), Some("MIXED"));
        assert_eq!(field.value_for("CREDITS"), Some(Value::Numeric(220)));
        assert_eq!(field.label_for(&Value::Numeric(201)), None);
        assert_eq!(field.pack(Some(&Value::Numeric(201))).unwrap(), "201");
    }

    #[test]
    fn test_unpack_rejects_wrong_width() {
        let field = Field::numeric("count", 6);
        assert!(field.unpack("12345").is_err());
    }
}
