//! Record schemas: ordered field layouts that make up one line.
//!
//! A [`Schema`] slices a line into consecutive fixed windows and packs values
//! back in declared order. [`RawRecord`] is the dynamic, name-addressed view
//! of one line; the typed records in [`crate::records`] convert to and from it
//! through the [`Record`] and [`FieldValue`] traits.

use crate::amount::Amount;
use crate::codes::{ServiceClassCode, TransactionCode};
use crate::error::{NachaError, Result};
use crate::field::{Field, Literal, Value};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use std::fmt;
use std::ops::RangeInclusive;

/// An ordered set of named fields defining one line.
#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

impl Schema {
    /// Total line width.
    pub fn width(&self) -> usize {
        self.fields.iter().map(|f| f.width).sum()
    }

    /// The 1-character discriminator pinned by the leading field.
    pub fn type_code(&self) -> Option<char> {
        match self.fields.first()?.constant? {
            Literal::Text(code) => code.chars().next(),
            Literal::Numeric(_) => None,
        }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Packs one value per field, in declared order.
    pub fn dump(&self, values: &[Option<Value>]) -> Result<String> {
        let mut line = String::with_capacity(self.width());
        for (field, value) in self.fields.iter().zip(values) {
            let packed = field.pack(value.as_ref()).map_err(|e| e.in_record(self.name))?;
            line.push_str(&packed);
        }
        Ok(line)
    }

    /// Unpacks a full line. Fails as a whole if any field fails.
    pub fn load(&self, line: &str) -> Result<Vec<Option<Value>>> {
        if !line.is_ascii() {
            return Err(NachaError::InvalidInput(format!(
                "{} line contains non-ASCII characters",
                self.name
            )));
        }
        if line.len() != self.width() {
            return Err(NachaError::InvalidInput(format!(
                "{} line must be {} characters, got {}",
                self.name,
                self.width(),
                line.len()
            )));
        }

        let mut offset = 0;
        self.fields
            .iter()
            .map(|field| {
                let window = &line[offset..offset + field.width];
                offset += field.width;
                field.unpack(window).map_err(|e| e.in_record(self.name))
            })
            .collect()
    }
}

/// Name-addressed field values for one schema.
#[derive(Debug, Clone)]
pub struct RawRecord {
    schema: &'static Schema,
    values: Vec<Option<Value>>,
}

impl RawRecord {
    /// A record with every field unset.
    pub fn new(schema: &'static Schema) -> Self {
        RawRecord {
            schema,
            values: vec![None; schema.fields.len()],
        }
    }

    pub fn load(schema: &'static Schema, line: &str) -> Result<Self> {
        Ok(RawRecord {
            schema,
            values: schema.load(line)?,
        })
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values[self.schema.position(name)?].as_ref()
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.index(name)?;
        self.values[index] = Some(value.into());
        Ok(())
    }

    /// Builder form of [`RawRecord::set`].
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    pub fn unset(&mut self, name: &str) -> Result<()> {
        let index = self.index(name)?;
        self.values[index] = None;
        Ok(())
    }

    pub fn dump(&self) -> Result<String> {
        self.schema.dump(&self.values)
    }

    pub(crate) fn put<T: FieldValue + fmt::Debug>(&mut self, name: &str, value: &T) -> Result<()> {
        let index = self.index(name)?;
        self.values[index] = value.to_value().map_err(|reason| {
            NachaError::field(
                format!("{}.{}", self.schema.name, name),
                format!("{:?}", value),
                reason,
            )
        })?;
        Ok(())
    }

    pub(crate) fn take<T: FieldValue>(&mut self, name: &str) -> Result<T> {
        let index = self.index(name)?;
        let value = self.values[index].take();
        let shown = value.as_ref().map(Value::to_string).unwrap_or_default();
        T::from_value(value).map_err(|reason| {
            NachaError::field(format!("{}.{}", self.schema.name, name), shown, reason)
        })
    }

    fn index(&self, name: &str) -> Result<usize> {
        self.schema.position(name).ok_or_else(|| {
            NachaError::InvalidInput(format!("{} has no field {}", self.schema.name, name))
        })
    }
}

/// A typed record bound to one schema.
pub trait Record: Sized {
    fn schema() -> &'static Schema;

    fn to_raw(&self) -> Result<RawRecord>;

    fn from_raw(raw: RawRecord) -> Result<Self>;

    /// Serializes to exactly `schema().width()` characters.
    fn dump(&self) -> Result<String> {
        self.to_raw()?.dump()
    }

    /// Parses one line, terminator already stripped.
    fn load(line: &str) -> Result<Self> {
        Self::from_raw(RawRecord::load(Self::schema(), line)?)
    }
}

/// Outcome of a [`FieldValue`] conversion; the error is the failure reason.
pub type Conversion<T> = std::result::Result<T, String>;

/// Conversion between a typed record attribute and a field [`Value`].
pub trait FieldValue: Sized {
    /// Converts to a field value, failing if the attribute has no
    /// representation in the field.
    fn to_value(&self) -> Conversion<Option<Value>>;

    /// Converts back, returning the failure reason on mismatch.
    fn from_value(value: Option<Value>) -> Conversion<Self>;
}

fn present(value: Option<Value>) -> Conversion<Value> {
    value.ok_or_else(|| "is missing".to_string())
}

impl FieldValue for u64 {
    fn to_value(&self) -> Conversion<Option<Value>> {
        Ok(Some(Value::Numeric(*self)))
    }

    fn from_value(value: Option<Value>) -> Conversion<Self> {
        match present(value)? {
            Value::Numeric(n) => Ok(n),
            Value::Text(s) => s.trim().parse().map_err(|_| "must be a whole number".to_string()),
        }
    }
}

impl FieldValue for u8 {
    fn to_value(&self) -> Conversion<Option<Value>> {
        Ok(Some(Value::Numeric(*self as u64)))
    }

    fn from_value(value: Option<Value>) -> Conversion<Self> {
        u8::try_from(u64::from_value(value)?).map_err(|_| "is out of range".to_string())
    }
}

impl FieldValue for String {
    fn to_value(&self) -> Conversion<Option<Value>> {
        Ok(Some(Value::Text(self.clone())))
    }

    fn from_value(value: Option<Value>) -> Conversion<Self> {
        Ok(present(value)?.to_string())
    }
}

impl FieldValue for char {
    fn to_value(&self) -> Conversion<Option<Value>> {
        Ok(Some(Value::Text(self.to_string())))
    }

    fn from_value(value: Option<Value>) -> Conversion<Self> {
        let text = present(value)?.to_string();
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err("must be a single character".to_string()),
        }
    }
}

impl FieldValue for Amount {
    fn to_value(&self) -> Conversion<Option<Value>> {
        Ok(Some(Value::Numeric(self.cents())))
    }

    fn from_value(value: Option<Value>) -> Conversion<Self> {
        u64::from_value(value).map(Amount::from_cents)
    }
}

impl FieldValue for ServiceClassCode {
    fn to_value(&self) -> Conversion<Option<Value>> {
        Ok(Some(Value::Numeric(self.0 as u64)))
    }

    fn from_value(value: Option<Value>) -> Conversion<Self> {
        u16::try_from(u64::from_value(value)?)
            .map(ServiceClassCode)
            .map_err(|_| "is out of range".to_string())
    }
}

impl FieldValue for TransactionCode {
    fn to_value(&self) -> Conversion<Option<Value>> {
        Ok(Some(Value::Numeric(self.0 as u64)))
    }

    fn from_value(value: Option<Value>) -> Conversion<Self> {
        u8::from_value(value).map(TransactionCode)
    }
}

/// Years a two-digit `YYMMDD` year reads back as (`%y`).
pub const YEAR_WINDOW: RangeInclusive<i32> = 1969..=2068;

/// Dates travel as `YYMMDD`; only years inside [`YEAR_WINDOW`] survive the
/// trip, so others are rejected rather than wrapped.
impl FieldValue for NaiveDate {
    fn to_value(&self) -> Conversion<Option<Value>> {
        if !YEAR_WINDOW.contains(&self.year()) {
            return Err(format!(
                "has year {} outside {}-{}",
                self.year(),
                YEAR_WINDOW.start(),
                YEAR_WINDOW.end()
            ));
        }
        let yymmdd = (self.year().rem_euclid(100) as u64) * 10_000
            + (self.month() as u64) * 100
            + self.day() as u64;
        Ok(Some(Value::Numeric(yymmdd)))
    }

    fn from_value(value: Option<Value>) -> Conversion<Self> {
        let yymmdd = u64::from_value(value)?;
        NaiveDate::parse_from_str(&format!("{:06}", yymmdd), "%y%m%d")
            .map_err(|_| "is not a valid YYMMDD date".to_string())
    }
}

/// An all-zero `YYMMDD` is no date at all.
impl FieldValue for Option<NaiveDate> {
    fn to_value(&self) -> Conversion<Option<Value>> {
        match self {
            Some(date) => date.to_value(),
            None => Ok(Some(Value::Numeric(0))),
        }
    }

    fn from_value(value: Option<Value>) -> Conversion<Self> {
        match value {
            Some(Value::Numeric(0)) => Ok(None),
            other => NaiveDate::from_value(other).map(Some),
        }
    }
}

/// Times travel as `hhmm`.
impl FieldValue for NaiveTime {
    fn to_value(&self) -> Conversion<Option<Value>> {
        Ok(Some(Value::Numeric((self.hour() * 100 + self.minute()) as u64)))
    }

    fn from_value(value: Option<Value>) -> Conversion<Self> {
        let hhmm = u64::from_value(value)?;
        NaiveTime::from_hms_opt((hhmm / 100) as u32, (hhmm % 100) as u32, 0)
            .ok_or_else(|| "is not a valid hhmm time".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static POINT: Schema = Schema {
        name: "Point",
        fields: &[
            Field::alphanumeric("record_type", 1).constant(Literal::Text("P")),
            Field::numeric("x", 4),
            Field::alphanumeric("label", 5).optional(),
        ],
    };

    #[test]
    fn test_width_and_type_code() {
        assert_eq!(POINT.width(), 10);
        assert_eq!(POINT.type_code(), Some('P'));
    }

    #[test]
    fn test_raw_record_dump_and_load() {
        let raw = RawRecord::new(&POINT).with("x", 42u64).unwrap();
        let line = raw.dump().unwrap();
        assert_eq!(line, "P0042     ");

        let loaded = RawRecord::load(&POINT, &line).unwrap();
        assert_eq!(loaded.get("x"), Some(&Value::Numeric(42)));
        assert_eq!(loaded.get("label"), Some(&Value::Text(String::new())));
    }

    #[test]
    fn test_dump_names_missing_field() {
        let err = RawRecord::new(&POINT).dump().unwrap_err();
        assert_eq!(err.to_string(), "Point.x value is missing");
    }

    #[test]
    fn test_load_rejects_wrong_width() {
        assert!(POINT.load("P0042").is_err());
        assert!(POINT.load("P0042      ").is_err());
    }

    #[test]
    fn test_load_fails_atomically() {
        let err = POINT.load("Q0042     ").unwrap_err();
        assert!(err.to_string().starts_with("Point.record_type"));
        assert!(POINT.load("P00X2     ").is_err());
    }

    #[test]
    fn test_set_unknown_field() {
        let mut raw = RawRecord::new(&POINT);
        assert!(matches!(
            raw.set("y", 1u64),
            Err(NachaError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_date_and_time_values() {
        let date = NaiveDate::from_ymd_opt(2013, 1, 16).unwrap();
        assert_eq!(date.to_value(), Ok(Some(Value::Numeric(130116))));
        assert_eq!(NaiveDate::from_value(Some(Value::Numeric(130116))).unwrap(), date);

        let early = NaiveDate::from_ymd_opt(2005, 3, 1).unwrap();
        assert_eq!(NaiveDate::from_value(early.to_value().unwrap()).unwrap(), early);

        let time = NaiveTime::from_hms_opt(15, 5, 0).unwrap();
        assert_eq!(time.to_value(), Ok(Some(Value::Numeric(1505))));
        assert_eq!(NaiveTime::from_value(Some(Value::Numeric(1505))).unwrap(), time);
        assert!(NaiveTime::from_value(Some(Value::Numeric(2575))).is_err());
    }

    #[test]
    fn test_dates_at_the_window_edges_round_trip() {
        for (y, m, d) in [(1969, 1, 1), (1999, 12, 31), (2000, 1, 1), (2068, 12, 31)] {
            let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            let back = NaiveDate::from_value(date.to_value().unwrap()).unwrap();
            assert_eq!(back, date);
        }
    }

    #[test]
    fn test_dates_outside_the_window_are_rejected() {
        for y in [1950, 1968, 2069, 2150] {
            let date = NaiveDate::from_ymd_opt(y, 1, 1).unwrap();
            let reason = date.to_value().unwrap_err();
            assert!(reason.contains("outside 1969-2068"), "{}", reason);
        }
    }

    #[test]
    fn test_optional_date_uses_zeros_for_none() {
        assert_eq!(Option::<NaiveDate>::None.to_value(), Ok(Some(Value::Numeric(0))));
        assert_eq!(Option::<NaiveDate>::from_value(Some(Value::Numeric(0))), Ok(None));

        let date = NaiveDate::from_ymd_opt(2013, 1, 16).unwrap();
        assert_eq!(
            Option::<NaiveDate>::from_value(Some(Value::Numeric(130116))),
            Ok(Some(date))
        );
        assert!(Option::<NaiveDate>::from_value(Some(Value::Numeric(131345))).is_err());
    }

    #[test]
    fn test_put_names_rejected_attribute() {
        static DATED: Schema = Schema {
            name: "Dated",
            fields: &[Field::numeric("on", 6)],
        };
        let mut raw = RawRecord::new(&DATED);
        let err = raw
            .put("on", &NaiveDate::from_ymd_opt(1950, 1, 1).unwrap())
            .unwrap_err();
        assert!(err.is_field_error());
        assert!(err.to_string().starts_with("Dated.on value \"1950-01-01\""));
    }
}
