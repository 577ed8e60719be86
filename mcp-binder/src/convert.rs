//! Conversions from [`ArgValue`] into typed destinations.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BindError, BindResult};
use crate::value::{ArgValue, ArgumentBag};

/// Types that can be produced from one argument value.
///
/// No implicit coercion is performed: strings are never parsed as numbers and
/// numbers are never rendered as strings. The only conversions beyond an exact
/// type match are integer narrowing and the date layouts in [`DateFormat`].
pub trait FromArg: Sized {
    /// Converts `value`, naming `key` in any error.
    ///
    /// # Errors
    ///
    /// Returns a [`BindError`] describing why the value is unacceptable.
    fn from_arg(key: &str, value: &ArgValue) -> BindResult<Self>;
}

/// Looks up `key` and converts it, returning `None` when absent or `null`.
///
/// # Errors
///
/// Propagates the conversion error of `T`.
pub fn lookup<T: FromArg>(bag: &ArgumentBag, key: &str) -> BindResult<Option<T>> {
    bag.get(key).map(|value| T::from_arg(key, value)).transpose()
}

impl FromArg for String {
    fn from_arg(key: &str, value: &ArgValue) -> BindResult<Self> {
        match value {
            ArgValue::String(text) => Ok(text.clone()),
            other => Err(BindError::wrong_type(key, "a string", other.kind())),
        }
    }
}

impl FromArg for bool {
    fn from_arg(key: &str, value: &ArgValue) -> BindResult<Self> {
        match value {
            ArgValue::Bool(flag) => Ok(*flag),
            other => Err(BindError::wrong_type(key, "a boolean", other.kind())),
        }
    }
}

impl FromArg for f64 {
    fn from_arg(key: &str, value: &ArgValue) -> BindResult<Self> {
        match value {
            ArgValue::Number(number) => Ok(*number),
            other => Err(BindError::wrong_type(key, "a number", other.kind())),
        }
    }
}

fn integral(key: &str, value: &ArgValue) -> BindResult<f64> {
    let number = f64::from_arg(key, value)?;
    if !number.is_finite() || number.fract() != 0.0 {
        return Err(BindError::NotIntegral {
            key: key.to_owned(),
            value: number,
        });
    }
    Ok(number)
}

macro_rules! integer_from_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromArg for $ty {
                #[allow(clippy::cast_possible_truncation)]
                fn from_arg(key: &str, value: &ArgValue) -> BindResult<Self> {
                    let number = integral(key, value)?;
                    // `as` saturates, so anything beyond i128 still fails the conversion.
                    <$ty>::try_from(number as i128).map_err(|_| BindError::OutOfRange {
                        key: key.to_owned(),
                        value: number,
                        target: stringify!($ty),
                    })
                }
            }
        )*
    };
}

integer_from_arg!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl<T: FromArg> FromArg for Vec<T> {
    fn from_arg(key: &str, value: &ArgValue) -> BindResult<Self> {
        let ArgValue::List(items) = value else {
            return Err(BindError::wrong_type(key, "an array", value.kind()));
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| T::from_arg(&format!("{key}[{index}]"), item))
            .collect()
    }
}

/// String layouts accepted by the date and time conversions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateFormat {
    /// Full timestamp, e.g. `2024-03-01T09:30:00Z`.
    Rfc3339,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// Compact calendar date used by older endpoints, `YYYYMMDD`.
    LegacyDate,
    /// Wall-clock time, `HH:MM:SS`.
    Time,
}

impl DateFormat {
    /// Returns the human-readable layout reported in errors.
    #[must_use]
    pub const fn layout(self) -> &'static str {
        match self {
            Self::Rfc3339 => "RFC3339",
            Self::Date => "YYYY-MM-DD",
            Self::LegacyDate => "YYYYMMDD",
            Self::Time => "HH:MM:SS",
        }
    }

    fn error(self, key: &str, value: &str) -> BindError {
        BindError::BadFormat {
            key: key.to_owned(),
            format: self.layout(),
            value: value.to_owned(),
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.layout())
    }
}

fn date_string<'v>(key: &str, value: &'v ArgValue, format: DateFormat) -> BindResult<&'v str> {
    match value {
        ArgValue::String(text) => Ok(text),
        other => Err(BindError::wrong_type(
            key,
            match format {
                DateFormat::Rfc3339 => "an RFC3339 timestamp string",
                DateFormat::Date | DateFormat::LegacyDate => "a date string",
                DateFormat::Time => "a time string",
            },
            other.kind(),
        )),
    }
}

/// Checks `text` byte by byte against `layout`, where `9` stands for an ASCII
/// digit and every other byte must match literally.
fn matches_layout(text: &str, layout: &str) -> bool {
    text.len() == layout.len()
        && text.bytes().zip(layout.bytes()).all(|(byte, expected)| match expected {
            b'9' => byte.is_ascii_digit(),
            literal => byte == literal,
        })
}

/// Reads a run of ASCII digits already checked by [`matches_layout`].
fn field<T: From<u16>>(text: &str, range: std::ops::Range<usize>) -> T {
    let value = text.as_bytes()[range]
        .iter()
        .fold(0_u16, |acc, digit| acc * 10 + u16::from(digit - b'0'));
    T::from(value)
}

impl FromArg for DateTime<Utc> {
    fn from_arg(key: &str, value: &ArgValue) -> BindResult<Self> {
        let format = DateFormat::Rfc3339;
        let text = date_string(key, value, format)?;
        DateTime::parse_from_rfc3339(text)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|_| format.error(key, text))
    }
}

impl FromArg for NaiveDate {
    fn from_arg(key: &str, value: &ArgValue) -> BindResult<Self> {
        let format = DateFormat::Date;
        let text = date_string(key, value, format)?;
        if !matches_layout(text, "9999-99-99") {
            return Err(format.error(key, text));
        }
        NaiveDate::from_ymd_opt(field(text, 0..4), field(text, 5..7), field(text, 8..10))
            .ok_or_else(|| format.error(key, text))
    }
}

impl FromArg for NaiveTime {
    fn from_arg(key: &str, value: &ArgValue) -> BindResult<Self> {
        let format = DateFormat::Time;
        let text = date_string(key, value, format)?;
        if !matches_layout(text, "99:99:99") {
            return Err(format.error(key, text));
        }
        // `from_hms_opt` has no leap-second form, so `:60` is rejected.
        NaiveTime::from_hms_opt(field(text, 0..2), field(text, 3..5), field(text, 6..8))
            .ok_or_else(|| format.error(key, text))
    }
}

/// Calendar date written in the compact `YYYYMMDD` layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LegacyDate(pub NaiveDate);

impl LegacyDate {
    /// Returns the wrapped date.
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }

    fn parse(text: &str) -> Option<Self> {
        if !matches_layout(text, "99999999") {
            return None;
        }
        NaiveDate::from_ymd_opt(field(text, 0..4), field(text, 4..6), field(text, 6..8)).map(Self)
    }
}

impl fmt::Display for LegacyDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d"))
    }
}

impl FromArg for LegacyDate {
    fn from_arg(key: &str, value: &ArgValue) -> BindResult<Self> {
        let format = DateFormat::LegacyDate;
        let text = date_string(key, value, format)?;
        Self::parse(text).ok_or_else(|| format.error(key, text))
    }
}

impl Serialize for LegacyDate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LegacyDate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("expected YYYYMMDD, got `{text}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(value: f64) -> ArgValue {
        ArgValue::Number(value)
    }

    #[test]
    fn integers_require_integral_values() {
        assert_eq!(i64::from_arg("id", &number(2.0)).unwrap(), 2);

        let err = i64::from_arg("id", &number(1.5)).expect_err("fractional");
        assert_eq!(
            err,
            BindError::NotIntegral {
                key: "id".into(),
                value: 1.5
            }
        );
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn integers_respect_destination_range() {
        assert_eq!(u8::from_arg("p", &number(255.0)).unwrap(), 255);
        assert!(matches!(
            u8::from_arg("p", &number(256.0)),
            Err(BindError::OutOfRange { target: "u8", .. })
        ));
        assert!(matches!(
            u32::from_arg("p", &number(-1.0)),
            Err(BindError::OutOfRange { .. })
        ));
        assert!(matches!(
            i32::from_arg("p", &number(f64::NAN)),
            Err(BindError::NotIntegral { .. })
        ));
    }

    #[test]
    fn no_implicit_coercion() {
        assert!(matches!(
            i64::from_arg("id", &ArgValue::from("12")),
            Err(BindError::WrongType { expected: "a number", found: "string", .. })
        ));
        assert!(matches!(
            String::from_arg("name", &number(3.0)),
            Err(BindError::WrongType { found: "number", .. })
        ));
        assert!(matches!(
            bool::from_arg("flag", &ArgValue::from("true")),
            Err(BindError::WrongType { .. })
        ));
    }

    #[test]
    fn lists_convert_element_wise() {
        let list = ArgValue::List(vec![number(1.0), number(2.0), number(3.0)]);
        assert_eq!(Vec::<u32>::from_arg("ids", &list).unwrap(), vec![1, 2, 3]);

        let mixed = ArgValue::List(vec![number(1.0), ArgValue::from("x")]);
        let err = Vec::<u32>::from_arg("ids", &mixed).expect_err("bad element");
        assert_eq!(err.key(), Some("ids[1]"));

        assert!(matches!(
            Vec::<u32>::from_arg("ids", &number(1.0)),
            Err(BindError::WrongType { expected: "an array", .. })
        ));
    }

    #[test]
    fn date_layouts() {
        let date = NaiveDate::from_arg("due", &ArgValue::from("2024-02-29")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let err = NaiveDate::from_arg("due", &ArgValue::from("2023-13-40")).expect_err("bad");
        assert_eq!(
            err,
            BindError::BadFormat {
                key: "due".into(),
                format: "YYYY-MM-DD",
                value: "2023-13-40".into()
            }
        );
        assert!(err.to_string().contains("YYYY-MM-DD"));

        let legacy = LegacyDate::from_arg("from", &ArgValue::from("20240105")).unwrap();
        assert_eq!(legacy.date(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(legacy.to_string(), "20240105");
        assert!(LegacyDate::from_arg("from", &ArgValue::from("2024-01-05")).is_err());
        assert!(LegacyDate::from_arg("from", &ArgValue::from("20241301")).is_err());

        let time = NaiveTime::from_arg("start", &ArgValue::from("09:30:00")).unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert!(matches!(
            NaiveTime::from_arg("start", &ArgValue::from("9:30")),
            Err(BindError::BadFormat { format: "HH:MM:SS", .. })
        ));

        let stamp =
            DateTime::<Utc>::from_arg("after", &ArgValue::from("2024-03-01T10:00:00+01:00"))
                .unwrap();
        assert_eq!(stamp.to_rfc3339(), "2024-03-01T09:00:00+00:00");
        assert!(matches!(
            DateTime::<Utc>::from_arg("after", &ArgValue::from("2024-03-01")),
            Err(BindError::BadFormat { format: "RFC3339", .. })
        ));
    }

    #[test]
    fn date_layouts_are_checked_byte_by_byte() {
        for text in ["+202-01-01", "2024-1-010", "2024/01/01", "２０２4-01-01"] {
            assert!(
                matches!(
                    NaiveDate::from_arg("due", &ArgValue::from(text)),
                    Err(BindError::BadFormat { format: "YYYY-MM-DD", .. })
                ),
                "{text}"
            );
        }
        for text in ["23:59:60", "+9:30:00", "09-30-00", "24:00:00"] {
            assert!(
                matches!(
                    NaiveTime::from_arg("start", &ArgValue::from(text)),
                    Err(BindError::BadFormat { format: "HH:MM:SS", .. })
                ),
                "{text}"
            );
        }
        assert_eq!(
            NaiveTime::from_arg("start", &ArgValue::from("23:59:59")).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 59).unwrap()
        );
        assert!(LegacyDate::from_arg("from", &ArgValue::from("+2024010")).is_err());
    }

    #[test]
    fn lookup_treats_null_as_absent() {
        let bag = ArgumentBag::new()
            .with("present", 4.0)
            .with("empty", ArgValue::Null);

        assert_eq!(lookup::<u32>(&bag, "present").unwrap(), Some(4));
        assert_eq!(lookup::<u32>(&bag, "empty").unwrap(), None);
        assert_eq!(lookup::<u32>(&bag, "missing").unwrap(), None);
    }
}
