//! Declarative extractors that fill request fields from an [`ArgumentBag`].

use std::fmt::Display;
use std::ops::RangeInclusive;

use crate::convert::{FromArg, lookup};
use crate::error::{BindError, BindErrors, BindResult};
use crate::value::ArgumentBag;

/// One step of a [`bind`] call: reads a key and writes a destination.
///
/// Implementations must leave the destination untouched when they fail.
pub trait Extract {
    /// Reads the argument from `bag` and writes the destination on success.
    ///
    /// # Errors
    ///
    /// Returns the [`BindError`] describing the problem with this argument.
    fn extract(&mut self, bag: &ArgumentBag) -> BindResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Required,
    Optional,
}

enum Slot<'a, T> {
    Value(&'a mut T),
    Pointer(&'a mut Option<T>),
}

type Check<'a, T> = Box<dyn Fn(&str, &T) -> BindResult<()> + 'a>;

/// Extractor bound to a single destination field.
///
/// Built with [`required`], [`optional`] or [`optional_ptr`], optionally
/// narrowed with [`one_of`](Field::one_of), [`in_range`](Field::in_range) or
/// [`each_one_of`](Field::each_one_of).
pub struct Field<'a, T> {
    key: &'a str,
    presence: Presence,
    slot: Slot<'a, T>,
    check: Option<Check<'a, T>>,
}

/// Extracts a key that must be present with a convertible value.
#[must_use]
pub fn required<'a, T: FromArg>(key: &'a str, dest: &'a mut T) -> Field<'a, T> {
    Field {
        key,
        presence: Presence::Required,
        slot: Slot::Value(dest),
        check: None,
    }
}

/// Extracts an optional key; the destination keeps its value when absent.
#[must_use]
pub fn optional<'a, T: FromArg>(key: &'a str, dest: &'a mut T) -> Field<'a, T> {
    Field {
        key,
        presence: Presence::Optional,
        slot: Slot::Value(dest),
        check: None,
    }
}

/// Extracts an optional key into an `Option`, left `None` when absent.
#[must_use]
pub fn optional_ptr<'a, T: FromArg>(key: &'a str, dest: &'a mut Option<T>) -> Field<'a, T> {
    Field {
        key,
        presence: Presence::Optional,
        slot: Slot::Pointer(dest),
        check: None,
    }
}

fn check_allowed<T, A>(key: &str, value: &T, allowed: &[A]) -> BindResult<()>
where
    T: PartialEq<A> + Display,
    A: Display,
{
    if allowed.iter().any(|candidate| value == candidate) {
        return Ok(());
    }
    Err(BindError::NotAllowed {
        key: key.to_owned(),
        value: value.to_string(),
        allowed: allowed.iter().map(ToString::to_string).collect(),
    })
}

impl<'a, T> Field<'a, T>
where
    T: Display + 'a,
{
    /// Restricts the converted value to the supplied allow-list.
    #[must_use]
    pub fn one_of<A>(mut self, allowed: &'a [A]) -> Self
    where
        T: PartialEq<A>,
        A: Display,
    {
        self.check = Some(Box::new(move |key, value| {
            check_allowed(key, value, allowed)
        }));
        self
    }

    /// Restricts the converted value to an inclusive range.
    #[must_use]
    pub fn in_range(mut self, range: RangeInclusive<T>) -> Self
    where
        T: PartialOrd,
    {
        self.check = Some(Box::new(move |key, value| {
            if range.contains(value) {
                return Ok(());
            }
            Err(BindError::NotInRange {
                key: key.to_owned(),
                value: value.to_string(),
                min: range.start().to_string(),
                max: range.end().to_string(),
            })
        }));
        self
    }
}

impl<'a, E> Field<'a, Vec<E>>
where
    E: Display + 'a,
{
    /// Restricts every element of a list to the supplied allow-list.
    #[must_use]
    pub fn each_one_of<A>(mut self, allowed: &'a [A]) -> Self
    where
        E: PartialEq<A>,
        A: Display,
    {
        self.check = Some(Box::new(move |key, values| {
            values
                .iter()
                .enumerate()
                .try_for_each(|(index, item)| {
                    check_allowed(&format!("{key}[{index}]"), item, allowed)
                })
        }));
        self
    }
}

impl<T: FromArg> Extract for Field<'_, T> {
    fn extract(&mut self, bag: &ArgumentBag) -> BindResult<()> {
        let Some(value) = lookup::<T>(bag, self.key)? else {
            return match self.presence {
                Presence::Required => Err(BindError::Missing {
                    key: self.key.to_owned(),
                }),
                Presence::Optional => Ok(()),
            };
        };

        if let Some(check) = &self.check {
            check(self.key, &value)?;
        }

        match &mut self.slot {
            Slot::Value(dest) => **dest = value,
            Slot::Pointer(dest) => **dest = Some(value),
        }
        Ok(())
    }
}

/// Runs every extractor against `bag`, collecting all failures.
///
/// Extractors run in order and a failure never stops the remaining ones, so
/// the returned [`BindErrors`] lists every problem with the call at once.
///
/// # Errors
///
/// Returns the collected errors when at least one extractor failed.
pub fn bind(bag: &ArgumentBag, extractors: &mut [&mut dyn Extract]) -> Result<(), BindErrors> {
    let mut errors = BindErrors::new();
    for extractor in extractors.iter_mut() {
        if let Err(err) = extractor.extract(bag) {
            errors.push(err);
        }
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    const STATUSES: &[&str] = &["open", "closed"];

    #[derive(Debug, Default)]
    struct UpdateTicket {
        id: u64,
        subject: String,
        priority: Option<String>,
        due: Option<NaiveDate>,
        tags: Vec<i64>,
    }

    fn bag(value: serde_json::Value) -> ArgumentBag {
        ArgumentBag::from_json(value).unwrap()
    }

    fn bind_update(bag: &ArgumentBag, request: &mut UpdateTicket) -> Result<(), BindErrors> {
        bind(
            bag,
            &mut [
                &mut required("id", &mut request.id),
                &mut optional("subject", &mut request.subject),
                &mut optional_ptr("priority", &mut request.priority)
                    .one_of(&["low", "high"]),
                &mut optional_ptr("due", &mut request.due),
                &mut optional("tags", &mut request.tags),
            ],
        )
    }

    #[test]
    fn required_field_must_be_present() {
        let mut request = UpdateTicket::default();
        let err = bind_update(&bag(json!({})), &mut request).expect_err("id missing");

        assert_eq!(err.len(), 1);
        assert_eq!(err.errors()[0], BindError::Missing { key: "id".into() });
        assert!(err.to_string().contains("id"));

        bind_update(&bag(json!({ "id": 9 })), &mut request).unwrap();
        assert_eq!(request.id, 9);
    }

    #[test]
    fn absent_optionals_keep_defaults() {
        let mut request = UpdateTicket {
            subject: "keep".into(),
            ..UpdateTicket::default()
        };
        bind_update(&bag(json!({ "id": 1, "due": null })), &mut request).unwrap();

        assert_eq!(request.subject, "keep");
        assert!(request.priority.is_none());
        assert!(request.due.is_none());
        assert!(request.tags.is_empty());
    }

    #[test]
    fn integral_numbers_narrow() {
        let mut id = 0_u32;
        let err = bind(&bag(json!({ "id": 1.5 })), &mut [&mut required("id", &mut id)])
            .expect_err("fractional id");
        assert!(matches!(err.errors()[0], BindError::NotIntegral { value, .. } if value == 1.5));
        assert_eq!(id, 0);

        bind(&bag(json!({ "id": 2.0 })), &mut [&mut required("id", &mut id)]).unwrap();
        assert_eq!(id, 2);
    }

    #[test]
    fn every_failure_is_reported() {
        let mut request = UpdateTicket {
            subject: "original".into(),
            ..UpdateTicket::default()
        };
        let err = bind_update(
            &bag(json!({
                "subject": 12,
                "priority": "urgent",
                "due": "2023-13-40",
                "tags": "1,2"
            })),
            &mut request,
        )
        .expect_err("five problems");

        let keys: Vec<_> = err.errors().iter().filter_map(BindError::key).collect();
        assert_eq!(keys, ["id", "subject", "priority", "due", "tags"]);
        assert!(matches!(
            &err.errors()[3],
            BindError::BadFormat { format: "YYYY-MM-DD", value, .. } if value == "2023-13-40"
        ));

        // Failed extractors never touch their destinations.
        assert_eq!(request.subject, "original");
        assert!(request.priority.is_none());
        assert!(request.due.is_none());
    }

    #[test]
    fn allow_list_reports_valid_values() {
        let mut status = String::new();
        let err = bind(
            &bag(json!({ "status": "lost" })),
            &mut [&mut required("status", &mut status).one_of(STATUSES)],
        )
        .expect_err("not allowed");

        assert_eq!(
            err.errors()[0],
            BindError::NotAllowed {
                key: "status".into(),
                value: "lost".into(),
                allowed: vec!["open".into(), "closed".into()],
            }
        );
        assert!(status.is_empty());
    }

    #[test]
    fn allow_list_applies_to_each_element() {
        let mut statuses: Vec<String> = Vec::new();
        bind(
            &bag(json!({ "status": ["open", "closed"] })),
            &mut [&mut optional("status", &mut statuses).each_one_of(STATUSES)],
        )
        .unwrap();
        assert_eq!(statuses, ["open", "closed"]);

        let mut rejected: Vec<String> = Vec::new();
        let err = bind(
            &bag(json!({ "status": ["open", "pending"] })),
            &mut [&mut optional("status", &mut rejected).each_one_of(STATUSES)],
        )
        .expect_err("pending is not allowed");
        assert_eq!(err.errors()[0].key(), Some("status[1]"));
        assert!(rejected.is_empty());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let mut progress: Option<u8> = None;
        bind(
            &bag(json!({ "progress": 100 })),
            &mut [&mut optional_ptr("progress", &mut progress).in_range(0..=100)],
        )
        .unwrap();
        assert_eq!(progress, Some(100));

        let mut rejected: Option<u8> = None;
        let err = bind(
            &bag(json!({ "progress": 101 })),
            &mut [&mut optional_ptr("progress", &mut rejected).in_range(0..=100)],
        )
        .expect_err("above the maximum");
        assert_eq!(
            err.errors()[0],
            BindError::NotInRange {
                key: "progress".into(),
                value: "101".into(),
                min: "0".into(),
                max: "100".into(),
            }
        );
        assert_eq!(
            err.to_string(),
            "parameter `progress` value 101 must be between 0 and 100"
        );
        assert!(rejected.is_none());
    }

    #[test]
    fn numeric_allow_list() {
        let mut page_size = 0_u32;
        bind(
            &bag(json!({ "pageSize": 50 })),
            &mut [&mut required("pageSize", &mut page_size).one_of(&[10_u32, 50, 100])],
        )
        .unwrap();
        assert_eq!(page_size, 50);
    }
}
