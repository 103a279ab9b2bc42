use super::date;
use crate::context::Context;
use crate::descriptor::{Kind, Value};
use crate::error::{Error, Result};
use core::str::FromStr;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Converts raw text into a value of `kind`.
///
/// `Ok(None)` means "leave the member at its default": empty text for a
/// non-nullable, non-string member. Empty text for a nullable member is
/// `Value::Null`.
pub(crate) fn coerce(
    member: &str,
    raw: &str,
    kind: Kind,
    nullable: bool,
    context: &Context,
) -> Result<Option<Value>> {
    if kind == Kind::String {
        return Ok(Some(if raw.is_empty() && nullable {
            Value::Null
        } else {
            Value::String(raw.to_owned())
        }));
    }

    let text = raw.trim();
    if text.is_empty() {
        return Ok(if nullable { Some(Value::Null) } else { None });
    }

    let parsed = match kind {
        Kind::Boolean => parse_bool(text).map(Value::Boolean),
        Kind::Integer => text.parse::<i128>().ok().map(Value::Integer),
        Kind::Floating => context
            .locale
            .normalize_number(text)
            .parse::<f64>()
            .ok()
            .map(Value::Floating),
        Kind::Decimal => parse_decimal(&context.locale.normalize_number(text)).map(Value::Decimal),
        Kind::Uuid => Uuid::parse_str(text).ok().map(Value::Uuid),
        Kind::DateTime => match context.date_format {
            Some(ref format) => format.parse(text),
            None => date::parse_default(text, &context.locale),
        }
        .map(Value::DateTime),
        Kind::String => Some(Value::String(text.to_owned())),
        Kind::Object | Kind::Sequence => {
            return Err(Error::UnsupportedMemberType {
                member: member.to_owned(),
                type_name: kind.to_string(),
            })
        }
    };

    match parsed {
        Some(value) => Ok(Some(value)),
        None => Err(Error::coercion(member, raw, kind)),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") || text == "1" {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") || text == "0" {
        Some(false)
    } else {
        None
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Locale;
    use chrono::NaiveDate;

    fn ok(raw: &str, kind: Kind, nullable: bool) -> Option<Value> {
        coerce("Member", raw, kind, nullable, &Context::default()).unwrap()
    }

    #[test]
    fn strings_pass_through() {
        assert_eq!(ok(" John ", Kind::String, false), Some(Value::String(" John ".into())));
        assert_eq!(ok("", Kind::String, false), Some(Value::String(String::new())));
        assert_eq!(ok("", Kind::String, true), Some(Value::Null));
    }

    #[test]
    fn empty_text_is_default_or_null() {
        for &kind in &[
            Kind::Boolean,
            Kind::Integer,
            Kind::Floating,
            Kind::Decimal,
            Kind::Uuid,
            Kind::DateTime,
        ] {
            assert_eq!(ok("", kind, false), None, "{}", kind);
            assert_eq!(ok("  ", kind, true), Some(Value::Null), "{}", kind);
        }
    }

    #[test]
    fn numbers() {
        assert_eq!(ok("28", Kind::Integer, false), Some(Value::Integer(28)));
        assert_eq!(
            ok("9223372036854775807", Kind::Integer, false),
            Some(Value::Integer(i128::from(i64::MAX)))
        );
        assert_eq!(ok("-1000", Kind::Integer, false), Some(Value::Integer(-1000)));
        assert_eq!(ok("2.5", Kind::Floating, false), Some(Value::Floating(2.5)));
        assert_eq!(
            ok("99.9999", Kind::Decimal, false),
            Some(Value::Decimal(Decimal::new(999_999, 4)))
        );
        assert_eq!(
            ok("1.5e3", Kind::Decimal, false),
            Some(Value::Decimal(Decimal::new(1500, 0)))
        );
    }

    #[test]
    fn numbers_follow_locale() {
        let context = Context::default().with_locale(
            Locale::invariant()
                .decimal_separator(',')
                .group_separator(Some('.')),
        );
        assert_eq!(
            coerce("Percent", "1.099,5", Kind::Floating, false, &context).unwrap(),
            Some(Value::Floating(1099.5))
        );

        let context = Context::default().with_locale(Locale::invariant().decimal_separator(','));
        assert_eq!(
            coerce("Percent", "99,5", Kind::Floating, false, &context).unwrap(),
            Some(Value::Floating(99.5))
        );
        assert_eq!(
            coerce("Percent", "99,9999", Kind::Decimal, false, &context).unwrap(),
            Some(Value::Decimal(Decimal::new(999_999, 4)))
        );
    }

    #[test]
    fn integers_reject_group_separators() {
        assert!(matches!(
            coerce("Age", "1,2", Kind::Integer, false, &Context::default()),
            Err(Error::CoercionFailure { .. })
        ));
        assert!(coerce("Age", "1,000", Kind::Integer, false, &Context::default()).is_err());
    }

    #[test]
    fn booleans_and_uuids() {
        assert_eq!(ok("False", Kind::Boolean, false), Some(Value::Boolean(false)));
        assert_eq!(ok("TRUE", Kind::Boolean, true), Some(Value::Boolean(true)));
        assert_eq!(ok("1", Kind::Boolean, false), Some(Value::Boolean(true)));
        assert_eq!(
            ok("AC1FC4BC-087A-4242-B8EE-C53EBE9887A5", Kind::Uuid, false),
            Some(Value::Uuid(
                Uuid::parse_str("ac1fc4bc-087a-4242-b8ee-c53ebe9887a5").unwrap()
            ))
        );
    }

    #[test]
    fn custom_date_format_is_strict() {
        let context = Context::default().with_date_format("dd.MM.yyyy HH:mm");
        let expected = NaiveDate::from_ymd_opt(2010, 2, 21)
            .unwrap()
            .and_hms_opt(9, 35, 0)
            .unwrap();
        assert_eq!(
            coerce("StartDate", "21.02.2010 09:35", Kind::DateTime, false, &context).unwrap(),
            Some(Value::DateTime(expected))
        );
        assert!(coerce("StartDate", "2010-02-21T09:35:00", Kind::DateTime, false, &context).is_err());
    }

    #[test]
    fn failures_name_member_and_text() {
        match coerce("Age", "twenty", Kind::Integer, false, &Context::default()) {
            Err(Error::CoercionFailure { member, raw, kind }) => {
                assert_eq!(member, "Age");
                assert_eq!(raw, "twenty");
                assert_eq!(kind, Kind::Integer);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(coerce("IsCool", "yes", Kind::Boolean, true, &Context::default()).is_err());
        assert!(coerce("Id", "12.5", Kind::Integer, true, &Context::default()).is_err());
    }

    #[test]
    fn nested_kinds_are_not_coerced() {
        match coerce("BestFriend", "x", Kind::Object, false, &Context::default()) {
            Err(Error::UnsupportedMemberType { member, type_name }) => {
                assert_eq!(member, "BestFriend");
                assert_eq!(type_name, "object");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
