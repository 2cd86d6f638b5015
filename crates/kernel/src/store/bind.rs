//! Bind SeaQuery values through sqlx arguments.

use chrono::NaiveDateTime;
use sea_query::{Value, Values};
use sqlx::{Arguments, Database, Encode, Type};

use super::StoreError;

/// Build driver arguments from rendered statement values, in order.
///
/// Integers of every width bind as `i64`, floats as `f64`, date-times as
/// naive timestamps. Types the list
/// engine never produces are refused rather than guessed at.
pub(super) fn arguments<'q, DB>(values: &Values) -> Result<DB::Arguments<'q>, StoreError>
where
    DB: Database,
    Option<bool>: Encode<'q, DB> + Type<DB>,
    Option<i64>: Encode<'q, DB> + Type<DB>,
    Option<f64>: Encode<'q, DB> + Type<DB>,
    Option<String>: Encode<'q, DB> + Type<DB>,
    Option<NaiveDateTime>: Encode<'q, DB> + Type<DB>,
{
    let mut args = <DB::Arguments<'q> as Default>::default();

    for value in &values.0 {
        let added = match value {
            Value::Bool(v) => args.add(*v),
            Value::TinyInt(v) => args.add(v.map(i64::from)),
            Value::SmallInt(v) => args.add(v.map(i64::from)),
            Value::Int(v) => args.add(v.map(i64::from)),
            Value::BigInt(v) => args.add(*v),
            Value::TinyUnsigned(v) => args.add(v.map(i64::from)),
            Value::SmallUnsigned(v) => args.add(v.map(i64::from)),
            Value::Unsigned(v) => args.add(v.map(i64::from)),
            Value::BigUnsigned(v) => {
                let converted = v
                    .map(i64::try_from)
                    .transpose()
                    .map_err(|_| StoreError::Bind(format!("{v:?} exceeds i64")))?;
                args.add(converted)
            }
            Value::Float(v) => args.add(v.map(f64::from)),
            Value::Double(v) => args.add(*v),
            Value::String(v) => args.add(v.as_deref().cloned()),
            Value::Char(v) => args.add(v.map(String::from)),
            Value::ChronoDateTime(v) => args.add(v.as_deref().copied()),
            other => return Err(StoreError::Bind(format!("{other:?}"))),
        };
        added.map_err(|e| StoreError::Bind(e.to_string()))?;
    }

    Ok(args)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sqlx::Sqlite;

    #[test]
    fn binds_every_value_the_engine_produces() {
        let values = Values(vec![
            Value::Bool(Some(true)),
            Value::Int(Some(4)),
            Value::BigInt(Some(-1)),
            Value::BigUnsigned(Some(10)),
            Value::Double(Some(1.5)),
            Value::String(Some(Box::new("x".to_string()))),
            Value::String(None),
            Value::ChronoDateTime(Some(Box::new(
                chrono::NaiveDate::from_ymd_opt(2024, 5, 5)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            ))),
        ]);
        let args = arguments::<Sqlite>(&values).unwrap();
        assert_eq!(args.len(), 8);
    }

    #[test]
    fn refuses_out_of_range_unsigned() {
        let values = Values(vec![Value::BigUnsigned(Some(u64::MAX))]);
        assert!(matches!(
            arguments::<Sqlite>(&values),
            Err(StoreError::Bind(_))
        ));
    }

    #[test]
    fn refuses_unsupported_values() {
        let values = Values(vec![Value::Bytes(Some(Box::new(vec![1, 2])))]);
        assert!(matches!(
            arguments::<Sqlite>(&values),
            Err(StoreError::Bind(_))
        ));
    }
}
