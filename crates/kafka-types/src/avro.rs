//! Avro → JSON conversion.
//!
//! Decoded Avro values are turned into JSON so that every deserialization
//! strategy produces the same kind of output. Logical types are rendered in
//! their calendar form instead of the underlying integer.

use apache_avro::types::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeDelta, Utc};
use serde_json::{json, Map, Value as JsonValue};

pub fn avro_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Int(i) => json!(i),
        Value::Long(l) => json!(l),
        Value::Float(f) => json!(f),
        Value::Double(d) => json!(d),
        Value::Bytes(b) | Value::Fixed(_, b) => JsonValue::String(hex::encode(b)),
        Value::String(s) | Value::Enum(_, s) => JsonValue::String(s.clone()),
        Value::Union(_, inner) => avro_to_json(inner),
        Value::Array(items) => JsonValue::Array(items.iter().map(avro_to_json).collect()),
        Value::Map(entries) => {
            // HashMap iteration order is arbitrary
            let mut keys: Vec<&String> = entries.keys().collect();
            keys.sort();
            let map: Map<String, JsonValue> = keys
                .into_iter()
                .map(|k| (k.clone(), avro_to_json(&entries[k])))
                .collect();
            JsonValue::Object(map)
        }
        Value::Record(fields) => {
            let map: Map<String, JsonValue> = fields
                .iter()
                .map(|(k, v)| (k.clone(), avro_to_json(v)))
                .collect();
            JsonValue::Object(map)
        }
        Value::Date(days) => date_from_days(*days)
            .map(|d| JsonValue::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or_else(|| json!(days)),
        Value::TimeMillis(ms) => {
            time_from_micros(i64::from(*ms) * 1_000).unwrap_or_else(|| json!(ms))
        }
        Value::TimeMicros(us) => time_from_micros(*us).unwrap_or_else(|| json!(us)),
        Value::TimestampMillis(ms) => DateTime::<Utc>::from_timestamp_millis(*ms)
            .map(utc_to_json)
            .unwrap_or_else(|| json!(ms)),
        Value::TimestampMicros(us) => DateTime::<Utc>::from_timestamp_micros(*us)
            .map(utc_to_json)
            .unwrap_or_else(|| json!(us)),
        Value::TimestampNanos(ns) => utc_to_json(DateTime::<Utc>::from_timestamp_nanos(*ns)),
        Value::LocalTimestampMillis(ms) => DateTime::<Utc>::from_timestamp_millis(*ms)
            .map(|dt| naive_to_json(dt.naive_utc()))
            .unwrap_or_else(|| json!(ms)),
        Value::LocalTimestampMicros(us) => DateTime::<Utc>::from_timestamp_micros(*us)
            .map(|dt| naive_to_json(dt.naive_utc()))
            .unwrap_or_else(|| json!(us)),
        Value::LocalTimestampNanos(ns) => {
            naive_to_json(DateTime::<Utc>::from_timestamp_nanos(*ns).naive_utc())
        }
        Value::Decimal(d) => match <Vec<u8>>::try_from(d) {
            Ok(bytes) => JsonValue::String(hex::encode(bytes)),
            Err(_) => JsonValue::Null,
        },
        Value::BigDecimal(d) => JsonValue::String(d.to_string()),
        Value::Uuid(u) => JsonValue::String(u.to_string()),
        Value::Duration(d) => json!({
            "months": u32::from(d.months()),
            "days": u32::from(d.days()),
            "millis": u32::from(d.millis()),
        }),
    }
}

fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(TimeDelta::days(i64::from(days)))
}

fn time_from_micros(micros: i64) -> Option<JsonValue> {
    let secs = u32::try_from(micros.div_euclid(1_000_000)).ok()?;
    let nanos = u32::try_from(micros.rem_euclid(1_000_000) * 1_000).ok()?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)?;
    Some(JsonValue::String(time.format("%H:%M:%S%.f").to_string()))
}

fn utc_to_json(dt: DateTime<Utc>) -> JsonValue {
    JsonValue::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn naive_to_json(dt: NaiveDateTime) -> JsonValue {
    JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_is_rendered_as_calendar_date() {
        assert_eq!(avro_to_json(&Value::Date(0)), json!("1970-01-01"));
        assert_eq!(avro_to_json(&Value::Date(1)), json!("1970-01-02"));
        assert_eq!(avro_to_json(&Value::Date(-1)), json!("1969-12-31"));
    }

    #[test]
    fn test_timestamp_millis_is_rfc3339_utc() {
        assert_eq!(
            avro_to_json(&Value::TimestampMillis(1_000)),
            json!("1970-01-01T00:00:01Z")
        );
        assert_eq!(
            avro_to_json(&Value::TimestampMillis(1_500)),
            json!("1970-01-01T00:00:01.500Z")
        );
    }

    #[test]
    fn test_time_millis() {
        assert_eq!(
            avro_to_json(&Value::TimeMillis(3_723_000)),
            json!("01:02:03")
        );
    }

    #[test]
    fn test_record_keeps_field_order() {
        let record = Value::Record(vec![
            ("zeta".to_string(), Value::Int(1)),
            ("alpha".to_string(), Value::String("a".to_string())),
        ]);
        assert_eq!(
            avro_to_json(&record).to_string(),
            r#"{"zeta":1,"alpha":"a"}"#
        );
    }

    #[test]
    fn test_union_collapses_to_branch() {
        let union = Value::Union(1, Box::new(Value::Long(7)));
        assert_eq!(avro_to_json(&union), json!(7));
        assert_eq!(
            avro_to_json(&Value::Union(0, Box::new(Value::Null))),
            JsonValue::Null
        );
    }

    #[test]
    fn test_bytes_are_hex() {
        assert_eq!(
            avro_to_json(&Value::Bytes(vec![0xde, 0xad])),
            json!("dead")
        );
    }
}
