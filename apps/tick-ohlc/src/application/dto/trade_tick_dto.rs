//! Trade Tick DTO
//!
//! Candidate tick exactly as the feed sent it. Every field is optional and
//! loosely typed; `validate` decides whether it becomes a `TradeEvent`.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::trade::{MakerSide, TradeEvent, TradeId};

/// One element of the feed's `events` array.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TradeTickDto {
    /// Trade identifier (`tid`).
    #[serde(rename = "tid", default)]
    pub trade_id: Option<Value>,
    /// Price, as a number or numeric string.
    #[serde(default)]
    pub price: Option<Value>,
    /// Amount, as a number or numeric string.
    #[serde(default)]
    pub amount: Option<Value>,
    /// Maker side (`makerSide`).
    #[serde(rename = "makerSide", default)]
    pub maker_side: Option<Value>,
    /// Execution time in epoch milliseconds (`timestampms`).
    #[serde(rename = "timestampms", default)]
    pub timestamp_ms: Option<Value>,
}

impl TradeTickDto {
    /// Read a candidate from an arbitrary JSON value.
    ///
    /// Anything that is not a JSON object yields an empty candidate, which
    /// never validates.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Convert into a `TradeEvent`.
    ///
    /// Returns `None` when any of `tid`, `price`, `amount`, `makerSide` is
    /// missing, empty or zero, or when `timestampms` is not a number.
    #[must_use]
    pub fn validate(&self) -> Option<TradeEvent> {
        let trade_id = self.trade_id.as_ref().and_then(trade_id_field)?;
        let price = self.price.as_ref().and_then(decimal_field)?;
        let amount = self.amount.as_ref().and_then(decimal_field)?;
        let maker_side = self.maker_side.as_ref().and_then(maker_side_field)?;
        let timestamp_ms = self.timestamp_ms.as_ref().and_then(timestamp_field)?;

        Some(TradeEvent {
            trade_id,
            price,
            amount,
            maker_side,
            timestamp_ms,
        })
    }
}

fn trade_id_field(value: &Value) -> Option<TradeId> {
    match value {
        Value::String(s) if !s.is_empty() => Some(TradeId::new(s.as_str())),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(TradeId::new(n.to_string())),
        _ => None,
    }
}

fn maker_side_field(value: &Value) -> Option<MakerSide> {
    match value {
        Value::String(s) if !s.is_empty() => Some(MakerSide::new(s.as_str())),
        _ => None,
    }
}

fn decimal_field(value: &Value) -> Option<Decimal> {
    let parsed = match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }?;
    (!parsed.is_zero()).then_some(parsed)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

fn timestamp_field(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(floor_to_i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(floor_to_i64))
        }
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn floor_to_i64(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let floored = value.floor();
    (floored >= i64::MIN as f64 && floored < i64::MAX as f64).then_some(floored as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn tick(value: Value) -> TradeTickDto {
        TradeTickDto::from_value(value)
    }

    #[test]
    fn valid_tick_with_numeric_fields() {
        let event = tick(json!({
            "type": "trade",
            "tid": 5_375_547_515_u64,
            "price": 3632.54,
            "amount": 0.0027,
            "makerSide": "bid",
            "timestampms": 1_547_753_092_000_i64
        }))
        .validate()
        .unwrap();

        assert_eq!(event.trade_id.as_str(), "5375547515");
        assert_eq!(event.price, "3632.54".parse::<Decimal>().unwrap());
        assert_eq!(event.amount, "0.0027".parse::<Decimal>().unwrap());
        assert_eq!(event.maker_side.as_str(), "bid");
        assert_eq!(event.timestamp_ms, 1_547_753_092_000);
    }

    #[test]
    fn valid_tick_with_string_fields() {
        let event = tick(json!({
            "tid": "abc",
            "price": "10.5",
            "amount": "2",
            "makerSide": "ask",
            "timestampms": "60500.9"
        }))
        .validate()
        .unwrap();

        assert_eq!(event.price, Decimal::new(105, 1));
        assert_eq!(event.timestamp_ms, 60_500);
    }

    #[test_case(json!({"price": 1, "amount": 1, "makerSide": "bid", "timestampms": 1}) ; "missing tid")]
    #[test_case(json!({"tid": 0, "price": 1, "amount": 1, "makerSide": "bid", "timestampms": 1}) ; "zero tid")]
    #[test_case(json!({"tid": "", "price": 1, "amount": 1, "makerSide": "bid", "timestampms": 1}) ; "empty tid")]
    #[test_case(json!({"tid": 1, "price": 0, "amount": 1, "makerSide": "bid", "timestampms": 1}) ; "zero price")]
    #[test_case(json!({"tid": 1, "price": "0.00", "amount": 1, "makerSide": "bid", "timestampms": 1}) ; "zero price string")]
    #[test_case(json!({"tid": 1, "price": "abc", "amount": 1, "makerSide": "bid", "timestampms": 1}) ; "non numeric price")]
    #[test_case(json!({"tid": 1, "price": 1, "makerSide": "bid", "timestampms": 1}) ; "missing amount")]
    #[test_case(json!({"tid": 1, "price": 1, "amount": 1, "makerSide": "", "timestampms": 1}) ; "empty maker side")]
    #[test_case(json!({"tid": 1, "price": 1, "amount": 1, "makerSide": "bid"}) ; "missing timestamp")]
    #[test_case(json!({"tid": 1, "price": 1, "amount": 1, "makerSide": "bid", "timestampms": "soon"}) ; "non numeric timestamp")]
    #[test_case(json!({"tid": 1, "price": 1, "amount": 1, "makerSide": "bid", "timestampms": null}) ; "null timestamp")]
    fn invalid_ticks_are_rejected(value: Value) {
        assert!(tick(value).validate().is_none());
    }

    #[test]
    fn non_object_elements_never_validate() {
        assert_eq!(tick(json!(42)), TradeTickDto::default());
        assert_eq!(tick(json!([1, 1, 1, "bid", 1])), TradeTickDto::default());
        assert!(tick(json!("trade")).validate().is_none());
    }

    #[test]
    fn negative_epoch_is_accepted() {
        let event = tick(json!({
            "tid": 1, "price": 1, "amount": 1, "makerSide": "bid", "timestampms": -1500
        }))
        .validate()
        .unwrap();
        assert_eq!(event.timestamp_ms, -1500);
    }
}
