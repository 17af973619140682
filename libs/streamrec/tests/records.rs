use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use streamrec::codec::{self, CodecRegistry};
use streamrec::config::CodecsConfig;
use streamrec::{
    Event, EventError, FieldRef, FieldType, RawMessage, Record, ScalarType, SerializationError,
};

#[derive(Event, Debug, PartialEq, Serialize, Deserialize)]
#[event(serializer = "json")]
struct Order {
    amount: i64,
    currency: String,
}

#[derive(Event)]
#[event(serializer = "avro")]
struct AvroOrder {
    amount: i64,
}

#[derive(Event)]
#[event(base)]
#[allow(dead_code)]
struct Base {
    a: i64,
    b: String,
}

#[derive(Event)]
#[event(serializer = "json")]
#[allow(dead_code)]
struct Derived {
    #[event(extends)]
    base: Base,
    b: f64,
    c: bool,
}

#[derive(Event)]
#[event(serializer = "binary", name = "Payment")]
#[allow(dead_code)]
struct PaymentReceived {
    order_id: i64,
    #[event(rename = "amt")]
    amount: i64,
    memo: Option<String>,
    tags: Vec<String>,
    blob: Vec<u8>,
    #[event(ty = "timestamp")]
    settled_at: i64,
    #[event(ty = "decimal(10,2)")]
    fee: Option<String>,
}

#[derive(Event)]
#[event(serializer = "json")]
struct Heartbeat;

fn order_message(payload: &str) -> Arc<RawMessage> {
    Arc::new(RawMessage::new(payload).with_offset(7))
}

#[test]
fn order_from_message_and_back() {
    let record =
        Record::<Order>::from_message("k1", "orders", 0, order_message(r#"{"amount":100,"currency":"USD"}"#))
            .unwrap();

    assert_eq!(record.get("amount"), Some(&json!(100)));
    assert_eq!(record.get("currency"), Some(&json!("USD")));
    let request = record.request().unwrap();
    assert_eq!(request.key, "k1");
    assert_eq!(request.topic, "orders");
    assert_eq!(request.message.offset(), Some(7));

    let bytes = record.serialize().unwrap();
    let again = Record::<Order>::deserialize(&bytes).unwrap();
    assert_eq!(again.as_mapping(), record.as_mapping());
}

#[test]
fn order_missing_currency_fails() {
    let err = Record::<Order>::from_message("k1", "orders", 0, order_message(r#"{"amount":100}"#))
        .unwrap_err();
    let schema_err = err.as_schema().unwrap();
    assert_eq!(schema_err.missing(), ["currency"]);
    assert_eq!(err.to_string(), "Order missing required fields: currency");
}

#[test]
fn order_with_unknown_field_fails() {
    let err = Record::<Order>::from_message(
        "k1",
        "orders",
        0,
        order_message(r#"{"amount":100,"currency":"USD","coupon":"X"}"#),
    )
    .unwrap_err();
    assert_eq!(err.as_schema().unwrap().unexpected(), ["coupon"]);
}

#[test]
fn malformed_payload_is_decode_failure() {
    let err = Record::<Order>::from_message("k1", "orders", 0, order_message("not json")).unwrap_err();
    assert!(matches!(
        err,
        EventError::Serialization(SerializationError::DecodeFailed { ref serializer, .. }) if serializer == "json"
    ));
}

#[test]
fn unregistered_codec_fails_both_ways() {
    let record = Record::<AvroOrder>::from_pairs([("amount", 1)]).unwrap();
    assert!(matches!(
        record.serialize(),
        Err(SerializationError::UnknownSerializer { serializer: Some(ref id) }) if id == "avro"
    ));
    let err = Record::<AvroOrder>::deserialize(b"{\"amount\":1}").unwrap_err();
    assert!(matches!(
        err.as_serialization(),
        Some(SerializationError::UnknownSerializer { .. })
    ));
}

#[test]
fn extended_schema_merges_in_declaration_order() {
    let schema = Derived::schema();
    let names: Vec<&str> = schema.names().collect();
    assert_eq!(names, ["a", "b", "c"]);
    assert_eq!(schema.get("b").unwrap().field_type, FieldType::Scalar(ScalarType::Float64));

    let base = streamrec::schema::schema_of::<Base>();
    assert_eq!(base.get("b").unwrap().field_type, FieldType::Scalar(ScalarType::String));
    assert!(!base.contains("c"));
}

#[test]
fn derive_infers_types_and_honours_attributes() {
    assert_eq!(PaymentReceived::NAME, "Payment");
    assert_eq!(PaymentReceived::SERIALIZER, Some("binary"));

    let schema = PaymentReceived::schema();
    let names: Vec<&str> = schema.names().collect();
    assert_eq!(names, ["order_id", "amt", "memo", "tags", "blob", "settled_at", "fee"]);

    let memo = schema.get("memo").unwrap();
    assert!(memo.nullable);
    assert_eq!(memo.field_type, FieldType::Scalar(ScalarType::String));
    assert_eq!(schema.get("tags").unwrap().field_type, FieldType::Array(ScalarType::String));
    assert_eq!(schema.get("blob").unwrap().field_type, FieldType::Scalar(ScalarType::Bytes));
    assert_eq!(
        schema.get("settled_at").unwrap().field_type,
        FieldType::Scalar(ScalarType::Timestamp)
    );
    let fee = schema.get("fee").unwrap();
    assert!(fee.nullable);
    assert_eq!(
        fee.field_type,
        FieldType::Scalar(ScalarType::Decimal { precision: 10, scale: 2 })
    );
    assert_eq!(fee.field_type.to_string(), "decimal(10,2)");
}

#[test]
fn unit_record_has_empty_schema() {
    assert!(Heartbeat::schema().is_empty());
    let record = Record::<Heartbeat>::deserialize(b"{}").unwrap();
    assert_eq!(format!("{record:?}"), "<Heartbeat: >");
}

#[test]
fn binary_codec_round_trip() {
    let record = Record::<PaymentReceived>::from_pairs([
        ("order_id", json!(1)),
        ("amt", json!(250)),
        ("memo", json!(null)),
        ("tags", json!(["a", "b"])),
        ("blob", json!([0, 1, 2])),
        ("settled_at", json!(1_700_000_000_000_000_i64)),
        ("fee", json!("1.25")),
    ])
    .unwrap();
    let bytes = record.serialize().unwrap();
    assert!(bytes.iter().all(u8::is_ascii));
    let again = Record::<PaymentReceived>::deserialize(&bytes).unwrap();
    assert_eq!(again.as_mapping(), record.as_mapping());
}

#[test]
fn typed_view_round_trip() {
    let typed = Order { amount: 5, currency: "EUR".into() };
    let record = Record::<Order>::from_typed(&typed).unwrap();
    assert_eq!(format!("{record:?}"), r#"<Order: amount=5, currency="EUR">"#);
    assert_eq!(record.to_typed::<Order>().unwrap(), typed);
}

#[test]
fn join_expression_from_derived_descriptors() {
    let amount = Order::descriptor("amount").unwrap();
    let paid = PaymentReceived::descriptor("amt").unwrap();

    let expr = amount.clone() & paid.clone();
    assert_eq!(expr.left(), &FieldRef::of::<Order>("amount"));
    assert_eq!(expr.right(), &FieldRef::of::<PaymentReceived>("amt"));
    assert_eq!(expr.to_string(), "Order.amount = Payment.amt");

    let reversed = paid & amount;
    assert_ne!(expr, reversed);
}

#[test]
fn explicit_registry_overrides_global() {
    let registry: CodecRegistry = CodecsConfig::parse(
        r#"
        [[codecs]]
        name = "avro"
        kind = "json"
        "#,
    )
    .unwrap()
    .registry();

    let record = Record::<AvroOrder>::from_pairs([("amount", 3)]).unwrap();
    let bytes = record.serialize_with(&registry).unwrap();
    assert_eq!(bytes, br#"{"amount":3}"#);
    // The process-wide registry is untouched.
    assert!(!codec::global().contains("avro"));
}
