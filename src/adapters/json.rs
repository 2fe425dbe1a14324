//! Reference [`SerialAdapter`] over a JSON document model.
//!
//! The serial object is a [`serde_json::Value`]; wire bytes are the UTF-8
//! JSON encoding. Argument elements are validated against their declared
//! [`Shape`] before being decoded, which keeps the integer/float distinction
//! that a plain serde decode would coerce away.

use crate::adapter::{ArgList, SerialAdapter};
use crate::error::{ErrorKind, Result, RpcError};
use crate::packed::PackedCall;
use crate::types::{RpcType, Shape};
use serde_json::{Map, Value};
use std::any::type_name;

pub struct JsonAdapter;

impl SerialAdapter for JsonAdapter {
    type SerialObject = Value;

    fn to_bytes(obj: Value) -> Result<Vec<u8>> {
        serde_json::to_vec(&obj)
            .map_err(|err| RpcError::new(ErrorKind::Serialization, err.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Option<Value> {
        let obj: Value = serde_json::from_slice(bytes).ok()?;
        let fields = obj.as_object()?;

        if let Some(except_type) = fields.get("except_type") {
            let code = except_type.as_i64()?;
            if code != 0 && !fields.contains_key("err_mesg") {
                return None;
            }
            // Objects recording an exception can be otherwise empty.
            return Some(obj);
        }

        match fields.get("func_name") {
            Some(Value::String(name)) if !name.is_empty() => {}
            _ => return None,
        }

        if !fields.get("args")?.is_array() {
            return None;
        }

        Some(obj)
    }

    fn empty_object() -> Value {
        Value::Object(Map::new())
    }

    fn push_arg<T: RpcType>(value: &T) -> Result<Value> {
        serde_json::to_value(value)
            .map_err(|err| RpcError::new(ErrorKind::Serialization, err.to_string()))
    }

    fn parse_arg<T: RpcType>(obj: &Value) -> Result<T> {
        validate_shape(&T::SHAPE, obj).map_err(|mismatch| {
            RpcError::new(
                ErrorKind::SignatureMismatch,
                format!("{mismatch} (while parsing {})", type_name::<T>()),
            )
        })?;

        serde_json::from_value(obj.clone())
            .map_err(|err| RpcError::new(ErrorKind::Deserialization, err.to_string()))
    }

    fn serialize_pack<R, A>(pack: &PackedCall<R, A>) -> Result<Value>
    where
        R: RpcType,
        A: ArgList<Self>,
    {
        let mut args = Vec::with_capacity(A::ARITY);
        pack.args().push_all(&mut args)?;

        let mut fields = Map::new();
        fields.insert("func_name".to_owned(), pack.func_name().into());
        fields.insert("args".to_owned(), Value::Array(args));

        if let Some(error) = pack.error() {
            fields.insert("except_type".to_owned(), error.kind().code().into());
            fields.insert("err_mesg".to_owned(), error.message().into());
        } else if R::UNIT.is_none() {
            if let Some(result) = pack.result() {
                fields.insert("result".to_owned(), Self::push_arg(result)?);
            }
        }

        Ok(Value::Object(fields))
    }

    fn deserialize_pack<R, A>(obj: &Value) -> Result<PackedCall<R, A>>
    where
        R: RpcType,
        A: ArgList<Self>,
    {
        let func_name = Self::get_func_name(obj)?;

        let elements = obj
            .get("args")
            .and_then(Value::as_array)
            .ok_or_else(|| missing_field("args"))?;
        let args = A::parse_all(elements)?;

        let mut pack = PackedCall::<R, A>::new(func_name, args);

        if R::UNIT.is_none() {
            if let Some(result) = obj.get("result").filter(|value| !value.is_null()) {
                pack.set_result(Self::parse_arg::<R>(result)?);
            }
        }

        if let Some(except_type) = obj.get("except_type") {
            let code = except_type
                .as_i64()
                .ok_or_else(|| malformed_exception(except_type))?;
            if code != 0 {
                let kind = ErrorKind::from_code(code)
                    .ok_or_else(|| malformed_exception(except_type))?;
                let mesg = obj
                    .get("err_mesg")
                    .and_then(Value::as_str)
                    .ok_or_else(|| missing_field("err_mesg"))?;
                pack.set_error(RpcError::new(kind, mesg));
            }
        }

        Ok(pack)
    }

    fn get_func_name(obj: &Value) -> Result<String> {
        obj.get("func_name")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| missing_field("func_name"))
    }

    fn extract_exception(obj: &Value) -> Option<RpcError> {
        let code = obj.get("except_type")?.as_i64()?;
        if code == 0 {
            return None;
        }

        let mesg = obj
            .get("err_mesg")
            .and_then(Value::as_str)
            .unwrap_or_default();

        match ErrorKind::from_code(code) {
            Some(kind) => Some(RpcError::new(kind, mesg)),
            None => Some(RpcError::new(
                ErrorKind::Deserialization,
                format!("unknown exception code {code}"),
            )),
        }
    }

    fn set_exception(obj: &mut Value, error: &RpcError) {
        if let Some(fields) = obj.as_object_mut() {
            fields.insert("except_type".to_owned(), error.kind().code().into());
            fields.insert("err_mesg".to_owned(), error.message().into());
        }
    }
}

fn missing_field(field: &str) -> RpcError {
    RpcError::new(
        ErrorKind::Deserialization,
        format!("RPC object is missing the \"{field}\" field"),
    )
}

fn malformed_exception(value: &Value) -> RpcError {
    RpcError::new(
        ErrorKind::Deserialization,
        format!("invalid \"except_type\" field: {value}"),
    )
}

/// Checks a decoded value against the expected wire shape, reporting the
/// innermost mismatch.
fn validate_shape(shape: &Shape, value: &Value) -> std::result::Result<(), String> {
    let fail = |expected: &str| {
        Err(format!(
            "json expected type: {expected}, got type: {}",
            json_type_name(value)
        ))
    };

    match shape {
        Shape::Bool if value.is_boolean() => Ok(()),
        Shape::Bool => fail("boolean"),
        Shape::Int if value.is_i64() || value.is_u64() => Ok(()),
        Shape::Int => fail("integer"),
        Shape::Float if value.is_f64() => Ok(()),
        Shape::Float => fail("float"),
        Shape::Text if value.is_string() => Ok(()),
        Shape::Text => fail("string"),
        Shape::Unit if value.is_null() => Ok(()),
        Shape::Unit => fail("null"),
        Shape::Seq(element) => match value.as_array() {
            Some(items) => items
                .iter()
                .try_for_each(|item| validate_shape(element, item)),
            None => fail("array"),
        },
        Shape::Tuple(elements) => match value.as_array() {
            Some(items) if items.len() == elements.len() => elements
                .iter()
                .zip(items)
                .try_for_each(|(shape, item)| validate_shape(shape, item)),
            Some(items) => Err(format!(
                "json expected array of length {}, got length {}",
                elements.len(),
                items.len()
            )),
            None => fail("array"),
        },
        Shape::Object if !value.is_null() => Ok(()),
        Shape::Object => fail("object"),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roundtrip(value: Value) -> Option<Value> {
        JsonAdapter::from_bytes(&JsonAdapter::to_bytes(value).unwrap())
    }

    #[test]
    fn structural_validation() {
        // Success-shaped objects need a non-empty func_name and an args array.
        assert!(roundtrip(json!({"func_name": "F", "args": []})).is_some());
        assert!(roundtrip(json!({"func_name": "", "args": []})).is_none());
        assert!(roundtrip(json!({"func_name": 3, "args": []})).is_none());
        assert!(roundtrip(json!({"func_name": "F"})).is_none());
        assert!(roundtrip(json!({"func_name": "F", "args": {}})).is_none());
        assert!(roundtrip(json!([1, 2, 3])).is_none());
        assert!(JsonAdapter::from_bytes(b"not json at all").is_none());

        // Exception objects can be otherwise empty, but a non-zero code
        // requires a message.
        assert!(roundtrip(json!({"except_type": 9, "err_mesg": "oops"})).is_some());
        assert!(roundtrip(json!({"except_type": 9})).is_none());
        assert!(roundtrip(json!({"except_type": 0})).is_some());
    }

    #[test]
    fn strict_scalar_parsing() {
        assert_eq!(JsonAdapter::parse_arg::<i64>(&json!(7)).unwrap(), 7);
        assert_eq!(JsonAdapter::parse_arg::<f64>(&json!(2.5)).unwrap(), 2.5);

        let err = JsonAdapter::parse_arg::<i64>(&json!(2.5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SignatureMismatch);
        assert!(err.message().contains("expected type: integer"));

        let err = JsonAdapter::parse_arg::<f64>(&json!(7)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SignatureMismatch);
        assert!(err.message().contains("expected type: float"));

        let err = JsonAdapter::parse_arg::<String>(&json!(7)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SignatureMismatch);
    }

    #[test]
    fn nested_containers_validate_per_element() {
        let ok = JsonAdapter::parse_arg::<Vec<Vec<i64>>>(&json!([[1, 2], [3]])).unwrap();
        assert_eq!(ok, vec![vec![1, 2], vec![3]]);

        let err = JsonAdapter::parse_arg::<Vec<f64>>(&json!([1.5, 2])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SignatureMismatch);

        let err = JsonAdapter::parse_arg::<(i64, String)>(&json!([1, 2])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SignatureMismatch);

        let err = JsonAdapter::parse_arg::<(i64, String)>(&json!([1, "x", true])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SignatureMismatch);
        assert!(err.message().contains("length"));
    }

    #[test]
    fn pack_round_trip() {
        let mut pack =
            PackedCall::<i64, (i64, String)>::new("Describe", (4, String::from("tag")));
        pack.set_result(11);

        let obj = JsonAdapter::serialize_pack(&pack).unwrap();
        let restored: PackedCall<i64, (i64, String)> =
            JsonAdapter::deserialize_pack(&obj).unwrap();

        assert_eq!(restored, pack);
        assert_eq!(
            JsonAdapter::to_bytes(obj).unwrap(),
            JsonAdapter::to_bytes(JsonAdapter::serialize_pack(&restored).unwrap()).unwrap(),
        );
    }

    #[test]
    fn request_packs_omit_result_and_error_fields() {
        let pack = PackedCall::<i64, (i64,)>::new("Fibonacci", (10,));
        let obj = JsonAdapter::serialize_pack(&pack).unwrap();
        assert_eq!(obj, json!({"func_name": "Fibonacci", "args": [10]}));
    }

    #[test]
    fn unit_result_is_elided() {
        let mut pack = PackedCall::<(), (Vec<i64>,)>::new("Touch", (vec![1],));
        pack.set_result(());
        let obj = JsonAdapter::serialize_pack(&pack).unwrap();
        assert_eq!(obj, json!({"func_name": "Touch", "args": [[1]]}));

        let restored: PackedCall<(), (Vec<i64>,)> = JsonAdapter::deserialize_pack(&obj).unwrap();
        assert!(restored.is_success());
    }

    #[test]
    fn error_round_trip_preserves_kind_and_message() {
        let mut pack = PackedCall::<i64, (i64,)>::new("Fibonacci", (10,));
        pack.set_error(RpcError::new(ErrorKind::RemoteExecution, "stack depth"));

        let obj = JsonAdapter::serialize_pack(&pack).unwrap();
        assert_eq!(
            JsonAdapter::extract_exception(&obj),
            Some(RpcError::new(ErrorKind::RemoteExecution, "stack depth"))
        );

        let restored: PackedCall<i64, (i64,)> = JsonAdapter::deserialize_pack(&obj).unwrap();
        let err = restored.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteExecution);
        assert_eq!(err.message(), "stack depth");
    }

    #[test]
    fn set_exception_overwrites_in_place() {
        let mut obj = json!({"func_name": "F", "args": []});
        JsonAdapter::set_exception(
            &mut obj,
            &RpcError::new(ErrorKind::FunctionNotFound, "no such function"),
        );
        assert_eq!(obj["except_type"], json!(1));
        assert_eq!(obj["err_mesg"], json!("no such function"));
        assert_eq!(obj["func_name"], json!("F"));
    }

    #[test]
    fn arity_mismatch_is_a_signature_error() {
        let obj = json!({"func_name": "SimpleSum", "args": [1, 2, 3]});
        let err = JsonAdapter::deserialize_pack::<i64, (i64, i64)>(&obj).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SignatureMismatch);
        assert!(err.message().contains("expected 2, got 3"));
    }
}
