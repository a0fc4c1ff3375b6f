//! BSON <-> record conversion

use mongodb::bson::{Bson, Document};
use wrangle_core::{FieldValue, Fields, ValidationError};

pub fn bson_to_value(value: Bson) -> FieldValue {
    match value {
        Bson::Null | Bson::Undefined => FieldValue::Null,
        Bson::Boolean(b) => FieldValue::Bool(b),
        Bson::Int32(n) => FieldValue::Int(i64::from(n)),
        Bson::Int64(n) => FieldValue::Int(n),
        Bson::Double(x) => FieldValue::Float(x),
        Bson::String(s) => FieldValue::Text(s),
        Bson::ObjectId(oid) => FieldValue::Text(oid.to_hex()),
        Bson::DateTime(dt) => FieldValue::Text(
            dt.try_to_rfc3339_string()
                .unwrap_or_else(|_| dt.timestamp_millis().to_string()),
        ),
        Bson::Array(items) => FieldValue::List(items.into_iter().map(bson_to_value).collect()),
        Bson::Document(doc) => FieldValue::Map(document_to_fields(doc)),
        other => FieldValue::Text(other.to_string()),
    }
}

pub fn value_to_bson(value: FieldValue) -> Bson {
    match value {
        FieldValue::Null => Bson::Null,
        FieldValue::Bool(b) => Bson::Boolean(b),
        FieldValue::Int(n) => match i32::try_from(n) {
            Ok(small) => Bson::Int32(small),
            Err(_) => Bson::Int64(n),
        },
        FieldValue::Float(x) => Bson::Double(x),
        FieldValue::Text(s) => Bson::String(s),
        FieldValue::List(items) => Bson::Array(items.into_iter().map(value_to_bson).collect()),
        FieldValue::Map(fields) => Bson::Document(fields_to_document(fields)),
    }
}

pub fn document_to_fields(doc: Document) -> Fields {
    doc.into_iter().map(|(k, v)| (k, bson_to_value(v))).collect()
}

pub fn fields_to_document(fields: Fields) -> Document {
    fields.into_iter().map(|(k, v)| (k, value_to_bson(v))).collect()
}

/// Field names the server would reject or interpret as operators.
pub fn check_field_names(fields: &Fields) -> Result<(), ValidationError> {
    for key in fields.keys() {
        let reason = if key.is_empty() {
            "field names cannot be empty"
        } else if key.starts_with('$') {
            "field names cannot start with '$'"
        } else if key.contains('.') {
            "field names cannot contain '.'"
        } else {
            continue;
        };
        return Err(ValidationError::InvalidFormat {
            field: "field name",
            reason,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, oid::ObjectId};

    #[test]
    fn object_id_becomes_hex_text() {
        let oid = ObjectId::new();
        let fields = document_to_fields(doc! { "_id": oid, "title": "Dune" });
        assert_eq!(fields.get("_id"), Some(&FieldValue::Text(oid.to_hex())));
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["_id", "title"]);
    }

    #[test]
    fn small_ints_are_stored_as_int32() {
        assert_eq!(value_to_bson(FieldValue::Int(42)), Bson::Int32(42));
        assert_eq!(
            value_to_bson(FieldValue::Int(5_000_000_000)),
            Bson::Int64(5_000_000_000)
        );
    }

    #[test]
    fn nested_documents_convert() {
        let doc = doc! { "addr": { "city": "Oslo", "zip": 150 }, "tags": ["a", true] };
        let fields = document_to_fields(doc.clone());
        assert_eq!(fields_to_document(fields), doc);
    }

    #[test]
    fn rejects_operator_field_names() {
        let fields: Fields = [("$set", 1i64)].into_iter().collect();
        assert!(check_field_names(&fields).is_err());
        let fields: Fields = [("a.b", 1i64)].into_iter().collect();
        assert!(check_field_names(&fields).is_err());
        let fields: Fields = [("title", "ok")].into_iter().collect();
        assert!(check_field_names(&fields).is_ok());
    }
}
