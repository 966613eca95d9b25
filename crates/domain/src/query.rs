//! Filter and update expression helpers
//!
//! Pure construction of the JSON trees the query language expects. Nothing
//! here validates field names or operator applicability; the service is the
//! authority on query semantics.

/// Filter clause constructors.
///
/// Equality uses the implicit form (`{"field": value}`); every other
/// comparison uses its `$`-prefixed operator object.
pub mod filters {
    use serde_json::{json, Map, Value};

    /// `{field: value}` implicit equality.
    pub fn eq(field: &str, value: impl Into<Value>) -> Value {
        let mut outer = Map::with_capacity(1);
        outer.insert(field.to_string(), value.into());
        Value::Object(outer)
    }

    /// `{field: {"$ne": value}}`
    pub fn ne(field: &str, value: impl Into<Value>) -> Value {
        operator(field, "$ne", value.into())
    }

    /// `{field: {"$gt": value}}`
    pub fn gt(field: &str, value: impl Into<Value>) -> Value {
        operator(field, "$gt", value.into())
    }

    /// `{field: {"$gte": value}}`
    pub fn gte(field: &str, value: impl Into<Value>) -> Value {
        operator(field, "$gte", value.into())
    }

    /// `{field: {"$lt": value}}`
    pub fn lt(field: &str, value: impl Into<Value>) -> Value {
        operator(field, "$lt", value.into())
    }

    /// `{field: {"$lte": value}}`
    pub fn lte(field: &str, value: impl Into<Value>) -> Value {
        operator(field, "$lte", value.into())
    }

    /// `{field: {"$exists": flag}}`
    pub fn exists(field: &str, flag: bool) -> Value {
        operator(field, "$exists", Value::Bool(flag))
    }

    /// `{field: {"$in": values}}`
    pub fn in_(field: &str, values: Vec<Value>) -> Value {
        operator(field, "$in", Value::Array(values))
    }

    /// `{field: {"$nin": values}}`
    pub fn nin(field: &str, values: Vec<Value>) -> Value {
        operator(field, "$nin", Value::Array(values))
    }

    /// `{field: {"$all": values}}`
    pub fn all(field: &str, values: Vec<Value>) -> Value {
        operator(field, "$all", Value::Array(values))
    }

    /// `{field: {"$size": n}}`
    pub fn size(field: &str, n: u64) -> Value {
        operator(field, "$size", n.into())
    }

    /// `{"$and": [clauses...]}`
    pub fn and(clauses: Vec<Value>) -> Value {
        json!({ "$and": clauses })
    }

    /// `{"$or": [clauses...]}`
    pub fn or(clauses: Vec<Value>) -> Value {
        json!({ "$or": clauses })
    }

    /// `{"$not": clause}`
    pub fn not(clause: Value) -> Value {
        json!({ "$not": clause })
    }

    fn operator(field: &str, op: &str, value: Value) -> Value {
        let mut inner = Map::with_capacity(1);
        inner.insert(op.to_string(), value);
        let mut outer = Map::with_capacity(1);
        outer.insert(field.to_string(), Value::Object(inner));
        Value::Object(outer)
    }
}

/// Update clause constructors.
pub mod updates {
    use serde_json::{Map, Value};

    /// `{"$set": {field: value}}`
    pub fn set(field: &str, value: impl Into<Value>) -> Value {
        clause("$set", field, value.into())
    }

    /// `{"$unset": {field: ""}}`
    pub fn unset(field: &str) -> Value {
        clause("$unset", field, Value::String(String::new()))
    }

    /// `{"$inc": {field: amount}}`
    pub fn inc(field: &str, amount: i64) -> Value {
        clause("$inc", field, amount.into())
    }

    /// `{"$mul": {field: factor}}`
    pub fn mul(field: &str, factor: f64) -> Value {
        clause("$mul", field, Value::from(factor))
    }

    /// `{"$push": {field: value}}`
    pub fn push(field: &str, value: impl Into<Value>) -> Value {
        clause("$push", field, value.into())
    }

    /// `{"$pop": {field: 1 | -1}}`, `last` pops the tail, otherwise the head.
    pub fn pop(field: &str, last: bool) -> Value {
        let direction = if last { 1 } else { -1 };
        clause("$pop", field, Value::from(direction))
    }

    /// `{"$rename": {field: new_name}}`
    pub fn rename(field: &str, new_name: &str) -> Value {
        clause("$rename", field, Value::String(new_name.to_string()))
    }

    /// `{"$min": {field: value}}`
    pub fn min(field: &str, value: impl Into<Value>) -> Value {
        clause("$min", field, value.into())
    }

    /// `{"$max": {field: value}}`
    pub fn max(field: &str, value: impl Into<Value>) -> Value {
        clause("$max", field, value.into())
    }

    /// Merge several update clauses into one document, later operators
    /// augmenting earlier ones.
    pub fn combine(clauses: Vec<Value>) -> Value {
        let mut merged: Map<String, Value> = Map::new();
        for clause in clauses {
            if let Value::Object(map) = clause {
                for (op, fields) in map {
                    match (merged.get_mut(&op), fields) {
                        (Some(Value::Object(existing)), Value::Object(incoming)) => {
                            existing.extend(incoming);
                        }
                        (_, fields) => {
                            merged.insert(op, fields);
                        }
                    }
                }
            }
        }
        Value::Object(merged)
    }

    fn clause(op: &str, field: &str, value: Value) -> Value {
        let mut inner = Map::with_capacity(1);
        inner.insert(field.to_string(), value);
        let mut outer = Map::with_capacity(1);
        outer.insert(op.to_string(), Value::Object(inner));
        Value::Object(outer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn eq_uses_implicit_form() {
        assert_eq!(filters::eq("hello", 3), json!({"hello": 3}));
    }

    #[test]
    fn comparisons_use_operator_objects() {
        assert_eq!(filters::gt("age", 40), json!({"age": {"$gt": 40}}));
        assert_eq!(filters::exists("name", true), json!({"name": {"$exists": true}}));
        assert_eq!(
            filters::in_("kind", vec![json!("a"), json!("b")]),
            json!({"kind": {"$in": ["a", "b"]}})
        );
    }

    #[test]
    fn and_wraps_clauses() {
        let clause = filters::and(vec![filters::eq("a", 1), filters::gt("b", 2)]);
        assert_eq!(clause, json!({"$and": [{"a": 1}, {"b": {"$gt": 2}}]}));
    }

    #[test]
    fn combine_merges_same_operator_clauses() {
        let update = updates::combine(vec![
            updates::set("name", "x"),
            updates::set("age", 5),
            updates::inc("visits", 1),
        ]);
        assert_eq!(
            update,
            json!({"$set": {"name": "x", "age": 5}, "$inc": {"visits": 1}})
        );
    }

    #[test]
    fn pop_encodes_direction() {
        assert_eq!(updates::pop("tags", true), json!({"$pop": {"tags": 1}}));
        assert_eq!(updates::pop("tags", false), json!({"$pop": {"tags": -1}}));
    }
}
