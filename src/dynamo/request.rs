//! Request envelopes for the storage backend and for function data sources.
//!
//! Each request is written as one top-level document whose first two
//! fields are always `version` and `operation`. Key and attribute values are
//! placed exactly as given; wrap them with [`Builder::encode`] when the data
//! source expects typed values.

use tracing::debug;

use crate::builder::Builder;
use crate::dynamo::condition::{Condition, KeyCondition};
use crate::dynamo::update::Update;
use crate::error::Result;
use crate::value::{Value, Var};

type Fields = Vec<(String, Value)>;

fn envelope(b: &mut Builder, operation: &str, fields: Fields) -> Result<()> {
    let mut entries: Fields = vec![
        ("version".to_owned(), Value::from(b.profile().version())),
        ("operation".to_owned(), Value::from(operation)),
    ];
    entries.extend(fields);
    debug!(operation, fields = entries.len(), "emitting request envelope");
    b.literal(Value::Document(entries))?;
    Ok(())
}

fn key_field(key: Fields) -> (String, Value) {
    ("key".to_owned(), Value::Document(key))
}

fn condition_field(
    b: &mut Builder,
    condition: Option<Condition>,
) -> Result<Option<(String, Value)>> {
    condition
        .map(|c| Ok(("condition".to_owned(), c.resolve(b)?.into_value())))
        .transpose()
}

#[derive(Debug, Default)]
pub struct GetItem {
    key: Fields,
    consistent_read: bool,
}

impl GetItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.key.push((name.into(), value.into()));
        self
    }

    pub fn consistent_read(mut self, consistent: bool) -> Self {
        self.consistent_read = consistent;
        self
    }

    pub fn emit(self, b: &mut Builder) -> Result<()> {
        let mut fields = vec![key_field(self.key)];
        if self.consistent_read {
            fields.push(("consistentRead".to_owned(), Value::from(true)));
        }
        envelope(b, "GetItem", fields)
    }
}

/// `PutItem`. Attribute values are collected into a fresh map variable with
/// quiet `put` calls and converted with `toMapValuesJson`.
#[derive(Debug, Default)]
pub struct PutItem {
    key: Fields,
    projecting: Option<Var>,
    attributes: Fields,
    condition: Option<Condition>,
}

impl PutItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.key.push((name.into(), value.into()));
        self
    }

    /// Start the attribute map from an existing map, e.g. `ctx.args.input`.
    pub fn projecting(mut self, source: impl Into<Var>) -> Self {
        self.projecting = Some(source.into());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn emit(self, b: &mut Builder) -> Result<()> {
        let mut fields = vec![key_field(self.key)];

        if self.projecting.is_some() || !self.attributes.is_empty() {
            let values = match self.projecting {
                Some(source) => b.map(source)?,
                None => b.map(Value::empty_map())?,
            };
            for (name, value) in self.attributes {
                // left in place as a statement
                values.quiet().put(b, name, value)?;
            }
            let converted = b.helper("util.dynamodb", "toMapValuesJson", vec![values.into()])?;
            fields.push(("attributeValues".to_owned(), converted.into()));
        }

        if let Some(condition) = condition_field(b, self.condition)? {
            fields.push(condition);
        }
        envelope(b, "PutItem", fields)
    }
}

#[derive(Debug, Default)]
pub struct DeleteItem {
    key: Fields,
    condition: Option<Condition>,
}

impl DeleteItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.key.push((name.into(), value.into()));
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn emit(self, b: &mut Builder) -> Result<()> {
        let mut fields = vec![key_field(self.key)];
        if let Some(condition) = condition_field(b, self.condition)? {
            fields.push(condition);
        }
        envelope(b, "DeleteItem", fields)
    }
}

#[derive(Debug)]
pub struct UpdateItem {
    key: Fields,
    update: Update,
    condition: Option<Condition>,
}

impl UpdateItem {
    pub fn new(update: Update) -> Self {
        Self {
            key: Vec::new(),
            update,
            condition: None,
        }
    }

    pub fn key(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.key.push((name.into(), value.into()));
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn emit(self, b: &mut Builder) -> Result<()> {
        let update = self.update.resolve(b)?;
        let mut fields = vec![key_field(self.key), ("update".to_owned(), update.into_value())];
        if let Some(condition) = condition_field(b, self.condition)? {
            fields.push(condition);
        }
        envelope(b, "UpdateItem", fields)
    }
}

#[derive(Debug)]
pub struct Query {
    key_condition: KeyCondition,
    filter: Option<Condition>,
    index: Option<String>,
    limit: Option<Value>,
    next_token: Option<Value>,
    scan_forward: Option<bool>,
}

impl Query {
    pub fn new(key_condition: KeyCondition) -> Self {
        Self {
            key_condition,
            filter: None,
            index: None,
            limit: None,
            next_token: None,
            scan_forward: None,
        }
    }

    pub fn filter(mut self, filter: Condition) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    pub fn limit(mut self, limit: impl Into<Value>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn next_token(mut self, token: impl Into<Value>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    pub fn scan_index_forward(mut self, forward: bool) -> Self {
        self.scan_forward = Some(forward);
        self
    }

    pub fn emit(self, b: &mut Builder) -> Result<()> {
        let query = self.key_condition.resolve(b)?;
        let mut fields = vec![("query".to_owned(), query.into_value())];
        if let Some(index) = self.index {
            fields.push(("index".to_owned(), index.into()));
        }
        if let Some(limit) = self.limit {
            fields.push(("limit".to_owned(), limit));
        }
        if let Some(token) = self.next_token {
            fields.push(("nextToken".to_owned(), token));
        }
        if let Some(forward) = self.scan_forward {
            fields.push(("scanIndexForward".to_owned(), forward.into()));
        }
        if let Some(filter) = self.filter {
            fields.push(("filter".to_owned(), filter.resolve(b)?.into_value()));
        }
        envelope(b, "Query", fields)
    }
}

/// `Invoke` request for a function data source.
pub fn invoke(b: &mut Builder, payload: impl Into<Value>) -> Result<()> {
    envelope(b, "Invoke", vec![("payload".to_owned(), payload.into())])
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dynamo::Path;
    use crate::Profile;

    #[test]
    fn get_item_with_consistent_read() {
        let mut b = Builder::new(Profile::V2018_05_29);
        GetItem::new()
            .key("id", Var::named("ctx.args.id"))
            .consistent_read(true)
            .emit(&mut b)
            .unwrap();
        assert_eq!(
            b.finish(),
            [
                "{",
                "  \"version\": \"2018-05-29\",",
                "  \"operation\": \"GetItem\",",
                "  \"key\": {",
                "    \"id\": ${ctx.args.id}",
                "  },",
                "  \"consistentRead\": true",
                "}",
            ]
            .join("\n")
        );
    }

    #[test]
    fn put_item_collects_attributes_and_condition() {
        let mut b = Builder::new(Profile::V2017_02_28);
        PutItem::new()
            .key("id", Var::named("ctx.args.id"))
            .attribute("name", Var::named("ctx.args.name"))
            .condition(Condition::attribute_not_exists("id"))
            .emit(&mut b)
            .unwrap();
        assert_eq!(
            b.finish(),
            [
                "#set($var0 = { })",
                "$!{var0.put(\"name\", ${ctx.args.name})}",
                "{",
                "  \"version\": \"2017-02-28\",",
                "  \"operation\": \"PutItem\",",
                "  \"key\": {",
                "    \"id\": ${ctx.args.id}",
                "  },",
                "  \"attributeValues\": ${util.dynamodb.toMapValuesJson(${var0})},",
                "  \"condition\": {",
                "    \"expression\": \"attribute_not_exists(#id)\",",
                "    \"expressionNames\": {",
                "      \"#id\": \"id\"",
                "    }",
                "  }",
                "}",
            ]
            .join("\n")
        );
    }

    #[test]
    fn update_item_carries_its_expression() {
        let mut b = Builder::new(Profile::V2017_02_28);
        UpdateItem::new(Update::new().remove("draft"))
            .key("id", "fixed")
            .emit(&mut b)
            .unwrap();
        let out = b.finish();
        assert!(out.contains("\"operation\": \"UpdateItem\""));
        assert!(out.contains("\"expression\": \"REMOVE #draft\""));
        assert!(!out.contains("expressionValues"));
    }

    #[test]
    fn query_fields_follow_the_key_condition() {
        let mut b = Builder::new(Profile::V2018_05_29);
        Query::new(KeyCondition::eq("pk", "USER#1"))
            .index("byOwner")
            .limit(20)
            .filter(Condition::gt(Path::attr("age"), Var::named("ctx.args.age")))
            .emit(&mut b)
            .unwrap();
        let out = b.finish();
        let query = out.find("\"query\"").unwrap();
        let index = out.find("\"index\": \"byOwner\"").unwrap();
        let limit = out.find("\"limit\": 20").unwrap();
        let filter = out.find("\"filter\"").unwrap();
        assert!(query < index && index < limit && limit < filter);
        assert!(out.contains("\"expression\": \"#age > :arg0\""));
    }

    #[test]
    fn invoke_wraps_payload() {
        let mut b = Builder::new(Profile::V2018_05_29);
        invoke(&mut b, Value::map([("field", "getPost")])).unwrap();
        assert_eq!(
            b.finish(),
            "{\n  \"version\": \"2018-05-29\",\n  \"operation\": \"Invoke\",\n  \"payload\": {\n    \"field\": \"getPost\"\n  }\n}"
        );
    }

    #[test]
    fn maps_inside_payload_lists_keep_commas() {
        let mut b = Builder::new(Profile::V2017_02_28);
        let item = Value::map([("a", 1), ("b", 2)]);
        invoke(&mut b, Value::map([("items", Value::list([item]))])).unwrap();
        assert_eq!(
            b.finish(),
            [
                "{",
                "  \"version\": \"2017-02-28\",",
                "  \"operation\": \"Invoke\",",
                "  \"payload\": {",
                "    \"items\": [{",
                "      \"a\": 1,",
                "      \"b\": 2",
                "    }]",
                "  }",
                "}",
            ]
            .join("\n")
        );
    }

    #[test]
    fn plain_map_literals_still_follow_the_profile() {
        let mut b = Builder::new(Profile::V2017_02_28);
        let rows = Value::list([Value::map([("a", 1), ("b", 2)])]);
        b.variable(rows).unwrap();
        assert_eq!(
            b.finish(),
            "#set($var0 = [{\n  \"a\": 1\n  \"b\": 2\n}])"
        );
    }
}
