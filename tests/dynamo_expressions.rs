use pretty_assertions::assert_eq;
use vtlbuilder::appsync::ctx;
use vtlbuilder::dynamo::{
    Condition, KeyCondition, Operand, Path, Query, SetValue, Ttl, Update, UpdateItem,
    MAX_IN_ALTERNATIVES,
};
use vtlbuilder::{request_template, Builder, Error, Profile, Var};

// ── Placeholder allocation ──

#[test]
fn set_if_not_exists_registers_one_name_and_one_value() {
    let mut b = Builder::new(Profile::V2017_02_28);
    let resolved = Update::new()
        .set("path", SetValue::if_not_exists(ctx().arg("value")))
        .resolve(&mut b)
        .unwrap();
    assert_eq!(resolved.expression, "SET #path=if_not_exists(#path,:arg0)");
    assert_eq!(resolved.names.get("#path").map(String::as_str), Some("path"));
    assert_eq!(
        b.render_expr(&resolved.values[":arg0"]),
        "${util.dynamodb.toDynamoDBJson(${ctx.args.value})}"
    );
}

#[test]
fn independently_built_operands_with_equal_text_share_a_placeholder() {
    let mut b = Builder::new(Profile::V2018_05_29);
    let cond = Condition::eq(Path::attr("owner"), Var::named("ctx.identity.sub"))
        .or(Condition::eq(Path::attr("editor"), Var::named("ctx.identity.sub")))
        .and(Condition::ne(Path::attr("state"), Operand::value("locked")))
        .and(Condition::ne(Path::attr("stage"), Operand::value("locked")));
    let resolved = cond.resolve(&mut b).unwrap();
    assert_eq!(
        resolved.expression,
        "(((#owner = :arg0) OR (#editor = :arg0)) AND (#state <> :arg1)) AND (#stage <> :arg1)"
    );
    assert_eq!(resolved.values.len(), 2);
    assert_eq!(resolved.names.len(), 4);
}

#[test]
fn separate_compilations_restart_numbering() {
    let mut b = Builder::new(Profile::V2018_05_29);
    let first = Condition::eq(Path::attr("a"), Operand::value(1)).resolve(&mut b).unwrap();
    let second = Condition::eq(Path::attr("b"), Operand::value(2)).resolve(&mut b).unwrap();
    assert_eq!(first.expression, "#a = :arg0");
    assert_eq!(second.expression, "#b = :arg0");
}

#[test]
fn in_rejects_too_many_alternatives() {
    let err = Condition::is_in("id", (0..=MAX_IN_ALTERNATIVES).map(Operand::value)).unwrap_err();
    assert!(matches!(err, Error::TooManyAlternatives { .. }));
    assert_eq!(
        err.to_string(),
        "IN condition has 101 alternatives, at most 100 are allowed"
    );
}

#[test]
fn size_and_contains() {
    let mut b = Builder::new(Profile::V2017_02_28);
    let resolved = Condition::le(Operand::size("tags"), Operand::value(5))
        .and(Condition::contains("tags", Operand::value("rust")).negate())
        .resolve(&mut b)
        .unwrap();
    assert_eq!(
        resolved.expression,
        "(size(#tags) <= :arg0) AND (NOT (contains(#tags, :arg1)))"
    );
    assert_eq!(resolved.names.len(), 1);
}

// ── Whole requests ──

#[test]
fn update_item_request() {
    let t = request_template(Profile::V2018_05_29, |b| {
        let expires = Ttl::days(1).expr(b)?;
        let expires_at = b.variable(expires)?;
        UpdateItem::new(
            Update::new()
                .set("title", ctx().arg("title"))
                .set("expiresAt", &expires_at)
                .set("version", SetValue::add(Path::attr("version"), Operand::value(1))),
        )
        .key("id", ctx().arg("id"))
        .condition(Condition::attribute_exists("id"))
        .emit(b)
    })
    .unwrap();

    assert_eq!(
        t,
        r##"#set($var0 = (${util.time.nowEpochMilliSeconds()} + 86400000))
{
  "version": "2018-05-29",
  "operation": "UpdateItem",
  "key": {
    "id": ${ctx.args.id}
  },
  "update": {
    "expression": "SET #title=:arg0, #expiresAt=:arg1, #version=#version+:arg2",
    "expressionNames": {
      "#title": "title",
      "#expiresAt": "expiresAt",
      "#version": "version"
    },
    "expressionValues": {
      ":arg0": ${util.toJson(${util.dynamodb.toDynamoDB(${ctx.args.title})})},
      ":arg1": ${util.toJson(${util.dynamodb.toDynamoDB(${var0})})},
      ":arg2": ${util.toJson(${util.dynamodb.toDynamoDB(1)})}
    }
  },
  "condition": {
    "expression": "attribute_exists(#id)",
    "expressionNames": {
      "#id": "id"
    }
  }
}"##
    );
}

#[test]
fn query_request_under_older_profile_keeps_json_commas() {
    let t = request_template(Profile::V2017_02_28, |b| {
        Query::new(
            KeyCondition::eq("pk", ctx().identity().sub())
                .and(KeyCondition::between("sk", "A", "M")),
        )
        .scan_index_forward(false)
        .emit(b)
    })
    .unwrap();

    assert_eq!(
        t,
        r##"{
  "version": "2017-02-28",
  "operation": "Query",
  "query": {
    "expression": "(#pk = :arg0) AND (#sk BETWEEN :arg1 AND :arg2)",
    "expressionNames": {
      "#pk": "pk",
      "#sk": "sk"
    },
    "expressionValues": {
      ":arg0": ${util.dynamodb.toDynamoDBJson(${ctx.identity.sub})},
      ":arg1": ${util.dynamodb.toDynamoDBJson("A")},
      ":arg2": ${util.dynamodb.toDynamoDBJson("M")}
    }
  },
  "scanIndexForward": false
}"##
    );
}
