//! The `$util` helper catalog.
//!
//! Every helper is a plain invocation on a fixed namespace; nothing here
//! does more than name the method and pass its arguments along. Optional
//! trailing arguments that are `None` are left out of the call.
//!
//! ```
//! use vtlbuilder::{Builder, Profile};
//!
//! let mut b = Builder::new(Profile::V2018_05_29);
//! let id = b.util().auto_id().unwrap();
//! let now = b.util().time().now_iso8601().unwrap();
//! assert_eq!(b.render_expr(&id), "${util.autoId()}");
//! assert_eq!(b.render_expr(&now), "${util.time.nowISO8601()}");
//! ```

use crate::builder::Builder;
use crate::error::Result;
use crate::value::{Expr, Value};

fn call(
    b: &mut Builder,
    namespace: &str,
    method: &str,
    required: Vec<Value>,
    optional: Vec<Option<Value>>,
) -> Result<Expr> {
    let mut args = required;
    args.extend(optional.into_iter().flatten());
    b.helper(namespace, method, args)
}

// name => "method"(arg, ...)
macro_rules! helpers {
    ($ns:expr; $( $(#[$meta:meta])* $name:ident => $method:literal ( $($arg:ident),* ) ),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $name(self, $($arg: impl Into<Value>),*) -> Result<Expr> {
                call(self.b, $ns, $method, vec![$($arg.into()),*], Vec::new())
            }
        )*
    };
}

impl Builder {
    /// Entry point to `$util`.
    pub fn util(&mut self) -> Util<'_> {
        Util { b: self }
    }
}

pub struct Util<'b> {
    b: &'b mut Builder,
}

impl<'b> Util<'b> {
    pub fn time(self) -> Time<'b> {
        Time { b: self.b }
    }

    pub fn dynamodb(self) -> DynamoDb<'b> {
        DynamoDb { b: self.b }
    }

    pub fn list(self) -> List<'b> {
        List { b: self.b }
    }

    pub fn map(self) -> Map<'b> {
        Map { b: self.b }
    }

    helpers! { "util";
        auto_id => "autoId"(),
        /// Fails the request as unauthorized.
        unauthorized => "unauthorized"(),
        base64_encode => "base64Encode"(value),
        base64_decode => "base64Decode"(value),
        url_encode => "urlEncode"(value),
        url_decode => "urlDecode"(value),
        escape_javascript => "escapeJavaScript"(value),
        parse_json => "parseJson"(text),
        to_json => "toJson"(value),
        type_of => "typeOf"(value),
        matches => "matches"(pattern, value),
        is_null => "isNull"(value),
        is_null_or_empty => "isNullOrEmpty"(value),
        is_null_or_blank => "isNullOrBlank"(value),
        is_number => "isNumber"(value),
        is_string => "isString"(value),
        is_boolean => "isBoolean"(value),
        is_list => "isList"(value),
        is_map => "isMap"(value),
        default_if_null => "defaultIfNull"(value, fallback),
        default_if_null_or_empty => "defaultIfNullOrEmpty"(value, fallback),
        default_if_null_or_blank => "defaultIfNullOrBlank"(value, fallback),
    }

    /// `$util.qr(value)`, rendered quietly.
    pub fn qr(self, value: impl Into<Value>) -> Result<Expr> {
        self.b.discard(value)
    }

    pub fn error(
        self,
        message: impl Into<Value>,
        error_type: Option<Value>,
        data: Option<Value>,
        error_info: Option<Value>,
    ) -> Result<Expr> {
        call(
            self.b,
            "util",
            "error",
            vec![message.into()],
            vec![error_type, data, error_info],
        )
    }

    pub fn append_error(
        self,
        message: impl Into<Value>,
        error_type: Option<Value>,
        data: Option<Value>,
        error_info: Option<Value>,
    ) -> Result<Expr> {
        call(
            self.b,
            "util",
            "appendError",
            vec![message.into()],
            vec![error_type, data, error_info],
        )
    }

    pub fn validate(
        self,
        condition: impl Into<Value>,
        message: Option<Value>,
        error_type: Option<Value>,
        data: Option<Value>,
    ) -> Result<Expr> {
        call(
            self.b,
            "util",
            "validate",
            vec![condition.into()],
            vec![message, error_type, data],
        )
    }
}

/// `$util.time`
pub struct Time<'b> {
    b: &'b mut Builder,
}

impl Time<'_> {
    helpers! { "util.time";
        now_iso8601 => "nowISO8601"(),
        now_epoch_seconds => "nowEpochSeconds"(),
        now_epoch_milliseconds => "nowEpochMilliSeconds"(),
        parse_iso8601_to_epoch_milliseconds => "parseISO8601ToEpochMilliSeconds"(timestamp),
        epoch_milliseconds_to_seconds => "epochMilliSecondsToSeconds"(millis),
        epoch_milliseconds_to_iso8601 => "epochMilliSecondsToISO8601"(millis),
    }

    pub fn now_formatted(self, format: impl Into<Value>, time_zone: Option<Value>) -> Result<Expr> {
        call(self.b, "util.time", "nowFormatted", vec![format.into()], vec![time_zone])
    }

    pub fn parse_formatted_to_epoch_milliseconds(
        self,
        timestamp: impl Into<Value>,
        format: impl Into<Value>,
        time_zone: Option<Value>,
    ) -> Result<Expr> {
        call(
            self.b,
            "util.time",
            "parseFormattedToEpochMilliSeconds",
            vec![timestamp.into(), format.into()],
            vec![time_zone],
        )
    }

    pub fn epoch_milliseconds_to_formatted(
        self,
        millis: impl Into<Value>,
        format: impl Into<Value>,
        time_zone: Option<Value>,
    ) -> Result<Expr> {
        call(
            self.b,
            "util.time",
            "epochMilliSecondsToFormatted",
            vec![millis.into(), format.into()],
            vec![time_zone],
        )
    }
}

/// `$util.dynamodb`
pub struct DynamoDb<'b> {
    b: &'b mut Builder,
}

impl DynamoDb<'_> {
    helpers! { "util.dynamodb";
        to_dynamodb => "toDynamoDB"(value),
        to_dynamodb_json => "toDynamoDBJson"(value),
        to_string => "toString"(value),
        to_string_json => "toStringJson"(value),
        to_string_set => "toStringSet"(value),
        to_string_set_json => "toStringSetJson"(value),
        to_number => "toNumber"(value),
        to_number_json => "toNumberJson"(value),
        to_number_set => "toNumberSet"(value),
        to_number_set_json => "toNumberSetJson"(value),
        to_binary => "toBinary"(value),
        to_binary_json => "toBinaryJson"(value),
        to_binary_set => "toBinarySet"(value),
        to_binary_set_json => "toBinarySetJson"(value),
        to_boolean => "toBoolean"(value),
        to_boolean_json => "toBooleanJson"(value),
        to_null => "toNull"(value),
        to_null_json => "toNullJson"(value),
        to_list => "toList"(value),
        to_list_json => "toListJson"(value),
        to_map => "toMap"(value),
        to_map_json => "toMapJson"(value),
        to_map_values => "toMapValues"(value),
        to_map_values_json => "toMapValuesJson"(value),
    }
}

/// `$util.list`
pub struct List<'b> {
    b: &'b mut Builder,
}

impl List<'_> {
    helpers! { "util.list";
        copy_and_retain_all => "copyAndRetainAll"(list, keep),
        copy_and_remove_all => "copyAndRemoveAll"(list, remove),
    }
}

/// `$util.map`
pub struct Map<'b> {
    b: &'b mut Builder,
}

impl Map<'_> {
    helpers! { "util.map";
        copy_and_retain_all_keys => "copyAndRetainAllKeys"(map, keys),
        copy_and_remove_all_keys => "copyAndRemoveAllKeys"(map, keys),
    }
}

#[cfg(test)]
mod tests {
    use crate::{Builder, Profile, Value, Var};

    #[test]
    fn absent_optional_arguments_are_dropped() {
        let mut b = Builder::new(Profile::V2018_05_29);
        b.util()
            .error("Forbidden", Some(Value::from("AccessDenied")), None, None)
            .unwrap();
        b.util()
            .validate(Var::named("ok"), None, None, None)
            .unwrap();
        assert_eq!(
            b.finish(),
            "${util.error(\"Forbidden\", \"AccessDenied\")}\n${util.validate(${ok})}"
        );
    }

    #[test]
    fn namespaces_nest() {
        let mut b = Builder::new(Profile::V2018_05_29);
        let json = b.util().dynamodb().to_map_values_json(Var::named("ctx.args")).unwrap();
        let keep = b
            .util()
            .map()
            .copy_and_retain_all_keys(Var::named("ctx.args"), Value::list(["id"]))
            .unwrap();
        assert_eq!(b.render_expr(&json), "${util.dynamodb.toMapValuesJson(${ctx.args})}");
        assert_eq!(
            b.render_expr(&keep),
            "${util.map.copyAndRetainAllKeys(${ctx.args}, [\"id\"])}"
        );
    }

    #[test]
    fn qr_is_quiet() {
        let mut b = Builder::new(Profile::V2017_02_28);
        let list = b.variable(Value::list(Vec::<Value>::new())).unwrap();
        let add = b.invoke(&list, "add", vec![Value::from(1)]).unwrap();
        b.util().qr(add).unwrap();
        assert_eq!(b.finish(), "#set($var0 = [])\n$!{util.qr(${var0.add(1)})}");
    }
}
