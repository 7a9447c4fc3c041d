//! CEL built-in functions and macros with documentation.

use super::argument::ArgumentSyntax;
use super::function::{FunctionFlags, FunctionSignature};
use super::semantic::SemanticType;
use super::SignatureBuilder;

use SemanticType::{Bool, Bytes, Double, Duration, Int, String as Str, Timestamp, UInt};

fn dyn_() -> SemanticType {
    SemanticType::top()
}

fn list_dyn() -> SemanticType {
    SemanticType::list(dyn_())
}

fn map_dyn() -> SemanticType {
    SemanticType::map(dyn_(), dyn_())
}

/// Global conversion overloads `name(value) -> to`, one per accepted type.
fn conversions(
    name: &str,
    from: &[SemanticType],
    to: SemanticType,
    description: &str,
    example: &str,
) -> Vec<FunctionSignature> {
    from.iter()
        .map(|ty| {
            SignatureBuilder::new(name)
                .with_description(description)
                .with_example(example)
                .with_required_parameter("value", ty.clone(), "Value to convert")
                .with_return_type(to.clone())
                .with_flags(FunctionFlags::GLOBAL)
                .build()
        })
        .collect()
}

/// A string method `receiver.name(arg) -> bool`.
fn string_predicate(
    name: &str,
    arg: &str,
    description: &str,
    example: &str,
) -> FunctionSignature {
    SignatureBuilder::new(name)
        .with_description(description)
        .with_example(example)
        .with_required_parameter("receiver", Str, "String to test")
        .with_required_parameter(arg, Str, "")
        .with_return_type(Bool)
        .with_flags(FunctionFlags::METHOD)
        .build()
}

/// A comprehension macro `list.name(iter_var, expr)`.
fn comprehension(
    name: &str,
    returns: SemanticType,
    description: &str,
    example: &str,
) -> FunctionSignature {
    SignatureBuilder::new(name)
        .with_description(description)
        .with_example(example)
        .with_required_parameter("range", list_dyn(), "List or map to iterate")
        .with_required_parameter("iter_var", dyn_(), "Name bound to each element")
        .with_required_parameter("expr", dyn_(), "Expression evaluated per element")
        .with_return_type(returns)
        .with_flags(FunctionFlags::MACRO | FunctionFlags::METHOD)
        .build()
}

/// A timestamp accessor with an optional timezone, plus a duration overload
/// when `on_duration` is set.
fn accessor(name: &str, on_duration: bool, description: &str) -> Vec<FunctionSignature> {
    let example = format!("timestamp.{}()", name);
    let mut sigs = vec![SignatureBuilder::new(name)
        .with_description(description)
        .with_example(example.as_str())
        .with_required_parameter("receiver", Timestamp, "Timestamp to inspect")
        .with_optional_parameter("timezone", Str, "IANA zone name or UTC offset")
        .with_return_type(Int)
        .with_flags(FunctionFlags::METHOD)
        .build()];
    if on_duration {
        sigs.push(
            SignatureBuilder::new(name)
                .with_description(description)
                .with_example(example.as_str())
                .with_required_parameter("receiver", Duration, "Duration to inspect")
                .with_return_type(Int)
                .with_flags(FunctionFlags::METHOD)
                .build(),
        );
    }
    sigs
}

/// Fold ASCII case on literal receivers; otherwise `string`.
fn case_folding_rule(
    fold: fn(&str) -> String,
) -> impl Fn(&[ArgumentSyntax]) -> SemanticType + Send + Sync {
    move |args| match args.first().and_then(ArgumentSyntax::as_str_literal) {
        Some(value) => SemanticType::StringLiteral(fold(value)),
        None => Str,
    }
}

/// The CEL standard library.
pub(crate) fn standard_library() -> Vec<FunctionSignature> {
    let mut defs = Vec::new();

    // ==================== Type Conversions ====================
    defs.extend(conversions(
        "bool",
        &[Bool, Str],
        Bool,
        "Type conversion to bool. Accepts bool (identity) or string (\"true\" → true, \"false\" → false).",
        "bool(\"true\") == true",
    ));
    defs.extend(conversions(
        "bytes",
        &[Bytes, Str],
        Bytes,
        "Type conversion to bytes. Accepts bytes (identity) or string (UTF-8 encoded).",
        "bytes(\"hello\")",
    ));
    defs.extend(conversions(
        "double",
        &[Int, UInt, Str],
        Double,
        "Type conversion to double. Accepts int, uint, string (parsed as float), or double.",
        "double(\"3.14\") == 3.14",
    ));
    defs.extend(conversions(
        "duration",
        &[Str],
        Duration,
        "Type conversion to duration. Accepts duration (identity) or string (format: sequence of decimal numbers with time unit suffix h, m, s, ms, us, ns).",
        "duration(\"1h30m\")",
    ));
    defs.extend(conversions(
        "dyn",
        &[dyn_()],
        dyn_(),
        "Converts a value to the dyn type, enabling dynamic dispatch. Useful for heterogeneous collections.",
        "dyn(x)",
    ));
    defs.extend(conversions(
        "int",
        &[UInt, Double, Str, Timestamp],
        Int,
        "Type conversion to int (64-bit signed). Accepts int (identity), uint, double (truncates toward zero), string (parses), or timestamp (Unix seconds).",
        "int(\"42\") == 42",
    ));
    defs.extend(conversions(
        "string",
        &[dyn_()],
        Str,
        "Type conversion to string. Works with all primitive types, timestamps, durations, bytes (UTF-8 decode).",
        "string(123) == \"123\"",
    ));
    defs.extend(conversions(
        "timestamp",
        &[Str],
        Timestamp,
        "Type conversion to timestamp. Accepts timestamp (identity) or string (RFC 3339 format).",
        "timestamp(\"2023-01-15T10:30:00Z\")",
    ));
    defs.push(
        SignatureBuilder::new("type")
            .with_description("Returns the runtime type of a value as a type value.")
            .with_example("type(1) == int")
            .with_required_parameter("value", dyn_(), "Value to inspect")
            .with_dynamic_return_type(|args| {
                SemanticType::type_of(
                    args.first()
                        .map(|arg| arg.static_type().widen())
                        .unwrap_or_else(SemanticType::top),
                )
            })
            .with_flags(FunctionFlags::GLOBAL)
            .build(),
    );
    defs.extend(conversions(
        "uint",
        &[Int, Double, Str],
        UInt,
        "Type conversion to uint (64-bit unsigned). Accepts uint (identity), int, double (truncates toward zero), or string (parses).",
        "uint(\"42\") == 42u",
    ));

    // ==================== Macros ====================
    defs.push(
        SignatureBuilder::new("has")
            .with_description("Macro that tests whether a field is present. Returns true if the field exists and is set, false otherwise. Does not evaluate the field.")
            .with_example("has(msg.optional_field)")
            .with_required_parameter("field", dyn_(), "Field selection to test")
            .with_return_type(Bool)
            .with_flags(FunctionFlags::MACRO | FunctionFlags::GLOBAL)
            .build(),
    );
    defs.push(comprehension(
        "all",
        Bool,
        "Macro that tests whether all elements in a list satisfy the predicate. Returns true for empty lists. Short-circuits on first false.",
        "[1, 2, 3].all(x, x > 0) == true",
    ));
    defs.push(comprehension(
        "exists",
        Bool,
        "Macro that tests whether any element in a list satisfies the predicate. Returns false for empty lists. Short-circuits on first true.",
        "[1, 2, 3].exists(x, x == 2) == true",
    ));
    defs.push(comprehension(
        "exists_one",
        Bool,
        "Macro that tests whether exactly one element in a list satisfies the predicate. Does not short-circuit.",
        "[1, 2, 3].exists_one(x, x == 2) == true",
    ));
    defs.push(comprehension(
        "filter",
        list_dyn(),
        "Macro that returns a new list containing only elements that satisfy the predicate.",
        "[1, 2, 3, 4].filter(x, x % 2 == 0) == [2, 4]",
    ));
    defs.push(comprehension(
        "map",
        list_dyn(),
        "Macro that returns a new list with each element transformed by the given expression.",
        "[1, 2, 3].map(x, x * 2) == [2, 4, 6]",
    ));

    // ==================== String Functions ====================
    defs.push(string_predicate(
        "contains",
        "substring",
        "Returns true if the string contains the substring.",
        "\"hello world\".contains(\"world\") == true",
    ));
    defs.push(string_predicate(
        "endsWith",
        "suffix",
        "Returns true if the string ends with the given suffix.",
        "\"hello.txt\".endsWith(\".txt\") == true",
    ));
    defs.push(string_predicate(
        "matches",
        "regex",
        "Returns true if the string matches the RE2 regular expression. Matches any substring by default; use ^ and $ anchors for full string match.",
        "\"hello123\".matches(\"[a-z]+[0-9]+\") == true",
    ));
    defs.push(string_predicate(
        "startsWith",
        "prefix",
        "Returns true if the string starts with the given prefix.",
        "\"hello world\".startsWith(\"hello\") == true",
    ));

    // ==================== Size ====================
    for ty in [Str, Bytes, list_dyn(), map_dyn()] {
        defs.push(
            SignatureBuilder::new("size")
                .with_description("Returns the length of a string (in Unicode code points), bytes (byte length), list (element count), or map (entry count).")
                .with_example("size(\"hello\") == 5")
                .with_required_parameter("value", ty, "Sized value")
                .with_return_type(Int)
                .with_flags(FunctionFlags::GLOBAL | FunctionFlags::METHOD)
                .build(),
        );
    }

    // ==================== Timestamp/Duration Accessors ====================
    // (name, also accepts a duration, description)
    let accessors = [
        (
            "getDate",
            false,
            "Returns the day of month from a timestamp (1-31). Optional timezone parameter.",
        ),
        (
            "getDayOfMonth",
            false,
            "Returns the day of month from a timestamp (0-30, zero-indexed). Optional timezone parameter.",
        ),
        (
            "getDayOfWeek",
            false,
            "Returns the day of week from a timestamp (0-6, Sunday=0). Optional timezone parameter.",
        ),
        (
            "getDayOfYear",
            false,
            "Returns the day of year from a timestamp (0-365). Optional timezone parameter.",
        ),
        (
            "getFullYear",
            false,
            "Returns the full year from a timestamp (e.g., 2023). Optional timezone parameter.",
        ),
        (
            "getHours",
            true,
            "Returns the hour from a timestamp (0-23) or duration. Optional timezone parameter for timestamps.",
        ),
        (
            "getMilliseconds",
            true,
            "Returns the milliseconds from a timestamp (0-999) or duration. Optional timezone parameter for timestamps.",
        ),
        (
            "getMinutes",
            true,
            "Returns the minutes from a timestamp (0-59) or duration. Optional timezone parameter for timestamps.",
        ),
        (
            "getMonth",
            false,
            "Returns the month from a timestamp (0-11, zero-indexed). Optional timezone parameter.",
        ),
        (
            "getSeconds",
            true,
            "Returns the seconds from a timestamp (0-59) or duration. Optional timezone parameter for timestamps.",
        ),
    ];
    for (name, on_duration, description) in accessors {
        defs.extend(accessor(name, on_duration, description));
    }

    defs
}

/// The strings extension library.
pub(crate) fn strings_extension() -> Vec<FunctionSignature> {
    vec![
        SignatureBuilder::new("lowerAscii")
            .with_description("Returns the string with ASCII letters lowercased. Literal receivers fold to a literal result.")
            .with_example("\"TacoCat\".lowerAscii() == \"tacocat\"")
            .with_required_parameter("receiver", Str, "String to convert")
            .with_dynamic_return_type(case_folding_rule(str::to_ascii_lowercase))
            .with_flags(FunctionFlags::METHOD)
            .build(),
        SignatureBuilder::new("upperAscii")
            .with_description("Returns the string with ASCII letters uppercased. Literal receivers fold to a literal result.")
            .with_example("\"TacoCat\".upperAscii() == \"TACOCAT\"")
            .with_required_parameter("receiver", Str, "String to convert")
            .with_dynamic_return_type(case_folding_rule(str::to_ascii_uppercase))
            .with_flags(FunctionFlags::METHOD)
            .build(),
        SignatureBuilder::new("join")
            .with_description("Concatenates a list of strings, optionally inserting a separator between elements.")
            .with_example("[\"a\", \"b\"].join(\", \") == \"a, b\"")
            .with_required_parameter("receiver", SemanticType::list(Str), "Strings to join")
            .with_optional_parameter("separator", Str, "Inserted between elements")
            .with_return_type(Str)
            .with_flags(FunctionFlags::METHOD)
            .build(),
        SignatureBuilder::new("format")
            .with_description("Formats a string using printf-style verbs (%s, %d, %f, %e, %b, %o, %x, %X) with arguments from a list.")
            .with_example("\"%s is %d\".format([\"x\", 1])")
            .with_required_parameter("receiver", Str, "Format template")
            .with_required_parameter("args", list_dyn(), "Values substituted for each verb")
            .with_return_type(Str)
            .with_flags(FunctionFlags::METHOD)
            .build(),
    ]
}

/// The math extension library.
pub(crate) fn math_extension() -> Vec<FunctionSignature> {
    // Result is the shared argument type, or dyn when arguments disagree.
    fn common_type(args: &[ArgumentSyntax]) -> SemanticType {
        let mut types = args.iter().map(|arg| arg.static_type().widen());
        match types.next() {
            Some(first) if types.all(|ty| ty == first) => first,
            _ => SemanticType::top(),
        }
    }

    vec![
        SignatureBuilder::new("math.greatest")
            .with_description("Returns the greatest of its numeric arguments.")
            .with_example("math.greatest(1, 2, 3) == 3")
            .with_variable_parameter("value", dyn_(), 1, "Numeric values to compare")
            .with_dynamic_return_type(common_type)
            .with_flags(FunctionFlags::GLOBAL)
            .build(),
        SignatureBuilder::new("math.least")
            .with_description("Returns the least of its numeric arguments.")
            .with_example("math.least(1, 2, 3) == 1")
            .with_variable_parameter("value", dyn_(), 1, "Numeric values to compare")
            .with_dynamic_return_type(common_type)
            .with_flags(FunctionFlags::GLOBAL)
            .build(),
    ]
}

/// Protovalidate-specific extension functions.
///
/// See: https://buf.build/docs/protovalidate/
pub(crate) fn protovalidate_extension() -> Vec<FunctionSignature> {
    let flags = FunctionFlags::METHOD | FunctionFlags::PROTOVALIDATE_ONLY;
    let predicate = |name: &str, receiver: SemanticType, description: &str, example: &str| {
        SignatureBuilder::new(name)
            .with_description(description)
            .with_example(example)
            .with_required_parameter("receiver", receiver, "Value to validate")
            .with_return_type(Bool)
            .with_flags(flags)
    };

    vec![
        // ==================== String Validation Methods ====================
        predicate(
            "isEmail",
            Str,
            "Returns true if the string is a valid email address according to RFC 5322.",
            "this.isEmail()",
        )
        .build(),
        predicate(
            "isHostname",
            Str,
            "Returns true if the string is a valid hostname according to RFC 1123.",
            "this.isHostname()",
        )
        .build(),
        predicate(
            "isIp",
            Str,
            "Returns true if the string is a valid IP address. Optional version parameter: 4 for IPv4, 6 for IPv6.",
            "this.isIp() || this.isIp(4)",
        )
        .with_optional_parameter("version", Int, "4 for IPv4, 6 for IPv6")
        .build(),
        predicate(
            "isIpPrefix",
            Str,
            "Returns true if the string is a valid IP prefix (CIDR notation). Optional version (4 or 6) and strict mode parameters.",
            "this.isIpPrefix()",
        )
        .with_optional_parameter("version", Int, "4 for IPv4, 6 for IPv6")
        .with_optional_parameter("strict", Bool, "Require host bits to be zero")
        .build(),
        predicate(
            "isUri",
            Str,
            "Returns true if the string is a valid URI according to RFC 3986.",
            "this.isUri()",
        )
        .build(),
        predicate(
            "isUriRef",
            Str,
            "Returns true if the string is a valid URI reference (can be relative).",
            "this.isUriRef()",
        )
        .build(),
        // ==================== List Methods ====================
        predicate(
            "unique",
            list_dyn(),
            "Returns true if all elements in the list are unique.",
            "this.unique()",
        )
        .build(),
        // ==================== Numeric Methods ====================
        predicate(
            "isNan",
            Double,
            "Returns true if the double value is NaN (Not a Number).",
            "this.isNan()",
        )
        .build(),
        predicate(
            "isInf",
            Double,
            "Returns true if the double value is infinite. Optional sign: 1 for +Inf, -1 for -Inf, 0 for either.",
            "this.isInf() || this.isInf(1)",
        )
        .with_optional_parameter("sign", Int, "1 for +Inf, -1 for -Inf, 0 for either")
        .build(),
    ]
}
