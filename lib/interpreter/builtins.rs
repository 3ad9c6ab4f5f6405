use std::collections::BTreeMap;

use crate::error::{JunoError, TypeError};

use super::value::Value;

pub type NativeFunction = fn(Vec<Value>) -> Result<Value, JunoError>;

/// Largest string, in bytes, that `strings.repeat` will build.
pub const MAX_REPEAT_LEN: usize = 1 << 24;

/// Something an `import` statement can bind.
#[derive(Debug, Clone)]
pub enum Export {
    Value(Value),
    Function(NativeFunction),
}

/// What a package resolves to. Unknown packages resolve to no exports plus a diagnostic.
#[derive(Debug, Default, Clone)]
pub struct Resolution {
    pub exports: BTreeMap<String, Export>,
    pub diagnostic: Option<String>,
}

impl Resolution {
    pub fn not_found(package: &str) -> Self {
        Self {
            exports: BTreeMap::new(),
            diagnostic: Some(format!("package `{}` not found", package)),
        }
    }
}

pub trait PackageResolver {
    fn resolve(&self, package: &str) -> Resolution;
}

/// Resolves nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPackages;

impl PackageResolver for NoPackages {
    fn resolve(&self, package: &str) -> Resolution {
        Resolution::not_found(package)
    }
}

/// The packages bundled with the interpreter: `math`, `strings` and `collections`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdPackages;

impl PackageResolver for StdPackages {
    fn resolve(&self, package: &str) -> Resolution {
        let exports: Vec<(&str, Export)> = match package {
            "math" => vec![
                ("abs", Export::Function(Builtins::abs_fn)),
                ("max", Export::Function(Builtins::max_fn)),
                ("min", Export::Function(Builtins::min_fn)),
                ("pow", Export::Function(Builtins::pow_fn)),
                ("sqrt", Export::Function(Builtins::sqrt_fn)),
                ("floor", Export::Function(Builtins::floor_fn)),
                ("ceil", Export::Function(Builtins::ceil_fn)),
                ("PI", Export::Value(Value::Float(std::f64::consts::PI))),
                ("E", Export::Value(Value::Float(std::f64::consts::E))),
            ],
            "strings" => vec![
                ("length", Export::Function(Builtins::length_fn)),
                ("upper", Export::Function(Builtins::upper_fn)),
                ("lower", Export::Function(Builtins::lower_fn)),
                ("contains", Export::Function(Builtins::contains_fn)),
                ("repeat", Export::Function(Builtins::repeat_fn)),
            ],
            "collections" => vec![
                ("len", Export::Function(Builtins::len_fn)),
                ("first", Export::Function(Builtins::first_fn)),
                ("last", Export::Function(Builtins::last_fn)),
                ("rest", Export::Function(Builtins::rest_fn)),
                ("push", Export::Function(Builtins::push_fn)),
            ],
            _ => return Resolution::not_found(package),
        };
        Resolution {
            exports: exports
                .into_iter()
                .map(|(name, export)| (name.to_string(), export))
                .collect(),
            diagnostic: None,
        }
    }
}

struct Builtins;

fn invalid(function: &str, reason: impl Into<String>) -> JunoError {
    TypeError::InvalidArguments {
        function: function.to_string(),
        reason: reason.into(),
    }
    .into()
}

fn expect_arity(function: &str, args: &[Value], want: usize) -> Result<(), JunoError> {
    if args.len() != want {
        return Err(invalid(
            function,
            format!("wrong number of arguments: want={}, got={}", want, args.len()),
        ));
    }
    Ok(())
}

fn number(function: &str, value: &Value) -> Result<f64, JunoError> {
    value
        .as_f64()
        .ok_or_else(|| invalid(function, format!("expected a number, got {}", value.describe())))
}

impl Builtins {
    fn abs_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        expect_arity("abs", &args, 1)?;
        match &args[0] {
            Value::Int(value) => Ok(Value::Int(value.wrapping_abs())),
            other => Ok(Value::Float(number("abs", other)?.abs())),
        }
    }

    fn max_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        Self::extremum("max", args, |left, right| left >= right)
    }

    fn min_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        Self::extremum("min", args, |left, right| left <= right)
    }

    fn extremum(
        function: &str,
        args: Vec<Value>,
        keep_left: fn(f64, f64) -> bool,
    ) -> Result<Value, JunoError> {
        expect_arity(function, &args, 2)?;
        let (left, right) = (number(function, &args[0])?, number(function, &args[1])?);
        match (&args[0], &args[1]) {
            (Value::Int(l), Value::Int(r)) => Ok(Value::Int(if keep_left(left, right) { *l } else { *r })),
            _ => Ok(Value::Float(if keep_left(left, right) { left } else { right })),
        }
    }

    fn pow_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        expect_arity("pow", &args, 2)?;
        Ok(Value::Float(number("pow", &args[0])?.powf(number("pow", &args[1])?)))
    }

    fn sqrt_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        expect_arity("sqrt", &args, 1)?;
        Ok(Value::Float(number("sqrt", &args[0])?.sqrt()))
    }

    fn floor_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        expect_arity("floor", &args, 1)?;
        Ok(Value::Float(number("floor", &args[0])?.floor()))
    }

    fn ceil_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        expect_arity("ceil", &args, 1)?;
        Ok(Value::Float(number("ceil", &args[0])?.ceil()))
    }

    fn length_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        expect_arity("length", &args, 1)?;
        match &args[0] {
            Value::String(value) => Ok(Value::Int(value.chars().count() as i64)),
            other => Err(invalid("length", format!("argument not supported, got {}", other.describe()))),
        }
    }

    fn upper_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        expect_arity("upper", &args, 1)?;
        Ok(Value::String(args[0].to_string().to_uppercase()))
    }

    fn lower_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        expect_arity("lower", &args, 1)?;
        Ok(Value::String(args[0].to_string().to_lowercase()))
    }

    fn contains_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        expect_arity("contains", &args, 2)?;
        match (&args[0], &args[1]) {
            (Value::String(haystack), needle) => {
                Ok(Value::Bool(haystack.contains(&needle.to_string())))
            }
            (Value::Array(values), needle) => {
                Ok(Value::Bool(values.iter().any(|v| v.loosely_equals(needle))))
            }
            (other, _) => Err(invalid("contains", format!("argument not supported, got {}", other.describe()))),
        }
    }

    fn repeat_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        expect_arity("repeat", &args, 2)?;
        let count = match &args[1] {
            Value::Int(count) if *count >= 0 => *count,
            other => return Err(invalid("repeat", format!("count must be a non-negative int, got {}", other.describe()))),
        };
        let text = args[0].to_string();
        match usize::try_from(count)
            .ok()
            .and_then(|count| text.len().checked_mul(count).map(|len| (count, len)))
        {
            Some((count, len)) if len <= MAX_REPEAT_LEN => Ok(Value::String(text.repeat(count))),
            _ => Err(invalid(
                "repeat",
                format!("result would exceed {} bytes", MAX_REPEAT_LEN),
            )),
        }
    }

    fn len_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        expect_arity("len", &args, 1)?;
        match &args[0] {
            Value::String(value) => Ok(Value::Int(value.chars().count() as i64)),
            Value::Array(values) => Ok(Value::Int(values.len() as i64)),
            other => Err(invalid("len", format!("argument not supported, got {}", other.describe()))),
        }
    }

    fn first_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        expect_arity("first", &args, 1)?;
        match &args[0] {
            Value::Array(values) => Ok(values.first().cloned().unwrap_or(Value::Unit)),
            other => Err(invalid("first", format!("argument not supported, got {}", other.describe()))),
        }
    }

    fn last_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        expect_arity("last", &args, 1)?;
        match &args[0] {
            Value::Array(values) => Ok(values.last().cloned().unwrap_or(Value::Unit)),
            other => Err(invalid("last", format!("argument not supported, got {}", other.describe()))),
        }
    }

    fn rest_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        expect_arity("rest", &args, 1)?;
        match &args[0] {
            Value::Array(values) if values.is_empty() => Ok(Value::Unit),
            Value::Array(values) => Ok(Value::Array(values[1..].to_vec())),
            other => Err(invalid("rest", format!("argument not supported, got {}", other.describe()))),
        }
    }

    fn push_fn(args: Vec<Value>) -> Result<Value, JunoError> {
        expect_arity("push", &args, 2)?;
        let mut args = args.into_iter();
        match (args.next(), args.next()) {
            (Some(Value::Array(mut values)), Some(value)) => {
                values.push(value);
                Ok(Value::Array(values))
            }
            (other, _) => Err(invalid(
                "push",
                format!("first argument must be an array, got {:?}", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(package: &str, name: &str, args: Vec<Value>) -> Result<Value, JunoError> {
        match StdPackages.resolve(package).exports.get(name) {
            Some(Export::Function(function)) => function(args),
            other => panic!("expected function {package}.{name}, found {other:?}"),
        }
    }

    #[test]
    fn test_unknown_package_has_diagnostic() {
        let resolution = StdPackages.resolve("java.util");
        assert!(resolution.exports.is_empty());
        assert_eq!(
            resolution.diagnostic.as_deref(),
            Some("package `java.util` not found")
        );
        assert!(NoPackages.resolve("math").diagnostic.is_some());
    }

    #[test]
    fn test_math_package() {
        let cases = vec![
            ("abs", vec![Value::Int(-3)], Value::Int(3)),
            ("abs", vec![Value::Float(-1.5)], Value::Float(1.5)),
            ("max", vec![Value::Int(2), Value::Int(7)], Value::Int(7)),
            ("min", vec![Value::Int(2), Value::Float(1.5)], Value::Float(1.5)),
            ("pow", vec![Value::Int(2), Value::Int(10)], Value::Float(1024.0)),
            ("sqrt", vec![Value::Int(16)], Value::Float(4.0)),
            ("floor", vec![Value::Float(2.7)], Value::Float(2.0)),
            ("ceil", vec![Value::Float(2.1)], Value::Float(3.0)),
        ];
        for (name, args, expected) in cases {
            assert_eq!(call("math", name, args).unwrap(), expected);
        }
        assert!(matches!(
            StdPackages.resolve("math").exports.get("PI"),
            Some(Export::Value(Value::Float(_)))
        ));
    }

    #[test]
    fn test_strings_package() {
        let s = |v: &str| Value::String(v.to_string());
        let cases = vec![
            ("length", vec![s("héllo")], Value::Int(5)),
            ("upper", vec![s("juno")], s("JUNO")),
            ("lower", vec![s("JuNo")], s("juno")),
            ("contains", vec![s("hello"), s("ell")], Value::Bool(true)),
            ("repeat", vec![s("ab"), Value::Int(3)], s("ababab")),
        ];
        for (name, args, expected) in cases {
            assert_eq!(call("strings", name, args).unwrap(), expected);
        }
    }

    #[test]
    fn test_collections_package() {
        let array = Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let cases = vec![
            ("len", vec![array.clone()], Value::Int(3)),
            ("len", vec![Value::Array(vec![])], Value::Int(0)),
            ("first", vec![array.clone()], Value::Int(1)),
            ("first", vec![Value::Array(vec![])], Value::Unit),
            ("last", vec![array.clone()], Value::Int(3)),
            (
                "rest",
                vec![array.clone()],
                Value::Array(vec![Value::Int(2), Value::Int(3)]),
            ),
            ("rest", vec![Value::Array(vec![])], Value::Unit),
            (
                "push",
                vec![Value::Array(vec![]), Value::Int(1)],
                Value::Array(vec![Value::Int(1)]),
            ),
        ];
        for (name, args, expected) in cases {
            assert_eq!(call("collections", name, args).unwrap(), expected);
        }
    }

    #[test]
    fn test_invalid_arguments() {
        let cases = vec![
            (
                "collections",
                "len",
                vec![Value::Int(1)],
                "invalid arguments to `len`: argument not supported, got int 1",
            ),
            (
                "math",
                "sqrt",
                vec![],
                "invalid arguments to `sqrt`: wrong number of arguments: want=1, got=0",
            ),
            (
                "math",
                "abs",
                vec![Value::Bool(true)],
                "invalid arguments to `abs`: expected a number, got boolean true",
            ),
            (
                "strings",
                "repeat",
                vec![Value::String("ab".to_string()), Value::Int(i64::MAX)],
                "invalid arguments to `repeat`: result would exceed 16777216 bytes",
            ),
            (
                "strings",
                "repeat",
                vec![Value::String("x".to_string()), Value::Int(1 << 25)],
                "invalid arguments to `repeat`: result would exceed 16777216 bytes",
            ),
            (
                "strings",
                "repeat",
                vec![Value::String("x".to_string()), Value::Int(-1)],
                "invalid arguments to `repeat`: count must be a non-negative int, got int -1",
            ),
        ];
        for (package, name, args, expected) in cases {
            match call(package, name, args) {
                Ok(value) => panic!("no error returned for {name}, got {value}"),
                Err(JunoError::Type(error)) => assert_eq!(error.to_string(), expected),
                Err(other) => panic!("unexpected error {other}"),
            }
        }
    }
}
