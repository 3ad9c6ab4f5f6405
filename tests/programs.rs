use juno::{
    interpreter::{Cancellation, Interpreter, SharedBuffer},
    Engine, JunoError, Options, SyntaxError,
};
use pretty_assertions::assert_eq;

fn run_with(input: &str, options: Options) -> (Vec<String>, anyhow::Result<()>) {
    let buffer = SharedBuffer::new();
    let mut engine = Interpreter::new(options).with_output(buffer.clone());
    let result = engine.run(input);
    (buffer.lines(), result)
}

fn run(input: &str) -> Vec<String> {
    match run_with(input, Options::default()) {
        (lines, Ok(())) => lines,
        (_, Err(error)) => panic!("{input:?} failed: {error:#}"),
    }
}

#[test]
fn declarations_and_prints_keep_order() {
    let input = r#"
        int a = 1;
        String b = "two";
        double c = 3.5;
        boolean d = false;
        println(a);
        println(b);
        println(c);
        println(d);
    "#;
    assert_eq!(run(input), vec!["1", "two", "3.5", "false"]);
}

#[test]
fn concatenation_is_left_to_right() {
    assert_eq!(run(r#"println("a" + 1 + 2);"#), vec!["a12"]);
    assert_eq!(run(r#"println(1 + 2 + "a");"#), vec!["3a"]);
}

#[test]
fn comparison_boundaries() {
    let tests = vec![
        ("5 >= 5", "true"),
        ("5 > 5", "false"),
        ("5 <= 5", "true"),
        ("5 < 5", "false"),
        ("5 == 5", "true"),
        ("5 != 5", "false"),
    ];

    for (input, expected) in tests {
        assert_eq!(run(&format!("println({});", input)), vec![expected], "{input}");
    }
}

#[test]
fn for_loop_prints_exactly_five_lines() {
    assert_eq!(
        run("for (int i = 0; i < 5; i++) { println(i); }"),
        vec!["0", "1", "2", "3", "4"]
    );
}

#[test]
fn forward_reference() {
    assert_eq!(
        run(r#"greet(); void greet() { println("early"); }"#),
        vec!["early"]
    );
}

#[test]
fn hello_world() {
    assert_eq!(
        run(r#"String name = "World"; println("Hello, " + name);"#),
        vec!["Hello, World"]
    );
    assert_eq!(
        run(r#"String greet(String n) { return "Hi " + n; } String m = greet("Sam"); println(m);"#),
        vec!["Hi Sam"]
    );
}

#[test]
fn unterminated_string_reports_same_position() {
    let input = "int x = 1;\nprintln(\"never closed);\n";

    let checked = juno::check_syntax(input).unwrap_err();
    let (lines, result) = run_with(input, Options::default());
    let error = result.unwrap_err();

    assert!(lines.is_empty());
    match error.downcast_ref::<JunoError>() {
        Some(JunoError::Syntax(executed)) => {
            assert_eq!(executed, &checked);
            assert_eq!(executed.position(), checked.position());
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }
    assert!(matches!(checked, SyntaxError::UnterminatedString { .. }));
    assert_eq!(checked.position().line, 2);
    assert_eq!(checked.position().column, 9);
}

#[test]
fn syntax_errors_run_nothing() {
    let (lines, result) = run_with("println(1);\nif (true) { println(2);", Options::default());
    assert!(lines.is_empty());
    assert!(result.is_err());
    assert!(juno::check_syntax("if (true) { println(2);").is_err());
}

#[test]
fn runaway_loop_hits_budget() {
    for budget in [1, 2, 7, 50] {
        let options = Options {
            step_budget: Some(budget),
            ..Options::default()
        };
        let (_, result) = run_with("int n = 0; for (int i = 0; true; i++) { n += 1; }", options);
        let error = result.unwrap_err();
        assert!(
            matches!(
                error.downcast_ref::<JunoError>(),
                Some(JunoError::ExecutionBudgetExceeded { budget: b }) if *b == budget
            ),
            "budget {budget}: {error}"
        );
    }
}

#[test]
fn cancellation_stops_execution() {
    let cancellation = Cancellation::new();
    cancellation.cancel();
    let options = Options {
        cancellation: Some(cancellation),
        ..Options::default()
    };
    let (lines, result) = run_with("for (int i = 0; true; i++) { println(i); }", options);

    assert!(lines.is_empty());
    assert!(matches!(
        result.unwrap_err().downcast_ref::<JunoError>(),
        Some(JunoError::Cancelled)
    ));
}

#[test]
fn runtime_errors_keep_prior_output() {
    let (lines, result) = run_with(
        r#"println("before"); println(1 - "x"); println("after");"#,
        Options::default(),
    );
    assert_eq!(lines, vec!["before"]);
    assert!(matches!(
        result.unwrap_err().downcast_ref::<JunoError>(),
        Some(JunoError::Type(_))
    ));
}

#[test]
fn full_program() {
    let input = r#"
        import math.sqrt;
        import collections.*;

        /* classic entry point */
        public class Primes {
            static int limit = 20;

            static boolean isPrime(int n) {
                if (n < 2) {
                    return false;
                }
                for (int d = 2; d * d <= n; d++) {
                    if (n % d == 0) {
                        return false;
                    }
                }
                return true;
            }

            public static void main(String[] args) {
                int[] found = {};
                for (int i = 0; i <= limit; i++) {
                    if (isPrime(i)) {
                        found = push(found, i);
                    }
                }
                System.out.println("primes: " + found);
                System.out.println("count: " + len(found));
                System.out.println("largest: " + last(found));
                System.out.println("root: " + sqrt(len(found) * 2));
            }
        }
    "#;

    assert_eq!(
        run(input),
        vec![
            "primes: [2, 3, 5, 7, 11, 13, 17, 19]",
            "count: 8",
            "largest: 19",
            "root: 4.0",
        ]
    );
}

#[test]
fn execute_reports_success() {
    assert!(juno::execute("int x = 1;"));
    assert!(!juno::execute("int x = ;"));
    assert!(!juno::execute("undefined();"));
}

#[test]
fn engine_check_matches_check_syntax() {
    let engine = juno::new_interpreter(Options::default());
    assert!(engine.check("void f() { if (true) { } }").is_ok());
    assert_eq!(
        engine.check("void f() {"),
        juno::check_syntax("void f() {")
    );
}

#[test]
fn oversized_repeat_is_an_error() {
    let (lines, result) = run_with(
        r#"import strings.repeat; println(repeat("ab", 9223372036854775807));"#,
        Options::default(),
    );
    assert!(lines.is_empty());
    assert!(matches!(
        result.unwrap_err().downcast_ref::<JunoError>(),
        Some(JunoError::Type(_))
    ));
}

#[test]
fn deep_nesting_is_a_syntax_error() {
    let input = format!("println({}1{});", "(".repeat(20_000), ")".repeat(20_000));
    assert!(matches!(
        juno::check_syntax(&input),
        Err(SyntaxError::NestingTooDeep { .. })
    ));
    assert!(!juno::execute(&input));
}

#[test]
fn unterminated_comment_is_a_syntax_error() {
    let input = "println(1);\n/* trailing";
    assert!(matches!(
        juno::check_syntax(input),
        Err(SyntaxError::UnterminatedComment { .. })
    ));
    let (lines, result) = run_with(input, Options::default());
    assert!(lines.is_empty());
    assert!(result.is_err());
}
