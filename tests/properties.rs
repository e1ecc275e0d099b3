use proptest::prelude::*;
use vtlbuilder::{Builder, Profile, Result, Value};

#[derive(Debug, Clone)]
enum Op {
    Var(i64),
    Sum(i64, i64),
    If(Vec<Op>),
    Loop(Vec<Op>),
}

fn arb_op() -> impl Strategy<Value = Op> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Op::Var),
        (any::<i64>(), any::<i64>()).prop_map(|(a, b)| Op::Sum(a, b)),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Op::If),
            prop::collection::vec(inner, 0..4).prop_map(Op::Loop),
        ]
    })
}

fn run(b: &mut Builder, ops: &[Op]) -> Result<()> {
    for op in ops {
        match op {
            Op::Var(n) => {
                b.variable(*n)?;
            }
            Op::Sum(x, y) => {
                let sum = b.add(*x, *y)?;
                b.variable(sum)?;
            }
            Op::If(body) => {
                b.if_(true, |b| run(b, body))?;
            }
            Op::Loop(body) => {
                b.foreach(Value::list([1, 2]), |b, _| run(b, body))?;
            }
        }
    }
    Ok(())
}

/// Names issued by `ops`, and how many sums they contain.
fn expected(ops: &[Op]) -> (usize, usize) {
    ops.iter().fold((0, 0), |(names, sums), op| match op {
        Op::Var(_) => (names + 1, sums),
        Op::Sum(..) => (names + 1, sums + 1),
        Op::If(body) => {
            let (n, s) = expected(body);
            (names + n, sums + s)
        }
        Op::Loop(body) => {
            let (n, s) = expected(body);
            (names + 1 + n, sums + s)
        }
    })
}

/// Every `varN` that is declared by a `#set` or `#foreach` line, in output order.
fn declared(text: &str) -> Vec<usize> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim_start();
            let rest = line
                .strip_prefix("#set($var")
                .or_else(|| line.strip_prefix("#foreach($var"))?;
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .collect()
}

proptest! {
    /// Temporary names are issued once each, in construction order, at any
    /// nesting depth.
    #[test]
    fn temp_names_are_unique_and_increasing(ops in prop::collection::vec(arb_op(), 0..8)) {
        let mut b = Builder::new(Profile::V2018_05_29);
        run(&mut b, &ops).unwrap();
        let (names, _) = expected(&ops);
        let text = b.finish();
        prop_assert_eq!(declared(&text), (0..names).collect::<Vec<_>>());
    }

    /// A consumed operand appears inside its parent and nowhere else.
    #[test]
    fn consumed_operands_render_once(ops in prop::collection::vec(arb_op(), 0..8)) {
        let mut b = Builder::new(Profile::V2018_05_29);
        run(&mut b, &ops).unwrap();
        let (_, sums) = expected(&ops);
        let text = b.finish();
        prop_assert_eq!(text.matches(" + ").count(), sums);
        prop_assert!(text.lines().all(|l| !l.trim_start().starts_with('(')));
    }
}
