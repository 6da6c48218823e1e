use chrono::Utc;
use classic_monitor::RegisterSnapshot;
use classic_monitor::error::EvalError;
use classic_monitor::expr::{Formula, MAX_DEPTH, Number};

fn eval(src: &str, regs: &[(u16, u16)]) -> Result<Number, EvalError> {
    let snapshot = RegisterSnapshot::new(Utc::now(), regs.iter().copied());
    Formula::parse(src).unwrap().evaluate(&snapshot)
}

#[test]
fn rejects_code_outside_the_grammar() {
    for src in [
        "system('rm -rf /')",
        "[4101]; exit",
        "$x + 1",
        "phpinfo()",
        "1 +",
        "(1",
        "lsb()",
        "lsb(1, 2)",
        "[abc]",
        "1 < 2 < 3",
        "",
    ] {
        let err = Formula::parse(src).unwrap_err();
        assert_eq!(err.kind(), "FormulaSyntaxError", "accepted {:?}", src);
    }
}

#[test]
fn register_values_are_never_reparsed() {
    // A register value is a number, whatever it is, never formula text
    assert_eq!(eval("[1] * 2", &[(1, 65535)]).unwrap(), Number::Int(131070));
}

#[test]
fn precedence_follows_the_documented_order() {
    assert_eq!(eval("1 + 2 << 3", &[]).unwrap(), Number::Int(24));
    assert_eq!(eval("2 * 3 + 4", &[]).unwrap(), Number::Int(10));
    assert_eq!(eval("-2 * 3", &[]).unwrap(), Number::Int(-6));
    assert_eq!(eval("1 + 1 == 2 ? 10 : 20", &[]).unwrap(), Number::Int(10));
    assert_eq!(eval("0 ? 1 : 0 ? 2 : 3", &[]).unwrap(), Number::Int(3));
}

#[test]
fn uptime_examples() {
    let regs = [(4349, 3600), (4350, 0)];
    assert_eq!(
        eval("round((([4350]<<16)+[4349]))", &regs).unwrap(),
        Number::Int(3600)
    );
    assert_eq!(
        eval("round((([4350]<<16)+[4349])/60/60/24, 2)", &regs).unwrap(),
        Number::Float(0.04)
    );
}

#[test]
fn battery_temperature_sentinel() {
    let f = "[4132] > 65000 ? 25 : [4132]/10";
    assert_eq!(eval(f, &[(4132, 65535)]).unwrap(), Number::Int(25));
    assert_eq!(eval(f, &[(4132, 250)]).unwrap(), Number::Int(25));
    assert_eq!(eval(f, &[(4132, 187)]).unwrap(), Number::Float(18.7));
}

#[test]
fn runtime_failures_are_typed() {
    assert_eq!(
        eval("[4373] + 1", &[]).unwrap_err(),
        EvalError::MissingRegister { register: 4373 }
    );
    assert_eq!(
        eval("100 / ([1] - [2])", &[(1, 4), (2, 4)]).unwrap_err(),
        EvalError::DivisionByZero
    );
}

#[test]
fn formula_reports_its_registers() {
    let f = Formula::parse("(([4127]<<16)+[4126])/10").unwrap();
    assert_eq!(f.registers(), vec![4127, 4126]);
    assert_eq!(f.to_string(), "(([4127]<<16)+[4126])/10");
}

#[test]
fn deep_nesting_is_a_syntax_error() {
    let nested = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
    let err = Formula::parse(&nested).unwrap_err();
    assert_eq!(err.kind(), "FormulaSyntaxError");

    let chained = vec!["1"; MAX_DEPTH * 4].join(" + ");
    assert_eq!(Formula::parse(&chained).unwrap_err().kind(), "FormulaSyntaxError");

    let negated = format!("{}1", "-".repeat(MAX_DEPTH * 4));
    assert_eq!(Formula::parse(&negated).unwrap_err().kind(), "FormulaSyntaxError");

    // Realistic formulas stay well inside the limit
    assert!(Formula::parse("((((([4127]<<16)+[4126])/10)))").is_ok());
}

#[test]
fn non_finite_decimals_are_rejected() {
    let huge = format!("{}.0", "9".repeat(400));
    assert_eq!(Formula::parse(&huge).unwrap_err().kind(), "FormulaSyntaxError");

    let big = format!("{}.0", "9".repeat(300));
    assert_eq!(
        eval(&format!("{} * {}", big, big), &[]).unwrap_err(),
        EvalError::Overflow
    );
    assert_eq!(
        eval(&format!("{} / 0.5 / 0.5 / 0.5", big), &[]),
        Ok(Number::Float(big.parse::<f64>().unwrap() * 8.0))
    );
}
