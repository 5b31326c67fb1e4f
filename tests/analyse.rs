use cellgen::s1_model::{Component, Connection, Expr, Model, Operator, Variable};
use cellgen::s2_analyzer::{Analyser, EquationType, ModelType, Severity, VariableType};

/// Four gated states driven by constants, computed constants and algebraic
/// intermediates, using arithmetic only.
fn four_state_model() -> Model {
    let plus = |a: &str, b: &str| Expr::binary(Operator::Plus, Expr::ci(a), Expr::ci(b));
    let minus = |a: &str, b: &str| Expr::binary(Operator::Minus, Expr::ci(a), Expr::ci(b));
    let times = |a: &str, b: &str| Expr::binary(Operator::Times, Expr::ci(a), Expr::ci(b));
    let divide = |a: &str, b: &str| Expr::binary(Operator::Divide, Expr::ci(a), Expr::ci(b));

    let mut main = Component::new("main").with_variable(Variable::new("t", "millisecond"));
    for (i, s) in ["s1", "s2", "s3", "s4"].iter().enumerate() {
        let state = Variable::new(s, "millivolt").with_initial_value(i as f64 * 0.5);
        main = main.with_variable(state);
    }
    for (i, k) in ["k1", "k2", "k3", "k4", "k5"].iter().enumerate() {
        let constant = Variable::new(k, "dimensionless").with_initial_value(i as f64 + 1.0);
        main = main.with_variable(constant);
    }
    for name in [
        "c1", "c2", "c3", "c4", "a1", "a2", "a3", "a4", "a5", "a6", "a7", "a8",
    ] {
        main = main.with_variable(Variable::new(name, "dimensionless"));
    }

    let main = main
        .with_equation(Expr::ci("c1"), times("k1", "k2"))
        .with_equation(Expr::ci("c2"), divide("k3", "k4"))
        .with_equation(Expr::ci("c3"), plus("c1", "c2"))
        .with_equation(Expr::ci("c4"), minus("k5", "c3"))
        .with_equation(Expr::ci("a1"), times("s1", "c1"))
        .with_equation(Expr::ci("a2"), minus("s2", "s1"))
        .with_equation(Expr::ci("a3"), plus("a1", "a2"))
        .with_equation(Expr::ci("a4"), times("s3", "c2"))
        .with_equation(Expr::ci("a5"), divide("a4", "k5"))
        .with_equation(Expr::ci("a6"), minus("s4", "a3"))
        .with_equation(Expr::ci("a7"), times("a5", "a6"))
        .with_equation(
            Expr::ci("a8"),
            Expr::binary(Operator::Plus, times("a7", "c4"), Expr::cn(1.0)),
        )
        .with_equation(Expr::diff("t", "s1"), Expr::unary(Operator::Minus, Expr::ci("a1")))
        .with_equation(Expr::diff("t", "s2"), Expr::ci("a3"))
        .with_equation(Expr::diff("t", "s3"), minus("a4", "s3"))
        .with_equation(Expr::diff("t", "s4"), Expr::ci("a8"));
    Model::new("four_state").with_component(main)
}

#[test]
fn test_four_state_model() {
    let model = four_state_model();
    let mut analyser = Analyser::new();
    let analysed = analyser.analyse_model(&model).clone();
    assert_eq!(analyser.error_count(), 0, "{:?}", analyser.issues());

    assert_eq!(analysed.model_type(), ModelType::Ode);
    assert_eq!(analysed.state_count(), 4);
    assert_eq!(analysed.variable_count(), 17);
    assert_eq!(analysed.equation_count(), 16);

    assert!(analysed.needs().is_empty());
    assert!(!analysed.need_eq_function());
    assert!(!analysed.need_xor_function());
    assert!(!analysed.need_not_function());
    assert!(!analysed.need_sec_function());
    assert!(!analysed.need_acoth_function());

    let count = |kind: VariableType| {
        analysed
            .variables()
            .iter()
            .filter(|v| v.kind() == kind)
            .count()
    };
    assert_eq!(count(VariableType::Constant), 5);
    assert_eq!(count(VariableType::ComputedConstant), 4);
    assert_eq!(count(VariableType::Algebraic), 8);

    let rates = analysed.equations().iter().filter(|e| e.is_rate()).count();
    assert_eq!(rates, 4);
    assert!(analysed
        .equations()
        .iter()
        .filter(|e| e.kind() == EquationType::VariableBasedConstant)
        .all(|e| !e.is_state_rate_based()));
}

#[test]
fn test_ordering_property() {
    let model = four_state_model();
    let mut analyser = Analyser::new();
    let analysed = analyser.analyse_model(&model);
    for equation in analysed.equations() {
        for d in equation.dependencies() {
            let dependency = &analysed.equations()[*d];
            if equation.cycle().is_some() && equation.cycle() == dependency.cycle() {
                continue;
            }
            assert!(dependency.order() < equation.order());
        }
    }
}

#[test]
fn test_analysis_is_deterministic() {
    let model = four_state_model();
    let first = Analyser::new().analyse_model(&model).clone();
    let second = Analyser::new().analyse_model(&model).clone();
    assert_eq!(first, second);
}

#[test]
fn test_json_model() {
    let json = r#"{
        "name": "decay",
        "components": [
            {
                "name": "environment",
                "variables": [{"name": "time", "units": "second"}]
            },
            {
                "name": "decay",
                "variables": [
                    {"name": "time", "units": "second"},
                    {"name": "n", "units": "dimensionless", "initial_value": 100.0},
                    {"name": "lambda", "units": "per_second", "initial_value": 0.5}
                ],
                "equations": [
                    {
                        "lhs": {"diff": {"bvar": "time", "ci": "n"}},
                        "rhs": {"apply": {"op": "times", "args": [
                            {"apply": {"op": "minus", "args": [{"ci": "lambda"}]}},
                            {"ci": "n"}
                        ]}}
                    }
                ]
            }
        ],
        "connections": [
            {
                "component_1": "environment",
                "variable_1": "time",
                "component_2": "decay",
                "variable_2": "time"
            }
        ]
    }"#;
    let model = Model::from_json_str(json).unwrap();
    assert_eq!(
        model.connections[0],
        Connection::new("environment", "time", "decay", "time")
    );

    let mut analyser = Analyser::new();
    let analysed = analyser.analyse_model(&model).clone();
    assert!(analysed.is_valid(), "{:?}", analyser.issues());
    assert_eq!(analysed.model_type(), ModelType::Ode);
    assert_eq!(analysed.voi().map(|v| v.name()), Some("time"));
    assert_eq!(analysed.state_count(), 1);
    assert_eq!(analysed.variable_count(), 1);
}

#[test]
fn test_unknown_reference_is_an_error() {
    let model = Model::new("typo").with_component(
        Component::new("c")
            .with_variable(Variable::new("x", "metre"))
            .with_equation(Expr::ci("x"), Expr::ci("xx")),
    );
    let mut analyser = Analyser::new();
    let analysed = analyser.analyse_model(&model);
    assert!(!analysed.is_valid());
    assert!(analyser
        .issues()
        .iter()
        .any(|i| i.severity == Severity::Error && i.message.contains("xx")));
}

#[test]
fn test_empty_model() {
    let mut analyser = Analyser::new();
    let analysed = analyser.analyse_model(&Model::new("empty"));
    assert_eq!(analysed.model_type(), ModelType::Unknown);
    assert_eq!(analyser.error_count(), 0);
}
