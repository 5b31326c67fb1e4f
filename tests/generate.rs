use cellgen::s1_model::{Component, Expr, MathConstant, Model, Operator, Variable};
use cellgen::s2_analyzer::{Analyser, AnalyserExternalVariable, AnalyserModel, ModelType};
use cellgen::s4_generator::{generate_code, Generator, GeneratorProfile};
use unindent::unindent;

/// dv/dt = a, x = dv/dt
fn rate_model() -> Model {
    Model::new("rate").with_component(
        Component::new("main")
            .with_variable(Variable::new("t", "second"))
            .with_variable(Variable::new("v", "metre").with_initial_value(1.0))
            .with_variable(Variable::new("a", "metre_per_second").with_initial_value(1.0))
            .with_variable(Variable::new("x", "metre_per_second"))
            .with_equation(Expr::diff("t", "v"), Expr::ci("a"))
            .with_equation(Expr::ci("x"), Expr::diff("t", "v")),
    )
}

/// x = y + 1, y = 2 * x, z = x
fn loop_model() -> Model {
    Model::new("loop").with_component(
        Component::new("c")
            .with_variable(Variable::new("x", "metre"))
            .with_variable(Variable::new("y", "metre"))
            .with_variable(Variable::new("z", "metre"))
            .with_equation(
                Expr::ci("x"),
                Expr::binary(Operator::Plus, Expr::ci("y"), Expr::cn(1.0)),
            )
            .with_equation(
                Expr::ci("y"),
                Expr::binary(Operator::Times, Expr::cn(2.0), Expr::ci("x")),
            )
            .with_equation(Expr::ci("z"), Expr::ci("x")),
    )
}

/// dv/dt = x, x = 1 - 0.5 * dv/dt
fn dae_model() -> Model {
    Model::new("dae").with_component(
        Component::new("main")
            .with_variable(Variable::new("t", "second"))
            .with_variable(Variable::new("v", "metre").with_initial_value(1.0))
            .with_variable(Variable::new("x", "metre_per_second"))
            .with_equation(Expr::diff("t", "v"), Expr::ci("x"))
            .with_equation(
                Expr::ci("x"),
                Expr::binary(
                    Operator::Minus,
                    Expr::cn(1.0),
                    Expr::binary(Operator::Times, Expr::cn(0.5), Expr::diff("t", "v")),
                ),
            ),
    )
}

/// Text from `start` up to the next `end`, or to the end of `code`.
fn section<'a>(code: &'a str, start: &str, end: &str) -> &'a str {
    let from = code.find(start).unwrap_or_else(|| panic!("no '{}' in:\n{}", start, code));
    let rest = &code[from..];
    match rest[start.len()..].find(end) {
        Some(to) => &rest[..start.len() + to],
        None => rest,
    }
}

fn analyse(model: &Model) -> AnalyserModel {
    cellgen::init_logger();
    let mut analyser = Analyser::new();
    let analysed = analyser.analyse_model(model).clone();
    assert!(analysed.is_valid(), "{:?}", analyser.issues());
    analysed
}

#[test]
fn test_python_rate_model() {
    let analysed = analyse(&rate_model());
    let code = generate_code(&analysed, &GeneratorProfile::python()).unwrap();
    let expected = unindent(
        r#"
        # The content of this file was generated using the Python profile of cellgen {version}.

        from enum import Enum
        from math import *

        CELLGEN_VERSION = "{version}"

        STATE_COUNT = 1
        VARIABLE_COUNT = 2

        class VariableType(Enum):
            VARIABLE_OF_INTEGRATION = 0
            STATE = 1
            CONSTANT = 2
            COMPUTED_CONSTANT = 3
            ALGEBRAIC = 4
            EXTERNAL = 5

        VOI_INFO = {"name": "t", "units": "second", "component": "main", "type": VariableType.VARIABLE_OF_INTEGRATION}

        STATE_INFO = [
            {"name": "v", "units": "metre", "component": "main", "type": VariableType.STATE}
        ]

        VARIABLE_INFO = [
            {"name": "a", "units": "metre_per_second", "component": "main", "type": VariableType.CONSTANT},
            {"name": "x", "units": "metre_per_second", "component": "main", "type": VariableType.ALGEBRAIC}
        ]

        def create_states_array():
            return [nan]*STATE_COUNT

        def create_variables_array():
            return [nan]*VARIABLE_COUNT

        def initialize_constants(states, variables):
            states[0] = 1.0
            variables[0] = 1.0

        def compute_computed_constants(variables):
            pass

        def compute_rates(voi, states, rates, variables):
            rates[0] = variables[0]

        def compute_variables(voi, states, rates, variables):
            variables[1] = rates[0]
        "#,
    )
    .replace("{version}", env!("CARGO_PKG_VERSION"));
    assert_eq!(code, expected);
}

#[test]
fn test_c_rate_model() {
    let analysed = analyse(&rate_model());
    let generator = Generator::new(GeneratorProfile::c());

    let interface = generator.interface_code(&analysed).unwrap();
    assert!(interface.starts_with(&format!(
        "/* The content of this file was generated using the C profile of cellgen {}. */\n\n#pragma once\n",
        env!("CARGO_PKG_VERSION")
    )));
    assert!(interface.contains("    char name[2];\n    char units[17];\n    char component[5];\n"));
    assert!(interface.contains(
        "extern const VariableInfo VOI_INFO;\nextern const VariableInfo STATE_INFO[];\nextern const VariableInfo VARIABLE_INFO[];\n"
    ));
    assert!(interface.contains("void initializeConstants(double *states, double *variables);\n"));
    assert!(interface.contains(
        "void computeRates(double voi, double *states, double *rates, double *variables);\n"
    ));
    assert!(!interface.contains("ExternalVariable"));

    let implementation = generator.implementation_code(&analysed).unwrap();
    assert!(implementation.contains("#include \"model.h\"\n"));
    assert!(implementation.contains(
        "const size_t STATE_COUNT = 1;\nconst size_t VARIABLE_COUNT = 2;\n"
    ));
    assert!(implementation
        .contains("const VariableInfo VOI_INFO = {\"t\", \"second\", \"main\", VARIABLE_OF_INTEGRATION};\n"));
    assert!(implementation.contains(
        "const VariableInfo STATE_INFO[] = {\n    {\"v\", \"metre\", \"main\", STATE}\n};\n"
    ));
    assert!(implementation.contains(
        "void initializeConstants(double *states, double *variables)\n{\n    states[0] = 1.0;\n    variables[0] = 1.0;\n}\n"
    ));
    assert!(implementation.contains("void computeComputedConstants(double *variables)\n{\n}\n"));
    assert!(implementation.contains(
        "void computeRates(double voi, double *states, double *rates, double *variables)\n{\n    rates[0] = variables[0];\n}\n"
    ));
    assert!(implementation.contains(
        "void computeVariables(double voi, double *states, double *rates, double *variables)\n{\n    variables[1] = rates[0];\n}\n"
    ));
    assert!(!implementation.contains("nlaSolve"));
}

#[test]
fn test_algebraic_loop_calls_the_solver() {
    let analysed = analyse(&loop_model());
    assert_eq!(analysed.model_type(), ModelType::Nla);

    let python = generate_code(&analysed, &GeneratorProfile::python()).unwrap();
    assert!(python.contains("from math import *\n\nfrom nlasolver import nla_solve\n"));
    assert!(python.contains(&unindent(
        "
        def objective_function_0(u, f, data):
            variables = data[0]

            variables[0] = u[0]
            variables[1] = u[1]

            f[0] = variables[0]-(variables[1]+1.0)
            f[1] = variables[1]-(2.0*variables[0])
        "
    )));
    assert!(python.contains(&unindent(
        "
        def find_root_0(variables):
            u = [nan]*2

            u[0] = variables[0]
            u[1] = variables[1]

            u = nla_solve(objective_function_0, u, 2, [variables])

            variables[0] = u[0]
            variables[1] = u[1]
        "
    )));
    assert!(python.contains(
        "def initialize_constants(variables):\n    variables[0] = 0.0\n    variables[1] = 0.0\n"
    ));
    assert!(python.contains(
        "def compute_variables(variables):\n    find_root_0(variables)\n    variables[2] = variables[0]\n"
    ));
    assert!(!python.contains("def compute_rates"));

    let c = generate_code(&analysed, &GeneratorProfile::c()).unwrap();
    assert!(c.contains("} RootFindingInfo;\n"));
    assert!(!c.contains("double voi;"));
    assert!(c.contains("void findRoot0(double *variables)\n{\n    RootFindingInfo rfi = { variables };\n"));
    assert!(c.contains("    nlaSolve(objectiveFunction0, u, 2, &rfi);\n"));
    assert!(c.contains("    findRoot0(variables);\n"));
}

#[test]
fn test_external_variable() {
    let model = rate_model();
    let a = model.variable_id("main", "a").unwrap();
    let mut analyser = Analyser::new();
    analyser.add_external_variable(AnalyserExternalVariable::new(a));
    let analysed = analyser.analyse_model(&model).clone();
    assert!(analysed.is_valid(), "{:?}", analyser.issues());
    assert!(analysed.has_external_variables());

    let python = generate_code(&analysed, &GeneratorProfile::python()).unwrap();
    assert!(python.contains("def compute_rates(voi, states, rates, variables, external_variable):\n"));
    assert!(python.contains("def compute_variables(voi, states, rates, variables, external_variable):\n"));
    assert!(python.contains(" = external_variable(voi, states, rates, variables, "));
    assert!(python.contains("\"type\": VariableType.EXTERNAL}"));

    let interface = Generator::new(GeneratorProfile::c())
        .interface_code(&analysed)
        .unwrap();
    assert!(interface.contains(
        "typedef double (* ExternalVariable)(double voi, double *states, double *rates, double *variables, size_t index);\n"
    ));
    assert!(interface.contains(
        "void computeRates(double voi, double *states, double *rates, double *variables, ExternalVariable externalVariable);\n"
    ));
}

#[test]
fn test_only_needed_helpers_are_emitted() {
    // y = xor(a < 1, a > 0) + sec(a) + pi
    let model = Model::new("helpers").with_component(
        Component::new("c")
            .with_variable(Variable::new("a", "dimensionless").with_initial_value(0.5))
            .with_variable(Variable::new("y", "dimensionless"))
            .with_equation(
                Expr::ci("y"),
                Expr::apply(
                    Operator::Plus,
                    vec![
                        Expr::binary(
                            Operator::Xor,
                            Expr::binary(Operator::Lt, Expr::ci("a"), Expr::cn(1.0)),
                            Expr::binary(Operator::Gt, Expr::ci("a"), Expr::cn(0.0)),
                        ),
                        Expr::unary(Operator::Sec, Expr::ci("a")),
                        Expr::constant(MathConstant::Pi),
                    ],
                ),
            ),
    );
    let analysed = analyse(&model);
    assert!(analysed.need_xor_function());
    assert!(analysed.need_lt_function());
    assert!(analysed.need_sec_function());
    assert!(!analysed.need_csc_function());

    let c = generate_code(&analysed, &GeneratorProfile::c()).unwrap();
    assert!(c.contains("double xor(double x, double y)\n"));
    assert!(c.contains("double sec(double x)\n"));
    assert!(!c.contains("double csc(double x)"));
    assert!(c.contains("3.14159265358979"));

    let python = generate_code(&analysed, &GeneratorProfile::python()).unwrap();
    assert!(python.contains("def xor_func(x, y):\n"));
    assert!(python.contains("def lt_func(x, y):\n"));
    assert!(python.contains("def gt_func(x, y):\n"));
    assert!(python.contains("def sec(x):\n"));
    assert!(!python.contains("def eq_func"));
    assert!(python.contains("xor_func(lt_func(variables[0], 1.0), gt_func(variables[0], 0.0))"));
}

#[test]
fn test_custom_profile_from_json() {
    let mut profile = GeneratorProfile::python();
    profile.naming.indent = "\t".to_string();
    let profile = GeneratorProfile::from_json_str(&profile.to_json().unwrap()).unwrap();
    assert!(profile.is_modified());

    let code = generate_code(&analyse(&rate_model()), &profile).unwrap();
    assert!(code.starts_with("# The content of this file was generated using a modified Python profile"));
    assert!(code.contains("def compute_rates(voi, states, rates, variables):\n\trates[0] = variables[0]\n"));
}

#[test]
fn test_dae_rates_are_solved_where_they_are_in_scope() {
    let analysed = analyse(&dae_model());
    assert_eq!(analysed.model_type(), ModelType::Dae);
    assert_eq!(analysed.cycles().len(), 1);

    let python = generate_code(&analysed, &GeneratorProfile::python()).unwrap();
    let initialize = section(&python, "def initialize_constants(", "\ndef ");
    assert!(initialize.starts_with("def initialize_constants(states, variables):\n"));
    assert!(initialize.contains("    variables[0] = 0.0\n"));
    assert!(!initialize.contains("rates["), "{}", initialize);

    let find_root = section(&python, "def find_root_0(", "\ndef ");
    assert!(find_root.starts_with("def find_root_0(voi, states, rates, variables):\n"));
    let seed = find_root.find("    rates[0] = 0.0\n").unwrap();
    let pack = find_root.find(" = rates[0]\n").unwrap();
    assert!(seed < pack, "{}", find_root);
    assert!(find_root.contains("    rates[0] = u["));
    assert!(python.contains("def compute_rates(voi, states, rates, variables):\n    find_root_0(voi, states, rates, variables)\n"));

    let c = generate_code(&analysed, &GeneratorProfile::c()).unwrap();
    let initialize = section(&c, "void initializeConstants(double *states, double *variables)\n{", "}\n");
    assert!(initialize.contains("    variables[0] = 0.0;\n"));
    assert!(!initialize.contains("rates["), "{}", initialize);

    let find_root = section(
        &c,
        "void findRoot0(double voi, double *states, double *rates, double *variables)\n{",
        "}\n",
    );
    let seed = find_root.find("    rates[0] = 0.0;\n").unwrap();
    let pack = find_root.find(" = rates[0];\n").unwrap();
    assert!(seed < pack, "{}", find_root);
    assert!(find_root.contains("    rates[0] = u["));
    assert!(c.contains("    double *rates = ((RootFindingInfo *) data)->rates;\n"));
    assert!(c.contains("    findRoot0(voi, states, rates, variables);\n"));
}

#[test]
fn test_wide_sum() {
    let terms: Vec<Expr> = (0..20_000).map(|i| Expr::cn(i as f64)).collect();
    let model = Model::new("wide").with_component(
        Component::new("c")
            .with_variable(Variable::new("x", "dimensionless"))
            .with_equation(Expr::ci("x"), Expr::apply(Operator::Plus, terms)),
    );
    let analysed = analyse(&model);

    let c = generate_code(&analysed, &GeneratorProfile::c()).unwrap();
    assert!(c.contains("    variables[0] = 0.0+1.0+2.0+3.0+"));
    assert!(c.contains("+19998.0+19999.0;\n"));
    assert!(!section(&c, "void initializeConstants(", "}\n").contains("+("));

    let python = generate_code(&analysed, &GeneratorProfile::python()).unwrap();
    assert!(python.contains("+19998.0+19999.0\n"));
}
