//! Generator profiles: everything that varies between target languages.
//!
//! A profile is plain serde data. The two presets cover C and Python; custom
//! profiles are usually a preset serialised to JSON, edited and loaded back.
//! Section templates are rendered with minijinja.

use crate::s2_analyzer::function_collector::HelperFunction;
use ordermap::OrderMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid profile: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    C,
    Python,
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileKind::C => write!(f, "C"),
            ProfileKind::Python => write!(f, "Python"),
        }
    }
}

/// Relational, logical and arithmetic operators. A relational or logical
/// operator without operator form is rendered as a call to the named
/// helper function instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operators {
    pub assignment: String,
    pub eq: String,
    pub neq: String,
    pub lt: String,
    pub leq: String,
    pub gt: String,
    pub geq: String,
    pub and: String,
    pub or: String,
    pub xor: String,
    pub not: String,
    pub has_eq_operator: bool,
    pub has_neq_operator: bool,
    pub has_lt_operator: bool,
    pub has_leq_operator: bool,
    pub has_gt_operator: bool,
    pub has_geq_operator: bool,
    pub has_and_operator: bool,
    pub has_or_operator: bool,
    pub has_xor_operator: bool,
    pub has_not_operator: bool,
    pub plus: String,
    pub minus: String,
    pub times: String,
    pub divide: String,
}

/// Names of the mathematical functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Functions {
    pub power: String,
    pub square_root: String,
    /// Empty to render squares with `power`
    pub square: String,
    pub absolute_value: String,
    pub exponential: String,
    pub natural_log: String,
    pub common_log: String,
    pub ceiling: String,
    pub floor: String,
    pub min: String,
    pub max: String,
    pub rem: String,
    pub sin: String,
    pub cos: String,
    pub tan: String,
    pub sec: String,
    pub csc: String,
    pub cot: String,
    pub sinh: String,
    pub cosh: String,
    pub tanh: String,
    pub sech: String,
    pub csch: String,
    pub coth: String,
    pub asin: String,
    pub acos: String,
    pub atan: String,
    pub asec: String,
    pub acsc: String,
    pub acot: String,
    pub asinh: String,
    pub acosh: String,
    pub atanh: String,
    pub asech: String,
    pub acsch: String,
    pub acoth: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constants {
    pub true_value: String,
    pub false_value: String,
    pub e: String,
    pub pi: String,
    pub inf: String,
    pub nan: String,
}

/// Conditional operator templates, rendered with `condition` and `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piecewise {
    pub conditional_operator_if: String,
    pub conditional_operator_else: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Naming {
    pub interface_file_name: String,
    pub voi: String,
    pub states: String,
    pub rates: String,
    pub variables: String,
    pub external_variable: String,
    pub voi_parameter: String,
    pub states_parameter: String,
    pub rates_parameter: String,
    pub variables_parameter: String,
    pub external_variable_parameter: String,
    pub unknowns: String,
    pub residuals: String,
    pub open_bracket: String,
    pub close_bracket: String,
    pub indent: String,
    pub statement_end: String,
    /// Body of a method without statements
    pub empty_method: String,
}

/// File boilerplate and method templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sections {
    pub origin_comment: String,
    pub interface_header: String,
    pub implementation_header: String,
    pub implementation_nla_solver: String,
    pub interface_version: String,
    pub implementation_version: String,
    pub interface_counts: String,
    pub implementation_counts: String,
    pub interface_variable_type: String,
    pub implementation_variable_type: String,
    pub interface_variable_info_object: String,
    pub variable_info_entry: String,
    pub interface_voi_info: String,
    pub implementation_voi_info: String,
    pub interface_state_info: String,
    pub implementation_state_info: String,
    pub interface_variable_info: String,
    pub implementation_variable_info: String,
    pub interface_external_variable_method_type: String,
    pub interface_create_states_array: String,
    pub implementation_create_states_array: String,
    pub interface_create_variables_array: String,
    pub implementation_create_variables_array: String,
    pub interface_delete_array: String,
    pub implementation_delete_array: String,
    pub implementation_objective_function: String,
    pub implementation_find_root: String,
    pub find_root_call: String,
    pub external_variable_call: String,
    pub interface_initialize_constants: String,
    pub implementation_initialize_constants: String,
    pub interface_compute_computed_constants: String,
    pub implementation_compute_computed_constants: String,
    pub interface_compute_rates: String,
    pub implementation_compute_rates: String,
    pub interface_compute_variables: String,
    pub implementation_compute_variables: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorProfile {
    pub kind: ProfileKind,
    pub has_interface: bool,
    pub refuse_invalid_models: bool,
    pub operators: Operators,
    pub functions: Functions,
    pub constants: Constants,
    pub piecewise: Piecewise,
    /// Implementation of each helper function the profile has to define
    pub helpers: OrderMap<HelperFunction, String>,
    pub naming: Naming,
    pub sections: Sections,
}

impl GeneratorProfile {
    pub fn new(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::C => Self::c(),
            ProfileKind::Python => Self::python(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ProfileError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, ProfileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// md5 digest of the canonical JSON form.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("{:x}", md5::compute(json.as_bytes()))
    }

    /// True if the profile differs from the preset of its kind.
    pub fn is_modified(&self) -> bool {
        self.fingerprint() != Self::new(self.kind).fingerprint()
    }

    /// How generated files name their profile.
    pub fn description(&self) -> String {
        if self.is_modified() {
            format!("a modified {} profile", self.kind)
        } else {
            format!("the {} profile", self.kind)
        }
    }

    /// True if `function` is rendered as an operator rather than a helper
    /// call.
    pub fn has_operator(&self, function: HelperFunction) -> bool {
        let ops = &self.operators;
        match function {
            HelperFunction::Eq => ops.has_eq_operator,
            HelperFunction::Neq => ops.has_neq_operator,
            HelperFunction::Lt => ops.has_lt_operator,
            HelperFunction::Leq => ops.has_leq_operator,
            HelperFunction::Gt => ops.has_gt_operator,
            HelperFunction::Geq => ops.has_geq_operator,
            HelperFunction::And => ops.has_and_operator,
            HelperFunction::Or => ops.has_or_operator,
            HelperFunction::Xor => ops.has_xor_operator,
            HelperFunction::Not => ops.has_not_operator,
            _ => false,
        }
    }

    // =========================================================================
    // C
    // =========================================================================

    pub fn c() -> Self {
        let helpers: OrderMap<HelperFunction, String> = [
            (
                HelperFunction::Xor,
                "double xor(double x, double y)\n{\n    return (x != 0.0) ^ (y != 0.0);\n}\n",
            ),
            (HelperFunction::Sec, "double sec(double x)\n{\n    return 1.0/cos(x);\n}\n"),
            (HelperFunction::Csc, "double csc(double x)\n{\n    return 1.0/sin(x);\n}\n"),
            (HelperFunction::Cot, "double cot(double x)\n{\n    return 1.0/tan(x);\n}\n"),
            (HelperFunction::Sech, "double sech(double x)\n{\n    return 1.0/cosh(x);\n}\n"),
            (HelperFunction::Csch, "double csch(double x)\n{\n    return 1.0/sinh(x);\n}\n"),
            (HelperFunction::Coth, "double coth(double x)\n{\n    return 1.0/tanh(x);\n}\n"),
            (HelperFunction::Asec, "double asec(double x)\n{\n    return acos(1.0/x);\n}\n"),
            (HelperFunction::Acsc, "double acsc(double x)\n{\n    return asin(1.0/x);\n}\n"),
            (HelperFunction::Acot, "double acot(double x)\n{\n    return atan(1.0/x);\n}\n"),
            (
                HelperFunction::Asech,
                "double asech(double x)\n{\n    double oneOverX = 1.0/x;\n\n    return log(oneOverX+sqrt(oneOverX*oneOverX-1.0));\n}\n",
            ),
            (
                HelperFunction::Acsch,
                "double acsch(double x)\n{\n    double oneOverX = 1.0/x;\n\n    return log(oneOverX+sqrt(oneOverX*oneOverX+1.0));\n}\n",
            ),
            (
                HelperFunction::Acoth,
                "double acoth(double x)\n{\n    double oneOverX = 1.0/x;\n\n    return 0.5*log((1.0+oneOverX)/(1.0-oneOverX));\n}\n",
            ),
        ]
        .into_iter()
        .map(|(f, code)| (f, code.to_string()))
        .collect();

        Self {
            kind: ProfileKind::C,
            has_interface: true,
            refuse_invalid_models: true,
            operators: Operators {
                assignment: " = ".into(),
                eq: " == ".into(),
                neq: " != ".into(),
                lt: " < ".into(),
                leq: " <= ".into(),
                gt: " > ".into(),
                geq: " >= ".into(),
                and: " && ".into(),
                or: " || ".into(),
                xor: "xor".into(),
                not: "!".into(),
                has_eq_operator: true,
                has_neq_operator: true,
                has_lt_operator: true,
                has_leq_operator: true,
                has_gt_operator: true,
                has_geq_operator: true,
                has_and_operator: true,
                has_or_operator: true,
                has_xor_operator: false,
                has_not_operator: true,
                plus: "+".into(),
                minus: "-".into(),
                times: "*".into(),
                divide: "/".into(),
            },
            functions: common_functions("fmin", "fmax"),
            constants: Constants {
                true_value: "1.0".into(),
                false_value: "0.0".into(),
                e: "2.71828182845905".into(),
                pi: "3.14159265358979".into(),
                inf: "INFINITY".into(),
                nan: "NAN".into(),
            },
            piecewise: Piecewise {
                conditional_operator_if: "({{ condition }})?{{ value }}".into(),
                conditional_operator_else: ":{{ value }}".into(),
            },
            helpers,
            naming: Naming {
                interface_file_name: "model.h".into(),
                voi: "voi".into(),
                states: "states".into(),
                rates: "rates".into(),
                variables: "variables".into(),
                external_variable: "externalVariable".into(),
                voi_parameter: "double voi".into(),
                states_parameter: "double *states".into(),
                rates_parameter: "double *rates".into(),
                variables_parameter: "double *variables".into(),
                external_variable_parameter: "ExternalVariable externalVariable".into(),
                unknowns: "u".into(),
                residuals: "f".into(),
                open_bracket: "[".into(),
                close_bracket: "]".into(),
                indent: "    ".into(),
                statement_end: ";".into(),
                empty_method: "".into(),
            },
            sections: Sections {
                origin_comment: "/* The content of this file was generated using {{ profile }} of cellgen {{ version }}. */\n".into(),
                interface_header: "#pragma once\n\n#include <stddef.h>\n".into(),
                implementation_header: "#include \"{{ interface_file_name }}\"\n\n#include <math.h>\n#include <stdlib.h>\n".into(),
                implementation_nla_solver: concat!(
                    "typedef struct {\n",
                    "{% if voi %}\n",
                    "    double voi;\n",
                    "    double *states;\n",
                    "    double *rates;\n",
                    "{% endif %}\n",
                    "    double *variables;\n",
                    "} RootFindingInfo;\n",
                    "\n",
                    "extern void nlaSolve(void (*objectiveFunction)(double *, double *, void *),\n",
                    "                     double *u, size_t n, void *data);\n",
                )
                .into(),
                interface_version: "extern const char VERSION[];\n".into(),
                implementation_version: "const char VERSION[] = \"{{ version }}\";\n".into(),
                interface_counts: "extern const size_t STATE_COUNT;\nextern const size_t VARIABLE_COUNT;\n".into(),
                implementation_counts: "const size_t STATE_COUNT = {{ state_count }};\nconst size_t VARIABLE_COUNT = {{ variable_count }};\n".into(),
                interface_variable_type: concat!(
                    "typedef enum {\n",
                    "    VARIABLE_OF_INTEGRATION,\n",
                    "    STATE,\n",
                    "    CONSTANT,\n",
                    "    COMPUTED_CONSTANT,\n",
                    "    ALGEBRAIC,\n",
                    "    EXTERNAL\n",
                    "} VariableType;\n",
                )
                .into(),
                implementation_variable_type: "".into(),
                interface_variable_info_object: concat!(
                    "typedef struct {\n",
                    "    char name[{{ name_size }}];\n",
                    "    char units[{{ units_size }}];\n",
                    "    char component[{{ component_size }}];\n",
                    "    VariableType type;\n",
                    "} VariableInfo;\n",
                )
                .into(),
                variable_info_entry: "{\"{{ name }}\", \"{{ units }}\", \"{{ component }}\", {{ kind }}}".into(),
                interface_voi_info: "extern const VariableInfo VOI_INFO;\n".into(),
                implementation_voi_info: "const VariableInfo VOI_INFO = {{ entry }};\n".into(),
                interface_state_info: "extern const VariableInfo STATE_INFO[];\n".into(),
                implementation_state_info: "const VariableInfo STATE_INFO[] = {\n{{ entries }}};\n".into(),
                interface_variable_info: "extern const VariableInfo VARIABLE_INFO[];\n".into(),
                implementation_variable_info: "const VariableInfo VARIABLE_INFO[] = {\n{{ entries }}};\n".into(),
                interface_external_variable_method_type: "typedef double (* ExternalVariable)({% if voi %}double voi, double *states, double *rates, {% endif %}double *variables, size_t index);\n".into(),
                interface_create_states_array: "double * createStatesArray();\n".into(),
                implementation_create_states_array: concat!(
                    "double * createStatesArray()\n",
                    "{\n",
                    "    double *res = (double *) malloc(STATE_COUNT*sizeof(double));\n",
                    "\n",
                    "    for (size_t i = 0; i < STATE_COUNT; ++i) {\n",
                    "        res[i] = NAN;\n",
                    "    }\n",
                    "\n",
                    "    return res;\n",
                    "}\n",
                )
                .into(),
                interface_create_variables_array: "double * createVariablesArray();\n".into(),
                implementation_create_variables_array: concat!(
                    "double * createVariablesArray()\n",
                    "{\n",
                    "    double *res = (double *) malloc(VARIABLE_COUNT*sizeof(double));\n",
                    "\n",
                    "    for (size_t i = 0; i < VARIABLE_COUNT; ++i) {\n",
                    "        res[i] = NAN;\n",
                    "    }\n",
                    "\n",
                    "    return res;\n",
                    "}\n",
                )
                .into(),
                interface_delete_array: "void deleteArray(double *array);\n".into(),
                implementation_delete_array: "void deleteArray(double *array)\n{\n    free(array);\n}\n".into(),
                implementation_objective_function: concat!(
                    "void objectiveFunction{{ index }}(double *u, double *f, void *data)\n",
                    "{\n",
                    "{% if voi %}\n",
                    "    double voi = ((RootFindingInfo *) data)->voi;\n",
                    "    double *states = ((RootFindingInfo *) data)->states;\n",
                    "    double *rates = ((RootFindingInfo *) data)->rates;\n",
                    "{% endif %}\n",
                    "    double *variables = ((RootFindingInfo *) data)->variables;\n",
                    "\n",
                    "{{ unpack }}\n",
                    "{{ residuals }}}\n",
                )
                .into(),
                implementation_find_root: concat!(
                    "void findRoot{{ index }}({{ parameters }})\n",
                    "{\n",
                    "    RootFindingInfo rfi = { {{ arguments }} };\n",
                    "    double u[{{ size }}];\n",
                    "\n",
                    "{{ pack }}\n",
                    "    nlaSolve(objectiveFunction{{ index }}, u, {{ size }}, &rfi);\n",
                    "\n",
                    "{{ unpack }}}\n",
                )
                .into(),
                find_root_call: "findRoot{{ index }}({{ arguments }})".into(),
                external_variable_call: "{{ name }}({{ arguments }}, {{ index }})".into(),
                interface_initialize_constants: "void initializeConstants({{ parameters }});\n".into(),
                implementation_initialize_constants: "void initializeConstants({{ parameters }})\n{\n{{ code }}}\n".into(),
                interface_compute_computed_constants: "void computeComputedConstants({{ parameters }});\n".into(),
                implementation_compute_computed_constants: "void computeComputedConstants({{ parameters }})\n{\n{{ code }}}\n".into(),
                interface_compute_rates: "void computeRates({{ parameters }});\n".into(),
                implementation_compute_rates: "void computeRates({{ parameters }})\n{\n{{ code }}}\n".into(),
                interface_compute_variables: "void computeVariables({{ parameters }});\n".into(),
                implementation_compute_variables: "void computeVariables({{ parameters }})\n{\n{{ code }}}\n".into(),
            },
        }
    }

    // =========================================================================
    // Python
    // =========================================================================

    pub fn python() -> Self {
        let relational = [
            (HelperFunction::Eq, "eq_func", "x == y"),
            (HelperFunction::Neq, "neq_func", "x != y"),
            (HelperFunction::Lt, "lt_func", "x < y"),
            (HelperFunction::Leq, "leq_func", "x <= y"),
            (HelperFunction::Gt, "gt_func", "x > y"),
            (HelperFunction::Geq, "geq_func", "x >= y"),
            (HelperFunction::And, "and_func", "bool(x) & bool(y)"),
            (HelperFunction::Or, "or_func", "bool(x) | bool(y)"),
            (HelperFunction::Xor, "xor_func", "bool(x) ^ bool(y)"),
        ]
        .into_iter()
        .map(|(f, name, test)| {
            (
                f,
                format!(
                    "def {}(x, y):\n    return 1.0 if {} else 0.0\n",
                    name, test
                ),
            )
        });
        let not = std::iter::once((
            HelperFunction::Not,
            "def not_func(x):\n    return 1.0 if not bool(x) else 0.0\n".to_string(),
        ));
        let reciprocal = [
            (HelperFunction::Sec, "sec", "1.0/cos(x)"),
            (HelperFunction::Csc, "csc", "1.0/sin(x)"),
            (HelperFunction::Cot, "cot", "1.0/tan(x)"),
            (HelperFunction::Sech, "sech", "1.0/cosh(x)"),
            (HelperFunction::Csch, "csch", "1.0/sinh(x)"),
            (HelperFunction::Coth, "coth", "1.0/tanh(x)"),
            (HelperFunction::Asec, "asec", "acos(1.0/x)"),
            (HelperFunction::Acsc, "acsc", "asin(1.0/x)"),
            (HelperFunction::Acot, "acot", "atan(1.0/x)"),
        ]
        .into_iter()
        .map(|(f, name, body)| (f, format!("def {}(x):\n    return {}\n", name, body)));
        let inverse_hyperbolic = [
            (
                HelperFunction::Asech,
                "asech",
                "log(one_over_x+sqrt(one_over_x*one_over_x-1.0))",
            ),
            (
                HelperFunction::Acsch,
                "acsch",
                "log(one_over_x+sqrt(one_over_x*one_over_x+1.0))",
            ),
            (
                HelperFunction::Acoth,
                "acoth",
                "0.5*log((1.0+one_over_x)/(1.0-one_over_x))",
            ),
        ]
        .into_iter()
        .map(|(f, name, body)| {
            (
                f,
                format!(
                    "def {}(x):\n    one_over_x = 1.0/x\n\n    return {}\n",
                    name, body
                ),
            )
        });
        let helpers: OrderMap<HelperFunction, String> = relational
            .chain(not)
            .chain(reciprocal)
            .chain(inverse_hyperbolic)
            .collect();

        Self {
            kind: ProfileKind::Python,
            has_interface: false,
            refuse_invalid_models: true,
            operators: Operators {
                assignment: " = ".into(),
                eq: "eq_func".into(),
                neq: "neq_func".into(),
                lt: "lt_func".into(),
                leq: "leq_func".into(),
                gt: "gt_func".into(),
                geq: "geq_func".into(),
                and: "and_func".into(),
                or: "or_func".into(),
                xor: "xor_func".into(),
                not: "not_func".into(),
                has_eq_operator: false,
                has_neq_operator: false,
                has_lt_operator: false,
                has_leq_operator: false,
                has_gt_operator: false,
                has_geq_operator: false,
                has_and_operator: false,
                has_or_operator: false,
                has_xor_operator: false,
                has_not_operator: false,
                plus: "+".into(),
                minus: "-".into(),
                times: "*".into(),
                divide: "/".into(),
            },
            functions: common_functions("min", "max"),
            constants: Constants {
                true_value: "1.0".into(),
                false_value: "0.0".into(),
                e: "e".into(),
                pi: "pi".into(),
                inf: "inf".into(),
                nan: "nan".into(),
            },
            piecewise: Piecewise {
                conditional_operator_if: "{{ value }} if {{ condition }}".into(),
                conditional_operator_else: " else {{ value }}".into(),
            },
            helpers,
            naming: Naming {
                interface_file_name: "".into(),
                voi: "voi".into(),
                states: "states".into(),
                rates: "rates".into(),
                variables: "variables".into(),
                external_variable: "external_variable".into(),
                voi_parameter: "voi".into(),
                states_parameter: "states".into(),
                rates_parameter: "rates".into(),
                variables_parameter: "variables".into(),
                external_variable_parameter: "external_variable".into(),
                unknowns: "u".into(),
                residuals: "f".into(),
                open_bracket: "[".into(),
                close_bracket: "]".into(),
                indent: "    ".into(),
                statement_end: "".into(),
                empty_method: "pass".into(),
            },
            sections: Sections {
                origin_comment: "# The content of this file was generated using {{ profile }} of cellgen {{ version }}.\n".into(),
                interface_header: "".into(),
                implementation_header: "from enum import Enum\nfrom math import *\n".into(),
                implementation_nla_solver: "from nlasolver import nla_solve\n".into(),
                interface_version: "".into(),
                implementation_version: "CELLGEN_VERSION = \"{{ version }}\"\n".into(),
                interface_counts: "".into(),
                implementation_counts: "STATE_COUNT = {{ state_count }}\nVARIABLE_COUNT = {{ variable_count }}\n".into(),
                interface_variable_type: "".into(),
                implementation_variable_type: concat!(
                    "class VariableType(Enum):\n",
                    "    VARIABLE_OF_INTEGRATION = 0\n",
                    "    STATE = 1\n",
                    "    CONSTANT = 2\n",
                    "    COMPUTED_CONSTANT = 3\n",
                    "    ALGEBRAIC = 4\n",
                    "    EXTERNAL = 5\n",
                )
                .into(),
                interface_variable_info_object: "".into(),
                variable_info_entry: "{\"name\": \"{{ name }}\", \"units\": \"{{ units }}\", \"component\": \"{{ component }}\", \"type\": VariableType.{{ kind }}}".into(),
                interface_voi_info: "".into(),
                implementation_voi_info: "VOI_INFO = {{ entry }}\n".into(),
                interface_state_info: "".into(),
                implementation_state_info: "STATE_INFO = [\n{{ entries }}]\n".into(),
                interface_variable_info: "".into(),
                implementation_variable_info: "VARIABLE_INFO = [\n{{ entries }}]\n".into(),
                interface_external_variable_method_type: "".into(),
                interface_create_states_array: "".into(),
                implementation_create_states_array: "def create_states_array():\n    return [nan]*STATE_COUNT\n".into(),
                interface_create_variables_array: "".into(),
                implementation_create_variables_array: "def create_variables_array():\n    return [nan]*VARIABLE_COUNT\n".into(),
                interface_delete_array: "".into(),
                implementation_delete_array: "".into(),
                implementation_objective_function: concat!(
                    "def objective_function_{{ index }}(u, f, data):\n",
                    "{% if voi %}\n",
                    "    voi = data[0]\n",
                    "    states = data[1]\n",
                    "    rates = data[2]\n",
                    "    variables = data[3]\n",
                    "{% else %}\n",
                    "    variables = data[0]\n",
                    "{% endif %}\n",
                    "\n",
                    "{{ unpack }}\n",
                    "{{ residuals }}",
                )
                .into(),
                implementation_find_root: concat!(
                    "def find_root_{{ index }}({{ parameters }}):\n",
                    "    u = [nan]*{{ size }}\n",
                    "\n",
                    "{{ pack }}\n",
                    "    u = nla_solve(objective_function_{{ index }}, u, {{ size }}, [{{ arguments }}])\n",
                    "\n",
                    "{{ unpack }}",
                )
                .into(),
                find_root_call: "find_root_{{ index }}({{ arguments }})".into(),
                external_variable_call: "{{ name }}({{ arguments }}, {{ index }})".into(),
                interface_initialize_constants: "".into(),
                implementation_initialize_constants: "def initialize_constants({{ parameters }}):\n{{ code }}".into(),
                interface_compute_computed_constants: "".into(),
                implementation_compute_computed_constants: "def compute_computed_constants({{ parameters }}):\n{{ code }}".into(),
                interface_compute_rates: "".into(),
                implementation_compute_rates: "def compute_rates({{ parameters }}):\n{{ code }}".into(),
                interface_compute_variables: "".into(),
                implementation_compute_variables: "def compute_variables({{ parameters }}):\n{{ code }}".into(),
            },
        }
    }
}

fn common_functions(min: &str, max: &str) -> Functions {
    Functions {
        power: "pow".into(),
        square_root: "sqrt".into(),
        square: "".into(),
        absolute_value: "fabs".into(),
        exponential: "exp".into(),
        natural_log: "log".into(),
        common_log: "log10".into(),
        ceiling: "ceil".into(),
        floor: "floor".into(),
        min: min.into(),
        max: max.into(),
        rem: "fmod".into(),
        sin: "sin".into(),
        cos: "cos".into(),
        tan: "tan".into(),
        sec: "sec".into(),
        csc: "csc".into(),
        cot: "cot".into(),
        sinh: "sinh".into(),
        cosh: "cosh".into(),
        tanh: "tanh".into(),
        sech: "sech".into(),
        csch: "csch".into(),
        coth: "coth".into(),
        asin: "asin".into(),
        acos: "acos".into(),
        atan: "atan".into(),
        asec: "asec".into(),
        acsc: "acsc".into(),
        acot: "acot".into(),
        asinh: "asinh".into(),
        acosh: "acosh".into(),
        atanh: "atanh".into(),
        asech: "asech".into(),
        acsch: "acsch".into(),
        acoth: "acoth".into(),
    }
}
