use super::expression::ExpressionRenderer;
use super::profile::{GeneratorProfile, ProfileKind};
use crate::s2_analyzer::analyser_model::{
    AnalyserEquation, AnalyserModel, AnalyserVariable, EquationType, InitialValueSlot,
    VariableSlot, VariableType,
};
use crate::s2_analyzer::ast::AstKind;
use minijinja::{context, Environment, ErrorKind, Value};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("model '{name}' is invalid and the {profile} profile refuses invalid models")]
    InvalidModel { name: String, profile: ProfileKind },
    #[error("malformed equation: {kind:?} node is missing an operand")]
    MissingOperand { kind: AstKind },
    #[error("external equation {order} does not compute a variable")]
    MissingExternalTarget { order: usize },
}

/// Template function aborting the rendering with a message.
pub fn panic(msg: &str) -> Result<String, minijinja::Error> {
    Err(minijinja::Error::new(
        ErrorKind::InvalidOperation,
        msg.to_string(),
    ))
}

/// Template function logging a warning.
pub fn warn(msg: &str) {
    log::warn!("{}", msg);
}

pub fn template_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.add_function("panic", panic);
    env.add_function("warn", warn);
    env
}

/// Renders analysed models as source code for one profile.
pub struct Generator {
    profile: GeneratorProfile,
    env: Environment<'static>,
}

impl Generator {
    pub fn new(profile: GeneratorProfile) -> Self {
        Self {
            profile,
            env: template_environment(),
        }
    }

    pub fn profile(&self) -> &GeneratorProfile {
        &self.profile
    }

    /// Header declaring what the implementation defines. Empty for profiles
    /// without an interface.
    pub fn interface_code(&self, model: &AnalyserModel) -> Result<String, GeneratorError> {
        self.check(model)?;
        if !self.profile.has_interface {
            return Ok(String::new());
        }
        log::debug!(
            "generating {} interface code for model '{}'",
            self.profile.kind,
            model.name()
        );
        let mut emitter = Emitter::new(&self.profile, model, &self.env);
        emitter.interface()?;
        Ok(emitter.code)
    }

    pub fn implementation_code(&self, model: &AnalyserModel) -> Result<String, GeneratorError> {
        self.check(model)?;
        log::debug!(
            "generating {} implementation code for model '{}'",
            self.profile.kind,
            model.name()
        );
        let mut emitter = Emitter::new(&self.profile, model, &self.env);
        emitter.implementation()?;
        Ok(emitter.code)
    }

    fn check(&self, model: &AnalyserModel) -> Result<(), GeneratorError> {
        if self.profile.refuse_invalid_models && !model.is_valid() {
            return Err(GeneratorError::InvalidModel {
                name: model.name().to_string(),
                profile: self.profile.kind,
            });
        }
        Ok(())
    }
}

/// Implementation code of `model` for `profile`.
pub fn generate_code(
    model: &AnalyserModel,
    profile: &GeneratorProfile,
) -> Result<String, GeneratorError> {
    Generator::new(profile.clone()).implementation_code(model)
}

// =============================================================================
// Emitter
// =============================================================================

struct Emitter<'a> {
    profile: &'a GeneratorProfile,
    model: &'a AnalyserModel,
    env: &'a Environment<'static>,
    renderer: ExpressionRenderer<'a>,
    has_voi: bool,
    has_externals: bool,
    code: String,
}

impl<'a> Emitter<'a> {
    fn new(
        profile: &'a GeneratorProfile,
        model: &'a AnalyserModel,
        env: &'a Environment<'static>,
    ) -> Self {
        Self {
            profile,
            model,
            env,
            renderer: ExpressionRenderer::new(profile, model, env),
            has_voi: model.voi().is_some(),
            has_externals: model.has_external_variables(),
            code: String::new(),
        }
    }

    /// Sections are separated by one empty line; empty sections vanish.
    fn add(&mut self, section: String) {
        if section.is_empty() {
            return;
        }
        if !self.code.is_empty() {
            self.code.push('\n');
        }
        self.code.push_str(&section);
    }

    fn render(&self, template: &str, ctx: Value) -> Result<String, GeneratorError> {
        if template.is_empty() {
            return Ok(String::new());
        }
        Ok(self.env.render_str(template, ctx)?)
    }

    fn origin_comment(&mut self) -> Result<(), GeneratorError> {
        let section = self.render(
            &self.profile.sections.origin_comment,
            context! {
                profile => self.profile.description(),
                version => env!("CARGO_PKG_VERSION"),
            },
        )?;
        self.add(section);
        Ok(())
    }

    // ===== Interface =====

    fn interface(&mut self) -> Result<(), GeneratorError> {
        let profile = self.profile;
        let s = &profile.sections;
        let version = env!("CARGO_PKG_VERSION");

        self.origin_comment()?;
        self.add(self.render(&s.interface_header, context! {})?);
        self.add(self.render(&s.interface_version, context! { version })?);
        self.add(self.render(&s.interface_counts, context! {})?);
        self.add(self.render(&s.interface_variable_type, context! {})?);

        let (name_size, units_size, component_size) = self.info_sizes();
        self.add(self.render(
            &s.interface_variable_info_object,
            context! { name_size, units_size, component_size },
        )?);

        let mut info = String::new();
        if self.has_voi {
            info += &self.render(&s.interface_voi_info, context! {})?;
            info += &self.render(&s.interface_state_info, context! {})?;
        }
        if self.model.variable_count() > 0 {
            info += &self.render(&s.interface_variable_info, context! {})?;
        }
        self.add(info);

        if self.has_externals {
            self.add(self.render(
                &s.interface_external_variable_method_type,
                context! { voi => self.has_voi },
            )?);
        }

        let mut arrays = String::new();
        if self.has_voi {
            arrays += &self.render(&s.interface_create_states_array, context! {})?;
        }
        arrays += &self.render(&s.interface_create_variables_array, context! {})?;
        arrays += &self.render(&s.interface_delete_array, context! {})?;
        self.add(arrays);

        let mut methods = self.render(
            &s.interface_initialize_constants,
            context! { parameters => self.initialize_constants_parameters() },
        )?;
        methods += &self.render(
            &s.interface_compute_computed_constants,
            context! { parameters => self.profile.naming.variables_parameter.clone() },
        )?;
        if self.has_voi {
            methods += &self.render(
                &s.interface_compute_rates,
                context! { parameters => self.compute_parameters(true) },
            )?;
        }
        methods += &self.render(
            &s.interface_compute_variables,
            context! { parameters => self.compute_parameters(self.has_voi) },
        )?;
        self.add(methods);
        Ok(())
    }

    // ===== Implementation =====

    fn implementation(&mut self) -> Result<(), GeneratorError> {
        let profile = self.profile;
        let s = &profile.sections;
        let version = env!("CARGO_PKG_VERSION");

        self.origin_comment()?;
        self.add(self.render(
            &s.implementation_header,
            context! { interface_file_name => self.profile.naming.interface_file_name.clone() },
        )?);
        if !self.model.cycles().is_empty() {
            self.add(self.render(
                &s.implementation_nla_solver,
                context! { voi => self.has_voi },
            )?);
        }
        self.add(self.render(&s.implementation_version, context! { version })?);
        self.add(self.render(
            &s.implementation_counts,
            context! {
                state_count => self.model.state_count(),
                variable_count => self.model.variable_count(),
            },
        )?);
        self.add(self.render(&s.implementation_variable_type, context! {})?);

        let model = self.model;
        if let Some(voi) = model.voi() {
            let entry = self.info_entry(voi)?;
            self.add(self.render(&s.implementation_voi_info, context! { entry })?);
            let entries = self.info_entries(model.states())?;
            self.add(self.render(&s.implementation_state_info, context! { entries })?);
        }
        if model.variable_count() > 0 {
            let entries = self.info_entries(model.variables())?;
            self.add(self.render(&s.implementation_variable_info, context! { entries })?);
        }

        self.helper_functions();

        if self.has_voi {
            self.add(self.render(&s.implementation_create_states_array, context! {})?);
        }
        self.add(self.render(&s.implementation_create_variables_array, context! {})?);
        self.add(self.render(&s.implementation_delete_array, context! {})?);

        for index in 0..self.model.cycles().len() {
            self.nla_functions(index)?;
        }

        self.initialize_constants()?;
        self.compute_computed_constants()?;
        if self.has_voi {
            self.compute_rates()?;
        }
        self.compute_variables()?;
        Ok(())
    }

    /// Needed helpers, skipping relational and logical ones the profile
    /// writes as operators.
    fn helper_functions(&mut self) {
        let (profile, model) = (self.profile, self.model);
        for function in model.needs().iter() {
            if function.is_relational_or_logical() && profile.has_operator(function) {
                continue;
            }
            if let Some(code) = profile.helpers.get(&function) {
                self.add(code.clone());
            }
        }
    }

    // ===== Variable information =====

    fn info_sizes(&self) -> (usize, usize, usize) {
        let all: Vec<&AnalyserVariable> = self
            .model
            .voi()
            .into_iter()
            .chain(self.model.states())
            .chain(self.model.variables())
            .collect();
        let size = |f: fn(&AnalyserVariable) -> usize| all.iter().map(|v| f(v)).max().unwrap_or(0) + 1;
        (
            size(|v| v.name().len()),
            size(|v| v.units().len()),
            size(|v| v.component().len()),
        )
    }

    fn info_entry(&self, variable: &AnalyserVariable) -> Result<String, GeneratorError> {
        self.render(
            &self.profile.sections.variable_info_entry,
            context! {
                name => variable.name(),
                units => variable.units(),
                component => variable.component(),
                kind => type_name(variable.kind()),
            },
        )
    }

    fn info_entries(&self, variables: &[AnalyserVariable]) -> Result<String, GeneratorError> {
        let entries = variables
            .iter()
            .map(|v| Ok(format!("{}{}", self.profile.naming.indent, self.info_entry(v)?)))
            .collect::<Result<Vec<String>, GeneratorError>>()?;
        if entries.is_empty() {
            return Ok(String::new());
        }
        Ok(entries.join(",\n") + "\n")
    }

    // ===== Parameters =====

    fn initialize_constants_parameters(&self) -> String {
        let naming = &self.profile.naming;
        if self.has_voi {
            format!("{}, {}", naming.states_parameter, naming.variables_parameter)
        } else {
            naming.variables_parameter.clone()
        }
    }

    fn compute_parameters(&self, with_voi: bool) -> String {
        let naming = &self.profile.naming;
        let mut parameters = if with_voi {
            vec![
                naming.voi_parameter.as_str(),
                &naming.states_parameter,
                &naming.rates_parameter,
                &naming.variables_parameter,
            ]
        } else {
            vec![naming.variables_parameter.as_str()]
        };
        if self.has_externals {
            parameters.push(&naming.external_variable_parameter);
        }
        parameters.join(", ")
    }

    /// Arrays passed on to root finding and external variable callbacks.
    fn arguments(&self) -> String {
        let naming = &self.profile.naming;
        if self.has_voi {
            [
                naming.voi.as_str(),
                &naming.states,
                &naming.rates,
                &naming.variables,
            ]
            .join(", ")
        } else {
            naming.variables.clone()
        }
    }

    fn root_finding_parameters(&self) -> String {
        let naming = &self.profile.naming;
        if self.has_voi {
            [
                naming.voi_parameter.as_str(),
                &naming.states_parameter,
                &naming.rates_parameter,
                &naming.variables_parameter,
            ]
            .join(", ")
        } else {
            naming.variables_parameter.clone()
        }
    }

    // ===== Statements =====

    fn body(&self, statements: &[String]) -> String {
        let naming = &self.profile.naming;
        if statements.is_empty() {
            if naming.empty_method.is_empty() {
                return String::new();
            }
            return format!("{}{}\n", naming.indent, naming.empty_method);
        }
        statements
            .iter()
            .map(|s| format!("{}{}{}\n", naming.indent, s, naming.statement_end))
            .collect()
    }

    fn assignment(&self, target: &str, value: &str) -> String {
        format!("{}{}{}", target, self.profile.operators.assignment, value)
    }

    fn array_element(&self, array: &str, index: usize) -> String {
        let naming = &self.profile.naming;
        format!(
            "{}{}{}{}",
            array, naming.open_bracket, index, naming.close_bracket
        )
    }

    fn equation_code(&self, equation: &AnalyserEquation) -> Result<String, GeneratorError> {
        if equation.kind() == EquationType::External {
            let index = match equation.variable() {
                Some(VariableSlot::Variable(index)) => index,
                _ => {
                    return Err(GeneratorError::MissingExternalTarget {
                        order: equation.order(),
                    })
                }
            };
            let call = self.render(
                &self.profile.sections.external_variable_call,
                context! {
                    name => self.profile.naming.external_variable.clone(),
                    arguments => self.arguments(),
                    index,
                },
            )?;
            return Ok(self.assignment(&self.renderer.slot(VariableSlot::Variable(index)), &call));
        }
        let ast = equation.ast();
        self.renderer.render(ast, ast.root())
    }

    /// Statements of the equations selected by `filter`, in execution order.
    /// A cycle group becomes one call to its root finder.
    fn equations_code<F>(&self, filter: F) -> Result<Vec<String>, GeneratorError>
    where
        F: Fn(&AnalyserEquation) -> bool,
    {
        let mut statements = Vec::new();
        let mut solved = BTreeSet::new();
        for equation in self.model.equations() {
            if !filter(equation) {
                continue;
            }
            match equation.cycle() {
                Some(group) => {
                    if solved.insert(group) {
                        statements.push(self.render(
                            &self.profile.sections.find_root_call,
                            context! { index => group, arguments => self.arguments() },
                        )?);
                    }
                }
                None => statements.push(self.equation_code(equation)?),
            }
        }
        Ok(statements)
    }

    // ===== Methods =====

    fn initialize_constants(&mut self) -> Result<(), GeneratorError> {
        let mut statements = Vec::new();
        let literal = |initial: Option<&InitialValueSlot>| match initial {
            Some(InitialValueSlot::Literal(v)) => Some(self.renderer.number(v)),
            _ => None,
        };
        let from_variable = |initial: Option<&InitialValueSlot>| match initial {
            Some(InitialValueSlot::Variable(slot)) => Some(self.renderer.slot(*slot)),
            _ => None,
        };

        for state in self.model.states() {
            if let Some(value) = literal(state.initial_value()) {
                statements.push(self.assignment(&self.renderer.slot(state.slot()), &value));
            }
        }
        for variable in self.model.variables() {
            if variable.kind() != VariableType::Constant {
                continue;
            }
            if let Some(value) = literal(variable.initial_value()) {
                statements.push(self.assignment(&self.renderer.slot(variable.slot()), &value));
            }
        }
        for variable in self.model.variables() {
            if variable.kind() != VariableType::Constant {
                continue;
            }
            if let Some(value) = from_variable(variable.initial_value()) {
                statements.push(self.assignment(&self.renderer.slot(variable.slot()), &value));
            }
        }
        for state in self.model.states() {
            if let Some(value) = from_variable(state.initial_value()) {
                statements.push(self.assignment(&self.renderer.slot(state.slot()), &value));
            }
        }
        statements.extend(self.equations_code(|eq| eq.kind() == EquationType::TrueConstant)?);

        // initial guesses for the non-linear solver, rates are seeded where
        // the rates array is in scope
        for cycle in self.model.cycles() {
            for unknown in cycle.unknowns() {
                if !matches!(unknown, VariableSlot::Rate(_)) {
                    statements.push(self.assignment(&self.renderer.slot(*unknown), "0.0"));
                }
            }
        }

        let section = self.render(
            &self.profile.sections.implementation_initialize_constants,
            context! {
                parameters => self.initialize_constants_parameters(),
                code => self.body(&statements),
            },
        )?;
        self.add(section);
        Ok(())
    }

    fn compute_computed_constants(&mut self) -> Result<(), GeneratorError> {
        let statements =
            self.equations_code(|eq| eq.kind() == EquationType::VariableBasedConstant)?;
        let section = self.render(
            &self.profile.sections.implementation_compute_computed_constants,
            context! {
                parameters => self.profile.naming.variables_parameter.clone(),
                code => self.body(&statements),
            },
        )?;
        self.add(section);
        Ok(())
    }

    fn compute_rates(&mut self) -> Result<(), GeneratorError> {
        let statements = self.equations_code(|eq| eq.is_needed_for_rates())?;
        let section = self.render(
            &self.profile.sections.implementation_compute_rates,
            context! {
                parameters => self.compute_parameters(true),
                code => self.body(&statements),
            },
        )?;
        self.add(section);
        Ok(())
    }

    fn compute_variables(&mut self) -> Result<(), GeneratorError> {
        let statements = self.equations_code(|eq| {
            matches!(eq.kind(), EquationType::Algebraic | EquationType::External)
        })?;
        let section = self.render(
            &self.profile.sections.implementation_compute_variables,
            context! {
                parameters => self.compute_parameters(self.has_voi),
                code => self.body(&statements),
            },
        )?;
        self.add(section);
        Ok(())
    }

    /// Objective and root-finding functions of one cycle group.
    fn nla_functions(&mut self, index: usize) -> Result<(), GeneratorError> {
        let (profile, model) = (self.profile, self.model);
        let naming = &profile.naming;
        let cycle = &model.cycles()[index];

        let mut unpack = Vec::new();
        let mut seed = Vec::new();
        let mut pack = Vec::new();
        for (k, unknown) in cycle.unknowns().iter().enumerate() {
            let slot = self.renderer.slot(*unknown);
            let u = self.array_element(&naming.unknowns, k);
            if let VariableSlot::Rate(_) = unknown {
                seed.push(self.assignment(&slot, "0.0"));
            }
            unpack.push(self.assignment(&slot, &u));
            pack.push(self.assignment(&u, &slot));
        }
        seed.append(&mut pack);
        let pack = seed;

        let mut residuals = Vec::new();
        for (k, e) in cycle.equations().iter().enumerate() {
            let ast = model.equations()[*e].ast();
            let root = ast.root();
            let (lhs, rhs) = match (ast.left_child(root), ast.right_child(root)) {
                (Some(l), Some(r)) => (l, r),
                _ => return Err(GeneratorError::MissingOperand { kind: ast.kind(root) }),
            };
            let residual = format!(
                "{}{}({})",
                self.renderer.render(ast, lhs)?,
                profile.operators.minus,
                self.renderer.render(ast, rhs)?
            );
            residuals.push(self.assignment(&self.array_element(&naming.residuals, k), &residual));
        }

        let objective = self.render(
            &profile.sections.implementation_objective_function,
            context! {
                index,
                voi => self.has_voi,
                unpack => self.body(&unpack),
                residuals => self.body(&residuals),
            },
        )?;
        self.add(objective);

        let find_root = self.render(
            &profile.sections.implementation_find_root,
            context! {
                index,
                parameters => self.root_finding_parameters(),
                arguments => self.arguments(),
                size => cycle.unknowns().len(),
                pack => self.body(&pack),
                unpack => self.body(&unpack),
            },
        )?;
        self.add(find_root);
        Ok(())
    }
}

fn type_name(kind: VariableType) -> &'static str {
    match kind {
        VariableType::VariableOfIntegration => "VARIABLE_OF_INTEGRATION",
        VariableType::State => "STATE",
        VariableType::Constant => "CONSTANT",
        VariableType::ComputedConstant => "COMPUTED_CONSTANT",
        VariableType::Algebraic => "ALGEBRAIC",
        VariableType::External => "EXTERNAL",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s1_model::{Component, Expr, Model, Operator, Variable};
    use crate::s2_analyzer::analyser::Analyser;
    use crate::s2_analyzer::external::AnalyserExternalVariable;

    fn analyse(model: &Model) -> AnalyserModel {
        Analyser::new().analyse_model(model).clone()
    }

    fn algebraic_model() -> Model {
        // y = a * 2, a = 3 (initial)
        Model::new("algebraic").with_component(
            Component::new("c")
                .with_variable(Variable::new("a", "metre").with_initial_value(3.0))
                .with_variable(Variable::new("y", "metre"))
                .with_equation(
                    Expr::ci("y"),
                    Expr::binary(Operator::Times, Expr::ci("a"), Expr::cn(2.0)),
                ),
        )
    }

    #[test]
    fn test_sections_are_separated_by_one_blank_line() {
        let profile = GeneratorProfile::c();
        let model = AnalyserModel::default();
        let env = template_environment();
        let mut emitter = Emitter::new(&profile, &model, &env);
        emitter.add("a\n".to_string());
        emitter.add(String::new());
        emitter.add("b\n".to_string());
        assert_eq!(emitter.code, "a\n\nb\n");
    }

    #[test]
    fn test_algebraic_model_has_no_state_machinery() {
        let analysed = analyse(&algebraic_model());
        let code = generate_code(&analysed, &GeneratorProfile::python()).unwrap();
        assert!(code.contains("STATE_COUNT = 0\n"));
        assert!(!code.contains("VOI_INFO"));
        assert!(!code.contains("def compute_rates"));
        assert!(!code.contains("def create_states_array"));
        assert!(code.contains("def initialize_constants(variables):\n    variables[0] = 3.0\n"));
        assert!(code.contains(
            "def compute_computed_constants(variables):\n    variables[1] = variables[0]*2.0\n"
        ));
        assert!(code.contains("def compute_variables(variables):\n    pass\n"));
    }

    #[test]
    fn test_c_empty_method_body() {
        let analysed = analyse(&algebraic_model());
        let code = generate_code(&analysed, &GeneratorProfile::c()).unwrap();
        assert!(code.contains("void computeVariables(double *variables)\n{\n}\n"));
        assert!(code.contains("#include \"model.h\"\n"));
    }

    #[test]
    fn test_invalid_model_is_refused() {
        let broken = Model::new("broken").with_component(
            Component::new("c")
                .with_variable(Variable::new("x", "metre"))
                .with_variable(Variable::new("y", "metre"))
                .with_equation(Expr::ci("x"), Expr::ci("y")),
        );
        let analysed = analyse(&broken);
        assert!(!analysed.is_valid());
        let err = generate_code(&analysed, &GeneratorProfile::c()).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidModel { .. }));

        let mut lenient = GeneratorProfile::c();
        lenient.refuse_invalid_models = false;
        assert!(generate_code(&analysed, &lenient).is_ok());
    }

    #[test]
    fn test_external_equation_without_target_is_refused() {
        let model = algebraic_model();
        let y = model.variable_id("c", "y").unwrap();
        let mut analyser = Analyser::new();
        analyser.add_external_variable(AnalyserExternalVariable::new(y));
        let mut analysed = analyser.analyse_model(&model).clone();
        assert!(analysed.is_valid());
        assert!(generate_code(&analysed, &GeneratorProfile::c())
            .unwrap()
            .contains(" = externalVariable(variables, "));

        let external = analysed
            .equations
            .iter_mut()
            .find(|eq| eq.kind() == EquationType::External)
            .unwrap();
        external.variable = None;
        let err = generate_code(&analysed, &GeneratorProfile::c()).unwrap_err();
        assert!(matches!(err, GeneratorError::MissingExternalTarget { .. }));
    }

    #[test]
    fn test_template_panic() {
        let mut profile = GeneratorProfile::python();
        profile.sections.implementation_header = "{{ panic(\"no header\") }}".to_string();
        let analysed = analyse(&algebraic_model());
        let err = generate_code(&analysed, &profile).unwrap_err();
        assert!(matches!(err, GeneratorError::Template(_)));
    }

    #[test]
    fn test_python_has_no_interface() {
        let analysed = analyse(&algebraic_model());
        let generator = Generator::new(GeneratorProfile::python());
        assert_eq!(generator.interface_code(&analysed).unwrap(), "");
    }

    #[test]
    fn test_modified_profile_is_announced() {
        let mut profile = GeneratorProfile::c();
        profile.naming.indent = "  ".to_string();
        let analysed = analyse(&algebraic_model());
        let code = Generator::new(profile).implementation_code(&analysed).unwrap();
        assert!(code.starts_with("/* The content of this file was generated using a modified C profile of cellgen "));
        assert!(code.contains("  variables[0] = 3.0;\n"));
    }
}
