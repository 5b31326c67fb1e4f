//! Rendering of equation trees as target-language expressions.
//!
//! Parentheses are only emitted where precedence requires them, plus around
//! relational or mixed logical operands of a logical operator, which reads
//! better than relying on the target language's precedence table.

use super::generator::GeneratorError;
use super::profile::GeneratorProfile;
use crate::s2_analyzer::analyser_model::{AnalyserModel, VariableSlot};
use crate::s2_analyzer::ast::{AstId, AstKind, EquationAst};
use crate::s2_analyzer::function_collector::HelperFunction;
use minijinja::{context, Environment};

const CONDITIONAL: u8 = 0;
const OR: u8 = 1;
const XOR: u8 = 2;
const AND: u8 = 3;
const EQUALITY: u8 = 4;
const COMPARISON: u8 = 5;
const ADDITIVE: u8 = 6;
const MULTIPLICATIVE: u8 = 7;
const UNARY: u8 = 8;
const ATOM: u8 = 9;

pub struct ExpressionRenderer<'a> {
    profile: &'a GeneratorProfile,
    model: &'a AnalyserModel,
    env: &'a Environment<'static>,
}

impl<'a> ExpressionRenderer<'a> {
    pub fn new(
        profile: &'a GeneratorProfile,
        model: &'a AnalyserModel,
        env: &'a Environment<'static>,
    ) -> Self {
        Self {
            profile,
            model,
            env,
        }
    }

    /// Array element or name holding a slot.
    pub fn slot(&self, slot: VariableSlot) -> String {
        let naming = &self.profile.naming;
        let (array, index) = match slot {
            VariableSlot::Voi => return naming.voi.clone(),
            VariableSlot::State(i) => (&naming.states, i),
            VariableSlot::Rate(i) => (&naming.rates, i),
            VariableSlot::Variable(i) => (&naming.variables, i),
        };
        format!(
            "{}{}{}{}",
            array, naming.open_bracket, index, naming.close_bracket
        )
    }

    /// Literal with a decimal point, as every target expects doubles.
    pub fn number(&self, value: &str) -> String {
        match value.parse::<f64>() {
            Ok(v) if v.is_nan() => self.profile.constants.nan.clone(),
            Ok(v) if v.is_infinite() && v < 0.0 => {
                format!("{}{}", self.profile.operators.minus, self.profile.constants.inf)
            }
            Ok(v) if v.is_infinite() => self.profile.constants.inf.clone(),
            _ if value.contains('.') => value.to_string(),
            _ => match value.find(|c| c == 'e' || c == 'E') {
                Some(pos) => format!("{}.0{}", &value[..pos], &value[pos..]),
                None => format!("{}.0", value),
            },
        }
    }

    pub fn render(&self, ast: &EquationAst, id: AstId) -> Result<String, GeneratorError> {
        let kind = ast.kind(id);
        let ops = &self.profile.operators;
        let constants = &self.profile.constants;
        let code = match kind {
            AstKind::Assignment => {
                let (l, r) = self.operands(ast, id)?;
                format!(
                    "{}{}{}",
                    self.render(ast, l)?,
                    ops.assignment,
                    self.render(ast, r)?
                )
            }

            // relational and logical
            AstKind::Eq => self.relational(ast, id, &ops.eq)?,
            AstKind::Neq => self.relational(ast, id, &ops.neq)?,
            AstKind::Lt => self.relational(ast, id, &ops.lt)?,
            AstKind::Leq => self.relational(ast, id, &ops.leq)?,
            AstKind::Gt => self.relational(ast, id, &ops.gt)?,
            AstKind::Geq => self.relational(ast, id, &ops.geq)?,
            AstKind::And => self.relational(ast, id, &ops.and)?,
            AstKind::Or => self.relational(ast, id, &ops.or)?,
            AstKind::Xor => self.relational(ast, id, &ops.xor)?,
            AstKind::Not => {
                let operand = self.left(ast, id)?;
                if ops.has_not_operator {
                    format!("{}{}", ops.not, self.unary_operand(ast, operand)?)
                } else {
                    format!("{}({})", ops.not, self.render(ast, operand)?)
                }
            }

            // arithmetic
            AstKind::Plus | AstKind::Minus if ast.right_child(id).is_none() => {
                let operand = self.left(ast, id)?;
                let text = self.unary_operand(ast, operand)?;
                if kind == AstKind::Plus {
                    text
                } else {
                    format!("{}{}", ops.minus, text)
                }
            }
            AstKind::Plus => self.binary(ast, id, &ops.plus)?,
            AstKind::Minus => self.binary(ast, id, &ops.minus)?,
            AstKind::Times => self.binary(ast, id, &ops.times)?,
            AstKind::Divide => self.binary(ast, id, &ops.divide)?,
            AstKind::Power => self.power(ast, id)?,
            AstKind::Root => self.root(ast, id)?,
            AstKind::Log => self.log(ast, id)?,

            // calculus
            AstKind::Diff => {
                let state = self.right(ast, id)?;
                match ast.variable(state).and_then(|v| self.model.slot(v)) {
                    Some(VariableSlot::State(i)) => self.slot(VariableSlot::Rate(i)),
                    _ => self.render(ast, state)?,
                }
            }

            // piecewise
            AstKind::Piecewise | AstKind::Piece | AstKind::Otherwise => {
                self.piecewise(ast, Some(id))?
            }

            // qualifiers
            AstKind::Bvar | AstKind::Degree | AstKind::LogBase => {
                let child = self.left(ast, id)?;
                self.render(ast, child)?
            }

            // tokens
            AstKind::Ci => match ast.variable(id).and_then(|v| self.model.slot(v)) {
                Some(slot) => self.slot(slot),
                None => ast.value(id).to_string(),
            },
            AstKind::Cn => self.number(ast.value(id)),
            AstKind::True => constants.true_value.clone(),
            AstKind::False => constants.false_value.clone(),
            AstKind::E => constants.e.clone(),
            AstKind::Pi => constants.pi.clone(),
            AstKind::Inf => constants.inf.clone(),
            AstKind::Nan => constants.nan.clone(),

            // everything else is a plain function call
            _ => {
                let name = self.function_name(kind);
                let first = self.render(ast, self.left(ast, id)?)?;
                match ast.right_child(id) {
                    Some(r) => format!("{}({}, {})", name, first, self.render(ast, r)?),
                    None => format!("{}({})", name, first),
                }
            }
        };
        Ok(code)
    }

    // ===== Operators =====

    fn binary(&self, ast: &EquationAst, id: AstId, op: &str) -> Result<String, GeneratorError> {
        let (l, r) = self.operands(ast, id)?;
        let mut left = self.render(ast, l)?;
        let mut right = self.render(ast, r)?;
        if self.needs_parentheses(ast, id, l, false) {
            left = format!("({})", left);
        }
        if self.needs_parentheses(ast, id, r, true) {
            right = format!("({})", right);
        }
        Ok(format!("{}{}{}", left, op, right))
    }

    fn relational(&self, ast: &EquationAst, id: AstId, op: &str) -> Result<String, GeneratorError> {
        if self.has_operator_form(ast.kind(id)) {
            return self.binary(ast, id, op);
        }
        let (l, r) = self.operands(ast, id)?;
        Ok(format!(
            "{}({}, {})",
            op,
            self.render(ast, l)?,
            self.render(ast, r)?
        ))
    }

    fn unary_operand(&self, ast: &EquationAst, operand: AstId) -> Result<String, GeneratorError> {
        let text = self.render(ast, operand)?;
        if self.precedence(ast, operand) <= UNARY {
            Ok(format!("({})", text))
        } else {
            Ok(text)
        }
    }

    fn power(&self, ast: &EquationAst, id: AstId) -> Result<String, GeneratorError> {
        let functions = &self.profile.functions;
        let (l, r) = self.operands(ast, id)?;
        let base = self.render(ast, l)?;
        match self.literal(ast, r) {
            Some(v) if v == 0.5 => Ok(format!("{}({})", functions.square_root, base)),
            Some(v) if v == 2.0 && !functions.square.is_empty() => {
                Ok(format!("{}({})", functions.square, base))
            }
            _ => Ok(format!(
                "{}({}, {})",
                functions.power,
                base,
                self.render(ast, r)?
            )),
        }
    }

    fn root(&self, ast: &EquationAst, id: AstId) -> Result<String, GeneratorError> {
        let functions = &self.profile.functions;
        let (degree, arg) = self.qualified(ast, id, AstKind::Degree)?;
        let arg = self.render(ast, arg)?;
        match degree {
            Some(d) if self.literal(ast, d) != Some(2.0) => {
                let mut degree = self.render(ast, d)?;
                if self.precedence(ast, d) <= MULTIPLICATIVE {
                    degree = format!("({})", degree);
                }
                Ok(format!(
                    "{}({}, 1.0{}{})",
                    functions.power, arg, self.profile.operators.divide, degree
                ))
            }
            _ => Ok(format!("{}({})", functions.square_root, arg)),
        }
    }

    fn log(&self, ast: &EquationAst, id: AstId) -> Result<String, GeneratorError> {
        let functions = &self.profile.functions;
        let (base, arg) = self.qualified(ast, id, AstKind::LogBase)?;
        let arg = self.render(ast, arg)?;
        match base {
            Some(b) if self.literal(ast, b) != Some(10.0) => Ok(format!(
                "{}({}){}{}({})",
                functions.natural_log,
                arg,
                self.profile.operators.divide,
                functions.natural_log,
                self.render(ast, b)?
            )),
            _ => Ok(format!("{}({})", functions.common_log, arg)),
        }
    }

    /// `(c0)?v0:(c1)?v1:nan` or the profile's equivalent.
    fn piecewise(&self, ast: &EquationAst, id: Option<AstId>) -> Result<String, GeneratorError> {
        let Some(id) = id else {
            return Ok(self.profile.constants.nan.clone());
        };
        match ast.kind(id) {
            AstKind::Piecewise => match ast.left_child(id) {
                Some(first) if ast.kind(first) == AstKind::Piece => {
                    let head = self.piece(ast, first)?;
                    let rest = self.piecewise(ast, ast.right_child(id))?;
                    Ok(format!("{}{}", head, self.otherwise(&rest)?))
                }
                first => self.piecewise(ast, first),
            },
            AstKind::Piece => {
                let head = self.piece(ast, id)?;
                let nan = self.profile.constants.nan.clone();
                Ok(format!("{}{}", head, self.otherwise(&nan)?))
            }
            AstKind::Otherwise => {
                let value = self.left(ast, id)?;
                self.conditional_value(ast, value)
            }
            _ => self.conditional_value(ast, id),
        }
    }

    fn piece(&self, ast: &EquationAst, id: AstId) -> Result<String, GeneratorError> {
        let (value, condition) = self.operands(ast, id)?;
        Ok(self.env.render_str(
            &self.profile.piecewise.conditional_operator_if,
            context! {
                condition => self.render(ast, condition)?,
                value => self.conditional_value(ast, value)?,
            },
        )?)
    }

    fn otherwise(&self, value: &str) -> Result<String, GeneratorError> {
        Ok(self.env.render_str(
            &self.profile.piecewise.conditional_operator_else,
            context! { value => value },
        )?)
    }

    /// A nested piecewise used as a value is parenthesised.
    fn conditional_value(&self, ast: &EquationAst, id: AstId) -> Result<String, GeneratorError> {
        let text = self.render(ast, id)?;
        if self.precedence(ast, id) == CONDITIONAL {
            Ok(format!("({})", text))
        } else {
            Ok(text)
        }
    }

    // ===== Precedence =====

    fn has_operator_form(&self, kind: AstKind) -> bool {
        HelperFunction::from_kind(kind)
            .map(|f| self.profile.has_operator(f))
            .unwrap_or(false)
    }

    fn precedence(&self, ast: &EquationAst, id: AstId) -> u8 {
        let kind = ast.kind(id);
        match kind {
            AstKind::Piecewise | AstKind::Piece | AstKind::Otherwise => CONDITIONAL,
            _ if (kind.is_relational() || kind.is_logical()) && !self.has_operator_form(kind) => {
                ATOM
            }
            AstKind::Or => OR,
            AstKind::Xor => XOR,
            AstKind::And => AND,
            AstKind::Eq | AstKind::Neq => EQUALITY,
            AstKind::Lt | AstKind::Leq | AstKind::Gt | AstKind::Geq => COMPARISON,
            AstKind::Not => UNARY,
            AstKind::Plus | AstKind::Minus if ast.right_child(id).is_none() => UNARY,
            AstKind::Plus | AstKind::Minus => ADDITIVE,
            AstKind::Times | AstKind::Divide => MULTIPLICATIVE,
            AstKind::Log => match self.qualified(ast, id, AstKind::LogBase) {
                Ok((Some(b), _)) if self.literal(ast, b) != Some(10.0) => MULTIPLICATIVE,
                _ => ATOM,
            },
            AstKind::Cn if ast.value(id).starts_with('-') => UNARY,
            _ => ATOM,
        }
    }

    fn needs_parentheses(&self, ast: &EquationAst, parent: AstId, child: AstId, right: bool) -> bool {
        let parent_kind = ast.kind(parent);
        let child_kind = ast.kind(child);
        let parent_precedence = self.precedence(ast, parent);
        let child_precedence = self.precedence(ast, child);

        if child_precedence < parent_precedence {
            return true;
        }
        if parent_kind.is_logical() && self.has_operator_form(child_kind) {
            let mixed = child_kind.is_logical() && child_kind != parent_kind;
            if child_kind.is_relational() || mixed {
                return true;
            }
        }
        if right {
            let associative = matches!(
                parent_kind,
                AstKind::Plus | AstKind::Times | AstKind::And | AstKind::Or | AstKind::Xor
            );
            if child_precedence == parent_precedence
                && !(associative && child_kind == parent_kind)
            {
                return true;
            }
            // a-(-b) must not collapse into a--b
            if matches!(parent_kind, AstKind::Plus | AstKind::Minus) && child_precedence == UNARY {
                return true;
            }
        }
        false
    }

    // ===== Tree access =====

    fn left(&self, ast: &EquationAst, id: AstId) -> Result<AstId, GeneratorError> {
        ast.left_child(id)
            .ok_or(GeneratorError::MissingOperand { kind: ast.kind(id) })
    }

    fn right(&self, ast: &EquationAst, id: AstId) -> Result<AstId, GeneratorError> {
        ast.right_child(id)
            .ok_or(GeneratorError::MissingOperand { kind: ast.kind(id) })
    }

    fn operands(&self, ast: &EquationAst, id: AstId) -> Result<(AstId, AstId), GeneratorError> {
        Ok((self.left(ast, id)?, self.right(ast, id)?))
    }

    /// Split `Root`/`Log` into their optional qualifier value and argument.
    fn qualified(
        &self,
        ast: &EquationAst,
        id: AstId,
        qualifier: AstKind,
    ) -> Result<(Option<AstId>, AstId), GeneratorError> {
        let first = self.left(ast, id)?;
        if ast.kind(first) == qualifier {
            Ok((Some(self.left(ast, first)?), self.right(ast, id)?))
        } else {
            Ok((None, first))
        }
    }

    fn literal(&self, ast: &EquationAst, id: AstId) -> Option<f64> {
        if ast.kind(id) == AstKind::Cn {
            ast.value(id).parse().ok()
        } else {
            None
        }
    }

    fn function_name(&self, kind: AstKind) -> &str {
        let f = &self.profile.functions;
        match kind {
            AstKind::Abs => &f.absolute_value,
            AstKind::Exp => &f.exponential,
            AstKind::Ln => &f.natural_log,
            AstKind::Ceiling => &f.ceiling,
            AstKind::Floor => &f.floor,
            AstKind::Min => &f.min,
            AstKind::Max => &f.max,
            AstKind::Rem => &f.rem,
            AstKind::Sin => &f.sin,
            AstKind::Cos => &f.cos,
            AstKind::Tan => &f.tan,
            AstKind::Sec => &f.sec,
            AstKind::Csc => &f.csc,
            AstKind::Cot => &f.cot,
            AstKind::Sinh => &f.sinh,
            AstKind::Cosh => &f.cosh,
            AstKind::Tanh => &f.tanh,
            AstKind::Sech => &f.sech,
            AstKind::Csch => &f.csch,
            AstKind::Coth => &f.coth,
            AstKind::Asin => &f.asin,
            AstKind::Acos => &f.acos,
            AstKind::Atan => &f.atan,
            AstKind::Asec => &f.asec,
            AstKind::Acsc => &f.acsc,
            AstKind::Acot => &f.acot,
            AstKind::Asinh => &f.asinh,
            AstKind::Acosh => &f.acosh,
            AstKind::Atanh => &f.atanh,
            AstKind::Asech => &f.asech,
            AstKind::Acsch => &f.acsch,
            AstKind::Acoth => &f.acoth,
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s1_model::{Component, Expr, MathConstant, Model, Operator, Variable};
    use crate::s2_analyzer::analyser::Analyser;
    use crate::s4_generator::generator::template_environment;

    /// Render the right-hand side of `y = rhs` with `a` and `b` as constants.
    fn render_with(profile: &GeneratorProfile, rhs: Expr) -> String {
        let model = Model::new("m").with_component(
            Component::new("c")
                .with_variable(Variable::new("a", "dimensionless").with_initial_value(1.0))
                .with_variable(Variable::new("b", "dimensionless").with_initial_value(2.0))
                .with_variable(Variable::new("y", "dimensionless"))
                .with_equation(Expr::ci("y"), rhs),
        );
        let mut analyser = Analyser::new();
        let analysed = analyser.analyse_model(&model).clone();
        let env = template_environment();
        let renderer = ExpressionRenderer::new(profile, &analysed, &env);
        let ast = analysed.equation(0).unwrap().ast();
        let rhs = ast.right_child(ast.root()).unwrap();
        renderer.render(ast, rhs).unwrap()
    }

    fn c(rhs: Expr) -> String {
        render_with(&GeneratorProfile::c(), rhs)
    }

    fn python(rhs: Expr) -> String {
        render_with(&GeneratorProfile::python(), rhs)
    }

    fn a() -> Expr {
        Expr::ci("a")
    }

    fn b() -> Expr {
        Expr::ci("b")
    }

    #[test]
    fn test_numbers_get_a_decimal_point() {
        let profile = GeneratorProfile::c();
        let model = AnalyserModel::default();
        let env = template_environment();
        let renderer = ExpressionRenderer::new(&profile, &model, &env);
        assert_eq!(renderer.number("3"), "3.0");
        assert_eq!(renderer.number("1e-5"), "1.0e-5");
        assert_eq!(renderer.number("2.5"), "2.5");
        assert_eq!(renderer.number("NaN"), "NAN");
    }

    #[test]
    fn test_precedence() {
        let sum = Expr::binary(Operator::Plus, a(), b());
        assert_eq!(
            c(Expr::binary(Operator::Times, sum.clone(), Expr::cn(2.0))),
            "(variables[0]+variables[1])*2.0"
        );
        assert_eq!(
            c(Expr::binary(Operator::Minus, a(), sum.clone())),
            "variables[0]-(variables[0]+variables[1])"
        );
        assert_eq!(
            c(Expr::apply(Operator::Plus, vec![a(), b(), Expr::cn(1.0)])),
            "variables[0]+variables[1]+1.0"
        );
        assert_eq!(
            c(Expr::binary(
                Operator::Divide,
                a(),
                Expr::binary(Operator::Times, b(), Expr::cn(3.0))
            )),
            "variables[0]/(variables[1]*3.0)"
        );
        assert_eq!(
            c(Expr::binary(Operator::Minus, a(), Expr::unary(Operator::Minus, b()))),
            "variables[0]-(-variables[1])"
        );
        assert_eq!(c(Expr::unary(Operator::Minus, sum)), "-(variables[0]+variables[1])");
    }

    #[test]
    fn test_logical_clarity() {
        let lt = Expr::binary(Operator::Lt, a(), b());
        let gt = Expr::binary(Operator::Gt, a(), Expr::cn(0.0));
        let and = Expr::binary(Operator::And, lt.clone(), gt.clone());
        assert_eq!(
            c(and.clone()),
            "(variables[0] < variables[1]) && (variables[0] > 0.0)"
        );
        assert_eq!(
            python(and),
            "and_func(lt_func(variables[0], variables[1]), gt_func(variables[0], 0.0))"
        );
        assert_eq!(
            c(Expr::binary(Operator::Xor, lt, gt)),
            "xor(variables[0] < variables[1], variables[0] > 0.0)"
        );
        assert_eq!(
            c(Expr::unary(Operator::Not, a())),
            "!variables[0]"
        );
    }

    #[test]
    fn test_power_root_and_log() {
        assert_eq!(
            c(Expr::binary(Operator::Power, a(), Expr::cn(0.5))),
            "sqrt(variables[0])"
        );
        assert_eq!(
            c(Expr::binary(Operator::Power, a(), Expr::cn(2.0))),
            "pow(variables[0], 2.0)"
        );
        assert_eq!(c(Expr::root(None, a())), "sqrt(variables[0])");
        assert_eq!(
            c(Expr::root(Some(Expr::cn(3.0)), a())),
            "pow(variables[0], 1.0/3.0)"
        );
        assert_eq!(c(Expr::log(None, a())), "log10(variables[0])");
        assert_eq!(
            c(Expr::log(Some(Expr::cn(2.0)), a())),
            "log(variables[0])/log(2.0)"
        );
    }

    #[test]
    fn test_piecewise() {
        let rhs = Expr::piecewise(
            vec![
                (Expr::cn(1.0), Expr::binary(Operator::Lt, a(), Expr::cn(0.0))),
                (Expr::cn(2.0), Expr::binary(Operator::Lt, a(), Expr::cn(1.0))),
            ],
            Some(Expr::cn(3.0)),
        );
        assert_eq!(
            c(rhs.clone()),
            "(variables[0] < 0.0)?1.0:(variables[0] < 1.0)?2.0:3.0"
        );
        assert_eq!(
            python(rhs),
            "1.0 if lt_func(variables[0], 0.0) else 2.0 if lt_func(variables[0], 1.0) else 3.0"
        );

        let no_otherwise = Expr::piecewise(vec![(Expr::cn(1.0), Expr::constant(MathConstant::True))], None);
        assert_eq!(c(no_otherwise), "(1.0)?1.0:NAN");
    }

    #[test]
    fn test_functions_and_constants() {
        assert_eq!(
            python(Expr::binary(Operator::Min, a(), b())),
            "min(variables[0], variables[1])"
        );
        assert_eq!(c(Expr::binary(Operator::Max, a(), b())), "fmax(variables[0], variables[1])");
        assert_eq!(c(Expr::unary(Operator::Sech, a())), "sech(variables[0])");
        assert_eq!(c(Expr::unary(Operator::Abs, a())), "fabs(variables[0])");
        assert_eq!(c(Expr::constant(MathConstant::Pi)), "3.14159265358979");
        assert_eq!(python(Expr::constant(MathConstant::Pi)), "pi");
    }
}
