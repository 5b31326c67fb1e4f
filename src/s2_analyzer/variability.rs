//! Variable classification.
//!
//! Works on equivalence classes of declared variables (variables joined by
//! connections are one quantity) and decides, for each class, which role it
//! plays: variable of integration, state, constant, computed constant,
//! algebraic or external. It also decides which variable each equation
//! computes and reports every over- and under-constrained situation.
//!
//! Classification happens in two passes:
//!
//! 1. [`classify`] runs before scheduling. It finds the variable of
//!    integration and the states, binds each equation to its target and
//!    collects what every equation reads.
//! 2. [`assign_types`] runs once the equations are ordered. Walking them in
//!    execution order it tells true constants, computed constants and
//!    algebraic equations apart.

use super::ast::{AstId, AstKind, EquationAst};
use super::external::AnalyserExternalVariable;
use super::issue::{IssueList, IssueReference};
use super::reference_checker::BoundEquation;
use super::repr_visitor::repr;
use super::visitor::{walk, Visitor};
use crate::s1_model::{InitialValue, Model, VariableId};
use crate::s2_analyzer::analyser_model::EquationType;
use std::collections::{BTreeSet, HashMap};

// =============================================================================
// Types
// =============================================================================

/// Role of an equivalence class while it is being classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Unknown,
    Voi,
    State,
    Constant,
    ComputedConstant,
    Algebraic,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Initial {
    Literal(f64),
    /// Initialised with the value of another class
    Variable(usize),
}

/// Equivalent declared variables, merged into one quantity.
#[derive(Debug, Clone)]
pub struct VariableClass {
    /// Declaration order
    pub members: Vec<VariableId>,
    pub initial: Option<Initial>,
    pub initialised_member: Option<VariableId>,
    pub role: Role,
    /// Identifier the caller registered the class as external with
    pub external: Option<VariableId>,
}

/// Something an equation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Read {
    Value(usize),
    Rate(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// `x = ...`
    Plain(usize),
    /// `d(x)/d(voi) = ...`
    Rate(usize),
    /// Any other left-hand side; the computed variable is matched later
    Implicit,
    /// Pseudo-equation standing for a caller supplied value
    External(usize),
}

/// An equation taking part in the computation plan.
#[derive(Debug, Clone)]
pub struct PlannedEquation {
    /// Index into the bound equations, `None` for an external variable
    pub bound: Option<usize>,
    pub component: usize,
    pub target: Target,
    /// Class computed by the equation (the state for a rate equation)
    pub defines: Option<usize>,
    /// First occurrence order, target excluded
    pub reads: Vec<Read>,
    /// The equation reads what it computes
    pub self_read: bool,
    pub reference: Option<IssueReference>,
}

impl PlannedEquation {
    /// Needs a simultaneous solve even when it is not part of a larger loop.
    pub fn is_implicit(&self) -> bool {
        self.self_read || self.target == Target::Implicit
    }
}

/// Which kinds of problems were found, used to derive the model type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstraintFlags {
    pub invalid: bool,
    pub underconstrained: bool,
    pub overconstrained: bool,
}

#[derive(Debug, Clone)]
pub struct Classification {
    pub classes: Vec<VariableClass>,
    pub class_of: HashMap<VariableId, usize>,
    pub voi: Option<usize>,
    pub equations: Vec<PlannedEquation>,
    pub flags: ConstraintFlags,
}

impl Classification {
    pub fn role(&self, class: usize) -> Role {
        self.classes[class].role
    }

    /// Equation computing the value of each class (rate equations excluded).
    pub fn value_definitions(&self) -> Vec<Option<usize>> {
        let mut defs = vec![None; self.classes.len()];
        for (e, eq) in self.equations.iter().enumerate() {
            if let (Some(k), false) = (eq.defines, matches!(eq.target, Target::Rate(_))) {
                defs[k].get_or_insert(e);
            }
        }
        defs
    }

    /// Rate equation of each state class.
    pub fn rate_definitions(&self) -> Vec<Option<usize>> {
        let mut defs = vec![None; self.classes.len()];
        for (e, eq) in self.equations.iter().enumerate() {
            if let Target::Rate(k) = eq.target {
                defs[k].get_or_insert(e);
            }
        }
        defs
    }
}

// =============================================================================
// Equation Scanner Visitor
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefContext {
    /// Under a `Bvar`
    Voi,
    /// Right child of a `Diff`
    Rate,
    Value,
}

#[derive(Debug, Clone)]
struct Derivative {
    voi: Option<AstId>,
    state: Option<AstId>,
    degree: Option<String>,
}

/// Collects variable references and derivatives without following parent
/// links.
#[derive(Default)]
struct EquationScanner {
    bvar_depth: usize,
    diffs: Vec<AstId>,
    refs: Vec<(AstId, RefContext)>,
    derivatives: Vec<Derivative>,
}

impl Visitor for EquationScanner {
    fn enter_diff(&mut self, ast: &EquationAst, id: AstId) {
        self.diffs.push(id);
        let bvar = ast.left_child(id);
        let voi = bvar.and_then(|b| ast.left_child(b));
        let degree = bvar
            .and_then(|b| ast.right_child(b))
            .and_then(|d| ast.left_child(d))
            .map(|n| ast.value(n).to_string());
        self.derivatives.push(Derivative {
            voi,
            state: ast.right_child(id),
            degree,
        });
    }

    fn exit_diff(&mut self, _ast: &EquationAst, _id: AstId) {
        self.diffs.pop();
    }

    fn enter_bvar(&mut self, _ast: &EquationAst, _id: AstId) {
        self.bvar_depth += 1;
    }

    fn exit_bvar(&mut self, _ast: &EquationAst, _id: AstId) {
        self.bvar_depth -= 1;
    }

    fn enter_ci(&mut self, ast: &EquationAst, id: AstId) {
        let context = if self.bvar_depth > 0 {
            RefContext::Voi
        } else if self
            .diffs
            .last()
            .is_some_and(|d| ast.right_child(*d) == Some(id))
        {
            RefContext::Rate
        } else {
            RefContext::Value
        };
        self.refs.push((id, context));
    }
}

// =============================================================================
// Messages
// =============================================================================

pub(crate) fn describe(model: &Model, id: VariableId) -> String {
    let component = &model.components[id.component];
    format!(
        "variable '{}' in component '{}'",
        component.variables[id.variable].name, component.name
    )
}

pub(crate) fn describe_capitalised(model: &Model, id: VariableId) -> String {
    let component = &model.components[id.component];
    format!(
        "Variable '{}' in component '{}'",
        component.variables[id.variable].name, component.name
    )
}

// =============================================================================
// Pass 1: roles and targets
// =============================================================================

/// Classify the variables of `model` and bind every equation to what it
/// computes.
pub fn classify(
    model: &Model,
    bound: &[BoundEquation],
    externals: &[AnalyserExternalVariable],
    issues: &mut IssueList,
) -> Classification {
    let mut flags = ConstraintFlags::default();
    let (mut classes, class_of) = build_classes(model, issues, &mut flags);
    resolve_initial_values(model, &mut classes, &class_of, issues, &mut flags);

    let lookup = |ast: &EquationAst, node: AstId| -> Option<(VariableId, usize)> {
        let id = ast.variable(node)?;
        Some((id, *class_of.get(&id)?))
    };

    // Variable of integration, states and targets
    let mut voi: Option<(usize, VariableId)> = None;
    let mut reported_vois = BTreeSet::new();
    let mut states: Vec<(usize, VariableId)> = Vec::new();
    let mut equations = Vec::with_capacity(bound.len());

    for (b, equation) in bound.iter().enumerate() {
        let ast = &equation.ast;
        let mut scanner = EquationScanner::default();
        walk(ast, &mut scanner);

        for derivative in &scanner.derivatives {
            if let Some((id, k)) = derivative.voi.and_then(|n| lookup(ast, n)) {
                match voi {
                    None => voi = Some((k, id)),
                    Some((current, current_id)) if current != k => {
                        if reported_vois.insert(k) {
                            issues.error(
                                format!(
                                    "{} and {} cannot both be a variable of integration.",
                                    describe_capitalised(model, current_id),
                                    describe(model, id)
                                ),
                                IssueReference::Variable(id),
                            );
                            flags.invalid = true;
                        }
                    }
                    _ => {}
                }
            }
            if let Some((id, k)) = derivative.state.and_then(|n| lookup(ast, n)) {
                if let Some(degree) = &derivative.degree {
                    if degree.parse::<f64>().ok() != Some(1.0) {
                        issues.error(
                            format!(
                                "The differential equation for {} must be of the first order.",
                                describe(model, id)
                            ),
                            equation.reference(),
                        );
                        flags.invalid = true;
                    }
                }
                if !states.iter().any(|(s, _)| *s == k) {
                    states.push((k, id));
                }
            }
        }

        let root = ast.root();
        let lhs = ast.left_child(root);
        let (target, target_node) = match lhs.map(|n| (n, ast.kind(n))) {
            Some((n, AstKind::Ci)) => match lookup(ast, n) {
                Some((_, k)) => (Target::Plain(k), Some(n)),
                None => (Target::Implicit, None),
            },
            Some((n, AstKind::Diff)) => {
                let state = ast.right_child(n);
                match state.and_then(|s| lookup(ast, s)) {
                    Some((_, k)) => (Target::Rate(k), state),
                    None => (Target::Implicit, None),
                }
            }
            _ => (Target::Implicit, None),
        };

        let mut reads = Vec::new();
        let mut self_read = false;
        for (node, context) in &scanner.refs {
            if Some(*node) == target_node || *context == RefContext::Voi {
                continue;
            }
            let Some((_, k)) = lookup(ast, *node) else {
                continue;
            };
            let read = match context {
                RefContext::Rate => Read::Rate(k),
                _ => Read::Value(k),
            };
            let reads_target = match target {
                Target::Plain(t) => read == Read::Value(t),
                Target::Rate(t) => read == Read::Rate(t),
                _ => false,
            };
            if reads_target {
                self_read = true;
            }
            if !reads.contains(&read) {
                reads.push(read);
            }
        }

        let defines = match target {
            Target::Plain(k) | Target::Rate(k) => Some(k),
            _ => None,
        };
        equations.push(PlannedEquation {
            bound: Some(b),
            component: equation.component,
            target,
            defines,
            reads,
            self_read,
            reference: Some(equation.reference()),
        });
    }

    if let Some((k, id)) = voi {
        classes[k].role = Role::Voi;
        if classes[k].initial.is_some() {
            issues.error(
                format!(
                    "{} cannot be both a variable of integration and initialised.",
                    describe_capitalised(model, id)
                ),
                IssueReference::Variable(id),
            );
            flags.invalid = true;
        }
    }
    for (k, _) in &states {
        if classes[*k].role == Role::Unknown {
            classes[*k].role = Role::State;
        }
    }
    if voi.is_none() {
        if let Some((_, id)) = states.first() {
            issues.error(
                format!(
                    "{} is used in an ODE, but the variable of integration is not defined.",
                    describe_capitalised(model, *id)
                ),
                IssueReference::Variable(*id),
            );
            flags.invalid = true;
        }
    }

    // External variables override whatever the model says about them
    let mut external_classes = Vec::new();
    for external in externals {
        let id = external.variable();
        let Some(&k) = class_of.get(&id) else {
            log::warn!("external variable {:?} is not part of the model", id);
            continue;
        };
        match classes[k].role {
            Role::Voi => {
                issues.error(
                    format!(
                        "{} is the variable of integration and cannot be an external variable.",
                        describe_capitalised(model, id)
                    ),
                    IssueReference::Variable(id),
                );
                flags.invalid = true;
            }
            Role::State => {
                issues.error(
                    format!(
                        "{} is a state and cannot be an external variable.",
                        describe_capitalised(model, id)
                    ),
                    IssueReference::Variable(id),
                );
                flags.invalid = true;
            }
            Role::External => {
                log::debug!("{:?} is equivalent to another external variable", id);
            }
            _ => {
                if classes[k].initial.take().is_some() {
                    issues.warning(
                        format!(
                            "{} is initialised, but it is an external variable so its initial value is ignored.",
                            describe_capitalised(model, id)
                        ),
                        IssueReference::Variable(id),
                    );
                }
                classes[k].role = Role::External;
                classes[k].external = Some(id);
                external_classes.push((k, external));
            }
        }
    }
    equations.retain(|eq| match eq.target {
        Target::Plain(k) if classes[k].role == Role::External => {
            if let Some(id) = classes[k].external {
                issues.warning(
                    format!(
                        "{} is an external variable, so the equation computing it is ignored.",
                        describe_capitalised(model, id)
                    ),
                    IssueReference::Variable(id),
                );
            }
            false
        }
        _ => true,
    });

    check_definitions(model, &mut classes, &mut equations, bound, issues, &mut flags);

    for (k, external) in external_classes {
        let mut reads = Vec::new();
        for dependency in external.dependencies() {
            match class_of.get(dependency) {
                Some(&d) if d != k => {
                    if !reads.contains(&Read::Value(d)) {
                        reads.push(Read::Value(d));
                    }
                }
                Some(_) => log::debug!("external variable depends on itself, ignored"),
                None => log::warn!("dependency {:?} is not part of the model", dependency),
            }
        }
        equations.push(PlannedEquation {
            bound: None,
            component: external.variable().component,
            target: Target::External(k),
            defines: Some(k),
            reads,
            self_read: false,
            reference: Some(IssueReference::Variable(external.variable())),
        });
    }

    log::debug!(
        "classified {} variable classes, voi: {}, states: {}",
        classes.len(),
        voi.is_some(),
        states.len()
    );

    Classification {
        classes,
        class_of,
        voi: voi.map(|(k, _)| k),
        equations,
        flags,
    }
}

/// Union-find over connections; classes are numbered by first member.
fn build_classes(
    model: &Model,
    issues: &mut IssueList,
    flags: &mut ConstraintFlags,
) -> (Vec<VariableClass>, HashMap<VariableId, usize>) {
    let ids: Vec<VariableId> = model.variable_ids().collect();
    let position: HashMap<VariableId, usize> =
        ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let mut parent: Vec<usize> = (0..ids.len()).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for (c, connection) in model.connections.iter().enumerate() {
        let first = model.variable_id(&connection.component_1, &connection.variable_1);
        let second = model.variable_id(&connection.component_2, &connection.variable_2);
        match (first, second) {
            (Some(a), Some(b)) => {
                let ra = find(&mut parent, position[&a]);
                let rb = find(&mut parent, position[&b]);
                // keep the earliest declared variable as root
                if ra < rb {
                    parent[rb] = ra;
                } else {
                    parent[ra] = rb;
                }
            }
            _ => {
                issues.error(
                    format!(
                        "The equivalence between variable '{}' in component '{}' and variable '{}' in component '{}' refers to a variable that is not defined.",
                        connection.variable_1,
                        connection.component_1,
                        connection.variable_2,
                        connection.component_2
                    ),
                    IssueReference::Connection(c),
                );
                flags.invalid = true;
            }
        }
    }

    let mut classes: Vec<VariableClass> = Vec::new();
    let mut class_of_root: HashMap<usize, usize> = HashMap::new();
    let mut class_of = HashMap::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        let root = find(&mut parent, i);
        let k = *class_of_root.entry(root).or_insert_with(|| {
            classes.push(VariableClass {
                members: Vec::new(),
                initial: None,
                initialised_member: None,
                role: Role::Unknown,
                external: None,
            });
            classes.len() - 1
        });
        classes[k].members.push(*id);
        class_of.insert(*id, k);
    }
    (classes, class_of)
}

fn resolve_initial_values(
    model: &Model,
    classes: &mut [VariableClass],
    class_of: &HashMap<VariableId, usize>,
    issues: &mut IssueList,
    flags: &mut ConstraintFlags,
) {
    for class in classes.iter_mut() {
        for member in class.members.clone() {
            let Some(value) = model.variable(member).and_then(|v| v.initial_value.as_ref())
            else {
                continue;
            };
            if let Some(first) = class.initialised_member {
                issues.error(
                    format!(
                        "{} and {} are equivalent and cannot therefore both be initialised.",
                        describe_capitalised(model, first),
                        describe(model, member)
                    ),
                    IssueReference::Variable(member),
                );
                flags.invalid = true;
                continue;
            }
            let initial = match value {
                InitialValue::Literal(v) => Some(Initial::Literal(*v)),
                InitialValue::Variable(name) => {
                    let component = &model.components[member.component];
                    match component.variable_index(name) {
                        Some(v) => class_of
                            .get(&VariableId::new(member.component, v))
                            .map(|k| Initial::Variable(*k)),
                        None => {
                            issues.error(
                                format!(
                                    "{} is initialised using variable '{}', but it is not defined anywhere.",
                                    describe_capitalised(model, member),
                                    name
                                ),
                                IssueReference::Variable(member),
                            );
                            flags.invalid = true;
                            None
                        }
                    }
                }
            };
            if initial.is_some() {
                class.initial = initial;
                class.initialised_member = Some(member);
            }
        }
    }
}

/// Over/under-constrained checks, implicit equation matching and constant
/// detection.
fn check_definitions(
    model: &Model,
    classes: &mut [VariableClass],
    equations: &mut [PlannedEquation],
    bound: &[BoundEquation],
    issues: &mut IssueList,
    flags: &mut ConstraintFlags,
) {
    let mut plain: Vec<Vec<usize>> = vec![Vec::new(); classes.len()];
    let mut rate: Vec<Vec<usize>> = vec![Vec::new(); classes.len()];
    for (e, eq) in equations.iter().enumerate() {
        match eq.target {
            Target::Plain(k) => plain[k].push(e),
            Target::Rate(k) => rate[k].push(e),
            _ => {}
        }
    }

    for (k, class) in classes.iter().enumerate() {
        let id = class.members[0];
        let name = describe_capitalised(model, id);
        match class.role {
            Role::Voi if !plain[k].is_empty() => {
                issues.error(
                    format!(
                        "{} is the variable of integration and cannot be computed by an equation.",
                        name
                    ),
                    IssueReference::Variable(id),
                );
                flags.overconstrained = true;
            }
            Role::State => {
                if rate[k].is_empty() {
                    issues.error(
                        format!("The rate of {} is not computed.", describe(model, id)),
                        IssueReference::Variable(id),
                    );
                    flags.underconstrained = true;
                } else if rate[k].len() > 1 {
                    issues.error(
                        format!(
                            "The rate of {} is computed more than once.",
                            describe(model, id)
                        ),
                        IssueReference::Variable(id),
                    );
                    flags.overconstrained = true;
                }
                if !plain[k].is_empty() {
                    issues.error(
                        format!("{} is computed more than once.", name),
                        IssueReference::Variable(id),
                    );
                    flags.overconstrained = true;
                }
                if class.initial.is_none() {
                    issues.error(
                        format!("{} is used in an ODE, but it is not initialised.", name),
                        IssueReference::Variable(id),
                    );
                    flags.invalid = true;
                }
            }
            Role::Unknown => {
                let definitions = plain[k].len() + usize::from(class.initial.is_some());
                if definitions > 1 {
                    let id = plain[k]
                        .first()
                        .and_then(|e| equations[*e].bound)
                        .map(|b| bound[b].component)
                        .and_then(|c| class.members.iter().find(|m| m.component == c))
                        .copied()
                        .unwrap_or(id);
                    issues.error(
                        format!(
                            "{} is computed more than once.",
                            describe_capitalised(model, id)
                        ),
                        IssueReference::Variable(id),
                    );
                    flags.overconstrained = true;
                }
            }
            _ => {}
        }
    }

    // Duplicated definitions keep only the first equation as definer
    for k in 0..classes.len() {
        let kept = usize::from(classes[k].role == Role::Unknown && classes[k].initial.is_none());
        for e in plain[k].iter().skip(kept) {
            equations[*e].defines = None;
        }
        for e in rate[k].iter().skip(1) {
            equations[*e].defines = None;
        }
    }

    // Implicit equations compute a variable nothing else computes
    let free = |k: usize, classes: &[VariableClass], plain: &[Vec<usize>]| {
        classes[k].role == Role::Unknown && classes[k].initial.is_none() && plain[k].is_empty()
    };
    let implicit: Vec<usize> = equations
        .iter()
        .enumerate()
        .filter(|(_, eq)| eq.target == Target::Implicit)
        .map(|(e, _)| e)
        .collect();
    let candidates: Vec<Vec<usize>> = implicit
        .iter()
        .map(|e| {
            equations[*e]
                .reads
                .iter()
                .filter_map(|r| match r {
                    Read::Value(k) if free(*k, classes, &plain) => Some(*k),
                    _ => None,
                })
                .collect()
        })
        .collect();
    let matching = match_implicit_equations(&candidates);
    for (i, e) in implicit.iter().enumerate() {
        match matching[i] {
            Some(k) => {
                let eq = &mut equations[*e];
                eq.defines = Some(k);
                eq.reads.retain(|r| *r != Read::Value(k));
                plain[k].push(*e);
            }
            None => {
                let (text, component) = match equations[*e].bound {
                    Some(b) => (repr(&bound[b].ast), bound[b].component),
                    None => (String::new(), equations[*e].component),
                };
                issues.error(
                    format!(
                        "The equation '{}' in component '{}' does not compute any variable that is not already computed.",
                        text, model.components[component].name
                    ),
                    equations[*e].reference.unwrap_or(IssueReference::Component(component)),
                );
                flags.overconstrained = true;
            }
        }
    }

    // What is left is either a constant or not computed at all
    for k in 0..classes.len() {
        if classes[k].role != Role::Unknown {
            continue;
        }
        if classes[k].initial.is_some() {
            classes[k].role = Role::Constant;
        } else if plain[k].is_empty() {
            let id = classes[k].members[0];
            issues.error(
                format!("{} is not computed.", describe_capitalised(model, id)),
                IssueReference::Variable(id),
            );
            flags.underconstrained = true;
        }
    }

    // Initialising variables must hold a literal constant
    for k in 0..classes.len() {
        let Some(Initial::Variable(source)) = classes[k].initial else {
            continue;
        };
        let literal = classes[source].role == Role::Constant
            && matches!(classes[source].initial, Some(Initial::Literal(_)));
        if !literal {
            let id = classes[k].initialised_member.unwrap_or(classes[k].members[0]);
            let source_id = classes[source].members[0];
            issues.error(
                format!(
                    "{} is initialised using {}, which is not a constant with a literal initial value.",
                    describe_capitalised(model, id),
                    describe(model, source_id)
                ),
                IssueReference::Variable(id),
            );
            flags.invalid = true;
        }
    }
}

/// Kuhn's augmenting path matching of implicit equations (by position) to
/// candidate classes. Earlier equations and earlier candidates win ties.
fn match_implicit_equations(candidates: &[Vec<usize>]) -> Vec<Option<usize>> {
    fn augment(
        e: usize,
        candidates: &[Vec<usize>],
        owner: &mut HashMap<usize, usize>,
        visited: &mut BTreeSet<usize>,
    ) -> bool {
        for &k in &candidates[e] {
            if !visited.insert(k) {
                continue;
            }
            let free = match owner.get(&k) {
                None => true,
                Some(&other) => augment(other, candidates, owner, visited),
            };
            if free {
                owner.insert(k, e);
                return true;
            }
        }
        false
    }

    let mut owner: HashMap<usize, usize> = HashMap::new();
    for e in 0..candidates.len() {
        augment(e, candidates, &mut owner, &mut BTreeSet::new());
    }
    let mut matching = vec![None; candidates.len()];
    for (k, e) in owner {
        matching[e] = Some(k);
    }
    matching
}

// =============================================================================
// Pass 2: equation types
// =============================================================================

/// Type every planned equation, walking them in execution order, and give
/// the classes they compute their final role.
///
/// `order` lists equation indices in execution order. `in_cycle` flags the
/// equations that belong to a cycle group.
pub fn assign_types(
    classification: &mut Classification,
    order: &[usize],
    in_cycle: &[bool],
) -> Vec<EquationType> {
    let mut types = vec![EquationType::Algebraic; classification.equations.len()];
    for &e in order {
        let eq = &classification.equations[e];
        let kind = match eq.target {
            Target::External(_) => EquationType::External,
            Target::Rate(_) => EquationType::Rate,
            _ if in_cycle[e] => EquationType::Algebraic,
            _ if eq.reads.is_empty() => EquationType::TrueConstant,
            _ => {
                let constant = eq.reads.iter().all(|r| match r {
                    Read::Value(k) => matches!(
                        classification.classes[*k].role,
                        Role::Constant | Role::ComputedConstant
                    ),
                    Read::Rate(_) => false,
                });
                if constant {
                    EquationType::VariableBasedConstant
                } else {
                    EquationType::Algebraic
                }
            }
        };
        types[e] = kind;

        if let (Some(k), Target::Plain(_) | Target::Implicit) = (eq.defines, eq.target) {
            let class = &mut classification.classes[k];
            if class.role == Role::Unknown {
                class.role = match kind {
                    EquationType::TrueConstant => Role::Constant,
                    EquationType::VariableBasedConstant => Role::ComputedConstant,
                    _ => Role::Algebraic,
                };
            }
        }
    }
    types
}
