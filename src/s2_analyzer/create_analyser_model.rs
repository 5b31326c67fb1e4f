//! Builds an [`AnalyserModel`] from a model snapshot.
//!
//! This is the analysis pipeline proper: bind equations, classify variables,
//! build and schedule the dependency graph, type equations, index states and
//! variables, and finally package everything into an immutable result.
use super::analyser_model::{
    AnalyserEquation, AnalyserModel, AnalyserVariable, CycleGroup, EquationType,
    InitialValueSlot, ModelType, VariableSlot, VariableType,
};
use super::ast::{AstKind, EquationAst};
use super::external::AnalyserExternalVariable;
use super::function_collector::collect_function_needs;
use super::issue::{IssueList, IssueReference};
use super::reference_checker::{bind_equations, number_literal, BoundEquation};
use super::variability::{
    assign_types, classify, describe, describe_capitalised, Classification, Initial, Read,
    Role, Target,
};
use crate::s1_model::{Model, VariableId};
use crate::s3_optimizer::{build_dependency_graph, schedule, DependencyGraph, Schedule};
use std::collections::HashMap;

/// Run the whole analysis of `model`, reporting problems into `issues`.
pub fn create_analyser_model(
    model: &Model,
    externals: &[AnalyserExternalVariable],
    issues: &mut IssueList,
) -> AnalyserModel {
    // bind variable references and classify
    let bound = bind_equations(model, issues);
    let mut classification = classify(model, &bound, externals, issues);

    // order equations, collapsing algebraic loops
    let graph = build_dependency_graph(&classification);
    let implicit: Vec<bool> = classification
        .equations
        .iter()
        .map(|eq| eq.is_implicit())
        .collect();
    let schedule = schedule(&graph, &implicit);
    let types = assign_types(&mut classification, &schedule.order, &schedule.in_cycle());

    let packager = Packager {
        model,
        bound: &bound,
        classification: &classification,
        graph: &graph,
        schedule: &schedule,
        types: &types,
    };
    let analysed = packager.package(issues);

    log::debug!(
        "analysed model '{}': {} ({} states, {} variables, {} equations)",
        analysed.name,
        analysed.model_type,
        analysed.states.len(),
        analysed.variables.len(),
        analysed.equations.len()
    );
    analysed
}

struct Packager<'a> {
    model: &'a Model,
    bound: &'a [BoundEquation],
    classification: &'a Classification,
    graph: &'a DependencyGraph,
    schedule: &'a Schedule,
    types: &'a [EquationType],
}

impl Packager<'_> {
    fn package(&self, issues: &mut IssueList) -> AnalyserModel {
        let classes = &self.classification.classes;
        let value_defs = self.classification.value_definitions();
        let rate_defs = self.classification.rate_definitions();

        // position of each planned equation in the final equation list
        let mut position = vec![0; self.schedule.order.len()];
        for (p, &e) in self.schedule.order.iter().enumerate() {
            position[e] = p;
        }

        // states in the execution order of their rate equations
        let mut state_classes: Vec<usize> = (0..classes.len())
            .filter(|k| classes[*k].role == Role::State)
            .collect();
        state_classes.sort_by_key(|k| match rate_defs[*k] {
            Some(e) => (0, position[e], *k),
            None => (1, 0, *k),
        });

        // literal constants, variable-initialised constants, then computed
        let mut variable_classes: Vec<usize> = (0..classes.len())
            .filter(|k| !matches!(classes[*k].role, Role::State | Role::Voi))
            .collect();
        variable_classes.sort_by_key(|k| {
            let class = &classes[*k];
            match (class.role, class.initial, value_defs[*k]) {
                (Role::Constant, Some(Initial::Literal(_)), _) => (0, 0, *k),
                (Role::Constant, Some(Initial::Variable(_)), _) => (1, 0, *k),
                (_, _, Some(e)) => (2, position[e], *k),
                _ => (3, 0, *k),
            }
        });

        let mut class_slot: Vec<Option<VariableSlot>> = vec![None; classes.len()];
        if let Some(voi) = self.classification.voi {
            class_slot[voi] = Some(VariableSlot::Voi);
        }
        for (i, k) in state_classes.iter().enumerate() {
            class_slot[*k] = Some(VariableSlot::State(i));
        }
        for (i, k) in variable_classes.iter().enumerate() {
            class_slot[*k] = Some(VariableSlot::Variable(i));
        }

        let mut slots = HashMap::new();
        for (k, class) in classes.iter().enumerate() {
            if let Some(slot) = class_slot[k] {
                for member in &class.members {
                    slots.insert(*member, slot);
                }
            }
        }

        let read_slot = |read: &Read| -> Option<VariableSlot> {
            match read {
                Read::Value(k) => class_slot[*k],
                Read::Rate(k) => match class_slot[*k] {
                    Some(VariableSlot::State(i)) => Some(VariableSlot::Rate(i)),
                    _ => None,
                },
            }
        };

        // equations in execution order
        let mut equations: Vec<AnalyserEquation> = Vec::with_capacity(self.schedule.order.len());
        let mut state_rate_based = vec![false; self.schedule.order.len()];
        for &e in &self.schedule.order {
            let eq = &self.classification.equations[e];
            let variable_dependencies: Vec<VariableSlot> =
                eq.reads.iter().filter_map(read_slot).collect();
            let planned_dependencies = self.graph.dependencies(e);
            let is_state_rate_based = variable_dependencies
                .iter()
                .any(|s| !matches!(s, VariableSlot::Variable(_)))
                || planned_dependencies.iter().any(|d| state_rate_based[*d]);
            state_rate_based[e] = is_state_rate_based;

            let mut dependencies: Vec<usize> =
                planned_dependencies.iter().map(|d| position[*d]).collect();
            dependencies.sort_unstable();

            let variable = match (eq.target, eq.defines) {
                (Target::Rate(_), Some(k)) => read_slot(&Read::Rate(k)),
                (_, Some(k)) => class_slot[k],
                _ => None,
            };

            equations.push(AnalyserEquation {
                kind: self.types[e],
                ast: self.equation_ast(e),
                component: self.model.components[eq.component].name.clone(),
                dependencies,
                variable_dependencies,
                variable,
                order: self.schedule.slot[e],
                cycle: self.schedule.group_of[e],
                is_state_rate_based,
                needed_for_rates: false,
            });
        }
        self.mark_needed_for_rates(&mut equations, &position);

        let cycles: Vec<CycleGroup> = self
            .schedule
            .groups
            .iter()
            .map(|members| {
                self.report_cycle(members, issues);
                CycleGroup {
                    equations: members.iter().map(|e| position[*e]).collect(),
                    unknowns: members
                        .iter()
                        .filter_map(|e| equations[position[*e]].variable)
                        .collect(),
                }
            })
            .collect();

        let make_variable = |k: usize, kind: VariableType, index: usize| -> AnalyserVariable {
            let class = &classes[k];
            let equation = match class.role {
                Role::State => rate_defs[k],
                _ => value_defs[k],
            };
            let id = self.representative(k, equation);
            let declared = self
                .model
                .variable(id)
                .map(|v| (v.name.clone(), v.units.clone()))
                .unwrap_or_default();
            let initial_value = match (class.role, class.initial) {
                (Role::State | Role::Constant, Some(Initial::Literal(v))) => {
                    Some(InitialValueSlot::Literal(number_literal(v)))
                }
                (Role::State | Role::Constant, Some(Initial::Variable(source))) => {
                    class_slot[source].map(InitialValueSlot::Variable)
                }
                _ => None,
            };
            AnalyserVariable {
                kind,
                index,
                id,
                component: self.model.components[id.component].name.clone(),
                name: declared.0,
                units: declared.1,
                initial_value,
                equation: equation.map(|e| position[e]),
                equivalent: class.members.clone(),
            }
        };

        let voi = self
            .classification
            .voi
            .map(|k| make_variable(k, VariableType::VariableOfIntegration, 0));
        let states: Vec<AnalyserVariable> = state_classes
            .iter()
            .enumerate()
            .map(|(i, k)| make_variable(*k, VariableType::State, i))
            .collect();
        let variables: Vec<AnalyserVariable> = variable_classes
            .iter()
            .enumerate()
            .map(|(i, k)| {
                let kind = match classes[*k].role {
                    Role::Constant => VariableType::Constant,
                    Role::ComputedConstant => VariableType::ComputedConstant,
                    Role::External => VariableType::External,
                    _ => VariableType::Algebraic,
                };
                make_variable(*k, kind, i)
            })
            .collect();

        let needs = collect_function_needs(equations.iter().map(|eq| &eq.ast));

        let flags = self.classification.flags;
        let model_type = if flags.invalid {
            ModelType::Invalid
        } else if flags.underconstrained && flags.overconstrained {
            ModelType::UnsuitablyConstrained
        } else if flags.underconstrained {
            ModelType::Underconstrained
        } else if flags.overconstrained {
            ModelType::Overconstrained
        } else if !cycles.is_empty() {
            if voi.is_some() {
                ModelType::Dae
            } else {
                ModelType::Nla
            }
        } else if voi.is_some() {
            ModelType::Ode
        } else if !variables.is_empty() {
            ModelType::Algebraic
        } else {
            ModelType::Unknown
        };

        AnalyserModel {
            name: self.model.name.clone(),
            model_type,
            valid: !issues.has_errors(),
            voi,
            states,
            variables,
            equations,
            cycles,
            needs,
            slots,
            classes: self.classification.class_of.clone(),
        }
    }

    /// Owned copy of the equation's tree, or a lone `Ci` for an external
    /// variable.
    fn equation_ast(&self, e: usize) -> EquationAst {
        let eq = &self.classification.equations[e];
        match (eq.bound, eq.target) {
            (Some(b), _) => self.bound[b].ast.clone(),
            (None, Target::External(k)) => {
                let mut ast = EquationAst::new();
                let root = ast.root();
                let id = self.representative(k, None);
                ast.set_kind(root, AstKind::Ci);
                if let Some(variable) = self.model.variable(id) {
                    ast.set_value(root, &variable.name);
                }
                ast.set_variable(root, Some(id));
                ast
            }
            _ => EquationAst::new(),
        }
    }

    /// Declared variable a class is reported as: the external registration,
    /// the member living next to the computing equation, the initialised
    /// member, or the first declared one.
    fn representative(&self, k: usize, equation: Option<usize>) -> VariableId {
        let class = &self.classification.classes[k];
        if let Some(id) = class.external {
            return id;
        }
        let computed_in = equation
            .and_then(|e| self.classification.equations[e].bound)
            .map(|b| self.bound[b].component);
        if let Some(component) = computed_in {
            if let Some(id) = class.members.iter().find(|m| m.component == component) {
                return *id;
            }
        }
        class.initialised_member.unwrap_or(class.members[0])
    }

    /// Flag the rate equations and every non-constant equation they need,
    /// whole cycle groups at a time.
    fn mark_needed_for_rates(&self, equations: &mut [AnalyserEquation], position: &[usize]) {
        let mut needed = vec![false; equations.len()];
        let mut work: Vec<usize> = (0..equations.len())
            .filter(|p| equations[*p].kind == EquationType::Rate)
            .collect();
        while let Some(p) = work.pop() {
            if needed[p] {
                continue;
            }
            needed[p] = true;
            if let Some(g) = equations[p].cycle {
                work.extend(self.schedule.groups[g].iter().map(|e| position[*e]));
            }
            for d in &equations[p].dependencies {
                if matches!(
                    equations[*d].kind,
                    EquationType::Algebraic | EquationType::External | EquationType::Rate
                ) {
                    work.push(*d);
                }
            }
        }
        for (eq, needed) in equations.iter_mut().zip(needed) {
            eq.needed_for_rates = needed;
        }
    }

    fn report_cycle(&self, members: &[usize], issues: &mut IssueList) {
        let computed: Vec<VariableId> = members
            .iter()
            .filter_map(|e| {
                let k = self.classification.equations[*e].defines?;
                Some(self.representative(k, Some(*e)))
            })
            .collect();
        let first = &self.classification.equations[members[0]];
        let reference = first
            .reference
            .unwrap_or(IssueReference::Component(first.component));
        let message = match computed.as_slice() {
            [] => return,
            [only] => format!(
                "{} is computed by an implicit equation and needs a non-linear solver.",
                describe_capitalised(self.model, *only)
            ),
            [head, rest @ ..] => {
                let mut subject = describe_capitalised(self.model, *head);
                for (i, id) in rest.iter().enumerate() {
                    subject.push_str(if i + 1 == rest.len() { " and " } else { ", " });
                    subject.push_str(&describe(self.model, *id));
                }
                format!(
                    "{} are computed by an algebraic loop and need a non-linear solver.",
                    subject
                )
            }
        };
        issues.warning(message, reference);
    }
}
