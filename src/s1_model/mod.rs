//! Model snapshot consumed by the analyser.
//!
//! A `Model` is a fully resolved, already validated description of a
//! component-based mathematical model: components own variables and
//! equations, connections declare variables in different components to be
//! equivalent. Parsing of markup, imports and the encapsulation hierarchy
//! happen elsewhere; this module only holds the flattened result and can
//! load it from JSON.

pub mod expr;

pub use expr::{Equation, Expr, MathConstant, Operator, Piece};

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a model snapshot.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Index of a declared variable: component position, then variable position
/// within that component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariableId {
    pub component: usize,
    pub variable: usize,
}

impl VariableId {
    pub fn new(component: usize, variable: usize) -> Self {
        Self {
            component,
            variable,
        }
    }
}

/// Initial value of a variable: a literal or another variable of the same
/// component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitialValue {
    Literal(f64),
    Variable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(default = "dimensionless")]
    pub units: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<InitialValue>,
}

fn dimensionless() -> String {
    "dimensionless".to_string()
}

impl Variable {
    pub fn new(name: &str, units: &str) -> Self {
        Self {
            name: name.to_string(),
            units: units.to_string(),
            initial_value: None,
        }
    }

    pub fn with_initial_value(mut self, value: f64) -> Self {
        self.initial_value = Some(InitialValue::Literal(value));
        self
    }

    pub fn with_initialising_variable(mut self, name: &str) -> Self {
        self.initial_value = Some(InitialValue::Variable(name.to_string()));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub equations: Vec<Equation>,
}

impl Component {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn with_equation(mut self, lhs: Expr, rhs: Expr) -> Self {
        self.equations.push(Equation::new(lhs, rhs));
        self
    }

    /// Position of the named variable in this component.
    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }
}

/// Equivalence between two variables living in different components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub component_1: String,
    pub variable_1: String,
    pub component_2: String,
    pub variable_2: String,
}

impl Connection {
    pub fn new(component_1: &str, variable_1: &str, component_2: &str, variable_2: &str) -> Self {
        Self {
            component_1: component_1.to_string(),
            variable_1: variable_1.to_string(),
            component_2: component_2.to_string(),
            variable_2: variable_2.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_connection(mut self, connection: Connection) -> Self {
        self.connections.push(connection);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn component_index(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c.name == name)
    }

    /// Look up a declared variable by component and variable name.
    pub fn variable_id(&self, component: &str, variable: &str) -> Option<VariableId> {
        let c = self.component_index(component)?;
        let v = self.components[c].variable_index(variable)?;
        Some(VariableId::new(c, v))
    }

    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        self.components.get(id.component)?.variables.get(id.variable)
    }

    /// All declared variables in declaration order.
    pub fn variable_ids(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.components
            .iter()
            .enumerate()
            .flat_map(|(c, comp)| (0..comp.variables.len()).map(move |v| VariableId::new(c, v)))
    }

    pub fn variable_count(&self) -> usize {
        self.components.iter().map(|c| c.variables.len()).sum()
    }

    pub fn equation_count(&self) -> usize {
        self.components.iter().map(|c| c.equations.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_json() {
        let json = r#"{
            "name": "my_model",
            "components": [{
                "name": "my_component",
                "variables": [
                    {"name": "t", "units": "second"},
                    {"name": "v", "initial_value": 1.0},
                    {"name": "k", "units": "per_s", "initial_value": "v"}
                ],
                "equations": [
                    {"lhs": {"diff": {"bvar": "t", "ci": "v"}}, "rhs": {"ci": "k"}}
                ]
            }]
        }"#;
        let model = Model::from_json_str(json).expect("model should parse");
        assert_eq!(model.name, "my_model");
        assert_eq!(model.variable_count(), 3);
        assert_eq!(model.equation_count(), 1);

        let v = model.variable(VariableId::new(0, 1)).unwrap();
        assert_eq!(v.units, "dimensionless");
        assert_eq!(v.initial_value, Some(InitialValue::Literal(1.0)));

        let k = model.variable(VariableId::new(0, 2)).unwrap();
        assert_eq!(k.initial_value, Some(InitialValue::Variable("v".to_string())));
    }

    #[test]
    fn test_variable_lookup() {
        let model = Model::new("m")
            .with_component(Component::new("a").with_variable(Variable::new("x", "metre")))
            .with_component(
                Component::new("b")
                    .with_variable(Variable::new("y", "metre"))
                    .with_variable(Variable::new("z", "metre")),
            );
        assert_eq!(model.variable_id("b", "z"), Some(VariableId::new(1, 1)));
        assert_eq!(model.variable_id("b", "x"), None);
        assert_eq!(model.variable_id("c", "x"), None);
        assert_eq!(model.variable_ids().count(), 3);
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let err = Model::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ModelError::Json(_)), "{:?}", err);
    }
}
