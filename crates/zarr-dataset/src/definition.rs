//! In-memory dataset definitions, the input to [`crate::DatasetWriter`].

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::coords::Coordinate;
use crate::error::{DatasetError, Result};

/// A data variable with its values in row-major order over `dimensions`.
#[derive(Debug, Clone)]
pub struct VariableDefinition {
    pub name: String,
    pub dimensions: Vec<String>,
    pub values: Vec<f64>,
    pub attributes: Map<String, Value>,
}

impl VariableDefinition {
    pub fn new<I, S>(name: impl Into<String>, dimensions: I, values: Vec<f64>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            dimensions: dimensions.into_iter().map(Into::into).collect(),
            values,
            attributes: Map::new(),
        }
    }

    /// Add a user attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A complete labeled dataset: coordinates, data variables and attributes.
///
/// Each coordinate defines one dimension of the same name; the order of
/// `coordinates` is the declared dimension order.
#[derive(Debug, Clone, Default)]
pub struct DatasetDefinition {
    pub coordinates: Vec<Coordinate>,
    pub variables: Vec<VariableDefinition>,
    pub attributes: Map<String, Value>,
}

impl DatasetDefinition {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self {
            attributes,
            ..Default::default()
        }
    }

    pub fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinates.push(coordinate);
        self
    }

    pub fn with_variable(mut self, variable: VariableDefinition) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn coordinate(&self, name: &str) -> Option<&Coordinate> {
        self.coordinates.iter().find(|c| c.name == name)
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDefinition> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Declared dimension names, in order.
    pub fn dimension_names(&self) -> Vec<&str> {
        self.coordinates.iter().map(|c| c.name.as_str()).collect()
    }

    /// Shape of a variable as implied by its dimension labels.
    pub fn variable_shape(&self, variable: &VariableDefinition) -> Result<Vec<usize>> {
        variable
            .dimensions
            .iter()
            .map(|dim| {
                self.coordinate(dim).map(Coordinate::len).ok_or_else(|| {
                    DatasetError::invalid_definition(format!(
                        "variable '{}' uses undeclared dimension '{}'",
                        variable.name, dim
                    ))
                })
            })
            .collect()
    }

    /// Check the data model invariants.
    ///
    /// Names are unique across coordinates and variables, every variable's
    /// dimensions are declared without repetition, and value counts match the
    /// variable shape.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for name in self
            .coordinates
            .iter()
            .map(|c| &c.name)
            .chain(self.variables.iter().map(|v| &v.name))
        {
            if name.is_empty() || name.contains('/') {
                return Err(DatasetError::invalid_definition(format!(
                    "invalid array name '{}'",
                    name
                )));
            }
            if !names.insert(name.as_str()) {
                return Err(DatasetError::invalid_definition(format!(
                    "duplicate array name '{}'",
                    name
                )));
            }
        }

        for variable in &self.variables {
            let mut seen = HashSet::new();
            if let Some(dim) = variable.dimensions.iter().find(|d| !seen.insert(d.as_str())) {
                return Err(DatasetError::invalid_definition(format!(
                    "variable '{}' repeats dimension '{}'",
                    variable.name, dim
                )));
            }

            let shape = self.variable_shape(variable)?;
            let expected: usize = shape.iter().product();
            if variable.values.len() != expected {
                return Err(DatasetError::invalid_definition(format!(
                    "variable '{}' has {} values but its shape {:?} needs {}",
                    variable.name,
                    variable.values.len(),
                    shape,
                    expected
                )));
            }
        }

        Ok(())
    }
}
