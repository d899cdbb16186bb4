use std::fmt::{Display, Formatter};

use crate::core::{Attribute, AttributeType, RError};

/// A value stored in one instance cell. The variant must match the type of the owning attribute:
/// numeric attributes store a float, nominal attributes store the index of one of the declared
/// labels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Cell {
    /// A numeric value.
    Numeric(f64),
    /// The index of a nominal label.
    Label(usize),
}

impl Cell {
    /// Get the numeric value of the cell, if any.
    ///
    /// returns: `Option<f64>`
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Cell::Numeric(value) => Some(*value),
            Cell::Label(_) => None,
        }
    }

    /// Get the label index of the cell, if any.
    ///
    /// returns: `Option<usize>`
    pub fn as_label(&self) -> Option<usize> {
        match self {
            Cell::Numeric(_) => None,
            Cell::Label(index) => Some(*index),
        }
    }
}

/// One dataset row: an ordered vector of cells aligned with the attribute list.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    cells: Vec<Cell>,
}

impl Instance {
    /// Create an instance from its cells.
    ///
    /// # Arguments
    ///
    /// * `cells`: The cell values, one per attribute in attribute order.
    ///
    /// returns: `Instance`
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Get the instance cells.
    ///
    /// returns: `&[Cell]`
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Get the cell for an attribute.
    ///
    /// # Arguments
    ///
    /// * `index`: The attribute index.
    ///
    /// returns: `&Cell`
    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }
}

/// An immutable tabular dataset: a relation name, the ordered attribute list, the ordered instance
/// list and the index of the class attribute. The constructor validates the schema and the cells,
/// so evaluators can index the data without further checks.
#[derive(Debug)]
pub struct Dataset {
    /// The relation name.
    relation_name: String,
    /// The dataset columns.
    attributes: Vec<Attribute>,
    /// The dataset rows.
    instances: Vec<Instance>,
    /// The index of the class attribute.
    class_index: usize,
}

impl Dataset {
    /// Build a dataset and validate it. This returns an error if the class index is out of range,
    /// the class attribute is not nominal, an instance does not have one cell per attribute, or a
    /// cell does not match the type (or label list) of its attribute.
    ///
    /// # Arguments
    ///
    /// * `relation_name`: The relation name.
    /// * `attributes`: The ordered attribute list.
    /// * `instances`: The ordered instance list.
    /// * `class_index`: The index of the class attribute.
    ///
    /// returns: `Result<Dataset, RError>`
    pub fn new(
        relation_name: &str,
        attributes: Vec<Attribute>,
        instances: Vec<Instance>,
        class_index: usize,
    ) -> Result<Self, RError> {
        if attributes.is_empty() {
            return Err(RError::BadSchema(
                "the dataset has no attributes".to_string(),
            ));
        }
        if class_index >= attributes.len() {
            return Err(RError::BadSchema(format!(
                "the class index {} is outside the attribute list (size {})",
                class_index,
                attributes.len()
            )));
        }
        if !attributes[class_index].is_nominal() {
            return Err(RError::BadSchema(format!(
                "the class attribute '{}' is not nominal",
                attributes[class_index].name()
            )));
        }

        for (row, instance) in instances.iter().enumerate() {
            if instance.cells().len() != attributes.len() {
                return Err(RError::BadSchema(format!(
                    "instance {} has {} cells but the dataset has {} attributes",
                    row,
                    instance.cells().len(),
                    attributes.len()
                )));
            }
            for (attribute, cell) in attributes.iter().zip(instance.cells()) {
                match (attribute.attribute_type(), cell) {
                    (AttributeType::Numeric, Cell::Numeric(_)) => {}
                    (AttributeType::Nominal(labels), Cell::Label(index)) => {
                        if *index >= labels.len() {
                            return Err(RError::BadSchema(format!(
                                "instance {} stores label index {} but attribute '{}' only has {} labels",
                                row,
                                index,
                                attribute.name(),
                                labels.len()
                            )));
                        }
                    }
                    _ => {
                        return Err(RError::BadSchema(format!(
                            "instance {} stores a cell of the wrong type for attribute '{}'",
                            row,
                            attribute.name()
                        )));
                    }
                }
            }
        }

        Ok(Self {
            relation_name: relation_name.to_string(),
            attributes,
            instances,
            class_index,
        })
    }

    /// Get the relation name.
    ///
    /// returns: `&str`
    pub fn relation_name(&self) -> &str {
        &self.relation_name
    }

    /// Get the attribute list.
    ///
    /// returns: `&[Attribute]`
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Get one attribute. This returns an error if the index is out of range.
    ///
    /// # Arguments
    ///
    /// * `index`: The attribute index.
    ///
    /// returns: `Result<&Attribute, RError>`
    pub fn attribute(&self, index: usize) -> Result<&Attribute, RError> {
        self.attributes.get(index).ok_or(RError::BadIndex(index))
    }

    /// Get the instance list.
    ///
    /// returns: `&[Instance]`
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Get the number of attributes.
    ///
    /// returns: `usize`
    pub fn number_of_attributes(&self) -> usize {
        self.attributes.len()
    }

    /// Get the number of instances.
    ///
    /// returns: `usize`
    pub fn number_of_instances(&self) -> usize {
        self.instances.len()
    }

    /// Get the index of the class attribute.
    ///
    /// returns: `usize`
    pub fn class_index(&self) -> usize {
        self.class_index
    }

    /// Get the number of classes declared on the class attribute.
    ///
    /// returns: `usize`
    pub fn number_of_classes(&self) -> usize {
        self.attributes[self.class_index].number_of_labels()
    }

    /// Get the class label index of an instance.
    ///
    /// # Arguments
    ///
    /// * `index`: The instance index.
    ///
    /// returns: `usize`
    pub fn class_of(&self, index: usize) -> usize {
        match self.instances[index].cell(self.class_index) {
            Cell::Label(value) => *value,
            // unreachable: the constructor enforces a nominal class attribute
            Cell::Numeric(_) => 0,
        }
    }
}

impl Display for Dataset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Dataset '{}' with {} attributes, {} instances and {} classes",
            self.relation_name,
            self.number_of_attributes(),
            self.number_of_instances(),
            self.number_of_classes(),
        )
    }
}
