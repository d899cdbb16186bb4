use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// The type of a dataset column. A nominal attribute carries the ordered list of labels a cell may
/// take; each label is identified by its position in the list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum AttributeType {
    /// A floating-point column.
    Numeric,
    /// A categorical column with the declared labels in declaration order.
    Nominal(Vec<String>),
}

/// A named dataset column.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Attribute {
    /// The attribute name.
    name: String,
    /// The attribute type.
    attribute_type: AttributeType,
}

impl Attribute {
    /// Create a new attribute.
    ///
    /// # Arguments
    ///
    /// * `name`: The attribute name.
    /// * `attribute_type`: The attribute type.
    ///
    /// returns: `Attribute`
    pub fn new(name: &str, attribute_type: AttributeType) -> Self {
        Self {
            name: name.to_string(),
            attribute_type,
        }
    }

    /// Get the attribute name.
    ///
    /// returns: `&str`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the attribute type.
    ///
    /// returns: `&AttributeType`
    pub fn attribute_type(&self) -> &AttributeType {
        &self.attribute_type
    }

    /// Whether the attribute is nominal.
    ///
    /// returns: `bool`
    pub fn is_nominal(&self) -> bool {
        matches!(self.attribute_type, AttributeType::Nominal(_))
    }

    /// Get the ordered label list of a nominal attribute. This is `None` for numeric attributes.
    ///
    /// returns: `Option<&[String]>`
    pub fn labels(&self) -> Option<&[String]> {
        match &self.attribute_type {
            AttributeType::Numeric => None,
            AttributeType::Nominal(labels) => Some(labels),
        }
    }

    /// Get the number of labels of a nominal attribute. This is `0` for numeric attributes.
    ///
    /// returns: `usize`
    pub fn number_of_labels(&self) -> usize {
        self.labels().map_or(0, |labels| labels.len())
    }

    /// Find the index assigned to a label. The match is exact and case-sensitive. This returns
    /// `None` for numeric attributes or when the label was not declared.
    ///
    /// # Arguments
    ///
    /// * `label`: The label to look up.
    ///
    /// returns: `Option<usize>`
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels()?.iter().position(|l| l == label)
    }

    /// Get the label stored at a position of a nominal attribute.
    ///
    /// # Arguments
    ///
    /// * `index`: The label position.
    ///
    /// returns: `Option<&str>`
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels()?.get(index).map(|l| l.as_str())
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.attribute_type {
            AttributeType::Numeric => write!(f, "{} (numeric)", self.name),
            AttributeType::Nominal(labels) => {
                write!(f, "{} {{{}}}", self.name, labels.join(","))
            }
        }
    }
}
