use std::fs;
use std::path::Path;

use log::debug;

use crate::core::{Attribute, AttributeType, Cell, Dataset, Instance, RError};

/// Read a dataset from an ARFF file. The class attribute is resolved by a case-insensitive match
/// of `class_name` against the attribute names. This returns an error if the file cannot be read
/// or its content is invalid.
///
/// # Arguments
///
/// * `path`: The path of the ARFF file.
/// * `class_name`: The name of the class attribute.
///
/// returns: `Result<Dataset, RError>`
pub fn read_arff(path: &Path, class_name: &str) -> Result<Dataset, RError> {
    let content =
        fs::read_to_string(path).map_err(|e| RError::File(path.to_path_buf(), e.to_string()))?;
    read_arff_str(&content, class_name)
}

/// Read a dataset from the text of an ARFF file.
///
/// The accepted format is: one `@RELATION <name>` declaration, `@ATTRIBUTE <name> <type>` lines
/// where the type is `NUMERIC`/`REAL` or a `{v1,...,vk}` label list with declaration order
/// preserved, a `@DATA` marker and one comma-separated instance per line. Keywords and numeric
/// type names match case-insensitively; nominal cell values must match a declared label exactly.
/// Lines starting with `%` are comments and blank lines are ignored.
///
/// # Arguments
///
/// * `content`: The ARFF text.
/// * `class_name`: The name of the class attribute, matched case-insensitively.
///
/// returns: `Result<Dataset, RError>`
pub fn read_arff_str(content: &str, class_name: &str) -> Result<Dataset, RError> {
    let mut relation_name: Option<String> = None;
    let mut attributes: Vec<Attribute> = Vec::new();
    let mut instances: Vec<Instance> = Vec::new();
    let mut class_index: Option<usize> = None;
    let mut in_data = false;

    for (number, raw_line) in content.lines().enumerate() {
        let number = number + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        if in_data {
            instances.push(parse_instance(line, &attributes, number)?);
            continue;
        }

        let keyword = line.split_whitespace().next().unwrap_or_default();
        let rest = line[keyword.len()..].trim();
        if keyword.eq_ignore_ascii_case("@relation") {
            let name = rest.split_whitespace().next().ok_or_else(|| {
                RError::BadData(number, "the relation name is missing".to_string())
            })?;
            relation_name = Some(name.to_string());
        } else if keyword.eq_ignore_ascii_case("@attribute") {
            let attribute = parse_attribute(rest, number)?;
            if attribute.name().eq_ignore_ascii_case(class_name) {
                class_index = Some(attributes.len());
            }
            attributes.push(attribute);
        } else if keyword.eq_ignore_ascii_case("@data") {
            in_data = true;
        } else {
            return Err(RError::BadData(
                number,
                format!("unexpected token: {keyword}"),
            ));
        }
    }

    let relation_name = relation_name
        .ok_or_else(|| RError::BadSchema("the @RELATION declaration is missing".to_string()))?;
    let class_index = class_index.ok_or_else(|| {
        RError::BadSchema(format!(
            "no attribute matches the class attribute name '{class_name}'"
        ))
    })?;

    debug!(
        "Read relation '{}' with {} attributes and {} instances",
        relation_name,
        attributes.len(),
        instances.len()
    );
    Dataset::new(&relation_name, attributes, instances, class_index)
}

/// Parse the name and type of one `@ATTRIBUTE` declaration.
fn parse_attribute(declaration: &str, number: usize) -> Result<Attribute, RError> {
    let mut parts = declaration.splitn(2, char::is_whitespace);
    let name = parts
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| RError::BadData(number, "the attribute name is missing".to_string()))?;
    let type_spec = parts.next().unwrap_or_default().trim();

    let attribute_type = if type_spec.eq_ignore_ascii_case("numeric")
        || type_spec.eq_ignore_ascii_case("real")
    {
        AttributeType::Numeric
    } else if type_spec.starts_with('{') && type_spec.ends_with('}') {
        let labels: Vec<String> = type_spec[1..type_spec.len() - 1]
            .split(',')
            .map(|label| label.trim().to_string())
            .collect();
        if labels.iter().any(|label| label.is_empty()) {
            return Err(RError::BadData(
                number,
                format!("the label list of attribute '{name}' contains an empty label"),
            ));
        }
        AttributeType::Nominal(labels)
    } else {
        return Err(RError::BadData(
            number,
            format!("unknown type '{type_spec}' for attribute '{name}'"),
        ));
    };
    Ok(Attribute::new(name, attribute_type))
}

/// Parse one comma-separated data line into an instance.
fn parse_instance(
    line: &str,
    attributes: &[Attribute],
    number: usize,
) -> Result<Instance, RError> {
    let values: Vec<&str> = line.split(',').map(str::trim).collect();
    if values.len() != attributes.len() {
        return Err(RError::BadData(
            number,
            format!(
                "expected {} values but found {}",
                attributes.len(),
                values.len()
            ),
        ));
    }

    let cells = attributes
        .iter()
        .zip(values)
        .map(|(attribute, value)| match attribute.attribute_type() {
            AttributeType::Numeric => value
                .parse::<f64>()
                .map(Cell::Numeric)
                .map_err(|_| RError::BadData(number, format!("'{value}' is not a number"))),
            AttributeType::Nominal(_) => {
                attribute.label_index(value).map(Cell::Label).ok_or_else(|| {
                    RError::BadData(
                        number,
                        format!(
                            "unknown nominal value '{}' for attribute '{}'",
                            value,
                            attribute.name()
                        ),
                    )
                })
            }
        })
        .collect::<Result<Vec<Cell>, RError>>()?;
    Ok(Instance::new(cells))
}
