use std::io::Write;

use crate::core::{Attribute, AttributeType, Cell, Dataset, RError};

/// Write a dataset as ARFF text.
///
/// # Arguments
///
/// * `dataset`: The dataset to write.
/// * `out`: The destination writer.
///
/// returns: `Result<(), RError>`
pub fn write_arff<W: Write>(dataset: &Dataset, out: &mut W) -> Result<(), RError> {
    let columns: Vec<usize> = (0..dataset.number_of_attributes()).collect();
    write_columns(dataset, &columns, out)
}

/// Write the projection of a dataset as ARFF text: the retained attributes in the given order,
/// followed by the class attribute, with the instance rows projected accordingly.
///
/// # Arguments
///
/// * `dataset`: The dataset to write.
/// * `retained`: The attribute indices to keep, typically from [`crate::ranking::Ranking`].
/// * `out`: The destination writer.
///
/// returns: `Result<(), RError>`
pub fn write_arff_retained<W: Write>(
    dataset: &Dataset,
    retained: &[usize],
    out: &mut W,
) -> Result<(), RError> {
    let mut columns = retained.to_vec();
    columns.push(dataset.class_index());
    write_columns(dataset, &columns, out)
}

fn write_columns<W: Write>(
    dataset: &Dataset,
    columns: &[usize],
    out: &mut W,
) -> Result<(), RError> {
    let io_error = |e: std::io::Error| RError::Generic(format!("cannot write the dataset: {e}"));

    writeln!(out, "@RELATION {}", dataset.relation_name()).map_err(io_error)?;
    writeln!(out).map_err(io_error)?;

    for &column in columns {
        let attribute = dataset.attribute(column)?;
        match attribute.attribute_type() {
            AttributeType::Numeric => {
                writeln!(out, "@ATTRIBUTE {} REAL", attribute.name()).map_err(io_error)?;
            }
            AttributeType::Nominal(labels) => {
                writeln!(out, "@ATTRIBUTE {} {{{}}}", attribute.name(), labels.join(","))
                    .map_err(io_error)?;
            }
        }
    }

    writeln!(out).map_err(io_error)?;
    writeln!(out, "@DATA").map_err(io_error)?;
    for instance in dataset.instances() {
        let row: Vec<String> = columns
            .iter()
            .map(|&column| format_cell(&dataset.attributes()[column], instance.cell(column)))
            .collect();
        writeln!(out, "{}", row.join(",")).map_err(io_error)?;
    }
    Ok(())
}

/// Format one cell value. Numeric values without a fractional part print as integers.
fn format_cell(attribute: &Attribute, cell: &Cell) -> String {
    match cell {
        Cell::Numeric(value) => {
            if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                format!("{}", *value as i64)
            } else {
                format!("{value}")
            }
        }
        Cell::Label(index) => attribute.label(*index).unwrap_or_default().to_string(),
    }
}

#[cfg(test)]
mod test {
    use crate::arff::{read_arff_str, write_arff, write_arff_retained};
    use crate::core::Cell;

    const GENOTYPES: &str = "\
@RELATION genotypes

@ATTRIBUTE snp1 {AA,Aa,aa}
@ATTRIBUTE bmi NUMERIC
@ATTRIBUTE Class {case,control}

@DATA
AA,21.5,case
aa,30,control
Aa,25,case
";

    #[test]
    /// Reading a file and writing it back keeps the relation, the attributes in order and the
    /// cell values.
    fn test_round_trip() {
        let dataset = read_arff_str(GENOTYPES, "Class").unwrap();
        let mut buffer = Vec::new();
        write_arff(&dataset, &mut buffer).unwrap();

        let written = String::from_utf8(buffer).unwrap();
        let reread = read_arff_str(&written, "Class").unwrap();

        assert_eq!(reread.relation_name(), dataset.relation_name());
        assert_eq!(reread.attributes(), dataset.attributes());
        assert_eq!(reread.instances(), dataset.instances());
        assert_eq!(reread.class_index(), dataset.class_index());
    }

    #[test]
    /// Integral numeric values print without a fractional part, other values keep a parseable
    /// representation.
    fn test_numeric_formatting() {
        let dataset = read_arff_str(GENOTYPES, "Class").unwrap();
        let mut buffer = Vec::new();
        write_arff(&dataset, &mut buffer).unwrap();

        let written = String::from_utf8(buffer).unwrap();
        assert!(written.contains("aa,30,control"));
        assert!(written.contains("AA,21.5,case"));
        assert!(written.contains("@ATTRIBUTE bmi REAL"));
    }

    #[test]
    /// The projection keeps the retained attributes in ranking order and appends the class
    /// attribute.
    fn test_retained_projection() {
        let dataset = read_arff_str(GENOTYPES, "Class").unwrap();
        let mut buffer = Vec::new();
        // retain bmi only, ahead of snp1
        write_arff_retained(&dataset, &[1], &mut buffer).unwrap();

        let written = String::from_utf8(buffer).unwrap();
        let projected = read_arff_str(&written, "Class").unwrap();

        assert_eq!(projected.number_of_attributes(), 2);
        assert_eq!(projected.attribute(0).unwrap().name(), "bmi");
        assert_eq!(projected.attribute(1).unwrap().name(), "Class");
        assert_eq!(projected.class_index(), 1);
        assert_eq!(*projected.instances()[0].cell(0), Cell::Numeric(21.5));
        assert_eq!(*projected.instances()[1].cell(1), Cell::Label(1));
    }
}
