use polars::prelude::*;
use rayon::prelude::*;
use std::fmt::Display;
use std::time::Instant;
use tracing::trace;

use crate::report::Grouped;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub data: Vec<String>,
}

impl ColumnView {
    fn new(name: String, data: Vec<String>) -> Self {
        let max_width = data.iter().map(|s| s.chars().count()).max().unwrap_or(0);
        let width = std::cmp::max(name.chars().count(), max_width);
        ColumnView { name, width, data }
    }
}

/// Column oriented, already formatted table content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData {
    pub columns: Vec<ColumnView>,
}

impl TableData {
    /// Formats every column of `df` as strings. Each column is converted in its
    /// own rayon task.
    pub fn from_frame(df: &DataFrame) -> Result<Self, PolarsError> {
        let start_time = Instant::now();
        let columns: Result<Vec<ColumnView>, _> = df
            .get_column_names()
            .par_iter()
            .map(|name| Self::load_column(df, name.as_str()))
            .collect();
        trace!(
            "Formatted {} columns in {}ms",
            df.width(),
            start_time.elapsed().as_millis()
        );
        Ok(Self { columns: columns? })
    }

    pub fn from_grouped<V: Copy + Display>(grouped: &Grouped<V>) -> Self {
        Self::from_rows(
            &[grouped.key_name.as_str(), grouped.value_name.as_str()],
            grouped.rows(),
        )
    }

    pub fn from_rows(headers: &[&str], rows: Vec<Vec<String>>) -> Self {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let data = rows
                    .iter()
                    .map(|row| row.get(idx).cloned().unwrap_or_default())
                    .collect();
                ColumnView::new(name.to_string(), data)
            })
            .collect();
        Self { columns }
    }

    pub fn nrows(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row(&self, idx: usize) -> Vec<&str> {
        self.columns
            .iter()
            .map(|c| c.data.get(idx).map(String::as_str).unwrap_or(""))
            .collect()
    }

    fn load_column(df: &DataFrame, col_name: &str) -> Result<ColumnView, PolarsError> {
        let col = df.column(col_name)?.cast(&DataType::String)?;
        let data = col
            .str()?
            .into_iter()
            .map(|value| match value {
                Some(s) => s.replace("\r\n", " ↵ ").replace('\n', " ↵ "),
                None => String::from("∅"),
            })
            .collect();
        Ok(ColumnView::new(col_name.to_string(), data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_frame_formats_values() {
        let df = df!(
            "ProductType" => &[Some("Dairy"), None],
            "OutletSales" => &[12.5, 3.0]
        )
        .unwrap();
        let table = TableData::from_frame(&df).unwrap();
        assert_eq!(table.headers(), vec!["ProductType", "OutletSales"]);
        assert_eq!(table.nrows(), 2);
        assert_eq!(table.row(1)[0], "∅");
        assert_eq!(table.columns[0].width, "ProductType".len());
    }

    #[test]
    fn test_from_grouped() {
        let grouped = Grouped {
            key_name: "LocationType".to_string(),
            value_name: "count".to_string(),
            entries: vec![("Tier 3".to_string(), 3u64), ("Tier 1".to_string(), 2)],
        };
        let table = TableData::from_grouped(&grouped);
        assert_eq!(table.row(0), vec!["Tier 3", "3"]);
        assert_eq!(table.columns[1].width, 5);
    }

    #[test]
    fn test_multiline_values_are_flattened() {
        let df = df!("Text" => &["a\nb"]).unwrap();
        let table = TableData::from_frame(&df).unwrap();
        assert_eq!(table.row(0), vec!["a ↵ b"]);
    }
}
