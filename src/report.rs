//! Report engine.
//!
//! Every report is a pure function over the cleaned table. Nothing here keeps
//! state between calls; the table is passed in explicitly each time.

use derive_setters::Setters;
use polars::prelude::*;
use std::fmt::Display;
use tracing::debug;

use crate::dataset::{ESTABLISHMENT_YEAR, LOCATION_TYPE, OUTLET_SALES, PRODUCT_TYPE};

/// Name of the aggregated column produced by the counting reports.
pub const COUNT: &str = "count";

/// Rendered in place of a null group key.
pub const NULL_KEY: &str = "∅";

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct ReportConfig {
    /// Establishment year inspected by the best outlet section.
    pub year: i64,
    /// Number of groups kept in ranked charts.
    pub top_n: usize,
    /// Number of groups kept in the per year category table.
    pub table_limit: usize,
    /// Number of rows shown in table previews.
    pub preview_rows: usize,
    /// Label used for outlets with unknown size.
    #[setters(into)]
    pub size_fill: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            year: 1985,
            top_n: 12,
            table_limit: 16,
            preview_rows: 15,
            size_fill: "Medium".to_string(),
        }
    }
}

/// An ordered key -> value mapping produced by a grouping report.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouped<V> {
    pub key_name: String,
    pub value_name: String,
    pub entries: Vec<(String, V)>,
}

impl<V: Copy> Grouped<V> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<(&str, V)> {
        self.entries.first().map(|(k, v)| (k.as_str(), *v))
    }

    /// Keeps the first `n` entries. Fewer entries than `n` is not an error.
    pub fn head(mut self, n: usize) -> Self {
        self.entries.truncate(n);
        self
    }
}

impl Grouped<f64> {
    /// Drops the fractional part of every value (towards zero).
    pub fn truncated(self) -> Grouped<i64> {
        Grouped {
            key_name: self.key_name,
            value_name: self.value_name,
            entries: self
                .entries
                .into_iter()
                .map(|(k, v)| (k, v.trunc() as i64))
                .collect(),
        }
    }
}

impl<V: Display> Grouped<V> {
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.entries
            .iter()
            .map(|(k, v)| vec![k.clone(), v.to_string()])
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub non_null: usize,
    pub dtype: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub estimated_size: usize,
}

#[derive(Debug, Clone, Copy)]
enum Order {
    KeyAscending,
    ValueDescending,
}

// -------------------------- Scalar reports ----------------------------- //

/// Null count per column, in column order.
pub fn null_counts(df: &DataFrame) -> Vec<(String, usize)> {
    df.get_columns()
        .iter()
        .map(|c| (c.name().to_string(), c.null_count()))
        .collect()
}

/// Number of rows that exactly repeat an earlier row.
pub fn duplicate_count(df: &DataFrame) -> PolarsResult<usize> {
    let distinct = df
        .clone()
        .lazy()
        .unique(None, UniqueKeepStrategy::First)
        .collect()?
        .height();
    Ok(df.height().saturating_sub(distinct))
}

pub fn total_sales(df: &DataFrame) -> PolarsResult<f64> {
    let sales = df.column(OUTLET_SALES)?.cast(&DataType::Float64)?;
    Ok(sales.f64()?.sum().unwrap_or(0.0))
}

pub fn preview(df: &DataFrame, rows: usize) -> DataFrame {
    df.head(Some(rows))
}

pub fn frame_summary(df: &DataFrame) -> FrameSummary {
    let columns = df
        .get_columns()
        .iter()
        .map(|c| ColumnSummary {
            name: c.name().to_string(),
            non_null: c.len() - c.null_count(),
            dtype: c.dtype().to_string(),
        })
        .collect();
    FrameSummary {
        rows: df.height(),
        columns,
        estimated_size: df.estimated_size(),
    }
}

// -------------------------- Grouping reports --------------------------- //

/// Row count per distinct value of `column`, most frequent first.
pub fn value_counts(df: &DataFrame, column: &str) -> PolarsResult<Grouped<u64>> {
    count_by(df.clone().lazy(), column, Order::ValueDescending)
}

pub fn year_counts(df: &DataFrame) -> PolarsResult<Grouped<u64>> {
    value_counts(df, ESTABLISHMENT_YEAR)
}

/// Sales per establishment year, oldest first, truncated to whole units.
pub fn sales_by_year(df: &DataFrame) -> PolarsResult<Grouped<i64>> {
    let sums = sum_by(
        df.clone().lazy(),
        ESTABLISHMENT_YEAR,
        OUTLET_SALES,
        Order::KeyAscending,
    )?;
    Ok(sums.truncated())
}

/// Sales per category for outlets founded in `year`, categories in name
/// order, at most `limit` of them.
pub fn category_sales_for_year(
    df: &DataFrame,
    year: i64,
    limit: usize,
) -> PolarsResult<Grouped<i64>> {
    let sums = sum_by(
        filter_year(df, year),
        PRODUCT_TYPE,
        OUTLET_SALES,
        Order::KeyAscending,
    )?;
    Ok(sums.head(limit).truncated())
}

/// The `n` best selling categories for outlets founded in `year`.
pub fn top_category_sales_for_year(
    df: &DataFrame,
    year: i64,
    n: usize,
) -> PolarsResult<Grouped<f64>> {
    let sums = sum_by(
        filter_year(df, year),
        PRODUCT_TYPE,
        OUTLET_SALES,
        Order::ValueDescending,
    )?;
    Ok(sums.head(n))
}

pub fn category_counts(df: &DataFrame) -> PolarsResult<Grouped<u64>> {
    value_counts(df, PRODUCT_TYPE)
}

pub fn category_counts_by_name(df: &DataFrame) -> PolarsResult<Grouped<u64>> {
    count_by(df.clone().lazy(), PRODUCT_TYPE, Order::KeyAscending)
}

/// Sales per category over all years, best selling first.
pub fn category_sales(df: &DataFrame) -> PolarsResult<Grouped<f64>> {
    sum_by(
        df.clone().lazy(),
        PRODUCT_TYPE,
        OUTLET_SALES,
        Order::ValueDescending,
    )
}

pub fn top_category_sales(df: &DataFrame, n: usize) -> PolarsResult<Grouped<f64>> {
    Ok(category_sales(df)?.head(n))
}

pub fn location_counts(df: &DataFrame) -> PolarsResult<Grouped<u64>> {
    value_counts(df, LOCATION_TYPE)
}

pub fn sales_by_location(df: &DataFrame) -> PolarsResult<Grouped<f64>> {
    sum_by(
        df.clone().lazy(),
        LOCATION_TYPE,
        OUTLET_SALES,
        Order::KeyAscending,
    )
}

// ------------------------------ Helpers -------------------------------- //

fn filter_year(df: &DataFrame, year: i64) -> LazyFrame {
    df.clone()
        .lazy()
        .filter(col(ESTABLISHMENT_YEAR).eq(lit(year)))
}

fn sorted(lf: LazyFrame, key: &str, value: &str, order: Order) -> LazyFrame {
    let (by, descending) = match order {
        Order::KeyAscending => (key, false),
        Order::ValueDescending => (value, true),
    };
    lf.sort(
        [by],
        SortMultipleOptions::default()
            .with_order_descending(descending)
            .with_nulls_last(true)
            .with_maintain_order(true),
    )
}

fn count_by(lf: LazyFrame, key: &str, order: Order) -> PolarsResult<Grouped<u64>> {
    let grouped = lf.group_by_stable([col(key)]).agg([len().alias(COUNT)]);
    let df = sorted(grouped, key, COUNT, order).collect()?;
    debug!("Counted {} groups of '{}'", df.height(), key);

    let keys = read_keys(&df, key)?;
    let counts = df.column(COUNT)?.cast(&DataType::UInt64)?;
    let values = counts.u64()?.into_iter().map(|v| v.unwrap_or(0));
    Ok(Grouped {
        key_name: key.to_string(),
        value_name: COUNT.to_string(),
        entries: keys.into_iter().zip(values).collect(),
    })
}

fn sum_by(lf: LazyFrame, key: &str, value: &str, order: Order) -> PolarsResult<Grouped<f64>> {
    let grouped = lf.group_by_stable([col(key)]).agg([col(value).sum()]);
    let df = sorted(grouped, key, value, order).collect()?;
    debug!("Summed '{}' over {} groups of '{}'", value, df.height(), key);

    let keys = read_keys(&df, key)?;
    let sums = df.column(value)?.cast(&DataType::Float64)?;
    let values = sums.f64()?.into_iter().map(|v| v.unwrap_or(0.0));
    Ok(Grouped {
        key_name: key.to_string(),
        value_name: value.to_string(),
        entries: keys.into_iter().zip(values).collect(),
    })
}

fn read_keys(df: &DataFrame, key: &str) -> PolarsResult<Vec<String>> {
    let keys = df.column(key)?.cast(&DataType::String)?;
    Ok(keys
        .str()?
        .into_iter()
        .map(|k| k.map(str::to_string).unwrap_or_else(|| NULL_KEY.to_string()))
        .collect())
}

#[cfg(test)]
impl<V: Copy> Grouped<V> {
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn values(&self) -> Vec<V> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }
}

#[cfg(test)]
impl Grouped<f64> {
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sales_frame() -> DataFrame {
        df!(
            PRODUCT_TYPE => &["Snacks", "Dairy", "Snacks", "Meat", "Dairy", "Breads"],
            ESTABLISHMENT_YEAR => &[1985i64, 1999, 1985, 1985, 2004, 1999],
            LOCATION_TYPE => &["Tier 3", "Tier 1", "Tier 3", "Tier 2", "Tier 2", "Tier 1"],
            OUTLET_SALES => &[100.7, 30.2, 50.5, 80.0, 20.0, 10.9]
        )
        .unwrap()
    }

    #[test]
    fn test_category_frequency_and_revenue() {
        let df = df!(
            PRODUCT_TYPE => &["Snacks", "Snacks", "Dairy"],
            OUTLET_SALES => &[100.0, 50.0, 30.0]
        )
        .unwrap();

        let counts = category_counts(&df).unwrap();
        assert_eq!(
            counts.entries,
            vec![("Snacks".to_string(), 2), ("Dairy".to_string(), 1)]
        );

        let revenue = category_sales(&df).unwrap();
        assert_eq!(revenue.keys(), vec!["Snacks", "Dairy"]);
        assert_eq!(revenue.get("Snacks"), Some(150.0));
        assert_eq!(revenue.get("Dairy"), Some(30.0));
    }

    #[test]
    fn test_category_sales_conserve_total() {
        let df = sales_frame();
        let by_category = category_sales(&df).unwrap();
        let total = total_sales(&df).unwrap();
        assert!((by_category.total() - total).abs() < 1e-9);
    }

    #[test]
    fn test_top_categories_are_prefix_of_ranking() {
        let df = sales_frame();
        let all = category_sales(&df).unwrap();
        for n in [0, 1, 2, 12] {
            let top = top_category_sales(&df, n).unwrap();
            assert_eq!(top.len(), n.min(all.len()));
            assert_eq!(top.entries.as_slice(), &all.entries[..top.len()]);
        }
        let values = all.values();
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_missing_year_yields_empty_grouping() {
        let df = sales_frame();
        assert!(category_sales_for_year(&df, 1970, 16).unwrap().is_empty());
        assert!(top_category_sales_for_year(&df, 1970, 12).unwrap().is_empty());
    }

    #[test]
    fn test_category_sales_for_year() {
        let df = sales_frame();

        let by_name = category_sales_for_year(&df, 1985, 16).unwrap();
        assert_eq!(
            by_name.entries,
            vec![("Meat".to_string(), 80), ("Snacks".to_string(), 151)]
        );

        let ranked = top_category_sales_for_year(&df, 1985, 12).unwrap();
        assert_eq!(ranked.keys(), vec!["Snacks", "Meat"]);

        let limited = category_sales_for_year(&df, 1985, 1).unwrap();
        assert_eq!(limited.keys(), vec!["Meat"]);
    }

    #[test]
    fn test_sales_by_year_truncates() {
        let df = sales_frame();
        let by_year = sales_by_year(&df).unwrap();
        assert_eq!(
            by_year.entries,
            vec![
                ("1985".to_string(), 231),
                ("1999".to_string(), 41),
                ("2004".to_string(), 20),
            ]
        );
    }

    #[test]
    fn test_year_counts_most_frequent_first() {
        let df = sales_frame();
        let counts = year_counts(&df).unwrap();
        assert_eq!(counts.first(), Some(("1985", 3)));
        assert_eq!(counts.values().iter().sum::<u64>(), df.height() as u64);
    }

    #[test]
    fn test_location_reports() {
        let df = sales_frame();
        let sales = sales_by_location(&df).unwrap();
        assert_eq!(sales.keys(), vec!["Tier 1", "Tier 2", "Tier 3"]);

        let counts = location_counts(&df).unwrap();
        assert_eq!(counts.len(), 3);
        assert_eq!(counts.values().iter().sum::<u64>(), 6);
    }

    #[test]
    fn test_category_counts_by_name() {
        let df = sales_frame();
        let counts = category_counts_by_name(&df).unwrap();
        assert_eq!(counts.keys(), vec!["Breads", "Dairy", "Meat", "Snacks"]);
    }

    #[test]
    fn test_duplicate_count() {
        let df = df!(
            PRODUCT_TYPE => &["Snacks", "Snacks", "Dairy"],
            OUTLET_SALES => &[100.0, 100.0, 30.0]
        )
        .unwrap();
        assert_eq!(duplicate_count(&df).unwrap(), 1);
        assert_eq!(duplicate_count(&sales_frame()).unwrap(), 0);
    }

    #[test]
    fn test_frame_summary() {
        let df = df!(
            PRODUCT_TYPE => &[Some("Snacks"), None],
            OUTLET_SALES => &[1.0, 2.0]
        )
        .unwrap();
        let summary = frame_summary(&df);
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.columns[0].non_null, 1);
        assert_eq!(summary.columns[1].non_null, 2);
        assert_eq!(null_counts(&df)[0], (PRODUCT_TYPE.to_string(), 1));
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let df = df!(PRODUCT_TYPE => &["Snacks"]).unwrap();
        assert!(category_sales(&df).is_err());
    }
}
