//! The ten dashboard sections.
//!
//! A [`Section`] is dispatched through [`HANDLERS`] to a function that runs the
//! reports it needs and lays the results out as a list of [`Block`]s. The same
//! blocks are drawn by the TUI and by [`SectionView::to_plain_text`].

use clap::ValueEnum;
use polars::prelude::*;
use ratatui::style::Color;
use std::fmt::Write;
use tabled::{builder::Builder, settings::Style};
use tracing::{debug, instrument, warn};

use crate::dataset::{COLUMN_DESCRIPTIONS, Dataset};
use crate::report::{self, ReportConfig};
use crate::table::TableData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Section {
    DataPreview,
    DataInfo,
    NullAnalysis,
    SalesByYear,
    BestOutletByYear,
    CategoryBreakdown,
    TopCategories,
    RevenueByCategory,
    LocationBreakdown,
    Conclusions,
}

impl Section {
    pub const ALL: [Section; 10] = [
        Section::DataPreview,
        Section::DataInfo,
        Section::NullAnalysis,
        Section::SalesByYear,
        Section::BestOutletByYear,
        Section::CategoryBreakdown,
        Section::TopCategories,
        Section::RevenueByCategory,
        Section::LocationBreakdown,
        Section::Conclusions,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Section::DataPreview => "Data preview",
            Section::DataInfo => "Data info",
            Section::NullAnalysis => "Null value analysis",
            Section::SalesByYear => "Sales by establishment year",
            Section::BestOutletByYear => "Best outlet by establishment year",
            Section::CategoryBreakdown => "Product category breakdown",
            Section::TopCategories => "Best selling categories",
            Section::RevenueByCategory => "Revenue by category",
            Section::LocationBreakdown => "Outlet location with most sales",
            Section::Conclusions => "Conclusions",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub color: Color,
}

impl ChartConfig {
    fn new(title: &str, x_label: &str, y_label: &str, color: Color) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChartData {
    pub config: ChartConfig,
    pub orientation: Orientation,
    pub bars: Vec<(String, u64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieChartData {
    pub title: String,
    pub slices: Vec<(String, f64)>,
}

impl PieChartData {
    /// Percentage share of every slice. All zero when the total is zero.
    pub fn shares(&self) -> Vec<f64> {
        let total: f64 = self.slices.iter().map(|(_, v)| v).sum();
        self.slices
            .iter()
            .map(|(_, v)| if total > 0.0 { v * 100.0 / total } else { 0.0 })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(String),
    Text(Vec<String>),
    Table(TableData),
    BarChart(BarChartData),
    PieChart(PieChartData),
    Error(String),
}

pub const VERTICAL_CHART_HEIGHT: u16 = 16;

impl Block {
    /// Rows needed to draw the block in a pane `width` columns wide.
    pub fn height(&self, width: u16) -> u16 {
        let rows = match self {
            Block::Heading(_) => 2,
            Block::Text(lines) => wrap_lines(lines, width as usize).len() + 1,
            Block::Table(table) => table.nrows() + 3,
            Block::BarChart(chart) => match chart.orientation {
                Orientation::Horizontal => chart.bars.len() + 3,
                Orientation::Vertical => VERTICAL_CHART_HEIGHT as usize,
            },
            Block::PieChart(pie) => pie.slices.len() + 3,
            Block::Error(_) => 3,
        };
        rows.min(u16::MAX as usize) as u16
    }
}

/// Breaks `lines` at spaces so no line is longer than `width` characters.
/// Words longer than `width` are split.
pub fn wrap_lines(lines: &[String], width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut wrapped = Vec::new();
    for line in lines {
        let mut current = String::new();
        let mut current_len = 0;
        for word in line.split(' ') {
            let mut word: Vec<char> = word.chars().collect();
            if current_len > 0 && current_len + 1 + word.len() > width {
                wrapped.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            while current_len + word.len() > width {
                current.extend(word.drain(..width - current_len));
                wrapped.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current_len += word.len();
            current.extend(word);
        }
        wrapped.push(current);
    }
    wrapped
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionView {
    pub section: Section,
    pub blocks: Vec<Block>,
}

impl SectionView {
    pub fn failed(section: Section, message: String) -> Self {
        Self {
            section,
            blocks: vec![Block::Heading(section.label().to_string()), Block::Error(message)],
        }
    }

    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Heading(title) => {
                    let _ = writeln!(out, "{title}\n{}", "=".repeat(title.chars().count()));
                }
                Block::Text(lines) => {
                    for line in lines {
                        let _ = writeln!(out, "{line}");
                    }
                }
                Block::Table(table) => write_table(&mut out, table),
                Block::BarChart(chart) => write_bar_chart(&mut out, chart),
                Block::PieChart(pie) => write_pie_chart(&mut out, pie),
                Block::Error(message) => {
                    let _ = writeln!(out, "Error: {message}");
                }
            }
            out.push('\n');
        }
        out
    }
}

pub type SectionHandler = fn(&Dataset, &ReportConfig) -> PolarsResult<Vec<Block>>;

pub static HANDLERS: [(Section, SectionHandler); 10] = [
    (Section::DataPreview, data_preview),
    (Section::DataInfo, data_info),
    (Section::NullAnalysis, null_analysis),
    (Section::SalesByYear, sales_by_year),
    (Section::BestOutletByYear, best_outlet_by_year),
    (Section::CategoryBreakdown, category_breakdown),
    (Section::TopCategories, top_categories),
    (Section::RevenueByCategory, revenue_by_category),
    (Section::LocationBreakdown, location_breakdown),
    (Section::Conclusions, conclusions),
];

/// Computes `section` from scratch.
#[instrument(skip(dataset, config))]
pub fn build(
    section: Section,
    dataset: &Dataset,
    config: &ReportConfig,
) -> PolarsResult<SectionView> {
    let Some((_, handler)) = HANDLERS.iter().find(|(s, _)| *s == section) else {
        warn!("No handler registered for {section:?}");
        return Ok(SectionView {
            section,
            blocks: Vec::new(),
        });
    };
    let mut blocks = vec![Block::Heading(section.label().to_string())];
    blocks.extend(handler(dataset, config)?);
    debug!("Built {} blocks", blocks.len());
    Ok(SectionView { section, blocks })
}

// ------------------------------ Handlers ------------------------------- //

fn data_preview(dataset: &Dataset, config: &ReportConfig) -> PolarsResult<Vec<Block>> {
    let head = report::preview(&dataset.frame, config.preview_rows);
    Ok(vec![Block::Table(TableData::from_frame(&head)?)])
}

fn data_info(dataset: &Dataset, _config: &ReportConfig) -> PolarsResult<Vec<Block>> {
    let descriptions = COLUMN_DESCRIPTIONS
        .iter()
        .map(|(name, meaning)| format!("* {name}: {meaning}"))
        .collect();

    let summary = report::frame_summary(&dataset.frame);
    let rows = summary
        .columns
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            vec![
                idx.to_string(),
                c.name.clone(),
                format!("{} non-null", c.non_null),
                c.dtype.clone(),
            ]
        })
        .collect();

    Ok(vec![
        Block::Text(descriptions),
        Block::Text(vec![format!(
            "{} entries, {} columns, ~{} KiB in memory",
            summary.rows,
            summary.columns.len(),
            summary.estimated_size / 1024
        )]),
        Block::Table(TableData::from_rows(
            &["#", "Column", "Non-Null Count", "Dtype"],
            rows,
        )),
    ])
}

fn null_analysis(dataset: &Dataset, config: &ReportConfig) -> PolarsResult<Vec<Block>> {
    let cleaning = &dataset.cleaning;
    let nulls = |counts: &[(String, usize)]| {
        TableData::from_rows(
            &["Column", "Nulls"],
            counts
                .iter()
                .map(|(name, n)| vec![name.clone(), n.to_string()])
                .collect(),
        )
    };
    let head = report::preview(&dataset.frame, config.preview_rows);

    Ok(vec![
        Block::Text(vec!["Null values per column before cleaning:".to_string()]),
        Block::Table(nulls(&cleaning.nulls_before)),
        Block::Text(vec![format!(
            "Missing weights were filled with the mean weight, missing outlet sizes with '{}'.",
            config.size_fill
        )]),
        Block::Table(nulls(&cleaning.nulls_after)),
        Block::Table(TableData::from_frame(&head)?),
        Block::Text(vec![format!(
            "Number of duplicate rows: {}",
            cleaning.duplicates
        )]),
    ])
}

fn sales_by_year(dataset: &Dataset, _config: &ReportConfig) -> PolarsResult<Vec<Block>> {
    let counts = report::year_counts(&dataset.frame)?;
    let sales = report::sales_by_year(&dataset.frame)?;
    Ok(vec![
        Block::Text(vec!["Products per establishment year:".to_string()]),
        Block::Table(TableData::from_grouped(&counts)),
        Block::Text(vec!["Total sales per establishment year:".to_string()]),
        Block::Table(TableData::from_grouped(&sales)),
    ])
}

fn best_outlet_by_year(dataset: &Dataset, config: &ReportConfig) -> PolarsResult<Vec<Block>> {
    let year = config.year;
    let ranked = report::top_category_sales_for_year(&dataset.frame, year, usize::MAX)?;
    if ranked.is_empty() {
        return Ok(vec![Block::Text(vec![format!(
            "No outlets were established in {year}."
        )])]);
    }
    let by_name = report::category_sales_for_year(&dataset.frame, year, config.table_limit)?;
    let top = ranked.head(config.top_n);

    Ok(vec![
        Block::Text(vec![format!("Sales per category for outlets established in {year}:")]),
        Block::Table(TableData::from_grouped(&by_name)),
        Block::BarChart(BarChartData {
            config: ChartConfig::new(
                &format!("Revenue by product category ({year})"),
                "Total sales",
                "Product category",
                Color::Gray,
            ),
            orientation: Orientation::Horizontal,
            bars: rounded(&top.entries),
        }),
        Block::PieChart(PieChartData {
            title: format!("Share of revenue by product category ({year})"),
            slices: top.entries,
        }),
    ])
}

fn category_breakdown(dataset: &Dataset, _config: &ReportConfig) -> PolarsResult<Vec<Block>> {
    let counts = report::category_counts(&dataset.frame)?;
    let by_name = report::category_counts_by_name(&dataset.frame)?;
    Ok(vec![
        Block::Table(TableData::from_grouped(&counts)),
        Block::BarChart(BarChartData {
            config: ChartConfig::new(
                "Products sold per category",
                "Product category",
                "Count",
                Color::Magenta,
            ),
            orientation: Orientation::Vertical,
            bars: by_name.entries,
        }),
    ])
}

fn top_categories(dataset: &Dataset, _config: &ReportConfig) -> PolarsResult<Vec<Block>> {
    let counts = report::category_counts(&dataset.frame)?;
    Ok(vec![Block::BarChart(BarChartData {
        config: ChartConfig::new(
            "Best selling product categories",
            "Number of sales",
            "Product category",
            Color::Red,
        ),
        orientation: Orientation::Horizontal,
        bars: counts.entries,
    })])
}

fn revenue_by_category(dataset: &Dataset, config: &ReportConfig) -> PolarsResult<Vec<Block>> {
    let top = report::top_category_sales(&dataset.frame, config.top_n)?;
    Ok(vec![Block::BarChart(BarChartData {
        config: ChartConfig::new(
            "Revenue by product category",
            "Total sales",
            "Product category",
            Color::Green,
        ),
        orientation: Orientation::Horizontal,
        bars: rounded(&top.entries),
    })])
}

fn location_breakdown(dataset: &Dataset, _config: &ReportConfig) -> PolarsResult<Vec<Block>> {
    let counts = report::location_counts(&dataset.frame)?;
    let sales = report::sales_by_location(&dataset.frame)?;
    Ok(vec![
        Block::Text(vec!["Products per location type:".to_string()]),
        Block::Table(TableData::from_grouped(&counts)),
        Block::PieChart(PieChartData {
            title: "Share of revenue by location type".to_string(),
            slices: sales.entries,
        }),
    ])
}

fn conclusions(dataset: &Dataset, config: &ReportConfig) -> PolarsResult<Vec<Block>> {
    let df = &dataset.frame;
    let best_category = report::category_sales(df)?;
    let best_location = report::sales_by_location(df)?
        .entries
        .into_iter()
        .max_by(|a, b| a.1.total_cmp(&b.1));
    let best_year = report::sales_by_year(df)?
        .entries
        .into_iter()
        .max_by_key(|(_, v)| *v);
    let filled: Vec<&str> = dataset
        .cleaning
        .nulls_before
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(name, _)| name.as_str())
        .collect();

    let mut highlights = vec![format!(
        "* Total sales: {:.0} across {} product categories",
        report::total_sales(df)?,
        best_category.len()
    )];
    if let Some((category, sales)) = best_category.first() {
        highlights.push(format!(
            "* Category with the highest revenue: {category} ({sales:.0})"
        ));
    }
    if let Some((location, sales)) = best_location {
        highlights.push(format!(
            "* Location type with the highest revenue: {location} ({sales:.0})"
        ));
    }
    if let Some((year, sales)) = best_year {
        highlights.push(format!(
            "* Establishment year with the highest sales: {year} ({sales})"
        ));
    }
    highlights.push(format!(
        "* Columns with missing values: {}",
        if filled.is_empty() { "none".to_string() } else { filled.join(", ") }
    ));
    highlights.push(format!("* Duplicate rows: {}", dataset.cleaning.duplicates));

    Ok(vec![
        Block::Text(vec![
            "The retail data was analysed in the following steps.".to_string(),
        ]),
        Block::Heading("Product categories".to_string()),
        Block::Text(vec![
            "Categories were ranked by the number of products sold and by revenue".to_string(),
            "to find the ones that bring in the most money. Bar charts show sales".to_string(),
            "counts and revenue per category.".to_string(),
        ]),
        Block::Heading("Null values".to_string()),
        Block::Text(vec![
            "Missing weights were filled with the mean weight and missing outlet".to_string(),
            format!("sizes with '{}'. The table was checked for duplicate rows.", config.size_fill),
        ]),
        Block::Heading("Establishment years".to_string()),
        Block::Text(vec![
            "Sales were compared across outlet establishment years. For".to_string(),
            format!(
                "{} a bar chart and a pie chart show revenue per product category.",
                config.year
            ),
        ]),
        Block::Heading("Outlet locations".to_string()),
        Block::Text(vec![
            "Location types were compared to find where the outlets with the".to_string(),
            "largest sales are. A pie chart shows revenue per location type.".to_string(),
        ]),
        Block::Heading("Summary".to_string()),
        Block::Text(highlights),
    ])
}

// ----------------------------- Plain text ------------------------------ //

fn rounded(entries: &[(String, f64)]) -> Vec<(String, u64)> {
    entries
        .iter()
        .map(|(k, v)| (k.clone(), v.round().max(0.0) as u64))
        .collect()
}

fn write_table(out: &mut String, table: &TableData) {
    let mut builder = Builder::default();
    builder.push_record(table.headers().into_iter().map(str::to_string));
    for idx in 0..table.nrows() {
        builder.push_record(table.row(idx).into_iter().map(str::to_string));
    }
    let mut text = builder.build();
    text.with(Style::psql());
    let _ = writeln!(out, "{text}");
}

const TEXT_BAR_WIDTH: u64 = 40;

fn write_bar_chart(out: &mut String, chart: &BarChartData) {
    let config = &chart.config;
    let _ = writeln!(out, "{} ({} by {})", config.title, config.x_label, config.y_label);
    let max = chart.bars.iter().map(|(_, v)| *v).max().unwrap_or(0);
    let label_width = chart
        .bars
        .iter()
        .map(|(k, _)| k.chars().count())
        .max()
        .unwrap_or(0);
    for (label, value) in &chart.bars {
        let len = if max > 0 { value * TEXT_BAR_WIDTH / max } else { 0 };
        let _ = writeln!(
            out,
            "{label:<label_width$} | {} {value}",
            "█".repeat(len as usize)
        );
    }
}

fn write_pie_chart(out: &mut String, pie: &PieChartData) {
    let _ = writeln!(out, "{}", pie.title);
    let label_width = pie
        .slices
        .iter()
        .map(|(k, _)| k.chars().count())
        .max()
        .unwrap_or(0);
    for ((label, _), share) in pie.slices.iter().zip(pie.shares()) {
        let _ = writeln!(out, "{label:<label_width$} {share:>3.0}%");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{
        ESTABLISHMENT_YEAR, LOCATION_TYPE, OUTLET_SALES, OUTLET_SIZE, PRODUCT_TYPE, WEIGHT,
    };
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn dataset() -> Dataset {
        let raw = df!(
            WEIGHT => &[Some(9.3), None, Some(17.5), Some(19.2)],
            PRODUCT_TYPE => &["Dairy", "Snack Foods", "Snack Foods", "Meat"],
            ESTABLISHMENT_YEAR => &[1999i64, 1985, 1985, 1998],
            OUTLET_SIZE => &[Some("Medium"), None, Some("Small"), None],
            LOCATION_TYPE => &["Tier 1", "Tier 3", "Tier 3", "Tier 2"],
            OUTLET_SALES => &[300.0, 100.0, 100.0, 500.0]
        )
        .unwrap();
        Dataset::from_frame("test".to_string(), raw, "Medium").unwrap()
    }

    #[test]
    fn test_every_section_has_one_handler() {
        for section in Section::ALL {
            let count = HANDLERS.iter().filter(|(s, _)| *s == section).count();
            assert_eq!(count, 1, "{section:?}");
        }
    }

    #[test]
    fn test_every_section_builds() {
        let dataset = dataset();
        let config = ReportConfig::default();
        for section in Section::ALL {
            let view = build(section, &dataset, &config).unwrap();
            assert_eq!(view.blocks[0], Block::Heading(section.label().to_string()));
            assert!(view.blocks.len() > 1);
            assert!(!view.to_plain_text().is_empty());
        }
    }

    #[test]
    fn test_best_outlet_by_year() {
        let view = build(
            Section::BestOutletByYear,
            &dataset(),
            &ReportConfig::default(),
        )
        .unwrap();
        let chart = view
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::BarChart(c) => Some(c),
                _ => None,
            })
            .unwrap();
        assert_eq!(chart.bars, vec![("Snack Foods".to_string(), 200)]);
        assert_eq!(chart.orientation, Orientation::Horizontal);
    }

    #[test]
    fn test_best_outlet_for_unknown_year() {
        let config = ReportConfig::default().with_year(1970);
        let view = build(Section::BestOutletByYear, &dataset(), &config).unwrap();
        assert_eq!(
            view.blocks[1],
            Block::Text(vec!["No outlets were established in 1970.".to_string()])
        );
    }

    #[test]
    fn test_location_pie_shares() {
        let view = build(
            Section::LocationBreakdown,
            &dataset(),
            &ReportConfig::default(),
        )
        .unwrap();
        let pie = view
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::PieChart(p) => Some(p),
                _ => None,
            })
            .unwrap();
        assert_eq!(pie.shares(), vec![30.0, 50.0, 20.0]);
        assert!(view.to_plain_text().contains("Tier 2  50%"));
    }

    #[test]
    fn test_null_analysis_reports_duplicates() {
        let text = build(Section::NullAnalysis, &dataset(), &ReportConfig::default())
            .unwrap()
            .to_plain_text();
        assert!(text.contains("Number of duplicate rows: 0"));
    }

    #[test]
    fn test_missing_column_fails_section() {
        let raw = df!(WEIGHT => &[1.0], OUTLET_SIZE => &["Small"]).unwrap();
        let dataset = Dataset::from_frame("bare".to_string(), raw, "Medium").unwrap();
        assert!(build(Section::RevenueByCategory, &dataset, &ReportConfig::default()).is_err());
        assert!(build(Section::DataPreview, &dataset, &ReportConfig::default()).is_ok());
    }

    #[test]
    fn test_fixture_sections() {
        let path =
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/products_sample.csv");
        let dataset = Dataset::load(path, "Medium").unwrap();
        let config = ReportConfig::default();

        let text = build(Section::BestOutletByYear, &dataset, &config)
            .unwrap()
            .to_plain_text();
        assert!(text.contains("Snack Foods"));
        assert!(text.contains("Hard Drinks"));

        let text = build(Section::NullAnalysis, &dataset, &config)
            .unwrap()
            .to_plain_text();
        assert!(text.contains("Number of duplicate rows: 1"));
    }

    #[test]
    fn test_best_outlet_without_table_rows() {
        let config = ReportConfig::default().with_table_limit(0usize);
        let view = build(Section::BestOutletByYear, &dataset(), &config).unwrap();
        let text = view.to_plain_text();
        assert!(!text.contains("No outlets were established"));
        assert!(view.blocks.iter().any(|b| matches!(b, Block::PieChart(_))));
    }

    #[test]
    fn test_plain_text_table() {
        let table = TableData::from_rows(
            &["Category", "Sales"],
            vec![
                vec!["Dairy".to_string(), "300".to_string()],
                vec!["Snack Foods".to_string(), "200".to_string()],
            ],
        );
        let mut out = String::new();
        write_table(&mut out, &table);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Category"));
        assert!(lines[1].starts_with('-'));
        assert_eq!(lines[2].find('|'), lines[3].find('|'));
        assert!(lines[3].contains("Snack Foods"));
    }

    #[test]
    fn test_wrapped_text_height() {
        let text = Block::Text(vec![COLUMN_DESCRIPTIONS[3].1.to_string()]);
        assert_eq!(text.height(200), 2);
        let narrow = text.height(20);
        assert!(narrow > 4, "{narrow}");
        let lines = wrap_lines(&[COLUMN_DESCRIPTIONS[3].1.to_string()], 20);
        assert_eq!(narrow as usize, lines.len() + 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap_lines(&["abcdefgh ij".to_string(), String::new()], 3);
        assert_eq!(lines, vec!["abc", "def", "gh", "ij", ""]);
    }

    #[test]
    fn test_pie_shares_of_empty_total() {
        let pie = PieChartData {
            title: String::new(),
            slices: vec![("a".to_string(), 0.0)],
        };
        assert_eq!(pie.shares(), vec![0.0]);
    }
}
