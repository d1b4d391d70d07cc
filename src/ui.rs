use ratatui::{
    Frame,
    layout::{Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{
        Bar, BarChart, BarGroup, Block, Clear, List, ListItem, ListState, Paragraph, Row, Table,
    },
};

use crate::domain::{CMDMode, DashboardConfig};
use crate::model::{Model, UIData};
use crate::sections::{
    BarChartData, Block as SectionBlock, Orientation, PieChartData, Section, wrap_lines,
};
use crate::table::TableData;

pub const MENU_WIDTH: u16 = 38;
pub const CMDLINE_HEIGH: u16 = 1;
pub const COLUMN_WIDTH_MARGIN: u16 = 2;

const PIE_COLORS: [Color; 6] = [
    Color::Blue,
    Color::Yellow,
    Color::Green,
    Color::Red,
    Color::Cyan,
    Color::Magenta,
];

pub struct DashboardUI {
    menu_state: ListState,
}

impl DashboardUI {
    pub fn new(_cfg: &DashboardConfig) -> Self {
        Self {
            menu_state: ListState::default(),
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [main, cmdline] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(CMDLINE_HEIGH)])
                .areas(frame.area());
        let [menu, content] =
            Layout::horizontal([Constraint::Length(MENU_WIDTH), Constraint::Min(0)]).areas(main);

        self.draw_menu(uidata, frame, menu);
        Self::draw_content(uidata, frame, content);
        Self::draw_cmdline(uidata, frame, cmdline);

        if uidata.show_popup {
            Self::draw_popup(&uidata.popup_message, frame);
        }
    }

    fn draw_menu(&mut self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = Section::ALL
            .iter()
            .map(|s| {
                let item = ListItem::new(s.label());
                if *s == uidata.view.section {
                    item.bold()
                } else {
                    item
                }
            })
            .collect();
        let list = List::new(items)
            .block(
                Block::bordered()
                    .title(Line::from(format!(" {} ", uidata.name).bold()))
                    .title_bottom(Line::from(format!(" year: {} ", uidata.year)).centered()),
            )
            .highlight_style(Style::new().reversed())
            .highlight_symbol("> ");
        self.menu_state.select(Some(uidata.selected_section));
        frame.render_stateful_widget(list, area, &mut self.menu_state);
    }

    fn draw_content(uidata: &UIData, frame: &mut Frame, area: Rect) {
        let view = &uidata.view;
        let outer = Block::bordered()
            .title(Line::from(format!(" {} ", view.section.label()).bold()).centered())
            .title_bottom(
                Line::from(format!(
                    " {}/{} ",
                    (uidata.scroll + 1).min(view.blocks.len()),
                    view.blocks.len()
                ))
                .right_aligned(),
            );
        let inner = outer.inner(area);
        frame.render_widget(outer, area);

        let mut y = inner.y;
        for block in view.blocks.iter().skip(uidata.scroll) {
            let remaining = inner.bottom().saturating_sub(y);
            if remaining == 0 {
                break;
            }
            let height = block.height(inner.width).min(remaining);
            let area = Rect::new(inner.x, y, inner.width, height);
            Self::draw_block(block, frame, area);
            y += height;
        }
    }

    fn draw_block(block: &SectionBlock, frame: &mut Frame, area: Rect) {
        match block {
            SectionBlock::Heading(title) => {
                frame.render_widget(Paragraph::new(title.as_str().bold().underlined()), area)
            }
            SectionBlock::Text(lines) => {
                let text: Vec<Line> = wrap_lines(lines, area.width as usize)
                    .into_iter()
                    .map(Line::from)
                    .collect();
                frame.render_widget(Paragraph::new(text), area)
            }
            SectionBlock::Table(table) => Self::draw_table(table, frame, area),
            SectionBlock::BarChart(chart) => Self::draw_bar_chart(chart, frame, area),
            SectionBlock::PieChart(pie) => Self::draw_pie_chart(pie, frame, area),
            SectionBlock::Error(message) => frame.render_widget(
                Paragraph::new(message.as_str().red())
                    .block(Block::bordered().title(" Error ").red()),
                area,
            ),
        }
    }

    fn draw_table(table: &TableData, frame: &mut Frame, area: Rect) {
        let widths: Vec<Constraint> = table
            .columns
            .iter()
            .map(|c| Constraint::Length(c.width as u16 + COLUMN_WIDTH_MARGIN))
            .collect();
        let rows: Vec<Row> = (0..table.nrows())
            .map(|idx| Row::new(table.row(idx)))
            .collect();
        let widget = Table::new(rows, widths)
            .header(Row::new(table.headers()).bold().underlined())
            .column_spacing(1)
            .block(Block::bordered());
        frame.render_widget(widget, area);
    }

    fn draw_bar_chart(chart: &BarChartData, frame: &mut Frame, area: Rect) {
        let config = &chart.config;
        let bars: Vec<Bar> = chart
            .bars
            .iter()
            .map(|(label, value)| {
                Bar::default()
                    .value(*value)
                    .label(Line::from(label.as_str()))
                    .text_value(value.to_string())
            })
            .collect();
        let block = Block::bordered()
            .title(Line::from(config.title.as_str().bold()).centered())
            .title_bottom(
                Line::from(format!(" x: {} | y: {} ", config.x_label, config.y_label))
                    .right_aligned(),
            );

        let widget = match chart.orientation {
            Orientation::Horizontal => BarChart::default()
                .direction(Direction::Horizontal)
                .bar_width(1)
                .bar_gap(0),
            Orientation::Vertical => {
                let n = chart.bars.len().max(1) as u16;
                let width = (area.width.saturating_sub(2) / n).saturating_sub(1).max(1);
                BarChart::default()
                    .direction(Direction::Vertical)
                    .bar_width(width)
                    .bar_gap(1)
            }
        };
        let widget = widget
            .block(block)
            .bar_style(Style::new().fg(config.color))
            .value_style(Style::new().fg(Color::Black).bg(config.color))
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(widget, area);
    }

    fn draw_pie_chart(pie: &PieChartData, frame: &mut Frame, area: Rect) {
        let label_width = pie
            .slices
            .iter()
            .map(|(k, _)| k.chars().count())
            .max()
            .unwrap_or(0);
        let bar_space = (area.width as usize).saturating_sub(label_width + 10);

        let lines: Vec<Line> = pie
            .slices
            .iter()
            .zip(pie.shares())
            .enumerate()
            .map(|(idx, ((label, _), share))| {
                let color = PIE_COLORS[idx % PIE_COLORS.len()];
                let len = (share / 100.0 * bar_space as f64).round() as usize;
                Line::from(vec![
                    Span::raw(format!("{label:<label_width$} ")),
                    Span::styled("█".repeat(len), Style::new().fg(color)),
                    Span::raw(format!(" {share:.0}%")),
                ])
            })
            .collect();
        let block = Block::bordered().title(Line::from(pie.title.as_str().bold()).centered());
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_cmdline(uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.active_cmdinput {
            let prompt = match uidata.cmd_mode {
                Some(CMDMode::Year) => "Establishment year: ",
                None => ": ",
            };
            let line = Line::from(vec![
                prompt.bold(),
                Span::raw(uidata.cmdinput.input.as_str()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            let x = area.x + prompt.len() as u16 + uidata.cmdinput.cursor_pos as u16;
            frame.set_cursor_position((x, area.y));
        } else {
            frame.render_widget(
                Paragraph::new(uidata.status_message.as_str().yellow()),
                area,
            );
        }
    }

    fn draw_popup(message: &str, frame: &mut Frame) {
        let height = message.lines().count() as u16 + 2;
        let width = message.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4;
        let area = Self::centered(frame.area(), width, height);
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(message).block(Block::bordered().title(" Help ")),
            area,
        );
    }

    fn centered(area: Rect, width: u16, height: u16) -> Rect {
        let [area] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(area);
        let [area] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);
        area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::domain::Message;
    use ratatui::{Terminal, backend::TestBackend};

    fn model() -> Model {
        let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/products_sample.csv");
        let dataset = Dataset::load(path, "Medium").unwrap();
        Model::init(&DashboardConfig::default(), dataset)
    }

    fn render(model: &Model) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 50)).unwrap();
        let mut ui = DashboardUI::new(&DashboardConfig::default());
        terminal.draw(|f| ui.draw(model, f)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_draw_every_section() {
        let mut model = model();
        for section in Section::ALL {
            model.update(Some(Message::Enter)).unwrap();
            let screen = render(&model);
            // Once in the menu, once more as the content title
            assert!(screen.matches(section.label()).count() >= 2, "{section:?}");
            model.update(Some(Message::MoveDown)).unwrap();
        }
    }

    #[test]
    fn test_draw_help_popup() {
        let mut model = model();
        model.update(Some(Message::Help)).unwrap();
        assert!(render(&model).contains("Help"));
    }

    #[test]
    fn test_draw_pie_chart() {
        let pie = PieChartData {
            title: "t".to_string(),
            slices: vec![("a".to_string(), 1.0), ("b".to_string(), 3.0)],
        };
        let mut terminal = Terminal::new(TestBackend::new(40, 6)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                DashboardUI::draw_pie_chart(&pie, f, area)
            })
            .unwrap();
        assert!(terminal.backend().buffer().content().iter().any(|c| c.symbol() == "█"));
    }
}
