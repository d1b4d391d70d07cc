use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::time::Instant;
use tracing::{error, info, trace, warn};

use crate::dataset::Dataset;
use crate::domain::{CMDMode, DashboardConfig, DashboardError, HELP_TEXT, Message};
use crate::inputter::{InputResult, Inputter};
use crate::report::ReportConfig;
use crate::sections::{self, Section, SectionView};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    MENU,
    POPUP,
    CMDINPUT,
}

/// Everything the UI needs to draw one frame.
pub struct UIData {
    pub name: String,
    pub selected_section: usize,
    pub view: SectionView,
    pub scroll: usize,
    pub year: i64,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CMDMode>,
    pub active_cmdinput: bool,
    pub status_message: String,
}

pub struct Model {
    dataset: Dataset,
    config: ReportConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    uidata: UIData,
    clipboard: Option<Clipboard>,
}

impl Model {
    pub fn init(config: &DashboardConfig, dataset: Dataset) -> Self {
        let first = Section::ALL[0];
        let mut model = Self {
            uidata: UIData {
                name: dataset.name.clone(),
                selected_section: 0,
                view: SectionView {
                    section: first,
                    blocks: Vec::new(),
                },
                scroll: 0,
                year: config.report.year,
                show_popup: false,
                popup_message: String::new(),
                cmdinput: InputResult::default(),
                cmd_mode: None,
                active_cmdinput: false,
                status_message: String::new(),
            },
            dataset,
            config: config.report.clone(),
            status: Status::READY,
            modus: Modus::MENU,
            previous_modus: Modus::MENU,
            input: Inputter::default(),
            cmd_mode: None,
            clipboard: None,
        };
        model.show_section(first);
        model.set_status_message(format!(
            "Loaded {} rows from {}. Press ? for help.",
            model.dataset.frame.height(),
            model.dataset.name
        ));
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn raw_keyevents(&self) -> bool {
        self.uidata.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), DashboardError> {
        let Some(msg) = message else {
            return Ok(());
        };
        trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);
        match self.modus {
            Modus::MENU => match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.move_selection_up(),
                Message::MoveDown => self.move_selection_down(),
                Message::ScrollUp => self.scroll_to(self.uidata.scroll.saturating_sub(1)),
                Message::ScrollDown => self.scroll_to(self.uidata.scroll + 1),
                Message::ScrollTop => self.scroll_to(0),
                Message::ScrollBottom => self.scroll_to(usize::MAX),
                Message::Enter => self.show_section(Section::ALL[self.uidata.selected_section]),
                Message::Help => self.show_help(),
                Message::EditYear => self.enter_cmd_mode(CMDMode::Year),
                Message::CopySection => {
                    if let Err(e) = self.copy_section() {
                        warn!("Copy to clipboard failed: {e}");
                        self.set_status_message(format!("Copy failed: {e}"));
                    }
                }
                _ => (),
            },
            Modus::POPUP => match msg {
                Message::Quit => self.quit(),
                Message::Exit | Message::Enter | Message::Help => self.exit(),
                _ => (),
            },
            Modus::CMDINPUT => {
                if let Message::RawKey(key) = msg {
                    self.raw_input(key)
                }
            }
        }
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn show_section(&mut self, section: Section) {
        let start_time = Instant::now();
        let view = match sections::build(section, &self.dataset, &self.config) {
            Ok(view) => {
                info!(
                    "Built section {:?} in {}ms",
                    section,
                    start_time.elapsed().as_millis()
                );
                self.set_status_message(section.label());
                view
            }
            Err(e) => {
                error!("Building section {section:?} failed: {e}");
                self.set_status_message(format!("{} failed", section.label()));
                SectionView::failed(section, e.to_string())
            }
        };
        self.uidata.view = view;
        self.uidata.scroll = 0;
    }

    fn scroll_to(&mut self, block: usize) {
        let last = self.uidata.view.blocks.len().saturating_sub(1);
        self.uidata.scroll = block.min(last);
    }

    fn move_selection_up(&mut self) {
        self.uidata.selected_section = self.uidata.selected_section.saturating_sub(1);
    }

    fn move_selection_down(&mut self) {
        let last = Section::ALL.len() - 1;
        self.uidata.selected_section = (self.uidata.selected_section + 1).min(last);
    }

    fn exit(&mut self) {
        if self.modus == Modus::POPUP {
            self.uidata.show_popup = false;
            self.modus = self.previous_modus;
            self.previous_modus = Modus::POPUP;
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.uidata.show_popup = true;
        self.uidata.popup_message = HELP_TEXT.to_string();
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        match mode {
            CMDMode::Year => {
                self.input = Inputter::numeric(4);
                self.input.set(&self.config.year.to_string());
            }
        }
        self.uidata.cmd_mode = self.cmd_mode;
        self.uidata.cmdinput = self.input.get();
        self.uidata.active_cmdinput = true;
    }

    fn raw_input(&mut self, key: KeyEvent) {
        let result = self.input.read(key);
        self.uidata.cmdinput = result.clone();
        if result.finished {
            self.handle_cmd_input(result);
        }
    }

    fn handle_cmd_input(&mut self, result: InputResult) {
        trace!("Handle cmd input {}", result.input);
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;
        self.uidata.active_cmdinput = false;
        self.uidata.cmd_mode = None;

        let mode = self.cmd_mode.take();
        if result.canceled {
            self.set_status_message("Canceled");
            return;
        }
        match mode {
            Some(CMDMode::Year) => match result.input.parse::<i64>() {
                Ok(year) => {
                    info!("Establishment year changed to {year}");
                    self.config.year = year;
                    self.uidata.year = year;
                    let section = Section::BestOutletByYear;
                    self.uidata.selected_section = Section::ALL
                        .iter()
                        .position(|s| *s == section)
                        .unwrap_or(self.uidata.selected_section);
                    self.show_section(section);
                }
                Err(_) => {
                    self.set_status_message(format!("'{}' is not a valid year", result.input))
                }
            },
            None => info!("Cmd mode is none!"),
        }
    }

    fn copy_section(&mut self) -> Result<(), DashboardError> {
        let text = self.uidata.view.to_plain_text();
        let clipboard = match self.clipboard.take() {
            Some(clipboard) => clipboard,
            None => Clipboard::new()?,
        };
        let clipboard = self.clipboard.insert(clipboard);
        clipboard.set_text(text)?;
        self.set_status_message(format!(
            "Copied '{}' to clipboard",
            self.uidata.view.section.label()
        ));
        Ok(())
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.uidata.status_message = message.into();
    }
}
