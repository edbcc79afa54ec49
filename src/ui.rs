use std::cmp::min;
use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Style, Stylize},
    symbols,
    text::{Line, Span, Text},
    widgets::{
        Block, Clear, LineGauge, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState,
    },
};

use crate::domain::CtvConfig;
use crate::model::UIData;

pub const CMDLINE_HEIGH: usize = 1;
pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const TIMELINE_HEIGHT: usize = 2;
pub const SCROLLBAR_WIDTH: usize = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 2;

pub struct TableUI {
    status_message_timeout: Duration,
}

impl TableUI {
    pub fn new(cfg: &CtvConfig) -> Self {
        Self {
            status_message_timeout: Duration::from_secs(
                cfg.status_message_timeout,
            ),
        }
    }

    pub fn draw(&self, uidata: &UIData, frame: &mut Frame) {
        let [timeline, table, cmdline] = Layout::vertical([
            Constraint::Length(TIMELINE_HEIGHT as u16),
            Constraint::Min(0),
            Constraint::Length(CMDLINE_HEIGH as u16),
        ])
        .areas(frame.area());

        self.draw_timeline(uidata, frame, timeline);
        self.draw_table(uidata, frame, table);
        self.draw_cmdline(uidata, frame, cmdline);

        if uidata.show_popup {
            self.draw_popup(uidata, frame);
        }
    }

    fn draw_timeline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let [label_area, gauge_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)])
                .areas(area);

        let title = Line::from(vec![
            Span::from(format!(" {} ", uidata.name)).bold(),
            Span::from(format!(" Day {}/{}  ", uidata.day + 1, uidata.days)),
            Span::from(uidata.time_label.clone()).yellow(),
        ]);
        frame.render_widget(Paragraph::new(title), label_area);

        let ratio = if uidata.days > 1 {
            uidata.day as f64 / (uidata.days - 1) as f64
        } else {
            1.0
        };
        let gauge = LineGauge::default()
            .ratio(ratio)
            .label("")
            .line_set(symbols::line::THICK)
            .filled_style(Style::new().blue());
        frame.render_widget(gauge, gauge_area);
    }

    fn draw_table(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.nrows == 0 {
            let placeholder = Paragraph::new("No rows to display")
                .centered()
                .style(Style::new().dim().italic());
            frame.render_widget(placeholder, area);
            return;
        }

        let [header_area, body_area] = Layout::vertical([
            Constraint::Length(TABLE_HEADER_HEIGHT as u16),
            Constraint::Min(0),
        ])
        .areas(area);

        // One fixed-width slot per visible column; the trailing Min slot
        // absorbs leftover width up to the scrollbar.
        let mut constraints = Vec::new();
        if uidata.layout.index_width > 0 {
            constraints.push(Constraint::Length(uidata.index.width as u16));
        }
        for cv in &uidata.table {
            constraints.push(Constraint::Length(cv.width as u16));
        }
        constraints.push(Constraint::Min(0));
        let header_columns =
            Layout::horizontal(constraints.clone()).spacing(1).split(header_area);
        let body_columns =
            Layout::horizontal(constraints).spacing(1).split(body_area);

        let mut headers = header_columns.iter();
        let mut bodies = body_columns.iter();

        if uidata.layout.index_width > 0 {
            let (Some(_), Some(body)) = (headers.next(), bodies.next()) else {
                return;
            };
            let lines: Vec<Line> = uidata
                .index
                .data
                .iter()
                .map(|number| Line::from(number.clone()).dim())
                .collect();
            frame.render_widget(
                Paragraph::new(Text::from(lines)).right_aligned(),
                *body,
            );
        }

        for (cidx, cv) in uidata.table.iter().enumerate() {
            let (Some(header), Some(body)) = (headers.next(), bodies.next())
            else {
                break;
            };

            let mut name = Line::from(cv.name.clone()).bold();
            if cidx == uidata.selected_column {
                name = name.cyan();
            }
            frame.render_widget(Paragraph::new(name), *header);

            let lines: Vec<Line> = cv
                .data
                .iter()
                .enumerate()
                .map(|(ridx, cell)| {
                    let mut line = Line::from(cell.clone());
                    if ridx == uidata.selected_row {
                        line = line.reversed();
                        if cidx == uidata.selected_column {
                            line = line.bold();
                        }
                    }
                    line
                })
                .collect();
            frame.render_widget(Paragraph::new(Text::from(lines)), *body);
        }

        let mut scrollbar_state =
            ScrollbarState::new(uidata.nrows).position(uidata.abs_selected_row);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }

    fn draw_cmdline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.active_cmdinput {
            let prompt = match uidata.filter_target {
                Some(field) => format!("{}> ", field.name()),
                None => "> ".to_string(),
            };
            let curser_x = area.x
                + (prompt.chars().count() + uidata.cmdinput.curser_pos) as u16;
            frame.render_widget(
                Paragraph::new(format!("{}{}", prompt, uidata.cmdinput.input)),
                area,
            );
            frame.set_cursor_position((
                min(curser_x, area.right().saturating_sub(1)),
                area.y,
            ));
            return;
        }

        let fresh = uidata.last_status_message_update.elapsed()
            < self.status_message_timeout;
        let left = if fresh && !uidata.status_message.is_empty() {
            uidata.status_message.clone()
        } else if !uidata.filter_summary.is_empty() {
            format!("filter: {}", uidata.filter_summary)
        } else {
            String::new()
        };
        frame.render_widget(Paragraph::new(Line::from(left).dim()), area);
        frame.render_widget(
            Paragraph::new(Line::from(format!("{} rows", uidata.nrows)).dim())
                .right_aligned(),
            area,
        );
    }

    fn draw_popup(&self, uidata: &UIData, frame: &mut Frame) {
        let area = Self::popup_area(frame.area(), 60, 80);
        frame.render_widget(Clear, area);
        let block =
            Block::bordered().title(Line::from(" help ").bold().centered());
        frame.render_widget(
            Paragraph::new(uidata.popup_message.clone()).block(block),
            area,
        );
    }

    fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
        let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
            .flex(Flex::Center)
            .areas(area);
        let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
            .flex(Flex::Center)
            .areas(area);
        area
    }
}
