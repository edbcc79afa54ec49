use std::cmp::{max, min};
use std::time::Instant;

use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, trace};

use crate::data::Dataset;
use crate::domain::{
    COLUMNS, CtvConfig, CtvError, FilterField, HELP_TEXT, Message, SortColumn,
    SortDirection,
};
use crate::filter::FilterState;
use crate::inputter::{InputResult, Inputter};
use crate::sort::sort_rows;
use crate::ui::{
    CMDLINE_HEIGH, COLUMN_WIDTH_MARGIN, SCROLLBAR_WIDTH, TABLE_HEADER_HEIGHT,
    TIMELINE_HEIGHT,
};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy)]
enum Modus {
    TABLE,
    POPUP,
    CMDINPUT,
}

/// The dependency list of the view pipeline. Every mutation of filter, sort
/// or time state funnels through `Model::react` with one of these, which
/// recomputes exactly the stages that depend on it:
/// filter -> both stages, sort -> sort stage only, time -> cell rendering
/// only, unless the active sort column is itself time dependent.
#[derive(Debug, Clone, Copy)]
enum StateChange {
    FilterChanged,
    SortChanged,
    TimeChanged,
}

#[derive(Clone)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub data: Vec<String>,
}

impl ColumnView {
    fn empty() -> Self {
        ColumnView {
            name: "".to_string(),
            width: 0,
            data: Vec::new(),
        }
    }
}

pub struct TableView {
    filtered: Vec<usize>, // Filter stage output, in load order
    rows: Vec<usize>,     // Sort stage output; the UI windows over this
    visible_columns: Vec<usize>,
    curser_row: usize,
    curser_column: usize,
    offset_row: usize,
    offset_column: usize,
    data: Vec<ColumnView>,
    show_index: bool,
    index: ColumnView,
    heigh: usize,
    width: usize,
}

impl TableView {
    fn empty() -> Self {
        TableView {
            filtered: Vec::new(),
            rows: Vec::new(),
            visible_columns: Vec::new(),
            curser_row: 0,
            curser_column: 0,
            offset_row: 0,
            offset_column: 0,
            data: Vec::new(),
            show_index: false,
            index: ColumnView::empty(),
            heigh: 0,
            width: 0,
        }
    }

    fn build_index(&mut self) {
        let rbegin = self.offset_row;
        let rend = min(rbegin + self.heigh.max(1), self.rows.len());

        let data = self.rows[rbegin..rend]
            .iter()
            .map(|idx| (idx + 1).to_string())
            .collect::<Vec<String>>();
        let width = data.iter().map(|s| s.len()).max().unwrap_or(3);
        self.index = ColumnView {
            name: "".to_string(),
            width,
            data,
        }
    }
}

pub struct UIData {
    pub name: String,
    pub table: Vec<ColumnView>,
    pub index: ColumnView,
    pub nrows: usize, // Total number of rows in this view
    pub selected_row: usize,
    pub selected_column: usize,
    pub abs_selected_row: usize,
    pub show_popup: bool,
    pub popup_message: String,
    pub layout: UILayout,
    pub last_update: Instant,
    pub cmdinput: InputResult,
    pub filter_target: Option<FilterField>,
    pub active_cmdinput: bool,
    pub status_message: String,
    pub last_status_message_update: Instant,
    pub day: usize,
    pub days: usize,
    pub time_label: String,
    pub filter_summary: String,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            table: Vec::new(),
            index: ColumnView::empty(),
            nrows: 0,
            selected_row: 0,
            selected_column: 0,
            abs_selected_row: 0,
            show_popup: false,
            popup_message: String::new(),
            layout: UILayout::default(),
            last_update: Instant::now(),
            cmdinput: InputResult::default(),
            filter_target: None,
            active_cmdinput: false,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
            day: 0,
            days: 0,
            time_label: String::new(),
            filter_summary: String::new(),
        }
    }
}

#[derive(Default, Clone, Debug)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub table_width: usize,
    pub table_height: usize,
    pub index_width: usize,
    pub index_height: usize,
    pub timeline_width: usize,
    pub timeline_height: usize,
    pub statusline_width: usize,
    pub statusline_height: usize,
}

impl UILayout {
    pub fn from_model(model: &Model, ui_width: usize, ui_height: usize) -> Self {
        let mut index_width = 0;
        if model.table.show_index {
            index_width = model.table.index.width + 1;
        }
        UILayout::from_values(index_width, ui_width, ui_height)
    }

    pub fn from_values(
        index_width: usize,
        ui_width: usize,
        ui_height: usize,
    ) -> Self {
        let table_width = ui_width.saturating_sub(SCROLLBAR_WIDTH + index_width);
        let table_height = ui_height
            .saturating_sub(TIMELINE_HEIGHT + TABLE_HEADER_HEIGHT + CMDLINE_HEIGH);

        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            table_width,
            table_height,
            index_width,
            index_height: table_height,
            timeline_width: ui_width,
            timeline_height: TIMELINE_HEIGHT,
            statusline_width: ui_width,
            statusline_height: CMDLINE_HEIGH,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

/// The single state container of the application. Owns the dataset, the
/// shared time curser, filter and sort state, and the derived table view;
/// every open view reads the same curser.
pub struct Model {
    config: CtvConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    dataset: Dataset,
    time_curser: usize,
    filters: FilterState,
    sort: Option<(SortColumn, SortDirection)>,
    table: TableView,
    location_widths: [usize; 5],
    uilayout: UILayout,
    uidata: UIData,
    clipboard: Option<Clipboard>,
    input: Inputter,
    filter_target: Option<FilterField>,
    last_input: InputResult,
    active_cmdinput: bool,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(
        config: &CtvConfig,
        dataset: Dataset,
        ui_width: usize,
        ui_height: usize,
    ) -> Result<Self, CtvError> {
        let location_widths = Self::location_widths(&dataset);
        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            time_curser: dataset.days() - 1,
            filters: FilterState::default(),
            sort: None,
            table: TableView::empty(),
            location_widths,
            dataset,
            uilayout: UILayout::from_values(0, ui_width, ui_height),
            uidata: UIData::empty(),
            clipboard: None,
            input: Inputter::default(),
            filter_target: None,
            last_input: InputResult::default(),
            active_cmdinput: false,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };
        model.apply_filter();
        model.apply_sort();
        model.update_table_data();
        model.set_status_message(format!(
            "Loaded {} locations over {} days",
            model.dataset.points().len(),
            model.dataset.days()
        ));
        Ok(model)
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Message) -> Result<(), CtvError> {
        match self.modus {
            Modus::TABLE => match message {
                Message::Quit => self.quit(),
                Message::MoveDown => self.move_table_selection_down(1),
                Message::MoveUp => self.move_table_selection_up(1),
                Message::MoveLeft => self.move_table_selection_left(),
                Message::MoveRight => self.move_table_selection_right(),
                Message::MovePageUp => {
                    self.move_table_selection_up(self.uilayout.table_height + 1)
                }
                Message::MovePageDown => {
                    self.move_table_selection_down(self.uilayout.table_height + 1)
                }
                Message::MoveBeginning => self.move_table_selection_beginning(),
                Message::MoveEnd => self.move_table_selection_end(),
                Message::MoveToFirstColumn => self.select_column(0),
                Message::MoveToLastColumn => {
                    self.select_column(COLUMNS.len() - 1)
                }
                Message::SortAscending => {
                    self.sort_current_column(SortDirection::Ascending)
                }
                Message::SortDescending => {
                    self.sort_current_column(SortDirection::Descending)
                }
                Message::Filter => self.enter_filter_input(),
                Message::ResetFilters => self.reset_filters(),
                Message::TimeBack(step) => self.shift_time(-(step as i64)),
                Message::TimeForward(step) => self.shift_time(step as i64),
                Message::ToggleIndex => self.toggle_table_index(),
                Message::CopyCell => self.copy_table_cell(),
                Message::CopyRow => self.copy_table_row(),
                Message::Help => self.show_help(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::Exit | Message::RawKey(_) => (),
            },
            Modus::POPUP => match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.close_popup(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::CMDINPUT => match message {
                Message::RawKey(key) => self.raw_input(key),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
        }
        Ok(())
    }

    // ------------------- View pipeline -------------------- //

    fn react(&mut self, change: StateChange) {
        trace!("State change: {:?}", change);
        match change {
            StateChange::FilterChanged => {
                self.apply_filter();
                self.apply_sort();
            }
            StateChange::SortChanged => self.apply_sort(),
            StateChange::TimeChanged => {
                // Row order only depends on the time curser while sorted by
                // a count column.
                if let Some((column, _)) = self.sort
                    && column.is_time_dependent()
                {
                    self.apply_sort();
                }
            }
        }
        self.update_table_data();
    }

    fn apply_filter(&mut self) {
        let filters = &self.filters;
        let points = self.dataset.points();
        let filtered: Vec<usize> = (0..points.len())
            .filter(|&ridx| filters.matches(&points[ridx]))
            .collect();
        trace!("Filter keeps {}/{} rows", filtered.len(), points.len());
        self.table.filtered = filtered;
    }

    fn apply_sort(&mut self) {
        let mut rows = self.table.filtered.clone();
        if let Some((column, direction)) = self.sort {
            sort_rows(&mut rows, &self.dataset, column, direction, self.time_curser);
        }
        self.table.rows = rows;
    }

    fn update_table_data(&mut self) {
        self.table.width = self.uilayout.table_width;
        self.table.heigh = self.uilayout.table_height;

        let nrows = self.table.rows.len();
        if nrows == 0 {
            self.table.curser_row = 0;
            self.table.offset_row = 0;
            self.table.data.clear();
            self.table.index = ColumnView::empty();
            self.update_uidata_for_table();
            return;
        }

        // Clamp the selection into the possibly shrunken row set and window.
        let height = self.table.heigh.max(1);
        let abs = min(self.table.offset_row + self.table.curser_row, nrows - 1);
        if self.table.offset_row > abs {
            self.table.offset_row = abs;
        }
        if abs - self.table.offset_row >= height {
            self.table.offset_row = abs + 1 - height;
        }
        self.table.curser_row = abs - self.table.offset_row;

        let rbegin = self.table.offset_row;
        let rend = min(rbegin + height, nrows);

        let widths = self.column_widths();

        // Columns that fit the table width, starting at the column offset.
        // The first column is always kept, even if it renders clipped.
        self.table.offset_column = min(self.table.offset_column, COLUMNS.len() - 1);
        let mut visible_columns = Vec::new();
        let mut visible_width = 0;
        for (cidx, width) in widths.iter().enumerate().skip(self.table.offset_column)
        {
            if visible_width + width + 1 > self.table.width
                && !visible_columns.is_empty()
            {
                break;
            }
            visible_columns.push(cidx);
            visible_width += width + 1;
        }
        self.table.visible_columns = visible_columns;
        self.table.curser_column = min(
            self.table.curser_column,
            self.table.visible_columns.len().saturating_sub(1),
        );

        let points = self.dataset.points();
        let mut data = Vec::with_capacity(self.table.visible_columns.len());
        for &cidx in &self.table.visible_columns {
            let column = COLUMNS[cidx];
            let mut name = column.header().to_string();
            if let Some((sorted, direction)) = self.sort
                && sorted == column
            {
                name = format!("{} {}", name, direction.arrow());
            }
            let cells = self.table.rows[rbegin..rend]
                .iter()
                .map(|&ridx| points[ridx].cell_text(column, self.time_curser))
                .collect();
            data.push(ColumnView {
                name,
                width: widths[cidx],
                data: cells,
            });
        }
        self.table.data = data;

        self.table.build_index();
        self.update_uidata_for_table();
    }

    fn column_widths(&self) -> [usize; 8] {
        let mut widths = [0usize; 8];
        for (cidx, column) in COLUMNS.iter().enumerate() {
            // Room for the sort arrow behind the header name.
            let header = column.header().chars().count() + 2;
            let content = if cidx < self.location_widths.len() {
                self.location_widths[cidx]
            } else {
                self.dataset
                    .points()
                    .iter()
                    .map(|p| p.cell_text(*column, self.time_curser).len())
                    .max()
                    .unwrap_or(0)
            };
            widths[cidx] = min(
                max(header, content) + COLUMN_WIDTH_MARGIN,
                self.config.max_column_width,
            );
        }
        widths
    }

    fn location_widths(dataset: &Dataset) -> [usize; 5] {
        let mut widths = [0usize; 5];
        for point in dataset.points() {
            for (cidx, column) in COLUMNS[..5].iter().enumerate() {
                widths[cidx] =
                    max(widths[cidx], point.cell_text(*column, 0).chars().count());
            }
        }
        widths
    }

    fn update_uidata_for_table(&mut self) {
        let table = &self.table;
        self.uidata = UIData {
            name: if self.filters.is_active() {
                format!("F[{}]", self.dataset.name())
            } else {
                self.dataset.name().to_string()
            },
            table: table.data.clone(),
            index: table.index.clone(),
            nrows: table.rows.len(),
            selected_row: table.curser_row,
            selected_column: table.curser_column,
            abs_selected_row: table.offset_row + table.curser_row,
            show_popup: false,
            popup_message: String::new(),
            layout: self.uilayout.clone(),
            cmdinput: self.last_input.clone(),
            filter_target: self.filter_target,
            active_cmdinput: self.active_cmdinput,
            last_update: Instant::now(),
            status_message: self.status_message.clone(),
            last_status_message_update: self.last_status_message_update,
            day: self.time_curser,
            days: self.dataset.days(),
            time_label: self.dataset.time_labels()[self.time_curser].clone(),
            filter_summary: self.filters.summary(),
        };
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_status_message_update = self.last_status_message_update;
        self.uidata.last_update = Instant::now();
    }

    // ------------------- Control handling ------------------- //

    fn shift_time(&mut self, step: i64) {
        let last = self.dataset.days() as i64 - 1;
        let target = (self.time_curser as i64 + step).clamp(0, last) as usize;
        if target != self.time_curser {
            self.time_curser = target;
            self.react(StateChange::TimeChanged);
        }
    }

    fn current_column(&self) -> Option<SortColumn> {
        self.table
            .visible_columns
            .get(self.table.curser_column)
            .map(|&cidx| COLUMNS[cidx])
    }

    fn sort_current_column(&mut self, direction: SortDirection) {
        if let Some(column) = self.current_column() {
            self.sort = Some((column, direction));
            self.react(StateChange::SortChanged);
            self.set_status_message(format!(
                "Sorted by {} {}",
                column.header(),
                direction.arrow()
            ));
        }
    }

    fn enter_filter_input(&mut self) {
        let Some(column) = self.current_column() else {
            return;
        };
        match column.filter_field() {
            Some(field) => {
                trace!("Entering filter input for {}", field.name());
                self.previous_modus = self.modus;
                self.modus = Modus::CMDINPUT;
                self.filter_target = Some(field);
                self.active_cmdinput = true;
                self.input.clear();
                self.last_input = self.input.get();
                self.uidata.cmdinput = self.last_input.clone();
                self.uidata.filter_target = self.filter_target;
                self.uidata.active_cmdinput = self.active_cmdinput;
                self.uidata.last_update = Instant::now();
            }
            None => self.set_status_message(format!(
                "Column \"{}\" is not filterable",
                column.header()
            )),
        }
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if self.active_cmdinput {
            self.last_input = self.input.read(key);
            if self.last_input.finished {
                self.handle_cmd_input();
            }
            self.uidata.cmdinput = self.last_input.clone();
            self.uidata.filter_target = self.filter_target;
            self.uidata.active_cmdinput = self.active_cmdinput;
            self.uidata.last_update = Instant::now();
        }
    }

    fn handle_cmd_input(&mut self) {
        self.active_cmdinput = false;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;

        let committed = self.last_input.clone();
        let target = self.filter_target.take();
        if committed.canceled {
            return;
        }

        if let Some(field) = target {
            if committed.input.is_empty() {
                self.filters.clear(field);
            } else {
                self.filters.set(field, committed.input.clone());
            }
            self.react(StateChange::FilterChanged);
            let shown = self.table.rows.len();
            let message = if committed.input.is_empty() {
                format!("Cleared {} filter ({} rows)", field.name(), shown)
            } else {
                format!(
                    "Filter {} = \"{}\" ({} rows)",
                    field.name(),
                    committed.input,
                    shown
                )
            };
            self.set_status_message(message);
        }
    }

    fn reset_filters(&mut self) {
        if self.filters.is_active() {
            self.filters.reset();
            self.react(StateChange::FilterChanged);
        }
        self.set_status_message(format!(
            "Cleared all filters ({} rows)",
            self.table.rows.len()
        ));
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.uidata.popup_message = HELP_TEXT.to_string();
        self.uidata.show_popup = true;
        self.uidata.last_update = Instant::now();
    }

    fn close_popup(&mut self) {
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
        self.uidata.show_popup = false;
        self.uidata.last_update = Instant::now();
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_model(self, width, height);
        match self.modus {
            Modus::TABLE | Modus::CMDINPUT => self.update_table_data(),
            Modus::POPUP => {}
        }
    }

    // ------------------- Selection movement ------------------- //

    fn select_row(&mut self, abs: usize) {
        let table = &mut self.table;
        let height = table.heigh.max(1);
        if abs >= table.offset_row && abs < table.offset_row + height {
            table.curser_row = abs - table.offset_row;
        } else if abs < table.offset_row {
            table.offset_row = abs;
            table.curser_row = 0;
        } else {
            // Below the window, scroll until the selection is the last
            // visible row.
            table.offset_row = abs + 1 - height;
            table.curser_row = height - 1;
        }
        self.update_table_data();
    }

    fn move_table_selection_up(&mut self, size: usize) {
        let abs =
            (self.table.offset_row + self.table.curser_row).saturating_sub(size);
        self.select_row(abs);
    }

    fn move_table_selection_down(&mut self, size: usize) {
        let nrows = self.table.rows.len();
        if nrows == 0 {
            return;
        }
        let abs = min(
            self.table.offset_row + self.table.curser_row + size,
            nrows - 1,
        );
        self.select_row(abs);
    }

    fn move_table_selection_beginning(&mut self) {
        if !self.table.rows.is_empty() {
            self.select_row(0);
        }
    }

    fn move_table_selection_end(&mut self) {
        if !self.table.rows.is_empty() {
            self.select_row(self.table.rows.len() - 1);
        }
    }

    fn select_column(&mut self, cidx: usize) {
        let table = &mut self.table;
        if table.visible_columns.contains(&cidx) {
            table.curser_column = table
                .visible_columns
                .iter()
                .position(|&c| c == cidx)
                .unwrap_or(0);
        } else {
            table.offset_column = cidx;
            table.curser_column = 0;
        }
        self.update_table_data();
    }

    fn move_table_selection_left(&mut self) {
        let table = &mut self.table;
        if table.curser_column > 0 {
            table.curser_column -= 1;
        } else if table.offset_column > 0 {
            table.offset_column -= 1;
        }
        self.update_table_data();
    }

    fn move_table_selection_right(&mut self) {
        let table = &mut self.table;
        if table.curser_column + table.offset_column < COLUMNS.len() - 1 {
            if table.curser_column < table.visible_columns.len().saturating_sub(1)
            {
                table.curser_column += 1;
            } else {
                table.offset_column += 1;
            }
            self.update_table_data();
        }
    }

    fn toggle_table_index(&mut self) {
        self.table.show_index = !self.table.show_index;

        // The index column changes the layout of everything next to it.
        self.uilayout =
            UILayout::from_model(self, self.uilayout.width, self.uilayout.height);
        self.update_table_data();
    }

    // ------------------- Clipboard ------------------- //

    fn clipboard(&mut self) -> Option<&mut Clipboard> {
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => debug!("No clipboard available: {:?}", e),
            }
        }
        self.clipboard.as_mut()
    }

    fn copy_to_clipboard(&mut self, content: String) {
        let result = match self.clipboard() {
            Some(clipboard) => {
                clipboard.set_text(content).map_err(|e| format!("{e:?}"))
            }
            None => Err("clipboard unavailable".to_string()),
        };
        match result {
            Ok(_) => self.set_status_message("Copied to clipboard"),
            Err(e) => self.set_status_message(format!("Copy failed: {e}")),
        }
    }

    fn selected_point(&self) -> Option<usize> {
        self.table
            .rows
            .get(self.table.offset_row + self.table.curser_row)
            .copied()
    }

    fn copy_table_cell(&mut self) {
        let Some(ridx) = self.selected_point() else {
            return;
        };
        let Some(column) = self.current_column() else {
            return;
        };
        let cell = self.dataset.points()[ridx].cell_text(column, self.time_curser);
        trace!("Cell content: {}", cell);
        self.copy_to_clipboard(cell);
    }

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.chars().any(|c| c == '"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace("\"", "\"\"");
        }
        if needs_wrapping {
            out = format!("\"{out}\"");
        }
        out
    }

    fn copy_table_row(&mut self) {
        let Some(ridx) = self.selected_point() else {
            return;
        };
        let point = &self.dataset.points()[ridx];
        let content = COLUMNS
            .iter()
            .map(|&column| {
                Self::wrap_cell_content(&point.cell_text(column, self.time_curser))
            })
            .collect::<Vec<String>>();
        self.copy_to_clipboard(content.join(","));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataPoint;
    use ratatui::crossterm::event::{KeyCode, KeyEvent};

    fn mk(city: &str, country: &str, confirmed: Vec<u64>) -> DataPoint {
        let days = confirmed.len();
        DataPoint::new(
            city.to_string(),
            String::new(),
            country.to_string(),
            0.0,
            0.0,
            confirmed,
            vec![0; days],
            vec![0; days],
        )
    }

    fn sample_dataset() -> Dataset {
        Dataset::from_parts(
            "test",
            vec![
                mk("Paris", "France", vec![1, 5, 9]),
                mk("Paris", "US", vec![4, 4, 4]),
                mk("", "Germany", vec![2, 8, 2]),
                mk("Lyon", "France", vec![3, 1, 7]),
            ],
            vec!["d0".to_string(), "d1".to_string(), "d2".to_string()],
        )
        .unwrap()
    }

    fn model() -> Model {
        Model::init(&CtvConfig::default(), sample_dataset(), 120, 30).unwrap()
    }

    fn type_filter(m: &mut Model, text: &str) {
        m.update(Message::Filter).unwrap();
        assert!(m.raw_keyevents());
        for c in text.chars() {
            m.update(Message::RawKey(KeyEvent::from(KeyCode::Char(c))))
                .unwrap();
        }
        m.update(Message::RawKey(KeyEvent::from(KeyCode::Enter)))
            .unwrap();
        assert!(!m.raw_keyevents());
    }

    fn confirmed_cells(m: &Model) -> Vec<String> {
        m.uidata
            .table
            .iter()
            .find(|cv| cv.name.starts_with("Confirmed"))
            .expect("confirmed column visible")
            .data
            .clone()
    }

    #[test]
    fn starts_at_the_most_recent_day() {
        let m = model();
        assert_eq!(m.time_curser, 2);
        assert_eq!(m.uidata.day, 2);
        assert_eq!(m.uidata.time_label, "d2");
        assert_eq!(confirmed_cells(&m), ["9", "4", "2", "7"]);
    }

    #[test]
    fn without_filters_all_rows_show_in_load_order() {
        let m = model();
        assert_eq!(m.table.rows, [0, 1, 2, 3]);
        assert_eq!(m.uidata.nrows, 4);
    }

    #[test]
    fn filters_combine_with_and_semantics() {
        let mut m = model();

        // Curser starts on the City column.
        type_filter(&mut m, "Paris");
        assert_eq!(m.table.rows, [0, 1]);
        assert!(m.uidata.name.starts_with("F["));

        // Narrow down by country.
        m.select_column(2);
        type_filter(&mut m, "France");
        assert_eq!(m.table.rows, [0]);
    }

    #[test]
    fn committing_empty_text_clears_the_field() {
        let mut m = model();
        type_filter(&mut m, "Paris");
        assert_eq!(m.table.rows, [0, 1]);
        type_filter(&mut m, "");
        assert_eq!(m.table.rows, [0, 1, 2, 3]);
    }

    #[test]
    fn escape_leaves_the_filters_untouched() {
        let mut m = model();
        type_filter(&mut m, "Paris");

        m.update(Message::Filter).unwrap();
        for c in "Lyon".chars() {
            m.update(Message::RawKey(KeyEvent::from(KeyCode::Char(c))))
                .unwrap();
        }
        m.update(Message::RawKey(KeyEvent::from(KeyCode::Esc))).unwrap();
        assert_eq!(m.table.rows, [0, 1]);
    }

    #[test]
    fn reset_restores_the_full_collection() {
        let mut m = model();
        type_filter(&mut m, "Paris");
        m.select_column(2);
        type_filter(&mut m, "France");
        assert_eq!(m.table.rows, [0]);

        m.update(Message::ResetFilters).unwrap();
        assert_eq!(m.table.rows, [0, 1, 2, 3]);
        assert!(!m.filters.is_active());
    }

    #[test]
    fn filtering_everything_away_is_not_an_error() {
        let mut m = model();
        type_filter(&mut m, "Nowhere");
        assert_eq!(m.uidata.nrows, 0);
        assert!(m.uidata.table.is_empty());
    }

    #[test]
    fn sorting_by_city_puts_empty_values_last() {
        let mut m = model();
        m.update(Message::SortAscending).unwrap();
        assert_eq!(m.table.rows, [3, 0, 1, 2]);
        assert!(m.uidata.table[0].name.ends_with("↑"));

        m.update(Message::SortDescending).unwrap();
        assert_eq!(m.table.rows, [0, 1, 3, 2]);
    }

    #[test]
    fn time_change_keeps_order_under_a_location_sort() {
        let mut m = model();
        m.update(Message::SortAscending).unwrap();
        assert_eq!(m.table.rows, [3, 0, 1, 2]);
        assert_eq!(confirmed_cells(&m), ["7", "9", "4", "2"]);

        m.update(Message::TimeBack(1)).unwrap();
        assert_eq!(m.table.rows, [3, 0, 1, 2]);
        assert_eq!(m.uidata.time_label, "d1");
        assert_eq!(confirmed_cells(&m), ["1", "5", "4", "8"]);
    }

    #[test]
    fn time_change_resorts_under_a_count_sort() {
        let mut m = model();
        m.select_column(5);
        m.update(Message::SortAscending).unwrap();
        assert_eq!(m.table.rows, [2, 1, 3, 0]);

        m.update(Message::TimeBack(2)).unwrap();
        assert_eq!(m.uidata.day, 0);
        assert_eq!(m.table.rows, [0, 2, 3, 1]);
    }

    #[test]
    fn time_steps_clamp_at_both_ends() {
        let mut m = model();
        m.update(Message::TimeForward(5)).unwrap();
        assert_eq!(m.time_curser, 2);
        m.update(Message::TimeBack(7)).unwrap();
        assert_eq!(m.time_curser, 0);
        m.update(Message::TimeBack(1)).unwrap();
        assert_eq!(m.time_curser, 0);
    }

    #[test]
    fn filtering_a_count_column_reports_a_status_message() {
        let mut m = model();
        m.select_column(5);
        m.update(Message::Filter).unwrap();
        assert!(!m.raw_keyevents());
        assert!(m.uidata.status_message.contains("not filterable"));
    }
}
