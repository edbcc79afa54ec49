use std::io::Error;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

#[derive(Debug)]
pub enum CtvError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    DataIntegrityError(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl From<Error> for CtvError {
    fn from(err: Error) -> Self {
        CtvError::IoError(err)
    }
}

impl From<PolarsError> for CtvError {
    fn from(err: PolarsError) -> Self {
        CtvError::PolarsError(err)
    }
}

/// Runtime tunables, set once in main and passed to model, ui and controller.
#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct CtvConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub time_week_step: usize,
    pub status_message_timeout: u64,
}

impl Default for CtvConfig {
    fn default() -> Self {
        CtvConfig {
            event_poll_time: 100,
            max_column_width: 40,
            time_week_step: 7,
            status_message_timeout: 5,
        }
    }
}

// The table columns, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    City,
    State,
    Country,
    Lat,
    Lon,
    Confirmed,
    Deaths,
    Recovered,
}

pub const COLUMNS: [SortColumn; 8] = [
    SortColumn::City,
    SortColumn::State,
    SortColumn::Country,
    SortColumn::Lat,
    SortColumn::Lon,
    SortColumn::Confirmed,
    SortColumn::Deaths,
    SortColumn::Recovered,
];

impl SortColumn {
    pub fn header(self) -> &'static str {
        match self {
            SortColumn::City => "City",
            SortColumn::State => "Province/State",
            SortColumn::Country => "Country/Region",
            SortColumn::Lat => "Lat",
            SortColumn::Lon => "Long",
            SortColumn::Confirmed => "Confirmed",
            SortColumn::Deaths => "Deaths",
            SortColumn::Recovered => "Recovered",
        }
    }

    // Columns whose cell values depend on the time curser. Sorting by one of
    // them makes the row order itself time dependent.
    pub fn is_time_dependent(self) -> bool {
        matches!(
            self,
            SortColumn::Confirmed | SortColumn::Deaths | SortColumn::Recovered
        )
    }

    pub fn filter_field(self) -> Option<FilterField> {
        match self {
            SortColumn::City => Some(FilterField::City),
            SortColumn::State => Some(FilterField::State),
            SortColumn::Country => Some(FilterField::Country),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    City,
    State,
    Country,
}

impl FilterField {
    pub fn name(self) -> &'static str {
        match self {
            FilterField::City => "city",
            FilterField::State => "state",
            FilterField::Country => "country",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Message {
    Quit,
    Exit,
    Help,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    MoveToFirstColumn,
    MoveToLastColumn,
    SortAscending,
    SortDescending,
    Filter,
    ResetFilters,
    TimeBack(usize),
    TimeForward(usize),
    ToggleIndex,
    CopyCell,
    CopyRow,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
ctv - covid time series browser

Navigation
  ↑/↓/←/→ or k/j/h/l   move selection
  PgUp / PgDn          page up / down
  g / G                first / last row
  0 / $                first / last column

Time
  [ / ]                previous / next day
  { / }                back / forward one week

Table
  s / S                sort by current column (asc / desc)
  f                    filter by current column (city/state/country)
  r                    reset all filters
  i                    toggle row index
  y / Y                copy cell / row

Other
  ?                    show this help
  Esc                  close popup / cancel input
  q                    quit";
