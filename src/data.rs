use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::{CtvError, SortColumn};

#[derive(Debug)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug)]
pub struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

/// The leading columns every metric file must carry, in this order. All
/// remaining columns are read as one day of counts each.
pub const LOCATION_COLUMNS: [&str; 5] =
    ["City", "Province/State", "Country/Region", "Lat", "Long"];

/// One location with its daily time series. Built once at load time and
/// read only afterwards.
#[derive(Debug, Clone)]
pub struct DataPoint {
    city: String,
    state: String,
    country: String,
    lat: f64,
    lon: f64,
    confirmed: Vec<u64>,
    deaths: Vec<u64>,
    recovered: Vec<u64>,
}

impl DataPoint {
    pub fn new(
        city: String,
        state: String,
        country: String,
        lat: f64,
        lon: f64,
        confirmed: Vec<u64>,
        deaths: Vec<u64>,
        recovered: Vec<u64>,
    ) -> Self {
        DataPoint {
            city,
            state,
            country,
            lat,
            lon,
            confirmed,
            deaths,
            recovered,
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn confirmed_at(&self, day: usize) -> Option<u64> {
        self.confirmed.get(day).copied()
    }

    pub fn deaths_at(&self, day: usize) -> Option<u64> {
        self.deaths.get(day).copied()
    }

    pub fn recovered_at(&self, day: usize) -> Option<u64> {
        self.recovered.get(day).copied()
    }

    /// The text rendered into a table cell for this column. Count columns
    /// read the series at the given day, everything else ignores it.
    pub fn cell_text(&self, column: SortColumn, day: usize) -> String {
        match column {
            SortColumn::City => self.city.clone(),
            SortColumn::State => self.state.clone(),
            SortColumn::Country => self.country.clone(),
            SortColumn::Lat => self.lat.to_string(),
            SortColumn::Lon => self.lon.to_string(),
            SortColumn::Confirmed => {
                self.confirmed_at(day).unwrap_or(0).to_string()
            }
            SortColumn::Deaths => self.deaths_at(day).unwrap_or(0).to_string(),
            SortColumn::Recovered => {
                self.recovered_at(day).unwrap_or(0).to_string()
            }
        }
    }

    fn location_label(&self) -> String {
        format!("{}/{}", self.city, self.country)
    }
}

/// Owns the full row collection and the ordered day labels. Never mutated
/// after construction; the series/label length invariant is checked here
/// once and assumed everywhere else.
pub struct Dataset {
    name: String,
    points: Vec<DataPoint>,
    time_labels: Vec<String>,
}

impl Dataset {
    pub fn from_parts(
        name: impl Into<String>,
        points: Vec<DataPoint>,
        time_labels: Vec<String>,
    ) -> Result<Self, CtvError> {
        if time_labels.is_empty() {
            return Err(CtvError::DataIntegrityError(
                "dataset has no time labels".to_string(),
            ));
        }
        let days = time_labels.len();
        for (ridx, point) in points.iter().enumerate() {
            if point.confirmed.len() != days
                || point.deaths.len() != days
                || point.recovered.len() != days
            {
                return Err(CtvError::DataIntegrityError(format!(
                    "series length mismatch for \"{}\" (row {}): expected {} days",
                    point.location_label(),
                    ridx,
                    days
                )));
            }
        }
        Ok(Dataset {
            name: name.into(),
            points,
            time_labels,
        })
    }

    /// Loads the three metric files (confirmed, deaths, recovered) in
    /// parallel and joins them row-wise into one point collection. The
    /// files must agree on date columns and location rows.
    pub fn load(
        confirmed: &Path,
        deaths: &Path,
        recovered: &Path,
    ) -> Result<Self, CtvError> {
        let start_time = Instant::now();

        let frames: Vec<DataFrame> = [confirmed, deaths, recovered]
            .par_iter()
            .map(|path| -> Result<DataFrame, CtvError> {
                let info = Self::get_file_info(path)?;
                debug!("Scanning {:?} ({} bytes)", info.path, info.file_size);
                let frame = match info.file_type {
                    FileType::CSV => Self::load_csv(&info.path)?,
                    FileType::PARQUET => Self::load_parquet(&info.path)?,
                    FileType::ARROW => Self::load_arrow(&info.path)?,
                };
                Ok(frame.collect()?)
            })
            .collect::<Result<_, CtvError>>()?;
        let [confirmed_df, deaths_df, recovered_df]: [DataFrame; 3] =
            frames.try_into().map_err(|_| {
                CtvError::LoadingFailed("expected three data frames".to_string())
            })?;

        let time_labels = Self::date_labels(&confirmed_df)?;
        for (metric, df) in [("deaths", &deaths_df), ("recovered", &recovered_df)] {
            if df.height() != confirmed_df.height() {
                return Err(CtvError::DataIntegrityError(format!(
                    "the {} file has {} rows, the confirmed file {}",
                    metric,
                    df.height(),
                    confirmed_df.height()
                )));
            }
            if Self::date_labels(df)? != time_labels {
                return Err(CtvError::DataIntegrityError(format!(
                    "date columns of the {metric} file do not match the confirmed file"
                )));
            }
        }

        let mut cities = Self::str_column(&confirmed_df, "City")?;
        let mut states = Self::str_column(&confirmed_df, "Province/State")?;
        let mut countries = Self::str_column(&confirmed_df, "Country/Region")?;
        let lats = Self::f64_column(&confirmed_df, "Lat")?;
        let lons = Self::f64_column(&confirmed_df, "Long")?;

        for (metric, df) in [("deaths", &deaths_df), ("recovered", &recovered_df)] {
            Self::check_alignment(metric, df, &cities, &states, &countries)?;
        }

        let mut confirmed_series = Self::count_rows(&confirmed_df, &time_labels)?;
        let mut deaths_series = Self::count_rows(&deaths_df, &time_labels)?;
        let mut recovered_series = Self::count_rows(&recovered_df, &time_labels)?;

        let mut points = Vec::with_capacity(confirmed_df.height());
        for ridx in 0..confirmed_df.height() {
            points.push(DataPoint::new(
                std::mem::take(&mut cities[ridx]),
                std::mem::take(&mut states[ridx]),
                std::mem::take(&mut countries[ridx]),
                lats[ridx],
                lons[ridx],
                std::mem::take(&mut confirmed_series[ridx]),
                std::mem::take(&mut deaths_series[ridx]),
                std::mem::take(&mut recovered_series[ridx]),
            ));
        }

        let name = confirmed
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();
        let dataset = Self::from_parts(name, points, time_labels)?;

        info!(
            "Loaded {} locations over {} days in {}ms ...",
            dataset.points.len(),
            dataset.days(),
            start_time.elapsed().as_millis()
        );
        Ok(dataset)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All points in load order.
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn time_labels(&self) -> &[String] {
        &self.time_labels
    }

    /// Number of days, equal to the length of every series.
    pub fn days(&self) -> usize {
        self.time_labels.len()
    }

    fn date_labels(df: &DataFrame) -> Result<Vec<String>, CtvError> {
        let names = df.get_column_names_str();
        if names.len() <= LOCATION_COLUMNS.len()
            || names[..LOCATION_COLUMNS.len()] != LOCATION_COLUMNS
        {
            return Err(CtvError::DataIntegrityError(format!(
                "expected columns {:?} followed by one column per day",
                LOCATION_COLUMNS
            )));
        }
        Ok(names[LOCATION_COLUMNS.len()..]
            .iter()
            .map(|s| s.to_string())
            .collect())
    }

    fn str_column(df: &DataFrame, name: &str) -> Result<Vec<String>, CtvError> {
        let col = df.column(name)?.cast(&DataType::String)?;
        let series = col.str()?;
        // A missing location value loads as the empty string; empty
        // city/state cells are legitimate values in this dataset.
        Ok(series
            .into_iter()
            .map(|value| value.unwrap_or("").to_string())
            .collect())
    }

    fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, CtvError> {
        let col = df.column(name)?.cast(&DataType::Float64).map_err(|_| {
            CtvError::DataIntegrityError(format!(
                "column \"{name}\" holds non numeric values"
            ))
        })?;
        let series = col.f64()?;
        series
            .into_iter()
            .enumerate()
            .map(|(ridx, value)| {
                value.ok_or_else(|| {
                    CtvError::DataIntegrityError(format!(
                        "missing {name} value in row {ridx}"
                    ))
                })
            })
            .collect()
    }

    // Transpose the date columns into one count series per row.
    fn count_rows(
        df: &DataFrame,
        labels: &[String],
    ) -> Result<Vec<Vec<u64>>, CtvError> {
        let mut rows = vec![Vec::with_capacity(labels.len()); df.height()];
        for label in labels {
            let col =
                df.column(label)?.cast(&DataType::Int64).map_err(|_| {
                    CtvError::DataIntegrityError(format!(
                        "column \"{label}\" holds non numeric values"
                    ))
                })?;
            let series = col.i64()?;
            for (ridx, value) in series.into_iter().enumerate() {
                match value {
                    Some(count) if count >= 0 => rows[ridx].push(count as u64),
                    Some(count) => {
                        return Err(CtvError::DataIntegrityError(format!(
                            "negative count {count} in column \"{label}\", row {ridx}"
                        )));
                    }
                    None => {
                        return Err(CtvError::DataIntegrityError(format!(
                            "missing count in column \"{label}\", row {ridx}"
                        )));
                    }
                }
            }
        }
        Ok(rows)
    }

    fn check_alignment(
        metric: &str,
        df: &DataFrame,
        cities: &[String],
        states: &[String],
        countries: &[String],
    ) -> Result<(), CtvError> {
        let other_cities = Self::str_column(df, "City")?;
        let other_states = Self::str_column(df, "Province/State")?;
        let other_countries = Self::str_column(df, "Country/Region")?;
        for ridx in 0..cities.len() {
            if other_cities[ridx] != cities[ridx]
                || other_states[ridx] != states[ridx]
                || other_countries[ridx] != countries[ridx]
            {
                return Err(CtvError::DataIntegrityError(format!(
                    "row {ridx} of the {metric} file names a different location than the confirmed file"
                )));
            }
        }
        Ok(())
    }

    fn detect_file_type(path: &Path) -> Result<FileType, CtvError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
            _ => Err(CtvError::UnknownFileType),
        }
    }

    fn get_file_info(path: &Path) -> Result<FileInfo, CtvError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CtvError::FileNotFound,
            ErrorKind::PermissionDenied => CtvError::PermissionDenied,
            _ => CtvError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(CtvError::LoadingFailed("Not a file!".into()));
        }

        let file_size = metadata.len();
        let file_type = Self::detect_file_type(path)?;

        Ok(FileInfo {
            path: path.to_path_buf(),
            file_size,
            file_type,
        })
    }

    fn load_csv(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyCsvReader::new(PlPath::Local(path.as_path().into()))
            .with_has_header(true)
            .finish()
    }

    fn load_parquet(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_parquet(
            PlPath::Local(path.as_path().into()),
            ScanArgsParquet::default(),
        )
    }

    fn load_arrow(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_ipc(
            PlPath::Local(path.as_path().into()),
            polars::io::ipc::IpcScanOptions,
            UnifiedScanArgs::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(city: &str, country: &str, confirmed: Vec<u64>) -> DataPoint {
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

    #[test]
    fn series_access_is_bounded() {
        let p = point("Paris", "France", vec![1, 5, 9]);
        assert_eq!(p.confirmed_at(0), Some(1));
        assert_eq!(p.confirmed_at(2), Some(9));
        assert_eq!(p.confirmed_at(3), None);
        assert_eq!(p.deaths_at(1), Some(0));
        assert_eq!(p.recovered_at(17), None);
    }

    #[test]
    fn cell_text_reads_counts_at_the_given_day() {
        let p = point("Paris", "France", vec![1, 5, 9]);
        assert_eq!(p.cell_text(SortColumn::Confirmed, 0), "1");
        assert_eq!(p.cell_text(SortColumn::Confirmed, 2), "9");
        assert_eq!(p.cell_text(SortColumn::City, 2), "Paris");
        assert_eq!(p.cell_text(SortColumn::Lat, 0), "0");
    }

    #[test]
    fn construction_rejects_series_length_mismatch() {
        let labels = vec!["1/22/20".to_string(), "1/23/20".to_string()];
        let points = vec![point("Paris", "France", vec![1, 2, 3])];
        let result = Dataset::from_parts("test", points, labels);
        assert!(matches!(result, Err(CtvError::DataIntegrityError(_))));
    }

    #[test]
    fn construction_rejects_empty_label_sequence() {
        let result = Dataset::from_parts("test", Vec::new(), Vec::new());
        assert!(matches!(result, Err(CtvError::DataIntegrityError(_))));
    }

    #[test]
    fn loads_the_csv_fixtures_in_file_order() {
        let dataset = Dataset::load(
            Path::new("tests/fixtures/confirmed_01.csv"),
            Path::new("tests/fixtures/deaths_01.csv"),
            Path::new("tests/fixtures/recovered_01.csv"),
        )
        .unwrap();

        assert_eq!(
            dataset.time_labels(),
            ["1/22/20", "1/23/20", "1/24/20", "1/25/20"]
        );
        assert_eq!(dataset.days(), 4);

        let points = dataset.points();
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].city(), "Paris");
        assert_eq!(points[0].country(), "France");
        assert_eq!(points[1].city(), "Paris");
        assert_eq!(points[1].country(), "US");
        assert_eq!(points[2].city(), "");
        assert_eq!(points[2].country(), "Germany");
        assert_eq!(points[3].city(), "Lyon");

        assert_eq!(points[0].confirmed_at(3), Some(9));
        assert_eq!(points[2].deaths_at(0), Some(0));
        assert_eq!(points[3].recovered_at(2), Some(5));
    }

    #[test]
    fn load_rejects_mismatched_date_columns() {
        let result = Dataset::load(
            Path::new("tests/fixtures/confirmed_01.csv"),
            Path::new("tests/fixtures/deaths_short.csv"),
            Path::new("tests/fixtures/recovered_01.csv"),
        );
        assert!(matches!(result, Err(CtvError::DataIntegrityError(_))));
    }

    #[test]
    fn load_rejects_misaligned_locations() {
        let result = Dataset::load(
            Path::new("tests/fixtures/confirmed_01.csv"),
            Path::new("tests/fixtures/deaths_01.csv"),
            Path::new("tests/fixtures/recovered_misaligned.csv"),
        );
        assert!(matches!(result, Err(CtvError::DataIntegrityError(_))));
    }

    #[test]
    fn load_rejects_unknown_extensions() {
        let result = Dataset::load(
            Path::new("tests/fixtures/confirmed_01.csv"),
            Path::new("Cargo.toml"),
            Path::new("tests/fixtures/recovered_01.csv"),
        );
        assert!(matches!(result, Err(CtvError::UnknownFileType)));
    }
}
