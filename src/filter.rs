use tracing::trace;

use crate::data::DataPoint;
use crate::domain::FilterField;

/// Three independent exact-match filters over the location columns. A field
/// set to `None` is inactive and matches everything; an active filter
/// requires case-sensitive equality with the point's value. Visibility is
/// the AND over all three fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl FilterState {
    pub fn set(&mut self, field: FilterField, text: impl Into<String>) {
        let text = text.into();
        trace!("Setting {} filter to \"{}\"", field.name(), text);
        *self.slot(field) = Some(text);
    }

    pub fn clear(&mut self, field: FilterField) {
        trace!("Clearing {} filter", field.name());
        *self.slot(field) = None;
    }

    pub fn reset(&mut self) {
        *self = FilterState::default();
    }

    pub fn get(&self, field: FilterField) -> Option<&str> {
        match field {
            FilterField::City => self.city.as_deref(),
            FilterField::State => self.state.as_deref(),
            FilterField::Country => self.country.as_deref(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.city.is_some() || self.state.is_some() || self.country.is_some()
    }

    pub fn matches(&self, point: &DataPoint) -> bool {
        Self::check(&self.city, point.city())
            && Self::check(&self.state, point.state())
            && Self::check(&self.country, point.country())
    }

    /// Short form for the status line, e.g. `city="Paris" country="France"`.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        for field in [FilterField::City, FilterField::State, FilterField::Country]
        {
            if let Some(text) = self.get(field) {
                parts.push(format!("{}=\"{}\"", field.name(), text));
            }
        }
        parts.join(" ")
    }

    fn check(filter: &Option<String>, value: &str) -> bool {
        match filter {
            Some(text) => text == value,
            None => true,
        }
    }

    fn slot(&mut self, field: FilterField) -> &mut Option<String> {
        match field {
            FilterField::City => &mut self.city,
            FilterField::State => &mut self.state,
            FilterField::Country => &mut self.country,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataPoint;

    fn point(city: &str, state: &str, country: &str) -> DataPoint {
        DataPoint::new(
            city.to_string(),
            state.to_string(),
            country.to_string(),
            0.0,
            0.0,
            vec![0],
            vec![0],
            vec![0],
        )
    }

    #[test]
    fn inactive_filters_match_everything() {
        let filters = FilterState::default();
        assert!(!filters.is_active());
        assert!(filters.matches(&point("Paris", "", "France")));
        assert!(filters.matches(&point("", "", "")));
    }

    #[test]
    fn active_fields_combine_with_and_semantics() {
        let a = point("Paris", "", "France");
        let b = point("Paris", "", "US");

        let mut filters = FilterState::default();
        filters.set(FilterField::City, "Paris");
        assert!(filters.matches(&a));
        assert!(filters.matches(&b));

        filters.set(FilterField::Country, "France");
        assert!(filters.matches(&a));
        assert!(!filters.matches(&b));
    }

    #[test]
    fn matching_is_exact_and_case_sensitive() {
        let mut filters = FilterState::default();
        filters.set(FilterField::Country, "France");
        assert!(!filters.matches(&point("Paris", "", "france")));
        assert!(!filters.matches(&point("Paris", "", "Fran")));
        assert!(!filters.matches(&point("Paris", "", "France ")));
    }

    #[test]
    fn empty_filter_text_only_matches_empty_values() {
        let mut filters = FilterState::default();
        filters.set(FilterField::City, "");
        assert!(filters.matches(&point("", "", "Germany")));
        assert!(!filters.matches(&point("Paris", "", "France")));
    }

    #[test]
    fn clear_and_reset_return_fields_to_inactive() {
        let mut filters = FilterState::default();
        filters.set(FilterField::City, "Paris");
        filters.set(FilterField::State, "Texas");
        filters.set(FilterField::Country, "US");

        filters.clear(FilterField::State);
        assert_eq!(filters.get(FilterField::State), None);
        assert!(filters.is_active());

        filters.reset();
        assert_eq!(filters, FilterState::default());
        assert!(!filters.is_active());
    }

    #[test]
    fn summary_lists_active_fields_in_column_order() {
        let mut filters = FilterState::default();
        assert_eq!(filters.summary(), "");
        filters.set(FilterField::Country, "France");
        filters.set(FilterField::City, "Paris");
        assert_eq!(filters.summary(), "city=\"Paris\" country=\"France\"");
    }
}
