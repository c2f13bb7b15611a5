//! Side-by-side comparison of two cities.
//!
//! The top and bottom panes load, search and fail independently. The
//! summary compares their latest PM2.5 values with strict ordering: only
//! exactly equal readings count as "similar".

use serde::Serialize;

use super::{CardMessages, CardState, LoadCounter, LoadTicket, SearchPanel, Services};
use crate::data_sources::{AirQualityReport, ClientError};
use crate::model::{CityTarget, SearchResultCity};

/// Which pane of the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
}

/// One half of the comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ComparePane {
    pub label: String,
    pub card: CardState,
    pub search: SearchPanel,
    #[serde(skip)]
    loads: LoadCounter,
}

impl ComparePane {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            card: CardState::loading(),
            search: SearchPanel::default(),
            loads: LoadCounter::default(),
        }
    }
}

/// State of the comparison view.
#[derive(Clone, Serialize)]
pub struct CompareView {
    #[serde(skip)]
    services: Services,
    pub top: ComparePane,
    pub bottom: ComparePane,
}

impl CompareView {
    /// A view with both panes waiting on the reference pair.
    pub fn new(services: Services) -> Self {
        let (top, bottom) = Self::default_pair();
        Self {
            services,
            top: ComparePane::new(&top.label),
            bottom: ComparePane::new(&bottom.label),
        }
    }

    /// Reference cities loaded on first open.
    pub fn default_pair() -> (CityTarget, CityTarget) {
        (
            CityTarget::new("Skopje", 41.9981, 21.4254),
            CityTarget::new("London", 51.5074, -0.1278),
        )
    }

    /// Load the reference pair.
    pub async fn init(&mut self) {
        let (top, bottom) = Self::default_pair();
        self.load_pair(top, bottom).await;
    }

    /// Load both panes with their requests in flight at the same time.
    pub async fn load_pair(&mut self, top: CityTarget, bottom: CityTarget) {
        let top_ticket = self.begin_load(Side::Top, top);
        let bottom_ticket = self.begin_load(Side::Bottom, bottom);

        let air_quality = &self.services.air_quality;
        let (top_result, bottom_result) = tokio::join!(
            air_quality.fetch_air_quality(
                top_ticket.coordinates.latitude,
                top_ticket.coordinates.longitude
            ),
            air_quality.fetch_air_quality(
                bottom_ticket.coordinates.latitude,
                bottom_ticket.coordinates.longitude
            ),
        );

        self.finish_load(Side::Top, top_ticket, top_result);
        self.finish_load(Side::Bottom, bottom_ticket, bottom_result);
    }

    /// Point one pane at `target` and fetch its readings.
    pub async fn load_for(&mut self, side: Side, target: CityTarget) {
        let ticket = self.begin_load(side, target);
        let result = self
            .services
            .air_quality
            .fetch_air_quality(ticket.coordinates.latitude, ticket.coordinates.longitude)
            .await;
        self.finish_load(side, ticket, result);
    }

    /// Relabel a pane and reset its card.
    pub fn begin_load(&mut self, side: Side, target: CityTarget) -> LoadTicket {
        let pane = self.pane_mut(side);
        pane.label = target.label;
        pane.card = CardState::loading();
        pane.loads.issue(target.coordinates)
    }

    /// Apply a result to a pane unless a newer load on it has begun.
    pub fn finish_load(
        &mut self,
        side: Side,
        ticket: LoadTicket,
        result: Result<AirQualityReport, ClientError>,
    ) -> bool {
        let pane = self.pane_mut(side);
        if !pane.loads.is_current(&ticket) {
            return false;
        }
        pane.card = CardState::from_result(&result, &CardMessages::CITY);
        true
    }

    /// Search for a city for one pane.
    pub async fn search(&mut self, side: Side, raw_query: &str) {
        let geocoding = self.services.geocoding.clone();
        self.pane_mut(side).search.search(&geocoding, raw_query).await;
    }

    /// Load a search result into its pane and hide the result list.
    pub async fn use_search_result(&mut self, side: Side, city: &SearchResultCity) {
        let target = CityTarget {
            label: city.label(),
            coordinates: city.coordinates(),
        };
        let ticket = self.begin_load(side, target);
        self.pane_mut(side).search.dismiss();

        let result = self
            .services
            .air_quality
            .fetch_air_quality(ticket.coordinates.latitude, ticket.coordinates.longitude)
            .await;
        self.finish_load(side, ticket, result);
    }

    pub fn pane(&self, side: Side) -> &ComparePane {
        match side {
            Side::Top => &self.top,
            Side::Bottom => &self.bottom,
        }
    }

    fn pane_mut(&mut self, side: Side) -> &mut ComparePane {
        match side {
            Side::Top => &mut self.top,
            Side::Bottom => &mut self.bottom,
        }
    }

    /// Absolute PM2.5 gap, when both panes have a reading.
    pub fn pm25_difference(&self) -> Option<f64> {
        let (top, bottom) = (self.top.card.pm25?, self.bottom.card.pm25?);
        Some((top - bottom).abs())
    }

    /// One-sentence verdict, when both panes have a reading.
    pub fn summary_sentence(&self) -> Option<String> {
        let (top, bottom) = (self.top.card.pm25?, self.bottom.card.pm25?);
        let (top_name, bottom_name) = (&self.top.label, &self.bottom.label);

        let sentence = if top < bottom {
            format!("{} currently has cleaner air than {}.", top_name, bottom_name)
        } else if top > bottom {
            format!("{} currently has cleaner air than {}.", bottom_name, top_name)
        } else {
            format!(
                "{} and {} currently have similar PM2.5 levels.",
                top_name, bottom_name
            )
        };
        Some(sentence)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    async fn settled_view(top_pm25: f64, bottom_pm25: f64) -> CompareView {
        let mut view = CompareView::new(offline_services().await);
        let (top, bottom) = CompareView::default_pair();
        let top_ticket = view.begin_load(Side::Top, top);
        let bottom_ticket = view.begin_load(Side::Bottom, bottom);
        view.finish_load(Side::Top, top_ticket, report(10.0, &[top_pm25]));
        view.finish_load(Side::Bottom, bottom_ticket, report(10.0, &[bottom_pm25]));
        view
    }

    #[tokio::test]
    async fn test_top_cleaner() {
        let view = settled_view(10.0, 20.0).await;

        assert_eq!(
            view.summary_sentence().as_deref(),
            Some("Skopje currently has cleaner air than London.")
        );
        assert_eq!(view.pm25_difference(), Some(10.0));
    }

    #[tokio::test]
    async fn test_bottom_cleaner() {
        let view = settled_view(42.0, 7.5).await;

        assert_eq!(
            view.summary_sentence().as_deref(),
            Some("London currently has cleaner air than Skopje.")
        );
        assert_eq!(view.pm25_difference(), Some(34.5));
    }

    #[tokio::test]
    async fn test_equal_readings_are_similar() {
        let view = settled_view(15.25, 15.25).await;

        assert_eq!(
            view.summary_sentence().as_deref(),
            Some("Skopje and London currently have similar PM2.5 levels.")
        );
        assert_eq!(view.pm25_difference(), Some(0.0));
    }

    #[tokio::test]
    async fn test_missing_side_has_no_summary() {
        let mut view = CompareView::new(offline_services().await);
        let (top, _) = CompareView::default_pair();
        let ticket = view.begin_load(Side::Top, top);
        view.finish_load(Side::Top, ticket, report(10.0, &[10.0]));

        assert!(view.summary_sentence().is_none());
        assert!(view.pm25_difference().is_none());
    }

    #[tokio::test]
    async fn test_panes_are_independent() {
        let mut view = CompareView::new(offline_services().await);
        let (top, bottom) = CompareView::default_pair();
        let top_ticket = view.begin_load(Side::Top, top);
        let bottom_ticket = view.begin_load(Side::Bottom, bottom);

        view.finish_load(Side::Top, top_ticket, Err(ClientError::NoData));
        view.finish_load(Side::Bottom, bottom_ticket, report(3.0, &[4.0]));

        assert_eq!(
            view.top.card.error.as_deref(),
            Some("No air quality data available")
        );
        assert_eq!(view.bottom.card.pm25, Some(4.0));
        assert_eq!(view.bottom.card.status_label, Some("Good"));
    }

    #[tokio::test]
    async fn test_tickets_are_per_pane() {
        let mut view = CompareView::new(offline_services().await);
        let top_ticket = view.begin_load(Side::Top, CityTarget::new("Rome", 41.9, 12.5));
        let bottom_ticket = view.begin_load(Side::Bottom, CityTarget::new("Oslo", 59.9, 10.7));

        assert!(view.finish_load(Side::Bottom, bottom_ticket, report(1.0, &[1.0])));
        assert!(view.finish_load(Side::Top, top_ticket, report(1.0, &[2.0])));
    }

    #[tokio::test]
    async fn test_init_failure_marks_both_cards() {
        let mut view = CompareView::new(offline_services().await);

        view.init().await;

        for side in [Side::Top, Side::Bottom] {
            let card = &view.pane(side).card;
            assert!(!card.loading);
            assert_eq!(card.error.as_deref(), Some("Failed to load air quality data"));
        }
        assert_eq!(view.top.label, "Skopje");
        assert_eq!(view.bottom.label, "London");
    }

    #[tokio::test]
    async fn test_use_search_result_dismisses_results() {
        let mut view = CompareView::new(offline_services().await);
        let city = SearchResultCity {
            id: "2988507".to_string(),
            name: "Paris".to_string(),
            country: "France".to_string(),
            latitude: 48.8534,
            longitude: 2.3488,
        };
        view.bottom.search.results = vec![city.clone()];
        view.bottom.search.message = Some("Found 1 option(s).".to_string());

        view.use_search_result(Side::Bottom, &city).await;

        assert_eq!(view.bottom.label, "Paris, France");
        assert!(view.bottom.search.results.is_empty());
        assert!(view.bottom.search.message.is_none());
        assert_eq!(view.top.label, "Skopje");
    }
}
