//! Analytics aggregates

use serde::{Deserialize, Serialize};

/// Clicks on a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyClicks {
    pub date: String,
    pub clicks: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopLink {
    pub link_id: i64,
    pub title: String,
    pub clicks: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStats {
    pub device_type: String,
    pub count: u64,
    pub percentage: f64,
}

/// Click analytics over a window of days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub total_clicks: u64,
    pub unique_visitors: u64,
    pub daily_stats: Vec<DailyClicks>,
    pub top_links: Vec<TopLink>,
    pub device_stats: Vec<DeviceStats>,
    pub growth_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryStats {
    pub country_code: String,
    pub country_name: String,
    pub clicks: u64,
    pub percentage: f64,
    pub unique_visitors: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityStats {
    pub city: String,
    pub country_code: String,
    pub country_name: String,
    pub clicks: u64,
    pub percentage: f64,
}

/// Geographic breakdown of clicks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographicResponse {
    pub total_countries: u64,
    pub top_countries: Vec<CountryStats>,
    pub city_breakdown: Vec<CityStats>,
    pub geographic_trends: Vec<DailyClicks>,
}

impl AnalyticsResponse {
    /// Clicks recorded for a link in the top-links table, if listed
    pub fn clicks_for(&self, link_id: i64) -> Option<u64> {
        self.top_links
            .iter()
            .find(|l| l.link_id == link_id)
            .map(|l| l.clicks)
    }
}
