pub mod proxy;

use serde::{Deserialize, Serialize};

/// Heart-rate, SpO2 and PPG results for one clip, labelled for display
///
/// Every field is independent: `None` means the analysis pipeline did not
/// report it and serializes as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    #[serde(rename = "Ground Truth Heart Rate")]
    pub gt_heart_rate: Option<f64>,
    #[serde(rename = "Predicted Heart Rate")]
    pub pd_heart_rate: Option<f64>,
    #[serde(rename = "SpO2 Ground Truth")]
    pub gt_spo2: Option<f64>,
    #[serde(rename = "SpO2 Predicted")]
    pub pd_spo2: Option<f64>,
    #[serde(rename = "Mean Absolute Error")]
    pub mean_abs_error: Option<f64>,
    #[serde(rename = "Root Mean Squared Error")]
    pub root_mean_sq_error: Option<f64>,
    #[serde(rename = "GT_PPG")]
    pub gt_ppg: Option<Vec<f64>>,
    #[serde(rename = "PD_PPG")]
    pub pd_ppg: Option<Vec<f64>>,
}

pub use proxy::{MetricsProxy, ProxyError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_fields_serialize_as_null() {
        let record = MetricsRecord {
            gt_heart_rate: Some(72.0),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Ground Truth Heart Rate"], 72.0);
        assert!(json["Predicted Heart Rate"].is_null());
        assert!(json["GT_PPG"].is_null());
        assert_eq!(json.as_object().unwrap().len(), 8);
    }
}
