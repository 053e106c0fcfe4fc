use crate::report::{FeatureImportance, ModelMetrics, Report};

#[derive(Debug, Clone, PartialEq)]
pub struct FeaturePoint {
    pub name: String,
    pub importance: f64,
}

/// Chart ready feature importances, in the order the model reported them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSeries {
    points: Vec<FeaturePoint>,
}

impl FeatureSeries {
    pub fn from_importances(items: &[FeatureImportance]) -> Self {
        let points = items
            .iter()
            .map(|fi| FeaturePoint {
                name: fi.feature.clone(),
                importance: fi.importance,
            })
            .collect();
        Self { points }
    }

    pub fn from_metrics(metrics: Option<&ModelMetrics>) -> Self {
        match metrics.and_then(|m| m.feature_importances.as_deref()) {
            Some(items) => Self::from_importances(items),
            None => Self::default(),
        }
    }

    pub fn from_report(report: &Report) -> Self {
        Self::from_metrics(report.model_metrics.as_ref())
    }

    pub fn points(&self) -> &[FeaturePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Largest importance, used to scale the chart. 0.0 for an empty series.
    pub fn max_importance(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.importance)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fi(feature: &str, importance: f64) -> FeatureImportance {
        FeatureImportance {
            feature: feature.to_string(),
            importance,
        }
    }

    #[test]
    fn keeps_source_order() {
        let series = FeatureSeries::from_importances(&[fi("a", 0.3), fi("b", 0.9)]);
        assert_eq!(
            series.points(),
            &[
                FeaturePoint { name: "a".into(), importance: 0.3 },
                FeaturePoint { name: "b".into(), importance: 0.9 },
            ]
        );
    }

    #[test]
    fn no_metrics_gives_empty_series() {
        assert!(FeatureSeries::from_metrics(None).is_empty());
        let metrics = ModelMetrics { feature_importances: None };
        assert!(FeatureSeries::from_metrics(Some(&metrics)).is_empty());
        let metrics = ModelMetrics { feature_importances: Some(vec![]) };
        assert!(FeatureSeries::from_metrics(Some(&metrics)).is_empty());
    }

    #[test]
    fn values_pass_through_untouched() {
        let items = vec![fi("x", 1e-9), fi("x", 0.0), fi("y", 12.5)];
        let series = FeatureSeries::from_importances(&items);
        assert_eq!(series.len(), items.len());
        let values: Vec<f64> = series.points().iter().map(|p| p.importance).collect();
        assert_eq!(values, vec![1e-9, 0.0, 12.5]);
        assert_eq!(series.max_importance(), 12.5);
    }
}
