//! Binary classification metrics

use crate::error::{ChurnError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Probability above which a record is labelled as churned
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Held-out evaluation metrics
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub auc_roc: f64,
}

/// Confusion matrix counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

/// One point of a ROC curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub fpr: f64,
    pub tpr: f64,
    pub threshold: f64,
}

impl ConfusionMatrix {
    /// Count outcomes of hard labels against the truth
    pub fn from_labels(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let mut cm = Self::default();
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            match (*t > 0.5, *p > 0.5) {
                (true, true) => cm.true_positive += 1,
                (false, true) => cm.false_positive += 1,
                (false, false) => cm.true_negative += 1,
                (true, false) => cm.false_negative += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }
}

impl ClassificationMetrics {
    /// Compute all metrics from held-out labels and positive-class probabilities
    pub fn compute(y_true: &Array1<f64>, y_prob: &Array1<f64>) -> Result<(Self, Vec<RocPoint>, ConfusionMatrix)> {
        if y_true.len() != y_prob.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} probabilities", y_true.len()),
                actual: format!("{} probabilities", y_prob.len()),
            });
        }
        if y_true.is_empty() {
            return Err(ChurnError::EmptyDataset);
        }

        let y_pred = y_prob.mapv(|p| if p > DECISION_THRESHOLD { 1.0 } else { 0.0 });
        let cm = ConfusionMatrix::from_labels(y_true, &y_pred);
        let curve = roc_curve(y_true, y_prob);

        let tp = cm.true_positive as f64;
        let fp = cm.false_positive as f64;
        let fn_ = cm.false_negative as f64;

        let precision = safe_div(tp, tp + fp);
        let recall = safe_div(tp, tp + fn_);
        let f1_score = safe_div(2.0 * precision * recall, precision + recall);

        let metrics = Self {
            accuracy: (cm.true_positive + cm.true_negative) as f64 / cm.total() as f64,
            precision,
            recall,
            f1_score,
            auc_roc: roc_auc(y_true, &curve),
        };
        Ok((metrics, curve, cm))
    }
}

fn safe_div(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// ROC curve over the distinct score thresholds, highest threshold first.
///
/// The first point is (0, 0) with a threshold one above the top score.
pub fn roc_curve(y_true: &Array1<f64>, y_prob: &Array1<f64>) -> Vec<RocPoint> {
    let mut order: Vec<usize> = (0..y_prob.len()).collect();
    order.sort_by(|&a, &b| y_prob[b].total_cmp(&y_prob[a]));

    let positives = y_true.iter().filter(|&&t| t > 0.5).count() as f64;
    let negatives = y_true.len() as f64 - positives;

    let top = order.first().map_or(1.0, |&i| y_prob[i]);
    let mut curve = vec![RocPoint { fpr: 0.0, tpr: 0.0, threshold: top + 1.0 }];

    let (mut tp, mut fp) = (0.0, 0.0);
    for (pos, &i) in order.iter().enumerate() {
        if y_true[i] > 0.5 {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        // emit once per distinct threshold
        let last_of_group = order
            .get(pos + 1)
            .map_or(true, |&next| y_prob[next] != y_prob[i]);
        if last_of_group {
            curve.push(RocPoint {
                fpr: safe_div(fp, negatives),
                tpr: safe_div(tp, positives),
                threshold: y_prob[i],
            });
        }
    }
    curve
}

/// Trapezoidal area under a ROC curve; 0.5 when only one class is present
pub fn roc_auc(y_true: &Array1<f64>, curve: &[RocPoint]) -> f64 {
    let positives = y_true.iter().filter(|&&t| t > 0.5).count();
    if positives == 0 || positives == y_true.len() {
        return 0.5;
    }
    curve
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr) / 2.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classification_metrics() {
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let y_prob = array![0.9, 0.2, 0.8, 0.3, 0.1, 0.7, 0.6, 0.4];

        let (metrics, _, cm) = ClassificationMetrics::compute(&y_true, &y_prob).unwrap();

        assert_eq!(cm.true_positive, 3);
        assert_eq!(cm.false_positive, 1);
        assert_eq!(cm.false_negative, 1);
        assert_eq!(cm.true_negative, 3);
        assert!((metrics.accuracy - 0.75).abs() < 1e-12);
        assert!((metrics.precision - 0.75).abs() < 1e-12);
        assert!((metrics.recall - 0.75).abs() < 1e-12);
        assert!((metrics.f1_score - 0.75).abs() < 1e-12);
        // 14 of 16 positive/negative pairs are ranked correctly
        assert!((metrics.auc_roc - 14.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_ranking() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let y_prob = array![0.1, 0.4, 0.35, 0.8];
        let curve = roc_curve(&y_true, &y_prob);
        assert!((roc_auc(&y_true, &curve) - 0.75).abs() < 1e-12);

        let y_prob = array![0.1, 0.2, 0.7, 0.8];
        let curve = roc_curve(&y_true, &y_prob);
        assert!((roc_auc(&y_true, &curve) - 1.0).abs() < 1e-12);
        assert_eq!(curve.first().unwrap().fpr, 0.0);
        assert_eq!(curve.last().unwrap().tpr, 1.0);
    }

    #[test]
    fn test_tied_scores_share_a_point() {
        let y_true = array![0.0, 1.0, 0.0, 1.0];
        let y_prob = array![0.5, 0.5, 0.5, 0.5];
        let curve = roc_curve(&y_true, &y_prob);
        assert_eq!(curve.len(), 2);
        assert!((roc_auc(&y_true, &curve) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_division_and_single_class() {
        let y_true = array![0.0, 0.0, 0.0];
        let y_prob = array![0.1, 0.2, 0.3];
        let (metrics, _, _) = ClassificationMetrics::compute(&y_true, &y_prob).unwrap();
        assert_eq!(metrics.precision, 0.0);
        assert_eq!(metrics.recall, 0.0);
        assert_eq!(metrics.f1_score, 0.0);
        assert_eq!(metrics.auc_roc, 0.5);
        assert_eq!(metrics.accuracy, 1.0);
    }
}
