//! Binary LightGBM classifier.
//!
//! Wraps a `lightgbm3` booster behind the fit/predict surface the training
//! drivers use. Hyperparameters come from [`BoosterParams`]; missing values
//! are passed through as NaN and handled by LightGBM.

use lightgbm3::{Booster, Dataset, ImportanceType};
use ndarray::ArrayView2;
use serde_json::{Value, json};
use std::fmt;
use surprise_core::{BoosterParams, Result, SurpriseError};
use tracing::{debug, warn};

fn model_error(e: lightgbm3::Error) -> SurpriseError {
    SurpriseError::Model(e.to_string())
}

fn feature_count(n: usize) -> Result<i32> {
    i32::try_from(n).map_err(|_| SurpriseError::InvalidData(format!("{n} features")))
}

/// LightGBM parameters for a binary objective scored by AUC.
///
/// `subsample_freq = 0` leaves bagging off whatever `subsample` says, as in
/// LightGBM itself. Training runs on one thread so a seed fixes the model.
pub fn lightgbm_params(params: &BoosterParams, scale_pos_weight: f64) -> Value {
    json!({
        "objective": "binary",
        "metric": "auc",
        "num_iterations": params.n_estimators,
        "num_leaves": params.num_leaves,
        "learning_rate": params.learning_rate,
        "min_data_in_leaf": params.min_child_samples,
        "bagging_fraction": params.subsample,
        "bagging_freq": params.subsample_freq,
        "feature_fraction": params.colsample_bytree,
        "scale_pos_weight": scale_pos_weight,
        "seed": params.seed,
        "num_threads": 1,
        "deterministic": true,
        "verbosity": -1,
    })
}

/// Gradient-boosted tree classifier predicting the probability of class 1.
pub struct GradientBoostingClassifier {
    params: BoosterParams,
    scale_pos_weight: f64,
    n_features: usize,
    booster: Option<Booster>,
}

impl fmt::Debug for GradientBoostingClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradientBoostingClassifier")
            .field("params", &self.params)
            .field("scale_pos_weight", &self.scale_pos_weight)
            .field("n_features", &self.n_features)
            .field("fitted", &self.booster.is_some())
            .finish()
    }
}

impl GradientBoostingClassifier {
    /// Creates an unfitted classifier.
    pub const fn new(params: BoosterParams) -> Self {
        Self {
            params,
            scale_pos_weight: 1.0,
            n_features: 0,
            booster: None,
        }
    }

    /// Sets the weight of positive rows in the loss.
    pub const fn with_scale_pos_weight(mut self, weight: f64) -> Self {
        self.scale_pos_weight = weight;
        self
    }

    /// Fits the ensemble on `x` (rows × features) and 0/1 labels `y`.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::Config`] for invalid hyperparameters,
    /// [`SurpriseError::InvalidData`] on a shape mismatch,
    /// [`SurpriseError::InsufficientData`] for an empty matrix and
    /// [`SurpriseError::Model`] when LightGBM rejects the data.
    pub fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<()> {
        self.params.validate()?;
        let (n_rows, n_features) = x.dim();
        if n_rows != y.len() {
            return Err(SurpriseError::InvalidData(format!(
                "{n_rows} feature rows for {} labels",
                y.len()
            )));
        }
        if n_rows == 0 || n_features == 0 {
            return Err(SurpriseError::InsufficientData(
                "cannot fit on an empty feature matrix".into(),
            ));
        }

        let positives = y.iter().filter(|v| **v == 1).count();
        if positives == 0 || positives == n_rows {
            warn!(rows = n_rows, positives, "training labels contain a single class");
        }

        let flat: Vec<f64> = x.iter().copied().collect();
        let labels: Vec<f32> = y.iter().map(|v| f32::from(*v)).collect();
        let dataset = Dataset::from_slice(&flat, &labels, feature_count(n_features)?, true)
            .map_err(model_error)?;
        let params = lightgbm_params(&self.params, self.scale_pos_weight);
        let booster = Booster::train(dataset, &params).map_err(model_error)?;

        debug!(
            rows = n_rows,
            features = n_features,
            rounds = self.params.n_estimators,
            "boosting finished"
        );
        self.n_features = n_features;
        self.booster = Some(booster);
        Ok(())
    }

    fn fitted(&self, x: ArrayView2<'_, f64>) -> Result<&Booster> {
        let booster = self
            .booster
            .as_ref()
            .ok_or_else(|| SurpriseError::InvalidData("model has not been fitted".into()))?;
        if x.ncols() != self.n_features {
            return Err(SurpriseError::InvalidData(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        Ok(booster)
    }

    /// Probability of class 1 for every row.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::InvalidData`] before fitting or on a feature
    /// count mismatch, and [`SurpriseError::Model`] if prediction fails.
    pub fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        let booster = self.fitted(x)?;
        if x.nrows() == 0 {
            return Ok(Vec::new());
        }
        let flat: Vec<f64> = x.iter().copied().collect();
        booster
            .predict(&flat, feature_count(self.n_features)?, true)
            .map_err(model_error)
    }

    /// Class predictions: 1 when the probability exceeds 0.5.
    ///
    /// # Errors
    ///
    /// See [`Self::predict_proba`].
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }

    /// Number of splits using each feature, summed over all trees.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::InvalidData`] before fitting and
    /// [`SurpriseError::Model`] if LightGBM cannot report importances.
    pub fn feature_importances(&self) -> Result<Vec<usize>> {
        let booster = self
            .booster
            .as_ref()
            .ok_or_else(|| SurpriseError::InvalidData("model has not been fitted".into()))?;
        let counts = booster
            .feature_importance(ImportanceType::Split)
            .map_err(model_error)?;
        Ok(counts.into_iter().map(|c| c.max(0.0).round() as usize).collect())
    }

    /// Hyperparameters.
    pub const fn params(&self) -> &BoosterParams {
        &self.params
    }

    /// Weight applied to positive rows.
    pub const fn scale_pos_weight(&self) -> f64 {
        self.scale_pos_weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn small_params(n_estimators: usize) -> BoosterParams {
        BoosterParams {
            n_estimators,
            num_leaves: 4,
            learning_rate: 0.1,
            min_child_samples: 5,
            ..BoosterParams::default()
        }
    }

    /// Label is 1 when feature 0 is above 0.7; feature 1 is noise.
    fn threshold_data(n: usize) -> (Array2<f64>, Vec<u8>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 {
                i as f64 / n as f64
            } else {
                ((i * 7919) % 13) as f64
            }
        });
        let y = (0..n).map(|i| u8::from(i as f64 / n as f64 > 0.7)).collect();
        (x, y)
    }

    #[test]
    fn test_lightgbm_params() {
        let params = lightgbm_params(&BoosterParams::default(), 19.0);
        assert_eq!(params["objective"], "binary");
        assert_eq!(params["num_iterations"], 377);
        assert_eq!(params["num_leaves"], 20);
        assert_eq!(params["min_data_in_leaf"], 57);
        assert_eq!(params["bagging_freq"], 0);
        assert_eq!(params["scale_pos_weight"], 19.0);
        assert_eq!(params["seed"], 42);
        assert_eq!(params["learning_rate"], 0.013_832_094_546_570_485);
    }

    #[test]
    fn test_learns_threshold() {
        let (x, y) = threshold_data(200);
        let mut model = GradientBoostingClassifier::new(small_params(100));
        model.fit(x.view(), &y).unwrap();

        let proba = model.predict_proba(x.view()).unwrap();
        assert_eq!(proba.len(), 200);
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        let predicted = model.predict(x.view()).unwrap();
        let correct = predicted.iter().zip(&y).filter(|(p, t)| p == t).count();
        assert!(correct >= 190, "correct: {correct}");

        let importances = model.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        assert!(importances[0] > 0);
    }

    #[test]
    fn test_missing_values_are_accepted() {
        let (mut x, y) = threshold_data(200);
        for i in (0..200).step_by(9) {
            x[[i, 1]] = f64::NAN;
        }
        let mut model = GradientBoostingClassifier::new(small_params(30));
        model.fit(x.view(), &y).unwrap();
        let proba = model.predict_proba(x.view()).unwrap();
        assert!(proba.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_deterministic_with_sampling() {
        let (x, y) = threshold_data(150);
        let params = BoosterParams {
            subsample: 0.8,
            subsample_freq: 1,
            colsample_bytree: 0.5,
            ..small_params(20)
        };
        let mut a = GradientBoostingClassifier::new(params.clone());
        let mut b = GradientBoostingClassifier::new(params);
        a.fit(x.view(), &y).unwrap();
        b.fit(x.view(), &y).unwrap();
        assert_eq!(a.predict_proba(x.view()).unwrap(), b.predict_proba(x.view()).unwrap());
    }

    #[test]
    fn test_scale_pos_weight_raises_positive_scores() {
        // Labels are independent of the feature, so every leaf stays mixed.
        let x = Array2::from_shape_fn((400, 1), |(i, _)| (i % 10) as f64);
        let y: Vec<u8> = (0..400).map(|i| u8::from(i % 4 == 0)).collect();
        let mut plain = GradientBoostingClassifier::new(small_params(30));
        let mut weighted =
            GradientBoostingClassifier::new(small_params(30)).with_scale_pos_weight(3.0);
        plain.fit(x.view(), &y).unwrap();
        weighted.fit(x.view(), &y).unwrap();

        let mean = |p: Vec<f64>| p.iter().sum::<f64>() / p.len() as f64;
        let p = mean(plain.predict_proba(x.view()).unwrap());
        let w = mean(weighted.predict_proba(x.view()).unwrap());
        assert!(w > p, "weighted {w} vs plain {p}");
    }

    #[test]
    fn test_errors() {
        let model = GradientBoostingClassifier::new(small_params(5));
        let x = Array2::<f64>::zeros((3, 2));
        assert!(model.predict(x.view()).is_err());
        assert!(model.feature_importances().is_err());

        let mut model = GradientBoostingClassifier::new(small_params(5));
        assert!(matches!(
            model.fit(x.view(), &[0, 1]),
            Err(SurpriseError::InvalidData(_))
        ));
        assert!(matches!(
            model.fit(Array2::<f64>::zeros((0, 2)).view(), &[]),
            Err(SurpriseError::InsufficientData(_))
        ));

        let invalid = BoosterParams {
            num_leaves: 1,
            ..small_params(5)
        };
        let mut model = GradientBoostingClassifier::new(invalid);
        assert!(matches!(
            model.fit(x.view(), &[0, 1, 0]),
            Err(SurpriseError::Config(_))
        ));
    }
}
