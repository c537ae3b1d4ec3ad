//! Visibility prediction from meteorological inputs.
//!
//! A least-squares linear model over (temperature, humidity, wind speed),
//! fitted on historical hourly observations with a shuffled train/test
//! split, scored by R² on the held-out slice, and persisted as JSON.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One hourly observation used for fitting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    /// Air temperature at 2m, °C.
    pub temperature: f64,
    /// Relative humidity at 2m, percent.
    pub humidity: f64,
    /// Wind speed at 10m, km/h.
    pub wind: f64,
    /// Observed visibility in meters (the regression target).
    pub visibility: f64,
}

/// Seed used when the caller has no preference, matching the fixed split of
/// the historical training runs.
pub const DEFAULT_TRAIN_SEED: u64 = 42;

const TEST_FRACTION: f64 = 0.2;
const MIN_SAMPLES: usize = 10;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no trained model available")]
    NotTrained,
    #[error("not enough training samples ({0})")]
    NotEnoughSamples(usize),
    #[error("training data is degenerate; normal equations are singular")]
    SingularSystem,
    #[error("model persistence failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("model serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Fitted model: weights for (intercept, temperature, humidity, wind).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityModel {
    pub weights: [f64; 4],
    pub trained_at: DateTime<Utc>,
    pub samples: usize,
}

/// Fit summary reported back to the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrainReport {
    pub samples: usize,
    /// R² on the held-out test slice.
    pub r2: f64,
}

impl VisibilityModel {
    /// Fit on the given rows. Rows with any non-finite field are dropped;
    /// 20% of the remainder (seeded shuffle) is held out for scoring.
    pub fn fit(rows: &[TrainingRow], seed: u64) -> Result<(Self, TrainReport), ModelError> {
        let rows: Vec<TrainingRow> = rows.iter().copied().filter(row_is_finite).collect();
        if rows.len() < MIN_SAMPLES {
            return Err(ModelError::NotEnoughSamples(rows.len()));
        }

        let mut shuffled = rows.clone();
        let mut rng = StdRng::seed_from_u64(seed);
        shuffled.shuffle(&mut rng);

        // Keep at least 4 training rows for the 4 unknowns.
        let test_len =
            ((shuffled.len() as f64) * TEST_FRACTION).round() as usize;
        let test_len = test_len.clamp(1, shuffled.len() - 4);
        let (test, train) = shuffled.split_at(test_len);

        let weights = solve_least_squares(train)?;
        let model = Self {
            weights,
            trained_at: Utc::now(),
            samples: rows.len(),
        };
        let r2 = r_squared(&model, test);

        Ok((
            model,
            TrainReport {
                samples: rows.len(),
                r2,
            },
        ))
    }

    /// Predicted visibility in meters, rounded to one decimal.
    pub fn predict(&self, temperature: f64, humidity: f64, wind: f64) -> f64 {
        let raw = self.predict_raw(temperature, humidity, wind);
        (raw * 10.0).round() / 10.0
    }

    fn predict_raw(&self, temperature: f64, humidity: f64, wind: f64) -> f64 {
        self.weights[0]
            + self.weights[1] * temperature
            + self.weights[2] * humidity
            + self.weights[3] * wind
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a previously saved model. A missing file means the model has
    /// simply never been trained, reported distinctly from I/O failures.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotTrained);
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn row_is_finite(row: &TrainingRow) -> bool {
    row.temperature.is_finite()
        && row.humidity.is_finite()
        && row.wind.is_finite()
        && row.visibility.is_finite()
}

/// Ordinary least squares over (1, temperature, humidity, wind) via the
/// normal equations.
fn solve_least_squares(rows: &[TrainingRow]) -> Result<[f64; 4], ModelError> {
    let mut xtx = [[0.0f64; 4]; 4];
    let mut xty = [0.0f64; 4];

    for row in rows {
        let x = [1.0, row.temperature, row.humidity, row.wind];
        for i in 0..4 {
            xty[i] += x[i] * row.visibility;
            for j in 0..4 {
                xtx[i][j] += x[i] * x[j];
            }
        }
    }

    solve_4x4(xtx, xty).ok_or(ModelError::SingularSystem)
}

/// Gaussian elimination with partial pivoting.
fn solve_4x4(mut a: [[f64; 4]; 4], mut b: [f64; 4]) -> Option<[f64; 4]> {
    let scale = a
        .iter()
        .flatten()
        .fold(0.0f64, |acc, value| acc.max(value.abs()))
        .max(1.0);
    let eps = 1e-12 * scale;

    for col in 0..4 {
        let mut pivot = col;
        for row in (col + 1)..4 {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        if a[pivot][col].abs() < eps {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..4 {
            let factor = a[row][col] / a[col][col];
            for k in col..4 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0f64; 4];
    for col in (0..4).rev() {
        let mut sum = b[col];
        for k in (col + 1)..4 {
            sum -= a[col][k] * x[k];
        }
        x[col] = sum / a[col][col];
    }

    if x.iter().all(|value| value.is_finite()) {
        Some(x)
    } else {
        None
    }
}

fn r_squared(model: &VisibilityModel, rows: &[TrainingRow]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let mean = rows.iter().map(|row| row.visibility).sum::<f64>() / rows.len() as f64;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for row in rows {
        let predicted = model.predict_raw(row.temperature, row.humidity, row.wind);
        ss_res += (row.visibility - predicted).powi(2);
        ss_tot += (row.visibility - mean).powi(2);
    }

    if ss_tot <= f64::EPSILON {
        if ss_res <= f64::EPSILON {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}
