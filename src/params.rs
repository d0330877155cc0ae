// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::Deserialize;
use serde::Serialize;

use crate::error::SchedulerError;
use crate::fsrs::DEFAULT_WEIGHTS;
use crate::fsrs::MAX_STABILITY;
use crate::fsrs::R;
use crate::fsrs::WEIGHT_BOUNDS;
use crate::fsrs::WEIGHT_COUNT;
use crate::fsrs::Weights;

pub const DEFAULT_REQUEST_RETENTION: R = 0.9;
pub const DEFAULT_MAXIMUM_INTERVAL: u32 = 36500;
pub const DEFAULT_LEARNING_STEPS: [f64; 2] = [1.0, 10.0];
pub const DEFAULT_RELEARNING_STEPS: [f64; 1] = [10.0];
/// No interval may exceed the largest stability the model represents.
pub const MAX_MAXIMUM_INTERVAL: u32 = MAX_STABILITY as u32;
/// The longest step: the same span as the longest interval.
pub const MAX_STEP_MINUTES: f64 = MAX_STABILITY * 1440.0;

/// A validated, immutable scheduler configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameters {
    weights: Weights,
    request_retention: R,
    maximum_interval: u32,
    enable_fuzz: bool,
    fuzz_scale: f64,
    enable_short_term: bool,
    learning_steps: Vec<f64>,
    relearning_steps: Vec<f64>,
}

impl Parameters {
    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// The target probability of recall at the due date.
    pub fn request_retention(&self) -> R {
        self.request_retention
    }

    /// The longest interval the scheduler will produce, in days.
    pub fn maximum_interval(&self) -> u32 {
        self.maximum_interval
    }

    pub fn enable_fuzz(&self) -> bool {
        self.enable_fuzz
    }

    pub fn fuzz_scale(&self) -> f64 {
        self.fuzz_scale
    }

    pub fn enable_short_term(&self) -> bool {
        self.enable_short_term
    }

    /// Learning step durations, in minutes.
    pub fn learning_steps(&self) -> &[f64] {
        &self.learning_steps
    }

    /// Relearning step durations, in minutes.
    pub fn relearning_steps(&self) -> &[f64] {
        &self.relearning_steps
    }

    pub fn to_config(&self) -> ParameterConfig {
        ParameterConfig {
            weights: Some(self.weights.to_vec()),
            request_retention: Some(self.request_retention),
            maximum_interval: Some(self.maximum_interval as i64),
            enable_fuzz: Some(self.enable_fuzz),
            fuzz_scale: Some(self.fuzz_scale),
            enable_short_term: Some(self.enable_short_term),
            learning_steps: Some(self.learning_steps.clone()),
            relearning_steps: Some(self.relearning_steps.clone()),
        }
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            request_retention: DEFAULT_REQUEST_RETENTION,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
            enable_fuzz: false,
            fuzz_scale: 1.0,
            enable_short_term: false,
            learning_steps: DEFAULT_LEARNING_STEPS.to_vec(),
            relearning_steps: DEFAULT_RELEARNING_STEPS.to_vec(),
        }
    }
}

/// The unvalidated shape of the parameters, as written in a configuration
/// file. Missing fields take their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterConfig {
    pub weights: Option<Vec<f64>>,
    pub request_retention: Option<f64>,
    pub maximum_interval: Option<i64>,
    pub enable_fuzz: Option<bool>,
    pub fuzz_scale: Option<f64>,
    pub enable_short_term: Option<bool>,
    pub learning_steps: Option<Vec<f64>>,
    pub relearning_steps: Option<Vec<f64>>,
}

impl TryFrom<ParameterConfig> for Parameters {
    type Error = SchedulerError;

    fn try_from(config: ParameterConfig) -> Result<Self, Self::Error> {
        let defaults = Parameters::default();

        let weights: Weights = match config.weights {
            None => defaults.weights,
            Some(weights) => {
                let weights: Weights = weights.try_into().map_err(|w: Vec<f64>| {
                    invalid(format!(
                        "expected {WEIGHT_COUNT} weights, found {}",
                        w.len()
                    ))
                })?;
                for (i, (w, (lo, hi))) in weights.iter().zip(WEIGHT_BOUNDS).enumerate() {
                    if !w.is_finite() {
                        return Err(invalid(format!("weight w{i} is not finite: {w}")));
                    }
                    if !(lo..=hi).contains(w) {
                        return Err(invalid(format!(
                            "weight w{i} must be in [{lo}, {hi}], found {w}"
                        )));
                    }
                }
                weights
            }
        };

        let request_retention = config
            .request_retention
            .unwrap_or(defaults.request_retention);
        if !(request_retention > 0.0 && request_retention < 1.0) {
            return Err(invalid(format!(
                "request_retention must be in (0, 1), found {request_retention}"
            )));
        }

        let maximum_interval = match config.maximum_interval {
            None => defaults.maximum_interval,
            Some(m) if m <= 0 => {
                return Err(invalid(format!(
                    "maximum_interval must be positive, found {m}"
                )));
            }
            Some(m) if m > MAX_MAXIMUM_INTERVAL as i64 => {
                return Err(invalid(format!(
                    "maximum_interval must be at most {MAX_MAXIMUM_INTERVAL}, found {m}"
                )));
            }
            Some(m) => m as u32,
        };

        let fuzz_scale = config.fuzz_scale.unwrap_or(defaults.fuzz_scale);
        if !(fuzz_scale.is_finite() && fuzz_scale >= 0.0) {
            return Err(invalid(format!(
                "fuzz_scale must be a non-negative number, found {fuzz_scale}"
            )));
        }

        let learning_steps = config.learning_steps.unwrap_or(defaults.learning_steps);
        validate_steps("learning_steps", &learning_steps)?;
        let relearning_steps = config
            .relearning_steps
            .unwrap_or(defaults.relearning_steps);
        validate_steps("relearning_steps", &relearning_steps)?;

        Ok(Self {
            weights,
            request_retention,
            maximum_interval,
            enable_fuzz: config.enable_fuzz.unwrap_or(defaults.enable_fuzz),
            fuzz_scale,
            enable_short_term: config
                .enable_short_term
                .unwrap_or(defaults.enable_short_term),
            learning_steps,
            relearning_steps,
        })
    }
}

fn validate_steps(name: &str, steps: &[f64]) -> Result<(), SchedulerError> {
    for step in steps {
        if !(step.is_finite() && *step > 0.0 && *step <= MAX_STEP_MINUTES) {
            return Err(invalid(format!(
                "{name} must be positive durations of at most {MAX_STEP_MINUTES} minutes, found {step}"
            )));
        }
    }
    Ok(())
}

fn invalid(message: String) -> SchedulerError {
    SchedulerError::InvalidParameter(message)
}
