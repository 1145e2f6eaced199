//! Goal-expectation pricing for association football. Estimates Poisson scoring rates from season
//! form and ball-possession adjusted strength, derives 1X2 and auxiliary markets, flags value
//! against bookmaker odds and calibrates per-team biases from realised results.

pub mod aux_markets;
pub mod backtest;
pub mod calibrator;
pub mod config;
pub mod display;
pub mod domain;
pub mod ensemble;
pub mod estimator;
pub mod factorial;
pub mod file;
pub mod linear;
pub mod lineup;
pub mod market;
pub mod poisson;
pub mod predictor;
pub mod print;
pub mod probs;
pub mod scoregrid;
pub mod store;
pub mod training;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

#[doc = include_str!("../README.md")]
#[cfg(doc)]
fn readme() {}
