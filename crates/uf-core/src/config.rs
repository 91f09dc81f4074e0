//! Configuration for one unfolding pass.
//!
//! All scalar knobs the UI/CLI collaborator exposes are collected here and
//! validated up front, before any binning or matrix work begins.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Smallest accepted per-dimension bin count.
pub const MIN_BIN_COUNT: usize = 2;

/// Largest accepted per-dimension bin count.
///
/// The regularization builder is O(binCount^2 * dims); this bound keeps the
/// total bin count (`bins^dims`) in the low thousands for practical `dims`.
pub const MAX_BIN_COUNT: usize = 200;

/// How the sample domain is partitioned into bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinningPolicy {
    /// Uniform grid of `bins^dims` cells.
    Static,
    /// Iterative refinement from a single cell, splitting the most
    /// populated slab each round.
    Dynamic,
    /// Static seed at roughly a third of the requested count, then dynamic
    /// refinement for the remainder.
    Hybrid,
}

impl FromStr for BinningPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "static" => Ok(Self::Static),
            "dynamic" => Ok(Self::Dynamic),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(Error::Configuration(format!(
                "unknown binning policy '{other}' (expected static, dynamic or hybrid)"
            ))),
        }
    }
}

/// Where a dynamic refinement round places the split coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CenterPolicy {
    /// Midpoint of the selected slab's span.
    SpanMidpoint,
    /// Median of the member samples' coordinate along the split dimension.
    SampleMedian,
}

impl FromStr for CenterPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "midpoint" | "span_midpoint" => Ok(Self::SpanMidpoint),
            "median" | "sample_median" => Ok(Self::SampleMedian),
            other => Err(Error::Configuration(format!(
                "unknown center policy '{other}' (expected midpoint or median)"
            ))),
        }
    }
}

/// Which smoothness prior the regularization matrix encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegularizationPolicy {
    /// Discrete Laplacian over bin adjacency: -1 off-diagonal, neighbor
    /// count on the diagonal.
    BinaryAdjacency,
    /// Off-diagonal weight = number of a bin's samples whose paired vector
    /// lands in the neighbor's box.
    StatisticalProximity,
    /// Off-diagonal weight = inverse Euclidean distance between the two
    /// bins' sample centroids.
    MassCenterProximity,
}

impl FromStr for RegularizationPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "binary" | "binary_adjacency" => Ok(Self::BinaryAdjacency),
            "statistical" | "statistical_proximity" => Ok(Self::StatisticalProximity),
            "mass-center" | "mass_center" | "mass_center_proximity" => {
                Ok(Self::MassCenterProximity)
            }
            other => Err(Error::Configuration(format!(
                "unknown regularization policy '{other}' (expected binary, statistical or mass-center)"
            ))),
        }
    }
}

/// Scalar parameters for one unfolding pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnfoldingConfig {
    /// Requested per-dimension bin count (`MIN_BIN_COUNT..=MAX_BIN_COUNT`).
    pub bins: usize,

    /// Active dimensionality (>= 1; small, <= 3 in practice).
    pub dims: usize,

    /// Dimension rotation offset applied when selecting active columns
    /// from higher-dimensional input.
    pub dim_shift: usize,

    /// Binning policy.
    pub binning: BinningPolicy,

    /// Split-coordinate policy for dynamic refinement.
    pub center: CenterPolicy,

    /// Smoothness prior for the regularization matrix.
    pub regularization: RegularizationPolicy,

    /// Tikhonov regularization strength (finite, >= 0).
    pub alpha: f64,
}

impl Default for UnfoldingConfig {
    fn default() -> Self {
        Self {
            bins: 10,
            dims: 1,
            dim_shift: 0,
            binning: BinningPolicy::Static,
            center: CenterPolicy::SpanMidpoint,
            regularization: RegularizationPolicy::BinaryAdjacency,
            alpha: 1e-3,
        }
    }
}

impl UnfoldingConfig {
    /// Validate all scalar parameters. Called before any matrix work.
    pub fn validate(&self) -> Result<()> {
        if self.bins < MIN_BIN_COUNT {
            return Err(Error::Configuration(format!(
                "bin count {} below minimum {}",
                self.bins, MIN_BIN_COUNT
            )));
        }
        if self.bins > MAX_BIN_COUNT {
            return Err(Error::Configuration(format!(
                "bin count {} above maximum {}",
                self.bins, MAX_BIN_COUNT
            )));
        }
        if self.dims == 0 {
            return Err(Error::Configuration("dimensionality must be >= 1".to_string()));
        }
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(Error::Configuration(format!(
                "alpha must be finite and >= 0, got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(UnfoldingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bin_count_bounds() {
        let mut cfg = UnfoldingConfig::default();
        cfg.bins = 1;
        assert!(matches!(cfg.validate(), Err(Error::Configuration(_))));
        cfg.bins = MAX_BIN_COUNT + 1;
        assert!(matches!(cfg.validate(), Err(Error::Configuration(_))));
        cfg.bins = MAX_BIN_COUNT;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_dims_rejected() {
        let cfg = UnfoldingConfig { dims: 0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_alpha_rejected_when_negative_or_nan() {
        let cfg = UnfoldingConfig { alpha: -0.5, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = UnfoldingConfig { alpha: f64::NAN, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("hybrid".parse::<BinningPolicy>().unwrap(), BinningPolicy::Hybrid);
        assert_eq!("median".parse::<CenterPolicy>().unwrap(), CenterPolicy::SampleMedian);
        assert_eq!(
            "mass-center".parse::<RegularizationPolicy>().unwrap(),
            RegularizationPolicy::MassCenterProximity
        );
        assert!("bogus".parse::<BinningPolicy>().is_err());
    }

    #[test]
    fn test_config_serde_round_trip() {
        let cfg = UnfoldingConfig { binning: BinningPolicy::Hybrid, ..Default::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: UnfoldingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.binning, BinningPolicy::Hybrid);
        assert_eq!(back.bins, cfg.bins);
    }
}
