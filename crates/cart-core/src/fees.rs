//! # Fee Schedule
//!
//! Platform and gateway fees deducted from a checkout total before the
//! merchant payout.

use serde::{Deserialize, Serialize};

/// Fee rates applied to a checkout total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// Platform commission as a fraction of the total
    pub platform_rate: f64,
    /// Gateway commission as a fraction of the total
    pub gateway_rate: f64,
    /// Fixed gateway fee per checkout, in major units
    pub gateway_fixed: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            platform_rate: 0.03,
            gateway_rate: 0.029,
            gateway_fixed: 30.0,
        }
    }
}

/// Fees and payout for one checkout, rounded to two decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub total: f64,
    pub platform_fee: f64,
    pub gateway_fee: f64,
    pub merchant_payout: f64,
}

impl FeeSchedule {
    pub fn breakdown(&self, total: f64) -> FeeBreakdown {
        let platform_fee = round2(total * self.platform_rate);
        let gateway_fee = round2(total * self.gateway_rate + self.gateway_fixed);
        FeeBreakdown {
            total: round2(total),
            platform_fee,
            gateway_fee,
            merchant_payout: round2(total - platform_fee - gateway_fee),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
