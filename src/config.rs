use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{BillingError, Result};

/// longest loan term accepted, in days
pub const MAX_TERM_DAYS: u64 = 3_650;

/// finest rate granularity accepted (4 places, one basis point)
pub const MAX_RATE_DP: u32 = 4;

/// billing configuration for a weekly-installment product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingConfig {
    pub interest_rate: Rate,
    pub installment_count: u32,
    pub installment_period_days: u32,
    /// missed installments needed before a loan counts as delinquent
    pub delinquency_threshold: u32,
    /// fractional digits accepted on a principal (minor currency units)
    pub currency_scale: u32,
}

impl BillingConfig {
    /// 10% flat, 50 weekly installments, delinquent after 2 misses
    pub fn weekly_flat() -> Self {
        Self {
            interest_rate: Rate::from_percentage(10),
            installment_count: 50,
            installment_period_days: 7,
            delinquency_threshold: 2,
            currency_scale: 2,
        }
    }

    pub fn with_interest_rate(mut self, rate: Rate) -> Self {
        self.interest_rate = rate;
        self
    }

    pub fn with_installments(mut self, count: u32, period_days: u32) -> Self {
        self.installment_count = count;
        self.installment_period_days = period_days;
        self
    }

    pub fn with_delinquency_threshold(mut self, threshold: u32) -> Self {
        self.delinquency_threshold = threshold;
        self
    }

    /// load from a json document, validating it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BillingConfig = serde_json::from_str(json).map_err(|e| {
            BillingError::InvalidConfiguration {
                message: e.to_string(),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interest_rate.is_negative() {
            return Err(BillingError::InvalidConfiguration {
                message: format!("interest rate must not be negative, got {}", self.interest_rate),
            });
        }
        if self.interest_rate.as_decimal().normalize().scale() > MAX_RATE_DP {
            return Err(BillingError::InvalidConfiguration {
                message: format!(
                    "interest rate {} is finer than {} decimal places",
                    self.interest_rate.as_decimal(),
                    MAX_RATE_DP
                ),
            });
        }
        if self.installment_count == 0 {
            return Err(BillingError::InvalidConfiguration {
                message: "installment count must be at least 1".to_string(),
            });
        }
        if self.installment_period_days == 0 {
            return Err(BillingError::InvalidConfiguration {
                message: "installment period must be at least 1 day".to_string(),
            });
        }
        let term_days = self.installment_count as u64 * self.installment_period_days as u64;
        if term_days > MAX_TERM_DAYS {
            return Err(BillingError::InvalidConfiguration {
                message: format!("loan term of {} days exceeds {} days", term_days, MAX_TERM_DAYS),
            });
        }
        if self.delinquency_threshold == 0 {
            return Err(BillingError::InvalidConfiguration {
                message: "delinquency threshold must be at least 1".to_string(),
            });
        }
        // a 4-digit principal split 50 ways still fits in 8 places
        if self.currency_scale > 4 {
            return Err(BillingError::InvalidConfiguration {
                message: format!("currency scale {} exceeds 4 digits", self.currency_scale),
            });
        }
        Ok(())
    }

    /// spacing between two consecutive due dates
    pub fn period(&self) -> Duration {
        Duration::days(self.installment_period_days as i64)
    }

    /// whole loan term, start to end date
    pub fn term(&self) -> Duration {
        Duration::days(self.installment_period_days as i64 * self.installment_count as i64)
    }

    /// total owed for a principal under flat interest
    pub fn total_amount(&self, principal: Money) -> Money {
        principal.with_flat_interest(self.interest_rate)
    }

    /// per-installment amount for a total
    pub fn installment_amount(&self, total: Money) -> Money {
        total / Decimal::from(self.installment_count)
    }

    pub fn is_delinquent(&self, missed_count: u32) -> bool {
        missed_count >= self.delinquency_threshold
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self::weekly_flat()
    }
}
