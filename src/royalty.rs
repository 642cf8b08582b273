// src/royalty.rs - Revenue split arithmetic
use serde::Serialize;

use crate::models::LicensingTerms;

pub const DEFAULT_CREATOR_SHARE: f64 = 0.7;
pub const DEFAULT_PLATFORM_FEE: f64 = 0.1;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RoyaltySplit {
    pub creator: f64,
    pub licensee: f64,
    pub platform: f64,
}

/// Splits revenue into creator/licensee/platform shares. The platform fee
/// comes off the top; creator and licensee divide the remainder. Shares are
/// taken on trust; callers keep `creator_share + platform_fee` sane.
pub fn split_revenue(
    total_revenue: f64,
    _terms: &LicensingTerms,
    creator_share: f64,
    platform_fee: f64,
) -> RoyaltySplit {
    let platform = total_revenue * platform_fee;
    let remaining = total_revenue - platform;

    RoyaltySplit {
        creator: remaining * creator_share,
        licensee: remaining * (1.0 - creator_share),
        platform,
    }
}

pub fn split_revenue_default(total_revenue: f64, terms: &LicensingTerms) -> RoyaltySplit {
    split_revenue(total_revenue, terms, DEFAULT_CREATOR_SHARE, DEFAULT_PLATFORM_FEE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UsageRights;

    fn terms() -> LicensingTerms {
        LicensingTerms {
            usage_rights: UsageRights::Commercial,
            derivatives: false,
            territory: vec!["US".to_string()],
            duration: 365,
            price: 1000.0,
        }
    }

    #[test]
    fn default_split_of_1000() {
        let split = split_revenue_default(1000.0, &terms());

        assert_eq!(split.platform, 100.0);
        assert_eq!(split.creator, 630.0);
        assert_eq!(split.licensee, 270.0);
    }

    #[test]
    fn shares_always_sum_to_total() {
        for total in [0.0, 1.0, 333.33, 1000.0, 99999.99] {
            let split = split_revenue(total, &terms(), 0.7, 0.1);
            let sum = split.creator + split.licensee + split.platform;
            assert!((sum - total).abs() < 1e-9, "sum {} != total {}", sum, total);
        }
    }

    #[test]
    fn custom_shares_are_respected() {
        let split = split_revenue(500.0, &terms(), 0.5, 0.2);

        assert_eq!(split.platform, 100.0);
        assert_eq!(split.creator, 200.0);
        assert_eq!(split.licensee, 200.0);
    }
}
