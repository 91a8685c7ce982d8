use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{ReviewId, UserId};

/// Aggregated review score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratings {
    pub average: f64,
    pub count: u64,
}

/// A purchaser's review embedded in the product document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub user: UserId,
    /// 1..=5
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_verified_purchase: bool,
}

/// Mean rating rounded to one decimal (half away from zero), plus the count.
pub fn recompute_ratings(reviews: &[Review]) -> Ratings {
    if reviews.is_empty() {
        return Ratings::default();
    }

    let total: u64 = reviews.iter().map(|r| u64::from(r.rating)).sum();
    let count = reviews.len() as u64;
    // Work in tenths to avoid float drift in the rounding step.
    let tenths = (total * 10 * 2 + count) / (count * 2);

    Ratings {
        average: tenths as f64 / 10.0,
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn review(rating: u8) -> Review {
        Review {
            id: ReviewId::new(),
            user: UserId::new(),
            rating,
            comment: String::new(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            is_verified_purchase: false,
        }
    }

    #[test]
    fn empty_reviews_give_zero() {
        assert_eq!(recompute_ratings(&[]), Ratings { average: 0.0, count: 0 });
    }

    #[test]
    fn average_is_rounded_to_one_decimal() {
        let reviews = vec![review(5), review(4), review(4)];
        // 13 / 3 = 4.333..
        assert_eq!(recompute_ratings(&reviews), Ratings { average: 4.3, count: 3 });

        let reviews = vec![review(5), review(4), review(5)];
        // 14 / 3 = 4.666..
        assert_eq!(recompute_ratings(&reviews).average, 4.7);
    }

    #[test]
    fn halves_round_up() {
        // 0.25 steps: 4.25 -> 4.3
        let reviews = vec![review(5), review(4), review(4), review(4)];
        assert_eq!(recompute_ratings(&reviews).average, 4.3);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig { cases: 128, ..ProptestConfig::default() })]

            #[test]
            fn average_is_bounded_and_matches_rounded_mean(ratings in prop::collection::vec(1u8..=5, 0..40)) {
                let reviews: Vec<Review> = ratings.iter().copied().map(review).collect();
                let out = recompute_ratings(&reviews);

                prop_assert_eq!(out.count, ratings.len() as u64);
                prop_assert!((0.0..=5.0).contains(&out.average));

                if ratings.is_empty() {
                    prop_assert_eq!(out.average, 0.0);
                } else {
                    let mean = ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64;
                    prop_assert!((out.average - mean).abs() <= 0.05 + 1e-9);
                }
            }
        }
    }
}
