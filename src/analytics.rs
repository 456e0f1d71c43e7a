//! Chart-ready aggregations over a user's rating list.
//!
//! Everything here is a pure transform: the rating list and the evaluation
//! instant come in as arguments and nothing is read from ambient state, so
//! the same inputs always produce the same summaries. Absent or empty
//! input degrades to empty output, never an error.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::models::RatedMovie;

/// How far back the engagement chart looks, in days
const ENGAGEMENT_WINDOW_DAYS: i64 = 30;

/// Maximum number of active dates kept in the engagement chart
const ENGAGEMENT_MAX_DATES: usize = 14;

/// Per-genre rating summary
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenrePreference {
    pub genre: String,
    /// Number of rated movies in this genre
    pub preference: u64,
    /// Mean rating, rounded to one decimal place
    pub avg_rating: f64,
}

/// One star bucket of the rating distribution
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RatingBucket {
    /// Display label, e.g. "4 ★"
    pub stars: String,
    pub count: u64,
}

/// Rating activity on one calendar date
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyEngagement {
    pub date: NaiveDate,
    pub ratings: u64,
}

/// The three chart datasets for one user
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalyticsSummary {
    pub genres: Vec<GenrePreference>,
    pub ratings: Vec<RatingBucket>,
    pub engagement: Vec<DailyEngagement>,
}

/// Computes all three chart datasets from a user's ratings
pub fn compute_summary(ratings: &[RatedMovie], now: DateTime<Utc>) -> AnalyticsSummary {
    AnalyticsSummary {
        genres: genre_preferences(ratings),
        ratings: rating_distribution(ratings),
        engagement: engagement_over_time(ratings, now),
    }
}

/// Groups ratings by genre, preserving first-occurrence order.
///
/// The genre set is dynamic, driven entirely by the input; genres are not
/// sorted, so the chart is stable across recomputations of the same list.
pub fn genre_preferences(ratings: &[RatedMovie]) -> Vec<GenrePreference> {
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, (u64, i64)> = HashMap::new();

    for rated in ratings {
        let genre = rated.movie.genre.as_str();
        let entry = totals.entry(genre).or_insert_with(|| {
            order.push(genre);
            (0, 0)
        });
        entry.0 += 1;
        entry.1 += i64::from(rated.rating);
    }

    order
        .into_iter()
        .map(|genre| {
            let (count, total) = totals[genre];
            GenrePreference {
                genre: genre.to_string(),
                preference: count,
                avg_rating: round_one_decimal(total as f64 / count as f64),
            }
        })
        .collect()
}

/// Buckets ratings into the five star values.
///
/// All five buckets are always present, in ascending star order, even when
/// some counts are zero.
pub fn rating_distribution(ratings: &[RatedMovie]) -> Vec<RatingBucket> {
    let mut counts = [0u64; 5];
    for rated in ratings {
        if (1..=5).contains(&rated.rating) {
            counts[(rated.rating - 1) as usize] += 1;
        }
    }

    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| RatingBucket {
            stars: format!("{} ★", i + 1),
            count,
        })
        .collect()
}

/// Counts ratings per UTC calendar date over the trailing 30 days.
///
/// Ratings older than the window are excluded before grouping; of the
/// dates that remain, only the most recent 14 with any activity are kept.
/// Sparse activity therefore yields fewer than 14 points rather than a
/// wider window.
pub fn engagement_over_time(ratings: &[RatedMovie], now: DateTime<Utc>) -> Vec<DailyEngagement> {
    let cutoff = now - Duration::days(ENGAGEMENT_WINDOW_DAYS);

    let mut by_date: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for rated in ratings {
        if rated.created_at >= cutoff {
            *by_date.entry(rated.created_at.date_naive()).or_insert(0) += 1;
        }
    }

    let skip = by_date.len().saturating_sub(ENGAGEMENT_MAX_DATES);
    by_date
        .into_iter()
        .skip(skip)
        .map(|(date, count)| DailyEngagement {
            date,
            ratings: count,
        })
        .collect()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
