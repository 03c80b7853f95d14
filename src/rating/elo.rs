use crate::config::settings::RatingSettings;

/// Probability that a side rated `rating` beats a side rated `opponent_rating`.
/// E = 1 / (1 + 10^((opponent - rating) / 400))
pub fn expected_score(rating: f64, opponent_rating: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent_rating - rating) / 400.0))
}

/// newRating = round(rating + K * (actual - expected)), floored.
pub fn updated_rating(rating: f64, opponent_rating: f64, won: bool, config: &RatingSettings) -> i32 {
    let expected = expected_score(rating, opponent_rating);
    let actual = if won { 1.0 } else { 0.0 };
    let new_rating = (rating + config.k_factor * (actual - expected)).round() as i32;
    new_rating.max(config.rating_floor)
}

/// Mean of the teammates' ratings; an empty team rates as the default.
pub fn team_rating(ratings: &[i32], config: &RatingSettings) -> f64 {
    if ratings.is_empty() {
        return config.default_rating as f64;
    }
    let sum: f64 = ratings.iter().map(|&r| r as f64).sum();
    sum / ratings.len() as f64
}

/// The change a whole side receives, computed on team averages.
pub fn team_delta(team: f64, opponent_team: f64, won: bool, config: &RatingSettings) -> f64 {
    updated_rating(team, opponent_team, won, config) as f64 - team
}

/// Applies a shared team delta to one player's own rating.
pub fn personal_rating(own_rating: i32, delta: f64, config: &RatingSettings) -> i32 {
    let new_rating = (own_rating as f64 + delta).round() as i32;
    new_rating.max(config.rating_floor)
}
