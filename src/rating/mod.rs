pub mod elo;
pub mod types;

pub use elo::{expected_score, personal_rating, team_delta, team_rating, updated_rating};
pub use types::{CounterReversal, FailedUpdate, RatingUpdate, ReversalResult, UpdateResult};
