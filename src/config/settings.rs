#[derive(Debug, Clone)]
pub struct RatingSettings {
    pub default_rating: i32,
    pub k_factor: f64,
    pub rating_floor: i32,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            default_rating: 1500,
            k_factor: 32.0,
            rating_floor: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatsSettings {
    pub recent_form_games: usize,
    pub trend_window: usize,
    /// Rebuild the whole group after a recorded result is edited or deleted.
    pub recalculate_on_correction: bool,
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self {
            recent_form_games: 5,
            trend_window: 3,
            recalculate_on_correction: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub database_path: String,
    pub admin_token: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "shuttle_ranking.db".to_string()),
            admin_token: std::env::var("ADMIN_TOKEN").unwrap_or_else(|_| "secret".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rating: RatingSettings,
    pub stats: StatsSettings,
    pub server: ServerSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            rating: RatingSettings::default(),
            stats: StatsSettings::default(),
            server: ServerSettings::default(),
        }
    }
}
