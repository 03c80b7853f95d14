//! Console rendering for the CLI.

use colored::*;

use crate::domain::{LeaderboardEntry, Outcome, PlayerDetailedStats, Trend};

fn form(outcomes: &[Outcome]) -> String {
    outcomes
        .iter()
        .map(|o| match o {
            Outcome::Win => o.as_str().green().to_string(),
            Outcome::Loss => o.as_str().red().to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn trend(trend: Trend) -> ColoredString {
    match trend {
        Trend::Up => "▲".green(),
        Trend::Down => "▼".red(),
        Trend::Stable => "•".normal(),
    }
}

pub fn leaderboard_table(entries: &[LeaderboardEntry]) -> String {
    if entries.is_empty() {
        return "No players in this group yet".yellow().to_string();
    }

    let mut lines = vec![format!(
        "{:>4}  {:<20} {:>6} {:>5} {:>4} {:>4} {:>6}  {}",
        "#", "Player", "ELO", "GP", "W", "L", "Win%", "Form"
    )
    .bold()
    .to_string()];

    for entry in entries {
        lines.push(format!(
            "{:>4}  {:<20} {:>6} {:>5} {:>4} {:>4} {:>5.1}%  {} {}",
            entry.rank,
            entry.name,
            entry.elo_rating,
            entry.total_games,
            entry.wins,
            entry.losses,
            entry.win_rate,
            form(&entry.recent_form),
            trend(entry.trend)
        ));
    }

    lines.join("\n")
}

pub fn player_summary(stats: &PlayerDetailedStats) -> String {
    let streak = match stats.current_streak {
        0 => "-".to_string(),
        s if s > 0 => format!("W{}", s).green().to_string(),
        s => format!("L{}", -s).red().to_string(),
    };

    let mut lines = vec![
        format!("{} ({})", stats.name.bold(), stats.player_id),
        format!(
            "  Rank {}/{}  ELO {} {}",
            stats.rank,
            stats.total_players,
            stats.elo_rating,
            trend(stats.trend)
        ),
        format!(
            "  {} games, {}-{} ({:.1}%), streak {}",
            stats.total_games, stats.wins, stats.losses, stats.win_rate, streak
        ),
        format!(
            "  Points {} for, {} against ({:+}), {} sessions",
            stats.points_scored, stats.points_conceded, stats.point_differential, stats.sessions_played
        ),
        format!("  Form {}", form(&stats.recent_form)),
    ];

    if !stats.partner_stats.is_empty() {
        lines.push("  Partners".bold().to_string());
        for p in &stats.partner_stats {
            lines.push(format!(
                "    {:<20} {:>3} games {}-{} ({:.1}%)",
                p.partner_name, p.games_played, p.wins, p.losses, p.win_rate
            ));
        }
    }
    if !stats.opponent_stats.is_empty() {
        lines.push("  Opponents".bold().to_string());
        for o in &stats.opponent_stats {
            lines.push(format!(
                "    {:<20} {:>3} games {}-{} ({:.1}%)",
                o.opponent_name, o.games_played, o.wins, o.losses, o.win_rate
            ));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rank: usize, name: &str, form: Vec<Outcome>) -> LeaderboardEntry {
        LeaderboardEntry {
            player_id: name.to_lowercase(),
            name: name.to_string(),
            elo_rating: 1516,
            rank,
            total_games: 1,
            wins: 1,
            losses: 0,
            win_rate: 100.0,
            recent_form: form,
            trend: Trend::Up,
        }
    }

    #[test]
    fn test_leaderboard_table_lists_every_entry() {
        colored::control::set_override(false);
        let table = leaderboard_table(&[
            entry(1, "Alice", vec![Outcome::Win]),
            entry(2, "Bob", vec![Outcome::Loss, Outcome::Win]),
        ]);

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("Alice"));
        assert!(lines[1].contains("100.0%"));
        assert!(lines[2].ends_with("L W ▲"));
    }

    #[test]
    fn test_empty_leaderboard_message() {
        colored::control::set_override(false);
        assert_eq!(leaderboard_table(&[]), "No players in this group yet");
    }
}
