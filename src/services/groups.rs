use anyhow::{bail, Context, Result};
use log::info;
use uuid::Uuid;

use super::outcome::OutcomeProcessor;
use super::recalculation::{RecalculationService, RecalculationSummary};
use crate::config::settings::RatingSettings;
use crate::database::{self, DbConn, Group, GroupPlayer};

/// Group player pool management and session-player linking.
#[derive(Debug, Clone)]
pub struct GroupService {
    default_rating: i32,
    recalculation: RecalculationService,
}

impl GroupService {
    pub fn new(config: RatingSettings) -> Self {
        Self {
            default_rating: config.default_rating,
            recalculation: RecalculationService::new(OutcomeProcessor::new(config)),
        }
    }

    pub fn create_group(&self, conn: &mut DbConn, name: &str) -> Result<Group> {
        let name = valid_name(name)?;
        let id = Uuid::new_v4().to_string();

        let group = database::groups::insert_group(conn, &id, name)?;
        info!("Created group {} ({})", group.name, group.id);
        Ok(group)
    }

    /// Adds a player at the default rating. Returns `None` when the group does not exist.
    pub fn add_player(&self, conn: &mut DbConn, group_id: &str, name: &str) -> Result<Option<GroupPlayer>> {
        let name = valid_name(name)?;
        if database::groups::find_by_id(conn, group_id)?.is_none() {
            return Ok(None);
        }

        let id = Uuid::new_v4().to_string();
        let player = database::group_players::insert_group_player(
            conn,
            &id,
            group_id,
            name,
            self.default_rating,
        )?;
        info!("Added {} to group {}", player.name, group_id);
        Ok(Some(player))
    }

    /// Soft removal: the player drops off the leaderboard, history stays intact.
    pub fn remove_player(&self, conn: &mut DbConn, player_id: &str) -> Result<bool> {
        database::group_players::set_active(conn, player_id, false)
    }

    /// Links (or unlinks, with `None`) a session player and rebuilds the
    /// group so games already played count for the new identity.
    pub fn link_session_player(
        &self,
        conn: &mut DbConn,
        session_player_id: &str,
        group_player_id: Option<&str>,
    ) -> Result<RecalculationSummary> {
        let player = database::players::find_by_id(conn, session_player_id)?
            .with_context(|| format!("Player {} not found", session_player_id))?;
        let session = database::sessions::find_by_id(conn, &player.session_id)?
            .with_context(|| format!("Session {} not found", player.session_id))?;
        let Some(group_id) = session.group_id else {
            bail!("Session {} does not belong to a group", session.id);
        };

        if let Some(group_player_id) = group_player_id {
            let group_player = database::group_players::find_by_id(conn, group_player_id)?
                .with_context(|| format!("Group player {} not found", group_player_id))?;
            if group_player.group_id != group_id {
                bail!(
                    "Group player {} belongs to another group than session {}",
                    group_player_id,
                    session.id
                );
            }

            let taken = database::players::list_by_session(conn, &session.id)?
                .into_iter()
                .find(|p| p.id != player.id && p.group_player_id.as_deref() == Some(group_player_id));
            if let Some(other) = taken {
                bail!(
                    "Group player {} is already linked to {} in session {}",
                    group_player_id,
                    other.id,
                    session.id
                );
            }
        }

        database::players::set_group_player_link(conn, session_player_id, group_player_id)?;
        info!(
            "Linked session player {} to {}",
            session_player_id,
            group_player_id.unwrap_or("nobody")
        );

        self.recalculation.recalculate_group(conn, &group_id)
    }
}

fn valid_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Name cannot be empty");
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::*;

    fn service() -> GroupService {
        GroupService::new(RatingSettings::default())
    }

    #[test]
    fn test_create_group_and_add_players() {
        let mut conn = memory_conn();
        let service = service();

        let group = service.create_group(&mut conn, "  Tuesday Club ").unwrap();
        assert_eq!(group.name, "Tuesday Club");

        let player = service.add_player(&mut conn, &group.id, "Alice").unwrap().unwrap();
        assert_eq!((player.elo_rating, player.total_games), (1500, 0));
        assert!(player.is_active);

        assert!(service.add_player(&mut conn, "missing", "Bob").unwrap().is_none());
        assert!(service.add_player(&mut conn, &group.id, "   ").is_err());
    }

    #[test]
    fn test_remove_player_is_soft() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice"]);

        assert!(service().remove_player(&mut conn, "alice").unwrap());
        assert!(!group_player(&mut conn, "alice").is_active);
        assert!(!service().remove_player(&mut conn, "ghost").unwrap());
    }

    #[test]
    fn test_linking_a_guest_backfills_their_history() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice", "bob"]);
        seed_session(&mut conn, "s1", Some("g1"), "singles", 1, &["alice", "guest1"]);
        seed_session(&mut conn, "s2", Some("g1"), "singles", 2, &["alice", "guest1"]);
        seed_game(&mut conn, "s1", 1, &["guest1"], &["alice"], Some("A"), None, at(1, 5));
        seed_game(&mut conn, "s2", 1, &["guest1"], &["alice"], Some("A"), None, at(2, 5));

        let service = service();
        service
            .link_session_player(&mut conn, &session_player_id("s1", "guest1"), Some("bob"))
            .unwrap();
        let summary = service
            .link_session_player(&mut conn, &session_player_id("s2", "guest1"), Some("bob"))
            .unwrap();

        assert_eq!(summary.games_replayed, 2);
        let bob = group_player(&mut conn, "bob");
        assert_eq!((bob.wins, bob.losses, bob.total_games), (2, 0, 2));
        assert!(bob.elo_rating > 1500);
        assert_eq!(group_player(&mut conn, "alice").losses, 2);
    }

    #[test]
    fn test_unlinking_removes_the_history_again() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice", "bob"]);
        seed_session(&mut conn, "s1", Some("g1"), "singles", 1, &["alice", "bob"]);
        seed_game(&mut conn, "s1", 1, &["alice"], &["bob"], Some("A"), None, at(1, 5));

        service()
            .link_session_player(&mut conn, &session_player_id("s1", "bob"), None)
            .unwrap();

        let bob = group_player(&mut conn, "bob");
        assert_eq!((bob.elo_rating, bob.total_games), (1500, 0));
        assert_eq!(group_player(&mut conn, "alice").wins, 1);
    }

    #[test]
    fn test_cannot_link_across_groups() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice"]);
        seed_group(&mut conn, "g2", &["bob"]);
        seed_session(&mut conn, "s1", Some("g1"), "singles", 1, &["guest1"]);
        seed_session(&mut conn, "s2", None, "singles", 1, &["guest2"]);

        let service = service();
        assert!(service
            .link_session_player(&mut conn, &session_player_id("s1", "guest1"), Some("bob"))
            .is_err());
        assert!(service
            .link_session_player(&mut conn, &session_player_id("s2", "guest2"), Some("alice"))
            .is_err());
        assert!(service
            .link_session_player(&mut conn, "nobody", Some("alice"))
            .is_err());
    }

    #[test]
    fn test_cannot_link_two_session_players_to_one_group_player() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice", "bob"]);
        seed_session(&mut conn, "s1", Some("g1"), "singles", 1, &["alice", "guest1"]);
        seed_game(&mut conn, "s1", 1, &["alice"], &["guest1"], Some("A"), Some((21, 5)), at(1, 5));
        let service = service();
        service.link_session_player(&mut conn, &session_player_id("s1", "alice"), Some("alice")).unwrap();

        let err = service
            .link_session_player(&mut conn, &session_player_id("s1", "guest1"), Some("alice"))
            .unwrap_err();
        assert!(err.to_string().contains("already linked"));

        let guest = database::players::find_by_id(&mut conn, &session_player_id("s1", "guest1"))
            .unwrap()
            .unwrap();
        assert_eq!(guest.group_player_id, None);
        let alice = group_player(&mut conn, "alice");
        assert_eq!((alice.wins, alice.losses, alice.total_games), (1, 0, 1));

        // the same player in another session is fine
        seed_session(&mut conn, "s2", Some("g1"), "singles", 2, &["guest1", "bob"]);
        service.link_session_player(&mut conn, &session_player_id("s2", "guest1"), Some("alice")).unwrap();
    }
}
