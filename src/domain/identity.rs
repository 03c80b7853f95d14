use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};

use super::models::{GameRecord, GroupPlayerId, Team};
use crate::database::SessionPlayer;

/// Session player -> group player lookup, built once per pass.
///
/// Session players without a link are guests: they resolve to `None` and
/// never reach the rating engine.
#[derive(Debug, Default, Clone)]
pub struct IdentityMap {
    links: HashMap<String, GroupPlayerId>,
    sessions: HashMap<GroupPlayerId, HashSet<String>>,
}

impl IdentityMap {
    pub fn from_session_players(players: &[SessionPlayer]) -> Self {
        let mut map = Self::default();
        for player in players {
            if let Some(group_player_id) = &player.group_player_id {
                map.links.insert(player.id.clone(), group_player_id.clone());
                map.sessions
                    .entry(group_player_id.clone())
                    .or_default()
                    .insert(player.session_id.clone());
            }
        }
        map
    }

    fn resolve(&self, session_player_id: &str) -> Option<&GroupPlayerId> {
        self.links.get(session_player_id)
    }

    /// One entry per team member, `None` for guests.
    fn resolve_team(&self, team: &Team) -> Vec<Option<GroupPlayerId>> {
        team.members()
            .into_iter()
            .map(|id| self.resolve(id).cloned())
            .collect()
    }

    /// Resolves both teams of a game. Fails when a group player would end
    /// up in the game more than once.
    pub fn resolve_game(
        &self,
        game: &GameRecord,
    ) -> Result<(Vec<Option<GroupPlayerId>>, Vec<Option<GroupPlayerId>>)> {
        let team_a = self.resolve_team(&game.team_a);
        let team_b = self.resolve_team(&game.team_b);

        let mut seen = HashSet::new();
        if let Some(twice) = team_a.iter().chain(&team_b).flatten().find(|id| !seen.insert(*id)) {
            bail!("Game {} resolves group player {} more than once", game.id, twice);
        }
        Ok((team_a, team_b))
    }

    pub fn sessions_played(&self, group_player_id: &str) -> usize {
        self.sessions.get(group_player_id).map_or(0, HashSet::len)
    }

    pub fn linked_count(&self) -> usize {
        self.links.len()
    }
}
