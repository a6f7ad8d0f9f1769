//! Teams, players, role slots and batting availability.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crease_core::{DomainError, DomainResult, PlayerId};

/// One of the two sides in a match.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TeamSide {
    A,
    B,
}

impl TeamSide {
    pub fn opponent(self) -> Self {
        match self {
            TeamSide::A => TeamSide::B,
            TeamSide::B => TeamSide::A,
        }
    }
}

impl core::fmt::Display for TeamSide {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TeamSide::A => f.write_str("A"),
            TeamSide::B => f.write_str("B"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub team: TeamSide,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub players: Vec<Player>,
}

impl Team {
    pub fn new(name: impl Into<String>, players: Vec<Player>) -> Self {
        Self {
            name: name.into(),
            players,
        }
    }

    /// Build a team from player names, assigning fresh identifiers.
    pub fn named(side: TeamSide, name: impl Into<String>, player_names: &[&str]) -> Self {
        let players = player_names
            .iter()
            .map(|n| Player {
                id: PlayerId::new(),
                name: (*n).to_string(),
                team: side,
            })
            .collect();
        Self::new(name, players)
    }
}

/// Both squads for a match.
///
/// Validated on construction: both teams are non-empty, every player carries
/// the side it is listed under, and player ids are unique across the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RosterParts", into = "RosterParts")]
pub struct Roster {
    team_a: Team,
    team_b: Team,
}

#[derive(Serialize, Deserialize)]
struct RosterParts {
    team_a: Team,
    team_b: Team,
}

impl TryFrom<RosterParts> for Roster {
    type Error = DomainError;

    fn try_from(parts: RosterParts) -> Result<Self, Self::Error> {
        Roster::new(parts.team_a, parts.team_b)
    }
}

impl From<Roster> for RosterParts {
    fn from(roster: Roster) -> Self {
        RosterParts {
            team_a: roster.team_a,
            team_b: roster.team_b,
        }
    }
}

impl Roster {
    pub fn new(team_a: Team, team_b: Team) -> DomainResult<Self> {
        let mut seen = HashSet::new();
        for (side, team) in [(TeamSide::A, &team_a), (TeamSide::B, &team_b)] {
            if team.players.is_empty() {
                return Err(DomainError::validation(format!("team {side} has no players")));
            }
            for p in &team.players {
                if p.team != side {
                    return Err(DomainError::validation(format!(
                        "player '{}' is listed under team {side} but tagged {}",
                        p.name, p.team
                    )));
                }
                if !seen.insert(p.id) {
                    return Err(DomainError::validation(format!(
                        "duplicate player id {}",
                        p.id
                    )));
                }
            }
        }
        Ok(Self { team_a, team_b })
    }

    pub fn team(&self, side: TeamSide) -> &Team {
        match side {
            TeamSide::A => &self.team_a,
            TeamSide::B => &self.team_b,
        }
    }

    pub fn players(&self, side: TeamSide) -> &[Player] {
        &self.team(side).players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.team_a
            .players
            .iter()
            .chain(self.team_b.players.iter())
            .find(|p| p.id == id)
    }

    pub fn side_of(&self, id: PlayerId) -> Option<TeamSide> {
        self.player(id).map(|p| p.team)
    }

    pub fn is_member(&self, side: TeamSide, id: PlayerId) -> bool {
        self.side_of(id) == Some(side)
    }
}

/// Batters dismissed in the current innings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Availability {
    out: BTreeSet<PlayerId>,
}

impl Availability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_out(&self, id: PlayerId) -> bool {
        self.out.contains(&id)
    }

    /// Returns false when the player was already out.
    pub fn mark_out(&mut self, id: PlayerId) -> bool {
        self.out.insert(id)
    }

    /// Returns false when the player was not out.
    pub fn unmark_out(&mut self, id: PlayerId) -> bool {
        self.out.remove(&id)
    }

    /// Squad members of `side` who have not been dismissed, in roster order.
    pub fn available_batters(&self, roster: &Roster, side: TeamSide) -> Vec<PlayerId> {
        roster
            .players(side)
            .iter()
            .map(|p| p.id)
            .filter(|id| !self.is_out(*id))
            .collect()
    }

    pub fn clear(&mut self) {
        self.out.clear();
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerId> {
        self.out.iter()
    }
}

/// The three active player slots.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub striker: Option<PlayerId>,
    pub non_striker: Option<PlayerId>,
    pub bowler: Option<PlayerId>,
}

impl RoleAssignment {
    pub fn is_ready(&self) -> bool {
        self.striker.is_some() && self.bowler.is_some()
    }

    pub fn swap_strike(&mut self) {
        core::mem::swap(&mut self.striker, &mut self.non_striker);
    }
}

/// Opening selection for an innings, supplied by the caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineup {
    pub striker: PlayerId,
    pub non_striker: Option<PlayerId>,
    pub bowler: PlayerId,
}
