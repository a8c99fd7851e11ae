use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub const BASE_URL: &str = "https://statsapi.web.nhl.com";
pub const HEADSHOT_URL: &str = "https://nhl.bamcontent.com/images/headshots/current/168x168/";

#[derive(Debug, Clone, PartialEq)]
pub struct TeamStanding {
    pub team_id: u32,
    pub name: String,
    pub division: String,
    pub conference: String,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub ot: u32,
    pub points: u32,
    pub division_rank: u32,
    pub conference_rank: u32,
    pub league_rank: u32,
    pub streak: String,
    pub goals_for: u32,
    pub goals_against: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub id: u64,
    pub full_name: String,
    pub link: String,
    pub jersey_number: String,
    pub position: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: u64,
    pub full_name: String,
    pub number: String,
    pub position: String,
    pub team: String,
    pub team_id: Option<u32>,
    /// year-by-year splits, oldest first
    pub splits: Vec<SeasonSplit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonSplit {
    pub season: String,
    pub league: String,
    pub stat: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub id: u64,
    /// the calendar day the league files the game under
    pub date: NaiveDate,
    pub start: Option<DateTime<Utc>>,
    pub status: String,
    pub home: String,
    pub home_id: u32,
    pub home_score: Option<u32>,
    pub away: String,
    pub away_id: u32,
    pub away_score: Option<u32>,
    pub venue: Option<String>,
}

mod raw {
    use serde::Deserialize;
    use serde_json::{Map, Value};

    #[derive(Deserialize)]
    pub struct Named {
        #[serde(default)]
        pub id: Option<u32>,
        #[serde(default)]
        pub name: String,
    }

    #[derive(Deserialize)]
    pub struct Standings {
        pub records: Vec<StandingsRecord>,
    }

    #[derive(Deserialize)]
    pub struct StandingsRecord {
        pub division: Named,
        pub conference: Named,
        #[serde(rename = "teamRecords")]
        pub team_records: Vec<TeamRecord>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TeamRecord {
        pub team: Named,
        pub league_record: LeagueRecord,
        #[serde(default)]
        pub points: u32,
        #[serde(default)]
        pub games_played: u32,
        #[serde(default)]
        pub division_rank: String,
        #[serde(default)]
        pub conference_rank: String,
        #[serde(default)]
        pub league_rank: String,
        #[serde(default)]
        pub streak: Option<Streak>,
        #[serde(default)]
        pub goals_scored: u32,
        #[serde(default)]
        pub goals_against: u32,
    }

    #[derive(Deserialize)]
    pub struct LeagueRecord {
        #[serde(default)]
        pub wins: u32,
        #[serde(default)]
        pub losses: u32,
        #[serde(default)]
        pub ot: u32,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Streak {
        pub streak_code: String,
    }

    #[derive(Deserialize)]
    pub struct Roster {
        #[serde(default)]
        pub roster: Vec<RosterSlot>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RosterSlot {
        pub person: Person,
        #[serde(default)]
        pub jersey_number: String,
        pub position: Named,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Person {
        pub id: u64,
        pub full_name: String,
        pub link: String,
    }

    #[derive(Deserialize)]
    pub struct People {
        pub people: Vec<PlayerData>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PlayerData {
        pub id: u64,
        pub full_name: String,
        #[serde(default)]
        pub primary_number: String,
        pub primary_position: Named,
        #[serde(default)]
        pub current_team: Option<Named>,
        #[serde(default)]
        pub stats: Vec<StatGroup>,
    }

    #[derive(Deserialize)]
    pub struct StatGroup {
        #[serde(default)]
        pub splits: Vec<Split>,
    }

    #[derive(Deserialize)]
    pub struct Split {
        #[serde(default)]
        pub season: String,
        pub league: Named,
        #[serde(default)]
        pub stat: Map<String, Value>,
    }

    #[derive(Deserialize)]
    pub struct Schedule {
        #[serde(default)]
        pub dates: Vec<ScheduleDate>,
    }

    #[derive(Deserialize)]
    pub struct ScheduleDate {
        pub date: String,
        #[serde(default)]
        pub games: Vec<ScheduleGame>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ScheduleGame {
        pub game_pk: u64,
        #[serde(default)]
        pub game_date: Option<String>,
        pub status: Status,
        pub teams: Sides,
        #[serde(default)]
        pub venue: Option<Named>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Status {
        pub detailed_state: String,
    }

    #[derive(Deserialize)]
    pub struct Sides {
        pub away: Side,
        pub home: Side,
    }

    #[derive(Deserialize)]
    pub struct Side {
        pub team: Named,
        #[serde(default)]
        pub score: Option<u32>,
    }
}

fn rank(text: &str) -> u32 {
    text.parse().unwrap_or(0)
}

pub fn parse_standings(body: Value) -> Result<Vec<TeamStanding>> {
    let standings: raw::Standings = serde_json::from_value(body)?;
    let mut teams = Vec::new();
    for record in standings.records {
        for team in record.team_records {
            teams.push(TeamStanding {
                team_id: team.team.id.unwrap_or(0),
                name: team.team.name,
                division: record.division.name.clone(),
                conference: record.conference.name.clone(),
                games_played: team.games_played,
                wins: team.league_record.wins,
                losses: team.league_record.losses,
                ot: team.league_record.ot,
                points: team.points,
                division_rank: rank(&team.division_rank),
                conference_rank: rank(&team.conference_rank),
                league_rank: rank(&team.league_rank),
                streak: team.streak.map(|s| s.streak_code).unwrap_or_default(),
                goals_for: team.goals_scored,
                goals_against: team.goals_against,
            });
        }
    }
    Ok(teams)
}

pub fn parse_roster(body: Value) -> Result<Vec<RosterEntry>> {
    let roster: raw::Roster = serde_json::from_value(body)?;
    Ok(roster
        .roster
        .into_iter()
        .map(|slot| RosterEntry {
            id: slot.person.id,
            full_name: slot.person.full_name,
            link: slot.person.link,
            jersey_number: slot.jersey_number,
            position: slot.position.name,
        })
        .collect())
}

pub fn parse_player(body: Value) -> Result<Player> {
    let people: raw::People = serde_json::from_value(body)?;
    let player = people
        .people
        .into_iter()
        .next()
        .ok_or_else(|| Error::upstream("player lookup returned nobody"))?;
    let splits = player
        .stats
        .into_iter()
        .next()
        .map(|group| group.splits)
        .unwrap_or_default()
        .into_iter()
        .map(|split| SeasonSplit {
            season: split.season,
            league: split.league.name,
            stat: split.stat,
        })
        .collect();
    let (team, team_id) = match player.current_team {
        Some(team) => (team.name, team.id),
        None => (String::new(), None),
    };
    Ok(Player {
        id: player.id,
        full_name: player.full_name,
        number: player.primary_number,
        position: player.primary_position.name,
        team,
        team_id,
        splits,
    })
}

pub fn parse_schedule(body: Value) -> Result<Vec<Game>> {
    let schedule: raw::Schedule = serde_json::from_value(body)?;
    let mut games = Vec::new();
    for day in schedule.dates {
        let date = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d")
            .map_err(|e| Error::upstream(format!("bad schedule date {}: {}", day.date, e)))?;
        for game in day.games {
            let start = game
                .game_date
                .as_deref()
                .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
                .map(|d| d.with_timezone(&Utc));
            games.push(Game {
                id: game.game_pk,
                date,
                start,
                status: game.status.detailed_state,
                home: game.teams.home.team.name,
                home_id: game.teams.home.team.id.unwrap_or(0),
                home_score: game.teams.home.score,
                away: game.teams.away.team.name,
                away_id: game.teams.away.team.id.unwrap_or(0),
                away_score: game.teams.away.score,
                venue: game.venue.map(|v| v.name),
            });
        }
    }
    Ok(games)
}

pub struct HockeyApi {
    client: reqwest::Client,
    base_url: String,
}

impl Default for HockeyApi {
    fn default() -> Self {
        Self::new(BASE_URL)
    }
}

impl HockeyApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn get(&self, path_and_query: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path_and_query);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(Error::upstream(format!("{} from {}", resp.status(), url)));
        }
        Ok(resp.json().await?)
    }

    pub async fn standings(&self) -> Result<Vec<TeamStanding>> {
        parse_standings(self.get("/api/v1/standings").await?)
    }

    pub async fn roster(&self, team_id: u32) -> Result<Vec<RosterEntry>> {
        parse_roster(self.get(&format!("/api/v1/teams/{}/roster", team_id)).await?)
    }

    /// `link` is the person link a roster entry carries, e.g. `/api/v1/people/8471214`.
    pub async fn player(&self, link: &str) -> Result<Player> {
        parse_player(
            self.get(&format!("{}?expand=person.stats&stats=yearByYear", link))
                .await?,
        )
    }

    pub async fn schedule(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        team_ids: &[u32],
    ) -> Result<Vec<Game>> {
        let mut query = format!(
            "/api/v1/schedule?startDate={}&endDate={}",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );
        if !team_ids.is_empty() {
            let ids: Vec<String> = team_ids.iter().map(u32::to_string).collect();
            query.push_str(&format!("&teamId={}", ids.join(",")));
        }
        parse_schedule(self.get(&query).await?)
    }
}
