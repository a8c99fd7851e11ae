use std::{collections::BTreeMap, str::FromStr};

use async_trait::async_trait;

use crate::{
    embed::Embed,
    error::{Error, Result},
    hockey::{api::TeamStanding, teams::team_by_id},
    menu::{checked_index, page_footer, Page, PageSource, Skip},
};

const NHL_LOGO: &str = "https://www-league.nhlstatic.com/images/logos/league-light/133-flat.svg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StandingsStyle {
    #[default]
    All,
    Division,
    Conference,
    Team,
}

impl FromStr for StandingsStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "division" | "divisions" => Ok(Self::Division),
            "conference" | "conferences" => Ok(Self::Conference),
            "team" | "teams" => Ok(Self::Team),
            other => Err(Error::usage(format!("{} is not a standings style", other))),
        }
    }
}

pub struct StandingsSource {
    style: StandingsStyle,
    groups: Vec<Vec<TeamStanding>>,
}

fn grouped<F>(standings: Vec<TeamStanding>, key: F) -> Vec<Vec<TeamStanding>>
where
    F: Fn(&TeamStanding) -> String,
{
    let mut groups: BTreeMap<String, Vec<TeamStanding>> = BTreeMap::new();
    for team in standings {
        groups.entry(key(&team)).or_default().push(team);
    }
    groups.into_values().collect()
}

impl StandingsSource {
    pub fn new(style: StandingsStyle, standings: Vec<TeamStanding>) -> Self {
        let mut groups = match style {
            StandingsStyle::All => vec![standings],
            StandingsStyle::Division => grouped(standings, |t| t.division.clone()),
            StandingsStyle::Conference => grouped(standings, |t| t.conference.clone()),
            StandingsStyle::Team => standings.into_iter().map(|t| vec![t]).collect(),
        };
        for group in groups.iter_mut() {
            match style {
                StandingsStyle::Conference => group.sort_by_key(|t| t.conference_rank),
                StandingsStyle::Team => {}
                _ => group.sort_by_key(|t| t.division_rank),
            }
        }
        if style == StandingsStyle::Team {
            groups.sort_by_key(|g| g.first().map(|t| t.league_rank).unwrap_or(u32::MAX));
        }
        Self { style, groups }
    }

    pub fn style(&self) -> StandingsStyle {
        self.style
    }

    fn render(&self, index: usize, group: &[TeamStanding]) -> Embed {
        let footer = page_footer(index, self.groups.len());
        match self.style {
            StandingsStyle::All => all_standings_embed(group),
            StandingsStyle::Division => {
                ranked_embed(group, |t| &t.division, |t| t.division_rank).footer(footer, None)
            }
            StandingsStyle::Conference => {
                ranked_embed(group, |t| &t.conference, |t| t.conference_rank).footer(footer, None)
            }
            StandingsStyle::Team => match group.first() {
                Some(team) => team_embed(team).footer(footer, None),
                None => Embed::new(),
            },
        }
    }
}

fn record_line(rank: u32, team: &TeamStanding) -> String {
    format!(
        "{}. {}: {} GP {}-{}-{} {} PTS\n",
        rank, team.name, team.games_played, team.wins, team.losses, team.ot, team.points
    )
}

fn ranked_embed<N, R>(group: &[TeamStanding], name: N, rank: R) -> Embed
where
    N: Fn(&TeamStanding) -> &String,
    R: Fn(&TeamStanding) -> u32,
{
    let title = group.first().map(|t| name(t).clone()).unwrap_or_default();
    let mut description = String::new();
    for team in group {
        description.push_str(&record_line(rank(team), team));
    }
    let mut em = Embed::new()
        .title(format!("{} Standings", title))
        .description(description)
        .thumbnail(NHL_LOGO);
    if let Some(leader) = group.first().and_then(|t| team_by_id(t.team_id)) {
        em = em.colour(leader.colour());
    }
    em
}

fn all_standings_embed(teams: &[TeamStanding]) -> Embed {
    let mut divisions: BTreeMap<&str, Vec<&TeamStanding>> = BTreeMap::new();
    for team in teams {
        divisions.entry(team.division.as_str()).or_default().push(team);
    }
    let mut em = Embed::new()
        .title("NHL Standings")
        .url("https://www.nhl.com/standings")
        .thumbnail(NHL_LOGO);
    for (division, mut members) in divisions {
        members.sort_by_key(|t| t.division_rank);
        let value: String = members
            .iter()
            .map(|t| format!("{}. {} {} PTS\n", t.division_rank, t.name, t.points))
            .collect();
        em = em.field(division, value, true);
    }
    em
}

fn team_embed(team: &TeamStanding) -> Embed {
    let mut em = Embed::new()
        .field("Division", format!("# {}", team.division_rank), true)
        .field("Conference", format!("# {}", team.conference_rank), true)
        .field("League", format!("# {}", team.league_rank), true)
        .field(
            "Record",
            format!("{}-{}-{}", team.wins, team.losses, team.ot),
            true,
        )
        .field("Points", team.points.to_string(), true)
        .field("Games Played", team.games_played.to_string(), true)
        .field("Goals Scored", team.goals_for.to_string(), true)
        .field("Goals Against", team.goals_against.to_string(), true)
        .field("Current Streak", team.streak.clone(), true);
    match team_by_id(team.team_id) {
        Some(info) => {
            em = em
                .colour(info.colour())
                .author(team.name.clone(), Some(info.url()), Some(info.logo()))
                .thumbnail(info.logo());
        }
        None => em = em.author(team.name.clone(), None, None),
    }
    em
}

#[async_trait]
impl PageSource for StandingsSource {
    fn page_count(&self) -> Option<usize> {
        Some(self.groups.len())
    }

    async fn fetch_page(&mut self, index: usize, _skip: Skip) -> Result<Page> {
        let group = checked_index(&self.groups, index)?;
        Ok(Page::Embed(self.render(index, group)))
    }

    fn empty_message(&self) -> String {
        "No standings are available right now.".to_string()
    }
}
