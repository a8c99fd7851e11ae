use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    embed::Embed,
    error::Result,
    hockey::{
        api::{HockeyApi, Player, RosterEntry, SeasonSplit, HEADSHOT_URL},
        teams::{find_team, team_by_id},
    },
    menu::{checked_index, page_footer, Page, PageSource, Skip},
};

const NHL: &str = "National Hockey League";

const SKATER_STATS: [(&str, &str); 8] = [
    ("Shots", "shots"),
    ("Goals", "goals"),
    ("Assists", "assists"),
    ("Hits", "hits"),
    ("Face Off Percent", "faceOffPct"),
    ("+/-", "plusMinus"),
    ("Blocked Shots", "blocked"),
    ("PIM", "pim"),
];

const GOALIE_STATS: [(&str, &str); 3] = [
    ("Saves", "saves"),
    ("Save Percentage", "savePercentage"),
    ("Goals Against Average", "goalAgainstAverage"),
];

/// One roster member per page. The player record is fetched when the page is shown.
pub struct RosterSource {
    api: Arc<HockeyApi>,
    roster: Vec<RosterEntry>,
}

impl RosterSource {
    pub fn new(api: Arc<HockeyApi>, roster: Vec<RosterEntry>) -> Self {
        Self { api, roster }
    }
}

fn latest_nhl_season(player: &Player) -> Option<&SeasonSplit> {
    player.splits.iter().rev().find(|s| s.league == NHL)
}

fn stat_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn render_player(player: &Player, index: usize, count: usize) -> Embed {
    let team = player
        .team_id
        .and_then(team_by_id)
        .or_else(|| find_team(&player.team));
    let mut em = Embed::new()
        .field("Position", player.position.clone(), true)
        .thumbnail(format!("{}{}.jpg", HEADSHOT_URL, player.id))
        .footer(page_footer(index, count), None);
    let name = format!("{} #{}", player.full_name, player.number);
    em = match team {
        Some(team) => em
            .colour(team.colour())
            .author(name, Some(team.url()), Some(team.logo())),
        None => em.author(name, None, None),
    };

    let Some(season) = latest_nhl_season(player) else {
        return em;
    };
    if player.position == "Goalie" {
        for (label, key) in GOALIE_STATS {
            if let Some(value) = season.stat.get(key) {
                em = em.field(label, stat_text(value), true);
            }
        }
    } else {
        for (label, key) in SKATER_STATS {
            let Some(value) = season.stat.get(key) else {
                continue;
            };
            if value.as_f64() == Some(0.0) {
                continue;
            }
            em = em.field(label, stat_text(value), true);
        }
    }
    em
}

#[async_trait]
impl PageSource for RosterSource {
    fn page_count(&self) -> Option<usize> {
        Some(self.roster.len())
    }

    async fn fetch_page(&mut self, index: usize, _skip: Skip) -> Result<Page> {
        let entry = checked_index(&self.roster, index)?;
        let player = self.api.player(&entry.link).await?;
        Ok(Page::Embed(render_player(&player, index, self.roster.len())))
    }

    fn empty_message(&self) -> String {
        "That team has nobody on its roster.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    fn split(season: &str, league: &str, stat: Value) -> SeasonSplit {
        SeasonSplit {
            season: season.to_string(),
            league: league.to_string(),
            stat: stat.as_object().cloned().unwrap_or_default(),
        }
    }

    fn player(position: &str, splits: Vec<SeasonSplit>) -> Player {
        Player {
            id: 8471214,
            full_name: "Some Player".to_string(),
            number: "8".to_string(),
            position: position.to_string(),
            team: "Washington Capitals".to_string(),
            team_id: Some(15),
            splits,
        }
    }

    #[test]
    fn skater_uses_last_nhl_split_and_skips_zeroes() {
        let p = player(
            "Left Wing",
            vec![
                split("20192020", NHL, json!({"goals": 48})),
                split("20202021", NHL, json!({"shots": 200, "goals": 24, "hits": 0, "plusMinus": -3, "faceOffPct": 0.0})),
                split("20202021", "KHL", json!({"goals": 99})),
            ],
        );
        let em = render_player(&p, 0, 20);
        assert_eq!(em.author.as_ref().unwrap().name, "Some Player #8");
        assert_eq!(em.field_value("Goals"), Some("24"));
        assert_eq!(em.field_value("+/-"), Some("-3"));
        assert_eq!(em.field_value("Hits"), None);
        assert_eq!(em.field_value("Face Off Percent"), None);
        assert_eq!(
            em.thumbnail.as_deref(),
            Some("https://nhl.bamcontent.com/images/headshots/current/168x168/8471214.jpg")
        );
        assert_eq!(em.footer.as_ref().unwrap().text, "Page 1/20");
    }

    #[test]
    fn goalie_shows_goaltending_stats() {
        let p = player(
            "Goalie",
            vec![split("20222023", NHL, json!({"saves": 1500, "savePercentage": 0.915, "goalAgainstAverage": 2.5}))],
        );
        let em = render_player(&p, 1, 2);
        assert_eq!(em.field_value("Saves"), Some("1500"));
        assert_eq!(em.field_value("Save Percentage"), Some("0.915"));
        assert_eq!(em.field_value("Goals Against Average"), Some("2.5"));
    }

    #[test]
    fn no_nhl_split_renders_profile_only() {
        let p = player("Center", vec![split("20222023", "AHL", json!({"goals": 10}))]);
        let em = render_player(&p, 0, 1);
        assert_eq!(em.fields.len(), 1);
        assert_eq!(em.field_value("Position"), Some("Center"));
    }

    #[tokio::test]
    async fn fetch_looks_up_the_player() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/people/42"))
            .and(query_param("expand", "person.stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"people": [{
                "id": 42,
                "fullName": "Test Skater",
                "primaryNumber": "42",
                "primaryPosition": {"name": "Defenseman"},
                "currentTeam": {"id": 6, "name": "Boston Bruins"},
                "stats": [{"splits": []}]
            }]})))
            .mount(&server)
            .await;
        let api = Arc::new(HockeyApi::new(server.uri()));
        let entry = RosterEntry {
            id: 42,
            full_name: "Test Skater".to_string(),
            link: "/api/v1/people/42".to_string(),
            jersey_number: "42".to_string(),
            position: "Defenseman".to_string(),
        };
        let mut source = RosterSource::new(api, vec![entry]);
        let Page::Embed(em) = source.fetch_page(0, Skip::None).await.unwrap() else {
            panic!("expected an embed");
        };
        assert_eq!(em.author.as_ref().unwrap().name, "Test Skater #42");
        assert!(source.fetch_page(1, Skip::None).await.unwrap_err().is_not_found());
    }
}
