use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};

use crate::{
    embed::Embed,
    error::{Error, Result},
    helpers::humanize_list,
    hockey::{
        api::{Game, HockeyApi},
        teams::{team_by_id, Team},
    },
    menu::{Page, PageSource, Skip},
};

pub const WINDOW_DAYS: i64 = 7;
/// How many empty windows a skip walks through before giving up.
pub const MAX_SKIPPED_WINDOWS: usize = 4;

/// Games in a window of days, loaded a window at a time. The menu can
/// move within the window or skip to the neighbouring ones.
pub struct ScheduleSource {
    api: Arc<HockeyApi>,
    date: NaiveDate,
    teams: Vec<&'static Team>,
    games: Vec<Game>,
    cursor: usize,
    last_searched: String,
}

impl ScheduleSource {
    pub fn new(api: Arc<HockeyApi>, date: NaiveDate, teams: Vec<&'static Team>) -> Self {
        Self {
            api,
            date,
            teams,
            games: Vec::new(),
            cursor: 0,
            last_searched: String::new(),
        }
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn last_searched(&self) -> &str {
        &self.last_searched
    }

    async fn load_window(&mut self, start: NaiveDate) -> Result<Vec<Game>> {
        let end = start + Duration::days(WINDOW_DAYS - 1);
        self.last_searched = format!("{} to {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"));
        let ids: Vec<u32> = self.teams.iter().map(|t| t.id).collect();
        self.api.schedule(start, end, &ids).await
    }

    fn no_schedule(&self) -> Error {
        Error::NoSchedule {
            searched: self.last_searched.clone(),
        }
    }

    /// Walks windows from `start` in steps of `step` days until one has games.
    async fn skip_to(&mut self, mut start: NaiveDate, step: i64) -> Result<Page> {
        for _ in 0..MAX_SKIPPED_WINDOWS {
            let games = self.load_window(start).await?;
            if !games.is_empty() {
                self.games = games;
                self.cursor = 0;
                return Ok(self.render(0));
            }
            start += Duration::days(step);
        }
        Err(self.no_schedule())
    }

    async fn skip_forward(&mut self) -> Result<Page> {
        let start = match self.games.last() {
            Some(game) => game.date + Duration::days(1),
            None => self.date + Duration::days(WINDOW_DAYS),
        };
        self.skip_to(start, WINDOW_DAYS).await
    }

    async fn skip_back(&mut self) -> Result<Page> {
        let end = match self.games.first() {
            Some(game) => game.date,
            None => self.date,
        };
        self.skip_to(end - Duration::days(WINDOW_DAYS), -WINDOW_DAYS).await
    }

    fn render(&self, index: usize) -> Page {
        match self.games.get(index) {
            Some(game) => Page::Embed(game_embed(game, index, self.games.len())),
            None => Page::Text(self.empty_message()),
        }
    }
}

fn score_line(team: &str, score: Option<u32>) -> String {
    match score {
        Some(score) => format!("{}: {}", team, score),
        None => team.to_string(),
    }
}

pub fn game_embed(game: &Game, index: usize, count: usize) -> Embed {
    let mut em = Embed::new()
        .title(format!("{} @ {}", game.away, game.home))
        .description(format!(
            "{}\n{}\n{}",
            game.status,
            score_line(&game.away, game.away_score),
            score_line(&game.home, game.home_score)
        ))
        .footer(
            format!("Game {}/{} on {}", index + 1, count, game.date.format("%Y-%m-%d")),
            None,
        );
    if let Some(venue) = &game.venue {
        em = em.field("Venue", venue.clone(), true);
    }
    if let Some(home) = team_by_id(game.home_id) {
        em = em.colour(home.colour()).thumbnail(home.logo()).url(home.url());
    }
    if let Some(away) = team_by_id(game.away_id) {
        em = em.author(game.away.clone(), Some(away.url()), Some(away.logo()));
    }
    if let Some(start) = game.start {
        em = em.timestamp(start);
    }
    em
}

#[async_trait]
impl PageSource for ScheduleSource {
    fn page_count(&self) -> Option<usize> {
        None
    }

    async fn fetch_page(&mut self, index: usize, skip: Skip) -> Result<Page> {
        match skip {
            Skip::Next => return self.skip_forward().await,
            Skip::Prev => return self.skip_back().await,
            Skip::None => {}
        }
        if self.games.is_empty() {
            self.prepare().await?;
        }
        if index < self.games.len() {
            self.cursor = index;
            Ok(self.render(index))
        } else if index == self.games.len() {
            self.skip_forward().await
        } else {
            Err(Error::NotFound { index })
        }
    }

    fn settled_index(&self, _requested: usize) -> usize {
        self.cursor
    }

    async fn prepare(&mut self) -> Result<()> {
        let games = self.load_window(self.date).await?;
        if games.is_empty() {
            return Err(self.no_schedule());
        }
        self.games = games;
        self.cursor = 0;
        Ok(())
    }

    fn set_date(&mut self, date: NaiveDate) -> Result<()> {
        self.date = date;
        self.games.clear();
        self.cursor = 0;
        Ok(())
    }

    fn empty_message(&self) -> String {
        if self.teams.is_empty() {
            format!("No schedule could be found in date ranges {}", self.last_searched)
        } else {
            let names: Vec<String> = self.teams.iter().map(|t| t.name.to_string()).collect();
            format!(
                "No schedule could be found for {} in date ranges {}",
                humanize_list(&names),
                self.last_searched
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;
    use crate::hockey::teams::find_team;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn games_on(date: &str, pks: &[u64]) -> Value {
        let games: Vec<Value> = pks
            .iter()
            .map(|pk| {
                json!({
                    "gamePk": pk,
                    "gameDate": format!("{}T23:00:00Z", date),
                    "status": {"detailedState": "Scheduled"},
                    "teams": {
                        "away": {"team": {"id": 10, "name": "Toronto Maple Leafs"}},
                        "home": {"team": {"id": 6, "name": "Boston Bruins"}}
                    }
                })
            })
            .collect();
        json!({"dates": [{"date": date, "games": games}]})
    }

    async fn window(server: &MockServer, start: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path("/api/v1/schedule"))
            .and(query_param("startDate", start))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn game_id(page: &Page) -> String {
        match page {
            Page::Embed(em) => em.footer.as_ref().map(|f| f.text.clone()).unwrap_or_default(),
            Page::Text(text) => text.clone(),
        }
    }

    #[tokio::test]
    async fn prepare_fails_on_an_empty_window() {
        let server = MockServer::start().await;
        window(&server, "2024-01-05", json!({"dates": []})).await;
        let api = Arc::new(HockeyApi::new(server.uri()));
        let bruins = find_team("bruins").unwrap();
        let mut source = ScheduleSource::new(api, day(2024, 1, 5), vec![bruins]);
        match source.prepare().await {
            Err(Error::NoSchedule { searched }) => assert_eq!(searched, "2024-01-05 to 2024-01-11"),
            other => panic!("unexpected {:?}", other.err()),
        }
        assert_eq!(
            source.empty_message(),
            "No schedule could be found for Boston Bruins in date ranges 2024-01-05 to 2024-01-11"
        );
    }

    #[tokio::test]
    async fn walks_through_and_past_a_window() {
        let server = MockServer::start().await;
        window(&server, "2024-01-05", games_on("2024-01-06", &[1, 2])).await;
        window(&server, "2024-01-07", games_on("2024-01-09", &[3])).await;
        let api = Arc::new(HockeyApi::new(server.uri()));
        let mut source = ScheduleSource::new(api, day(2024, 1, 5), Vec::new());

        let first = source.fetch_page(0, Skip::None).await.unwrap();
        assert_eq!(game_id(&first), "Game 1/2 on 2024-01-06");
        source.fetch_page(1, Skip::None).await.unwrap();
        assert_eq!(source.settled_index(1), 1);

        // one past the cache rolls into the next window
        let next = source.fetch_page(2, Skip::None).await.unwrap();
        assert_eq!(game_id(&next), "Game 1/1 on 2024-01-09");
        assert_eq!(source.settled_index(2), 0);
        assert!(source.fetch_page(5, Skip::None).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn skip_forward_gives_up_after_empty_windows() {
        let server = MockServer::start().await;
        window(&server, "2024-01-05", games_on("2024-01-05", &[1])).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/schedule"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"dates": []})))
            .mount(&server)
            .await;
        let api = Arc::new(HockeyApi::new(server.uri()));
        let mut source = ScheduleSource::new(api, day(2024, 1, 5), Vec::new());
        source.fetch_page(0, Skip::None).await.unwrap();
        let err = source.fetch_page(0, Skip::Next).await.unwrap_err();
        assert!(matches!(err, Error::NoSchedule { .. }));
        // 1 prepare plus the skipped windows
        let requests = server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 1 + MAX_SKIPPED_WINDOWS);
        // the cache is untouched by a failed skip
        assert_eq!(source.games().len(), 1);
    }

    #[tokio::test]
    async fn skip_back_loads_the_previous_window() {
        let server = MockServer::start().await;
        window(&server, "2024-01-10", games_on("2024-01-10", &[5])).await;
        window(&server, "2024-01-03", games_on("2024-01-04", &[3, 4])).await;
        let api = Arc::new(HockeyApi::new(server.uri()));
        let mut source = ScheduleSource::new(api, day(2024, 1, 10), Vec::new());
        source.fetch_page(0, Skip::None).await.unwrap();
        let page = source.fetch_page(0, Skip::Prev).await.unwrap();
        assert_eq!(game_id(&page), "Game 1/2 on 2024-01-04");
    }

    #[tokio::test]
    async fn set_date_retargets_the_window() {
        let server = MockServer::start().await;
        window(&server, "2024-01-05", games_on("2024-01-05", &[1])).await;
        window(&server, "2024-03-01", games_on("2024-03-02", &[9])).await;
        let api = Arc::new(HockeyApi::new(server.uri()));
        let mut source = ScheduleSource::new(api, day(2024, 1, 5), Vec::new());
        source.fetch_page(0, Skip::None).await.unwrap();
        source.set_date(day(2024, 3, 1)).unwrap();
        source.prepare().await.unwrap();
        assert_eq!(source.games()[0].id, 9);
    }
}
