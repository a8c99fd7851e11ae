use async_trait::async_trait;
use chrono::Utc;

use crate::{
    embed::Embed,
    error::Result,
    hockey::api::TeamStanding,
    menu::{checked_index, page_footer, Page, PageSource, Skip},
};

pub const LINES_PER_PAGE: usize = 10;

/// Pre-formatted leaderboard lines, a page at a time.
pub struct LeaderboardSource {
    pages: Vec<Vec<String>>,
    style: String,
    guild_name: String,
    guild_icon: Option<String>,
}

impl LeaderboardSource {
    pub fn new(
        lines: Vec<String>,
        per_page: usize,
        style: impl Into<String>,
        guild_name: impl Into<String>,
        guild_icon: Option<String>,
    ) -> Self {
        let pages = lines
            .chunks(per_page.max(1))
            .map(|chunk| chunk.to_vec())
            .collect();
        Self {
            pages,
            style: style.into(),
            guild_name: guild_name.into(),
            guild_icon,
        }
    }
}

/// One line per club, ordered by points with league rank breaking ties.
pub fn points_lines(standings: &[TeamStanding]) -> Vec<String> {
    let mut teams: Vec<&TeamStanding> = standings.iter().collect();
    teams.sort_by(|a, b| b.points.cmp(&a.points).then(a.league_rank.cmp(&b.league_rank)));
    teams
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. {}: {} points\n", i + 1, t.name, t.points))
        .collect()
}

#[async_trait]
impl PageSource for LeaderboardSource {
    fn page_count(&self) -> Option<usize> {
        Some(self.pages.len())
    }

    async fn fetch_page(&mut self, index: usize, _skip: Skip) -> Result<Page> {
        let lines = checked_index(&self.pages, index)?;
        let mut em = Embed::new()
            .description(lines.concat())
            .author(
                format!("{} {} Leaderboard", self.guild_name, self.style),
                None,
                self.guild_icon.clone(),
            )
            .footer(page_footer(index, self.pages.len()), None)
            .timestamp(Utc::now());
        if let Some(icon) = &self.guild_icon {
            em = em.thumbnail(icon.clone());
        }
        Ok(Page::Embed(em))
    }

    fn empty_message(&self) -> String {
        "The leaderboard is empty.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hockey::standings::tests::league;

    #[tokio::test]
    async fn pages_concatenate_lines() {
        let lines: Vec<String> = (1..=25).map(|i| format!("line {}\n", i)).collect();
        let mut source = LeaderboardSource::new(lines, LINES_PER_PAGE, "Season", "Rink", None);
        assert_eq!(source.page_count(), Some(3));
        let Page::Embed(em) = source.fetch_page(2, Skip::None).await.unwrap() else {
            panic!("expected an embed");
        };
        assert_eq!(em.description.as_deref(), Some("line 21\nline 22\nline 23\nline 24\nline 25\n"));
        assert_eq!(em.footer.as_ref().unwrap().text, "Page 3/3");
        assert_eq!(em.author.as_ref().unwrap().name, "Rink Season Leaderboard");
        assert!(em.thumbnail.is_none());
    }

    #[tokio::test]
    async fn empty_board_has_no_pages() {
        let mut source = LeaderboardSource::new(Vec::new(), LINES_PER_PAGE, "Season", "Rink", None);
        assert_eq!(source.page_count(), Some(0));
        assert!(source.fetch_page(0, Skip::None).await.unwrap_err().is_not_found());
    }

    #[test]
    fn points_break_ties_by_rank() {
        let lines = points_lines(&league());
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "1. Boston Bruins: 13 points\n");
    }
}
