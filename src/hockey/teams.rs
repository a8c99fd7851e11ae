use crate::embed::hex_colour;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Team {
    pub id: u32,
    pub name: &'static str,
    pub colour: &'static str,
    pub slug: &'static str,
}

impl Team {
    pub fn colour(&self) -> u32 {
        hex_colour(self.colour)
    }

    pub fn url(&self) -> String {
        format!("https://www.nhl.com/{}", self.slug)
    }

    pub fn logo(&self) -> String {
        format!(
            "https://www-league.nhlstatic.com/images/logos/teams-current-primary-light/{}.svg",
            self.id
        )
    }
}

macro_rules! team {
    ($id:expr, $name:expr, $colour:expr, $slug:expr) => {
        Team {
            id: $id,
            name: $name,
            colour: $colour,
            slug: $slug,
        }
    };
}

pub const TEAMS: [Team; 32] = [
    team!(1, "New Jersey Devils", "#CE1126", "devils"),
    team!(2, "New York Islanders", "#00539B", "islanders"),
    team!(3, "New York Rangers", "#0038A8", "rangers"),
    team!(4, "Philadelphia Flyers", "#F74902", "flyers"),
    team!(5, "Pittsburgh Penguins", "#FCB514", "penguins"),
    team!(6, "Boston Bruins", "#FFB81C", "bruins"),
    team!(7, "Buffalo Sabres", "#002654", "sabres"),
    team!(8, "Montréal Canadiens", "#AF1E2D", "canadiens"),
    team!(9, "Ottawa Senators", "#C52032", "senators"),
    team!(10, "Toronto Maple Leafs", "#00205B", "mapleleafs"),
    team!(12, "Carolina Hurricanes", "#CE1126", "hurricanes"),
    team!(13, "Florida Panthers", "#041E42", "panthers"),
    team!(14, "Tampa Bay Lightning", "#002868", "lightning"),
    team!(15, "Washington Capitals", "#041E42", "capitals"),
    team!(16, "Chicago Blackhawks", "#CF0A2C", "blackhawks"),
    team!(17, "Detroit Red Wings", "#CE1126", "redwings"),
    team!(18, "Nashville Predators", "#FFB81C", "predators"),
    team!(19, "St. Louis Blues", "#002F87", "blues"),
    team!(20, "Calgary Flames", "#C8102E", "flames"),
    team!(21, "Colorado Avalanche", "#6F263D", "avalanche"),
    team!(22, "Edmonton Oilers", "#041E42", "oilers"),
    team!(23, "Vancouver Canucks", "#00205B", "canucks"),
    team!(24, "Anaheim Ducks", "#F47A38", "ducks"),
    team!(25, "Dallas Stars", "#006847", "stars"),
    team!(26, "Los Angeles Kings", "#111111", "kings"),
    team!(28, "San Jose Sharks", "#006D75", "sharks"),
    team!(29, "Columbus Blue Jackets", "#002654", "bluejackets"),
    team!(30, "Minnesota Wild", "#154734", "wild"),
    team!(52, "Winnipeg Jets", "#041E42", "jets"),
    team!(53, "Arizona Coyotes", "#8C2633", "coyotes"),
    team!(54, "Vegas Golden Knights", "#B4975A", "goldenknights"),
    team!(55, "Seattle Kraken", "#001628", "kraken"),
];

pub fn team_by_id(id: u32) -> Option<&'static Team> {
    TEAMS.iter().find(|t| t.id == id)
}

/// Exact name first, then the first team whose name contains `query`.
pub fn find_team(query: &str) -> Option<&'static Team> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }
    TEAMS
        .iter()
        .find(|t| t.name.to_lowercase() == query)
        .or_else(|| TEAMS.iter().find(|t| t.name.to_lowercase().contains(&query)))
}
