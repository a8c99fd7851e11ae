use chrono::{DateTime, Utc};
use serenity::all::{
    Colour, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, Timestamp,
};

/// Embed contents kept as plain data until they go out over the gateway, so
/// page sources and notifications can be inspected without a live client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub colour: Option<u32>,
    pub author: Option<EmbedAuthor>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<EmbedFooter>,
    pub thumbnail: Option<String>,
    pub image: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: Option<String>,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedFooter {
    pub text: String,
    pub icon_url: Option<String>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn colour(mut self, colour: u32) -> Self {
        self.colour = Some(colour);
        self
    }

    pub fn author(mut self, name: impl Into<String>, url: Option<String>, icon_url: Option<String>) -> Self {
        self.author = Some(EmbedAuthor {
            name: name.into(),
            url,
            icon_url,
        });
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>, icon_url: Option<String>) -> Self {
        self.footer = Some(EmbedFooter {
            text: text.into(),
            icon_url,
        });
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn to_serenity(&self) -> CreateEmbed {
        let mut embed = CreateEmbed::new();
        if let Some(title) = &self.title {
            embed = embed.title(title);
        }
        if let Some(description) = &self.description {
            embed = embed.description(description);
        }
        if let Some(url) = &self.url {
            embed = embed.url(url);
        }
        if let Some(colour) = self.colour {
            embed = embed.colour(Colour::new(colour));
        }
        if let Some(author) = &self.author {
            let mut builder = CreateEmbedAuthor::new(&author.name);
            if let Some(url) = &author.url {
                builder = builder.url(url);
            }
            if let Some(icon) = &author.icon_url {
                builder = builder.icon_url(icon);
            }
            embed = embed.author(builder);
        }
        for field in &self.fields {
            embed = embed.field(&field.name, &field.value, field.inline);
        }
        if let Some(footer) = &self.footer {
            let mut builder = CreateEmbedFooter::new(&footer.text);
            if let Some(icon) = &footer.icon_url {
                builder = builder.icon_url(icon);
            }
            embed = embed.footer(builder);
        }
        if let Some(thumbnail) = &self.thumbnail {
            embed = embed.thumbnail(thumbnail);
        }
        if let Some(image) = &self.image {
            embed = embed.image(image);
        }
        if let Some(at) = self.timestamp {
            if let Ok(ts) = Timestamp::from_unix_timestamp(at.timestamp()) {
                embed = embed.timestamp(ts);
            }
        }
        embed
    }
}

/// Parses a `#RRGGBB` (or bare hex) colour, falling back to black.
pub fn hex_colour(hex: &str) -> u32 {
    u32::from_str_radix(hex.trim_start_matches('#'), 16).unwrap_or(0)
}

/// Truncates to at most `max` characters without splitting a char.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
