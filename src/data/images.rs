use crate::data::types::{PersonId, TeamId};

/// Shown when a player has no id to build a headshot URL from.
pub const HEADSHOT_PLACEHOLDER: &str = "data:image/svg+xml,<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"100\" height=\"100\"><rect fill=\"%23333\" width=\"100\" height=\"100\"/><text x=\"50\" y=\"50\" text-anchor=\"middle\" dy=\".3em\" fill=\"%23fff\" font-size=\"40\">?</text></svg>";

#[derive(Debug, Clone)]
pub struct ImageUrls {
    logo_base: String,
    headshot_base: String,
}

impl ImageUrls {
    pub fn new(logo_base: &str, headshot_base: &str) -> Self {
        Self {
            logo_base: logo_base.trim_end_matches('/').to_string(),
            headshot_base: headshot_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn team_logo(&self, team_id: TeamId) -> String {
        format!("{}/{}.svg", self.logo_base, team_id)
    }

    pub fn headshot(&self, person_id: Option<PersonId>) -> String {
        match person_id {
            Some(id) => format!("{}/{}/headshot/83/current", self.headshot_base, id),
            None => HEADSHOT_PLACEHOLDER.to_string(),
        }
    }
}
