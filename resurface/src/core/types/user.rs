//! User identity type for core messages.

use serde::{Deserialize, Serialize};

/// User identity (id, username, names).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    /// Name shown in prompts: "first last", else username, else the numeric id.
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        match &self.username {
            Some(u) if !u.is_empty() => u.clone(),
            _ => self.id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallbacks() {
        let mut user = User {
            id: 7,
            username: Some("ada".to_string()),
            first_name: Some("Ada".to_string()),
            last_name: Some("L".to_string()),
        };
        assert_eq!(user.display_name(), "Ada L");
        user.first_name = None;
        user.last_name = None;
        assert_eq!(user.display_name(), "ada");
        user.username = None;
        assert_eq!(user.display_name(), "7");
    }
}
