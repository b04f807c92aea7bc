//! User profile and session models.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// User profile as stored in the client store and returned by the login endpoint.
///
/// The backend's representation drifted over time, so parsing is lenient:
/// ids may be numbers or numeric strings, text fields of any other JSON type
/// read as absent, and the admin flags only count when they are literally `true`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Older payloads carry the id here instead
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "strict_true", skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(
        default,
        rename = "isAdmin",
        deserialize_with = "strict_true",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_admin_camel: Option<bool>,
    /// Any other fields, kept so the stored profile round-trips
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Minimal profile for a login response that carried no user object.
    pub fn minimal(email: &str, id: u64) -> Self {
        Self {
            id: Some(id),
            email: Some(email.to_string()),
            role: Some(Role::User.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn resolved_id(&self) -> Option<u64> {
        self.id.or(self.user_id)
    }

    /// Name to show for this user.
    pub fn display_name(&self) -> Option<&str> {
        [&self.name, &self.username, &self.email]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.trim().is_empty())
    }

    pub fn role(&self) -> Role {
        if admin_signal(self, None).is_some() {
            Role::Admin
        } else {
            Role::User
        }
    }
}

/// Which admin signal matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminSignal {
    Role,
    IsAdminFlag,
    IsAdminCamelFlag,
    DisplayName,
}

/// Resolve the admin role from a profile.
///
/// Checked in order, first match wins:
/// 1. `role == "admin"` (case-insensitive)
/// 2. `is_admin == true`
/// 3. `isAdmin == true`
/// 4. display name equal to the configured legacy admin account, when configured
///
/// Several signals exist because the backend changed how it reports admins;
/// collapsing them needs a backend decision first.
pub fn admin_signal(profile: &UserProfile, admin_display_name: Option<&str>) -> Option<AdminSignal> {
    if profile
        .role
        .as_deref()
        .is_some_and(|r| r.trim().eq_ignore_ascii_case("admin"))
    {
        return Some(AdminSignal::Role);
    }
    if profile.is_admin == Some(true) {
        return Some(AdminSignal::IsAdminFlag);
    }
    if profile.is_admin_camel == Some(true) {
        return Some(AdminSignal::IsAdminCamelFlag);
    }
    let legacy = admin_display_name?;
    [&profile.name, &profile.username]
        .into_iter()
        .flatten()
        .any(|n| n == legacy)
        .then_some(AdminSignal::DisplayName)
}

/// Session role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// `None` when the token exists but no id could be resolved
    pub user_id: Option<u64>,
    pub display_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub token: String,
    /// `None` for a profile-less session
    pub profile: Option<UserProfile>,
}

impl Session {
    pub fn from_profile(
        token: String,
        profile: UserProfile,
        fallback_id: Option<u64>,
        admin_display_name: Option<&str>,
    ) -> Self {
        let role = if admin_signal(&profile, admin_display_name).is_some() {
            Role::Admin
        } else {
            Role::User
        };
        Self {
            user_id: profile.resolved_id().or(fallback_id),
            display_name: profile.display_name().unwrap_or("User").to_string(),
            email: profile.email.clone(),
            role,
            token,
            profile: Some(profile),
        }
    }

    /// Token present but no readable profile.
    pub fn profile_less(token: String, user_id: Option<u64>, display_name: Option<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.unwrap_or_else(|| "User".to_string()),
            email: None,
            role: Role::User,
            token,
            profile: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn strict_true<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => None,
        Value::Bool(b) => Some(b),
        _ => Some(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(v: Value) -> UserProfile {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_lenient_id_parsing() {
        assert_eq!(profile(json!({"id": 7})).resolved_id(), Some(7));
        assert_eq!(profile(json!({"id": "12"})).resolved_id(), Some(12));
        assert_eq!(profile(json!({"user_id": 3})).resolved_id(), Some(3));
        assert_eq!(profile(json!({"id": "abc"})).resolved_id(), None);
    }

    #[test]
    fn test_text_fields_of_other_types_are_absent() {
        let p = profile(json!({
            "id": 7,
            "name": null,
            "username": 42,
            "email": ["a@b.c"],
            "role": {"id": 1, "name": "admin"}
        }));
        assert_eq!(p.resolved_id(), Some(7));
        assert_eq!(p.name, None);
        assert_eq!(p.username.as_deref(), Some("42"));
        assert_eq!(p.email, None);
        assert_eq!(p.role, None);
        assert_eq!(p.display_name(), Some("42"));
        assert_eq!(p.role(), Role::User);
    }

    #[test]
    fn test_admin_chain_order() {
        let p = profile(json!({"role": "Admin", "is_admin": false}));
        assert_eq!(admin_signal(&p, None), Some(AdminSignal::Role));

        let p = profile(json!({"role": "user", "is_admin": true}));
        assert_eq!(admin_signal(&p, None), Some(AdminSignal::IsAdminFlag));

        let p = profile(json!({"isAdmin": true}));
        assert_eq!(admin_signal(&p, None), Some(AdminSignal::IsAdminCamelFlag));

        let p = profile(json!({"is_admin": 1, "isAdmin": "true"}));
        assert_eq!(admin_signal(&p, None), None);
    }

    #[test]
    fn test_display_name_signal_needs_configuration() {
        let p = profile(json!({"name": "Admin Groupe8"}));
        assert_eq!(admin_signal(&p, None), None);
        assert_eq!(
            admin_signal(&p, Some("Admin Groupe8")),
            Some(AdminSignal::DisplayName)
        );
    }

    #[test]
    fn test_unknown_fields_roundtrip() {
        let p = profile(json!({"id": 1, "name": "Ana", "avatar": "a.png"}));
        let back = serde_json::to_value(&p).unwrap();
        assert_eq!(back["avatar"], "a.png");
        assert_eq!(back["name"], "Ana");
    }
}
