//! Domain types: tenants, users, contributions.
//!
//! Each entity has a `*Row` struct mapped straight off the database
//! (list-valued columns as JSON-encoded TEXT) and a `*Dto` struct shaped for
//! the API (camelCase keys, real arrays, typed enums).

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(AppError::BadRequest(format!("invalid role: {}", s))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Pending,
    Approved,
    Rejected,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "pending",
            UserStatus::Approved => "approved",
            UserStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(UserStatus::Pending),
            "approved" => Ok(UserStatus::Approved),
            "rejected" => Ok(UserStatus::Rejected),
            _ => Err(AppError::BadRequest(format!("invalid user status: {}", s))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionType {
    Technical,
    Business,
    Relationship,
    Innovation,
    Other,
}

impl ContributionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionType::Technical => "technical",
            ContributionType::Business => "business",
            ContributionType::Relationship => "relationship",
            ContributionType::Innovation => "innovation",
            ContributionType::Other => "other",
        }
    }
}

impl std::str::FromStr for ContributionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "technical" => Ok(ContributionType::Technical),
            "business" => Ok(ContributionType::Business),
            "relationship" => Ok(ContributionType::Relationship),
            "innovation" => Ok(ContributionType::Innovation),
            "other" => Ok(ContributionType::Other),
            _ => Err(AppError::BadRequest(format!(
                "invalid contribution type: {}",
                s
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
    Critical,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Low => "low",
            Impact::Medium => "medium",
            Impact::High => "high",
            Impact::Critical => "critical",
        }
    }
}

impl std::str::FromStr for Impact {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Impact::Low),
            "medium" => Ok(Impact::Medium),
            "high" => Ok(Impact::High),
            "critical" => Ok(Impact::Critical),
            _ => Err(AppError::BadRequest(format!("invalid impact: {}", s))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effort::Low => "low",
            Effort::Medium => "medium",
            Effort::High => "high",
        }
    }
}

impl std::str::FromStr for Effort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Effort::Low),
            "medium" => Ok(Effort::Medium),
            "high" => Ok(Effort::High),
            _ => Err(AppError::BadRequest(format!("invalid effort: {}", s))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl ContributionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionStatus::Draft => "draft",
            ContributionStatus::Submitted => "submitted",
            ContributionStatus::Approved => "approved",
            ContributionStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for ContributionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ContributionStatus::Draft),
            "submitted" => Ok(ContributionStatus::Submitted),
            "approved" => Ok(ContributionStatus::Approved),
            "rejected" => Ok(ContributionStatus::Rejected),
            _ => Err(AppError::BadRequest(format!(
                "invalid contribution status: {}",
                s
            ))),
        }
    }
}

/// Parse a JSON-encoded TEXT column into a string list. Malformed content
/// degrades to an empty list rather than an error.
pub fn parse_json_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Encode a string list for a JSON TEXT column.
pub fn to_json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".into())
}

#[derive(Clone, Debug, FromRow)]
pub struct TenantRow {
    pub id: Uuid,
    pub tenant_prefix: String,
    pub name: String,
    pub admin_emails: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDto {
    pub id: Uuid,
    pub tenant_prefix: String,
    pub name: String,
    pub admin_emails: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantRow {
    pub fn into_dto(self) -> TenantDto {
        TenantDto {
            id: self.id,
            tenant_prefix: self.tenant_prefix,
            name: self.name,
            admin_emails: parse_json_list(&self.admin_emails),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Public directory entry: no admin emails, no timestamps.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDirectoryEntry {
    pub id: Uuid,
    pub tenant_prefix: String,
    pub name: String,
}

#[derive(Clone, Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub full_name: String,
    pub staff_id: String,
    pub email: String,
    pub password_hash: String,
    pub involved_account_names: String,
    pub involved_sale_names: String,
    pub involved_sale_emails: String,
    pub role: String,
    pub status: String,
    pub can_view_others: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::User)
    }

    pub fn status(&self) -> UserStatus {
        self.status.parse().unwrap_or(UserStatus::Pending)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    pub fn involved_account_names(&self) -> Vec<String> {
        parse_json_list(&self.involved_account_names)
    }

    pub fn involved_sale_names(&self) -> Vec<String> {
        parse_json_list(&self.involved_sale_names)
    }

    pub fn into_dto(self) -> UserDto {
        UserDto {
            id: self.id,
            tenant_id: self.tenant_id,
            full_name: self.full_name,
            staff_id: self.staff_id,
            email: self.email,
            involved_account_names: parse_json_list(&self.involved_account_names),
            involved_sale_names: parse_json_list(&self.involved_sale_names),
            involved_sale_emails: parse_json_list(&self.involved_sale_emails),
            role: self.role.parse().unwrap_or(Role::User),
            status: self.status.parse().unwrap_or(UserStatus::Pending),
            can_view_others: self.can_view_others,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// API shape of a user. Never carries the password hash.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub full_name: String,
    pub staff_id: String,
    pub email: String,
    pub involved_account_names: Vec<String>,
    pub involved_sale_names: Vec<String>,
    pub involved_sale_emails: Vec<String>,
    pub role: Role,
    pub status: UserStatus,
    pub can_view_others: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, FromRow)]
pub struct ContributionRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub account_name: String,
    pub sale_name: String,
    pub sale_email: Option<String>,
    pub contribution_type: String,
    pub title: String,
    pub description: Option<String>,
    pub impact: String,
    pub effort: String,
    pub estimated_impact_value: Option<f64>,
    pub contribution_month: String,
    pub status: String,
    pub tags: String,
    pub attachments: String,
    pub sale_approval: bool,
    pub sale_approval_date: Option<DateTime<Utc>>,
    pub sale_approval_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContributionRow {
    pub fn status(&self) -> ContributionStatus {
        self.status.parse().unwrap_or(ContributionStatus::Draft)
    }

    pub fn into_dto(self) -> ContributionDto {
        ContributionDto {
            id: self.id,
            tenant_id: self.tenant_id,
            user_id: self.user_id,
            account_name: self.account_name,
            sale_name: self.sale_name,
            sale_email: self.sale_email,
            contribution_type: self
                .contribution_type
                .parse()
                .unwrap_or(ContributionType::Other),
            title: self.title,
            description: self.description,
            impact: self.impact.parse().unwrap_or(Impact::Low),
            effort: self.effort.parse().unwrap_or(Effort::Low),
            estimated_impact_value: self.estimated_impact_value,
            contribution_month: self.contribution_month,
            status: self.status.parse().unwrap_or(ContributionStatus::Draft),
            tags: parse_json_list(&self.tags),
            attachments: parse_json_list(&self.attachments),
            sale_approval: self.sale_approval,
            sale_approval_date: self.sale_approval_date,
            sale_approval_notes: self.sale_approval_notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionDto {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub account_name: String,
    pub sale_name: String,
    pub sale_email: Option<String>,
    pub contribution_type: ContributionType,
    pub title: String,
    pub description: Option<String>,
    pub impact: Impact,
    pub effort: Effort,
    pub estimated_impact_value: Option<f64>,
    pub contribution_month: String,
    pub status: ContributionStatus,
    pub tags: Vec<String>,
    pub attachments: Vec<String>,
    pub sale_approval: bool,
    pub sale_approval_date: Option<DateTime<Utc>>,
    pub sale_approval_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_list_round_trip_preserves_order() {
        let items = vec!["acme".to_string(), "globex".to_string(), "initech".to_string()];
        let encoded = to_json_list(&items);
        assert_eq!(parse_json_list(&encoded), items);
    }

    #[test]
    fn malformed_json_list_degrades_to_empty() {
        assert!(parse_json_list("not json").is_empty());
        assert!(parse_json_list("{\"a\":1}").is_empty());
        assert!(parse_json_list("").is_empty());
    }

    #[test]
    fn enum_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("superadmin".parse::<Role>().is_err());
        assert_eq!(
            "critical".parse::<Impact>().unwrap().as_str(),
            "critical"
        );
        assert_eq!(
            "draft".parse::<ContributionStatus>().unwrap(),
            ContributionStatus::Draft
        );
    }

    #[test]
    fn enum_serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&UserStatus::Pending).unwrap(), "\"pending\"");
        assert_eq!(
            serde_json::to_string(&ContributionType::Relationship).unwrap(),
            "\"relationship\""
        );
    }
}
