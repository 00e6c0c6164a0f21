use serde::{Deserialize, Serialize};

/// Review state of a package version or listing.
///
/// Legacy states (`skipped`, `immune`, `pending`) collapse into `unreviewed`
/// when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Unreviewed,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unreviewed => "unreviewed",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unreviewed" | "skipped" | "immune" | "pending" => Some(Self::Unreviewed),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Lifecycle state of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserMediaStatus {
    Initial,
    UploadCreated,
    UploadIssued,
    UploadComplete,
    UploadError,
}

impl UserMediaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::UploadCreated => "upload_created",
            Self::UploadIssued => "upload_issued",
            Self::UploadComplete => "upload_complete",
            Self::UploadError => "upload_error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initial" => Some(Self::Initial),
            "upload_created" => Some(Self::UploadCreated),
            "upload_issued" => Some(Self::UploadIssued),
            "upload_complete" => Some(Self::UploadComplete),
            "upload_error" | "upload_aborted" => Some(Self::UploadError),
            _ => None,
        }
    }
}

/// Processing state of an async package submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Processing,
    Finished,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Finished => "finished",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }
}

/// Membership role within a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Owner,
    Member,
}

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Self::Owner),
            "member" => Some(Self::Member),
            _ => None,
        }
    }
}

/// Package archive format revision recorded on a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum FormatSpec {
    #[serde(rename = "modvault.io:v0.0")]
    V0_0,
    #[serde(rename = "modvault.io:v0.1")]
    V0_1,
    #[serde(rename = "modvault.io:v0.2")]
    V0_2,
    #[serde(rename = "modvault.io:v0.3")]
    V0_3,
}

impl FormatSpec {
    /// The format new submissions are validated against.
    pub const ACTIVE: FormatSpec = FormatSpec::V0_1;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V0_0 => "modvault.io:v0.0",
            Self::V0_1 => "modvault.io:v0.1",
            Self::V0_2 => "modvault.io:v0.2",
            Self::V0_3 => "modvault.io:v0.3",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "modvault.io:v0.0" => Some(Self::V0_0),
            "modvault.io:v0.1" => Some(Self::V0_1),
            "modvault.io:v0.2" => Some(Self::V0_2),
            "modvault.io:v0.3" => Some(Self::V0_3),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_status_round_trip() {
        for status in [
            ReviewStatus::Unreviewed,
            ReviewStatus::Approved,
            ReviewStatus::Rejected,
        ] {
            assert_eq!(ReviewStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn legacy_review_synonyms_collapse() {
        for legacy in ["skipped", "immune", "pending"] {
            assert_eq!(ReviewStatus::parse(legacy), Some(ReviewStatus::Unreviewed));
        }
    }

    #[test]
    fn user_media_status_round_trip() {
        for status in [
            UserMediaStatus::Initial,
            UserMediaStatus::UploadCreated,
            UserMediaStatus::UploadIssued,
            UserMediaStatus::UploadComplete,
            UserMediaStatus::UploadError,
        ] {
            assert_eq!(UserMediaStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn unknown_values_rejected() {
        assert_eq!(ReviewStatus::parse("maybe"), None);
        assert_eq!(SubmissionStatus::parse(""), None);
        assert_eq!(FormatSpec::parse("v9.9"), None);
    }
}
