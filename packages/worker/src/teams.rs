//! Team and namespace lifecycle.
//!
//! Every account gets a personal team at registration, with an owner
//! membership and a namespace matching the team name. Submissions
//! resolve the target namespace through this chain.

use chrono::{DateTime, Utc};
use common::entity::{namespace, team, team_member};
use common::enums::TeamRole;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};

use crate::error::WorkerError;

pub fn new_team(name: &str, now: DateTime<Utc>) -> team::ActiveModel {
    team::ActiveModel {
        name: Set(name.to_string()),
        donation_link: Set(None),
        is_active: Set(true),
        max_file_count_per_zip: Set(None),
        created_at: Set(now),
        ..Default::default()
    }
}

pub fn new_membership(
    team_id: i32,
    user_id: i32,
    role: TeamRole,
    now: DateTime<Utc>,
) -> team_member::ActiveModel {
    team_member::ActiveModel {
        team_id: Set(team_id),
        user_id: Set(user_id),
        role: Set(role.as_str().to_string()),
        created_at: Set(now),
    }
}

pub fn new_namespace(team_id: i32, name: &str, now: DateTime<Utc>) -> namespace::ActiveModel {
    namespace::ActiveModel {
        name: Set(name.to_string()),
        team_id: Set(team_id),
        created_at: Set(now),
        ..Default::default()
    }
}

/// Create the personal team for a new account: the team named after the
/// user, an owner membership, and the matching namespace.
pub async fn create_personal_team<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    name: &str,
) -> Result<(team::Model, namespace::Model), WorkerError> {
    let now = Utc::now();
    let team = new_team(name, now).insert(db).await?;
    new_membership(team.id, user_id, TeamRole::Owner, now)
        .insert(db)
        .await?;
    let ns = new_namespace(team.id, name, now).insert(db).await?;
    Ok((team, ns))
}

#[cfg(test)]
mod tests {
    use sea_orm::ActiveValue;

    use super::*;

    fn set<T: Clone + Into<sea_orm::Value>>(value: &ActiveValue<T>) -> T {
        match value {
            ActiveValue::Set(v) => v.clone(),
            _ => panic!("value not set"),
        }
    }

    #[test]
    fn personal_team_starts_active_and_unrestricted() {
        let team = new_team("Alyx", Utc::now());
        assert_eq!(set(&team.name), "Alyx");
        assert!(set(&team.is_active));
        assert_eq!(set(&team.max_file_count_per_zip), None);
    }

    #[test]
    fn registration_membership_is_an_ownership() {
        let membership = new_membership(3, 9, TeamRole::Owner, Utc::now());
        assert_eq!(set(&membership.team_id), 3);
        assert_eq!(set(&membership.user_id), 9);
        assert_eq!(set(&membership.role), "owner");
    }

    #[test]
    fn namespace_mirrors_the_team_name() {
        let ns = new_namespace(3, "Alyx", Utc::now());
        assert_eq!(set(&ns.team_id), 3);
        assert_eq!(set(&ns.name), "Alyx");
    }
}
