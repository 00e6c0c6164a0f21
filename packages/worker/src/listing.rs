//! Package-level actions: deprecation and ratings.

use chrono::Utc;
use common::entity::{
    community_membership, namespace, package, package_listing, package_rating, team_member,
};
use common::event::EventTopic;
use common::task::TaskKind;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    Select, Set,
};
use tracing::instrument;

use crate::context::RegistryContext;
use crate::error::WorkerError;

/// Look up a package through its namespace name.
pub async fn find_package(
    ctx: &RegistryContext,
    namespace_name: &str,
    package_name: &str,
) -> Result<(namespace::Model, package::Model), WorkerError> {
    let ns = namespace::Entity::find()
        .filter(namespace::Column::Name.eq(namespace_name))
        .one(&ctx.db)
        .await?
        .ok_or_else(|| WorkerError::NotFound("Package not found".into()))?;
    let pkg = package::Entity::find()
        .filter(package::Column::NamespaceId.eq(ns.id))
        .filter(package::Column::Name.eq(package_name))
        .one(&ctx.db)
        .await?
        .ok_or_else(|| WorkerError::NotFound("Package not found".into()))?;
    Ok((ns, pkg))
}

/// Whether the user may manage the package: a member of the owning team,
/// or a moderator of any community it is listed in.
pub async fn can_manage_package(
    ctx: &RegistryContext,
    user_id: i32,
    pkg: &package::Model,
) -> Result<bool, WorkerError> {
    let ns = namespace::Entity::find_by_id(pkg.namespace_id)
        .one(&ctx.db)
        .await?
        .ok_or_else(|| WorkerError::Internal("Package has no namespace".into()))?;

    let is_member = team_member::Entity::find()
        .filter(team_member::Column::TeamId.eq(ns.team_id))
        .filter(team_member::Column::UserId.eq(user_id))
        .one(&ctx.db)
        .await?
        .is_some();
    if is_member {
        return Ok(true);
    }

    let listings = package_listing::Entity::find()
        .filter(package_listing::Column::PackageId.eq(pkg.id))
        .all(&ctx.db)
        .await?;
    for listing in listings {
        let moderates = moderator_query(listing.community_id, user_id)
            .one(&ctx.db)
            .await?
            .is_some();
        if moderates {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Membership alone does not grant management rights; janitors can only
/// reorder listings, so only the moderator role counts here.
fn moderator_query(community_id: i32, user_id: i32) -> Select<community_membership::Entity> {
    community_membership::Entity::find()
        .filter(community_membership::Column::CommunityId.eq(community_id))
        .filter(community_membership::Column::UserId.eq(user_id))
        .filter(community_membership::Column::Role.eq("moderator"))
}

/// Set or clear the deprecation flag. Idempotent; cache refreshes are
/// scheduled for every community the package is listed in.
#[instrument(skip(ctx))]
pub async fn set_deprecation(
    ctx: &RegistryContext,
    user_id: i32,
    namespace_name: &str,
    package_name: &str,
    deprecated: bool,
) -> Result<package::Model, WorkerError> {
    let (ns, pkg) = find_package(ctx, namespace_name, package_name).await?;

    if !can_manage_package(ctx, user_id, &pkg).await? {
        return Err(WorkerError::PermissionDenied(
            "You do not have permission to manage this package".into(),
        ));
    }

    if pkg.is_deprecated == deprecated {
        return Ok(pkg);
    }

    let package_id = pkg.id;
    let mut active = pkg.into_active_model();
    active.is_deprecated = Set(deprecated);
    active.date_updated = Set(Utc::now());
    let pkg = active.update(&ctx.db).await?;

    ctx.events
        .publish(
            EventTopic::Moderation,
            if deprecated {
                "listing.deprecated"
            } else {
                "listing.undeprecated"
            },
            serde_json::json!({
                "action": if deprecated { "deprecate" } else { "undeprecate" },
                "namespace": ns.name,
                "name": pkg.name,
                "user_id": user_id,
            }),
        )
        .await;

    let listings = package_listing::Entity::find()
        .filter(package_listing::Column::PackageId.eq(package_id))
        .all(&ctx.db)
        .await?;
    for listing in listings {
        ctx.schedule_best_effort(TaskKind::RefreshCommunityCache {
            community_id: listing.community_id,
        })
        .await;
    }

    Ok(pkg)
}

/// Apply a rating target state. Both directions are idempotent. Returns
/// the package's resulting score.
#[instrument(skip(ctx))]
pub async fn rate_package(
    ctx: &RegistryContext,
    user_id: i32,
    namespace_name: &str,
    package_name: &str,
    target_state: &str,
) -> Result<(String, u64), WorkerError> {
    let (_, pkg) = find_package(ctx, namespace_name, package_name).await?;

    match target_state {
        "rated" => {
            let rating = package_rating::ActiveModel {
                package_id: Set(pkg.id),
                user_id: Set(user_id),
                created_at: Set(Utc::now()),
            };
            package_rating::Entity::insert(rating)
                .on_conflict(
                    OnConflict::columns([
                        package_rating::Column::PackageId,
                        package_rating::Column::UserId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&ctx.db)
                .await?;
        }
        "unrated" => {
            package_rating::Entity::delete_by_id((pkg.id, user_id))
                .exec(&ctx.db)
                .await?;
        }
        other => {
            return Err(WorkerError::validation(
                "target_state",
                &format!("Invalid target state: {other}"),
            ));
        }
    }

    let score = package_rating::Entity::find()
        .filter(package_rating::Column::PackageId.eq(pkg.id))
        .count(&ctx.db)
        .await?;
    Ok((target_state.to_string(), score))
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, QueryTrait};

    use super::*;

    #[test]
    fn community_rights_require_the_moderator_role() {
        let sql = moderator_query(7, 42)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains("\"community_id\" = 7"));
        assert!(sql.contains("\"user_id\" = 42"));
        assert!(sql.contains("'moderator'"));
    }
}
