use common::entity::community;
use sea_orm::*;
use tracing::info;

/// Communities seeded on startup. Listings can only target communities
/// that exist, so a fresh install gets one to publish into.
const DEFAULT_COMMUNITIES: &[(&str, &str)] = &[("default", "Default")];

/// Seed the `community` table with defaults.
pub async fn seed_communities(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut inserted = 0u32;
    for &(identifier, name) in DEFAULT_COMMUNITIES {
        let model = community::ActiveModel {
            identifier: Set(identifier.to_string()),
            name: Set(name.to_string()),
            is_listed: Set(true),
            require_package_listing_approval: Set(false),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        let result = community::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(community::Column::Identifier)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} new communities", inserted);
    }

    Ok(())
}
