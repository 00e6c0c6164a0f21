//! Download metering.
//!
//! Every request bumps a per-client raw total; the public download
//! counter only moves when the same client comes back outside the dedup
//! window. Counted downloads also produce an analytics event.

use chrono::{Duration, Utc};
use common::entity::{download_event, download_tracker, package_version};
use common::event::EventTopic;
use sea_orm::sea_query::{Expr, ExprTrait, OnConflict};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TryInsertResult};
use sha2::{Digest, Sha256};
use tracing::instrument;
use uuid::Uuid;

use crate::context::RegistryContext;
use crate::error::WorkerError;

/// Opaque client identity for dedup, derived from the source address
/// alone. The address is never stored raw.
pub fn client_id(remote_addr: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(remote_addr.as_bytes());
    hex::encode(hasher.finalize())
}

/// Record one download request. Returns whether it was counted.
#[instrument(skip(ctx, client))]
pub async fn record_download(
    ctx: &RegistryContext,
    version_id: i32,
    client: &str,
) -> Result<bool, WorkerError> {
    let now = Utc::now();
    let window_start = now - Duration::seconds(ctx.repository.download_metrics_ttl_secs);

    let fresh = download_tracker::ActiveModel {
        version_id: Set(version_id),
        client_id: Set(client.to_string()),
        total: Set(1),
        counted: Set(1),
        first_download: Set(now),
        last_download: Set(now),
    };
    let insert = download_tracker::Entity::insert(fresh)
        .on_conflict(
            OnConflict::columns([
                download_tracker::Column::VersionId,
                download_tracker::Column::ClientId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .do_nothing()
        .exec(&ctx.db)
        .await?;

    let counted = match insert {
        TryInsertResult::Inserted(_) => true,
        _ => {
            // Existing tracker: the raw total always moves, the counted
            // total only outside the window.
            download_tracker::Entity::update_many()
                .col_expr(
                    download_tracker::Column::Total,
                    Expr::col(download_tracker::Column::Total).add(1),
                )
                .filter(download_tracker::Column::VersionId.eq(version_id))
                .filter(download_tracker::Column::ClientId.eq(client))
                .exec(&ctx.db)
                .await?;

            let result = download_tracker::Entity::update_many()
                .col_expr(
                    download_tracker::Column::Counted,
                    Expr::col(download_tracker::Column::Counted).add(1),
                )
                .col_expr(download_tracker::Column::LastDownload, Expr::value(now))
                .filter(download_tracker::Column::VersionId.eq(version_id))
                .filter(download_tracker::Column::ClientId.eq(client))
                .filter(download_tracker::Column::LastDownload.lte(window_start))
                .exec(&ctx.db)
                .await?;
            result.rows_affected > 0
        }
    };

    if counted {
        package_version::Entity::update_many()
            .col_expr(
                package_version::Column::Downloads,
                Expr::col(package_version::Column::Downloads).add(1),
            )
            .filter(package_version::Column::Id.eq(version_id))
            .exec(&ctx.db)
            .await?;

        let event_id = Uuid::new_v4();
        let event = download_event::ActiveModel {
            id: Set(event_id),
            version_id: Set(version_id),
            timestamp: Set(now),
        };
        event.insert(&ctx.db).await?;

        ctx.events
            .publish(
                EventTopic::Downloads,
                "package.downloaded",
                serde_json::json!({
                    "id": event_id,
                    "version_id": version_id,
                    "timestamp": now,
                }),
            )
            .await;
    }

    Ok(counted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_is_stable_and_opaque() {
        let a = client_id("203.0.113.9");
        let b = client_id("203.0.113.9");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(!a.contains("203"));
    }

    #[test]
    fn client_id_keyed_on_address_only() {
        // Two requests from the same address share one tracker row no
        // matter what else differs about them.
        assert_eq!(client_id("203.0.113.9"), client_id("203.0.113.9"));
        assert_ne!(client_id("203.0.113.9"), client_id("203.0.113.10"));
    }
}
