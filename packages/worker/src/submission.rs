//! The asynchronous package submission pipeline.
//!
//! Submissions are accepted instantly and processed in the background.
//! Processing is idempotent and safe to run concurrently: workers claim
//! the row with a skip-locked select and a claimed submission always
//! reaches the finished status, carrying either a result, field errors,
//! or the task-error flag.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use common::entity::{
    async_submission, community, namespace, package, package_category, package_listing,
    package_listing_category, package_version, package_version_dependency, team, team_member,
    user, user_media,
};
use common::enums::{FormatSpec, ReviewStatus, SubmissionStatus, UserMediaStatus};
use common::event::EventTopic;
use common::package_manifest::{FieldErrors, PackageManifest};
use common::task::TaskKind;
use common::visibility::{listing_visibility, package_visibility, version_visibility};
use sea_orm::sea_query::{Expr, ExprTrait, Func, LockBehavior, LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    IntoActiveModel, JoinType, QueryFilter, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::blobs::persist_blob;
use crate::context::RegistryContext;
use crate::error::WorkerError;
use crate::{icon, zipfile};

/// Largest accepted README or CHANGELOG.
pub const MAX_MARKDOWN_SIZE: usize = 100 * 1024;

/// A pending submission older than this is re-enqueued when polled.
pub const TASK_TTL_SECS: i64 = 300;

/// Submissions are retained this long past their finish or last poll.
pub const CLEANUP_TTL_SECS: i64 = 86400;

/// The submission form as accepted by the API and stored on the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionForm {
    /// Namespace to publish under.
    pub author_name: String,
    /// Community identifiers the package is listed in.
    pub communities: Vec<String>,
    /// Category slugs per community identifier.
    #[serde(default)]
    pub community_categories: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub has_nsfw_content: bool,
    /// A completed upload session holding the package archive.
    pub upload_uuid: Uuid,
}

/// Success payload recorded on a finished submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub namespace: String,
    pub name: String,
    pub version_number: String,
    pub download_url: String,
    pub listings: Vec<ListingBrief>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingBrief {
    pub community: String,
    pub review_status: String,
}

struct ProcessOutcome {
    result: SubmissionResult,
    version_id: i32,
    community_ids: Vec<i32>,
}

/// Accept a submission form and queue it for processing.
#[instrument(skip(ctx, form))]
pub async fn create_submission(
    ctx: &RegistryContext,
    user_id: i32,
    form: SubmissionForm,
) -> Result<async_submission::Model, WorkerError> {
    if form.communities.is_empty() {
        return Err(WorkerError::validation(
            "communities",
            "At least one community is required",
        ));
    }

    let now = Utc::now();
    let submission = async_submission::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_user_id: Set(user_id),
        status: Set(SubmissionStatus::Pending.as_str().to_string()),
        form_data: Set(serde_json::to_value(&form)?),
        result: Set(None),
        form_errors: Set(None),
        task_error: Set(false),
        last_polled_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let submission = submission.insert(&ctx.db).await?;

    ctx.schedule(TaskKind::ProcessSubmission {
        submission_id: submission.id,
    })
    .await?;

    Ok(submission)
}

/// Fetch a submission for its owner, recording the poll and re-enqueueing
/// stale pending work.
#[instrument(skip(ctx))]
pub async fn poll_submission(
    ctx: &RegistryContext,
    user_id: i32,
    submission_id: Uuid,
) -> Result<async_submission::Model, WorkerError> {
    let submission = async_submission::Entity::find_by_id(submission_id)
        .one(&ctx.db)
        .await?
        .ok_or_else(|| WorkerError::NotFound("Submission not found".into()))?;

    if submission.owner_user_id != user_id {
        return Err(WorkerError::PermissionDenied(
            "Submission belongs to another user".into(),
        ));
    }

    let stale = submission.status == SubmissionStatus::Pending.as_str()
        && submission.created_at < Utc::now() - Duration::seconds(TASK_TTL_SECS);

    let mut active = submission.into_active_model();
    active.last_polled_at = Set(Some(Utc::now()));
    let submission = active.update(&ctx.db).await?;

    if stale {
        ctx.schedule_best_effort(TaskKind::ProcessSubmission { submission_id })
            .await;
    }

    Ok(submission)
}

/// Process one submission to completion.
///
/// Returns without touching anything when another worker holds the row
/// or it has already finished.
#[instrument(skip(ctx))]
pub async fn process_submission(
    ctx: &RegistryContext,
    submission_id: Uuid,
) -> Result<(), WorkerError> {
    let txn = ctx.db.begin().await?;

    let submission = async_submission::Entity::find_by_id(submission_id)
        .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
        .one(&txn)
        .await?;
    let Some(submission) = submission else {
        txn.commit().await?;
        return Ok(());
    };
    if submission.status == SubmissionStatus::Finished.as_str() {
        txn.commit().await?;
        return Ok(());
    }

    let owner_user_id = submission.owner_user_id;
    let outcome = match serde_json::from_value::<SubmissionForm>(submission.form_data.clone()) {
        Ok(form) => run_pipeline(ctx, &txn, owner_user_id, &form).await,
        Err(e) => {
            let mut errors = FieldErrors::new();
            errors
                .entry("__all__".to_string())
                .or_default()
                .push(format!("Invalid submission data: {e}"));
            Err(WorkerError::Validation(errors))
        }
    };

    let mut active = submission.into_active_model();
    active.status = Set(SubmissionStatus::Finished.as_str().to_string());
    active.updated_at = Set(Utc::now());

    let post_commit = match outcome {
        Ok(outcome) => {
            active.result = Set(Some(serde_json::to_value(&outcome.result)?));
            Some(outcome)
        }
        Err(WorkerError::Validation(errors)) => {
            active.form_errors = Set(Some(serde_json::to_value(&errors)?));
            None
        }
        Err(e) => {
            error!(submission_id = %submission_id, "Submission processing failed: {e}");
            active.task_error = Set(true);
            None
        }
    };

    active.update(&txn).await?;
    txn.commit().await?;

    if let Some(outcome) = post_commit {
        info!(
            submission_id = %submission_id,
            version_id = outcome.version_id,
            "Submission accepted"
        );
        ctx.events
            .publish(
                EventTopic::Submissions,
                "submission.success",
                serde_json::json!({
                    "submission_id": submission_id,
                    "version_id": outcome.version_id,
                    "namespace": outcome.result.namespace,
                    "name": outcome.result.name,
                    "version_number": outcome.result.version_number,
                }),
            )
            .await;
        for community_id in outcome.community_ids {
            ctx.schedule_best_effort(TaskKind::RefreshCommunityCache { community_id })
                .await;
        }
    }

    Ok(())
}

async fn run_pipeline(
    ctx: &RegistryContext,
    txn: &DatabaseTransaction,
    user_id: i32,
    form: &SubmissionForm,
) -> Result<ProcessOutcome, WorkerError> {
    let mut errors = FieldErrors::new();

    let submitter = user::Entity::find_by_id(user_id)
        .one(txn)
        .await?
        .ok_or_else(|| WorkerError::Internal(format!("Submission owner {user_id} missing")))?;
    ensure_can_submit(&submitter)?;

    // The archive must come from a completed, unexpired upload session.
    let media = load_upload(txn, user_id, form).await?;
    let archive_data = ctx.storage.get_object(&media.key).await?;

    let (namespace, owning_team) = resolve_namespace(txn, user_id, form).await?;

    let max_file_count = owning_team
        .max_file_count_per_zip
        .map(|n| n as u32)
        .unwrap_or(ctx.repository.default_max_file_count_per_zip);
    let contents = zipfile::validate_and_extract(&archive_data, max_file_count)
        .map_err(WorkerError::Validation)?;

    let manifest_outcome = PackageManifest::parse_and_validate(&contents.manifest, &namespace.name);

    if let Err(e) = icon::validate_icon(&contents.icon) {
        add_error(&mut errors, "icon", e);
    }
    if let Err(e) = validate_markdown(&contents.readme) {
        add_error(&mut errors, "readme", e);
    }
    if let Some(changelog) = &contents.changelog
        && let Err(e) = validate_markdown(changelog)
    {
        add_error(&mut errors, "changelog", e);
    }

    let communities = resolve_communities(txn, form, &mut errors).await?;
    let categories = resolve_categories(txn, form, &communities, &mut errors).await?;

    let (manifest, dependency_refs) = match manifest_outcome {
        Ok(parsed) => parsed,
        Err(manifest_errors) => {
            merge_errors(&mut errors, manifest_errors);
            return Err(WorkerError::Validation(errors));
        }
    };
    if !errors.is_empty() {
        return Err(WorkerError::Validation(errors));
    }

    let dependency_ids = resolve_dependencies(txn, &dependency_refs, &mut errors).await?;

    let existing_package = find_package(txn, namespace.id, &manifest.name).await?;
    if let Some(existing) = &existing_package {
        let duplicate = package_version::Entity::find()
            .filter(package_version::Column::PackageId.eq(existing.id))
            .filter(package_version::Column::VersionNumber.eq(&manifest.version_number))
            .one(txn)
            .await?;
        if duplicate.is_some() {
            add_error(
                &mut errors,
                "version_number",
                format!(
                    "Version {} of {} already exists",
                    manifest.version_number, manifest.name
                ),
            );
        }
    }
    if !errors.is_empty() {
        return Err(WorkerError::Validation(errors));
    }

    // Everything validated; write the graph.
    let now = Utc::now();
    let pkg = match existing_package {
        Some(pkg) => pkg,
        None => {
            let flags = package_visibility(true, true);
            let pkg = package::ActiveModel {
                uuid4: Set(Uuid::new_v4()),
                name: Set(manifest.name.clone()),
                namespace_id: Set(namespace.id),
                is_active: Set(true),
                is_deprecated: Set(false),
                is_pinned: Set(false),
                latest_version_id: Set(None),
                public_list: Set(flags.public_list),
                public_detail: Set(flags.public_detail),
                owner_list: Set(flags.owner_list),
                owner_detail: Set(flags.owner_detail),
                moderator_list: Set(flags.moderator_list),
                moderator_detail: Set(flags.moderator_detail),
                admin_list: Set(flags.admin_list),
                admin_detail: Set(flags.admin_detail),
                date_created: Set(now),
                date_updated: Set(now),
                ..Default::default()
            };
            pkg.insert(txn).await?
        }
    };

    let archive_blob = persist_blob(
        txn,
        &*ctx.storage,
        &archive_data,
        Some("application/zip"),
        "pending_version",
        &pkg.id.to_string(),
        "archive",
    )
    .await?;
    let icon_blob = persist_blob(
        txn,
        &*ctx.storage,
        &contents.icon,
        Some("image/png"),
        "pending_version",
        &pkg.id.to_string(),
        "icon",
    )
    .await?;
    let readme_blob = persist_blob(
        txn,
        &*ctx.storage,
        &contents.readme,
        Some("text/markdown"),
        "pending_version",
        &pkg.id.to_string(),
        "readme",
    )
    .await?;
    let changelog_blob = match &contents.changelog {
        Some(changelog) => Some(
            persist_blob(
                txn,
                &*ctx.storage,
                changelog,
                Some("text/markdown"),
                "pending_version",
                &pkg.id.to_string(),
                "changelog",
            )
            .await?,
        ),
        None => None,
    };

    // The full file tree is recorded as refs too, so the contents of a
    // version can be listed without re-reading the archive.
    for entry in &contents.entries {
        persist_blob(
            txn,
            &*ctx.storage,
            &entry.data,
            None,
            "pending_version",
            &pkg.id.to_string(),
            &format!("files/{}", entry.path),
        )
        .await?;
    }

    let (major, minor, patch) = common::validators::validate_version_number(
        &manifest.version_number,
    )
    .map_err(|e| WorkerError::validation("version_number", &e))?;

    let version_flags = version_visibility(true, pkg.is_active, ReviewStatus::Unreviewed, false);
    let version = package_version::ActiveModel {
        uuid4: Set(Uuid::new_v4()),
        package_id: Set(pkg.id),
        name: Set(manifest.name.clone()),
        version_number: Set(manifest.version_number.clone()),
        major: Set(major as i64),
        minor: Set(minor as i64),
        patch: Set(patch as i64),
        description: Set(manifest.description.clone()),
        website_url: Set(manifest.website_url.clone()),
        format_spec: Set(FormatSpec::ACTIVE.as_str().to_string()),
        file_hash: Set(archive_blob.checksum.to_hex()),
        file_size: Set(archive_blob.size as i64),
        icon_hash: Set(icon_blob.checksum.to_hex()),
        readme_hash: Set(readme_blob.checksum.to_hex()),
        changelog_hash: Set(changelog_blob.map(|b| b.checksum.to_hex())),
        is_active: Set(true),
        review_status: Set(ReviewStatus::Unreviewed.as_str().to_string()),
        downloads: Set(0),
        public_list: Set(version_flags.public_list),
        public_detail: Set(version_flags.public_detail),
        owner_list: Set(version_flags.owner_list),
        owner_detail: Set(version_flags.owner_detail),
        moderator_list: Set(version_flags.moderator_list),
        moderator_detail: Set(version_flags.moderator_detail),
        admin_list: Set(version_flags.admin_list),
        admin_detail: Set(version_flags.admin_detail),
        uploaded_by_user_id: Set(Some(user_id)),
        date_created: Set(now),
        ..Default::default()
    };
    let version = version.insert(txn).await?;

    // Re-home the blob refs now that the version id exists.
    rehome_refs(txn, &pkg.id.to_string(), &version.id.to_string()).await?;

    for dependency_id in &dependency_ids {
        let edge = package_version_dependency::ActiveModel {
            version_id: Set(version.id),
            dependency_id: Set(*dependency_id),
        };
        package_version_dependency::Entity::insert(edge)
            .on_conflict(
                OnConflict::columns([
                    package_version_dependency::Column::VersionId,
                    package_version_dependency::Column::DependencyId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(txn)
            .await?;
    }

    let pkg_flags = package_visibility(pkg.is_active, true);
    let mut listings = Vec::with_capacity(communities.len());
    for comm in &communities {
        let listing_flags = listing_visibility(
            pkg_flags,
            ReviewStatus::Unreviewed,
            comm.require_package_listing_approval,
        );
        let existing = package_listing::Entity::find()
            .filter(package_listing::Column::PackageId.eq(pkg.id))
            .filter(package_listing::Column::CommunityId.eq(comm.id))
            .one(txn)
            .await?;
        let listing = match existing {
            Some(listing) => listing,
            None => {
                let listing = package_listing::ActiveModel {
                    package_id: Set(pkg.id),
                    community_id: Set(comm.id),
                    review_status: Set(ReviewStatus::Unreviewed.as_str().to_string()),
                    rejection_reason: Set(None),
                    notes: Set(None),
                    has_nsfw_content: Set(form.has_nsfw_content),
                    public_list: Set(listing_flags.public_list),
                    public_detail: Set(listing_flags.public_detail),
                    owner_list: Set(listing_flags.owner_list),
                    owner_detail: Set(listing_flags.owner_detail),
                    moderator_list: Set(listing_flags.moderator_list),
                    moderator_detail: Set(listing_flags.moderator_detail),
                    admin_list: Set(listing_flags.admin_list),
                    admin_detail: Set(listing_flags.admin_detail),
                    date_created: Set(now),
                    date_updated: Set(now),
                    ..Default::default()
                };
                listing.insert(txn).await?
            }
        };

        if let Some(category_ids) = categories.get(&comm.id) {
            for category_id in category_ids {
                let link = package_listing_category::ActiveModel {
                    listing_id: Set(listing.id),
                    category_id: Set(*category_id),
                };
                package_listing_category::Entity::insert(link)
                    .on_conflict(
                        OnConflict::columns([
                            package_listing_category::Column::ListingId,
                            package_listing_category::Column::CategoryId,
                        ])
                        .do_nothing()
                        .to_owned(),
                    )
                    .exec_without_returning(txn)
                    .await?;
            }
        }

        listings.push(ListingBrief {
            community: comm.identifier.clone(),
            review_status: listing.review_status,
        });
    }

    let mut pkg_active = pkg.clone().into_active_model();
    pkg_active.latest_version_id = Set(Some(version.id));
    pkg_active.date_updated = Set(now);
    pkg_active.update(txn).await?;

    // The consumed upload session is spent; reap it now rather than
    // waiting for expiry.
    ctx.storage.delete_object(&media.key).await?;
    user_media::Entity::delete_by_id(media.uuid).exec(txn).await?;

    Ok(ProcessOutcome {
        result: SubmissionResult {
            namespace: namespace.name.clone(),
            name: manifest.name.clone(),
            version_number: manifest.version_number.clone(),
            download_url: format!(
                "/package/download/{}/{}/{}/",
                namespace.name, manifest.name, manifest.version_number
            ),
            listings,
        },
        version_id: version.id,
        community_ids: communities.iter().map(|c| c.id).collect(),
    })
}

/// Delete submissions whose finish or last poll is past the retention
/// window.
#[instrument(skip(ctx))]
pub async fn cleanup_submissions(ctx: &RegistryContext) -> Result<u64, WorkerError> {
    let result = async_submission::Entity::delete_many()
        .filter(cleanup_condition(Utc::now()))
        .exec(&ctx.db)
        .await?;

    if result.rows_affected > 0 {
        info!(removed = result.rows_affected, "Stale submissions cleaned up");
    }
    Ok(result.rows_affected)
}

// The row's updated_at is last written when it reaches the finished
// status, so it stands in for the finish time.
fn cleanup_condition(now: chrono::DateTime<Utc>) -> Condition {
    let cutoff = now - Duration::seconds(CLEANUP_TTL_SECS);
    Condition::any()
        .add(
            Condition::all()
                .add(async_submission::Column::Status.eq(SubmissionStatus::Finished.as_str()))
                .add(async_submission::Column::UpdatedAt.lt(cutoff)),
        )
        .add(async_submission::Column::LastPolledAt.lt(cutoff))
}

/// Service accounts hold API tokens for CI and bots; publishing has to
/// go through a real member of the team.
fn ensure_can_submit(submitter: &user::Model) -> Result<(), WorkerError> {
    if submitter.is_service_account {
        return Err(WorkerError::validation(
            "__all__",
            "Service accounts cannot submit packages",
        ));
    }
    Ok(())
}

async fn load_upload(
    txn: &DatabaseTransaction,
    user_id: i32,
    form: &SubmissionForm,
) -> Result<user_media::Model, WorkerError> {
    let media = user_media::Entity::find_by_id(form.upload_uuid)
        .one(txn)
        .await?
        .ok_or_else(|| WorkerError::validation("upload_uuid", "Upload not found"))?;

    if media.owner_user_id != Some(user_id) {
        return Err(WorkerError::validation(
            "upload_uuid",
            "Upload belongs to another user",
        ));
    }
    if UserMediaStatus::parse(&media.status) != Some(UserMediaStatus::UploadComplete) {
        return Err(WorkerError::validation(
            "upload_uuid",
            "Upload has not been completed",
        ));
    }
    if media.expiry < Utc::now() {
        return Err(WorkerError::validation("upload_uuid", "Upload has expired"));
    }
    Ok(media)
}

async fn resolve_namespace(
    txn: &DatabaseTransaction,
    user_id: i32,
    form: &SubmissionForm,
) -> Result<(namespace::Model, team::Model), WorkerError> {
    let ns = namespace::Entity::find()
        .filter(namespace::Column::Name.eq(&form.author_name))
        .one(txn)
        .await?
        .ok_or_else(|| WorkerError::validation("author_name", "Namespace does not exist"))?;

    let owning_team = team::Entity::find_by_id(ns.team_id)
        .one(txn)
        .await?
        .ok_or_else(|| WorkerError::Internal(format!("Namespace {} has no team", ns.name)))?;

    let membership = team_member::Entity::find()
        .filter(team_member::Column::TeamId.eq(owning_team.id))
        .filter(team_member::Column::UserId.eq(user_id))
        .one(txn)
        .await?;
    if membership.is_none() {
        return Err(WorkerError::validation(
            "author_name",
            "You do not have permission to upload under this namespace",
        ));
    }
    if !owning_team.is_active {
        return Err(WorkerError::validation(
            "author_name",
            "The team is deactivated and cannot receive uploads",
        ));
    }

    Ok((ns, owning_team))
}

async fn resolve_communities(
    txn: &DatabaseTransaction,
    form: &SubmissionForm,
    errors: &mut FieldErrors,
) -> Result<Vec<community::Model>, WorkerError> {
    let mut communities = Vec::with_capacity(form.communities.len());
    for identifier in &form.communities {
        match community::Entity::find()
            .filter(community::Column::Identifier.eq(identifier))
            .one(txn)
            .await?
        {
            Some(comm) => communities.push(comm),
            None => add_error(
                errors,
                "communities",
                format!("Community {identifier} does not exist"),
            ),
        }
    }
    Ok(communities)
}

async fn resolve_categories(
    txn: &DatabaseTransaction,
    form: &SubmissionForm,
    communities: &[community::Model],
    errors: &mut FieldErrors,
) -> Result<HashMap<i32, Vec<i32>>, WorkerError> {
    let mut resolved: HashMap<i32, Vec<i32>> = HashMap::new();
    for (identifier, slugs) in &form.community_categories {
        let Some(comm) = communities.iter().find(|c| &c.identifier == identifier) else {
            add_error(
                errors,
                "community_categories",
                format!("Categories given for unselected community {identifier}"),
            );
            continue;
        };
        for slug in slugs {
            match package_category::Entity::find()
                .filter(package_category::Column::CommunityId.eq(comm.id))
                .filter(package_category::Column::Slug.eq(slug))
                .one(txn)
                .await?
            {
                Some(category) => resolved.entry(comm.id).or_default().push(category.id),
                None => add_error(
                    errors,
                    "community_categories",
                    format!("Category {slug} does not exist in community {identifier}"),
                ),
            }
        }
    }
    Ok(resolved)
}

async fn resolve_dependencies(
    txn: &DatabaseTransaction,
    references: &[common::PackageReference],
    errors: &mut FieldErrors,
) -> Result<Vec<i32>, WorkerError> {
    let mut ids = Vec::with_capacity(references.len());
    for reference in references {
        let found = package_version::Entity::find()
            .filter(package_version::Column::VersionNumber.eq(reference.version_string()))
            .filter(package_version::Column::Name.eq(&reference.name))
            .filter(package_version::Column::IsActive.eq(true))
            .inner_join(package::Entity)
            .join(JoinType::InnerJoin, package::Relation::Namespace.def())
            .filter(namespace::Column::Name.eq(&reference.namespace))
            .one(txn)
            .await?;
        match found {
            Some(version) => ids.push(version.id),
            None => add_error(
                errors,
                "dependencies",
                format!("Dependency {reference} does not exist"),
            ),
        }
    }
    Ok(ids)
}

async fn find_package(
    txn: &DatabaseTransaction,
    namespace_id: i32,
    name: &str,
) -> Result<Option<package::Model>, WorkerError> {
    // Case-insensitive match; "Mod" and "mod" are the same package.
    Ok(package::Entity::find()
        .filter(package::Column::NamespaceId.eq(namespace_id))
        .filter(
            Expr::expr(Func::lower(Expr::col(package::Column::Name))).eq(name.to_lowercase()),
        )
        .one(txn)
        .await?)
}

async fn rehome_refs<C: ConnectionTrait>(
    db: &C,
    pending_owner_id: &str,
    version_id: &str,
) -> Result<(), WorkerError> {
    use common::entity::data_blob_ref;
    data_blob_ref::Entity::update_many()
        .col_expr(
            data_blob_ref::Column::OwnerType,
            Expr::value("package_version"),
        )
        .col_expr(data_blob_ref::Column::OwnerId, Expr::value(version_id))
        .filter(data_blob_ref::Column::OwnerType.eq("pending_version"))
        .filter(data_blob_ref::Column::OwnerId.eq(pending_owner_id))
        .exec(db)
        .await?;
    Ok(())
}

fn validate_markdown(data: &[u8]) -> Result<(), String> {
    if data.len() > MAX_MARKDOWN_SIZE {
        return Err(format!(
            "File exceeds the maximum size of {MAX_MARKDOWN_SIZE} bytes"
        ));
    }
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return Err("File must not start with a byte order mark".to_string());
    }
    std::str::from_utf8(data)
        .map(|_| ())
        .map_err(|_| "File must be UTF-8 text".to_string())
}

fn add_error(errors: &mut FieldErrors, field: &str, message: String) {
    errors.entry(field.to_string()).or_default().push(message);
}

fn merge_errors(into: &mut FieldErrors, from: FieldErrors) {
    for (field, messages) in from {
        into.entry(field).or_default().extend(messages);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_round_trips_through_json() {
        let form = SubmissionForm {
            author_name: "Some_Team".into(),
            communities: vec!["riskofrain2".into()],
            community_categories: HashMap::from([(
                "riskofrain2".into(),
                vec!["mods".into(), "tools".into()],
            )]),
            has_nsfw_content: false,
            upload_uuid: Uuid::new_v4(),
        };
        let value = serde_json::to_value(&form).unwrap();
        let parsed: SubmissionForm = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.author_name, form.author_name);
        assert_eq!(parsed.communities, form.communities);
        assert_eq!(parsed.upload_uuid, form.upload_uuid);
    }

    #[test]
    fn form_defaults_apply() {
        let value = serde_json::json!({
            "author_name": "Team",
            "communities": ["ror2"],
            "upload_uuid": Uuid::new_v4(),
        });
        let parsed: SubmissionForm = serde_json::from_value(value).unwrap();
        assert!(parsed.community_categories.is_empty());
        assert!(!parsed.has_nsfw_content);
    }

    #[test]
    fn markdown_size_limit() {
        assert!(validate_markdown(b"# fine").is_ok());
        assert!(validate_markdown(&vec![b'a'; MAX_MARKDOWN_SIZE + 1]).is_err());
        assert!(validate_markdown(b"\xEF\xBB\xBF# bom").is_err());
        assert!(validate_markdown(&[0x80, 0x81]).is_err());
    }

    fn account(is_service_account: bool) -> user::Model {
        user::Model {
            id: 7,
            username: "ci-bot".into(),
            password: "hash".into(),
            is_service_account,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn service_accounts_cannot_submit() {
        let err = ensure_can_submit(&account(true)).unwrap_err();
        match err {
            WorkerError::Validation(errors) => {
                assert!(errors["__all__"][0].contains("Service accounts"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(ensure_can_submit(&account(false)).is_ok());
    }

    #[test]
    fn cleanup_keys_on_finish_and_poll_times() {
        use sea_orm::{DbBackend, QueryTrait};

        let now = Utc::now();
        let sql = async_submission::Entity::delete_many()
            .filter(cleanup_condition(now))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains("\"updated_at\""));
        assert!(sql.contains("\"last_polled_at\""));
        assert!(!sql.contains("\"created_at\""));
        // Both branches share the one retention cutoff.
        let cutoff = (now - Duration::seconds(CLEANUP_TTL_SECS))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert_eq!(sql.matches(&cutoff).count(), 2);
    }
}
