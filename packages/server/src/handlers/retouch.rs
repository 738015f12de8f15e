use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::archive_job::{ArchiveJob, ProductFolder};
use common::operation_type::audit_operation_for;
use common::worker::{TASK_ARCHIVE, Task};
use common::{OperationType, RetouchRequestStatus, RetouchStatus, SeniorRetouchStatus};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::*;
use tracing::{debug, error, info, instrument, warn};

use crate::entity::{retouch_request, retouch_request_product, shooting_request_product, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::retouch::*;
use crate::models::shared::Pagination;
use crate::notify::OutboundEvent;
use crate::state::AppState;

use super::order::NUMBER_ALLOC_RETRIES;

async fn next_request_number<C: ConnectionTrait>(db: &C) -> Result<i32, AppError> {
    let max: Option<Option<i32>> = retouch_request::Entity::find()
        .select_only()
        .column_as(retouch_request::Column::RequestNumber.max(), "max_number")
        .into_tuple()
        .one(db)
        .await?;
    Ok(max.flatten().unwrap_or(0) + 1)
}

async fn find_request<C: ConnectionTrait>(
    db: &C,
    number: i32,
) -> Result<retouch_request::Model, AppError> {
    retouch_request::Entity::find()
        .filter(retouch_request::Column::RequestNumber.eq(number))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Retouch request {number} not found")))
}

async fn find_request_locked<C: ConnectionTrait>(
    db: &C,
    number: i32,
) -> Result<retouch_request::Model, AppError> {
    retouch_request::Entity::find()
        .filter(retouch_request::Column::RequestNumber.eq(number))
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Retouch request {number} not found")))
}

async fn request_lines<C: ConnectionTrait>(
    db: &C,
    request_id: i32,
) -> Result<Vec<retouch_request_product::Model>, AppError> {
    Ok(retouch_request_product::Entity::find()
        .filter(retouch_request_product::Column::RetouchRequestId.eq(request_id))
        .order_by_asc(retouch_request_product::Column::Id)
        .all(db)
        .await?)
}

/// Resolve line rows to responses, pulling each line's barcode from its
/// source shooting row.
async fn lines_with_barcodes<C: ConnectionTrait>(
    db: &C,
    lines: Vec<retouch_request_product::Model>,
) -> Result<Vec<RetouchProductResponse>, AppError> {
    let st_ids: Vec<i32> = lines.iter().map(|l| l.st_product_id).collect();
    let sources = shooting_request_product::Entity::find()
        .filter(shooting_request_product::Column::Id.is_in(st_ids))
        .all(db)
        .await?;

    Ok(lines
        .into_iter()
        .map(|line| {
            let barcode = sources
                .iter()
                .find(|s| s.id == line.st_product_id)
                .map(|s| s.barcode.clone())
                .unwrap_or_default();
            RetouchProductResponse::from_parts(line, barcode)
        })
        .collect())
}

async fn build_response<C: ConnectionTrait>(
    db: &C,
    request: retouch_request::Model,
) -> Result<RetouchRequestResponse, AppError> {
    let lines = request_lines(db, request.id).await?;
    let products = lines_with_barcodes(db, lines).await?;
    Ok(RetouchRequestResponse::from_parts(request, products))
}

fn can_touch(auth_user: &AuthUser, request: &retouch_request::Model) -> Result<(), AppError> {
    if request.retoucher_id == auth_user.user_id || auth_user.has_permission("retouch:view_all") {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

/// Stamp the archive bookkeeping and enqueue the build. Best-effort:
/// runs after the owning transaction commits, failures are logged and
/// left for the download endpoint to reschedule.
async fn schedule_archive(state: &AppState, request: &retouch_request::Model) {
    let Some(ref mq) = state.mq else {
        debug!("MQ unavailable, skipping archive scheduling");
        return;
    };

    let lines = match request_lines(&state.db, request.id).await {
        Ok(lines) => lines,
        Err(e) => {
            error!(error = ?e, "DB error fetching lines for archive job");
            return;
        }
    };
    let st_ids: Vec<i32> = lines.iter().map(|l| l.st_product_id).collect();
    let sources = match shooting_request_product::Entity::find()
        .filter(shooting_request_product::Column::Id.is_in(st_ids))
        .all(&state.db)
        .await
    {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "DB error fetching source rows for archive job");
            return;
        }
    };

    let folders: Vec<ProductFolder> = sources
        .into_iter()
        .filter_map(|s| {
            s.photo_folder.map(|folder| ProductFolder {
                barcode: s.barcode,
                folder,
            })
        })
        .collect();

    let job = ArchiveJob::new(
        request.id,
        request.request_number,
        folders,
        state.config.archive.timeout_secs,
    );

    let mut active: retouch_request::ActiveModel = request.clone().into();
    active.archive_task_id = Set(Some(job.job_id.clone()));
    active.archive_started_at = Set(Some(Utc::now()));
    active.archive_completed_at = Set(None);
    active.archive_path = Set(None);
    active.archive_error = Set(None);
    if let Err(e) = active.update(&state.db).await {
        error!(error = %e, "Failed to stamp archive task");
        return;
    }

    let task = match Task::wrap(TASK_ARCHIVE, &job) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to serialize archive job");
            return;
        }
    };

    match mq
        .publish(&state.config.mq.task_queue_name, None, &task, None)
        .await
    {
        Ok(_) => {
            info!(job_id = %job.job_id, request_number = request.request_number, "Archive job enqueued");
        }
        Err(e) => {
            warn!(error = %e, "Failed to enqueue archive job");
        }
    }
}

/// Create a retouch request (batch assignment).
#[utoipa::path(
    post,
    path = "/",
    tag = "Retouch",
    operation_id = "createRetouchRequest",
    summary = "Assign a batch of shot products to a retoucher",
    description = "All-or-nothing: every product must currently be off-retouch, otherwise the whole request fails and nothing is written. On success the products are flagged, audited, and the archive build plus the assignment notification fire after commit. Requires `retouch:assign` permission.",
    request_body = CreateRetouchRequest,
    responses(
        (status = 201, description = "Request created", body = RetouchRequestResponse),
        (status = 400, description = "Validation or eligibility error (VALIDATION_ERROR, STATE_CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Retoucher not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(retoucher_id = payload.retoucher_id, count = payload.st_request_product_ids.len()))]
pub async fn create_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRetouchRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("retouch:assign")?;
    validate_create_retouch_request(&payload)?;

    let requested = payload.st_request_product_ids.len();

    // Postgres aborts the transaction on a unique violation, so the
    // number-allocation retry wraps the whole assignment.
    for attempt in 0..NUMBER_ALLOC_RETRIES {
        let txn = state.db.begin().await?;

        user::Entity::find_by_id(payload.retoucher_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Retoucher {} not found", payload.retoucher_id))
            })?;

        // Locking the eligible rows closes the race where two seniors
        // assign the same product concurrently.
        let eligible = shooting_request_product::Entity::find()
            .filter(
                shooting_request_product::Column::Id.is_in(payload.st_request_product_ids.clone()),
            )
            .filter(shooting_request_product::Column::OnRetouch.eq(false))
            .lock(LockType::Update)
            .all(&txn)
            .await?;

        if eligible.len() != requested {
            return Err(AppError::StateConflict(format!(
                "{} of {} products are already on retouch or missing",
                requested - eligible.len(),
                requested
            )));
        }

        let number = next_request_number(&txn).await?;
        let new_request = retouch_request::ActiveModel {
            request_number: Set(number),
            status: Set(RetouchRequestStatus::InProgress),
            retoucher_id: Set(payload.retoucher_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let request = match new_request.insert(&txn).await {
            Ok(model) => model,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                debug!(attempt, number, "Retouch number collision, retrying");
                txn.rollback().await.ok();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let lines: Vec<retouch_request_product::ActiveModel> = eligible
            .iter()
            .map(|source| retouch_request_product::ActiveModel {
                retouch_request_id: Set(request.id),
                st_product_id: Set(source.id),
                retouch_status: Set(RetouchStatus::InWork),
                senior_retouch_status: Set(None),
                ..Default::default()
            })
            .collect();
        retouch_request_product::Entity::insert_many(lines)
            .exec_without_returning(&txn)
            .await?;

        shooting_request_product::Entity::update_many()
            .col_expr(
                shooting_request_product::Column::OnRetouch,
                Expr::value(true),
            )
            .filter(
                shooting_request_product::Column::Id.is_in(payload.st_request_product_ids.clone()),
            )
            .exec(&txn)
            .await?;

        for source in &eligible {
            super::product::write_operation(
                &txn,
                &source.barcode,
                OperationType::RetouchAssigned,
                Some(auth_user.user_id),
                Some(format!("Retouch request {number}")),
            )
            .await?;
        }

        txn.commit().await?;

        // Deferred side effects: never fire against a rolled-back assignment.
        schedule_archive(&state, &request).await;
        state
            .notifier
            .send(&state.db, OutboundEvent::AssignmentCreated {
                retoucher_id: request.retoucher_id,
                request_number: number,
                product_count: requested,
            })
            .await;

        let response = build_response(&state.db, request).await?;
        return Ok((StatusCode::CREATED, Json(response)));
    }

    Err(AppError::Internal(
        "Could not allocate a request number".into(),
    ))
}

/// List retouch requests.
#[utoipa::path(
    get,
    path = "/",
    tag = "Retouch",
    operation_id = "listRetouchRequests",
    summary = "List retouch requests",
    description = "Retouchers see their own requests; `retouch:view_all` sees everything.",
    params(RetouchListQuery),
    responses(
        (status = 200, description = "Paginated requests", body = RetouchListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_requests(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<RetouchListQuery>,
) -> Result<Json<RetouchListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let mut find = retouch_request::Entity::find();
    if !auth_user.has_permission("retouch:view_all") {
        find = find.filter(retouch_request::Column::RetoucherId.eq(auth_user.user_id));
    }
    if let Some(status_id) = query.status {
        find = find.filter(retouch_request::Column::Status.eq(parse_request_status(status_id)?));
    }

    let paginator = find
        .order_by_desc(retouch_request::Column::CreatedAt)
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let total_pages = Ord::max(total.div_ceil(per_page), 1);
    let requests = paginator.fetch_page(page - 1).await?;

    let mut out = Vec::with_capacity(requests.len());
    for request in requests {
        out.push(build_response(&state.db, request).await?);
    }

    Ok(Json(RetouchListResponse {
        requests: out,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// Get a retouch request.
#[utoipa::path(
    get,
    path = "/{number}",
    tag = "Retouch",
    operation_id = "getRetouchRequest",
    summary = "Get a retouch request by number",
    params(("number" = i32, Path, description = "Request number")),
    responses(
        (status = 200, description = "Request", body = RetouchRequestResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Request not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(request_number = %number))]
pub async fn get_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(number): Path<i32>,
) -> Result<Json<RetouchRequestResponse>, AppError> {
    let request = find_request(&state.db, number).await?;
    can_touch(&auth_user, &request)?;
    Ok(Json(build_response(&state.db, request).await?))
}

/// Retoucher-side result update.
#[utoipa::path(
    patch,
    path = "/results",
    tag = "Retouch",
    operation_id = "updateRetouchResult",
    summary = "Update one product's retouch result",
    description = "Sets the retouch status and output link on one line. Ready-for-review requires a non-empty link. When every line leaves InWork the request moves to OnReview. Requires `retouch:edit` as the assigned retoucher, or `retouch:review`.",
    request_body = UpdateResultRequest,
    responses(
        (status = 200, description = "Line updated", body = RetouchRequestResponse),
        (status = 400, description = "Validation or state error (VALIDATION_ERROR, STATE_CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Line not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(line_id = payload.retouch_request_product_id))]
pub async fn update_result(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateResultRequest>,
) -> Result<Json<RetouchRequestResponse>, AppError> {
    let status = parse_retouch_status(payload.retouch_status)?;
    let link = payload
        .retouch_link
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string);
    if status.requires_link() && link.is_none() {
        return Err(AppError::Validation(
            "Ready-for-review requires a non-empty retouch link".into(),
        ));
    }

    let txn = state.db.begin().await?;

    let line = retouch_request_product::Entity::find_by_id(payload.retouch_request_product_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Retouch line {} not found",
                payload.retouch_request_product_id
            ))
        })?;

    let request = retouch_request::Entity::find_by_id(line.retouch_request_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Retouch request not found".into()))?;
    if request.retoucher_id == auth_user.user_id {
        auth_user.require_permission("retouch:edit")?;
    } else if !auth_user.has_permission("retouch:review") {
        return Err(AppError::PermissionDenied);
    }
    if request.status.is_terminal() {
        return Err(AppError::StateConflict(format!(
            "Retouch request {} is already completed",
            request.request_number
        )));
    }

    let mut active: retouch_request_product::ActiveModel = line.into();
    active.retouch_status = Set(status);
    if link.is_some() {
        active.retouch_link = Set(link);
    }
    active.update(&txn).await?;

    // All lines out of InWork -> the batch goes to senior review.
    let lines = request_lines(&txn, request.id).await?;
    let all_submitted = lines
        .iter()
        .all(|l| l.retouch_status != RetouchStatus::InWork);
    let request = if all_submitted && request.status == RetouchRequestStatus::InProgress {
        let mut request_active: retouch_request::ActiveModel = request.into();
        request_active.status = Set(RetouchRequestStatus::OnReview);
        request_active.update(&txn).await?
    } else {
        request
    };

    txn.commit().await?;

    Ok(Json(build_response(&state.db, request).await?))
}

/// Senior verdict on one line.
#[utoipa::path(
    patch,
    path = "/{number}/products/{line_id}/review",
    tag = "Retouch",
    operation_id = "reviewRetouchProduct",
    summary = "Record the senior verdict on one line",
    description = "Verified stamps the completion time and writes a best-effort audit entry chosen by the line's current retouch status. Requires `retouch:review` permission.",
    params(
        ("number" = i32, Path, description = "Request number"),
        ("line_id" = i32, Path, description = "Retouch line id"),
    ),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Verdict recorded", body = RetouchRequestResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Request or line not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(request_number = %number, line_id = %line_id))]
pub async fn review_product(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((number, line_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<ReviewRequest>,
) -> Result<Json<RetouchRequestResponse>, AppError> {
    auth_user.require_permission("retouch:review")?;
    let verdict = parse_senior_retouch_status(payload.senior_retouch_status)?;

    let txn = state.db.begin().await?;

    let request = find_request(&txn, number).await?;
    let line = retouch_request_product::Entity::find_by_id(line_id)
        .one(&txn)
        .await?
        .filter(|l| l.retouch_request_id == request.id)
        .ok_or_else(|| {
            AppError::NotFound(format!("Line {line_id} is not part of request {number}"))
        })?;

    let retouch_status = line.retouch_status;
    let st_product_id = line.st_product_id;

    let mut active: retouch_request_product::ActiveModel = line.into();
    active.senior_retouch_status = Set(Some(verdict));
    if payload.comment.is_some() {
        active.comment = Set(payload.comment.clone());
    }
    if verdict == SeniorRetouchStatus::Verified {
        active.checked_at = Set(Some(Utc::now()));
    }
    active.update(&txn).await?;

    txn.commit().await?;

    // Audit entry is best-effort: its failure never rolls back a verdict.
    if verdict == SeniorRetouchStatus::Verified
        && let Some(op) = audit_operation_for(retouch_status)
    {
        let source = shooting_request_product::Entity::find_by_id(st_product_id)
            .one(&state.db)
            .await;
        match source {
            Ok(Some(source)) => {
                if let Err(e) = super::product::write_operation(
                    &state.db,
                    &source.barcode,
                    op,
                    Some(auth_user.user_id),
                    Some(format!("Retouch request {number}")),
                )
                .await
                {
                    warn!(error = %e, "Failed to write verification audit entry");
                }
            }
            Ok(None) => warn!(st_product_id, "Source row vanished, skipping audit entry"),
            Err(e) => warn!(error = %e, "DB error resolving source row for audit entry"),
        }
    }

    let request = find_request(&state.db, number).await?;
    Ok(Json(build_response(&state.db, request).await?))
}

/// Close a request as completed or send it to rework.
#[utoipa::path(
    patch,
    path = "/{number}/update-status/{status_id}",
    tag = "Retouch",
    operation_id = "updateRetouchRequestStatus",
    summary = "Close a retouch request or send it back for rework",
    description = "Status 5 (Completed) requires every line Verified and stamps the completion time; status 4 (Rework) is unconditional and notifies the retoucher. Other ids are rejected. Requires `retouch:review` permission.",
    params(
        ("number" = i32, Path, description = "Request number"),
        ("status_id" = i32, Path, description = "Target status: 4 or 5"),
    ),
    responses(
        (status = 200, description = "Status updated", body = RetouchRequestResponse),
        (status = 400, description = "Invalid target or unverified lines (VALIDATION_ERROR, STATE_CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Request not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(request_number = %number, status_id = %status_id))]
pub async fn update_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((number, status_id)): Path<(i32, i32)>,
) -> Result<Json<RetouchRequestResponse>, AppError> {
    auth_user.require_permission("retouch:review")?;

    let target = match parse_request_status(status_id)? {
        s @ (RetouchRequestStatus::Rework | RetouchRequestStatus::Completed) => s,
        other => {
            return Err(AppError::Validation(format!(
                "Only Rework (4) and Completed (5) can be set here, got {other}"
            )));
        }
    };

    let txn = state.db.begin().await?;

    let request = find_request_locked(&txn, number).await?;
    let lines = request_lines(&txn, request.id).await?;

    let rejected_count = lines
        .iter()
        .filter(|l| l.senior_retouch_status == Some(SeniorRetouchStatus::Rejected))
        .count();

    if target == RetouchRequestStatus::Completed {
        let unverified = lines
            .iter()
            .filter(|l| l.senior_retouch_status != Some(SeniorRetouchStatus::Verified))
            .count();
        if unverified > 0 {
            return Err(AppError::StateConflict(format!(
                "{unverified} of {} products are not verified",
                lines.len()
            )));
        }
    }

    let retoucher_id = request.retoucher_id;
    let mut active: retouch_request::ActiveModel = request.into();
    active.status = Set(target);
    if target == RetouchRequestStatus::Completed {
        active.completed_at = Set(Some(Utc::now()));
    }
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    if target == RetouchRequestStatus::Rework {
        state
            .notifier
            .send(&state.db, OutboundEvent::ReworkRequested {
                retoucher_id,
                request_number: number,
                rejected_count,
            })
            .await;
    }

    Ok(Json(build_response(&state.db, updated).await?))
}

/// Reassign a request to another retoucher.
#[utoipa::path(
    post,
    path = "/{number}/reassign",
    tag = "Retouch",
    operation_id = "reassignRetouchRequest",
    summary = "Reassign a request to another retoucher",
    description = "Resets the request to InProgress and discards all review progress (verdicts, comments, completion stamps); retouch statuses are kept. Requires `retouch:assign` permission.",
    params(("number" = i32, Path, description = "Request number")),
    request_body = ReassignRequest,
    responses(
        (status = 200, description = "Request reassigned", body = RetouchRequestResponse),
        (status = 400, description = "Request already completed (STATE_CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Request or retoucher not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(request_number = %number, retoucher_id = payload.retoucher_id))]
pub async fn reassign(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(number): Path<i32>,
    AppJson(payload): AppJson<ReassignRequest>,
) -> Result<Json<RetouchRequestResponse>, AppError> {
    auth_user.require_permission("retouch:assign")?;

    let txn = state.db.begin().await?;

    user::Entity::find_by_id(payload.retoucher_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Retoucher {} not found", payload.retoucher_id))
        })?;

    let request = find_request_locked(&txn, number).await?;
    if request.status.is_terminal() {
        return Err(AppError::StateConflict(format!(
            "Retouch request {number} is already completed"
        )));
    }

    let mut active: retouch_request::ActiveModel = request.clone().into();
    active.retoucher_id = Set(payload.retoucher_id);
    active.status = Set(RetouchRequestStatus::InProgress);
    let updated = active.update(&txn).await?;

    // Deliberate start-over: review progress is discarded wholesale,
    // retouch_status stays untouched.
    retouch_request_product::Entity::update_many()
        .col_expr(
            retouch_request_product::Column::SeniorRetouchStatus,
            Expr::value(Option::<i32>::None),
        )
        .col_expr(
            retouch_request_product::Column::Comment,
            Expr::value(Option::<String>::None),
        )
        .col_expr(
            retouch_request_product::Column::CheckedAt,
            Expr::value(Option::<chrono::DateTime<chrono::Utc>>::None),
        )
        .filter(retouch_request_product::Column::RetouchRequestId.eq(request.id))
        .exec(&txn)
        .await?;

    let lines = request_lines(&txn, request.id).await?;
    let st_ids: Vec<i32> = lines.iter().map(|l| l.st_product_id).collect();
    let sources = shooting_request_product::Entity::find()
        .filter(shooting_request_product::Column::Id.is_in(st_ids))
        .all(&txn)
        .await?;
    for source in &sources {
        super::product::write_operation(
            &txn,
            &source.barcode,
            OperationType::RetouchAssigned,
            Some(auth_user.user_id),
            Some(format!("Retouch request {number} reassigned")),
        )
        .await?;
    }

    txn.commit().await?;

    state
        .notifier
        .send(&state.db, OutboundEvent::AssignmentCreated {
            retoucher_id: payload.retoucher_id,
            request_number: number,
            product_count: sources.len(),
        })
        .await;

    Ok(Json(build_response(&state.db, updated).await?))
}

/// Archive download / scheduling endpoint.
#[utoipa::path(
    post,
    path = "/{number}/download-files",
    tag = "Retouch",
    operation_id = "downloadRetouchFiles",
    summary = "Fetch or schedule the source-photo archive",
    description = "Returns 200 with the archive path when a finished archive exists on disk; 202 while a build is running; otherwise schedules a fresh build and returns 202.",
    params(("number" = i32, Path, description = "Request number")),
    responses(
        (status = 200, description = "Archive ready", body = DownloadResponse),
        (status = 202, description = "Build in progress or newly scheduled", body = DownloadResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Request not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(request_number = %number))]
pub async fn download_files(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(number): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let request = find_request(&state.db, number).await?;
    can_touch(&auth_user, &request)?;

    // Finished archive still on disk: reuse it, no second task.
    if request.archive_completed_at.is_some()
        && let Some(ref path) = request.archive_path
        && tokio::fs::try_exists(path).await.unwrap_or(false)
    {
        return Ok((
            StatusCode::OK,
            Json(DownloadResponse {
                status: "ready",
                archive_path: Some(path.clone()),
            }),
        ));
    }

    // Task recorded and neither finished nor failed: report progress
    // instead of double-scheduling.
    if request.archive_task_id.is_some()
        && request.archive_completed_at.is_none()
        && request.archive_error.is_none()
    {
        return Ok((
            StatusCode::ACCEPTED,
            Json(DownloadResponse {
                status: "in_progress",
                archive_path: None,
            }),
        ));
    }

    schedule_archive(&state, &request).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(DownloadResponse {
            status: "in_progress",
            archive_path: None,
        }),
    ))
}
