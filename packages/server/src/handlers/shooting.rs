use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::{OperationType, PhotoStatus, SeniorPhotoStatus, ShootingRequestStatus};
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::{debug, instrument};

use crate::entity::{category, product, shooting_request, shooting_request_product};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::{Pagination, validate_barcode};
use crate::models::shooting::*;
use crate::state::AppState;
use crate::utils::request_type::majority_type;

use super::order::NUMBER_ALLOC_RETRIES;

async fn next_request_number<C: ConnectionTrait>(db: &C) -> Result<i32, AppError> {
    let max: Option<Option<i32>> = shooting_request::Entity::find()
        .select_only()
        .column_as(shooting_request::Column::RequestNumber.max(), "max_number")
        .into_tuple()
        .one(db)
        .await?;
    Ok(max.flatten().unwrap_or(0) + 1)
}

async fn find_request<C: ConnectionTrait>(
    db: &C,
    number: i32,
) -> Result<shooting_request::Model, AppError> {
    shooting_request::Entity::find()
        .filter(shooting_request::Column::RequestNumber.eq(number))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Shooting request {number} not found")))
}

async fn find_request_locked<C: ConnectionTrait>(
    db: &C,
    number: i32,
) -> Result<shooting_request::Model, AppError> {
    shooting_request::Entity::find()
        .filter(shooting_request::Column::RequestNumber.eq(number))
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Shooting request {number} not found")))
}

async fn request_members<C: ConnectionTrait>(
    db: &C,
    request_id: i32,
) -> Result<Vec<shooting_request_product::Model>, AppError> {
    Ok(shooting_request_product::Entity::find()
        .filter(shooting_request_product::Column::RequestId.eq(request_id))
        .order_by_asc(shooting_request_product::Column::Id)
        .all(db)
        .await?)
}

async fn find_member<C: ConnectionTrait>(
    db: &C,
    request_id: i32,
    barcode: &str,
) -> Result<shooting_request_product::Model, AppError> {
    shooting_request_product::Entity::find()
        .filter(shooting_request_product::Column::RequestId.eq(request_id))
        .filter(shooting_request_product::Column::Barcode.eq(barcode))
        .one(db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Barcode {barcode} is not part of the request"))
        })
}

/// Recompute and persist the request type from the member categories'
/// shooting types (majority vote, nulls dropped). A manual override
/// locks the type until explicitly unlocked. Persists only on change.
pub(crate) async fn recompute_request_type<C: ConnectionTrait>(
    db: &C,
    request: &shooting_request::Model,
) -> Result<Option<i32>, AppError> {
    if request.type_locked {
        return Ok(request.request_type);
    }

    let members = request_members(db, request.id).await?;
    let barcodes: Vec<String> = members.into_iter().map(|m| m.barcode).collect();

    let mut types = Vec::new();
    if !barcodes.is_empty() {
        let products = product::Entity::find()
            .filter(product::Column::Barcode.is_in(barcodes))
            .all(db)
            .await?;
        let category_ids: Vec<i32> = products.iter().filter_map(|p| p.category_id).collect();
        if !category_ids.is_empty() {
            let categories = category::Entity::find()
                .filter(category::Column::Id.is_in(category_ids.clone()))
                .all(db)
                .await?;
            for p in &products {
                let Some(cat_id) = p.category_id else { continue };
                if let Some(t) = categories
                    .iter()
                    .find(|c| c.id == cat_id)
                    .and_then(|c| c.shooting_type)
                {
                    types.push(t);
                }
            }
        }
    }

    let winner = majority_type(&types);
    if winner != request.request_type {
        let mut active: shooting_request::ActiveModel = request.clone().into();
        active.request_type = Set(winner);
        active.update(db).await?;
    }
    Ok(winner)
}

/// Create a shooting request.
#[utoipa::path(
    post,
    path = "/",
    tag = "Shooting",
    operation_id = "createShootingRequest",
    summary = "Create a shooting request",
    description = "Creates a draft shooting request, optionally with an initial set of in-warehouse barcodes. Requires `shooting:create` permission.",
    request_body = CreateShootingRequest,
    responses(
        (status = 201, description = "Request created", body = ShootingRequestResponse),
        (status = 400, description = "Validation or state error (VALIDATION_ERROR, STATE_CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown barcode (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn create_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateShootingRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("shooting:create")?;
    for barcode in &payload.barcodes {
        validate_barcode(barcode)?;
    }

    for attempt in 0..NUMBER_ALLOC_RETRIES {
        let txn = state.db.begin().await?;

        let number = next_request_number(&txn).await?;
        let new_request = shooting_request::ActiveModel {
            request_number: Set(number),
            status: Set(ShootingRequestStatus::Draft),
            type_locked: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let request = match new_request.insert(&txn).await {
            Ok(model) => model,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                debug!(attempt, number, "Request number collision, retrying");
                txn.rollback().await.ok();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        for barcode in &payload.barcodes {
            attach_barcode(&txn, &request, barcode.trim()).await?;
        }
        let request_type = recompute_request_type(&txn, &request).await?;

        txn.commit().await?;

        let mut request = request;
        request.request_type = request_type;
        let members = request_members(&state.db, request.id).await?;
        return Ok((
            StatusCode::CREATED,
            Json(ShootingRequestResponse::from_parts(request, members)),
        ));
    }

    Err(AppError::Internal(
        "Could not allocate a request number".into(),
    ))
}

async fn attach_barcode<C: ConnectionTrait>(
    db: &C,
    request: &shooting_request::Model,
    barcode: &str,
) -> Result<(), AppError> {
    let prod = super::product::find_product(db, barcode).await?;
    if !prod.move_status.is_in_warehouse() {
        return Err(AppError::StateConflict(format!(
            "Product {barcode} is not in the warehouse (status {})",
            prod.move_status
        )));
    }

    let already = shooting_request_product::Entity::find()
        .filter(shooting_request_product::Column::RequestId.eq(request.id))
        .filter(shooting_request_product::Column::Barcode.eq(barcode))
        .one(db)
        .await?;
    if already.is_some() {
        return Err(AppError::StateConflict(format!(
            "Barcode {barcode} is already part of request {}",
            request.request_number
        )));
    }

    let member = shooting_request_product::ActiveModel {
        request_id: Set(request.id),
        barcode: Set(barcode.to_string()),
        photo_status: Set(PhotoStatus::Pending),
        senior_photo_status: Set(SeniorPhotoStatus::Pending),
        on_retouch: Set(false),
        ..Default::default()
    };
    shooting_request_product::Entity::insert(member)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Attach a product to a draft request.
#[utoipa::path(
    post,
    path = "/{number}/barcodes/{barcode}",
    tag = "Shooting",
    operation_id = "addShootingBarcode",
    summary = "Attach a product to a shooting request",
    description = "Attaches an in-warehouse product to a draft request and recomputes the request type. Requires `shooting:create` permission.",
    params(
        ("number" = i32, Path, description = "Request number"),
        ("barcode" = String, Path, description = "Product barcode"),
    ),
    responses(
        (status = 200, description = "Product attached", body = ShootingRequestResponse),
        (status = 400, description = "Not a draft, product unavailable, or already attached (STATE_CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Request or product not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(request_number = %number, barcode = %barcode))]
pub async fn add_barcode(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((number, barcode)): Path<(i32, String)>,
) -> Result<Json<ShootingRequestResponse>, AppError> {
    auth_user.require_permission("shooting:create")?;
    validate_barcode(&barcode)?;

    let txn = state.db.begin().await?;

    let request = find_request_locked(&txn, number).await?;
    if request.status != ShootingRequestStatus::Draft {
        return Err(AppError::StateConflict(format!(
            "Request {number} is {}, barcodes can only be edited in Draft",
            request.status
        )));
    }

    attach_barcode(&txn, &request, barcode.trim()).await?;
    let request_type = recompute_request_type(&txn, &request).await?;

    txn.commit().await?;

    let mut request = request;
    request.request_type = request_type;
    let members = request_members(&state.db, request.id).await?;
    Ok(Json(ShootingRequestResponse::from_parts(request, members)))
}

/// Detach a product from a draft request.
#[utoipa::path(
    delete,
    path = "/{number}/barcodes/{barcode}",
    tag = "Shooting",
    operation_id = "removeShootingBarcode",
    summary = "Detach a product from a shooting request",
    params(
        ("number" = i32, Path, description = "Request number"),
        ("barcode" = String, Path, description = "Product barcode"),
    ),
    responses(
        (status = 200, description = "Product detached", body = ShootingRequestResponse),
        (status = 400, description = "Not a draft (STATE_CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Request or member not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(request_number = %number, barcode = %barcode))]
pub async fn remove_barcode(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((number, barcode)): Path<(i32, String)>,
) -> Result<Json<ShootingRequestResponse>, AppError> {
    auth_user.require_permission("shooting:create")?;

    let txn = state.db.begin().await?;

    let request = find_request_locked(&txn, number).await?;
    if request.status != ShootingRequestStatus::Draft {
        return Err(AppError::StateConflict(format!(
            "Request {number} is {}, barcodes can only be edited in Draft",
            request.status
        )));
    }

    let member = find_member(&txn, request.id, barcode.trim()).await?;
    shooting_request_product::Entity::delete_by_id(member.id)
        .exec(&txn)
        .await?;
    let request_type = recompute_request_type(&txn, &request).await?;

    txn.commit().await?;

    let mut request = request;
    request.request_type = request_type;
    let members = request_members(&state.db, request.id).await?;
    Ok(Json(ShootingRequestResponse::from_parts(request, members)))
}

/// List shooting requests.
#[utoipa::path(
    get,
    path = "/",
    tag = "Shooting",
    operation_id = "listShootingRequests",
    summary = "List shooting requests",
    params(ShootingListQuery),
    responses(
        (status = 200, description = "Paginated requests", body = ShootingListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_requests(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ShootingListQuery>,
) -> Result<Json<ShootingListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let mut find = shooting_request::Entity::find();
    if let Some(ref name) = query.status {
        find = find.filter(shooting_request::Column::Status.eq(parse_request_status(name)?));
    }

    let paginator = find
        .order_by_desc(shooting_request::Column::CreatedAt)
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let total_pages = Ord::max(total.div_ceil(per_page), 1);
    let requests = paginator.fetch_page(page - 1).await?;

    let mut out = Vec::with_capacity(requests.len());
    for request in requests {
        let members = request_members(&state.db, request.id).await?;
        out.push(ShootingRequestResponse::from_parts(request, members));
    }

    Ok(Json(ShootingListResponse {
        requests: out,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// Get a shooting request.
#[utoipa::path(
    get,
    path = "/{number}",
    tag = "Shooting",
    operation_id = "getShootingRequest",
    summary = "Get a shooting request by number",
    params(("number" = i32, Path, description = "Request number")),
    responses(
        (status = 200, description = "Request", body = ShootingRequestResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Request not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(request_number = %number))]
pub async fn get_request(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(number): Path<i32>,
) -> Result<Json<ShootingRequestResponse>, AppError> {
    let request = find_request(&state.db, number).await?;
    let members = request_members(&state.db, request.id).await?;
    Ok(Json(ShootingRequestResponse::from_parts(request, members)))
}

/// Manually override the request type.
#[utoipa::path(
    post,
    path = "/{number}/type",
    tag = "Shooting",
    operation_id = "overrideShootingType",
    summary = "Override the request type and lock recomputation",
    request_body = TypeOverrideRequest,
    params(("number" = i32, Path, description = "Request number")),
    responses(
        (status = 200, description = "Type overridden", body = ShootingRequestResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Request not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(request_number = %number))]
pub async fn override_type(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(number): Path<i32>,
    AppJson(payload): AppJson<TypeOverrideRequest>,
) -> Result<Json<ShootingRequestResponse>, AppError> {
    auth_user.require_permission("shooting:create")?;

    let request = find_request(&state.db, number).await?;
    let mut active: shooting_request::ActiveModel = request.into();
    active.request_type = Set(Some(payload.request_type));
    active.type_locked = Set(true);
    let updated = active.update(&state.db).await?;

    let members = request_members(&state.db, updated.id).await?;
    Ok(Json(ShootingRequestResponse::from_parts(updated, members)))
}

/// Clear the type lock and recompute.
#[utoipa::path(
    delete,
    path = "/{number}/type/lock",
    tag = "Shooting",
    operation_id = "unlockShootingType",
    summary = "Clear the type override lock and recompute the type",
    params(("number" = i32, Path, description = "Request number")),
    responses(
        (status = 200, description = "Lock cleared", body = ShootingRequestResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Request not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(request_number = %number))]
pub async fn unlock_type(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(number): Path<i32>,
) -> Result<Json<ShootingRequestResponse>, AppError> {
    auth_user.require_permission("shooting:create")?;

    let txn = state.db.begin().await?;

    let request = find_request_locked(&txn, number).await?;
    let mut active: shooting_request::ActiveModel = request.into();
    active.type_locked = Set(false);
    let mut updated = active.update(&txn).await?;
    updated.request_type = recompute_request_type(&txn, &updated).await?;

    txn.commit().await?;

    let members = request_members(&state.db, updated.id).await?;
    Ok(Json(ShootingRequestResponse::from_parts(updated, members)))
}

/// Start a shooting session on one product.
#[utoipa::path(
    post,
    path = "/{number}/products/{barcode}/start",
    tag = "Shooting",
    operation_id = "startShooting",
    summary = "Start shooting one product",
    description = "Marks the member product InShooting and claims the request for the photographer. Requires `shooting:photograph` permission.",
    params(
        ("number" = i32, Path, description = "Request number"),
        ("barcode" = String, Path, description = "Product barcode"),
    ),
    responses(
        (status = 200, description = "Session started", body = ShootingProductResponse),
        (status = 400, description = "Invalid state for shooting (STATE_CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Request or member not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(request_number = %number, barcode = %barcode))]
pub async fn shooting_start(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((number, barcode)): Path<(i32, String)>,
) -> Result<Json<ShootingProductResponse>, AppError> {
    auth_user.require_permission("shooting:photograph")?;

    let txn = state.db.begin().await?;

    let request = find_request_locked(&txn, number).await?;
    if request.status == ShootingRequestStatus::Checked {
        return Err(AppError::StateConflict(format!(
            "Request {number} is already checked"
        )));
    }

    let member = find_member(&txn, request.id, barcode.trim()).await?;
    if member.on_retouch {
        return Err(AppError::StateConflict(format!(
            "Barcode {barcode} is on retouch and cannot be reshot"
        )));
    }
    if member.photo_status == PhotoStatus::InShooting {
        return Err(AppError::StateConflict(format!(
            "Barcode {barcode} is already being shot"
        )));
    }

    let now = Utc::now();
    let mut member_active: shooting_request_product::ActiveModel = member.into();
    member_active.photo_status = Set(PhotoStatus::InShooting);
    member_active.senior_photo_status = Set(SeniorPhotoStatus::Pending);
    member_active.shooting_started_at = Set(Some(now));
    member_active.shooting_ended_at = Set(None);
    let updated_member = member_active.update(&txn).await?;

    let first_start = request.photo_at.is_none();
    let mut request_active: shooting_request::ActiveModel = request.into();
    request_active.status = Set(ShootingRequestStatus::InShooting);
    request_active.photographer_id = Set(Some(auth_user.user_id));
    if first_start {
        request_active.photo_at = Set(Some(now));
    }
    request_active.update(&txn).await?;

    super::product::write_operation(
        &txn,
        updated_member.barcode.as_str(),
        OperationType::ShootingStarted,
        Some(auth_user.user_id),
        Some(format!("Request {number}")),
    )
    .await?;

    txn.commit().await?;

    Ok(Json(updated_member.into()))
}

/// Finish a shooting session on one product.
#[utoipa::path(
    post,
    path = "/{number}/products/{barcode}/result",
    tag = "Shooting",
    operation_id = "finishShooting",
    summary = "Record the shooting result for one product",
    description = "Records Done (with the uploaded photo folder) or Defect and stamps the session end. When every member is settled the request moves to PendingCheck. Requires `shooting:photograph` permission.",
    params(
        ("number" = i32, Path, description = "Request number"),
        ("barcode" = String, Path, description = "Product barcode"),
    ),
    request_body = ShootingResultRequest,
    responses(
        (status = 200, description = "Result recorded", body = ShootingProductResponse),
        (status = 400, description = "Validation or state error (VALIDATION_ERROR, STATE_CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Request or member not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(request_number = %number, barcode = %barcode))]
pub async fn shooting_result(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((number, barcode)): Path<(i32, String)>,
    AppJson(payload): AppJson<ShootingResultRequest>,
) -> Result<Json<ShootingProductResponse>, AppError> {
    auth_user.require_permission("shooting:photograph")?;
    let (photo_status, folder) = parse_shooting_result(&payload)?;

    let txn = state.db.begin().await?;

    let request = find_request_locked(&txn, number).await?;
    let member = find_member(&txn, request.id, barcode.trim()).await?;
    if member.photo_status != PhotoStatus::InShooting {
        return Err(AppError::StateConflict(format!(
            "Barcode {barcode} has no shooting session in progress"
        )));
    }

    let mut member_active: shooting_request_product::ActiveModel = member.into();
    member_active.photo_status = Set(photo_status);
    member_active.shooting_ended_at = Set(Some(Utc::now()));
    if folder.is_some() {
        member_active.photo_folder = Set(folder);
    }
    let updated_member = member_active.update(&txn).await?;

    super::product::write_operation(
        &txn,
        updated_member.barcode.as_str(),
        OperationType::ShootingFinished,
        Some(auth_user.user_id),
        Some(format!("Request {number}: {}", photo_status)),
    )
    .await?;

    // Every member settled -> hand the batch to the senior check queue.
    let members = request_members(&txn, request.id).await?;
    let all_settled = members
        .iter()
        .all(|m| matches!(m.photo_status, PhotoStatus::Done | PhotoStatus::Defect));
    if all_settled && request.status == ShootingRequestStatus::InShooting {
        let mut request_active: shooting_request::ActiveModel = request.into();
        request_active.status = Set(ShootingRequestStatus::PendingCheck);
        request_active.update(&txn).await?;
    }

    txn.commit().await?;

    Ok(Json(updated_member.into()))
}

/// Senior photo verdict on one product.
#[utoipa::path(
    patch,
    path = "/{number}/products/{barcode}/photo-check",
    tag = "Shooting",
    operation_id = "checkPhotos",
    summary = "Record the senior photo verdict for one product",
    description = "Accepts or rejects the shots of a Done member. The request itself rolls to Checked by the periodic sweep once every member passes. Requires `shooting:check` permission.",
    params(
        ("number" = i32, Path, description = "Request number"),
        ("barcode" = String, Path, description = "Product barcode"),
    ),
    request_body = PhotoCheckRequest,
    responses(
        (status = 200, description = "Verdict recorded", body = ShootingProductResponse),
        (status = 400, description = "Member not Done (STATE_CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Request or member not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(request_number = %number, barcode = %barcode))]
pub async fn photo_check(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((number, barcode)): Path<(i32, String)>,
    AppJson(payload): AppJson<PhotoCheckRequest>,
) -> Result<Json<ShootingProductResponse>, AppError> {
    auth_user.require_permission("shooting:check")?;

    let request = find_request(&state.db, number).await?;
    let member = find_member(&state.db, request.id, barcode.trim()).await?;
    if member.photo_status != PhotoStatus::Done {
        return Err(AppError::StateConflict(format!(
            "Barcode {barcode} is {}, only Done members can be checked",
            member.photo_status
        )));
    }

    let verdict = if payload.accepted {
        SeniorPhotoStatus::Accepted
    } else {
        SeniorPhotoStatus::Rejected
    };
    let mut active: shooting_request_product::ActiveModel = member.into();
    active.senior_photo_status = Set(verdict);
    let updated = active.update(&state.db).await?;

    Ok(Json(updated.into()))
}
