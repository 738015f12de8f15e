use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::{MoveStatus, OperationType, OrderStatus};
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::{debug, instrument};

use crate::entity::{customer_order, order_product, product};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::order::*;
use crate::notify::OutboundEvent;
use crate::state::AppState;

/// Attempts at allocating a sequential number before giving up.
/// Collisions only happen between concurrent creators, so the loop
/// settles almost immediately.
pub(crate) const NUMBER_ALLOC_RETRIES: u32 = 5;

async fn next_order_number<C: ConnectionTrait>(db: &C) -> Result<i32, AppError> {
    let max: Option<Option<i32>> = customer_order::Entity::find()
        .select_only()
        .column_as(customer_order::Column::OrderNumber.max(), "max_number")
        .into_tuple()
        .one(db)
        .await?;
    Ok(max.flatten().unwrap_or(0) + 1)
}

async fn find_order<C: ConnectionTrait>(
    db: &C,
    number: i32,
) -> Result<customer_order::Model, AppError> {
    customer_order::Entity::find()
        .filter(customer_order::Column::OrderNumber.eq(number))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {number} not found")))
}

async fn order_lines<C: ConnectionTrait>(
    db: &C,
    order_id: i32,
) -> Result<Vec<order_product::Model>, AppError> {
    Ok(order_product::Entity::find()
        .filter(order_product::Column::OrderId.eq(order_id))
        .order_by_asc(order_product::Column::Id)
        .all(db)
        .await?)
}

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Create an inbound order.
#[utoipa::path(
    post,
    path = "/",
    tag = "Orders",
    operation_id = "createOrder",
    summary = "Create an inbound order",
    description = "Creates an order grouping announced products for acceptance. Every barcode must already be registered. Requires `order:create` permission.",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown barcode (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(count = payload.barcodes.len()))]
pub async fn create_order(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("order:create")?;
    validate_create_order_request(&payload)?;

    let barcodes: Vec<String> = payload
        .barcodes
        .iter()
        .map(|b| b.trim().to_string())
        .collect();

    // Postgres aborts the whole transaction on a unique violation, so
    // the retry loop has to wrap it entirely.
    for attempt in 0..NUMBER_ALLOC_RETRIES {
        let txn = state.db.begin().await?;

        let known = product::Entity::find()
            .filter(product::Column::Barcode.is_in(barcodes.clone()))
            .count(&txn)
            .await?;
        if known as usize != barcodes.len() {
            return Err(AppError::NotFound(format!(
                "{} of {} barcodes are not registered",
                barcodes.len() - known as usize,
                barcodes.len()
            )));
        }

        let number = next_order_number(&txn).await?;
        let new_order = customer_order::ActiveModel {
            order_number: Set(number),
            status: Set(OrderStatus::Created),
            creator_id: Set(auth_user.user_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let order = match new_order.insert(&txn).await {
            Ok(model) => model,
            Err(e) if is_unique_violation(&e) => {
                debug!(attempt, number, "Order number collision, retrying");
                txn.rollback().await.ok();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let lines: Vec<order_product::ActiveModel> = barcodes
            .iter()
            .map(|barcode| order_product::ActiveModel {
                order_id: Set(order.id),
                barcode: Set(barcode.clone()),
                accepted: Set(false),
                ..Default::default()
            })
            .collect();
        order_product::Entity::insert_many(lines)
            .exec_without_returning(&txn)
            .await?;

        txn.commit().await?;

        let lines = order_lines(&state.db, order.id).await?;
        return Ok((
            StatusCode::CREATED,
            Json(OrderResponse::from_parts(order, lines)),
        ));
    }

    Err(AppError::Internal(
        "Could not allocate an order number".into(),
    ))
}

/// Get an order.
#[utoipa::path(
    get,
    path = "/{number}",
    tag = "Orders",
    operation_id = "getOrder",
    summary = "Get an order by number",
    params(("number" = i32, Path, description = "Order number")),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Order not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(order_number = %number))]
pub async fn get_order(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(number): Path<i32>,
) -> Result<Json<OrderResponse>, AppError> {
    auth_user.require_any_permission(&["order:create", "order:accept"])?;

    let order = find_order(&state.db, number).await?;
    let lines = order_lines(&state.db, order.id).await?;
    Ok(Json(OrderResponse::from_parts(order, lines)))
}

/// Start order acceptance.
#[utoipa::path(
    post,
    path = "/{number}/accept-start",
    tag = "Orders",
    operation_id = "startOrderAcceptance",
    summary = "Start accepting an order",
    description = "Moves the order from Created to Assembly. Requires `order:accept` permission.",
    params(("number" = i32, Path, description = "Order number")),
    responses(
        (status = 200, description = "Order now in assembly", body = OrderResponse),
        (status = 400, description = "Order not in Created state (STATE_CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Order not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(order_number = %number))]
pub async fn accept_start(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(number): Path<i32>,
) -> Result<Json<OrderResponse>, AppError> {
    auth_user.require_permission("order:accept")?;

    let txn = state.db.begin().await?;

    let order = customer_order::Entity::find()
        .filter(customer_order::Column::OrderNumber.eq(number))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {number} not found")))?;

    if order.status != OrderStatus::Created {
        return Err(AppError::StateConflict(format!(
            "Order {number} is {}, acceptance can only start from Created",
            order.status
        )));
    }

    let mut active: customer_order::ActiveModel = order.into();
    active.status = Set(OrderStatus::Assembly);
    active.assembly_started_at = Set(Some(Utc::now()));
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    let lines = order_lines(&state.db, updated.id).await?;
    Ok(Json(OrderResponse::from_parts(updated, lines)))
}

/// Accept one product against an order.
#[utoipa::path(
    post,
    path = "/{number}/accept-product/{barcode}",
    tag = "Orders",
    operation_id = "acceptOrderProduct",
    summary = "Accept one product of an order",
    description = "Marks the line item accepted and moves the product into the warehouse (Accepted, income stamped). Requires `order:accept` permission.",
    params(
        ("number" = i32, Path, description = "Order number"),
        ("barcode" = String, Path, description = "Product barcode"),
    ),
    responses(
        (status = 200, description = "Line accepted", body = OrderResponse),
        (status = 400, description = "Order not in assembly or line already accepted (STATE_CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Order or line not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(order_number = %number, barcode = %barcode))]
pub async fn accept_product(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((number, barcode)): Path<(i32, String)>,
) -> Result<Json<OrderResponse>, AppError> {
    auth_user.require_permission("order:accept")?;

    let txn = state.db.begin().await?;

    let order = find_order(&txn, number).await?;
    if order.status != OrderStatus::Assembly {
        return Err(AppError::StateConflict(format!(
            "Order {number} is {}, products can only be accepted during Assembly",
            order.status
        )));
    }

    let line = order_product::Entity::find()
        .filter(order_product::Column::OrderId.eq(order.id))
        .filter(order_product::Column::Barcode.eq(&barcode))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Barcode {barcode} is not part of order {number}"))
        })?;

    if line.accepted {
        return Err(AppError::StateConflict(format!(
            "Barcode {barcode} was already accepted"
        )));
    }

    let now = Utc::now();
    let mut line_active: order_product::ActiveModel = line.into();
    line_active.accepted = Set(true);
    line_active.accepted_at = Set(Some(now));
    line_active.accepted_by = Set(Some(auth_user.user_id));
    line_active.update(&txn).await?;

    let prod = super::product::find_product(&txn, &barcode).await?;
    let mut prod_active: product::ActiveModel = prod.into();
    prod_active.move_status = Set(MoveStatus::Accepted);
    prod_active.income_at = Set(Some(now));
    prod_active.income_user_id = Set(Some(auth_user.user_id));
    prod_active.update(&txn).await?;

    super::product::write_operation(
        &txn,
        &barcode,
        OperationType::OrderAccepted,
        Some(auth_user.user_id),
        Some(format!("Order {number}")),
    )
    .await?;

    txn.commit().await?;

    let order = find_order(&state.db, number).await?;
    let lines = order_lines(&state.db, order.id).await?;
    Ok(Json(OrderResponse::from_parts(order, lines)))
}

/// Finish order acceptance.
#[utoipa::path(
    post,
    path = "/{number}/accept-end",
    tag = "Orders",
    operation_id = "endOrderAcceptance",
    summary = "Finish accepting an order",
    description = "Closes acceptance: FullyAccepted when every line was accepted, AcceptedWithDiscrepancies otherwise (the creator is notified with the missing barcodes). Requires `order:accept` permission.",
    params(("number" = i32, Path, description = "Order number")),
    responses(
        (status = 200, description = "Order closed", body = OrderResponse),
        (status = 400, description = "Order not in assembly (STATE_CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Order not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(order_number = %number))]
pub async fn accept_end(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(number): Path<i32>,
) -> Result<Json<OrderResponse>, AppError> {
    auth_user.require_permission("order:accept")?;

    let txn = state.db.begin().await?;

    let order = customer_order::Entity::find()
        .filter(customer_order::Column::OrderNumber.eq(number))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {number} not found")))?;

    if order.status != OrderStatus::Assembly {
        return Err(AppError::StateConflict(format!(
            "Order {number} is {}, acceptance can only end from Assembly",
            order.status
        )));
    }

    let lines = order_lines(&txn, order.id).await?;
    let missing: Vec<String> = lines
        .iter()
        .filter(|l| !l.accepted)
        .map(|l| l.barcode.clone())
        .collect();

    let final_status = if missing.is_empty() {
        OrderStatus::FullyAccepted
    } else {
        OrderStatus::AcceptedWithDiscrepancies
    };

    let creator_id = order.creator_id;
    let mut active: customer_order::ActiveModel = order.into();
    active.status = Set(final_status);
    active.accept_finished_at = Set(Some(Utc::now()));
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    if !missing.is_empty() {
        state
            .notifier
            .send(&state.db, OutboundEvent::OrderDiscrepancy {
                creator_id,
                order_number: number,
                missing_barcodes: missing,
            })
            .await;
    }

    let lines = order_lines(&state.db, updated.id).await?;
    Ok(Json(OrderResponse::from_parts(updated, lines)))
}
