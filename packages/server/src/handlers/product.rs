use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::{MoveStatus, OperationType};
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{product, product_operation};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::product::*;
use crate::models::shared::{Pagination, escape_like, validate_barcode};
use crate::notify::OutboundEvent;
use crate::state::AppState;

/// Find a product by barcode or return 404.
pub(crate) async fn find_product<C: ConnectionTrait>(
    db: &C,
    barcode: &str,
) -> Result<product::Model, AppError> {
    product::Entity::find_by_id(barcode.to_string())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {barcode} not found")))
}

/// Append one audit-log entry for a product.
pub(crate) async fn write_operation<C: ConnectionTrait>(
    db: &C,
    barcode: &str,
    operation_type: OperationType,
    user_id: Option<i32>,
    comment: Option<String>,
) -> Result<(), DbErr> {
    let op = product_operation::ActiveModel {
        barcode: Set(barcode.to_string()),
        operation_type: Set(operation_type),
        user_id: Set(user_id),
        comment: Set(comment),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    product_operation::Entity::insert(op)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Register announced products.
#[utoipa::path(
    post,
    path = "/",
    tag = "Products",
    operation_id = "intakeProducts",
    summary = "Register announced products",
    description = "Creates product rows for an announced delivery. Existing barcodes are skipped. Requires `product:intake` permission.",
    request_body = IntakeRequest,
    responses(
        (status = 201, description = "Products registered", body = IntakeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(count = payload.products.len()))]
pub async fn intake(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<IntakeRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("product:intake")?;
    validate_intake_request(&payload)?;

    let txn = state.db.begin().await?;

    let mut created = 0u64;
    let mut skipped = Vec::new();
    for item in payload.products {
        let barcode = item.barcode.trim().to_string();
        let model = product::ActiveModel {
            barcode: Set(barcode.clone()),
            name: Set(item.name.trim().to_string()),
            seller: Set(item.seller),
            category_id: Set(item.category_id),
            move_status: Set(MoveStatus::NotReceived),
            priority: Set(false),
            blocked_for_render: Set(false),
            info: Set(item.info),
            ..Default::default()
        };

        let result = product::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(product::Column::Barcode)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await;

        match result {
            Ok(0) | Err(DbErr::RecordNotInserted) => skipped.push(barcode),
            Ok(_) => {
                write_operation(
                    &txn,
                    &barcode,
                    OperationType::Intake,
                    Some(auth_user.user_id),
                    None,
                )
                .await?;
                created += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(IntakeResponse { created, skipped })))
}

/// Public product listing.
#[utoipa::path(
    get,
    path = "/current",
    tag = "Products",
    operation_id = "listCurrentProducts",
    summary = "List products currently in the warehouse",
    description = "Public, unauthenticated listing of products physically present in the warehouse, paginated, with optional search and status filter.",
    params(CurrentProductsQuery),
    responses(
        (status = 200, description = "Paginated product list", body = ProductListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn current_products(
    State(state): State<AppState>,
    Query(query): Query<CurrentProductsQuery>,
) -> Result<Json<ProductListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let mut find = product::Entity::find();

    match query.move_status.as_deref() {
        Some(raw) => {
            find = find.filter(product::Column::MoveStatus.eq(parse_move_status(raw)?));
        }
        None => {
            // Default view: everything physically present in the warehouse.
            let present: Vec<MoveStatus> = MoveStatus::ALL
                .iter()
                .copied()
                .filter(MoveStatus::is_in_warehouse)
                .collect();
            find = find.filter(product::Column::MoveStatus.is_in(present));
        }
    }

    if let Some(search) = query.search.as_deref().map(str::trim)
        && !search.is_empty()
    {
        let pattern = format!("%{}%", escape_like(search));
        find = find.filter(
            Condition::any()
                .add(product::Column::Barcode.like(&pattern))
                .add(product::Column::Name.like(&pattern)),
        );
    }

    let paginator = find
        .order_by_asc(product::Column::IncomeAt)
        .order_by_asc(product::Column::Barcode)
        .paginate(&state.db, per_page);

    let total = paginator.num_items().await?;
    let total_pages = Ord::max(total.div_ceil(per_page), 1);
    let products = paginator.fetch_page(page - 1).await?;

    Ok(Json(ProductListResponse {
        products: products.into_iter().map(Into::into).collect(),
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// Get a single product.
#[utoipa::path(
    get,
    path = "/{barcode}",
    tag = "Products",
    operation_id = "getProduct",
    summary = "Get a product by barcode",
    params(("barcode" = String, Path, description = "Product barcode")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(barcode = %barcode))]
pub async fn get_product(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<Json<ProductResponse>, AppError> {
    auth_user.require_permission("product:view")?;
    let product = find_product(&state.db, &barcode).await?;
    Ok(Json(product.into()))
}

/// Mark a product defective.
#[utoipa::path(
    post,
    path = "/{barcode}/defect",
    tag = "Products",
    operation_id = "markDefect",
    summary = "Mark a product defective",
    description = "Sets the product's move status to Defect and appends an audit entry. Reaching the configured defect count on one barcode fires a one-shot alert carrying every defect entry. Requires `product:defect` permission.",
    params(("barcode" = String, Path, description = "Product barcode")),
    request_body = DefectRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Validation or state error (VALIDATION_ERROR, STATE_CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(barcode = %barcode))]
pub async fn mark_defect(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(barcode): Path<String>,
    AppJson(payload): AppJson<DefectRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    auth_user.require_permission("product:defect")?;
    validate_barcode(&barcode)?;

    let txn = state.db.begin().await?;

    let product = product::Entity::find_by_id(barcode.clone())
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {barcode} not found")))?;

    if !product.move_status.is_in_warehouse() {
        return Err(AppError::StateConflict(format!(
            "Product {barcode} is not in the warehouse (status {})",
            product.move_status
        )));
    }

    let mut active: product::ActiveModel = product.into();
    active.move_status = Set(MoveStatus::Defect);
    let updated = active.update(&txn).await?;

    write_operation(
        &txn,
        &barcode,
        OperationType::DefectMarked,
        Some(auth_user.user_id),
        payload.comment,
    )
    .await?;

    let defect_ops = product_operation::Entity::find()
        .filter(product_operation::Column::Barcode.eq(&barcode))
        .filter(product_operation::Column::OperationType.eq(OperationType::DefectMarked))
        .order_by_asc(product_operation::Column::CreatedAt)
        .all(&txn)
        .await?;

    txn.commit().await?;

    if let Some(event) = defect_alert(
        &defect_ops,
        state.config.workflow.defect_alert_count,
        &barcode,
    ) {
        state.notifier.send(&state.db, event).await;
    }

    Ok(Json(updated.into()))
}

/// One-shot alert: fires only when this marking is exactly the
/// configured occurrence, so later defects stay quiet.
fn defect_alert(
    defect_ops: &[product_operation::Model],
    alert_count: u64,
    barcode: &str,
) -> Option<OutboundEvent> {
    if defect_ops.len() as u64 != alert_count {
        return None;
    }
    let occurrences = defect_ops
        .iter()
        .map(|op| {
            format!(
                "{}: {}",
                op.created_at.format("%Y-%m-%d %H:%M"),
                op.comment.as_deref().unwrap_or("no comment")
            )
        })
        .collect();
    Some(OutboundEvent::DefectAlert {
        barcode: barcode.to_string(),
        occurrences,
    })
}

/// List a product's audit log.
#[utoipa::path(
    get,
    path = "/{barcode}/operations",
    tag = "Products",
    operation_id = "listProductOperations",
    summary = "List a product's audit log",
    params(("barcode" = String, Path, description = "Product barcode")),
    responses(
        (status = 200, description = "Audit entries, oldest first", body = [OperationResponse]),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(barcode = %barcode))]
pub async fn list_operations(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<Json<Vec<OperationResponse>>, AppError> {
    auth_user.require_permission("product:view")?;

    let _ = find_product(&state.db, &barcode).await?;

    let ops = product_operation::Entity::find()
        .filter(product_operation::Column::Barcode.eq(&barcode))
        .order_by_asc(product_operation::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(ops.into_iter().map(Into::into).collect()))
}
