use sea_orm::*;
use sea_query::{Index, PostgresQueryBuilder};
use tracing::info;

use crate::entity::{product, product_operation, role, role_permission};

/// Default roles seeded on startup.
const DEFAULT_ROLES: &[&str] = &[
    "admin",
    "manager",
    "stockman",
    "photographer",
    "retoucher",
    "senior_retoucher",
];

/// Default role-permission mappings seeded on startup.
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    // Admin: all permissions
    ("admin", "product:intake"),
    ("admin", "product:view"),
    ("admin", "product:defect"),
    ("admin", "order:create"),
    ("admin", "order:accept"),
    ("admin", "shooting:create"),
    ("admin", "shooting:photograph"),
    ("admin", "shooting:check"),
    ("admin", "retouch:assign"),
    ("admin", "retouch:edit"),
    ("admin", "retouch:review"),
    ("admin", "retouch:view_all"),
    ("admin", "user:manage"),
    // Manager: everything operational except user management
    ("manager", "product:intake"),
    ("manager", "product:view"),
    ("manager", "product:defect"),
    ("manager", "order:create"),
    ("manager", "order:accept"),
    ("manager", "shooting:create"),
    ("manager", "shooting:check"),
    ("manager", "retouch:assign"),
    ("manager", "retouch:view_all"),
    // Stockman: warehouse intake and order handling
    ("stockman", "product:intake"),
    ("stockman", "product:view"),
    ("stockman", "product:defect"),
    ("stockman", "order:create"),
    ("stockman", "order:accept"),
    // Photographer
    ("photographer", "product:view"),
    ("photographer", "shooting:create"),
    ("photographer", "shooting:photograph"),
    // Retoucher
    ("retoucher", "product:view"),
    ("retoucher", "retouch:edit"),
    // Senior retoucher
    ("senior_retoucher", "product:view"),
    ("senior_retoucher", "shooting:check"),
    ("senior_retoucher", "retouch:assign"),
    ("senior_retoucher", "retouch:review"),
    ("senior_retoucher", "retouch:view_all"),
];

/// Seed the `role` and `role_permission` tables with defaults.
pub async fn seed_role_permissions(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Seed roles
    let mut roles_inserted = 0u32;
    for &name in DEFAULT_ROLES {
        let model = role::ActiveModel {
            name: Set(name.to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(role::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => roles_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    // Seed role-permission mappings
    let mut perms_inserted = 0u32;
    for &(role, permission) in DEFAULT_MAPPINGS {
        let model = role_permission::ActiveModel {
            role: Set(role.to_string()),
            permission: Set(permission.to_string()),
        };

        let result = role_permission::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    role_permission::Column::Role,
                    role_permission::Column::Permission,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => perms_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if perms_inserted > 0 {
        info!("Seeded {} new role-permission mappings", perms_inserted);
    }

    Ok(())
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Composite index for warehouse listings:
    // SELECT ... FROM product WHERE move_status = ? ORDER BY income_at
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_product_status_income")
        .table(product::Entity)
        .col(product::Column::MoveStatus)
        .col(product::Column::IncomeAt)
        .to_string(PostgresQueryBuilder);

    let result = db.execute_unprepared(&stmt).await;
    match result {
        Ok(_) => {
            info!("Ensured index idx_product_status_income exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_product_status_income: {}", e);
        }
    }

    // Composite index for the defect-alert count:
    // SELECT COUNT(*) FROM product_operation WHERE barcode = ? AND operation_type = ?
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_operation_barcode_type")
        .table(product_operation::Entity)
        .col(product_operation::Column::Barcode)
        .col(product_operation::Column::OperationType)
        .to_string(PostgresQueryBuilder);

    let result = db.execute_unprepared(&stmt).await;
    match result {
        Ok(_) => {
            info!("Ensured index idx_operation_barcode_type exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_operation_barcode_type: {}", e);
        }
    }

    Ok(())
}
