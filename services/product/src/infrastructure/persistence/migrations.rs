//! 内嵌的数据库迁移

use catalog_adapter_postgres::{Migration, MigrationManager, MigrationResult};
use catalog_errors::{AppError, AppResult};
use sqlx::PgPool;
use tracing::info;

const CREATE_PRODUCTS: &str = include_str!("../../../migrations/0001_create_products.sql");

/// 服务的全部迁移，按版本排列
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(1, "create_products", CREATE_PRODUCTS)]
}

/// 应用待执行的迁移，任一失败即返回错误
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    let result = MigrationManager::new(pool.clone())
        .migrate(&migrations())
        .await?;
    ensure_success(&result)?;

    info!(
        applied = result.applied_count(),
        skipped = result.skipped.len(),
        "Database migrations finished"
    );
    Ok(())
}

fn ensure_success(result: &MigrationResult) -> AppResult<()> {
    if result.is_success() {
        return Ok(());
    }

    let failures: Vec<String> = result
        .errors
        .iter()
        .map(|e| format!("{} ({}): {}", e.version, e.name, e.error))
        .collect();
    Err(AppError::database(format!(
        "Database migrations failed: {}",
        failures.join("; ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_adapter_postgres::MigrationError;

    #[test]
    fn test_migrations_are_ordered() {
        let migrations = migrations();

        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].version, 1);
        assert!(migrations[0].up_sql.contains("CREATE TABLE IF NOT EXISTS products"));
    }

    #[test]
    fn test_failed_migration_is_an_error() {
        let ok = MigrationResult {
            applied: vec![1],
            ..Default::default()
        };
        assert!(ensure_success(&ok).is_ok());

        let failed = MigrationResult {
            applied: vec![],
            skipped: vec![],
            errors: vec![MigrationError {
                version: 1,
                name: "create_products".to_string(),
                error: "syntax error".to_string(),
            }],
        };
        let err = ensure_success(&failed).unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert!(err.message().contains("1 (create_products): syntax error"));
    }

    // 需要 DATABASE_URL 指向可用的 PostgreSQL，运行: cargo test -- --ignored
    #[sqlx::test(migrations = false)]
    #[ignore]
    async fn test_run_migrations_is_idempotent(pool: PgPool) {
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
