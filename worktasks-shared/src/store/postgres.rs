/// PostgreSQL repository
///
/// Guarded mutations run in a transaction that locks the affected rows with
/// `SELECT ... FOR UPDATE` before the guard sees them. Email uniqueness and the
/// restrict foreign key on `tasks.assigned_to_id` are enforced by the schema and
/// mapped back into [`StoreError`] variants here.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::{
    ConflictKind, Repository, StoreError, StoreResult, TaskDeleteGuard, TaskFilter,
    TaskUpdateGuard, UserDeleteGuard,
};
use crate::db::pool;
use crate::models::{
    NewTask, NewUser, Page, PageRequest, Role, Task, TaskView, User, UserSummary,
};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

const TASK_VIEW_COLUMNS: &str = "t.id, t.title, t.description, t.status, t.created_by_id, \
     t.assigned_to_id, t.created_at, t.updated_at, u.email AS assigned_to_email";

const TASK_VISIBILITY_FILTER: &str = "($1::uuid IS NULL OR t.created_by_id = $1 OR t.assigned_to_id = $1) \
     AND ($2::task_status IS NULL OR t.status = $2)";

#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn violates(err: &sqlx::Error, code: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(code),
        _ => false,
    }
}

fn map_user_insert_error(err: sqlx::Error) -> StoreError {
    if violates(&err, UNIQUE_VIOLATION) {
        StoreError::Conflict(ConflictKind::EmailTaken)
    } else {
        StoreError::Database(err)
    }
}

fn map_task_write_error(err: sqlx::Error) -> StoreError {
    if violates(&err, FOREIGN_KEY_VIOLATION) {
        StoreError::Validation("assignee does not exist".to_string())
    } else {
        StoreError::Database(err)
    }
}

async fn fetch_view<'e, E>(executor: E, id: Uuid) -> Result<Option<TaskView>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {TASK_VIEW_COLUMNS} FROM tasks t \
         LEFT JOIN users u ON u.id = t.assigned_to_id \
         WHERE t.id = $1"
    );

    sqlx::query_as::<_, TaskView>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

#[async_trait]
impl Repository for PgRepository {
    async fn health_check(&self) -> StoreResult<()> {
        pool::health_check(&self.pool).await?;
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, email, password_hash, role, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_insert_error)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_user_summaries(&self) -> StoreResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT id, email, role FROM users ORDER BY email",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn count_users(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: Uuid, guard: &UserDeleteGuard) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Task rows before user rows, the order update_task takes them in
        sqlx::query(
            "SELECT id FROM tasks WHERE created_by_id = $1 OR assigned_to_id = $1 \
             ORDER BY id FOR UPDATE",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // Every admin row next so concurrent admin deletions serialize here
        let admins: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM users WHERE role = $1 ORDER BY id FOR UPDATE")
                .bind(Role::Admin)
                .fetch_all(&mut *tx)
                .await?;

        let target = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(target) = target else {
            return Ok(false);
        };

        guard(&target, admins.len() as i64)?;

        let assigned: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tasks WHERE assigned_to_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if assigned {
            return Err(StoreError::Conflict(ConflictKind::AssignedTasks));
        }

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if violates(&e, FOREIGN_KEY_VIOLATION) {
                    StoreError::Conflict(ConflictKind::AssignedTasks)
                } else {
                    StoreError::Database(e)
                }
            })?;

        tx.commit().await?;
        Ok(true)
    }

    async fn insert_task(&self, task: NewTask) -> StoreResult<TaskView> {
        let sql = format!(
            "WITH t AS ( \
                 INSERT INTO tasks (id, title, description, status, created_by_id, assigned_to_id) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING * \
             ) \
             SELECT {TASK_VIEW_COLUMNS} FROM t \
             LEFT JOIN users u ON u.id = t.assigned_to_id"
        );

        sqlx::query_as::<_, TaskView>(&sql)
            .bind(Uuid::new_v4())
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.created_by_id)
            .bind(task.assigned_to_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_task_write_error)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<TaskView>> {
        Ok(fetch_view(&self.pool, id).await?)
    }

    async fn update_task(&self, id: Uuid, guard: &TaskUpdateGuard) -> StoreResult<Option<TaskView>> {
        let mut tx = self.pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(
            "SELECT id, title, description, status, created_by_id, assigned_to_id, created_at, updated_at \
             FROM tasks WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut task) = task else {
            return Ok(None);
        };

        let patch = guard(&task)?;
        patch.apply_to(&mut task, Utc::now());

        sqlx::query(
            "UPDATE tasks \
             SET title = $2, description = $3, status = $4, assigned_to_id = $5, updated_at = $6 \
             WHERE id = $1",
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.assigned_to_id)
        .bind(task.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_task_write_error)?;

        let view = fetch_view(&mut *tx, id).await?;
        tx.commit().await?;

        Ok(view)
    }

    async fn delete_task(&self, id: Uuid, guard: &TaskDeleteGuard) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(
            "SELECT id, title, description, status, created_by_id, assigned_to_id, created_at, updated_at \
             FROM tasks WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(task) = task else {
            return Ok(false);
        };

        guard(&task)?;

        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn page_tasks(&self, filter: &TaskFilter, page: PageRequest) -> StoreResult<Page<TaskView>> {
        let restricted_to = filter.visibility.restricted_to();

        // Count and page must describe the same snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM tasks t WHERE {TASK_VISIBILITY_FILTER}");
        let total_count: i64 = sqlx::query_scalar(&count_sql)
            .bind(restricted_to)
            .bind(filter.status)
            .fetch_one(&mut *tx)
            .await?;

        let page_sql = format!(
            "SELECT {TASK_VIEW_COLUMNS} FROM tasks t \
             LEFT JOIN users u ON u.id = t.assigned_to_id \
             WHERE {TASK_VISIBILITY_FILTER} \
             ORDER BY t.created_at DESC, t.id DESC \
             LIMIT $3 OFFSET $4"
        );
        let items = sqlx::query_as::<_, TaskView>(&page_sql)
            .bind(restricted_to)
            .bind(filter.status)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Page::new(items, total_count, page))
    }
}
