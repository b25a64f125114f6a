use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::{MemoryStore, PgStore, StoreError, StoreResult};
use crate::users::repo_types::{NewUser, ProfileUpdate, User, UserRole, UserRow};

const USER_COLUMNS: &str = "id, username, email, password_hash, role, active, first_name, \
                            last_name, country, profile_picture, created_on, updated_on";

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn insert(&self, user: NewUser) -> StoreResult<User>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn username_or_email_taken(&self, username: &str, email: &str) -> StoreResult<bool>;
    async fn update_profile(&self, id: Uuid, profile: &ProfileUpdate)
        -> StoreResult<Option<User>>;
    async fn update_role(&self, id: Uuid, role: UserRole) -> StoreResult<Option<User>>;
    /// Makes `id` a USER unless it is the only ADMIN left. `None` when refused.
    async fn demote_unless_last_admin(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn set_active(&self, id: Uuid, active: bool) -> StoreResult<Option<User>>;
    async fn list_all(&self) -> StoreResult<Vec<User>>;
    async fn count(&self) -> StoreResult<i64>;
    async fn count_by_role(&self, role: UserRole) -> StoreResult<i64>;
}

fn into_users(rows: Vec<UserRow>) -> StoreResult<Vec<User>> {
    rows.into_iter().map(User::try_from).collect()
}

#[async_trait]
impl UserRepo for PgStore {
    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let now = OffsetDateTime::now_utc();
        let sql = format!(
            "INSERT INTO users (id, username, email, password_hash, role, active, created_on, updated_on)
             VALUES ($1, $2, $3, $4, $5, TRUE, $6, $6)
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> StoreResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        profile: &ProfileUpdate,
    ) -> StoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users
                SET first_name = $2, last_name = $3, country = $4, profile_picture = $5,
                    updated_on = $6
              WHERE id = $1
          RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(&profile.first_name)
            .bind(&profile.last_name)
            .bind(&profile.country)
            .bind(&profile.profile_picture)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn update_role(&self, id: Uuid, role: UserRole) -> StoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET role = $2, updated_on = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(role.as_str())
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn demote_unless_last_admin(&self, id: Uuid) -> StoreResult<Option<User>> {
        let mut tx = self.pool.begin().await?;
        // concurrent demotions queue on these row locks and re-read the admin set
        let admins = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE role = $1 ORDER BY id FOR UPDATE",
        )
        .bind(UserRole::Admin.as_str())
        .fetch_all(&mut *tx)
        .await?;
        if admins.len() <= 1 && admins.contains(&id) {
            return Ok(None);
        }
        let sql = format!(
            "UPDATE users SET role = $2, updated_on = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(UserRole::User.as_str())
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        row.map(User::try_from).transpose()
    }

    async fn set_active(&self, id: Uuid, active: bool) -> StoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET active = $2, updated_on = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(active)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn list_all(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_on ASC");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        into_users(rows)
    }

    async fn count(&self) -> StoreResult<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn count_by_role(&self, role: UserRole) -> StoreResult<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.tables()?;
        if t.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::UniqueViolation("users_username_key".into()));
        }
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            active: true,
            first_name: None,
            last_name: None,
            country: None,
            profile_picture: None,
            created_on: now,
            updated_on: now,
        };
        t.users.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables()?
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> StoreResult<bool> {
        Ok(self
            .tables()?
            .users
            .iter()
            .any(|u| u.username == username || u.email == email))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        profile: &ProfileUpdate,
    ) -> StoreResult<Option<User>> {
        let mut t = self.tables()?;
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.first_name = profile.first_name.clone();
        user.last_name = profile.last_name.clone();
        user.country = profile.country.clone();
        user.profile_picture = profile.profile_picture.clone();
        user.updated_on = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn update_role(&self, id: Uuid, role: UserRole) -> StoreResult<Option<User>> {
        let mut t = self.tables()?;
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.role = role;
        user.updated_on = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn demote_unless_last_admin(&self, id: Uuid) -> StoreResult<Option<User>> {
        let mut t = self.tables()?;
        let admins = t.users.iter().filter(|u| u.role == UserRole::Admin).count();
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if user.role == UserRole::Admin && admins <= 1 {
            return Ok(None);
        }
        user.role = UserRole::User;
        user.updated_on = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> StoreResult<Option<User>> {
        let mut t = self.tables()?;
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.active = active;
        user.updated_on = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn list_all(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables()?.users.clone())
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(self.tables()?.users.len() as i64)
    }

    async fn count_by_role(&self, role: UserRole) -> StoreResult<i64> {
        Ok(self
            .tables()?
            .users
            .iter()
            .filter(|u| u.role == role)
            .count() as i64)
    }
}
