//! # Catalog Repository
//!
//! Database operations for the booking catalog: users, salons, branches,
//! staff, service categories, and services.
//!
//! ## Snapshot Boundary
//! Catalog rows are the "current truth" the engine validates against at
//! booking time. Everything priced is snapshotted onto the appointment at
//! that moment, so catalog edits never rewrite history.
//!
//! ## Decoding
//! Rows are mapped by hand (runtime query API): TEXT enum columns parse
//! through the domain `FromStr` impls, money and rate columns come back as
//! integer cents / basis points.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use sheba_core::{
    Branch, CommissionRule, Money, Rate, Salon, Service, ServiceCategory, Staff, User,
};

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

// =============================================================================
// Row Mappers
// =============================================================================

fn user_from_row(row: &SqliteRow) -> DbResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        phone: row.try_get("phone")?,
        role: row
            .try_get::<String, _>("role")?
            .parse()
            .map_err(DbError::corrupt)?,
        is_verified: row.try_get("is_verified")?,
        created_at: row.try_get("created_at")?,
    })
}

fn salon_from_row(row: &SqliteRow) -> DbResult<Salon> {
    Ok(Salon {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        owner_id: row.try_get("owner_id")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        country: row.try_get("country")?,
        salon_type: row
            .try_get::<String, _>("salon_type")?
            .parse()
            .map_err(DbError::corrupt)?,
        size: row
            .try_get::<String, _>("size")?
            .parse()
            .map_err(DbError::corrupt)?,
        commission_rate: Rate::from_bps(row.try_get::<i64, _>("commission_rate_bps")? as u32),
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn branch_from_row(row: &SqliteRow) -> DbResult<Branch> {
    Ok(Branch {
        id: row.try_get("id")?,
        salon_id: row.try_get("salon_id")?,
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        is_main_branch: row.try_get("is_main_branch")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn staff_from_row(row: &SqliteRow) -> DbResult<Staff> {
    Ok(Staff {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        salon_id: row.try_get("salon_id")?,
        branch_id: row.try_get("branch_id")?,
        role: row
            .try_get::<String, _>("role")?
            .parse()
            .map_err(DbError::corrupt)?,
        specialization: row.try_get("specialization")?,
        commission_percentage: Rate::from_bps(
            row.try_get::<i64, _>("commission_percentage_bps")? as u32,
        ),
        is_active: row.try_get("is_active")?,
        hire_date: row.try_get("hire_date")?,
        created_at: row.try_get("created_at")?,
    })
}

fn service_from_row(row: &SqliteRow) -> DbResult<Service> {
    let commission_type: String = row.try_get("commission_type")?;
    let commission_value: i64 = row.try_get("commission_value")?;
    let commission = match commission_type.as_str() {
        "percentage" => CommissionRule::Percentage(Rate::from_bps(commission_value as u32)),
        "fixed" => CommissionRule::Fixed(Money::from_cents(commission_value)),
        other => {
            return Err(DbError::corrupt(format!(
                "unknown commission type: {other}"
            )))
        }
    };

    Ok(Service {
        id: row.try_get("id")?,
        salon_id: row.try_get("salon_id")?,
        category_id: row.try_get("category_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        duration_minutes: row.try_get::<i64, _>("duration_minutes")? as u32,
        price: Money::from_cents(row.try_get("price_cents")?),
        commission,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

/// The (type, value) column pair for a commission rule.
fn commission_columns(rule: &CommissionRule) -> (&'static str, i64) {
    match rule {
        CommissionRule::Percentage(rate) => ("percentage", rate.bps() as i64),
        CommissionRule::Fixed(amount) => ("fixed", amount.cents()),
    }
}

// =============================================================================
// Repository
// =============================================================================

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // ---- users --------------------------------------------------------------

    /// Gets a user by ID.
    pub async fn user(&self, id: &str) -> DbResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    /// Inserts a user.
    pub async fn insert_user(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, email, first_name, last_name, phone, role, is_verified, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(user.is_verified)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ---- salons -------------------------------------------------------------

    /// Gets a salon by ID.
    pub async fn salon(&self, id: &str) -> DbResult<Option<Salon>> {
        let row = sqlx::query("SELECT * FROM salons WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(salon_from_row).transpose()
    }

    /// Inserts a salon.
    pub async fn insert_salon(&self, salon: &Salon) -> DbResult<()> {
        debug!(id = %salon.id, name = %salon.name, "Inserting salon");

        sqlx::query(
            r#"
            INSERT INTO salons (
                id, name, description, owner_id, phone, email,
                address, city, country, salon_type, size,
                commission_rate_bps, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&salon.id)
        .bind(&salon.name)
        .bind(&salon.description)
        .bind(&salon.owner_id)
        .bind(&salon.phone)
        .bind(&salon.email)
        .bind(&salon.address)
        .bind(&salon.city)
        .bind(&salon.country)
        .bind(salon.salon_type.as_str())
        .bind(salon.size.as_str())
        .bind(salon.commission_rate.bps() as i64)
        .bind(salon.is_active)
        .bind(salon.created_at)
        .bind(salon.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ---- branches -----------------------------------------------------------

    /// Gets a branch by ID.
    pub async fn branch(&self, id: &str) -> DbResult<Option<Branch>> {
        let row = sqlx::query("SELECT * FROM branches WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(branch_from_row).transpose()
    }

    /// Inserts a branch.
    pub async fn insert_branch(&self, branch: &Branch) -> DbResult<()> {
        debug!(id = %branch.id, salon_id = %branch.salon_id, "Inserting branch");

        sqlx::query(
            r#"
            INSERT INTO branches (id, salon_id, name, address, phone, email, is_main_branch, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&branch.id)
        .bind(&branch.salon_id)
        .bind(&branch.name)
        .bind(&branch.address)
        .bind(&branch.phone)
        .bind(&branch.email)
        .bind(branch.is_main_branch)
        .bind(branch.is_active)
        .bind(branch.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ---- staff --------------------------------------------------------------

    /// Gets a staff member by ID.
    pub async fn staff_member(&self, id: &str) -> DbResult<Option<Staff>> {
        let row = sqlx::query("SELECT * FROM staff WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(staff_from_row).transpose()
    }

    /// All staff of a salon, ordered by id for deterministic reporting.
    pub async fn staff_by_salon(&self, salon_id: &str) -> DbResult<Vec<Staff>> {
        let rows = sqlx::query("SELECT * FROM staff WHERE salon_id = ?1 ORDER BY id")
            .bind(salon_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(staff_from_row).collect()
    }

    /// Inserts a staff member.
    pub async fn insert_staff(&self, staff: &Staff) -> DbResult<()> {
        debug!(id = %staff.id, salon_id = %staff.salon_id, "Inserting staff");

        sqlx::query(
            r#"
            INSERT INTO staff (
                id, user_id, salon_id, branch_id, role, specialization,
                commission_percentage_bps, is_active, hire_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&staff.id)
        .bind(&staff.user_id)
        .bind(&staff.salon_id)
        .bind(&staff.branch_id)
        .bind(staff.role.as_str())
        .bind(&staff.specialization)
        .bind(staff.commission_percentage.bps() as i64)
        .bind(staff.is_active)
        .bind(staff.hire_date)
        .bind(staff.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ---- services -----------------------------------------------------------

    /// Gets a service by ID.
    pub async fn service(&self, id: &str) -> DbResult<Option<Service>> {
        let row = sqlx::query("SELECT * FROM services WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(service_from_row).transpose()
    }

    /// All services of a salon, ordered by id.
    pub async fn services_by_salon(&self, salon_id: &str) -> DbResult<Vec<Service>> {
        let rows = sqlx::query("SELECT * FROM services WHERE salon_id = ?1 ORDER BY id")
            .bind(salon_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(service_from_row).collect()
    }

    /// Inserts a service category.
    pub async fn insert_category(&self, category: &ServiceCategory) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO service_categories (id, salon_id, name, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&category.id)
        .bind(&category.salon_id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a service.
    pub async fn insert_service(&self, service: &Service) -> DbResult<()> {
        debug!(id = %service.id, name = %service.name, "Inserting service");

        let (commission_type, commission_value) = commission_columns(&service.commission);

        sqlx::query(
            r#"
            INSERT INTO services (
                id, salon_id, category_id, name, description,
                duration_minutes, price_cents, commission_type, commission_value,
                is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&service.id)
        .bind(&service.salon_id)
        .bind(&service.category_id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.duration_minutes as i64)
        .bind(service.price.cents())
        .bind(commission_type)
        .bind(commission_value)
        .bind(service.is_active)
        .bind(service.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
