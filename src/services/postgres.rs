use crate::core::WeightHistory;
use crate::models::{
    Category, CreatePatientRequest, Fluids, Formula, FormulaProfile, FormulaSummary, Minerals, Nutrients, Patient,
    User, WeightCheck, WeightEntry, WeightRecord,
};
use chrono::NaiveDate;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Reference tables populated from the bootstrap data file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceTable {
    Categories,
    Formulas,
    Nutrients,
    Minerals,
    Fluids,
}

impl ReferenceTable {
    pub fn name(self) -> &'static str {
        match self {
            ReferenceTable::Categories => "categories",
            ReferenceTable::Formulas => "formulas",
            ReferenceTable::Nutrients => "nutrients",
            ReferenceTable::Minerals => "minerals",
            ReferenceTable::Fluids => "fluids",
        }
    }
}

/// PostgreSQL client for users, patients, weights and formula reference data
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Create the schema on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Create a client whose pool connects on first use
    ///
    /// The schema is not migrated.
    pub fn connect_lazy(database_url: &str) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a user and grant them `role`, creating the role if needed
    ///
    /// A taken username is reported as [`PostgresError::Conflict`].
    pub async fn register_user(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, PostgresError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await;

        let user_id: i64 = match inserted {
            Ok(row) => row.get("id"),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(PostgresError::Conflict(format!("Username {} already taken", username)));
            }
            Err(e) => return Err(e.into()),
        };

        let role_id: i64 = sqlx::query(
            r#"
            INSERT INTO roles (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(role)
        .fetch_one(&mut *tx)
        .await?
        .get("id");

        sqlx::query("INSERT INTO user_role (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Registered user {} ({}) with role {}", username, user_id, role);

        Ok(User {
            id: user_id,
            username: username.to_string(),
            roles: vec![role.to_string()],
        })
    }

    /// Look up a user and their password hash by username
    pub async fn find_credentials(&self, username: &str) -> Result<Option<(User, String)>, PostgresError> {
        let row = sqlx::query("SELECT id, username, password_hash FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: i64 = row.get("id");
        let roles = self.user_roles(id).await?;

        Ok(Some((
            User {
                id,
                username: row.get("username"),
                roles,
            },
            row.get("password_hash"),
        )))
    }

    /// Role names granted to a user
    pub async fn user_roles(&self, user_id: i64) -> Result<Vec<String>, PostgresError> {
        let rows = sqlx::query(
            r#"
            SELECT r.name
            FROM roles r
            JOIN user_role ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    // =========================================================================
    // Patients
    // =========================================================================

    /// Add a patient to a provider's roster
    ///
    /// A patient with the same names, age and bed already on the roster
    /// violates `patients_roster_unique` and is reported as
    /// [`PostgresError::Conflict`].
    pub async fn insert_patient(
        &self,
        provider_id: i64,
        patient: &CreatePatientRequest,
    ) -> Result<Patient, PostgresError> {
        let row = sqlx::query(
            r#"
            INSERT INTO patients (name_last, name_first, age, bed, provider_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name_last, name_first, age, bed, provider_id
            "#,
        )
        .bind(&patient.name_last)
        .bind(&patient.name_first)
        .bind(patient.age)
        .bind(&patient.bed)
        .bind(provider_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PostgresError::Conflict("Patient already exists".to_string())
            }
            e => e.into(),
        })?;

        Ok(patient_from_row(&row))
    }

    /// Patients whose provider is `provider_id`
    pub async fn list_patients(&self, provider_id: i64) -> Result<Vec<Patient>, PostgresError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name_last, name_first, age, bed, provider_id
            FROM patients
            WHERE provider_id = $1
            ORDER BY name_last, name_first, id
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(patient_from_row).collect())
    }

    pub async fn get_patient(&self, patient_id: i64) -> Result<Option<Patient>, PostgresError> {
        let row = sqlx::query(
            "SELECT id, name_last, name_first, age, bed, provider_id FROM patients WHERE id = $1",
        )
        .bind(patient_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(patient_from_row))
    }

    // =========================================================================
    // Weights
    // =========================================================================

    /// Record a weight entered by `user_id`
    ///
    /// An unknown patient is reported as [`PostgresError::NotFound`].
    pub async fn insert_weight(
        &self,
        user_id: i64,
        patient_id: i64,
        date: NaiveDate,
        weight_lb: f64,
    ) -> Result<WeightEntry, PostgresError> {
        let row = sqlx::query(
            r#"
            INSERT INTO monthly_weights (user_id, patient_id, weight_date, patient_weight, recorded_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, user_id, patient_id, weight_date, patient_weight, recorded_at
            "#,
        )
        .bind(user_id)
        .bind(patient_id)
        .bind(date)
        .bind(weight_lb)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                PostgresError::NotFound(format!("Patient {}", patient_id))
            }
            e => e.into(),
        })?;

        tracing::debug!("Recorded {} lb on {} for patient {}", weight_lb, date, patient_id);

        Ok(weight_entry_from_row(&row))
    }

    /// Every recorded weight for a patient
    pub async fn weight_history(&self, patient_id: i64) -> Result<WeightHistory, PostgresError> {
        let rows = sqlx::query(
            r#"
            SELECT id, patient_id, weight_date, patient_weight
            FROM monthly_weights
            WHERE patient_id = $1
            ORDER BY weight_date ASC, id ASC
            "#,
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!("Loaded {} weights for patient {}", rows.len(), patient_id);

        Ok(WeightHistory::new(rows.iter().map(weight_record_from_row)))
    }

    /// Weights entered by a user, newest first
    pub async fn weights_entered_by(&self, user_id: i64) -> Result<Vec<WeightEntry>, PostgresError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, patient_id, weight_date, patient_weight, recorded_at
            FROM monthly_weights
            WHERE user_id = $1
            ORDER BY recorded_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(weight_entry_from_row).collect())
    }

    /// Store a patient's weight check summary, replacing any earlier one
    pub async fn upsert_weight_check(&self, check: &WeightCheck) -> Result<(), PostgresError> {
        sqlx::query(
            r#"
            INSERT INTO weight_check
                (patient_id, current_weight, one_month, three_month, six_month, twelve_month, checked_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (patient_id)
            DO UPDATE SET
                current_weight = EXCLUDED.current_weight,
                one_month = EXCLUDED.one_month,
                three_month = EXCLUDED.three_month,
                six_month = EXCLUDED.six_month,
                twelve_month = EXCLUDED.twelve_month,
                checked_at = EXCLUDED.checked_at
            "#,
        )
        .bind(check.patient_id)
        .bind(check.current_weight_lb)
        .bind(check.one_month)
        .bind(check.three_month)
        .bind(check.six_month)
        .bind(check.twelve_month)
        .bind(check.checked_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_weight_check(&self, patient_id: i64) -> Result<Option<WeightCheck>, PostgresError> {
        let row = sqlx::query(
            r#"
            SELECT patient_id, current_weight, one_month, three_month, six_month, twelve_month, checked_at
            FROM weight_check
            WHERE patient_id = $1
            "#,
        )
        .bind(patient_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| WeightCheck {
            patient_id: row.get("patient_id"),
            current_weight_lb: row.get("current_weight"),
            one_month: row.get("one_month"),
            three_month: row.get("three_month"),
            six_month: row.get("six_month"),
            twelve_month: row.get("twelve_month"),
            checked_at: row.get("checked_at"),
        }))
    }

    // =========================================================================
    // Formula reference data
    // =========================================================================

    pub async fn list_formulas(&self) -> Result<Vec<FormulaSummary>, PostgresError> {
        let rows = sqlx::query(
            r#"
            SELECT f.id, f.name, c.name AS category
            FROM formulas f
            LEFT JOIN categories c ON c.id = f.category_id
            ORDER BY f.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| FormulaSummary {
                id: row.get("id"),
                name: row.get("name"),
                category: row.get("category"),
            })
            .collect())
    }

    /// Formula with its category name and per-litre composition
    pub async fn get_formula_profile(&self, formula_id: i64) -> Result<Option<FormulaProfile>, PostgresError> {
        let row = sqlx::query(
            r#"
            SELECT f.id, f.name, f.category_id, f.kcal_per_ml, f.lactose_int, f.gluten_free,
                   f.kosher, f.features, f.indications, c.name AS category
            FROM formulas f
            LEFT JOIN categories c ON c.id = f.category_id
            WHERE f.id = $1
            "#,
        )
        .bind(formula_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let formula = Formula {
            id: row.get("id"),
            name: row.get("name"),
            category_id: row.get("category_id"),
            kcal_per_ml: row.get("kcal_per_ml"),
            lactose_intolerance: row.get("lactose_int"),
            gluten_free: row.get("gluten_free"),
            kosher: row.get("kosher"),
            features: row.get("features"),
            indications: row.get("indications"),
        };

        let nutrients = sqlx::query(
            "SELECT formula_id, kcals, protein_g, fat_g, carb_g, fiber_g, scfos_g FROM nutrients WHERE formula_id = $1",
        )
        .bind(formula_id)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| Nutrients {
            formula_id: row.get("formula_id"),
            kcals: row.get("kcals"),
            protein_g: row.get("protein_g"),
            fat_g: row.get("fat_g"),
            carb_g: row.get("carb_g"),
            fiber_g: row.get("fiber_g"),
            scfos_g: row.get("scfos_g"),
        });

        let minerals = sqlx::query(
            r#"
            SELECT formula_id, sodium_mg, potassium_mg, phosphorus_mg, magnesium_mg, vitk_mcg
            FROM minerals WHERE formula_id = $1
            "#,
        )
        .bind(formula_id)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| Minerals {
            formula_id: row.get("formula_id"),
            sodium_mg: row.get("sodium_mg"),
            potassium_mg: row.get("potassium_mg"),
            phosphorus_mg: row.get("phosphorus_mg"),
            magnesium_mg: row.get("magnesium_mg"),
            vitk_mcg: row.get("vitk_mcg"),
        });

        let fluids = sqlx::query(
            "SELECT formula_id, free_water_percent, water_ml, osmolality FROM fluids WHERE formula_id = $1",
        )
        .bind(formula_id)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| Fluids {
            formula_id: row.get("formula_id"),
            free_water_percent: row.get("free_water_percent"),
            water_ml: row.get("water_ml"),
            osmolality: row.get("osmolality"),
        });

        Ok(Some(FormulaProfile {
            formula,
            category: row.get("category"),
            nutrients,
            minerals,
            fluids,
        }))
    }

    /// Number of rows in a reference table
    pub async fn reference_count(&self, table: ReferenceTable) -> Result<i64, PostgresError> {
        let query = format!("SELECT COUNT(*) AS count FROM {}", table.name());
        let row = sqlx::query(&query).fetch_one(&self.pool).await?;
        Ok(row.get("count"))
    }

    pub async fn insert_categories(&self, categories: &[Category]) -> Result<u64, PostgresError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for category in categories {
            inserted += sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(category.id)
                .bind(&category.name)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn insert_formulas(&self, formulas: &[Formula]) -> Result<u64, PostgresError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for formula in formulas {
            inserted += sqlx::query(
                r#"
                INSERT INTO formulas
                    (id, name, category_id, kcal_per_ml, lactose_int, gluten_free, kosher, features, indications)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(formula.id)
            .bind(&formula.name)
            .bind(formula.category_id)
            .bind(formula.kcal_per_ml)
            .bind(&formula.lactose_intolerance)
            .bind(&formula.gluten_free)
            .bind(&formula.kosher)
            .bind(&formula.features)
            .bind(&formula.indications)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn insert_nutrients(&self, nutrients: &[Nutrients]) -> Result<u64, PostgresError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for n in nutrients {
            inserted += sqlx::query(
                r#"
                INSERT INTO nutrients (formula_id, kcals, protein_g, fat_g, carb_g, fiber_g, scfos_g)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(n.formula_id)
            .bind(n.kcals)
            .bind(n.protein_g)
            .bind(n.fat_g)
            .bind(n.carb_g)
            .bind(n.fiber_g)
            .bind(n.scfos_g)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn insert_minerals(&self, minerals: &[Minerals]) -> Result<u64, PostgresError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for m in minerals {
            inserted += sqlx::query(
                r#"
                INSERT INTO minerals (formula_id, sodium_mg, potassium_mg, phosphorus_mg, magnesium_mg, vitk_mcg)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(m.formula_id)
            .bind(m.sodium_mg)
            .bind(m.potassium_mg)
            .bind(m.phosphorus_mg)
            .bind(m.magnesium_mg)
            .bind(m.vitk_mcg)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn insert_fluids(&self, fluids: &[Fluids]) -> Result<u64, PostgresError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for f in fluids {
            inserted += sqlx::query(
                r#"
                INSERT INTO fluids (formula_id, free_water_percent, water_ml, osmolality)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(f.formula_id)
            .bind(f.free_water_percent)
            .bind(f.water_ml)
            .bind(f.osmolality)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn patient_from_row(row: &PgRow) -> Patient {
    Patient {
        id: row.get("id"),
        name_last: row.get("name_last"),
        name_first: row.get("name_first"),
        age: row.get("age"),
        bed: row.get("bed"),
        provider_id: row.get("provider_id"),
    }
}

fn weight_record_from_row(row: &PgRow) -> WeightRecord {
    WeightRecord {
        id: row.get("id"),
        patient_id: row.get("patient_id"),
        date: row.get("weight_date"),
        weight_lb: row.get("patient_weight"),
    }
}

fn weight_entry_from_row(row: &PgRow) -> WeightEntry {
    WeightEntry {
        record: weight_record_from_row(row),
        entered_by: row.get("user_id"),
        recorded_at: row.get("recorded_at"),
    }
}
