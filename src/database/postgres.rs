//! PostgreSQL implementation of the store traits.

use async_trait::async_trait;
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder as SqlBuilder, Transaction};
use std::collections::HashMap;
use tracing::debug;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    Address, EducationLevel, Infrastructure, LevelKind, MediaItem, MediaKind, MediaParent,
    MediaRow, NewMedia, School, SchoolRow, SchoolSummary, UserRole, UserRoleRow,
};
use crate::database::repository::Repository;
use crate::database::store::{ListQuery, MediaStore, RoleStore, SchoolStore};
use crate::filter::FilterData;
use crate::types::{Role, UserId};
use crate::validation::schema::{
    AddressPayload, EducationLevelPayload, InfrastructurePayload, SchoolPayload, SchoolUpdate,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    max_page_size: i32,
}

impl PgStore {
    pub fn new(pool: PgPool, max_page_size: u32) -> Self {
        Self {
            pool,
            max_page_size: max_page_size.min(i32::MAX as u32) as i32,
        }
    }

    fn schools(&self) -> Repository<SchoolRow> {
        Repository::new("schools", self.pool.clone())
            .with_join("addresses", "school_id")
            .with_max_limit(self.max_page_size)
    }

    fn children<T>(&self, table: &'static str) -> Repository<T>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        Repository::new(table, self.pool.clone())
    }

    async fn media_for(&self, column: &str, ids: &[i64]) -> Result<Vec<MediaItem>, DatabaseError> {
        let rows = self.children::<MediaRow>("media_items").select_in(column, ids).await?;
        let mut items = rows
            .into_iter()
            .map(MediaItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        items.sort_by_key(|m| (m.created_at, m.id));
        Ok(items)
    }

    /// Batch-load every owned relation for `rows`, preserving their order.
    async fn load_relations(&self, rows: Vec<SchoolRow>) -> Result<Vec<School>, DatabaseError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let mut addresses: HashMap<i64, Address> = self
            .children::<Address>("addresses")
            .select_in("school_id", &ids)
            .await?
            .into_iter()
            .map(|a| (a.school_id, a))
            .collect();
        let mut infrastructures: HashMap<i64, Infrastructure> = self
            .children::<Infrastructure>("infrastructures")
            .select_in("school_id", &ids)
            .await?
            .into_iter()
            .map(|i| (i.school_id, i))
            .collect();

        let mut levels: HashMap<(LevelKind, i64), EducationLevel> = HashMap::new();
        for kind in LevelKind::ALL {
            let found = self
                .children::<EducationLevel>(kind.table_name())
                .select_in("school_id", &ids)
                .await?;
            let level_ids: Vec<i64> = found.iter().map(|l| l.id).collect();
            let mut media = group_by_parent(self.media_for(kind.media_column(), &level_ids).await?);
            for mut level in found {
                level.media = media.remove(&level.id).unwrap_or_default();
                levels.insert((kind, level.school_id), level);
            }
        }

        let mut school_media = group_by_parent(self.media_for("school_id", &ids).await?);

        Ok(rows
            .into_iter()
            .map(|record| {
                let id = record.id;
                let mut level = |kind: LevelKind| {
                    levels.remove(&(kind, id)).unwrap_or_else(|| EducationLevel {
                        school_id: id,
                        ..Default::default()
                    })
                };
                let (primary_level, basic_level, secondary_level) = (
                    level(LevelKind::Primary),
                    level(LevelKind::Basic),
                    level(LevelKind::Secondary),
                );
                School {
                    address: addresses.remove(&id).unwrap_or_else(|| Address {
                        school_id: id,
                        ..Default::default()
                    }),
                    infrastructure: infrastructures.remove(&id).unwrap_or_else(|| Infrastructure {
                        school_id: id,
                        ..Default::default()
                    }),
                    primary_level,
                    basic_level,
                    secondary_level,
                    media: school_media.remove(&id).unwrap_or_default(),
                    record,
                }
            })
            .collect())
    }

    async fn creator_emails(&self, owners: Vec<String>) -> Result<HashMap<String, String>, DatabaseError> {
        if owners.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(String, Option<String>)> =
            sqlx::query_as("SELECT user_id, email FROM user_roles WHERE user_id = ANY($1)")
                .bind(owners)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(id, email)| email.map(|e| (id, e)))
            .collect())
    }

    async fn require(&self, id: i64) -> Result<School, DatabaseError> {
        self.find(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("School {} not found", id)))
    }
}

fn group_by_parent(items: Vec<MediaItem>) -> HashMap<i64, Vec<MediaItem>> {
    let mut grouped: HashMap<i64, Vec<MediaItem>> = HashMap::new();
    for item in items {
        grouped.entry(item.parent.id()).or_default().push(item);
    }
    grouped
}

async fn upsert_address(
    tx: &mut Transaction<'_, Postgres>,
    school_id: i64,
    address: &AddressPayload,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO addresses (school_id, city, district, street, zip_code) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (school_id) DO UPDATE SET \
           city = EXCLUDED.city, district = EXCLUDED.district, \
           street = EXCLUDED.street, zip_code = EXCLUDED.zip_code",
    )
    .bind(school_id)
    .bind(&address.city)
    .bind(&address.district)
    .bind(&address.street)
    .bind(&address.zip_code)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn upsert_infrastructure(
    tx: &mut Transaction<'_, Postgres>,
    school_id: i64,
    infra: &InfrastructurePayload,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO infrastructures (school_id, has_library, has_gym, has_swimming_pool, \
           has_cafeteria, has_medical_room, has_playground, has_computer_lab, has_science_lab, \
           has_parking, has_wheelchair_access, building_area, yard_area, comment) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         ON CONFLICT (school_id) DO UPDATE SET \
           has_library = EXCLUDED.has_library, has_gym = EXCLUDED.has_gym, \
           has_swimming_pool = EXCLUDED.has_swimming_pool, has_cafeteria = EXCLUDED.has_cafeteria, \
           has_medical_room = EXCLUDED.has_medical_room, has_playground = EXCLUDED.has_playground, \
           has_computer_lab = EXCLUDED.has_computer_lab, has_science_lab = EXCLUDED.has_science_lab, \
           has_parking = EXCLUDED.has_parking, has_wheelchair_access = EXCLUDED.has_wheelchair_access, \
           building_area = EXCLUDED.building_area, yard_area = EXCLUDED.yard_area, \
           comment = EXCLUDED.comment",
    )
    .bind(school_id)
    .bind(infra.has_library)
    .bind(infra.has_gym)
    .bind(infra.has_swimming_pool)
    .bind(infra.has_cafeteria)
    .bind(infra.has_medical_room)
    .bind(infra.has_playground)
    .bind(infra.has_computer_lab)
    .bind(infra.has_science_lab)
    .bind(infra.has_parking)
    .bind(infra.has_wheelchair_access)
    .bind(infra.building_area)
    .bind(infra.yard_area)
    .bind(&infra.comment)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Returns the level row id.
async fn upsert_level(
    tx: &mut Transaction<'_, Postgres>,
    kind: LevelKind,
    school_id: i64,
    level: &EducationLevelPayload,
) -> Result<i64, DatabaseError> {
    let sql = format!(
        "INSERT INTO {} (school_id, price, discount_info, capacity, students_per_class, \
           starts_at, ends_at, meals_included, meals_comment, transport_available, \
           transport_comment, extended_day, sports_clubs, foreign_languages, extracurricular, \
           admission_comment) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
         ON CONFLICT (school_id) DO UPDATE SET \
           price = EXCLUDED.price, discount_info = EXCLUDED.discount_info, \
           capacity = EXCLUDED.capacity, students_per_class = EXCLUDED.students_per_class, \
           starts_at = EXCLUDED.starts_at, ends_at = EXCLUDED.ends_at, \
           meals_included = EXCLUDED.meals_included, meals_comment = EXCLUDED.meals_comment, \
           transport_available = EXCLUDED.transport_available, \
           transport_comment = EXCLUDED.transport_comment, extended_day = EXCLUDED.extended_day, \
           sports_clubs = EXCLUDED.sports_clubs, foreign_languages = EXCLUDED.foreign_languages, \
           extracurricular = EXCLUDED.extracurricular, admission_comment = EXCLUDED.admission_comment \
         RETURNING id",
        kind.table_name()
    );
    let id: i64 = sqlx::query_scalar(&sql)
        .bind(school_id)
        .bind(level.price)
        .bind(&level.discount_info)
        .bind(level.capacity)
        .bind(level.students_per_class)
        .bind(&level.starts_at)
        .bind(&level.ends_at)
        .bind(level.meals_included)
        .bind(&level.meals_comment)
        .bind(level.transport_available)
        .bind(&level.transport_comment)
        .bind(level.extended_day)
        .bind(&level.sports_clubs)
        .bind(&level.foreign_languages)
        .bind(&level.extracurricular)
        .bind(&level.admission_comment)
        .fetch_one(&mut **tx)
        .await?;
    Ok(id)
}

fn push_media_insert<'a>(items: &'a [NewMedia]) -> SqlBuilder<'a, Postgres> {
    let mut builder = SqlBuilder::new(
        "INSERT INTO media_items (media_url, description, media_type, school_id, \
         primary_level_id, basic_level_id, secondary_level_id) ",
    );
    builder.push_values(items, |mut row, item| {
        let [school, primary, basic, secondary] = item.parent.columns();
        row.push_bind(&item.media_url)
            .push_bind(&item.description)
            .push_bind(item.media_type.as_str())
            .push_bind(school)
            .push_bind(primary)
            .push_bind(basic)
            .push_bind(secondary);
    });
    builder.push(" RETURNING *");
    builder
}

macro_rules! set_if_present {
    ($sep:expr, $column:literal, $value:expr) => {
        if let Some(v) = &$value {
            $sep.push(concat!($column, " = ")).push_bind_unseparated(v.clone());
        }
    };
}

#[async_trait]
impl SchoolStore for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<School>, DatabaseError> {
        let rows = self.schools().select_any(query.to_filter_data()).await?;
        self.load_relations(rows).await
    }

    async fn list_summaries(&self, query: &ListQuery) -> Result<Vec<SchoolSummary>, DatabaseError> {
        let rows = self.schools().select_any(query.to_filter_data()).await?;
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let addresses: HashMap<i64, Address> = self
            .children::<Address>("addresses")
            .select_in("school_id", &ids)
            .await?
            .into_iter()
            .map(|a| (a.school_id, a))
            .collect();
        let mut owners: Vec<String> = rows.iter().map(|r| r.created_by.clone()).collect();
        owners.sort();
        owners.dedup();
        let emails = self.creator_emails(owners).await?;

        Ok(rows
            .iter()
            .map(|row| {
                SchoolSummary::new(
                    row,
                    addresses.get(&row.id),
                    emails.get(&row.created_by).cloned(),
                )
            })
            .collect())
    }

    async fn count(&self, query: &ListQuery) -> Result<i64, DatabaseError> {
        self.schools().count(query.to_filter_data()).await
    }

    async fn find(&self, id: i64) -> Result<Option<School>, DatabaseError> {
        let row = self
            .schools()
            .select_one(FilterData::matching(json!({ "id": id })))
            .await?;
        match row {
            Some(row) => Ok(self.load_relations(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn owner_of(&self, id: i64) -> Result<Option<UserId>, DatabaseError> {
        let owner = sqlx::query_scalar("SELECT created_by FROM schools WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    async fn create(&self, payload: &SchoolPayload, owner: &str) -> Result<School, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO schools (name, phone_number1, phone_number2, phone_number3, email, \
               website, facebook_url, instagram_url, logo_url, director_name, deputy_director_name, \
               founded_year, description, history, mission, has_uniform, uniform_comment, \
               has_security, security_comment, has_psychologist, psychologist_comment, \
               has_special_needs_support, special_needs_comment, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
               $18, $19, $20, $21, $22, $23, $24) \
             RETURNING id",
        )
        .bind(&payload.name)
        .bind(&payload.phone_number1)
        .bind(&payload.phone_number2)
        .bind(&payload.phone_number3)
        .bind(&payload.email)
        .bind(&payload.website)
        .bind(&payload.facebook_url)
        .bind(&payload.instagram_url)
        .bind(&payload.logo_url)
        .bind(&payload.director_name)
        .bind(&payload.deputy_director_name)
        .bind(payload.founded_year)
        .bind(&payload.description)
        .bind(&payload.history)
        .bind(&payload.mission)
        .bind(payload.has_uniform)
        .bind(&payload.uniform_comment)
        .bind(payload.has_security)
        .bind(&payload.security_comment)
        .bind(payload.has_psychologist)
        .bind(&payload.psychologist_comment)
        .bind(payload.has_special_needs_support)
        .bind(&payload.special_needs_comment)
        .bind(owner)
        .fetch_one(&mut *tx)
        .await?;

        upsert_address(&mut tx, id, &payload.address).await?;
        upsert_infrastructure(&mut tx, id, &payload.infrastructure).await?;

        let mut photos = Vec::new();
        for (kind, level) in [
            (LevelKind::Primary, &payload.primary_level),
            (LevelKind::Basic, &payload.basic_level),
            (LevelKind::Secondary, &payload.secondary_level),
        ] {
            let level_id = upsert_level(&mut tx, kind, id, level).await?;
            photos.extend(level.photos.iter().map(|url| NewMedia {
                media_url: url.clone(),
                description: None,
                media_type: MediaKind::Photo,
                parent: match kind {
                    LevelKind::Primary => MediaParent::Primary(level_id),
                    LevelKind::Basic => MediaParent::Basic(level_id),
                    LevelKind::Secondary => MediaParent::Secondary(level_id),
                },
            }));
        }
        if !photos.is_empty() {
            push_media_insert(&photos).build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        debug!("created school {} with {} level photos", id, photos.len());
        self.require(id).await
    }

    async fn update(
        &self,
        id: i64,
        changes: &SchoolUpdate,
        editor: &str,
    ) -> Result<School, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let mut builder = SqlBuilder::<Postgres>::new("UPDATE schools SET ");
        {
            let mut sep = builder.separated(", ");
            set_if_present!(sep, "name", changes.name);
            set_if_present!(sep, "phone_number1", changes.phone_number1);
            set_if_present!(sep, "phone_number2", changes.phone_number2);
            set_if_present!(sep, "phone_number3", changes.phone_number3);
            set_if_present!(sep, "email", changes.email);
            set_if_present!(sep, "website", changes.website);
            set_if_present!(sep, "facebook_url", changes.facebook_url);
            set_if_present!(sep, "instagram_url", changes.instagram_url);
            set_if_present!(sep, "logo_url", changes.logo_url);
            set_if_present!(sep, "director_name", changes.director_name);
            set_if_present!(sep, "deputy_director_name", changes.deputy_director_name);
            set_if_present!(sep, "founded_year", changes.founded_year);
            set_if_present!(sep, "description", changes.description);
            set_if_present!(sep, "history", changes.history);
            set_if_present!(sep, "mission", changes.mission);
            set_if_present!(sep, "has_uniform", changes.has_uniform);
            set_if_present!(sep, "uniform_comment", changes.uniform_comment);
            set_if_present!(sep, "has_security", changes.has_security);
            set_if_present!(sep, "security_comment", changes.security_comment);
            set_if_present!(sep, "has_psychologist", changes.has_psychologist);
            set_if_present!(sep, "psychologist_comment", changes.psychologist_comment);
            set_if_present!(sep, "has_special_needs_support", changes.has_special_needs_support);
            set_if_present!(sep, "special_needs_comment", changes.special_needs_comment);
            sep.push("updated_by = ").push_bind_unseparated(editor.to_string());
            sep.push("updated_at = now()");
        }
        builder.push(" WHERE id = ").push_bind(id);

        let result = builder.build().execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("School {} not found", id)));
        }

        if let Some(address) = &changes.address {
            upsert_address(&mut tx, id, address).await?;
        }
        if let Some(infra) = &changes.infrastructure {
            upsert_infrastructure(&mut tx, id, infra).await?;
        }
        for (kind, level) in [
            (LevelKind::Primary, &changes.primary_level),
            (LevelKind::Basic, &changes.basic_level),
            (LevelKind::Secondary, &changes.secondary_level),
        ] {
            if let Some(level) = level {
                upsert_level(&mut tx, kind, id, level).await?;
            }
        }

        tx.commit().await?;
        self.require(id).await
    }

    async fn delete(&self, id: i64) -> Result<School, DatabaseError> {
        let prior = self.require(id).await?;
        let result = sqlx::query("DELETE FROM schools WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("School {} not found", id)));
        }
        Ok(prior)
    }
}

#[async_trait]
impl MediaStore for PgStore {
    async fn insert_many(&self, items: &[NewMedia]) -> Result<Vec<MediaItem>, DatabaseError> {
        if items.is_empty() {
            return Ok(vec![]);
        }
        let rows: Vec<MediaRow> = push_media_insert(items)
            .build_query_as::<MediaRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(MediaItem::try_from).collect()
    }
}

#[async_trait]
impl RoleStore for PgStore {
    async fn role_of(&self, user_id: &str) -> Result<Option<Role>, DatabaseError> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        role.map(|r| r.parse::<Role>().map_err(DatabaseError::Corrupt))
            .transpose()
    }

    async fn assign(&self, user_id: &str, email: &str, role: Role) -> Result<UserRole, DatabaseError> {
        let row: UserRoleRow = sqlx::query_as(
            "INSERT INTO user_roles (user_id, email, role) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET email = EXCLUDED.email, role = EXCLUDED.role \
             RETURNING user_id, email, role, created_at",
        )
        .bind(user_id)
        .bind(email)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;
        UserRole::try_from(row)
    }
}
