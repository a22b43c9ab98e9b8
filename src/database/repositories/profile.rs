use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use super::PgStore;
use crate::database::StoreError;
use crate::database::models::{
    Education, Experience, NewEducation, NewExperience, Profile, ProfileFields, Social,
};

/// 个人资料存储，每个账号最多一份
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_profile(&self, owner: Uuid) -> Result<Option<Profile>, StoreError>;

    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError>;

    /// Creates the owner's profile or updates it in place.
    async fn upsert_profile(&self, owner: Uuid, fields: ProfileFields)
    -> Result<Profile, StoreError>;

    async fn delete_profile(&self, owner: Uuid) -> Result<bool, StoreError>;

    /// `None` when the owner has no profile.
    async fn add_experience(
        &self,
        owner: Uuid,
        entry: NewExperience,
    ) -> Result<Option<Profile>, StoreError>;

    async fn remove_experience(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError>;

    /// `None` when the owner has no profile.
    async fn add_education(
        &self,
        owner: Uuid,
        entry: NewEducation,
    ) -> Result<Option<Profile>, StoreError>;

    async fn remove_education(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    owner_account_id: Uuid,
    bio: String,
    favorite_color: String,
    website: Option<String>,
    skills: Vec<String>,
    youtube: Option<String>,
    twitter: Option<String>,
    facebook: Option<String>,
    linkedin: Option<String>,
    instagram: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_profile(self, experience: Vec<Experience>, education: Vec<Education>) -> Profile {
        Profile {
            owner_account_id: self.owner_account_id,
            bio: self.bio,
            favorite_color: self.favorite_color,
            website: self.website,
            skills: self.skills,
            social: Social {
                youtube: self.youtube,
                twitter: self.twitter,
                facebook: self.facebook,
                linkedin: self.linkedin,
                instagram: self.instagram,
            },
            experience,
            education,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ExperienceRow {
    owner_account_id: Uuid,
    #[sqlx(flatten)]
    entry: Experience,
}

#[derive(Debug, FromRow)]
struct EducationRow {
    owner_account_id: Uuid,
    #[sqlx(flatten)]
    entry: Education,
}

const PROFILE_COLUMNS: &str = "owner_account_id, bio, favorite_color, website, skills, \
     youtube, twitter, facebook, linkedin, instagram, created_at, updated_at";

async fn load_experience<'e>(
    executor: impl PgExecutor<'e>,
    owners: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Experience>>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ExperienceRow>(
        r#"
        SELECT owner_account_id, id, title, company, location,
               from_date AS "from", to_date AS "to", is_current AS current, description
        FROM profile_experience
        WHERE owner_account_id = ANY($1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(owners)
    .fetch_all(executor)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<Experience>> = HashMap::new();
    for row in rows {
        grouped.entry(row.owner_account_id).or_default().push(row.entry);
    }
    Ok(grouped)
}

async fn load_education<'e>(
    executor: impl PgExecutor<'e>,
    owners: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Education>>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EducationRow>(
        r#"
        SELECT owner_account_id, id, school, degree, field_of_study,
               from_date AS "from", to_date AS "to", is_current AS current, description
        FROM profile_education
        WHERE owner_account_id = ANY($1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(owners)
    .fetch_all(executor)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<Education>> = HashMap::new();
    for row in rows {
        grouped.entry(row.owner_account_id).or_default().push(row.entry);
    }
    Ok(grouped)
}

impl PgStore {
    async fn hydrate_profiles(&self, rows: Vec<ProfileRow>) -> Result<Vec<Profile>, StoreError> {
        let owners: Vec<Uuid> = rows.iter().map(|r| r.owner_account_id).collect();
        let mut experience = load_experience(&self.pool, &owners).await?;
        let mut education = load_education(&self.pool, &owners).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let exp = experience.remove(&row.owner_account_id).unwrap_or_default();
                let edu = education.remove(&row.owner_account_id).unwrap_or_default();
                row.into_profile(exp, edu)
            })
            .collect())
    }
}

#[async_trait]
impl ProfileRepository for PgStore {
    async fn find_profile(&self, owner: Uuid) -> Result<Option<Profile>, StoreError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE owner_account_id = $1");
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate_profiles(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, ProfileRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        self.hydrate_profiles(rows).await
    }

    async fn upsert_profile(
        &self,
        owner: Uuid,
        fields: ProfileFields,
    ) -> Result<Profile, StoreError> {
        let now = Utc::now();
        // 更新时未提供的可选字段保留原值
        let sql = format!(
            r#"
            INSERT INTO profiles (
                owner_account_id, bio, favorite_color, website, skills,
                youtube, twitter, facebook, linkedin, instagram, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, COALESCE($5, ARRAY[]::TEXT[]), $6, $7, $8, $9, $10, $11, $11)
            ON CONFLICT (owner_account_id) DO UPDATE SET
                bio = EXCLUDED.bio,
                favorite_color = EXCLUDED.favorite_color,
                website = COALESCE($4, profiles.website),
                skills = COALESCE($5, profiles.skills),
                youtube = COALESCE($6, profiles.youtube),
                twitter = COALESCE($7, profiles.twitter),
                facebook = COALESCE($8, profiles.facebook),
                linkedin = COALESCE($9, profiles.linkedin),
                instagram = COALESCE($10, profiles.instagram),
                updated_at = EXCLUDED.updated_at
            RETURNING {PROFILE_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(owner)
            .bind(&fields.bio)
            .bind(&fields.favorite_color)
            .bind(&fields.website)
            .bind(&fields.skills)
            .bind(&fields.social.youtube)
            .bind(&fields.social.twitter)
            .bind(&fields.social.facebook)
            .bind(&fields.social.linkedin)
            .bind(&fields.social.instagram)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        let mut profiles = self.hydrate_profiles(vec![row]).await?;
        profiles
            .pop()
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn delete_profile(&self, owner: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM profiles WHERE owner_account_id = $1")
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_experience(
        &self,
        owner: Uuid,
        entry: NewExperience,
    ) -> Result<Option<Profile>, StoreError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO profile_experience (
                id, owner_account_id, title, company, location,
                from_date, to_date, is_current, description, created_at
            )
            SELECT $1, owner_account_id, $3, $4, $5, $6, $7, $8, $9, $10
            FROM profiles WHERE owner_account_id = $2
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&entry.title)
        .bind(&entry.company)
        .bind(&entry.location)
        .bind(entry.from)
        .bind(entry.to)
        .bind(entry.current)
        .bind(&entry.description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Ok(None);
        }
        self.find_profile(owner).await
    }

    async fn remove_experience(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM profile_experience WHERE id = $1 AND owner_account_id = $2")
                .bind(id)
                .bind(owner)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_education(
        &self,
        owner: Uuid,
        entry: NewEducation,
    ) -> Result<Option<Profile>, StoreError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO profile_education (
                id, owner_account_id, school, degree, field_of_study,
                from_date, to_date, is_current, description, created_at
            )
            SELECT $1, owner_account_id, $3, $4, $5, $6, $7, $8, $9, $10
            FROM profiles WHERE owner_account_id = $2
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&entry.school)
        .bind(&entry.degree)
        .bind(&entry.field_of_study)
        .bind(entry.from)
        .bind(entry.to)
        .bind(entry.current)
        .bind(&entry.description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Ok(None);
        }
        self.find_profile(owner).await
    }

    async fn remove_education(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM profile_education WHERE id = $1 AND owner_account_id = $2")
                .bind(id)
                .bind(owner)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
