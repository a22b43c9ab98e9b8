use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::Owned;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Social {
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
}

impl Social {
    /// 新值为空的字段保留旧值
    pub fn merged_over(self, existing: &Social) -> Social {
        Social {
            youtube: self.youtube.or_else(|| existing.youtube.clone()),
            twitter: self.twitter.or_else(|| existing.twitter.clone()),
            facebook: self.facebook.or_else(|| existing.facebook.clone()),
            linkedin: self.linkedin.or_else(|| existing.linkedin.clone()),
            instagram: self.instagram.or_else(|| existing.instagram.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Experience {
    pub id: Uuid,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub current: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Education {
    pub id: Uuid,
    pub school: String,
    pub degree: Option<String>,
    pub field_of_study: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub owner_account_id: Uuid,
    pub bio: String,
    pub favorite_color: String,
    pub website: Option<String>,
    pub skills: Vec<String>,
    pub social: Social,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Profile {
    const RESOURCE: &'static str = "profile";

    fn owner_id(&self) -> &Uuid {
        &self.owner_account_id
    }
}

/// Fields accepted by create-or-update. `None` keeps the stored value on update.
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub bio: String,
    pub favorite_color: String,
    pub website: Option<String>,
    pub skills: Option<Vec<String>>,
    pub social: Social,
}

#[derive(Debug, Clone)]
pub struct NewExperience {
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub current: bool,
    pub description: String,
}

impl NewExperience {
    pub fn into_entry(self, id: Uuid) -> Experience {
        Experience {
            id,
            title: self.title,
            company: self.company,
            location: self.location,
            from: self.from,
            to: self.to,
            current: self.current,
            description: self.description,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewEducation {
    pub school: String,
    pub degree: Option<String>,
    pub field_of_study: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub current: bool,
    pub description: Option<String>,
}

impl NewEducation {
    pub fn into_entry(self, id: Uuid) -> Education {
        Education {
            id,
            school: self.school,
            degree: self.degree,
            field_of_study: self.field_of_study,
            from: self.from,
            to: self.to,
            current: self.current,
            description: self.description,
        }
    }
}
