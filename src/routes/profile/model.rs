use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AppState,
    database::models::{
        AccountKind, AuthorSnapshot, NewEducation, NewExperience, Profile, ProfileFields, Social,
    },
    error::{AppError, FieldError},
    utils::split_skills,
};

/// 技能既可以是逗号分隔的字符串，也可以是字符串数组
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SkillsInput {
    Csv(String),
    List(Vec<String>),
}

impl SkillsInput {
    pub fn into_skills(self) -> Vec<String> {
        match self {
            SkillsInput::Csv(raw) => split_skills(&raw),
            SkillsInput::List(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub favorite_color: String,
    pub website: Option<String>,
    pub skills: Option<SkillsInput>,
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ProfileRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.bio.trim().is_empty() {
            errors.push(FieldError::new("bio", "Bio is required"));
        }
        if self.favorite_color.trim().is_empty() {
            errors.push(FieldError::new("favorite_color", "Favorite Color is required"));
        }
        errors
    }

    fn into_fields(self) -> ProfileFields {
        ProfileFields {
            bio: self.bio,
            favorite_color: self.favorite_color,
            website: non_blank(self.website),
            skills: self.skills.map(SkillsInput::into_skills),
            social: Social {
                youtube: non_blank(self.youtube),
                twitter: non_blank(self.twitter),
                facebook: non_blank(self.facebook),
                linkedin: non_blank(self.linkedin),
                instagram: non_blank(self.instagram),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExperienceRequest {
    #[serde(default)]
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub description: String,
}

impl ExperienceRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "Job Title is required"));
        }
        if self.description.trim().is_empty() {
            errors.push(FieldError::new("description", "Job description is required"));
        }
        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct EducationRequest {
    #[serde(default)]
    pub school: String,
    pub degree: Option<String>,
    #[serde(default, alias = "fieldofstudy")]
    pub field_of_study: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
    pub description: Option<String>,
}

impl EducationRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.school.trim().is_empty() {
            errors.push(FieldError::new("school", "School is required"));
        }
        if self.field_of_study.trim().is_empty() {
            errors.push(FieldError::new("field_of_study", "What was studied is required"));
        }
        errors
    }
}

/// 返回给客户端的资料，附带账号的公开信息
#[derive(Debug, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: Profile,
    pub user: Option<AuthorSnapshot>,
}

async fn view(state: &AppState, profile: Profile) -> Result<ProfileView, AppError> {
    let user = state
        .store
        .find_any_account(profile.owner_account_id)
        .await?
        .map(|a| a.snapshot());
    Ok(ProfileView { profile, user })
}

async fn own_profile(state: &AppState, caller: Uuid) -> Result<Profile, AppError> {
    state
        .store
        .find_profile(caller)
        .await?
        .ok_or(AppError::NotFound("profile"))
}

pub async fn my_profile(state: &AppState, caller: Uuid) -> Result<ProfileView, AppError> {
    let profile = own_profile(state, caller).await?;
    view(state, profile).await
}

pub async fn list_profiles(state: &AppState) -> Result<Vec<ProfileView>, AppError> {
    let profiles = state.store.list_profiles().await?;
    let mut views = Vec::with_capacity(profiles.len());
    for profile in profiles {
        views.push(view(state, profile).await?);
    }
    Ok(views)
}

pub async fn profile_by_account(
    state: &AppState,
    account_id: Uuid,
) -> Result<ProfileView, AppError> {
    let profile = state
        .store
        .find_profile(account_id)
        .await?
        .ok_or(AppError::NotFound("profile"))?;
    view(state, profile).await
}

pub async fn upsert_profile(
    state: &AppState,
    caller: Uuid,
    req: ProfileRequest,
) -> Result<ProfileView, AppError> {
    AppError::validation(req.validate())?;
    let profile = state.store.upsert_profile(caller, req.into_fields()).await?;
    view(state, profile).await
}

/// 删除资料以及调用者的用户账号
pub async fn delete_profile_and_account(state: &AppState, caller: Uuid) -> Result<(), AppError> {
    state.store.delete_profile(caller).await?;
    let removed = state.store.delete_account(AccountKind::User, caller).await?;
    tracing::info!("Account {} deleted its profile (user removed: {})", caller, removed);
    Ok(())
}

pub async fn add_experience(
    state: &AppState,
    caller: Uuid,
    req: ExperienceRequest,
) -> Result<Profile, AppError> {
    AppError::validation(req.validate())?;
    own_profile(state, caller).await?;

    let entry = NewExperience {
        title: req.title,
        company: non_blank(req.company),
        location: non_blank(req.location),
        from: req.from,
        to: req.to,
        current: req.current,
        description: req.description,
    };
    state
        .store
        .add_experience(caller, entry)
        .await?
        .ok_or(AppError::NotFound("profile"))
}

pub async fn remove_experience(
    state: &AppState,
    caller: Uuid,
    id: Uuid,
) -> Result<Profile, AppError> {
    own_profile(state, caller).await?;
    if !state.store.remove_experience(caller, id).await? {
        return Err(AppError::NotFound("experience"));
    }
    own_profile(state, caller).await
}

pub async fn add_education(
    state: &AppState,
    caller: Uuid,
    req: EducationRequest,
) -> Result<Profile, AppError> {
    AppError::validation(req.validate())?;
    own_profile(state, caller).await?;

    let entry = NewEducation {
        school: req.school,
        degree: non_blank(req.degree),
        field_of_study: req.field_of_study,
        from: req.from,
        to: req.to,
        current: req.current,
        description: non_blank(req.description),
    };
    state
        .store
        .add_education(caller, entry)
        .await?
        .ok_or(AppError::NotFound("profile"))
}

pub async fn remove_education(
    state: &AppState,
    caller: Uuid,
    id: Uuid,
) -> Result<Profile, AppError> {
    own_profile(state, caller).await?;
    if !state.store.remove_education(caller, id).await? {
        return Err(AppError::NotFound("education"));
    }
    own_profile(state, caller).await
}

/// GitHub 用户名只允许字母、数字和连字符
fn is_valid_github_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= 39
        && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// 用户名作为单独的路径段编码，不能拼出其他 GitHub 接口
pub fn github_repos_url(base: &str, username: &str) -> Result<reqwest::Url, AppError> {
    if !is_valid_github_username(username) {
        tracing::debug!("Rejected GitHub username {:?}", username);
        return Err(AppError::NotFound("github profile"));
    }

    let mut url =
        reqwest::Url::parse(base).map_err(|e| AppError::internal("github base url", e))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Internal("github base url cannot be a base".into()))?
        .pop_if_empty()
        .extend(["users", username, "repos"]);
    Ok(url)
}

/// 代理 GitHub 仓库列表，对方返回非 200 时按不存在处理
pub async fn github_repos(state: &AppState, username: &str) -> Result<serde_json::Value, AppError> {
    let config = &state.config;
    let url = github_repos_url(&config.github_api_base, username)?;

    let mut query: Vec<(&str, &str)> = vec![("per_page", "5"), ("sort", "created:asc")];
    if let Some(id) = config.github_client_id.as_deref() {
        query.push(("client_id", id));
    }
    if let Some(secret) = config.github_client_secret.as_deref() {
        query.push(("client_secret", secret));
    }

    let response = state
        .http
        .get(url)
        .query(&query)
        .send()
        .await
        .map_err(|e| AppError::internal("github request", e))?;

    if response.status() != reqwest::StatusCode::OK {
        tracing::debug!("GitHub returned {} for {}", response.status(), username);
        return Err(AppError::NotFound("github profile"));
    }

    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| AppError::internal("github response", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{memory_state, seed_account};

    fn profile_request(skills: SkillsInput) -> ProfileRequest {
        ProfileRequest {
            bio: "Backend developer".into(),
            favorite_color: "green".into(),
            skills: Some(skills),
            ..Default::default()
        }
    }

    fn experience(title: &str) -> ExperienceRequest {
        ExperienceRequest {
            title: title.into(),
            company: Some("Acme".into()),
            location: None,
            from: NaiveDate::from_ymd_opt(2020, 1, 1),
            to: None,
            current: true,
            description: "Built things".into(),
        }
    }

    #[test]
    fn github_url_keeps_username_in_one_segment() {
        let url = github_repos_url("https://api.github.com", "octocat").unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/users/octocat/repos");

        let url = github_repos_url("https://ghe.example.com/api/v3/", "octo-cat").unwrap();
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/users/octo-cat/repos");

        for bad in ["../orgs/x", "a/b", "", "octo cat", "..%2Forgs"] {
            assert!(matches!(
                github_repos_url("https://api.github.com", bad),
                Err(AppError::NotFound("github profile"))
            ));
        }
    }

    #[test]
    fn skills_accept_csv_or_list() {
        let csv: SkillsInput = serde_json::from_str(r#""rust, sql ,axum""#).unwrap();
        assert_eq!(csv.into_skills(), ["rust", "sql", "axum"]);
        let list: SkillsInput = serde_json::from_str(r#"[" rust", "", "sql"]"#).unwrap();
        assert_eq!(list.into_skills(), ["rust", "sql"]);
    }

    #[test]
    fn education_accepts_legacy_field_name() {
        let req: EducationRequest =
            serde_json::from_str(r#"{"school":"MIT","fieldofstudy":"CS"}"#).unwrap();
        assert_eq!(req.field_of_study, "CS");
        assert!(req.validate().is_empty());
    }

    #[tokio::test]
    async fn bio_and_color_are_required() {
        let state = memory_state();
        let alice = seed_account(&state, AccountKind::User, "alice").await;
        let err = upsert_profile(&state, alice.id, ProfileRequest::default())
            .await
            .unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, ["bio", "favorite_color"]);
    }

    #[tokio::test]
    async fn experience_is_added_newest_first_and_removed_by_id() {
        let state = memory_state();
        let alice = seed_account(&state, AccountKind::User, "alice").await;

        let err = add_experience(&state, alice.id, experience("First")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("profile")));

        upsert_profile(&state, alice.id, profile_request(SkillsInput::Csv("rust".into())))
            .await
            .unwrap();
        add_experience(&state, alice.id, experience("First")).await.unwrap();
        let profile = add_experience(&state, alice.id, experience("Second")).await.unwrap();
        assert_eq!(profile.experience[0].title, "Second");
        assert_eq!(profile.experience[1].title, "First");

        let err = remove_experience(&state, alice.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("experience")));

        let second = profile.experience[0].id;
        let profile = remove_experience(&state, alice.id, second).await.unwrap();
        assert_eq!(profile.experience.len(), 1);
        assert_eq!(profile.experience[0].title, "First");
    }

    #[tokio::test]
    async fn missing_own_profile_is_not_found() {
        let state = memory_state();
        let alice = seed_account(&state, AccountKind::User, "alice").await;

        assert!(matches!(
            my_profile(&state, alice.id).await.unwrap_err(),
            AppError::NotFound("profile")
        ));
        assert!(matches!(
            remove_education(&state, alice.id, Uuid::new_v4()).await.unwrap_err(),
            AppError::NotFound("profile")
        ));
    }

    #[tokio::test]
    async fn deleting_the_profile_removes_the_account() {
        let state = memory_state();
        let alice = seed_account(&state, AccountKind::User, "alice").await;
        upsert_profile(&state, alice.id, profile_request(SkillsInput::List(vec![])))
            .await
            .unwrap();

        let view = profile_by_account(&state, alice.id).await.unwrap();
        assert_eq!(view.user.map(|u| u.username), Some("alice".to_string()));

        delete_profile_and_account(&state, alice.id).await.unwrap();
        assert!(matches!(
            profile_by_account(&state, alice.id).await.unwrap_err(),
            AppError::NotFound("profile")
        ));
        assert!(state.store.find_any_account(alice.id).await.unwrap().is_none());
    }
}
