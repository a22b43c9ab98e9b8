//! In-process store. Every operation runs under one lock, so the
//! read-modify-write sequences (likes, comments, sub-lists) are atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::models::{
    Account, AccountKind, Comment, Education, Experience, Like, LikeChange, NewAccount,
    NewComment, NewEducation, NewExperience, NewPost, Post, PostBody, PostKind, Profile,
    ProfileFields,
};
use super::repositories::{AccountRepository, PostRepository, ProfileRepository};
use super::StoreError;

#[derive(Default)]
struct State {
    accounts: HashMap<AccountKind, Vec<Account>>,
    /// 按插入顺序存放，倒序即为最新在前
    posts: Vec<Post>,
    profiles: Vec<Profile>,
}

impl State {
    fn accounts(&self, kind: AccountKind) -> &[Account] {
        self.accounts.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    fn generic_post_mut(&mut self, id: Uuid) -> Option<&mut Post> {
        self.posts
            .iter_mut()
            .find(|p| p.id == id && p.kind() == PostKind::Generic)
    }

    fn profile_mut(&mut self, owner: Uuid) -> Option<&mut Profile> {
        self.profiles
            .iter_mut()
            .find(|p| p.owner_account_id == owner)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn insert_account(
        &self,
        kind: AccountKind,
        account: NewAccount,
    ) -> Result<Account, StoreError> {
        let mut state = self.state.lock().await;

        let existing = state.accounts(kind);
        if existing.iter().any(|a| a.email == account.email) {
            return Err(StoreError::DuplicateEmail);
        }
        if existing.iter().any(|a| a.username == account.username) {
            return Err(StoreError::DuplicateUsername);
        }

        let created = Account {
            id: Uuid::new_v4(),
            kind,
            name: account.name,
            email: account.email,
            username: account.username,
            password_hash: account.password_hash,
            avatar: account.avatar,
            created_at: Utc::now(),
        };
        state.accounts.entry(kind).or_default().push(created.clone());
        Ok(created)
    }

    async fn find_account(
        &self,
        kind: AccountKind,
        id: Uuid,
    ) -> Result<Option<Account>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.accounts(kind).iter().find(|a| a.id == id).cloned())
    }

    async fn find_account_by_username(
        &self,
        kind: AccountKind,
        username: &str,
    ) -> Result<Option<Account>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .accounts(kind)
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn count_accounts(&self, kind: AccountKind) -> Result<i64, StoreError> {
        let state = self.state.lock().await;
        Ok(state.accounts(kind).len() as i64)
    }

    async fn delete_account(&self, kind: AccountKind, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let Some(accounts) = state.accounts.get_mut(&kind) else {
            return Ok(false);
        };
        let before = accounts.len();
        accounts.retain(|a| a.id != id);
        Ok(accounts.len() != before)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let created = Post {
            id: Uuid::new_v4(),
            owner_account_id: post.owner_account_id,
            name: post.author.name,
            username: post.author.username,
            avatar: post.author.avatar,
            body: post.body,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        };
        self.state.lock().await.posts.push(created.clone());
        Ok(created)
    }

    async fn find_post(&self, kind: PostKind, id: Uuid) -> Result<Option<Post>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .posts
            .iter()
            .find(|p| p.id == id && p.kind() == kind)
            .cloned())
    }

    async fn list_posts(&self, kind: PostKind) -> Result<Vec<Post>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .posts
            .iter()
            .rev()
            .filter(|p| p.kind() == kind)
            .cloned()
            .collect())
    }

    async fn update_post_body(
        &self,
        kind: PostKind,
        id: Uuid,
        body: PostBody,
    ) -> Result<Option<Post>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(post) = state
            .posts
            .iter_mut()
            .find(|p| p.id == id && p.kind() == kind)
        else {
            return Ok(None);
        };
        post.body = body;
        post.updated_at = Some(Utc::now());
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, kind: PostKind, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let before = state.posts.len();
        state.posts.retain(|p| !(p.id == id && p.kind() == kind));
        Ok(state.posts.len() != before)
    }

    async fn add_like(&self, post_id: Uuid, account_id: Uuid) -> Result<LikeChange, StoreError> {
        let mut state = self.state.lock().await;
        let Some(post) = state.generic_post_mut(post_id) else {
            return Ok(LikeChange::PostMissing);
        };
        if post.likes.iter().any(|l| l.account_id == account_id) {
            return Ok(LikeChange::Unchanged);
        }
        post.likes.insert(
            0,
            Like {
                account_id,
                created_at: Utc::now(),
            },
        );
        Ok(LikeChange::Applied(post.likes.clone()))
    }

    async fn remove_like(
        &self,
        post_id: Uuid,
        account_id: Uuid,
    ) -> Result<LikeChange, StoreError> {
        let mut state = self.state.lock().await;
        let Some(post) = state.generic_post_mut(post_id) else {
            return Ok(LikeChange::PostMissing);
        };
        let Some(index) = post.likes.iter().position(|l| l.account_id == account_id) else {
            return Ok(LikeChange::Unchanged);
        };
        post.likes.remove(index);
        Ok(LikeChange::Applied(post.likes.clone()))
    }

    async fn add_comment(
        &self,
        post_id: Uuid,
        comment: NewComment,
    ) -> Result<Option<Vec<Comment>>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(post) = state.generic_post_mut(post_id) else {
            return Ok(None);
        };
        post.comments.insert(
            0,
            Comment {
                id: Uuid::new_v4(),
                account_id: comment.account_id,
                name: comment.author.name,
                username: comment.author.username,
                avatar: comment.author.avatar,
                text: comment.text,
                created_at: Utc::now(),
            },
        );
        Ok(Some(post.comments.clone()))
    }

    async fn remove_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<Vec<Comment>>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(post) = state.generic_post_mut(post_id) else {
            return Ok(None);
        };
        let Some(index) = post.comments.iter().position(|c| c.id == comment_id) else {
            return Ok(None);
        };
        post.comments.remove(index);
        Ok(Some(post.comments.clone()))
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn find_profile(&self, owner: Uuid) -> Result<Option<Profile>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .profiles
            .iter()
            .find(|p| p.owner_account_id == owner)
            .cloned())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.profiles.iter().rev().cloned().collect())
    }

    async fn upsert_profile(
        &self,
        owner: Uuid,
        fields: ProfileFields,
    ) -> Result<Profile, StoreError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        if let Some(profile) = state.profile_mut(owner) {
            profile.bio = fields.bio;
            profile.favorite_color = fields.favorite_color;
            if fields.website.is_some() {
                profile.website = fields.website;
            }
            if let Some(skills) = fields.skills {
                profile.skills = skills;
            }
            profile.social = fields.social.merged_over(&profile.social);
            profile.updated_at = now;
            return Ok(profile.clone());
        }

        let profile = Profile {
            owner_account_id: owner,
            bio: fields.bio,
            favorite_color: fields.favorite_color,
            website: fields.website,
            skills: fields.skills.unwrap_or_default(),
            social: fields.social,
            experience: Vec::new(),
            education: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn delete_profile(&self, owner: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let before = state.profiles.len();
        state.profiles.retain(|p| p.owner_account_id != owner);
        Ok(state.profiles.len() != before)
    }

    async fn add_experience(
        &self,
        owner: Uuid,
        entry: NewExperience,
    ) -> Result<Option<Profile>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(profile) = state.profile_mut(owner) else {
            return Ok(None);
        };
        profile.experience.insert(0, entry.into_entry(Uuid::new_v4()));
        Ok(Some(profile.clone()))
    }

    async fn remove_experience(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let Some(profile) = state.profile_mut(owner) else {
            return Ok(false);
        };
        Ok(remove_by_id(&mut profile.experience, |e: &Experience| e.id == id))
    }

    async fn add_education(
        &self,
        owner: Uuid,
        entry: NewEducation,
    ) -> Result<Option<Profile>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(profile) = state.profile_mut(owner) else {
            return Ok(None);
        };
        profile.education.insert(0, entry.into_entry(Uuid::new_v4()));
        Ok(Some(profile.clone()))
    }

    async fn remove_education(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let Some(profile) = state.profile_mut(owner) else {
            return Ok(false);
        };
        Ok(remove_by_id(&mut profile.education, |e: &Education| e.id == id))
    }
}

fn remove_by_id<T>(items: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
    match items.iter().position(matches) {
        Some(index) => {
            items.remove(index);
            true
        }
        None => false,
    }
}
