pub mod account;
pub mod post;
pub mod profile;

pub use account::{Account, AccountKind, AccountRow, AuthorSnapshot, NewAccount};
pub use post::{Comment, Like, LikeChange, NewComment, NewPost, Post, PostBody, PostKind};
pub use profile::{
    Education, Experience, NewEducation, NewExperience, Profile, ProfileFields, Social,
};
