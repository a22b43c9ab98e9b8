mod handler;
pub mod model;

pub use handler::{
    add_education, add_experience, by_account, delete_account, github_repos, list, me,
    remove_education, remove_experience, upsert,
};
