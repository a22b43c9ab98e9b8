mod handler;
pub mod model;

pub use handler::{comment, create, delete_comment, get_one, like, list, remove, unlike, update};
pub use model::{GenericPosts, InventoryPosts, PostVariant, RecipePosts};
