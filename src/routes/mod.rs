pub mod post;
pub mod profile;
pub mod user;

use axum::{
    Json, Router,
    extract::Path,
    routing::{delete, get, post, put},
};
use axum_extra::extract::WithRejection;
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    error::AppError,
    middleware::{auth_middleware, log_errors},
};
use self::post::{GenericPosts, InventoryPosts, RecipePosts};

/// JSON 请求体，解析失败统一转成 `AppError`
pub type JsonBody<T> = WithRejection<Json<T>, AppError>;

/// 路径参数，格式错误按记录不存在处理
pub type PathParam<T> = WithRejection<Path<T>, AppError>;

fn public_routes() -> Router<AppState> {
    Router::new()
        // 注册与登录
        .route("/users", post(user::register))
        .route("/auth", post(user::login))
        .route("/auth/admin", post(user::admin_login))
        // 公开的个人资料
        .route("/profile", get(profile::list))
        .route("/profile/user/{account_id}", get(profile::by_account))
        .route("/profile/github/{username}", get(profile::github_repos))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth", get(user::me))
        .route("/admin", post(user::register_admin))
        // 普通帖子
        .route(
            "/generic_posts",
            post(post::create::<GenericPosts>).get(post::list::<GenericPosts>),
        )
        .route(
            "/generic_posts/{id}",
            get(post::get_one::<GenericPosts>)
                .put(post::update::<GenericPosts>)
                .delete(post::remove::<GenericPosts>),
        )
        .route("/generic_posts/like/{id}", put(post::like))
        .route("/generic_posts/unlike/{id}", put(post::unlike))
        .route("/generic_posts/comment/{id}", post(post::comment))
        .route(
            "/generic_posts/comment/{id}/{comment_id}",
            delete(post::delete_comment),
        )
        // 库存帖子
        .route(
            "/inventory",
            post(post::create::<InventoryPosts>).get(post::list::<InventoryPosts>),
        )
        .route(
            "/inventory/{id}",
            get(post::get_one::<InventoryPosts>)
                .put(post::update::<InventoryPosts>)
                .delete(post::remove::<InventoryPosts>),
        )
        // 菜谱帖子
        .route(
            "/recipes",
            post(post::create::<RecipePosts>).get(post::list::<RecipePosts>),
        )
        .route(
            "/recipes/{id}",
            get(post::get_one::<RecipePosts>)
                .put(post::update::<RecipePosts>)
                .delete(post::remove::<RecipePosts>),
        )
        // 当前账号的个人资料
        .route("/profile/me", get(profile::me))
        .route(
            "/profile",
            post(profile::upsert).delete(profile::delete_account),
        )
        .route("/profile/experience", put(profile::add_experience))
        .route(
            "/profile/experience/{id}",
            delete(profile::remove_experience),
        )
        .route("/profile/education", put(profile::add_education))
        .route("/profile/education/{id}", delete(profile::remove_education))
        // 应用认证中间件
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
}

/// 创建主路由：公开路由与受保护路由挂在同一个前缀下
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(public_routes())
        .merge(protected_routes(&state));

    let base = state.config.api_base_uri.clone();
    let router = if base.is_empty() {
        api
    } else {
        Router::new().nest(&base, api)
    };

    let router = router
        .layer(axum::middleware::from_fn(log_errors))
        .layer(TraceLayer::new_for_http());

    // 只在开发模式下放开 CORS
    #[cfg(debug_assertions)]
    let router = router.layer(tower_http::cors::CorsLayer::permissive());

    router.with_state(state)
}
