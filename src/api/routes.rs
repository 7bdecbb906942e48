use crate::api::handlers::{articles, auth, simulations, users};
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Routes mounted under `/api`.
///
/// Authentication is enforced per handler by the `AuthUser` and `MaybeUser`
/// extractors, so public and protected methods can share a path.
pub fn create_router() -> Router<AppState> {
    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let user_routes = Router::new()
        .route("/users/me", get(users::me))
        .route("/users/{id}", get(users::get_user));

    let article_routes = Router::new()
        .route(
            "/articles",
            get(articles::list_articles).post(articles::create_article),
        )
        .route(
            "/articles/{id}",
            get(articles::get_article)
                .patch(articles::update_article)
                .delete(articles::delete_article),
        );

    let simulation_routes = Router::new()
        .route(
            "/simulations",
            get(simulations::list_simulations).post(simulations::create_simulation),
        )
        .route(
            "/simulations/{id}",
            get(simulations::get_simulation)
                .patch(simulations::update_simulation)
                .delete(simulations::delete_simulation),
        )
        .route(
            "/simulations/{id}/like",
            post(simulations::like_simulation).delete(simulations::unlike_simulation),
        );

    auth_routes
        .merge(user_routes)
        .merge(article_routes)
        .merge(simulation_routes)
}
