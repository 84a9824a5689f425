//! Groups, middleware, route options and request helpers.

mod common;

use axum::http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use common::{app, call, get};
use htmx_app::{
    handler, middleware, with_navigation, Context, Handler, Outcome, RouteOptions,
    NAVIGATION_ACCESS,
};

#[derive(Debug, Serialize, Deserialize)]
struct Signup {
    name: String,
    languages: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Search {
    q: String,
    #[serde(default)]
    page: u32,
}

fn admin_only() -> RouteOptions {
    RouteOptions::new().with(NAVIGATION_ACCESS, "admin:*")
}

fn require_admin() -> htmx_app::Middleware {
    middleware(|next: Handler| {
        handler(move |ctx: Context| {
            let next = next.clone();
            async move {
                if ctx.route_options().string(NAVIGATION_ACCESS) != "admin:*" {
                    ctx.write_status(StatusCode::FORBIDDEN);
                    return Outcome::Cancelled;
                }
                next(ctx).await
            }
        })
    })
}

fn admin_app() -> htmx_app::App {
    let mut app = app(&[("pages/admin/index.html", "<h1>{{ .title }}</h1>")]);

    app.get("/hello", |_ctx| async { Outcome::Completed });

    let mut admin = app.group("/admin");
    admin.use_middleware(require_admin());
    admin.get_with(
        "/",
        with_navigation("admin", "fa fa-home", "admin:*"),
        |ctx| async move { Outcome::from(ctx.view(&json!({"title": "Admin"}))) },
    );
    admin.post_with(
        "/form",
        with_navigation("form", "fa fa-edit", "admin:*"),
        |ctx| async move {
            let mut data: Signup = match ctx.bind_json() {
                Ok(data) => data,
                Err(_) => {
                    ctx.write_status(StatusCode::BAD_REQUEST);
                    return Outcome::Cancelled;
                }
            };
            data.languages = ctx.accept_language();
            Outcome::from(ctx.view(&data))
        },
    );
    admin.get_with("/search", admin_only(), |ctx| async move {
        match ctx.bind_query::<Search>() {
            Ok(search) => Outcome::from(ctx.view(&search)),
            Err(_) => {
                ctx.write_status(StatusCode::BAD_REQUEST);
                Outcome::Cancelled
            }
        }
    });
    admin.post_with("/subscribe", admin_only(), |ctx| async move {
        match ctx.bind_form::<Search>() {
            Ok(search) => Outcome::from(ctx.view(&search)),
            Err(_) => {
                ctx.write_status(StatusCode::BAD_REQUEST);
                Outcome::Cancelled
            }
        }
    });
    admin.get("/secret", |_ctx| async { Outcome::Completed });

    app
}

#[tokio::test]
async fn test_group_middleware_reads_route_options() {
    let router = admin_app().build().unwrap().router();

    let reply = get("/admin/").accept("text/html").send(&router).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.text(), "<h1>Admin</h1>");

    // same group, no navigation access option
    let reply = get("/admin/secret").send(&router).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert!(reply.body.is_empty());

    // outside the group
    let reply = get("/hello").send(&router).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn test_bind_json_and_accept_language() {
    let router = admin_app().build().unwrap().router();

    let reply = call(Method::POST, "/admin/form")
        .header("accept-language", "fr;q=0.2, en-US, *;q=0.9, de;q=0")
        .json(&json!({"name": "ada", "languages": []}))
        .send(&router)
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.json(),
        json!({"name": "ada", "languages": ["en-US", "fr"]})
    );

    let reply = call(Method::POST, "/admin/form")
        .header("content-type", "application/json")
        .send(&router)
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bind_query_and_form() {
    let router = admin_app().build().unwrap().router();

    let reply = get("/admin/search?q=rust%20lang&page=2").send(&router).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!({"q": "rust lang", "page": 2}));

    let reply = get("/admin/search?page=2").send(&router).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = get("/admin/search?q=x&page=two").send(&router).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = call(Method::POST, "/admin/subscribe")
        .header("content-type", "application/x-www-form-urlencoded")
        .body("q=news+letter")
        .send(&router)
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!({"q": "news letter", "page": 0}));

    let reply = call(Method::POST, "/admin/subscribe")
        .header("content-type", "application/x-www-form-urlencoded")
        .body("page=1")
        .send(&router)
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_navigation_lists_labelled_routes() {
    let app = admin_app();
    let items = app.navigation();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].path, "/admin/");
    assert_eq!(items[0].label, "admin");
    assert_eq!(items[0].icon, "fa fa-home");
    assert_eq!(items[0].access, "admin:*");
    assert_eq!(items[1].path, "/admin/form");
}

#[tokio::test]
async fn test_path_params() {
    let mut app = app(&[]);
    app.get("/users/{id}/posts/{slug}", |ctx| async move {
        let body = json!({
            "id": ctx.param("id"),
            "slug": ctx.param("slug"),
            "missing": ctx.param("missing"),
        });
        Outcome::from(ctx.view(&body))
    });
    let router = app.build().unwrap().router();

    let reply = get("/users/42/posts/hello%20world").send(&router).await;
    assert_eq!(
        reply.json(),
        json!({"id": "42", "slug": "hello world", "missing": null})
    );

    let reply = get("/users/42").send(&router).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let mut app = app(&[]);
    app.get_with("/id", RouteOptions::new().with("source", "test"), |ctx| async move {
        let id = ctx.request_id().map(str::to_string);
        let source = ctx.route_options().string("source").to_string();
        Outcome::from(ctx.view(&json!({ "id": id, "source": source })))
    });
    let router = app.build().unwrap().router();

    let reply = get("/id").send(&router).await;
    let header = reply.headers["x-request-id"].to_str().unwrap().to_string();
    assert!(!header.is_empty());
    assert_eq!(reply.json()["id"], header);
    assert_eq!(reply.json()["source"], "test");

    let reply = get("/id").header("x-request-id", "abc-123").send(&router).await;
    assert_eq!(reply.headers["x-request-id"], "abc-123");
    assert_eq!(reply.json()["id"], "abc-123");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = htmx_app::AppConfig::default();
    config.security.max_body_size = 8;
    let mut app = htmx_app::App::new(config)
        .with_source(std::sync::Arc::new(htmx_app::assets::MemorySource::new()));
    app.post_with("/", RouteOptions::new(), |_ctx| async { Outcome::Completed });
    let router = app.build().unwrap().router();

    let reply = call(Method::POST, "/")
        .json(&json!({"much": "more than eight bytes"}))
        .send(&router)
        .await;
    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
}
