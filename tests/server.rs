//! End-to-end over a real socket.

mod common;

use serde_json::json;
use std::time::Duration;

use common::{app, spawn};
use htmx_app::Outcome;

#[tokio::test]
async fn test_serves_until_shutdown() {
    let mut app = app(&[
        ("public/index.html", "<p>default</p>"),
        ("public/@abc.com/index.html", "<p>abc</p>"),
        ("pages/list.html", "<ul>{{ .name }}</ul>"),
    ]);
    app.get("/list", |ctx| async move { Outcome::from(ctx.view(&json!({"name": "list"}))) });

    let (addr, shutdown, handle) = spawn(app).await;
    let base = format!("http://{}", addr);
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/", base)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "<p>default</p>");

    let res = client
        .get(format!("{}/", base))
        .header("host", "abc.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "<p>abc</p>");

    let res = client
        .get(format!("{}/list", base))
        .header("accept", "text/html, */*")
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "<ul>list</ul>");

    let res = client.get(format!("{}/list", base)).send().await.unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({"name": "list"}));

    drop(client);
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
}
