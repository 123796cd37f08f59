use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use super::*;
use crate::{ErrorKind, FixedClock, SequenceRandom};

fn fixtures() -> Fixtures {
    Fixtures::new(
        SequenceRandom::new([0.1, 0.2, 0.3]),
        FixedClock::new(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()),
    )
}

fn seeded() -> Registry {
    Registry::new(RecordStore::seeded().unwrap(), fixtures())
}

fn empty() -> Registry {
    Registry::new(RecordStore::new(), fixtures())
}

#[test]
fn seed_has_ten_users_in_order() {
    let r = seeded();
    let ids: Vec<_> = r.collection::<User>().iter().map(|u| u.id).collect();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());
}

#[test]
fn seed_users_match_generated_names() {
    let r = seeded();
    for user in r.collection::<User>() {
        let generated = r.fixtures().generate_user(user.id);
        assert_eq!(user.name, generated.name);
        assert_eq!(user.email, generated.email);
    }
}

#[test]
fn get_by_id_found_and_missing() {
    let r = seeded();
    assert_eq!(r.get_by_id::<User>(3).unwrap().name, "Patricia Lebsack");
    assert_eq!(
        r.get_by_id::<User>(99),
        Err(ApiError::not_found("User not found"))
    );
    assert_eq!(
        r.get_by_id::<Post>(999).unwrap_err().message(),
        "Post not found"
    );
}

#[rstest]
#[case("1", 3)]
#[case("2", 2)]
#[case("5", 0)]
#[case("abc", 0)]
fn filtered_posts_by_user(#[case] user_id: &str, #[case] expected: usize) {
    let r = seeded();
    let posts = r.filtered::<Post>("userId", user_id);
    assert_eq!(posts.len(), expected);
    assert!(posts.iter().all(|p| p.user_id.to_string() == user_id));
}

#[test]
fn filtered_on_unknown_field_is_empty() {
    let r = seeded();
    assert!(r.filtered::<Post>("nope", "1").is_empty());
}

#[test]
fn create_assigns_new_id_and_appends() {
    let mut r = seeded();
    let before = r.collection::<Post>();
    let post = r.create_post(NewPost::new("T", "B", 1)).unwrap();
    let after = r.collection::<Post>();

    assert_eq!(after.len(), before.len() + 1);
    assert!(!before.iter().any(|p| p.id == post.id));
    assert_eq!(after.last(), Some(&post));
    assert_eq!((post.title.as_str(), post.body.as_str()), ("T", "B"));
}

#[test]
fn create_redraws_colliding_id() {
    let mut r = empty();
    let base = r.fixtures().now().timestamp_millis() as u64;
    let first = r.create_post(NewPost::new("a", "a", 1)).unwrap();
    assert_eq!(first.id, base + 100);

    // the next draw (0.2) collides with this record
    r.insert(Post {
        id: base + 200,
        ..first.clone()
    });
    let second = r.create_post(NewPost::new("b", "b", 1)).unwrap();
    assert_eq!(second.id, base + 300);
    assert_eq!(r.collection::<Post>().len(), 3);
}

#[rstest]
#[case(NewPost::new("", "B", 1), "title is required")]
#[case(NewPost::new("T", "  ", 1), "body is required")]
fn create_rejects_blank_fields(#[case] new: NewPost, #[case] message: &str) {
    let mut r = empty();
    let err = r.create_post(new).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    assert_eq!(err.message(), message);
    assert!(r.collection::<Post>().is_empty());
}

#[test]
fn delete_existing_and_missing() {
    let mut r = seeded();
    r.delete::<Post>(1).unwrap();
    assert!(!r.collection::<Post>().iter().any(|p| p.id == 1));
    assert_eq!(
        r.delete::<Post>(1),
        Err(ApiError::not_found("Post not found"))
    );
}

#[test]
fn insert_replaces_same_id() {
    let mut r = seeded();
    let mut user = r.get_by_id::<User>(2).unwrap();
    user.name = "Renamed".into();
    r.insert(user);
    let users = r.collection::<User>();
    assert_eq!(users.len(), 10);
    assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), (1..=10).collect::<Vec<_>>());
    assert_eq!(users[1].name, "Renamed");
}

#[test]
fn insert_appends_new_id() {
    let mut r = seeded();
    let user = r.fixtures().generate_user(42);
    r.insert(user.clone());
    assert_eq!(r.collection::<User>().last(), Some(&user));
}

#[test]
fn dispatch_reads() {
    let mut r = seeded();
    let users = r.dispatch(&Request::get("/users")).unwrap();
    assert_eq!(users.as_array().map(Vec::len), Some(10));

    let user = r.dispatch(&Request::get("/users/4")).unwrap();
    assert_eq!(user["name"], json!("Chelsey Dietrich"));
    assert_eq!(user["companyName"], json!("Considine-Lockman"));

    let posts = r.dispatch(&Request::get("/posts?userId=4")).unwrap();
    assert_eq!(posts.as_array().map(Vec::len), Some(2));

    let posts = r.dispatch(&Request::get("/posts?userId=4&id=8")).unwrap();
    assert_eq!(posts, json!([r.get_by_id::<Post>(8).unwrap()]));
}

#[test]
fn dispatch_create_and_delete() {
    let mut r = empty();
    let created = r
        .dispatch(&Request::post(
            "/posts",
            json!({ "title": "T", "body": "B", "userId": 1 }),
        ))
        .unwrap();
    let id = created["id"].as_u64().unwrap();
    assert_eq!(r.collection::<Post>().len(), 1);

    let done = r.dispatch(&Request::delete(format!("/posts/{id}"))).unwrap();
    assert_eq!(done, json!({}));
    assert!(r.collection::<Post>().is_empty());
}

#[test]
fn dispatch_rejects_missing_fields() {
    let mut r = empty();
    let err = r
        .dispatch(&Request::post("/posts", json!({ "title": "T", "body": "B" })))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    assert!(err.message().contains("userId"), "{err}");

    let err = r
        .dispatch(&Request {
            method: Method::Post,
            path: "/posts".into(),
            body: None,
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
}

#[rstest]
#[case(Request::get("/comments"), "Cannot GET /comments")]
#[case(Request::get("/users/x"), "Cannot GET /users/x")]
#[case(Request::get("/users/1/posts"), "Cannot GET /users/1/posts")]
#[case(Request::delete("/users/1"), "Cannot DELETE /users/1")]
#[case(Request::post("/users", json!({})), "Cannot POST /users")]
fn dispatch_unknown_routes(#[case] request: Request, #[case] message: &str) {
    let mut r = seeded();
    assert_eq!(r.dispatch(&request), Err(ApiError::not_found(message)));
}

#[test]
fn request_relative_to_base_url() {
    let request =
        Request::get("http://localhost:3001/posts?userId=1").relative_to("http://localhost:3001/");
    assert_eq!(request.path, "/posts?userId=1");
    let request = Request::get("/posts").relative_to("http://localhost:3001");
    assert_eq!(request.path, "/posts");
}

#[test]
fn store_json_roundtrip_keeps_order() {
    let r = seeded();
    let json = r.store().to_json().unwrap();
    assert_eq!(RecordStore::from_json(&json).unwrap(), *r.store());
}
