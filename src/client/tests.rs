use std::time::Duration;

use futures::{executor::block_on, future::join3};
use pretty_assertions::assert_eq;

use super::*;
use crate::{Endpoint, NetworkConfig};

fn client(network: NetworkConfig) -> Client {
    let config = Config {
        network,
        ..Config::default()
    };
    Client::from_config(&config).unwrap()
}

#[test]
fn reads_are_served_from_cache() {
    let client = client(NetworkConfig::immediate());
    block_on(async {
        let a = client.users().await.unwrap();
        let b = client.users().await.unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        client.user(2).await.unwrap();
        client.user(2).await.unwrap();
    });
    assert_eq!(client.api().call_count(Endpoint::Users), 1);
    assert_eq!(client.api().call_count(Endpoint::User), 1);
}

#[test]
fn concurrent_duplicate_reads_share_one_call() {
    let client = client(NetworkConfig::immediate().with_delay(20));
    let (a, b, c) = block_on(join3(client.user(4), client.user(4), client.user(4)));
    let a = a.unwrap();
    assert_eq!(a.id, 4);
    assert_eq!(b, Ok(a.clone()));
    assert_eq!(c, Ok(a));
    assert_eq!(client.api().call_count(Endpoint::User), 1);
}

#[test]
fn failed_reads_are_not_cached() {
    let client = client(NetworkConfig::immediate());
    block_on(async {
        assert!(client.user(11).await.is_err());
        assert!(client.user(11).await.is_err());
    });
    assert_eq!(client.api().call_count(Endpoint::User), 2);
    assert!(client.cache().is_empty());
}

#[test]
fn create_refreshes_post_reads_only() {
    let client = client(NetworkConfig::immediate());
    block_on(async {
        let before = client.posts().await.unwrap();
        client.user_posts(1).await.unwrap();
        client.user(1).await.unwrap();

        let created = client.create_post(NewPost::new("T", "B", 1)).await.unwrap();
        let after = client.posts().await.unwrap();
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after.last(), Some(&created));
        assert_eq!(client.user_posts(1).await.unwrap().len(), 4);
        client.user(1).await.unwrap();
    });
    assert_eq!(client.api().call_count(Endpoint::Posts), 2);
    assert_eq!(client.api().call_count(Endpoint::UserPosts), 2);
    assert_eq!(client.api().call_count(Endpoint::User), 1);
}

#[test]
fn delete_refreshes_collections() {
    let client = client(NetworkConfig::immediate());
    block_on(async {
        assert!(client.posts().await.unwrap().iter().any(|p| p.id == 2));
        client.delete_post(2).await.unwrap();
        assert!(!client.posts().await.unwrap().iter().any(|p| p.id == 2));
    });
    assert_eq!(client.api().call_count(Endpoint::Posts), 2);
}

#[test]
fn failed_write_keeps_cache() {
    let client = client(NetworkConfig::immediate());
    block_on(async {
        client.posts().await.unwrap();
        assert_eq!(
            client.delete_post(999).await,
            Err(ApiError::not_found("Post not found"))
        );
        client.posts().await.unwrap();
    });
    assert_eq!(client.api().call_count(Endpoint::Posts), 1);
}

#[test]
fn retention_follows_config() {
    let client = client(NetworkConfig::immediate());
    assert_eq!(client.cache().retention(), Duration::from_secs(60));
}
