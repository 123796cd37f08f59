use std::rc::Rc;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

#[test]
fn generate_user_is_stable_for_name_and_email() {
    let fixtures = Fixtures::seeded(1);
    for id in 1..=20 {
        let a = fixtures.generate_user(id);
        let b = fixtures.generate_user(id);
        assert_eq!(a.id, id);
        assert_eq!(a.id, b.id);
        assert_eq!(a.name, b.name);
        assert_eq!(a.email, b.email);
    }
}

#[test]
fn generate_user_derives_email_from_name() {
    let fixtures = Fixtures::seeded(1);
    let user = fixtures.generate_user(1);
    assert_eq!(user.name, "Ervin Howell");
    assert_eq!(user.email, "ervin.howell@melissa.tv");
}

#[test]
fn generate_user_randomizes_post_count_and_created_at() {
    let fixtures = Fixtures::new(
        SequenceRandom::new([0.0, 0.5, 0.9, 0.1]),
        FixedClock::new(fixed_now()),
    );
    let a = fixtures.generate_user(3);
    let b = fixtures.generate_user(3);
    assert_eq!(a.post_count, Some(25));
    assert_eq!(b.post_count, Some(5));
    assert_eq!(a.created_at, Some(fixed_now()));
    assert_ne!(a.created_at, b.created_at);
}

#[rstest]
#[case(1, 6, "Why tags beat manual refetching")]
#[case(2, 5, "Getting started with cached queries")]
#[case(9, 13, "Sequencing dependent requests")]
fn generate_post_selects_title_by_post_id(
    #[case] user_id: Id,
    #[case] post_id: Id,
    #[case] title: &str,
) {
    let fixtures = Fixtures::new(SequenceRandom::new([]), FixedClock::new(fixed_now()));
    let post = fixtures.generate_post(user_id, post_id);
    assert_eq!(post.id, post_id);
    assert_eq!(post.user_id, user_id);
    assert_eq!(post.title, title);
    assert_eq!(post.created_at, Some(fixed_now()));
}

#[test]
fn generate_posts_uses_user_scoped_ids() {
    let fixtures = Fixtures::seeded(7);
    let posts = fixtures.generate_posts(4, 3);
    let ids: Vec<_> = posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![401, 402, 403]);
    assert!(posts.iter().all(|p| p.user_id == 4));
}

#[test]
fn generate_id_adds_offset_to_clock() {
    let clock = Rc::new(FixedClock::new(fixed_now()));
    let fixtures = Fixtures::new(SequenceRandom::new([0.25, 0.9995]), clock.clone());
    let base = fixed_now().timestamp_millis() as u64;
    assert_eq!(fixtures.generate_id(), base + 250);
    assert_eq!(fixtures.generate_id(), base + 999);

    clock.set(fixed_now() + Duration::milliseconds(5_000));
    assert_eq!(fixtures.generate_id(), base + 5_000 + 250);
}

#[rstest]
#[case(0.0, 0.0, false)]
#[case(0.5, 0.2, true)]
#[case(0.5, 0.7, false)]
#[case(1.0, 0.99, true)]
#[case(2.0, 0.99, true)]
#[case(-1.0, 0.0, false)]
fn simulate_error_compares_draw_with_rate(
    #[case] rate: f64,
    #[case] draw: f64,
    #[case] expected: bool,
) {
    let fixtures = Fixtures::new(SequenceRandom::new([draw]), SystemClock);
    assert_eq!(fixtures.simulate_error(rate), expected);
}

#[test]
fn simulate_error_rate_is_roughly_respected() {
    let fixtures = Fixtures::seeded(42);
    let hits = (0..10_000).filter(|_| fixtures.simulate_default_error()).count();
    assert!((700..1300).contains(&hits), "hits = {hits}");
}

#[test]
fn sequence_random_below_stays_in_range() {
    let mut random = SequenceRandom::new([0.0, 0.5, 1.0]);
    assert_eq!(random.below(10), 0);
    assert_eq!(random.below(10), 5);
    assert_eq!(random.below(10), 9);
    assert_eq!(random.below(0), 0);
}
