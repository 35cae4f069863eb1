use super::*;

#[test]
fn profiles_channel_follows_every_event() {
    assert_eq!(PROFILES_CHANNEL.table, "profiles");
    assert_eq!(PROFILES_CHANNEL.event, ChangeEvent::All);
}

#[test]
fn profile_queries_target_one_row_or_all_newest_first() {
    assert_eq!(profile_by_id("u-1").params(), &[("id".to_owned(), "eq.u-1".to_owned())]);
    assert!(profiles_query().params().contains(&("order".to_owned(), "created_at.desc".to_owned())));
}

#[test]
fn admins_get_a_distinct_badge() {
    assert_eq!(role_badge(Role::Admin), "badge badge--admin");
    assert_eq!(role_badge(Role::User), "badge");
}
