use super::*;

fn profile(id: &str, name: &str, email: &str, phone: Option<&str>, role: Role) -> Profile {
    Profile {
        id: id.to_owned(),
        display_name: Some(name.to_owned()),
        email: Some(email.to_owned()),
        role,
        avatar_url: None,
        phone: phone.map(str::to_owned),
        created_at: None,
    }
}

fn users() -> UsersState {
    UsersState {
        users: vec![
            profile("a", "Sari", "sari@ciptain.id", Some("0811"), Role::Admin),
            profile("b", "Budi", "budi@mail.com", None, Role::User),
        ],
        ..UsersState::default()
    }
}

#[test]
fn search_matches_name_email_or_phone_case_insensitively() {
    let mut state = users();
    assert_eq!(state.filtered().len(), 2);

    state.search = "BUDI".to_owned();
    assert_eq!(state.filtered().iter().map(|u| u.id.as_str()).collect::<Vec<_>>(), vec!["b"]);

    state.search = "ciptain".to_owned();
    assert_eq!(state.filtered().iter().map(|u| u.id.as_str()).collect::<Vec<_>>(), vec!["a"]);

    state.search = "0811".to_owned();
    assert_eq!(state.filtered().len(), 1);

    state.search = "nobody".to_owned();
    assert!(state.filtered().is_empty());
}

#[test]
fn realtime_changes_insert_update_delete() {
    let mut state = users();
    state.apply_change(RowChange::Insert(profile("c", "Citra", "c@x.id", None, Role::User)));
    assert_eq!(state.users[0].id, "c");

    state.apply_change(RowChange::Update(profile("b", "Budi S", "budi@mail.com", None, Role::Admin)));
    let budi = state.users.iter().find(|u| u.id == "b").unwrap();
    assert_eq!(budi.role, Role::Admin);
    assert_eq!(budi.display_name.as_deref(), Some("Budi S"));

    state.apply_change(RowChange::Delete { id: "a".to_owned() });
    assert_eq!(state.users.iter().map(|u| u.id.as_str()).collect::<Vec<_>>(), vec!["c", "b"]);
}

#[test]
fn role_toggle_flips_between_user_and_admin() {
    let mut state = users();
    assert_eq!(state.toggled_role("a"), Some(Role::User));
    assert_eq!(state.toggled_role("b"), Some(Role::Admin));
    assert_eq!(state.toggled_role("zzz"), None);

    state.set_role("b", Role::Admin);
    assert_eq!(state.users[1].role, Role::Admin);
}

#[test]
fn prompts_name_both_roles() {
    assert_eq!(role_change_prompt(Role::User), "Ubah peran pengguna ini dari \"user\" menjadi \"admin\"?");
    assert!(delete_prompt(Some("b@x.id")).contains("\"b@x.id\""));
}
