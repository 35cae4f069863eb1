use super::*;

fn template(id: &str, name: &str, category: &str, subcategory: &str) -> Template {
    Template {
        id: id.to_owned(),
        name: name.to_owned(),
        category: category.to_owned(),
        subcategory: subcategory.to_owned(),
        price: "Rp 25.000".to_owned(),
        image: None,
        created_at: None,
    }
}

fn catalog() -> CatalogState {
    CatalogState {
        templates: vec![
            template("1", "Rustic Garden", "Wedding", "Rustic"),
            template("2", "Minimal White", "Wedding", "Minimalis"),
            template("3", "Dev Folio", "Portfolio", "Developer"),
        ],
        ..CatalogState::default()
    }
}

// =============================================================
// Category map
// =============================================================

#[test]
fn category_map_starts_with_all_and_groups_subcategories() {
    let categories = vec![
        Category { id: "1".to_owned(), name: "Wedding".to_owned() },
        Category { id: "2".to_owned(), name: "Portfolio".to_owned() },
    ];
    let subs = vec![
        Subcategory { id: "10".to_owned(), name: "Rustic".to_owned(), category_id: "1".to_owned() },
        Subcategory { id: "11".to_owned(), name: "Developer".to_owned(), category_id: "2".to_owned() },
        Subcategory { id: "12".to_owned(), name: "Minimalis".to_owned(), category_id: "1".to_owned() },
    ];
    let map = build_category_map(&categories, &subs);
    assert_eq!(map.len(), 3);
    assert_eq!(map[0], CategoryEntry { name: "Semua".to_owned(), subcategories: vec![] });
    assert_eq!(map[1].subcategories, vec!["Semua", "Rustic", "Minimalis"]);
    assert_eq!(map[2].subcategories, vec!["Semua", "Developer"]);
}

// =============================================================
// Filtering
// =============================================================

#[test]
fn no_filters_shows_everything() {
    assert_eq!(catalog().filtered().len(), 3);
}

#[test]
fn category_and_subcategory_narrow_results() {
    let mut state = catalog();
    state.select_category("Wedding");
    assert_eq!(state.filtered().len(), 2);
    state.select_subcategory("Rustic");
    let names: Vec<&str> = state.filtered().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Rustic Garden"]);
}

#[test]
fn selecting_category_resets_subcategory() {
    let mut state = catalog();
    state.select_category("Wedding");
    state.select_subcategory("Rustic");
    state.select_category("Semua");
    assert_eq!(state.category, None);
    assert_eq!(state.subcategory, None);
    assert_eq!(state.filtered().len(), 3);
}

#[test]
fn search_is_case_insensitive() {
    let mut state = catalog();
    state.search = "  WHITE ".to_owned();
    let names: Vec<&str> = state.filtered().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Minimal White"]);
}

#[test]
fn subcategory_chips_follow_selected_category() {
    let mut state = catalog();
    state.categories =
        vec![CategoryEntry { name: "Wedding".to_owned(), subcategories: vec!["Semua".to_owned(), "Rustic".to_owned()] }];
    assert!(state.subcategory_chips().is_empty());
    state.select_category("Wedding");
    assert_eq!(state.subcategory_chips(), ["Semua".to_owned(), "Rustic".to_owned()]);
    state.select_category("Portfolio");
    assert!(state.subcategory_chips().is_empty());
}

// =============================================================
// Favorites
// =============================================================

#[test]
fn anonymous_toggle_asks_for_login() {
    let state = catalog();
    assert_eq!(state.plan_toggle(None, &state.templates[0]), Err(LOGIN_FOR_FAVORITES));
}

#[test]
fn toggle_adds_then_removes() {
    let mut state = catalog();
    let target = state.templates[1].clone();

    let add = state.plan_toggle(Some("u-1"), &target).unwrap();
    assert!(matches!(&add, FavoriteToggle::Add(f) if f.template_id == "2" && f.user_id == "u-1"));
    state.apply_toggle(add);
    assert!(state.is_favorite("2"));

    let remove = state.plan_toggle(Some("u-1"), &target).unwrap();
    assert_eq!(remove, FavoriteToggle::Remove { template_id: "2".to_owned() });
    state.apply_toggle(remove);
    assert!(!state.is_favorite("2"));
}

#[test]
fn favorites_tab_ignores_filters() {
    let mut state = catalog();
    state.apply_toggle(FavoriteToggle::Add(favorite_for("u-1", &state.templates[2].clone())));
    state.select_category("Wedding");
    state.tab = CatalogTab::Favorites;
    let names: Vec<&str> = state.displayed().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Dev Folio"]);
}

#[test]
fn duplicate_add_is_ignored() {
    let mut state = catalog();
    let favorite = favorite_for("u-1", &state.templates[0].clone());
    state.apply_toggle(FavoriteToggle::Add(favorite.clone()));
    state.apply_toggle(FavoriteToggle::Add(favorite));
    assert_eq!(state.favorites.len(), 1);
}

#[test]
fn favorites_texts_count_in_words_up_to_ten() {
    assert_eq!(favorites_header(0), "Belum ada template favorit");
    assert_eq!(favorites_header(1), "1 template favorit (satu)");
    assert_eq!(favorites_header(10), "10 template favorit (sepuluh)");
    assert_eq!(favorites_header(11), "11 template favorit");
    assert_eq!(favorites_subtext(1), "Kamu sedang menyukai 1 template.");
    assert_eq!(favorites_subtext(4), "Kamu menyukai 4 template.");
}
