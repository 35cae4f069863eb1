//! Template catalog state for the shop pages.
//!
//! DESIGN
//! ======
//! Filters, tabs, and favorites live together so the shop can render from a
//! single signal. Favorite toggles are planned here and applied to local state
//! only after the backend write succeeds.

#[cfg(test)]
#[path = "catalog_test.rs"]
mod catalog_test;

use crate::net::types::{Category, Favorite, Subcategory, Template};

/// Label of the "no filter" chip, used for both category and subcategory.
pub const ALL_FILTER: &str = "Semua";

pub const LOGIN_FOR_FAVORITES: &str = "Login terlebih dahulu untuk menyimpan favorit";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CatalogTab {
    #[default]
    All,
    Favorites,
}

/// Category chip plus the subcategory chips shown under it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryEntry {
    pub name: String,
    pub subcategories: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogState {
    pub templates: Vec<Template>,
    pub categories: Vec<CategoryEntry>,
    pub favorites: Vec<Favorite>,
    pub search: String,
    /// `None` means [`ALL_FILTER`].
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub tab: CatalogTab,
    pub loading: bool,
    pub error: Option<String>,
}

/// Backend write needed to flip a template's favorite flag.
#[derive(Clone, Debug, PartialEq)]
pub enum FavoriteToggle {
    Add(Favorite),
    Remove { template_id: String },
}

/// Chips in display order: the "all" chip, then one per category with its
/// subcategories prefixed by an "all" chip.
pub fn build_category_map(categories: &[Category], subcategories: &[Subcategory]) -> Vec<CategoryEntry> {
    let mut entries = vec![CategoryEntry { name: ALL_FILTER.to_owned(), subcategories: Vec::new() }];
    entries.extend(categories.iter().map(|category| {
        let mut subs = vec![ALL_FILTER.to_owned()];
        subs.extend(
            subcategories.iter().filter(|sub| sub.category_id == category.id).map(|sub| sub.name.clone()),
        );
        CategoryEntry { name: category.name.clone(), subcategories: subs }
    }));
    entries
}

impl CatalogState {
    pub fn select_category(&mut self, name: &str) {
        self.category = (name != ALL_FILTER).then(|| name.to_owned());
        self.subcategory = None;
    }

    pub fn select_subcategory(&mut self, name: &str) {
        self.subcategory = (name != ALL_FILTER).then(|| name.to_owned());
    }

    /// Subcategory chips for the selected category; empty for "all".
    pub fn subcategory_chips(&self) -> &[String] {
        let Some(selected) = &self.category else {
            return &[];
        };
        self.categories
            .iter()
            .find(|entry| &entry.name == selected)
            .map(|entry| entry.subcategories.as_slice())
            .unwrap_or_default()
    }

    /// Templates matching category, subcategory, and a case-insensitive name search.
    pub fn filtered(&self) -> Vec<&Template> {
        let needle = self.search.trim().to_lowercase();
        self.templates
            .iter()
            .filter(|t| self.category.as_ref().is_none_or(|c| &t.category == c))
            .filter(|t| self.subcategory.as_ref().is_none_or(|s| &t.subcategory == s))
            .filter(|t| t.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn favorite_templates(&self) -> Vec<&Template> {
        self.templates.iter().filter(|t| self.is_favorite(&t.id)).collect()
    }

    /// What the grid shows for the active tab.
    pub fn displayed(&self) -> Vec<&Template> {
        match self.tab {
            CatalogTab::All => self.filtered(),
            CatalogTab::Favorites => self.favorite_templates(),
        }
    }

    pub fn is_favorite(&self, template_id: &str) -> bool {
        self.favorites.iter().any(|f| f.template_id == template_id)
    }

    /// Plan a favorite toggle for `user_id`; anonymous visitors get a login prompt.
    ///
    /// # Errors
    ///
    /// Returns the message to show when nobody is signed in.
    pub fn plan_toggle(&self, user_id: Option<&str>, template: &Template) -> Result<FavoriteToggle, &'static str> {
        let user_id = user_id.ok_or(LOGIN_FOR_FAVORITES)?;
        if self.is_favorite(&template.id) {
            Ok(FavoriteToggle::Remove { template_id: template.id.clone() })
        } else {
            Ok(FavoriteToggle::Add(favorite_for(user_id, template)))
        }
    }

    /// Apply a toggle whose backend write succeeded.
    pub fn apply_toggle(&mut self, toggle: FavoriteToggle) {
        match toggle {
            FavoriteToggle::Add(favorite) => {
                if !self.is_favorite(&favorite.template_id) {
                    self.favorites.push(favorite);
                }
            }
            FavoriteToggle::Remove { template_id } => self.favorites.retain(|f| f.template_id != template_id),
        }
    }
}

/// Denormalized favorite row for `template`.
pub fn favorite_for(user_id: &str, template: &Template) -> Favorite {
    Favorite {
        user_id: user_id.to_owned(),
        template_id: template.id.clone(),
        name: template.name.clone(),
        category: template.category.clone(),
        subcategory: template.subcategory.clone(),
        price: template.price.clone(),
        image: template.image.clone(),
    }
}

fn number_to_word(n: usize) -> Option<&'static str> {
    const WORDS: [&str; 11] =
        ["nol", "satu", "dua", "tiga", "empat", "lima", "enam", "tujuh", "delapan", "sembilan", "sepuluh"];
    WORDS.get(n).copied()
}

/// Heading of the favorites drawer.
pub fn favorites_header(count: usize) -> String {
    match (count, number_to_word(count)) {
        (0, _) => "Belum ada template favorit".to_owned(),
        (n, Some(word)) => format!("{n} template favorit ({word})"),
        (n, None) => format!("{n} template favorit"),
    }
}

/// Line under the favorites heading.
pub fn favorites_subtext(count: usize) -> String {
    match count {
        0 => "Tambahkan template ke favorit untuk melihatnya di sini.".to_owned(),
        1 => "Kamu sedang menyukai 1 template.".to_owned(),
        n => format!("Kamu menyukai {n} template."),
    }
}
