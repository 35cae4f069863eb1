//! Admin user management list.

#[cfg(test)]
#[path = "users_test.rs"]
mod users_test;

use crate::net::realtime::RowChange;
use crate::net::types::{Profile, Role};

/// Profile rows as the admin sees them, newest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UsersState {
    pub users: Vec<Profile>,
    pub search: String,
    pub loading: bool,
    pub error: Option<String>,
}

impl UsersState {
    pub fn apply_change(&mut self, change: RowChange<Profile>) {
        match change {
            RowChange::Insert(profile) => {
                self.users.retain(|existing| existing.id != profile.id);
                self.users.insert(0, profile);
            }
            RowChange::Update(profile) => {
                if let Some(existing) = self.users.iter_mut().find(|existing| existing.id == profile.id) {
                    *existing = profile;
                }
            }
            RowChange::Delete { id } => self.remove(&id),
        }
    }

    /// Users whose name, email, or phone contains the search text, ignoring case.
    pub fn filtered(&self) -> Vec<&Profile> {
        let needle = self.search.trim().to_lowercase();
        self.users
            .iter()
            .filter(|user| {
                [&user.display_name, &user.email, &user.phone]
                    .into_iter()
                    .flatten()
                    .any(|field| field.to_lowercase().contains(&needle))
                    || needle.is_empty()
            })
            .collect()
    }

    /// Role the toggle button would switch `id` to.
    pub fn toggled_role(&self, id: &str) -> Option<Role> {
        self.users.iter().find(|user| user.id == id).map(|user| user.role.toggled())
    }

    pub fn set_role(&mut self, id: &str, role: Role) {
        if let Some(user) = self.users.iter_mut().find(|user| user.id == id) {
            user.role = role;
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.users.retain(|user| user.id != id);
    }
}

/// Confirmation prompt for a role toggle.
pub fn role_change_prompt(current: Role) -> String {
    format!("Ubah peran pengguna ini dari \"{current}\" menjadi \"{}\"?", current.toggled())
}

/// Confirmation prompt for deleting a user.
pub fn delete_prompt(email: Option<&str>) -> String {
    format!("Yakin ingin menghapus pengguna \"{}\" secara permanen?", email.unwrap_or("tanpa email"))
}
