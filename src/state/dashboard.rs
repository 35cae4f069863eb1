//! Admin dashboard statistics.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use crate::net::api::{Query, SortOrder};
use crate::net::types::{Order, Role};
use crate::state::orders::revenue;

/// Number of orders shown in the "recent orders" table.
pub const RECENT_ORDERS_LIMIT: usize = 10;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardState {
    pub users: u64,
    pub admins: u64,
    pub templates: u64,
    pub recent_orders: Vec<Order>,
    pub loading: bool,
    pub error: Option<String>,
}

impl DashboardState {
    /// Orders counted on the dashboard are the recent ones only.
    pub fn order_count(&self) -> usize {
        self.recent_orders.len()
    }

    /// Revenue over the recent orders that are completed.
    pub fn revenue(&self) -> u64 {
        revenue(&self.recent_orders)
    }
}

pub fn role_count_query(role: Role) -> Query {
    Query::new().select("id").eq("role", role)
}

pub fn template_count_query() -> Query {
    Query::new().select("id")
}

pub fn recent_orders_query() -> Query {
    Query::new().select("*").order("created_at", SortOrder::Desc).limit(RECENT_ORDERS_LIMIT)
}
