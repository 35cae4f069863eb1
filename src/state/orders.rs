//! Order placement and admin order tracking.
//!
//! SYSTEM CONTEXT
//! ==============
//! Customers place orders from `/user/order/:id`; admins watch `/admin/orders`
//! where new rows stream in over realtime. Validation, payload building, and
//! list bookkeeping live here so the pages only perform I/O.

#[cfg(test)]
#[path = "orders_test.rs"]
mod orders_test;

use crate::net::realtime::RowChange;
use crate::net::types::{Identity, NewOrder, Order, OrderLog, OrderStatus, PaymentMethod, Template};
use crate::util::format::price_digits;

/// Label of the "every status" filter chip.
pub const ALL_STATUSES: &str = "Semua";

/// Who status changes are attributed to in the order log.
pub const STATUS_CHANGED_BY: &str = "Admin";

const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderFormError {
    #[error("Login dulu sebelum melakukan order")]
    NotSignedIn,
    #[error("Nama wajib diisi")]
    MissingName,
    #[error("Nomor WhatsApp tidak valid (hanya angka, 10-15 digit).")]
    InvalidPhone,
}

/// Customer input on the order page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub note: String,
    pub payment: PaymentMethod,
}

impl OrderForm {
    /// Prefill name, email, and phone from the signed-in identity.
    pub fn for_identity(identity: Option<&Identity>) -> Self {
        let Some(identity) = identity else {
            return Self::default();
        };
        let name = identity.metadata_str("name").or_else(|| identity.metadata_str("username")).unwrap_or_default();
        Self {
            name: name.to_owned(),
            email: identity.email.clone().unwrap_or_default(),
            phone: identity.metadata_str("phone").unwrap_or_default().to_owned(),
            ..Self::default()
        }
    }
}

/// 10 to 15 ASCII digits, nothing else.
pub fn is_valid_whatsapp(phone: &str) -> bool {
    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&phone.len()) && phone.chars().all(|c| c.is_ascii_digit())
}

/// Validate the form and build the insert payload.
///
/// # Errors
///
/// Returns the first validation failure, in the order the form shows them.
pub fn build_new_order(user_id: Option<&str>, template: &Template, form: &OrderForm) -> Result<NewOrder, OrderFormError> {
    let user_id = user_id.ok_or(OrderFormError::NotSignedIn)?;
    let name = form.name.trim();
    if name.is_empty() {
        return Err(OrderFormError::MissingName);
    }
    let phone = form.phone.trim();
    if !is_valid_whatsapp(phone) {
        return Err(OrderFormError::InvalidPhone);
    }
    Ok(NewOrder {
        user_id: user_id.to_owned(),
        template_id: template.id.clone(),
        template_name: template.name.clone(),
        price: template.price.clone(),
        customer_name: name.to_owned(),
        customer_email: form.email.trim().to_owned(),
        customer_phone: phone.to_owned(),
        note: form.note.trim().to_owned(),
        payment_method: form.payment,
        status: OrderStatus::AwaitingPayment,
    })
}

/// Confirmation text sent to the admin's WhatsApp after an order is saved.
pub fn whatsapp_message(order: &NewOrder, template: &Template) -> String {
    let note = if order.note.is_empty() { "-" } else { order.note.as_str() };
    format!(
        "Halo Admin\n\nSaya ingin melakukan pemesanan di *Ciptain*.\n\n*Detail Order:*\n\
         - Nama: {}\n- Email: {}\n- WhatsApp: {}\n- Template: {}\n- Kategori: {} ({})\n\
         - Harga: {}\n- Pembayaran: {}\n\nCatatan:\n{note}",
        order.customer_name,
        order.customer_email,
        order.customer_phone,
        order.template_name,
        template.category,
        template.subcategory,
        order.price,
        order.payment_method.label(),
    )
}

/// `wa.me` deep link; `encoded_message` must already be URI-component encoded.
pub fn whatsapp_link(number: &str, encoded_message: &str) -> String {
    format!("https://wa.me/{number}?text={encoded_message}")
}

/// Sum of prices over completed orders.
pub fn revenue<'a>(orders: impl IntoIterator<Item = &'a Order>) -> u64 {
    orders
        .into_iter()
        .filter(|order| order.status == OrderStatus::Completed)
        .map(|order| price_digits(&order.price))
        .sum()
}

/// Order counts per status for the admin summary cards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrderSummary {
    pub total: usize,
    pub awaiting_payment: usize,
    pub processing: usize,
    pub completed: usize,
    pub cancelled: usize,
}

/// Toast shown when a new order streams in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrderAlert {
    pub customer_name: String,
    pub template_name: String,
}

/// Admin order list, newest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrdersState {
    pub orders: Vec<Order>,
    /// `None` means [`ALL_STATUSES`].
    pub filter: Option<OrderStatus>,
    pub loading: bool,
    pub error: Option<String>,
    pub alert: Option<NewOrderAlert>,
    /// Bumped on every raised alert so a stale dismiss timer leaves a newer one up.
    pub alert_generation: u64,
}

impl OrdersState {
    /// Fold a realtime row change into the list.
    pub fn apply_change(&mut self, change: RowChange<Order>) {
        match change {
            RowChange::Insert(order) => {
                self.alert =
                    Some(NewOrderAlert { customer_name: order.customer_name.clone(), template_name: order.template_name.clone() });
                self.alert_generation += 1;
                self.orders.retain(|existing| existing.id != order.id);
                self.orders.insert(0, order);
            }
            RowChange::Update(order) => {
                if let Some(existing) = self.orders.iter_mut().find(|existing| existing.id == order.id) {
                    *existing = order;
                }
            }
            RowChange::Delete { id } => self.orders.retain(|existing| existing.id != id),
        }
    }

    /// Clear the alert raised as `generation`; a newer alert stays.
    pub fn dismiss_alert(&mut self, generation: u64) {
        if self.alert_generation == generation {
            self.alert = None;
        }
    }

    pub fn filtered(&self) -> Vec<&Order> {
        self.orders.iter().filter(|order| self.filter.as_ref().is_none_or(|status| &order.status == status)).collect()
    }

    /// Log row for moving order `id` to `new_status`; `None` when the order is
    /// unknown or already in that status.
    pub fn plan_status_change(&self, id: &str, new_status: &OrderStatus) -> Option<OrderLog> {
        let order = self.orders.iter().find(|order| order.id == id)?;
        (order.status != *new_status).then(|| OrderLog {
            order_id: id.to_owned(),
            old_status: order.status.clone(),
            new_status: new_status.clone(),
            changed_by: STATUS_CHANGED_BY.to_owned(),
        })
    }

    pub fn set_status(&mut self, id: &str, status: OrderStatus) {
        if let Some(order) = self.orders.iter_mut().find(|order| order.id == id) {
            order.status = status;
        }
    }

    pub fn summary(&self) -> OrderSummary {
        self.orders.iter().fold(OrderSummary { total: self.orders.len(), ..OrderSummary::default() }, |mut summary, order| {
            match order.status {
                OrderStatus::AwaitingPayment => summary.awaiting_payment += 1,
                OrderStatus::Processing => summary.processing += 1,
                OrderStatus::Completed => summary.completed += 1,
                OrderStatus::Cancelled => summary.cancelled += 1,
                OrderStatus::Other(_) => {}
            }
            summary
        })
    }

    pub fn revenue(&self) -> u64 {
        revenue(&self.orders)
    }
}
