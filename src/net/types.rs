//! Shared row and auth DTOs for the client/backend boundary.
//!
//! DESIGN
//! ======
//! These types mirror the backend's auth payloads and table rows so serde
//! decoding stays lossless. Ids are normalized to strings because the store
//! hands out both numeric and text keys depending on the table.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// The authenticated principal reported by the auth service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque user identifier (UUID string), shared with [`Profile::id`].
    pub id: String,
    /// Email address the account was registered with.
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form metadata supplied at sign-up (e.g. `username`, `phone`).
    #[serde(default)]
    pub user_metadata: serde_json::Map<String, serde_json::Value>,
}

impl Identity {
    /// Read a string value from the sign-up metadata.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata.get(key).and_then(serde_json::Value::as_str)
    }
}

/// An active auth session as issued by the token endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry as unix seconds, when the service reports one.
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: Identity,
}

/// Auth lifecycle events broadcast to subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

/// One delivered auth-state change: the event plus the session it leaves behind.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

/// Authorization level read from a profile row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// The other role, used by the admin role toggle.
    #[must_use]
    pub fn toggled(self) -> Role {
        match self {
            Role::User => Role::Admin,
            Role::Admin => Role::User,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-owned profile row keyed by the identity id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    /// Display name.
    #[serde(rename = "username", default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Editable subset of a profile row.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(rename = "username", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    /// Apply the edit to a local profile mirror.
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(name) = &self.display_name {
            profile.display_name = Some(name.clone());
        }
        if let Some(phone) = &self.phone {
            profile.phone = Some(phone.clone());
        }
        if let Some(avatar) = &self.avatar_url {
            profile.avatar_url = Some(avatar.clone());
        }
    }
}

/// A sellable design template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    /// Display price, e.g. `"Rp 25.000"` or `"Gratis"`.
    #[serde(default)]
    pub price: String,
    /// Storage path or absolute URL of the preview image.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub category_id: String,
}

/// A template saved to a user's favorites, denormalized for display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub user_id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub template_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Order lifecycle as stored in the `status` column.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    AwaitingPayment,
    Processing,
    Completed,
    Cancelled,
    /// Any status value this client does not know about.
    Other(String),
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::AwaitingPayment,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::AwaitingPayment => "Menunggu Pembayaran",
            OrderStatus::Processing => "Diproses",
            OrderStatus::Completed => "Selesai",
            OrderStatus::Cancelled => "Dibatalkan",
            OrderStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Menunggu Pembayaran" => OrderStatus::AwaitingPayment,
            "Diproses" => OrderStatus::Processing,
            "Selesai" => OrderStatus::Completed,
            "Dibatalkan" => OrderStatus::Cancelled,
            _ => OrderStatus::Other(raw),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_owned()
    }
}

/// Payment options offered on the order form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "Transfer Bank")]
    BankTransfer,
    #[serde(rename = "QRIS")]
    Qris,
    GoPay,
    #[serde(rename = "OVO")]
    Ovo,
    Dana,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::BankTransfer,
        PaymentMethod::Qris,
        PaymentMethod::GoPay,
        PaymentMethod::Ovo,
        PaymentMethod::Dana,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "Transfer Bank",
            PaymentMethod::Qris => "QRIS",
            PaymentMethod::GoPay => "GoPay",
            PaymentMethod::Ovo => "OVO",
            PaymentMethod::Dana => "Dana",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.label() == label)
    }
}

/// A placed order row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub template_id: Option<String>,
    #[serde(default)]
    pub template_name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub payment_method: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Insert payload for a new order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewOrder {
    pub user_id: String,
    pub template_id: String,
    pub template_name: String,
    pub price: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub note: String,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
}

/// Audit row written whenever an admin changes an order's status.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderLog {
    pub order_id: String,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub changed_by: String,
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(id) => Ok(id),
        serde_json::Value::Number(number) => Ok(number.to_string()),
        _ => Err(D::Error::custom("expected string or number id")),
    }
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(id) => Ok(Some(id)),
        serde_json::Value::Number(number) => Ok(Some(number.to_string())),
        _ => Err(D::Error::custom("expected string, number, or null id")),
    }
}
