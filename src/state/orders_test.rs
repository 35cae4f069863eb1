use super::*;

fn template() -> Template {
    Template {
        id: "7".to_owned(),
        name: "Rustic Garden".to_owned(),
        category: "Wedding".to_owned(),
        subcategory: "Rustic".to_owned(),
        price: "Rp 150.000".to_owned(),
        image: None,
        created_at: None,
    }
}

fn form() -> OrderForm {
    OrderForm {
        name: " Sari ".to_owned(),
        email: "sari@example.com".to_owned(),
        phone: "081234567890".to_owned(),
        note: String::new(),
        payment: PaymentMethod::Qris,
    }
}

fn order(id: &str, status: OrderStatus, price: &str) -> Order {
    Order {
        id: id.to_owned(),
        user_id: Some("u-1".to_owned()),
        template_id: Some("7".to_owned()),
        template_name: "Rustic Garden".to_owned(),
        price: price.to_owned(),
        customer_name: format!("customer-{id}"),
        customer_email: String::new(),
        customer_phone: String::new(),
        note: String::new(),
        payment_method: "QRIS".to_owned(),
        status,
        created_at: None,
    }
}

// =============================================================
// Order form
// =============================================================

#[test]
fn whatsapp_number_must_be_10_to_15_digits() {
    assert!(is_valid_whatsapp("0812345678"));
    assert!(is_valid_whatsapp("628123456789012"));
    assert!(!is_valid_whatsapp("081234567"));
    assert!(!is_valid_whatsapp("6281234567890123"));
    assert!(!is_valid_whatsapp("+6281234567"));
    assert!(!is_valid_whatsapp("0812-3456-789"));
}

#[test]
fn build_new_order_requires_login() {
    assert_eq!(build_new_order(None, &template(), &form()), Err(OrderFormError::NotSignedIn));
}

#[test]
fn build_new_order_rejects_bad_phone_and_blank_name() {
    let mut bad_phone = form();
    bad_phone.phone = "12345".to_owned();
    assert_eq!(build_new_order(Some("u-1"), &template(), &bad_phone), Err(OrderFormError::InvalidPhone));

    let mut blank = form();
    blank.name = "   ".to_owned();
    assert_eq!(build_new_order(Some("u-1"), &template(), &blank), Err(OrderFormError::MissingName));
}

#[test]
fn build_new_order_copies_template_and_starts_awaiting_payment() {
    let order = build_new_order(Some("u-1"), &template(), &form()).unwrap();
    assert_eq!(order.user_id, "u-1");
    assert_eq!(order.template_id, "7");
    assert_eq!(order.price, "Rp 150.000");
    assert_eq!(order.customer_name, "Sari");
    assert_eq!(order.status, OrderStatus::AwaitingPayment);

    let json = serde_json::to_value(&order).unwrap();
    assert_eq!(json["status"], "Menunggu Pembayaran");
    assert_eq!(json["payment_method"], "QRIS");
}

#[test]
fn form_prefills_from_identity_metadata() {
    let mut user_metadata = serde_json::Map::new();
    user_metadata.insert("username".to_owned(), serde_json::json!("sari"));
    user_metadata.insert("phone".to_owned(), serde_json::json!("0811111111"));
    let identity = Identity { id: "u-1".to_owned(), email: Some("s@x.id".to_owned()), user_metadata };

    let form = OrderForm::for_identity(Some(&identity));
    assert_eq!(form.name, "sari");
    assert_eq!(form.email, "s@x.id");
    assert_eq!(form.phone, "0811111111");
    assert_eq!(form.payment, PaymentMethod::BankTransfer);
    assert_eq!(OrderForm::for_identity(None), OrderForm::default());
}

#[test]
fn whatsapp_message_lists_order_details() {
    let order = build_new_order(Some("u-1"), &template(), &form()).unwrap();
    let message = whatsapp_message(&order, &template());
    assert!(message.contains("- Nama: Sari\n"));
    assert!(message.contains("- Kategori: Wedding (Rustic)\n"));
    assert!(message.contains("- Pembayaran: QRIS\n"));
    assert!(message.ends_with("Catatan:\n-"));
    assert_eq!(whatsapp_link("628123", "Halo%20Admin"), "https://wa.me/628123?text=Halo%20Admin");
}

// =============================================================
// Admin list
// =============================================================

#[test]
fn realtime_insert_prepends_and_raises_alert() {
    let mut state = OrdersState { orders: vec![order("1", OrderStatus::Processing, "Rp 10.000")], ..OrdersState::default() };
    state.apply_change(RowChange::Insert(order("2", OrderStatus::AwaitingPayment, "Rp 20.000")));
    let ids: Vec<&str> = state.orders.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "1"]);
    assert_eq!(state.alert.as_ref().map(|a| a.customer_name.as_str()), Some("customer-2"));
}

#[test]
fn stale_dismiss_keeps_newer_alert() {
    let mut state = OrdersState::default();
    state.apply_change(RowChange::Insert(order("1", OrderStatus::AwaitingPayment, "0")));
    let first = state.alert_generation;
    state.apply_change(RowChange::Insert(order("2", OrderStatus::AwaitingPayment, "0")));
    let second = state.alert_generation;
    assert_ne!(first, second);

    state.dismiss_alert(first);
    assert_eq!(state.alert.as_ref().map(|a| a.customer_name.as_str()), Some("customer-2"));

    state.dismiss_alert(second);
    assert!(state.alert.is_none());
}

#[test]
fn realtime_update_and_delete_touch_matching_row() {
    let mut state = OrdersState {
        orders: vec![order("1", OrderStatus::Processing, "0"), order("2", OrderStatus::Processing, "0")],
        ..OrdersState::default()
    };
    state.apply_change(RowChange::Update(order("2", OrderStatus::Completed, "0")));
    assert_eq!(state.orders[1].status, OrderStatus::Completed);
    state.apply_change(RowChange::Delete { id: "1".to_owned() });
    assert_eq!(state.orders.len(), 1);
    assert!(state.alert.is_none());
}

#[test]
fn status_change_plans_log_only_for_real_changes() {
    let state = OrdersState { orders: vec![order("1", OrderStatus::AwaitingPayment, "0")], ..OrdersState::default() };
    let log = state.plan_status_change("1", &OrderStatus::Processing).unwrap();
    assert_eq!(log.old_status, OrderStatus::AwaitingPayment);
    assert_eq!(log.new_status, OrderStatus::Processing);
    assert_eq!(log.changed_by, "Admin");
    assert!(state.plan_status_change("1", &OrderStatus::AwaitingPayment).is_none());
    assert!(state.plan_status_change("404", &OrderStatus::Processing).is_none());
}

#[test]
fn filter_summary_and_revenue() {
    let mut state = OrdersState {
        orders: vec![
            order("1", OrderStatus::Completed, "Rp 150.000"),
            order("2", OrderStatus::Completed, "Rp 50.000"),
            order("3", OrderStatus::Processing, "Rp 99.000"),
            order("4", OrderStatus::Cancelled, "Rp 10.000"),
            order("5", OrderStatus::AwaitingPayment, "Gratis"),
        ],
        ..OrdersState::default()
    };

    assert_eq!(state.revenue(), 200_000);
    assert_eq!(
        state.summary(),
        OrderSummary { total: 5, awaiting_payment: 1, processing: 1, completed: 2, cancelled: 1 }
    );

    state.filter = Some(OrderStatus::Completed);
    assert_eq!(state.filtered().len(), 2);
    state.set_status("3", OrderStatus::Completed);
    assert_eq!(state.filtered().len(), 3);
    state.filter = None;
    assert_eq!(state.filtered().len(), 5);
}
