use super::*;

#[test]
fn all_chip_clears_the_filter() {
    assert_eq!(status_filter(ALL_STATUSES), None);
}

#[test]
fn status_chips_map_to_known_statuses() {
    assert_eq!(status_filter("Diproses"), Some(OrderStatus::Processing));
    assert_eq!(status_filter("Selesai"), Some(OrderStatus::Completed));
    assert_eq!(status_filter("Ditahan"), Some(OrderStatus::Other("Ditahan".to_owned())));
}

#[test]
fn orders_channel_listens_for_inserts_only() {
    assert_eq!(ORDERS_CHANNEL.table, "orders");
    assert_eq!(ORDERS_CHANNEL.event, ChangeEvent::Insert);
}

#[test]
fn all_orders_are_newest_first() {
    assert_eq!(
        all_orders_query().params(),
        &[("select".to_owned(), "*".to_owned()), ("order".to_owned(), "created_at.desc".to_owned())]
    );
}
