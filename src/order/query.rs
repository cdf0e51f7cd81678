//! Order listing: the filtered four-table join, the distinct-order count and
//! the fold from flat rows to nested orders.

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, instrument};

use crate::domain::{OrderFilters, OrderRow, OrderView, Page};
use crate::gateway::StoreError;

pub const ORDERS_PAGE_SIZE: u32 = 10;

const ROW_COLUMNS: &str = "o.id AS order_id, \
     o.data_creazione AS created_at, \
     u.id AS user_id, \
     u.nome AS user_first_name, \
     u.cognome AS user_last_name, \
     u.email AS user_email, \
     p.id AS product_id, \
     p.nome AS product_name";

const LINK_JOINS: &str = " LEFT JOIN order_users ou ON o.id = ou.order_id \
     LEFT JOIN users u ON ou.user_id = u.id \
     LEFT JOIN order_products op ON o.id = op.order_id \
     LEFT JOIN products p ON op.product_id = p.id";

const ROW_ORDER: &str = " ORDER BY o.data_creazione DESC, o.id DESC, u.id, p.id";

/// Fetches one page of orders as flat join rows.
///
/// The page is cut over orders, not rows: a sub-select picks the page's order
/// ids and only then are the links joined in, so every order on the page comes
/// with all of its rows. `total_items` counts matching orders.
#[instrument(skip(pool))]
pub async fn fetch_page(
    pool: &SqlitePool,
    filters: &OrderFilters,
    page: u32,
    page_size: u32,
) -> Result<Page<OrderRow>, StoreError> {
    let page = page.max(1);

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders o");
    push_filters(&mut count, filters);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let offset = i64::from(page - 1) * i64::from(page_size);
    let mut select = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {ROW_COLUMNS} FROM (SELECT o.id, o.data_creazione FROM orders o"
    ));
    push_filters(&mut select, filters);
    select
        .push(" ORDER BY o.data_creazione DESC, o.id DESC LIMIT ")
        .push_bind(i64::from(page_size))
        .push(" OFFSET ")
        .push_bind(offset)
        .push(") o")
        .push(LINK_JOINS)
        .push(ROW_ORDER);

    let rows = select.build_query_as::<OrderRow>().fetch_all(pool).await?;
    debug!(rows = rows.len(), total, "Fetched order page");

    Ok(Page::new(rows, page, page_size, u64::try_from(total).unwrap_or(0)))
}

/// All join rows of a single order; empty when the order does not exist.
pub async fn fetch_order_rows(conn: &mut SqliteConnection, order_id: i64) -> Result<Vec<OrderRow>, StoreError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ROW_COLUMNS} FROM orders o{LINK_JOINS} WHERE o.id = ?{ROW_ORDER}"
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filters: &OrderFilters) {
    let mut has_where = false;

    if let Some(date) = filters.exact_date {
        push_condition(builder, &mut has_where);
        builder
            .push("DATE(o.data_creazione) = ")
            .push_bind(date.format("%Y-%m-%d").to_string());
    }

    if let Some(product_id) = filters.product_id {
        push_condition(builder, &mut has_where);
        builder
            .push("EXISTS (SELECT 1 FROM order_products f WHERE f.order_id = o.id AND f.product_id = ")
            .push_bind(product_id)
            .push(")");
    }
}

fn push_condition(builder: &mut QueryBuilder<'_, Sqlite>, has_where: &mut bool) {
    if *has_where {
        builder.push(" AND ");
    } else {
        builder.push(" WHERE ");
        *has_where = true;
    }
}

/// Groups join rows by order id, in the order each order is first seen.
///
/// Users and products repeated by the user × product fan-out are kept once;
/// an order with no links of a kind gets an empty list.
pub fn fold_rows(rows: &[OrderRow]) -> Vec<OrderView> {
    let mut slots: HashMap<i64, usize> = HashMap::new();
    let mut views: Vec<OrderView> = Vec::new();

    for row in rows {
        let slot = *slots.entry(row.order_id).or_insert_with(|| {
            views.push(OrderView::new(row.order_id, row.created_at));
            views.len() - 1
        });
        let view = &mut views[slot];

        if let Some(user) = row.user() {
            if !view.users.iter().any(|u| u.id == user.id) {
                view.users.push(user);
            }
        }
        if let Some(product) = row.product() {
            if !view.products.iter().any(|p| p.id == product.id) {
                view.products.push(product);
            }
        }
    }

    views
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    use crate::domain::OrderCreate;
    use crate::test_support::{memory_system, seed_product, seed_user};

    fn at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    fn row(order_id: i64, user_id: Option<i64>, product_id: Option<i64>) -> OrderRow {
        OrderRow {
            order_id,
            created_at: Utc.with_ymd_and_hms(2025, 3, 30, 10, 0, 0).unwrap(),
            user_id,
            user_first_name: user_id.map(|_| "Mario".to_string()),
            user_last_name: user_id.map(|_| "Rossi".to_string()),
            user_email: user_id.map(|_| "mario@example.com".to_string()),
            product_id,
            product_name: product_id.map(|id| format!("Prodotto {id}")),
        }
    }

    #[test]
    fn test_fold_groups_rows_in_encounter_order() {
        let rows = vec![
            row(2, Some(1), Some(101)),
            row(2, Some(1), Some(102)),
            row(1, Some(1), Some(101)),
            row(2, Some(3), Some(101)),
            row(2, Some(3), Some(102)),
        ];

        let views = fold_rows(&rows);

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].order_id, 2);
        assert_eq!(views[0].user_ids(), vec![1, 3]);
        assert_eq!(views[0].product_ids(), vec![101, 102]);
        assert_eq!(views[1].order_id, 1);
        assert_eq!(views[1].product_ids(), vec![101]);
    }

    #[test]
    fn test_fold_keeps_orders_without_links() {
        let views = fold_rows(&[row(5, None, None)]);

        assert_eq!(views.len(), 1);
        assert!(views[0].users.is_empty());
        assert!(views[0].products.is_empty());
    }

    #[tokio::test]
    async fn test_exact_date_ignores_time_of_day() {
        let system = memory_system().await;
        let user = seed_user(&system, "Luigi", "Verdi").await;
        let product = seed_product(&system, "Prodotto C").await;
        let orders = &system.order_client;

        let early = orders
            .create_order_at(OrderCreate::new(user, [product]), at("2025-03-31T00:00:01Z"))
            .await
            .unwrap();
        let late = orders
            .create_order_at(OrderCreate::new(user, [product]), at("2025-03-31T23:59:59Z"))
            .await
            .unwrap();
        orders
            .create_order_at(OrderCreate::new(user, [product]), at("2025-03-30T12:00:00Z"))
            .await
            .unwrap();

        let filters = OrderFilters {
            exact_date: NaiveDate::from_ymd_opt(2025, 3, 31),
            product_id: None,
        };
        let page = fetch_page(system.database().pool(), &filters, 1, ORDERS_PAGE_SIZE)
            .await
            .unwrap();

        assert_eq!(page.total_items, 2);
        let ids: Vec<i64> = page.items.iter().map(|r| r.order_id).collect();
        assert_eq!(ids, vec![late, early]);
    }

    #[tokio::test]
    async fn test_product_filter_keeps_sibling_products() {
        let system = memory_system().await;
        let user = seed_user(&system, "Mario", "Rossi").await;
        let a = seed_product(&system, "Prodotto A").await;
        let b = seed_product(&system, "Prodotto B").await;
        let c = seed_product(&system, "Prodotto C").await;
        let orders = &system.order_client;

        let with_a = orders.create_order(OrderCreate::new(user, [a, b])).await.unwrap();
        orders.create_order(OrderCreate::new(user, [c])).await.unwrap();

        let filters = OrderFilters {
            exact_date: None,
            product_id: Some(a),
        };
        let page = fetch_page(system.database().pool(), &filters, 1, ORDERS_PAGE_SIZE)
            .await
            .unwrap();

        assert_eq!(page.total_items, 1);
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|r| r.order_id == with_a));
        let products: Vec<Option<i64>> = page.items.iter().map(|r| r.product_id).collect();
        assert_eq!(products, vec![Some(a), Some(b)]);
    }

    #[tokio::test]
    async fn test_pagination_counts_orders_not_rows() {
        let system = memory_system().await;
        let user = seed_user(&system, "Mario", "Rossi").await;
        let a = seed_product(&system, "Prodotto A").await;
        let b = seed_product(&system, "Prodotto B").await;
        let base = at("2025-01-01T08:00:00Z");

        let mut created = Vec::new();
        for minute in 0..12 {
            let id = system
                .order_client
                .create_order_at(OrderCreate::new(user, [a, b]), base + chrono::Duration::minutes(minute))
                .await
                .unwrap();
            created.push(id);
        }

        let pool = system.database().pool();
        let first = fetch_page(pool, &OrderFilters::default(), 1, ORDERS_PAGE_SIZE).await.unwrap();
        assert_eq!(first.total_items, 12);
        assert_eq!(first.total_pages(), 2);
        assert_eq!(first.items.len(), 20);
        assert_eq!(fold_rows(&first.items).len(), 10);
        // Newest first
        assert_eq!(first.items[0].order_id, created[11]);

        let second = fetch_page(pool, &OrderFilters::default(), 2, ORDERS_PAGE_SIZE).await.unwrap();
        let second_orders: Vec<i64> = fold_rows(&second.items).iter().map(|v| v.order_id).collect();
        assert_eq!(second_orders, vec![created[1], created[0]]);
    }

    #[tokio::test]
    async fn test_empty_listing_is_not_an_error() {
        let system = memory_system().await;

        let page = fetch_page(system.database().pool(), &OrderFilters::default(), 1, ORDERS_PAGE_SIZE)
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 0);
        assert_eq!(page.total_pages(), 0);
    }
}
