//! # Tintworks Store
//!
//! Append-only order persistence on SQLite. Orders are created by the
//! payment webhook and read by the success page; there are no update or
//! delete paths, by design.

use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Mutex;

use tintworks_core::types::{NewOrder, OrderRecord};

/// Order database. Writes serialize behind the connection mutex; the WAL
/// journal keeps concurrent readers cheap.
pub struct OrderStore {
    conn: Mutex<Connection>,
}

impl OrderStore {
    /// Open or create the order database.
    pub fn open(path: &Path) -> Result<Self, String> {
        let conn = Connection::open(path).map_err(|e| format!("Order store open error: {e}"))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Run schema migrations.
    fn migrate(&self) -> Result<(), String> {
        let conn = self.conn.lock().map_err(|e| format!("Lock: {e}"))?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS orders (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                checkout_session_id TEXT NOT NULL,
                payment_intent_id TEXT NOT NULL,
                amount_cents INTEGER NOT NULL,
                currency TEXT DEFAULT 'usd',
                status TEXT DEFAULT 'paid',
                customer_email TEXT DEFAULT '',
                created_at TEXT DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_orders_session
                ON orders (checkout_session_id);
            CREATE INDEX IF NOT EXISTS idx_orders_user
                ON orders (user_id);
        ",
        )
        .map_err(|e| format!("Migration error: {e}"))?;
        Ok(())
    }

    /// Append one order and return the stored record. The id is generated
    /// here; callers never supply one.
    pub fn insert_order(&self, order: &NewOrder) -> Result<OrderRecord, String> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        let email = order.customer_email.clone().unwrap_or_default();

        let conn = self.conn.lock().map_err(|e| format!("Lock: {e}"))?;
        conn.execute(
            "INSERT INTO orders (id, user_id, checkout_session_id, payment_intent_id,
                                 amount_cents, currency, status, customer_email, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'paid', ?7, ?8)",
            params![
                id,
                order.user_id,
                order.checkout_session_id,
                order.payment_intent_id,
                order.amount_cents,
                order.currency,
                email,
                created_at
            ],
        )
        .map_err(|e| format!("Insert order: {e}"))?;
        drop(conn);

        self.get_order(&id)
    }

    /// Get one order by generated id.
    pub fn get_order(&self, id: &str) -> Result<OrderRecord, String> {
        let conn = self.conn.lock().map_err(|e| format!("Lock: {e}"))?;
        conn.query_row(
            "SELECT id, user_id, checkout_session_id, payment_intent_id, amount_cents,
                    currency, status, customer_email, created_at
             FROM orders WHERE id=?1",
            params![id],
            row_to_order,
        )
        .map_err(|e| format!("Get order: {e}"))
    }

    /// Find the order created for a checkout session, if any. Returns the
    /// oldest row when duplicates exist.
    pub fn find_by_session(&self, session_id: &str) -> Result<Option<OrderRecord>, String> {
        let conn = self.conn.lock().map_err(|e| format!("Lock: {e}"))?;
        match conn.query_row(
            "SELECT id, user_id, checkout_session_id, payment_intent_id, amount_cents,
                    currency, status, customer_email, created_at
             FROM orders WHERE checkout_session_id=?1 ORDER BY created_at ASC LIMIT 1",
            params![session_id],
            row_to_order,
        ) {
            Ok(order) => Ok(Some(order)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(format!("Find by session: {e}")),
        }
    }

    /// List a user's orders, newest first.
    pub fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<OrderRecord>, String> {
        let conn = self.conn.lock().map_err(|e| format!("Lock: {e}"))?;
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, checkout_session_id, payment_intent_id, amount_cents,
                        currency, status, customer_email, created_at
                 FROM orders WHERE user_id=?1 ORDER BY created_at DESC",
            )
            .map_err(|e| format!("Prepare: {e}"))?;

        let orders = stmt
            .query_map(params![user_id], row_to_order)
            .map_err(|e| format!("Query: {e}"))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(orders)
    }

    /// Total number of orders.
    pub fn count(&self) -> Result<i64, String> {
        let conn = self.conn.lock().map_err(|e| format!("Lock: {e}"))?;
        conn.query_row("SELECT COUNT(*) FROM orders", [], |r| r.get(0))
            .map_err(|e| format!("Count: {e}"))
    }
}

fn row_to_order(row: &rusqlite::Row<'_>) -> rusqlite::Result<OrderRecord> {
    Ok(OrderRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        checkout_session_id: row.get(2)?,
        payment_intent_id: row.get(3)?,
        amount_cents: row.get(4)?,
        currency: row.get(5)?,
        status: row.get(6)?,
        customer_email: row.get(7)?,
        created_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_store() -> OrderStore {
        OrderStore::open(&PathBuf::from(":memory:")).unwrap()
    }

    fn new_order(session: &str) -> NewOrder {
        NewOrder {
            user_id: "user-42".into(),
            checkout_session_id: session.into(),
            payment_intent_id: "pi_1".into(),
            amount_cents: 20_000,
            currency: "usd".into(),
            customer_email: Some("buyer@example.com".into()),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = temp_store();
        let stored = store.insert_order(&new_order("cs_1")).unwrap();
        assert!(!stored.id.is_empty());
        assert_eq!(stored.status, "paid");
        assert_eq!(stored.amount_cents, 20_000);

        let fetched = store.get_order(&stored.id).unwrap();
        assert_eq!(fetched.checkout_session_id, "cs_1");
        assert_eq!(fetched.customer_email, "buyer@example.com");
    }

    #[test]
    fn test_get_missing_order_errors() {
        let store = temp_store();
        assert!(store.get_order("nope").is_err());
    }

    #[test]
    fn test_find_by_session() {
        let store = temp_store();
        store.insert_order(&new_order("cs_a")).unwrap();
        store.insert_order(&new_order("cs_b")).unwrap();

        let found = store.find_by_session("cs_b").unwrap().unwrap();
        assert_eq!(found.checkout_session_id, "cs_b");
        assert!(store.find_by_session("cs_missing").unwrap().is_none());
    }

    #[test]
    fn test_list_orders_for_user() {
        let store = temp_store();
        store.insert_order(&new_order("cs_1")).unwrap();
        store.insert_order(&new_order("cs_2")).unwrap();
        let mut other = new_order("cs_3");
        other.user_id = "someone-else".into();
        store.insert_order(&other).unwrap();

        let orders = store.list_orders_for_user("user-42").unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.user_id == "user-42"));
    }

    #[test]
    fn test_missing_email_stored_empty() {
        let store = temp_store();
        let mut order = new_order("cs_1");
        order.customer_email = None;
        let stored = store.insert_order(&order).unwrap();
        assert_eq!(stored.customer_email, "");
    }

    #[test]
    fn test_duplicate_session_inserts_duplicate_rows() {
        // Webhook delivery is at-least-once and there is no idempotency
        // guard, so a replayed event really does append a second row.
        let store = temp_store();
        store.insert_order(&new_order("cs_dup")).unwrap();
        store.insert_order(&new_order("cs_dup")).unwrap();
        assert_eq!(store.count().unwrap(), 2);
        // Lookup still resolves to a single (the first) row
        assert!(store.find_by_session("cs_dup").unwrap().is_some());
    }
}
