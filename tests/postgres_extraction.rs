//! Extraction against a live PostgreSQL server.
//!
//! Ignored by default. Point `DBV_TEST_POSTGRES_URL` at a scratch database and
//! run with `--ignored`.

use dbv::config::SchemaConfig;
use postgres::{Client, NoTls};

const NAMESPACE: &str = "dbv_shared_fk_names";

fn server_url() -> String {
    std::env::var("DBV_TEST_POSTGRES_URL").expect("DBV_TEST_POSTGRES_URL is not set")
}

#[test]
#[ignore]
fn test_shared_constraint_names_stay_per_table() {
    let url = server_url();
    let mut client = Client::connect(&url, NoTls).unwrap();
    client
        .batch_execute(&format!(
            "DROP SCHEMA IF EXISTS {ns} CASCADE;
             CREATE SCHEMA {ns};
             CREATE TABLE {ns}.users (id INTEGER PRIMARY KEY);
             CREATE TABLE {ns}.orders (
                 id INTEGER PRIMARY KEY,
                 user_id INTEGER,
                 CONSTRAINT fk_user FOREIGN KEY (user_id) REFERENCES {ns}.users(id) ON DELETE CASCADE
             );
             CREATE TABLE {ns}.invoices (
                 id INTEGER PRIMARY KEY,
                 user_id INTEGER,
                 CONSTRAINT fk_user FOREIGN KEY (user_id) REFERENCES {ns}.users(id) ON DELETE SET NULL
             );",
            ns = NAMESPACE
        ))
        .unwrap();

    let config = SchemaConfig {
        namespace: Some(NAMESPACE.to_string()),
        ..SchemaConfig::default()
    };
    let result = dbv::extract(&url, &config);
    client
        .batch_execute(&format!("DROP SCHEMA {NAMESPACE} CASCADE"))
        .unwrap();
    let schema = result.unwrap();

    assert_eq!(schema.foreign_keys.len(), 2);
    let invoices = &schema.foreign_keys[0];
    assert_eq!(invoices.table, "invoices");
    assert_eq!(invoices.name, "fk_user");
    assert_eq!(invoices.on_delete, "SET NULL");
    let orders = &schema.foreign_keys[1];
    assert_eq!(orders.table, "orders");
    assert_eq!(orders.on_delete, "CASCADE");
    assert_eq!(orders.on_update, "NO ACTION");
}
