use async_trait::async_trait;
use database::{
    DatabaseConnection, DatabaseDriver, DatabaseError, DatabaseModule, UnsupportedMigrator,
};
use errors::HttpException;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

struct FlakyMongo {
    up: AtomicBool,
}

#[async_trait]
impl DatabaseConnection for FlakyMongo {
    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Mongodb
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        if self.up.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DatabaseError::connection("mongodb", "server selection timeout"))
        }
    }

    async fn reconnect(&self) -> Result<(), DatabaseError> {
        Err(DatabaseError::connection("mongodb", "server selection timeout"))
    }

    async fn close(&self) {}
}

fn module(up: bool) -> (DatabaseModule, Arc<FlakyMongo>) {
    let connection = Arc::new(FlakyMongo {
        up: AtomicBool::new(up),
    });
    let module = DatabaseModule::from_parts(
        Arc::clone(&connection) as Arc<dyn DatabaseConnection>,
        Arc::new(UnsupportedMigrator::new(DatabaseDriver::Mongodb)),
        Duration::from_millis(10),
    );
    (module, connection)
}

#[tokio::test]
async fn test_monitor_records_outage_and_recovery() {
    let (module, connection) = module(true);
    module.manager().start();
    assert!(module.health().await.healthy);

    connection.up.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let health = module.manager().last_health().unwrap();
    assert!(!health.healthy);
    assert_eq!(health.driver, "mongodb");
    assert!(module.manager().stats().reconnect_attempts >= 1);

    connection.up.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(module.manager().last_health().unwrap().healthy);

    module.close().await;
}

#[tokio::test]
async fn test_migration_error_maps_to_problem_status() {
    let (module, _) = module(true);

    let err = module.migrator().pending().await.unwrap_err();
    let exception = HttpException::from(err);

    assert_eq!(exception.status().as_u16(), 500);
    assert_eq!(exception.error_code(), "DB_MIGRATION_FAILED");
    assert!(exception.data().is_none());
    assert_eq!(exception.context()["driver"], "mongodb");
}
