//! Create tables.

use std::sync::Arc;

use funda_store::{Bootstrap, Bootstrapper, SchemaError, Store};
use tracing::{info, warn};

use super::{CliError, Target};

/// Create each table `target` names.
///
/// When the store cannot run schema statements, the SQL is printed for the
/// operator to run by hand and the table is not counted as a failure.
///
/// # Errors
///
/// `Setup` when any table failed for another reason.
pub async fn run(store: Arc<dyn Store>, target: Target) -> Result<(), CliError> {
    let bootstrapper = Bootstrapper::new(store);
    let entities = target.entities();
    let mut failed = 0;

    for entity in &entities {
        let schema = entity.schema();
        match bootstrapper.ensure_table(schema).await {
            Ok(Bootstrap::Created) => info!(table = schema.name, "table created"),
            Ok(Bootstrap::AlreadyExisted) => info!(table = schema.name, "table already exists"),
            Err(SchemaError::UnsupportedRemoteExecution { statement }) => {
                warn!(table = schema.name, "store cannot run SQL; run this manually");
                print_statement(&statement);
            }
            Err(e) => {
                warn!(table = schema.name, error = %e, "setup failed");
                failed += 1;
            }
        }
    }

    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::Setup(failed, entities.len()))
    }
}

#[allow(clippy::print_stdout)]
fn print_statement(statement: &str) {
    println!("{statement}\n");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use funda_core::EntityKind;
    use funda_store::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_setup_all_then_again() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        run(Arc::clone(&store), Target::All).await.unwrap();
        run(Arc::clone(&store), Target::All).await.unwrap();

        let bootstrapper = Bootstrapper::new(store);
        for entity in EntityKind::ALL {
            assert!(bootstrapper.table_exists(entity.schema()).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_setup_without_remote_execution_is_not_a_failure() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new().without_remote_execution());
        run(store, Target::One(EntityKind::Users)).await.unwrap();
    }
}
