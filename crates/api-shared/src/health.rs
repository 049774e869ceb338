use crate::dto::HealthRes;
use caremap_core::Database;

/// Health check behind the REST server's `/health` route.
///
/// Reports healthy only when the database answers a trivial query. The route turns an
/// unhealthy report into a 503.
#[derive(Clone, Debug)]
pub struct HealthService {
    db: Database,
}

impl HealthService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn check_health(&self) -> HealthRes {
        match self.db.ping() {
            Ok(()) => HealthRes {
                ok: true,
                message: "caremap is alive".into(),
            },
            Err(e) => {
                tracing::error!("health check failed: {e}");
                HealthRes {
                    ok: false,
                    message: "database unavailable".into(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_when_database_answers() {
        let db = Database::open_in_memory().unwrap();
        let res = HealthService::new(db).check_health();
        assert!(res.ok);
        assert_eq!(res.message, "caremap is alive");
    }
}
