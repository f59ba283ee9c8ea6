use std::time::Duration;

/// Tunables for the action layer.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Fixed rate-limit window.
    pub rate_window: Duration,
    /// Requests allowed per (action, client) within one window.
    pub rate_capacity: u32,
    /// Hard cap on data rows per CSV import.
    pub import_max_rows: usize,
    /// Upper bound on leads fetched for export.
    pub export_limit: usize,
    /// Whether `create_lead` demands an authenticated actor the way
    /// `update_lead` does. Off by default: anonymous capture forms create
    /// leads without a login.
    pub require_auth_on_create: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            rate_window: Duration::from_millis(60_000),
            rate_capacity: 10,
            import_max_rows: 200,
            export_limit: 1000,
            require_auth_on_create: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let config = ServiceConfig::default();
        assert_eq!(config.rate_window, Duration::from_millis(60_000));
        assert_eq!(config.rate_capacity, 10);
        assert_eq!(config.import_max_rows, 200);
        assert_eq!(config.export_limit, 1000);
        assert!(!config.require_auth_on_create);
    }
}
