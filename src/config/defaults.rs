pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: i64 = 3000;
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://dormcart.db?mode=rwc";
pub const DEFAULT_DB_MAX_CONNECTIONS: i64 = 10;
pub const DEFAULT_DB_MIN_IDLE: i64 = 2;
pub const DEFAULT_SESSION_TTL_SECS: i64 = 12 * 60 * 60;
pub const DEFAULT_REMEMBER_TTL_SECS: i64 = 30 * 24 * 60 * 60;
pub const DEFAULT_RESET_TTL_SECS: i64 = 60 * 60;
pub const DEFAULT_RESET_BASE_URL: &str = "http://127.0.0.1:3000/reset-password";
pub const DEFAULT_SEED_DEMO_DATA: bool = true;
pub const MIN_SECRET_KEY_LEN: usize = 16;
pub const MAX_TTL_SECS: u64 = 366 * 24 * 60 * 60;
