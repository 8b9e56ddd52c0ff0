pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;
pub const SQLITE_DB_FILE_NAME: &str = "db.sqlite3";
