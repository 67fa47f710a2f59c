//! MySQL table source for base-sync
//!
//! Reads schema from `information_schema` and rows with LIMIT/OFFSET
//! paging over one connection.

mod source;
pub mod testing;

pub use source::MySqlSource;

/// MySQL source connection options
#[derive(Clone, Debug)]
pub struct SourceOpts {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Database whose tables are synchronized
    pub database: String,
}

impl SourceOpts {
    /// Connection options for `mysql_async`.
    pub fn to_mysql_opts(&self) -> mysql_async::Opts {
        mysql_async::OptsBuilder::default()
            .ip_or_hostname(self.host.clone())
            .tcp_port(self.port)
            .user(Some(self.username.clone()))
            .pass(Some(self.password.clone()))
            .db_name(Some(self.database.clone()))
            .into()
    }

    /// `user@host:port/db`, for logs.
    pub fn display_target(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.username, self.host, self.port, self.database
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> SourceOpts {
        SourceOpts {
            host: "db.internal".into(),
            port: 3307,
            username: "reader".into(),
            password: "s3cret".into(),
            database: "shop".into(),
        }
    }

    #[test]
    fn test_display_target_hides_password() {
        let target = opts().display_target();
        assert_eq!(target, "reader@db.internal:3307/shop");
        assert!(!target.contains("s3cret"));
    }

    #[test]
    fn test_mysql_opts() {
        let mysql = opts().to_mysql_opts();
        assert_eq!(mysql.ip_or_hostname(), "db.internal");
        assert_eq!(mysql.tcp_port(), 3307);
        assert_eq!(mysql.user(), Some("reader"));
        assert_eq!(mysql.db_name(), Some("shop"));
    }
}
