//! Server configuration
//!
//! Every knob is a command-line flag with a `STASHDB_*` environment
//! fallback; flags win. Admin auth activates only when both credentials are
//! given, and S3 only when endpoint, bucket and both keys are all present;
//! partial configuration silently stays disabled, matching how operators
//! roll these options out one variable at a time.

use clap::Parser;

/// StashDB server configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "stashdb", version, about = "Multi-tenant in-memory key/value server")]
pub struct ServerConfig {
    /// Port to listen on
    #[arg(long, env = "STASHDB_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Host to bind
    #[arg(long, env = "STASHDB_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", env = "STASHDB_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log file path; stdout when omitted
    #[arg(long = "log-file", env = "STASHDB_LOG_FILE")]
    pub log_file: Option<String>,

    /// Admin username
    #[arg(long = "admin-username", env = "STASHDB_ADMIN_USERNAME")]
    pub admin_username: Option<String>,

    /// Admin password
    #[arg(long = "admin-password", env = "STASHDB_ADMIN_PASSWORD")]
    pub admin_password: Option<String>,

    /// S3 endpoint URL
    #[arg(long = "s3-endpoint", env = "STASHDB_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// S3 bucket name
    #[arg(long = "s3-bucket", env = "STASHDB_S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// S3 access key
    #[arg(long = "s3-access-key", env = "STASHDB_S3_ACCESS_KEY")]
    pub s3_access_key: Option<String>,

    /// S3 secret key
    #[arg(long = "s3-secret-key", env = "STASHDB_S3_SECRET_KEY")]
    pub s3_secret_key: Option<String>,

    /// S3 region
    #[arg(long = "s3-region", env = "STASHDB_S3_REGION", default_value = "us-east-1")]
    pub s3_region: String,

    /// Minutes between automatic full backups (0 disables the ticker)
    #[arg(long = "backup-interval", env = "STASHDB_BACKUP_INTERVAL", default_value_t = 60)]
    pub backup_interval: u64,
}

/// Resolved S3 settings, present only when fully configured
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Endpoint URL
    pub endpoint: String,
    /// Bucket name
    pub bucket: String,
    /// Access key
    pub access_key: String,
    /// Secret key
    pub secret_key: String,
    /// Region
    pub region: String,
}

impl ServerConfig {
    /// Admin credentials, when both halves are configured
    pub fn admin_credentials(&self) -> Option<(String, String)> {
        match (&self.admin_username, &self.admin_password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        }
    }

    /// S3 settings, when endpoint, bucket and both keys are configured
    pub fn s3(&self) -> Option<S3Config> {
        match (
            &self.s3_endpoint,
            &self.s3_bucket,
            &self.s3_access_key,
            &self.s3_secret_key,
        ) {
            (Some(endpoint), Some(bucket), Some(access_key), Some(secret_key)) => Some(S3Config {
                endpoint: endpoint.clone(),
                bucket: bucket.clone(),
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
                region: self.s3_region.clone(),
            }),
            _ => None,
        }
    }

    /// The socket address string to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ServerConfig::try_parse_from(["stashdb"]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.backup_interval, 60);
        assert!(cfg.admin_credentials().is_none());
        assert!(cfg.s3().is_none());
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_flags_override_defaults() {
        let cfg = ServerConfig::try_parse_from([
            "stashdb",
            "--port",
            "9090",
            "--host",
            "127.0.0.1",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr(), "127.0.0.1:9090");
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn test_admin_requires_both_halves() {
        let cfg =
            ServerConfig::try_parse_from(["stashdb", "--admin-username", "root"]).unwrap();
        assert!(cfg.admin_credentials().is_none());

        let cfg = ServerConfig::try_parse_from([
            "stashdb",
            "--admin-username",
            "root",
            "--admin-password",
            "hunter2",
        ])
        .unwrap();
        assert_eq!(
            cfg.admin_credentials(),
            Some(("root".to_string(), "hunter2".to_string()))
        );
    }

    #[test]
    fn test_s3_requires_full_configuration() {
        let cfg = ServerConfig::try_parse_from([
            "stashdb",
            "--s3-endpoint",
            "http://minio:9000",
            "--s3-bucket",
            "backups",
        ])
        .unwrap();
        assert!(cfg.s3().is_none());

        let cfg = ServerConfig::try_parse_from([
            "stashdb",
            "--s3-endpoint",
            "http://minio:9000",
            "--s3-bucket",
            "backups",
            "--s3-access-key",
            "ak",
            "--s3-secret-key",
            "sk",
            "--s3-region",
            "eu-west-1",
        ])
        .unwrap();
        let s3 = cfg.s3().unwrap();
        assert_eq!(s3.bucket, "backups");
        assert_eq!(s3.region, "eu-west-1");
    }
}
