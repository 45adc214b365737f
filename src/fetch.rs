use crate::adb::AdbClient;
use anyhow::{bail, Result};

const SMS_URI: &str = "content://sms";
const PROJECTION: &str = "_id:address:date:read:type:body";

/// Collaborator contract for the raw message source: given a minimum
/// timestamp, produce the raw dump text for records at or after it.
/// "No matching records" is an empty successful fetch, not an error.
pub trait MessageSource {
    fn fetch_since(
        &self,
        since_ms: i64,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Reads the device SMS inbox through the content provider.
pub struct SmsFetcher {
    client: AdbClient,
    timeout_ms: u64,
}

impl SmsFetcher {
    pub fn new(client: AdbClient, timeout_ms: u64) -> Self {
        SmsFetcher { client, timeout_ms }
    }

    /// Single quotes around --where and --sort keep the device-side shell
    /// from treating `>` as a redirect.
    fn build_query(since_ms: i64) -> String {
        if since_ms > 0 {
            format!(
                "content query --uri {SMS_URI} --projection {PROJECTION} --where 'date>{since_ms}' --sort 'date DESC'"
            )
        } else {
            format!(
                "content query --uri {SMS_URI} --projection {PROJECTION} --sort 'date DESC'"
            )
        }
    }

    pub async fn read_inbox(&self, since_ms: i64) -> Result<String> {
        let query = Self::build_query(since_ms);
        let result = self
            .client
            .execute(&["shell", query.as_str()], self.timeout_ms)
            .await?;

        // The provider reports an empty result set as a textual error;
        // distinguish it from real failures.
        if result.output.to_lowercase().contains("no result found")
            || result.error.to_lowercase().contains("no result found")
        {
            return Ok(String::new());
        }

        if !result.success() {
            bail!(
                "SMS query failed: {} (exit code: {})",
                result.error.trim(),
                result.exit_code
            );
        }

        Ok(result.output)
    }
}

impl MessageSource for SmsFetcher {
    async fn fetch_since(&self, since_ms: i64) -> Result<String> {
        self.read_inbox(since_ms).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfiltered_query_has_no_where_clause() {
        let query = SmsFetcher::build_query(0);
        assert!(query.contains("--uri content://sms"));
        assert!(query.contains("--projection _id:address:date:read:type:body"));
        assert!(!query.contains("--where"));
        assert!(query.contains("--sort 'date DESC'"));
    }

    #[test]
    fn test_incremental_query_bounds_by_date() {
        let query = SmsFetcher::build_query(1_700_000_000_000);
        assert!(query.contains("--where 'date>1700000000000'"));
    }
}
