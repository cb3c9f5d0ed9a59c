use redis::aio::ConnectionManager;
use redis::RedisResult;

/// Key of the cross-replica sync lock
const SYNC_LOCK_KEY: &str = "lock:catalog_sync";

/// Deletes the lock only while it still belongs to the caller
const RELEASE_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
else
    return 0
end
"#;

/// Redis service for locks shared between server replicas
#[derive(Clone)]
pub struct RedisService {
    conn: ConnectionManager,
}

impl RedisService {
    /// Create a new Redis service with connection pooling
    pub async fn new(redis_url: &str) -> RedisResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    /// Set a key only if it doesn't exist
    /// Returns true if set successfully, false if key already exists
    pub async fn set_nx_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> RedisResult<bool> {
        let mut conn = self.conn.clone();
        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await?;
        Ok(result.is_some())
    }

    /// Ping Redis to check connection
    pub async fn ping(&self) -> RedisResult<bool> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }

    // ============ Sync Lock Operations ============

    /// Acquire the sync lock for `job_id`; false if another replica holds it
    pub async fn acquire_sync_lock(&self, job_id: &str, ttl_seconds: u64) -> RedisResult<bool> {
        self.set_nx_ex(SYNC_LOCK_KEY, job_id, ttl_seconds).await
    }

    /// Release the sync lock if `job_id` still owns it
    pub async fn release_sync_lock(&self, job_id: &str) -> RedisResult<bool> {
        let mut conn = self.conn.clone();
        let deleted: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(SYNC_LOCK_KEY)
            .arg(job_id)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted > 0)
    }
}
