use async_trait::async_trait;
use redis::{AsyncCommands, Script, aio::ConnectionManager};

use crate::{
    error::{ErrorKind, ResultExt, WalletError},
    wallet::{Wallet, WalletId},
};

use super::{WalletCache, cache_key, decode, encode};

/// Sets `KEYS[1]` to `ARGV[1]` unless the stored entry already carries a
/// version of at least `ARGV[2]`. Unreadable entries are overwritten.
const PUT_IF_NEWER: &str = r"
local current = redis.call('GET', KEYS[1])
if current then
  local ok, entry = pcall(cjson.decode, current)
  if ok and type(entry) == 'table' then
    local version = tonumber(entry['version'] or 0)
    if version and version >= tonumber(ARGV[2]) then
      return 0
    end
  end
end
redis.call('SET', KEYS[1], ARGV[1])
return 1
";

/// Redis-backed cache. The connection manager reconnects on its own and is
/// cheap to clone, so every call works on its own handle.
#[derive(Clone)]
pub struct RedisWalletCache {
    conn: ConnectionManager,
    put_if_newer: Script,
}

impl RedisWalletCache {
    pub async fn connect(redis_url: &str) -> Result<Self, WalletError> {
        let client = redis::Client::open(redis_url)
            .map_err(ErrorKind::cache)
            .within("connect_cache")?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(ErrorKind::cache)
            .within("connect_cache")?;
        tracing::info!("Redis cache connection established");
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self {
            conn,
            put_if_newer: Script::new(PUT_IF_NEWER),
        }
    }
}

#[async_trait]
impl WalletCache for RedisWalletCache {
    async fn get_cached(&self, wallet_id: WalletId) -> Result<Option<Wallet>, WalletError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(cache_key(wallet_id))
            .await
            .map_err(ErrorKind::cache)
            .within("get_cached")?;
        raw.map(|raw| decode(&raw)).transpose().within("get_cached")
    }

    async fn put_cached(&self, wallet: &Wallet) -> Result<(), WalletError> {
        let payload = encode(wallet).within("put_cached")?;
        let mut conn = self.conn.clone();
        let written: i64 = self
            .put_if_newer
            .key(cache_key(wallet.id))
            .arg(payload)
            .arg(wallet.version)
            .invoke_async(&mut conn)
            .await
            .map_err(ErrorKind::cache)
            .within("put_cached")?;
        if written == 0 {
            tracing::debug!(
                wallet_id = wallet.id,
                version = wallet.version,
                "cache already holds a newer version"
            );
        }
        Ok(())
    }
}
