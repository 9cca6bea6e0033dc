use crate::ports::SyncQueue;
use async_trait::async_trait;
use serde_json::Value;
use shared::{Error, Result};
use std::path::Path;
use tokio::sync::Mutex;

const CART_KEY: &[u8] = b"cart";
const ORDER_KEY: &[u8] = b"order";

/// Sled-backed outbound queue; survives restarts
pub struct SledSyncQueue {
    db: sled::Db,
    // Serialize read-modify-write of each key
    cart_lock: Mutex<()>,
    order_lock: Mutex<()>,
}

impl SledSyncQueue {
    /// Open (or create) the queue database.
    /// Creates the parent directory if it doesn't exist
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Internal(format!("Failed to create directory: {}", e)))?;
        }

        let db = sled::open(path)
            .map_err(|e| Error::Internal(format!("Failed to open Sled database: {}", e)))?;

        Ok(Self {
            db,
            cart_lock: Mutex::new(()),
            order_lock: Mutex::new(()),
        })
    }

    fn read(&self, key: &[u8]) -> Result<Option<Value>> {
        let value = self
            .db
            .get(key)
            .map_err(|e| Error::Internal(format!("Failed to read queue: {}", e)))?;

        value
            .map(|bytes| {
                serde_json::from_slice(&bytes)
                    .map_err(|e| Error::Internal(format!("Failed to deserialize queue: {}", e)))
            })
            .transpose()
    }

    fn read_cart(&self) -> Result<Vec<Value>> {
        match self.read(CART_KEY)? {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(Error::Internal(format!(
                "Cart queue is not a list: {}",
                other
            ))),
            None => Ok(Vec::new()),
        }
    }

    fn write(&self, key: &[u8], value: &Value) -> Result<()> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| Error::Internal(format!("Failed to serialize queue: {}", e)))?;

        self.db
            .insert(key, bytes)
            .map_err(|e| Error::Internal(format!("Failed to write queue: {}", e)))?;

        self.flush()
    }

    fn remove(&self, key: &[u8]) -> Result<()> {
        self.db
            .remove(key)
            .map_err(|e| Error::Internal(format!("Failed to clear queue: {}", e)))?;

        self.flush()
    }

    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| Error::Internal(format!("Failed to flush database: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl SyncQueue for SledSyncQueue {
    async fn cart_items(&self) -> Result<Vec<Value>> {
        self.read_cart()
    }

    async fn push_cart_item(&self, item: Value) -> Result<()> {
        let _guard = self.cart_lock.lock().await;
        let mut items = self.read_cart()?;
        items.push(item);
        self.write(CART_KEY, &Value::Array(items))
    }

    async fn remove_cart_items(&self, count: usize) -> Result<()> {
        let _guard = self.cart_lock.lock().await;
        let mut items = self.read_cart()?;
        if count >= items.len() {
            return self.remove(CART_KEY);
        }
        items.drain(..count);
        self.write(CART_KEY, &Value::Array(items))
    }

    async fn pending_order(&self) -> Result<Option<Value>> {
        self.read(ORDER_KEY)
    }

    async fn set_pending_order(&self, order: Value) -> Result<()> {
        let _guard = self.order_lock.lock().await;
        self.write(ORDER_KEY, &order)
    }

    async fn clear_order_if(&self, sent: &Value) -> Result<bool> {
        let _guard = self.order_lock.lock().await;
        if self.read(ORDER_KEY)?.as_ref() != Some(sent) {
            return Ok(false);
        }
        self.remove(ORDER_KEY)?;
        Ok(true)
    }
}
