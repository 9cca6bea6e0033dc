use crate::ports::SyncQueue;
use async_trait::async_trait;
use serde_json::Value;
use shared::Result;
use tokio::sync::Mutex;

/// Non-durable queue, used when sled cannot be opened and in tests
#[derive(Debug, Default)]
pub struct MemorySyncQueue {
    cart: Mutex<Vec<Value>>,
    order: Mutex<Option<Value>>,
}

#[async_trait]
impl SyncQueue for MemorySyncQueue {
    async fn cart_items(&self) -> Result<Vec<Value>> {
        Ok(self.cart.lock().await.clone())
    }

    async fn push_cart_item(&self, item: Value) -> Result<()> {
        self.cart.lock().await.push(item);
        Ok(())
    }

    async fn remove_cart_items(&self, count: usize) -> Result<()> {
        let mut cart = self.cart.lock().await;
        let count = count.min(cart.len());
        cart.drain(..count);
        Ok(())
    }

    async fn pending_order(&self) -> Result<Option<Value>> {
        Ok(self.order.lock().await.clone())
    }

    async fn set_pending_order(&self, order: Value) -> Result<()> {
        *self.order.lock().await = Some(order);
        Ok(())
    }

    async fn clear_order_if(&self, sent: &Value) -> Result<bool> {
        let mut order = self.order.lock().await;
        if order.as_ref() == Some(sent) {
            *order = None;
            return Ok(true);
        }
        Ok(false)
    }
}
