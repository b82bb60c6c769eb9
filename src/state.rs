use crate::storage::{Backend, CounterStore};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<CounterStore<Backend>>>,
}

impl AppState {
    pub fn new(store: CounterStore<Backend>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }
}
