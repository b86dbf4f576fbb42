mod memory;
mod redis;

pub use memory::{create_memory_challenge_store, create_swept_challenge_store};
pub use redis::create_redis_challenge_store;
