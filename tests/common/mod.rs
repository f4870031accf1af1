#![allow(dead_code)]

pub mod builders;
pub mod mocks;

use std::time::Duration;

/// Poll `condition` for up to five seconds
pub async fn eventually<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..500 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
