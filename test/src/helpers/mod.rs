pub mod tick;

pub use tick::{ms, test_worker, tick, TestWorker};
