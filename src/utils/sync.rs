mod oneshot_broadcast;

pub use oneshot_broadcast::*;
