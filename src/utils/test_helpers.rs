use std::any::Any;

use assert_call::call;

/// Records `label` with `call!` when the returned guard is dropped.
pub fn call_on_drop(label: impl Into<String>) -> impl Any {
    struct OnDrop(String);
    impl Drop for OnDrop {
        fn drop(&mut self) {
            call!("{}", self.0);
        }
    }
    OnDrop(label.into())
}
