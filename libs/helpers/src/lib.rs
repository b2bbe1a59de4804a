pub mod datasets;
pub mod oracle;

/// Initialize the logger
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
