pub use rayon::ThreadPool;

/// Run `op` inside the crate's shared thread pool. If the pool can't be built, `op` runs on the calling thread's
/// global pool instead.
pub fn with_thread_pool<T: Send>(op: impl (FnOnce() -> T) + Send + Sync) -> T {
    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::sync::OnceLock;
        static POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

        let pool = POOL.get_or_init(|| {
            // On Windows debug builds, the stack overflows with the default stack size
            let mut builder = rayon::ThreadPoolBuilder::new().stack_size(2 * 1024 * 1024);

            // Use physical core count instead of logical core count.
            if std::env::var("RAYON_NUM_THREADS").is_err() {
                builder = builder.num_threads(num_cpus::get_physical());
            }

            match builder.build() {
                Ok(pool) => Some(pool),
                Err(err) => {
                    log::warn!(
                        "could not build thread pool, falling back to the global pool: {err}"
                    );
                    None
                }
            }
        });

        match pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
    #[cfg(target_arch = "wasm32")]
    {
        // wasm-bindgen-rayon doesn't support custom thread pools
        op()
    }
}
