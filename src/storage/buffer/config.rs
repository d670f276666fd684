/// Default number of frames in the pool.
pub const DEFAULT_POOL_SIZE: usize = 64;

/// Default K for the LRU-K replacer.
pub const DEFAULT_REPLACER_K: usize = 2;

/// Default capacity of one page-table hash bucket.
pub const DEFAULT_BUCKET_SIZE: usize = 32;

/// Construction-time knobs for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of page frames in the pool.
    pub pool_size: usize,
    /// K parameter of the LRU-K replacer.
    pub replacer_k: usize,
    /// Bucket capacity of the page-table hash index.
    pub bucket_size: usize,
}

impl BufferPoolConfig {
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size,
            replacer_k: DEFAULT_REPLACER_K,
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }

    pub fn with_replacer_k(mut self, replacer_k: usize) -> Self {
        self.replacer_k = replacer_k;
        self
    }

    pub fn with_bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.pool_size == 0 {
            return Err("pool_size must be > 0");
        }
        if self.replacer_k == 0 {
            return Err("replacer_k must be > 0");
        }
        if self.bucket_size == 0 {
            return Err("bucket_size must be > 0");
        }
        Ok(())
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BufferPoolConfig::default();
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(config.replacer_k, DEFAULT_REPLACER_K);
        assert_eq!(config.bucket_size, DEFAULT_BUCKET_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = BufferPoolConfig::new(16).with_replacer_k(3).with_bucket_size(4);
        assert_eq!(config.pool_size, 16);
        assert_eq!(config.replacer_k, 3);
        assert_eq!(config.bucket_size, 4);
    }

    #[test]
    fn test_validation() {
        assert!(BufferPoolConfig::new(0).validate().is_err());
        assert!(BufferPoolConfig::new(16).with_replacer_k(0).validate().is_err());
        assert!(BufferPoolConfig::new(16).with_bucket_size(0).validate().is_err());
    }
}
