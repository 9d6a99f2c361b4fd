use std::sync::Arc;

use clipseek_core::api::{
    AppConfig, CacheProvider, FrameLogSource, ResultCache, TagStore, TagsProvider,
};

use crate::cache::{FsResultCache, MemoryResultCache};
use crate::source::{Dataset, LocalLogEngine};
use crate::tags::{FileTagStore, MemoryTagStore};

pub fn build_source(cfg: &AppConfig) -> Arc<dyn FrameLogSource> {
    Arc::new(LocalLogEngine::new(Dataset::new(&cfg.source.data_dir)))
}

pub fn build_cache(cfg: &AppConfig) -> Arc<dyn ResultCache> {
    match &cfg.cache.provider {
        CacheProvider::Fs(fs_cfg) => Arc::new(FsResultCache::new(&fs_cfg.directory)),
        CacheProvider::Memory(mem_cfg) => Arc::new(MemoryResultCache::new(mem_cfg.capacity)),
    }
}

pub fn build_tags(cfg: &AppConfig) -> Arc<dyn TagStore> {
    match &cfg.tags.provider {
        TagsProvider::Memory => Arc::new(MemoryTagStore::new()),
        TagsProvider::File(file_cfg) => Arc::new(FileTagStore::new(&file_cfg.path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipseek_core::api::{MemoryCacheConfig, TagsConfig};

    #[test]
    fn providers_follow_config() {
        let mut cfg = AppConfig::default();
        cfg.cache.provider = CacheProvider::Memory(MemoryCacheConfig { capacity: 4 });
        cfg.tags = TagsConfig {
            provider: TagsProvider::Memory,
        };
        assert_eq!(build_cache(&cfg).name(), "memory");
        assert_eq!(build_tags(&cfg).name(), "memory");
        assert_eq!(build_source(&cfg).name(), "local");

        let cfg = AppConfig::default();
        assert_eq!(build_cache(&cfg).name(), "fs");
        assert_eq!(build_tags(&cfg).name(), "file");
    }
}
