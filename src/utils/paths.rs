use std::path::PathBuf;

pub(crate) fn faerscope_cache_dir() -> PathBuf {
    match dirs::cache_dir() {
        Some(dir) => dir.join("faerscope"),
        None => std::env::temp_dir().join("faerscope"),
    }
}
