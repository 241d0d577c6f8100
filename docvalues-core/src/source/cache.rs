//! Single-entry memoization of a field's source.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{SortedSource, Source};
use crate::error::{Error, Result};
use crate::schema::Field;

/// Builds a field's source from the file pair.
pub type Loader = Box<dyn Fn() -> Result<Arc<dyn Source>> + Send + Sync>;

/// Builds a field's sorted source from the file pair.
pub type SortedLoader = Box<dyn Fn() -> Result<Arc<dyn SortedSource>> + Send + Sync>;

/// Per-field handle holding at most one loaded [`Source`].
///
/// Loads happen under the cache lock, so concurrent callers of
/// [`get_or_load`](Self::get_or_load) never run the loader twice; one loads
/// while the others wait and then share the result. Sources handed out
/// stay valid after [`release`](Self::release).
pub struct DocValues {
    field: Field,
    loader: Loader,
    sorted_loader: Option<SortedLoader>,
    cached: Mutex<Option<Arc<dyn Source>>>,
}

impl DocValues {
    pub fn new(field: Field, loader: Loader) -> Self {
        Self {
            field,
            loader,
            sorted_loader: None,
            cached: Mutex::new(None),
        }
    }

    pub fn with_sorted_loader(mut self, loader: SortedLoader) -> Self {
        self.sorted_loader = Some(loader);
        self
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// The cached source, loading it first if needed.
    pub fn get_or_load(&self) -> Result<Arc<dyn Source>> {
        let mut cached = self.cached.lock();
        if let Some(source) = cached.as_ref() {
            log::trace!("[docvalues] cache hit for field {}", self.field.0);
            return Ok(Arc::clone(source));
        }
        let source = (self.loader)()?;
        log::trace!(
            "[docvalues] loaded field {} ({} bytes)",
            self.field.0,
            source.ram_bytes_used()
        );
        *cached = Some(Arc::clone(&source));
        Ok(source)
    }

    /// The cached source, if one is loaded.
    pub fn get_cached(&self) -> Option<Arc<dyn Source>> {
        self.cached.lock().clone()
    }

    /// Memory held by the cached source; 0 when nothing is cached.
    pub fn ram_bytes_used(&self) -> usize {
        self.cached
            .lock()
            .as_ref()
            .map_or(0, |source| source.ram_bytes_used())
    }

    /// Drop the cached source and return it.
    pub fn release(&self) -> Option<Arc<dyn Source>> {
        let released = self.cached.lock().take();
        if released.is_some() {
            log::trace!("[docvalues] released field {}", self.field.0);
        }
        released
    }

    /// Load a fresh source, bypassing the cache.
    pub fn load(&self) -> Result<Arc<dyn Source>> {
        (self.loader)()
    }

    /// Load a fresh sorted source, bypassing the cache.
    pub fn load_sorted(&self) -> Result<Arc<dyn SortedSource>> {
        match &self.sorted_loader {
            Some(loader) => loader(),
            None => Err(Error::Unsupported("field does not store sorted values")),
        }
    }
}

impl Drop for DocValues {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for DocValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocValues")
            .field("field", &self.field)
            .field("cached", &self.cached.lock().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{NumericKind, NumericReader, NumericSource};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn counting_loader(loads: Arc<AtomicUsize>) -> Loader {
        Box::new(move || {
            loads.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            Ok(Arc::new(NumericSource::new(
                NumericReader::Const(7),
                NumericKind::Int,
                4,
            )) as Arc<dyn Source>)
        })
    }

    #[test]
    fn test_concurrent_get_or_load_loads_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let doc_values = Arc::new(DocValues::new(Field(0), counting_loader(Arc::clone(&loads))));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let dv = Arc::clone(&doc_values);
                thread::spawn(move || dv.get_or_load().unwrap().get_int(3).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 7);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_and_reload() {
        let loads = Arc::new(AtomicUsize::new(0));
        let dv = DocValues::new(Field(1), counting_loader(Arc::clone(&loads)));
        assert!(dv.get_cached().is_none());

        let first = dv.get_or_load().unwrap();
        assert!(Arc::ptr_eq(&first, &dv.get_cached().unwrap()));

        let released = dv.release().unwrap();
        assert!(Arc::ptr_eq(&first, &released));
        assert!(dv.get_cached().is_none());

        let second = dv.get_or_load().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        // the released source is still readable
        assert_eq!(first.get_int(0).unwrap(), 7);
    }

    #[test]
    fn test_ram_bytes_follow_the_cache() {
        let loads = Arc::new(AtomicUsize::new(0));
        let dv = DocValues::new(Field(4), counting_loader(Arc::clone(&loads)));
        assert_eq!(dv.ram_bytes_used(), 0);

        let source = dv.get_or_load().unwrap();
        assert!(source.ram_bytes_used() > 0);
        assert_eq!(dv.ram_bytes_used(), source.ram_bytes_used());
        dv.get_or_load().unwrap();
        assert_eq!(dv.ram_bytes_used(), source.ram_bytes_used());

        dv.release();
        assert_eq!(dv.ram_bytes_used(), 0);
        dv.load().unwrap();
        assert_eq!(dv.ram_bytes_used(), 0);
    }

    #[test]
    fn test_load_bypasses_cache() {
        let loads = Arc::new(AtomicUsize::new(0));
        let dv = DocValues::new(Field(2), counting_loader(Arc::clone(&loads)));
        dv.load().unwrap();
        assert!(dv.get_cached().is_none());
        assert!(matches!(dv.load_sorted(), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let dv = DocValues::new(
            Field(3),
            Box::new(|| Err(Error::Corruption("bad".to_string()))),
        );
        assert!(dv.get_or_load().is_err());
        assert!(dv.get_cached().is_none());
    }
}
