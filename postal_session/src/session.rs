//! The plotting session: cache, fetch pipeline and the two aligned tables.

use std::sync::Arc;
use std::time::{Duration, Instant};

use postal_cache::SeriesCache;
use postal_codec::{decode_blob, Decompressor, FetchWindow, Series};
use postal_source::{DataSource, FetchError};
use postal_table::{filter, merge, WideTable};
use tokio::time;
use tracing::{debug, info, instrument};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::metadata::{ValidityLink, ValidityMap};

/// State of one plot.
///
/// Columns of the raw and filtered tables always correspond one to one with
/// [`Session::columns`]. `add_series` takes `&mut self`, so adds are
/// serialised against each other.
pub struct Session {
    config: SessionConfig,
    source: Arc<dyn DataSource>,
    decompressor: Option<Box<dyn Decompressor>>,
    validity: Box<dyn ValidityLink>,
    cache: SeriesCache,
    raw: WideTable,
    filtered: WideTable,
    columns: Vec<String>,
    live: bool,
}

impl Session {
    /// New session over `source` with no validity links. The decompression
    /// stage follows `config.compression`.
    pub fn new(config: SessionConfig, source: Arc<dyn DataSource>) -> Self {
        let decompressor = config.compression.decompressor();
        let cache = SeriesCache::new(config.cache_capacity);
        info!(
            capacity = config.cache_capacity,
            compression = ?config.compression,
            "session created"
        );
        Self {
            config,
            source,
            decompressor,
            validity: Box::new(ValidityMap::new()),
            cache,
            raw: WideTable::new(),
            filtered: WideTable::new(),
            columns: Vec::new(),
            live: false,
        }
    }

    /// Use `link` to find the validity series of each label.
    pub fn with_validity(mut self, link: impl ValidityLink + 'static) -> Self {
        self.validity = Box::new(link);
        self
    }

    /// Replace the decompression stage; `None` feeds blobs straight to the decoder.
    pub fn with_decompressor(mut self, decompressor: Option<Box<dyn Decompressor>>) -> Self {
        self.decompressor = decompressor;
        self
    }

    /// Fetch `label` (and its validity series, if any) and add it as a new
    /// column of both tables.
    ///
    /// Every fallible step runs before either table is touched, so on error
    /// the tables and the column list are unchanged.
    #[instrument(skip(self))]
    pub async fn add_series(&mut self, label: &str) -> Result<(), SessionError> {
        if self.column_index(label).is_some() {
            return Err(SessionError::AlreadyPlotted(label.to_owned()));
        }

        let series = self.load(label).await?;
        let filtered = match self.validity.lookup(label) {
            Some(validity_label) => {
                let validity = self.load(&validity_label).await?;
                let started = Instant::now();
                let kept = filter(&series, &validity)?;
                debug!(
                    validity = %validity_label,
                    kept = kept.len(),
                    total = series.len(),
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "filter"
                );
                Arc::new(kept)
            }
            None => Arc::clone(&series),
        };

        let started = Instant::now();
        merge(&mut self.raw, &series);
        let raw_done = started.elapsed();
        merge(&mut self.filtered, &filtered);
        debug!(
            raw_us = raw_done.as_micros() as u64,
            filtered_us = (started.elapsed() - raw_done).as_micros() as u64,
            "merge"
        );

        self.columns.push(label.to_owned());
        if self.live {
            self.cache.clear();
        }
        info!(columns = self.columns.len(), rows = self.raw.len(), "series added");
        Ok(())
    }

    /// Drop the column of `label` from both tables. Returns false if it was
    /// not plotted.
    pub fn remove_series(&mut self, label: &str) -> bool {
        let Some(index) = self.column_index(label) else {
            return false;
        };
        self.raw.remove_column(index);
        self.filtered.remove_column(index);
        self.columns.remove(index);
        info!(label, "series removed");
        true
    }

    /// Enter or leave live mode. Entering flushes the cache, and while live
    /// the cache is flushed again after every add.
    pub fn set_live(&mut self, enable: bool) {
        if enable && !self.live {
            self.cache.clear();
        }
        if enable != self.live {
            info!(live = enable, "live mode");
        }
        self.live = enable;
    }

    /// Whether live mode is on.
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Table of every plotted series as fetched.
    pub fn raw_table(&self) -> &WideTable {
        &self.raw
    }

    /// Table of every plotted series with invalid points removed.
    pub fn filtered_table(&self) -> &WideTable {
        &self.filtered
    }

    /// Plotted labels, in column order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column of `label` in both tables.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// The series cache.
    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    /// Active configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Validity label conditioning `label`, if any.
    pub fn validity_label(&self, label: &str) -> Option<String> {
        self.validity.lookup(label)
    }

    async fn load(&mut self, label: &str) -> Result<Arc<Series>, SessionError> {
        let source = self.source.as_ref();
        let decompressor = self.decompressor.as_deref();
        let window = self.config.window;
        let timeout = self.config.fetch_timeout();
        self.cache
            .get_or_fetch(label, || {
                fetch_series(source, decompressor, window, timeout, label)
            })
            .await
    }
}

async fn fetch_series(
    source: &dyn DataSource,
    decompressor: Option<&dyn Decompressor>,
    window: FetchWindow,
    timeout: Duration,
    label: &str,
) -> Result<Series, SessionError> {
    let started = Instant::now();
    let raw = time::timeout(timeout, source.fetch_raw(label))
        .await
        .map_err(|_| FetchError::Timeout(timeout))??;
    let fetched = started.elapsed();

    let blob = match decompressor {
        Some(d) => d.decompress(&raw)?,
        None => raw,
    };
    let mut series = decode_blob(&blob)?;
    if !window.is_unbounded() {
        series = window.apply(&series);
    }

    debug!(
        label,
        bytes = blob.len(),
        points = series.len(),
        fetch_us = fetched.as_micros() as u64,
        decode_us = (started.elapsed() - fetched).as_micros() as u64,
        "series loaded"
    );
    Ok(series)
}
